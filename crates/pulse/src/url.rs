//! Address-bar input normalization and tab titles derived from URLs.

/// Where empty input navigates to.
pub const SEARCH_ROOT: &str = "https://duckduckgo.com";

/// Title used when no host can be derived from a URL.
pub const PLACEHOLDER_TITLE: &str = "New Tab";

/// Turn address-bar input into an absolute URL.
///
/// - blank input → [`SEARCH_ROOT`]
/// - input with a `scheme://` prefix → unchanged (trimmed)
/// - input containing a space, or without a `.` → search query
/// - anything else → `https://` + input
///
/// ```
/// use pulse::v1::url::normalize_url;
///
/// assert_eq!(normalize_url("example.com"), "https://example.com");
/// assert_eq!(normalize_url("  "), "https://duckduckgo.com");
/// assert_eq!(normalize_url("file:///tmp/a.txt"), "file:///tmp/a.txt");
/// assert_eq!(
///     normalize_url("how to cook rice"),
///     "https://duckduckgo.com/?q=how%20to%20cook%20rice"
/// );
/// ```
pub fn normalize_url(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return SEARCH_ROOT.to_string();
    }

    if has_scheme(trimmed) {
        return trimmed.to_string();
    }

    if trimmed.contains(' ') || !trimmed.contains('.') {
        return search_url(trimmed);
    }

    format!("https://{trimmed}")
}

/// The search-engine URL for a free-text query.
pub fn search_url(query: &str) -> String {
    format!("{SEARCH_ROOT}/?q={}", urlencoding::encode(query))
}

/// Tab title for a URL: its host without a leading `www.`.
///
/// Falls back to [`PLACEHOLDER_TITLE`] when the URL does not parse or has
/// no host (e.g. `about:blank`).
pub fn title_from_url(value: &str) -> String {
    let Ok(parsed) = ::url::Url::parse(value) else {
        return PLACEHOLDER_TITLE.to_string();
    };

    match parsed.host_str() {
        Some(host) => {
            let host = host.strip_prefix("www.").unwrap_or(host);
            if host.is_empty() {
                PLACEHOLDER_TITLE.to_string()
            } else {
                host.to_string()
            }
        }
        None => PLACEHOLDER_TITLE.to_string(),
    }
}

/// `scheme://` where scheme is `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`.
fn has_scheme(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once("://") else {
        return false;
    };

    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
