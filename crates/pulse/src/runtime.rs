//! Content-runtime events: URL and title changes reported by a loaded tab.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Partial update for a browser tab. Blank fields are ignored when applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl RuntimeUpdate {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            title: None,
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            url: None,
            title: Some(title.into()),
        }
    }

    /// The URL trimmed, or `None` when absent or blank.
    pub fn effective_url(&self) -> Option<&str> {
        non_blank(self.url.as_deref())
    }

    /// The title trimmed, or `None` when absent or blank.
    pub fn effective_title(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }
}

/// A runtime notification addressed to one tab.
///
/// # JSON shape
///
/// ```json
/// { "tabId": "tab-edge", "url": "https://www.microsoft.com/", "title": "Edge" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeEvent {
    #[serde(rename = "tabId")]
    pub tab_id: String,
    #[serde(flatten)]
    pub update: RuntimeUpdate,
}

impl RuntimeEvent {
    /// Read an event from an untrusted JSON value.
    ///
    /// `tabId` must be a non-blank string. `url` and `title` are kept only
    /// when they are non-blank strings; anything else is dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let tab_id = object.get("tabId")?.as_str()?;
        if tab_id.trim().is_empty() {
            return None;
        }

        let field = |name: &str| {
            object
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };

        Some(Self {
            tab_id: tab_id.to_string(),
            update: RuntimeUpdate {
                url: field("url"),
                title: field("title"),
            },
        })
    }

    /// Parse an event from JSON text. Malformed input yields `None`.
    pub fn from_json(json: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(json).ok()?;
        Self::from_value(&value)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_full() {
        let event = RuntimeEvent::from_value(&json!({
            "tabId": "t1",
            "url": "https://example.com/a",
            "title": "Example",
        }))
        .unwrap();
        assert_eq!(event.tab_id, "t1");
        assert_eq!(event.update.url.as_deref(), Some("https://example.com/a"));
        assert_eq!(event.update.title.as_deref(), Some("Example"));
    }

    #[test]
    fn test_from_value_drops_blank_and_mistyped_fields() {
        let event = RuntimeEvent::from_value(&json!({
            "tabId": "t1",
            "url": "   ",
            "title": 42,
        }))
        .unwrap();
        assert_eq!(event.update, RuntimeUpdate::default());
    }

    #[test]
    fn test_from_value_rejects_bad_tab_id() {
        assert!(RuntimeEvent::from_value(&json!({"tabId": ""})).is_none());
        assert!(RuntimeEvent::from_value(&json!({"tabId": 7})).is_none());
        assert!(RuntimeEvent::from_value(&json!({"url": "https://a.b"})).is_none());
        assert!(RuntimeEvent::from_value(&json!(["t1"])).is_none());
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(RuntimeEvent::from_json("{not json").is_none());
        assert!(RuntimeEvent::from_json(r#"{"tabId":"t1"}"#).is_some());
    }

    #[test]
    fn test_effective_fields_trim() {
        let update = RuntimeUpdate {
            url: Some("  https://a.b  ".into()),
            title: Some(" \n".into()),
        };
        assert_eq!(update.effective_url(), Some("https://a.b"));
        assert_eq!(update.effective_title(), None);
    }

    #[test]
    fn test_event_serializes_flat() {
        let event = RuntimeEvent {
            tab_id: "t1".into(),
            update: RuntimeUpdate::title("Docs"),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({"tabId": "t1", "title": "Docs"}));
    }
}
