//! The persisted UI session: items plus selection and address-bar state,
//! and the versioned envelope they are stored in.
//!
//! Decoding never fails on individual bad items. Invalid items are dropped,
//! duplicate ids keep their first occurrence, and a missing or stale
//! selection or address is repaired. Only an unreadable envelope, an
//! unknown version, or a collection with no valid items is rejected with
//! [`RestoreError`].
//!
//! Tab URLs go through [`normalize_url`] again on decode. A URL stored
//! verbatim from a runtime event, such as `about:blank`, therefore comes
//! back as a search URL.

use crate::ids::IdGenerator;
use crate::ops::{
    add_browser_tab, apply_runtime_update, next_selection_after_close, remove_item,
    rename_or_update_tab,
};
use crate::query::{default_parent_id, find, first_browser_tab};
use crate::runtime::RuntimeEvent;
use crate::types::{ItemKind, WorkspaceItem, seed_workspace};
use crate::url::normalize_url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;

/// Envelope version written by [`serialize`].
pub const CURRENT_SESSION_VERSION: u32 = 1;

/// Address used when no tab can supply one.
pub const DEFAULT_ADDRESS: &str = "https://www.microsoft.com/edge";

/// Why a persisted session could not be restored.
///
/// The caller is expected to fall back to [`UiSessionState::default_session`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RestoreError {
    #[error("malformed session payload: {0}")]
    Malformed(String),

    #[error("unsupported session version {0}")]
    UnsupportedVersion(f64),

    #[error("session contains no valid items")]
    NoValidItems,
}

/// Items plus the UI cursor state that is persisted with them.
///
/// `selected_item_id` is empty only when `items` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiSessionState {
    pub items: Vec<WorkspaceItem>,
    pub selected_item_id: String,
    pub address: String,
}

/// Wire form written by [`serialize`].
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a> {
    version: u32,
    items: &'a [WorkspaceItem],
    selected_item_id: &'a str,
    address: &'a str,
}

/// What [`deserialize_with_report`] had to repair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Envelope version read (0 for legacy payloads without one).
    pub version: u32,
    /// Elements of `items` that failed validation.
    pub dropped_items: usize,
    /// Ids that appeared more than once; later occurrences were dropped.
    pub duplicate_ids: Vec<String>,
    pub selection_repaired: bool,
    pub address_repaired: bool,
}

impl RestoreReport {
    /// True when the payload decoded without any repair.
    pub fn is_clean(&self) -> bool {
        self.dropped_items == 0
            && self.duplicate_ids.is_empty()
            && !self.selection_repaired
            && !self.address_repaired
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Encode `state` as `{version, items, selectedItemId, address}`.
pub fn serialize(state: &UiSessionState) -> serde_json::Result<String> {
    serde_json::to_string(&EnvelopeRef {
        version: CURRENT_SESSION_VERSION,
        items: &state.items,
        selected_item_id: &state.selected_item_id,
        address: &state.address,
    })
}

/// Decode a persisted session, repairing what can be repaired.
///
/// ```
/// use pulse::v1::session::{deserialize, RestoreError};
///
/// let empty = r#"{"version":1,"items":[],"selectedItemId":"x","address":"y"}"#;
/// assert_eq!(deserialize(empty), Err(RestoreError::NoValidItems));
/// ```
pub fn deserialize(serialized: &str) -> Result<UiSessionState, RestoreError> {
    deserialize_with_report(serialized).map(|(state, _)| state)
}

/// Like [`deserialize`], also describing the repairs made.
pub fn deserialize_with_report(
    serialized: &str,
) -> Result<(UiSessionState, RestoreReport), RestoreError> {
    let raw: Value =
        serde_json::from_str(serialized).map_err(|e| RestoreError::Malformed(e.to_string()))?;
    let Value::Object(envelope) = raw else {
        return Err(RestoreError::Malformed("expected a JSON object".into()));
    };

    let version = match envelope.get("version").and_then(Value::as_f64) {
        None => 0,
        Some(v) if v == 0.0 => 0,
        Some(v) if v == f64::from(CURRENT_SESSION_VERSION) => CURRENT_SESSION_VERSION,
        Some(v) => return Err(RestoreError::UnsupportedVersion(v)),
    };

    let mut report = RestoreReport {
        version,
        ..Default::default()
    };

    let items = parse_items(envelope.get("items"), &mut report);
    if items.is_empty() {
        return Err(RestoreError::NoValidItems);
    }

    let selection_candidate = envelope.get("selectedItemId").and_then(Value::as_str);
    let selected_item_id = pick_selected_item_id(&items, selection_candidate);
    report.selection_repaired = selection_candidate != Some(selected_item_id.as_str());

    let address_candidate = envelope.get("address").and_then(Value::as_str);
    let address = pick_address(&items, &selected_item_id, address_candidate);
    report.address_repaired = address_candidate != Some(address.as_str());

    Ok((
        UiSessionState {
            items,
            selected_item_id,
            address,
        },
        report,
    ))
}

/// Decode `serialized` when present and valid, otherwise start from the seed.
pub fn restore_or_default(serialized: Option<&str>) -> UiSessionState {
    serialized
        .and_then(|raw| deserialize(raw).ok())
        .unwrap_or_default()
}

fn parse_items(value: Option<&Value>, report: &mut RestoreReport) -> Vec<WorkspaceItem> {
    let Some(Value::Array(candidates)) = value else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let Some(item) = candidate.as_object().and_then(parse_item) else {
            report.dropped_items += 1;
            continue;
        };
        if !seen.insert(item.id.clone()) {
            report.duplicate_ids.push(item.id);
            continue;
        }
        items.push(item);
    }
    items
}

fn parse_item(object: &Map<String, Value>) -> Option<WorkspaceItem> {
    let id = non_empty_string(object.get("id"))?;
    let kind = non_empty_string(object.get("kind"))?;
    let title = non_empty_string(object.get("title"))?;
    let order = integer(object.get("order"))?;
    let parent_id = object
        .get("parentId")
        .and_then(Value::as_str)
        .filter(|p| !p.trim().is_empty())
        .map(str::to_string);

    let kind = match kind.as_str() {
        "group" => ItemKind::Group {
            collapsed: truthy(object.get("collapsed")),
        },
        "browser-tab" => ItemKind::BrowserTab {
            url: normalize_url(&non_empty_string(object.get("url"))?),
        },
        "file-ref" => ItemKind::FileRef {
            file_path: non_empty_string(object.get("filePath"))?,
        },
        _ => return None,
    };

    Some(WorkspaceItem {
        id,
        kind,
        parent_id,
        order,
        title,
    })
}

fn pick_selected_item_id(items: &[WorkspaceItem], candidate: Option<&str>) -> String {
    if let Some(candidate) = candidate
        && find(items, candidate).is_some()
    {
        return candidate.to_string();
    }

    first_browser_tab(items)
        .or(items.first())
        .map(|item| item.id.clone())
        .unwrap_or_default()
}

fn pick_address(items: &[WorkspaceItem], selected_item_id: &str, candidate: Option<&str>) -> String {
    if let Some(candidate) = candidate
        && !candidate.trim().is_empty()
    {
        return candidate.to_string();
    }

    find(items, selected_item_id)
        .and_then(WorkspaceItem::url)
        .or_else(|| first_browser_tab(items).and_then(WorkspaceItem::url))
        .unwrap_or(DEFAULT_ADDRESS)
        .to_string()
}

/// A string with surrounding whitespace removed, or `None` when absent,
/// not a string, or blank.
fn non_empty_string(value: Option<&Value>) -> Option<String> {
    let trimmed = value?.as_str()?.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A JSON number truncated toward zero.
fn integer(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    let f = value.as_f64()?;
    f.is_finite().then(|| f.trunc() as i64)
}

/// Loose boolean coercion: absent, `null`, `false`, `0` and `""` are false;
/// every other value is true.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

// ============================================================================
// Session operations
// ============================================================================

impl Default for UiSessionState {
    fn default() -> Self {
        Self::default_session()
    }
}

impl UiSessionState {
    /// The seed collection with the first tab selected.
    pub fn default_session() -> Self {
        Self::from_items(seed_workspace())
    }

    /// Wrap `items`, selecting the first tab (or first item) and pointing
    /// the address at it.
    pub fn from_items(items: Vec<WorkspaceItem>) -> Self {
        let selected_item_id = pick_selected_item_id(&items, None);
        let address = pick_address(&items, &selected_item_id, None);
        Self {
            items,
            selected_item_id,
            address,
        }
    }

    pub fn selected_item(&self) -> Option<&WorkspaceItem> {
        find(&self.items, &self.selected_item_id)
    }

    /// The selected item, if it is a browser tab.
    pub fn selected_tab(&self) -> Option<&WorkspaceItem> {
        self.selected_item().filter(|item| item.is_browser_tab())
    }

    /// Replace the items, keeping the selection and address where they
    /// still make sense and repairing them otherwise.
    pub fn with_items(&self, items: Vec<WorkspaceItem>) -> Self {
        let selected_item_id = pick_selected_item_id(&items, Some(&self.selected_item_id));
        let address = if selected_item_id == self.selected_item_id {
            pick_address(&items, &selected_item_id, Some(&self.address))
        } else {
            pick_address(&items, &selected_item_id, None)
        };
        Self {
            items,
            selected_item_id,
            address,
        }
    }

    /// Select `id`. Selecting a tab also points the address at it.
    pub fn select(&self, id: &str) -> Self {
        let Some(item) = find(&self.items, id) else {
            return self.clone();
        };
        Self {
            items: self.items.clone(),
            selected_item_id: item.id.clone(),
            address: item.url().unwrap_or(&self.address).to_string(),
        }
    }

    /// Close the browser tab `id`.
    ///
    /// If it was selected, the selection moves per
    /// [`next_selection_after_close`] and the address follows the new tab,
    /// or is cleared when the new selection is not a tab.
    pub fn close_tab(&self, id: &str) -> Self {
        let Some(tab) = find(&self.items, id).filter(|item| item.is_browser_tab()) else {
            return self.clone();
        };

        let items = remove_item(&self.items, id);
        if self.selected_item_id != id {
            return Self {
                items,
                ..self.clone()
            };
        }

        let selected_item_id = next_selection_after_close(&items, tab).unwrap_or_default();
        let address = find(&items, &selected_item_id)
            .and_then(WorkspaceItem::url)
            .unwrap_or_default()
            .to_string();
        Self {
            items,
            selected_item_id,
            address,
        }
    }

    /// Submit address-bar input.
    ///
    /// The input is normalized. The selected tab navigates to it; with no
    /// tab selected a new tab is opened under the default parent and
    /// selected.
    pub fn navigate(&self, input: &str, ids: impl IdGenerator) -> Self {
        let target = normalize_url(input);

        if let Some(tab) = self.selected_tab() {
            return Self {
                items: rename_or_update_tab(&self.items, &tab.id, &target),
                selected_item_id: tab.id.clone(),
                address: target,
            };
        }

        let parent = default_parent_id(&self.items);
        let added = add_browser_tab(&self.items, parent, &target, ids);
        Self {
            items: added.items,
            selected_item_id: added.id,
            address: target,
        }
    }

    /// Fold a runtime event into its tab. When the event targets the
    /// selected tab and carries a URL, the address follows it.
    pub fn apply_runtime_event(&self, event: &RuntimeEvent) -> Self {
        let items = apply_runtime_update(&self.items, &event.tab_id, &event.update);
        let follows = self
            .selected_tab()
            .is_some_and(|tab| tab.id == event.tab_id);

        let address = match event.update.effective_url() {
            Some(url) if follows => url.to_string(),
            _ => self.address.clone(),
        };
        Self {
            items,
            selected_item_id: self.selected_item_id.clone(),
            address,
        }
    }
}
