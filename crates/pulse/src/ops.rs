//! Snapshot-in, snapshot-out mutations of the item collection.
//!
//! Every function takes the current collection by reference and returns a
//! new one. Requests naming an unknown id (or an item of the wrong kind)
//! return an unchanged copy rather than an error.

use crate::ids::IdGenerator;
use crate::query::{children_of, find, next_order, subtree};
use crate::runtime::RuntimeUpdate;
use crate::types::{ItemKind, WorkspaceItem};
use crate::url::{normalize_url, title_from_url};
use std::collections::{HashMap, HashSet};

/// Title given to groups created without one.
pub const DEFAULT_GROUP_TITLE: &str = "New Group";

/// Result of an operation that creates an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Added {
    pub items: Vec<WorkspaceItem>,
    /// Id of the new item, so the caller can select it right away.
    pub id: String,
}

/// Direction for [`move_item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Flip `collapsed` on the group `id`.
pub fn toggle_group_collapsed(items: &[WorkspaceItem], id: &str) -> Vec<WorkspaceItem> {
    items
        .iter()
        .map(|item| match item.kind {
            ItemKind::Group { collapsed } if item.id == id => WorkspaceItem {
                kind: ItemKind::Group {
                    collapsed: !collapsed,
                },
                ..item.clone()
            },
            _ => item.clone(),
        })
        .collect()
}

/// Point the browser tab `id` at `url` (normalized) and retitle it from
/// the URL's host.
pub fn rename_or_update_tab(items: &[WorkspaceItem], id: &str, url: &str) -> Vec<WorkspaceItem> {
    let url = normalize_url(url);
    let title = title_from_url(&url);
    items
        .iter()
        .map(|item| {
            if item.id != id || !item.is_browser_tab() {
                return item.clone();
            }
            WorkspaceItem {
                kind: ItemKind::BrowserTab { url: url.clone() },
                title: title.clone(),
                ..item.clone()
            }
        })
        .collect()
}

/// Fold a runtime update into the browser tab `id`.
///
/// Blank fields keep the previous value; non-blank fields (trimmed)
/// overwrite it.
pub fn apply_runtime_update(
    items: &[WorkspaceItem],
    id: &str,
    update: &RuntimeUpdate,
) -> Vec<WorkspaceItem> {
    let next_url = update.effective_url();
    let next_title = update.effective_title();
    items
        .iter()
        .map(|item| match &item.kind {
            ItemKind::BrowserTab { url } if item.id == id => WorkspaceItem {
                kind: ItemKind::BrowserTab {
                    url: next_url.unwrap_or(url).to_string(),
                },
                title: next_title.unwrap_or(&item.title).to_string(),
                ..item.clone()
            },
            _ => item.clone(),
        })
        .collect()
}

/// Append a root group at the next free root order.
///
/// The title is trimmed; a blank title becomes [`DEFAULT_GROUP_TITLE`].
pub fn add_group(items: &[WorkspaceItem], title: &str, ids: impl IdGenerator) -> Added {
    let title = match title.trim() {
        "" => DEFAULT_GROUP_TITLE,
        trimmed => trimmed,
    };
    let id = fresh_id(items, ids);
    let group = WorkspaceItem::group(&id, title).with_order(next_order(items, None));

    let mut next = items.to_vec();
    next.push(group);
    Added { items: next, id }
}

/// Append a browser tab under `parent_id` (root when `None`).
///
/// `url` is normalized and the title is derived from it.
pub fn add_browser_tab(
    items: &[WorkspaceItem],
    parent_id: Option<&str>,
    url: &str,
    ids: impl IdGenerator,
) -> Added {
    let url = normalize_url(url);
    let id = fresh_id(items, ids);
    let mut tab = WorkspaceItem::browser_tab(&id, title_from_url(&url), url)
        .with_order(next_order(items, parent_id));
    tab.parent_id = parent_id.map(str::to_string);

    let mut next = items.to_vec();
    next.push(tab);
    Added { items: next, id }
}

/// Remove `id` and, transitively, everything beneath it; then renumber
/// every sibling set to `0..n`.
pub fn remove_item(items: &[WorkspaceItem], id: &str) -> Vec<WorkspaceItem> {
    let removed = subtree(items, id);
    if removed.is_empty() {
        return items.to_vec();
    }

    let remaining: Vec<WorkspaceItem> = items
        .iter()
        .filter(|item| !removed.contains(&item.id))
        .cloned()
        .collect();
    reindex_all_parents(remaining)
}

/// Swap `id` with its neighbour in sibling order.
///
/// No-op at either end of the sibling list.
pub fn move_item(items: &[WorkspaceItem], id: &str, direction: Direction) -> Vec<WorkspaceItem> {
    let Some(target) = find(items, id) else {
        return items.to_vec();
    };

    let siblings = children_of(items, target.parent_id.as_deref());
    let Some(index) = siblings.iter().position(|item| item.id == id) else {
        return items.to_vec();
    };
    let swap_index = match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => Some(index + 1).filter(|i| *i < siblings.len()),
    };
    let Some(swap_index) = swap_index else {
        return items.to_vec();
    };

    let current = siblings[index];
    let other = siblings[swap_index];
    items
        .iter()
        .map(|item| {
            if item.id == current.id {
                item.clone().with_order(other.order)
            } else if item.id == other.id {
                item.clone().with_order(current.order)
            } else {
                item.clone()
            }
        })
        .collect()
}

/// Which item to select after `closed` was removed from the collection.
///
/// Prefers a browser tab among the closed item's former siblings, then any
/// browser tab, then the closed item's parent, then the first item.
pub fn next_selection_after_close(items: &[WorkspaceItem], closed: &WorkspaceItem) -> Option<String> {
    let parent = closed.parent_id.as_deref();
    if let Some(sibling) = children_of(items, parent)
        .into_iter()
        .find(|item| item.is_browser_tab())
    {
        return Some(sibling.id.clone());
    }

    if let Some(tab) = items.iter().find(|item| item.is_browser_tab()) {
        return Some(tab.id.clone());
    }

    if let Some(parent) = parent.and_then(|p| find(items, p)) {
        return Some(parent.id.clone());
    }

    items.first().map(|item| item.id.clone())
}

// ============================================================================
// Helpers
// ============================================================================

/// Draw ids until one is not already used in `items`.
fn fresh_id(items: &[WorkspaceItem], mut ids: impl IdGenerator) -> String {
    let taken: HashSet<&str> = items.iter().map(|item| item.id.as_str()).collect();
    loop {
        let id = ids.next_id();
        if !taken.contains(id.as_str()) {
            return id;
        }
    }
}

/// Map each id to its position in `ids`.
pub(crate) fn order_map<S: AsRef<str>>(ids: &[S]) -> HashMap<String, i64> {
    ids.iter()
        .enumerate()
        .map(|(index, id)| (id.as_ref().to_string(), index as i64))
        .collect()
}

/// Renumber every sibling set to `0..n`, keeping relative order.
pub(crate) fn reindex_all_parents(items: Vec<WorkspaceItem>) -> Vec<WorkspaceItem> {
    let mut parents: Vec<Option<String>> = Vec::new();
    for item in &items {
        if !parents.contains(&item.parent_id) {
            parents.push(item.parent_id.clone());
        }
    }

    let mut orders: HashMap<String, i64> = HashMap::new();
    for parent in &parents {
        let siblings: Vec<&str> = children_of(&items, parent.as_deref())
            .iter()
            .map(|item| item.id.as_str())
            .collect();
        orders.extend(order_map(&siblings));
    }

    items
        .into_iter()
        .map(|item| match orders.get(&item.id) {
            Some(&order) if order != item.order => item.with_order(order),
            _ => item,
        })
        .collect()
}
