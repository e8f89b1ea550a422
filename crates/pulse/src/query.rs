//! Hierarchy queries over a flat item collection.
//!
//! There is no stored child list: every query recomputes the tree from
//! `parent_id` back-references.

use crate::types::WorkspaceItem;
use std::collections::{HashMap, HashSet, VecDeque};

/// Direct children of `parent_id` (`None` for root items), sorted by `order`.
///
/// Ties keep their position in `items`.
///
/// # Examples
///
/// ```
/// use pulse::v1::{WorkspaceItem, query};
///
/// let items = vec![
///     WorkspaceItem::group("g1", "Research").with_order(1),
///     WorkspaceItem::group("g0", "Inbox").with_order(0),
///     WorkspaceItem::browser_tab("t1", "Docs", "https://docs.rs").with_parent("g1"),
/// ];
///
/// let roots = query::children_of(&items, None);
/// assert_eq!(roots[0].id, "g0");
/// assert_eq!(roots[1].id, "g1");
/// assert_eq!(query::children_of(&items, Some("g1")).len(), 1);
/// ```
pub fn children_of<'a>(items: &'a [WorkspaceItem], parent_id: Option<&str>) -> Vec<&'a WorkspaceItem> {
    let mut children: Vec<&WorkspaceItem> = items
        .iter()
        .filter(|item| item.is_child_of(parent_id))
        .collect();
    children.sort_by_key(|item| item.order);
    children
}

/// The order value a new child of `parent_id` should take: one past the
/// largest sibling order, or 0 when there are no siblings.
pub fn next_order(items: &[WorkspaceItem], parent_id: Option<&str>) -> i64 {
    items
        .iter()
        .filter(|item| item.is_child_of(parent_id))
        .map(|item| item.order)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

pub fn find<'a>(items: &'a [WorkspaceItem], id: &str) -> Option<&'a WorkspaceItem> {
    items.iter().find(|item| item.id == id)
}

/// Build an ID → item lookup map.
pub fn item_index(items: &[WorkspaceItem]) -> HashMap<&str, &WorkspaceItem> {
    items.iter().map(|item| (item.id.as_str(), item)).collect()
}

/// Root-level groups in sibling order.
pub fn root_groups(items: &[WorkspaceItem]) -> Vec<&WorkspaceItem> {
    children_of(items, None)
        .into_iter()
        .filter(|item| item.is_group())
        .collect()
}

/// `id` together with every transitive descendant (breadth-first over
/// `parent_id` back-references). Empty when `id` is absent.
pub fn subtree(items: &[WorkspaceItem], id: &str) -> HashSet<String> {
    let mut result = HashSet::new();
    if find(items, id).is_none() {
        return result;
    }

    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for item in items {
        if let Some(parent) = item.parent_id.as_deref() {
            children.entry(parent).or_default().push(item.id.as_str());
        }
    }

    let mut queue = VecDeque::from([id]);
    while let Some(current) = queue.pop_front() {
        if result.insert(current.to_string())
            && let Some(kids) = children.get(current)
        {
            queue.extend(kids.iter().copied());
        }
    }

    result
}

pub fn first_browser_tab(items: &[WorkspaceItem]) -> Option<&WorkspaceItem> {
    items.iter().find(|item| item.is_browser_tab())
}

/// Where new tabs land when the caller names no parent: the first root
/// group, or the root itself when there are no groups.
pub fn default_parent_id(items: &[WorkspaceItem]) -> Option<&str> {
    root_groups(items).first().map(|group| group.id.as_str())
}
