//! Drag-and-drop reconciliation.
//!
//! The caller resolves the pointer gesture into a pair of ids: the dragged
//! (*active*) item and the item it was released over. This module turns
//! that pair into new `parent_id`/`order` assignments.

use crate::ops::order_map;
use crate::query::{children_of, find, root_groups, subtree};
use crate::types::WorkspaceItem;

/// Apply a drop of `active_id` onto `over_id`.
///
/// Groups only reorder among root groups. Tabs and file refs are always
/// reparented to the target's group (the target itself when it is a group)
/// and inserted before the target when it is a sibling, or appended
/// otherwise. Every sibling set touched ends up numbered `0..n`.
///
/// Unknown ids, `active_id == over_id`, and targets that do not resolve to
/// a group return the input unchanged.
///
/// # Examples
///
/// ```
/// use pulse::v1::{WorkspaceItem, move_item_by_drop, query};
///
/// let items = vec![
///     WorkspaceItem::group("g1", "G1"),
///     WorkspaceItem::browser_tab("t1", "T1", "https://a.com").with_parent("g1"),
///     WorkspaceItem::browser_tab("t2", "T2", "https://b.com").with_parent("g1").with_order(1),
/// ];
///
/// let next = move_item_by_drop(&items, "t2", "t1");
/// assert_eq!(query::find(&next, "t2").unwrap().order, 0);
/// assert_eq!(query::find(&next, "t1").unwrap().order, 1);
/// ```
pub fn move_item_by_drop(items: &[WorkspaceItem], active_id: &str, over_id: &str) -> Vec<WorkspaceItem> {
    if active_id == over_id {
        return items.to_vec();
    }

    let (Some(active), Some(over)) = (find(items, active_id), find(items, over_id)) else {
        return items.to_vec();
    };

    if active.is_group() {
        move_group(items, active, over)
    } else {
        move_child(items, active, over)
    }
}

/// The group a drop onto `over` lands in.
fn target_group_id(over: &WorkspaceItem) -> Option<&str> {
    if over.is_group() {
        Some(over.id.as_str())
    } else {
        over.parent_id.as_deref()
    }
}

fn move_group(items: &[WorkspaceItem], active: &WorkspaceItem, over: &WorkspaceItem) -> Vec<WorkspaceItem> {
    let Some(target_id) = target_group_id(over) else {
        return items.to_vec();
    };
    if target_id == active.id || subtree(items, &active.id).contains(target_id) {
        return items.to_vec();
    }

    let mut sequence: Vec<&str> = root_groups(items)
        .into_iter()
        .map(|group| group.id.as_str())
        .filter(|id| *id != active.id)
        .collect();
    let index = sequence
        .iter()
        .position(|id| *id == target_id)
        .unwrap_or(sequence.len());
    sequence.insert(index, active.id.as_str());

    let orders = order_map(&sequence);
    items
        .iter()
        .map(|item| {
            if !item.is_group() || !item.is_root() {
                return item.clone();
            }
            match orders.get(&item.id) {
                Some(&order) if order != item.order => item.clone().with_order(order),
                _ => item.clone(),
            }
        })
        .collect()
}

fn move_child(items: &[WorkspaceItem], active: &WorkspaceItem, over: &WorkspaceItem) -> Vec<WorkspaceItem> {
    let Some(target_id) = target_group_id(over) else {
        return items.to_vec();
    };
    if !find(items, target_id).is_some_and(WorkspaceItem::is_group) {
        return items.to_vec();
    }

    let source_id = active.parent_id.as_deref();
    let reparented: Vec<WorkspaceItem> = items
        .iter()
        .map(|item| {
            if item.id == active.id {
                item.clone().with_parent(target_id)
            } else {
                item.clone()
            }
        })
        .collect();

    let target_orders = order_map(&reorder_sibling_ids(&reparented, target_id, &active.id, over));
    let source_orders = if source_id == Some(target_id) {
        Default::default()
    } else {
        let remaining: Vec<&str> = children_of(&reparented, source_id)
            .into_iter()
            .map(|item| item.id.as_str())
            .filter(|id| *id != active.id)
            .collect();
        order_map(&remaining)
    };

    reparented
        .into_iter()
        .map(|item| {
            let orders = if item.is_child_of(Some(target_id)) {
                &target_orders
            } else if item.is_child_of(source_id) {
                &source_orders
            } else {
                return item;
            };
            match orders.get(&item.id) {
                Some(&order) if order != item.order => item.with_order(order),
                _ => item,
            }
        })
        .collect()
}

/// Sibling ids of `parent_id` with `active_id` moved to just before `over`,
/// or to the end when `over` is not a non-group sibling.
fn reorder_sibling_ids(
    items: &[WorkspaceItem],
    parent_id: &str,
    active_id: &str,
    over: &WorkspaceItem,
) -> Vec<String> {
    let mut ids: Vec<String> = children_of(items, Some(parent_id))
        .into_iter()
        .filter(|item| item.id != active_id)
        .map(|item| item.id.clone())
        .collect();

    let index = if !over.is_group() && over.is_child_of(Some(parent_id)) {
        ids.iter().position(|id| *id == over.id)
    } else {
        None
    };
    let index = index.unwrap_or(ids.len());
    ids.insert(index, active_id.to_string());
    ids
}
