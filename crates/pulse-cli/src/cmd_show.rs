use anyhow::Result;
use pulse::v1::session::{self, UiSessionState};
use pulse::v1::{ItemKind, WorkspaceItem, query};
use pulse_store::SessionStore;
use serde_json::Value;
use std::collections::HashSet;

pub fn run(store: &SessionStore, json: bool, pretty: bool) -> Result<()> {
    let state = store.load_session();
    if json {
        let tree = tree_json(&state);
        let out = if pretty {
            serde_json::to_string_pretty(&tree)?
        } else {
            serde_json::to_string(&tree)?
        };
        println!("{}", out);
    } else {
        print!("{}", render_tree(&state));
    }
    Ok(())
}

pub fn export(store: &SessionStore, pretty: bool) -> Result<()> {
    let state = store.load_session();
    let serialized = session::serialize(&state)?;
    if pretty {
        let value: Value = serde_json::from_str(&serialized)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", serialized);
    }
    Ok(())
}

/// Items reachable from the root, plus any whose parent is missing, in
/// display order.
fn top_level(items: &[WorkspaceItem]) -> Vec<&WorkspaceItem> {
    let index = query::item_index(items);
    let mut top = query::children_of(items, None);
    let mut orphans: Vec<&WorkspaceItem> = items
        .iter()
        .filter(|item| {
            item.parent_id
                .as_deref()
                .is_some_and(|parent| !index.contains_key(parent))
        })
        .collect();
    orphans.sort_by_key(|item| item.order);
    top.extend(orphans);
    top
}

/// Plain-text tree. The selected item is marked with `>`.
fn render_tree(state: &UiSessionState) -> String {
    let mut out = format!("Address: {}\n", state.address);
    let mut visited = HashSet::new();
    for item in top_level(&state.items) {
        render_item(state, item, 0, &mut visited, &mut out);
    }
    out
}

fn render_item<'a>(
    state: &'a UiSessionState,
    item: &'a WorkspaceItem,
    depth: usize,
    visited: &mut HashSet<&'a str>,
    out: &mut String,
) {
    if !visited.insert(item.id.as_str()) {
        return;
    }

    let marker = if item.id == state.selected_item_id {
        '>'
    } else {
        ' '
    };
    let indent = "  ".repeat(depth);
    let label = match &item.kind {
        ItemKind::Group { collapsed: true } => format!("[+] {}", item.title),
        ItemKind::Group { collapsed: false } => format!("[-] {}", item.title),
        ItemKind::BrowserTab { url } => format!("{} <{}>", item.title, url),
        ItemKind::FileRef { file_path } => format!("{} ({})", item.title, file_path),
    };
    out.push_str(&format!("{} {}{}  #{}\n", marker, indent, label, item.id));

    if item.is_group() {
        for child in query::children_of(&state.items, Some(item.id.as_str())) {
            render_item(state, child, depth + 1, visited, out);
        }
    }
}

/// The session as nested JSON: each group carries its `children`.
fn tree_json(state: &UiSessionState) -> Value {
    let mut visited = HashSet::new();
    let items: Vec<Value> = top_level(&state.items)
        .into_iter()
        .filter_map(|item| item_json(&state.items, item, &mut visited))
        .collect();

    serde_json::json!({
        "selectedItemId": state.selected_item_id,
        "address": state.address,
        "items": items,
    })
}

fn item_json<'a>(
    items: &'a [WorkspaceItem],
    item: &'a WorkspaceItem,
    visited: &mut HashSet<&'a str>,
) -> Option<Value> {
    if !visited.insert(item.id.as_str()) {
        return None;
    }

    let mut value = serde_json::to_value(item).ok()?;
    if item.is_group()
        && let Value::Object(map) = &mut value
    {
        let children: Vec<Value> = query::children_of(items, Some(item.id.as_str()))
            .into_iter()
            .filter_map(|child| item_json(items, child, visited))
            .collect();
        map.insert("children".into(), Value::Array(children));
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_seed() {
        let rendered = render_tree(&UiSessionState::default_session());
        let expected = "\
Address: https://www.microsoft.com/edge
  [-] Research  #group-research
>   Microsoft Edge <https://www.microsoft.com/edge>  #tab-edge
    CEF-RS <https://github.com/tauri-apps/cef-rs>  #tab-cef
  [-] Project  #group-project
    README.md (README.md)  #file-readme
    shadcn Registry <https://ui.shadcn.com/docs/registry/getting-started>  #tab-shadcn
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_collapsed_and_orphan() {
        let items = vec![
            WorkspaceItem::group("g", "Inbox").with_collapsed(true),
            WorkspaceItem::browser_tab("t", "Lost", "https://lost.example").with_parent("missing"),
        ];
        let state = UiSessionState::from_items(items);
        let rendered = render_tree(&state);
        assert!(rendered.contains("  [+] Inbox  #g\n"));
        assert!(rendered.contains("> Lost <https://lost.example>  #t\n"));
    }

    #[test]
    fn test_render_survives_parent_cycle() {
        let items = vec![
            WorkspaceItem::group("a", "A").with_parent("b"),
            WorkspaceItem::group("b", "B").with_parent("a"),
            WorkspaceItem::group("root", "Root"),
        ];
        let state = UiSessionState::from_items(items);
        let rendered = render_tree(&state);
        assert_eq!(rendered.lines().count(), 2);
    }

    #[test]
    fn test_tree_json_nests_children() {
        let tree = tree_json(&UiSessionState::default_session());
        assert_eq!(tree["selectedItemId"], "tab-edge");

        let roots = tree["items"].as_array().unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0]["id"], "group-research");

        let children = roots[0]["children"].as_array().unwrap();
        let ids: Vec<&str> = children.iter().map(|c| c["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["tab-edge", "tab-cef"]);
        assert!(children[0].get("children").is_none());
    }
}
