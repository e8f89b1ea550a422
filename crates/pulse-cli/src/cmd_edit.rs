use anyhow::{Result, bail};
use clap::{Subcommand, ValueEnum};
use pulse::v1::session::UiSessionState;
use pulse::v1::{
    DEFAULT_GROUP_TITLE, Direction, IdGenerator, RuntimeEvent, UuidGenerator, add_browser_tab,
    add_group, move_item, move_item_by_drop, query, remove_item, toggle_group_collapsed,
};
use pulse_store::SessionStore;

#[derive(Subcommand, Debug, Clone)]
pub enum EditOp {
    /// Append a root group
    AddGroup {
        /// Group title
        #[arg(long)]
        title: Option<String>,
    },
    /// Open a browser tab and select it
    AddTab {
        /// Parent group id (defaults to the first root group)
        #[arg(long)]
        parent: Option<String>,

        /// URL or search phrase
        url: String,
    },
    /// Remove an item and everything under it
    Remove { id: String },
    /// Collapse or expand a group
    Toggle { id: String },
    /// Drop one item onto another
    Move {
        /// Dragged item id
        active: String,

        /// Drop target id
        over: String,
    },
    /// Swap an item with its neighbour
    Shift {
        id: String,

        #[arg(value_enum)]
        direction: ShiftDirection,
    },
    /// Submit address-bar input
    Navigate { input: String },
    /// Select an item
    Select { id: String },
    /// Apply a `{tabId, url?, title?}` runtime event
    RuntimeEvent { json: String },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ShiftDirection {
    Up,
    Down,
}

impl From<ShiftDirection> for Direction {
    fn from(direction: ShiftDirection) -> Self {
        match direction {
            ShiftDirection::Up => Direction::Up,
            ShiftDirection::Down => Direction::Down,
        }
    }
}

pub fn run(store: &SessionStore, op: EditOp) -> Result<()> {
    let state = store.load_session();
    let (next, message) = apply(&state, op, UuidGenerator)?;
    save(store, &next)?;
    println!("{}", message);
    Ok(())
}

pub fn reset(store: &SessionStore) -> Result<()> {
    save(store, &UiSessionState::default_session())?;
    println!("Session reset to the seed workspace");
    Ok(())
}

fn save(store: &SessionStore, state: &UiSessionState) -> Result<()> {
    if !store.save_session(state) {
        bail!("Failed to save session: no store accepted the write");
    }
    Ok(())
}

/// Apply `op` to `state`, returning the new state and a summary line.
fn apply(
    state: &UiSessionState,
    op: EditOp,
    ids: impl IdGenerator,
) -> Result<(UiSessionState, String)> {
    match op {
        EditOp::AddGroup { title } => {
            let title = title.as_deref().unwrap_or(DEFAULT_GROUP_TITLE);
            let added = add_group(&state.items, title, ids);
            let message = format!("Added group {}", added.id);
            Ok((state.with_items(added.items), message))
        }
        EditOp::AddTab { parent, url } => {
            let parent = match parent {
                Some(id) => {
                    require_group(state, &id)?;
                    Some(id)
                }
                None => query::default_parent_id(&state.items).map(str::to_string),
            };
            let added = add_browser_tab(&state.items, parent.as_deref(), &url, ids);
            let next = state.with_items(added.items).select(&added.id);
            let message = format!("Added tab {} -> {}", added.id, next.address);
            Ok((next, message))
        }
        EditOp::Remove { id } => {
            let item = require_item(state, &id)?;
            let next = if item.is_browser_tab() {
                state.close_tab(&id)
            } else {
                state.with_items(remove_item(&state.items, &id))
            };
            let removed = state.items.len() - next.items.len();
            Ok((next, format!("Removed {} item(s)", removed)))
        }
        EditOp::Toggle { id } => {
            require_group(state, &id)?;
            let next = state.with_items(toggle_group_collapsed(&state.items, &id));
            let collapsed = query::find(&next.items, &id).and_then(|g| g.collapsed());
            let verb = if collapsed == Some(true) {
                "Collapsed"
            } else {
                "Expanded"
            };
            Ok((next, format!("{} {}", verb, id)))
        }
        EditOp::Move { active, over } => {
            require_item(state, &active)?;
            require_item(state, &over)?;
            let items = move_item_by_drop(&state.items, &active, &over);
            let message = if items == state.items {
                "No change".to_string()
            } else {
                format!("Moved {} onto {}", active, over)
            };
            Ok((state.with_items(items), message))
        }
        EditOp::Shift { id, direction } => {
            require_item(state, &id)?;
            let items = move_item(&state.items, &id, direction.into());
            let message = if items == state.items {
                "No change".to_string()
            } else {
                let way = match direction {
                    ShiftDirection::Up => "up",
                    ShiftDirection::Down => "down",
                };
                format!("Shifted {} {}", id, way)
            };
            Ok((state.with_items(items), message))
        }
        EditOp::Navigate { input } => {
            let next = state.navigate(&input, ids);
            let message = format!("{} -> {}", next.selected_item_id, next.address);
            Ok((next, message))
        }
        EditOp::Select { id } => {
            require_item(state, &id)?;
            Ok((state.select(&id), format!("Selected {}", id)))
        }
        EditOp::RuntimeEvent { json } => {
            let Some(event) = RuntimeEvent::from_json(&json) else {
                bail!("Invalid runtime event: expected {{\"tabId\": ..., \"url\"?, \"title\"?}}");
            };
            let tab = require_item(state, &event.tab_id)?;
            if !tab.is_browser_tab() {
                bail!("{} is not a browser tab", event.tab_id);
            }
            let message = format!("Updated {}", event.tab_id);
            Ok((state.apply_runtime_event(&event), message))
        }
    }
}

fn require_item<'a>(
    state: &'a UiSessionState,
    id: &str,
) -> Result<&'a pulse::v1::WorkspaceItem> {
    match query::find(&state.items, id) {
        Some(item) => Ok(item),
        None => bail!("No item with id {:?}", id),
    }
}

fn require_group(state: &UiSessionState, id: &str) -> Result<()> {
    if !require_item(state, id)?.is_group() {
        bail!("{} is not a group", id);
    }
    Ok(())
}
