#![doc = include_str!("../README.md")]

mod ids;
mod ops;
mod query;
mod reconcile;
mod runtime;
mod session;
mod types;
mod url;

pub mod v1 {
    //! Versioned public API for the workspace model.
    //!
    //! Everything you need is re-exported from this module:
    //!
    //! # Items
    //!
    //! - [`WorkspaceItem`]: one node of the flat collection
    //! - [`ItemKind`]: group, browser tab, or file reference
    //! - [`seed_workspace`]: the collection a fresh session starts from
    //!
    //! # Operations
    //!
    //! Pure snapshot-in, snapshot-out functions. An unknown id is never an
    //! error; the input comes back unchanged.
    //!
    //! - [`toggle_group_collapsed`], [`rename_or_update_tab`], [`apply_runtime_update`]
    //! - [`add_group`], [`add_browser_tab`]: return [`Added`] with the new id
    //! - [`remove_item`]: cascades to descendants
    //! - [`move_item`], [`move_item_by_drop`]: reordering and reparenting
    //!
    //! # Session
    //!
    //! [`session::UiSessionState`] bundles the items with the selection and
    //! address bar, and [`session::serialize`] / [`session::deserialize`]
    //! handle the versioned persisted form.
    //!
    //! # Example
    //!
    //! ```
    //! use pulse::v1::*;
    //!
    //! let mut ids = SequentialIds::new("item");
    //! let items = seed_workspace();
    //!
    //! let added = add_group(&items, "Reading", &mut ids);
    //! let tab = add_browser_tab(&added.items, Some(added.id.as_str()), "docs.rs", &mut ids);
    //! let items = move_item_by_drop(&tab.items, "tab-edge", &added.id);
    //!
    //! let reading: Vec<&str> = query::children_of(&items, Some(added.id.as_str()))
    //!     .iter()
    //!     .map(|item| item.id.as_str())
    //!     .collect();
    //! assert_eq!(reading, vec![tab.id.as_str(), "tab-edge"]);
    //!
    //! let state = session::UiSessionState::from_items(items);
    //! let json = session::serialize(&state).unwrap();
    //! assert_eq!(session::deserialize(&json).unwrap(), state);
    //! ```

    /// Hierarchy queries over `&[WorkspaceItem]`.
    pub mod query {
        pub use crate::query::{
            children_of, default_parent_id, find, first_browser_tab, item_index, next_order,
            root_groups, subtree,
        };
    }

    /// Address-bar normalization and URL-derived titles.
    pub mod url {
        pub use crate::url::{
            PLACEHOLDER_TITLE, SEARCH_ROOT, normalize_url, search_url, title_from_url,
        };
    }

    /// Session state and its versioned envelope.
    pub mod session {
        pub use crate::session::{
            CURRENT_SESSION_VERSION, DEFAULT_ADDRESS, RestoreError, RestoreReport, UiSessionState,
            deserialize, deserialize_with_report, restore_or_default, serialize,
        };
    }

    pub use crate::ids::{IdGenerator, SequentialIds, UuidGenerator};
    pub use crate::ops::{
        Added, DEFAULT_GROUP_TITLE, Direction, add_browser_tab, add_group, apply_runtime_update,
        move_item, next_selection_after_close, remove_item, rename_or_update_tab,
        toggle_group_collapsed,
    };
    pub use crate::reconcile::move_item_by_drop;
    pub use crate::runtime::{RuntimeEvent, RuntimeUpdate};
    pub use crate::types::{ItemKind, WorkspaceItem, seed_workspace};
}
