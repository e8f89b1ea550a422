use serde::{Deserialize, Serialize};

/// A node in the workspace collection: a [`Group`](ItemKind::Group), a
/// [`BrowserTab`](ItemKind::BrowserTab), or a [`FileRef`](ItemKind::FileRef).
///
/// The collection is flat. Hierarchy is expressed only through `parent_id`
/// (a group's id, or `None` for a root item) and sibling position through
/// `order`. Use [`crate::query::children_of`] to recover the tree.
///
/// # JSON shape
///
/// The variant is flattened into the item with a `kind` tag:
///
/// ```json
/// { "id": "group-research", "kind": "group", "parentId": null, "order": 0,
///   "title": "Research", "collapsed": false }
/// { "id": "tab-edge", "kind": "browser-tab", "parentId": "group-research",
///   "order": 0, "title": "Microsoft Edge", "url": "https://www.microsoft.com/edge" }
/// { "id": "file-readme", "kind": "file-ref", "parentId": "group-project",
///   "order": 0, "title": "README.md", "filePath": "README.md" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceItem {
    pub id: String,
    #[serde(flatten)]
    pub kind: ItemKind,
    pub parent_id: Option<String>,
    pub order: i64,
    pub title: String,
}

/// Variant-specific data of a [`WorkspaceItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ItemKind {
    Group {
        collapsed: bool,
    },
    BrowserTab {
        url: String,
    },
    FileRef {
        #[serde(rename = "filePath")]
        file_path: String,
    },
}

impl ItemKind {
    /// The wire tag of this variant.
    pub fn tag(&self) -> &'static str {
        match self {
            ItemKind::Group { .. } => "group",
            ItemKind::BrowserTab { .. } => "browser-tab",
            ItemKind::FileRef { .. } => "file-ref",
        }
    }
}

impl WorkspaceItem {
    /// Create a root group, expanded, at order 0.
    pub fn group(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Group { collapsed: false },
            parent_id: None,
            order: 0,
            title: title.into(),
        }
    }

    /// Create a root browser tab at order 0. The URL is stored as given.
    pub fn browser_tab(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::BrowserTab { url: url.into() },
            parent_id: None,
            order: 0,
            title: title.into(),
        }
    }

    /// Create a root file reference at order 0.
    pub fn file_ref(
        id: impl Into<String>,
        title: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::FileRef {
                file_path: file_path.into(),
            },
            parent_id: None,
            order: 0,
            title: title.into(),
        }
    }

    /// Set the owning group
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Set the sibling order
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    /// Set the collapsed flag. Has no effect on non-group items.
    pub fn with_collapsed(mut self, value: bool) -> Self {
        if let ItemKind::Group { collapsed } = &mut self.kind {
            *collapsed = value;
        }
        self
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ItemKind::Group { .. })
    }

    pub fn is_browser_tab(&self) -> bool {
        matches!(self.kind, ItemKind::BrowserTab { .. })
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The tab URL, if this item is a browser tab.
    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::BrowserTab { url } => Some(url),
            _ => None,
        }
    }

    /// The collapsed flag, if this item is a group.
    pub fn collapsed(&self) -> Option<bool> {
        match self.kind {
            ItemKind::Group { collapsed } => Some(collapsed),
            _ => None,
        }
    }

    /// True when this item's parent is `parent_id` (`None` meaning root).
    pub fn is_child_of(&self, parent_id: Option<&str>) -> bool {
        self.parent_id.as_deref() == parent_id
    }
}

// ============================================================================
// Seed
// ============================================================================

/// The built-in collection a fresh session starts from.
pub fn seed_workspace() -> Vec<WorkspaceItem> {
    vec![
        WorkspaceItem::group("group-research", "Research").with_order(0),
        WorkspaceItem::browser_tab(
            "tab-edge",
            "Microsoft Edge",
            "https://www.microsoft.com/edge",
        )
        .with_parent("group-research")
        .with_order(0),
        WorkspaceItem::browser_tab(
            "tab-cef",
            "CEF-RS",
            "https://github.com/tauri-apps/cef-rs",
        )
        .with_parent("group-research")
        .with_order(1),
        WorkspaceItem::group("group-project", "Project").with_order(1),
        WorkspaceItem::file_ref("file-readme", "README.md", "README.md")
            .with_parent("group-project")
            .with_order(0),
        WorkspaceItem::browser_tab(
            "tab-shadcn",
            "shadcn Registry",
            "https://ui.shadcn.com/docs/registry/getting-started",
        )
        .with_parent("group-project")
        .with_order(1),
    ]
}
