//! The manual pick seam.

use std::path::{Path, PathBuf};

use folio_types::{ContentKind, FilterRules};

/// What the folder chooser is asked to show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickRequest {
    pub can_choose_directories: bool,
    pub can_choose_files: bool,
    pub allows_multiple_selection: bool,
    pub allowed_kinds: Vec<ContentKind>,
}

impl PickRequest {
    pub fn from_rules(rules: &FilterRules) -> Self {
        Self {
            can_choose_directories: true,
            can_choose_files: true,
            allows_multiple_selection: false,
            allowed_kinds: rules.allowed_kinds.clone(),
        }
    }
}

/// What the chooser handed back.
///
/// `confirmed` is `None` when the chooser has no separate confirm step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PickOutcome {
    pub selection: Option<PathBuf>,
    pub confirmed: Option<bool>,
}

impl PickOutcome {
    pub fn selected(path: impl Into<PathBuf>) -> Self {
        Self {
            selection: Some(path.into()),
            confirmed: Some(true),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            selection: None,
            confirmed: Some(false),
        }
    }

    /// The chosen path, unless the user backed out.
    pub fn accepted(&self) -> Option<&Path> {
        match self.confirmed {
            Some(false) => None,
            _ => self.selection.as_deref(),
        }
    }
}

/// A blocking "choose folder" dialog.
pub trait DialogAdapter: Send + Sync {
    fn choose(&self, request: &PickRequest) -> PickOutcome;
}
