//! Category tree types.
//!
//! Categories link to their parent by title rather than by id. Titles are
//! unique case-insensitively, so a title always names at most one category.

use serde::{Deserialize, Serialize};

use storekeep_core::{CategoryCode, CategoryId};

/// A persisted category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    pub code: CategoryCode,
    pub description: String,
    /// Title of the parent category, `None` for roots.
    pub parent: Option<String>,
}

impl Category {
    /// Whether this category's title matches `title`, ignoring case.
    #[must_use]
    pub fn has_title(&self, title: &str) -> bool {
        self.title.to_lowercase() == title.trim().to_lowercase()
    }

    /// Whether `parent` names this category's parent.
    #[must_use]
    pub fn is_child_of(&self, parent_title: &str) -> bool {
        self.parent
            .as_deref()
            .is_some_and(|p| p.to_lowercase() == parent_title.to_lowercase())
    }
}

/// Raw category fields as submitted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryInput {
    pub title: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub parent: Option<String>,
}

/// Validated category fields, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub title: String,
    pub code: CategoryCode,
    pub description: String,
    pub parent: Option<String>,
}

impl CategoryDraft {
    /// Whether applying this draft to `existing` would change nothing.
    ///
    /// Title and code compare case-insensitively; description and parent
    /// compare exactly.
    #[must_use]
    pub fn is_unchanged_from(&self, existing: &Category) -> bool {
        existing.has_title(&self.title)
            && self.code.eq_ignore_case(existing.code.as_str())
            && self.description == existing.description
            && self.parent == existing.parent
    }

    /// Materialize the draft as a category with the given id.
    #[must_use]
    pub fn into_category(self, id: CategoryId) -> Category {
        Category {
            id,
            title: self.title,
            code: self.code,
            description: self.description,
            parent: self.parent,
        }
    }
}
