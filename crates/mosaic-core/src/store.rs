//! Persistence seam for saved product selections (likes, boards).
//!
//! The search pipeline never calls this; it exists so that layers above the
//! core can persist what a user picked from a result set.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CanonicalProduct;

/// Identifier assigned by the store on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionId(Uuid);

impl SelectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SelectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SelectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A labelled group of products chosen by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSelection {
    pub label: String,
    pub products: Vec<CanonicalProduct>,
}

impl SavedSelection {
    pub fn new(label: impl Into<String>, products: Vec<CanonicalProduct>) -> Self {
        Self {
            label: label.into(),
            products,
        }
    }
}

pub trait ProductStore: Send + Sync {
    fn save(&self, selection: SavedSelection) -> SelectionId;

    fn load(&self, id: SelectionId) -> Option<SavedSelection>;

    /// Returns `true` when something was removed.
    fn delete(&self, id: SelectionId) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    entries: Mutex<HashMap<SelectionId, SavedSelection>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProductStore for InMemoryProductStore {
    fn save(&self, selection: SavedSelection) -> SelectionId {
        let id = SelectionId::new();
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, selection);
        id
    }

    fn load(&self, id: SelectionId) -> Option<SavedSelection> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    fn delete(&self, id: SelectionId) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }
}
