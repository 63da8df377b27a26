//! Worker model.
//!
//! Workers are interchangeable: the only thing that distinguishes them during
//! allocation is the set of items already on their calendar.

use serde::{Deserialize, Serialize};

/// A worker that items can be allocated to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    /// Unique worker identifier.
    pub id: String,
    /// Display name (used as the allocation tie-breaker).
    pub name: String,
}

impl Worker {
    /// Creates a worker whose display name equals its ID.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
