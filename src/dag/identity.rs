// src/dag/identity.rs

//! Containers keyed by task identity.

use std::collections::HashMap;
use std::collections::hash_set::{self, HashSet};

use crate::types::TaskId;

/// Map keyed by task identity.
pub type IdentityMap<V> = HashMap<TaskId, V>;

/// A set of tasks compared by identity, never by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentitySet {
    ids: HashSet<TaskId>,
}

impl IdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the id was not already present.
    pub fn insert(&mut self, id: TaskId) -> bool {
        self.ids.insert(id)
    }

    /// Returns `true` if the id was present.
    pub fn remove(&mut self, id: TaskId) -> bool {
        self.ids.remove(&id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<TaskId> for IdentitySet {
    fn from_iter<I: IntoIterator<Item = TaskId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for IdentitySet {
    type Item = TaskId;
    type IntoIter = hash_set::IntoIter<TaskId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}
