//! Provenance tree of a resource.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Nested mapping describing how a resource was located.
///
/// The outermost key is the resource path; each nested level is a collection
/// name, innermost (most recently pushed) first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathTree(IndexMap<String, PathTree>);

impl PathTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a single chain of nested keys, first key outermost.
    pub fn from_chain<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: DoubleEndedIterator,
        S: Into<String>,
    {
        keys.into_iter().rev().fold(Self::new(), |child, key| {
            let mut parent = Self::new();
            parent.0.insert(key.into(), child);
            parent
        })
    }

    /// Get the subtree under `key`.
    pub fn get(&self, key: &str) -> Option<&PathTree> {
        self.0.get(key)
    }

    /// Keys at this level, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of keys at this level.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if this level has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of nested levels below and including this one.
    pub fn depth(&self) -> usize {
        self.0.values().map(|child| child.depth() + 1).max().unwrap_or(0)
    }

    /// Keys along the first branch, outermost first.
    pub fn first_chain(&self) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut pointer = self;
        while let Some((key, child)) = pointer.0.first() {
            chain.push(key.as_str());
            pointer = child;
        }
        chain
    }
}
