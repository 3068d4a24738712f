// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Insertion-ordered, path-indexed collections.
//!
//! Ordering invariant: iteration yields entries in first-insertion order.
//! Replacing an existing path keeps its original position, so re-registering
//! a spec never perturbs instantiation order.

use std::fmt;

use rustc_hash::FxHashMap;

/// A path into an [`AttrTree`], rendered with `.` separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreePath(Vec<String>);

impl TreePath {
    /// Builds a path from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Path segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns `true` when `prefix` is a leading run of this path's segments.
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        prefix.len() <= self.0.len() && self.0.iter().zip(prefix).all(|(a, b)| a == b)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for TreePath {
    fn from(value: &str) -> Self {
        Self(vec![value.to_owned()])
    }
}

/// Name-indexed collection of specs or resolved values.
#[derive(Debug, Clone)]
pub struct AttrTree<T> {
    entries: Vec<(TreePath, T)>,
    index: FxHashMap<TreePath, usize>,
}

impl<T> Default for AttrTree<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<T> AttrTree<T> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `path`, returning the value it replaced.
    pub fn set_path(&mut self, path: impl Into<TreePath>, value: T) -> Option<T> {
        let path = path.into();
        if let Some(&slot) = self.index.get(&path) {
            return Some(std::mem::replace(&mut self.entries[slot].1, value));
        }
        self.index.insert(path.clone(), self.entries.len());
        self.entries.push((path, value));
        None
    }

    /// Looks up the value stored at `path`.
    pub fn get(&self, path: &TreePath) -> Option<&T> {
        self.index.get(path).map(|&slot| &self.entries[slot].1)
    }

    /// Looks up a single-segment path.
    pub fn get_name(&self, name: &str) -> Option<&T> {
        self.get(&TreePath::from(name))
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, path: &TreePath) -> Option<&mut T> {
        let slot = *self.index.get(path)?;
        Some(&mut self.entries[slot].1)
    }

    /// Returns `true` when a value is stored at `path`.
    pub fn contains(&self, path: &TreePath) -> bool {
        self.index.contains_key(path)
    }

    /// Iterates `(path, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&TreePath, &T)> {
        self.entries.iter().map(|(p, v)| (p, v))
    }

    /// Iterates values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Mutable iteration over values in insertion order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    /// Entries whose path begins with `prefix`, in insertion order.
    pub fn under<'a>(
        &'a self,
        prefix: &'a [&'a str],
    ) -> impl Iterator<Item = (&'a TreePath, &'a T)> {
        self.iter().filter(move |(p, _)| p.starts_with(prefix))
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the tree holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacing_a_path_keeps_its_position() {
        let mut tree = AttrTree::new();
        assert!(tree.set_path("a", 1).is_none());
        tree.set_path("b", 2);
        assert_eq!(tree.set_path("a", 3), Some(1));
        let values: Vec<_> = tree.values().copied().collect();
        assert_eq!(values, vec![3, 2]);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn prefix_listing_matches_whole_segments() {
        let mut tree = AttrTree::new();
        tree.set_path(TreePath::new(["V1", "Afferent"]), ());
        tree.set_path(TreePath::new(["V1SF2", "Afferent"]), ());
        let hits: Vec<_> = tree.under(&["V1"]).map(|(p, ())| p.to_string()).collect();
        assert_eq!(hits, vec!["V1.Afferent"]);
    }
}
