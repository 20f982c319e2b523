//! Memoization of route queries within one topology epoch.
//!
//! Keys are ordered `(from, to)` pairs: `(a, b)` and `(b, a)` are separate
//! entries. "No route" results are cached too, so repeatedly probing a
//! disconnected construction site costs one search per epoch.
//!
//! The cache never invalidates itself. Its owner must call [`RouteCache::clear`]
//! on every topology mutation before the mutating call returns.

use std::collections::HashMap;

use crate::ids::NodeId;
use crate::pathfinding::Route;

#[derive(Debug, Clone, Default)]
pub struct RouteCache {
    entries: HashMap<(NodeId, NodeId), Option<Route>>,
    epoch: u64,
    hits: u64,
    misses: u64,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a memoized result. The outer `Option` is the cache hit, the
    /// inner one is the route (or `None` for "no route").
    pub fn get(&mut self, from: NodeId, to: NodeId) -> Option<Option<Route>> {
        match self.entries.get(&(from, to)) {
            Some(hit) => {
                self.hits += 1;
                Some(hit.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, from: NodeId, to: NodeId, route: Option<Route>) {
        self.entries.insert((from, to), route);
    }

    /// Drop every entry and start a new epoch.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.epoch += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of `clear` calls so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
