//! Pure graph logic for AntNest.
//!
//! This crate holds the traversal graph of the nest and the route search over
//! it. It knows nothing about factories, save data, or agents: callers feed it
//! nodes and edges and ask it for routes, which keeps it unit-testable in
//! isolation from the runtime crate.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`geometry`] | `Vec3` world positions and distances |
//! | [`ids`] | Stable arena handles for nodes, elements and element edges |
//! | [`graph`] | `NavGraph`: tombstoned node arena with adjacency lists |
//! | [`pathfinding`] | Deterministic A* search producing a [`pathfinding::Route`] |
//! | [`route_cache`] | `(from, to)` memoization cleared on topology change |

pub mod geometry;
pub mod graph;
pub mod ids;
pub mod pathfinding;
pub mod route_cache;

pub use geometry::Vec3;
pub use graph::{NavGraph, PathNode};
pub use ids::{EdgeId, ElementId, NodeId};
pub use pathfinding::{find_route, Route, RouteError};
pub use route_cache::RouteCache;
