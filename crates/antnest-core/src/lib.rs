//! AntNest Core - live ant nest runtime
//!
//! Owns the nest as the game sees it: structural elements (rooms, roads,
//! junctions) wired into one traversal graph, the ants walking it, and the
//! persisted records both are rebuilt from.
//!
//! # Architecture
//!
//! - **Records** ([`data`]): serde data describing elements, inter-element
//!   edges and ants. This is what gets saved.
//! - **Factories** ([`factory`]): turn a record into a live element blueprint
//!   or an ant entity, matched on the record's data kind.
//! - **Registry** ([`registry`]): the single owner of live state. Every
//!   topology change goes through it and clears the route cache.
//! - **Systems** ([`systems`]): builder strategy, movement and building,
//!   run over the registry's `hecs` world by the [`engine`].
//!
//! # Example
//!
//! ```rust,no_run
//! use antnest_core::prelude::*;
//!
//! let mut engine = NestEngine::default();
//! engine
//!     .registry
//!     .add_element(ElementRecord::new(ElementData::room(Vec3::ZERO, true)), true);
//! engine
//!     .registry
//!     .add_agent(AgentRecord::new(AgentData::Builder, Vec3::ZERO), true);
//!
//! loop {
//!     engine.update(1.0 / 60.0);
//! }
//! ```

pub mod components;
pub mod config;
pub mod data;
pub mod debug;
pub mod element;
pub mod engine;
pub mod factory;
pub mod persistence;
pub mod registry;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::NestConfig;
    pub use crate::data::*;
    pub use crate::element::{ElementBlueprint, ElementEdge, ElementKind, NestElement};
    pub use crate::engine::NestEngine;
    pub use crate::registry::{NestRegistry, RegistryError};
    pub use antnest_logic::{EdgeId, ElementId, NodeId, Route, RouteError, Vec3};
}
