//! Pipeline data model and configuration-propagation engine.
//!
//! This crate has no I/O of its own: it defines the entities that make up a
//! pipeline graph (projects, blocks, entrypoints, ports, edges), the value
//! type carried in every config map, the rules that govern how configuration
//! flows across an edge, and the shared error-code taxonomy every other
//! crate in the workspace maps its own errors onto.

pub mod codes;
pub mod config;
pub mod defaults;
pub mod error;
pub mod model;

pub use codes::ErrorCode;
pub use error::CoreError;
pub use model::{
    Block, DataType, Direction, Edge, Entrypoint, Port, Project, ScyflowUuid,
};

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CoreError>;
