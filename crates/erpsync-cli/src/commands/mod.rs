//! CLI command implementations

pub mod config;
pub mod context;
pub mod queue;
pub mod reconcile;
pub mod refresh;
pub mod sync;
