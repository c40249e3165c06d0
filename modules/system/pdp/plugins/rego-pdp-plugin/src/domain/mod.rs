//! Domain layer for the Rego evaluator plugin.

pub mod bundle;
pub mod engine;
pub mod prepared;

pub use engine::RegoEngine;
pub use prepared::PreparedRegoQuery;
