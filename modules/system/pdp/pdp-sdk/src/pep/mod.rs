//! PEP (Policy Enforcement Point) helpers.
//!
//! - [`PolicyEnforcer`] - PEP object (build request → evaluate → enforce)
//! - [`EnforcerError`] - Enforcement failure with status code and error id

pub mod enforcer;

pub use enforcer::{EnforcerError, POLICY_ERROR_ID, POLICY_ERROR_WHERE, PolicyEnforcer};
