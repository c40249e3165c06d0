#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Rego Evaluator Plugin
//!
//! Rule-evaluation backend for the policy decision point. Loads a bundle of
//! Rego modules and base data documents once, checks the fixed query, and
//! evaluates it per request against a private copy of the interpreter.
//!
//! ## Bundle layout
//!
//! ```text
//! authz/bundle/
//! ├── application/authz/policy.rego   # package application.authz
//! ├── application/authz/data.json     # mounted at data.application.authz
//! └── data.json                       # merged into data
//! ```
//!
//! ## Configuration
//!
//! ```yaml
//! rego_pdp_plugin:
//!   policy_extension: "rego"
//!   data_file_name: "data.json"
//!   check_query: true
//! ```

pub mod config;
pub mod domain;

pub use config::RegoPluginConfig;
pub use domain::{PreparedRegoQuery, RegoEngine};
