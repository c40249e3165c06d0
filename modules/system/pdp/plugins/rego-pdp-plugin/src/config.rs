//! Configuration for the Rego evaluator plugin.

use serde::{Deserialize, Serialize};

/// Plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegoPluginConfig {
    /// Extension of policy source files inside a bundle directory.
    pub policy_extension: String,

    /// File name of base data documents inside a bundle directory.
    pub data_file_name: String,

    /// Evaluate the query once with an empty input while preparing, so that
    /// syntax errors surface at startup instead of on the first request.
    pub check_query: bool,
}

impl Default for RegoPluginConfig {
    fn default() -> Self {
        Self {
            policy_extension: "rego".to_owned(),
            data_file_name: "data.json".to_owned(),
            check_query: true,
        }
    }
}
