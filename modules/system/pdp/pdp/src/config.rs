//! Configuration for the policy decision point.

use std::path::PathBuf;
use std::time::Duration;

use pdp_sdk::ValidationOptions;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Configuration.
///
/// Startup-time only; applying a changed configuration requires an explicit
/// [`Service::reload`](crate::domain::Service::reload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PdpConfig {
    /// Policy bundle location (directory or single policy file).
    pub bundle_path: PathBuf,

    /// Fixed query evaluated for every request.
    pub query: String,

    /// Variable the query binds to the boolean decision.
    pub result_binding: String,

    /// Upper bound on a single evaluation, e.g. `"250ms"` or `"5s"`.
    #[serde(with = "humantime_duration")]
    pub eval_timeout: Duration,

    /// Reject operations outside the known set as malformed.
    pub strict_operations: bool,
}

impl Default for PdpConfig {
    fn default() -> Self {
        Self {
            bundle_path: PathBuf::from("./authz/bundle"),
            query: "x = data.application.authz.allow".to_owned(),
            result_binding: "x".to_owned(),
            eval_timeout: Duration::from_secs(5),
            strict_operations: false,
        }
    }
}

impl PdpConfig {
    /// Check invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidConfig`] for an empty query or binding, or a zero timeout.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.query.trim().is_empty() {
            return Err(DomainError::InvalidConfig("query must not be empty".to_owned()));
        }
        if self.result_binding.trim().is_empty() {
            return Err(DomainError::InvalidConfig(
                "result_binding must not be empty".to_owned(),
            ));
        }
        if self.eval_timeout.is_zero() {
            return Err(DomainError::InvalidConfig(
                "eval_timeout must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            strict_operations: self.strict_operations,
        }
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
