//! Layered configuration: built-in defaults, an optional YAML file,
//! `PDP_*` environment variables, then command-line overrides.

use std::path::{Path, PathBuf};

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use pdp::PdpConfig;
use rego_pdp_plugin::RegoPluginConfig;
use serde::{Deserialize, Serialize};

/// Keys of the `pdp` section that may be set from the environment.
const ENV_KEYS: &[&str] = &[
    "bundle_path",
    "query",
    "result_binding",
    "eval_timeout",
    "strict_operations",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub pdp: PdpConfig,
    pub rego_pdp_plugin: RegoPluginConfig,
}

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bundle: Option<PathBuf>,
    pub query: Option<String>,
}

impl AppConfig {
    /// # Errors
    ///
    /// Fails when an explicitly named file is missing or any layer does not
    /// match the configuration shape.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = file {
            if !path.exists() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        figment = figment.merge(
            Env::prefixed("PDP_")
                .filter(|key| ENV_KEYS.iter().any(|k| key.as_str().eq_ignore_ascii_case(k)))
                .map(|key| format!("pdp.{}", key.as_str().to_ascii_lowercase()).into()),
        );

        if let Some(bundle) = &overrides.bundle {
            figment = figment.merge(Serialized::default("pdp.bundle_path", bundle));
        }
        if let Some(query) = &overrides.query {
            figment = figment.merge(Serialized::default("pdp.query", query));
        }

        figment.extract().context("invalid configuration")
    }
}
