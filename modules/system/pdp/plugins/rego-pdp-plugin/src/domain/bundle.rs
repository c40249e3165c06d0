//! Policy bundle discovery.

use std::fs;
use std::path::{Path, PathBuf};

use pdp_sdk::EvaluatorError;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::RegoPluginConfig;

/// A base data document and where it is mounted under `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDocument {
    pub path: String,
    /// Directory components between the bundle root and the file;
    /// `a/b/data.json` is mounted at `data.a.b`.
    pub mount: Vec<String>,
    pub json: String,
}

/// Sources read from a bundle location.
#[derive(Debug, Default)]
pub struct Bundle {
    /// `(path, source)` of every policy module, in file-name order.
    pub policies: Vec<(String, String)>,
    pub data: Vec<DataDocument>,
}

fn mount_of(root: &Path, file: &Path) -> Vec<String> {
    file.parent()
        .and_then(|dir| dir.strip_prefix(root).ok())
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

fn load_error(location: &Path, reason: impl Into<String>) -> EvaluatorError {
    EvaluatorError::BundleLoad {
        location: location.display().to_string(),
        reason: reason.into(),
    }
}

fn read(location: &Path, file: &Path) -> Result<(String, String), EvaluatorError> {
    let source = fs::read_to_string(file)
        .map_err(|e| load_error(location, format!("cannot read {}: {e}", file.display())))?;
    Ok((file.display().to_string(), source))
}

/// Read the bundle at `location`: a directory walked recursively, or a
/// single policy file.
///
/// # Errors
///
/// [`EvaluatorError::BundleLoad`] if the location is unreadable or holds no
/// policy modules.
pub fn load(location: &Path, config: &RegoPluginConfig) -> Result<Bundle, EvaluatorError> {
    let mut bundle = Bundle::default();

    if location.is_file() {
        bundle.policies.push(read(location, location)?);
        return Ok(bundle);
    }
    if !location.is_dir() {
        return Err(load_error(location, "no such file or directory"));
    }

    for entry in WalkDir::new(location).sort_by_file_name() {
        let entry = entry.map_err(|e| load_error(location, e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path: PathBuf = entry.into_path();

        if path
            .file_name()
            .is_some_and(|name| name == config.data_file_name.as_str())
        {
            let (file, json) = read(location, &path)?;
            bundle.data.push(DataDocument {
                path: file,
                mount: mount_of(location, &path),
                json,
            });
        } else if path
            .extension()
            .is_some_and(|ext| ext == config.policy_extension.as_str())
        {
            bundle.policies.push(read(location, &path)?);
        }
    }

    if bundle.policies.is_empty() {
        return Err(load_error(location, "bundle contains no policy modules"));
    }

    debug!(
        policies = bundle.policies.len(),
        data_documents = bundle.data.len(),
        "Loaded policy bundle"
    );
    Ok(bundle)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn collects_policies_and_data_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("authz/nested")).unwrap();
        fs::write(dir.path().join("authz/a.rego"), "package a").unwrap();
        fs::write(dir.path().join("authz/nested/b.rego"), "package b").unwrap();
        fs::write(dir.path().join("authz/data.json"), "{}").unwrap();
        fs::write(dir.path().join("authz/README.md"), "ignored").unwrap();

        let bundle = load(dir.path(), &RegoPluginConfig::default()).unwrap();
        assert_eq!(bundle.policies.len(), 2);
        assert_eq!(bundle.data.len(), 1);
        assert!(bundle.policies.iter().any(|(p, _)| p.ends_with("b.rego")));
        assert_eq!(bundle.data[0].mount, vec!["authz".to_owned()]);
    }

    #[test]
    fn root_data_document_mounts_at_data_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("policy.rego"), "package a").unwrap();
        fs::write(dir.path().join("data.json"), "{}").unwrap();

        let bundle = load(dir.path(), &RegoPluginConfig::default()).unwrap();
        assert!(bundle.data[0].mount.is_empty());
    }

    #[test]
    fn single_file_bundle_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("policy.rego");
        fs::write(&file, "package a").unwrap();

        let bundle = load(&file, &RegoPluginConfig::default()).unwrap();
        assert_eq!(bundle.policies.len(), 1);
        assert!(bundle.data.is_empty());
    }

    #[test]
    fn empty_or_missing_bundle_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(dir.path(), &RegoPluginConfig::default()),
            Err(EvaluatorError::BundleLoad { .. })
        ));
        assert!(matches!(
            load(&dir.path().join("nope"), &RegoPluginConfig::default()),
            Err(EvaluatorError::BundleLoad { .. })
        ));
    }
}
