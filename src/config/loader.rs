//! Persisted install-config loading.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::migrate::upconvert;
use super::model::InstallConfig;
use super::INSTALL_CONFIG_FILENAME;
use crate::error::{FetchError, InstallConfigError};

static UNKNOWN_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"unknown field `([^`]+)`(?:, expected ([^\n]*))?").expect("valid regex"));

static BACKTICKED: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").expect("valid regex"));

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// A named file handed between assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Fetches asset files by name.
pub trait FileFetcher: Send + Sync {
    /// Returns `Ok(None)` when the file does not exist.
    fn fetch_by_name(&self, name: &str) -> Result<Option<AssetFile>, FetchError>;
}

/// Fetches asset files from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    dir: PathBuf,
}

impl FsFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileFetcher for FsFetcher {
    fn fetch_by_name(&self, name: &str) -> Result<Option<AssetFile>, FetchError> {
        let path = self.dir.join(name);
        match std::fs::read(&path) {
            Ok(data) => Ok(Some(AssetFile {
                filename: name.to_string(),
                data,
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FetchError::Io {
                name: path.display().to_string(),
                source: e,
            }),
        }
    }
}

/// Loads the persisted install config and upgrades it to the current schema.
///
/// Returns `Ok(None)` when no install config has been persisted.
pub fn load(fetcher: &dyn FileFetcher) -> Result<Option<InstallConfig>, InstallConfigError> {
    let file = match fetcher.fetch_by_name(INSTALL_CONFIG_FILENAME)? {
        Some(file) => file,
        None => {
            tracing::debug!(file = INSTALL_CONFIG_FILENAME, "No persisted install config");
            return Ok(None);
        }
    };

    let config = decode(&file)?;
    let config = upconvert(config)?;

    Ok(Some(config))
}

/// Strictly decodes a persisted install config, rejecting unknown fields.
pub fn decode(file: &AssetFile) -> Result<InstallConfig, InstallConfigError> {
    serde_yaml::from_slice(&file.data).map_err(|e| InstallConfigError::Decode {
        filename: file.filename.clone(),
        message: describe_decode_error(&e.to_string()),
    })
}

/// Names the first unknown field and suggests the closest known one.
fn describe_decode_error(message: &str) -> String {
    let captures = match UNKNOWN_FIELD.captures(message) {
        Some(captures) => captures,
        None => return message.to_string(),
    };

    let field = &captures[1];
    let suggestion = captures
        .get(2)
        .and_then(|expected| closest_field(field, expected.as_str()));

    match suggestion {
        Some(known) => format!(
            "failed to parse first occurrence of unknown field: {} (did you mean `{}`?)",
            message, known
        ),
        None => format!("failed to parse first occurrence of unknown field: {}", message),
    }
}

fn closest_field<'a>(field: &str, expected: &'a str) -> Option<&'a str> {
    BACKTICKED
        .captures_iter(expected)
        .filter_map(|c| c.get(1))
        .map(|m| (m.as_str(), strsim::jaro_winkler(field, m.as_str())))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::MemoryFetcher;
    use crate::error::UpconvertError;
    use std::collections::HashMap;

    const MINIMAL: &str = r#"
apiVersion: v1
metadata:
  name: demo
baseDomain: example.com
pullSecret: '{"auths": {}}'
platform:
  none: {}
"#;

    #[test]
    fn missing_file_is_not_an_error() {
        let fetcher = MemoryFetcher(HashMap::new());
        assert!(load(&fetcher).unwrap().is_none());
    }

    #[test]
    fn loads_minimal_document() {
        let config = load(&MemoryFetcher::with(MINIMAL)).unwrap().unwrap();
        assert_eq!(config.cluster_name(), "demo");
        assert_eq!(config.base_domain, "example.com");
        assert!(config.networking.is_none());
    }

    #[test]
    fn unknown_top_level_field_is_named() {
        let content = format!("{}baseDomian: example.org\n", MINIMAL);
        let err = load(&MemoryFetcher::with(&content)).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, InstallConfigError::Decode { .. }));
        assert!(message.starts_with("failed to unmarshal install-config.yaml"), "{}", message);
        assert!(message.contains("unknown field `baseDomian`"), "{}", message);
        assert!(message.contains("did you mean `baseDomain`?"), "{}", message);
    }

    #[test]
    fn unknown_nested_field_is_named() {
        let content = MINIMAL.replace("  name: demo", "  name: demo\n  namespace: default");
        let message = load(&MemoryFetcher::with(&content)).unwrap_err().to_string();
        assert!(message.contains("failed to parse first occurrence of unknown field"));
        assert!(message.contains("unknown field `namespace`"), "{}", message);
    }

    #[test]
    fn type_mismatch_is_a_decode_error() {
        let content = MINIMAL.replace("baseDomain: example.com", "baseDomain: [a, b]");
        let err = load(&MemoryFetcher::with(&content)).unwrap_err();
        assert!(matches!(err, InstallConfigError::Decode { .. }));
        assert!(!err.to_string().contains("unknown field"));
    }

    #[test]
    fn upconvert_failure_is_reported() {
        let content = MINIMAL.replace("apiVersion: v1", "apiVersion: v0");
        let err = load(&MemoryFetcher::with(&content)).unwrap_err();
        assert!(matches!(
            err,
            InstallConfigError::Upconvert(UpconvertError::UnsupportedVersion(ref v)) if v == "v0"
        ));
    }

    #[test]
    fn old_documents_are_upgraded() {
        let content = MINIMAL.replace("apiVersion: v1", "apiVersion: v1beta3")
            + "networking:\n  machineCIDR: 10.0.0.0/16\n  type: OpenShiftSDN\n";
        let config = load(&MemoryFetcher::with(&content)).unwrap().unwrap();
        assert_eq!(config.api_version, "v1");
        let networking = config.networking.unwrap();
        assert_eq!(networking.machine_network[0].cidr.to_string(), "10.0.0.0/16");
        assert_eq!(networking.network_type, "OpenShiftSDN");
    }

    #[test]
    fn fs_fetcher_distinguishes_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FsFetcher::new(dir.path());
        assert_eq!(fetcher.dir(), dir.path());
        assert!(fetcher.fetch_by_name(INSTALL_CONFIG_FILENAME).unwrap().is_none());

        std::fs::write(dir.path().join(INSTALL_CONFIG_FILENAME), MINIMAL).unwrap();
        let file = fetcher.fetch_by_name(INSTALL_CONFIG_FILENAME).unwrap().unwrap();
        assert_eq!(file.filename, INSTALL_CONFIG_FILENAME);
        assert_eq!(file.data, MINIMAL.as_bytes());
    }

    #[test]
    fn fs_fetcher_reports_other_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(INSTALL_CONFIG_FILENAME)).unwrap();
        let fetcher = FsFetcher::new(dir.path());
        assert!(fetcher.fetch_by_name(INSTALL_CONFIG_FILENAME).is_err());
    }

    #[test]
    fn closest_field_threshold() {
        let expected = "one of `apiVersion`, `baseDomain`, `pullSecret`";
        assert_eq!(closest_field("pullsecret", expected), Some("pullSecret"));
        assert_eq!(closest_field("zzz", expected), None);
    }
}
