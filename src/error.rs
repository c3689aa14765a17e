//! Error types for the install-config asset.

use thiserror::Error;

use crate::platform::PlatformKind;
use crate::validation::report::format_aggregate;
use crate::validation::ValidationIssue;

/// Fatal errors raised while producing the install-config asset.
///
/// Every variant names the stage that failed. Absence of a persisted file is
/// not an error and never appears here.
#[derive(Error, Debug)]
pub enum InstallConfigError {
    #[error("failed to fetch install config: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to resolve install config dependencies: {0}")]
    Dependency(#[from] DependencyError),

    #[error("failed to unmarshal {filename}: {message}")]
    Decode { filename: String, message: String },

    #[error("failed to upconvert install config: {0}")]
    Upconvert(#[from] UpconvertError),

    #[error("{}: {}", invalid_context(.filename), format_aggregate(.issues))]
    Invalid {
        filename: Option<String>,
        issues: Vec<ValidationIssue>,
    },

    #[error("failed to build {platform} client: {source}")]
    ClientConstruction {
        platform: PlatformKind,
        source: ClientError,
    },

    #[error("{platform} platform validation failed: {}", format_aggregate(.issues))]
    SemanticValidation {
        platform: PlatformKind,
        issues: Vec<ValidationIssue>,
    },

    #[error("failed to marshal install config: {0}")]
    Serialization(String),
}

fn invalid_context(filename: &Option<String>) -> String {
    match filename {
        Some(name) => format!("invalid {:?} file", name),
        None => "invalid install config".to_string(),
    }
}

/// Errors from a file-fetch collaborator other than the file being absent.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to read '{name}': {source}")]
    Io {
        name: String,
        source: std::io::Error,
    },
}

/// Errors from the collaborator that resolves the asset's parent inputs.
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("failed to read inputs file '{path}': {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse inputs file '{path}': {message}")]
    ParseFailed {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("dependency '{name}' is unavailable: {message}")]
    Unavailable { name: String, message: String },
}

/// Schema upconversion failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UpconvertError {
    #[error("cannot upconvert from version {0:?}")]
    UnsupportedVersion(String),

    #[error("cannot specify both {deprecated} and {replacement}")]
    Conflict {
        deprecated: &'static str,
        replacement: &'static str,
    },

    #[error("{field}: host subnet length {length} exceeds the address width of {cidr}")]
    HostSubnetLength {
        field: String,
        length: u8,
        cidr: String,
    },
}

/// Failures constructing or talking to a live platform client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("no credentials found; set one of: {0}")]
    MissingCredentials(String),

    #[error("no platform metadata available for {0}")]
    MissingMetadata(PlatformKind),

    #[error("metadata for {found} cannot build a {expected} client")]
    MetadataMismatch {
        expected: PlatformKind,
        found: PlatformKind,
    },

    #[error("failed to initialize HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to '{url}' failed: {message}")]
    Request { url: String, message: String },
}

/// Invalid CIDR notation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CidrError {
    #[error("invalid CIDR address: {0:?}")]
    Syntax(String),

    #[error("invalid CIDR address {cidr:?}: prefix length {prefix} exceeds {max}")]
    PrefixLength { cidr: String, prefix: u8, max: u8 },
}
