//! Install-config validation.
//!
//! Structural validation runs declarative rules that need no network access.
//! Platform semantic validation lives with each platform and reports issues
//! in the same shape.

pub mod networking;
pub mod report;
pub mod structural;

use serde::Serialize;

use crate::config::model::InstallConfig;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    /// Rejects the configuration.
    Error,
    /// Logged but allows the configuration.
    Warning,
}

/// A validation issue tagged with the field path it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: ValidationSeverity,
    /// Path to the problematic field (e.g., "networking.clusterNetwork[0].hostPrefix").
    pub path: String,
    /// Description of the issue.
    pub message: String,
    /// Optional suggestion for fixing the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Creates a new error-level validation issue.
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ValidationSeverity::Error,
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Creates a new warning-level validation issue.
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ValidationSeverity::Warning,
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Error for a field that must be set.
    pub fn required(path: impl Into<String>) -> Self {
        Self::error(path, "Required value")
    }

    /// Error for a value outside a closed set.
    pub fn unsupported(path: impl Into<String>, value: &str, supported: &[&str]) -> Self {
        Self::error(path, format!("Unsupported value: {:?}", value))
            .with_suggestion(format!("supported values: {}", supported.join(", ")))
    }

    /// Adds a suggestion to this validation issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Result of validating a configuration.
#[derive(Debug, Default, Clone)]
pub struct ValidationResult {
    issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Creates an empty validation result.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds an issue to the result.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Extends the result with issues from another result.
    pub fn extend(&mut self, other: ValidationResult) {
        self.issues.extend(other.issues);
    }

    /// Returns true if there are no errors (warnings are allowed).
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == ValidationSeverity::Error)
    }

    /// Returns an iterator over error-level issues.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Error)
    }

    /// Returns an iterator over warning-level issues.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Warning)
    }

    /// Returns the total number of issues.
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Returns the number of errors.
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Consumes the result, keeping only error-level issues.
    pub fn into_errors(self) -> Vec<ValidationIssue> {
        self.issues
            .into_iter()
            .filter(|i| i.severity == ValidationSeverity::Error)
            .collect()
    }

    /// Logs every warning as a structured event.
    pub fn log_warnings(&self) {
        for issue in self.warnings() {
            tracing::warn!(
                path = %issue.path,
                message = %issue.message,
                suggestion = ?issue.suggestion,
                "Install config validation warning"
            );
        }
    }
}

/// Runs every structural rule against the configuration.
pub fn validate_install_config(config: &InstallConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.extend(structural::validate(config));
    if let Some(networking) = &config.networking {
        result.extend(networking::validate(networking));
    }

    result
}
