//! Validation report formatting.

use super::{ValidationIssue, ValidationResult, ValidationSeverity};

/// Formats a validation result into a human-readable report.
pub fn format_report(result: &ValidationResult) -> String {
    let errors: Vec<_> = result.errors().collect();
    let warnings: Vec<_> = result.warnings().collect();

    if errors.is_empty() && warnings.is_empty() {
        return "Install config is valid.".to_string();
    }

    let mut report = String::new();

    if !errors.is_empty() {
        report.push_str("\nInstall Config Validation Failed\n");
        report.push_str("================================\n\n");
    }

    for issue in &errors {
        report.push_str(&format_issue(issue));
        report.push('\n');
    }

    if !warnings.is_empty() {
        if !errors.is_empty() {
            report.push_str("\nWarnings:\n");
            report.push_str("---------\n\n");
        }
        for issue in &warnings {
            report.push_str(&format_issue(issue));
            report.push('\n');
        }
    }

    report.push_str("---\n");
    report.push_str(&format!(
        "{} warning(s), {} error(s)\n",
        warnings.len(),
        errors.len()
    ));

    report
}

/// Formats a single validation issue.
fn format_issue(issue: &ValidationIssue) -> String {
    let prefix = match issue.severity {
        ValidationSeverity::Error => "ERROR",
        ValidationSeverity::Warning => "WARNING",
    };

    let mut output = format!("{} {}\n", prefix, issue.path);
    output.push_str(&format!("  └─ {}\n", issue.message));

    if let Some(suggestion) = &issue.suggestion {
        output.push_str(&format!("     {}\n", suggestion));
    }

    output
}

/// Joins issues into a single line: `path: message` for one issue,
/// `[a: x, b: y]` for several.
pub fn format_aggregate(issues: &[ValidationIssue]) -> String {
    let parts: Vec<String> = issues
        .iter()
        .map(|issue| format!("{}: {}", issue.path, issue.message))
        .collect();

    match parts.len() {
        0 => String::new(),
        1 => parts[0].clone(),
        _ => format!("[{}]", parts.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_single_and_many() {
        let one = vec![ValidationIssue::required("baseDomain")];
        assert_eq!(format_aggregate(&one), "baseDomain: Required value");

        let two = vec![
            ValidationIssue::required("baseDomain"),
            ValidationIssue::error("metadata.name", "too long"),
        ];
        assert_eq!(
            format_aggregate(&two),
            "[baseDomain: Required value, metadata.name: too long]"
        );
    }

    #[test]
    fn report_lists_errors_before_warnings() {
        let mut result = ValidationResult::new();
        result.add(ValidationIssue::warning("fips", "not supported on arm64"));
        result.add(
            ValidationIssue::required("pullSecret").with_suggestion("paste the JSON from your registry"),
        );

        let report = format_report(&result);
        let error_at = report.find("ERROR pullSecret").unwrap();
        let warning_at = report.find("WARNING fips").unwrap();
        assert!(error_at < warning_at);
        assert!(report.contains("paste the JSON from your registry"));
        assert!(report.ends_with("1 warning(s), 1 error(s)\n"));
    }

    #[test]
    fn clean_report() {
        assert_eq!(format_report(&ValidationResult::new()), "Install config is valid.");
    }
}
