//! Validation issue types.

use serde::{Deserialize, Serialize};

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reviewable or auto-repairable; does not fail the run.
    Warning,
    /// Structural problem or unresolved gap; fails the run.
    Error,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// A single finding from a validation run.
///
/// Produced fresh per run; never persisted across runs except through
/// the external log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Table the issue belongs to.
    pub table: String,
    /// Affected column, when the issue is column-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// Candidate automatic correction (e.g. the actual header a
    /// declared column resolved to).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

impl ValidationIssue {
    /// Create an error-severity issue.
    pub fn error(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            table: table.into(),
            column: None,
            message: message.into(),
            suggested_fix: None,
        }
    }

    /// Create a warning-severity issue.
    pub fn warning(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            table: table.into(),
            column: None,
            message: message.into(),
            suggested_fix: None,
        }
    }

    /// Set the affected column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Set the suggested fix.
    pub fn with_suggested_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let issue = ValidationIssue::warning("invoices", "column 'fund_id' matched 'FundID'")
            .with_column("fund_id")
            .with_suggested_fix("FundID");

        assert_eq!(issue.severity, Severity::Warning);
        assert_eq!(issue.column.as_deref(), Some("fund_id"));
        assert_eq!(issue.suggested_fix.as_deref(), Some("FundID"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_severity_serde() {
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"error\"");
    }
}
