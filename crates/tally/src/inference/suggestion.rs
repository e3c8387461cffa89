//! Proposed replacement values for defective foreign keys.

use serde::{Deserialize, Serialize};

/// A proposed replacement for a missing or invalid foreign-key value.
///
/// Created once by the inference engine per defective row and consumed
/// once by the repair applier; confidence is never adjusted after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySuggestion {
    /// Table the defective row lives in.
    pub table: String,
    /// Ordinal position of the row within its source table.
    pub row_index: usize,
    /// The foreign-key column, e.g. `fund_id`.
    pub column: String,
    /// The value currently in place (possibly empty or invalid).
    pub current_value: String,
    /// The value proposed instead.
    pub proposed_value: String,
    /// Confidence in the proposal (0.0-1.0).
    pub confidence: f64,
    /// Human-readable justification naming the rule and the supporting
    /// row count.
    pub evidence: String,
}

impl KeySuggestion {
    /// Create a new suggestion.
    pub fn new(
        table: impl Into<String>,
        row_index: usize,
        column: impl Into<String>,
        current_value: impl Into<String>,
        proposed_value: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            row_index,
            column: column.into(),
            current_value: current_value.into(),
            proposed_value: proposed_value.into(),
            confidence: 0.0,
            evidence: String::new(),
        }
    }

    /// Set the confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set the evidence string.
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = evidence.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_suggestion() {
        let suggestion = KeySuggestion::new("invoices", 4, "fund_id", "", "F3")
            .with_confidence(0.95)
            .with_evidence("direct sibling match: 5 supporting rows");

        assert_eq!(suggestion.table, "invoices");
        assert_eq!(suggestion.row_index, 4);
        assert_eq!(suggestion.proposed_value, "F3");
        assert_eq!(suggestion.confidence, 0.95);
    }
}
