//! Walks the schema descriptor against loaded tables.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::DataTable;
use crate::matcher::ColumnMatcher;
use crate::repair::RepairRecord;
use crate::schema::SchemaDescriptor;

use super::issue::ValidationIssue;

/// Validator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Fraction of empty foreign-key values tolerated before a
    /// completeness warning is raised. 0.0 means any empty value warns.
    pub empty_fk_threshold: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            empty_fk_threshold: 0.0,
        }
    }
}

/// Result of a validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    /// Issues in report order: descriptor table order, and within a
    /// table, column issues before relationship issues.
    pub issues: Vec<ValidationIssue>,
    /// Header renames applied in auto-fix mode, pending persistence.
    pub renames: Vec<RepairRecord>,
    /// Per-table map from declared column name to the actual header it
    /// resolved to.
    pub resolutions: HashMap<String, HashMap<String, String>>,
}

impl ValidationOutcome {
    /// The actual header a declared column resolved to, if any.
    pub fn resolve(&self, table: &str, column: &str) -> Option<&str> {
        self.resolutions
            .get(table)?
            .get(column)
            .map(|s| s.as_str())
    }

    /// Whether both endpoints of a relationship resolved.
    pub fn relationship_resolved(&self, rel: &crate::schema::Relationship) -> bool {
        self.resolve(&rel.from_table, &rel.from_column).is_some()
            && self.resolve(&rel.to_table, &rel.to_column).is_some()
    }

    /// Count of error-severity issues.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == super::Severity::Error)
            .count()
    }

    /// Count of warning-severity issues.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == super::Severity::Warning)
            .count()
    }
}

/// Validates a schema descriptor against the loaded tables.
pub struct SchemaValidator<'a> {
    descriptor: &'a SchemaDescriptor,
    matcher: ColumnMatcher,
    config: ValidatorConfig,
}

impl<'a> SchemaValidator<'a> {
    /// Create a validator over a descriptor.
    pub fn new(descriptor: &'a SchemaDescriptor, matcher: ColumnMatcher) -> Self {
        Self {
            descriptor,
            matcher,
            config: ValidatorConfig::default(),
        }
    }

    /// Override the validator configuration.
    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Run all checks. When `auto_fix` is set, low-confidence column
    /// matches are repaired by renaming the in-memory header to the
    /// declared name; each rename is recorded as a [`RepairRecord`]
    /// attributed to `user`.
    pub fn validate(
        &self,
        tables: &mut IndexMap<String, DataTable>,
        auto_fix: bool,
        user: &str,
    ) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();
        // Column issues grouped per table so relationship issues can be
        // interleaved in report order afterwards.
        let mut column_issues: HashMap<String, Vec<ValidationIssue>> = HashMap::new();

        for declared in &self.descriptor.tables {
            let Some(table) = tables.get_mut(&declared.name) else {
                column_issues.entry(declared.name.clone()).or_default().push(
                    ValidationIssue::error(
                        &declared.name,
                        format!("table '{}' not found in tables directory", declared.name),
                    ),
                );
                continue;
            };

            let mut resolution: HashMap<String, String> = HashMap::new();
            let issues = column_issues.entry(declared.name.clone()).or_default();

            for column in &declared.columns {
                match self.matcher.best_match(column, &table.headers) {
                    None => {
                        issues.push(
                            ValidationIssue::error(
                                &declared.name,
                                format!(
                                    "column '{}' not found in table '{}'",
                                    column, declared.name
                                ),
                            )
                            .with_column(column.clone()),
                        );
                    }
                    Some(m) if m.confidence < 1.0 => {
                        issues.push(
                            ValidationIssue::warning(
                                &declared.name,
                                format!(
                                    "column '{}' resolved to '{}' ({} match, confidence {:.2})",
                                    column,
                                    m.name,
                                    m.tier.label(),
                                    m.confidence
                                ),
                            )
                            .with_column(column.clone())
                            .with_suggested_fix(m.name.clone()),
                        );
                        if auto_fix {
                            table.rename_header(&m.name, column);
                            outcome.renames.push(RepairRecord::header_rename(
                                &declared.name,
                                &m.name,
                                column,
                                user,
                            ));
                            tracing::info!(
                                table = %declared.name,
                                "renamed column '{}' to '{}'",
                                m.name,
                                column
                            );
                            resolution.insert(column.clone(), column.clone());
                        } else {
                            resolution.insert(column.clone(), m.name);
                        }
                    }
                    Some(m) => {
                        resolution.insert(column.clone(), m.name);
                    }
                }
            }

            outcome.resolutions.insert(declared.name.clone(), resolution);
        }

        // Assemble in report order: per table, column issues first,
        // then issues for relationships anchored at that table.
        for declared in &self.descriptor.tables {
            if let Some(issues) = column_issues.remove(&declared.name) {
                outcome.issues.extend(issues);
            }

            for rel in self
                .descriptor
                .relationships
                .iter()
                .filter(|r| r.from_table == declared.name)
            {
                if !outcome.relationship_resolved(rel) {
                    outcome.issues.push(ValidationIssue::error(
                        &rel.from_table,
                        format!("relationship '{}' references missing column", rel.label()),
                    ));
                    continue;
                }
                if let Some(issue) = self.check_completeness(rel, tables, &outcome) {
                    outcome.issues.push(issue);
                }
            }
        }

        tracing::info!(
            errors = outcome.error_count(),
            warnings = outcome.warning_count(),
            renames = outcome.renames.len(),
            "validation complete"
        );
        outcome
    }

    /// Check 4: the foreign-key column of the "many" side must be
    /// populated. Empty values beyond the configured fraction raise a
    /// warning, not an error, since the inference engine can repair
    /// them.
    fn check_completeness(
        &self,
        rel: &crate::schema::Relationship,
        tables: &IndexMap<String, DataTable>,
        outcome: &ValidationOutcome,
    ) -> Option<ValidationIssue> {
        let (fk_table, fk_column) = rel.foreign_key_side();
        let actual = outcome.resolve(fk_table, fk_column)?;
        let table = tables.get(fk_table)?;
        let idx = table.column_index(actual)?;

        let total = table.row_count();
        if total == 0 {
            return None;
        }
        let empty = table
            .column_values(idx)
            .filter(|v| DataTable::is_missing_value(v))
            .count();
        let fraction = empty as f64 / total as f64;
        if empty == 0 || fraction <= self.config.empty_fk_threshold {
            return None;
        }

        Some(
            ValidationIssue::warning(
                fk_table,
                format!(
                    "foreign key '{}' is empty in {} of {} rows ({}); repairable by key inference",
                    fk_column,
                    empty,
                    total,
                    rel.label()
                ),
            )
            .with_column(fk_column),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Cardinality, Relationship, TableSchema};
    use crate::validation::Severity;

    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor {
            tables: vec![
                TableSchema::new("funds", vec!["fund_id".into(), "name".into()])
                    .with_primary_key(vec!["fund_id".into()]),
                TableSchema::new(
                    "invoices",
                    vec!["invoice_id".into(), "vendor_id".into(), "fund_id".into()],
                )
                .with_primary_key(vec!["invoice_id".into()]),
            ],
            relationships: vec![Relationship {
                name: None,
                from_table: "invoices".into(),
                from_column: "fund_id".into(),
                to_table: "funds".into(),
                to_column: "fund_id".into(),
                cardinality: Cardinality::ManyToOne,
            }],
        }
    }

    fn loaded(headers: &[&str], rows: &[&[&str]], name: &str) -> DataTable {
        DataTable::new(
            name,
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn clean_tables() -> IndexMap<String, DataTable> {
        let mut tables = IndexMap::new();
        tables.insert(
            "funds".to_string(),
            loaded(&["fund_id", "name"], &[&["F1", "General"]], "funds"),
        );
        tables.insert(
            "invoices".to_string(),
            loaded(
                &["invoice_id", "vendor_id", "fund_id"],
                &[&["I1", "V1", "F1"]],
                "invoices",
            ),
        );
        tables
    }

    #[test]
    fn test_clean_schema_yields_no_issues() {
        let descriptor = descriptor();
        let validator = SchemaValidator::new(&descriptor, ColumnMatcher::new());
        let mut tables = clean_tables();
        let outcome = validator.validate(&mut tables, false, "test");
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.resolve("invoices", "fund_id"), Some("fund_id"));
    }

    #[test]
    fn test_missing_table_is_error() {
        let descriptor = descriptor();
        let validator = SchemaValidator::new(&descriptor, ColumnMatcher::new());
        let mut tables = clean_tables();
        tables.shift_remove("funds");
        let outcome = validator.validate(&mut tables, false, "test");

        assert!(outcome
            .issues
            .iter()
            .any(|i| i.severity == Severity::Error && i.table == "funds"));
        // The relationship referencing the missing table is flagged too
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.message.contains("relationship") && i.severity == Severity::Error));
    }

    #[test]
    fn test_renamed_column_warns_with_suggested_fix() {
        let descriptor = descriptor();
        let validator = SchemaValidator::new(&descriptor, ColumnMatcher::new());
        let mut tables = clean_tables();
        tables
            .get_mut("invoices")
            .unwrap()
            .rename_header("fund_id", "FundID");

        let outcome = validator.validate(&mut tables, false, "test");
        let warning = outcome
            .issues
            .iter()
            .find(|i| i.severity == Severity::Warning && i.column.as_deref() == Some("fund_id"))
            .unwrap();
        assert_eq!(warning.suggested_fix.as_deref(), Some("FundID"));
        assert_eq!(outcome.resolve("invoices", "fund_id"), Some("FundID"));
        assert!(outcome.renames.is_empty());
    }

    #[test]
    fn test_auto_fix_renames_and_records() {
        let descriptor = descriptor();
        let validator = SchemaValidator::new(&descriptor, ColumnMatcher::new());
        let mut tables = clean_tables();
        tables
            .get_mut("invoices")
            .unwrap()
            .rename_header("fund_id", "FundID");

        let outcome = validator.validate(&mut tables, true, "ops");
        assert_eq!(outcome.renames.len(), 1);
        let record = &outcome.renames[0];
        assert_eq!(record.column, "FundID");
        assert_eq!(record.old_value, "FundID");
        assert_eq!(record.new_value, "fund_id");
        assert_eq!(record.user, "ops");
        // In-memory header now matches the declaration
        assert_eq!(
            tables.get("invoices").unwrap().column_index("fund_id"),
            Some(2)
        );
        assert_eq!(outcome.resolve("invoices", "fund_id"), Some("fund_id"));
    }

    #[test]
    fn test_empty_foreign_key_warns() {
        let descriptor = descriptor();
        let validator = SchemaValidator::new(&descriptor, ColumnMatcher::new());
        let mut tables = clean_tables();
        tables
            .get_mut("invoices")
            .unwrap()
            .rows
            .push(vec!["I2".into(), "V1".into(), "".into()]);

        let outcome = validator.validate(&mut tables, false, "test");
        let warning = outcome
            .issues
            .iter()
            .find(|i| i.severity == Severity::Warning)
            .unwrap();
        assert!(warning.message.contains("foreign key"));
        assert_eq!(warning.column.as_deref(), Some("fund_id"));
    }

    #[test]
    fn test_threshold_suppresses_completeness_warning() {
        let descriptor = descriptor();
        let validator = SchemaValidator::new(&descriptor, ColumnMatcher::new()).with_config(
            ValidatorConfig {
                empty_fk_threshold: 0.6,
            },
        );
        let mut tables = clean_tables();
        tables
            .get_mut("invoices")
            .unwrap()
            .rows
            .push(vec!["I2".into(), "V1".into(), "".into()]);

        // 1 empty of 2 rows = 0.5, below the 0.6 threshold
        let outcome = validator.validate(&mut tables, false, "test");
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_unresolvable_column_is_error() {
        let descriptor = descriptor();
        let validator = SchemaValidator::new(&descriptor, ColumnMatcher::new());
        let mut tables = clean_tables();
        tables
            .get_mut("invoices")
            .unwrap()
            .rename_header("fund_id", "totally_different");

        let outcome = validator.validate(&mut tables, false, "test");
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.severity == Severity::Error && i.column.as_deref() == Some("fund_id")));
        // Relationship endpoint failed check 2, so check 3 flags it
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.message.contains("relationship")));
    }
}
