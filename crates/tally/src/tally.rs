//! Main Tally struct and public API.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::inference::{KeyInferenceEngine, KeySuggestion, RuleContext};
use crate::input::{DataTable, TableStore};
use crate::matcher::{ColumnMatcher, MatcherConfig};
use crate::repair::{AcceptancePolicy, AuditLog, RepairApplier, RepairRecord};
use crate::schema::SchemaDescriptor;
use crate::validation::{
    SchemaValidator, Severity, ValidationIssue, ValidatorConfig,
};

/// Run mode: report only, or repair what can be repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Validate and report; no file is touched.
    Validate,
    /// Validate, auto-fix column renames, and apply accepted key
    /// repairs.
    Fix,
}

/// Configuration for a Tally run.
#[derive(Debug, Clone)]
pub struct TallyConfig {
    /// Column matcher configuration.
    pub matcher: MatcherConfig,
    /// Validator configuration.
    pub validator: ValidatorConfig,
    /// Minimum confidence for auto-accepted key repairs.
    pub acceptance_threshold: f64,
    /// Identity string recorded on audit records.
    pub user: String,
    /// Audit log path; defaults to `repair_audit.jsonl` inside the
    /// tables directory.
    pub audit_log: Option<PathBuf>,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            matcher: MatcherConfig::default(),
            validator: ValidatorConfig::default(),
            acceptance_threshold: AcceptancePolicy::DEFAULT_THRESHOLD,
            user: "system".to_string(),
            audit_log: None,
        }
    }
}

/// Per-table breakdown for the summary report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableSummary {
    pub table: String,
    pub errors: usize,
    pub warnings: usize,
    pub suggestions: usize,
    pub applied: usize,
    pub skipped: usize,
}

/// Counts across the whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub tables_declared: usize,
    pub errors: usize,
    pub warnings: usize,
    pub suggestions: usize,
    pub applied: usize,
    pub skipped: usize,
    pub unresolved_gaps: usize,
    pub per_table: Vec<TableSummary>,
}

/// Result of one validation/repair run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    /// Validation issues in report order, followed by inference gaps.
    pub issues: Vec<ValidationIssue>,
    /// Every suggestion the inference engine produced.
    pub suggestions: Vec<KeySuggestion>,
    /// Repairs written to disk (header renames and cell repairs).
    pub applied: Vec<RepairRecord>,
    /// Suggestions reported but not applied.
    pub skipped: Vec<KeySuggestion>,
    pub summary: RunSummary,
}

impl RunReport {
    /// Clean means no error-severity findings remain; warnings are
    /// permitted. Drives the process exit code.
    pub fn is_clean(&self) -> bool {
        self.summary.errors == 0
    }
}

/// The validation and repair engine.
///
/// Single-threaded and batch-oriented: one pass over one table set at
/// a time. Callers must not start a second run over the same tables
/// directory until the first returns.
pub struct Tally {
    config: TallyConfig,
}

impl Tally {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(TallyConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(config: TallyConfig) -> Self {
        Self { config }
    }

    /// Validate the tables in `tables_dir` against the descriptor at
    /// `schema_path`; in [`RunMode::Fix`], also repair what the
    /// acceptance threshold admits.
    pub fn run(
        &self,
        tables_dir: impl AsRef<Path>,
        schema_path: impl AsRef<Path>,
        mode: RunMode,
    ) -> Result<RunReport> {
        let tables_dir = tables_dir.as_ref();
        let descriptor = SchemaDescriptor::load(schema_path)?;
        let store = TableStore::new(tables_dir);

        // Load every declared table. A missing or unreadable file is a
        // per-table validation error, not a run failure.
        let mut tables: IndexMap<String, DataTable> = IndexMap::new();
        let mut unreadable: HashMap<String, String> = HashMap::new();
        for declared in &descriptor.tables {
            match store.try_load(&declared.name) {
                Ok(Some(table)) => {
                    tables.insert(declared.name.clone(), table);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(table = %declared.name, "failed to load table: {e}");
                    unreadable.insert(declared.name.clone(), e.to_string());
                }
            }
        }

        let auto_fix = mode == RunMode::Fix;
        let matcher = ColumnMatcher::with_config(self.config.matcher.clone());
        let validator = SchemaValidator::new(&descriptor, matcher)
            .with_config(self.config.validator.clone());
        let mut outcome = validator.validate(&mut tables, auto_fix, &self.config.user);

        // An unreadable file surfaced as "not found"; restore the cause.
        for issue in &mut outcome.issues {
            if let Some(cause) = unreadable.get(&issue.table) {
                if issue.severity == Severity::Error && issue.message.contains("not found") {
                    issue.message =
                        format!("table '{}' could not be read: {}", issue.table, cause);
                }
            }
        }

        // Key inference over every resolved relationship, in
        // declaration order.
        let engine = KeyInferenceEngine::new();
        let mut suggestions: Vec<KeySuggestion> = Vec::new();
        let mut gap_issues: Vec<ValidationIssue> = Vec::new();

        for rel in &descriptor.relationships {
            if !outcome.relationship_resolved(rel) {
                continue;
            }
            let (fk_table, fk_column) = rel.foreign_key_side();
            let (ref_name, ref_column) = rel.referenced_side();

            let (Some(table), Some(ref_table)) = (tables.get(fk_table), tables.get(ref_name))
            else {
                continue;
            };
            let Some(fk_idx) =
                outcome.resolve(fk_table, fk_column).and_then(|actual| table.column_index(actual))
            else {
                continue;
            };
            let Some(ref_pk_idx) = outcome
                .resolve(ref_name, ref_column)
                .and_then(|actual| ref_table.column_index(actual))
            else {
                continue;
            };

            let valid_keys: HashSet<String> = ref_table
                .column_values(ref_pk_idx)
                .filter(|v| !DataTable::is_missing_value(v))
                .map(|v| v.trim().to_string())
                .collect();

            let sibling = self.pick_sibling(&descriptor, &outcome, table, fk_table, fk_column);
            let ctx = RuleContext {
                table,
                fk_idx,
                fk_name: fk_column,
                valid_keys: &valid_keys,
                ref_table,
                ref_pk_idx,
                sibling_idx: sibling.map(|(idx, _)| idx),
                sibling_name: sibling.map(|(_, name)| name),
            };

            let inferred = engine.infer(&ctx);
            for row_idx in inferred.unresolved {
                gap_issues.push(
                    ValidationIssue::error(
                        fk_table,
                        format!(
                            "no replacement candidate for '{}' in row {} of '{}'",
                            fk_column, row_idx, fk_table
                        ),
                    )
                    .with_column(fk_column),
                );
            }
            suggestions.extend(inferred.suggestions);
        }

        // Repair pass, one table at a time in declaration order. An
        // I/O failure aborts the pass for that table only; other
        // tables still get repaired.
        let mut applied: Vec<RepairRecord> = Vec::new();
        let mut skipped: Vec<KeySuggestion> = Vec::new();
        let mut repair_issues: Vec<ValidationIssue> = Vec::new();
        if auto_fix {
            let audit_path = self
                .config
                .audit_log
                .clone()
                .unwrap_or_else(|| tables_dir.join("repair_audit.jsonl"));
            let audit = AuditLog::new(audit_path);
            let applier = RepairApplier::new(&store, audit, &self.config.user);

            for declared in &descriptor.tables {
                let renames: Vec<RepairRecord> = outcome
                    .renames
                    .iter()
                    .filter(|r| r.table == declared.name)
                    .cloned()
                    .collect();
                let table_suggestions: Vec<KeySuggestion> = suggestions
                    .iter()
                    .filter(|s| s.table == declared.name)
                    .cloned()
                    .collect();
                if renames.is_empty() && table_suggestions.is_empty() {
                    continue;
                }
                let Some(table) = tables.get_mut(&declared.name) else {
                    continue;
                };

                let mut policy = AcceptancePolicy::Auto {
                    threshold: self.config.acceptance_threshold,
                };
                match applier.apply(table, &renames, &table_suggestions, &mut policy) {
                    Ok(result) => {
                        applied.extend(result.applied);
                        skipped.extend(result.skipped);
                    }
                    Err(e) => {
                        tracing::error!(table = %declared.name, "repair pass aborted: {e}");
                        repair_issues.push(ValidationIssue::error(
                            &declared.name,
                            format!("repair pass aborted, table left untouched: {e}"),
                        ));
                    }
                }
            }
        }

        let mut issues = outcome.issues;
        issues.extend(gap_issues.iter().cloned());
        issues.extend(repair_issues);

        for issue in &issues {
            match issue.severity {
                Severity::Error => tracing::error!(table = %issue.table, "{}", issue.message),
                Severity::Warning => tracing::warn!(table = %issue.table, "{}", issue.message),
            }
        }

        let summary = self.summarize(
            &descriptor,
            &issues,
            &suggestions,
            &applied,
            &skipped,
            gap_issues.len(),
        );
        tracing::info!(
            errors = summary.errors,
            warnings = summary.warnings,
            suggestions = summary.suggestions,
            applied = summary.applied,
            "run complete"
        );

        Ok(RunReport {
            mode,
            issues,
            suggestions,
            applied,
            skipped,
            summary,
        })
    }

    /// Choose the secondary attribute column used for sibling
    /// evidence: another declared foreign key on the same table, or
    /// failing that, a category-like column.
    fn pick_sibling<'t>(
        &self,
        descriptor: &SchemaDescriptor,
        outcome: &crate::validation::ValidationOutcome,
        table: &'t DataTable,
        fk_table: &str,
        fk_column: &str,
    ) -> Option<(usize, &'t str)> {
        for other in descriptor.foreign_keys_of(fk_table) {
            let (_, column) = other.foreign_key_side();
            if column == fk_column {
                continue;
            }
            if let Some(idx) = outcome
                .resolve(fk_table, column)
                .and_then(|actual| table.column_index(actual))
            {
                return Some((idx, table.headers[idx].as_str()));
            }
        }
        table
            .headers
            .iter()
            .position(|h| h.to_lowercase().contains("category"))
            .map(|idx| (idx, table.headers[idx].as_str()))
    }

    fn summarize(
        &self,
        descriptor: &SchemaDescriptor,
        issues: &[ValidationIssue],
        suggestions: &[KeySuggestion],
        applied: &[RepairRecord],
        skipped: &[KeySuggestion],
        unresolved_gaps: usize,
    ) -> RunSummary {
        let per_table = descriptor
            .tables
            .iter()
            .map(|t| TableSummary {
                table: t.name.clone(),
                errors: issues
                    .iter()
                    .filter(|i| i.table == t.name && i.severity == Severity::Error)
                    .count(),
                warnings: issues
                    .iter()
                    .filter(|i| i.table == t.name && i.severity == Severity::Warning)
                    .count(),
                suggestions: suggestions.iter().filter(|s| s.table == t.name).count(),
                applied: applied.iter().filter(|r| r.table == t.name).count(),
                skipped: skipped.iter().filter(|s| s.table == t.name).count(),
            })
            .collect();

        RunSummary {
            tables_declared: descriptor.tables.len(),
            errors: issues
                .iter()
                .filter(|i| i.severity == Severity::Error)
                .count(),
            warnings: issues
                .iter()
                .filter(|i| i.severity == Severity::Warning)
                .count(),
            suggestions: suggestions.len(),
            applied: applied.len(),
            skipped: skipped.len(),
            unresolved_gaps,
            per_table,
        }
    }
}

impl Default for Tally {
    fn default() -> Self {
        Self::new()
    }
}
