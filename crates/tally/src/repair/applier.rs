//! Applies accepted key suggestions to a table, backup-first.

use crate::error::Result;
use crate::inference::KeySuggestion;
use crate::input::{BackupInfo, DataTable, TableStore};

use super::audit::{AuditLog, RepairRecord};

/// How suggestions are accepted for application.
pub enum AcceptancePolicy<'a> {
    /// Accept every suggestion at or above the threshold.
    Auto { threshold: f64 },
    /// Defer to the caller per suggestion.
    Interactive(&'a mut dyn FnMut(&KeySuggestion) -> bool),
}

impl AcceptancePolicy<'_> {
    /// Default acceptance threshold for auto mode.
    pub const DEFAULT_THRESHOLD: f64 = 0.7;

    /// Auto policy with the default threshold.
    pub fn auto() -> Self {
        AcceptancePolicy::Auto {
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }

    fn accepts(&mut self, suggestion: &KeySuggestion) -> bool {
        match self {
            AcceptancePolicy::Auto { threshold } => suggestion.confidence >= *threshold,
            AcceptancePolicy::Interactive(decide) => decide(suggestion),
        }
    }
}

/// Result of one repair pass over one table.
#[derive(Debug, Clone, Default)]
pub struct RepairOutcome {
    /// Records for every applied change, in application order (header
    /// renames first, then cell repairs in suggestion order).
    pub applied: Vec<RepairRecord>,
    /// Suggestions reported but not applied. Not failures.
    pub skipped: Vec<KeySuggestion>,
    /// The pre-mutation snapshot, when one was taken.
    pub backup: Option<BackupInfo>,
}

/// Applies repairs to one table at a time: backup snapshot first, then
/// in-memory mutation, audit append, and a single save. All-or-nothing
/// at the table level: a failed backup aborts the pass with the table
/// file untouched.
pub struct RepairApplier<'s> {
    store: &'s TableStore,
    audit: AuditLog,
    user: String,
}

impl<'s> RepairApplier<'s> {
    /// Create an applier writing audit records to the given log.
    pub fn new(store: &'s TableStore, audit: AuditLog, user: impl Into<String>) -> Self {
        Self {
            store,
            audit,
            user: user.into(),
        }
    }

    /// Apply pending header renames and accepted suggestions to the
    /// table, then persist it. `renames` are header renames already
    /// performed in memory by the validator, included here so they are
    /// audited and saved under the same backup.
    ///
    /// No-op when there is nothing to persist.
    pub fn apply(
        &self,
        table: &mut DataTable,
        renames: &[RepairRecord],
        suggestions: &[KeySuggestion],
        policy: &mut AcceptancePolicy,
    ) -> Result<RepairOutcome> {
        let mut outcome = RepairOutcome::default();

        if renames.is_empty() && suggestions.is_empty() {
            return Ok(outcome);
        }

        // Backup before any mutation reaches disk. A failure here
        // aborts the whole pass.
        outcome.backup = Some(self.store.backup(&table.name)?);
        outcome.applied.extend_from_slice(renames);

        for suggestion in suggestions {
            if !policy.accepts(suggestion) {
                tracing::info!(
                    table = %suggestion.table,
                    row = suggestion.row_index,
                    confidence = suggestion.confidence,
                    "suggestion below acceptance threshold, skipped"
                );
                outcome.skipped.push(suggestion.clone());
                continue;
            }

            let Some(col_idx) = table.column_index(&suggestion.column) else {
                // Column resolved under a different header; the
                // validator's resolution should prevent this.
                tracing::warn!(
                    table = %table.name,
                    column = %suggestion.column,
                    "suggestion targets unknown column, skipped"
                );
                outcome.skipped.push(suggestion.clone());
                continue;
            };

            let old_value = table
                .get(suggestion.row_index, col_idx)
                .unwrap_or("")
                .to_string();
            table.set(
                suggestion.row_index,
                col_idx,
                suggestion.proposed_value.clone(),
            );
            outcome.applied.push(RepairRecord::new(
                table.name.clone(),
                suggestion.row_index,
                suggestion.column.clone(),
                old_value,
                suggestion.proposed_value.clone(),
                self.user.clone(),
            ));
        }

        if outcome.applied.is_empty() {
            // Nothing accepted; leave the file as it was.
            return Ok(outcome);
        }

        self.audit.append_all(&outcome.applied)?;
        self.store.save(table)?;

        tracing::info!(
            table = %table.name,
            applied = outcome.applied.len(),
            skipped = outcome.skipped.len(),
            "repair pass complete"
        );
        Ok(outcome)
    }
}
