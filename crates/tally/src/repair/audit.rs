//! Repair records and the append-only audit log.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TallyError};

/// One applied change, written to the audit log before the table file
/// is rewritten. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairRecord {
    pub table: String,
    pub row_index: usize,
    pub column: String,
    pub old_value: String,
    pub new_value: String,
    pub timestamp: DateTime<Utc>,
    /// Identity string for audit attribution.
    pub user: String,
}

impl RepairRecord {
    /// Record a cell-level repair.
    pub fn new(
        table: impl Into<String>,
        row_index: usize,
        column: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            row_index,
            column: column.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
            timestamp: Utc::now(),
            user: user.into(),
        }
    }

    /// Record an in-memory header rename. The `column` field carries
    /// the old name; `row_index` 0 stands in for the header row.
    pub fn header_rename(
        table: impl Into<String>,
        old_name: &str,
        new_name: &str,
        user: impl Into<String>,
    ) -> Self {
        Self::new(table, 0, old_name, old_name, new_name, user)
    }
}

/// Append-only JSONL audit log.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    /// Create an audit log writing to the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append records, one JSON object per line.
    pub fn append_all(&self, records: &[RepairRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| TallyError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| TallyError::Io {
                path: self.path.clone(),
                source: e,
            })?;

        for record in records {
            let line = serde_json::to_string(record)?;
            writeln!(file, "{line}").map_err(|e| TallyError::Io {
                path: self.path.clone(),
                source: e,
            })?;
        }

        tracing::debug!(count = records.len(), "appended audit records to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_is_jsonl() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::new(dir.path().join("audit.jsonl"));

        let records = vec![
            RepairRecord::new("invoices", 3, "fund_id", "", "F1", "ops"),
            RepairRecord::new("invoices", 7, "fund_id", "nan", "F2", "ops"),
        ];
        log.append_all(&records).unwrap();
        log.append_all(&records[..1]).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        let parsed: RepairRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.row_index, 3);
        assert_eq!(parsed.user, "ops");
    }

    #[test]
    fn test_header_rename_record_shape() {
        let record = RepairRecord::header_rename("invoices", "FundID", "fund_id", "system");
        assert_eq!(record.column, "FundID");
        assert_eq!(record.old_value, "FundID");
        assert_eq!(record.new_value, "fund_id");
        assert_eq!(record.row_index, 0);
    }

    #[test]
    fn test_empty_append_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::new(dir.path().join("audit.jsonl"));
        log.append_all(&[]).unwrap();
        assert!(!log.path().exists());
    }
}
