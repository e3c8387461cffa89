//! CSV table store: a directory of `<name>.csv` files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use sha2::{Digest, Sha256};

use crate::error::{Result, TallyError};

use super::table::DataTable;

/// A pre-mutation backup snapshot of a table file.
#[derive(Debug, Clone)]
pub struct BackupInfo {
    /// Where the snapshot was written.
    pub path: PathBuf,
    /// SHA-256 of the snapshot contents, for the audit trail.
    pub sha256: String,
}

/// Loads and saves tables stored as CSV files in a directory.
///
/// Table names resolve to files case-insensitively, with spaces mapped
/// to underscores, so a table declared as `Vendor allocation` finds
/// `vendor_allocation.csv`.
#[derive(Debug, Clone)]
pub struct TableStore {
    dir: PathBuf,
    backup_dir: PathBuf,
}

impl TableStore {
    /// Create a store over a tables directory. Backups default to a
    /// `backups` subdirectory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let backup_dir = dir.join("backups");
        Self { dir, backup_dir }
    }

    /// Override where backup snapshots are written.
    pub fn with_backup_dir(mut self, backup_dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = backup_dir.into();
        self
    }

    /// The canonical file name for a table.
    pub fn file_name(name: &str) -> String {
        format!("{}.csv", name.trim().to_lowercase().replace(' ', "_"))
    }

    /// The canonical path a table would be saved to.
    pub fn table_path(&self, name: &str) -> PathBuf {
        self.dir.join(Self::file_name(name))
    }

    /// Find the existing file for a table, tolerating case differences
    /// in the directory listing.
    fn resolve_path(&self, name: &str) -> Result<Option<PathBuf>> {
        let canonical = self.table_path(name);
        if canonical.exists() {
            return Ok(Some(canonical));
        }

        let wanted = Self::file_name(name);
        let entries = fs::read_dir(&self.dir).map_err(|e| TallyError::Io {
            path: self.dir.clone(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| TallyError::Io {
                path: self.dir.clone(),
                source: e,
            })?;
            let file_name = entry.file_name().to_string_lossy().to_lowercase();
            if file_name.replace(' ', "_") == wanted {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }

    /// Load a table if its file exists. `Ok(None)` means no file
    /// resolves to this name; `Err` means the file exists but could
    /// not be read or parsed.
    pub fn try_load(&self, name: &str) -> Result<Option<DataTable>> {
        let Some(path) = self.resolve_path(name)? else {
            return Ok(None);
        };
        self.load_path(name, &path).map(Some)
    }

    /// Load a table, failing when its file is absent.
    pub fn load(&self, name: &str) -> Result<DataTable> {
        self.try_load(name)?
            .ok_or_else(|| TallyError::TableNotLoaded(name.to_string()))
    }

    fn load_path(&self, name: &str, path: &Path) -> Result<DataTable> {
        let contents = fs::read(path).map_err(|e| TallyError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if contents.is_empty() {
            return Err(TallyError::EmptyData(format!(
                "table file '{}' is empty",
                path.display()
            )));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(contents.as_slice());

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        if headers.is_empty() {
            return Err(TallyError::EmptyData(format!(
                "table file '{}' has no columns",
                path.display()
            )));
        }

        let expected_cols = headers.len();
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            // Pad short rows, drop spill-over columns
            while row.len() < expected_cols {
                row.push(String::new());
            }
            row.truncate(expected_cols);
            rows.push(row);
        }

        tracing::debug!(
            table = name,
            rows = rows.len(),
            columns = expected_cols,
            "loaded table from {}",
            path.display()
        );
        Ok(DataTable::new(name, headers, rows))
    }

    /// Save a table, replacing its file. The data is written to a
    /// temporary sibling first and renamed over the target, so a
    /// failed write leaves the existing file intact.
    pub fn save(&self, table: &DataTable) -> Result<()> {
        let path = match self.resolve_path(&table.name)? {
            Some(existing) => existing,
            None => self.table_path(&table.name),
        };
        let tmp_path = path.with_extension("csv.tmp");

        let file = fs::File::create(&tmp_path).map_err(|e| TallyError::Io {
            path: tmp_path.clone(),
            source: e,
        })?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(|e| TallyError::Io {
            path: tmp_path.clone(),
            source: e,
        })?;
        drop(writer);

        fs::rename(&tmp_path, &path).map_err(|e| TallyError::Io {
            path: path.clone(),
            source: e,
        })?;

        tracing::info!(table = %table.name, rows = table.row_count(), "saved table to {}", path.display());
        Ok(())
    }

    /// Write a backup snapshot of a table's current on-disk contents,
    /// named by table and timestamp. Repeated calls with no intervening
    /// change produce byte-identical duplicates.
    pub fn backup(&self, name: &str) -> Result<BackupInfo> {
        let source = self
            .resolve_path(name)?
            .ok_or_else(|| TallyError::TableNotLoaded(name.to_string()))?;
        let contents = fs::read(&source).map_err(|e| TallyError::Io {
            path: source.clone(),
            source: e,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let sha256 = format!("{:x}", hasher.finalize());

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let stem = Self::file_name(name);
        let stem = stem.trim_end_matches(".csv");
        let backup_path = self.backup_dir.join(format!("{stem}.{timestamp}.bak.csv"));

        fs::create_dir_all(&self.backup_dir).map_err(|e| TallyError::Backup {
            path: self.backup_dir.clone(),
            source: e,
        })?;
        fs::write(&backup_path, &contents).map_err(|e| TallyError::Backup {
            path: backup_path.clone(),
            source: e,
        })?;

        tracing::info!(table = name, sha256 = %sha256, "wrote backup snapshot {}", backup_path.display());
        Ok(BackupInfo {
            path: backup_path,
            sha256,
        })
    }
}
