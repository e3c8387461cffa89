//! In-memory representation of a loaded CSV table.

/// A loaded table: header row plus row-major string cells.
///
/// Rows carry no identifier of their own; their ordinal position within
/// the source file identifies them for audit purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTable {
    /// Table name (the CSV file stem).
    pub name: String,
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data as strings (row-major order).
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Create a new data table.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of a column by exact header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// Set a specific cell value. Out-of-bounds indices are ignored.
    pub fn set(&mut self, row: usize, col: usize, value: String) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value;
        }
    }

    /// All values of a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(|s| s.as_str()).unwrap_or(""))
    }

    /// Rename a header in place. Returns false when `old` is absent.
    pub fn rename_header(&mut self, old: &str, new: &str) -> bool {
        match self.column_index(old) {
            Some(idx) => {
                self.headers[idx] = new.to_string();
                true
            }
            None => false,
        }
    }

    /// Check if a value represents a missing/null value.
    ///
    /// Covers the markers that show up in exported finance CSVs:
    /// blanks, spreadsheet NA spellings, and pandas' stringified "nan".
    pub fn is_missing_value(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataTable {
        DataTable::new(
            "invoices",
            vec!["invoice_id".into(), "fund_id".into()],
            vec![
                vec!["I1".into(), "F1".into()],
                vec!["I2".into(), "".into()],
            ],
        )
    }

    #[test]
    fn test_get_set() {
        let mut table = sample();
        assert_eq!(table.get(0, 1), Some("F1"));
        table.set(1, 1, "F2".into());
        assert_eq!(table.get(1, 1), Some("F2"));
        // Out-of-bounds set is a no-op
        table.set(9, 9, "X".into());
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_rename_header() {
        let mut table = sample();
        assert!(table.rename_header("fund_id", "FundID"));
        assert_eq!(table.column_index("FundID"), Some(1));
        assert!(!table.rename_header("missing", "x"));
    }

    #[test]
    fn test_is_missing_value() {
        assert!(DataTable::is_missing_value(""));
        assert!(DataTable::is_missing_value("  "));
        assert!(DataTable::is_missing_value("nan"));
        assert!(DataTable::is_missing_value("NaN"));
        assert!(DataTable::is_missing_value("N/A"));
        assert!(DataTable::is_missing_value("null"));
        assert!(DataTable::is_missing_value("None"));
        assert!(!DataTable::is_missing_value("F1"));
        assert!(!DataTable::is_missing_value("0"));
    }
}
