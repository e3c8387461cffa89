//! Table-level schema declaration.

use serde::{Deserialize, Deserializer, Serialize};

/// Declared schema for a single table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name (also the CSV file stem).
    pub name: String,
    /// Declared columns, in order.
    pub columns: Vec<String>,
    /// Primary key column(s). Accepts a single name or a sequence in
    /// the descriptor file; always a sequence in memory.
    #[serde(default, deserialize_with = "one_or_many")]
    pub primary_key: Vec<String>,
}

impl TableSchema {
    /// Create a table schema with the given columns.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            primary_key: Vec::new(),
        }
    }

    /// Set the primary key columns.
    pub fn with_primary_key(mut self, key: Vec<String>) -> Self {
        self.primary_key = key;
        self
    }

    /// Whether a column is declared on this table.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Number of declared columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Deserialize either a bare string or a sequence of strings.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_from_string() {
        let json = r#"{"name": "funds", "columns": ["fund_id", "name"], "primary_key": "fund_id"}"#;
        let schema: TableSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.primary_key, vec!["fund_id"]);
    }

    #[test]
    fn test_primary_key_from_sequence() {
        let json = r#"{"name": "allocations", "columns": ["vendor_id", "fund_id", "share"], "primary_key": ["vendor_id", "fund_id"]}"#;
        let schema: TableSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.primary_key, vec!["vendor_id", "fund_id"]);
    }

    #[test]
    fn test_primary_key_optional() {
        let json = r#"{"name": "notes", "columns": ["text"]}"#;
        let schema: TableSchema = serde_json::from_str(json).unwrap();
        assert!(schema.primary_key.is_empty());
    }

    #[test]
    fn test_has_column() {
        let schema = TableSchema::new("invoices", vec!["invoice_id".into(), "fund_id".into()]);
        assert!(schema.has_column("fund_id"));
        assert!(!schema.has_column("FundID"));
    }
}
