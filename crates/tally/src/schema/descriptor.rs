//! Schema descriptor loading and structural validation.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TallyError};

use super::relationship::Relationship;
use super::table::TableSchema;

/// The declared relationship schema: tables in declaration order plus
/// the foreign-key relationships between them.
///
/// Immutable once loaded for a validation run; reload per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub tables: Vec<TableSchema>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl SchemaDescriptor {
    /// Load a descriptor from a JSON file and check its structural
    /// invariants. Malformed descriptors are hard failures, distinct
    /// from data-quality issues found later against the actual tables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TallyError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let reader = BufReader::new(file);
        let descriptor: SchemaDescriptor = serde_json::from_reader(reader).map_err(|e| {
            TallyError::Descriptor(format!("failed to parse '{}': {}", path.display(), e))
        })?;

        descriptor.check_invariants()?;
        tracing::info!(
            tables = descriptor.tables.len(),
            relationships = descriptor.relationships.len(),
            "loaded schema descriptor from {}",
            path.display()
        );
        Ok(descriptor)
    }

    /// Get a declared table by name.
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Relationships whose foreign key lives on the given table.
    pub fn foreign_keys_of<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> {
        self.relationships
            .iter()
            .filter(move |r| r.foreign_key_side().0 == table)
    }

    /// Structural invariants: primary keys are declared columns; every
    /// relationship endpoint names a declared table and column.
    fn check_invariants(&self) -> Result<()> {
        for table in &self.tables {
            for key in &table.primary_key {
                if !table.has_column(key) {
                    return Err(TallyError::Descriptor(format!(
                        "primary key '{}' is not a declared column of table '{}'",
                        key, table.name
                    )));
                }
            }
        }

        for rel in &self.relationships {
            for (table_name, column) in [
                (&rel.from_table, &rel.from_column),
                (&rel.to_table, &rel.to_column),
            ] {
                let table = self.table(table_name).ok_or_else(|| {
                    TallyError::Descriptor(format!(
                        "relationship '{}' references undeclared table '{}'",
                        rel.label(),
                        table_name
                    ))
                })?;
                if !table.has_column(column) {
                    return Err(TallyError::Descriptor(format!(
                        "relationship '{}' references undeclared column '{}.{}'",
                        rel.label(),
                        table_name,
                        column
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID: &str = r#"{
        "tables": [
            {"name": "funds", "columns": ["fund_id", "name"], "primary_key": "fund_id"},
            {"name": "invoices", "columns": ["invoice_id", "vendor_id", "fund_id", "amount"], "primary_key": "invoice_id"}
        ],
        "relationships": [
            {"from_table": "invoices", "from_column": "fund_id",
             "to_table": "funds", "to_column": "fund_id", "cardinality": "many_to_one"}
        ]
    }"#;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_descriptor() {
        let file = write_file(VALID);
        let descriptor = SchemaDescriptor::load(file.path()).unwrap();
        assert_eq!(descriptor.tables.len(), 2);
        assert_eq!(descriptor.relationships.len(), 1);
        assert!(descriptor.table("funds").is_some());
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let file = write_file("{not json");
        let err = SchemaDescriptor::load(file.path()).unwrap_err();
        assert!(matches!(err, TallyError::Descriptor(_)));
    }

    #[test]
    fn test_rejects_primary_key_outside_columns() {
        let content = r#"{
            "tables": [{"name": "funds", "columns": ["name"], "primary_key": "fund_id"}],
            "relationships": []
        }"#;
        let file = write_file(content);
        let err = SchemaDescriptor::load(file.path()).unwrap_err();
        assert!(matches!(err, TallyError::Descriptor(_)));
    }

    #[test]
    fn test_rejects_relationship_to_undeclared_table() {
        let content = r#"{
            "tables": [{"name": "invoices", "columns": ["fund_id"]}],
            "relationships": [
                {"from_table": "invoices", "from_column": "fund_id",
                 "to_table": "funds", "to_column": "fund_id", "cardinality": "many_to_one"}
            ]
        }"#;
        let file = write_file(content);
        let err = SchemaDescriptor::load(file.path()).unwrap_err();
        assert!(matches!(err, TallyError::Descriptor(_)));
    }

    #[test]
    fn test_foreign_keys_of() {
        let file = write_file(VALID);
        let descriptor = SchemaDescriptor::load(file.path()).unwrap();
        let fks: Vec<_> = descriptor.foreign_keys_of("invoices").collect();
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].foreign_key_side(), ("invoices", "fund_id"));
        assert_eq!(descriptor.foreign_keys_of("funds").count(), 0);
    }
}
