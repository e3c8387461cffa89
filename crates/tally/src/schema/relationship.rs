//! Foreign-key relationship declarations between tables.

use serde::{Deserialize, Serialize};

/// Direction of a declared relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// `from_table` holds one row per many `to_table` rows.
    OneToMany,
    /// Many `from_table` rows reference one `to_table` row.
    ManyToOne,
}

/// A declared foreign-key relationship between two tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Optional human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub cardinality: Cardinality,
}

impl Relationship {
    /// Display label: the declared name, or a derived `a.b -> c.d` form.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!(
                "{}.{} -> {}.{}",
                self.from_table, self.from_column, self.to_table, self.to_column
            ),
        }
    }

    /// The (table, column) pair holding the foreign key (the "many" side).
    pub fn foreign_key_side(&self) -> (&str, &str) {
        match self.cardinality {
            Cardinality::ManyToOne => (&self.from_table, &self.from_column),
            Cardinality::OneToMany => (&self.to_table, &self.to_column),
        }
    }

    /// The (table, column) pair holding the referenced key (the "one" side).
    pub fn referenced_side(&self) -> (&str, &str) {
        match self.cardinality {
            Cardinality::ManyToOne => (&self.to_table, &self.to_column),
            Cardinality::OneToMany => (&self.from_table, &self.from_column),
        }
    }
}
