//! Tally: schema validation and missing-key repair for CSV table sets.
//!
//! Tally checks a declared relationship schema against the CSV tables
//! that actually exist on disk, then infers and repairs missing
//! foreign-key values using evidence from sibling relationships.
//!
//! # Core Principles
//!
//! - **Structured findings**: data-quality problems are returned as
//!   issue and suggestion values, never raised as errors
//! - **Backup before mutation**: every repair pass snapshots the table
//!   file before touching it, all-or-nothing per table
//! - **Full audit trail**: every applied change is recorded with who,
//!   when, and what
//!
//! # Example
//!
//! ```no_run
//! use tally::{RunMode, Tally};
//!
//! let tally = Tally::new();
//! let report = tally.run("Tables", "relationship_schema.json", RunMode::Validate).unwrap();
//!
//! println!("Errors: {}", report.summary.errors);
//! println!("Suggestions: {}", report.suggestions.len());
//! ```

pub mod error;
pub mod inference;
pub mod input;
pub mod matcher;
pub mod repair;
pub mod schema;
pub mod validation;

mod tally;

pub use crate::tally::{RunMode, RunReport, RunSummary, TableSummary, Tally, TallyConfig};
pub use error::{Result, TallyError};
pub use inference::{KeyInferenceEngine, KeySuggestion, RuleContext};
pub use input::{BackupInfo, DataTable, TableStore};
pub use matcher::{ColumnMatch, ColumnMatcher, MatchTier, MatcherConfig};
pub use repair::{AcceptancePolicy, AuditLog, RepairApplier, RepairRecord};
pub use schema::{Cardinality, Relationship, SchemaDescriptor, TableSchema};
pub use validation::{Severity, ValidationIssue, ValidatorConfig};
