//! Validate command - check tables against the schema, report only.

use std::path::Path;

use tally::{RunMode, Tally, TallyConfig};

use super::report;

pub fn run(
    tables_dir: &Path,
    schema: Option<&Path>,
    json: bool,
    user: &str,
) -> Result<i32, Box<dyn std::error::Error>> {
    if !tables_dir.is_dir() {
        return Err(format!("tables directory not found: {}", tables_dir.display()).into());
    }
    let schema_path = match schema {
        Some(path) => path.to_path_buf(),
        None => tables_dir.join("relationship_schema.json"),
    };

    let config = TallyConfig {
        user: user.to_string(),
        ..TallyConfig::default()
    };
    let report = Tally::with_config(config).run(tables_dir, &schema_path, RunMode::Validate)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print(&report);
    }

    Ok(if report.is_clean() { 0 } else { 1 })
}
