//! Fix command - validate, rename drifted columns, repair missing keys.

use std::path::Path;

use tally::{RunMode, Tally, TallyConfig};

use super::report;

pub fn run(
    tables_dir: &Path,
    schema: Option<&Path>,
    threshold: f64,
    json: bool,
    user: &str,
) -> Result<i32, Box<dyn std::error::Error>> {
    if !tables_dir.is_dir() {
        return Err(format!("tables directory not found: {}", tables_dir.display()).into());
    }
    if !(0.0..=1.0).contains(&threshold) {
        return Err(format!("threshold must be between 0 and 1, got {threshold}").into());
    }
    let schema_path = match schema {
        Some(path) => path.to_path_buf(),
        None => tables_dir.join("relationship_schema.json"),
    };

    let config = TallyConfig {
        acceptance_threshold: threshold,
        user: user.to_string(),
        ..TallyConfig::default()
    };
    let report = Tally::with_config(config).run(tables_dir, &schema_path, RunMode::Fix)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print(&report);
    }

    Ok(if report.is_clean() { 0 } else { 1 })
}
