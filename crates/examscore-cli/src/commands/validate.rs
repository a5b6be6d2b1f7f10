//! The `examscore validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examscore_store::{validate_fixture, Fixture};

pub fn execute(fixture_path: PathBuf) -> Result<()> {
    let fixture = Fixture::load(&fixture_path)?;

    println!(
        "Fixture: {} ({} questions, {} submissions, {} records)",
        fixture_path.display(),
        fixture.questions.len(),
        fixture.submissions.len(),
        fixture.records.len()
    );

    let warnings = validate_fixture(&fixture);
    for w in &warnings {
        let prefix = w
            .subject
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Fixture valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
