//! The `examscore classify` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examscore_core::config::load_config_from;
use examscore_core::model::Level;

use super::parse_skill;

pub fn execute(skill: String, score: f64, config_path: Option<PathBuf>) -> Result<()> {
    let skill = parse_skill(&skill)?;
    let config = load_config_from(config_path.as_deref())?;

    let thresholds = config
        .levels
        .for_skill(skill)
        .ok_or_else(|| anyhow::anyhow!("{skill} has no proficiency levels"))?;
    let level = thresholds.classify(score);

    println!("{skill} {score:.1} -> {level}");

    let mut table = Table::new();
    table.set_header(vec!["Level", "From"]);
    table.add_row(vec![Cell::new(Level::A0), Cell::new("-")]);
    for (level, cut) in Level::ALL[1..].iter().zip(thresholds.cuts()) {
        table.add_row(vec![Cell::new(level), Cell::new(format!("{cut:.1}"))]);
    }
    println!("{table}");

    Ok(())
}
