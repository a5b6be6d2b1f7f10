pub mod classify;
pub mod grade;
pub mod init;
pub mod manual;
pub mod validate;

use anyhow::Result;

use examscore_core::model::Skill;

/// Parse a skill name given on the command line.
pub fn parse_skill(s: &str) -> Result<Skill> {
    s.parse().map_err(|e: String| anyhow::anyhow!("{e}"))
}
