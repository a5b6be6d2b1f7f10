//! Markdown report generator.

use std::path::Path;

use anyhow::Result;

use examscore_core::model::Skill;
use examscore_core::report::GradingReport;

use crate::{compact, level_label};

/// Escape table-breaking characters in a cell.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Generate a Markdown document from a grading report.
pub fn generate_markdown(report: &GradingReport) -> String {
    let mut md = String::new();

    md.push_str("# Grading report\n\n");
    md.push_str(&format!(
        "**Attempt:** {} | **Learner:** {} | **Exam:** {} | {}\n\n",
        cell(&report.attempt_record_id),
        cell(&report.learner_id),
        cell(&report.exam_id),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    md.push_str("## Record\n\n");
    md.push_str("| Skill | Score | Level |\n");
    md.push_str("|-------|-------|-------|\n");
    for skill in Skill::ALL {
        md.push_str(&format!(
            "| {} | {:.1} | {} |\n",
            skill,
            report.record.scores.get(skill),
            level_label(report.record.levels.get(skill))
        ));
    }
    md.push_str(&format!("\n**Total:** {:.1}\n\n", report.record.total));

    for s in &report.skills {
        md.push_str(&format!(
            "## {} ({:.1} / {:.1}, level {})\n\n",
            s.skill,
            s.total_points,
            s.max_points,
            level_label(s.level)
        ));
        if s.trace.is_empty() {
            md.push_str("_No questions._\n\n");
            continue;
        }
        md.push_str("| Question | Kind | Answer | Verdict | Points |\n");
        md.push_str("|----------|------|--------|---------|--------|\n");
        for t in &s.trace {
            let verdict = serde_json::to_value(t.verdict)
                .map(|v| compact(&v))
                .unwrap_or_default();
            md.push_str(&format!(
                "| {} | {} | {} | {} | {:.1} / {:.1} |\n",
                cell(&t.question_id),
                t.kind,
                cell(&compact(&t.student_answer)),
                verdict,
                t.points_added,
                t.points_possible
            ));
        }
        md.push('\n');
    }

    md
}

/// Write a Markdown report to a file.
pub fn write_markdown_report(report: &GradingReport, path: &Path) -> Result<()> {
    let md = generate_markdown(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, md)?;
    Ok(())
}
