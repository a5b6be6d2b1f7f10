//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use std::path::Path;

use anyhow::Result;

use examscore_core::aggregator::Verdict;
use examscore_core::model::Skill;
use examscore_core::report::{GradingReport, SkillScoreReport};

use crate::{compact, level_label};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn verdict_class(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Correct => "pass",
        Verdict::PartiallyCorrect => "partial",
        Verdict::Incorrect | Verdict::Malformed => "fail",
        Verdict::Unanswered | Verdict::Skipped => "muted",
    }
}

/// Generate an HTML report from a grading report.
pub fn generate_html(report: &GradingReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>examscore report: {}</title>\n",
        html_escape(&report.attempt_record_id)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str("<h1>examscore report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Attempt <strong>{}</strong> | learner {} | exam {} | {}</p>\n",
        html_escape(&report.attempt_record_id),
        html_escape(&report.learner_id),
        html_escape(&report.exam_id),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Record summary
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Record</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Skill</th><th>Score</th><th>Level</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for skill in Skill::ALL {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{:.1}</td><td>{}</td></tr>\n",
            skill,
            report.record.scores.get(skill),
            level_label(report.record.levels.get(skill))
        ));
    }
    html.push_str(&format!(
        "<tr class=\"total\"><td>Total</td><td>{:.1}</td><td></td></tr>\n",
        report.record.total
    ));
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    html.push_str("<section class=\"results\">\n");
    for s in &report.skills {
        html.push_str(&skill_section(s));
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

fn skill_section(s: &SkillScoreReport) -> String {
    let mut html = format!(
        "<h2>{} <span class=\"meta\">{:.1} / {:.1} | level {}</span></h2>\n",
        s.skill,
        s.total_points,
        s.max_points,
        level_label(s.level)
    );
    html.push_str("<table class=\"trace\">\n");
    html.push_str("<thead><tr><th>Question</th><th>Kind</th><th>Answer</th><th>Verdict</th><th>Points</th><th>Note</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for t in &s.trace {
        let verdict = serde_json::to_value(t.verdict)
            .map(|v| compact(&v))
            .unwrap_or_default();
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td><code>{}</code></td><td>{}</td><td>{:.1} / {:.1}</td><td>{}</td></tr>\n",
            verdict_class(t.verdict),
            html_escape(&t.question_id),
            t.kind,
            html_escape(&compact(&t.student_answer)),
            verdict,
            t.points_added,
            t.points_possible,
            html_escape(t.note.as_deref().unwrap_or("")),
        ));
    }
    html.push_str("</tbody></table>\n");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &GradingReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --partial: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --partial: #713f12; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; font-weight: normal; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.pass { background: var(--pass); }
.partial { background: var(--partial); }
.fail { background: var(--fail); }
.muted { color: #6b7280; }
.total { font-weight: bold; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
"#;
