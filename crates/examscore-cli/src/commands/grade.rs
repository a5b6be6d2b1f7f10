//! The `examscore grade` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use examscore_core::aggregator::Verdict;
use examscore_core::config::load_config_from;
use examscore_core::report::GradingReport;
use examscore_core::GradingService;
use examscore_report::html::write_html_report;
use examscore_report::markdown::write_markdown_report;
use examscore_store::Fixture;

use super::parse_skill;

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    fixture_path: PathBuf,
    attempt: String,
    learner: String,
    exam: String,
    skill: String,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
    save: bool,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let fixture = Fixture::load(&fixture_path)?;
    let store = Arc::new(fixture.into_store());
    tracing::debug!(fixture = %fixture_path.display(), %attempt, "grading attempt");
    let service = GradingService::new(store.clone(), Arc::new(config));

    let report = if skill.eq_ignore_ascii_case("all") {
        service.score_attempt(&attempt, &learner, &exam).await?
    } else {
        let skill = parse_skill(&skill)?;
        let scored = service.score_skill(&attempt, &learner, &exam, skill).await?;
        let record = scored.updated_record.clone();
        GradingReport::new(&attempt, &learner, &exam, vec![scored], record)
    };

    print_summary(&report);

    if let Some(output) = output {
        std::fs::create_dir_all(&output)?;
        let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");

        let formats: Vec<&str> = if format == "all" {
            vec!["json", "markdown", "html"]
        } else {
            format.split(',').map(str::trim).collect()
        };

        for fmt in &formats {
            match *fmt {
                "json" => {
                    let path = output.join(format!("grading-{attempt}-{timestamp}.json"));
                    report.save_json(&path)?;
                    eprintln!("Results saved to: {}", path.display());
                }
                "markdown" | "md" => {
                    let path = output.join(format!("grading-{attempt}-{timestamp}.md"));
                    write_markdown_report(&report, &path)?;
                    eprintln!("Markdown report: {}", path.display());
                }
                "html" => {
                    let path = output.join(format!("grading-{attempt}-{timestamp}.html"));
                    write_html_report(&report, &path)?;
                    eprintln!("HTML report: {}", path.display());
                }
                _ => {
                    eprintln!("Unknown format: {fmt}");
                }
            }
        }
    }

    if save {
        Fixture::from_store(&store).save(&fixture_path)?;
        eprintln!("Fixture updated: {}", fixture_path.display());
    }

    Ok(())
}

fn print_summary(report: &GradingReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Skill",
        "Score",
        "Max",
        "Level",
        "Correct",
        "Partial",
        "Incorrect",
        "Unanswered",
        "Malformed",
    ]);

    for s in &report.skills {
        table.add_row(vec![
            Cell::new(s.skill),
            Cell::new(format!("{:.1}", s.total_points)),
            Cell::new(format!("{:.1}", s.max_points)),
            Cell::new(s.level.map_or_else(|| "-".to_string(), |l| l.to_string())),
            Cell::new(s.count(Verdict::Correct)),
            Cell::new(s.count(Verdict::PartiallyCorrect)),
            Cell::new(s.count(Verdict::Incorrect)),
            Cell::new(s.count(Verdict::Unanswered)),
            Cell::new(s.count(Verdict::Malformed)),
        ]);
    }

    println!("Attempt {} (learner {})", report.attempt_record_id, report.learner_id);
    println!("{table}");
    println!("Total: {:.1}", report.record.total);
}
