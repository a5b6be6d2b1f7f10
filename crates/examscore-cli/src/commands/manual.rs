//! The `examscore manual` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use examscore_core::config::load_config_from;
use examscore_core::model::AnswerComment;
use examscore_core::GradingService;
use examscore_store::Fixture;

use super::parse_skill;

pub async fn execute(
    fixture_path: PathBuf,
    attempt: String,
    skill: String,
    score: f64,
    comments: Vec<String>,
    config_path: Option<PathBuf>,
    save: bool,
) -> Result<()> {
    let skill = parse_skill(&skill)?;
    let comments = comments
        .iter()
        .map(|c| parse_comment(c))
        .collect::<Result<Vec<_>>>()?;

    let config = load_config_from(config_path.as_deref())?;
    let store = Arc::new(Fixture::load(&fixture_path)?.into_store());
    let service = GradingService::new(store.clone(), Arc::new(config));

    tracing::debug!(%attempt, %skill, score, comments = comments.len(), "recording manual score");
    let receipt = service
        .record_manual_score(&attempt, skill, score, &comments)
        .await?;

    let level = receipt
        .level
        .map_or_else(|| "-".to_string(), |l| l.to_string());
    println!(
        "{}: {:.1} (level {level}), attempt total {:.1}",
        receipt.skill, receipt.score, receipt.total_points
    );
    if receipt.comments_saved > 0 {
        println!("{} comment(s) saved", receipt.comments_saved);
    }

    if save {
        Fixture::from_store(&store).save(&fixture_path)?;
        eprintln!("Fixture updated: {}", fixture_path.display());
    }

    Ok(())
}

/// Split `QUESTION_ID=TEXT` into a comment.
fn parse_comment(raw: &str) -> Result<AnswerComment> {
    let (question_id, comment) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("invalid comment '{raw}': expected QUESTION_ID=TEXT"))?;
    let question_id = question_id.trim();
    anyhow::ensure!(
        !question_id.is_empty(),
        "invalid comment '{raw}': question ID is empty"
    );
    Ok(AnswerComment {
        question_id: question_id.to_string(),
        comment: comment.trim().to_string(),
    })
}
