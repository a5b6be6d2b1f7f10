//! Grading report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregator::{TraceEntry, Verdict};
use crate::model::{AttemptScoreRecord, Level, Skill};

/// Result of scoring one skill of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillScoreReport {
    pub skill: Skill,
    /// The skill score, rounded to one decimal.
    pub total_points: f64,
    /// Attainable points over auto-scored questions.
    pub max_points: f64,
    /// Level of the skill; `None` for grammar/vocabulary.
    pub level: Option<Level>,
    /// The record's total after the update.
    pub attempt_total: f64,
    pub trace: Vec<TraceEntry>,
    /// The record as written by this update.
    pub updated_record: AttemptScoreRecord,
}

impl SkillScoreReport {
    pub fn count(&self, verdict: Verdict) -> usize {
        self.trace.iter().filter(|t| t.verdict == verdict).count()
    }
}

/// Scores of all auto-graded skills of one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub attempt_record_id: String,
    pub learner_id: String,
    pub exam_id: String,
    /// One entry per graded skill, in skill order.
    pub skills: Vec<SkillScoreReport>,
    /// The record after every skill was written.
    pub record: AttemptScoreRecord,
}

impl GradingReport {
    /// Start a report stamped with a fresh id and the current time.
    pub fn new(
        attempt_record_id: &str,
        learner_id: &str,
        exam_id: &str,
        skills: Vec<SkillScoreReport>,
        record: AttemptScoreRecord,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            attempt_record_id: attempt_record_id.to_string(),
            learner_id: learner_id.to_string(),
            exam_id: exam_id.to_string(),
            skills,
            record,
        }
    }

    pub fn skill(&self, skill: Skill) -> Option<&SkillScoreReport> {
        self.skills.iter().find(|s| s.skill == skill)
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradingReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
