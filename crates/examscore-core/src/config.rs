//! Scoring configuration.
//!
//! Points-per-question, level thresholds and manual score bounds are loaded
//! once at start-up, validated, and then shared read-only.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::classifier::LevelTables;
use crate::model::Skill;

/// Points awarded per matched item, per skill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointsPerQuestion {
    #[serde(default = "one")]
    pub grammar_vocabulary: f64,
    #[serde(default = "two")]
    pub listening: f64,
    #[serde(default = "two")]
    pub reading: f64,
    #[serde(default = "one")]
    pub writing: f64,
    #[serde(default = "one")]
    pub speaking: f64,
}

fn one() -> f64 {
    1.0
}
fn two() -> f64 {
    2.0
}

impl Default for PointsPerQuestion {
    fn default() -> Self {
        Self {
            grammar_vocabulary: one(),
            listening: two(),
            reading: two(),
            writing: one(),
            speaking: one(),
        }
    }
}

impl PointsPerQuestion {
    pub fn get(&self, skill: Skill) -> f64 {
        match skill {
            Skill::GrammarVocabulary => self.grammar_vocabulary,
            Skill::Listening => self.listening,
            Skill::Reading => self.reading,
            Skill::Writing => self.writing,
            Skill::Speaking => self.speaking,
        }
    }

    fn set(&mut self, skill: Skill, points: f64) {
        match skill {
            Skill::GrammarVocabulary => self.grammar_vocabulary = points,
            Skill::Listening => self.listening = points,
            Skill::Reading => self.reading = points,
            Skill::Writing => self.writing = points,
            Skill::Speaking => self.speaking = points,
        }
    }
}

/// Inclusive bounds of a teacher-entered score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self { min: 0.0, max: 50.0 }
    }
}

impl ScoreRange {
    pub fn contains(&self, score: f64) -> bool {
        score.is_finite() && (self.min..=self.max).contains(&score)
    }
}

/// Top-level examscore configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub points_per_question: PointsPerQuestion,
    #[serde(default)]
    pub levels: LevelTables,
    #[serde(default)]
    pub manual_score: ScoreRange,
}

impl ScoringConfig {
    /// Reject configurations that would make scoring meaningless.
    pub fn validate(&self) -> Result<()> {
        for skill in Skill::ALL {
            let points = self.points_per_question.get(skill);
            anyhow::ensure!(
                points.is_finite() && points > 0.0,
                "points_per_question for {skill} must be positive, got {points}"
            );
        }
        self.levels
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid level thresholds: {e}"))?;
        anyhow::ensure!(
            self.manual_score.min.is_finite()
                && self.manual_score.max.is_finite()
                && self.manual_score.min < self.manual_score.max,
            "manual_score range is empty: {}..={}",
            self.manual_score.min,
            self.manual_score.max
        );
        Ok(())
    }
}

/// Parse and validate a TOML configuration string.
pub fn parse_config_str(content: &str) -> Result<ScoringConfig> {
    let config: ScoringConfig = toml::from_str(content).context("failed to parse config")?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examscore.toml` in the current directory
/// 2. `~/.config/examscore/config.toml`
///
/// Environment variable overrides: `EXAMSCORE_POINTS_<SKILL>`, e.g.
/// `EXAMSCORE_POINTS_LISTENING=2.5`.
pub fn load_config() -> Result<ScoringConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ScoringConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examscore.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ScoringConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ScoringConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    tracing::debug!(?config, "scoring configuration loaded");
    Ok(config)
}

fn apply_env_overrides(config: &mut ScoringConfig) -> Result<()> {
    for skill in Skill::ALL {
        let var = format!("EXAMSCORE_POINTS_{skill}");
        if let Ok(value) = std::env::var(&var) {
            let points = value
                .trim()
                .parse::<f64>()
                .with_context(|| format!("{var} is not a number: '{value}'"))?;
            config.points_per_question.set(skill, points);
        }
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examscore"))
}
