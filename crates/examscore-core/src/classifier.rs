//! Score → proficiency level classification.
//!
//! Each tiered skill has its own step function. A score strictly below a cut
//! point falls into the tier beneath it.

use serde::{Deserialize, Serialize};

use crate::model::{Level, Skill};

/// Lower bounds (inclusive) of levels A1 through C for one skill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelThresholds {
    pub a1: f64,
    pub a2: f64,
    pub b1: f64,
    pub b2: f64,
    pub c: f64,
}

impl LevelThresholds {
    pub const fn new(a1: f64, a2: f64, b1: f64, b2: f64, c: f64) -> Self {
        Self { a1, a2, b1, b2, c }
    }

    pub fn cuts(&self) -> [f64; 5] {
        [self.a1, self.a2, self.b1, self.b2, self.c]
    }

    pub fn classify(&self, score: f64) -> Level {
        if score.is_nan() {
            return Level::A0;
        }
        self.cuts()
            .iter()
            .position(|&cut| score < cut)
            .map_or(Level::C, |tier| Level::ALL[tier])
    }

    /// Checks that cut points are finite and strictly ascending.
    pub fn validate(&self) -> Result<(), String> {
        let cuts = self.cuts();
        if let Some(bad) = cuts.iter().find(|c| !c.is_finite()) {
            return Err(format!("threshold {bad} is not a finite number"));
        }
        if let Some(pair) = cuts.windows(2).find(|w| w[0] >= w[1]) {
            return Err(format!(
                "thresholds must be strictly ascending, found {} then {}",
                pair[0], pair[1]
            ));
        }
        Ok(())
    }
}

/// Threshold tables for the four tiered skills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTables {
    #[serde(default = "default_listening")]
    pub listening: LevelThresholds,
    #[serde(default = "default_reading")]
    pub reading: LevelThresholds,
    #[serde(default = "default_writing")]
    pub writing: LevelThresholds,
    #[serde(default = "default_speaking")]
    pub speaking: LevelThresholds,
}

pub const LISTENING_THRESHOLDS: LevelThresholds = LevelThresholds::new(8.0, 16.0, 24.0, 34.0, 42.0);
// Provisional reading, writing and speaking cuts; override under [levels.<skill>].
pub const READING_THRESHOLDS: LevelThresholds = LevelThresholds::new(8.0, 16.0, 26.0, 38.0, 46.0);
pub const WRITING_THRESHOLDS: LevelThresholds = LevelThresholds::new(6.0, 18.0, 26.0, 40.0, 48.0);
pub const SPEAKING_THRESHOLDS: LevelThresholds = LevelThresholds::new(4.0, 16.0, 26.0, 41.0, 48.0);

fn default_listening() -> LevelThresholds {
    LISTENING_THRESHOLDS
}
fn default_reading() -> LevelThresholds {
    READING_THRESHOLDS
}
fn default_writing() -> LevelThresholds {
    WRITING_THRESHOLDS
}
fn default_speaking() -> LevelThresholds {
    SPEAKING_THRESHOLDS
}

impl Default for LevelTables {
    fn default() -> Self {
        Self {
            listening: LISTENING_THRESHOLDS,
            reading: READING_THRESHOLDS,
            writing: WRITING_THRESHOLDS,
            speaking: SPEAKING_THRESHOLDS,
        }
    }
}

impl LevelTables {
    /// The table for `skill`; grammar/vocabulary has none.
    pub fn for_skill(&self, skill: Skill) -> Option<&LevelThresholds> {
        match skill {
            Skill::GrammarVocabulary => None,
            Skill::Listening => Some(&self.listening),
            Skill::Reading => Some(&self.reading),
            Skill::Writing => Some(&self.writing),
            Skill::Speaking => Some(&self.speaking),
        }
    }

    pub fn classify(&self, skill: Skill, score: f64) -> Option<Level> {
        self.for_skill(skill).map(|t| t.classify(score))
    }

    pub fn validate(&self) -> Result<(), String> {
        for skill in Skill::TIERED {
            if let Some(table) = self.for_skill(skill) {
                table.validate().map_err(|e| format!("{skill}: {e}"))?;
            }
        }
        Ok(())
    }
}
