//! Participant score updates.
//!
//! Writes a skill score onto an attempt score record, together with the skill
//! level and the recomputed total for tiered skills. The read-modify-write of
//! one record is serialized through [`AttemptLocks`], so concurrent grading of
//! different skills for the same attempt cannot lose an update.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;

use crate::aggregator::round_one_decimal;
use crate::classifier::LevelTables;
use crate::error::GradingError;
use crate::model::{AttemptRecordPatch, AttemptScoreRecord, Level, Skill};
use crate::traits::AttemptStore;

/// One async mutex per attempt record id.
#[derive(Default)]
pub struct AttemptLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AttemptLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one attempt record.
    pub async fn lock(&self, attempt_record_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Entries nobody holds or waits on only have the map's reference.
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            Arc::clone(locks.entry(attempt_record_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of records currently locked or awaited.
    pub fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.values().filter(|l| Arc::strong_count(l) > 1).count()
    }
}

/// Result of a score update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreUpdateOutcome {
    /// The record's total after the update.
    pub total_points: f64,
    /// Level of the updated skill; `None` for grammar/vocabulary.
    pub level: Option<Level>,
    /// The record as written.
    pub record: AttemptScoreRecord,
}

/// Persists skill scores, levels and totals onto attempt score records.
pub struct ParticipantScoreUpdater {
    store: Arc<dyn AttemptStore>,
    levels: LevelTables,
    locks: AttemptLocks,
}

impl ParticipantScoreUpdater {
    pub fn new(store: Arc<dyn AttemptStore>, levels: LevelTables) -> Self {
        Self {
            store,
            levels,
            locks: AttemptLocks::new(),
        }
    }

    /// Write `score` for `skill` onto the record.
    ///
    /// Grammar/vocabulary only updates its score. Tiered skills also update
    /// their level and recompute the total from the new score and the other
    /// three stored tiered scores, so repeating a call is idempotent.
    pub async fn update(
        &self,
        attempt_record_id: &str,
        skill: Skill,
        score: f64,
    ) -> Result<ScoreUpdateOutcome, GradingError> {
        let _guard = self.locks.lock(attempt_record_id).await;

        let mut record = self
            .store
            .find_attempt_record(attempt_record_id)
            .await?
            .ok_or_else(|| GradingError::ParticipantNotFound(attempt_record_id.to_string()))?;

        let patch = compute_patch(&self.levels, &record, skill, score);
        self.store
            .update_attempt_record(attempt_record_id, &patch)
            .await?;
        patch.apply_to(&mut record);

        tracing::info!(
            record = attempt_record_id,
            %skill,
            score,
            level = ?patch.level,
            total = record.total,
            "attempt record updated"
        );

        Ok(ScoreUpdateOutcome {
            total_points: record.total,
            level: patch.level,
            record,
        })
    }

    pub fn levels(&self) -> &LevelTables {
        &self.levels
    }
}

/// Fields to write for a new `score` of `skill` on `record`.
pub fn compute_patch(
    levels: &LevelTables,
    record: &AttemptScoreRecord,
    skill: Skill,
    score: f64,
) -> AttemptRecordPatch {
    if !skill.is_tiered() {
        return AttemptRecordPatch {
            skill,
            score,
            level: None,
            total: None,
        };
    }
    AttemptRecordPatch {
        skill,
        score,
        level: levels.classify(skill, score),
        total: Some(round_one_decimal(
            record.scores.tiered_total_with(skill, score),
        )),
    }
}
