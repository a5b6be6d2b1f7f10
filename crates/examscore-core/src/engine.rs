//! Grading service orchestrator.
//!
//! Ties the aggregator, classifier and updater to a persistence collaborator
//! and exposes the operations the request layer calls.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::aggregator::ScoreAggregator;
use crate::config::ScoringConfig;
use crate::error::GradingError;
use crate::model::{AnswerComment, Level, Skill, Submission};
use crate::report::{GradingReport, SkillScoreReport};
use crate::scoring::ScorerRegistry;
use crate::traits::AttemptStore;
use crate::updater::ParticipantScoreUpdater;

/// Confirmation of a teacher-entered score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualScoreReceipt {
    pub skill: Skill,
    /// The score as recorded.
    pub score: f64,
    pub level: Option<Level>,
    /// The record's total after the update.
    pub total_points: f64,
    pub comments_saved: usize,
}

/// The grading service.
pub struct GradingService {
    store: Arc<dyn AttemptStore>,
    registry: Arc<ScorerRegistry>,
    config: Arc<ScoringConfig>,
    updater: ParticipantScoreUpdater,
}

impl GradingService {
    /// A service with the standard scorer registry.
    pub fn new(store: Arc<dyn AttemptStore>, config: Arc<ScoringConfig>) -> Self {
        Self::with_registry(store, Arc::new(ScorerRegistry::standard()), config)
    }

    pub fn with_registry(
        store: Arc<dyn AttemptStore>,
        registry: Arc<ScorerRegistry>,
        config: Arc<ScoringConfig>,
    ) -> Self {
        let updater = ParticipantScoreUpdater::new(Arc::clone(&store), config.levels.clone());
        Self {
            store,
            registry,
            config,
            updater,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score one auto-graded skill of an attempt and write it to the record.
    ///
    /// Fails with [`GradingError::NoSubmissionsFound`] when the learner has no
    /// submissions at all for the attempt, which is distinct from scoring zero.
    pub async fn score_skill(
        &self,
        attempt_record_id: &str,
        learner_id: &str,
        exam_id: &str,
        skill: Skill,
    ) -> Result<SkillScoreReport, GradingError> {
        if skill.is_manual() {
            return Err(GradingError::InvalidSkill(skill));
        }
        let submissions = self
            .fetch_submissions(attempt_record_id, learner_id, exam_id)
            .await?;
        self.score_submissions(attempt_record_id, &submissions, skill)
            .await
    }

    /// Score every auto-graded skill present in the attempt's submissions.
    ///
    /// Skills are scored concurrently; record updates are serialized by the
    /// updater so the final total reflects every skill.
    pub async fn score_attempt(
        &self,
        attempt_record_id: &str,
        learner_id: &str,
        exam_id: &str,
    ) -> Result<GradingReport, GradingError> {
        let submissions = self
            .fetch_submissions(attempt_record_id, learner_id, exam_id)
            .await?;

        let skills: Vec<Skill> = Skill::AUTO_SCORED
            .into_iter()
            .filter(|skill| submissions.iter().any(|s| s.question.skill == *skill))
            .collect();

        let results = join_all(
            skills
                .iter()
                .map(|&skill| self.score_submissions(attempt_record_id, &submissions, skill)),
        )
        .await;
        let skills = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        let record = self
            .store
            .find_attempt_record(attempt_record_id)
            .await?
            .ok_or_else(|| GradingError::ParticipantNotFound(attempt_record_id.to_string()))?;

        Ok(GradingReport::new(
            attempt_record_id,
            learner_id,
            exam_id,
            skills,
            record,
        ))
    }

    /// Record a teacher's score for writing or speaking.
    pub async fn record_manual_score(
        &self,
        attempt_record_id: &str,
        skill: Skill,
        teacher_score: f64,
        comments: &[AnswerComment],
    ) -> Result<ManualScoreReceipt, GradingError> {
        if !skill.is_manual() {
            return Err(GradingError::InvalidSkill(skill));
        }
        let range = self.config.manual_score;
        if !range.contains(teacher_score) {
            return Err(GradingError::InvalidScore {
                score: teacher_score,
                min: range.min,
                max: range.max,
            });
        }

        let outcome = self
            .updater
            .update(attempt_record_id, skill, teacher_score)
            .await?;
        // Comments are written only once the record update has succeeded.
        if !comments.is_empty() {
            self.store
                .save_answer_comments(attempt_record_id, comments)
                .await?;
        }

        Ok(ManualScoreReceipt {
            skill,
            score: teacher_score,
            level: outcome.level,
            total_points: outcome.total_points,
            comments_saved: comments.len(),
        })
    }

    async fn fetch_submissions(
        &self,
        attempt_record_id: &str,
        learner_id: &str,
        exam_id: &str,
    ) -> Result<Vec<Submission>, GradingError> {
        let submissions = self
            .store
            .find_attempt_submissions(learner_id, exam_id, attempt_record_id)
            .await?;
        if submissions.is_empty() {
            return Err(GradingError::NoSubmissionsFound {
                learner_id: learner_id.to_string(),
                exam_id: exam_id.to_string(),
                attempt_id: attempt_record_id.to_string(),
            });
        }
        tracing::debug!(
            store = self.store.name(),
            count = submissions.len(),
            "submissions loaded"
        );
        Ok(submissions)
    }

    async fn score_submissions(
        &self,
        attempt_record_id: &str,
        submissions: &[Submission],
        skill: Skill,
    ) -> Result<SkillScoreReport, GradingError> {
        let aggregate = ScoreAggregator::new(&self.registry, &self.config.points_per_question)
            .aggregate(submissions, skill);
        let outcome = self
            .updater
            .update(attempt_record_id, skill, aggregate.score)
            .await?;

        Ok(SkillScoreReport {
            skill,
            total_points: aggregate.score,
            max_points: aggregate.max_points,
            level: outcome.level,
            attempt_total: outcome.total_points,
            trace: aggregate.trace,
            updated_record: outcome.record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::model::{
        AnswerKey, AttemptRecordPatch, AttemptScoreRecord, Question, SkillLevels, SkillScores,
    };

    struct TestStore {
        submissions: Vec<Submission>,
        record: Mutex<Option<AttemptScoreRecord>>,
        comments: Mutex<Vec<AnswerComment>>,
    }

    #[async_trait]
    impl AttemptStore for TestStore {
        fn name(&self) -> &str {
            "test"
        }

        async fn find_attempt_submissions(
            &self,
            _learner_id: &str,
            _exam_id: &str,
            _attempt_id: &str,
        ) -> anyhow::Result<Vec<Submission>> {
            Ok(self.submissions.clone())
        }

        async fn find_attempt_record(&self, id: &str) -> anyhow::Result<Option<AttemptScoreRecord>> {
            Ok(self.record.lock().unwrap().clone().filter(|r| r.id == id))
        }

        async fn update_attempt_record(
            &self,
            _id: &str,
            patch: &AttemptRecordPatch,
        ) -> anyhow::Result<()> {
            let mut record = self.record.lock().unwrap();
            let record = record.as_mut().ok_or_else(|| anyhow::anyhow!("gone"))?;
            patch.apply_to(record);
            Ok(())
        }

        async fn save_answer_comments(
            &self,
            _id: &str,
            comments: &[AnswerComment],
        ) -> anyhow::Result<()> {
            self.comments.lock().unwrap().extend_from_slice(comments);
            Ok(())
        }
    }

    fn question(id: &str, skill: Skill, correct: &str) -> Question {
        Question {
            id: id.into(),
            skill,
            answer_key: AnswerKey::SingleChoice {
                correct: correct.into(),
            },
        }
    }

    fn answer(id: &str, question: Question, raw: &str) -> Submission {
        Submission {
            id: id.into(),
            attempt_id: "p-1".into(),
            question,
            raw_answer: Some(json!(raw)),
        }
    }

    fn build(submissions: Vec<Submission>, scores: SkillScores) -> (Arc<TestStore>, GradingService) {
        let store = Arc::new(TestStore {
            submissions,
            record: Mutex::new(Some(AttemptScoreRecord {
                id: "p-1".into(),
                learner_id: "l-1".into(),
                session_id: "s-1".into(),
                scores,
                levels: SkillLevels::default(),
                total: scores.tiered_total_with(Skill::Listening, scores.listening),
                published: false,
            })),
            comments: Mutex::new(Vec::new()),
        });
        let service = GradingService::new(store.clone(), Arc::new(ScoringConfig::default()));
        (store, service)
    }

    #[tokio::test]
    async fn score_skill_updates_record() {
        let (store, service) = build(
            vec![
                answer("s1", question("q1", Skill::Listening, "A"), "A"),
                answer("s2", question("q2", Skill::Listening, "B"), "B"),
                answer("s3", question("q3", Skill::Reading, "C"), "C"),
            ],
            SkillScores {
                reading: 10.0,
                writing: 20.0,
                speaking: 5.0,
                ..SkillScores::default()
            },
        );
        let report = service
            .score_skill("p-1", "l-1", "e-1", Skill::Listening)
            .await
            .unwrap();
        assert_eq!(report.total_points, 4.0);
        assert_eq!(report.level, Some(Level::A0));
        assert_eq!(report.attempt_total, 39.0);
        assert_eq!(report.trace.len(), 2);

        let stored = store.record.lock().unwrap().clone().unwrap();
        assert_eq!(stored, report.updated_record);
        assert_eq!(stored.scores.listening, 4.0);
    }

    #[tokio::test]
    async fn grammar_score_leaves_total_alone() {
        let (store, service) = build(
            vec![answer("s1", question("q1", Skill::GrammarVocabulary, "A"), "A")],
            SkillScores {
                listening: 12.0,
                ..SkillScores::default()
            },
        );
        let report = service
            .score_skill("p-1", "l-1", "e-1", Skill::GrammarVocabulary)
            .await
            .unwrap();
        assert_eq!(report.level, None);
        assert_eq!(report.attempt_total, 12.0);
        assert_eq!(store.record.lock().unwrap().as_ref().unwrap().scores.grammar_vocabulary, 1.0);
    }

    #[tokio::test]
    async fn no_submissions_is_distinct_from_zero() {
        let (_, service) = build(vec![], SkillScores::default());
        let err = service
            .score_skill("p-1", "l-1", "e-1", Skill::Reading)
            .await
            .unwrap_err();
        assert!(matches!(err, GradingError::NoSubmissionsFound { .. }));

        let (_, service) = build(
            vec![answer("s1", question("q1", Skill::Listening, "A"), "A")],
            SkillScores::default(),
        );
        let report = service
            .score_skill("p-1", "l-1", "e-1", Skill::Reading)
            .await
            .unwrap();
        assert_eq!(report.total_points, 0.0);
        assert!(report.trace.is_empty());
    }

    #[tokio::test]
    async fn unknown_record_is_participant_not_found() {
        let (_, service) = build(
            vec![answer("s1", question("q1", Skill::Listening, "A"), "A")],
            SkillScores::default(),
        );
        let err = service
            .score_skill("p-404", "l-1", "e-1", Skill::Listening)
            .await
            .unwrap_err();
        assert!(matches!(err, GradingError::ParticipantNotFound(id) if id == "p-404"));
    }

    #[tokio::test]
    async fn manual_score_recomputes_total() {
        let (store, service) = build(
            vec![],
            SkillScores {
                listening: 30.0,
                reading: 30.0,
                writing: 30.0,
                ..SkillScores::default()
            },
        );
        let comments = vec![AnswerComment {
            question_id: "sp-1".into(),
            comment: "Good fluency".into(),
        }];
        let receipt = service
            .record_manual_score("p-1", Skill::Speaking, 46.0, &comments)
            .await
            .unwrap();
        assert_eq!(receipt.score, 46.0);
        assert_eq!(receipt.total_points, 136.0);
        assert_eq!(receipt.level, Some(Level::B2));
        assert_eq!(receipt.comments_saved, 1);
        assert_eq!(store.comments.lock().unwrap().len(), 1);

        let again = service
            .record_manual_score("p-1", Skill::Speaking, 46.0, &[])
            .await
            .unwrap();
        assert_eq!(again.total_points, 136.0);
    }

    #[tokio::test]
    async fn manual_score_for_missing_record_saves_no_comments() {
        let (store, service) = build(vec![], SkillScores::default());
        let comments = vec![AnswerComment {
            question_id: "w-1".into(),
            comment: "Clear structure".into(),
        }];
        let err = service
            .record_manual_score("p-404", Skill::Writing, 30.0, &comments)
            .await
            .unwrap_err();
        assert!(matches!(err, GradingError::ParticipantNotFound(id) if id == "p-404"));
        assert!(store.comments.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn manual_score_validates_before_writing() {
        let (store, service) = build(vec![], SkillScores::default());
        let err = service
            .record_manual_score("p-1", Skill::Reading, 10.0, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GradingError::InvalidSkill(Skill::Reading)));

        let err = service
            .record_manual_score("p-1", Skill::Writing, 50.5, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GradingError::InvalidScore { .. }));
        assert_eq!(store.record.lock().unwrap().as_ref().unwrap().scores.writing, 0.0);
    }

    #[tokio::test]
    async fn manual_skills_cannot_be_auto_scored() {
        let (_, service) = build(vec![], SkillScores::default());
        let err = service
            .score_skill("p-1", "l-1", "e-1", Skill::Writing)
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn score_attempt_grades_present_skills() {
        let (_, service) = build(
            vec![
                answer("s1", question("q1", Skill::Listening, "A"), "A"),
                answer("s2", question("q2", Skill::Reading, "B"), "B"),
                answer("s3", question("q3", Skill::GrammarVocabulary, "C"), "C"),
            ],
            SkillScores {
                speaking: 20.0,
                ..SkillScores::default()
            },
        );
        let report = service.score_attempt("p-1", "l-1", "e-1").await.unwrap();
        assert_eq!(report.skills.len(), 3);
        assert_eq!(report.record.scores.grammar_vocabulary, 1.0);
        assert_eq!(report.record.total, 24.0);
    }
}
