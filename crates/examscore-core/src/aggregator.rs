//! Per-skill score aggregation with a per-question trace.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PointsPerQuestion;
use crate::model::{QuestionKind, Skill, Submission};
use crate::normalizer::{normalize, NormalizedAnswer};
use crate::scoring::ScorerRegistry;

/// Judgment on one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    PartiallyCorrect,
    Incorrect,
    Unanswered,
    /// The stored answer could not be parsed; scored zero.
    Malformed,
    /// No scorer applies (free-response, or answer/key mismatch).
    Skipped,
}

/// Scoring detail of one question, returned to the caller for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub question_id: String,
    pub kind: QuestionKind,
    pub student_answer: Value,
    pub correct_answer: Value,
    pub verdict: Verdict,
    pub points_added: f64,
    /// Points the question could have earned.
    pub points_possible: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Score of one skill for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillAggregate {
    pub skill: Skill,
    /// Sum of points, rounded to one decimal.
    pub score: f64,
    /// Sum of attainable points over auto-scored questions.
    pub max_points: f64,
    pub trace: Vec<TraceEntry>,
}

impl SkillAggregate {
    pub fn count(&self, verdict: Verdict) -> usize {
        self.trace.iter().filter(|t| t.verdict == verdict).count()
    }
}

/// Round to one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Sums scorer outcomes over the questions of one skill.
pub struct ScoreAggregator<'a> {
    registry: &'a ScorerRegistry,
    points: &'a PointsPerQuestion,
}

impl<'a> ScoreAggregator<'a> {
    pub fn new(registry: &'a ScorerRegistry, points: &'a PointsPerQuestion) -> Self {
        Self { registry, points }
    }

    /// Score every submission whose question belongs to `skill`.
    ///
    /// When several submissions exist for one question, the last one wins.
    /// Malformed answers are scored zero and flagged in the trace.
    pub fn aggregate(&self, submissions: &[Submission], skill: Skill) -> SkillAggregate {
        let points_per_question = self.points.get(skill);
        let mut total = 0.0;
        let mut max_points = 0.0;
        let mut trace = Vec::new();

        for submission in latest_per_question(submissions, skill) {
            let question = &submission.question;
            let kind = question.kind();
            let correct_answer = serde_json::to_value(&question.answer_key).unwrap_or(Value::Null);
            let scorer = self.registry.get(kind);
            let points_possible = if scorer.is_some() {
                question.answer_key.scorable_items() as f64 * points_per_question
            } else {
                0.0
            };

            let mut entry = TraceEntry {
                question_id: question.id.clone(),
                kind,
                student_answer: submission.raw_answer.clone().unwrap_or(Value::Null),
                correct_answer,
                verdict: Verdict::Skipped,
                points_added: 0.0,
                points_possible,
                note: None,
            };

            let Some(scorer) = scorer else {
                tracing::debug!(question = %question.id, %kind, "no scorer for question kind, skipping");
                entry.note = Some(format!("{kind} questions are not auto-scored"));
                trace.push(entry);
                continue;
            };
            max_points += points_possible;

            let answer = match normalize(submission.raw_answer.as_ref(), kind) {
                Ok(answer) => answer,
                Err(e) => {
                    tracing::warn!(question = %question.id, "malformed answer scored zero: {e}");
                    entry.verdict = Verdict::Malformed;
                    entry.note = Some(e.to_string());
                    trace.push(entry);
                    continue;
                }
            };
            entry.student_answer = serde_json::to_value(&answer).unwrap_or(Value::Null);

            if answer.is_unanswered() {
                entry.verdict = Verdict::Unanswered;
                trace.push(entry);
                continue;
            }

            match scorer.score(&answer, &question.answer_key, points_per_question) {
                Some(outcome) => {
                    entry.verdict = if outcome.is_correct {
                        Verdict::Correct
                    } else if outcome.matched > 0 {
                        Verdict::PartiallyCorrect
                    } else {
                        Verdict::Incorrect
                    };
                    entry.points_added = outcome.points_awarded;
                    total += outcome.points_awarded;
                }
                None => {
                    tracing::warn!(question = %question.id, %kind, "answer shape does not match key, skipping");
                    entry.note = Some("answer does not match the question kind".to_string());
                }
            }
            tracing::debug!(
                question = %question.id,
                verdict = ?entry.verdict,
                points = entry.points_added,
                "question scored"
            );
            trace.push(entry);
        }

        let aggregate = SkillAggregate {
            skill,
            score: round_one_decimal(total),
            max_points: round_one_decimal(max_points),
            trace,
        };
        tracing::info!(
            %skill,
            score = aggregate.score,
            max = aggregate.max_points,
            questions = aggregate.trace.len(),
            "skill aggregated"
        );
        aggregate
    }
}

/// Submissions of `skill`, one per question, keeping the last one found.
fn latest_per_question(submissions: &[Submission], skill: Skill) -> Vec<&Submission> {
    let mut latest: Vec<&Submission> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for submission in submissions.iter().filter(|s| s.question.skill == skill) {
        match positions.get(submission.question.id.as_str()) {
            Some(&i) => {
                tracing::warn!(
                    question = %submission.question.id,
                    replaced = %latest[i].id,
                    by = %submission.id,
                    "duplicate submission, keeping the last one"
                );
                latest[i] = submission;
            }
            None => {
                positions.insert(submission.question.id.as_str(), latest.len());
                latest.push(submission);
            }
        }
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerKey, MatchPair, Question};
    use serde_json::json;

    fn submission(id: &str, question: Question, raw: Value) -> Submission {
        Submission {
            id: id.into(),
            attempt_id: "attempt-1".into(),
            question,
            raw_answer: Some(raw),
        }
    }

    fn choice(id: &str, skill: Skill, correct: &str) -> Question {
        Question {
            id: id.into(),
            skill,
            answer_key: AnswerKey::SingleChoice {
                correct: correct.into(),
            },
        }
    }

    fn aggregate(submissions: &[Submission], skill: Skill) -> SkillAggregate {
        let registry = ScorerRegistry::standard();
        let points = PointsPerQuestion::default();
        ScoreAggregator::new(&registry, &points).aggregate(submissions, skill)
    }

    #[test]
    fn sums_only_target_skill() {
        let subs = vec![
            submission("s1", choice("q1", Skill::Listening, "A"), json!("A")),
            submission("s2", choice("q2", Skill::Listening, "B"), json!("C")),
            submission("s3", choice("q3", Skill::Reading, "A"), json!("A")),
        ];
        let result = aggregate(&subs, Skill::Listening);
        assert_eq!(result.score, 2.0);
        assert_eq!(result.max_points, 4.0);
        assert_eq!(result.trace.len(), 2);
        assert_eq!(result.count(Verdict::Correct), 1);
        assert_eq!(result.count(Verdict::Incorrect), 1);
    }

    #[test]
    fn malformed_answer_does_not_abort_skill() {
        let matching = Question {
            id: "q2".into(),
            skill: Skill::Reading,
            answer_key: AnswerKey::PairMatching {
                pairs: vec![MatchPair {
                    left: "1".into(),
                    right: "A".into(),
                }],
            },
        };
        let subs = vec![
            submission("s1", choice("q1", Skill::Reading, "A"), json!("A")),
            submission("s2", matching, json!("[{not json")),
        ];
        let result = aggregate(&subs, Skill::Reading);
        assert_eq!(result.score, 2.0);
        let malformed = &result.trace[1];
        assert_eq!(malformed.verdict, Verdict::Malformed);
        assert!(malformed.note.as_deref().unwrap_or_default().contains("invalid JSON"));
        assert_eq!(malformed.student_answer, json!("[{not json"));
    }

    #[test]
    fn last_duplicate_submission_wins() {
        let subs = vec![
            submission("s1", choice("q1", Skill::GrammarVocabulary, "A"), json!("A")),
            submission("s2", choice("q1", Skill::GrammarVocabulary, "A"), json!("B")),
        ];
        let result = aggregate(&subs, Skill::GrammarVocabulary);
        assert_eq!(result.trace.len(), 1);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.trace[0].student_answer, json!("B"));
    }

    #[test]
    fn free_response_and_blank_answers_contribute_zero() {
        let essay = Question {
            id: "w1".into(),
            skill: Skill::Listening,
            answer_key: AnswerKey::FreeResponse,
        };
        let subs = vec![
            submission("s1", essay, json!("A long essay")),
            Submission {
                raw_answer: None,
                ..submission("s2", choice("q2", Skill::Listening, "A"), Value::Null)
            },
        ];
        let result = aggregate(&subs, Skill::Listening);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.max_points, 2.0);
        assert_eq!(result.trace[0].verdict, Verdict::Skipped);
        assert_eq!(result.trace[0].points_possible, 0.0);
        assert_eq!(result.trace[1].verdict, Verdict::Unanswered);
    }

    #[test]
    fn score_is_rounded_to_one_decimal() {
        let registry = ScorerRegistry::standard();
        let points = PointsPerQuestion {
            grammar_vocabulary: 0.1,
            ..PointsPerQuestion::default()
        };
        let subs: Vec<_> = (0..3)
            .map(|i| {
                submission(
                    &format!("s{i}"),
                    choice(&format!("q{i}"), Skill::GrammarVocabulary, "A"),
                    json!("A"),
                )
            })
            .collect();
        let result = ScoreAggregator::new(&registry, &points).aggregate(&subs, Skill::GrammarVocabulary);
        assert_eq!(result.score, 0.3);
    }

    #[test]
    fn empty_registry_skips_everything() {
        let registry = ScorerRegistry::empty();
        let points = PointsPerQuestion::default();
        let subs = vec![submission("s1", choice("q1", Skill::Reading, "A"), json!("A"))];
        let result = ScoreAggregator::new(&registry, &points).aggregate(&subs, Skill::Reading);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.count(Verdict::Skipped), 1);
    }
}
