//! Human-readable renderings of grading reports.

pub mod html;
pub mod markdown;

use serde_json::Value;

use examscore_core::model::Level;

/// Render a trace value on one line; bare strings lose their quotes.
pub(crate) fn compact(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn level_label(level: Option<Level>) -> String {
    level.map_or_else(|| "-".to_string(), |l| l.to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use examscore_core::aggregator::{TraceEntry, Verdict};
    use examscore_core::model::*;
    use examscore_core::report::{GradingReport, SkillScoreReport};

    pub fn sample_report() -> GradingReport {
        let record = AttemptScoreRecord {
            id: "p-1".into(),
            learner_id: "l-1".into(),
            session_id: "e-1".into(),
            scores: SkillScores {
                grammar_vocabulary: 1.0,
                listening: 2.0,
                reading: 0.0,
                writing: 30.0,
                speaking: 46.0,
            },
            levels: SkillLevels {
                listening: Some(Level::A0),
                reading: Some(Level::A0),
                writing: Some(Level::B1),
                speaking: Some(Level::B2),
            },
            total: 78.0,
            published: false,
        };
        let entry = |id: &str, answer: serde_json::Value, verdict, points| TraceEntry {
            question_id: id.into(),
            kind: QuestionKind::SingleChoice,
            student_answer: answer,
            correct_answer: json!({"kind": "single-choice", "correct": "B"}),
            verdict,
            points_added: points,
            points_possible: 2.0,
            note: None,
        };
        GradingReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            attempt_record_id: "p-1".into(),
            learner_id: "l-1".into(),
            exam_id: "e-1".into(),
            skills: vec![SkillScoreReport {
                skill: Skill::Listening,
                total_points: 2.0,
                max_points: 6.0,
                level: Some(Level::A0),
                attempt_total: 78.0,
                trace: vec![
                    entry("l1", json!("B"), Verdict::Correct, 2.0),
                    entry("l2", json!("<script>"), Verdict::Incorrect, 0.0),
                    TraceEntry {
                        note: Some("answer could not be parsed".into()),
                        ..entry("l3", serde_json::Value::Null, Verdict::Malformed, 0.0)
                    },
                ],
                updated_record: record.clone(),
            }],
            record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compact_strips_string_quotes() {
        assert_eq!(compact(&json!("B")), "B");
        assert_eq!(compact(&Value::Null), "-");
        assert_eq!(compact(&json!(["a", "b"])), r#"["a","b"]"#);
    }

    #[test]
    fn missing_level_renders_as_dash() {
        assert_eq!(level_label(None), "-");
        assert_eq!(level_label(Some(Level::B2)), "B2");
    }
}
