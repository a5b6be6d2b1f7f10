//! End-to-end tests of the grading pipeline over the in-memory store.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use examscore_core::aggregator::Verdict;
use examscore_core::config::ScoringConfig;
use examscore_core::model::*;
use examscore_core::{GradingError, GradingService};
use examscore_store::{Fixture, MemoryStore, StoredSubmission};

fn example_store() -> MemoryStore {
    Fixture::load(Path::new("../../fixtures/example.json"))
        .unwrap()
        .into_store()
}

fn service(store: &Arc<MemoryStore>) -> GradingService {
    GradingService::new(store.clone(), Arc::new(ScoringConfig::default()))
}

fn record(id: &str, scores: SkillScores) -> AttemptScoreRecord {
    AttemptScoreRecord {
        id: id.into(),
        learner_id: "learner".into(),
        session_id: "exam".into(),
        scores,
        levels: SkillLevels::default(),
        total: scores.tiered_total_with(Skill::Listening, scores.listening),
        published: false,
    }
}

fn submit(store: &MemoryStore, id: &str, question: &str, raw: serde_json::Value) {
    store.insert_submission(StoredSubmission {
        id: id.into(),
        learner_id: "learner".into(),
        exam_id: "exam".into(),
        attempt_id: "p-1".into(),
        question_id: question.into(),
        raw_answer: Some(raw),
    });
}

#[tokio::test]
async fn example_attempt_scores_every_auto_graded_skill() {
    let store = Arc::new(example_store());
    let report = service(&store)
        .score_attempt("attempt-1", "learner-1", "exam-1")
        .await
        .unwrap();

    let skills: Vec<Skill> = report.skills.iter().map(|s| s.skill).collect();
    assert_eq!(
        skills,
        [Skill::GrammarVocabulary, Skill::Listening, Skill::Reading]
    );

    let gv = report.skill(Skill::GrammarVocabulary).unwrap();
    assert_eq!(gv.total_points, 1.0);
    assert_eq!(gv.level, None);

    let listening = report.skill(Skill::Listening).unwrap();
    assert_eq!(listening.total_points, 12.0);
    assert_eq!(listening.max_points, 14.0);
    assert_eq!(listening.level, Some(Level::A1));
    assert_eq!(listening.count(Verdict::Correct), 2);
    assert_eq!(listening.count(Verdict::PartiallyCorrect), 1);

    let reading = report.skill(Skill::Reading).unwrap();
    assert_eq!(reading.total_points, 6.0);
    assert_eq!(reading.level, Some(Level::A0));
    assert_eq!(reading.count(Verdict::Unanswered), 1);

    assert_eq!(report.record.total, 48.0);
    assert_eq!(report.record.scores.grammar_vocabulary, 1.0);
    assert_eq!(store.record("attempt-1").unwrap(), report.record);
}

#[tokio::test]
async fn regrading_is_idempotent() {
    let store = Arc::new(example_store());
    let service = service(&store);
    let first = service
        .score_attempt("attempt-1", "learner-1", "exam-1")
        .await
        .unwrap();
    let second = service
        .score_attempt("attempt-1", "learner-1", "exam-1")
        .await
        .unwrap();
    assert_eq!(first.record, second.record);
    assert_eq!(second.record.total, 48.0);
}

#[tokio::test]
async fn speaking_score_completes_the_total() {
    let store = Arc::new(MemoryStore::new());
    store.insert_record(record(
        "p-1",
        SkillScores {
            listening: 30.0,
            reading: 30.0,
            writing: 30.0,
            ..SkillScores::default()
        },
    ));

    let receipt = service(&store)
        .record_manual_score("p-1", Skill::Speaking, 46.0, &[])
        .await
        .unwrap();
    assert_eq!(receipt.level, Some(Level::B2));
    assert_eq!(receipt.total_points, 136.0);

    let stored = store.record("p-1").unwrap();
    assert_eq!(stored.scores.speaking, 46.0);
    assert_eq!(stored.levels.speaking, Some(Level::B2));
    assert_eq!(stored.total, 136.0);
}

#[tokio::test]
async fn concurrent_updates_to_one_record_keep_every_score() {
    let store = Arc::new(MemoryStore::new().with_read_delay(Duration::from_millis(20)));
    store.insert_record(record("p-1", SkillScores::default()));
    store.insert_question(Question {
        id: "l-1".into(),
        skill: Skill::Listening,
        answer_key: AnswerKey::SingleChoice {
            correct: "A".into(),
        },
    });
    submit(&store, "s-1", "l-1", json!("A"));

    let service = Arc::new(service(&store));
    let writing = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .record_manual_score("p-1", Skill::Writing, 20.0, &[])
                .await
        })
    };
    let speaking = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .record_manual_score("p-1", Skill::Speaking, 10.0, &[])
                .await
        })
    };
    let listening = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .score_skill("p-1", "learner", "exam", Skill::Listening)
                .await
        })
    };

    writing.await.unwrap().unwrap();
    speaking.await.unwrap().unwrap();
    listening.await.unwrap().unwrap();

    let stored = store.record("p-1").unwrap();
    assert_eq!(stored.scores.writing, 20.0);
    assert_eq!(stored.scores.speaking, 10.0);
    assert_eq!(stored.scores.listening, 2.0);
    assert_eq!(stored.total, 32.0);
    assert_eq!(store.record_writes(), 3);
}

#[tokio::test]
async fn malformed_answer_does_not_fail_the_skill() {
    let store = Arc::new(MemoryStore::new());
    store.insert_record(record("p-1", SkillScores::default()));
    store.insert_question(Question {
        id: "r-1".into(),
        skill: Skill::Reading,
        answer_key: AnswerKey::PairMatching {
            pairs: vec![MatchPair {
                left: "1".into(),
                right: "A".into(),
            }],
        },
    });
    store.insert_question(Question {
        id: "r-2".into(),
        skill: Skill::Reading,
        answer_key: AnswerKey::SingleChoice {
            correct: "B".into(),
        },
    });
    submit(&store, "s-1", "r-1", json!("{not json"));
    submit(&store, "s-2", "r-2", json!("B"));

    let report = service(&store)
        .score_skill("p-1", "learner", "exam", Skill::Reading)
        .await
        .unwrap();
    assert_eq!(report.total_points, 2.0);
    assert_eq!(report.count(Verdict::Malformed), 1);
    let malformed = report
        .trace
        .iter()
        .find(|t| t.verdict == Verdict::Malformed)
        .unwrap();
    assert_eq!(malformed.question_id, "r-1");
    assert!(malformed.note.as_deref().unwrap().contains("invalid JSON"));
}

#[tokio::test]
async fn last_duplicate_submission_wins() {
    let store = Arc::new(MemoryStore::new());
    store.insert_record(record("p-1", SkillScores::default()));
    store.insert_question(Question {
        id: "l-1".into(),
        skill: Skill::Listening,
        answer_key: AnswerKey::SingleChoice {
            correct: "A".into(),
        },
    });
    submit(&store, "s-1", "l-1", json!("A"));
    submit(&store, "s-2", "l-1", json!("C"));

    let report = service(&store)
        .score_skill("p-1", "learner", "exam", Skill::Listening)
        .await
        .unwrap();
    assert_eq!(report.trace.len(), 1);
    assert_eq!(report.total_points, 0.0);
}

#[tokio::test]
async fn store_failure_propagates_unchanged() {
    let store = Arc::new(example_store().with_failure("database offline"));
    let err = service(&store)
        .score_skill("attempt-1", "learner-1", "exam-1", Skill::Reading)
        .await
        .unwrap_err();
    assert!(matches!(err, GradingError::Store(_)));
    assert_eq!(err.to_string(), "store unavailable: database offline");
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn comments_are_saved_with_manual_scores() {
    let store = Arc::new(example_store());
    let comments = [
        AnswerComment {
            question_id: "w-1".into(),
            comment: "Good paragraphing".into(),
        },
        AnswerComment {
            question_id: "w-1".into(),
            comment: "Watch verb tenses".into(),
        },
    ];
    let receipt = service(&store)
        .record_manual_score("attempt-1", Skill::Writing, 40.0, &comments)
        .await
        .unwrap();
    assert_eq!(receipt.comments_saved, 2);
    assert_eq!(receipt.level, Some(Level::B2));
    assert_eq!(store.comments().len(), 2);

    let fixture = Fixture::from_store(&store);
    assert_eq!(fixture.comments.len(), 2);
    assert_eq!(fixture.comments[1].comment.comment, "Watch verb tenses");
}

#[tokio::test]
async fn missing_record_leaves_no_comments_behind() {
    let store = Arc::new(MemoryStore::new());
    let comments = [AnswerComment {
        question_id: "w-1".into(),
        comment: "Clear structure".into(),
    }];
    let err = service(&store)
        .record_manual_score("p-missing", Skill::Writing, 30.0, &comments)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "participant not found: p-missing");
    assert_eq!(err.status_code(), 404);
    assert!(store.comments().is_empty());
    assert_eq!(store.record_writes(), 0);
}

#[tokio::test]
async fn reentering_a_manual_score_replaces_its_comments() {
    let store = Arc::new(example_store());
    let service = service(&store);
    let first = [AnswerComment {
        question_id: "w-1".into(),
        comment: "Good paragraphing".into(),
    }];
    let second = [AnswerComment {
        question_id: "w-1".into(),
        comment: "Linking words improved".into(),
    }];
    service
        .record_manual_score("attempt-1", Skill::Writing, 30.0, &first)
        .await
        .unwrap();
    service
        .record_manual_score("attempt-1", Skill::Writing, 34.0, &second)
        .await
        .unwrap();

    let comments = store.comments();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].comment.comment, "Linking words improved");
    assert_eq!(store.record("attempt-1").unwrap().scores.writing, 34.0);
}
