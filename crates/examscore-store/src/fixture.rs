//! JSON fixture files: a whole store's contents in one document.
//!
//! Loads fixtures into a [`MemoryStore`], writes a store back out, and
//! validates fixtures for common authoring mistakes.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examscore_core::model::{AnswerKey, AttemptScoreRecord, Question};

use crate::memory::{MemoryStore, StoredComment, StoredSubmission};

/// Serialized contents of a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub submissions: Vec<StoredSubmission>,
    #[serde(default)]
    pub records: Vec<AttemptScoreRecord>,
    #[serde(default)]
    pub comments: Vec<StoredComment>,
}

impl Fixture {
    /// Load a fixture from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture file: {}", path.display()))?;
        Self::parse_str(&content)
            .with_context(|| format!("failed to parse fixture: {}", path.display()))
    }

    /// Parse a fixture from a JSON string.
    pub fn parse_str(content: &str) -> Result<Self> {
        let fixture: Fixture = serde_json::from_str(content)?;
        Ok(fixture)
    }

    /// Write the fixture as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize fixture")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write fixture to {}", path.display()))?;
        Ok(())
    }

    /// Build a store holding this fixture's contents.
    pub fn into_store(self) -> MemoryStore {
        let store = MemoryStore::new();
        for question in self.questions {
            store.insert_question(question);
        }
        for submission in self.submissions {
            store.insert_submission(submission);
        }
        for record in self.records {
            store.insert_record(record);
        }
        store.restore_comments(self.comments);
        tracing::debug!(
            questions = store.questions().len(),
            records = store.records().len(),
            "fixture loaded into memory store"
        );
        store
    }

    /// Capture the current contents of a store.
    pub fn from_store(store: &MemoryStore) -> Self {
        Self {
            questions: store.questions(),
            submissions: store.submissions(),
            records: store.records(),
            comments: store.comments(),
        }
    }
}

/// A non-fatal problem found in a fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The question or submission concerned, if any.
    pub subject: Option<String>,
    pub message: String,
}

/// Validate a fixture for common issues.
pub fn validate_fixture(fixture: &Fixture) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut question_ids = HashSet::new();
    for q in &fixture.questions {
        if !question_ids.insert(q.id.as_str()) {
            warnings.push(ValidationWarning {
                subject: Some(q.id.clone()),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    let questions: HashMap<&str, &Question> = fixture
        .questions
        .iter()
        .map(|q| (q.id.as_str(), q))
        .collect();

    for q in &fixture.questions {
        if !matches!(q.answer_key, AnswerKey::FreeResponse) && q.answer_key.scorable_items() == 0 {
            warnings.push(ValidationWarning {
                subject: Some(q.id.clone()),
                message: format!("{} answer key has no scorable items", q.kind()),
            });
        }
        if matches!(q.answer_key, AnswerKey::FreeResponse) && !q.skill.is_manual() {
            warnings.push(ValidationWarning {
                subject: Some(q.id.clone()),
                message: format!("free-response question under {} is never auto-scored", q.skill),
            });
        }
    }

    for s in &fixture.submissions {
        if !questions.contains_key(s.question_id.as_str()) {
            warnings.push(ValidationWarning {
                subject: Some(s.id.clone()),
                message: format!("submission references unknown question {}", s.question_id),
            });
        }
    }

    let mut answered = HashSet::new();
    for s in &fixture.submissions {
        if !answered.insert((s.attempt_id.as_str(), s.question_id.as_str())) {
            warnings.push(ValidationWarning {
                subject: Some(s.id.clone()),
                message: format!(
                    "attempt {} answers question {} more than once; the last answer wins",
                    s.attempt_id, s.question_id
                ),
            });
        }
    }

    let record_ids: HashSet<&str> = fixture.records.iter().map(|r| r.id.as_str()).collect();
    let mut orphaned: Vec<&str> = fixture
        .submissions
        .iter()
        .map(|s| s.attempt_id.as_str())
        .filter(|id| !record_ids.contains(id))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    orphaned.sort_unstable();
    for attempt_id in orphaned {
        warnings.push(ValidationWarning {
            subject: Some(attempt_id.to_string()),
            message: format!("submissions reference attempt {attempt_id} with no score record"),
        });
    }

    warnings
}
