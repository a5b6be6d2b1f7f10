//! Type-specific answer scorers and the kind → scorer registry.
//!
//! Every scorer compares a [`NormalizedAnswer`] against the matching
//! [`AnswerKey`] variant. String equality is case-sensitive and ignores
//! leading/trailing whitespace. A scorer handed a mismatched answer/key pair
//! declines with `None`, and the question is skipped.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{dropdown_token, AnswerKey, QuestionKind, DROPDOWN_EXAMPLE_KEY};
use crate::normalizer::NormalizedAnswer;

/// Outcome of scoring one question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    /// Every point-earning item of the key was matched.
    pub is_correct: bool,
    /// Points earned by this question.
    pub points_awarded: f64,
    /// Number of key items the learner matched.
    pub matched: usize,
    /// Number of point-earning key items.
    pub scorable: usize,
}

impl ScoreOutcome {
    /// Award one `points_per_question` increment per matched item.
    pub fn from_matches(matched: usize, scorable: usize, points_per_question: f64) -> Self {
        Self {
            is_correct: scorable > 0 && matched == scorable,
            points_awarded: matched as f64 * points_per_question,
            matched,
            scorable,
        }
    }
}

/// Strategy for scoring one question kind.
pub trait Scorer: Send + Sync {
    /// The question kind this scorer handles.
    fn kind(&self) -> QuestionKind;

    /// Score an answer. Returns `None` when the answer or key is not of this
    /// scorer's kind.
    fn score(
        &self,
        answer: &NormalizedAnswer,
        key: &AnswerKey,
        points_per_question: f64,
    ) -> Option<ScoreOutcome>;
}

fn same(a: &str, b: &str) -> bool {
    a.trim() == b.trim()
}

/// Exact match of a single trimmed string.
pub struct SingleChoiceScorer;

impl Scorer for SingleChoiceScorer {
    fn kind(&self) -> QuestionKind {
        QuestionKind::SingleChoice
    }

    fn score(
        &self,
        answer: &NormalizedAnswer,
        key: &AnswerKey,
        points_per_question: f64,
    ) -> Option<ScoreOutcome> {
        let (NormalizedAnswer::SingleChoice(given), AnswerKey::SingleChoice { correct }) =
            (answer, key)
        else {
            return None;
        };
        let matched = usize::from(same(given, correct));
        Some(ScoreOutcome::from_matches(matched, 1, points_per_question))
    }
}

/// One increment per key pair present in the learner's pairs, in any order.
pub struct PairMatchingScorer;

impl Scorer for PairMatchingScorer {
    fn kind(&self) -> QuestionKind {
        QuestionKind::PairMatching
    }

    fn score(
        &self,
        answer: &NormalizedAnswer,
        key: &AnswerKey,
        points_per_question: f64,
    ) -> Option<ScoreOutcome> {
        let (NormalizedAnswer::PairMatching(given), AnswerKey::PairMatching { pairs }) =
            (answer, key)
        else {
            return None;
        };
        let matched = pairs
            .iter()
            .filter(|expected| {
                given
                    .iter()
                    .any(|p| same(&p.left, &expected.left) && same(&p.right, &expected.right))
            })
            .count();
        Some(ScoreOutcome::from_matches(matched, pairs.len(), points_per_question))
    }
}

/// Sorts the learner's items by assigned position, then compares keys
/// position by position over the overlapping prefix.
pub struct SequenceOrderingScorer;

impl Scorer for SequenceOrderingScorer {
    fn kind(&self) -> QuestionKind {
        QuestionKind::SequenceOrdering
    }

    fn score(
        &self,
        answer: &NormalizedAnswer,
        key: &AnswerKey,
        points_per_question: f64,
    ) -> Option<ScoreOutcome> {
        let (NormalizedAnswer::SequenceOrdering(given), AnswerKey::SequenceOrdering { items }) =
            (answer, key)
        else {
            return None;
        };
        let mut ordered: Vec<_> = given.iter().collect();
        // Ties on position fall back to the key text so input order never matters.
        ordered.sort_by(|a, b| a.value.total_cmp(&b.value).then_with(|| a.key.cmp(&b.key)));

        let matched = ordered
            .iter()
            .zip(items)
            .filter(|(learner, expected)| same(&learner.key, &expected.key))
            .count();
        Some(ScoreOutcome::from_matches(matched, items.len(), points_per_question))
    }
}

/// Compares the i-th non-example key entry with the i-th learner selection.
///
/// Alignment is by list position, not by dropdown index, so a learner list
/// in a different order than the key loses credit.
pub struct IndexedDropdownScorer;

impl Scorer for IndexedDropdownScorer {
    fn kind(&self) -> QuestionKind {
        QuestionKind::IndexedDropdown
    }

    fn score(
        &self,
        answer: &NormalizedAnswer,
        key: &AnswerKey,
        points_per_question: f64,
    ) -> Option<ScoreOutcome> {
        let (NormalizedAnswer::IndexedDropdown(given), AnswerKey::IndexedDropdown { entries }) =
            (answer, key)
        else {
            return None;
        };
        let scored: Vec<_> = entries
            .iter()
            .filter(|e| dropdown_token(&e.key) != DROPDOWN_EXAMPLE_KEY)
            .collect();

        let matched = scored
            .iter()
            .zip(given)
            .filter(|(expected, learner)| {
                dropdown_token(&expected.key) == learner.key.trim()
                    && same(&expected.value, &learner.value)
            })
            .count();
        Some(ScoreOutcome::from_matches(matched, scored.len(), points_per_question))
    }
}

/// One increment per sub-question whose answer, looked up by ID, matches.
pub struct GroupedSubQuestionsScorer;

impl Scorer for GroupedSubQuestionsScorer {
    fn kind(&self) -> QuestionKind {
        QuestionKind::GroupedSubQuestions
    }

    fn score(
        &self,
        answer: &NormalizedAnswer,
        key: &AnswerKey,
        points_per_question: f64,
    ) -> Option<ScoreOutcome> {
        let (
            NormalizedAnswer::GroupedSubQuestions(given),
            AnswerKey::GroupedSubQuestions { sub_questions },
        ) = (answer, key)
        else {
            return None;
        };
        let matched = sub_questions
            .iter()
            .filter(|expected| {
                given
                    .iter()
                    .find(|a| a.id == expected.id)
                    .is_some_and(|a| same(&a.answer, &expected.correct_answer))
            })
            .count();
        Some(ScoreOutcome::from_matches(
            matched,
            sub_questions.len(),
            points_per_question,
        ))
    }
}

/// Maps question kinds to their scorer.
pub struct ScorerRegistry {
    scorers: HashMap<QuestionKind, Box<dyn Scorer>>,
}

impl ScorerRegistry {
    /// A registry with no scorers; every question is skipped.
    pub fn empty() -> Self {
        Self {
            scorers: HashMap::new(),
        }
    }

    /// The five machine scorers. Free-response questions have none.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(SingleChoiceScorer));
        registry.register(Box::new(PairMatchingScorer));
        registry.register(Box::new(SequenceOrderingScorer));
        registry.register(Box::new(IndexedDropdownScorer));
        registry.register(Box::new(GroupedSubQuestionsScorer));
        registry
    }

    /// Register a scorer, replacing any previous scorer for its kind.
    pub fn register(&mut self, scorer: Box<dyn Scorer>) {
        self.scorers.insert(scorer.kind(), scorer);
    }

    pub fn get(&self, kind: QuestionKind) -> Option<&dyn Scorer> {
        self.scorers.get(&kind).map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.scorers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scorers.is_empty()
    }
}

impl Default for ScorerRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
