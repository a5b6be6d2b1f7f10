//! Core data model types for examscore.
//!
//! Questions, submissions and attempt score records, plus the closed set of
//! skills, question kinds and proficiency levels they refer to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the five exam skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Skill {
    GrammarVocabulary,
    Listening,
    Reading,
    Writing,
    Speaking,
}

impl Skill {
    /// Every skill, in report order.
    pub const ALL: [Skill; 5] = [
        Skill::GrammarVocabulary,
        Skill::Listening,
        Skill::Reading,
        Skill::Writing,
        Skill::Speaking,
    ];

    /// Skills that carry a proficiency level and count toward the total.
    pub const TIERED: [Skill; 4] = [
        Skill::Listening,
        Skill::Reading,
        Skill::Writing,
        Skill::Speaking,
    ];

    /// Skills graded by machine from stored answer keys.
    pub const AUTO_SCORED: [Skill; 3] =
        [Skill::GrammarVocabulary, Skill::Listening, Skill::Reading];

    /// Skills graded by a teacher.
    pub const MANUAL: [Skill; 2] = [Skill::Writing, Skill::Speaking];

    pub fn is_tiered(self) -> bool {
        self != Skill::GrammarVocabulary
    }

    pub fn is_manual(self) -> bool {
        matches!(self, Skill::Writing | Skill::Speaking)
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skill::GrammarVocabulary => write!(f, "GRAMMAR_VOCABULARY"),
            Skill::Listening => write!(f, "LISTENING"),
            Skill::Reading => write!(f, "READING"),
            Skill::Writing => write!(f, "WRITING"),
            Skill::Speaking => write!(f, "SPEAKING"),
        }
    }
}

impl FromStr for Skill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "grammar_vocabulary" | "grammar_and_vocabulary" | "grammar" | "gv" => {
                Ok(Skill::GrammarVocabulary)
            }
            "listening" => Ok(Skill::Listening),
            "reading" => Ok(Skill::Reading),
            "writing" => Ok(Skill::Writing),
            "speaking" => Ok(Skill::Speaking),
            other => Err(format!("unknown skill: {other}")),
        }
    }
}

/// Discrete proficiency level, ordered lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    A0,
    A1,
    A2,
    B1,
    B2,
    C,
}

impl Level {
    /// Every level, indexed by tier.
    pub const ALL: [Level; 6] = [
        Level::A0,
        Level::A1,
        Level::A2,
        Level::B1,
        Level::B2,
        Level::C,
    ];

    /// Zero-based tier index.
    pub fn tier(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::A0 => "A0",
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C => "C",
        };
        f.write_str(s)
    }
}

/// The kind of a question, which fixes the shape of its answer key and of
/// the learner's submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    SingleChoice,
    PairMatching,
    SequenceOrdering,
    IndexedDropdown,
    GroupedSubQuestions,
    FreeResponse,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::SingleChoice => write!(f, "single-choice"),
            QuestionKind::PairMatching => write!(f, "pair-matching"),
            QuestionKind::SequenceOrdering => write!(f, "sequence-ordering"),
            QuestionKind::IndexedDropdown => write!(f, "indexed-dropdown"),
            QuestionKind::GroupedSubQuestions => write!(f, "grouped-sub-questions"),
            QuestionKind::FreeResponse => write!(f, "free-response"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "single-choice" | "multiple-choice" => Ok(QuestionKind::SingleChoice),
            "pair-matching" | "matching" => Ok(QuestionKind::PairMatching),
            "sequence-ordering" | "ordering" => Ok(QuestionKind::SequenceOrdering),
            "indexed-dropdown" | "dropdown-list" | "dropdown" => Ok(QuestionKind::IndexedDropdown),
            "grouped-sub-questions" | "questions-group" => Ok(QuestionKind::GroupedSubQuestions),
            "free-response" | "writing" | "speaking" => Ok(QuestionKind::FreeResponse),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// A left/right pair in a matching question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    #[serde(deserialize_with = "lenient::string")]
    pub left: String,
    #[serde(deserialize_with = "lenient::string")]
    pub right: String,
}

/// An item with the position the learner (or the key) assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedItem {
    #[serde(deserialize_with = "lenient::string")]
    pub key: String,
    #[serde(deserialize_with = "lenient::number")]
    pub value: f64,
}

/// A selection in an indexed dropdown question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownSelection {
    #[serde(deserialize_with = "lenient::string")]
    pub key: String,
    #[serde(deserialize_with = "lenient::string")]
    pub value: String,
}

/// A learner's answer to one sub-question of a grouped question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAnswer {
    #[serde(rename = "ID", alias = "id", deserialize_with = "lenient::integer")]
    pub id: i64,
    #[serde(deserialize_with = "lenient::string")]
    pub answer: String,
}

/// The stored correct answer of one sub-question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuestionKey {
    #[serde(rename = "ID", alias = "id", deserialize_with = "lenient::integer")]
    pub id: i64,
    pub correct_answer: String,
}

/// The stored correct answer of a question, shaped by its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnswerKey {
    SingleChoice { correct: String },
    PairMatching { pairs: Vec<MatchPair> },
    SequenceOrdering { items: Vec<OrderedItem> },
    IndexedDropdown { entries: Vec<DropdownSelection> },
    GroupedSubQuestions { sub_questions: Vec<SubQuestionKey> },
    FreeResponse,
}

impl AnswerKey {
    pub fn kind(&self) -> QuestionKind {
        match self {
            AnswerKey::SingleChoice { .. } => QuestionKind::SingleChoice,
            AnswerKey::PairMatching { .. } => QuestionKind::PairMatching,
            AnswerKey::SequenceOrdering { .. } => QuestionKind::SequenceOrdering,
            AnswerKey::IndexedDropdown { .. } => QuestionKind::IndexedDropdown,
            AnswerKey::GroupedSubQuestions { .. } => QuestionKind::GroupedSubQuestions,
            AnswerKey::FreeResponse => QuestionKind::FreeResponse,
        }
    }

    /// Number of point-earning items in this key. Dropdown entry "0" is a
    /// worked example and never earns points.
    pub fn scorable_items(&self) -> usize {
        match self {
            AnswerKey::SingleChoice { .. } => 1,
            AnswerKey::PairMatching { pairs } => pairs.len(),
            AnswerKey::SequenceOrdering { items } => items.len(),
            AnswerKey::IndexedDropdown { entries } => entries
                .iter()
                .filter(|e| dropdown_token(&e.key) != DROPDOWN_EXAMPLE_KEY)
                .count(),
            AnswerKey::GroupedSubQuestions { sub_questions } => sub_questions.len(),
            AnswerKey::FreeResponse => 0,
        }
    }
}

/// Key of the worked-example entry in dropdown questions.
pub const DROPDOWN_EXAMPLE_KEY: &str = "0";

/// Reduce a dropdown key such as `"3. The station is"` to its index token `"3"`.
pub fn dropdown_token(key: &str) -> &str {
    key.split_once('.').map_or(key, |(head, _)| head).trim()
}

/// An immutable exam item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier.
    pub id: String,
    /// The skill this question is scored under.
    pub skill: Skill,
    /// Stored correct answer; its variant determines the question kind.
    pub answer_key: AnswerKey,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        self.answer_key.kind()
    }
}

/// One learner's raw answer to one question within one exam attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Unique identifier of the stored answer.
    pub id: String,
    /// The attempt this answer belongs to.
    pub attempt_id: String,
    /// The answered question, joined in by the persistence layer.
    pub question: Question,
    /// Raw answer payload: a JSON-encoded string or already-structured data.
    #[serde(default)]
    pub raw_answer: Option<serde_json::Value>,
}

/// Per-skill numeric scores of one attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillScores {
    #[serde(default)]
    pub grammar_vocabulary: f64,
    #[serde(default)]
    pub listening: f64,
    #[serde(default)]
    pub reading: f64,
    #[serde(default)]
    pub writing: f64,
    #[serde(default)]
    pub speaking: f64,
}

impl SkillScores {
    pub fn get(&self, skill: Skill) -> f64 {
        match skill {
            Skill::GrammarVocabulary => self.grammar_vocabulary,
            Skill::Listening => self.listening,
            Skill::Reading => self.reading,
            Skill::Writing => self.writing,
            Skill::Speaking => self.speaking,
        }
    }

    pub fn set(&mut self, skill: Skill, score: f64) {
        match skill {
            Skill::GrammarVocabulary => self.grammar_vocabulary = score,
            Skill::Listening => self.listening = score,
            Skill::Reading => self.reading = score,
            Skill::Writing => self.writing = score,
            Skill::Speaking => self.speaking = score,
        }
    }

    /// Sum of the tiered skills, with `skill` taking `score` instead of its
    /// stored value.
    pub fn tiered_total_with(&self, skill: Skill, score: f64) -> f64 {
        Skill::TIERED
            .iter()
            .map(|&s| if s == skill { score } else { self.get(s) })
            .sum()
    }
}

/// Per-skill proficiency levels. Grammar/vocabulary has no level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillLevels {
    #[serde(default)]
    pub listening: Option<Level>,
    #[serde(default)]
    pub reading: Option<Level>,
    #[serde(default)]
    pub writing: Option<Level>,
    #[serde(default)]
    pub speaking: Option<Level>,
}

impl SkillLevels {
    pub fn get(&self, skill: Skill) -> Option<Level> {
        match skill {
            Skill::GrammarVocabulary => None,
            Skill::Listening => self.listening,
            Skill::Reading => self.reading,
            Skill::Writing => self.writing,
            Skill::Speaking => self.speaking,
        }
    }

    /// Store a level. Ignored for grammar/vocabulary.
    pub fn set(&mut self, skill: Skill, level: Level) {
        match skill {
            Skill::GrammarVocabulary => {}
            Skill::Listening => self.listening = Some(level),
            Skill::Reading => self.reading = Some(level),
            Skill::Writing => self.writing = Some(level),
            Skill::Speaking => self.speaking = Some(level),
        }
    }
}

/// Scores of one learner's sitting of one exam session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptScoreRecord {
    /// Unique identifier of the record (the participant row).
    pub id: String,
    /// The learner who sat the session.
    pub learner_id: String,
    /// The exam session.
    pub session_id: String,
    #[serde(default)]
    pub scores: SkillScores,
    #[serde(default)]
    pub levels: SkillLevels,
    /// Sum of the four tiered skill scores.
    #[serde(default)]
    pub total: f64,
    /// Set by the publication workflow once results are released.
    #[serde(default)]
    pub published: bool,
}

/// Partial update of an attempt score record for one skill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecordPatch {
    pub skill: Skill,
    pub score: f64,
    /// New level; `None` leaves the stored level untouched.
    #[serde(default)]
    pub level: Option<Level>,
    /// New total; `None` leaves the stored total untouched.
    #[serde(default)]
    pub total: Option<f64>,
}

impl AttemptRecordPatch {
    /// Write the patched fields onto `record`.
    pub fn apply_to(&self, record: &mut AttemptScoreRecord) {
        record.scores.set(self.skill, self.score);
        if let Some(level) = self.level {
            record.levels.set(self.skill, level);
        }
        if let Some(total) = self.total {
            record.total = total;
        }
    }
}

/// A teacher's comment on one answer of a manually graded skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerComment {
    /// The commented question.
    pub question_id: String,
    pub comment: String,
}

/// Deserializers that accept both JSON strings and numbers, since stored
/// answers are produced by several clients with inconsistent typing.
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match Value::deserialize(d)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok(String::new()),
            other => Err(D::Error::custom(format!("expected a string, got {other}"))),
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Value::deserialize(d)? {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| D::Error::custom(format!("number out of range: {n}"))),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("expected a number, got \"{s}\""))),
            other => Err(D::Error::custom(format!("expected a number, got {other}"))),
        }
    }

    pub fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        match Value::deserialize(d)? {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| D::Error::custom(format!("expected an integer, got {n}"))),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("expected an integer, got \"{s}\""))),
            other => Err(D::Error::custom(format!("expected an integer, got {other}"))),
        }
    }
}
