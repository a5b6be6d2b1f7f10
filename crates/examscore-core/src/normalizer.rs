//! Raw answer normalization.
//!
//! Stored answers arrive either as JSON-encoded strings or as already
//! structured JSON. Normalization turns them into a typed value matching the
//! question kind, so scorers never touch untyped payloads.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::GradingError;
use crate::model::{
    dropdown_token, DropdownSelection, MatchPair, OrderedItem, QuestionKind, SubAnswer,
};

/// A learner's answer, typed by question kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedAnswer {
    /// Nothing was submitted. Scores zero.
    Unanswered,
    SingleChoice(String),
    PairMatching(Vec<MatchPair>),
    SequenceOrdering(Vec<OrderedItem>),
    IndexedDropdown(Vec<DropdownSelection>),
    GroupedSubQuestions(Vec<SubAnswer>),
    FreeResponse(String),
}

impl NormalizedAnswer {
    pub fn is_unanswered(&self) -> bool {
        matches!(self, NormalizedAnswer::Unanswered)
    }
}

/// Normalize a raw stored answer for a question of `kind`.
pub fn normalize(
    raw: Option<&Value>,
    kind: QuestionKind,
) -> Result<NormalizedAnswer, GradingError> {
    let raw = match raw {
        None | Some(Value::Null) => return Ok(NormalizedAnswer::Unanswered),
        Some(raw) => raw,
    };

    match kind {
        QuestionKind::SingleChoice => Ok(text_answer(raw, kind)?
            .map_or(NormalizedAnswer::Unanswered, NormalizedAnswer::SingleChoice)),
        QuestionKind::FreeResponse => Ok(text_answer(raw, kind)?
            .map_or(NormalizedAnswer::Unanswered, NormalizedAnswer::FreeResponse)),
        QuestionKind::PairMatching => Ok(structured::<MatchPair>(raw, kind)?
            .map_or(NormalizedAnswer::Unanswered, NormalizedAnswer::PairMatching)),
        QuestionKind::SequenceOrdering => Ok(structured::<OrderedItem>(raw, kind)?
            .map_or(NormalizedAnswer::Unanswered, NormalizedAnswer::SequenceOrdering)),
        QuestionKind::IndexedDropdown => {
            let selections = structured::<DropdownSelection>(raw, kind)?.map(|items| {
                items
                    .into_iter()
                    .map(|s| DropdownSelection {
                        key: dropdown_token(&s.key).to_string(),
                        value: s.value.trim().to_string(),
                    })
                    .collect()
            });
            Ok(selections.map_or(NormalizedAnswer::Unanswered, NormalizedAnswer::IndexedDropdown))
        }
        QuestionKind::GroupedSubQuestions => Ok(structured::<SubAnswer>(raw, kind)?
            .map_or(NormalizedAnswer::Unanswered, NormalizedAnswer::GroupedSubQuestions)),
    }
}

/// Trimmed text of a scalar answer, or `None` when blank.
fn text_answer(raw: &Value, kind: QuestionKind) -> Result<Option<String>, GradingError> {
    let text = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => {
            return Err(GradingError::MalformedAnswer {
                kind,
                reason: format!("expected a text answer, got {}", json_type(other)),
            })
        }
    };
    Ok((!text.is_empty()).then_some(text))
}

/// Decode an array answer, or `None` when blank or empty.
fn structured<T: DeserializeOwned>(
    raw: &Value,
    kind: QuestionKind,
) -> Result<Option<Vec<T>>, GradingError> {
    let malformed = |reason: String| GradingError::MalformedAnswer { kind, reason };

    let decoded;
    let value = match raw {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            decoded = serde_json::from_str::<Value>(s)
                .map_err(|e| malformed(format!("invalid JSON: {e}")))?;
            &decoded
        }
        other => other,
    };

    let items = match value {
        Value::Null => return Ok(None),
        Value::Array(items) => items,
        other => return Err(malformed(format!("expected an array, got {}", json_type(other)))),
    };
    if items.is_empty() {
        return Ok(None);
    }

    items
        .iter()
        .map(|item| T::deserialize(item).map_err(|e| malformed(e.to_string())))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
