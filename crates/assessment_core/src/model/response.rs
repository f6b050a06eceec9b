//! Response map collected during a preview/test run.
//!
//! # Invariants
//! - Responses are session-scoped and never persisted with the assessment.
//! - Keys are question ids; iteration order is deterministic (sorted by id).

use crate::model::assessment::QuestionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One answer value.
///
/// Text, numeric, single-choice, and upload-slot answers are `Text`;
/// multi-choice answers are `List`. On the wire this is a plain string or a
/// string array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Text(String),
    List(Vec<String>),
}

impl ResponseValue {
    /// Empty string or empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Text(_) => None,
            Self::List(items) => Some(items),
        }
    }

    /// String form used for substring and length checks.
    ///
    /// Lists are joined with `,`.
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(items) => items.join(","),
        }
    }
}

impl From<String> for ResponseValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ResponseValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<String>> for ResponseValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for ResponseValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_string).collect())
    }
}

/// Mapping from question id to answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Responses {
    values: BTreeMap<QuestionId, ResponseValue>,
}

impl Responses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` for `question_id`, replacing any previous answer.
    pub fn insert(&mut self, question_id: impl Into<QuestionId>, value: impl Into<ResponseValue>) {
        self.values.insert(question_id.into(), value.into());
    }

    pub fn get(&self, question_id: &str) -> Option<&ResponseValue> {
        self.values.get(question_id)
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.values.contains_key(question_id)
    }

    pub fn remove(&mut self, question_id: &str) -> Option<ResponseValue> {
        self.values.remove(question_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &ResponseValue)> {
        self.values.iter()
    }

    pub fn question_ids(&self) -> impl Iterator<Item = &QuestionId> {
        self.values.keys()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
