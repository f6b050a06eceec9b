//! Question type registry.
//!
//! # Responsibility
//! - Name the closed set of question types.
//! - Hold the fixed table of labels and default fields used when a question
//!   is created from a type template.
//!
//! # Invariants
//! - The registry has exactly one entry per `QuestionType`, in `ALL` order.

use crate::model::assessment::{Question, QuestionKind};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Type tag of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    SingleChoice,
    MultiChoice,
    ShortText,
    LongText,
    Numeric,
    FileUpload,
}

impl QuestionType {
    /// Every type, in registry order.
    pub const ALL: [QuestionType; 6] = [
        Self::SingleChoice,
        Self::MultiChoice,
        Self::ShortText,
        Self::LongText,
        Self::Numeric,
        Self::FileUpload,
    ];

    /// Wire tag, e.g. `single-choice`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleChoice => "single-choice",
            Self::MultiChoice => "multi-choice",
            Self::ShortText => "short-text",
            Self::LongText => "long-text",
            Self::Numeric => "numeric",
            Self::FileUpload => "file-upload",
        }
    }

    /// Registry entry for this type.
    pub fn info(self) -> &'static QuestionTypeInfo {
        let index = Self::ALL
            .iter()
            .position(|candidate| *candidate == self)
            .unwrap_or_default();
        &REGISTRY[index]
    }

    /// Default type-specific payload.
    pub fn default_kind(self) -> QuestionKind {
        match self {
            Self::SingleChoice => QuestionKind::SingleChoice {
                options: default_options(),
            },
            Self::MultiChoice => QuestionKind::MultiChoice {
                options: default_options(),
            },
            Self::ShortText => QuestionKind::ShortText { validation: None },
            Self::LongText => QuestionKind::LongText { validation: None },
            Self::Numeric => QuestionKind::Numeric { validation: None },
            Self::FileUpload => QuestionKind::FileUpload,
        }
    }

    pub fn is_choice(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultiChoice)
    }
}

impl Display for QuestionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-facing metadata and template defaults for one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionTypeInfo {
    pub question_type: QuestionType,
    pub label: &'static str,
    pub description: &'static str,
    pub default_title: &'static str,
    pub default_placeholder: Option<&'static str>,
}

const DEFAULT_OPTION_COUNT: usize = 3;

const REGISTRY: [QuestionTypeInfo; 6] = [
    QuestionTypeInfo {
        question_type: QuestionType::SingleChoice,
        label: "Single Choice",
        description: "Select one option from a list",
        default_title: "New single choice question",
        default_placeholder: None,
    },
    QuestionTypeInfo {
        question_type: QuestionType::MultiChoice,
        label: "Multiple Choice",
        description: "Select multiple options from a list",
        default_title: "New multiple choice question",
        default_placeholder: None,
    },
    QuestionTypeInfo {
        question_type: QuestionType::ShortText,
        label: "Short Text",
        description: "Brief text response",
        default_title: "New short text question",
        default_placeholder: Some("Enter your answer..."),
    },
    QuestionTypeInfo {
        question_type: QuestionType::LongText,
        label: "Long Text",
        description: "Detailed text response",
        default_title: "New long text question",
        default_placeholder: Some("Enter your detailed answer..."),
    },
    QuestionTypeInfo {
        question_type: QuestionType::Numeric,
        label: "Numeric",
        description: "Number input with optional range",
        default_title: "New numeric question",
        default_placeholder: Some("Enter a number..."),
    },
    QuestionTypeInfo {
        question_type: QuestionType::FileUpload,
        label: "File Upload",
        description: "Upload documents or files",
        default_title: "New file upload question",
        default_placeholder: None,
    },
];

/// Returns the full registry table in `QuestionType::ALL` order.
pub fn registry() -> &'static [QuestionTypeInfo] {
    &REGISTRY
}

/// Builds a new question from the registry template for `question_type`.
///
/// The returned question carries a fresh id and the given `order`.
pub fn question_from_template(question_type: QuestionType, order: usize) -> Question {
    let info = question_type.info();
    let mut question = Question::new(question_type.default_kind(), order);
    question.title = info.default_title.to_string();
    question.placeholder = info.default_placeholder.map(str::to_string);
    question
}

fn default_options() -> Vec<String> {
    (1..=DEFAULT_OPTION_COUNT)
        .map(|index| format!("Option {index}"))
        .collect()
}
