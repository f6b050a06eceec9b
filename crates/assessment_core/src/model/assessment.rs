//! Assessment tree model.
//!
//! # Responsibility
//! - Define the Assessment -> Section -> Question tree shared by the editor
//!   and the preview session.
//! - Provide id-based lookup over one immutable snapshot.
//!
//! # Invariants
//! - Section and question ids are unique across the whole tree.
//! - `sections[i].order == i` and `questions[i].order == i` in every section.
//! - Snapshots are never mutated in place by engine operations; sections and
//!   questions are shared through `Arc` and copied on write.

use crate::model::codec::lenient_timestamp;
use crate::model::question_type::QuestionType;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Assessment identifier. Persisted blobs may carry any non-empty string.
pub type AssessmentId = String;
/// Section identifier, unique across the whole assessment.
pub type SectionId = String;
/// Question identifier, unique across the whole assessment.
pub type QuestionId = String;

/// Generates a fresh assessment id.
pub fn new_assessment_id() -> AssessmentId {
    format!("assessment-{}", Uuid::new_v4())
}

/// Generates a fresh section id.
pub fn new_section_id() -> SectionId {
    format!("section-{}", Uuid::new_v4())
}

/// Generates a fresh question id.
pub fn new_question_id() -> QuestionId {
    format!("question-{}", Uuid::new_v4())
}

/// Top-level form document being authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: AssessmentId,
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sections: Vec<Arc<Section>>,
    #[serde(default = "Timestamp::now", with = "lenient_timestamp")]
    pub created_at: Timestamp,
    /// Refreshed on every committed mutation.
    #[serde(default = "Timestamp::now", with = "lenient_timestamp")]
    pub updated_at: Timestamp,
}

/// Position of one question inside an assessment snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionLocation {
    pub section_index: usize,
    pub question_index: usize,
}

impl Assessment {
    /// Creates an empty assessment for one job posting.
    pub fn new(job_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: new_assessment_id(),
            job_id: job_id.into(),
            title: title.into(),
            description: String::new(),
            sections: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks this snapshot as the result of a committed mutation.
    pub fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }

    /// Returns the section with `section_id`, if present.
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.id == section_id)
            .map(Arc::as_ref)
    }

    /// Returns the zero-based position of `section_id`.
    pub fn section_index(&self, section_id: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|section| section.id == section_id)
    }

    /// Finds where `question_id` lives, searching every section.
    pub fn locate_question(&self, question_id: &str) -> Option<QuestionLocation> {
        self.sections
            .iter()
            .enumerate()
            .find_map(|(section_index, section)| {
                section
                    .question_index(question_id)
                    .map(|question_index| QuestionLocation {
                        section_index,
                        question_index,
                    })
            })
    }

    /// Returns the question with `question_id`, if present in any section.
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        let location = self.locate_question(question_id)?;
        Some(self.sections[location.section_index].questions[location.question_index].as_ref())
    }

    /// Returns the section owning `question_id`.
    pub fn section_of(&self, question_id: &str) -> Option<&Section> {
        let location = self.locate_question(question_id)?;
        Some(self.sections[location.section_index].as_ref())
    }

    /// Iterates every question in tree order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections
            .iter()
            .flat_map(|section| section.questions.iter().map(Arc::as_ref))
    }

    /// Total question count across all sections.
    pub fn question_count(&self) -> usize {
        self.sections
            .iter()
            .map(|section| section.questions.len())
            .sum()
    }

    /// Returns whether any section or question carries `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.section_index(id).is_some() || self.locate_question(id).is_some()
    }

    /// Rewrites section `order` fields to match their positions.
    ///
    /// Sections already in place stay shared with previous snapshots.
    pub fn renumber_sections(&mut self) {
        for (index, section) in self.sections.iter_mut().enumerate() {
            if section.order != index {
                Arc::make_mut(section).order = index;
            }
        }
    }
}

/// Ordered group of questions within an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Zero-based position within `Assessment.sections`.
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub questions: Vec<Arc<Question>>,
    #[serde(default = "default_expanded")]
    pub is_expanded: bool,
}

fn default_expanded() -> bool {
    true
}

impl Section {
    /// Creates an empty, expanded section with a fresh id.
    pub fn new(order: usize) -> Self {
        Self {
            id: new_section_id(),
            title: String::new(),
            description: None,
            order,
            questions: Vec::new(),
            is_expanded: true,
        }
    }

    /// Returns the zero-based position of `question_id` in this section.
    pub fn question_index(&self, question_id: &str) -> Option<usize> {
        self.questions
            .iter()
            .position(|question| question.id == question_id)
    }

    /// Returns the question with `question_id` in this section.
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions
            .iter()
            .find(|question| question.id == question_id)
            .map(Arc::as_ref)
    }

    /// Rewrites question `order` fields to match their positions.
    pub fn renumber_questions(&mut self) {
        for (index, question) in self.questions.iter_mut().enumerate() {
            if question.order != index {
                Arc::make_mut(question).order = index;
            }
        }
    }
}

/// A single prompt of a fixed type.
///
/// Type-specific data lives in `kind`; on the wire it is flattened into the
/// question object and tagged by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    #[serde(flatten)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Zero-based position within the owning section.
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub conditional: Option<Conditional>,
    #[serde(default)]
    pub placeholder: Option<String>,
}

impl Question {
    /// Creates a question of `kind` with a fresh id and empty title.
    pub fn new(kind: QuestionKind, order: usize) -> Self {
        Self {
            id: new_question_id(),
            kind,
            title: String::new(),
            description: None,
            required: false,
            order,
            conditional: None,
            placeholder: None,
        }
    }

    /// Returns the type tag of this question.
    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }
}

/// Type-specific question payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionKind {
    SingleChoice {
        #[serde(default)]
        options: Vec<String>,
    },
    MultiChoice {
        #[serde(default)]
        options: Vec<String>,
    },
    ShortText {
        #[serde(default)]
        validation: Option<ValidationRule>,
    },
    LongText {
        #[serde(default)]
        validation: Option<ValidationRule>,
    },
    Numeric {
        #[serde(default)]
        validation: Option<ValidationRule>,
    },
    /// Only the existence of an upload slot is modeled.
    FileUpload,
}

impl QuestionKind {
    /// Returns the type tag for this payload.
    pub fn question_type(&self) -> QuestionType {
        match self {
            Self::SingleChoice { .. } => QuestionType::SingleChoice,
            Self::MultiChoice { .. } => QuestionType::MultiChoice,
            Self::ShortText { .. } => QuestionType::ShortText,
            Self::LongText { .. } => QuestionType::LongText,
            Self::Numeric { .. } => QuestionType::Numeric,
            Self::FileUpload => QuestionType::FileUpload,
        }
    }

    /// Choice options, for the two choice kinds.
    pub fn options(&self) -> Option<&[String]> {
        match self {
            Self::SingleChoice { options } | Self::MultiChoice { options } => Some(options),
            Self::ShortText { .. } | Self::LongText { .. } | Self::Numeric { .. } => None,
            Self::FileUpload => None,
        }
    }

    /// Mutable choice options, for the two choice kinds.
    pub fn options_mut(&mut self) -> Option<&mut Vec<String>> {
        match self {
            Self::SingleChoice { options } | Self::MultiChoice { options } => Some(options),
            Self::ShortText { .. } | Self::LongText { .. } | Self::Numeric { .. } => None,
            Self::FileUpload => None,
        }
    }

    /// Validation rule, for text and numeric kinds.
    pub fn validation(&self) -> Option<&ValidationRule> {
        match self {
            Self::ShortText { validation }
            | Self::LongText { validation }
            | Self::Numeric { validation } => validation.as_ref(),
            Self::SingleChoice { .. } | Self::MultiChoice { .. } | Self::FileUpload => None,
        }
    }

    /// Mutable validation slot, for text and numeric kinds.
    pub fn validation_slot_mut(&mut self) -> Option<&mut Option<ValidationRule>> {
        match self {
            Self::ShortText { validation }
            | Self::LongText { validation }
            | Self::Numeric { validation } => Some(validation),
            Self::SingleChoice { .. } | Self::MultiChoice { .. } | Self::FileUpload => None,
        }
    }

    /// Converts this payload to another type tag.
    ///
    /// Options carry over between the choice kinds and validation rules carry
    /// over between text and numeric kinds; anything else starts from the
    /// registry default for `target`.
    pub fn converted_to(&self, target: QuestionType) -> Self {
        if self.question_type() == target {
            return self.clone();
        }
        let mut next = target.default_kind();
        if let (Some(options), Some(slot)) = (self.options(), next.options_mut()) {
            *slot = options.to_vec();
        }
        if let (Some(rule), Some(slot)) = (self.validation(), next.validation_slot_mut()) {
            *slot = Some(*rule);
        }
        next
    }
}

/// Optional bounds applied by the validation engine.
///
/// Length bounds apply to text kinds, value bounds to the numeric kind. All
/// bounds are independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
}

impl ValidationRule {
    /// Numeric range rule.
    pub fn range(min_value: Option<f64>, max_value: Option<f64>) -> Self {
        Self {
            min_value,
            max_value,
            ..Self::default()
        }
    }

    /// Text length rule.
    pub fn length(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Self {
            min_length,
            max_length,
            ..Self::default()
        }
    }
}

/// Visibility rule depending on another question's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditional {
    pub depends_on: QuestionId,
    pub condition: ConditionOperator,
    #[serde(default)]
    pub value: String,
}

impl Conditional {
    pub fn new(
        depends_on: impl Into<QuestionId>,
        condition: ConditionOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            depends_on: depends_on.into(),
            condition,
            value: value.into(),
        }
    }
}

/// Comparison applied by a conditional rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    /// Any tag this build does not know; evaluated as always visible.
    #[serde(other)]
    Unknown,
}
