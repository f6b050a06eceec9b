//! Field-level answer validation.
//!
//! # Responsibility
//! - Decide pass/fail for one answer against its question definition.
//! - Collect per-question errors for the visible questions of a section.
//!
//! # Invariants
//! - Required-ness is checked before type-specific bounds.
//! - An empty optional answer never fails, whatever its bounds.
//! - Hidden questions never produce errors.

use crate::model::assessment::{Question, QuestionId, QuestionKind, Section, ValidationRule};
use crate::model::response::{ResponseValue, Responses};
use crate::service::visibility::visible_questions;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Per-question errors of one validation pass, keyed by question id.
pub type ValidationErrors = BTreeMap<QuestionId, ValidationError>;

/// User-facing validation failure for one question.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required question has no answer.
    Required,
    /// Numeric question answered with something that is not a finite number.
    NotANumber,
    /// Numeric answer below `minValue`.
    BelowMinimum { min: f64 },
    /// Numeric answer above `maxValue`.
    AboveMaximum { max: f64 },
    /// Text answer shorter than `minLength`.
    TooShort { min_length: usize },
    /// Text answer longer than `maxLength`.
    TooLong { max_length: usize },
}

impl ValidationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::NotANumber => "not_a_number",
            Self::BelowMinimum { .. } => "below_minimum",
            Self::AboveMaximum { .. } => "above_maximum",
            Self::TooShort { .. } => "too_short",
            Self::TooLong { .. } => "too_long",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, "This field is required"),
            Self::NotANumber => write!(f, "Please enter a valid number"),
            Self::BelowMinimum { min } => write!(f, "Value must be at least {min}"),
            Self::AboveMaximum { max } => write!(f, "Value must be at most {max}"),
            Self::TooShort { min_length } => {
                write!(f, "Must be at least {min_length} characters")
            }
            Self::TooLong { max_length } => {
                write!(f, "Must be at most {max_length} characters")
            }
        }
    }
}

impl Error for ValidationError {}

/// Validates one answer against `question`.
///
/// Returns `None` when the answer is acceptable.
pub fn validate(question: &Question, value: Option<&ResponseValue>) -> Option<ValidationError> {
    let value = match value {
        Some(value) if !is_blank(question, value) => value,
        _ => return question.required.then_some(ValidationError::Required),
    };

    match &question.kind {
        QuestionKind::Numeric { validation } => validate_numeric(value, validation.as_ref()),
        QuestionKind::ShortText { validation } | QuestionKind::LongText { validation } => {
            validation
                .as_ref()
                .and_then(|rule| validate_length(value, rule))
        }
        QuestionKind::SingleChoice { .. } | QuestionKind::MultiChoice { .. } => None,
        QuestionKind::FileUpload => None,
    }
}

/// Validates every visible question of `section`.
///
/// The section is valid iff the returned map is empty.
pub fn validate_section(section: &Section, responses: &Responses) -> ValidationErrors {
    visible_questions(section, responses)
        .filter_map(|question| {
            validate(question, responses.get(&question.id))
                .map(|error| (question.id.clone(), error))
        })
        .collect()
}

// Numeric answers are trimmed before parsing, so blank text counts as no answer.
fn is_blank(question: &Question, value: &ResponseValue) -> bool {
    match (&question.kind, value) {
        (QuestionKind::Numeric { .. }, ResponseValue::Text(text)) => text.trim().is_empty(),
        _ => value.is_empty(),
    }
}

fn validate_numeric(
    value: &ResponseValue,
    rule: Option<&ValidationRule>,
) -> Option<ValidationError> {
    let rule = rule?;
    let number = match value.to_display_string().trim().parse::<f64>() {
        Ok(number) if number.is_finite() => number,
        _ => return Some(ValidationError::NotANumber),
    };
    if let Some(min) = rule.min_value {
        if number < min {
            return Some(ValidationError::BelowMinimum { min });
        }
    }
    if let Some(max) = rule.max_value {
        if number > max {
            return Some(ValidationError::AboveMaximum { max });
        }
    }
    None
}

fn validate_length(value: &ResponseValue, rule: &ValidationRule) -> Option<ValidationError> {
    let length = value.to_display_string().chars().count();
    if let Some(min_length) = rule.min_length {
        if length < min_length {
            return Some(ValidationError::TooShort { min_length });
        }
    }
    if let Some(max_length) = rule.max_length {
        if length > max_length {
            return Some(ValidationError::TooLong { max_length });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{validate, validate_section, ValidationError};
    use crate::model::assessment::{
        ConditionOperator, Conditional, Question, QuestionKind, Section, ValidationRule,
    };
    use crate::model::response::{ResponseValue, Responses};
    use std::sync::Arc;

    fn numeric(min: f64, max: f64) -> Question {
        Question::new(
            QuestionKind::Numeric {
                validation: Some(ValidationRule::range(Some(min), Some(max))),
            },
            0,
        )
    }

    fn text(value: &str) -> ResponseValue {
        ResponseValue::from(value)
    }

    #[test]
    fn numeric_bounds_are_inclusive() {
        let question = numeric(0.0, 50.0);
        assert_eq!(
            validate(&question, Some(&text("-1"))),
            Some(ValidationError::BelowMinimum { min: 0.0 })
        );
        assert_eq!(
            validate(&question, Some(&text("51"))),
            Some(ValidationError::AboveMaximum { max: 50.0 })
        );
        assert_eq!(validate(&question, Some(&text("0"))), None);
        assert_eq!(validate(&question, Some(&text("50"))), None);
        assert_eq!(validate(&question, Some(&text(" 12.5 "))), None);
    }

    #[test]
    fn numeric_rejects_non_numbers() {
        let question = numeric(0.0, 50.0);
        assert_eq!(
            validate(&question, Some(&text("abc"))),
            Some(ValidationError::NotANumber)
        );
        assert_eq!(
            validate(&question, Some(&text("NaN"))),
            Some(ValidationError::NotANumber)
        );
    }

    #[test]
    fn numeric_without_rule_accepts_any_answer() {
        let question = Question::new(QuestionKind::Numeric { validation: None }, 0);
        assert_eq!(validate(&question, Some(&text("abc"))), None);
        assert_eq!(validate(&question, Some(&text("   "))), None);
        assert_eq!(validate(&question, Some(&text("7"))), None);
    }

    #[test]
    fn blank_numeric_answer_counts_as_empty() {
        let mut question = numeric(0.0, 50.0);
        assert_eq!(validate(&question, Some(&text("   "))), None);

        question.required = true;
        assert_eq!(
            validate(&question, Some(&text("  "))),
            Some(ValidationError::Required)
        );
    }

    #[test]
    fn required_short_text_accepts_any_non_empty_string() {
        let mut question = Question::new(QuestionKind::ShortText { validation: None }, 0);
        question.required = true;

        assert_eq!(
            validate(&question, Some(&text(""))),
            Some(ValidationError::Required)
        );
        assert_eq!(validate(&question, None), Some(ValidationError::Required));
        assert_eq!(validate(&question, Some(&text("x"))), None);
        assert_eq!(validate(&question, Some(&text(&"y".repeat(5000)))), None);
    }

    #[test]
    fn empty_optional_field_skips_length_rule() {
        let question = Question::new(
            QuestionKind::LongText {
                validation: Some(ValidationRule::length(Some(10), Some(20))),
            },
            0,
        );
        assert_eq!(validate(&question, None), None);
        assert_eq!(validate(&question, Some(&text(""))), None);
        assert_eq!(
            validate(&question, Some(&text("short"))),
            Some(ValidationError::TooShort { min_length: 10 })
        );
        assert_eq!(
            validate(&question, Some(&text(&"z".repeat(21)))),
            Some(ValidationError::TooLong { max_length: 20 })
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let question = Question::new(
            QuestionKind::ShortText {
                validation: Some(ValidationRule::length(None, Some(3))),
            },
            0,
        );
        assert_eq!(validate(&question, Some(&text("äöü"))), None);
    }

    #[test]
    fn required_multi_choice_rejects_empty_list() {
        let mut question = Question::new(
            QuestionKind::MultiChoice {
                options: vec!["a".to_string()],
            },
            0,
        );
        question.required = true;
        let empty = ResponseValue::List(Vec::new());
        assert_eq!(
            validate(&question, Some(&empty)),
            Some(ValidationError::Required)
        );
        assert_eq!(validate(&question, Some(&ResponseValue::from(vec!["a"]))), None);
    }

    #[test]
    fn section_validation_skips_hidden_questions() {
        let mut gate = Question::new(QuestionKind::ShortText { validation: None }, 0);
        gate.id = "Q1".to_string();
        let mut follow_up = Question::new(QuestionKind::ShortText { validation: None }, 1);
        follow_up.id = "Q2".to_string();
        follow_up.required = true;
        follow_up.conditional = Some(Conditional::new("Q1", ConditionOperator::Equals, "yes"));

        let mut section = Section::new(0);
        section.questions = vec![Arc::new(gate), Arc::new(follow_up)];

        let mut responses = Responses::new();
        responses.insert("Q1", "no");
        assert!(validate_section(&section, &responses).is_empty());

        responses.insert("Q1", "yes");
        let errors = validate_section(&section, &responses);
        assert_eq!(errors.get("Q2"), Some(&ValidationError::Required));
    }

    #[test]
    fn messages_name_the_offending_limit() {
        assert_eq!(
            ValidationError::AboveMaximum { max: 50.0 }.to_string(),
            "Value must be at most 50"
        );
        assert_eq!(
            ValidationError::TooShort { min_length: 3 }.to_string(),
            "Must be at least 3 characters"
        );
    }
}
