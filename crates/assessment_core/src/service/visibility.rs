//! Conditional visibility evaluation.
//!
//! # Invariants
//! - Questions without a conditional are always visible.
//! - Evaluation never recurses: only the direct dependency's answer is read,
//!   so malformed or cyclic rules cannot cause unbounded work.
//! - Self-references and unknown operators fail open (visible).

use crate::model::assessment::{ConditionOperator, Question, Section};
use crate::model::response::{ResponseValue, Responses};
use std::sync::Arc;

/// Decides whether `question` is currently shown given `responses`.
pub fn is_visible(question: &Question, responses: &Responses) -> bool {
    let Some(conditional) = question.conditional.as_ref() else {
        return true;
    };
    if conditional.depends_on == question.id {
        return true;
    }

    let answer = responses.get(&conditional.depends_on);
    match conditional.condition {
        ConditionOperator::Equals => answer_equals(answer, &conditional.value),
        ConditionOperator::NotEquals => !answer_equals(answer, &conditional.value),
        ConditionOperator::Contains => answer_contains(answer, &conditional.value),
        ConditionOperator::Unknown => true,
    }
}

/// Visible questions of `section`, in order.
pub fn visible_questions<'a>(
    section: &'a Section,
    responses: &'a Responses,
) -> impl Iterator<Item = &'a Question> + 'a {
    section
        .questions
        .iter()
        .map(Arc::as_ref)
        .filter(move |question| is_visible(question, responses))
}

// A list answer never strictly equals a scalar.
fn answer_equals(answer: Option<&ResponseValue>, expected: &str) -> bool {
    matches!(answer, Some(ResponseValue::Text(text)) if text == expected)
}

fn answer_contains(answer: Option<&ResponseValue>, needle: &str) -> bool {
    match answer {
        Some(ResponseValue::List(items)) => items.iter().any(|item| item == needle),
        Some(ResponseValue::Text(text)) => text.contains(needle),
        None => needle.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::{is_visible, visible_questions};
    use crate::model::assessment::{
        ConditionOperator, Conditional, Question, QuestionKind, Section,
    };
    use crate::model::response::Responses;
    use std::sync::Arc;

    fn conditional_question(condition: ConditionOperator, value: &str) -> Question {
        let mut question = Question::new(QuestionKind::ShortText { validation: None }, 1);
        question.id = "Q2".to_string();
        question.conditional = Some(Conditional::new("Q1", condition, value));
        question
    }

    #[test]
    fn equals_shows_only_on_exact_match() {
        let question = conditional_question(ConditionOperator::Equals, "yes");
        let mut responses = Responses::new();
        assert!(!is_visible(&question, &responses));

        responses.insert("Q1", "no");
        assert!(!is_visible(&question, &responses));

        responses.insert("Q1", "yes");
        assert!(is_visible(&question, &responses));

        responses.insert("Q1", vec!["yes"]);
        assert!(!is_visible(&question, &responses));
    }

    #[test]
    fn not_equals_is_negation() {
        let question = conditional_question(ConditionOperator::NotEquals, "yes");
        let mut responses = Responses::new();
        assert!(is_visible(&question, &responses));

        responses.insert("Q1", "yes");
        assert!(!is_visible(&question, &responses));
    }

    #[test]
    fn contains_uses_membership_for_lists_and_substring_for_text() {
        let question = conditional_question(ConditionOperator::Contains, "Rust");
        let mut responses = Responses::new();
        assert!(!is_visible(&question, &responses));

        responses.insert("Q1", vec!["Go", "Rust"]);
        assert!(is_visible(&question, &responses));

        responses.insert("Q1", vec!["Go", "Rusty"]);
        assert!(!is_visible(&question, &responses));

        responses.insert("Q1", "I like Rust a lot");
        assert!(is_visible(&question, &responses));
    }

    #[test]
    fn unknown_operator_and_self_reference_fail_open() {
        let unknown = conditional_question(ConditionOperator::Unknown, "yes");
        assert!(is_visible(&unknown, &Responses::new()));

        let mut self_ref = conditional_question(ConditionOperator::Equals, "yes");
        self_ref.id = "Q1".to_string();
        assert!(is_visible(&self_ref, &Responses::new()));
    }

    #[test]
    fn visible_questions_filters_hidden_entries() {
        let mut first = Question::new(QuestionKind::ShortText { validation: None }, 0);
        first.id = "Q1".to_string();
        let second = conditional_question(ConditionOperator::Equals, "yes");
        let mut section = Section::new(0);
        section.questions = vec![Arc::new(first), Arc::new(second)];

        let responses = Responses::new();
        let ids = visible_questions(&section, &responses)
            .map(|question| question.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["Q1"]);
    }
}
