//! Tree mutation engine.
//!
//! # Responsibility
//! - Produce a new consistent assessment snapshot from an existing one plus
//!   one edit (add/update/delete/duplicate/reorder of sections and questions).
//!
//! # Invariants
//! - Inputs are never mutated; untouched sections and questions are shared
//!   with the input snapshot and touched ones are copied on write.
//! - Ids are never reused and never changed by an update.
//! - Sibling `order` fields stay contiguous and zero-based after every edit.
//! - Lookup misses return an unchanged snapshot with the same `updated_at`.
//! - Every committed change refreshes `updated_at`.
//! - No conditional references a deleted question or closes a cycle.

use crate::model::assessment::{
    new_question_id, new_section_id, Assessment, Conditional, Question, QuestionId, Section,
    ValidationRule,
};
use crate::model::question_type::{question_from_template, QuestionType};
use crate::service::integrity::{check_conditional, strip_conditionals_where};
use log::{debug, warn};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::sync::Arc;

/// Suffix appended to the title of duplicated sections and questions.
pub const COPY_SUFFIX: &str = " (Copy)";

/// Field merge for `update_assessment`. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssessmentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Field merge for `update_section`. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SectionPatch {
    pub title: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub is_expanded: Option<bool>,
}

impl SectionPatch {
    fn apply_to(self, section: &mut Section) {
        if let Some(title) = self.title {
            section.title = title;
        }
        if let Some(description) = self.description {
            section.description = description;
        }
        if let Some(is_expanded) = self.is_expanded {
            section.is_expanded = is_expanded;
        }
    }
}

/// Field merge for `update_question`. `None` leaves a field unchanged.
///
/// `question_type` converts the payload first; `options` and `validation`
/// then apply only if the resulting type carries them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuestionPatch {
    pub title: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub required: Option<bool>,
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    pub options: Option<Vec<String>>,
    #[serde(deserialize_with = "double_option")]
    pub validation: Option<Option<ValidationRule>>,
    #[serde(deserialize_with = "double_option")]
    pub conditional: Option<Option<Conditional>>,
    #[serde(deserialize_with = "double_option")]
    pub placeholder: Option<Option<String>>,
}

impl QuestionPatch {
    fn apply_to(self, question: &mut Question) {
        if let Some(title) = self.title {
            question.title = title;
        }
        if let Some(description) = self.description {
            question.description = description;
        }
        if let Some(required) = self.required {
            question.required = required;
        }
        if let Some(question_type) = self.question_type {
            question.kind = question.kind.converted_to(question_type);
        }
        if let Some(options) = self.options {
            match question.kind.options_mut() {
                Some(slot) => *slot = options,
                None => debug!(
                    "event=question_patch module=tree_ops status=skipped field=options question_type={}",
                    question.question_type()
                ),
            }
        }
        if let Some(validation) = self.validation {
            match question.kind.validation_slot_mut() {
                Some(slot) => *slot = validation,
                None => debug!(
                    "event=question_patch module=tree_ops status=skipped field=validation question_type={}",
                    question.question_type()
                ),
            }
        }
        if let Some(conditional) = self.conditional {
            question.conditional = conditional;
        }
        if let Some(placeholder) = self.placeholder {
            question.placeholder = placeholder;
        }
    }
}

/// Result of an operation that may remove questions.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub assessment: Assessment,
    /// Ids of every question that no longer exists; callers clear any
    /// selection pointing at them.
    pub removed_question_ids: Vec<QuestionId>,
}

impl Removal {
    fn unchanged(assessment: &Assessment) -> Self {
        Self {
            assessment: assessment.clone(),
            removed_question_ids: Vec::new(),
        }
    }
}

/// Result of an operation that may create a question.
#[derive(Debug, Clone, PartialEq)]
pub struct Added {
    pub assessment: Assessment,
    /// Id of the created question, `None` on lookup miss.
    pub question_id: Option<QuestionId>,
}

impl Added {
    fn unchanged(assessment: &Assessment) -> Self {
        Self {
            assessment: assessment.clone(),
            question_id: None,
        }
    }
}

/// Merges `patch` into the assessment's own title and description.
///
/// An empty patch is a no-op.
pub fn update_assessment(assessment: &Assessment, patch: AssessmentPatch) -> Assessment {
    if patch == AssessmentPatch::default() {
        return assessment.clone();
    }
    let mut next = assessment.clone();
    if let Some(title) = patch.title {
        next.title = title;
    }
    if let Some(description) = patch.description {
        next.description = description;
    }
    next.touch();
    next
}

/// Appends an empty, expanded section at the tail.
pub fn add_section(assessment: &Assessment) -> Assessment {
    let mut next = assessment.clone();
    let section = Section::new(next.sections.len());
    debug!(
        "event=section_add module=tree_ops status=ok section_id={}",
        section.id
    );
    next.sections.push(Arc::new(section));
    next.touch();
    next
}

/// Merges `patch` into the section with `section_id`.
///
/// An empty patch is a no-op.
pub fn update_section(
    assessment: &Assessment,
    section_id: &str,
    patch: SectionPatch,
) -> Assessment {
    if patch == SectionPatch::default() {
        return assessment.clone();
    }
    let Some(index) = assessment.section_index(section_id) else {
        log_miss("section_update", section_id);
        return assessment.clone();
    };
    let mut next = assessment.clone();
    patch.apply_to(Arc::make_mut(&mut next.sections[index]));
    next.touch();
    next
}

/// Removes the section with `section_id` and renumbers the rest.
///
/// Conditionals elsewhere that depended on a removed question are stripped.
pub fn delete_section(assessment: &Assessment, section_id: &str) -> Removal {
    let Some(index) = assessment.section_index(section_id) else {
        log_miss("section_delete", section_id);
        return Removal::unchanged(assessment);
    };
    let mut next = assessment.clone();
    let removed = next.sections.remove(index);
    let removed_question_ids = removed
        .questions
        .iter()
        .map(|question| question.id.clone())
        .collect::<Vec<_>>();
    next.renumber_sections();
    strip_dependents(&mut next, &removed_question_ids);
    next.touch();
    debug!(
        "event=section_delete module=tree_ops status=ok section_id={} removed_questions={}",
        section_id,
        removed_question_ids.len()
    );
    Removal {
        assessment: next,
        removed_question_ids,
    }
}

/// Appends a deep copy of the section with `section_id`.
///
/// The copy and every copied question get fresh ids. Conditionals inside the
/// copy that pointed at questions of the source section are re-pointed to
/// the corresponding copies.
pub fn duplicate_section(assessment: &Assessment, section_id: &str) -> Assessment {
    let Some(source) = assessment.section(section_id) else {
        log_miss("section_duplicate", section_id);
        return assessment.clone();
    };

    let id_map = source
        .questions
        .iter()
        .map(|question| (question.id.clone(), new_question_id()))
        .collect::<HashMap<_, _>>();
    let questions = source
        .questions
        .iter()
        .map(|question| {
            let mut copy = Question::clone(question);
            if let Some(fresh) = id_map.get(&question.id) {
                copy.id = fresh.clone();
            }
            if let Some(conditional) = copy.conditional.as_mut() {
                if let Some(fresh) = id_map.get(&conditional.depends_on) {
                    conditional.depends_on = fresh.clone();
                }
            }
            Arc::new(copy)
        })
        .collect();

    let mut next = assessment.clone();
    let copy = Section {
        id: new_section_id(),
        title: format!("{}{COPY_SUFFIX}", source.title),
        description: source.description.clone(),
        order: next.sections.len(),
        questions,
        is_expanded: true,
    };
    debug!(
        "event=section_duplicate module=tree_ops status=ok source_id={} copy_id={}",
        section_id, copy.id
    );
    next.sections.push(Arc::new(copy));
    next.touch();
    next
}

/// Appends a question built from the `question_type` template.
///
/// With no sections at all, a default section is created first and the
/// question goes there; otherwise a missing `section_id` is a lookup miss.
pub fn add_question(
    assessment: &Assessment,
    section_id: &str,
    question_type: QuestionType,
) -> Added {
    let mut next = assessment.clone();
    let index = if next.sections.is_empty() {
        next.sections.push(Arc::new(Section::new(0)));
        0
    } else {
        match next.section_index(section_id) {
            Some(index) => index,
            None => {
                log_miss("question_add", section_id);
                return Added::unchanged(assessment);
            }
        }
    };

    let section = Arc::make_mut(&mut next.sections[index]);
    let question = question_from_template(question_type, section.questions.len());
    let question_id = question.id.clone();
    section.questions.push(Arc::new(question));
    next.touch();
    debug!(
        "event=question_add module=tree_ops status=ok question_id={} question_type={}",
        question_id, question_type
    );
    Added {
        assessment: next,
        question_id: Some(question_id),
    }
}

/// Merges `patch` into the question with `question_id`, wherever it lives.
///
/// A patch whose conditional would reference the question itself, a missing
/// question, or close a dependency cycle is rejected as a whole. An empty
/// patch is a no-op.
pub fn update_question(
    assessment: &Assessment,
    question_id: &str,
    patch: QuestionPatch,
) -> Assessment {
    if patch == QuestionPatch::default() {
        return assessment.clone();
    }
    let Some(location) = assessment.locate_question(question_id) else {
        log_miss("question_update", question_id);
        return assessment.clone();
    };
    if let Some(Some(conditional)) = patch.conditional.as_ref() {
        if let Err(rejection) = check_conditional(assessment, question_id, conditional) {
            warn!(
                "event=question_update module=tree_ops status=rejected question_id={} reason={}",
                question_id, rejection
            );
            return assessment.clone();
        }
    }

    let mut next = assessment.clone();
    let section = Arc::make_mut(&mut next.sections[location.section_index]);
    patch.apply_to(Arc::make_mut(&mut section.questions[location.question_index]));
    next.touch();
    next
}

/// Removes a question from the section with `section_id` and renumbers its
/// siblings.
pub fn delete_question(assessment: &Assessment, section_id: &str, question_id: &str) -> Removal {
    let Some(section_index) = assessment.section_index(section_id) else {
        log_miss("question_delete", section_id);
        return Removal::unchanged(assessment);
    };
    let Some(question_index) = assessment.sections[section_index].question_index(question_id) else {
        log_miss("question_delete", question_id);
        return Removal::unchanged(assessment);
    };

    let mut next = assessment.clone();
    let section = Arc::make_mut(&mut next.sections[section_index]);
    let removed = section.questions.remove(question_index);
    section.renumber_questions();
    let removed_question_ids = vec![removed.id.clone()];
    strip_dependents(&mut next, &removed_question_ids);
    next.touch();
    Removal {
        assessment: next,
        removed_question_ids,
    }
}

/// Appends a copy of the question with `question_id` at the tail of its own
/// section, with a fresh id.
pub fn duplicate_question(assessment: &Assessment, question_id: &str) -> Added {
    let Some(location) = assessment.locate_question(question_id) else {
        log_miss("question_duplicate", question_id);
        return Added::unchanged(assessment);
    };

    let mut next = assessment.clone();
    let section = Arc::make_mut(&mut next.sections[location.section_index]);
    let mut copy = Question::clone(&section.questions[location.question_index]);
    copy.id = new_question_id();
    copy.title = format!("{}{COPY_SUFFIX}", copy.title);
    copy.order = section.questions.len();
    let copy_id = copy.id.clone();
    section.questions.push(Arc::new(copy));
    next.touch();
    Added {
        assessment: next,
        question_id: Some(copy_id),
    }
}

/// Moves `active_id` to the position of `over_id`.
///
/// Both ids must be sections, or both questions of the same section;
/// anything else leaves the snapshot unchanged. Questions never move
/// between sections.
pub fn reorder(assessment: &Assessment, active_id: &str, over_id: &str) -> Assessment {
    if active_id == over_id {
        return assessment.clone();
    }

    if let (Some(from), Some(to)) = (
        assessment.section_index(active_id),
        assessment.section_index(over_id),
    ) {
        let mut next = assessment.clone();
        move_item(&mut next.sections, from, to);
        next.renumber_sections();
        next.touch();
        return next;
    }

    if let (Some(active), Some(over)) = (
        assessment.locate_question(active_id),
        assessment.locate_question(over_id),
    ) {
        if active.section_index != over.section_index {
            debug!(
                "event=reorder module=tree_ops status=skipped reason=cross_section active_id={} over_id={}",
                active_id, over_id
            );
            return assessment.clone();
        }
        let mut next = assessment.clone();
        let section = Arc::make_mut(&mut next.sections[active.section_index]);
        move_item(&mut section.questions, active.question_index, over.question_index);
        section.renumber_questions();
        next.touch();
        return next;
    }

    debug!(
        "event=reorder module=tree_ops status=skipped reason=level_mismatch active_id={} over_id={}",
        active_id, over_id
    );
    assessment.clone()
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}

fn strip_dependents(assessment: &mut Assessment, removed: &[QuestionId]) {
    if removed.is_empty() {
        return;
    }
    let repairs = strip_conditionals_where(assessment, |question| {
        question
            .conditional
            .as_ref()
            .is_some_and(|conditional| removed.contains(&conditional.depends_on))
    });
    for repair in repairs {
        debug!("event=conditional_strip module=tree_ops status=ok detail={repair}");
    }
}

fn log_miss(event: &str, id: &str) {
    debug!("event={event} module=tree_ops status=miss id={id}");
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
