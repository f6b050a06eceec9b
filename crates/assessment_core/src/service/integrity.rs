//! Structural integrity checks and load-time repair.
//!
//! # Responsibility
//! - Check the id, order, and conditional invariants of one snapshot.
//! - Guard conditional edits against self-reference and dependency cycles.
//! - Repair persisted snapshots that violate the invariants.
//!
//! # Invariants
//! - Dependency walks are bounded by a visited set and always terminate.
//! - `sanitize` output always passes `check_invariants`.

use crate::model::assessment::{
    new_question_id, new_section_id, Assessment, Conditional, Question, QuestionId, SectionId,
};
use log::warn;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// First invariant violation found in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Two entities share one id.
    DuplicateId(String),
    /// A section's `order` does not match its position.
    SectionOrder {
        section_id: SectionId,
        expected: usize,
        actual: usize,
    },
    /// A question's `order` does not match its position.
    QuestionOrder {
        section_id: SectionId,
        question_id: QuestionId,
        expected: usize,
        actual: usize,
    },
    /// A conditional references a question that does not exist.
    DanglingDependency {
        question_id: QuestionId,
        depends_on: QuestionId,
    },
    /// A conditional chain loops back to this question.
    ConditionalCycle(QuestionId),
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate entity id: {id}"),
            Self::SectionOrder {
                section_id,
                expected,
                actual,
            } => write!(
                f,
                "section {section_id} has order {actual}, expected {expected}"
            ),
            Self::QuestionOrder {
                section_id,
                question_id,
                expected,
                actual,
            } => write!(
                f,
                "question {question_id} in section {section_id} has order {actual}, expected {expected}"
            ),
            Self::DanglingDependency {
                question_id,
                depends_on,
            } => write!(
                f,
                "question {question_id} depends on missing question {depends_on}"
            ),
            Self::ConditionalCycle(id) => write!(f, "conditional cycle through question {id}"),
        }
    }
}

impl Error for InvariantViolation {}

/// Reason a conditional edit was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalRejection {
    /// The question would depend on itself.
    SelfReference(QuestionId),
    /// The dependency target does not exist.
    UnknownDependency(QuestionId),
    /// The dependency chain would loop back to the question.
    Cycle {
        question_id: QuestionId,
        depends_on: QuestionId,
    },
}

impl Display for ConditionalRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfReference(id) => write!(f, "question {id} cannot depend on itself"),
            Self::UnknownDependency(id) => write!(f, "dependency target not found: {id}"),
            Self::Cycle {
                question_id,
                depends_on,
            } => write!(
                f,
                "conditional would create cycle: {question_id} depends on {depends_on}"
            ),
        }
    }
}

impl Error for ConditionalRejection {}

/// One repair applied by `sanitize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repair {
    /// A blank or duplicate id was replaced.
    RegeneratedId { previous: String, replacement: String },
    /// Order fields were rewritten to match positions.
    RenumberedOrders,
    /// A conditional was removed from this question.
    StrippedConditional {
        question_id: QuestionId,
        depends_on: QuestionId,
    },
}

impl Display for Repair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegeneratedId {
                previous,
                replacement,
            } => write!(f, "regenerated id `{previous}` as `{replacement}`"),
            Self::RenumberedOrders => write!(f, "renumbered orders"),
            Self::StrippedConditional {
                question_id,
                depends_on,
            } => write!(
                f,
                "stripped conditional on {question_id} (depends on {depends_on})"
            ),
        }
    }
}

/// Checks every structural invariant of `assessment`.
pub fn check_invariants(assessment: &Assessment) -> Result<(), InvariantViolation> {
    let mut seen = HashSet::new();
    for (section_index, section) in assessment.sections.iter().enumerate() {
        if !seen.insert(section.id.as_str()) {
            return Err(InvariantViolation::DuplicateId(section.id.clone()));
        }
        if section.order != section_index {
            return Err(InvariantViolation::SectionOrder {
                section_id: section.id.clone(),
                expected: section_index,
                actual: section.order,
            });
        }
        for (question_index, question) in section.questions.iter().enumerate() {
            if !seen.insert(question.id.as_str()) {
                return Err(InvariantViolation::DuplicateId(question.id.clone()));
            }
            if question.order != question_index {
                return Err(InvariantViolation::QuestionOrder {
                    section_id: section.id.clone(),
                    question_id: question.id.clone(),
                    expected: question_index,
                    actual: question.order,
                });
            }
        }
    }

    for question in assessment.questions() {
        if let Some(conditional) = question.conditional.as_ref() {
            if assessment.locate_question(&conditional.depends_on).is_none() {
                return Err(InvariantViolation::DanglingDependency {
                    question_id: question.id.clone(),
                    depends_on: conditional.depends_on.clone(),
                });
            }
        }
    }

    if let Some(question_id) = find_cyclic_conditionals(assessment).into_iter().next() {
        return Err(InvariantViolation::ConditionalCycle(question_id));
    }
    Ok(())
}

/// Checks whether `question_id` may take `conditional` in `assessment`.
pub fn check_conditional(
    assessment: &Assessment,
    question_id: &str,
    conditional: &Conditional,
) -> Result<(), ConditionalRejection> {
    let depends_on = conditional.depends_on.as_str();
    if depends_on == question_id {
        return Err(ConditionalRejection::SelfReference(question_id.to_string()));
    }
    if assessment.locate_question(depends_on).is_none() {
        return Err(ConditionalRejection::UnknownDependency(
            depends_on.to_string(),
        ));
    }
    if would_create_cycle(assessment, question_id, depends_on) {
        return Err(ConditionalRejection::Cycle {
            question_id: question_id.to_string(),
            depends_on: depends_on.to_string(),
        });
    }
    Ok(())
}

/// Returns whether making `question_id` depend on `depends_on` closes a loop.
///
/// A chain that runs into an existing loop not involving `question_id` is
/// reported as a cycle too.
pub fn would_create_cycle(assessment: &Assessment, question_id: &str, depends_on: &str) -> bool {
    let edges = dependency_edges(assessment);
    let mut visited = HashSet::new();
    let mut cursor = Some(depends_on);
    while let Some(current) = cursor {
        if current == question_id {
            return true;
        }
        if !visited.insert(current) {
            return true;
        }
        cursor = edges.get(current).copied();
    }
    false
}

/// Returns ids of questions whose dependency chain loops back to themselves,
/// in tree order.
pub fn find_cyclic_conditionals(assessment: &Assessment) -> Vec<QuestionId> {
    let edges = dependency_edges(assessment);
    assessment
        .questions()
        .filter(|question| {
            let Some(conditional) = question.conditional.as_ref() else {
                return false;
            };
            let mut visited = HashSet::new();
            let mut cursor = Some(conditional.depends_on.as_str());
            while let Some(current) = cursor {
                if current == question.id {
                    return true;
                }
                if !visited.insert(current) {
                    return false;
                }
                cursor = edges.get(current).copied();
            }
            false
        })
        .map(|question| question.id.clone())
        .collect()
}

/// Repairs a decoded snapshot so that it passes `check_invariants`.
///
/// Blank or duplicate ids get fresh ids, orders are renumbered, and
/// self-referencing, dangling, or cyclic conditionals are stripped. Every
/// repair is logged and returned.
pub fn sanitize(mut assessment: Assessment) -> (Assessment, Vec<Repair>) {
    let mut repairs = Vec::new();

    let mut seen = HashSet::<String>::new();
    for section in assessment.sections.iter_mut() {
        if section.id.trim().is_empty() || seen.contains(&section.id) {
            let replacement = new_section_id();
            repairs.push(Repair::RegeneratedId {
                previous: section.id.clone(),
                replacement: replacement.clone(),
            });
            Arc::make_mut(section).id = replacement;
        }
        seen.insert(section.id.clone());

        let needs_question_repair = {
            let mut local = seen.clone();
            section
                .questions
                .iter()
                .any(|question| question.id.trim().is_empty() || !local.insert(question.id.clone()))
        };
        if needs_question_repair {
            let section = Arc::make_mut(section);
            for question in section.questions.iter_mut() {
                if question.id.trim().is_empty() || seen.contains(&question.id) {
                    let replacement = new_question_id();
                    repairs.push(Repair::RegeneratedId {
                        previous: question.id.clone(),
                        replacement: replacement.clone(),
                    });
                    Arc::make_mut(question).id = replacement;
                }
                seen.insert(question.id.clone());
            }
        } else {
            seen.extend(section.questions.iter().map(|question| question.id.clone()));
        }
    }

    let orders_valid = assessment.sections.iter().enumerate().all(|(index, section)| {
        section.order == index
            && section
                .questions
                .iter()
                .enumerate()
                .all(|(question_index, question)| question.order == question_index)
    });
    if !orders_valid {
        assessment.renumber_sections();
        for section in assessment.sections.iter_mut() {
            let contiguous = section
                .questions
                .iter()
                .enumerate()
                .all(|(index, question)| question.order == index);
            if !contiguous {
                Arc::make_mut(section).renumber_questions();
            }
        }
        repairs.push(Repair::RenumberedOrders);
    }

    let known_ids = assessment
        .questions()
        .map(|question| question.id.clone())
        .collect::<HashSet<_>>();
    let invalid = |question: &Question| {
        question.conditional.as_ref().is_some_and(|conditional| {
            conditional.depends_on == question.id || !known_ids.contains(&conditional.depends_on)
        })
    };
    repairs.extend(strip_conditionals_where(&mut assessment, invalid));

    let cyclic = find_cyclic_conditionals(&assessment)
        .into_iter()
        .collect::<HashSet<_>>();
    if !cyclic.is_empty() {
        repairs.extend(strip_conditionals_where(&mut assessment, |question| {
            cyclic.contains(&question.id)
        }));
    }

    for repair in &repairs {
        warn!("event=assessment_repair module=integrity status=repaired detail={repair}");
    }
    (assessment, repairs)
}

/// Removes the conditional of every question matching `predicate`.
///
/// Sections without a match stay shared with the input snapshot.
pub(crate) fn strip_conditionals_where(
    assessment: &mut Assessment,
    predicate: impl Fn(&Question) -> bool,
) -> Vec<Repair> {
    let mut repairs = Vec::new();
    for section in assessment.sections.iter_mut() {
        let affected = section
            .questions
            .iter()
            .any(|question| question.conditional.is_some() && predicate(question));
        if !affected {
            continue;
        }
        let section = Arc::make_mut(section);
        for question in section.questions.iter_mut() {
            if question.conditional.is_none() || !predicate(question) {
                continue;
            }
            let question = Arc::make_mut(question);
            if let Some(conditional) = question.conditional.take() {
                repairs.push(Repair::StrippedConditional {
                    question_id: question.id.clone(),
                    depends_on: conditional.depends_on,
                });
            }
        }
    }
    repairs
}

fn dependency_edges(assessment: &Assessment) -> HashMap<&str, &str> {
    assessment
        .questions()
        .filter_map(|question| {
            question
                .conditional
                .as_ref()
                .map(|conditional| (question.id.as_str(), conditional.depends_on.as_str()))
        })
        .collect()
}
