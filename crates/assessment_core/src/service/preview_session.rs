//! Preview/test-run session.
//!
//! # Responsibility
//! - Hold the in-progress answers of one preview run and walk the sections
//!   of an assessment with per-section validation gates.
//!
//! # Invariants
//! - The session never stores the assessment; every call that needs it
//!   takes the current snapshot, so the preview cannot drift from the editor.
//! - `current_section_index` is clamped to the snapshot on every read.
//! - Responses are never persisted with the assessment.

use crate::model::assessment::{Assessment, Section};
use crate::model::response::{ResponseValue, Responses};
use crate::service::validation::{validate_section, ValidationError, ValidationErrors};
use log::{debug, info};
use std::collections::HashSet;

/// Lifecycle state of a preview run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    InProgress,
    Completed,
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Advanced or stepped back to `section_index`.
    Moved { section_index: usize },
    /// The current section has validation errors.
    Blocked,
    /// The last section validated and the run is now completed.
    Submitted,
    /// Nothing to do (no sections, or already at the boundary).
    Unchanged,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewSession {
    current_section_index: usize,
    responses: Responses,
    errors: ValidationErrors,
    test_mode: bool,
    status: SessionStatus,
}

impl PreviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an answer and clears that question's pending error.
    ///
    /// Answers for questions that do not (or no longer) exist are kept; they
    /// are ignored by progress and validation.
    pub fn answer(&mut self, question_id: &str, value: impl Into<ResponseValue>) {
        self.responses.insert(question_id, value);
        self.errors.remove(question_id);
    }

    /// Validates the current section and advances on success.
    ///
    /// A successful step from the last section submits the run.
    pub fn go_next(&mut self, assessment: &Assessment) -> Navigation {
        let Some(index) = self.clamped_index(assessment) else {
            return Navigation::Unchanged;
        };
        self.current_section_index = index;
        if !self.validate_current(&assessment.sections[index]) {
            return Navigation::Blocked;
        }
        if index + 1 >= assessment.sections.len() {
            self.complete();
            return Navigation::Submitted;
        }
        self.current_section_index = index + 1;
        debug!(
            "event=preview_next module=preview_session status=ok section_index={}",
            self.current_section_index
        );
        Navigation::Moved {
            section_index: self.current_section_index,
        }
    }

    /// Steps back one section without validating.
    pub fn go_previous(&mut self, assessment: &Assessment) -> Navigation {
        let index = self.clamped_index(assessment).unwrap_or_default();
        if index == 0 {
            self.current_section_index = 0;
            return Navigation::Unchanged;
        }
        self.current_section_index = index - 1;
        Navigation::Moved {
            section_index: self.current_section_index,
        }
    }

    /// Validates the last section and completes the run on success.
    ///
    /// Returns whether the run is completed afterwards.
    pub fn submit(&mut self, assessment: &Assessment) -> bool {
        let Some(last) = assessment.sections.last() else {
            self.complete();
            return true;
        };
        if !self.validate_current(last) {
            self.current_section_index = assessment.sections.len() - 1;
            return false;
        }
        self.complete();
        true
    }

    /// Clears answers and errors and starts over outside test mode.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn enter_test_mode(&mut self) {
        self.test_mode = true;
    }

    pub fn is_test_mode(&self) -> bool {
        self.test_mode
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn responses(&self) -> &Responses {
        &self.responses
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error(&self, question_id: &str) -> Option<&ValidationError> {
        self.errors.get(question_id)
    }

    /// Final answers, once the run is completed.
    pub fn submission(&self) -> Option<&Responses> {
        (self.status == SessionStatus::Completed).then_some(&self.responses)
    }

    /// Index of the section on screen, clamped to `assessment`.
    pub fn current_section_index(&self, assessment: &Assessment) -> usize {
        self.clamped_index(assessment).unwrap_or_default()
    }

    /// Section on screen, `None` for an assessment without sections.
    pub fn current_section<'a>(&self, assessment: &'a Assessment) -> Option<&'a Section> {
        self.clamped_index(assessment)
            .map(|index| assessment.sections[index].as_ref())
    }

    /// Share of existing questions with an answer, in `0.0..=1.0`.
    ///
    /// Visibility is ignored; answers to unknown ids do not count.
    pub fn progress(&self, assessment: &Assessment) -> f64 {
        let total = assessment.question_count();
        if total == 0 {
            return 0.0;
        }
        let existing = assessment
            .questions()
            .map(|question| question.id.as_str())
            .collect::<HashSet<_>>();
        let answered = self
            .responses
            .question_ids()
            .filter(|id| existing.contains(id.as_str()))
            .count();
        answered as f64 / total as f64
    }

    /// `progress` as a whole percentage, rounded down.
    pub fn progress_percent(&self, assessment: &Assessment) -> u8 {
        (self.progress(assessment) * 100.0).floor().clamp(0.0, 100.0) as u8
    }

    fn clamped_index(&self, assessment: &Assessment) -> Option<usize> {
        let last = assessment.sections.len().checked_sub(1)?;
        Some(self.current_section_index.min(last))
    }

    fn validate_current(&mut self, section: &Section) -> bool {
        self.errors = validate_section(section, &self.responses);
        if !self.errors.is_empty() {
            debug!(
                "event=preview_validate module=preview_session status=blocked section_id={} errors={}",
                section.id,
                self.errors.len()
            );
        }
        self.errors.is_empty()
    }

    fn complete(&mut self) {
        self.status = SessionStatus::Completed;
        info!(
            "event=preview_submit module=preview_session status=ok answers={}",
            self.responses.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{Navigation, PreviewSession, SessionStatus};
    use crate::model::assessment::{Assessment, Question, QuestionKind, Section};
    use std::sync::Arc;

    fn assessment(section_count: usize) -> Assessment {
        let mut assessment = Assessment::new("job", "Preview");
        for order in 0..section_count {
            let mut section = Section::new(order);
            let mut question = Question::new(QuestionKind::ShortText { validation: None }, 0);
            question.id = format!("q{order}");
            question.required = true;
            section.questions.push(Arc::new(question));
            assessment.sections.push(Arc::new(section));
        }
        assessment
    }

    #[test]
    fn navigation_is_gated_by_validation() {
        let assessment = assessment(2);
        let mut session = PreviewSession::new();

        assert_eq!(session.go_next(&assessment), Navigation::Blocked);
        assert!(session.error("q0").is_some());

        session.answer("q0", "done");
        assert!(session.error("q0").is_none());
        assert_eq!(
            session.go_next(&assessment),
            Navigation::Moved { section_index: 1 }
        );
        assert_eq!(
            session.go_previous(&assessment),
            Navigation::Moved { section_index: 0 }
        );
        assert_eq!(session.go_previous(&assessment), Navigation::Unchanged);
    }

    #[test]
    fn current_section_is_clamped_after_shrink() {
        let large = assessment(3);
        let mut session = PreviewSession::new();
        for id in ["q0", "q1"] {
            session.answer(id, "x");
        }
        session.go_next(&large);
        session.go_next(&large);
        assert_eq!(session.current_section_index(&large), 2);

        let small = assessment(1);
        assert_eq!(session.current_section_index(&small), 0);
        assert!(session.current_section(&Assessment::new("job", "Empty")).is_none());
    }

    #[test]
    fn progress_ignores_unknown_ids() {
        let assessment = assessment(2);
        let mut session = PreviewSession::new();
        assert_eq!(session.progress(&assessment), 0.0);

        session.answer("q0", "a");
        session.answer("ghost", "b");
        assert_eq!(session.progress(&assessment), 0.5);
        assert_eq!(session.progress_percent(&assessment), 50);
        assert_eq!(session.progress(&Assessment::new("job", "Empty")), 0.0);
    }

    #[test]
    fn reset_returns_to_first_section() {
        let assessment = assessment(1);
        let mut session = PreviewSession::new();
        session.enter_test_mode();
        session.answer("q0", "a");
        assert!(session.submit(&assessment));
        assert_eq!(session.status(), SessionStatus::Completed);
        assert!(session.submission().is_some());

        session.reset();
        assert_eq!(session, PreviewSession::new());
        assert!(!session.is_test_mode());
        assert!(session.submission().is_none());
    }
}
