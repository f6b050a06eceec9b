//! Builder editing session.
//!
//! # Responsibility
//! - Apply edit operations to the current assessment snapshot.
//! - Own the ephemeral selection and drag state of the builder UI.
//! - Save every committed change through the persistence gateway.
//!
//! # Invariants
//! - The selection never points at an entity missing from the snapshot.
//! - `revision` increases by one per committed change and never otherwise.
//! - Save failures never block editing; the snapshot stays dirty until a
//!   later save succeeds.
//! - A snapshot opened from the template fallback is dirty until written.

use crate::config::BuilderConfig;
use crate::model::assessment::{Assessment, QuestionId, SectionId};
use crate::model::question_type::QuestionType;
use crate::model::template::sample_assessment;
use crate::repo::assessment_store::AssessmentStore;
use crate::repo::blob_store::BlobStore;
use crate::service::tree_ops::{
    add_question, add_section, delete_question, delete_section, duplicate_question,
    duplicate_section, reorder, update_assessment, update_question, update_section,
    AssessmentPatch, QuestionPatch, SectionPatch,
};
use log::{debug, info};
use serde::Deserialize;

/// One builder edit, as sent by the UI.
///
/// On the wire: `{"op": "add_question", "sectionId": "...", "questionType": "numeric"}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EditOp {
    UpdateAssessment {
        #[serde(default)]
        patch: AssessmentPatch,
    },
    AddSection,
    UpdateSection {
        section_id: SectionId,
        #[serde(default)]
        patch: SectionPatch,
    },
    DeleteSection {
        section_id: SectionId,
    },
    DuplicateSection {
        section_id: SectionId,
    },
    AddQuestion {
        #[serde(default)]
        section_id: SectionId,
        question_type: QuestionType,
    },
    UpdateQuestion {
        question_id: QuestionId,
        #[serde(default)]
        patch: QuestionPatch,
    },
    DeleteQuestion {
        section_id: SectionId,
        question_id: QuestionId,
    },
    DuplicateQuestion {
        question_id: QuestionId,
    },
    Reorder {
        active_id: String,
        over_id: String,
    },
}

impl EditOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateAssessment { .. } => "update_assessment",
            Self::AddSection => "add_section",
            Self::UpdateSection { .. } => "update_section",
            Self::DeleteSection { .. } => "delete_section",
            Self::DuplicateSection { .. } => "duplicate_section",
            Self::AddQuestion { .. } => "add_question",
            Self::UpdateQuestion { .. } => "update_question",
            Self::DeleteQuestion { .. } => "delete_question",
            Self::DuplicateQuestion { .. } => "duplicate_question",
            Self::Reorder { .. } => "reorder",
        }
    }
}

/// Result of applying one `EditOp` to a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub assessment: Assessment,
    pub removed_question_ids: Vec<QuestionId>,
    pub created_question_id: Option<QuestionId>,
}

impl EditOutcome {
    fn plain(assessment: Assessment) -> Self {
        Self {
            assessment,
            removed_question_ids: Vec::new(),
            created_question_id: None,
        }
    }
}

/// Applies `op` to `assessment` through the mutation engine.
pub fn apply_edit(assessment: &Assessment, op: EditOp) -> EditOutcome {
    match op {
        EditOp::UpdateAssessment { patch } => {
            EditOutcome::plain(update_assessment(assessment, patch))
        }
        EditOp::AddSection => EditOutcome::plain(add_section(assessment)),
        EditOp::UpdateSection { section_id, patch } => {
            EditOutcome::plain(update_section(assessment, &section_id, patch))
        }
        EditOp::DeleteSection { section_id } => {
            let removal = delete_section(assessment, &section_id);
            EditOutcome {
                assessment: removal.assessment,
                removed_question_ids: removal.removed_question_ids,
                created_question_id: None,
            }
        }
        EditOp::DuplicateSection { section_id } => {
            EditOutcome::plain(duplicate_section(assessment, &section_id))
        }
        EditOp::AddQuestion {
            section_id,
            question_type,
        } => {
            let added = add_question(assessment, &section_id, question_type);
            EditOutcome {
                assessment: added.assessment,
                removed_question_ids: Vec::new(),
                created_question_id: added.question_id,
            }
        }
        EditOp::UpdateQuestion { question_id, patch } => {
            EditOutcome::plain(update_question(assessment, &question_id, patch))
        }
        EditOp::DeleteQuestion {
            section_id,
            question_id,
        } => {
            let removal = delete_question(assessment, &section_id, &question_id);
            EditOutcome {
                assessment: removal.assessment,
                removed_question_ids: removal.removed_question_ids,
                created_question_id: None,
            }
        }
        EditOp::DuplicateQuestion { question_id } => {
            let added = duplicate_question(assessment, &question_id);
            EditOutcome {
                assessment: added.assessment,
                removed_question_ids: Vec::new(),
                created_question_id: added.question_id,
            }
        }
        EditOp::Reorder { active_id, over_id } => {
            EditOutcome::plain(reorder(assessment, &active_id, &over_id))
        }
    }
}

/// Ephemeral builder UI state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub question_id: Option<QuestionId>,
    /// Section or question currently being dragged.
    pub active_drag_id: Option<String>,
}

/// Editing session for the assessment of one job posting.
pub struct AssessmentEditor<S> {
    store: AssessmentStore<S>,
    storage_key: String,
    assessment: Assessment,
    selection: Selection,
    revision: u64,
    saved_revision: u64,
    stored: bool,
}

impl<S: BlobStore> AssessmentEditor<S> {
    /// Loads the assessment for `job_id`, or starts from the sample template.
    pub fn open(store: AssessmentStore<S>, config: &BuilderConfig, job_id: &str) -> Self {
        let storage_key = config.storage_key(job_id);
        let mut from_template = false;
        let assessment = store.load_or_else(&storage_key, || {
            from_template = true;
            sample_assessment(job_id)
        });
        info!(
            "event=editor_open module=editor status=ok key={} sections={} questions={}",
            storage_key,
            assessment.sections.len(),
            assessment.question_count()
        );
        Self {
            store,
            storage_key,
            assessment,
            selection: Selection::default(),
            revision: 0,
            saved_revision: 0,
            stored: !from_template,
        }
    }

    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn store(&self) -> &AssessmentStore<S> {
        &self.store
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the current snapshot has not been written yet.
    pub fn is_dirty(&self) -> bool {
        !self.stored || self.revision != self.saved_revision
    }

    /// Applies one edit. Returns whether the snapshot changed.
    ///
    /// A changed snapshot is saved immediately; newly created questions
    /// become selected and deleted ones drop out of the selection.
    pub fn apply(&mut self, op: EditOp) -> bool {
        let name = op.name();
        let outcome = apply_edit(&self.assessment, op);
        if outcome.assessment == self.assessment {
            debug!("event=editor_apply module=editor status=unchanged op={name}");
            return false;
        }

        self.assessment = outcome.assessment;
        self.revision += 1;
        if let Some(created) = outcome.created_question_id {
            self.selection.question_id = Some(created);
        }
        self.prune_selection(&outcome.removed_question_ids);
        debug!(
            "event=editor_apply module=editor status=ok op={} revision={}",
            name, self.revision
        );
        self.save();
        true
    }

    /// Selects `question_id` if it exists. Returns whether it was selected.
    pub fn select_question(&mut self, question_id: &str) -> bool {
        if self.assessment.locate_question(question_id).is_none() {
            return false;
        }
        self.selection.question_id = Some(question_id.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.question_id = None;
    }

    /// Marks `id` as being dragged if it names a section or question.
    pub fn begin_drag(&mut self, id: &str) -> bool {
        if !self.assessment.contains_id(id) {
            return false;
        }
        self.selection.active_drag_id = Some(id.to_string());
        true
    }

    /// Ends the current drag by moving the dragged item onto `over_id`.
    ///
    /// Without an `over_id` the drag is cancelled.
    pub fn end_drag(&mut self, over_id: Option<&str>) -> bool {
        let Some(active_id) = self.selection.active_drag_id.take() else {
            return false;
        };
        match over_id {
            Some(over_id) => self.apply(EditOp::Reorder {
                active_id,
                over_id: over_id.to_string(),
            }),
            None => false,
        }
    }

    /// Writes the current snapshot if it is dirty. Returns whether the store
    /// is up to date afterwards.
    pub fn save(&mut self) -> bool {
        if !self.is_dirty() {
            return true;
        }
        if self.store.save(&self.storage_key, &self.assessment) {
            self.saved_revision = self.revision;
            self.stored = true;
        }
        !self.is_dirty()
    }

    fn prune_selection(&mut self, removed: &[QuestionId]) {
        let selected_gone = self.selection.question_id.as_ref().is_some_and(|id| {
            removed.contains(id) || self.assessment.locate_question(id).is_none()
        });
        if selected_gone {
            self.selection.question_id = None;
        }
        let drag_gone = self
            .selection
            .active_drag_id
            .as_ref()
            .is_some_and(|id| !self.assessment.contains_id(id));
        if drag_gone {
            self.selection.active_drag_id = None;
        }
    }
}
