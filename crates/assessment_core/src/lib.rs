//! Core domain logic for the assessment builder.
//! This crate is the single source of truth for tree, visibility, and
//! validation invariants.

pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{BuilderConfig, ConfigError, LoggingConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use export::{export_document, export_file_name, write_export, ExportDocument, ExportError};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::assessment::{
    Assessment, ConditionOperator, Conditional, Question, QuestionId, QuestionKind, Section,
    SectionId, ValidationRule,
};
pub use model::codec::{decode, decode_str, encode, encode_pretty, CodecError};
pub use model::question_type::{registry, QuestionType, QuestionTypeInfo};
pub use model::response::{ResponseValue, Responses};
pub use model::template::sample_assessment;
pub use repo::assessment_store::AssessmentStore;
pub use repo::blob_store::{BlobStore, MemoryBlobStore, SqliteBlobStore, StoreError, StoreResult};
pub use service::autosave::AutosaveScheduler;
pub use service::editor::{apply_edit, AssessmentEditor, EditOp, EditOutcome, Selection};
pub use service::integrity::{check_invariants, sanitize, InvariantViolation};
pub use service::preview_session::{Navigation, PreviewSession, SessionStatus};
pub use service::validation::{validate, validate_section, ValidationError, ValidationErrors};
pub use service::visibility::{is_visible, visible_questions};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
