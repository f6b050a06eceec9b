//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Move assessments, edits, and answers across the boundary as JSON text.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are reported in response envelopes, never as errors.

use assessment_core::db::open_db;
use assessment_core::{
    core_version as core_version_inner, decode_str, encode_pretty,
    init_logging as init_logging_inner, init_logging_from_config, ping as ping_inner, registry,
    validate_section, write_export, AssessmentEditor, AssessmentStore, BuilderConfig, EditOp,
    Responses, SqliteBlobStore,
};
use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;

const DEFAULT_DB_FILE_NAME: &str = "assessment_builder.sqlite3";
static DEFAULT_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static BUILDER_CONFIG: OnceLock<BuilderConfig> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Installs the process-wide builder config and starts logging if the
/// config names a log directory.
///
/// # FFI contract
/// - First successful call wins; later calls with a different config fail.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure(config_json: String) -> String {
    let config = match BuilderConfig::from_json_str(&config_json) {
        Ok(config) => config,
        Err(err) => return err.to_string(),
    };
    if let Err(err) = init_logging_from_config(&config.logging) {
        return err.to_string();
    }
    let active = BUILDER_CONFIG.get_or_init(|| config.clone());
    if *active != config {
        return "builder already configured; refusing to switch config".to_string();
    }
    String::new()
}

/// One entry of the question type palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionTypeItem {
    /// Wire tag, e.g. `single-choice`.
    pub tag: String,
    pub label: String,
    pub description: String,
}

/// Response envelope for calls that produce an assessment snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentResponse {
    pub ok: bool,
    /// Pretty JSON snapshot on success.
    pub assessment_json: Option<String>,
    /// Question created by the edit, if any.
    pub created_question_id: Option<String>,
    /// Whether the edit changed the snapshot.
    pub changed: bool,
    pub message: String,
}

impl AssessmentResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            assessment_json: None,
            created_question_id: None,
            changed: false,
            message: message.into(),
        }
    }
}

/// Validation error for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub question_id: String,
    /// Stable machine-readable code, e.g. `above_maximum`.
    pub code: String,
    /// User-facing message.
    pub message: String,
}

/// Response envelope for section validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResponse {
    /// Whether the request was processed; see `errors` for the verdict.
    pub ok: bool,
    pub errors: Vec<FieldError>,
    pub message: String,
}

/// Response envelope for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    /// Absolute path of the written file.
    pub path: Option<String>,
    pub message: String,
}

/// Lists the question type registry in display order.
#[flutter_rust_bridge::frb(sync)]
pub fn question_types() -> Vec<QuestionTypeItem> {
    registry()
        .iter()
        .map(|info| QuestionTypeItem {
            tag: info.question_type.as_str().to_string(),
            label: info.label.to_string(),
            description: info.description.to_string(),
        })
        .collect()
}

/// Loads the assessment for `job_id`, falling back to the sample template.
///
/// A template fallback is written back so later calls see the same ids.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Blank `db_path` uses `ASSESSMENT_DB_PATH` or a temp-dir default.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn assessment_load(db_path: String, job_id: String) -> AssessmentResponse {
    with_editor(&db_path, &job_id, |editor| {
        if !editor.save() {
            warn!("event=ffi_load module=ffi status=unsaved");
        }
        snapshot_response(editor, None, false, "Loaded.")
    })
}

/// Applies one edit (`EditOp` JSON) to the stored assessment of `job_id`
/// and saves the result.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Unknown ids are not errors; `changed` is `false` instead.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn assessment_apply_edit(
    db_path: String,
    job_id: String,
    edit_json: String,
) -> AssessmentResponse {
    let op = match serde_json::from_str::<EditOp>(&edit_json) {
        Ok(op) => op,
        Err(err) => {
            return AssessmentResponse::failure(format!("assessment_apply_edit failed: {err}"))
        }
    };
    let name = op.name();
    with_editor(&db_path, &job_id, |editor| {
        let changed = editor.apply(op);
        // An unchanged template fallback still has to be written once.
        if !editor.save() {
            warn!("event=ffi_apply_edit module=ffi status=unsaved op={name}");
        }
        // Each call opens a fresh editor, so a selection can only come from this edit.
        let created = editor.selection().question_id.clone().filter(|_| changed);
        snapshot_response(editor, created, changed, "Edit applied.")
    })
}

/// Validates `responses_json` against one section of `assessment_json`.
///
/// # FFI contract
/// - Pure computation, no I/O.
/// - Hidden questions never produce errors.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn assessment_validate_section(
    assessment_json: String,
    section_id: String,
    responses_json: String,
) -> ValidationResponse {
    let failure = |message: String| ValidationResponse {
        ok: false,
        errors: Vec::new(),
        message,
    };
    let assessment = match decode_str(&assessment_json) {
        Ok(assessment) => assessment,
        Err(err) => return failure(format!("assessment_validate_section failed: {err}")),
    };
    let responses = match serde_json::from_str::<Responses>(&responses_json) {
        Ok(responses) => responses,
        Err(err) => return failure(format!("assessment_validate_section failed: {err}")),
    };
    let Some(section) = assessment.section(&section_id) else {
        return failure(format!("section not found: {section_id}"));
    };

    let errors = validate_section(section, &responses)
        .into_iter()
        .map(|(question_id, error)| FieldError {
            question_id,
            code: error.code().to_string(),
            message: error.to_string(),
        })
        .collect::<Vec<_>>();
    let message = if errors.is_empty() {
        "Section is valid.".to_string()
    } else {
        format!("Found {} error(s).", errors.len())
    };
    ValidationResponse {
        ok: true,
        errors,
        message,
    }
}

/// Writes the export document of `assessment_json` into `out_dir`.
///
/// # FFI contract
/// - Sync call; writes one file.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn assessment_export(assessment_json: String, out_dir: String) -> ExportResponse {
    let result = decode_str(&assessment_json)
        .map_err(|err| err.to_string())
        .and_then(|assessment| {
            write_export(&assessment, out_dir.trim()).map_err(|err| err.to_string())
        });
    match result {
        Ok(path) => ExportResponse {
            ok: true,
            path: Some(path.display().to_string()),
            message: "Exported.".to_string(),
        },
        Err(message) => ExportResponse {
            ok: false,
            path: None,
            message: format!("assessment_export failed: {message}"),
        },
    }
}

fn resolve_config() -> &'static BuilderConfig {
    BUILDER_CONFIG.get_or_init(BuilderConfig::default)
}

fn resolve_db_path(db_path: &str) -> PathBuf {
    let trimmed = db_path.trim();
    if !trimmed.is_empty() {
        return PathBuf::from(trimmed);
    }
    DEFAULT_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("ASSESSMENT_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
        })
        .clone()
}

fn with_editor(
    db_path: &str,
    job_id: &str,
    f: impl FnOnce(&mut AssessmentEditor<SqliteBlobStore<'_>>) -> AssessmentResponse,
) -> AssessmentResponse {
    let job_id = job_id.trim();
    if job_id.is_empty() {
        return AssessmentResponse::failure("job_id cannot be empty");
    }
    let conn = match open_db(resolve_db_path(db_path)) {
        Ok(conn) => conn,
        Err(err) => {
            return AssessmentResponse::failure(format!("assessment DB open failed: {err}"))
        }
    };
    let store = match SqliteBlobStore::try_new(&conn) {
        Ok(store) => store,
        Err(err) => {
            return AssessmentResponse::failure(format!("blob store init failed: {err}"))
        }
    };
    let mut editor =
        AssessmentEditor::open(AssessmentStore::new(store), resolve_config(), job_id);
    f(&mut editor)
}

fn snapshot_response(
    editor: &AssessmentEditor<SqliteBlobStore<'_>>,
    created_question_id: Option<String>,
    changed: bool,
    message: &str,
) -> AssessmentResponse {
    match encode_pretty(editor.assessment()) {
        Ok(json) => AssessmentResponse {
            ok: true,
            assessment_json: Some(json),
            created_question_id,
            changed,
            message: message.to_string(),
        },
        Err(err) => AssessmentResponse::failure(format!("assessment encode failed: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        assessment_apply_edit, assessment_export, assessment_load, assessment_validate_section,
        configure, core_version, init_logging, ping, question_types,
    };
    use assessment_core::{decode_str, Responses};
    use serde_json::json;

    fn db_path(dir: &tempfile::TempDir) -> String {
        dir.path().join("ffi.sqlite3").to_str().unwrap().to_string()
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn configure_rejects_invalid_config() {
        let error = configure(r#"{"autosave_interval_secs": 0}"#.to_string());
        assert!(error.contains("greater than zero"));
    }

    #[test]
    fn question_types_lists_all_six() {
        let tags = question_types()
            .into_iter()
            .map(|item| item.tag)
            .collect::<Vec<_>>();
        assert_eq!(
            tags,
            vec![
                "single-choice",
                "multi-choice",
                "short-text",
                "long-text",
                "numeric",
                "file-upload"
            ]
        );
    }

    #[test]
    fn apply_edit_persists_created_question() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = assessment_load(db_path(&dir), "job-1".to_string());
        assert!(loaded.ok, "{}", loaded.message);
        let assessment = decode_str(loaded.assessment_json.as_deref().unwrap()).unwrap();
        let section_id = assessment.sections[0].id.clone();

        let edit = json!({
            "op": "add_question",
            "sectionId": section_id,
            "questionType": "long-text"
        });
        let applied =
            assessment_apply_edit(db_path(&dir), "job-1".to_string(), edit.to_string());
        assert!(applied.ok, "{}", applied.message);
        assert!(applied.changed);
        let created = applied.created_question_id.unwrap();

        let reloaded = assessment_load(db_path(&dir), "job-1".to_string());
        let reloaded = decode_str(reloaded.assessment_json.as_deref().unwrap()).unwrap();
        assert!(reloaded.question(&created).is_some());
        assert_eq!(reloaded.id, assessment.id);
    }

    #[test]
    fn unchanged_edit_on_fresh_job_keeps_ids_stable() {
        let dir = tempfile::tempdir().unwrap();
        let edit = json!({ "op": "delete_section", "sectionId": "missing" });

        let first = assessment_apply_edit(db_path(&dir), "job-4".to_string(), edit.to_string());
        assert!(first.ok, "{}", first.message);
        assert!(!first.changed);
        let first = decode_str(first.assessment_json.as_deref().unwrap()).unwrap();

        let second = assessment_apply_edit(db_path(&dir), "job-4".to_string(), edit.to_string());
        let second = decode_str(second.assessment_json.as_deref().unwrap()).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.sections[0].id, first.sections[0].id);
    }

    #[test]
    fn apply_edit_rejects_malformed_op() {
        let dir = tempfile::tempdir().unwrap();
        let response = assessment_apply_edit(
            db_path(&dir),
            "job-1".to_string(),
            r#"{"op": "explode"}"#.to_string(),
        );
        assert!(!response.ok);
        assert!(response.message.starts_with("assessment_apply_edit failed"));
    }

    #[test]
    fn validate_section_reports_codes() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = assessment_load(db_path(&dir), "job-2".to_string());
        let assessment_json = loaded.assessment_json.unwrap();
        let assessment = decode_str(&assessment_json).unwrap();
        let section = &assessment.sections[0];
        let mut responses = Responses::new();
        responses.insert(section.questions[0].id.as_str(), "100");

        let response = assessment_validate_section(
            assessment_json.clone(),
            section.id.clone(),
            serde_json::to_string(&responses).unwrap(),
        );

        assert!(response.ok, "{}", response.message);
        let codes = response
            .errors
            .iter()
            .map(|error| (error.question_id.as_str(), error.code.as_str()))
            .collect::<Vec<_>>();
        assert!(codes.contains(&(section.questions[0].id.as_str(), "above_maximum")));
        assert!(codes.contains(&(section.questions[1].id.as_str(), "required")));
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = assessment_load(db_path(&dir), "job-3".to_string());
        let out_dir = dir.path().join("exports").to_str().unwrap().to_string();

        let response = assessment_export(loaded.assessment_json.unwrap(), out_dir);

        assert!(response.ok, "{}", response.message);
        assert!(response
            .path
            .unwrap()
            .ends_with("frontend-developer-assessment-assessment.json"));
    }
}
