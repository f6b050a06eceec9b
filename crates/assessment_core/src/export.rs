//! Assessment export as a downloadable JSON document.
//!
//! # Invariants
//! - Export contents are exactly the wire codec output, pretty-printed.
//! - File names never contain path separators.

use crate::model::assessment::Assessment;
use crate::model::codec::{encode_pretty, CodecError};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const EXPORT_SUFFIX: &str = "-assessment.json";
const UNTITLED: &str = "untitled";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));
static UNSAFE_FILE_CHAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).expect("valid file char regex"));

#[derive(Debug)]
pub enum ExportError {
    Codec(CodecError),
    Io { path: PathBuf, source: std::io::Error },
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Codec(err) => write!(f, "{err}"),
            Self::Io { path, source } => {
                write!(f, "failed to write export `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Codec(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<CodecError> for ExportError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

/// Named export payload, ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub file_name: String,
    pub contents: String,
}

/// Derives the export file name from an assessment title.
///
/// `"Frontend Developer Assessment"` becomes
/// `"frontend-developer-assessment-assessment.json"`.
pub fn export_file_name(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return format!("{UNTITLED}{EXPORT_SUFFIX}");
    }
    let lowered = trimmed.to_lowercase();
    let dashed = WHITESPACE_RE.replace_all(&lowered, "-");
    let safe = UNSAFE_FILE_CHAR_RE.replace_all(&dashed, "-");
    format!("{safe}{EXPORT_SUFFIX}")
}

pub fn export_document(assessment: &Assessment) -> Result<ExportDocument, CodecError> {
    Ok(ExportDocument {
        file_name: export_file_name(&assessment.title),
        contents: encode_pretty(assessment)?,
    })
}

/// Writes the export document into `dir`, creating it when missing.
///
/// Returns the path of the written file.
pub fn write_export(
    assessment: &Assessment,
    dir: impl AsRef<Path>,
) -> Result<PathBuf, ExportError> {
    let dir = dir.as_ref();
    let document = export_document(assessment)?;
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(&document.file_name);
    std::fs::write(&path, document.contents.as_bytes()).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    info!(
        "event=assessment_export module=export status=ok questions={} file={}",
        assessment.question_count(),
        document.file_name
    );
    Ok(path)
}
