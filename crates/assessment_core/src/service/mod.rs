//! Core use-case services.
//!
//! # Responsibility
//! - Turn edits, answers, and navigation into new assessment/session state.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod autosave;
pub mod editor;
pub mod integrity;
pub mod preview_session;
pub mod tree_ops;
pub mod validation;
pub mod visibility;
