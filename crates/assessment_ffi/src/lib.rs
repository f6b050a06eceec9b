//! Flutter-facing bridge over `assessment_core`.

pub mod api;
