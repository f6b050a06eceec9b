//! Assessment domain model.
//!
//! # Responsibility
//! - Define the canonical Assessment/Section/Question data contract.
//! - Own the question type registry, response values, and wire codec.
//!
//! # Invariants
//! - Models carry no editing behavior; mutation lives in `service::tree_ops`.
//! - Every entity is identified by a stable string id that is never reused.

pub mod assessment;
pub mod codec;
pub mod question_type;
pub mod response;
pub mod template;
