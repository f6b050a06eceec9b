//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the `(key, JSON blob)` storage contract and its backends.
//! - Isolate SQLite details from editor orchestration.
//!
//! # Invariants
//! - Loads repair structural damage before handing assessments out.
//! - Repository APIs distinguish a missing key from a corrupt blob.

pub mod assessment_store;
pub mod blob_store;
