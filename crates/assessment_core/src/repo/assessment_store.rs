//! Assessment persistence gateway.
//!
//! # Responsibility
//! - Map assessments to and from blobs under one storage key.
//! - Fall back to a caller-supplied assessment when a blob is missing or
//!   unreadable, and keep saves best-effort.
//!
//! # Invariants
//! - Loaded assessments always pass `integrity::check_invariants`.
//! - A failed save never fails the caller; it is logged and reported.

use crate::model::assessment::Assessment;
use crate::model::codec::{decode, encode};
use crate::repo::blob_store::{BlobStore, StoreResult};
use crate::service::integrity::sanitize;
use log::{debug, error, info, warn};

/// Assessment-level facade over a `BlobStore` backend.
#[derive(Debug)]
pub struct AssessmentStore<S> {
    backend: S,
}

impl<S: BlobStore> AssessmentStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Loads and repairs the assessment stored under `key`.
    ///
    /// Missing keys are `Ok(None)`. Corrupt blobs and documents that do not
    /// decode are errors.
    pub fn load(&self, key: &str) -> StoreResult<Option<Assessment>> {
        let Some(value) = self.backend.load(key)? else {
            return Ok(None);
        };
        let (assessment, repairs) = sanitize(decode(value)?);
        if !repairs.is_empty() {
            info!(
                "event=assessment_load module=repo status=repaired key={} repairs={}",
                key,
                repairs.len()
            );
        }
        Ok(Some(assessment))
    }

    /// Loads the assessment under `key`, or builds one with `fallback`.
    ///
    /// Load failures are logged and otherwise swallowed.
    pub fn load_or_else(&self, key: &str, fallback: impl FnOnce() -> Assessment) -> Assessment {
        match self.load(key) {
            Ok(Some(assessment)) => {
                debug!("event=assessment_load module=repo status=ok key={key}");
                assessment
            }
            Ok(None) => {
                debug!("event=assessment_load module=repo status=missing key={key}");
                fallback()
            }
            Err(err) => {
                warn!(
                    "event=assessment_load module=repo status=fallback key={} error={}",
                    key, err
                );
                fallback()
            }
        }
    }

    /// Saves `assessment` under `key`, propagating failures.
    pub fn try_save(&self, key: &str, assessment: &Assessment) -> StoreResult<()> {
        let value = encode(assessment)?;
        self.backend.save(key, &value)
    }

    /// Best-effort save. Returns whether the blob was written.
    pub fn save(&self, key: &str, assessment: &Assessment) -> bool {
        match self.try_save(key, assessment) {
            Ok(()) => {
                debug!("event=assessment_save module=repo status=ok key={key}");
                true
            }
            Err(err) => {
                error!(
                    "event=assessment_save module=repo status=error key={} error={}",
                    key, err
                );
                false
            }
        }
    }

    /// Removes the blob under `key`. Returns whether one existed.
    pub fn remove(&self, key: &str) -> StoreResult<bool> {
        self.backend.remove(key)
    }
}
