//! Shipped policy store backends.
//!
//! The read contract lives in [`crate::traits::PolicyStore`]; SQL and other
//! heavyweight backends are external. The crate ships the two stores every
//! embedding needs: an in-memory store and a JSON-file store over the
//! canonical interchange document.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::error::PolicyError;
use crate::loader;
use crate::traits::PolicyStore;
use crate::types::Policy;

/// In-memory policy store.
///
/// Contents are swappable and availability can be toggled, which makes this
/// the backend of choice for embedders with policies from elsewhere and for
/// exercising cache refresh behavior.
#[derive(Default)]
pub struct MemoryStore {
    policies: RwLock<Vec<Policy>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new(policies: Vec<Policy>) -> Self {
        Self {
            policies: RwLock::new(policies),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Replace the stored policy set. Visible to the engine after its next
    /// cache refresh.
    pub fn set_policies(&self, policies: Vec<Policy>) {
        *self.policies.write().expect("policy store lock poisoned") = policies;
    }

    /// Simulate backend loss: subsequent loads fail until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }
}

impl PolicyStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<Policy>, PolicyError> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(PolicyError::BackendUnavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(self
            .policies
            .read()
            .expect("policy store lock poisoned")
            .clone())
    }
}

/// Read-only store over a policy-set JSON file.
///
/// The file is re-read on every `load_all`, so edits become visible at the
/// next cache refresh.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PolicyStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<Policy>, PolicyError> {
        let text = std::fs::read_to_string(&self.path)?;
        loader::parse_policy_set(&text)
    }
}
