//! Version metadata for a loaded policy snapshot.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifies which policy set a snapshot was built from.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub struct PolicyVersion {
    /// SHA-256 over the declared metadata of the sorted policy set.
    pub hash: String,
    /// Unix timestamp (seconds) at which the snapshot was installed.
    pub loaded_at: String,
}

impl Display for PolicyVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} @ {}", self.hash, self.loaded_at)
    }
}
