use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Serialize, Deserialize)]
pub enum PolicyError {
    #[error("malformed policy '{policy}': {reason}")]
    MalformedPolicy { policy: String, reason: String },

    #[error("malformed expression in policy '{policy}', expression {index}: {reason}")]
    MalformedExpression {
        policy: String,
        index: usize,
        reason: String,
    },

    #[error("duplicate policy name '{0}' in loaded set")]
    DuplicatePolicy(String),

    #[error("policy backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("evaluation canceled")]
    Canceled,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Internal resolution failure. Never crosses the engine boundary; the
/// evaluator maps it to a per-policy indeterminate outcome. Type mismatches
/// take the same route, folded to indeterminate at the comparison sites.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("attribute '{path}' not resolvable on {entity}")]
pub(crate) struct AttributeNotResolvable {
    pub(crate) entity: String,
    pub(crate) path: String,
}

impl From<std::io::Error> for PolicyError {
    fn from(err: std::io::Error) -> Self {
        PolicyError::BackendUnavailable(err.to_string())
    }
}
