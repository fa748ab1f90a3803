//! Request-scoped context the engine resolves attributes against.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::traits::AttributeSource;

use super::AttrValue;

/// Everything a policy rule may reference for one request: the acting
/// entity, the subjects acted upon, and ambient environment values.
///
/// Contexts are immutable once built and cheap to share; the engine never
/// mutates them.
#[derive(Clone)]
pub struct PolicyContext {
    actor: Arc<dyn AttributeSource>,
    subjects: Vec<Arc<dyn AttributeSource>>,
    environment: BTreeMap<String, AttrValue>,
}

impl PolicyContext {
    pub fn new(actor: impl AttributeSource + 'static) -> Self {
        Self {
            actor: Arc::new(actor),
            subjects: Vec::new(),
            environment: BTreeMap::new(),
        }
    }

    /// Append one subject; subjects keep their insertion order.
    pub fn with_subject(mut self, subject: impl AttributeSource + 'static) -> Self {
        self.subjects.push(Arc::new(subject));
        self
    }

    /// Set one environment value. Keys are unique; a repeated key replaces
    /// the earlier value.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn actor(&self) -> &dyn AttributeSource {
        self.actor.as_ref()
    }

    pub fn subjects(&self) -> &[Arc<dyn AttributeSource>] {
        &self.subjects
    }

    pub fn environment(&self) -> &BTreeMap<String, AttrValue> {
        &self.environment
    }
}

impl fmt::Debug for PolicyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyContext")
            .field("subjects", &self.subjects.len())
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}
