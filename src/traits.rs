//! Capability traits at the engine's seams: attribute-bearing values,
//! category derivation, policy persistence, and the clock.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use crate::error::PolicyError;
use crate::types::{AttrValue, Policy};

/// An attribute-bearing value supplied by the caller: the actor, a subject,
/// or a structured environment entry.
///
/// The engine never inspects caller types; it asks for attributes by name
/// through this one method. Domain types implement it directly; plain
/// attribute maps get it for free. Nested objects are exposed as
/// [`AttrValue::Record`] so dotted paths (`org.id`) can walk into them.
pub trait AttributeSource: Send + Sync {
    /// Resolve a single attribute name, or `None` when the value has no such
    /// attribute.
    fn attribute(&self, name: &str) -> Option<AttrValue>;
}

impl AttributeSource for BTreeMap<String, AttrValue> {
    fn attribute(&self, name: &str) -> Option<AttrValue> {
        self.get(name).cloned()
    }
}

impl AttributeSource for HashMap<String, AttrValue> {
    fn attribute(&self, name: &str) -> Option<AttrValue> {
        self.get(name).cloned()
    }
}

/// Maps actors and subjects to the free-form category strings policies are
/// authored against, decoupling policy text from caller type names.
pub trait Categorizer: Send + Sync {
    fn actor_category(&self, actor: &dyn AttributeSource) -> String;
    fn subject_category(&self, subject: &dyn AttributeSource) -> String;
}

/// A [`Categorizer`] that reads the category from a designated attribute.
///
/// Suits callers whose actors and subjects are attribute maps: tag each with
/// e.g. `"category": "user"` and point the categorizer at `"category"`.
/// Values that lack the attribute (or hold a non-string) fall back to the
/// empty category, which no policy declares.
#[derive(Debug, Clone)]
pub struct AttributeCategorizer {
    attribute: String,
}

impl AttributeCategorizer {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }

    fn category_of(&self, source: &dyn AttributeSource) -> String {
        match source.attribute(&self.attribute) {
            Some(AttrValue::String(category)) => category,
            _ => String::new(),
        }
    }
}

impl Categorizer for AttributeCategorizer {
    fn actor_category(&self, actor: &dyn AttributeSource) -> String {
        self.category_of(actor)
    }

    fn subject_category(&self, subject: &dyn AttributeSource) -> String {
        self.category_of(subject)
    }
}

/// Read contract over a policy persistence backend.
///
/// `load_all` must be idempotent and repeatable within one engine process;
/// the cache calls it once at construction and again on every TTL refresh.
pub trait PolicyStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<Policy>, PolicyError>;

    fn load_by_name(&self, name: &str) -> Result<Option<Policy>, PolicyError> {
        Ok(self
            .load_all()?
            .into_iter()
            .find(|policy| policy.name == name))
    }
}

/// Monotonic time source for cache staleness checks. Swappable so tests can
/// drive the TTL window directly.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The wall clock used outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
