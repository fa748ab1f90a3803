//! Policy model: declared routing metadata plus one rule.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use strum_macros::{Display as StrumDisplay, EnumString};
use utoipa::ToSchema;

use crate::expr::Rule;

/// A policy's intent when its rule holds.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    StrumDisplay,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Effect {
    Permit,
    Deny,
}

/// A named unit of authorization intent.
///
/// The declared `actions`/`actors`/`subjects` sets are routing metadata used
/// to narrow the candidate set for a request; an empty set matches any value
/// in that dimension. The rule decides whether the policy applies to the
/// concrete attributes of a request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Policy {
    pub name: String,
    pub description: String,
    pub effect: Effect,
    pub actions: BTreeSet<String>,
    pub actors: BTreeSet<String>,
    pub subjects: BTreeSet<String>,
    #[serde(skip)]
    pub rule: Rule,
}

impl Policy {
    pub fn new(name: impl Into<String>, effect: Effect, rule: Rule) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            effect,
            actions: BTreeSet::new(),
            actors: BTreeSet::new(),
            subjects: BTreeSet::new(),
            rule,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.insert(action.into());
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actors.insert(actor.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subjects.insert(subject.into());
        self
    }

    /// Set membership over the declared actor categories.
    pub fn has_actor(&self, category: &str) -> bool {
        self.actors.contains(category)
    }

    /// Set membership over the declared subject categories.
    pub fn has_subject(&self, category: &str) -> bool {
        self.subjects.contains(category)
    }
}

impl Display for Policy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} ({})", self.name, self.effect)
    }
}
