//! Policy interchange parsing.
//!
//! The canonical on-disk form is a JSON document holding
//! `{ "policies": [ ... ] }`; YAML surfaces map to the same records. Parsing
//! is fail-fast: one malformed policy aborts the whole load so a cache never
//! holds a partially valid set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::builder;
use crate::error::PolicyError;
use crate::types::{Effect, Policy};

/// Wire form of one policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub effect: Effect,
    #[serde(default)]
    pub actions: BTreeSet<String>,
    #[serde(default)]
    pub actors: BTreeSet<String>,
    #[serde(default)]
    pub subjects: BTreeSet<String>,
    pub rules: RuleRecord,
}

/// Wire form of a policy's rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRecord {
    pub condition: String,
    pub expressions: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct PolicySetDoc {
    policies: Vec<PolicyRecord>,
}

/// Parse a policy-set document into validated policies.
pub fn parse_policy_set(text: &str) -> Result<Vec<Policy>, PolicyError> {
    let doc: PolicySetDoc =
        serde_json::from_str(text).map_err(|err| PolicyError::MalformedPolicy {
            policy: "<policy-set>".to_string(),
            reason: err.to_string(),
        })?;

    doc.policies.into_iter().map(policy_from_record).collect()
}

/// Convert one wire record into a validated [`Policy`].
pub fn policy_from_record(record: PolicyRecord) -> Result<Policy, PolicyError> {
    if record.name.is_empty() {
        return Err(PolicyError::MalformedPolicy {
            policy: "<unnamed>".to_string(),
            reason: "policy name must be non-empty".to_string(),
        });
    }

    let rule = builder::build_rule(
        &record.name,
        &record.rules.condition,
        &record.rules.expressions,
    )?;

    Ok(Policy {
        name: record.name,
        description: record.description,
        effect: record.effect,
        actions: record.actions,
        actors: record.actors,
        subjects: record.subjects,
        rule,
    })
}
