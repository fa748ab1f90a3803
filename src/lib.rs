//! Attribute-based access control engine.
//!
//! Policies are loaded from a [`PolicyStore`], cached in an immutable
//! snapshot with TTL refresh, narrowed per request through secondary
//! indexes, and combined into a single [`Decision`] with deny-overrides and
//! default-deny semantics. Attributes are resolved through the
//! [`AttributeSource`] capability, so the engine never depends on caller
//! type names.
//!
//! Usage example:
//!
//! Here we declare a policy that allows a user to edit a post if and only if
//! they authored it and the post is still in a draft state:
//!
//! ```rust
//! use std::sync::Arc;
//! use palisade_core::{
//!     attrs, parse_policy_set, AttrValue, AttributeCategorizer, MemoryStore, PolicyContext,
//!     PolicyEngine, Request,
//! };
//!
//! let document = r#"{
//!     "policies": [
//!         {
//!             "name": "edit-post",
//!             "description": "authors may edit their own drafts",
//!             "effect": "permit",
//!             "actions": ["edit-post"],
//!             "actors": ["user"],
//!             "subjects": ["post"],
//!             "rules": {
//!                 "condition": "AND",
//!                 "expressions": [
//!                     { "operator": "eq",
//!                       "actor_attribute": "id",
//!                       "subject_attribute": "authorId" },
//!                     { "operator": "in",
//!                       "subject_attribute": "status",
//!                       "value": ["draft", "review"] }
//!                 ]
//!             }
//!         }
//!     ]
//! }"#;
//!
//! let store = MemoryStore::new(parse_policy_set(document).unwrap());
//! // actors and subjects carry their policy category in a "category" attribute
//! let engine = PolicyEngine::new(
//!     Arc::new(store),
//!     Arc::new(AttributeCategorizer::new("category")),
//! )
//! .unwrap();
//!
//! let context = PolicyContext::new(attrs([
//!     ("category", AttrValue::from("user")),
//!     ("id", AttrValue::Int(7)),
//! ]))
//! .with_subject(attrs([
//!     ("category", AttrValue::from("post")),
//!     ("authorId", AttrValue::Int(7)),
//!     ("status", AttrValue::from("draft")),
//! ]));
//!
//! let decision = engine.evaluate(&Request::new("edit-post", context)).unwrap();
//! assert!(decision.allowed);
//! ```
//!
//! ## Thread-Safe Sharing
//!
//! `PolicyEngine` is cheaply cloneable; clones share one cache and can be
//! moved across threads:
//!
//! ```rust,no_run
//! use std::thread;
//! # use std::sync::Arc;
//! # use palisade_core::{attrs, AttrValue, AttributeCategorizer, MemoryStore, PolicyContext,
//! #     PolicyEngine, Request};
//! # let engine = PolicyEngine::new(
//! #     Arc::new(MemoryStore::new(vec![])),
//! #     Arc::new(AttributeCategorizer::new("category")),
//! # ).unwrap();
//!
//! let worker = engine.clone();
//! let handle = thread::spawn(move || {
//!     let context = PolicyContext::new(attrs([("category", AttrValue::from("user"))]));
//!     let _decision = worker.evaluate(&Request::new("read-post", context));
//! });
//! handle.join().unwrap();
//! ```

pub use builder::{build_expression, build_rule};
pub use cache::Snapshot;
pub use cancel::CancelToken;
pub use config::EngineConfig;
pub use engine::{PolicyEngine, PolicyEngineBuilder, PolicyOutcome};
pub use error::PolicyError;
pub use expr::{
    BinaryOp, Condition, EntityKind, Expr, FuncOp, Operand, Rule, Truth, UnaryOp,
};
pub use loader::{parse_policy_set, policy_from_record, PolicyRecord, RuleRecord};
pub use store::{JsonFileStore, MemoryStore};
pub use traits::{
    AttributeCategorizer, AttributeSource, Categorizer, Clock, PolicyStore, SystemClock,
};
pub use types::{
    attrs, AttrValue, Decision, DecisionCode, Effect, Policy, PolicyContext, PolicyVersion,
    Request,
};

#[cfg(feature = "observability")]
pub use metrics::{set_sink, EvaluationStats, MetricsSink, ReloadStats};

mod accessor;
mod builder;
mod cache;
mod cancel;
mod config;
mod engine;
mod error;
mod expr;
mod loader;
#[cfg(feature = "observability")]
pub mod metrics;
#[cfg(not(feature = "observability"))]
mod metrics;
mod retrieval;
mod store;
#[cfg(test)]
mod test_support;
mod timers;
mod traits;
pub mod types;
