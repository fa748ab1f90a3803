//! Data model types for requests, policies, and decisions.

mod attr_value;
mod context;
mod decision;
mod policy;
mod request;
mod version;

pub use attr_value::{attrs, AttrValue};
pub use context::PolicyContext;
pub use decision::{Decision, DecisionCode};
pub use policy::{Effect, Policy};
pub use request::Request;
pub use version::PolicyVersion;
