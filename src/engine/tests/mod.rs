use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::loader;
use crate::store::MemoryStore;
use crate::test_support::{deny_policy, permit_policy, ManualClock};
use crate::traits::AttributeCategorizer;
use crate::types::{attrs, AttrValue, DecisionCode};

mod evaluate;

const TEST_POLICY_DOC: &str = r#"{
    "policies": [
        {
            "name": "edit-post",
            "description": "authors may edit their own drafts during work hours",
            "effect": "permit",
            "actions": ["edit-post"],
            "actors": ["user"],
            "subjects": ["post"],
            "rules": {
                "condition": "AND",
                "expressions": [
                    { "operator": "eq",
                      "actor_attribute": "id",
                      "subject_attribute": "authorId" },
                    { "operator": "in",
                      "subject_attribute": "status",
                      "value": ["draft", "review"] }
                ]
            }
        },
        {
            "name": "deny-if-locked",
            "description": "locked posts are read-only",
            "effect": "deny",
            "actions": ["edit-post"],
            "actors": ["user"],
            "subjects": ["post"],
            "rules": {
                "condition": "AND",
                "expressions": [
                    { "operator": "eq",
                      "subject_attribute": "locked",
                      "value": true }
                ]
            }
        },
        {
            "name": "office-hours",
            "description": "archive access is limited to office hours",
            "effect": "permit",
            "actions": ["read-archive"],
            "actors": ["user"],
            "subjects": [],
            "rules": {
                "condition": "AND",
                "expressions": [
                    { "function": "isBetween",
                      "environment_attribute": "hour",
                      "arguments": [9, 17] }
                ]
            }
        }
    ]
}"#;

#[derive(Clone)]
struct SharedLogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

struct SharedLogWriter(Arc<std::sync::Mutex<Vec<u8>>>);

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedLogBuffer {
    type Writer = SharedLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedLogWriter(Arc::clone(&self.0))
    }
}

impl std::io::Write for SharedLogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn categorizer() -> Arc<AttributeCategorizer> {
    Arc::new(AttributeCategorizer::new("category"))
}

fn engine_from_doc(doc: &str) -> PolicyEngine {
    let policies = loader::parse_policy_set(doc).expect("test document should parse");
    PolicyEngine::new(Arc::new(MemoryStore::new(policies)), categorizer())
        .expect("engine should build")
}

fn engine_from_policies(policies: Vec<Policy>) -> PolicyEngine {
    PolicyEngine::new(Arc::new(MemoryStore::new(policies)), categorizer())
        .expect("engine should build")
}

fn user(id: i64) -> BTreeMap<String, AttrValue> {
    attrs([
        ("category", AttrValue::from("user")),
        ("id", AttrValue::Int(id)),
    ])
}

fn post(author_id: i64, status: &str) -> BTreeMap<String, AttrValue> {
    attrs([
        ("category", AttrValue::from("post")),
        ("authorId", AttrValue::Int(author_id)),
        ("status", AttrValue::from(status)),
        ("locked", AttrValue::Bool(false)),
    ])
}

fn locked_post(author_id: i64) -> BTreeMap<String, AttrValue> {
    attrs([
        ("category", AttrValue::from("post")),
        ("authorId", AttrValue::Int(author_id)),
        ("status", AttrValue::from("draft")),
        ("locked", AttrValue::Bool(true)),
    ])
}

fn edit_request(actor_id: i64, subject: BTreeMap<String, AttrValue>) -> Request {
    Request::new(
        "edit-post",
        PolicyContext::new(user(actor_id)).with_subject(subject),
    )
}

fn assert_permit(decision: &Decision) {
    assert!(decision.allowed, "expected permit, got {decision}");
    assert_eq!(decision.code, DecisionCode::Permitted);
}

fn assert_deny_with(decision: &Decision, code: DecisionCode) {
    assert!(!decision.allowed, "expected deny, got {decision}");
    assert_eq!(decision.code, code);
}
