//! Shared helpers for unit tests: canned policies and a hand-driven clock.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::expr::{Condition, Expr, Operand, Rule, UnaryOp};
use crate::traits::Clock;
use crate::types::{Effect, Policy};

/// A rule that always evaluates to true.
pub(crate) fn always_true_rule() -> Rule {
    Rule {
        condition: Condition::All,
        expressions: vec![Expr::Unary {
            op: UnaryOp::Truthy,
            operand: Operand::literal(1),
        }],
    }
}

fn policy(name: &str, effect: Effect, action: &str, actor: &str, subject: &str) -> Policy {
    let mut policy = Policy::new(name, effect, always_true_rule());
    if !action.is_empty() {
        policy = policy.with_action(action);
    }
    if !actor.is_empty() {
        policy = policy.with_actor(actor);
    }
    if !subject.is_empty() {
        policy = policy.with_subject(subject);
    }
    policy
}

/// Permit policy with an always-true rule; empty dimension strings stay
/// undeclared (match any).
pub(crate) fn permit_policy(name: &str, action: &str, actor: &str, subject: &str) -> Policy {
    policy(name, Effect::Permit, action, actor, subject)
}

pub(crate) fn deny_policy(name: &str, action: &str, actor: &str, subject: &str) -> Policy {
    policy(name, Effect::Deny, action, actor, subject)
}

/// Deterministic [`Clock`] that only moves when told to.
pub(crate) struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        *self.offset.lock().expect("clock lock poisoned") += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().expect("clock lock poisoned")
    }
}

/// Convenience for trait-object construction in tests.
pub(crate) fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
