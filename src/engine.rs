//! The decision engine: candidate retrieval, rule evaluation, and the
//! deny-overrides combining algorithm.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::accessor::AttributeAccessor;
use crate::cache::{PolicyCache, Snapshot};
use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::error::PolicyError;
use crate::expr::Truth;
use crate::metrics::EvaluationStats;
use crate::timers::{DecisionPhases, PhaseTimer};
use crate::traits::{Categorizer, Clock, PolicyStore, SystemClock};
use crate::types::{Decision, Effect, Policy, PolicyContext, PolicyVersion, Request};
use crate::{metrics, retrieval::candidates as narrow};

/// How one candidate policy resolved against a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOutcome {
    Permit,
    Deny,
    NotApplicable,
    Indeterminate,
}

/// The main engine handle. Cloneable and thread-safe: the evaluation path
/// holds only a read handle to the current snapshot, and the only lock in
/// the core guards cache refresh.
#[derive(Clone)]
pub struct PolicyEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    cache: PolicyCache,
    categorizer: Arc<dyn Categorizer>,
    config: EngineConfig,
}

/// Explicit construction for a [`PolicyEngine`]: the engine is a value with
/// dependencies, not a process-wide singleton.
pub struct PolicyEngineBuilder {
    store: Arc<dyn PolicyStore>,
    categorizer: Arc<dyn Categorizer>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl PolicyEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the engine, eagerly loading the first snapshot. A malformed or
    /// unavailable backend fails here rather than at the first decision.
    pub fn build(self) -> Result<PolicyEngine, PolicyError> {
        let cache = PolicyCache::new(self.store, self.config.cache_ttl, self.clock)?;
        Ok(PolicyEngine {
            inner: Arc::new(EngineInner {
                cache,
                categorizer: self.categorizer,
                config: self.config,
            }),
        })
    }
}

impl PolicyEngine {
    pub fn builder(
        store: Arc<dyn PolicyStore>,
        categorizer: Arc<dyn Categorizer>,
    ) -> PolicyEngineBuilder {
        PolicyEngineBuilder {
            store,
            categorizer,
            config: EngineConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn new(
        store: Arc<dyn PolicyStore>,
        categorizer: Arc<dyn Categorizer>,
    ) -> Result<Self, PolicyError> {
        Self::builder(store, categorizer).build()
    }

    /// Decide whether `request.action` is permitted in `request.context`.
    pub fn evaluate(&self, request: &Request) -> Result<Decision, PolicyError> {
        self.evaluate_with_cancel(request, &CancelToken::new())
    }

    /// [`evaluate`](Self::evaluate) with a caller-supplied cancellation
    /// signal, checked between expression evaluations and at cache-refresh
    /// boundaries.
    pub fn evaluate_with_cancel(
        &self,
        request: &Request,
        token: &CancelToken,
    ) -> Result<Decision, PolicyError> {
        if request.action.is_empty() {
            return Err(PolicyError::InvalidRequest(
                "action must be non-empty".to_string(),
            ));
        }

        let started = Instant::now();
        let mut phases = DecisionPhases::default();
        token.check()?;

        let ctx = &request.context;
        let candidates = {
            let _timer = PhaseTimer::new(&mut phases.retrieval);
            let snapshot = self.inner.cache.current();

            let actor_category = self.inner.categorizer.actor_category(ctx.actor());
            let subject_categories: BTreeSet<String> = ctx
                .subjects()
                .iter()
                .map(|subject| self.inner.categorizer.subject_category(subject.as_ref()))
                .collect();

            debug!(
                event = "Request",
                phase = "Retrieval",
                action = %request.action,
                actor_category = %actor_category,
                subject_categories = ?subject_categories,
                version = %snapshot.version(),
            );

            narrow(&snapshot, &request.action, &actor_category, &subject_categories)
        };
        token.check()?;

        let decision = {
            let _timer = PhaseTimer::new(&mut phases.evaluation);
            self.combine(&candidates, &request.action, ctx, token)?
        };

        debug!(
            event = "Request",
            phase = "Decision",
            action = %request.action,
            candidates = candidates.len(),
            decision = %decision,
        );

        metrics::record_evaluation(&EvaluationStats {
            duration: started.elapsed(),
            retrieval: phases.retrieval,
            evaluation: phases.evaluation,
            allowed: decision.allowed,
            action: request.action.clone(),
            candidates: candidates.len(),
        });

        Ok(decision)
    }

    /// Deny-overrides with indeterminate-as-deny, defaulting to deny when no
    /// candidate applies. The first deny in candidate order wins the message
    /// and stops further evaluation.
    fn combine(
        &self,
        candidates: &[Arc<Policy>],
        action: &str,
        ctx: &PolicyContext,
        token: &CancelToken,
    ) -> Result<Decision, PolicyError> {
        if candidates.is_empty() {
            return Ok(Decision::no_applicable_policy(action));
        }

        let mut saw_permit = false;
        let mut saw_indeterminate = false;

        for policy in candidates {
            token.check()?;
            match self.resolve_candidate(policy, ctx, token)? {
                PolicyOutcome::Deny => {
                    return Ok(Decision::denied_by(&policy.name, &policy.description));
                }
                PolicyOutcome::Permit => saw_permit = true,
                PolicyOutcome::Indeterminate => saw_indeterminate = true,
                PolicyOutcome::NotApplicable => {}
            }
        }

        if saw_indeterminate {
            Ok(Decision::indeterminate(action))
        } else if saw_permit {
            Ok(Decision::permitted())
        } else {
            Ok(Decision::no_applicable_policy(action))
        }
    }

    /// Evaluate one candidate's rule. With multiple subjects the rule runs
    /// once per subject: a permit must hold for every subject, a deny
    /// applies as soon as any subject matches.
    fn resolve_candidate(
        &self,
        policy: &Policy,
        ctx: &PolicyContext,
        token: &CancelToken,
    ) -> Result<PolicyOutcome, PolicyError> {
        let truth = if ctx.subjects().is_empty() {
            policy
                .rule
                .evaluate(&AttributeAccessor::new(ctx, None), token)?
        } else {
            let mut combined = match policy.effect {
                Effect::Permit => Truth::True,
                Effect::Deny => Truth::False,
            };
            for subject in ctx.subjects() {
                token.check()?;
                let truth = policy
                    .rule
                    .evaluate(&AttributeAccessor::new(ctx, Some(subject.as_ref())), token)?;
                combined = match policy.effect {
                    Effect::Permit => combined.and(truth),
                    Effect::Deny => combined.or(truth),
                };
                let dominated = matches!(
                    (policy.effect, combined),
                    (Effect::Permit, Truth::False) | (Effect::Deny, Truth::True)
                );
                if dominated {
                    break;
                }
            }
            combined
        };

        Ok(match truth {
            Truth::True => match policy.effect {
                Effect::Permit => PolicyOutcome::Permit,
                Effect::Deny => PolicyOutcome::Deny,
            },
            Truth::False => PolicyOutcome::NotApplicable,
            Truth::Indeterminate => PolicyOutcome::Indeterminate,
        })
    }

    /// Resolve a single policy against a context without combining.
    /// Intended for policy debugging: it answers "what would this one
    /// policy say here", independent of retrieval.
    pub fn outcome_for(
        &self,
        policy: &Policy,
        ctx: &PolicyContext,
    ) -> Result<PolicyOutcome, PolicyError> {
        self.resolve_candidate(policy, ctx, &CancelToken::new())
    }

    /// Policies in the current snapshot, in name order.
    pub fn policies(&self) -> Vec<Arc<Policy>> {
        self.inner.cache.current().policies().to_vec()
    }

    /// Look up one policy in the current snapshot.
    pub fn policy(&self, name: &str) -> Option<Arc<Policy>> {
        self.inner.cache.current().policy(name).cloned()
    }

    /// Version of the current snapshot.
    pub fn current_version(&self) -> PolicyVersion {
        self.inner.cache.current().version().clone()
    }

    /// The current snapshot itself; it stays valid (and unchanged) however
    /// long the caller holds it.
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.inner.cache.current()
    }

    /// Force a re-load through the store, bypassing the TTL.
    pub fn refresh(&self) -> Result<(), PolicyError> {
        self.inner.cache.refresh().map(|_| ())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }
}

#[cfg(test)]
mod tests;
