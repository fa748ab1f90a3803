//! In-memory policy snapshot with TTL refresh and secondary indexes.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use itertools::Itertools;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::PolicyError;
use crate::traits::{Clock, PolicyStore};
use crate::types::{Effect, Policy, PolicyVersion};

/// An immutable view of one loaded policy set.
///
/// Policies are held sorted by name; the secondary indexes map identifiers
/// to sorted sets of policy names so candidate narrowing stays a few hash
/// lookups. Snapshots are never mutated after publication, so readers share
/// them without locks.
#[derive(Debug)]
pub struct Snapshot {
    policies: Vec<Arc<Policy>>,
    by_name: HashMap<String, Arc<Policy>>,
    by_action: HashMap<String, BTreeSet<String>>,
    by_actor_category: HashMap<String, BTreeSet<String>>,
    by_subject_category: HashMap<String, BTreeSet<String>>,
    by_effect: HashMap<Effect, BTreeSet<String>>,
    any_actor: BTreeSet<String>,
    any_subject: BTreeSet<String>,
    version: PolicyVersion,
}

impl Snapshot {
    pub(crate) fn build(policies: Vec<Policy>) -> Result<Self, PolicyError> {
        let policies: Vec<Arc<Policy>> = policies
            .into_iter()
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .map(Arc::new)
            .collect();

        let mut by_name = HashMap::new();
        let mut by_action: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut by_actor_category: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut by_subject_category: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut by_effect: HashMap<Effect, BTreeSet<String>> = HashMap::new();
        let mut any_actor = BTreeSet::new();
        let mut any_subject = BTreeSet::new();

        for policy in &policies {
            if by_name
                .insert(policy.name.clone(), Arc::clone(policy))
                .is_some()
            {
                return Err(PolicyError::DuplicatePolicy(policy.name.clone()));
            }

            for action in &policy.actions {
                by_action
                    .entry(action.clone())
                    .or_default()
                    .insert(policy.name.clone());
            }
            if policy.actors.is_empty() {
                any_actor.insert(policy.name.clone());
            }
            for actor in &policy.actors {
                by_actor_category
                    .entry(actor.clone())
                    .or_default()
                    .insert(policy.name.clone());
            }
            if policy.subjects.is_empty() {
                any_subject.insert(policy.name.clone());
            }
            for subject in &policy.subjects {
                by_subject_category
                    .entry(subject.clone())
                    .or_default()
                    .insert(policy.name.clone());
            }
            by_effect
                .entry(policy.effect)
                .or_default()
                .insert(policy.name.clone());
        }

        let version = version_of(&policies);

        Ok(Self {
            policies,
            by_name,
            by_action,
            by_actor_category,
            by_subject_category,
            by_effect,
            any_actor,
            any_subject,
            version,
        })
    }

    pub fn policies(&self) -> &[Arc<Policy>] {
        &self.policies
    }

    pub fn policy(&self, name: &str) -> Option<&Arc<Policy>> {
        self.by_name.get(name)
    }

    pub fn version(&self) -> &PolicyVersion {
        &self.version
    }

    pub fn names_by_effect(&self, effect: Effect) -> Option<&BTreeSet<String>> {
        self.by_effect.get(&effect)
    }

    pub(crate) fn names_by_action(&self, action: &str) -> Option<&BTreeSet<String>> {
        self.by_action.get(action)
    }

    pub(crate) fn names_by_actor_category(&self, category: &str) -> Option<&BTreeSet<String>> {
        self.by_actor_category.get(category)
    }

    pub(crate) fn names_by_subject_category(&self, category: &str) -> Option<&BTreeSet<String>> {
        self.by_subject_category.get(category)
    }

    pub(crate) fn any_actor(&self) -> &BTreeSet<String> {
        &self.any_actor
    }

    pub(crate) fn any_subject(&self) -> &BTreeSet<String> {
        &self.any_subject
    }
}

fn version_of(policies: &[Arc<Policy>]) -> PolicyVersion {
    let metadata =
        serde_json::to_string(&policies.iter().map(Arc::as_ref).collect::<Vec<_>>())
            .unwrap_or_default();
    let loaded_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    PolicyVersion {
        hash: format!("{:x}", Sha256::digest(metadata.as_bytes())),
        loaded_at: loaded_at.to_string(),
    }
}

struct CacheState {
    snapshot: Arc<Snapshot>,
    loaded_at: Instant,
}

/// Snapshot holder with TTL-driven refresh through the store.
///
/// Reads are wait-free against the current snapshot. A stale snapshot
/// triggers a single-flight re-load: the one caller that wins the refresh
/// gate loads and installs, everyone else keeps reading the previous
/// snapshot. A failed load keeps the last good snapshot queryable and emits
/// a diagnostic.
pub(crate) struct PolicyCache {
    store: Arc<dyn PolicyStore>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    state: RwLock<CacheState>,
    refresh_gate: Mutex<()>,
}

impl PolicyCache {
    /// Eagerly loads the initial snapshot so a malformed backend fails at
    /// construction, not at the first decision.
    pub(crate) fn new(
        store: Arc<dyn PolicyStore>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PolicyError> {
        let snapshot = Arc::new(Snapshot::build(store.load_all()?)?);
        let loaded_at = clock.now();
        Ok(Self {
            store,
            ttl,
            clock,
            state: RwLock::new(CacheState {
                snapshot,
                loaded_at,
            }),
            refresh_gate: Mutex::new(()),
        })
    }

    /// Current snapshot, refreshing first when the TTL has lapsed.
    pub(crate) fn current(&self) -> Arc<Snapshot> {
        let (snapshot, stale) = {
            let state = self.state.read().expect("cache lock poisoned");
            let stale = self.clock.now().duration_since(state.loaded_at) >= self.ttl;
            (Arc::clone(&state.snapshot), stale)
        };
        if !stale {
            return snapshot;
        }

        // Single-flight: losers of the gate keep the previous snapshot.
        let Ok(_gate) = self.refresh_gate.try_lock() else {
            return snapshot;
        };

        // The winner of the previous refresh may have already installed a
        // fresh snapshot while we waited on the read lock.
        {
            let state = self.state.read().expect("cache lock poisoned");
            if self.clock.now().duration_since(state.loaded_at) < self.ttl {
                return Arc::clone(&state.snapshot);
            }
        }

        match self.reload() {
            Ok(fresh) => fresh,
            Err(err) => {
                warn!(
                    event = "Cache",
                    phase = "Refresh",
                    error = %err,
                    "policy refresh failed; serving last good snapshot"
                );
                snapshot
            }
        }
    }

    /// Unconditional re-load, used by explicit refresh requests.
    pub(crate) fn refresh(&self) -> Result<Arc<Snapshot>, PolicyError> {
        let _gate = self.refresh_gate.lock().expect("refresh gate poisoned");
        self.reload()
    }

    fn reload(&self) -> Result<Arc<Snapshot>, PolicyError> {
        let fresh = Arc::new(Snapshot::build(self.store.load_all()?)?);
        let mut state = self.state.write().expect("cache lock poisoned");
        state.snapshot = Arc::clone(&fresh);
        state.loaded_at = self.clock.now();
        debug!(
            event = "Cache",
            phase = "Refresh",
            policies = fresh.policies().len(),
            version = %fresh.version(),
            "installed policy snapshot"
        );
        crate::metrics::record_reload(fresh.policies().len());
        Ok(fresh)
    }
}
