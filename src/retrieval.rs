//! Candidate narrowing: from a snapshot to the policies worth evaluating.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::cache::Snapshot;
use crate::types::Policy;

/// Narrow the snapshot to the candidate policies for one request.
///
/// Single pass over the indexes: seed with the action index, then keep
/// policies whose declared actor/subject categories intersect the request's
/// (a policy with an empty declared dimension matches any value in it).
/// Environment keys are not narrowed here; expressions consume them during
/// evaluation. Candidates come back deduplicated in name order, so decisions
/// are reproducible.
pub(crate) fn candidates(
    snapshot: &Snapshot,
    action: &str,
    actor_category: &str,
    subject_categories: &BTreeSet<String>,
) -> Vec<Arc<Policy>> {
    let Some(seed) = snapshot.names_by_action(action) else {
        return Vec::new();
    };

    let actor_declared = snapshot.names_by_actor_category(actor_category);
    let actor_matches = |name: &String| {
        snapshot.any_actor().contains(name)
            || actor_declared.is_some_and(|names| names.contains(name))
    };

    let subject_matches = |name: &String| {
        snapshot.any_subject().contains(name)
            || subject_categories.iter().any(|category| {
                snapshot
                    .names_by_subject_category(category)
                    .is_some_and(|names| names.contains(name))
            })
    };

    // BTreeSet iteration keeps the name ordering stable.
    seed.iter()
        .filter(|name| actor_matches(name) && subject_matches(name))
        .filter_map(|name| snapshot.policy(name).cloned())
        .collect()
}
