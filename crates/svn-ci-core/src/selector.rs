//! Cross-definition trigger selection.

use crate::definition::BuildDefinition;
use crate::evaluator::StaleBranch;

/// A definition with stale branches, competing for this run's single
/// dispatch slot.
#[derive(Debug, Clone)]
pub struct TriggerCandidate {
    pub definition: BuildDefinition,
    pub build_order: i64,
    pub stale_branches: Vec<StaleBranch>,
}

/// Pick the single candidate to dispatch this run.
///
/// Lowest `buildOrder` wins; ties break by ascending definition id so the
/// outcome never depends on enumeration order. Candidates without stale
/// branches never win. Everything not selected waits for the next run: at
/// most one definition is ever dispatched per run.
pub fn select(mut candidates: Vec<TriggerCandidate>) -> Option<TriggerCandidate> {
    candidates.retain(|candidate| !candidate.stale_branches.is_empty());
    candidates.sort_by_key(|candidate| (candidate.build_order, candidate.definition.id));
    candidates.into_iter().next()
}
