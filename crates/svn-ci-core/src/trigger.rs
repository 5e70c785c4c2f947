//! One full trigger pass: enumerate, resolve, evaluate, select, dispatch.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::definition::BuildDefinition;
use crate::error::SourceResult;
use crate::evaluator::evaluate_definition;
use crate::resolver::resolve_branches;
use crate::selector::{select, TriggerCandidate};
use crate::sources::{BuildService, QueueBuildRequest, RepositorySource};

/// Outcome of dispatching one stale branch.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub branch: String,
    pub revision: i64,
    pub queued: bool,
}

/// The definition selected this run and what happened to its branches.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionReport {
    pub definition_id: u32,
    pub definition_name: String,
    pub build_order: i64,
    pub dispatches: Vec<DispatchResult>,
}

/// Report for one trigger pass.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerOutcome {
    /// Definitions that went through branch resolution and staleness
    /// evaluation.
    pub evaluated: usize,

    /// Definitions skipped by the eligibility pre-filter.
    pub skipped: usize,

    /// Whether this was a dry run.
    pub dry_run: bool,

    /// The single dispatched definition, if any was stale.
    pub selection: Option<SelectionReport>,
}

impl TriggerOutcome {
    /// Whether at least one build was actually queued.
    pub fn queued_any(&self) -> bool {
        self.selection
            .as_ref()
            .is_some_and(|selection| selection.dispatches.iter().any(|dispatch| dispatch.queued))
    }
}

/// Drives one staleness check across every definition of a project.
///
/// All "last known" state is re-derived from the remote systems on each
/// pass; nothing persists between runs.
pub struct CiTrigger {
    build_service: Arc<dyn BuildService>,
    repository: Arc<dyn RepositorySource>,
    project: String,
}

impl CiTrigger {
    pub fn new(
        build_service: Arc<dyn BuildService>,
        repository: Arc<dyn RepositorySource>,
        project: impl Into<String>,
    ) -> Self {
        CiTrigger {
            build_service,
            repository,
            project: project.into(),
        }
    }

    /// Run one trigger pass.
    ///
    /// Returns an error only when the definition inventory itself cannot be
    /// listed. Per-definition failures (branch resolution, build history)
    /// are logged and skip that definition only; per-branch dispatch
    /// failures are logged and do not block the remaining branches.
    pub async fn run_once(&self, dry_run: bool) -> SourceResult<TriggerOutcome> {
        let definitions = self.build_service.list_definitions(&self.project).await?;
        info!(
            project = %self.project,
            definitions = definitions.len(),
            "starting trigger pass"
        );

        let mut evaluated = 0;
        let mut skipped = 0;
        let mut candidates = Vec::new();

        for definition in &definitions {
            if !definition.is_ci_eligible() {
                debug!(
                    definition = %definition.name,
                    "skipping definition not eligible for CI triggering"
                );
                skipped += 1;
                continue;
            }
            evaluated += 1;
            if let Some(candidate) = self.evaluate_candidate(definition).await {
                candidates.push(candidate);
            }
        }

        let Some(winner) = select(candidates) else {
            info!(
                evaluated = evaluated,
                skipped = skipped,
                "no stale definitions, nothing to queue"
            );
            return Ok(TriggerOutcome {
                evaluated,
                skipped,
                dry_run,
                selection: None,
            });
        };

        info!(
            definition = %winner.definition.name,
            build_order = winner.build_order,
            branches = winner.stale_branches.len(),
            "selected definition for dispatch"
        );

        let mut dispatches = Vec::new();
        for branch in &winner.stale_branches {
            let request =
                QueueBuildRequest::continuous_integration(&winner.definition, &branch.path, branch.revision);
            let queued = if dry_run {
                info!(
                    definition = %winner.definition.name,
                    branch = %branch.path,
                    revision = branch.revision,
                    "dry run, build not queued"
                );
                false
            } else {
                match self.build_service.queue_build(&self.project, &request).await {
                    Ok(()) => {
                        info!(
                            definition = %winner.definition.name,
                            branch = %branch.path,
                            revision = branch.revision,
                            "queued build"
                        );
                        true
                    }
                    Err(err) => {
                        error!(
                            definition = %winner.definition.name,
                            branch = %branch.path,
                            error = %err,
                            "failed to queue build"
                        );
                        false
                    }
                }
            };
            dispatches.push(DispatchResult {
                branch: branch.path.clone(),
                revision: branch.revision,
                queued,
            });
        }

        Ok(TriggerOutcome {
            evaluated,
            skipped,
            dry_run,
            selection: Some(SelectionReport {
                definition_id: winner.definition.id,
                definition_name: winner.definition.name.clone(),
                build_order: winner.build_order,
                dispatches,
            }),
        })
    }

    /// Resolve and evaluate one eligible definition. Any failure is
    /// contained here: the definition is skipped with a warning and the
    /// rest of the pass continues.
    async fn evaluate_candidate(&self, definition: &BuildDefinition) -> Option<TriggerCandidate> {
        let branches = match resolve_branches(
            &definition.repository,
            &definition.path_filters,
            self.repository.as_ref(),
        )
        .await
        {
            Ok(branches) => branches,
            Err(err) => {
                warn!(
                    definition = %definition.name,
                    error = %err,
                    "branch resolution failed, skipping definition"
                );
                return None;
            }
        };

        let history = match self
            .build_service
            .list_builds(&self.project, definition.id)
            .await
        {
            Ok(history) => history,
            Err(err) => {
                warn!(
                    definition = %definition.name,
                    error = %err,
                    "build history unavailable, skipping definition"
                );
                return None;
            }
        };

        let stale =
            evaluate_definition(definition, &branches, &history, self.repository.as_ref()).await;
        if stale.is_empty() {
            return None;
        }

        Some(TriggerCandidate {
            build_order: definition.build_order(),
            definition: definition.clone(),
            stale_branches: stale,
        })
    }
}
