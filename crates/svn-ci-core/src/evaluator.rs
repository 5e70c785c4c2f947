//! Per-definition staleness evaluation.

use serde::Serialize;
use tracing::{info, warn};

use crate::definition::BuildDefinition;
use crate::history::{baseline_for_branch, BuildRecord};
use crate::revision::Revision;
use crate::sources::RepositorySource;

/// A branch that needs a build, with the revision to build at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleBranch {
    pub path: String,
    pub revision: i64,
}

/// Staleness rule: a branch is stale when its repository revision is
/// determined and newer than the baseline build revision. A `None` baseline
/// means the branch has never been built and is always stale; an `Unknown`
/// revision is never stale.
pub fn is_stale(latest: Revision, baseline: Option<i64>) -> bool {
    match latest {
        Revision::Known(revision) => baseline.map_or(true, |built| built < revision),
        Revision::Unknown => false,
    }
}

/// Classify every resolved branch of one definition, preserving resolver
/// order. Revision lookups that fail degrade to [`Revision::Unknown`] with a
/// warning and never classify the branch stale.
pub async fn evaluate_definition(
    definition: &BuildDefinition,
    branches: &[String],
    history: &[BuildRecord],
    source: &dyn RepositorySource,
) -> Vec<StaleBranch> {
    let mut stale = Vec::new();

    for branch in branches {
        let latest = match source
            .latest_revision(&definition.repository.url, branch)
            .await
        {
            Ok(revision) => Revision::Known(revision),
            Err(error) => {
                warn!(
                    definition = %definition.name,
                    branch = %branch,
                    error = %error,
                    "revision lookup failed, branch not considered stale"
                );
                Revision::Unknown
            }
        };

        let baseline = baseline_for_branch(history, branch);

        if is_stale(latest, baseline) {
            if let Some(revision) = latest.known() {
                info!(
                    definition = %definition.name,
                    branch = %branch,
                    last_built = ?baseline,
                    revision = revision,
                    "build required"
                );
                stale.push(StaleBranch {
                    path: branch.clone(),
                    revision,
                });
            }
        } else {
            info!(
                definition = %definition.name,
                branch = %branch,
                last_built = ?baseline,
                revision = %latest,
                "build up to date"
            );
        }
    }

    stale
}
