//! Collaborator traits for the remote build service and source repository.
//!
//! Implementations own authentication, timeouts, and retries; the engine
//! treats every failure as a plain [`SourceError`].

use async_trait::async_trait;
use serde::Serialize;

use crate::definition::BuildDefinition;
use crate::error::SourceResult;
use crate::history::BuildRecord;

/// Dispatch reason recorded on queued builds.
pub const CI_REASON: &str = "individualCI";

/// Read access to the source repository.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Latest committed revision for `branch_path` under `repo_url`.
    async fn latest_revision(&self, repo_url: &str, branch_path: &str) -> SourceResult<i64>;

    /// Names of the immediate child directories under `base_path`, without
    /// trailing separators.
    async fn list_child_directories(
        &self,
        repo_url: &str,
        base_path: &str,
    ) -> SourceResult<Vec<String>>;
}

/// Build queue request for one stale branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueBuildRequest {
    pub definition_id: u32,
    pub definition_name: String,
    pub branch: String,
    pub revision: i64,
    pub reason: &'static str,
}

impl QueueBuildRequest {
    /// Request triggered by continuous integration.
    pub fn continuous_integration(definition: &BuildDefinition, branch: &str, revision: i64) -> Self {
        QueueBuildRequest {
            definition_id: definition.id,
            definition_name: definition.name.clone(),
            branch: branch.to_string(),
            revision,
            reason: CI_REASON,
        }
    }
}

/// The build system: definition inventory, build history, and queueing.
#[async_trait]
pub trait BuildService: Send + Sync {
    /// All build definitions configured in `project`.
    async fn list_definitions(&self, project: &str) -> SourceResult<Vec<BuildDefinition>>;

    /// Builds already run for a definition, newest first.
    async fn list_builds(&self, project: &str, definition_id: u32) -> SourceResult<Vec<BuildRecord>>;

    /// Enqueue one build.
    async fn queue_build(&self, project: &str, request: &QueueBuildRequest) -> SourceResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{RepositoryKind, RepositoryRef};
    use std::collections::BTreeMap;

    #[test]
    fn ci_request_carries_reason_and_identity() {
        let definition = BuildDefinition {
            id: 12,
            name: "nightly".to_string(),
            repository: RepositoryRef::new(
                RepositoryKind::Subversion,
                "https://svn.example.com/repo",
                "trunk",
            ),
            path_filters: Vec::new(),
            variables: BTreeMap::new(),
        };

        let request = QueueBuildRequest::continuous_integration(&definition, "trunk", 42);
        assert_eq!(request.definition_id, 12);
        assert_eq!(request.definition_name, "nightly");
        assert_eq!(request.branch, "trunk");
        assert_eq!(request.revision, 42);
        assert_eq!(request.reason, CI_REASON);
    }
}
