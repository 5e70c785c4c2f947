//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `MemoryRepository` and `MemoryBuildService` that satisfy the
//! trait contracts without any remote system, plus failure injection for
//! exercising the engine's containment behavior.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::definition::BuildDefinition;
use crate::error::{SourceError, SourceResult};
use crate::history::BuildRecord;
use crate::sources::{BuildService, QueueBuildRequest, RepositorySource};

// ---------------------------------------------------------------------------
// MemoryRepository
// ---------------------------------------------------------------------------

/// In-memory repository: revisions keyed by branch path, directory listings
/// keyed by base path.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    revisions: Mutex<HashMap<String, i64>>,
    listings: Mutex<HashMap<String, Vec<String>>>,
    failing_revisions: Mutex<HashSet<String>>,
    failing_listings: Mutex<HashSet<String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_revision(&self, branch_path: &str, revision: i64) {
        let mut revisions = self.revisions.lock().unwrap();
        revisions.insert(branch_path.to_string(), revision);
    }

    pub fn set_listing(&self, base_path: &str, children: &[&str]) {
        let mut listings = self.listings.lock().unwrap();
        listings.insert(
            base_path.to_string(),
            children.iter().map(|child| child.to_string()).collect(),
        );
    }

    /// Make `latest_revision` fail for one branch path.
    pub fn fail_revision(&self, branch_path: &str) {
        let mut failing = self.failing_revisions.lock().unwrap();
        failing.insert(branch_path.to_string());
    }

    /// Make `list_child_directories` fail for one base path.
    pub fn fail_listing(&self, base_path: &str) {
        let mut failing = self.failing_listings.lock().unwrap();
        failing.insert(base_path.to_string());
    }
}

#[async_trait]
impl RepositorySource for MemoryRepository {
    async fn latest_revision(&self, repo_url: &str, branch_path: &str) -> SourceResult<i64> {
        if self.failing_revisions.lock().unwrap().contains(branch_path) {
            return Err(SourceError::request(
                format!("{repo_url}{branch_path}"),
                "injected failure",
            ));
        }
        let revisions = self.revisions.lock().unwrap();
        revisions
            .get(branch_path)
            .copied()
            .ok_or_else(|| SourceError::response(format!("{repo_url}{branch_path}"), "no such path"))
    }

    async fn list_child_directories(
        &self,
        repo_url: &str,
        base_path: &str,
    ) -> SourceResult<Vec<String>> {
        if self.failing_listings.lock().unwrap().contains(base_path) {
            return Err(SourceError::request(
                format!("{repo_url}{base_path}"),
                "injected failure",
            ));
        }
        let listings = self.listings.lock().unwrap();
        listings
            .get(base_path)
            .cloned()
            .ok_or_else(|| SourceError::response(format!("{repo_url}{base_path}"), "no such path"))
    }
}

// ---------------------------------------------------------------------------
// MemoryBuildService
// ---------------------------------------------------------------------------

/// In-memory build service: a fixed definition inventory, build history per
/// definition, and a log of queued requests.
#[derive(Debug, Default)]
pub struct MemoryBuildService {
    definitions: Mutex<Vec<BuildDefinition>>,
    builds: Mutex<HashMap<u32, Vec<BuildRecord>>>,
    queued: Mutex<Vec<QueueBuildRequest>>,
    failing_histories: Mutex<HashSet<u32>>,
    failing_queues: Mutex<HashSet<String>>,
}

impl MemoryBuildService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_definition(&self, definition: BuildDefinition) {
        let mut definitions = self.definitions.lock().unwrap();
        definitions.push(definition);
    }

    /// Record build history for a definition, newest first.
    pub fn set_builds(&self, definition_id: u32, records: Vec<BuildRecord>) {
        let mut builds = self.builds.lock().unwrap();
        builds.insert(definition_id, records);
    }

    /// Requests queued so far, in dispatch order.
    pub fn queued(&self) -> Vec<QueueBuildRequest> {
        self.queued.lock().unwrap().clone()
    }

    /// Make `list_builds` fail for one definition.
    pub fn fail_history(&self, definition_id: u32) {
        let mut failing = self.failing_histories.lock().unwrap();
        failing.insert(definition_id);
    }

    /// Make `queue_build` fail for one branch path.
    pub fn fail_queue(&self, branch: &str) {
        let mut failing = self.failing_queues.lock().unwrap();
        failing.insert(branch.to_string());
    }
}

#[async_trait]
impl BuildService for MemoryBuildService {
    async fn list_definitions(&self, _project: &str) -> SourceResult<Vec<BuildDefinition>> {
        Ok(self.definitions.lock().unwrap().clone())
    }

    async fn list_builds(
        &self,
        _project: &str,
        definition_id: u32,
    ) -> SourceResult<Vec<BuildRecord>> {
        if self.failing_histories.lock().unwrap().contains(&definition_id) {
            return Err(SourceError::request(
                format!("builds?definitions={definition_id}"),
                "injected failure",
            ));
        }
        let builds = self.builds.lock().unwrap();
        Ok(builds.get(&definition_id).cloned().unwrap_or_default())
    }

    async fn queue_build(&self, _project: &str, request: &QueueBuildRequest) -> SourceResult<()> {
        if self.failing_queues.lock().unwrap().contains(&request.branch) {
            return Err(SourceError::response("builds", "injected failure"));
        }
        let mut queued = self.queued.lock().unwrap();
        queued.push(request.clone());
        Ok(())
    }
}
