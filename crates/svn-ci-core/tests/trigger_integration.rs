//! Integration tests for the trigger engine over the in-memory fakes.

use std::collections::BTreeMap;
use std::sync::Arc;

use svn_ci_core::fakes::{MemoryBuildService, MemoryRepository};
use svn_ci_core::{
    BuildDefinition, BuildRecord, CiTrigger, PathFilter, RepositoryKind, RepositoryRef, CI_REASON,
};

const REPO_URL: &str = "https://svn.example.com/repo/";

fn definition(
    id: u32,
    name: &str,
    path_filters: Vec<PathFilter>,
    variables: &[(&str, &str)],
) -> BuildDefinition {
    BuildDefinition {
        id,
        name: name.to_string(),
        repository: RepositoryRef::new(RepositoryKind::Subversion, REPO_URL, "trunk"),
        path_filters,
        variables: variables
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

fn trigger(builds: Arc<MemoryBuildService>, repo: Arc<MemoryRepository>) -> CiTrigger {
    CiTrigger::new(builds, repo, "Fabrikam")
}

/// Test: default branch ahead of its last build queues exactly one build.
#[tokio::test]
async fn test_stale_default_branch_queues_single_build() {
    let builds = Arc::new(MemoryBuildService::new());
    let repo = Arc::new(MemoryRepository::new());

    builds.add_definition(definition(1, "nightly", Vec::new(), &[]));
    builds.set_builds(1, vec![BuildRecord::new("trunk", Some(40))]);
    repo.set_revision("trunk", 42);

    let outcome = trigger(builds.clone(), repo)
        .run_once(false)
        .await
        .expect("trigger pass failed");

    assert!(outcome.queued_any());
    let queued = builds.queued();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].definition_id, 1);
    assert_eq!(queued[0].branch, "trunk");
    assert_eq!(queued[0].revision, 42);
    assert_eq!(queued[0].reason, CI_REASON);
}

/// Test: a definition whose last build matches the repository revision is
/// never re-queued (running twice with no new commits is a no-op).
#[tokio::test]
async fn test_up_to_date_definition_queues_nothing() {
    let builds = Arc::new(MemoryBuildService::new());
    let repo = Arc::new(MemoryRepository::new());

    builds.add_definition(definition(1, "nightly", Vec::new(), &[]));
    builds.set_builds(1, vec![BuildRecord::new("trunk", Some(42))]);
    repo.set_revision("trunk", 42);

    let outcome = trigger(builds.clone(), repo)
        .run_once(false)
        .await
        .expect("trigger pass failed");

    assert!(!outcome.queued_any());
    assert!(outcome.selection.is_none());
    assert!(builds.queued().is_empty());
    assert_eq!(outcome.evaluated, 1);
}

/// Test: all children of a wildcard include with no prior builds are
/// dispatched together for the one selected definition.
#[tokio::test]
async fn test_wildcard_children_dispatch_together() {
    let builds = Arc::new(MemoryBuildService::new());
    let repo = Arc::new(MemoryRepository::new());

    builds.add_definition(definition(
        1,
        "features",
        vec![PathFilter::include("branches/*")],
        &[],
    ));
    repo.set_listing("branches/", &["feature-a", "feature-b"]);
    repo.set_revision("branches/feature-a", 10);
    repo.set_revision("branches/feature-b", 12);

    let outcome = trigger(builds.clone(), repo)
        .run_once(false)
        .await
        .expect("trigger pass failed");

    assert!(outcome.queued_any());
    let queued = builds.queued();
    assert_eq!(queued.len(), 2);
    assert_eq!(queued[0].branch, "branches/feature-a");
    assert_eq!(queued[0].revision, 10);
    assert_eq!(queued[1].branch, "branches/feature-b");
    assert_eq!(queued[1].revision, 12);
}

/// Test: with two stale definitions only the lower buildOrder is dispatched;
/// the other stays stale for the next run.
#[tokio::test]
async fn test_only_lowest_build_order_dispatches() {
    let builds = Arc::new(MemoryBuildService::new());
    let repo = Arc::new(MemoryRepository::new());

    builds.add_definition(definition(1, "second", Vec::new(), &[("buildOrder", "2")]));
    builds.add_definition(definition(2, "first", Vec::new(), &[("buildOrder", "1")]));
    repo.set_revision("trunk", 42);

    let outcome = trigger(builds.clone(), repo)
        .run_once(false)
        .await
        .expect("trigger pass failed");

    let selection = outcome.selection.expect("a definition should be selected");
    assert_eq!(selection.definition_name, "first");
    let queued = builds.queued();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].definition_id, 2);
    assert_eq!(outcome.evaluated, 2);
}

/// Test: equal buildOrder breaks the tie by definition id.
#[tokio::test]
async fn test_equal_build_order_ties_break_by_id() {
    let builds = Arc::new(MemoryBuildService::new());
    let repo = Arc::new(MemoryRepository::new());

    builds.add_definition(definition(7, "seven", Vec::new(), &[]));
    builds.add_definition(definition(3, "three", Vec::new(), &[]));
    repo.set_revision("trunk", 42);

    let outcome = trigger(builds.clone(), repo)
        .run_once(false)
        .await
        .expect("trigger pass failed");

    assert_eq!(outcome.selection.unwrap().definition_id, 3);
}

/// Test: buildCI=false definitions are never evaluated, even when stale.
#[tokio::test]
async fn test_disabled_ci_definition_is_skipped() {
    let builds = Arc::new(MemoryBuildService::new());
    let repo = Arc::new(MemoryRepository::new());

    builds.add_definition(definition(1, "nightly", Vec::new(), &[("buildCI", "false")]));
    repo.set_revision("trunk", 42);

    let outcome = trigger(builds.clone(), repo)
        .run_once(false)
        .await
        .expect("trigger pass failed");

    assert!(builds.queued().is_empty());
    assert_eq!(outcome.evaluated, 0);
    assert_eq!(outcome.skipped, 1);
}

/// Test: non-Subversion repositories are filtered out before evaluation.
#[tokio::test]
async fn test_non_subversion_definition_is_skipped() {
    let builds = Arc::new(MemoryBuildService::new());
    let repo = Arc::new(MemoryRepository::new());

    let mut git_definition = definition(1, "git-build", Vec::new(), &[]);
    git_definition.repository.kind = RepositoryKind::Other("TfsGit".to_string());
    builds.add_definition(git_definition);
    repo.set_revision("trunk", 42);

    let outcome = trigger(builds.clone(), repo)
        .run_once(false)
        .await
        .expect("trigger pass failed");

    assert!(builds.queued().is_empty());
    assert_eq!(outcome.skipped, 1);
}

/// Test: a failed revision lookup degrades to an unknown revision and never
/// triggers a build.
#[tokio::test]
async fn test_undetermined_revision_never_triggers() {
    let builds = Arc::new(MemoryBuildService::new());
    let repo = Arc::new(MemoryRepository::new());

    builds.add_definition(definition(1, "nightly", Vec::new(), &[]));
    repo.fail_revision("trunk");

    let outcome = trigger(builds.clone(), repo)
        .run_once(false)
        .await
        .expect("trigger pass failed");

    assert!(builds.queued().is_empty());
    assert!(outcome.selection.is_none());
}

/// Test: a wildcard listing failure skips that definition only; others are
/// still evaluated and can dispatch.
#[tokio::test]
async fn test_resolution_failure_contained_to_one_definition() {
    let builds = Arc::new(MemoryBuildService::new());
    let repo = Arc::new(MemoryRepository::new());

    builds.add_definition(definition(
        1,
        "broken",
        vec![PathFilter::include("branches/*")],
        &[],
    ));
    builds.add_definition(definition(2, "healthy", Vec::new(), &[]));
    repo.fail_listing("branches/");
    repo.set_revision("trunk", 42);

    let outcome = trigger(builds.clone(), repo)
        .run_once(false)
        .await
        .expect("trigger pass failed");

    let queued = builds.queued();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].definition_id, 2);
    assert_eq!(outcome.evaluated, 2);
}

/// Test: a build history failure skips that definition only.
#[tokio::test]
async fn test_history_failure_contained_to_one_definition() {
    let builds = Arc::new(MemoryBuildService::new());
    let repo = Arc::new(MemoryRepository::new());

    builds.add_definition(definition(1, "broken", Vec::new(), &[]));
    builds.add_definition(definition(2, "healthy", Vec::new(), &[]));
    builds.fail_history(1);
    repo.set_revision("trunk", 42);

    let outcome = trigger(builds.clone(), repo)
        .run_once(false)
        .await
        .expect("trigger pass failed");

    let queued = builds.queued();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].definition_id, 2);
}

/// Test: one branch failing to queue does not block the remaining branches
/// of the same selection.
#[tokio::test]
async fn test_dispatch_failure_does_not_block_remaining_branches() {
    let builds = Arc::new(MemoryBuildService::new());
    let repo = Arc::new(MemoryRepository::new());

    builds.add_definition(definition(
        1,
        "features",
        vec![PathFilter::include("branches/*")],
        &[],
    ));
    repo.set_listing("branches/", &["feature-a", "feature-b"]);
    repo.set_revision("branches/feature-a", 10);
    repo.set_revision("branches/feature-b", 12);
    builds.fail_queue("branches/feature-a");

    let outcome = trigger(builds.clone(), repo)
        .run_once(false)
        .await
        .expect("trigger pass failed");

    let queued = builds.queued();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].branch, "branches/feature-b");

    let selection = outcome.selection.unwrap();
    assert_eq!(selection.dispatches.len(), 2);
    assert!(!selection.dispatches[0].queued);
    assert!(selection.dispatches[1].queued);
}

/// Test: dry run reports the selection but queues nothing.
#[tokio::test]
async fn test_dry_run_queues_nothing() {
    let builds = Arc::new(MemoryBuildService::new());
    let repo = Arc::new(MemoryRepository::new());

    builds.add_definition(definition(1, "nightly", Vec::new(), &[]));
    repo.set_revision("trunk", 42);

    let outcome = trigger(builds.clone(), repo)
        .run_once(true)
        .await
        .expect("trigger pass failed");

    assert!(builds.queued().is_empty());
    assert!(!outcome.queued_any());
    let selection = outcome.selection.expect("selection should still be reported");
    assert_eq!(selection.definition_name, "nightly");
    assert_eq!(selection.dispatches.len(), 1);
    assert!(!selection.dispatches[0].queued);
}

/// Test: literal excludes prune resolved branches; directory excludes are
/// ignored end to end.
#[tokio::test]
async fn test_exclude_filters_applied_during_pass() {
    let builds = Arc::new(MemoryBuildService::new());
    let repo = Arc::new(MemoryRepository::new());

    builds.add_definition(definition(
        1,
        "features",
        vec![
            PathFilter::include("branches/*"),
            PathFilter::exclude("branches/feature-b"),
            PathFilter::exclude("branches/*"),
        ],
        &[],
    ));
    repo.set_listing("branches/", &["feature-a", "feature-b"]);
    repo.set_revision("branches/feature-a", 10);
    repo.set_revision("branches/feature-b", 12);

    let outcome = trigger(builds.clone(), repo)
        .run_once(false)
        .await
        .expect("trigger pass failed");

    assert!(outcome.queued_any());
    let queued = builds.queued();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].branch, "branches/feature-a");
}
