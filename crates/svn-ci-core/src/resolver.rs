//! Expands a definition's path filters into concrete branch paths.

use tracing::debug;

use crate::definition::{FilterAction, PathFilter, RepositoryRef};
use crate::error::ResolveError;
use crate::sources::RepositorySource;

/// Resolve the branches a definition's CI trigger watches.
///
/// Include filters are processed in declaration order: literals are appended
/// as-is, directory filters are expanded to the immediate child directories
/// under their base path. Exclude filters then remove exact literal matches.
/// Directory excludes never remove anything; existing trigger configurations
/// rely on that behavior, so it is preserved here.
///
/// The result is deduplicated and insertion-ordered. With no include filters
/// at all, the repository's default branch is the only branch watched.
///
/// A failed directory listing aborts resolution for the whole definition
/// rather than skipping the wildcard, so a flaky repository can never shrink
/// the watched set unnoticed.
pub async fn resolve_branches(
    repository: &RepositoryRef,
    filters: &[PathFilter],
    source: &dyn RepositorySource,
) -> Result<Vec<String>, ResolveError> {
    let includes: Vec<&PathFilter> = filters
        .iter()
        .filter(|filter| filter.action == FilterAction::Include)
        .collect();

    if includes.is_empty() {
        return Ok(vec![repository.default_branch.clone()]);
    }

    let mut branches: Vec<String> = Vec::new();
    for filter in includes {
        if filter.is_directory_filter() {
            let base = filter.directory_base();
            let children = source
                .list_child_directories(&repository.url, base)
                .await
                .map_err(|source| ResolveError::Listing {
                    base: base.to_string(),
                    source,
                })?;
            debug!(
                base = %base,
                children = children.len(),
                "expanded directory filter"
            );
            for child in children {
                let path = format!("{base}{}", child.trim_end_matches('/'));
                push_unique(&mut branches, path);
            }
        } else {
            push_unique(&mut branches, filter.pattern.clone());
        }
    }

    for filter in filters
        .iter()
        .filter(|filter| filter.action == FilterAction::Exclude)
    {
        if !filter.is_directory_filter() {
            branches.retain(|branch| branch != &filter.pattern);
        }
    }

    Ok(branches)
}

fn push_unique(branches: &mut Vec<String>, path: String) {
    if !branches.contains(&path) {
        branches.push(path);
    }
}
