//! Build definition model and trigger configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Definition variable holding the dispatch priority (lower wins).
pub const BUILD_ORDER_VARIABLE: &str = "buildOrder";

/// Definition variable enabling or disabling CI triggering.
pub const BUILD_CI_VARIABLE: &str = "buildCI";

/// Version-control system backing a definition's repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepositoryKind {
    Subversion,
    /// Any repository type this trigger does not handle.
    Other(String),
}

impl RepositoryKind {
    /// Parse the repository `type` string reported by the build service.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "Svn" => RepositoryKind::Subversion,
            other => RepositoryKind::Other(other.to_string()),
        }
    }
}

/// Reference to the repository a definition builds from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub kind: RepositoryKind,

    /// Repository base URL. Always carries a trailing slash so branch paths
    /// can be appended directly.
    pub url: String,

    /// Branch evaluated when the definition declares no include filters.
    pub default_branch: String,
}

impl RepositoryRef {
    pub fn new(
        kind: RepositoryKind,
        url: impl Into<String>,
        default_branch: impl Into<String>,
    ) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        RepositoryRef {
            kind,
            url,
            default_branch: default_branch.into(),
        }
    }
}

/// Whether a path filter adds or removes branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterAction {
    Include,
    Exclude,
}

/// A signed path filter from a definition's CI trigger.
///
/// Patterns ending in `/` or `/*` are directory filters and match every
/// immediate child directory under the base path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFilter {
    pub action: FilterAction,
    pub pattern: String,
}

impl PathFilter {
    pub fn include(pattern: impl Into<String>) -> Self {
        PathFilter {
            action: FilterAction::Include,
            pattern: pattern.into(),
        }
    }

    pub fn exclude(pattern: impl Into<String>) -> Self {
        PathFilter {
            action: FilterAction::Exclude,
            pattern: pattern.into(),
        }
    }

    /// Parse a raw `+path` / `-path` filter string.
    ///
    /// Returns `None` for strings without a sign prefix; callers drop those
    /// with a warning.
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(pattern) = raw.strip_prefix('+') {
            Some(PathFilter::include(pattern))
        } else if let Some(pattern) = raw.strip_prefix('-') {
            Some(PathFilter::exclude(pattern))
        } else {
            None
        }
    }

    /// Whether this filter matches child directories rather than a literal path.
    pub fn is_directory_filter(&self) -> bool {
        self.pattern.ends_with('/') || self.pattern.ends_with("/*")
    }

    /// Base path of a directory filter: the pattern with a trailing `*`
    /// stripped, keeping the trailing slash.
    pub fn directory_base(&self) -> &str {
        self.pattern.trim_end_matches('*')
    }
}

/// A build definition as reported by the build service, immutable for the
/// duration of one trigger pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildDefinition {
    pub id: u32,
    pub name: String,
    pub repository: RepositoryRef,

    /// Path filters of the definition's CI trigger, in declaration order.
    pub path_filters: Vec<PathFilter>,

    /// String-keyed variable bag. Only `buildOrder` and `buildCI` are read.
    pub variables: BTreeMap<String, String>,
}

impl BuildDefinition {
    /// Dispatch priority from the `buildOrder` variable; lower sorts first.
    /// Unset or unparseable values fall back to 0.
    pub fn build_order(&self) -> i64 {
        match self.variables.get(BUILD_ORDER_VARIABLE) {
            None => 0,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(
                    definition = %self.name,
                    value = %raw,
                    "unparseable buildOrder variable, using default 0"
                );
                0
            }),
        }
    }

    /// Whether the `buildCI` variable allows automatic triggering.
    /// Unset or unparseable values fall back to enabled.
    pub fn ci_enabled(&self) -> bool {
        match self.variables.get(BUILD_CI_VARIABLE) {
            None => true,
            Some(raw) => raw.trim().to_ascii_lowercase().parse().unwrap_or_else(|_| {
                warn!(
                    definition = %self.name,
                    value = %raw,
                    "unparseable buildCI variable, treating as enabled"
                );
                true
            }),
        }
    }

    /// Eligibility pre-filter: only Subversion-backed definitions with CI
    /// enabled are ever evaluated.
    pub fn is_ci_eligible(&self) -> bool {
        self.repository.kind == RepositoryKind::Subversion && self.ci_enabled()
    }
}
