//! Build history records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A previously executed build, as recorded by the build service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Branch the build was run against.
    pub source_branch: String,

    /// Repository revision the build was run at. `None` when the service has
    /// no parseable revision for the build, which counts as "never built".
    pub source_version: Option<i64>,

    /// When the build was queued.
    pub queue_time: Option<DateTime<Utc>>,
}

impl BuildRecord {
    pub fn new(source_branch: impl Into<String>, source_version: Option<i64>) -> Self {
        BuildRecord {
            source_branch: source_branch.into(),
            source_version,
            queue_time: None,
        }
    }
}

/// Baseline revision for a branch: the recorded revision of the first build
/// in `history` whose source branch matches exactly.
///
/// The build service's own newest-first ordering is trusted; records are not
/// re-sorted here. `None` means the branch has never been built (or the
/// latest build carries no usable revision), which always compares as stale.
pub fn baseline_for_branch(history: &[BuildRecord], branch: &str) -> Option<i64> {
    history
        .iter()
        .find(|record| record.source_branch == branch)
        .and_then(|record| record.source_version)
}
