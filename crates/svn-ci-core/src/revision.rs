//! Repository revision values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Latest known revision of a repository path.
///
/// Failed lookups degrade to `Unknown` instead of a sentinel integer, and an
/// `Unknown` revision never marks a branch stale: skipping a build is safer
/// than queueing one against a revision that could not be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Revision {
    Known(i64),
    Unknown,
}

impl Revision {
    /// The revision number, if determined.
    pub fn known(self) -> Option<i64> {
        match self {
            Revision::Known(rev) => Some(rev),
            Revision::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, Revision::Known(_))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Known(rev) => write!(f, "r{rev}"),
            Revision::Unknown => write!(f, "unknown"),
        }
    }
}
