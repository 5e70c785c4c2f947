//! Subversion repository adapter.
//!
//! Implements [`svn_ci_core::RepositorySource`] by shelling out to the `svn`
//! command-line client: `svn info` for the latest changed revision of a
//! branch path, `svn list` to enumerate child directories under a wildcard
//! base path.

mod client;

pub use client::SvnCliClient;
