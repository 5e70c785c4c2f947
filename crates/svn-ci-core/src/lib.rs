//! SVN CI Core - staleness detection and trigger selection
//!
//! Decides, per invocation, whether any Subversion-backed build definition
//! is stale relative to its repository and which single definition gets its
//! builds queued:
//! - Expands a definition's CI path filters into concrete branch paths
//! - Compares each branch's latest repository revision against the most
//!   recent build recorded for that branch
//! - Selects the stale definition with the lowest build order and dispatches
//!   one queue request per stale branch
//!
//! Remote systems sit behind the [`BuildService`] and [`RepositorySource`]
//! traits; this crate never touches wire formats.

pub mod definition;
pub mod error;
pub mod evaluator;
pub mod fakes;
pub mod history;
pub mod resolver;
pub mod revision;
pub mod selector;
pub mod sources;
pub mod telemetry;
pub mod trigger;

// Re-export key types
pub use definition::{BuildDefinition, FilterAction, PathFilter, RepositoryKind, RepositoryRef};
pub use error::{ResolveError, SourceError, SourceResult};
pub use evaluator::{evaluate_definition, is_stale, StaleBranch};
pub use history::{baseline_for_branch, BuildRecord};
pub use resolver::resolve_branches;
pub use revision::Revision;
pub use selector::{select, TriggerCandidate};
pub use sources::{BuildService, QueueBuildRequest, RepositorySource, CI_REASON};
pub use telemetry::init_tracing;
pub use trigger::{CiTrigger, DispatchResult, SelectionReport, TriggerOutcome};
