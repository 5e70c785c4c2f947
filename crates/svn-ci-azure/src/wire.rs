//! Serde mappings for the Azure DevOps build REST payloads.
//!
//! These types mirror the wire format only; conversions into the core
//! domain model live here so the client stays free of field-level fiddling.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use svn_ci_core::{BuildDefinition, BuildRecord, PathFilter, RepositoryKind, RepositoryRef};

/// Trigger type marker for continuous integration triggers.
const CI_TRIGGER_TYPE: &str = "continuousIntegration";

/// Generic `{ "count": n, "value": [...] }` list envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    pub value: Vec<T>,
}

/// Entry of the definition list endpoint; only the id is needed before the
/// full definition is fetched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DefinitionReference {
    pub id: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Definition {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub repository: Option<Repository>,
    #[serde(default)]
    pub variables: BTreeMap<String, Variable>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Repository {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Variable {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Trigger {
    #[serde(default)]
    pub trigger_type: Option<String>,
    #[serde(default)]
    pub path_filters: Vec<String>,
}

impl Definition {
    /// Convert the payload into the domain model.
    ///
    /// Definitions without a repository block cannot be evaluated and map to
    /// `None`. Path filters come from the continuous integration trigger;
    /// filter strings without a `+`/`-` sign are dropped with a warning.
    pub(crate) fn into_definition(self) -> Option<BuildDefinition> {
        let repository = match self.repository {
            Some(repository) => repository,
            None => {
                warn!(definition = %self.name, "definition has no repository, ignoring");
                return None;
            }
        };

        let kind = RepositoryKind::from_type_name(repository.kind.as_deref().unwrap_or_default());
        let url = match repository.url {
            Some(url) => url,
            None => {
                warn!(definition = %self.name, "repository has no URL, ignoring definition");
                return None;
            }
        };
        let default_branch = repository.default_branch.unwrap_or_default();

        let path_filters = self
            .triggers
            .iter()
            .find(|trigger| trigger.trigger_type.as_deref() == Some(CI_TRIGGER_TYPE))
            .map(|trigger| {
                trigger
                    .path_filters
                    .iter()
                    .filter_map(|raw| {
                        let parsed = PathFilter::parse(raw);
                        if parsed.is_none() {
                            warn!(
                                definition = %self.name,
                                filter = %raw,
                                "ignoring path filter without a +/- sign"
                            );
                        }
                        parsed
                    })
                    .collect()
            })
            .unwrap_or_default();

        let variables = self
            .variables
            .into_iter()
            .filter_map(|(name, variable)| variable.value.map(|value| (name, value)))
            .collect();

        Some(BuildDefinition {
            id: self.id,
            name: self.name,
            repository: RepositoryRef::new(kind, url, default_branch),
            path_filters,
            variables,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Build {
    #[serde(default)]
    pub source_branch: Option<String>,
    #[serde(default)]
    pub source_version: Option<String>,
    #[serde(default)]
    pub queue_time: Option<DateTime<Utc>>,
}

impl Build {
    /// Builds without a source branch cannot participate in staleness
    /// comparison and map to `None`. An unparseable source version maps to
    /// a record with no revision, which counts as never built.
    pub(crate) fn into_record(self) -> Option<BuildRecord> {
        let source_branch = self.source_branch?;
        Some(BuildRecord {
            source_branch,
            source_version: self.source_version.and_then(|raw| raw.parse().ok()),
            queue_time: self.queue_time,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueueBuildBody<'a> {
    pub definition: DefinitionId,
    pub source_branch: &'a str,
    pub source_version: String,
    pub reason: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct DefinitionId {
    pub id: u32,
}
