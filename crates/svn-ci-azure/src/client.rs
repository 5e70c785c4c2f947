//! REST client for the Azure DevOps build API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use svn_ci_core::{
    BuildDefinition, BuildRecord, BuildService, QueueBuildRequest, SourceError, SourceResult,
};

use crate::wire;

const API_VERSION: &str = "7.0";

/// Azure DevOps build service client authenticating with a personal access
/// token (basic auth, empty username).
pub struct AzureBuildClient {
    http: reqwest::Client,
    collection_url: String,
    pat: String,
}

impl AzureBuildClient {
    /// Create a client for one collection, e.g.
    /// `https://devops.example.com/DefaultCollection`.
    pub fn new(
        collection_url: impl Into<String>,
        personal_access_token: impl Into<String>,
    ) -> SourceResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| SourceError::request("client setup", err))?;
        Ok(AzureBuildClient {
            http,
            collection_url: collection_url.into().trim_end_matches('/').to_string(),
            pat: personal_access_token.into(),
        })
    }

    fn api_url(&self, project: &str, path: &str) -> String {
        format!("{}/{project}/_apis/{path}", self.collection_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> SourceResult<T> {
        debug!(url = %url, "GET");
        let response = self
            .http
            .get(url)
            .basic_auth("", Some(&self.pat))
            .send()
            .await
            .map_err(|err| SourceError::request(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::response(url, format!("HTTP {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| SourceError::response(url, err))
    }
}

#[async_trait]
impl BuildService for AzureBuildClient {
    /// List every build definition of the project.
    ///
    /// The list endpoint returns shallow references; each is fetched in full
    /// to get its repository, variables, and trigger configuration.
    async fn list_definitions(&self, project: &str) -> SourceResult<Vec<BuildDefinition>> {
        let url = format!(
            "{}?api-version={API_VERSION}",
            self.api_url(project, "build/definitions")
        );
        let references: wire::ListResponse<wire::DefinitionReference> = self.get_json(&url).await?;

        let mut definitions = Vec::with_capacity(references.value.len());
        for reference in references.value {
            let url = format!(
                "{}/{}?api-version={API_VERSION}",
                self.api_url(project, "build/definitions"),
                reference.id
            );
            let payload: wire::Definition = self.get_json(&url).await?;
            if let Some(definition) = payload.into_definition() {
                definitions.push(definition);
            }
        }
        Ok(definitions)
    }

    /// Builds already run for a definition, in the service's newest-first
    /// ordering.
    async fn list_builds(
        &self,
        project: &str,
        definition_id: u32,
    ) -> SourceResult<Vec<BuildRecord>> {
        let url = format!(
            "{}?definitions={definition_id}&api-version={API_VERSION}",
            self.api_url(project, "build/builds")
        );
        let builds: wire::ListResponse<wire::Build> = self.get_json(&url).await?;
        Ok(builds
            .value
            .into_iter()
            .filter_map(wire::Build::into_record)
            .collect())
    }

    async fn queue_build(&self, project: &str, request: &QueueBuildRequest) -> SourceResult<()> {
        let url = format!(
            "{}?api-version={API_VERSION}",
            self.api_url(project, "build/builds")
        );
        let body = wire::QueueBuildBody {
            definition: wire::DefinitionId {
                id: request.definition_id,
            },
            source_branch: &request.branch,
            source_version: request.revision.to_string(),
            reason: request.reason,
        };

        debug!(url = %url, branch = %request.branch, "POST");
        let response = self
            .http
            .post(&url)
            .basic_auth("", Some(&self.pat))
            .json(&body)
            .send()
            .await
            .map_err(|err| SourceError::request(&url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::response(&url, format!("HTTP {status}")));
        }
        Ok(())
    }
}
