//! Authenticated client for the pipeline service REST API.
//!
//! Covers the handful of v1beta1 operations the demos exercise: experiment
//! get-or-create, run submission, pipeline id lookup, package upload, and
//! version listing. Every request carries the bearer token the client was
//! constructed with; authorization failures come back as `ClientError::Api`
//! with whatever the service said.

pub mod types;

pub use types::{
    CreateRunRequest, Experiment, ListExperimentsResponse, ListPipelineVersionsResponse,
    ListPipelinesResponse, PipelineSpecPayload, PipelineSummary, PipelineVersion, ResourceKey,
    ResourceReference, Run, RunDetail, RunParameter,
};

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::multipart;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::fs;
use tracing::{debug, info};

use crate::compiler::TektonCompiler;
use crate::error::ClientError;
use crate::pipeline::Pipeline;

const API_PREFIX: &str = "apis/v1beta1";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const VERSION_PAGE_SIZE: u32 = 10;

/// Client for a pipeline service host.
#[derive(Debug, Clone)]
pub struct TektonClient {
    host: String,
    token: String,
    http: Client,
}

impl TektonClient {
    /// Create a client for `host`, authenticating every request with an
    /// existing bearer token.
    pub fn new(host: impl Into<String>, existing_token: impl Into<String>) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            token: existing_token.into(),
            http: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .user_agent(format!("pipekit/{}", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// The host this client talks to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Look up an experiment by exact name.
    pub async fn get_experiment(&self, name: &str) -> Result<Option<Experiment>, ClientError> {
        let url = format!(
            "{}?filter={}",
            self.url("experiments"),
            urlencoding::encode(&name_equals_filter(name))
        );
        let response: ListExperimentsResponse = self.get_json(&url).await?;
        Ok(response.experiments.into_iter().find(|e| e.name == name))
    }

    /// Get or create an experiment.
    ///
    /// Returns the existing record when one with that name is already
    /// registered.
    pub async fn create_experiment(&self, name: &str) -> Result<Experiment, ClientError> {
        if let Some(existing) = self.get_experiment(name).await? {
            debug!(name = %name, id = %existing.id, "experiment already exists");
            return Ok(existing);
        }

        info!(name = %name, "creating experiment");
        let response = self
            .http
            .post(self.url("experiments"))
            .bearer_auth(&self.token)
            .json(&json!({ "name": name }))
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        Self::parse_json(response).await
    }

    /// Submit a run executing `workflow_manifest` under an experiment.
    pub async fn run_pipeline(
        &self,
        experiment_id: &str,
        run_name: &str,
        workflow_manifest: impl Into<String>,
        parameters: Vec<RunParameter>,
    ) -> Result<RunDetail, ClientError> {
        let request = CreateRunRequest {
            name: run_name.to_string(),
            pipeline_spec: PipelineSpecPayload {
                workflow_manifest: workflow_manifest.into(),
                parameters,
            },
            resource_references: vec![ResourceReference::experiment_owner(experiment_id)],
        };

        info!(run = %run_name, experiment = %experiment_id, "submitting run");
        let response = self
            .http
            .post(self.url("runs"))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        Self::parse_json(response).await
    }

    /// Compile a definition in memory and submit it as a run.
    ///
    /// The experiment is created if absent and the run is stamped
    /// `"<pipeline name> <YYYY-MM-DD HH-MM-SS>"` (UTC).
    pub async fn create_run_from_pipeline(
        &self,
        pipeline: &Pipeline,
        arguments: &[(&str, &str)],
        experiment_name: &str,
    ) -> Result<RunDetail, ClientError> {
        let manifest = TektonCompiler::new().compile_to_string(pipeline)?;
        let experiment = self.create_experiment(experiment_name).await?;

        let parameters = arguments
            .iter()
            .map(|(name, value)| RunParameter {
                name: (*name).to_string(),
                value: (*value).to_string(),
            })
            .collect();
        let detail = self
            .run_pipeline(
                &experiment.id,
                &run_name(&pipeline.name, Utc::now()),
                manifest,
                parameters,
            )
            .await?;
        info!(run_id = %detail.run.id, "run created");
        Ok(detail)
    }

    /// Resolve a registered pipeline's id by exact name.
    ///
    /// `None` when no pipeline has that name; an error when more than one
    /// does.
    pub async fn get_pipeline_id(&self, name: &str) -> Result<Option<String>, ClientError> {
        let url = format!(
            "{}?filter={}",
            self.url("pipelines"),
            urlencoding::encode(&name_equals_filter(name))
        );
        let response: ListPipelinesResponse = self.get_json(&url).await?;
        let mut matching: Vec<PipelineSummary> = response
            .pipelines
            .into_iter()
            .filter(|p| p.name == name)
            .collect();
        match matching.len() {
            0 => Ok(None),
            1 => Ok(Some(matching.remove(0).id)),
            count => Err(ClientError::AmbiguousPipelineName {
                name: name.to_string(),
                count,
            }),
        }
    }

    /// Register a new pipeline from a compiled package file.
    pub async fn upload_pipeline(
        &self,
        package_path: impl AsRef<Path>,
        name: &str,
    ) -> Result<PipelineSummary, ClientError> {
        let url = format!(
            "{}?name={}",
            self.url("pipelines/upload"),
            urlencoding::encode(name)
        );
        self.upload_package(&url, package_path.as_ref()).await
    }

    /// Attach a new version to an already-registered pipeline.
    pub async fn upload_pipeline_version(
        &self,
        package_path: impl AsRef<Path>,
        version_name: &str,
        pipeline_id: &str,
    ) -> Result<PipelineVersion, ClientError> {
        let url = format!(
            "{}?name={}&pipelineid={}",
            self.url("pipelines/upload_version"),
            urlencoding::encode(version_name),
            urlencoding::encode(pipeline_id)
        );
        self.upload_package(&url, package_path.as_ref()).await
    }

    /// List the versions attached to a pipeline.
    pub async fn list_pipeline_versions(
        &self,
        pipeline_id: &str,
    ) -> Result<ListPipelineVersionsResponse, ClientError> {
        let url = format!(
            "{}?resource_key.type=PIPELINE&resource_key.id={}&page_size={}",
            self.url("pipeline_versions"),
            urlencoding::encode(pipeline_id),
            VERSION_PAGE_SIZE
        );
        self.get_json(&url).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.host, API_PREFIX, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        debug!(url = %url, "GET");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        Self::parse_json(response).await
    }

    /// Multipart-upload a package file (`uploadfile` part) and parse the
    /// resource the service returns.
    async fn upload_package<T: DeserializeOwned>(
        &self,
        url: &str,
        package_path: &Path,
    ) -> Result<T, ClientError> {
        let bytes = fs::read(package_path).await?;
        let file_name = package_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pipeline.yaml".to_string());
        let form = multipart::Form::new().part(
            "uploadfile",
            multipart::Part::bytes(bytes).file_name(file_name),
        );

        info!(package = %package_path.display(), "uploading package");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        Self::parse_json(response).await
    }

    async fn parse_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))
    }
}

/// The service's JSON filter expression for exact name equality.
fn name_equals_filter(name: &str) -> String {
    json!({
        "predicates": [{
            "key": "name",
            "op": 1,
            "stringValue": name,
        }]
    })
    .to_string()
}

/// Run name stamp: `<pipeline name> <YYYY-MM-DD HH-MM-SS>`.
fn run_name(pipeline_name: &str, now: DateTime<Utc>) -> String {
    format!("{} {}", pipeline_name, now.format("%Y-%m-%d %H-%M-%S"))
}
