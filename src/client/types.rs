//! Resource types for the pipeline service REST API (v1beta1).
//!
//! Response types deserialize permissively: every field is defaulted so the
//! client keeps working when the service omits fields or adds new ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An experiment: the grouping runs are submitted under.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Experiment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Page of experiments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListExperimentsResponse {
    #[serde(default)]
    pub experiments: Vec<Experiment>,
    #[serde(default)]
    pub total_size: i32,
    #[serde(default)]
    pub next_page_token: String,
}

/// A `{name, value}` run argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameter {
    pub name: String,
    pub value: String,
}

/// The manifest and arguments a run executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpecPayload {
    #[serde(default)]
    pub workflow_manifest: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RunParameter>,
}

/// Typed key identifying an API resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceKey {
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub id: String,
}

/// Reference binding a resource to a related resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceReference {
    #[serde(default)]
    pub key: ResourceKey,
    #[serde(default)]
    pub relationship: String,
}

impl ResourceReference {
    /// OWNER reference attaching a run to an experiment.
    pub fn experiment_owner(experiment_id: impl Into<String>) -> Self {
        Self {
            key: ResourceKey {
                resource_type: "EXPERIMENT".to_string(),
                id: experiment_id.into(),
            },
            relationship: "OWNER".to_string(),
        }
    }
}

/// Request body for run creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRunRequest {
    pub name: String,
    pub pipeline_spec: PipelineSpecPayload,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_references: Vec<ResourceReference>,
}

/// A submitted run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Runtime state attached to a run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineRuntime {
    #[serde(default)]
    pub workflow_manifest: String,
}

/// A run together with its runtime detail, as run creation returns it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunDetail {
    #[serde(default)]
    pub run: Run,
    #[serde(default)]
    pub pipeline_runtime: Option<PipelineRuntime>,
}

/// A registered pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parameters: Vec<RunParameter>,
}

/// Page of registered pipelines.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPipelinesResponse {
    #[serde(default)]
    pub pipelines: Vec<PipelineSummary>,
    #[serde(default)]
    pub total_size: i32,
    #[serde(default)]
    pub next_page_token: String,
}

/// A version attached to a registered pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineVersion {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parameters: Vec<RunParameter>,
    #[serde(default)]
    pub resource_references: Vec<ResourceReference>,
}

/// Page of pipeline versions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPipelineVersionsResponse {
    #[serde(default)]
    pub versions: Vec<PipelineVersion>,
    #[serde(default)]
    pub total_size: i32,
    #[serde(default)]
    pub next_page_token: String,
}
