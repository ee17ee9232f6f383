//! Serde model of the Tekton `PipelineRun` manifest the compiler emits.
//!
//! Only the fields the compiler actually produces are modeled. Collections
//! are ordered vectors and annotation maps are sorted, so serialization is
//! deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Annotation key carrying the JSON pipeline summary.
pub const PIPELINE_SPEC_ANNOTATION: &str = "pipelines.kubeflow.org/pipeline_spec";

/// A compiled Tekton `PipelineRun` manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    pub spec: PipelineRunSpec,
}

/// Object metadata: resource name plus annotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// The run spec: runtime parameter bindings and the inlined pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamValue>,
    pub pipeline_spec: PipelineSpec,
}

/// A `{name, value}` runtime parameter binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamValue {
    pub name: String,
    pub value: String,
}

/// A `{name, default}` parameter declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// The inlined pipeline: declared parameters and tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<WorkflowTask>,
}

/// One pipeline task with its inlined task spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTask {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamValue>,
    pub task_spec: TaskSpec,
}

/// An inlined Tekton task: parameters, declared results, and steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<ResultDecl>,
    pub steps: Vec<Step>,
}

/// A declared task result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A single container step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Body of the [`PIPELINE_SPEC_ANNOTATION`] annotation: a JSON summary of
/// the source definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpecAnnotation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<AnnotationInput>,
}

/// One pipeline input as recorded in the annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub optional: bool,
}
