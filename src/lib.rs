//! pipekit: model hub snapshot fetch and Kubeflow/Tekton pipeline demos.
//!
//! This library provides the pieces the demo binaries are built from: a hub
//! client for downloading model snapshots, a small pipeline definition DSL,
//! a compiler lowering definitions to Tekton `PipelineRun` manifests, and an
//! authenticated client for the pipeline service REST API.

pub mod client;
pub mod compiler;
pub mod error;
pub mod hub;
pub mod pipeline;

// Re-export commonly used error types
pub use error::{ClientError, CompilerError, HubError, PipelineError};
