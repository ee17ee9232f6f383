//! Error types for pipekit operations.
//!
//! Defines error types for the major subsystems:
//! - Model hub snapshot downloads
//! - Pipeline graph definition
//! - Tekton workflow compilation
//! - Pipeline service API interactions

use thiserror::Error;

/// Errors that can occur while fetching a model snapshot from the hub.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Repository '{0}' not found on the hub")]
    RepoNotFound(String),

    #[error("Hub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Invalid allow pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Listing path '{0}' escapes the download directory")]
    UnsafePath(String),

    #[error("Size mismatch for '{path}': expected {expected} bytes, got {actual}")]
    SizeMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("Checksum mismatch for '{path}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while defining a pipeline graph.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline parameter '{0}' is declared more than once")]
    DuplicateParam(String),

    #[error("Task argument references unknown pipeline parameter '{0}'")]
    UnknownParam(String),

    #[error("Component '{component}' takes {expected} arguments, got {actual}")]
    ArityMismatch {
        component: String,
        expected: usize,
        actual: usize,
    },

    #[error("Task argument references output of unknown task '{0}'")]
    UnknownTaskOutput(String),
}

/// Errors that can occur while compiling a pipeline to a workflow manifest.
#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when talking to the pipeline service API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    Parse(String),

    #[error("Multiple pipelines ({count}) share the name '{name}'")]
    AmbiguousPipelineName { name: String, count: usize },

    #[error("Compilation failed: {0}")]
    Compiler(#[from] CompilerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
