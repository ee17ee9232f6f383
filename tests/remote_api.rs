//! Integration tests against live remote services.
//!
//! Most tests make real API calls to a Kubeflow Pipelines endpoint.
//! Run with: PIPELINE_HOST=https://host PIPELINE_TOKEN=sha256~token \
//!   cargo test --test remote_api -- --ignored
//!
//! The hub lookup test only needs outbound network access.

use pipekit::client::TektonClient;
use pipekit::compiler::TektonCompiler;
use pipekit::hub::HubClient;
use pipekit::pipeline::{Argument, BinaryOp, Component, Pipeline};
use pipekit::HubError;

const EXPERIMENT_NAME: &str = "pipekit-integration";

fn get_test_host() -> String {
    std::env::var("PIPELINE_HOST")
        .expect("PIPELINE_HOST environment variable must be set for integration tests")
}

fn get_test_token() -> String {
    std::env::var("PIPELINE_TOKEN")
        .expect("PIPELINE_TOKEN environment variable must be set for integration tests")
}

fn create_test_client() -> TektonClient {
    TektonClient::new(get_test_host(), get_test_token())
}

fn demo_pipeline() -> Pipeline {
    let add_op = Component::binary_math(
        "Add",
        "Calculates sum of two arguments",
        BinaryOp::Add,
        "image-registry.openshift-image-registry.svc:5000/openshift/python:latest",
    );
    let mut pipeline = Pipeline::new("Add Pipeline", "A pipeline that adds numbers together")
        .with_param("a", "1")
        .expect("param a")
        .with_param("b", "7")
        .expect("param b");
    let first = pipeline
        .add_task(&add_op, vec![Argument::param("a"), Argument::literal(4)])
        .expect("first task");
    pipeline
        .add_task(&add_op, vec![first.output(), Argument::param("b")])
        .expect("second task");
    pipeline
}

#[tokio::test]
#[ignore] // Run with: cargo test --test remote_api -- --ignored
async fn test_experiment_get_or_create_round_trip() {
    let client = create_test_client();

    let created = client
        .create_experiment(EXPERIMENT_NAME)
        .await
        .expect("experiment creation should succeed");
    assert!(!created.id.is_empty(), "Experiment should have an id");

    let again = client
        .create_experiment(EXPERIMENT_NAME)
        .await
        .expect("second call should succeed");
    assert_eq!(
        created.id, again.id,
        "Get-or-create should return the existing experiment"
    );
}

#[tokio::test]
#[ignore]
async fn test_get_experiment_absent_name_is_none() {
    let client = create_test_client();

    let missing = client
        .get_experiment("pipekit-no-such-experiment")
        .await
        .expect("lookup should succeed");
    assert!(
        missing.is_none(),
        "Unknown experiment name should resolve to None, got: {:?}",
        missing
    );
}

#[tokio::test]
#[ignore]
async fn test_submit_run_from_pipeline() {
    let client = create_test_client();
    let pipeline = demo_pipeline();

    let detail = client
        .create_run_from_pipeline(&pipeline, &[("a", "7"), ("b", "8")], EXPERIMENT_NAME)
        .await
        .expect("run submission should succeed");

    assert!(!detail.run.id.is_empty(), "Run should have an id");
    assert!(
        detail.run.name.starts_with("Add Pipeline "),
        "Run name should carry the pipeline name and a timestamp, got: {}",
        detail.run.name
    );
}

#[tokio::test]
#[ignore]
async fn test_get_pipeline_id_absent_name_is_none() {
    let client = create_test_client();

    let id = client
        .get_pipeline_id("pipekit-no-such-pipeline")
        .await
        .expect("lookup should succeed");
    assert!(
        id.is_none(),
        "Unknown pipeline name should resolve to None, got: {:?}",
        id
    );
}

#[tokio::test]
#[ignore]
async fn test_repo_info_unknown_repo_is_not_found() {
    let client = HubClient::new();

    let result = client
        .repo_info("pipekit-no-such-org/pipekit-no-such-model", "main")
        .await;
    assert!(
        matches!(result, Err(HubError::RepoNotFound(_))),
        "Unknown repository should map to RepoNotFound, got: {:?}",
        result
    );
}

#[tokio::test]
#[ignore]
async fn test_upload_version_and_list() {
    let client = create_test_client();
    let pipeline = demo_pipeline();

    let dir = tempfile::tempdir().expect("tempdir");
    let package = dir.path().join("add_pipeline.yaml");
    TektonCompiler::new()
        .compile(&pipeline, &package)
        .expect("compile should succeed");

    let registered = client
        .upload_pipeline(&package, "pipekit-integration-pipeline")
        .await
        .expect("pipeline upload should succeed");
    assert!(!registered.id.is_empty(), "Pipeline should have an id");

    let resolved = client
        .get_pipeline_id("pipekit-integration-pipeline")
        .await
        .expect("id lookup should succeed");
    assert_eq!(
        resolved.as_deref(),
        Some(registered.id.as_str()),
        "Lookup should find the pipeline just uploaded"
    );

    let version = client
        .upload_pipeline_version(&package, "test2", &registered.id)
        .await
        .expect("version upload should succeed");
    assert!(!version.id.is_empty(), "Version should have an id");

    let versions = client
        .list_pipeline_versions(&registered.id)
        .await
        .expect("version listing should succeed");
    assert!(
        versions.versions.iter().any(|v| v.name == "test2"),
        "Uploaded version should appear in the listing: {:#?}",
        versions
    );
}

#[tokio::test]
#[ignore]
async fn test_invalid_token_is_rejected() {
    let client = TektonClient::new(get_test_host(), "sha256~not-a-real-token");

    let result = client.get_experiment(EXPERIMENT_NAME).await;
    assert!(result.is_err(), "Bogus token should be rejected by the service");
}
