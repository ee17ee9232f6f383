//! Submits the two-step add pipeline straight to a remote pipeline service.
//!
//! No package file is written: the pipeline is compiled in memory and the
//! manifest travels in the run request.

use pipekit::client::TektonClient;
use pipekit::pipeline::{Argument, BinaryOp, Component, Pipeline};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const HOST: &str =
    "https://ds-pipeline-pipelines-definition-pipeline-demo.apps.cluster-q9bcd.q9bcd.sandbox493.opentlc.com";
const EXISTING_TOKEN: &str = "sha256~ZenMMDSu6YD6GAjv49alq2kkGebpCoLb7crAZcXk5Do";
const EXPERIMENT_NAME: &str = "submitted-example";
const ARGUMENTS: [(&str, &str); 2] = [("a", "7"), ("b", "8")];

const PIPELINE_NAME: &str = "Add Pipeline";
const PIPELINE_DESCRIPTION: &str = "A pipeline that adds numbers together";
const COMPONENT_IMAGE: &str =
    "image-registry.openshift-image-registry.svc:5000/openshift/python:latest";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let add_op = Component::binary_math(
        "Add",
        "Calculates sum of two arguments",
        BinaryOp::Add,
        COMPONENT_IMAGE,
    );

    let mut pipeline = Pipeline::new(PIPELINE_NAME, PIPELINE_DESCRIPTION)
        .with_param("a", "1")?
        .with_param("b", "7")?;
    let first = pipeline.add_task(&add_op, vec![Argument::param("a"), Argument::literal(4)])?;
    pipeline.add_task(&add_op, vec![first.output(), Argument::param("b")])?;

    let client = TektonClient::new(HOST, EXISTING_TOKEN);
    client
        .create_run_from_pipeline(&pipeline, &ARGUMENTS, EXPERIMENT_NAME)
        .await?;

    Ok(())
}
