//! Compiles the pipeline, uploads it as a new version of an already
//! registered pipeline, and prints the registered versions.
//!
//! The pipeline is looked up under the compiled package's path, which is
//! what this flow has always passed as the registered name.

use anyhow::Context;
use pipekit::client::TektonClient;
use pipekit::compiler::TektonCompiler;
use pipekit::pipeline::{Argument, BinaryOp, Component, Pipeline};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const HOST: &str =
    "https://ds-pipeline-pipelines-definition-pipeline-demo.apps.cluster-q9bcd.q9bcd.sandbox493.opentlc.com";
const EXISTING_TOKEN: &str = "sha256~ZenMMDSu6YD6GAjv49alq2kkGebpCoLb7crAZcXk5Do";
const VERSION_NAME: &str = "test2";

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

    // Declared as "Add" like the other demos, but this component's body
    // subtracts.
    let add_op = Component::binary_math(
        "Add",
        "Calculates sum of two arguments",
        BinaryOp::Sub,
        COMPONENT_IMAGE,
    );

    let mut pipeline = Pipeline::new(PIPELINE_NAME, PIPELINE_DESCRIPTION)
        .with_param("a", "1")?
        .with_param("b", "7")?;
    let first = pipeline.add_task(&add_op, vec![Argument::param("a"), Argument::literal(4)])?;
    pipeline.add_task(&add_op, vec![first.output(), Argument::param("b")])?;

    let package_path = std::env::current_exe()?.with_extension("yaml");
    TektonCompiler::new().compile(&pipeline, &package_path)?;

    let client = TektonClient::new(HOST, EXISTING_TOKEN);
    let package_name = package_path.to_string_lossy().into_owned();
    let pipeline_id = client
        .get_pipeline_id(&package_name)
        .await?
        .with_context(|| format!("no pipeline registered under '{package_name}'"))?;

    client
        .upload_pipeline_version(&package_path, VERSION_NAME, &pipeline_id)
        .await?;

    let versions = client.list_pipeline_versions(&pipeline_id).await?;
    println!("{versions:#?}");

    Ok(())
}
