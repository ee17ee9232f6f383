//! Compiles the two-step add pipeline to a YAML package next to the binary.

use pipekit::compiler::TektonCompiler;
use pipekit::pipeline::{Argument, BinaryOp, Component, Pipeline};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const PIPELINE_NAME: &str = "Add Pipeline";
const PIPELINE_DESCRIPTION: &str = "A pipeline that adds numbers together";
const COMPONENT_IMAGE: &str =
    "image-registry.openshift-image-registry.svc:5000/openshift/python:latest";

fn main() -> anyhow::Result<()> {
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

    let package_path = std::env::current_exe()?.with_extension("yaml");
    TektonCompiler::new().compile(&pipeline, &package_path)?;

    Ok(())
}
