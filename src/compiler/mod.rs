//! Compilation of pipeline definitions into Tekton `PipelineRun` manifests.
//!
//! Lowers a [`Pipeline`](crate::pipeline::Pipeline) into the self-contained
//! manifest the pipeline service executes: runtime parameter bindings,
//! inlined task specs, and container steps carrying the component programs.

pub mod workflow;

pub use workflow::{PipelineRun, PIPELINE_SPEC_ANNOTATION};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::CompilerError;
use crate::pipeline::{Argument, Pipeline, PipelineTask};
use workflow::{
    AnnotationInput, Metadata, ParamDecl, ParamValue, PipelineRunSpec, PipelineSpec,
    PipelineSpecAnnotation, ResultDecl, Step, TaskSpec, WorkflowTask,
};

/// Tekton API group/version the emitted manifests target.
pub const TEKTON_API_VERSION: &str = "tekton.dev/v1beta1";

/// Compiles [`Pipeline`] definitions into Tekton `PipelineRun` YAML.
#[derive(Debug, Default)]
pub struct TektonCompiler;

impl TektonCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Lower a definition to its YAML manifest text.
    ///
    /// Identical definitions produce byte-identical output.
    pub fn compile_to_string(&self, pipeline: &Pipeline) -> Result<String, CompilerError> {
        let manifest = self.lower(pipeline)?;
        Ok(serde_yaml::to_string(&manifest)?)
    }

    /// Compile and write the manifest to `package_path`.
    ///
    /// An existing file at that path is replaced without comment. The parent
    /// directory must already exist.
    pub fn compile(
        &self,
        pipeline: &Pipeline,
        package_path: impl AsRef<Path>,
    ) -> Result<(), CompilerError> {
        let package_path = package_path.as_ref();
        let yaml = self.compile_to_string(pipeline)?;
        fs::write(package_path, &yaml)?;
        info!(
            pipeline = %pipeline.name,
            package = %package_path.display(),
            "wrote compiled pipeline"
        );
        Ok(())
    }

    /// Build the manifest structure for a definition.
    fn lower(&self, pipeline: &Pipeline) -> Result<PipelineRun, CompilerError> {
        let mut annotations = BTreeMap::new();
        annotations.insert(
            PIPELINE_SPEC_ANNOTATION.to_string(),
            serde_json::to_string(&spec_annotation(pipeline))?,
        );

        Ok(PipelineRun {
            api_version: TEKTON_API_VERSION.to_string(),
            kind: "PipelineRun".to_string(),
            metadata: Metadata {
                name: pipeline.sanitized_name(),
                annotations,
            },
            spec: PipelineRunSpec {
                params: pipeline
                    .params
                    .iter()
                    .map(|p| ParamValue {
                        name: p.name.clone(),
                        value: p.default.clone(),
                    })
                    .collect(),
                pipeline_spec: PipelineSpec {
                    params: pipeline
                        .params
                        .iter()
                        .map(|p| ParamDecl {
                            name: p.name.clone(),
                            default: Some(p.default.clone()),
                        })
                        .collect(),
                    tasks: pipeline
                        .tasks
                        .iter()
                        .map(|task| lower_task(pipeline, task))
                        .collect(),
                },
            },
        })
    }
}

/// The JSON summary stored under [`PIPELINE_SPEC_ANNOTATION`].
fn spec_annotation(pipeline: &Pipeline) -> PipelineSpecAnnotation {
    PipelineSpecAnnotation {
        name: pipeline.name.clone(),
        description: (!pipeline.description.is_empty()).then(|| pipeline.description.clone()),
        inputs: pipeline
            .params
            .iter()
            .map(|p| AnnotationInput {
                name: p.name.clone(),
                default: Some(p.default.clone()),
                optional: true,
            })
            .collect(),
    }
}

/// Lower one DSL task to its manifest entry.
fn lower_task(pipeline: &Pipeline, task: &PipelineTask) -> WorkflowTask {
    let consumed = consumed_params(task);

    let mut args = Vec::new();
    for (input, argument) in task.component.inputs.iter().zip(&task.arguments) {
        args.push(format!("--{}", input.name));
        args.push(argument_value(pipeline, argument));
    }
    args.push("----output-paths".to_string());
    args.push(format!("$(results.{}.path)", task.component.output.name));

    WorkflowTask {
        name: task.name.clone(),
        params: consumed
            .iter()
            .map(|name| ParamValue {
                name: name.clone(),
                value: format!("$(params.{name})"),
            })
            .collect(),
        task_spec: TaskSpec {
            params: consumed
                .iter()
                .map(|name| ParamDecl {
                    name: name.clone(),
                    default: None,
                })
                .collect(),
            results: vec![ResultDecl {
                name: task.component.output.name.clone(),
                description: None,
            }],
            steps: vec![Step {
                name: "main".to_string(),
                image: task.component.image.clone(),
                command: vec![
                    "python3".to_string(),
                    "-u".to_string(),
                    "-c".to_string(),
                    task.component.program.clone(),
                ],
                args,
            }],
        },
    }
}

/// Pipeline parameters a task consumes, in argument order, deduplicated.
fn consumed_params(task: &PipelineTask) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for argument in &task.arguments {
        if let Argument::Param(name) = argument {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }
    names
}

/// Resolve an argument to the string the step receives.
fn argument_value(pipeline: &Pipeline, argument: &Argument) -> String {
    match argument {
        Argument::Param(name) => format!("$(inputs.params.{name})"),
        Argument::Literal(value) => value.clone(),
        Argument::TaskOutput(handle) => {
            let upstream = &pipeline.tasks[handle.index()];
            format!(
                "$(tasks.{}.results.{})",
                upstream.name, upstream.component.output.name
            )
        }
    }
}
