//! Pipeline definition DSL: components, tasks, and the pipeline graph.
//!
//! Mirrors the lightweight-component model of the upstream pipeline SDK: a
//! component wraps a small Python function into a container step (argparse
//! front end, result written to a declared output path), and a pipeline wires
//! component invocations together through parameters and task outputs.
//!
//! Validation here is purely structural (arity, declared names, task
//! ordering). Declared input types are carried along but never checked
//! against the string values the DSL binds, matching the loose typing of the
//! original model.

use crate::error::PipelineError;

/// The arithmetic a binary math component performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
}

impl BinaryOp {
    /// Apply the operation to two operands.
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
        }
    }

    /// The Python operator the generated program uses.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
        }
    }
}

/// Declared type of a component input or output.
///
/// Carried into the generated program (argparse coercion) but never enforced
/// against the values a pipeline actually binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    Float,
    String,
}

impl ParameterType {
    /// The Python type name used for argparse coercion.
    pub fn python_name(self) -> &'static str {
        match self {
            ParameterType::Float => "float",
            ParameterType::String => "str",
        }
    }
}

/// A named, typed component input.
#[derive(Debug, Clone)]
pub struct ComponentInput {
    pub name: String,
    pub param_type: ParameterType,
}

/// The single declared output of a component.
#[derive(Debug, Clone)]
pub struct ComponentOutput {
    pub name: String,
    pub param_type: ParameterType,
}

/// A containerized pipeline step.
///
/// Holds everything the compiler needs to emit a task: the container image,
/// the declared interface, and the self-contained Python program the step
/// runs.
#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    pub description: Option<String>,
    pub image: String,
    pub inputs: Vec<ComponentInput>,
    pub output: ComponentOutput,
    pub op: BinaryOp,
    pub program: String,
}

impl Component {
    /// Build a two-input numeric component whose body applies `op`.
    ///
    /// The generated program follows the lightweight-component shape: the
    /// wrapped function itself, an argparse front end over `--a`/`--b`, and a
    /// `----output-paths` trailer naming the file the result is written to.
    pub fn binary_math(
        name: impl Into<String>,
        description: impl Into<String>,
        op: BinaryOp,
        image: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let description = description.into();
        let lhs = ComponentInput {
            name: "a".to_string(),
            param_type: ParameterType::Float,
        };
        let rhs = ComponentInput {
            name: "b".to_string(),
            param_type: ParameterType::Float,
        };
        let output = ComponentOutput {
            name: "output".to_string(),
            param_type: ParameterType::Float,
        };
        let program = binary_program(&name, &description, op, &lhs, &rhs, &output);
        Self {
            name,
            description: Some(description),
            image: image.into(),
            inputs: vec![lhs, rhs],
            output,
            op,
            program,
        }
    }
}

/// The embedded program for a binary math component.
///
/// Parameter annotations and argparse coercions come from the declared
/// input and output types.
fn binary_program(
    name: &str,
    description: &str,
    op: BinaryOp,
    lhs: &ComponentInput,
    rhs: &ComponentInput,
    output: &ComponentOutput,
) -> String {
    let fn_name = python_identifier(name);
    let escaped = description.replace('\'', "\\'");
    format!(
        r#"def {fn_name}({lhs_name}: {lhs_type}, {rhs_name}: {rhs_type}) -> {output_type}:
    """{description}"""
    return {lhs_name} {symbol} {rhs_name}

import argparse
_parser = argparse.ArgumentParser(prog='{name}', description='{escaped}')
_parser.add_argument("--{lhs_name}", dest="{lhs_name}", type={lhs_type}, required=True, default=argparse.SUPPRESS)
_parser.add_argument("--{rhs_name}", dest="{rhs_name}", type={rhs_type}, required=True, default=argparse.SUPPRESS)
_parser.add_argument("----output-paths", dest="_output_paths", type=str, nargs=1)
_parsed_args = vars(_parser.parse_args())
_output_files = _parsed_args.pop("_output_paths", [])

_outputs = [{fn_name}(**_parsed_args)]

import os
for idx, output_file in enumerate(_output_files):
    try:
        os.makedirs(os.path.dirname(output_file))
    except OSError:
        pass
    with open(output_file, 'w') as f:
        f.write(str(_outputs[idx]))
"#,
        fn_name = fn_name,
        name = name,
        description = description,
        escaped = escaped,
        symbol = op.symbol(),
        lhs_name = lhs.name,
        lhs_type = lhs.param_type.python_name(),
        rhs_name = rhs.name,
        rhs_type = rhs.param_type.python_name(),
        output_type = output.param_type.python_name(),
    )
}

/// Lowercased Python identifier derived from a component name.
fn python_identifier(name: &str) -> String {
    let mut ident = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            ident.push(c.to_ascii_lowercase());
        } else {
            ident.push('_');
        }
    }
    if ident.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

/// Kubernetes-safe resource name: lowercase alphanumerics and dashes, runs of
/// other characters collapsed to a single dash.
fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Opaque reference to a task already added to a pipeline.
///
/// Obtained from [`Pipeline::add_task`]; its [`output`](TaskHandle::output)
/// feeds a later task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle {
    index: usize,
}

impl TaskHandle {
    /// The task's single output, usable as a downstream argument.
    pub fn output(self) -> Argument {
        Argument::TaskOutput(self)
    }

    pub(crate) fn index(self) -> usize {
        self.index
    }
}

/// One bound input of a pipeline task.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// Reference to a declared pipeline parameter.
    Param(String),
    /// Inline constant, kept as the string the DSL received.
    Literal(String),
    /// Output of a previously added task.
    TaskOutput(TaskHandle),
}

impl Argument {
    /// Reference a pipeline parameter by name.
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    /// Bind an inline constant.
    pub fn literal(value: impl ToString) -> Self {
        Self::Literal(value.to_string())
    }
}

/// A declared pipeline parameter with its string default.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineParam {
    pub name: String,
    pub default: String,
}

/// A component invocation within a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineTask {
    /// Unique task name, derived from the component name (`add`, `add-2`, ...).
    pub name: String,
    pub component: Component,
    pub arguments: Vec<Argument>,
}

/// A pipeline definition: parameters plus an ordered list of tasks.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub name: String,
    pub description: String,
    pub params: Vec<PipelineParam>,
    pub tasks: Vec<PipelineTask>,
}

impl Pipeline {
    /// Start an empty pipeline.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Declare a pipeline parameter with a string default.
    ///
    /// Defaults stay strings even for numerically-typed component inputs;
    /// nothing reconciles the two.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::DuplicateParam` if the name is already
    /// declared.
    pub fn with_param(
        mut self,
        name: impl Into<String>,
        default: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        let name = name.into();
        if self.params.iter().any(|p| p.name == name) {
            return Err(PipelineError::DuplicateParam(name));
        }
        self.params.push(PipelineParam {
            name,
            default: default.into(),
        });
        Ok(self)
    }

    /// Add a component invocation to the graph.
    ///
    /// Checks structure only: the argument count must match the component's
    /// inputs, `Param` references must name a declared parameter, and
    /// `TaskOutput` references must point at a task already in the graph.
    pub fn add_task(
        &mut self,
        component: &Component,
        arguments: Vec<Argument>,
    ) -> Result<TaskHandle, PipelineError> {
        if arguments.len() != component.inputs.len() {
            return Err(PipelineError::ArityMismatch {
                component: component.name.clone(),
                expected: component.inputs.len(),
                actual: arguments.len(),
            });
        }
        for argument in &arguments {
            match argument {
                Argument::Param(name) => {
                    if !self.params.iter().any(|p| p.name == *name) {
                        return Err(PipelineError::UnknownParam(name.clone()));
                    }
                }
                Argument::TaskOutput(handle) => {
                    if handle.index >= self.tasks.len() {
                        return Err(PipelineError::UnknownTaskOutput(format!(
                            "#{}",
                            handle.index
                        )));
                    }
                }
                Argument::Literal(_) => {}
            }
        }

        let name = self.next_task_name(&component.name);
        self.tasks.push(PipelineTask {
            name,
            component: component.clone(),
            arguments,
        });
        Ok(TaskHandle {
            index: self.tasks.len() - 1,
        })
    }

    /// The name of the task a handle refers to.
    pub fn task_name(&self, handle: TaskHandle) -> &str {
        &self.tasks[handle.index].name
    }

    /// Kubernetes resource name for this pipeline (`Add Pipeline` ->
    /// `add-pipeline`).
    pub fn sanitized_name(&self) -> String {
        sanitize_name(&self.name)
    }

    /// First free task name for a component: `add`, then `add-2`, `add-3`, ...
    fn next_task_name(&self, component_name: &str) -> String {
        let base = sanitize_name(component_name);
        if !self.tasks.iter().any(|t| t.name == base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}-{n}");
            if !self.tasks.iter().any(|t| t.name == candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IMAGE: &str = "registry.example.com/python:latest";

    fn add_component() -> Component {
        Component::binary_math(
            "Add",
            "Calculates sum of two arguments",
            BinaryOp::Add,
            TEST_IMAGE,
        )
    }

    #[test]
    fn test_binary_op_apply() {
        assert_eq!(BinaryOp::Add.apply(1.0, 4.0), 5.0);
        assert_eq!(BinaryOp::Sub.apply(1.0, 4.0), -3.0);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Add Pipeline"), "add-pipeline");
        assert_eq!(sanitize_name("Add"), "add");
        assert_eq!(sanitize_name("  My -- Pipeline!  "), "my-pipeline");
    }

    #[test]
    fn test_python_identifier() {
        assert_eq!(python_identifier("Add"), "add");
        assert_eq!(python_identifier("My Func"), "my_func");
        assert_eq!(python_identifier("2fast"), "_2fast");
    }

    #[test]
    fn test_binary_math_program_shape() {
        let add = add_component();
        assert!(add.program.contains("def add(a: float, b: float) -> float:"));
        assert!(add.program.contains("return a + b"));
        assert!(add.program.contains(r#""--a""#));
        assert!(add.program.contains(r#""--b""#));
        assert!(add.program.contains(r#""----output-paths""#));

        let sub = Component::binary_math(
            "Add",
            "Calculates sum of two arguments",
            BinaryOp::Sub,
            TEST_IMAGE,
        );
        // Same declared interface, subtracting body.
        assert!(sub.program.contains("def add(a: float, b: float) -> float:"));
        assert!(sub.program.contains("return a - b"));
    }

    #[test]
    fn test_program_types_follow_declared_interface() {
        assert_eq!(ParameterType::Float.python_name(), "float");
        assert_eq!(ParameterType::String.python_name(), "str");

        // The argparse coercions and annotations are the declared types,
        // not fixed text.
        let add = add_component();
        assert_eq!(add.inputs[0].param_type, ParameterType::Float);
        assert!(add
            .program
            .contains(r#"_parser.add_argument("--a", dest="a", type=float"#));
        assert!(add
            .program
            .contains(r#"_parser.add_argument("--b", dest="b", type=float"#));
        assert!(add.program.contains("-> float:"));
    }

    #[test]
    fn test_task_names_deduplicate() {
        let add_op = add_component();
        let mut pipeline = Pipeline::new("Add Pipeline", "test")
            .with_param("a", "1")
            .and_then(|p| p.with_param("b", "7"))
            .expect("params should be accepted");

        let first = pipeline
            .add_task(&add_op, vec![Argument::param("a"), Argument::literal(4)])
            .expect("first task");
        let second = pipeline
            .add_task(&add_op, vec![first.output(), Argument::param("b")])
            .expect("second task");

        assert_eq!(pipeline.task_name(first), "add");
        assert_eq!(pipeline.task_name(second), "add-2");
    }

    #[test]
    fn test_demo_graph_wires_first_output_into_second_task() {
        let add_op = add_component();
        let mut pipeline = Pipeline::new("Add Pipeline", "test")
            .with_param("a", "1")
            .and_then(|p| p.with_param("b", "7"))
            .expect("params should be accepted");

        let first = pipeline
            .add_task(&add_op, vec![Argument::param("a"), Argument::literal(4)])
            .expect("first task");
        pipeline
            .add_task(&add_op, vec![first.output(), Argument::param("b")])
            .expect("second task");

        assert_eq!(pipeline.tasks[1].arguments[0], Argument::TaskOutput(first));
    }

    #[test]
    fn test_duplicate_param_rejected() {
        let result = Pipeline::new("p", "")
            .with_param("a", "1")
            .and_then(|p| p.with_param("a", "2"));
        assert!(matches!(result, Err(PipelineError::DuplicateParam(name)) if name == "a"));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let add_op = add_component();
        let mut pipeline = Pipeline::new("p", "").with_param("a", "1").expect("param");
        let result = pipeline.add_task(&add_op, vec![Argument::param("a")]);
        assert!(matches!(
            result,
            Err(PipelineError::ArityMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_param_rejected() {
        let add_op = add_component();
        let mut pipeline = Pipeline::new("p", "").with_param("a", "1").expect("param");
        let result = pipeline.add_task(
            &add_op,
            vec![Argument::param("a"), Argument::param("missing")],
        );
        assert!(matches!(result, Err(PipelineError::UnknownParam(name)) if name == "missing"));
    }

    #[test]
    fn test_unknown_task_output_rejected() {
        let add_op = add_component();
        let mut pipeline = Pipeline::new("p", "").with_param("a", "1").expect("param");
        let dangling = TaskHandle { index: 5 };
        let result = pipeline.add_task(
            &add_op,
            vec![Argument::TaskOutput(dangling), Argument::param("a")],
        );
        assert!(matches!(result, Err(PipelineError::UnknownTaskOutput(_))));
    }

    #[test]
    fn test_literal_argument_keeps_string_form() {
        assert_eq!(Argument::literal(4), Argument::Literal("4".to_string()));
        assert_eq!(Argument::literal("7"), Argument::Literal("7".to_string()));
    }
}
