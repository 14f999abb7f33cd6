use std::fmt;
use std::io;

use quill::parser::ParseError;
use thiserror::Error;

/// A numeric operator was applied to operands it cannot combine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("invalid operands for mathematical operator [{operator}]: {left} and {right}")]
    InvalidOperands {
        operator: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("invalid operand for unary operator [{operator}]: {operand}")]
    InvalidOperand {
        operator: &'static str,
        operand: &'static str,
    },
    #[error("{0} division by zero")]
    DivisionByZero(&'static str),
}

impl ArithmeticError {
    /// Re-attribute a `1 * x` / `-1 * x` failure to the unary operator.
    pub(crate) fn for_unary(self, operator: &'static str) -> Self {
        match self {
            ArithmeticError::InvalidOperands { right, .. } => ArithmeticError::InvalidOperand {
                operator,
                operand: right,
            },
            other => other,
        }
    }
}

/// Macro invocation that no declared overload accepts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("undefined macro `{0}`")]
    Undefined(String),
    #[error(
        "macro `{name}` has no overload taking {arguments} argument(s) (declared: {})",
        join_arities(.declared)
    )]
    Arity {
        name: String,
        arguments: usize,
        declared: Vec<usize>,
    },
}

fn join_arities(arities: &[usize]) -> String {
    arities
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Linking a template to its parent would close a loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template inheritance cycle: {}", .chain.join(" -> "))]
pub struct CycleError {
    /// The templates involved, starting and ending with the same name.
    pub chain: Vec<String>,
}

/// One problem reported while compiling executable unit text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDiagnostic {
    /// 1-based line in the unit text.
    pub line: usize,
    pub message: String,
}

impl UnitDiagnostic {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        UnitDiagnostic {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for UnitDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error on line {}: {}", self.line, self.message)
    }
}

/// The unit backend rejected an emitted unit. Carries every diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("compilation of `{target}` failed:\n{}", join_diagnostics(.diagnostics))]
pub struct CompilationError {
    pub target: String,
    pub diagnostics: Vec<UnitDiagnostic>,
}

fn join_diagnostics(diagnostics: &[UnitDiagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Why a compiled unit could not be turned into a template instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstantiationCause {
    #[error("no constructor taking (source, engine, parent)")]
    MissingConstructor,
    #[error("unit extends `{found}`, but the engine requires `{expected}`")]
    IncompatibleBase { expected: String, found: String },
    #[error("the owning engine has been dropped")]
    EngineDropped,
}

/// A unit compiled, but constructing its template failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not instantiate `{target}`")]
pub struct InstantiationError {
    pub target: String,
    #[source]
    pub cause: InstantiationCause,
}

/// Failure of [`crate::loader::Loader::instantiate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(transparent)]
    Compilation(#[from] CompilationError),
    #[error(transparent)]
    Instantiation(#[from] InstantiationError),
    #[error(transparent)]
    Cycle(#[from] CycleError),
}

/// Errors raised while rendering. Each one aborts the render.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("undefined block `{0}`")]
    UndefinedBlock(String),
    #[error("block `{0}` has no ancestor version to render")]
    NoParentBlock(String),
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),
    #[error("template `{0}` delegates to a parent it does not have")]
    MissingParent(String),
    #[error("maximum render depth of {0} exceeded")]
    RecursionLimit(usize),
    #[error("corrupt unit `{unit}`: {message}")]
    Corrupt { unit: String, message: String },
}

/// Top-level error of the [`crate::Engine`] facade.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot load template `{name}`: {source}")]
    Source {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse `{filename}`: {}", summarize_parse_errors(.errors))]
    Parse {
        filename: String,
        /// Template source, so callers can render the errors with labels.
        text: String,
        errors: Vec<ParseError>,
    },
    #[error("`{filename}` extends `{parent}`, but no parent template was supplied")]
    UnlinkedParent { filename: String, parent: String },
    #[error(transparent)]
    Compilation(#[from] CompilationError),
    #[error(transparent)]
    Instantiation(#[from] InstantiationError),
    #[error(transparent)]
    Cycle(#[from] CycleError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

fn summarize_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<LoadError> for EngineError {
    fn from(error: LoadError) -> Self {
        match error {
            LoadError::Compilation(e) => EngineError::Compilation(e),
            LoadError::Instantiation(e) => EngineError::Instantiation(e),
            LoadError::Cycle(e) => EngineError::Cycle(e),
        }
    }
}
