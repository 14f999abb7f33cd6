//! The executable unit backend: turns unit text into instruction routines.

pub mod lexer;
mod parser;
mod verify;

use indexmap::IndexMap;

use crate::arithmetic::Operation;
use crate::error::UnitDiagnostic;
use crate::runtime_value::RuntimeValue;

pub use lexer::parse_string_literal;

/// One step of a routine. Expression instructions work on an operand stack.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    WriteText(String),
    Push(RuntimeValue),
    Load(String),
    Store(String),
    Binary(Operation),
    UnaryPlus,
    UnaryMinus,
    /// Pop a value and write its text representation.
    Print,
    RenderBlock(String),
    /// Render the ancestor's version of the enclosing block.
    RenderParentBlock(String),
    CallMacro { name: String, arguments: usize },
    PushInheritanceChain,
    DelegateParent,
}

impl Instruction {
    /// (values popped, values pushed)
    pub fn stack_effect(&self) -> (usize, usize) {
        match self {
            Instruction::Push(_) | Instruction::Load(_) => (0, 1),
            Instruction::Store(_) | Instruction::Print => (1, 0),
            Instruction::Binary(_) => (2, 1),
            Instruction::UnaryPlus | Instruction::UnaryMinus => (1, 1),
            Instruction::CallMacro { arguments, .. } => (*arguments, 1),
            Instruction::WriteText(_)
            | Instruction::RenderBlock(_)
            | Instruction::RenderParentBlock(_)
            | Instruction::PushInheritanceChain
            | Instruction::DelegateParent => (0, 0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Routine {
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacroRoutine {
    pub parameters: Vec<String>,
    pub body: Routine,
}

impl MacroRoutine {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    pub parameters: Vec<String>,
}

/// A unit that passed compilation, ready to be instantiated.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    pub name: String,
    pub base: String,
    pub constructor: Option<Constructor>,
    /// The content builder.
    pub content: Routine,
    pub blocks: IndexMap<String, Routine>,
    pub macros: IndexMap<String, Vec<MacroRoutine>>,
}

/// Compile unit text submitted under `target`. Base types are resolved
/// against `search_path`. All diagnostics are collected before failing.
pub fn compile_unit(
    text: &str,
    target: &str,
    search_path: &[String],
) -> Result<CompiledUnit, Vec<UnitDiagnostic>> {
    let (tokens, mut diagnostics) = lexer::tokenize(text);
    let parsed = parser::parse(&tokens, &mut diagnostics);

    let Some(parsed) = parsed else {
        return Err(diagnostics);
    };

    if parsed.name != target {
        diagnostics.push(UnitDiagnostic::new(
            parsed.line,
            format!(
                "unit `{}` must be named after its compilation input `{}`",
                parsed.name, target
            ),
        ));
    }
    if !search_path.iter().any(|base| *base == parsed.base) {
        diagnostics.push(UnitDiagnostic::new(
            parsed.line,
            format!("cannot find base type `{}`", parsed.base),
        ));
    }

    let unit = verify::verify(parsed, &mut diagnostics);

    if diagnostics.is_empty() {
        Ok(unit)
    } else {
        diagnostics.sort_by_key(|d| d.line);
        Err(diagnostics)
    }
}
