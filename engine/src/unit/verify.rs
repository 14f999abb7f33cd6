//! Semantic checks on a parsed unit, and lowering into [`CompiledUnit`].

use indexmap::IndexMap;

use super::parser::{ParsedRoutine, ParsedUnit};
use super::{CompiledUnit, Constructor, Instruction, MacroRoutine, Routine};
use crate::error::UnitDiagnostic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoutineKind {
    Content,
    Block,
    Macro,
}

pub(super) fn verify(unit: ParsedUnit, diagnostics: &mut Vec<UnitDiagnostic>) -> CompiledUnit {
    let content = match unit.content {
        Some(routine) => check_routine(routine, RoutineKind::Content, diagnostics),
        None => Routine::default(),
    };

    let mut blocks = IndexMap::new();
    for block in unit.blocks {
        let routine = check_routine(block.body, RoutineKind::Block, diagnostics);
        if blocks.contains_key(&block.name) {
            diagnostics.push(UnitDiagnostic::new(
                block.line,
                format!("duplicate block `{}`", block.name),
            ));
            continue;
        }
        blocks.insert(block.name, routine);
    }

    let mut macros: IndexMap<String, Vec<MacroRoutine>> = IndexMap::new();
    for declared in unit.macros {
        let body = check_routine(declared.body, RoutineKind::Macro, diagnostics);
        let overloads = macros.entry(declared.name.clone()).or_default();
        if overloads
            .iter()
            .any(|m| m.arity() == declared.parameters.len())
        {
            diagnostics.push(UnitDiagnostic::new(
                declared.line,
                format!(
                    "duplicate macro `{}` taking {} argument(s)",
                    declared.name,
                    declared.parameters.len()
                ),
            ));
            continue;
        }
        overloads.push(MacroRoutine {
            parameters: declared.parameters,
            body,
        });
    }

    CompiledUnit {
        name: unit.name,
        base: unit.base,
        constructor: unit
            .constructor
            .map(|parameters| Constructor { parameters }),
        content,
        blocks,
        macros,
    }
}

fn check_routine(
    routine: ParsedRoutine,
    kind: RoutineKind,
    diagnostics: &mut Vec<UnitDiagnostic>,
) -> Routine {
    let mut depth = 0usize;
    let mut last_line = routine.line;
    let mut instructions = Vec::with_capacity(routine.instructions.len());

    for (instruction, line) in routine.instructions {
        last_line = line;
        match (&instruction, kind) {
            (Instruction::RenderParentBlock(_), RoutineKind::Content | RoutineKind::Macro) => {
                diagnostics.push(UnitDiagnostic::new(
                    line,
                    "`render_parent_block` is only valid inside a block",
                ));
            }
            (
                Instruction::PushInheritanceChain | Instruction::DelegateParent,
                RoutineKind::Block | RoutineKind::Macro,
            ) => {
                diagnostics.push(UnitDiagnostic::new(
                    line,
                    "inheritance instructions are only valid inside `build_content`",
                ));
            }
            _ => {}
        }

        let (pops, pushes) = instruction.stack_effect();
        if pops > depth {
            diagnostics.push(UnitDiagnostic::new(
                line,
                format!(
                    "operand stack underflow: instruction needs {} value(s), {} available",
                    pops, depth
                ),
            ));
            depth = 0;
        } else {
            depth -= pops;
        }
        depth += pushes;
        instructions.push(instruction);
    }

    if depth != 0 {
        diagnostics.push(UnitDiagnostic::new(
            last_line,
            format!("{} value(s) left on the operand stack", depth),
        ));
    }

    Routine { instructions }
}
