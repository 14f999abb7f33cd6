use std::io::Write;
use std::sync::Arc;

use tracing::trace;

use crate::arithmetic;
use crate::context::{Context, Scope};
use crate::error::{DispatchError, RenderError};
use crate::runtime_value::RuntimeValue;
use crate::template::Template;
use crate::unit::{Instruction, Routine};

/// Where the routine being executed comes from.
#[derive(Clone, Copy)]
struct Frame<'t> {
    /// Template whose table held the routine.
    owner: &'t Arc<Template>,
    /// Name of the enclosing block, when executing one.
    block: Option<&'t str>,
}

/// Executes the routines of one content builder invocation.
struct Machine<'c> {
    /// The template whose content builder is running.
    root: Arc<Template>,
    context: &'c mut Context,
    depth: usize,
}

/// Entry point used by [`Template::render`].
pub(crate) fn build_content(
    template: &Arc<Template>,
    writer: &mut dyn Write,
    context: &mut Context,
) -> Result<(), RenderError> {
    let mut machine = Machine {
        root: Arc::clone(template),
        context,
        depth: 0,
    };
    let frame = Frame {
        owner: template,
        block: None,
    };
    machine.run(&template.unit().content, frame, writer)
}

impl Machine<'_> {
    /// Candidates for block and macro resolution, most-derived first, ending
    /// with the template whose content is being built.
    fn resolution_order(&self) -> Vec<Arc<Template>> {
        let mut order: Vec<Arc<Template>> = self.context.inheritance_chain().to_vec();
        if !order.iter().any(|t| Arc::ptr_eq(t, &self.root)) {
            order.push(Arc::clone(&self.root));
        }
        order
    }

    fn enter(&mut self) -> Result<(), RenderError> {
        let limit = self.root.settings().max_render_depth;
        if self.depth >= limit {
            return Err(RenderError::RecursionLimit(limit));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn run(
        &mut self,
        routine: &Routine,
        frame: Frame<'_>,
        writer: &mut dyn Write,
    ) -> Result<(), RenderError> {
        let mut stack: Vec<RuntimeValue> = Vec::new();

        for instruction in &routine.instructions {
            match instruction {
                Instruction::WriteText(text) => writer.write_all(text.as_bytes())?,
                Instruction::Push(value) => stack.push(value.clone()),
                Instruction::Load(name) => {
                    let value = match self.context.get_variable(name) {
                        Some(value) => value.clone(),
                        None if self.root.settings().strict_variables => {
                            return Err(RenderError::UndefinedVariable(name.clone()));
                        }
                        None => RuntimeValue::None,
                    };
                    stack.push(value);
                }
                Instruction::Store(name) => {
                    let value = pop(&mut stack, frame)?;
                    self.context.set_variable(name, value);
                }
                Instruction::Binary(operation) => {
                    let right = pop(&mut stack, frame)?;
                    let left = pop(&mut stack, frame)?;
                    stack.push(operation.apply(&left, &right)?);
                }
                Instruction::UnaryPlus => {
                    let operand = pop(&mut stack, frame)?;
                    stack.push(arithmetic::unary_plus(&operand)?);
                }
                Instruction::UnaryMinus => {
                    let operand = pop(&mut stack, frame)?;
                    stack.push(arithmetic::unary_minus(&operand)?);
                }
                Instruction::Print => {
                    let value = pop(&mut stack, frame)?;
                    write!(writer, "{}", value)?;
                }
                Instruction::RenderBlock(name) => self.render_block(name, writer)?,
                Instruction::RenderParentBlock(name) => {
                    self.render_parent_block(name, frame, writer)?
                }
                Instruction::CallMacro { name, arguments } => {
                    if stack.len() < *arguments {
                        return Err(corrupt(frame, "operand stack underflow"));
                    }
                    let values = stack.split_off(stack.len() - arguments);
                    let output = self.call_macro(name, values)?;
                    stack.push(RuntimeValue::String(output));
                }
                Instruction::PushInheritanceChain => {
                    self.context.push_inheritance_chain(Arc::clone(frame.owner));
                }
                Instruction::DelegateParent => {
                    let parent = frame.owner.parent().ok_or_else(|| {
                        RenderError::MissingParent(frame.owner.name().to_string())
                    })?;
                    trace!(
                        template = frame.owner.name(),
                        parent = parent.name(),
                        "delegating to parent"
                    );
                    parent.render(writer, &mut *self.context)?;
                }
            }
        }

        Ok(())
    }

    /// Most-derived template declaring `name` wins.
    fn render_block(&mut self, name: &str, writer: &mut dyn Write) -> Result<(), RenderError> {
        let order = self.resolution_order();
        let owner = order
            .iter()
            .find(|t| t.has_block(name))
            .ok_or_else(|| RenderError::UndefinedBlock(name.to_string()))?;
        self.execute_block(owner, name, writer)
    }

    /// Resolve from the entry after the template owning the executing block,
    /// so each level of `parent()` climbs exactly one step.
    fn render_parent_block(
        &mut self,
        name: &str,
        frame: Frame<'_>,
        writer: &mut dyn Write,
    ) -> Result<(), RenderError> {
        let order = self.resolution_order();
        let ancestor = match order.iter().position(|t| Arc::ptr_eq(t, frame.owner)) {
            Some(position) => order[position + 1..]
                .iter()
                .find(|t| t.has_block(name))
                .cloned(),
            None => {
                let mut current = frame.owner.parent();
                while let Some(template) = current {
                    if template.has_block(name) {
                        break;
                    }
                    current = template.parent();
                }
                current.cloned()
            }
        };

        let ancestor = ancestor.ok_or_else(|| RenderError::NoParentBlock(name.to_string()))?;
        self.execute_block(&ancestor, name, writer)
    }

    fn execute_block(
        &mut self,
        owner: &Arc<Template>,
        name: &str,
        writer: &mut dyn Write,
    ) -> Result<(), RenderError> {
        let routine = owner
            .block(name)
            .ok_or_else(|| RenderError::UndefinedBlock(name.to_string()))?;
        self.enter()?;
        self.context.push_scope(Scope::new());
        let frame = Frame {
            owner,
            block: Some(name),
        };
        let result = self.run(routine, frame, writer);
        self.context.pop_scope();
        self.leave();
        result
    }

    /// Dispatch on name and argument count. The macro body writes into a
    /// private buffer that becomes the call's value.
    fn call_macro(
        &mut self,
        name: &str,
        arguments: Vec<RuntimeValue>,
    ) -> Result<String, RenderError> {
        let order = self.resolution_order();
        let found = order.iter().find_map(|t| {
            t.find_macro(name, arguments.len())
                .map(|overload| (Arc::clone(t), overload.clone()))
        });

        let Some((owner, overload)) = found else {
            let mut declared: Vec<usize> = order
                .iter()
                .flat_map(|t| t.macro_overloads(name).iter().map(|m| m.arity()))
                .collect();
            if declared.is_empty() {
                return Err(DispatchError::Undefined(name.to_string()).into());
            }
            declared.sort_unstable();
            declared.dedup();
            return Err(DispatchError::Arity {
                name: name.to_string(),
                arguments: arguments.len(),
                declared,
            }
            .into());
        };

        self.enter()?;
        let bindings = overload.parameters.iter().cloned().zip(arguments);
        self.context.push_scope(Scope::isolated(bindings));
        let mut output = Vec::new();
        let frame = Frame {
            owner: &owner,
            block: None,
        };
        let result = self.run(&overload.body, frame, &mut output);
        self.context.pop_scope();
        self.leave();
        result?;

        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

fn pop(stack: &mut Vec<RuntimeValue>, frame: Frame<'_>) -> Result<RuntimeValue, RenderError> {
    stack
        .pop()
        .ok_or_else(|| corrupt(frame, "operand stack underflow"))
}

fn corrupt(frame: Frame<'_>, message: &str) -> RenderError {
    let location = match frame.block {
        Some(block) => format!("{} (block `{}`)", message, block),
        None => message.to_string(),
    };
    RenderError::Corrupt {
        unit: frame.owner.name().to_string(),
        message: location,
    }
}
