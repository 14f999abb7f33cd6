//! Live template instances.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Weak};

use crate::context::Context;
use crate::engine::{Engine, EngineInner};
use crate::error::{CycleError, RenderError};
use crate::executor;
use crate::settings::Settings;
use crate::unit::{CompiledUnit, MacroRoutine, Routine};

/// An instantiated unit, bound to its engine and optional parent.
/// Immutable once built, so one instance serves any number of concurrent
/// renders.
pub struct Template {
    unit: Arc<CompiledUnit>,
    source: Arc<str>,
    engine: Weak<EngineInner>,
    settings: Arc<Settings>,
    parent: Option<Arc<Template>>,
}

impl Template {
    /// Links `parent` once and for all. Fails if the parent's ancestry already
    /// contains this unit.
    pub(crate) fn new(
        unit: Arc<CompiledUnit>,
        source: Arc<str>,
        engine: Weak<EngineInner>,
        settings: Arc<Settings>,
        parent: Option<Arc<Template>>,
    ) -> Result<Self, CycleError> {
        if let Some(parent) = &parent {
            let mut chain = vec![unit.name.clone()];
            let mut ancestor = Some(parent);
            while let Some(current) = ancestor {
                chain.push(current.name().to_string());
                if current.name() == unit.name {
                    return Err(CycleError { chain });
                }
                ancestor = current.parent.as_ref();
            }
        }

        Ok(Template {
            unit,
            source,
            engine,
            settings,
            parent,
        })
    }

    /// The unit name, derived from the template's filename.
    pub fn name(&self) -> &str {
        &self.unit.name
    }

    /// The unit text this instance was built from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn parent(&self) -> Option<&Arc<Template>> {
        self.parent.as_ref()
    }

    /// `None` once the owning engine has been dropped.
    pub fn engine(&self) -> Option<Engine> {
        self.engine.upgrade().map(Engine::from_inner)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn unit(&self) -> &CompiledUnit {
        &self.unit
    }

    pub fn has_block(&self, name: &str) -> bool {
        self.unit.blocks.contains_key(name)
    }

    pub fn block(&self, name: &str) -> Option<&Routine> {
        self.unit.blocks.get(name)
    }

    /// All overloads declared for `name`, in declaration order.
    pub fn macro_overloads(&self, name: &str) -> &[MacroRoutine] {
        self.unit
            .macros
            .get(name)
            .map(|overloads| overloads.as_slice())
            .unwrap_or(&[])
    }

    pub fn find_macro(&self, name: &str, arity: usize) -> Option<&MacroRoutine> {
        self.macro_overloads(name)
            .iter()
            .find(|overload| overload.arity() == arity)
    }

    /// Run the content builder. With a parent this records `self` in the
    /// context's inheritance chain and hands over to the parent; the first
    /// parentless ancestor writes its body.
    pub fn render(
        self: &Arc<Self>,
        writer: &mut dyn Write,
        context: &mut Context,
    ) -> Result<(), RenderError> {
        executor::build_content(self, writer, context)
    }

    /// Render into a fresh string.
    pub fn render_to_string(
        self: &Arc<Self>,
        context: &mut Context,
    ) -> Result<String, RenderError> {
        let mut buffer = Vec::new();
        self.render(&mut buffer, context)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.unit.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name().to_string()))
            .finish_non_exhaustive()
    }
}
