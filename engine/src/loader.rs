//! Compiles unit text and instantiates templates from it.
//!
//! Each target name owns a slot holding the fingerprint of the last unit
//! text compiled under it and the outcome. Requests for one target are
//! serialized on the slot's lock, so an unchanged unit compiles once no
//! matter how many threads ask for it. Distinct targets never contend.

use std::collections::HashMap;
use std::hash::Hasher;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rapidhash::fast::RapidHasher;
use tracing::{debug, warn};

use crate::engine::{Engine, EngineInner};
use crate::error::{CompilationError, InstantiationCause, InstantiationError, LoadError};
use crate::template::Template;
use crate::unit::{self, CompiledUnit};

/// Builds a template from (source text, engine, parent). Produced once per
/// successful compilation.
pub(crate) type TemplateFactory = Arc<
    dyn Fn(Arc<str>, Weak<EngineInner>, Option<Arc<Template>>) -> Result<Template, LoadError>
        + Send
        + Sync,
>;

struct Compiled {
    fingerprint: u64,
    outcome: Result<TemplateFactory, CompilationError>,
}

type Slot = Arc<Mutex<Option<Compiled>>>;

pub struct Loader {
    search_path: Vec<String>,
    slots: Mutex<HashMap<String, Slot>>,
    compilations: AtomicUsize,
}

impl Loader {
    /// `search_path` lists the base types units may extend.
    pub fn new(search_path: Vec<String>) -> Self {
        Loader {
            search_path,
            slots: Mutex::new(HashMap::new()),
            compilations: AtomicUsize::new(0),
        }
    }

    pub fn search_path(&self) -> &[String] {
        &self.search_path
    }

    /// Number of times the unit backend actually ran.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::SeqCst)
    }

    /// Compile `unit_text` as `target` and build a template bound to
    /// `engine` and `parent`.
    pub fn instantiate(
        &self,
        engine: &Engine,
        unit_text: &str,
        target: &str,
        parent: Option<Arc<Template>>,
    ) -> Result<Arc<Template>, LoadError> {
        let factory = self.load(unit_text, target)?;
        let template = factory(Arc::from(unit_text), engine.downgrade(), parent)?;
        debug!(unit = target, "instantiated template");
        Ok(Arc::new(template))
    }

    fn slot(&self, target: &str) -> Slot {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(target.to_string()).or_default())
    }

    fn load(&self, unit_text: &str, target: &str) -> Result<TemplateFactory, CompilationError> {
        let fingerprint = fingerprint(unit_text);
        let slot = self.slot(target);
        let mut slot = slot.lock();

        if let Some(compiled) = slot.as_ref()
            && compiled.fingerprint == fingerprint
        {
            debug!(unit = target, "reusing compiled unit");
            return compiled.outcome.clone();
        }

        self.compilations.fetch_add(1, Ordering::SeqCst);
        debug!(unit = target, "compiling unit");

        let outcome = match unit::compile_unit(unit_text, target, &self.search_path) {
            Ok(compiled) => Ok(factory(Arc::new(compiled))),
            Err(diagnostics) => {
                warn!(
                    unit = target,
                    diagnostics = diagnostics.len(),
                    "unit rejected"
                );
                Err(CompilationError {
                    target: target.to_string(),
                    diagnostics,
                })
            }
        };

        *slot = Some(Compiled {
            fingerprint,
            outcome: outcome.clone(),
        });
        outcome
    }
}

fn factory(unit: Arc<CompiledUnit>) -> TemplateFactory {
    Arc::new(
        move |source: Arc<str>, engine: Weak<EngineInner>, parent: Option<Arc<Template>>| {
            let failure = |cause: InstantiationCause| {
                LoadError::Instantiation(InstantiationError {
                    target: unit.name.clone(),
                    cause,
                })
            };

            match &unit.constructor {
                Some(constructor) if constructor.parameters.len() == 3 => {}
                _ => return Err(failure(InstantiationCause::MissingConstructor)),
            }

            let settings = {
                let inner = engine
                    .upgrade()
                    .ok_or_else(|| failure(InstantiationCause::EngineDropped))?;
                if unit.base != inner.settings.base_template {
                    return Err(failure(InstantiationCause::IncompatibleBase {
                        expected: inner.settings.base_template.clone(),
                        found: unit.base.clone(),
                    }));
                }
                Arc::clone(&inner.settings)
            };

            Ok(Template::new(
                Arc::clone(&unit),
                source,
                engine,
                settings,
                parent,
            )?)
        },
    )
}

/// Fingerprint of the unit text, ignoring the leading meta comment whose
/// timestamp changes on every emission.
pub fn fingerprint(unit_text: &str) -> u64 {
    content_hash(strip_meta_header(unit_text))
}

pub(crate) fn content_hash(text: &str) -> u64 {
    let mut hasher = RapidHasher::default();
    hasher.write(text.as_bytes());
    hasher.finish()
}

fn strip_meta_header(unit_text: &str) -> &str {
    let trimmed = unit_text.trim_start();
    if let Some(comment) = trimmed.strip_prefix("/*")
        && let Some(end) = comment.find("*/")
    {
        return &comment[end + 2..];
    }
    unit_text
}
