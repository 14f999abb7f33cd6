use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use quill::RootNode;
use quill::parser::Parser;
use tracing::debug;

use crate::context::Context;
use crate::emitter::Emitter;
use crate::error::{CycleError, EngineError};
use crate::loader::{self, Loader};
use crate::runtime_value::RuntimeValue;
use crate::settings::Settings;
use crate::source::SourceLoader;
use crate::template::Template;

/// Built-in base type every unit may extend.
pub const DEFAULT_BASE_TEMPLATE: &str = "Template";

struct CachedTemplate {
    fingerprint: u64,
    template: Arc<Template>,
}

type CacheSlot = Arc<Mutex<Option<CachedTemplate>>>;

pub(crate) struct EngineInner {
    pub(crate) settings: Arc<Settings>,
    sources: Box<dyn SourceLoader>,
    loader: Loader,
    cache: Mutex<HashMap<String, CacheSlot>>,
}

/// Entry point: loads, compiles, caches and renders templates.
///
/// Cloning is cheap and every clone shares the same caches. Templates keep
/// only a weak reference back to the engine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn new(sources: impl SourceLoader + 'static) -> Self {
        Engine::with_settings(sources, Settings::default())
    }

    pub fn with_settings(sources: impl SourceLoader + 'static, settings: Settings) -> Self {
        let mut search_path = vec![DEFAULT_BASE_TEMPLATE.to_string()];
        if settings.base_template != DEFAULT_BASE_TEMPLATE {
            search_path.push(settings.base_template.clone());
        }
        Engine {
            inner: Arc::new(EngineInner {
                settings: Arc::new(settings),
                sources: Box::new(sources),
                loader: Loader::new(search_path),
                cache: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<EngineInner>) -> Self {
        Engine { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<EngineInner> {
        Arc::downgrade(&self.inner)
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn loader(&self) -> &Loader {
        &self.inner.loader
    }

    /// Name of the unit generated for `filename`. ASCII letters and digits
    /// are kept, `_` is doubled and any other character becomes `_<hex>_`,
    /// so distinct filenames never share a unit name.
    pub fn template_unit_name(&self, filename: &str) -> String {
        let mut name = String::from("Template_");
        for c in filename.chars() {
            match c {
                c if c.is_ascii_alphanumeric() => name.push(c),
                '_' => name.push_str("__"),
                c => name.push_str(&format!("_{:x}_", u32::from(c))),
            }
        }
        name
    }

    /// Base type that generated units extend.
    pub fn base_template(&self) -> &str {
        &self.inner.settings.base_template
    }

    /// Parse template source with the reference parser.
    pub fn parse(&self, filename: &str, source: &str) -> Result<RootNode, EngineError> {
        Parser::new(filename, source.to_string(), 0)
            .parse()
            .map_err(|errors| EngineError::Parse {
                filename: filename.to_string(),
                text: source.to_string(),
                errors,
            })
    }

    /// Text of the executable unit for `root`.
    pub fn emit_unit(&self, root: &RootNode) -> String {
        Emitter::new(self).compile(root)
    }

    /// Assemble and instantiate a parsed template. `parent` must be the
    /// built template of `root.parent_filename`, if there is one.
    pub fn compile(
        &self,
        root: &RootNode,
        parent: Option<Arc<Template>>,
    ) -> Result<Arc<Template>, EngineError> {
        if let (Some(parent_name), None) = (&root.parent_filename, &parent) {
            return Err(EngineError::UnlinkedParent {
                filename: root.filename.clone(),
                parent: parent_name.clone(),
            });
        }

        let unit = self.emit_unit(root);
        let target = self.template_unit_name(&root.filename);
        Ok(self.loader().instantiate(self, &unit, &target, parent)?)
    }

    /// Load, parse and build `filename` and its ancestors.
    pub fn get_template(&self, filename: &str) -> Result<Arc<Template>, EngineError> {
        let mut linking = Vec::new();
        self.link(filename, &mut linking)
    }

    /// `linking` holds the templates whose parents are being resolved, so a
    /// name seen twice closes a cycle.
    fn link(
        &self,
        filename: &str,
        linking: &mut Vec<String>,
    ) -> Result<Arc<Template>, EngineError> {
        if let Some(position) = linking.iter().position(|name| name == filename) {
            let mut chain = linking[position..].to_vec();
            chain.push(filename.to_string());
            return Err(CycleError { chain }.into());
        }

        linking.push(filename.to_string());
        let result = self.build(filename, linking);
        linking.pop();
        result
    }

    fn build(
        &self,
        filename: &str,
        linking: &mut Vec<String>,
    ) -> Result<Arc<Template>, EngineError> {
        let source = self
            .inner
            .sources
            .load(filename)
            .map_err(|source| EngineError::Source {
                name: filename.to_string(),
                source,
            })?;
        let root = self.parse(filename, &source)?;

        let parent = match &root.parent_filename {
            Some(parent) => Some(self.link(parent, linking)?),
            None => None,
        };

        if !self.settings().cache_templates {
            return self.compile(&root, parent);
        }

        let fingerprint = loader::content_hash(&source);
        let slot = self.cache_slot(filename);
        let mut slot = slot.lock();

        if let Some(cached) = slot.as_ref()
            && cached.fingerprint == fingerprint
            && same_parent(cached.template.parent(), parent.as_ref())
        {
            debug!(template = filename, "template cache hit");
            return Ok(Arc::clone(&cached.template));
        }

        let template = self.compile(&root, parent)?;
        *slot = Some(CachedTemplate {
            fingerprint,
            template: Arc::clone(&template),
        });
        Ok(template)
    }

    fn cache_slot(&self, filename: &str) -> CacheSlot {
        let mut cache = self.inner.cache.lock();
        Arc::clone(cache.entry(filename.to_string()).or_default())
    }

    /// Render `filename` with the given variables into a string.
    pub fn render<K, V>(
        &self,
        filename: &str,
        variables: impl IntoIterator<Item = (K, V)>,
    ) -> Result<String, EngineError>
    where
        K: Into<String>,
        V: Into<RuntimeValue>,
    {
        let mut buffer = Vec::new();
        self.render_to(filename, variables, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Render `filename` into `writer`, streaming as it goes.
    pub fn render_to<K, V>(
        &self,
        filename: &str,
        variables: impl IntoIterator<Item = (K, V)>,
        writer: &mut dyn Write,
    ) -> Result<(), EngineError>
    where
        K: Into<String>,
        V: Into<RuntimeValue>,
    {
        let template = self.get_template(filename)?;
        let mut context = Context::with_variables(variables);
        template.render(writer, &mut context)?;
        Ok(())
    }
}

fn same_parent(cached: Option<&Arc<Template>>, current: Option<&Arc<Template>>) -> bool {
    match (cached, current) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}
