//! Where template sources come from.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

/// Resolves a template name to its source text.
pub trait SourceLoader: Send + Sync {
    fn load(&self, name: &str) -> io::Result<String>;
}

/// Shared loaders, so callers can keep adding templates after handing one
/// to an engine.
impl<L: SourceLoader + ?Sized> SourceLoader for Arc<L> {
    fn load(&self, name: &str) -> io::Result<String> {
        (**self).load(name)
    }
}

/// Templates registered in memory, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryLoader {
    templates: RwLock<HashMap<String, String>>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        InMemoryLoader::default()
    }

    /// Register or replace a template.
    pub fn add(&self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.write().insert(name.into(), source.into());
    }

    pub fn with(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.add(name, source);
        self
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.templates.write().remove(name)
    }
}

impl SourceLoader for InMemoryLoader {
    fn load(&self, name: &str) -> io::Result<String> {
        self.templates.read().get(name).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no template named `{}`", name),
            )
        })
    }
}

/// Reads templates relative to a root directory.
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
    suffix: Option<String>,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileLoader {
            root: root.into(),
            suffix: None,
        }
    }

    /// Appended to every requested name, e.g. `.html`.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let mut file = name.to_string();
        if let Some(suffix) = &self.suffix {
            file.push_str(suffix);
        }
        let relative = Path::new(&file);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("template name `{}` leaves the template root", name),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl SourceLoader for FileLoader {
    fn load(&self, name: &str) -> io::Result<String> {
        std::fs::read_to_string(self.resolve(name)?)
    }
}
