use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolves a template name to its source text.
pub trait Loader {
    fn load(&self, name: &str) -> Result<String, LoadError>;
}

impl<L: Loader + ?Sized> Loader for &L {
    fn load(&self, name: &str) -> Result<String, LoadError> {
        (**self).load(name)
    }
}

#[derive(Debug)]
pub enum LoadError {
    NotFound(String),
    Io { name: String, source: io::Error },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NotFound(name) => write!(f, "template not found: {}", name),
            LoadError::Io { name, source } => write!(f, "cannot read template '{}': {}", name, source),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::NotFound(_) => None,
            LoadError::Io { source, .. } => Some(source),
        }
    }
}

/// Loads templates from files below a root directory. Names are paths
/// relative to the root and may not leave it.
#[derive(Debug, Clone)]
pub struct FilesystemLoader {
    root: PathBuf,
}

impl FilesystemLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FilesystemLoader { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || name.is_empty() {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl Loader for FilesystemLoader {
    fn load(&self, name: &str) -> Result<String, LoadError> {
        let path = self
            .resolve(name)
            .ok_or_else(|| LoadError::NotFound(name.to_string()))?;
        if !path.is_file() {
            return Err(LoadError::NotFound(name.to_string()));
        }
        std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
            name: name.to_string(),
            source,
        })
    }
}

/// Serves templates from an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    templates: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        MemoryLoader::default()
    }

    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }
}

impl Loader for MemoryLoader {
    fn load(&self, name: &str) -> Result<String, LoadError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(name.to_string()))
    }
}
