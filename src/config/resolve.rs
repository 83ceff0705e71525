//! Module resolution: turns the import graph of a main file into an
//! ordered list of parsed modules, dependencies first.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::stdlib;
use crate::build::SourceModule;
use crate::cst::Import;
use crate::diagnostic::{Diagnostic, SourceMap};
use crate::span::Spanned;
use crate::syntax::parse_source;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("module '{path}' not found")]
    NotFound { path: String, searched: Vec<PathBuf> },
    #[error("unknown standard library module '{name}'")]
    UnknownStdlib { name: String },
    #[error("import cycle: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Text of one module plus the key it is deduplicated by.
#[derive(Clone, Debug)]
pub struct ProvidedSource {
    pub key: String,
    pub name: String,
    pub text: String,
}

/// Where user modules come from.
pub trait SourceProvider {
    /// Find `path`, imported by the module whose key is `importer`.
    fn load(&self, path: &Path, importer: &str) -> Result<ProvidedSource, ResolveError>;

    /// Key of the main file, so that importing it back is seen as a cycle.
    fn main_key(&self, filename: &str) -> String {
        filename.to_string()
    }
}

/// Reads modules from disk: next to the importing file first, then the
/// search paths in order.
#[derive(Clone, Debug, Default)]
pub struct FsProvider {
    pub search_paths: Vec<PathBuf>,
}

impl FsProvider {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }
}

impl SourceProvider for FsProvider {
    fn load(&self, path: &Path, importer: &str) -> Result<ProvidedSource, ResolveError> {
        let base = Path::new(importer).parent().unwrap_or(Path::new(""));
        let candidates: Vec<PathBuf> = std::iter::once(base.join(path))
            .chain(self.search_paths.iter().map(|dir| dir.join(path)))
            .collect();

        let Some(found) = candidates.iter().find(|c| c.is_file()) else {
            return Err(ResolveError::NotFound {
                path: path.display().to_string(),
                searched: candidates,
            });
        };
        let text = std::fs::read_to_string(found).map_err(|source| ResolveError::Io {
            path: found.clone(),
            source,
        })?;
        let key = std::fs::canonicalize(found).unwrap_or_else(|_| found.clone());
        Ok(ProvidedSource {
            key: key.display().to_string(),
            name: found.display().to_string(),
            text,
        })
    }

    fn main_key(&self, filename: &str) -> String {
        std::fs::canonicalize(filename)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| filename.to_string())
    }
}

/// In-memory modules addressed by their path as written in the import.
#[derive(Clone, Debug, Default)]
pub struct MemoryProvider {
    files: HashMap<String, String>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }
}

impl SourceProvider for MemoryProvider {
    fn load(&self, path: &Path, _importer: &str) -> Result<ProvidedSource, ResolveError> {
        let key = path.to_string_lossy().replace('\\', "/");
        match self.files.get(&key) {
            Some(text) => Ok(ProvidedSource {
                key: key.clone(),
                name: key,
                text: text.clone(),
            }),
            None => Err(ResolveError::NotFound {
                path: key,
                searched: Vec::new(),
            }),
        }
    }
}

/// Relative path of a user import: dotted names become directories, and the
/// default extension is added when the import has none.
pub fn import_path(import: &Import, default_extension: &str) -> PathBuf {
    let extension = default_extension.trim_start_matches('.');
    match import {
        Import::Dotted(parts) => {
            let mut path = PathBuf::from(parts.join("/"));
            path.set_extension(extension);
            path
        }
        Import::Path(raw) => {
            let mut path = PathBuf::from(raw);
            if path.extension().is_none() {
                path.set_extension(extension);
            }
            path
        }
    }
}

/// Everything loaded for one compilation.
#[derive(Debug)]
pub struct LoadedModules {
    /// Dependencies first, the main module last.
    pub modules: Vec<SourceModule>,
    pub sources: SourceMap,
    /// Syntax and resolution errors, plus non-fatal parser notes.
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ModuleLoader<'a> {
    provider: &'a dyn SourceProvider,
    default_extension: String,
    sources: SourceMap,
    modules: Vec<SourceModule>,
    /// Keys of modules currently being loaded, outermost first.
    stack: Vec<String>,
    loaded: HashSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ModuleLoader<'a> {
    pub fn new(provider: &'a dyn SourceProvider, default_extension: &str) -> Self {
        Self {
            provider,
            default_extension: default_extension.to_string(),
            sources: SourceMap::new(),
            modules: Vec::new(),
            stack: Vec::new(),
            loaded: HashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Load the main file and, transitively, everything it imports.
    /// `key` identifies the main file to the provider (its path on disk).
    pub fn load(mut self, name: &str, key: &str, text: &str) -> LoadedModules {
        let source = ProvidedSource {
            key: key.to_string(),
            name: name.to_string(),
            text: text.to_string(),
        };
        self.load_module(source, true);
        debug!(modules = self.modules.len(), files = self.sources.len(), "modules resolved");
        LoadedModules {
            modules: self.modules,
            sources: self.sources,
            diagnostics: self.diagnostics,
        }
    }

    fn load_module(&mut self, source: ProvidedSource, is_main: bool) {
        let file_id = self.sources.add(source.name.clone(), source.text.clone());
        debug!(module = %source.name, file_id, "loading module");
        self.stack.push(source.key.clone());

        match parse_source(&source.text, file_id) {
            Ok(parsed) => {
                self.diagnostics.extend(parsed.notes);
                for import in &parsed.module.imports {
                    self.load_import(import, &source.key);
                }
                self.modules.push(SourceModule {
                    name: source.name,
                    file_id,
                    module: parsed.module,
                    is_main,
                });
            }
            Err(errors) => self.diagnostics.extend(errors),
        }

        self.stack.pop();
        self.loaded.insert(source.key);
    }

    fn load_import(&mut self, import: &Spanned<Import>, importer: &str) {
        let provided = match self.locate(&import.node, importer) {
            Ok(provided) => provided,
            Err(err) => {
                self.diagnostics.push(resolve_diagnostic(&err, import));
                return;
            }
        };

        if let Some(pos) = self.stack.iter().position(|key| *key == provided.key) {
            let mut chain: Vec<String> = self.stack[pos..].to_vec();
            chain.push(provided.key);
            let err = ResolveError::Cycle { chain };
            self.diagnostics.push(resolve_diagnostic(&err, import));
            return;
        }
        if self.loaded.contains(&provided.key) {
            return;
        }
        self.load_module(provided, false);
    }

    fn locate(&self, import: &Import, importer: &str) -> Result<ProvidedSource, ResolveError> {
        let name = import.module_name();
        if stdlib::is_stdlib(&name) {
            return match stdlib::lookup(&name) {
                Some(text) => Ok(ProvidedSource {
                    key: name.clone(),
                    name,
                    text: text.to_string(),
                }),
                None => Err(ResolveError::UnknownStdlib { name }),
            };
        }
        let path = import_path(import, &self.default_extension);
        self.provider.load(&path, importer)
    }
}

fn resolve_diagnostic(err: &ResolveError, import: &Spanned<Import>) -> Diagnostic {
    let diag = Diagnostic::semantic(err.to_string(), import.span);
    match err {
        ResolveError::NotFound { searched, .. } if !searched.is_empty() => {
            let places: Vec<String> = searched.iter().map(|p| p.display().to_string()).collect();
            diag.with_note(format!("searched: {}", places.join(", ")))
        }
        ResolveError::Cycle { .. } => diag.with_help(
            "move the shared definitions into a module that imports neither".to_string(),
        ),
        _ => diag,
    }
}

/// Resolve the imports of `text` through `provider`.
pub fn load_modules(
    provider: &dyn SourceProvider,
    default_extension: &str,
    name: &str,
    text: &str,
) -> LoadedModules {
    let key = provider.main_key(name);
    ModuleLoader::new(provider, default_extension).load(name, &key, text)
}
