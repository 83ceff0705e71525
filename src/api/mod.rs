//! Library entry points: source text in, assembly or diagnostics out.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::build::build_program;
use crate::codegen::emit_program;
use crate::config::resolve::{load_modules, FsProvider, SourceProvider};
use crate::config::{CompileOptions, MAX_VERSION, MIN_VERSION};
use crate::diagnostic::{Diagnostic, SourceMap};
use crate::span::Span;
use crate::typecheck::check_program;

#[cfg(test)]
mod tests;

/// Outcome of one compiler run.
#[derive(Debug)]
pub struct Compilation {
    /// Present only when no fatal diagnostic was reported and code was requested.
    pub assembly: Option<String>,
    /// Every diagnostic, fatal or not, in the order the passes found them.
    pub diagnostics: Vec<Diagnostic>,
    /// All files that took part, for rendering diagnostics.
    pub sources: SourceMap,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_fatal())
    }

    /// Fatal diagnostics only; ambiguity notes are dropped.
    pub fn errors(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.is_fatal())
            .cloned()
            .collect()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_fatal())
    }

    /// The assembly, or the fatal error list.
    pub fn into_result(self) -> Result<String, Vec<Diagnostic>> {
        let errors = self.errors();
        match self.assembly {
            Some(assembly) if errors.is_empty() => Ok(assembly),
            _ => Err(errors),
        }
    }
}

/// Runs the pipeline: resolve imports, build, check, emit.
pub struct Compiler<'p> {
    options: CompileOptions,
    provider: &'p dyn SourceProvider,
}

impl<'p> Compiler<'p> {
    pub fn new(options: CompileOptions, provider: &'p dyn SourceProvider) -> Self {
        Self { options, provider }
    }

    /// Compile `source`, the contents of `filename`, to assembly.
    pub fn compile(&self, source: &str, filename: &str) -> Compilation {
        self.run(source, filename, true)
    }

    /// Same passes as `compile` without code generation.
    pub fn check(&self, source: &str, filename: &str) -> Compilation {
        self.run(source, filename, false)
    }

    fn run(&self, source: &str, filename: &str, emit: bool) -> Compilation {
        let version = self.options.version;
        let started = Instant::now();
        let loaded = load_modules(
            self.provider,
            &self.options.default_extension,
            filename,
            source,
        );
        let mut diagnostics = loaded.diagnostics;
        let sources = loaded.sources;
        debug!(
            modules = loaded.modules.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "resolve finished"
        );

        if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
            diagnostics.push(
                Diagnostic::semantic(
                    format!(
                        "target version {} is not supported (expected {} to {})",
                        version, MIN_VERSION, MAX_VERSION
                    ),
                    Span::file_start(0),
                )
                .with_help(format!("compile with --target-version {}", MAX_VERSION)),
            );
        }
        if diagnostics.iter().any(|d| d.is_fatal()) {
            return fail(diagnostics, sources);
        }

        let started = Instant::now();
        let (program, build_diagnostics) = build_program(&loaded.modules, version);
        diagnostics.extend(build_diagnostics);
        debug!(elapsed_us = started.elapsed().as_micros() as u64, "build finished");
        let program = match program {
            Some(program) if !diagnostics.iter().any(|d| d.is_fatal()) => program,
            _ => return fail(diagnostics, sources),
        };

        diagnostics.extend(check_program(&program));
        if diagnostics.iter().any(|d| d.is_fatal()) {
            return fail(diagnostics, sources);
        }

        let assembly = emit.then(|| emit_program(&program));
        if let Some(assembly) = &assembly {
            info!(
                file = filename,
                lines = assembly.lines().count(),
                version,
                "compiled"
            );
        }
        Compilation {
            assembly,
            diagnostics,
            sources,
        }
    }
}

fn fail(diagnostics: Vec<Diagnostic>, sources: SourceMap) -> Compilation {
    debug!(
        errors = diagnostics.iter().filter(|d| d.is_fatal()).count(),
        "compilation failed"
    );
    Compilation {
        assembly: None,
        diagnostics,
        sources,
    }
}

/// Compile a single source string with default options. Imports are
/// resolved on disk relative to `filename`.
pub fn compile(source: &str, filename: &str) -> Result<String, Vec<Diagnostic>> {
    compile_with_options(source, filename, &CompileOptions::default())
}

/// Compile a single source string with options.
pub fn compile_with_options(
    source: &str,
    filename: &str,
    options: &CompileOptions,
) -> Result<String, Vec<Diagnostic>> {
    let provider = FsProvider::new(options.search_paths.clone());
    Compiler::new(options.clone(), &provider)
        .compile(source, filename)
        .into_result()
}

/// Read and compile a file from disk.
pub fn compile_file(path: &Path, options: &CompileOptions) -> std::io::Result<Compilation> {
    let source = std::fs::read_to_string(path)?;
    let provider = FsProvider::new(options.search_paths.clone());
    let filename = path.display().to_string();
    Ok(Compiler::new(options.clone(), &provider).compile(&source, &filename))
}

/// Read and check a file from disk without generating code.
pub fn check_file(path: &Path, options: &CompileOptions) -> std::io::Result<Compilation> {
    let source = std::fs::read_to_string(path)?;
    let provider = FsProvider::new(options.search_paths.clone());
    let filename = path.display().to_string();
    Ok(Compiler::new(options.clone(), &provider).check(&source, &filename))
}
