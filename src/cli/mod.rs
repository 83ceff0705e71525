pub mod build;
pub mod check;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;

use clap::ValueEnum;
use tealang::diagnostic::{diagnostics_to_json, render_diagnostics, Diagnostic, SourceMap};
use tealang::project::{Project, PROJECT_FILE};
use tealang::{CompileOptions, Compilation};

/// How diagnostics are printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Annotated reports on stderr.
    #[default]
    Human,
    /// A JSON array on stdout.
    Json,
}

/// Resolved input: entry file and optional project.
pub struct ResolvedInput {
    pub entry: PathBuf,
    pub project: Option<Project>,
}

fn load_project(toml_path: &Path) -> Project {
    match Project::load(toml_path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

/// Resolve an input path (source file or project directory) to an entry
/// file and the project it belongs to, if any.
pub fn resolve_input(input: &Path) -> ResolvedInput {
    if input.is_dir() {
        let toml_path = input.join(PROJECT_FILE);
        if !toml_path.exists() {
            eprintln!("error: no {} found in '{}'", PROJECT_FILE, input.display());
            process::exit(1);
        }
        let project = load_project(&toml_path);
        let Some(entry) = project.entry.clone() else {
            eprintln!("error: project '{}' has no entry file", project.name);
            eprintln!("  help: add `entry = \"main.tl\"` under [project]");
            process::exit(1);
        };
        return ResolvedInput {
            entry,
            project: Some(project),
        };
    }

    let project = Project::find(input.parent().unwrap_or(Path::new(".")))
        .map(|toml_path| load_project(&toml_path));
    ResolvedInput {
        entry: input.to_path_buf(),
        project,
    }
}

/// Defaults, then the project file, then the command line.
pub fn resolve_options(project: Option<&Project>, target_version: Option<u8>) -> CompileOptions {
    let mut options = CompileOptions::default();
    if let Some(project) = project {
        options = options.with_project(project);
    }
    if let Some(version) = target_version {
        options.version = version;
    }
    options
}

/// Read and run the compiler, exiting on I/O failure.
pub fn run_compiler(entry: &Path, options: &CompileOptions, emit: bool) -> Compilation {
    let result = if emit {
        tealang::compile_file(entry, options)
    } else {
        tealang::check_file(entry, options)
    };
    match result {
        Ok(compilation) => compilation,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", entry.display(), e);
            process::exit(1);
        }
    }
}

/// Print diagnostics in the requested format.
pub fn report(diagnostics: &[Diagnostic], sources: &SourceMap, format: Format) {
    match format {
        Format::Json => match diagnostics_to_json(diagnostics, sources) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("error: cannot serialize diagnostics: {}", e),
        },
        Format::Human if std::io::stderr().is_terminal() => {
            render_diagnostics(diagnostics, sources);
        }
        Format::Human => {
            for diag in diagnostics {
                eprintln!("{}", diag.render_plain(sources));
            }
        }
    }
}
