use std::path::PathBuf;
use std::process;

use clap::Args;
use tracing::info;

use super::{report, resolve_input, resolve_options, run_compiler, Format};

#[derive(Args)]
pub struct BuildArgs {
    /// Input source file or directory with tealang.toml
    pub input: PathBuf,
    /// Output file (default: <input>.teal, `-` for stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Target version, 2 through 5 (default: project setting or 5)
    #[arg(long, value_parser = clap::value_parser!(u8).range(2..=5))]
    pub target_version: Option<u8>,
    /// Diagnostic output format
    #[arg(long, value_enum, default_value_t = Format::Human)]
    pub format: Format,
}

pub fn cmd_build(args: BuildArgs) {
    let BuildArgs {
        input,
        output,
        target_version,
        format,
    } = args;
    let ri = resolve_input(&input);
    let options = resolve_options(ri.project.as_ref(), target_version);

    let compilation = run_compiler(&ri.entry, &options, true);
    report(&compilation.diagnostics, &compilation.sources, format);
    let Some(assembly) = compilation.assembly else {
        eprintln!("error: could not compile '{}'", ri.entry.display());
        process::exit(1);
    };

    let out_path = output.unwrap_or_else(|| ri.entry.with_extension("teal"));
    if out_path.as_os_str() == "-" {
        print!("{}", assembly);
        return;
    }
    if let Err(e) = std::fs::write(&out_path, &assembly) {
        eprintln!("error: cannot write '{}': {}", out_path.display(), e);
        process::exit(1);
    }
    info!(output = %out_path.display(), "assembly written");
    if format == Format::Human {
        eprintln!("Compiled -> {}", out_path.display());
    }
}
