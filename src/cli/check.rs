use std::path::PathBuf;
use std::process;

use clap::Args;

use super::{report, resolve_input, resolve_options, run_compiler, Format};

#[derive(Args)]
pub struct CheckArgs {
    /// Input source file or directory with tealang.toml
    pub input: PathBuf,
    /// Target version, 2 through 5 (default: project setting or 5)
    #[arg(long, value_parser = clap::value_parser!(u8).range(2..=5))]
    pub target_version: Option<u8>,
    /// Diagnostic output format
    #[arg(long, value_enum, default_value_t = Format::Human)]
    pub format: Format,
}

pub fn cmd_check(args: CheckArgs) {
    let CheckArgs {
        input,
        target_version,
        format,
    } = args;
    let ri = resolve_input(&input);
    let options = resolve_options(ri.project.as_ref(), target_version);

    let compilation = run_compiler(&ri.entry, &options, false);
    report(&compilation.diagnostics, &compilation.sources, format);
    if compilation.has_errors() {
        process::exit(1);
    }
    if format == Format::Human {
        eprintln!("OK: {}", input.display());
    }
}
