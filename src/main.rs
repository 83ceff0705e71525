mod cli;

use clap::{Parser, Subcommand};

use cli::build::{cmd_build, BuildArgs};
use cli::check::{cmd_check, CheckArgs};

#[derive(Parser)]
#[command(
    name = "tealang",
    version,
    about = "Compile tealang smart contracts to TEAL assembly"
)]
struct Cli {
    /// Log filter, e.g. `debug` or `tealang=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a source file (or project) to assembly
    Build(BuildArgs),
    /// Type-check without emitting assembly
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    tealang::logging::init_with_level(cli.log_level.as_deref());

    match cli.command {
        Command::Build(args) => cmd_build(args),
        Command::Check(args) => cmd_check(args),
    }
}
