//! tsgen CLI entry point

use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;
use tsgen::cli::init::{InitOutcome, run_init};
use tsgen::cli::{Command, args::Cli};

/// Logs go to stderr; `RUST_LOG` overrides the level chosen by `--verbose`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match cli.command {
        Command::Init { force } => match run_init(force) {
            Ok(InitOutcome::Created) => {
                println!("Created tsgen.toml.");
                0
            }
            Ok(InitOutcome::Overwritten) => {
                println!("Overwrote tsgen.toml.");
                0
            }
            Ok(InitOutcome::Skipped) => {
                println!("tsgen.toml already exists. Use --force to overwrite it.");
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                2
            }
        },
        Command::Reconcile {
            input,
            output,
            format,
            config,
        } => tsgen::cli::reconcile::run_reconcile(&input, output.as_deref(), format, &config),
        Command::Kinds { format } => tsgen::cli::kinds::run_kinds(format),
        Command::Shutdown {
            build_tool,
            config,
            args,
        } => tsgen::cli::shutdown::run_shutdown(build_tool.as_deref(), &args, &config),
    };

    process::exit(exit_code);
}
