//! CLI entrypoint for the ladder runtime.

#[path = "ladder-runtime/cli.rs"]
mod cli;
#[path = "ladder-runtime/inspect.rs"]
mod inspect;
#[path = "ladder-runtime/run.rs"]
mod run;
#[path = "ladder-runtime/style.rs"]
mod style;

use clap::Parser;
use ladder_runtime::config::RuntimeConfig;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", style::error(format!("Error: {err:#}")));
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = RuntimeConfig::load_or_default(&cli.config)?;
    init_logging(&config, cli.verbose);

    match cli.command {
        Command::Run {
            program,
            period_ms,
            cycles,
            set,
        } => {
            let overrides = run::parse_overrides(&set)?;
            run::run_scan(&config, &program, period_ms, cycles, &overrides)
        }
        Command::Trace {
            program,
            cycles,
            elapsed_ms,
            set,
        } => {
            let overrides = run::parse_overrides(&set)?;
            inspect::run_trace(&config, &program, cycles, elapsed_ms, &overrides)
        }
        Command::Validate { program } => inspect::run_validate(&config, &program),
        Command::Export { program, output } => inspect::run_export(&program, output.as_deref()),
    }
}

fn init_logging(config: &RuntimeConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
