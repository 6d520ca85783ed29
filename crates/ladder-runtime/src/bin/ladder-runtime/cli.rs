//! CLI definitions for ladder-runtime.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "ladder-runtime",
    version,
    about = "Ladder-diagram PLC scan runtime",
    after_help = "Examples:\n  ladder-runtime run --program ./cell.json\n  ladder-runtime run --program ./cell.json --set START=1 --cycles 20\n  ladder-runtime trace --program ./cell.json --cycles 5 --elapsed-ms 500\n  ladder-runtime validate --program ./cell.json"
)]
pub struct Cli {
    /// Show debug logs (per-cycle commits).
    #[arg(long, short, global = true)]
    pub verbose: bool,
    /// Runtime configuration file.
    #[arg(long, global = true, default_value = "runtime.toml")]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a program periodically and print image changes.
    #[command(
        after_help = "Console commands while running:\n  set <TAG> <0|1>   force a tag\n  step              run one manual cycle\n  show              print the process image\n  start | stop      resume or pause periodic scanning\n  reset             stop and clear every tag to 0\n  quit              exit"
    )]
    Run {
        /// Program file (JSON rungs of {type, tag, time} records).
        #[arg(long)]
        program: PathBuf,
        /// Scan period override in milliseconds.
        #[arg(long)]
        period_ms: Option<u64>,
        /// Stop after this many cycles.
        #[arg(long)]
        cycles: Option<u64>,
        /// Force a tag before the first cycle (TAG=0|1).
        #[arg(long = "set", value_name = "TAG=VALUE")]
        set: Vec<String>,
    },
    /// Run deterministic cycles and print the final image and trace as JSON.
    Trace {
        /// Program file.
        #[arg(long)]
        program: PathBuf,
        /// Number of cycles to run.
        #[arg(long, default_value = "1")]
        cycles: u64,
        /// Elapsed time fed to timers per cycle.
        #[arg(long, default_value = "100")]
        elapsed_ms: u64,
        /// Force a tag before the first cycle (TAG=0|1).
        #[arg(long = "set", value_name = "TAG=VALUE")]
        set: Vec<String>,
    },
    /// Run the pre-run check on a program.
    Validate {
        /// Program file.
        #[arg(long)]
        program: PathBuf,
    },
    /// Re-emit a program in canonical form.
    Export {
        /// Program file.
        #[arg(long)]
        program: PathBuf,
        /// Output file (stdout when omitted).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}
