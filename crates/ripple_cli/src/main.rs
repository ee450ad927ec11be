//! Ripple CLI, the command-line interface for the Ripple simulation kernel.
//!
//! Provides `ripple run` for running one of the bundled testbenches and
//! `ripple list` for listing them.

#![warn(missing_docs)]

mod list;
mod run;

use std::process;

use clap::{Parser, Subcommand};
use ripple_testbench::Bench;
use tracing_subscriber::EnvFilter;

/// Ripple: a delta-cycle digital-logic simulation kernel.
#[derive(Parser, Debug)]
#[command(name = "ripple", version, about = "Ripple simulation kernel")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a `ripple.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a bundled testbench.
    Run(RunArgs),
    /// List the bundled testbenches.
    List,
}

/// Arguments for the `ripple run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Testbench name (`counter` or `divide`).
    pub bench: Bench,

    /// Tick at which the run stops.
    #[arg(long)]
    pub time: Option<u64>,

    /// Output path for the VCD file.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Disable waveform recording.
    #[arg(long)]
    pub no_waveform: bool,

    /// Print every signal's final value.
    #[arg(long)]
    pub signals: bool,

    /// Counter model: ticks between clock toggles.
    #[arg(long)]
    pub period: Option<u64>,

    /// Counter model: counter width in bits.
    #[arg(long)]
    pub width: Option<u32>,

    /// Divider model: dividend.
    #[arg(long, allow_hyphen_values = true)]
    pub dividend: Option<i64>,

    /// Divider model: divider.
    #[arg(long, allow_hyphen_values = true)]
    pub divider: Option<i64>,

    /// Divider model: treat operands as two's complement.
    #[arg(long)]
    pub signed: bool,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Run(ref args) => run::run(args, &global),
        Command::List => list::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Default log filter for the given flags; `RUST_LOG` overrides it.
///
/// Warnings (failed checks among them) are shown unless `-q` is given.
fn default_filter(global: &GlobalArgs) -> &'static str {
    match (global.quiet, global.verbose) {
        (true, _) => "error",
        (false, true) => "debug",
        (false, false) => "warn",
    }
}

/// Installs the stderr `tracing` subscriber.
fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(global)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
