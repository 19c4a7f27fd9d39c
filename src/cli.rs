use clap::Parser;
use std::path::PathBuf;

/// A gate-level digital logic circuit simulator.
/// Parses a circuit definition file, simulates the network cycle by
/// cycle, and reports the recorded traces of monitored signals.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about,
    long_about = "A gate-level digital logic circuit simulator.\n\
Parses a circuit definition file, simulates the network cycle by cycle,\n\
and reports the recorded traces of monitored signals.\n\
\n\
EXAMPLES:\n\
  # Interactive command-line interface:\n\
  logsim --cli adder.circuit\n\
\n\
  # Batch run: 16 cycles, print traces, exit:\n\
  logsim --cli adder.circuit --run 16\n\
\n\
  # Batch run with JSON trace output:\n\
  logsim --cli adder.circuit --run 16 --trace-json\n\
\n\
  # Graphical interface (external front-end):\n\
  logsim adder.circuit\n\
\n\
Definition files look like:\n\
  DEVICE SWITCH a(1), b(0); AND g(2);\n\
  CONNECT a -> g.I1; b -> g.I2;\n\
  MONITOR g\n\
  END\n\
\n\
See README for the full language reference."
)]
#[command(group = clap::ArgGroup::new("mode").required(true).args(["cli", "file"]))]
#[command(long_version = long_version())]
pub struct Args {
    /// Run the command-line interface on the given circuit file.
    #[arg(short = 'c', long = "cli", value_name = "FILE")]
    pub cli: Option<PathBuf>,

    /// Circuit file for the graphical interface.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Batch mode: run this many cycles, print the traces, exit.
    #[arg(long, value_name = "N")]
    pub run: Option<usize>,

    /// Print recorded traces as JSON instead of text rows.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub trace_json: bool,

    /// Verbose internal logging to stderr (also honours RUST_LOG).
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub verbose: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}

fn long_version() -> &'static str {
    Box::leak(
        format!(
            "{} (commit {}, built {})",
            env!("CARGO_PKG_VERSION"),
            option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
            option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown"),
        )
        .into_boxed_str(),
    )
}
