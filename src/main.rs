// Main application entry point.
// Orchestrates command-line parsing, logging setup, circuit loading,
// and hands a parsed session to the text interface.

use colored::*;
use std::process::exit;
use tracing_subscriber::EnvFilter;

// Application modules
mod cli;
mod config;
mod devices;
mod diag;
mod monitors;
mod names;
mod network;
mod parser;
mod scanner;
mod sim;
mod textui;
mod util;

use config::Config;
use sim::{LoadError, Session};

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "logsim=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    // Parse command-line arguments using clap. Missing or conflicting
    // arguments print usage to stderr and exit nonzero; -h exits 0.
    let args = cli::parse_args();
    let config = Config::from(&args);
    init_logging(config.verbose);

    if !config.text_ui {
        // The graphical front-end is an external collaborator; this
        // binary only carries the command-line interface.
        eprintln!(
            "{}",
            "The graphical interface is not part of this build; use --cli <FILE>."
                .yellow()
        );
        exit(1);
    }

    let session = match Session::load(&config.path) {
        Ok(Some(session)) => session,
        Ok(None) => {
            // Recoverable definition errors: diagnostics have been
            // printed, there is nothing to simulate.
            exit(0);
        }
        Err(LoadError::Scan(e)) => {
            eprintln!("{} {e}", "error:".red().bold());
            exit(1);
        }
        Err(LoadError::Fatal(_)) => {
            // The fatal diagnostic has already been printed.
            exit(1);
        }
    };

    exit(textui::command_interface(session, &config));
}
