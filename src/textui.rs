// Line-oriented command interface over a simulation session.
// Reads commands from stdin, writes traces and status to stdout;
// diagnostics and warnings go to stderr.

use crate::config::Config;
use crate::sim::Session;
use crate::util;
use colored::*;
use std::io::{self, BufRead, Write};
use std::time::Instant;

const HELP: &str = "\
Commands:
  r N           run N cycles from a cold start
  c N           continue for N more cycles
  s NAME 0|1    set a switch
  m NAME[.PORT] toggle a monitor
  l             list monitored and unmonitored signals
  d             display recorded traces
  j             dump recorded traces as JSON
  h             show this help
  q             quit
";

/// Runs the interactive loop (or a single batch run) over a parsed
/// session. Returns the process exit code.
pub fn command_interface(mut session: Session, config: &Config) -> i32 {
    if let Some(cycles) = config.batch_cycles {
        return batch_run(&mut session, config, cycles);
    }

    println!(
        "{}",
        format!("Logic simulator: {}", config.path.display()).bold()
    );
    println!("{}", "Type 'h' for help.".dimmed());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            // EOF on stdin: leave quietly.
            break;
        };
        let mut words = line.split_whitespace();
        match words.next() {
            None => {}
            Some("h") | Some("help") => print!("{HELP}"),
            Some("q") | Some("quit") => break,
            Some("r") => match parse_count(words.next()) {
                Some(n) => run_cycles(&mut session, n, false),
                None => usage("r N"),
            },
            Some("c") => match parse_count(words.next()) {
                Some(n) => run_cycles(&mut session, n, true),
                None => usage("c N"),
            },
            Some("s") => {
                let name = words.next();
                let level = words.next();
                match (name, level) {
                    (Some(name), Some("0" | "1")) => {
                        let on = level == Some("1");
                        match session.set_switch(name, on) {
                            Ok(()) => println!("{name} set to {}", u8::from(on)),
                            Err(e) => eprintln!("{} {e}", "error:".red().bold()),
                        }
                    }
                    _ => usage("s NAME 0|1"),
                }
            }
            Some("m") => match words.next() {
                Some(signal) => {
                    let (device, port) = match signal.split_once('.') {
                        Some((d, p)) => (d, Some(p)),
                        None => (signal, None),
                    };
                    match session.toggle_monitor(device, port) {
                        Ok(true) => println!("monitoring {signal}"),
                        Ok(false) => println!("stopped monitoring {signal}"),
                        Err(e) => eprintln!("{} {e}", "error:".red().bold()),
                    }
                }
                None => usage("m NAME[.PORT]"),
            },
            Some("l") => {
                let (monitored, unmonitored) = session.signal_names();
                println!("monitored:   {}", monitored.join(" "));
                println!("unmonitored: {}", unmonitored.join(" "));
            }
            Some("d") => print!("{}", display(&session)),
            Some("j") => println!("{}", session.traces_json()),
            Some(other) => {
                eprintln!(
                    "{} unknown command {other:?}; type 'h' for help",
                    "error:".red().bold()
                );
            }
        }
    }
    0
}

fn batch_run(session: &mut Session, config: &Config, cycles: usize) -> i32 {
    run_cycles(session, cycles, false);
    if config.trace_json {
        println!("{}", session.traces_json());
    } else {
        print!("{}", display(session));
    }
    0
}

fn run_cycles(session: &mut Session, cycles: usize, continuing: bool) {
    let started = Instant::now();
    let outcome = if continuing {
        session.continue_run(cycles)
    } else {
        session.run(cycles)
    };
    match outcome {
        Ok(()) => {
            let verb = if continuing { "Continued for" } else { "Ran" };
            println!(
                "{}",
                format!(
                    "{verb} {cycles} cycles in {}. Total: {}",
                    util::format_duration(started.elapsed()),
                    session.cycles_completed()
                )
                .green()
            );
        }
        Err(_) => println!("{}", "Error! Network oscillating.".red().bold()),
    }
}

fn display(session: &Session) -> String {
    #[cfg(feature = "debug_traces")]
    {
        let _ = session;
        crate::monitors::synthetic_display()
    }
    #[cfg(not(feature = "debug_traces"))]
    {
        session.display_signals()
    }
}

fn parse_count(word: Option<&str>) -> Option<usize> {
    word.and_then(|w| w.parse().ok()).filter(|&n| n > 0)
}

fn usage(expected: &str) {
    eprintln!("{} usage: {expected}", "error:".red().bold());
}
