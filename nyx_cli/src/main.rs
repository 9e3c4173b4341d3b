//! Nyx — a register-based 64-bit virtual machine and its assembler.
//!
//! This is the CLI entry point: it parses arguments, builds the runtime
//! configuration from flags and environment, and dispatches to the
//! build/run/execute pipeline.

mod args;
mod config;
mod diagnostics;
mod pipeline;

use args::Command;
use config::RuntimeConfig;
use std::process::ExitCode;

fn main() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().skip(1).collect();

    let command = match args::parse_args_vec(&raw_args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("nyx: {e}");
            eprintln!("{}", args::usage_line());
            return ExitCode::from(diagnostics::EXIT_USAGE_ERROR);
        }
    };

    match &command {
        Command::PrintVersion => {
            println!("{}", args::version_string());
            return ExitCode::SUCCESS;
        }
        Command::PrintHelp => {
            println!("{}", args::help_text());
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    let config = RuntimeConfig::from_command(&command);

    let code = match command {
        Command::Build { input, .. } => pipeline::build(&input, &config),
        Command::Run { input, .. } => pipeline::run(&input, &config),
        Command::Execute { input, .. } => pipeline::execute(&input, &config),
        Command::PrintHelp | Command::PrintVersion => unreachable!("handled above"),
    };
    ExitCode::from(code)
}
