//! Command-line argument parsing for the `nyx` binary.
//!
//! Three subcommands (with single-letter aliases) plus `--help`/`--version`:
//!
//! ```text
//! nyx build FILE [-o OUT]
//! nyx run FILE [-o OUT] [-l LIB]... [--mem N]
//! nyx execute FILE [-l LIB]... [--mem N]
//! ```

use std::path::PathBuf;

/// A parsed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Compile a source file to a bytecode image.
    Build {
        /// Source file to compile.
        input: PathBuf,
        /// Image output path; defaults to `out.nyb`.
        output: Option<PathBuf>,
    },
    /// Compile and execute a source file.
    Run {
        /// Source file to compile and run.
        input: PathBuf,
        /// Optional image output path; the image is only written when set.
        output: Option<PathBuf>,
        /// Dynamic libraries to preload.
        libraries: Vec<PathBuf>,
        /// VM memory size in bytes.
        memory: Option<usize>,
    },
    /// Execute an existing bytecode image.
    Execute {
        /// Image file to execute.
        input: PathBuf,
        /// Dynamic libraries to preload.
        libraries: Vec<PathBuf>,
        /// VM memory size in bytes.
        memory: Option<usize>,
    },
    /// `--help`.
    PrintHelp,
    /// `--version`.
    PrintVersion,
}

/// Parse an argument vector (without the program name).
pub fn parse_args_vec(args: &[String]) -> Result<Command, String> {
    let Some(subcommand) = args.first() else {
        return Err("missing subcommand".to_string());
    };

    match subcommand.as_str() {
        "--help" | "-h" | "help" => Ok(Command::PrintHelp),
        "--version" | "-V" | "version" => Ok(Command::PrintVersion),
        "build" | "b" => {
            let parsed = parse_options(&args[1..], false)?;
            Ok(Command::Build {
                input: parsed.require_input()?,
                output: parsed.output,
            })
        }
        "run" | "r" => {
            let parsed = parse_options(&args[1..], true)?;
            Ok(Command::Run {
                input: parsed.require_input()?,
                output: parsed.output,
                libraries: parsed.libraries,
                memory: parsed.memory,
            })
        }
        "execute" | "x" => {
            let parsed = parse_options(&args[1..], true)?;
            if parsed.output.is_some() {
                return Err("execute does not take -o/--output".to_string());
            }
            Ok(Command::Execute {
                input: parsed.require_input()?,
                libraries: parsed.libraries,
                memory: parsed.memory,
            })
        }
        other => Err(format!("unknown subcommand '{other}'")),
    }
}

#[derive(Default)]
struct ParsedOptions {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    libraries: Vec<PathBuf>,
    memory: Option<usize>,
}

impl ParsedOptions {
    fn require_input(&self) -> Result<PathBuf, String> {
        self.input
            .clone()
            .ok_or_else(|| "missing input file".to_string())
    }
}

fn parse_options(args: &[String], vm_flags: bool) -> Result<ParsedOptions, String> {
    let mut parsed = ParsedOptions::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                let value = iter
                    .next()
                    .ok_or_else(|| format!("{arg} requires a path"))?;
                parsed.output = Some(PathBuf::from(value));
            }
            "-l" | "--lib" if vm_flags => {
                let value = iter
                    .next()
                    .ok_or_else(|| format!("{arg} requires a path"))?;
                parsed.libraries.push(PathBuf::from(value));
            }
            "-m" | "--mem" | "--memory" if vm_flags => {
                let value = iter
                    .next()
                    .ok_or_else(|| format!("{arg} requires a byte count"))?;
                let bytes: usize = value
                    .parse()
                    .map_err(|_| format!("invalid memory size '{value}'"))?;
                parsed.memory = Some(bytes);
            }
            flag if flag.starts_with('-') => {
                return Err(format!("unknown option '{flag}'"));
            }
            positional => {
                if parsed.input.is_some() {
                    return Err(format!("unexpected extra argument '{positional}'"));
                }
                parsed.input = Some(PathBuf::from(positional));
            }
        }
    }

    Ok(parsed)
}

/// One-line usage summary for error output.
pub fn usage_line() -> &'static str {
    "usage: nyx <build|run|execute> FILE [options] (see nyx --help)"
}

/// Full help text.
pub fn help_text() -> String {
    format!(
        "{version}

usage:
    nyx build FILE [-o OUT]                  compile FILE to a bytecode image
    nyx run FILE [-o OUT] [-l LIB]... [--mem N]
                                             compile FILE and run it
    nyx execute FILE [-l LIB]... [--mem N]   run an existing image

options:
    -o, --output OUT    image output path (default: out.nyb)
    -l, --lib LIB       preload a dynamic extension library (repeatable)
    -m, --mem N         VM memory size in bytes (default: {mem})
    -h, --help          print this help
    -V, --version       print the version

environment:
    NYX_STDLIB_PATH     extra directory appended to the include search path",
        version = version_string(),
        mem = crate::config::DEFAULT_MEMORY_SIZE,
    )
}

/// `nyx <version>`.
pub fn version_string() -> String {
    format!("nyx {}", env!("CARGO_PKG_VERSION"))
}
