//! Runtime configuration resolved from flags and environment.

use crate::args::Command;
use std::path::PathBuf;

/// Default VM memory size in bytes.
pub const DEFAULT_MEMORY_SIZE: usize = 16 * 1024;

/// Default image output path for `build`.
pub const DEFAULT_OUTPUT: &str = "out.nyb";

/// Everything the pipeline needs beyond the input path.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Ordered include search path. Starts with the working directory and
    /// ends with `NYX_STDLIB_PATH` when set.
    pub include_paths: Vec<PathBuf>,
    /// VM memory size in bytes.
    pub memory_size: usize,
    /// Dynamic libraries to preload into the VM.
    pub libraries: Vec<PathBuf>,
    /// Where `build` writes the image, and where `run` writes it when
    /// requested.
    pub output: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Resolve configuration for a parsed command.
    #[must_use]
    pub fn from_command(command: &Command) -> Self {
        let mut include_paths = vec![PathBuf::new()];
        if let Ok(stdlib) = std::env::var("NYX_STDLIB_PATH") {
            include_paths.push(PathBuf::from(stdlib));
        }

        let (memory, libraries, output) = match command {
            Command::Build { output, .. } => (None, Vec::new(), output.clone()),
            Command::Run {
                output,
                libraries,
                memory,
                ..
            } => (*memory, libraries.clone(), output.clone()),
            Command::Execute {
                libraries, memory, ..
            } => (*memory, libraries.clone(), None),
            Command::PrintHelp | Command::PrintVersion => (None, Vec::new(), None),
        };

        Self {
            include_paths,
            memory_size: memory.unwrap_or(DEFAULT_MEMORY_SIZE),
            libraries,
            output,
        }
    }

    /// The image path `build` writes to.
    #[must_use]
    pub fn build_output(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::from_command(&Command::Build {
            input: PathBuf::from("m.nyx"),
            output: None,
        });
        assert_eq!(config.memory_size, DEFAULT_MEMORY_SIZE);
        assert_eq!(config.build_output(), PathBuf::from(DEFAULT_OUTPUT));
        assert!(config.libraries.is_empty());
        assert!(!config.include_paths.is_empty());
    }

    #[test]
    fn test_run_flags_propagate() {
        let config = RuntimeConfig::from_command(&Command::Run {
            input: PathBuf::from("m.nyx"),
            output: Some(PathBuf::from("m.nyb")),
            libraries: vec![PathBuf::from("libdemo.so")],
            memory: Some(32768),
        });
        assert_eq!(config.memory_size, 32768);
        assert_eq!(config.libraries.len(), 1);
        assert_eq!(config.output, Some(PathBuf::from("m.nyb")));
    }
}
