//! Execution pipeline: source → lex/parse → preprocess → assemble → VM.

use crate::config::RuntimeConfig;
use crate::diagnostics;
use nyx_asm::{Assembler, Preprocessor};
use nyx_core::{Interner, NyxResult};
use nyx_vm::Vm;
use std::path::Path;
use std::sync::Arc;

/// `nyx build FILE`: compile to an image on disk.
pub fn build(input: &Path, config: &RuntimeConfig) -> u8 {
    let source = match std::fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) => {
            return diagnostics::report_io_error(&format!("cannot read {}", input.display()), &e);
        }
    };

    let image = match compile_source(&source, config) {
        Ok(image) => image,
        Err(e) => {
            return diagnostics::report_compile_error(&e, &source, &input.display().to_string());
        }
    };

    let output = config.build_output();
    if let Err(e) = std::fs::write(&output, image) {
        return diagnostics::report_io_error(&format!("cannot write {}", output.display()), &e);
    }
    diagnostics::EXIT_SUCCESS
}

/// `nyx run FILE`: compile, optionally write the image, and execute.
pub fn run(input: &Path, config: &RuntimeConfig) -> u8 {
    let source = match std::fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) => {
            return diagnostics::report_io_error(&format!("cannot read {}", input.display()), &e);
        }
    };

    let image = match compile_source(&source, config) {
        Ok(image) => image,
        Err(e) => {
            return diagnostics::report_compile_error(&e, &source, &input.display().to_string());
        }
    };

    if let Some(output) = &config.output {
        if let Err(e) = std::fs::write(output, &image) {
            return diagnostics::report_io_error(&format!("cannot write {}", output.display()), &e);
        }
    }

    execute_image(&image, config)
}

/// `nyx execute FILE`: run an existing image.
pub fn execute(input: &Path, config: &RuntimeConfig) -> u8 {
    let image = match std::fs::read(input) {
        Ok(bytes) => bytes,
        Err(e) => {
            return diagnostics::report_io_error(&format!("cannot read {}", input.display()), &e);
        }
    };
    execute_image(&image, config)
}

/// Compile source text through the front half of the pipeline.
fn compile_source(source: &str, config: &RuntimeConfig) -> NyxResult<Vec<u8>> {
    let interner = Arc::new(Interner::new());
    let statements = nyx_parser::parse(source, &interner)?;
    let expanded = Preprocessor::new(statements, Arc::clone(&interner))
        .with_include_paths(config.include_paths.clone())
        .process()?;
    Assembler::new(expanded, interner).assemble()
}

/// Construct a VM for the image, preload libraries, and run to completion.
fn execute_image(image: &[u8], config: &RuntimeConfig) -> u8 {
    let mut vm = match Vm::new(image, config.memory_size) {
        Ok(vm) => vm,
        Err(e) => return diagnostics::report_runtime_error(&e),
    };

    for library in &config.libraries {
        if let Err(e) = vm.load_library(library) {
            return diagnostics::report_runtime_error(&e);
        }
    }

    match vm.run() {
        Ok(()) => diagnostics::EXIT_SUCCESS,
        Err(e) => diagnostics::report_runtime_error(&e),
    }
}
