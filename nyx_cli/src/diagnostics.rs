//! Diagnostic rendering and process exit codes.
//!
//! Compile-phase diagnostics print as `file:line:col: error: message`, with
//! line and column computed from the error's span against the source text.
//! Errors attributed to an included file re-read that file for position
//! information. Runtime errors have no source location and print bare.

use nyx_core::NyxError;
use nyx_vm::VmError;

/// Successful exit.
pub const EXIT_SUCCESS: u8 = 0;
/// Any diagnostic or runtime error.
pub const EXIT_ERROR: u8 = 1;
/// Malformed command line.
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Render a compile-phase error against the root source file and return
/// the process exit code.
pub fn report_compile_error(err: &NyxError, source: &str, filename: &str) -> u8 {
    eprintln!("{}", render_compile_error(err, source, filename));
    EXIT_ERROR
}

/// Render a runtime error and return the process exit code.
pub fn report_runtime_error(err: &VmError) -> u8 {
    eprintln!("nyx: error: {err}");
    EXIT_ERROR
}

/// Render an I/O failure around the pipeline (missing input, unwritable
/// output) and return the process exit code.
pub fn report_io_error(context: &str, err: &std::io::Error) -> u8 {
    eprintln!("nyx: error: {context}: {err}");
    EXIT_ERROR
}

fn render_compile_error(err: &NyxError, source: &str, filename: &str) -> String {
    let Some(span) = err.span() else {
        return format!("nyx: error: {err}");
    };

    // Errors inside included files carry the include's path; the root
    // source text does not apply to their spans.
    if let Some(file) = err.file() {
        let (line, col) = match std::fs::read_to_string(file) {
            Ok(content) => span.line_col(&content),
            Err(_) => (1, 1),
        };
        return format!("{file}:{line}:{col}: error: {err}");
    }

    let (line, col) = span.line_col(source);
    format!("{filename}:{line}:{col}: error: {err}")
}
