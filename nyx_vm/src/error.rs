//! Runtime error types for the VM.
//!
//! Runtime failures carry the offending byte, address, or name rather than
//! a source span; there is no in-language trap handler, so any of these
//! bubbles out of the execution loop and terminates the run.

use thiserror::Error;

/// The result type used throughout the VM.
pub type VmResult<T> = Result<T, VmError>;

/// A fatal runtime error.
#[derive(Error, Debug)]
pub enum VmError {
    /// An opcode byte past the last defined opcode.
    #[error("invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),

    /// A register id byte outside the enumeration.
    #[error("invalid register byte: {0:#04x}")]
    InvalidRegister(u8),

    /// A data-size byte outside the six widths.
    #[error("invalid data size byte: {0:#04x}")]
    InvalidDataSize(u8),

    /// An addressing-variant tag other than the two defined ones.
    #[error("unknown addressing variant: {0:#04x}")]
    UnknownAddressingVariant(u8),

    /// Instruction fetch ran past the end of memory.
    #[error("instruction pointer out of bounds: {0:#x}")]
    InstructionPointerOutOfBounds(usize),

    /// A data access fell outside every memory block.
    #[error("address out of bounds: {0:#x}")]
    AddressOutOfBounds(usize),

    /// A push would move `sp` below zero.
    #[error("stack overflow")]
    StackOverflow,

    /// A pop would move `sp` past the end of memory.
    #[error("stack underflow")]
    StackUnderflow,

    /// Integer division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A syscall index with no table entry.
    #[error("unknown syscall: {0:#x}")]
    UnknownSyscall(usize),

    /// `free` of an address that is not a dynamic block base.
    #[error("invalid free address: {0:#x}")]
    InvalidFreeAddress(usize),

    /// `call_ex` of a symbol no loaded library exports.
    #[error("extension symbol not found: {0}")]
    SymbolNotFound(String),

    /// A dynamic library failed to open.
    #[error("failed to load extension library {path}: {message}")]
    ExtensionLoadFailed {
        /// The library path as read from the instruction stream.
        path: String,
        /// The loader's failure description.
        message: String,
    },

    /// An image shorter than the 8-byte entry header.
    #[error("image too small: expected at least 8 bytes for the entry header, got {0} bytes")]
    ImageTooSmall(usize),

    /// An entry offset outside the program bytes.
    #[error("invalid entry point: {entry:#x} is outside the program ({program_size} bytes)")]
    InvalidEntryPoint {
        /// The entry offset from the header.
        entry: u64,
        /// Program size in bytes.
        program_size: usize,
    },

    /// A program that does not fit the configured memory size.
    #[error("program too large: {program_size} bytes exceeds available memory ({memory_size} bytes)")]
    ProgramTooLarge {
        /// Program size in bytes.
        program_size: usize,
        /// Configured memory size in bytes.
        memory_size: usize,
    },

    /// An OS-level failure inside a syscall body.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
