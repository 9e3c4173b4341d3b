//! Preprocessor, bytecode builder, and assembler for the Nyx toolchain.
//!
//! The crate owns the middle of the pipeline:
//!
//! ```text
//! AST statements → [Preprocessor] → expanded AST → [Assembler] → image
//! ```
//!
//! and the image format itself: the stable one-byte opcode map, the
//! two-section [`BytecodeBuilder`], and the 8-byte entry-point header.

pub mod assembler;
pub mod bytecode;
pub mod preprocessor;

pub use assembler::Assembler;
pub use bytecode::builder::BytecodeBuilder;
pub use bytecode::opcode::Opcode;
pub use bytecode::{Section, ADDRESSING_REGISTER_BASE, ADDRESSING_IMMEDIATE_BASE, IMAGE_HEADER_LEN};
pub use preprocessor::Preprocessor;
