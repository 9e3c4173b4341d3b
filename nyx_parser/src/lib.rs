//! Lexer, parser, and AST for the Nyx assembly language.
//!
//! The surface language is line-oriented assembly with preprocessor
//! directives (`#define`, `#include`, conditionals), assembler directives
//! (`.section`, `.entry`, data emission), and one mnemonic per statement.
//! Identifiers and string literals are interned into [`nyx_core::Symbol`]s
//! at parse time.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{BinaryOperator, Expression, SectionKind, Statement, UnaryOperator};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Token, TokenKind};

use nyx_core::{Interner, NyxResult};
use std::sync::Arc;

/// Lex and parse a complete source file into statements.
///
/// Convenience entry point used by the pipeline and by tests.
pub fn parse(source: &str, interner: &Arc<Interner>) -> NyxResult<Vec<Statement>> {
    let lexer = Lexer::new(source);
    Parser::new(lexer, Arc::clone(interner)).parse()
}
