//! Token definitions for the Nyx assembly language.

use nyx_core::{Register, Span};
use std::borrow::Cow;
use std::fmt;

/// The kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input.
    Eof,
    /// A character sequence the lexer could not classify.
    Illegal,

    /// A user identifier (label or preprocessor name).
    Identifier,
    /// A register name (`q0`, `ff3`, `sp`, …).
    Register,
    /// A decimal integer literal.
    Integer,
    /// A `0x…` integer literal.
    Hexadecimal,
    /// A `0b…` integer literal.
    Binary,
    /// A `0o…` integer literal.
    Octal,
    /// A `ddd.ddd` float literal.
    Float,
    /// A string literal with escapes already processed.
    String,
    /// A data-size keyword (`byte` … `double`).
    DataSize,
    /// A section name (`text` or `data`).
    SectionName,

    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Asterisk,
    /// `/`
    Slash,
    /// `|`
    Pipe,
    /// `&`
    Ampersand,
    /// `^`
    Caret,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,

    // Preprocessor directives.
    /// `#error`
    KwError,
    /// `#define`
    KwDefine,
    /// `#include`
    KwInclude,
    /// `#ifdef`
    KwIfDef,
    /// `#ifndef`
    KwIfNDef,
    /// `#else`
    KwElse,
    /// `#endif`
    KwEndIf,

    // Assembler directives.
    /// `.section`
    KwSection,
    /// `.entry`
    KwEntry,
    /// `.ascii`
    KwAscii,
    /// `.asciz`
    KwAsciz,
    /// `.extern`
    KwExtern,

    // Instruction mnemonics.
    /// `nop`
    KwNop,
    /// `mov`
    KwMov,
    /// `ldr`
    KwLdr,
    /// `str`
    KwStr,
    /// `sti`
    KwSti,
    /// `push`
    KwPush,
    /// `pop`
    KwPop,
    /// `add`
    KwAdd,
    /// `sub`
    KwSub,
    /// `mul`
    KwMul,
    /// `div`
    KwDiv,
    /// `and`
    KwAnd,
    /// `or`
    KwOr,
    /// `xor`
    KwXor,
    /// `shl`
    KwShl,
    /// `shr`
    KwShr,
    /// `cmp`
    KwCmp,
    /// `jmp`
    KwJmp,
    /// `jeq`
    KwJeq,
    /// `jne`
    KwJne,
    /// `jlt`
    KwJlt,
    /// `jgt`
    KwJgt,
    /// `jle`
    KwJle,
    /// `jge`
    KwJge,
    /// `call`
    KwCall,
    /// `ret`
    KwRet,
    /// `inc`
    KwInc,
    /// `dec`
    KwDec,
    /// `neg`
    KwNeg,
    /// `syscall`
    KwSyscall,
    /// `hlt`
    KwHlt,
    /// `loadext`
    KwLoadExt,

    // Data declaration directives.
    /// `db`
    KwDb,
    /// `dw`
    KwDw,
    /// `dd`
    KwDd,
    /// `dq`
    KwDq,
    /// `resb`
    KwResb,
}

/// A lexed token: kind, literal text, and source span.
///
/// For string literals the text has escape sequences already resolved; for
/// everything else it is the raw source slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The classification of this token.
    pub kind: TokenKind,
    /// The literal text.
    pub literal: Cow<'static, str>,
    /// Where the token came from.
    pub span: Span,
}

impl Token {
    /// Create a token with an owned copy of the literal.
    pub fn new<L: Into<Span>>(kind: TokenKind, literal: &str, span: L) -> Self {
        Token {
            kind,
            literal: Cow::Owned(literal.to_string()),
            span: span.into(),
        }
    }

    /// Create a token from a static literal (punctuation, EOF).
    pub fn new_static<L: Into<Span>>(kind: TokenKind, literal: &'static str, span: L) -> Self {
        Token {
            kind,
            literal: Cow::Borrowed(literal),
            span: span.into(),
        }
    }

    /// Create a token taking ownership of an already-built literal.
    pub fn new_owned<L: Into<Span>>(kind: TokenKind, literal: String, span: L) -> Self {
        Token {
            kind,
            literal: Cow::Owned(literal),
            span: span.into(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of input"),
            TokenKind::String => write!(f, "\"{}\"", self.literal),
            _ => write!(f, "'{}'", self.literal),
        }
    }
}

/// Classify an identifier-shaped word (including `.`/`#` directives).
///
/// Keywords, mnemonics, register names, data sizes, and section names are
/// case-insensitive; anything unrecognized is a plain identifier, except
/// that unknown `.`/`#` words are illegal.
#[must_use]
pub fn lookup_ident(word: &str) -> TokenKind {
    let lower = word.to_ascii_lowercase();
    let kind = match lower.as_str() {
        "#error" => TokenKind::KwError,
        "#define" => TokenKind::KwDefine,
        "#include" => TokenKind::KwInclude,
        "#ifdef" => TokenKind::KwIfDef,
        "#ifndef" => TokenKind::KwIfNDef,
        "#else" => TokenKind::KwElse,
        "#endif" => TokenKind::KwEndIf,

        ".section" => TokenKind::KwSection,
        ".entry" => TokenKind::KwEntry,
        ".ascii" => TokenKind::KwAscii,
        ".asciz" => TokenKind::KwAsciz,
        ".extern" => TokenKind::KwExtern,

        "nop" => TokenKind::KwNop,
        "mov" => TokenKind::KwMov,
        "ldr" => TokenKind::KwLdr,
        "str" => TokenKind::KwStr,
        "sti" => TokenKind::KwSti,
        "push" => TokenKind::KwPush,
        "pop" => TokenKind::KwPop,
        "add" => TokenKind::KwAdd,
        "sub" => TokenKind::KwSub,
        "mul" => TokenKind::KwMul,
        "div" => TokenKind::KwDiv,
        "and" => TokenKind::KwAnd,
        "or" => TokenKind::KwOr,
        "xor" => TokenKind::KwXor,
        "shl" => TokenKind::KwShl,
        "shr" => TokenKind::KwShr,
        "cmp" => TokenKind::KwCmp,
        "jmp" => TokenKind::KwJmp,
        "jeq" => TokenKind::KwJeq,
        "jne" => TokenKind::KwJne,
        "jlt" => TokenKind::KwJlt,
        "jgt" => TokenKind::KwJgt,
        "jle" => TokenKind::KwJle,
        "jge" => TokenKind::KwJge,
        "call" => TokenKind::KwCall,
        "ret" => TokenKind::KwRet,
        "inc" => TokenKind::KwInc,
        "dec" => TokenKind::KwDec,
        "neg" => TokenKind::KwNeg,
        "syscall" => TokenKind::KwSyscall,
        "hlt" => TokenKind::KwHlt,
        "loadext" => TokenKind::KwLoadExt,

        "db" => TokenKind::KwDb,
        "dw" => TokenKind::KwDw,
        "dd" => TokenKind::KwDd,
        "dq" => TokenKind::KwDq,
        "resb" => TokenKind::KwResb,

        "byte" | "word" | "dword" | "qword" | "float" | "double" => TokenKind::DataSize,
        "text" | "data" => TokenKind::SectionName,

        _ => TokenKind::Identifier,
    };

    if kind == TokenKind::Identifier {
        if lower.starts_with('.') || lower.starts_with('#') {
            return TokenKind::Illegal;
        }
        if Register::from_name(&lower).is_some() {
            return TokenKind::Register;
        }
    }

    kind
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_mnemonics() {
        assert_eq!(lookup_ident("mov"), TokenKind::KwMov);
        assert_eq!(lookup_ident("MOV"), TokenKind::KwMov);
        assert_eq!(lookup_ident("syscall"), TokenKind::KwSyscall);
        assert_eq!(lookup_ident("loadext"), TokenKind::KwLoadExt);
    }

    #[test]
    fn test_lookup_directives() {
        assert_eq!(lookup_ident("#define"), TokenKind::KwDefine);
        assert_eq!(lookup_ident(".section"), TokenKind::KwSection);
        assert_eq!(lookup_ident(".extern"), TokenKind::KwExtern);
        assert_eq!(lookup_ident(".bogus"), TokenKind::Illegal);
        assert_eq!(lookup_ident("#bogus"), TokenKind::Illegal);
    }

    #[test]
    fn test_lookup_registers_and_sizes() {
        assert_eq!(lookup_ident("q0"), TokenKind::Register);
        assert_eq!(lookup_ident("DD15"), TokenKind::Register);
        assert_eq!(lookup_ident("sp"), TokenKind::Register);
        assert_eq!(lookup_ident("qword"), TokenKind::DataSize);
        assert_eq!(lookup_ident("Double"), TokenKind::DataSize);
    }

    #[test]
    fn test_lookup_plain_identifier() {
        assert_eq!(lookup_ident("message"), TokenKind::Identifier);
        assert_eq!(lookup_ident("_start"), TokenKind::Identifier);
        assert_eq!(lookup_ident("q16"), TokenKind::Identifier);
    }

    #[test]
    fn test_lookup_section_names() {
        assert_eq!(lookup_ident("text"), TokenKind::SectionName);
        assert_eq!(lookup_ident("data"), TokenKind::SectionName);
    }
}
