//! Error types and result definitions for the compile pipeline.
//!
//! Every compile-phase failure (lexing, parsing, preprocessing, assembling)
//! is a [`NyxError`] carrying a message and, where one exists, the source
//! span it points at. Runtime failures live in the VM crate; the CLI renders
//! both with file/line/column context.

use crate::span::Span;
use thiserror::Error;

/// The unified result type used by the compile pipeline.
pub type NyxResult<T> = Result<T, NyxError>;

/// Compile-phase error covering every stage from lexing to image emission.
#[derive(Error, Debug, Clone)]
pub enum NyxError {
    /// Lexical analysis error.
    #[error("{message}")]
    Lex {
        /// Error description.
        message: String,
        /// Source location.
        span: Span,
    },

    /// Syntax/parsing error.
    #[error("{message}")]
    Syntax {
        /// Error description.
        message: String,
        /// Source location.
        span: Span,
    },

    /// Preprocessor error (directives, includes, conditionals).
    #[error("{message}")]
    Preprocess {
        /// Error description.
        message: String,
        /// Source location.
        span: Span,
        /// File the span points into, when it is not the root source file.
        file: Option<String>,
    },

    /// Assembler error (operand policy, labels, fixups).
    #[error("{message}")]
    Assemble {
        /// Error description.
        message: String,
        /// Source location, absent for whole-image failures.
        span: Option<Span>,
    },

    /// File system failure while reading or writing toolchain artifacts.
    #[error("{message}")]
    Io {
        /// Error description.
        message: String,
    },
}

impl NyxError {
    /// Create a lex error with location.
    #[must_use]
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self::Lex {
            message: message.into(),
            span,
        }
    }

    /// Create a syntax error with location.
    #[must_use]
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::Syntax {
            message: message.into(),
            span,
        }
    }

    /// Create a preprocessor error in the root source file.
    #[must_use]
    pub fn preprocess(message: impl Into<String>, span: Span) -> Self {
        Self::Preprocess {
            message: message.into(),
            span,
            file: None,
        }
    }

    /// Create a preprocessor error inside an included file.
    #[must_use]
    pub fn preprocess_in(message: impl Into<String>, span: Span, file: impl Into<String>) -> Self {
        Self::Preprocess {
            message: message.into(),
            span,
            file: Some(file.into()),
        }
    }

    /// Create an assembler error with location.
    #[must_use]
    pub fn assemble(message: impl Into<String>, span: Span) -> Self {
        Self::Assemble {
            message: message.into(),
            span: Some(span),
        }
    }

    /// Create an I/O error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// The pipeline phase that produced this error.
    #[must_use]
    pub const fn phase(&self) -> &'static str {
        match self {
            Self::Lex { .. } => "lex",
            Self::Syntax { .. } => "parse",
            Self::Preprocess { .. } => "preprocess",
            Self::Assemble { .. } => "assemble",
            Self::Io { .. } => "io",
        }
    }

    /// The span this error points at, if any.
    #[must_use]
    pub const fn span(&self) -> Option<Span> {
        match self {
            Self::Lex { span, .. } | Self::Syntax { span, .. } | Self::Preprocess { span, .. } => {
                Some(*span)
            }
            Self::Assemble { span, .. } => *span,
            Self::Io { .. } => None,
        }
    }

    /// The file this error's span points into, when it is not the root
    /// source file.
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::Preprocess { file, .. } => file.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error() {
        let err = NyxError::lex("illegal character '@'", Span::new(3, 4));
        assert_eq!(err.phase(), "lex");
        assert_eq!(err.span(), Some(Span::new(3, 4)));
        assert_eq!(err.to_string(), "illegal character '@'");
    }

    #[test]
    fn test_assemble_error_without_span() {
        let err = NyxError::Assemble {
            message: "empty image".into(),
            span: None,
        };
        assert_eq!(err.phase(), "assemble");
        assert_eq!(err.span(), None);
    }

    #[test]
    fn test_preprocess_error_carries_file() {
        let err = NyxError::preprocess_in("circular include", Span::new(0, 8), "lib.nyx");
        assert_eq!(err.file(), Some("lib.nyx"));
        assert_eq!(err.span(), Some(Span::new(0, 8)));

        let root = NyxError::preprocess("unmatched #endif", Span::new(0, 6));
        assert_eq!(root.file(), None);
    }

    #[test]
    fn test_io_error_has_no_span() {
        let err = NyxError::io("cannot read input");
        assert_eq!(err.span(), None);
        assert_eq!(err.phase(), "io");
    }
}
