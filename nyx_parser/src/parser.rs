//! Recursive-descent parser for the Nyx assembly language.
//!
//! The parser keeps a three-token window (previous/current/peek) over the
//! lexer stream. Expressions parse with precedence climbing; statements are
//! one directive or mnemonic each.

use crate::ast::{BinaryOperator, Expression, SectionKind, Statement, UnaryOperator};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use nyx_core::{DataSize, Interner, NyxError, NyxResult, Register, Span};
use std::sync::Arc;

/// The Nyx statement parser.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    interner: Arc<Interner>,
    prev: Token,
    cur: Token,
    peek: Token,
}

impl<'src> Parser<'src> {
    /// Create a parser over a lexer, priming the token window.
    pub fn new(mut lexer: Lexer<'src>, interner: Arc<Interner>) -> Self {
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            interner,
            prev: cur.clone(),
            cur,
            peek,
        }
    }

    /// Parse the whole input into a statement list.
    pub fn parse(&mut self) -> NyxResult<Vec<Statement>> {
        let mut stmts = Vec::new();
        while self.cur.kind != TokenKind::Eof {
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> NyxResult<Statement> {
        let start = self.cur.span;
        match self.cur.kind {
            TokenKind::KwError => {
                self.next_token();
                let message = self.parse_expression()?;
                Ok(Statement::Error(message, self.span_from(start)))
            }
            TokenKind::KwDefine => {
                self.next_token();
                let name = self.parse_expression()?;
                // `#define NAME` with no value binds the empty string, which
                // acts as a pure presence marker for #ifdef.
                let value = if starts_expression(self.cur.kind) {
                    self.parse_expression()?
                } else {
                    Expression::StringLiteral(self.interner.intern(""))
                };
                Ok(Statement::Define(name, value, self.span_from(start)))
            }
            TokenKind::KwInclude => {
                self.next_token();
                let path = self.parse_expression()?;
                Ok(Statement::Include(path, self.span_from(start)))
            }
            TokenKind::KwIfDef => {
                self.next_token();
                let expr = self.parse_expression()?;
                Ok(Statement::IfDef(expr, self.span_from(start)))
            }
            TokenKind::KwIfNDef => {
                self.next_token();
                let expr = self.parse_expression()?;
                Ok(Statement::IfNDef(expr, self.span_from(start)))
            }
            TokenKind::KwElse => {
                self.next_token();
                Ok(Statement::Else(self.span_from(start)))
            }
            TokenKind::KwEndIf => {
                self.next_token();
                Ok(Statement::EndIf(self.span_from(start)))
            }
            TokenKind::KwSection => {
                self.next_token();
                let kind = match (self.cur.kind, self.cur.literal.to_ascii_lowercase().as_str()) {
                    (TokenKind::SectionName, "text") => SectionKind::Text,
                    (TokenKind::SectionName, "data") => SectionKind::Data,
                    _ => return Err(self.expected("section name (text or data)")),
                };
                self.next_token();
                Ok(Statement::Section(kind, self.span_from(start)))
            }
            TokenKind::KwEntry => {
                self.next_token();
                let expr = self.parse_expression()?;
                Ok(Statement::Entry(expr, self.span_from(start)))
            }
            TokenKind::KwAscii => {
                self.next_token();
                let expr = self.parse_expression()?;
                Ok(Statement::Ascii(expr, self.span_from(start)))
            }
            TokenKind::KwAsciz => {
                self.next_token();
                let expr = self.parse_expression()?;
                Ok(Statement::Asciz(expr, self.span_from(start)))
            }
            TokenKind::KwExtern => {
                self.next_token();
                let expr = self.parse_expression()?;
                Ok(Statement::Extern(expr, self.span_from(start)))
            }
            TokenKind::Identifier => {
                if self.peek.kind == TokenKind::Colon {
                    let sym = self.interner.intern(&self.cur.literal);
                    self.next_token();
                    self.next_token();
                    Ok(Statement::Label(sym, self.span_from(start)))
                } else {
                    Err(self.unexpected())
                }
            }
            TokenKind::KwNop => self.parse_nullary(Statement::Nop),
            TokenKind::KwRet => self.parse_nullary(Statement::Ret),
            TokenKind::KwSyscall => self.parse_nullary(Statement::Syscall),
            TokenKind::KwHlt => self.parse_nullary(Statement::Hlt),

            TokenKind::KwMov => self.parse_pair(Statement::Mov),
            TokenKind::KwLdr => self.parse_pair(Statement::Ldr),
            TokenKind::KwStr => self.parse_pair(Statement::Str),
            TokenKind::KwCmp => self.parse_pair(Statement::Cmp),

            TokenKind::KwSti => {
                self.next_token();
                let size = self.parse_expression()?;
                let value = self.parse_expression()?;
                self.expect_cur(TokenKind::Comma)?;
                let addr = self.parse_expression()?;
                Ok(Statement::Sti(size, value, addr, self.span_from(start)))
            }

            TokenKind::KwPush => {
                self.next_token();
                let size = self.parse_optional_size()?;
                let src = self.parse_expression()?;
                Ok(Statement::Push(size, src, self.span_from(start)))
            }
            TokenKind::KwPop => {
                self.next_token();
                let size = self.parse_optional_size()?;
                let dest = self.parse_expression()?;
                Ok(Statement::Pop(size, dest, self.span_from(start)))
            }

            TokenKind::KwAdd => self.parse_triple(Statement::Add),
            TokenKind::KwSub => self.parse_triple(Statement::Sub),
            TokenKind::KwMul => self.parse_triple(Statement::Mul),
            TokenKind::KwDiv => self.parse_triple(Statement::Div),
            TokenKind::KwAnd => self.parse_triple(Statement::And),
            TokenKind::KwOr => self.parse_triple(Statement::Or),
            TokenKind::KwXor => self.parse_triple(Statement::Xor),
            TokenKind::KwShl => self.parse_triple(Statement::Shl),
            TokenKind::KwShr => self.parse_triple(Statement::Shr),

            TokenKind::KwJmp => self.parse_unary_stmt(Statement::Jmp),
            TokenKind::KwJeq => self.parse_unary_stmt(Statement::Jeq),
            TokenKind::KwJne => self.parse_unary_stmt(Statement::Jne),
            TokenKind::KwJlt => self.parse_unary_stmt(Statement::Jlt),
            TokenKind::KwJgt => self.parse_unary_stmt(Statement::Jgt),
            TokenKind::KwJle => self.parse_unary_stmt(Statement::Jle),
            TokenKind::KwJge => self.parse_unary_stmt(Statement::Jge),
            TokenKind::KwCall => self.parse_unary_stmt(Statement::Call),
            TokenKind::KwInc => self.parse_unary_stmt(Statement::Inc),
            TokenKind::KwDec => self.parse_unary_stmt(Statement::Dec),
            TokenKind::KwNeg => self.parse_unary_stmt(Statement::Neg),
            TokenKind::KwLoadExt => self.parse_unary_stmt(Statement::LoadExternal),
            TokenKind::KwResb => self.parse_unary_stmt(Statement::Resb),

            TokenKind::KwDb => self.parse_data(DataSize::Byte),
            TokenKind::KwDw => self.parse_data(DataSize::Word),
            TokenKind::KwDd => self.parse_data(DataSize::DWord),
            TokenKind::KwDq => self.parse_data(DataSize::QWord),

            _ => Err(self.unexpected()),
        }
    }

    /// Parse a statement that is just its mnemonic.
    fn parse_nullary(&mut self, make: fn(Span) -> Statement) -> NyxResult<Statement> {
        let start = self.cur.span;
        self.next_token();
        Ok(make(self.span_from(start)))
    }

    /// Parse `MNEMONIC EXPR`.
    fn parse_unary_stmt(
        &mut self,
        make: fn(Expression, Span) -> Statement,
    ) -> NyxResult<Statement> {
        let start = self.cur.span;
        self.next_token();
        let expr = self.parse_expression()?;
        Ok(make(expr, self.span_from(start)))
    }

    /// Parse `MNEMONIC EXPR, EXPR`.
    fn parse_pair(
        &mut self,
        make: fn(Expression, Expression, Span) -> Statement,
    ) -> NyxResult<Statement> {
        let start = self.cur.span;
        self.next_token();
        let first = self.parse_expression()?;
        self.expect_cur(TokenKind::Comma)?;
        let second = self.parse_expression()?;
        Ok(make(first, second, self.span_from(start)))
    }

    /// Parse `MNEMONIC EXPR, EXPR, EXPR`.
    fn parse_triple(
        &mut self,
        make: fn(Expression, Expression, Expression, Span) -> Statement,
    ) -> NyxResult<Statement> {
        let start = self.cur.span;
        self.next_token();
        let first = self.parse_expression()?;
        self.expect_cur(TokenKind::Comma)?;
        let second = self.parse_expression()?;
        self.expect_cur(TokenKind::Comma)?;
        let third = self.parse_expression()?;
        Ok(make(first, second, third, self.span_from(start)))
    }

    /// Parse `db`/`dw`/`dd`/`dq` value lists.
    fn parse_data(&mut self, width: DataSize) -> NyxResult<Statement> {
        let start = self.cur.span;
        self.next_token();
        let mut values = vec![self.parse_expression()?];
        while self.cur.kind == TokenKind::Comma {
            self.next_token();
            values.push(self.parse_expression()?);
        }
        Ok(Statement::Data(width, values, self.span_from(start)))
    }

    /// Parse the optional data-size prefix of push/pop.
    fn parse_optional_size(&mut self) -> NyxResult<Option<Expression>> {
        if self.cur.kind == TokenKind::DataSize {
            Ok(Some(self.parse_expression()?))
        } else {
            Ok(None)
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expression(&mut self) -> NyxResult<Expression> {
        self.parse_binary_expression(0)
    }

    fn parse_binary_expression(&mut self, min_prec: u8) -> NyxResult<Expression> {
        let start = self.cur.span;
        let mut lhs = self.parse_primary()?;

        loop {
            let op = match self.cur.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                TokenKind::Asterisk => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                TokenKind::Pipe => BinaryOperator::BitOr,
                TokenKind::Ampersand => BinaryOperator::BitAnd,
                TokenKind::Caret => BinaryOperator::BitXor,
                _ => break,
            };

            let prec = binary_precedence(op);
            if prec < min_prec {
                break;
            }

            self.next_token();
            let rhs = self.parse_binary_expression(prec + 1)?;

            lhs = Expression::Binary(
                Box::new(lhs),
                op,
                Box::new(rhs),
                self.span_from(start),
            );
        }

        Ok(lhs)
    }

    fn parse_primary(&mut self) -> NyxResult<Expression> {
        match self.cur.kind {
            TokenKind::Identifier => {
                let sym = self.interner.intern(&self.cur.literal);
                self.next_token();
                Ok(Expression::Identifier(sym))
            }
            TokenKind::Register => {
                let name = self.cur.literal.to_ascii_lowercase();
                let Some(reg) = Register::from_name(&name) else {
                    return Err(self.unexpected());
                };
                self.next_token();
                Ok(Expression::Register(reg))
            }
            TokenKind::Integer => self.parse_int_literal(10, 0),
            TokenKind::Hexadecimal => self.parse_int_literal(16, 2),
            TokenKind::Binary => self.parse_int_literal(2, 2),
            TokenKind::Octal => self.parse_int_literal(8, 2),
            TokenKind::Float => {
                let Ok(value) = self.cur.literal.parse::<f64>() else {
                    return Err(self.unexpected());
                };
                self.next_token();
                Ok(Expression::FloatLiteral(value))
            }
            TokenKind::String => {
                let sym = self.interner.intern(&self.cur.literal);
                self.next_token();
                Ok(Expression::StringLiteral(sym))
            }
            TokenKind::DataSize => {
                let name = self.cur.literal.to_ascii_lowercase();
                let Ok(size) = DataSize::try_from(name.as_str()) else {
                    return Err(self.unexpected());
                };
                self.next_token();
                Ok(Expression::DataSize(size))
            }
            TokenKind::Minus => {
                let start = self.cur.span;
                self.next_token();
                let operand = self.parse_primary()?;
                // Negative literals fold immediately; anything else stays a
                // unary node for the preprocessor to resolve.
                Ok(match operand {
                    Expression::IntegerLiteral(v) => Expression::IntegerLiteral(v.wrapping_neg()),
                    Expression::FloatLiteral(v) => Expression::FloatLiteral(-v),
                    other => Expression::Unary(
                        UnaryOperator::Neg,
                        Box::new(other),
                        self.span_from(start),
                    ),
                })
            }
            TokenKind::LBracket => {
                self.next_token();
                let base = self.parse_expression()?;

                let offset = if self.cur.kind == TokenKind::Comma {
                    self.next_token();
                    Some(Box::new(self.parse_expression()?))
                } else {
                    None
                };

                if self.cur.kind != TokenKind::RBracket {
                    return Err(self.expected("]"));
                }
                self.next_token();

                Ok(Expression::Address(Box::new(base), offset))
            }
            TokenKind::LParen => {
                self.next_token();
                let expr = self.parse_expression()?;
                if self.cur.kind != TokenKind::RParen {
                    return Err(self.expected(")"));
                }
                self.next_token();
                Ok(expr)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_int_literal(&mut self, radix: u32, skip: usize) -> NyxResult<Expression> {
        let digits = &self.cur.literal[skip..];
        let Ok(value) = i64::from_str_radix(digits, radix) else {
            return Err(self.unexpected());
        };
        self.next_token();
        Ok(Expression::IntegerLiteral(value))
    }

    // =========================================================================
    // Token window helpers
    // =========================================================================

    fn next_token(&mut self) {
        std::mem::swap(&mut self.prev, &mut self.cur);
        std::mem::swap(&mut self.cur, &mut self.peek);
        self.peek = self.lexer.next_token();
    }

    fn expect_cur(&mut self, kind: TokenKind) -> NyxResult<()> {
        if self.cur.kind == kind {
            self.next_token();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Span from a statement's first token through the last consumed one.
    fn span_from(&self, start: Span) -> Span {
        Span::new(start.start, self.prev.span.end)
    }

    fn unexpected(&self) -> NyxError {
        NyxError::syntax(format!("unexpected token: {}", self.cur), self.cur.span)
    }

    fn expected(&self, what: &str) -> NyxError {
        NyxError::syntax(
            format!("expected {}, got {} instead", what, self.cur),
            self.cur.span,
        )
    }
}

const fn binary_precedence(op: BinaryOperator) -> u8 {
    match op {
        BinaryOperator::Mul | BinaryOperator::Div => 20,
        BinaryOperator::Add | BinaryOperator::Sub => 10,
        BinaryOperator::BitAnd => 5,
        BinaryOperator::BitXor => 4,
        BinaryOperator::BitOr => 3,
    }
}

/// Whether a token can begin an expression.
///
/// Used to decide if `#define NAME` carries a value or is a bare marker.
const fn starts_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::Register
            | TokenKind::Integer
            | TokenKind::Hexadecimal
            | TokenKind::Binary
            | TokenKind::Octal
            | TokenKind::Float
            | TokenKind::String
            | TokenKind::DataSize
            | TokenKind::Minus
            | TokenKind::LBracket
            | TokenKind::LParen
    )
}
