//! The Nyx preprocessor.
//!
//! Runs between parsing and assembly in three passes over the statement
//! stream:
//!
//! 1. consume `#define`s into the definition table and splice `#include`d
//!    files in place (each include runs a child preprocessor that inherits
//!    the parent's definitions and visited-path set, then merges them back);
//! 2. prune `#ifdef`/`#ifndef`/`#else`/`#endif` regions with a frame stack;
//! 3. substitute identifiers to a fixed point and fold constant
//!    subexpressions, failing on any surviving `#error`.

use nyx_core::{Interner, NyxError, NyxResult, Span, Symbol};
use nyx_parser::ast::{BinaryOperator, Expression, Statement, UnaryOperator};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::PathBuf;
use std::sync::Arc;

/// A `#ifdef`/`#ifndef` frame on the conditional stack.
#[derive(Debug, Clone)]
struct ConditionalFrame {
    /// Whether the condition held when the frame was pushed.
    included: bool,
    /// Whether `#else` has flipped this frame.
    seen_else: bool,
    /// Which directive opened the frame, for unmatched-at-EOF reporting.
    kind: ConditionalKind,
    /// Where the frame was opened.
    span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConditionalKind {
    IfDef,
    IfNDef,
}

/// The Nyx preprocessor.
pub struct Preprocessor {
    program: Vec<Statement>,
    interner: Arc<Interner>,
    definitions: FxHashMap<Symbol, Expression>,
    include_paths: Vec<PathBuf>,
    visited: FxHashSet<PathBuf>,
}

impl Preprocessor {
    /// Create a preprocessor over a parsed program.
    ///
    /// The definition table is seeded with the platform's architecture and
    /// operating-system presence markers.
    pub fn new(program: Vec<Statement>, interner: Arc<Interner>) -> Self {
        let mut definitions = FxHashMap::default();
        let empty = Expression::StringLiteral(interner.intern(""));
        if let Some(arch) = architecture_marker() {
            definitions.insert(interner.intern(arch), empty.clone());
        }
        if let Some(os) = os_marker() {
            definitions.insert(interner.intern(os), empty);
        }

        Self {
            program,
            interner,
            definitions,
            include_paths: vec![PathBuf::new()],
            visited: FxHashSet::default(),
        }
    }

    /// Replace the ordered include search path.
    #[must_use]
    pub fn with_include_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.include_paths = paths;
        self
    }

    /// Run all passes, producing the expanded statement stream.
    pub fn process(&mut self) -> NyxResult<Vec<Statement>> {
        let mut collected = Vec::with_capacity(self.program.len());

        for stmt in std::mem::take(&mut self.program) {
            match stmt {
                Statement::Define(Expression::Identifier(name), value, _) => {
                    // Redefinition overwrites.
                    self.definitions.insert(name, value);
                }
                Statement::Define(_, _, span) => {
                    return Err(NyxError::preprocess(
                        "expected identifier in #define",
                        span,
                    ));
                }
                Statement::Include(Expression::StringLiteral(path), span) => {
                    collected.extend(self.process_include(path, span)?);
                }
                Statement::Include(_, span) => {
                    return Err(NyxError::preprocess(
                        "expected string literal in #include",
                        span,
                    ));
                }
                other => collected.push(other),
            }
        }

        let pruned = self.prune_conditionals(collected)?;

        let mut result = Vec::with_capacity(pruned.len());
        for stmt in pruned {
            match stmt {
                Statement::Error(Expression::StringLiteral(message), span) => {
                    return Err(NyxError::preprocess(
                        self.interner.resolve(message).to_string(),
                        span,
                    ));
                }
                Statement::Error(_, span) => {
                    return Err(NyxError::preprocess(
                        "expected string literal in #error directive",
                        span,
                    ));
                }
                // Includes spliced by a child, and any directives that only
                // survive inside pruned-away regions, carry nothing forward.
                Statement::Include(_, _)
                | Statement::Define(_, _, _)
                | Statement::IfDef(_, _)
                | Statement::IfNDef(_, _)
                | Statement::Else(_)
                | Statement::EndIf(_) => {}
                other => result.push(self.substitute_statement(other)?),
            }
        }

        Ok(result)
    }

    // =========================================================================
    // Includes
    // =========================================================================

    fn process_include(&mut self, path_sym: Symbol, span: Span) -> NyxResult<Vec<Statement>> {
        let file = self.interner.resolve(path_sym);

        let found = self
            .include_paths
            .iter()
            .map(|dir| dir.join(&*file))
            .find(|candidate| candidate.exists());

        let Some(candidate) = found else {
            return Err(NyxError::preprocess(
                format!("include file not found: {file}"),
                span,
            ));
        };

        let path = std::fs::canonicalize(&candidate).unwrap_or(candidate);

        if self.visited.contains(&path) {
            return Err(NyxError::preprocess(
                format!("circular include detected: {}", path.display()),
                span,
            ));
        }
        self.visited.insert(path.clone());

        let content = std::fs::read_to_string(&path).map_err(|e| {
            NyxError::preprocess(
                format!("failed to read include file {}: {e}", path.display()),
                span,
            )
        })?;

        let display = path.display().to_string();
        let statements = nyx_parser::parse(&content, &self.interner)
            .map_err(|e| attribute_to_file(e, &display))?;

        let mut child = Preprocessor {
            program: statements,
            interner: Arc::clone(&self.interner),
            definitions: self.definitions.clone(),
            include_paths: self.include_paths.clone(),
            visited: self.visited.clone(),
        };

        let processed = child
            .process()
            .map_err(|e| attribute_to_file(e, &display))?;

        self.definitions.extend(child.definitions);
        self.visited.extend(child.visited);

        Ok(processed)
    }

    // =========================================================================
    // Conditionals
    // =========================================================================

    fn prune_conditionals(&self, statements: Vec<Statement>) -> NyxResult<Vec<Statement>> {
        let mut result = Vec::with_capacity(statements.len());
        let mut stack: Vec<ConditionalFrame> = Vec::new();

        for stmt in statements {
            match stmt {
                Statement::IfDef(expr, span) => {
                    let name = self.conditional_name(&expr, span)?;
                    stack.push(ConditionalFrame {
                        included: self.definitions.contains_key(&name),
                        seen_else: false,
                        kind: ConditionalKind::IfDef,
                        span,
                    });
                }
                Statement::IfNDef(expr, span) => {
                    let name = self.conditional_name(&expr, span)?;
                    stack.push(ConditionalFrame {
                        included: !self.definitions.contains_key(&name),
                        seen_else: false,
                        kind: ConditionalKind::IfNDef,
                        span,
                    });
                }
                Statement::Else(span) => match stack.last_mut() {
                    Some(frame) if !frame.seen_else => frame.seen_else = true,
                    _ => {
                        return Err(NyxError::preprocess("unmatched #else directive", span));
                    }
                },
                Statement::EndIf(span) => {
                    if stack.pop().is_none() {
                        return Err(NyxError::preprocess("unmatched #endif directive", span));
                    }
                }
                other => {
                    if frames_admit(&stack) {
                        result.push(other);
                    }
                }
            }
        }

        if let Some(frame) = stack.last() {
            let directive = match frame.kind {
                ConditionalKind::IfDef => "#ifdef",
                ConditionalKind::IfNDef => "#ifndef",
            };
            return Err(NyxError::preprocess(
                format!("unmatched {directive} directive"),
                frame.span,
            ));
        }

        Ok(result)
    }

    fn conditional_name(&self, expr: &Expression, span: Span) -> NyxResult<Symbol> {
        match expr {
            Expression::Identifier(name) => Ok(*name),
            _ => Err(NyxError::preprocess(
                "expected identifier in conditional directive",
                span,
            )),
        }
    }

    // =========================================================================
    // Substitution and constant folding
    // =========================================================================

    fn substitute_statement(&self, stmt: Statement) -> NyxResult<Statement> {
        use Statement as S;

        let sub = |expr: Expression| self.substitute_expr(expr);
        let sub_opt = |expr: Option<Expression>| expr.map(|e| self.substitute_expr(e)).transpose();

        Ok(match stmt {
            S::Entry(e, sp) => S::Entry(sub(e)?, sp),
            S::Ascii(e, sp) => S::Ascii(sub(e)?, sp),
            S::Asciz(e, sp) => S::Asciz(sub(e)?, sp),
            S::Extern(e, sp) => S::Extern(sub(e)?, sp),
            S::Mov(a, b, sp) => S::Mov(sub(a)?, sub(b)?, sp),
            S::Ldr(a, b, sp) => S::Ldr(sub(a)?, sub(b)?, sp),
            S::Str(a, b, sp) => S::Str(sub(a)?, sub(b)?, sp),
            S::Sti(a, b, c, sp) => S::Sti(sub(a)?, sub(b)?, sub(c)?, sp),
            S::Push(size, e, sp) => S::Push(sub_opt(size)?, sub(e)?, sp),
            S::Pop(size, e, sp) => S::Pop(sub_opt(size)?, sub(e)?, sp),
            S::Add(a, b, c, sp) => S::Add(sub(a)?, sub(b)?, sub(c)?, sp),
            S::Sub(a, b, c, sp) => S::Sub(sub(a)?, sub(b)?, sub(c)?, sp),
            S::Mul(a, b, c, sp) => S::Mul(sub(a)?, sub(b)?, sub(c)?, sp),
            S::Div(a, b, c, sp) => S::Div(sub(a)?, sub(b)?, sub(c)?, sp),
            S::And(a, b, c, sp) => S::And(sub(a)?, sub(b)?, sub(c)?, sp),
            S::Or(a, b, c, sp) => S::Or(sub(a)?, sub(b)?, sub(c)?, sp),
            S::Xor(a, b, c, sp) => S::Xor(sub(a)?, sub(b)?, sub(c)?, sp),
            S::Shl(a, b, c, sp) => S::Shl(sub(a)?, sub(b)?, sub(c)?, sp),
            S::Shr(a, b, c, sp) => S::Shr(sub(a)?, sub(b)?, sub(c)?, sp),
            S::Cmp(a, b, sp) => S::Cmp(sub(a)?, sub(b)?, sp),
            S::Jmp(e, sp) => S::Jmp(sub(e)?, sp),
            S::Jeq(e, sp) => S::Jeq(sub(e)?, sp),
            S::Jne(e, sp) => S::Jne(sub(e)?, sp),
            S::Jlt(e, sp) => S::Jlt(sub(e)?, sp),
            S::Jgt(e, sp) => S::Jgt(sub(e)?, sp),
            S::Jle(e, sp) => S::Jle(sub(e)?, sp),
            S::Jge(e, sp) => S::Jge(sub(e)?, sp),
            S::Call(e, sp) => S::Call(sub(e)?, sp),
            S::Inc(e, sp) => S::Inc(sub(e)?, sp),
            S::Dec(e, sp) => S::Dec(sub(e)?, sp),
            S::Neg(e, sp) => S::Neg(sub(e)?, sp),
            S::LoadExternal(e, sp) => S::LoadExternal(sub(e)?, sp),
            S::Resb(e, sp) => S::Resb(sub(e)?, sp),
            S::Data(width, values, sp) => S::Data(
                width,
                values
                    .into_iter()
                    .map(|e| self.substitute_expr(e))
                    .collect::<NyxResult<Vec<_>>>()?,
                sp,
            ),
            // No operands to rewrite.
            other => other,
        })
    }

    fn substitute_expr(&self, expr: Expression) -> NyxResult<Expression> {
        let mut active = Vec::new();
        self.substitute_expr_inner(expr, &mut active)
    }

    fn substitute_expr_inner(
        &self,
        expr: Expression,
        active: &mut Vec<Symbol>,
    ) -> NyxResult<Expression> {
        match expr {
            Expression::Identifier(name) => {
                // A name already being expanded is left alone to cut
                // self-referential definitions off at a fixed point.
                match self.definitions.get(&name) {
                    Some(replacement) if !active.contains(&name) => {
                        active.push(name);
                        let result = self.substitute_expr_inner(replacement.clone(), active);
                        active.pop();
                        result
                    }
                    _ => Ok(Expression::Identifier(name)),
                }
            }
            Expression::Address(base, offset) => {
                let base = Box::new(self.substitute_expr_inner(*base, active)?);
                let offset = match offset {
                    Some(off) => Some(Box::new(self.substitute_expr_inner(*off, active)?)),
                    None => None,
                };
                Ok(Expression::Address(base, offset))
            }
            Expression::Unary(op, operand, span) => {
                let operand = self.substitute_expr_inner(*operand, active)?;
                Ok(match (op, operand) {
                    (UnaryOperator::Neg, Expression::IntegerLiteral(v)) => {
                        Expression::IntegerLiteral(v.wrapping_neg())
                    }
                    (UnaryOperator::Neg, Expression::FloatLiteral(v)) => {
                        Expression::FloatLiteral(-v)
                    }
                    (op, operand) => Expression::Unary(op, Box::new(operand), span),
                })
            }
            Expression::Binary(lhs, op, rhs, span) => {
                let lhs = self.substitute_expr_inner(*lhs, active)?;
                let rhs = self.substitute_expr_inner(*rhs, active)?;
                self.fold_binary(lhs, op, rhs, span)
            }
            other => Ok(other),
        }
    }

    fn fold_binary(
        &self,
        lhs: Expression,
        op: BinaryOperator,
        rhs: Expression,
        span: Span,
    ) -> NyxResult<Expression> {
        match (lhs, rhs) {
            (Expression::IntegerLiteral(l), Expression::IntegerLiteral(r)) => {
                let folded = match op {
                    BinaryOperator::Add => l.wrapping_add(r),
                    BinaryOperator::Sub => l.wrapping_sub(r),
                    BinaryOperator::Mul => l.wrapping_mul(r),
                    BinaryOperator::Div => {
                        if r == 0 {
                            return Err(NyxError::preprocess(
                                "division by zero in constant expression",
                                span,
                            ));
                        }
                        l.wrapping_div(r)
                    }
                    BinaryOperator::BitOr => l | r,
                    BinaryOperator::BitAnd => l & r,
                    BinaryOperator::BitXor => l ^ r,
                };
                Ok(Expression::IntegerLiteral(folded))
            }
            (Expression::FloatLiteral(l), Expression::FloatLiteral(r)) => {
                let folded = match op {
                    BinaryOperator::Add => l + r,
                    BinaryOperator::Sub => l - r,
                    BinaryOperator::Mul => l * r,
                    BinaryOperator::Div => l / r,
                    BinaryOperator::BitOr | BinaryOperator::BitAnd | BinaryOperator::BitXor => {
                        return Err(NyxError::preprocess(
                            format!("invalid operator {op:?} applied to float literals"),
                            span,
                        ));
                    }
                };
                Ok(Expression::FloatLiteral(folded))
            }
            (lhs, rhs) => Ok(Expression::Binary(Box::new(lhs), op, Box::new(rhs), span)),
        }
    }
}

/// Keep a statement only if every frame on the stack resolves truthy.
fn frames_admit(stack: &[ConditionalFrame]) -> bool {
    stack
        .iter()
        .all(|frame| frame.included != frame.seen_else)
}

/// Attach an included file's name to an error that does not already carry
/// one, so diagnostics point into the right source text.
fn attribute_to_file(err: NyxError, file: &str) -> NyxError {
    if err.file().is_some() {
        return err;
    }
    match err.span() {
        Some(span) => NyxError::preprocess_in(err.to_string(), span, file),
        None => err,
    }
}

/// The architecture presence marker for this build, if the target is known.
fn architecture_marker() -> Option<&'static str> {
    match std::env::consts::ARCH {
        "x86" => Some("__X86__"),
        "x86_64" => Some("__X86_64__"),
        "arm" => Some("__ARM__"),
        "aarch64" => Some("__AARCH64__"),
        "riscv64" => Some("__RISCV64__"),
        "powerpc64" => Some("__POWERPC64__"),
        "mips64" => Some("__MIPS64__"),
        "s390x" => Some("__S390X__"),
        "loongarch64" => Some("__LOONGARCH64__"),
        _ => None,
    }
}

/// The operating-system presence marker for this build, if known.
fn os_marker() -> Option<&'static str> {
    match std::env::consts::OS {
        "linux" => Some("__LINUX__"),
        "macos" => Some("__MACOS__"),
        "windows" => Some("__WINDOWS__"),
        "freebsd" => Some("__FREEBSD__"),
        "openbsd" => Some("__OPENBSD__"),
        "netbsd" => Some("__NETBSD__"),
        "android" => Some("__ANDROID__"),
        "ios" => Some("__IOS__"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    struct TestTempDir {
        path: PathBuf,
    }

    impl TestTempDir {
        fn new() -> Self {
            use std::sync::atomic::{AtomicU64, Ordering};
            use std::time::{SystemTime, UNIX_EPOCH};

            static NEXT_ID: AtomicU64 = AtomicU64::new(0);
            let unique = NEXT_ID.fetch_add(1, Ordering::Relaxed);
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("time went backwards")
                .as_nanos();

            let mut path = std::env::temp_dir();
            path.push(format!(
                "nyx_preprocessor_tests_{}_{}_{}",
                std::process::id(),
                nanos,
                unique
            ));
            std::fs::create_dir_all(&path).expect("failed to create temp test dir");
            Self { path }
        }
    }

    impl Drop for TestTempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    fn write_file(path: &Path, content: &str) {
        std::fs::write(path, content).expect("failed to write test file");
    }

    fn preprocess(source: &str) -> NyxResult<Vec<Statement>> {
        let interner = Arc::new(Interner::new());
        let stmts = nyx_parser::parse(source, &interner)?;
        Preprocessor::new(stmts, interner).process()
    }

    fn preprocess_in(dir: &Path, source: &str) -> NyxResult<Vec<Statement>> {
        let interner = Arc::new(Interner::new());
        let stmts = nyx_parser::parse(source, &interner)?;
        Preprocessor::new(stmts, interner)
            .with_include_paths(vec![dir.to_path_buf()])
            .process()
    }

    #[test]
    fn test_define_substitutes_identifier() {
        let stmts = preprocess("#define VALUE 42\nmov q0, VALUE").unwrap();
        assert_eq!(stmts.len(), 1);
        let Statement::Mov(_, Expression::IntegerLiteral(42), _) = &stmts[0] else {
            panic!("expected substituted literal, got {:?}", stmts[0]);
        };
    }

    #[test]
    fn test_define_chain_expands_to_fixed_point() {
        let stmts = preprocess("#define A B\n#define B 7\nmov q0, A").unwrap();
        let Statement::Mov(_, Expression::IntegerLiteral(7), _) = &stmts[0] else {
            panic!("expected chained expansion, got {:?}", stmts[0]);
        };
    }

    #[test]
    fn test_self_referential_define_terminates() {
        let stmts = preprocess("#define A A\njmp A").unwrap();
        assert!(matches!(
            stmts[0],
            Statement::Jmp(Expression::Identifier(_), _)
        ));
    }

    #[test]
    fn test_redefinition_overwrites() {
        let stmts = preprocess("#define X 1\n#define X 2\nmov q0, X").unwrap();
        let Statement::Mov(_, Expression::IntegerLiteral(2), _) = &stmts[0] else {
            panic!("expected overwritten definition");
        };
    }

    #[test]
    fn test_integer_folding_eliminates_binary_ops() {
        let stmts = preprocess("mov q0, 2 + 3 * 4\nmov q1, (10 - 4) / 3\nmov q2, 0xF0 | 0x0F")
            .unwrap();
        let expected = [14i64, 2, 0xFF];
        for (stmt, want) in stmts.iter().zip(expected) {
            let Statement::Mov(_, Expression::IntegerLiteral(v), _) = stmt else {
                panic!("expected folded literal, got {stmt:?}");
            };
            assert_eq!(*v, want);
        }
    }

    #[test]
    fn test_division_truncates_toward_zero() {
        let stmts = preprocess("mov q0, (0 - 7) / 2").unwrap();
        let Statement::Mov(_, Expression::IntegerLiteral(v), _) = &stmts[0] else {
            panic!();
        };
        assert_eq!(*v, -3);
    }

    #[test]
    fn test_float_folding() {
        let stmts = preprocess("mov dd0, 1.5 + 2.25").unwrap();
        let Statement::Mov(_, Expression::FloatLiteral(v), _) = &stmts[0] else {
            panic!("expected folded float, got {:?}", stmts[0]);
        };
        assert_eq!(*v, 3.75);
    }

    #[test]
    fn test_bitwise_on_floats_is_fatal() {
        assert!(preprocess("mov dd0, 1.5 | 2.0").is_err());
    }

    #[test]
    fn test_constant_division_by_zero_is_fatal() {
        assert!(preprocess("mov q0, 1 / 0").is_err());
    }

    #[test]
    fn test_ifdef_keeps_and_drops() {
        let kept = preprocess("#define X\n#ifdef X\nnop\n#endif\nhlt").unwrap();
        assert_eq!(kept.len(), 2);

        let dropped = preprocess("#ifdef X\nnop\n#endif\nhlt").unwrap();
        assert_eq!(dropped.len(), 1);
        assert!(matches!(dropped[0], Statement::Hlt(_)));
    }

    #[test]
    fn test_ifdef_else_selects_branch() {
        let stmts = preprocess("#define X\n#ifdef X\nmov q0, 1\n#else\nmov q0, 2\n#endif").unwrap();
        assert_eq!(stmts.len(), 1);
        let Statement::Mov(_, Expression::IntegerLiteral(1), _) = &stmts[0] else {
            panic!("expected the #ifdef branch");
        };

        let stmts = preprocess("#ifdef X\nmov q0, 1\n#else\nmov q0, 2\n#endif").unwrap();
        let Statement::Mov(_, Expression::IntegerLiteral(2), _) = &stmts[0] else {
            panic!("expected the #else branch");
        };
    }

    #[test]
    fn test_ifndef_inverts() {
        let stmts = preprocess("#ifndef X\nnop\n#endif").unwrap();
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_nested_conditionals() {
        let source = "#define A\n#ifdef A\n#ifdef B\nnop\n#endif\nhlt\n#endif";
        let stmts = preprocess(source).unwrap();
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0], Statement::Hlt(_)));
    }

    #[test]
    fn test_double_else_is_fatal() {
        assert!(preprocess("#ifdef X\n#else\n#else\n#endif").is_err());
    }

    #[test]
    fn test_unmatched_directives_are_fatal() {
        assert!(preprocess("#else").is_err());
        assert!(preprocess("#endif").is_err());
        assert!(preprocess("#ifdef X\nnop").is_err());
    }

    #[test]
    fn test_error_directive_is_fatal_with_message() {
        let err = preprocess("#error \"unsupported platform\"").unwrap_err();
        assert_eq!(err.to_string(), "unsupported platform");
    }

    #[test]
    fn test_error_directive_inside_false_branch_is_pruned() {
        assert!(preprocess("#ifdef X\n#error \"never\"\n#endif\nhlt").is_ok());
    }

    #[test]
    fn test_platform_markers_are_predefined() {
        // Exactly one of the OS branches holds on any supported build host.
        let source = "#ifdef __LINUX__\nnop\n#endif\n#ifdef __MACOS__\nnop\n#endif\n\
                      #ifdef __WINDOWS__\nnop\n#endif\nhlt";
        let stmts = preprocess(source).unwrap();
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn test_include_splices_statements() {
        let temp = TestTempDir::new();
        write_file(&temp.path.join("lib.nyx"), "mov q0, 7\n");

        let stmts = preprocess_in(&temp.path, "#include \"lib.nyx\"\nhlt").unwrap();
        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[0], Statement::Mov(_, _, _)));
        assert!(matches!(stmts[1], Statement::Hlt(_)));
    }

    #[test]
    fn test_include_inherits_and_merges_definitions() {
        let temp = TestTempDir::new();
        write_file(&temp.path.join("consts.nyx"), "#define SIZE 64\n");

        let stmts =
            preprocess_in(&temp.path, "#include \"consts.nyx\"\nmov q0, SIZE").unwrap();
        let Statement::Mov(_, Expression::IntegerLiteral(64), _) = &stmts[0] else {
            panic!("definition from include did not merge back");
        };
    }

    #[test]
    fn test_include_sees_parent_definitions() {
        let temp = TestTempDir::new();
        write_file(&temp.path.join("uses.nyx"), "mov q0, PARENT\n");

        let stmts = preprocess_in(
            &temp.path,
            "#define PARENT 9\n#include \"uses.nyx\"\nhlt",
        )
        .unwrap();
        let Statement::Mov(_, Expression::IntegerLiteral(9), _) = &stmts[0] else {
            panic!("child did not inherit parent definitions");
        };
    }

    #[test]
    fn test_include_searches_paths_in_order() {
        let first = TestTempDir::new();
        let second = TestTempDir::new();
        write_file(&first.path.join("x.nyx"), "mov q0, 1\n");
        write_file(&second.path.join("x.nyx"), "mov q0, 2\n");

        let interner = Arc::new(Interner::new());
        let stmts = nyx_parser::parse("#include \"x.nyx\"", &interner).unwrap();
        let result = Preprocessor::new(stmts, interner)
            .with_include_paths(vec![first.path.clone(), second.path.clone()])
            .process()
            .unwrap();

        let Statement::Mov(_, Expression::IntegerLiteral(1), _) = &result[0] else {
            panic!("expected the first search path to win");
        };
    }

    #[test]
    fn test_missing_include_is_fatal() {
        let temp = TestTempDir::new();
        let err = preprocess_in(&temp.path, "#include \"nope.nyx\"").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_circular_include_is_fatal() {
        let temp = TestTempDir::new();
        write_file(&temp.path.join("a.nyx"), "#include \"b.nyx\"\n");
        write_file(&temp.path.join("b.nyx"), "#include \"a.nyx\"\n");

        let err = preprocess_in(&temp.path, "#include \"a.nyx\"").unwrap_err();
        assert!(err.to_string().contains("circular include"));
    }

    #[test]
    fn test_repeated_include_is_fatal() {
        let temp = TestTempDir::new();
        write_file(&temp.path.join("once.nyx"), "nop\n");

        let err = preprocess_in(
            &temp.path,
            "#include \"once.nyx\"\n#include \"once.nyx\"",
        )
        .unwrap_err();
        assert!(err.to_string().contains("circular include"));
    }

    #[test]
    fn test_error_inside_include_names_the_file() {
        let temp = TestTempDir::new();
        write_file(&temp.path.join("bad.nyx"), "#error \"from include\"\n");

        let err = preprocess_in(&temp.path, "#include \"bad.nyx\"").unwrap_err();
        assert!(err.file().is_some());
        assert!(err.to_string().contains("from include"));
    }

    #[test]
    fn test_output_is_idempotent() {
        let source = "#define X 3\n#ifdef X\nmov q0, X + 1\n#endif\nhlt";
        let interner = Arc::new(Interner::new());
        let stmts = nyx_parser::parse(source, &interner).unwrap();
        let once = Preprocessor::new(stmts, Arc::clone(&interner))
            .process()
            .unwrap();
        let twice = Preprocessor::new(once.clone(), interner).process().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_substitution_inside_address_operands() {
        let stmts = preprocess("#define BASE 0x100\nldr q0, [BASE, 8]").unwrap();
        let Statement::Ldr(_, Expression::Address(base, _), _) = &stmts[0] else {
            panic!();
        };
        assert_eq!(**base, Expression::IntegerLiteral(0x100));
    }

    #[test]
    fn test_negated_define_folds() {
        let stmts = preprocess("#define OFF 5\nmov q0, -OFF").unwrap();
        let Statement::Mov(_, Expression::IntegerLiteral(-5), _) = &stmts[0] else {
            panic!("expected folded negation, got {:?}", stmts[0]);
        };
    }
}
