//! The Nyx assembler.
//!
//! A single forward pass over preprocessed statements emits opcodes and
//! operands into the two section buffers, recording a fixup for every
//! identifier operand whose address is not yet known. Finalization resolves
//! fixups to absolute offsets within `text || data`, resolves the entry
//! point, and prepends the 8-byte entry header.

use crate::bytecode::builder::BytecodeBuilder;
use crate::bytecode::opcode::Opcode;
use crate::bytecode::{Section, ADDRESSING_IMMEDIATE_BASE, ADDRESSING_REGISTER_BASE};
use nyx_core::{DataSize, Interner, NyxError, NyxResult, Register, Span, Symbol};
use nyx_parser::ast::{Expression, SectionKind, Statement};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::sync::Arc;

/// A bound label: section-relative until finalization.
#[derive(Debug, Clone, Copy)]
struct LabelSite {
    section: Section,
    offset: usize,
}

/// A patch site waiting for a label address.
#[derive(Debug, Clone)]
struct Fixup {
    /// Section containing the patch site.
    section: Section,
    /// Offset of the patch site within its section.
    offset: usize,
    /// Width to write at the patch site.
    size: DataSize,
    /// Label that resolves this fixup.
    label: Symbol,
    /// Source of the referencing operand, for diagnostics.
    span: Span,
}

/// The entry point, either known or deferred to a label.
#[derive(Debug, Clone)]
enum Entry {
    Address(u64),
    Fixup(Symbol, Span),
}

/// The Nyx assembler.
pub struct Assembler {
    program: Vec<Statement>,
    interner: Arc<Interner>,
    builder: BytecodeBuilder,
    labels: FxHashMap<Symbol, LabelSite>,
    fixups: Vec<Fixup>,
    externs: FxHashSet<Symbol>,
    entry: Entry,
    entry_explicit: bool,
}

impl Assembler {
    /// Create an assembler over a preprocessed program.
    pub fn new(program: Vec<Statement>, interner: Arc<Interner>) -> Self {
        let estimate = 4 * program.len();
        Self {
            program,
            interner,
            builder: BytecodeBuilder::new(Some(estimate)),
            labels: FxHashMap::default(),
            fixups: Vec::new(),
            externs: FxHashSet::default(),
            entry: Entry::Address(0x00),
            entry_explicit: false,
        }
    }

    /// Assemble the program into a complete image.
    pub fn assemble(mut self) -> NyxResult<Vec<u8>> {
        for stmt in std::mem::take(&mut self.program) {
            self.assemble_statement(stmt)?;
        }

        self.resolve_fixups()?;
        let entry = self.resolve_entry()?;

        let mut image = Vec::with_capacity(
            8 + self.builder.len(Section::Text) + self.builder.len(Section::Data),
        );
        image.extend(entry.to_le_bytes());
        image.extend(self.builder.finalize());
        Ok(image)
    }

    fn assemble_statement(&mut self, stmt: Statement) -> NyxResult<()> {
        match stmt {
            Statement::Section(kind, _) => {
                self.builder.set_section(match kind {
                    SectionKind::Text => Section::Text,
                    SectionKind::Data => Section::Data,
                });
            }
            Statement::Entry(expr, span) => match expr {
                Expression::IntegerLiteral(addr) => {
                    self.entry = Entry::Address(addr as u64);
                    self.entry_explicit = true;
                }
                Expression::Identifier(label) => {
                    self.entry = Entry::Fixup(label, span);
                    self.entry_explicit = true;
                }
                other => return Err(self.invalid_operand(".entry", &other, span)),
            },
            Statement::Label(name, span) => {
                let site = LabelSite {
                    section: self.builder.section(),
                    offset: self.builder.offset(),
                };
                self.labels.insert(name, site);
                if !self.entry_explicit && &*self.interner.resolve(name) == "_start" {
                    self.entry = Entry::Fixup(name, span);
                }
            }
            Statement::Ascii(expr, span) => match expr {
                Expression::StringLiteral(text) => {
                    let bytes: Vec<u8> = self.interner.resolve(text).bytes().collect();
                    self.builder.extend(bytes);
                }
                other => return Err(self.invalid_operand(".ascii", &other, span)),
            },
            Statement::Asciz(expr, span) => match expr {
                Expression::StringLiteral(text) => {
                    let bytes: Vec<u8> = self.interner.resolve(text).bytes().collect();
                    self.builder.extend(bytes);
                    self.builder.push_byte(0x00u8);
                }
                other => return Err(self.invalid_operand(".asciz", &other, span)),
            },
            Statement::Extern(expr, span) => match expr {
                Expression::Identifier(name) => {
                    self.externs.insert(name);
                }
                other => return Err(self.invalid_operand(".extern", &other, span)),
            },

            Statement::Nop(_) => self.builder.push_byte(Opcode::Nop),
            Statement::Ret(_) => self.builder.push_byte(Opcode::Ret),
            Statement::Syscall(_) => self.builder.push_byte(Opcode::Syscall),
            Statement::Hlt(_) => self.builder.push_byte(Opcode::Hlt),

            Statement::Mov(dest, src, span) => self.assemble_mov(dest, src, span)?,
            Statement::Ldr(dest, addr, span) => {
                self.assemble_load_store(Opcode::Ldr, "ldr", dest, addr, span)?;
            }
            Statement::Str(src, addr, span) => {
                self.assemble_load_store(Opcode::Str, "str", src, addr, span)?;
            }
            Statement::Sti(size, value, addr, span) => {
                self.assemble_sti(size, value, addr, span)?;
            }
            Statement::Push(size, src, span) => self.assemble_push(size, src, span)?,
            Statement::Pop(size, dest, span) => self.assemble_pop(size, dest, span)?,

            Statement::Add(d, l, r, span) => {
                self.assemble_arithmetic(Opcode::AddRegRegReg, Opcode::AddRegRegImm, "add", d, l, r, span)?;
            }
            Statement::Sub(d, l, r, span) => {
                self.assemble_arithmetic(Opcode::SubRegRegReg, Opcode::SubRegRegImm, "sub", d, l, r, span)?;
            }
            Statement::Mul(d, l, r, span) => {
                self.assemble_arithmetic(Opcode::MulRegRegReg, Opcode::MulRegRegImm, "mul", d, l, r, span)?;
            }
            Statement::Div(d, l, r, span) => {
                self.assemble_arithmetic(Opcode::DivRegRegReg, Opcode::DivRegRegImm, "div", d, l, r, span)?;
            }
            Statement::And(d, l, r, span) => {
                self.assemble_bitwise(Opcode::AndRegRegReg, Opcode::AndRegRegImm, "and", d, l, r, span)?;
            }
            Statement::Or(d, l, r, span) => {
                self.assemble_bitwise(Opcode::OrRegRegReg, Opcode::OrRegRegImm, "or", d, l, r, span)?;
            }
            Statement::Xor(d, l, r, span) => {
                self.assemble_bitwise(Opcode::XorRegRegReg, Opcode::XorRegRegImm, "xor", d, l, r, span)?;
            }
            Statement::Shl(d, l, r, span) => {
                self.assemble_bitwise(Opcode::ShlRegRegReg, Opcode::ShlRegRegImm, "shl", d, l, r, span)?;
            }
            Statement::Shr(d, l, r, span) => {
                self.assemble_bitwise(Opcode::ShrRegRegReg, Opcode::ShrRegRegImm, "shr", d, l, r, span)?;
            }

            Statement::Cmp(lhs, rhs, span) => self.assemble_cmp(lhs, rhs, span)?,

            Statement::Jmp(target, span) => {
                self.assemble_jump(Opcode::JmpImm, Opcode::JmpReg, "jmp", target, span)?;
            }
            Statement::Jeq(target, span) => {
                self.assemble_jump(Opcode::JeqImm, Opcode::JeqReg, "jeq", target, span)?;
            }
            Statement::Jne(target, span) => {
                self.assemble_jump(Opcode::JneImm, Opcode::JneReg, "jne", target, span)?;
            }
            Statement::Jlt(target, span) => {
                self.assemble_jump(Opcode::JltImm, Opcode::JltReg, "jlt", target, span)?;
            }
            Statement::Jgt(target, span) => {
                self.assemble_jump(Opcode::JgtImm, Opcode::JgtReg, "jgt", target, span)?;
            }
            Statement::Jle(target, span) => {
                self.assemble_jump(Opcode::JleImm, Opcode::JleReg, "jle", target, span)?;
            }
            Statement::Jge(target, span) => {
                self.assemble_jump(Opcode::JgeImm, Opcode::JgeReg, "jge", target, span)?;
            }

            Statement::Call(target, span) => self.assemble_call(target, span)?,

            Statement::Inc(expr, span) => self.assemble_single_register(Opcode::Inc, "inc", expr, span)?,
            Statement::Dec(expr, span) => self.assemble_single_register(Opcode::Dec, "dec", expr, span)?,
            Statement::Neg(expr, span) => self.assemble_single_register(Opcode::Neg, "neg", expr, span)?,

            Statement::LoadExternal(expr, span) => match expr {
                Expression::StringLiteral(path) => {
                    self.builder.push_byte(Opcode::LoadExternal);
                    let bytes: Vec<u8> = self.interner.resolve(path).bytes().collect();
                    self.builder.extend(bytes);
                    self.builder.push_byte(0x00u8);
                }
                other => return Err(self.invalid_operand("loadext", &other, span)),
            },

            Statement::Data(width, values, span) => self.assemble_data(width, values, span)?,
            Statement::Resb(expr, span) => match expr {
                Expression::IntegerLiteral(count) if count >= 0 => {
                    self.builder.grow(count as usize);
                }
                other => return Err(self.invalid_operand("resb", &other, span)),
            },

            // Preprocessor directives never reach the assembler; anything
            // left over means the pipeline was bypassed.
            other => {
                let span = other.span();
                return Err(NyxError::assemble(
                    format!("unsupported statement in assembly: {other:?}"),
                    span,
                ));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Instruction families
    // =========================================================================

    fn assemble_mov(&mut self, dest: Expression, src: Expression, span: Span) -> NyxResult<()> {
        const INST: &str = "mov";

        let dest = match dest {
            Expression::Register(reg) => reg,
            other => return Err(self.invalid_operand(INST, &other, span)),
        };
        let size = DataSize::from(dest);

        match src {
            Expression::Register(src) => {
                self.builder.push_byte(Opcode::MovRegReg);
                self.builder.push_byte(dest);
                self.builder.push_byte(src);
            }
            Expression::IntegerLiteral(value) => {
                if size.is_float() {
                    return Err(self.invalid_size(INST, span));
                }
                self.builder.push_byte(Opcode::MovRegImm);
                self.builder.push_byte(dest);
                self.emit_int(value, size);
            }
            Expression::FloatLiteral(value) => {
                if !size.is_float() {
                    return Err(self.invalid_size(INST, span));
                }
                self.builder.push_byte(Opcode::MovRegImm);
                self.builder.push_byte(dest);
                self.emit_float(value, size);
            }
            Expression::Identifier(label) => {
                if size.is_float() {
                    return Err(self.invalid_size(INST, span));
                }
                self.builder.push_byte(Opcode::MovRegImm);
                self.builder.push_byte(dest);
                self.emit_fixup(size, label, span);
            }
            other => return Err(self.invalid_operand(INST, &other, span)),
        }
        Ok(())
    }

    fn assemble_load_store(
        &mut self,
        opcode: Opcode,
        inst: &'static str,
        reg: Expression,
        addr: Expression,
        span: Span,
    ) -> NyxResult<()> {
        let reg = match reg {
            Expression::Register(reg) => reg,
            other => return Err(self.invalid_operand(inst, &other, span)),
        };
        let (base, offset) = match addr {
            Expression::Address(base, offset) => (base, offset),
            other => return Err(self.invalid_operand(inst, &other, span)),
        };

        self.builder.push_byte(opcode);
        self.builder.push_byte(reg);
        self.emit_address(*base, offset.map(|b| *b), inst, span)
    }

    fn assemble_sti(
        &mut self,
        size: Expression,
        value: Expression,
        addr: Expression,
        span: Span,
    ) -> NyxResult<()> {
        const INST: &str = "sti";

        let size = match size {
            Expression::DataSize(size) => size,
            other => return Err(self.invalid_operand(INST, &other, span)),
        };
        let (base, offset) = match addr {
            Expression::Address(base, offset) => (base, offset),
            other => return Err(self.invalid_operand(INST, &other, span)),
        };

        self.builder.push_byte(Opcode::Sti);
        self.builder.push_byte(size);
        match value {
            Expression::IntegerLiteral(v) => self.emit_int(v, size),
            Expression::FloatLiteral(v) => {
                if !size.is_float() {
                    return Err(self.invalid_size(INST, span));
                }
                self.emit_float(v, size);
            }
            Expression::Identifier(label) => {
                if size.is_float() {
                    return Err(self.invalid_size(INST, span));
                }
                self.emit_fixup(size, label, span);
            }
            other => return Err(self.invalid_operand(INST, &other, span)),
        }
        self.emit_address(*base, offset.map(|b| *b), INST, span)
    }

    fn assemble_push(
        &mut self,
        size: Option<Expression>,
        src: Expression,
        span: Span,
    ) -> NyxResult<()> {
        const INST: &str = "push";

        let size = match size {
            None => None,
            Some(Expression::DataSize(size)) => Some(size),
            Some(other) => return Err(self.invalid_operand(INST, &other, span)),
        };

        match src {
            Expression::Register(reg) => {
                self.builder.push_byte(Opcode::PushReg);
                self.builder.push_byte(size.unwrap_or_else(|| DataSize::from(reg)));
                self.builder.push_byte(reg);
            }
            Expression::IntegerLiteral(value) => {
                let size = size.unwrap_or(DataSize::QWord);
                self.builder.push_byte(Opcode::PushImm);
                self.builder.push_byte(size);
                self.emit_int(value, size);
            }
            Expression::FloatLiteral(value) => {
                let size = size.unwrap_or(DataSize::Double);
                if !size.is_float() {
                    return Err(self.invalid_size(INST, span));
                }
                self.builder.push_byte(Opcode::PushImm);
                self.builder.push_byte(size);
                self.emit_float(value, size);
            }
            Expression::Identifier(label) => {
                let size = size.unwrap_or(DataSize::QWord);
                if size.is_float() {
                    return Err(self.invalid_size(INST, span));
                }
                self.builder.push_byte(Opcode::PushImm);
                self.builder.push_byte(size);
                self.emit_fixup(size, label, span);
            }
            Expression::Address(base, offset) => {
                self.builder.push_byte(Opcode::PushAddr);
                self.builder.push_byte(size.unwrap_or(DataSize::QWord));
                self.emit_address(*base, offset.map(|b| *b), INST, span)?;
            }
            other => return Err(self.invalid_operand(INST, &other, span)),
        }
        Ok(())
    }

    fn assemble_pop(
        &mut self,
        size: Option<Expression>,
        dest: Expression,
        span: Span,
    ) -> NyxResult<()> {
        const INST: &str = "pop";

        let size = match size {
            None => None,
            Some(Expression::DataSize(size)) => Some(size),
            Some(other) => return Err(self.invalid_operand(INST, &other, span)),
        };

        match dest {
            Expression::Register(reg) => {
                self.builder.push_byte(Opcode::PopReg);
                self.builder.push_byte(size.unwrap_or_else(|| DataSize::from(reg)));
                self.builder.push_byte(reg);
            }
            Expression::Address(base, offset) => {
                self.builder.push_byte(Opcode::PopAddr);
                self.builder.push_byte(size.unwrap_or(DataSize::QWord));
                self.emit_address(*base, offset.map(|b| *b), INST, span)?;
            }
            other => return Err(self.invalid_operand(INST, &other, span)),
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble_arithmetic(
        &mut self,
        reg_op: Opcode,
        imm_op: Opcode,
        inst: &'static str,
        dest: Expression,
        lhs: Expression,
        rhs: Expression,
        span: Span,
    ) -> NyxResult<()> {
        let Expression::Register(dest) = dest else {
            return Err(NyxError::assemble(
                format!("invalid operands in {inst}: destination must be a register"),
                span,
            ));
        };
        let lhs = match lhs {
            Expression::Register(reg) => reg,
            other => return Err(self.invalid_operand(inst, &other, span)),
        };
        let size = DataSize::from(dest);

        match rhs {
            Expression::Register(rhs) => {
                self.builder.push_byte(reg_op);
                self.builder.push_byte(dest);
                self.builder.push_byte(lhs);
                self.builder.push_byte(rhs);
            }
            Expression::IntegerLiteral(value) => {
                self.builder.push_byte(imm_op);
                self.builder.push_byte(dest);
                self.builder.push_byte(lhs);
                // Immediates coerce to the destination width, including the
                // float widths.
                self.emit_int(value, size);
            }
            Expression::FloatLiteral(value) => {
                if !size.is_float() {
                    return Err(self.invalid_size(inst, span));
                }
                self.builder.push_byte(imm_op);
                self.builder.push_byte(dest);
                self.builder.push_byte(lhs);
                self.emit_float(value, size);
            }
            other => return Err(self.invalid_operand(inst, &other, span)),
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble_bitwise(
        &mut self,
        reg_op: Opcode,
        imm_op: Opcode,
        inst: &'static str,
        dest: Expression,
        lhs: Expression,
        rhs: Expression,
        span: Span,
    ) -> NyxResult<()> {
        let Expression::Register(dest) = dest else {
            return Err(NyxError::assemble(
                format!("invalid operands in {inst}: destination must be a register"),
                span,
            ));
        };
        let lhs = match lhs {
            Expression::Register(reg) => reg,
            other => return Err(self.invalid_operand(inst, &other, span)),
        };

        let float_reject = |reg: Register| DataSize::from(reg).is_float();
        if float_reject(dest) || float_reject(lhs) {
            return Err(self.bitwise_float_error(inst, span));
        }
        let size = DataSize::from(dest);

        match rhs {
            Expression::Register(rhs) => {
                if float_reject(rhs) {
                    return Err(self.bitwise_float_error(inst, span));
                }
                self.builder.push_byte(reg_op);
                self.builder.push_byte(dest);
                self.builder.push_byte(lhs);
                self.builder.push_byte(rhs);
            }
            Expression::IntegerLiteral(value) => {
                self.builder.push_byte(imm_op);
                self.builder.push_byte(dest);
                self.builder.push_byte(lhs);
                self.emit_int(value, size);
            }
            Expression::FloatLiteral(_) => {
                return Err(self.bitwise_float_error(inst, span));
            }
            other => return Err(self.invalid_operand(inst, &other, span)),
        }
        Ok(())
    }

    fn assemble_cmp(&mut self, lhs: Expression, rhs: Expression, span: Span) -> NyxResult<()> {
        const INST: &str = "cmp";

        let lhs = match lhs {
            Expression::Register(reg) => reg,
            other => return Err(self.invalid_operand(INST, &other, span)),
        };
        let size = DataSize::from(lhs);

        match rhs {
            Expression::Register(rhs) => {
                self.builder.push_byte(Opcode::CmpRegReg);
                self.builder.push_byte(lhs);
                self.builder.push_byte(rhs);
            }
            Expression::IntegerLiteral(value) => {
                self.builder.push_byte(Opcode::CmpRegImm);
                self.builder.push_byte(lhs);
                self.emit_int(value, size);
            }
            Expression::FloatLiteral(value) => {
                if !size.is_float() {
                    return Err(self.invalid_size(INST, span));
                }
                self.builder.push_byte(Opcode::CmpRegImm);
                self.builder.push_byte(lhs);
                self.emit_float(value, size);
            }
            other => return Err(self.invalid_operand(INST, &other, span)),
        }
        Ok(())
    }

    fn assemble_jump(
        &mut self,
        imm_op: Opcode,
        reg_op: Opcode,
        inst: &'static str,
        target: Expression,
        span: Span,
    ) -> NyxResult<()> {
        match target {
            Expression::IntegerLiteral(addr) => {
                self.builder.push_byte(imm_op);
                self.builder.extend((addr as u64).to_le_bytes());
            }
            Expression::Register(reg) => {
                self.builder.push_byte(reg_op);
                self.builder.push_byte(reg);
            }
            Expression::Identifier(label) => {
                self.builder.push_byte(imm_op);
                self.emit_fixup(DataSize::QWord, label, span);
            }
            other => return Err(self.invalid_operand(inst, &other, span)),
        }
        Ok(())
    }

    fn assemble_call(&mut self, target: Expression, span: Span) -> NyxResult<()> {
        const INST: &str = "call";

        match target {
            Expression::IntegerLiteral(addr) => {
                self.builder.push_byte(Opcode::CallImm);
                self.builder.extend((addr as u64).to_le_bytes());
            }
            Expression::Register(reg) => {
                self.builder.push_byte(Opcode::CallReg);
                self.builder.push_byte(reg);
            }
            Expression::Identifier(name) if self.externs.contains(&name) => {
                self.builder.push_byte(Opcode::CallEx);
                let bytes: Vec<u8> = self.interner.resolve(name).bytes().collect();
                self.builder.extend(bytes);
                self.builder.push_byte(0x00u8);
            }
            Expression::Identifier(label) => {
                self.builder.push_byte(Opcode::CallImm);
                self.emit_fixup(DataSize::QWord, label, span);
            }
            other => return Err(self.invalid_operand(INST, &other, span)),
        }
        Ok(())
    }

    fn assemble_single_register(
        &mut self,
        opcode: Opcode,
        inst: &'static str,
        expr: Expression,
        span: Span,
    ) -> NyxResult<()> {
        let reg = match expr {
            Expression::Register(reg) => reg,
            other => return Err(self.invalid_operand(inst, &other, span)),
        };
        self.builder.push_byte(opcode);
        self.builder.push_byte(reg);
        Ok(())
    }

    fn assemble_data(
        &mut self,
        width: DataSize,
        values: Vec<Expression>,
        span: Span,
    ) -> NyxResult<()> {
        let inst = match width {
            DataSize::Byte => "db",
            DataSize::Word => "dw",
            DataSize::DWord => "dd",
            _ => "dq",
        };

        for value in values {
            match value {
                Expression::IntegerLiteral(v) => self.emit_int(v, width),
                Expression::StringLiteral(text) if width == DataSize::Byte => {
                    let bytes: Vec<u8> = self.interner.resolve(text).bytes().collect();
                    self.builder.extend(bytes);
                }
                Expression::StringLiteral(_) => {
                    return Err(NyxError::assemble(
                        format!("invalid operands in {inst}: string literals are only legal in db"),
                        span,
                    ));
                }
                other => return Err(self.invalid_operand(inst, &other, span)),
            }
        }
        Ok(())
    }

    // =========================================================================
    // Operand emission
    // =========================================================================

    /// Emit an integer literal coerced to the given width, little-endian.
    fn emit_int(&mut self, value: i64, size: DataSize) {
        let bytes: SmallVec<[u8; 8]> = match size {
            DataSize::Byte => SmallVec::from_slice(&[value as u8]),
            DataSize::Word => SmallVec::from_slice(&(value as u16).to_le_bytes()),
            DataSize::DWord => SmallVec::from_slice(&(value as u32).to_le_bytes()),
            DataSize::QWord => SmallVec::from_slice(&(value as u64).to_le_bytes()),
            DataSize::Float => SmallVec::from_slice(&(value as f32).to_le_bytes()),
            DataSize::Double => SmallVec::from_slice(&(value as f64).to_le_bytes()),
        };
        self.builder.extend(bytes);
    }

    /// Emit a float literal at one of the two float widths.
    fn emit_float(&mut self, value: f64, size: DataSize) {
        let bytes: SmallVec<[u8; 8]> = match size {
            DataSize::Float => SmallVec::from_slice(&(value as f32).to_le_bytes()),
            _ => SmallVec::from_slice(&value.to_le_bytes()),
        };
        self.builder.extend(bytes);
    }

    /// Reserve `size` zero bytes at the current offset and record a fixup.
    fn emit_fixup(&mut self, size: DataSize, label: Symbol, span: Span) {
        self.fixups.push(Fixup {
            section: self.builder.section(),
            offset: self.builder.offset(),
            size,
            label,
            span,
        });
        self.builder.grow(size.size_in_bytes());
    }

    /// Emit an addressing operand: variant tag, base, 8-byte offset.
    fn emit_address(
        &mut self,
        base: Expression,
        offset: Option<Expression>,
        inst: &'static str,
        span: Span,
    ) -> NyxResult<()> {
        let offset = match offset {
            None => 0i64,
            Some(Expression::IntegerLiteral(v)) => v,
            Some(other) => return Err(self.invalid_operand(inst, &other, span)),
        };

        match base {
            Expression::Register(base) => {
                self.builder.push_byte(ADDRESSING_REGISTER_BASE);
                self.builder.push_byte(base);
            }
            Expression::IntegerLiteral(base) => {
                self.builder.push_byte(ADDRESSING_IMMEDIATE_BASE);
                self.builder.extend(base.to_le_bytes());
            }
            Expression::Identifier(label) => {
                self.builder.push_byte(ADDRESSING_IMMEDIATE_BASE);
                self.emit_fixup(DataSize::QWord, label, span);
            }
            other => return Err(self.invalid_operand(inst, &other, span)),
        }

        self.builder.extend(offset.to_le_bytes());
        Ok(())
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    fn resolve_fixups(&mut self) -> NyxResult<()> {
        let text_len = self.builder.len(Section::Text);

        for fixup in std::mem::take(&mut self.fixups) {
            let Some(site) = self.labels.get(&fixup.label) else {
                return Err(NyxError::assemble(
                    format!("undefined label: {}", self.interner.resolve(fixup.label)),
                    fixup.span,
                ));
            };

            let absolute = match site.section {
                Section::Text => site.offset,
                Section::Data => text_len + site.offset,
            };

            match fixup.size {
                DataSize::Byte => {
                    self.builder
                        .write_u8_at(fixup.section, fixup.offset, absolute as u8);
                }
                DataSize::Word => {
                    self.builder
                        .write_u16_at(fixup.section, fixup.offset, absolute as u16);
                }
                DataSize::DWord => {
                    self.builder
                        .write_u32_at(fixup.section, fixup.offset, absolute as u32);
                }
                DataSize::QWord => {
                    self.builder
                        .write_u64_at(fixup.section, fixup.offset, absolute as u64);
                }
                DataSize::Float | DataSize::Double => {
                    return Err(NyxError::assemble("invalid fixup width", fixup.span));
                }
            }
        }
        Ok(())
    }

    fn resolve_entry(&self) -> NyxResult<u64> {
        match &self.entry {
            Entry::Address(addr) => Ok(*addr),
            Entry::Fixup(label, span) => {
                let Some(site) = self.labels.get(label) else {
                    return Err(NyxError::assemble(
                        format!("undefined label: {}", self.interner.resolve(*label)),
                        *span,
                    ));
                };
                let absolute = match site.section {
                    Section::Text => site.offset,
                    Section::Data => self.builder.len(Section::Text) + site.offset,
                };
                Ok(absolute as u64)
            }
        }
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    fn invalid_operand(&self, inst: &str, operand: &Expression, span: Span) -> NyxError {
        NyxError::assemble(
            format!("invalid operands in {inst}: unsupported operand {operand:?}"),
            span,
        )
    }

    fn invalid_size(&self, inst: &str, span: Span) -> NyxError {
        NyxError::assemble(format!("invalid data size in {inst}"), span)
    }

    fn bitwise_float_error(&self, inst: &str, span: Span) -> NyxError {
        NyxError::assemble(
            format!("invalid operands in {inst}: bitwise operations are not supported on floating-point values"),
            span,
        )
    }
}
