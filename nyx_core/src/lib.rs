//! Core types shared across the Nyx toolchain.
//!
//! This crate provides the primitives every other Nyx crate builds on:
//! - Source spans for error reporting ([`Span`], [`Spanned`])
//! - String interning with stable integer ids ([`Interner`], [`Symbol`])
//! - The tagged numeric value model ([`DataSize`], [`Immediate`])
//! - The register enumeration and its wire encoding ([`Register`])
//! - The unified compile-phase error type ([`NyxError`], [`NyxResult`])

pub mod error;
pub mod intern;
pub mod register;
pub mod span;
pub mod value;

pub use error::{NyxError, NyxResult};
pub use intern::{Interner, Symbol};
pub use register::Register;
pub use span::{Span, Spanned};
pub use value::{DataSize, Immediate};
