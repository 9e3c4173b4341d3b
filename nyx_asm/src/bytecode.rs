//! The bytecode image format.
//!
//! An image is `header(8-byte little-endian entry offset) || text || data`.
//! The entry offset is absolute within the concatenated `text || data`.
//! Sections stay independent append buffers inside the builder until
//! finalization glues them together.

pub mod builder;
pub mod opcode;

/// Length of the entry-point header that precedes text and data.
pub const IMAGE_HEADER_LEN: usize = 8;

/// Addressing-variant tag: register base, followed by a register id byte and
/// an 8-byte offset.
pub const ADDRESSING_REGISTER_BASE: u8 = 0x00;

/// Addressing-variant tag: immediate base, followed by an 8-byte base and an
/// 8-byte offset. Label bases leave a fixup in the base slot.
pub const ADDRESSING_IMMEDIATE_BASE: u8 = 0x01;

/// One of the two append buffers of the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Code section.
    Text,
    /// Data section.
    Data,
}
