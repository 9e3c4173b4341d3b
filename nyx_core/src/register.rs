//! The register enumeration and its wire encoding.
//!
//! Sixteen general-purpose banks are each visible through six width-aliased
//! views (`b`/`w`/`d`/`q` over the integer file, `ff`/`dd` over the float
//! file), followed by the three special registers. Declaration order is the
//! stable wire encoding: a register's id byte is its ordinal.

use crate::value::DataSize;
use std::fmt;

macro_rules! define_registers {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// A named register view.
        ///
        /// Ids run `b0=0x00, w0=0x01, d0=0x02, q0=0x03, ff0=0x04, dd0=0x05,
        /// b1=0x06, …` with `ip=0x60`, `sp=0x61`, `bp=0x62` at the end.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        #[allow(missing_docs)]
        pub enum Register {
            $($variant),+
        }

        impl Register {
            /// Every register in id order.
            pub const ALL: [Register; 99] = [$(Register::$variant),+];

            /// Parse a register from its source-level name.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Register> {
                match name {
                    $($name => Some(Register::$variant),)+
                    _ => None,
                }
            }

            /// The source-level name of this register.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Register::$variant => $name),+
                }
            }
        }
    };
}

define_registers! {
    B0 => "b0", W0 => "w0", D0 => "d0", Q0 => "q0", FF0 => "ff0", DD0 => "dd0",
    B1 => "b1", W1 => "w1", D1 => "d1", Q1 => "q1", FF1 => "ff1", DD1 => "dd1",
    B2 => "b2", W2 => "w2", D2 => "d2", Q2 => "q2", FF2 => "ff2", DD2 => "dd2",
    B3 => "b3", W3 => "w3", D3 => "d3", Q3 => "q3", FF3 => "ff3", DD3 => "dd3",
    B4 => "b4", W4 => "w4", D4 => "d4", Q4 => "q4", FF4 => "ff4", DD4 => "dd4",
    B5 => "b5", W5 => "w5", D5 => "d5", Q5 => "q5", FF5 => "ff5", DD5 => "dd5",
    B6 => "b6", W6 => "w6", D6 => "d6", Q6 => "q6", FF6 => "ff6", DD6 => "dd6",
    B7 => "b7", W7 => "w7", D7 => "d7", Q7 => "q7", FF7 => "ff7", DD7 => "dd7",
    B8 => "b8", W8 => "w8", D8 => "d8", Q8 => "q8", FF8 => "ff8", DD8 => "dd8",
    B9 => "b9", W9 => "w9", D9 => "d9", Q9 => "q9", FF9 => "ff9", DD9 => "dd9",
    B10 => "b10", W10 => "w10", D10 => "d10", Q10 => "q10", FF10 => "ff10", DD10 => "dd10",
    B11 => "b11", W11 => "w11", D11 => "d11", Q11 => "q11", FF11 => "ff11", DD11 => "dd11",
    B12 => "b12", W12 => "w12", D12 => "d12", Q12 => "q12", FF12 => "ff12", DD12 => "dd12",
    B13 => "b13", W13 => "w13", D13 => "d13", Q13 => "q13", FF13 => "ff13", DD13 => "dd13",
    B14 => "b14", W14 => "w14", D14 => "d14", Q14 => "q14", FF14 => "ff14", DD14 => "dd14",
    B15 => "b15", W15 => "w15", D15 => "d15", Q15 => "q15", FF15 => "ff15", DD15 => "dd15",
    IP => "ip", SP => "sp", BP => "bp",
}

/// Number of width views per general-purpose bank.
const VIEWS_PER_BANK: u8 = 6;
/// First id past the banked registers (`ip`).
const SPECIAL_BASE: u8 = 96;

/// Which physical file backs a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterClass {
    /// One of the 16 `u64` general-purpose slots.
    GeneralPurpose,
    /// One of the 16 double-bit-pattern float slots.
    FloatingPoint,
    /// `ip`, `sp`, or `bp`.
    Special,
}

impl Register {
    /// The wire id of this register.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// The backing file this register selects.
    #[must_use]
    pub const fn class(self) -> RegisterClass {
        let id = self.id();
        if id >= SPECIAL_BASE {
            RegisterClass::Special
        } else if id % VIEWS_PER_BANK >= 4 {
            RegisterClass::FloatingPoint
        } else {
            RegisterClass::GeneralPurpose
        }
    }

    /// The slot index within the backing file.
    ///
    /// Bank index for general-purpose and float registers; 0/1/2 for
    /// `ip`/`sp`/`bp`.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> usize {
        let id = self.id();
        if id >= SPECIAL_BASE {
            (id - SPECIAL_BASE) as usize
        } else {
            (id / VIEWS_PER_BANK) as usize
        }
    }
}

impl From<Register> for u8 {
    #[inline]
    fn from(reg: Register) -> u8 {
        reg.id()
    }
}

impl TryFrom<u8> for Register {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Register::ALL.get(value as usize).copied().ok_or(())
    }
}

impl From<Register> for DataSize {
    /// The natural data size of a register view.
    fn from(reg: Register) -> DataSize {
        let id = reg.id();
        if id >= SPECIAL_BASE {
            return DataSize::QWord;
        }
        match id % VIEWS_PER_BANK {
            0 => DataSize::Byte,
            1 => DataSize::Word,
            2 => DataSize::DWord,
            3 => DataSize::QWord,
            4 => DataSize::Float,
            _ => DataSize::Double,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
