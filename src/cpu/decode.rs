//! Microinstruction decoder for the HP-35.
//!
//! Each microinstruction is a 10-bit word held as the byte pair `(H, L)`.
//! The low two bits of `L` select the major family (call, arithmetic,
//! branch, miscellaneous); the miscellaneous family sub-dispatches on
//! fixed bit patterns. All of the fragile bit arithmetic lives in the
//! [`MicroInstruction`] accessors; [`decode`] turns a word into exactly
//! one [`MicroOp`] variant, and [`encode`] is its inverse for tests and
//! the disassembler.

use crate::bcd::Span;
use serde::{Deserialize, Serialize};

/// A single 10-bit microinstruction as the byte pair `(H, L)`.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroInstruction {
    h: u8,
    l: u8,
}

impl MicroInstruction {
    /// Wrap a byte pair. Only the low two bits of `H` belong to the word.
    #[inline]
    pub const fn new(h: u8, l: u8) -> Self {
        Self { h: h & 0x03, l }
    }

    /// Rebuild from a packed 10-bit word.
    #[inline]
    pub const fn from_word(word: u16) -> Self {
        Self::new((word >> 8) as u8, (word & 0xFF) as u8)
    }

    /// The packed 10-bit word.
    #[inline]
    pub const fn word(self) -> u16 {
        ((self.h as u16) << 8) | self.l as u16
    }

    /// High byte (upper two instruction bits).
    #[inline]
    pub const fn high(self) -> u8 {
        self.h
    }

    /// Low byte.
    #[inline]
    pub const fn low(self) -> u8 {
        self.l
    }

    /// Major family selector (`L & 3`).
    #[inline]
    pub const fn family(self) -> u8 {
        self.l & 0x03
    }

    /// Subroutine call target.
    #[inline]
    pub const fn call_target(self) -> u8 {
        ((self.l >> 2) & 0x3F) | ((self.h << 6) & 0xC0)
    }

    /// Conditional branch target.
    #[inline]
    pub const fn branch_target(self) -> u8 {
        ((self.l & 0xFC) >> 2) | ((self.h & 0x03) << 6)
    }

    /// Field code of an arithmetic instruction.
    #[inline]
    pub const fn slice_code(self) -> u8 {
        (self.l >> 2) & 0x07
    }

    /// 5-bit opcode of an arithmetic instruction.
    #[inline]
    pub const fn op_code(self) -> u8 {
        ((self.l >> 5) & 0x07) | ((self.h << 3) & 0x18)
    }

    /// 4-bit status/pointer selector.
    #[inline]
    pub const fn bitsel(self) -> u8 {
        ((self.h & 0x03) << 2) | ((self.l & 0xC0) >> 6)
    }

    /// 4-bit constant of a load-constant instruction.
    #[inline]
    pub const fn const_nibble(self) -> u8 {
        ((self.l >> 6) | (self.h << 2)) & 0x0F
    }

    /// Bank number of a ROM-select instruction.
    #[inline]
    pub const fn rom_bank(self) -> u8 {
        ((self.h << 1) & 0x06) | ((self.l >> 7) & 0x01)
    }
}

impl std::fmt::Debug for MicroInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MicroInstruction({:#05x})", self.word())
    }
}

/// Digit field of an arithmetic instruction.
///
/// The seven canonical spans of the register word, named after the
/// classic-series field codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    /// Single digit at the pointer.
    P,
    /// Mantissa, digits 3..12.
    M,
    /// Exponent, digits 0..2.
    X,
    /// Whole word, digits 0..13.
    W,
    /// Word up to and including the pointer, digits 0..P.
    Wp,
    /// Mantissa and sign, digits 3..13.
    Ms,
    /// Exponent sign digit, 2..2.
    Xs,
    /// Mantissa sign digit, 13..13.
    S,
}

impl Field {
    /// Decode a 3-bit field code.
    pub const fn from_code(code: u8) -> Self {
        match code & 0x07 {
            0 => Field::P,
            1 => Field::M,
            2 => Field::X,
            3 => Field::W,
            4 => Field::Wp,
            5 => Field::Ms,
            6 => Field::Xs,
            _ => Field::S,
        }
    }

    /// The 3-bit field code.
    pub const fn code(self) -> u8 {
        match self {
            Field::P => 0,
            Field::M => 1,
            Field::X => 2,
            Field::W => 3,
            Field::Wp => 4,
            Field::Ms => 5,
            Field::Xs => 6,
            Field::S => 7,
        }
    }

    /// Resolve to a digit span given the current pointer value.
    pub fn span(self, p: u8) -> Span {
        let p = p as usize;
        match self {
            Field::P => Span::new(p, p),
            Field::M => Span::new(3, 12),
            Field::X => Span::new(0, 2),
            Field::W => Span::new(0, 13),
            Field::Wp => Span::new(0, p),
            Field::Ms => Span::new(3, 13),
            Field::Xs => Span::new(2, 2),
            Field::S => Span::new(13, 13),
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::P => "p",
            Field::M => "m",
            Field::X => "x",
            Field::W => "w",
            Field::Wp => "wp",
            Field::Ms => "ms",
            Field::Xs => "xs",
            Field::S => "s",
        };
        write!(f, "{}", name)
    }
}

/// The 32 arithmetic-and-register operations.
///
/// Compare and test operations leave their nominal target untouched and
/// report through CARRY; the two compares additionally write their
/// difference into the scratch register T.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    /// 0x00: carry set when any digit of B in the field is nonzero.
    TestBZero,
    /// 0x01: 0 -> B.
    ClearB,
    /// 0x02: A - C -> T; carry = borrow (the "A >= C" test).
    CompareAC,
    /// 0x03: carry set when C in the field is entirely zero ("C >= 1" test).
    TestCGeOne,
    /// 0x04: B -> C.
    BToC,
    /// 0x05: 0 - C -> C.
    NegateC,
    /// 0x06: 0 -> C.
    ClearC,
    /// 0x07: 0 - C - 1 -> C.
    ComplementC,
    /// 0x08: shift A left one digit.
    ShiftLeftA,
    /// 0x09: A -> B.
    AToB,
    /// 0x0A: A - C -> C.
    SubAcToC,
    /// 0x0B: C - 1 -> C.
    DecrementC,
    /// 0x0C: C -> A.
    CToA,
    /// 0x0D: carry set when any digit of C in the field is nonzero.
    TestCZero,
    /// 0x0E: A + C -> C.
    AddAcToC,
    /// 0x0F: C + 1 -> C.
    IncrementC,
    /// 0x10: A - B -> T; carry = borrow (the "A >= B" test).
    CompareAB,
    /// 0x11: B <-> C.
    SwapBC,
    /// 0x12: shift C right one digit.
    ShiftRightC,
    /// 0x13: carry set when A in the field is entirely zero ("A >= 1" test).
    TestAGeOne,
    /// 0x14: shift B right one digit.
    ShiftRightB,
    /// 0x15: C + C -> C.
    DoubleC,
    /// 0x16: shift A right one digit.
    ShiftRightA,
    /// 0x17: 0 -> A.
    ClearA,
    /// 0x18: A - B -> A.
    SubAbToA,
    /// 0x19: A <-> B.
    SwapAB,
    /// 0x1A: A - C -> A.
    SubAcToA,
    /// 0x1B: A - 1 -> A.
    DecrementA,
    /// 0x1C: A + B -> A.
    AddAbToA,
    /// 0x1D: A <-> C.
    SwapAC,
    /// 0x1E: A + C -> A.
    AddAcToA,
    /// 0x1F: A + 1 -> A.
    IncrementA,
}

impl ArithOp {
    /// Decode a 5-bit opcode.
    pub const fn from_code(op: u8) -> Self {
        match op & 0x1F {
            0x00 => ArithOp::TestBZero,
            0x01 => ArithOp::ClearB,
            0x02 => ArithOp::CompareAC,
            0x03 => ArithOp::TestCGeOne,
            0x04 => ArithOp::BToC,
            0x05 => ArithOp::NegateC,
            0x06 => ArithOp::ClearC,
            0x07 => ArithOp::ComplementC,
            0x08 => ArithOp::ShiftLeftA,
            0x09 => ArithOp::AToB,
            0x0A => ArithOp::SubAcToC,
            0x0B => ArithOp::DecrementC,
            0x0C => ArithOp::CToA,
            0x0D => ArithOp::TestCZero,
            0x0E => ArithOp::AddAcToC,
            0x0F => ArithOp::IncrementC,
            0x10 => ArithOp::CompareAB,
            0x11 => ArithOp::SwapBC,
            0x12 => ArithOp::ShiftRightC,
            0x13 => ArithOp::TestAGeOne,
            0x14 => ArithOp::ShiftRightB,
            0x15 => ArithOp::DoubleC,
            0x16 => ArithOp::ShiftRightA,
            0x17 => ArithOp::ClearA,
            0x18 => ArithOp::SubAbToA,
            0x19 => ArithOp::SwapAB,
            0x1A => ArithOp::SubAcToA,
            0x1B => ArithOp::DecrementA,
            0x1C => ArithOp::AddAbToA,
            0x1D => ArithOp::SwapAC,
            0x1E => ArithOp::AddAcToA,
            _ => ArithOp::IncrementA,
        }
    }

    /// The 5-bit opcode.
    pub const fn code(self) -> u8 {
        match self {
            ArithOp::TestBZero => 0x00,
            ArithOp::ClearB => 0x01,
            ArithOp::CompareAC => 0x02,
            ArithOp::TestCGeOne => 0x03,
            ArithOp::BToC => 0x04,
            ArithOp::NegateC => 0x05,
            ArithOp::ClearC => 0x06,
            ArithOp::ComplementC => 0x07,
            ArithOp::ShiftLeftA => 0x08,
            ArithOp::AToB => 0x09,
            ArithOp::SubAcToC => 0x0A,
            ArithOp::DecrementC => 0x0B,
            ArithOp::CToA => 0x0C,
            ArithOp::TestCZero => 0x0D,
            ArithOp::AddAcToC => 0x0E,
            ArithOp::IncrementC => 0x0F,
            ArithOp::CompareAB => 0x10,
            ArithOp::SwapBC => 0x11,
            ArithOp::ShiftRightC => 0x12,
            ArithOp::TestAGeOne => 0x13,
            ArithOp::ShiftRightB => 0x14,
            ArithOp::DoubleC => 0x15,
            ArithOp::ShiftRightA => 0x16,
            ArithOp::ClearA => 0x17,
            ArithOp::SubAbToA => 0x18,
            ArithOp::SwapAB => 0x19,
            ArithOp::SubAcToA => 0x1A,
            ArithOp::DecrementA => 0x1B,
            ArithOp::AddAbToA => 0x1C,
            ArithOp::SwapAC => 0x1D,
            ArithOp::AddAcToA => 0x1E,
            ArithOp::IncrementA => 0x1F,
        }
    }
}

/// A decoded microinstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MicroOp {
    /// Subroutine call: RET <- PC, PC <- target. One level, no stack.
    Call { target: u8 },

    /// Arithmetic/register operation over a digit field.
    Arith { op: ArithOp, field: Field },

    /// Branch taken when the previous cycle produced no carry.
    BranchIfNoCarry { target: u8 },

    /// PC <- RET.
    Return,

    /// OFFSET <- bank.
    SelectRom { bank: u8 },

    /// PC <- key_rom; clears the key-pending status bit.
    JumpOnKey,

    /// CARRY <- S[bit].
    TestStatus { bit: u8 },

    /// S[bit] <- 1.
    SetStatus { bit: u8 },

    /// S[bit] <- 0.
    ClearStatus { bit: u8 },

    /// Zero all twelve status bits.
    ClearAllStatus,

    /// CARRY <- (P == value).
    TestPointer { value: u8 },

    /// P <- value.
    SetPointer { value: u8 },

    /// P <- (P + 1) mod 16.
    IncPointer,

    /// P <- (P - 1) mod 16.
    DecPointer,

    /// C[P] <- nibble, then P <- (P - 1) mod 16.
    LoadConstant { nibble: u8 },

    /// C <-> M.
    SwapCM,

    /// Stack lift: F <- E, E <- D, D <- C (C is preserved).
    StackPush,

    /// Stack drop into A: A <- D, D <- E, E <- F (F is preserved).
    StackPop,

    /// C <- M.
    RecallM,

    /// Down rotate: C <- D, D <- E, E <- F, F <- old C.
    RotateDown,

    /// Zero A..F and M in one cycle.
    ClearRegisters,

    /// Lower the display latch and drop any pending update.
    DisplayOff,

    /// Toggle the display latch.
    DisplayToggle,

    /// No effect.
    Nop,
}

/// Decode a microinstruction word.
///
/// The decoder is total: every `(H, L)` pair maps to exactly one variant,
/// with unassigned patterns decoding as [`MicroOp::Nop`].
pub fn decode(mi: MicroInstruction) -> MicroOp {
    match mi.family() {
        0b01 => MicroOp::Call { target: mi.call_target() },
        0b10 => MicroOp::Arith {
            op: ArithOp::from_code(mi.op_code()),
            field: Field::from_code(mi.slice_code()),
        },
        0b11 => MicroOp::BranchIfNoCarry { target: mi.branch_target() },
        _ => decode_misc(mi),
    }
}

fn decode_misc(mi: MicroInstruction) -> MicroOp {
    let l = mi.low();

    if l & 0x7F == 0x30 {
        return MicroOp::Return;
    }
    if l & 0x7F == 0x10 {
        return MicroOp::SelectRom { bank: mi.rom_bank() };
    }
    if l == 0xD0 {
        return MicroOp::JumpOnKey;
    }

    match l & 0x3F {
        0x14 => return MicroOp::TestStatus { bit: mi.bitsel() },
        0x04 => return MicroOp::SetStatus { bit: mi.bitsel() },
        0x24 => return MicroOp::ClearStatus { bit: mi.bitsel() },
        0x34 => return MicroOp::ClearAllStatus,
        0x2C => return MicroOp::TestPointer { value: mi.bitsel() },
        0x0C => return MicroOp::SetPointer { value: mi.bitsel() },
        0x3C => return MicroOp::IncPointer,
        0x1C => return MicroOp::DecPointer,
        0x18 => return MicroOp::LoadConstant { nibble: mi.const_nibble() },
        _ => {}
    }

    match (mi.high() & 0x03, l & 0xEF) {
        (0, 0xA8) => MicroOp::SwapCM,
        (1, 0x28) => MicroOp::StackPush,
        (1, 0xA8) => MicroOp::StackPop,
        (2, 0xA8) => MicroOp::RecallM,
        (3, 0x28) => MicroOp::RotateDown,
        (3, 0xA8) => MicroOp::ClearRegisters,
        (0, 0x28) => MicroOp::DisplayOff,
        (2, 0x28) => MicroOp::DisplayToggle,
        _ => MicroOp::Nop,
    }
}

/// Encode a microoperation back to its word form.
///
/// Inverse of [`decode`] for every constructible variant; used by the
/// disassembler, the test suite and synthetic microprograms.
pub fn encode(op: &MicroOp) -> MicroInstruction {
    let (h, l): (u8, u8) = match *op {
        MicroOp::Call { target } => ((target >> 6) & 3, ((target & 0x3F) << 2) | 0x01),
        MicroOp::Arith { op, field } => {
            let code = op.code();
            ((code >> 3) & 3, ((code & 7) << 5) | (field.code() << 2) | 0x02)
        }
        MicroOp::BranchIfNoCarry { target } => ((target >> 6) & 3, ((target & 0x3F) << 2) | 0x03),
        MicroOp::Return => (0, 0x30),
        MicroOp::SelectRom { bank } => ((bank >> 1) & 3, 0x10 | ((bank & 1) << 7)),
        MicroOp::JumpOnKey => (0, 0xD0),
        MicroOp::TestStatus { bit } => encode_bitsel(bit, 0x14),
        MicroOp::SetStatus { bit } => encode_bitsel(bit, 0x04),
        MicroOp::ClearStatus { bit } => encode_bitsel(bit, 0x24),
        MicroOp::ClearAllStatus => (0, 0x34),
        MicroOp::TestPointer { value } => encode_bitsel(value, 0x2C),
        MicroOp::SetPointer { value } => encode_bitsel(value, 0x0C),
        MicroOp::IncPointer => (0, 0x3C),
        MicroOp::DecPointer => (0, 0x1C),
        MicroOp::LoadConstant { nibble } => ((nibble >> 2) & 3, ((nibble & 3) << 6) | 0x18),
        MicroOp::SwapCM => (0, 0xA8),
        MicroOp::StackPush => (1, 0x28),
        MicroOp::StackPop => (1, 0xA8),
        MicroOp::RecallM => (2, 0xA8),
        MicroOp::RotateDown => (3, 0x28),
        MicroOp::ClearRegisters => (3, 0xA8),
        MicroOp::DisplayOff => (0, 0x28),
        MicroOp::DisplayToggle => (2, 0x28),
        MicroOp::Nop => (0, 0x00),
    };
    MicroInstruction::new(h, l)
}

#[inline]
fn encode_bitsel(bit: u8, base: u8) -> (u8, u8) {
    ((bit >> 2) & 3, ((bit & 3) << 6) | base)
}
