//! HP-35 register file.
//!
//! The CPU owns:
//! - A, B: the display pair (A digits, B blanking/decimal masks)
//! - C: the X register of the RPN stack
//! - D, E, F: the Y, Z, T stack levels
//! - M: the STO/RCL scratchpad
//! - T: scratch target for the compare instructions
//! - S: twelve independent status bits (S[0] is "key pending")
//! - P: 4-bit digit pointer, PC: 8-bit program counter, RET: the single
//!   subroutine return slot, OFFSET: 3-bit ROM bank selector
//! - CARRY and its start-of-cycle snapshot PREV_CARRY
//! - the display-enable latch and its pending-update flag

use crate::bcd::Reg;
use serde::{Deserialize, Serialize};

/// Number of status bits in the S array.
pub const STATUS_BITS: usize = 12;

/// Status bit raised when a key code has been latched for the ROM.
pub const STATUS_KEY_PENDING: u8 = 0;

/// The complete HP-35 register file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registers {
    pub a: Reg,
    pub b: Reg,
    pub c: Reg,
    pub d: Reg,
    pub e: Reg,
    pub f: Reg,

    /// STO/RCL scratchpad.
    pub m: Reg,

    /// Compare target; receives the difference of the two compare ops.
    pub t: Reg,

    /// Status array, bits 0..11.
    pub s: [bool; STATUS_BITS],

    /// Digit pointer, wraps mod 16.
    pub p: u8,

    /// Program counter within the current bank.
    pub pc: u8,

    /// Subroutine return slot; exactly one level deep.
    pub ret: u8,

    /// ROM bank selector.
    pub offset: u8,

    /// Carry produced by the current cycle.
    pub carry: u8,

    /// Carry sampled at the start of the cycle; the branch predicate.
    pub prev_carry: u8,

    /// Last latched key code; target of the jump-on-key instruction.
    pub key_rom: u8,

    /// Display-enable latch.
    pub display_on: bool,

    /// A display refresh is owed when the latch next falls.
    pub display_update: bool,
}

impl Registers {
    /// Create a register file in the power-on state (everything zero).
    pub fn new() -> Self {
        Self {
            a: Reg::zero(),
            b: Reg::zero(),
            c: Reg::zero(),
            d: Reg::zero(),
            e: Reg::zero(),
            f: Reg::zero(),
            m: Reg::zero(),
            t: Reg::zero(),
            s: [false; STATUS_BITS],
            p: 0,
            pc: 0,
            ret: 0,
            offset: 0,
            carry: 0,
            prev_carry: 0,
            key_rom: 0,
            display_on: false,
            display_update: false,
        }
    }

    /// Reset every register to the power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The clear-registers microinstruction: zero A..F and M in one cycle.
    pub fn clear_working(&mut self) {
        self.a = Reg::zero();
        self.b = Reg::zero();
        self.c = Reg::zero();
        self.d = Reg::zero();
        self.e = Reg::zero();
        self.f = Reg::zero();
        self.m = Reg::zero();
    }

    /// Zero all twelve status bits.
    pub fn clear_status(&mut self) {
        self.s = [false; STATUS_BITS];
    }

    /// Read a status bit. The 4-bit selector can address bits 12..15,
    /// which do not exist; they read as clear.
    #[inline]
    pub fn status(&self, bit: u8) -> bool {
        let bit = bit as usize;
        bit < STATUS_BITS && self.s[bit]
    }

    /// Write a status bit. Writes outside the array are a ROM bug and
    /// are dropped.
    #[inline]
    pub fn set_status(&mut self, bit: u8, value: bool) {
        let bit = bit as usize;
        debug_assert!(bit < STATUS_BITS, "status bit {} out of range", bit);
        if bit < STATUS_BITS {
            self.s[bit] = value;
        }
    }

    /// Advance the program counter by one, wrapping within the bank.
    /// Returns the old value.
    #[inline]
    pub fn advance_pc(&mut self) -> u8 {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(1);
        old
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
