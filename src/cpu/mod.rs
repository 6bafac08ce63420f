//! CPU emulation for the HP-35.
//!
//! This module implements the five-chip architecture's digital core:
//! - a banked 10-bit microcode ROM (three 256-word pages)
//! - seven 14-nibble BCD registers plus scratch, status and pointers
//! - the microinstruction decoder and one-cycle-per-step executor
//! - a microcode disassembler for debugging

pub mod decode;
pub mod disasm;
pub mod execute;
pub mod registers;
pub mod rom;

pub use decode::{decode, encode, ArithOp, Field, MicroInstruction, MicroOp};
pub use execute::{Cpu, StepEvent, ERROR_PC};
pub use registers::{Registers, STATUS_BITS, STATUS_KEY_PENDING};
pub use rom::{Rom, RomError};
