//! CPU execution engine for the HP-35.
//!
//! Implements the one-microinstruction-per-cycle interpreter: key latch
//! intake, carry snapshot, fetch, decode and execute. The CPU owns the
//! whole register file; the ROM is immutable shared storage and the key
//! latch is a single-slot mailbox written by the shell.

use crate::bcd::{arith, Reg};
use crate::cpu::decode::{decode, ArithOp, Field, MicroOp};
use crate::cpu::registers::{Registers, STATUS_KEY_PENDING};
use crate::cpu::rom::Rom;
use serde::{Deserialize, Serialize};

/// The ROM's overflow/underflow trap address in bank 0. Reaching it is a
/// display annotation, not a halt.
pub const ERROR_PC: u8 = 191;

/// Observable effects of one microcycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepEvent {
    /// The display latch fell with an update pending: project a frame.
    pub display_fell: bool,
    /// The program counter landed on the error trap.
    pub error_trap: bool,
}

/// The HP-35 CPU: register file, ROM and key latch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cpu {
    /// Register file.
    pub regs: Registers,
    /// Microcode image.
    rom: Rom,
    /// Single-slot key mailbox; consumed at the start of the next cycle.
    key_latch: Option<u8>,
    /// Executed microcycle count.
    pub cycles: u64,
}

impl Cpu {
    /// Create a CPU in the power-on state around a ROM image.
    pub fn new(rom: Rom) -> Self {
        Self {
            regs: Registers::new(),
            rom,
            key_latch: None,
            cycles: 0,
        }
    }

    /// Reset to the power-on state, keeping the ROM.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.key_latch = None;
        self.cycles = 0;
    }

    /// The ROM image.
    pub fn rom(&self) -> &Rom {
        &self.rom
    }

    /// Latch a key code for the next cycle. The mailbox holds one code;
    /// a second press before consumption replaces the first.
    pub fn press_key(&mut self, code: u8) {
        self.key_latch = Some(code);
    }

    /// Whether a key code is latched but not yet taken in by the CPU.
    pub fn key_latched(&self) -> bool {
        self.key_latch.is_some()
    }

    /// Execute exactly one microcycle.
    pub fn step(&mut self) -> StepEvent {
        // Key intake: a full latch becomes the jump-on-key target and
        // raises the key-pending status bit.
        if let Some(code) = self.key_latch.take() {
            self.regs.key_rom = code;
            self.regs.set_status(STATUS_KEY_PENDING, true);
        }

        // The branch predicate is the carry of the previous cycle.
        self.regs.prev_carry = self.regs.carry;

        let mi = self.rom.fetch(self.regs.offset, self.regs.pc);
        self.regs.advance_pc();

        let mut event = StepEvent::default();
        self.execute(decode(mi), &mut event);

        self.cycles += 1;

        if self.regs.pc == ERROR_PC && self.regs.offset == 0 {
            event.error_trap = true;
        }
        event
    }

    fn execute(&mut self, op: MicroOp, event: &mut StepEvent) {
        if let MicroOp::Arith { op, field } = op {
            self.execute_arith(op, field);
            return;
        }

        let r = &mut self.regs;
        match op {
            MicroOp::Arith { .. } => unreachable!(),

            MicroOp::Call { target } => {
                r.ret = r.pc;
                r.pc = target;
            }
            MicroOp::BranchIfNoCarry { target } => {
                if r.prev_carry != 1 {
                    r.pc = target;
                }
            }
            MicroOp::Return => r.pc = r.ret,
            MicroOp::SelectRom { bank } => r.offset = bank & 0x07,
            MicroOp::JumpOnKey => {
                debug_assert!(
                    r.status(STATUS_KEY_PENDING),
                    "jump-on-key with no key pending reads a stale key code"
                );
                r.pc = r.key_rom;
                r.set_status(STATUS_KEY_PENDING, false);
            }

            MicroOp::TestStatus { bit } => r.carry = r.status(bit) as u8,
            MicroOp::SetStatus { bit } => r.set_status(bit, true),
            MicroOp::ClearStatus { bit } => r.set_status(bit, false),
            MicroOp::ClearAllStatus => r.clear_status(),

            MicroOp::TestPointer { value } => r.carry = (r.p == value) as u8,
            MicroOp::SetPointer { value } => r.p = value & 0x0F,
            MicroOp::IncPointer => r.p = r.p.wrapping_add(1) & 0x0F,
            MicroOp::DecPointer => r.p = r.p.wrapping_sub(1) & 0x0F,
            MicroOp::LoadConstant { nibble } => {
                let p = r.p as usize;
                debug_assert!(p < Reg::WIDTH, "constant load with pointer at {}", p);
                if p < Reg::WIDTH {
                    r.c.set_digit(p, nibble);
                }
                r.p = r.p.wrapping_sub(1) & 0x0F;
            }

            MicroOp::SwapCM => std::mem::swap(&mut r.c, &mut r.m),
            MicroOp::StackPush => {
                r.f = r.e;
                r.e = r.d;
                r.d = r.c;
            }
            MicroOp::StackPop => {
                r.a = r.d;
                r.d = r.e;
                r.e = r.f;
            }
            MicroOp::RecallM => r.c = r.m,
            MicroOp::RotateDown => {
                let c = r.c;
                r.c = r.d;
                r.d = r.e;
                r.e = r.f;
                r.f = c;
            }
            MicroOp::ClearRegisters => r.clear_working(),

            MicroOp::DisplayOff => {
                r.display_on = false;
                r.display_update = false;
            }
            MicroOp::DisplayToggle => {
                if r.display_on {
                    r.display_on = false;
                    if r.display_update {
                        r.display_update = false;
                        event.display_fell = true;
                    }
                } else {
                    r.display_on = true;
                    r.display_update = true;
                }
            }

            MicroOp::Nop => {}
        }
    }

    /// Arithmetic family: resolve the field to a span, seed the carry and
    /// run the slice loop. The final carry (or borrow) of the slice is the
    /// cycle's CARRY output.
    fn execute_arith(&mut self, op: ArithOp, field: Field) {
        let r = &mut self.regs;
        let span = field.span(r.p);
        let zero = Reg::zero();
        r.carry = 0;

        match op {
            ArithOp::TestBZero => r.carry = arith::any_nonzero(r.b, span) as u8,
            ArithOp::ClearB => r.b = arith::zero_span(r.b, span),
            ArithOp::CompareAC => {
                let (diff, borrow) = arith::sub(r.a, r.c, span, 0);
                r.t = arith::copy_span(r.t, diff, span);
                r.carry = borrow;
            }
            ArithOp::TestCGeOne => {
                let (_, borrow) = arith::sub(r.c, zero, span, 1);
                r.carry = borrow;
            }
            ArithOp::BToC => r.c = arith::copy_span(r.c, r.b, span),
            ArithOp::NegateC => {
                let (neg, borrow) = arith::sub(zero, r.c, span, 0);
                r.c = arith::copy_span(r.c, neg, span);
                r.carry = borrow;
            }
            ArithOp::ClearC => r.c = arith::zero_span(r.c, span),
            ArithOp::ComplementC => {
                let (neg, borrow) = arith::sub(zero, r.c, span, 1);
                r.c = arith::copy_span(r.c, neg, span);
                r.carry = borrow;
            }
            ArithOp::ShiftLeftA => r.a = arith::shl(r.a, span),
            ArithOp::AToB => r.b = arith::copy_span(r.b, r.a, span),
            ArithOp::SubAcToC => {
                let (diff, borrow) = arith::sub(r.a, r.c, span, 0);
                r.c = arith::copy_span(r.c, diff, span);
                r.carry = borrow;
            }
            ArithOp::DecrementC => {
                let (dec, borrow) = arith::sub(r.c, zero, span, 1);
                r.c = arith::copy_span(r.c, dec, span);
                r.carry = borrow;
            }
            ArithOp::CToA => r.a = arith::copy_span(r.a, r.c, span),
            ArithOp::TestCZero => r.carry = arith::any_nonzero(r.c, span) as u8,
            ArithOp::AddAcToC => {
                let (sum, carry) = arith::add(r.a, r.c, span, 0);
                r.c = arith::copy_span(r.c, sum, span);
                r.carry = carry;
            }
            ArithOp::IncrementC => {
                let (inc, carry) = arith::add(r.c, zero, span, 1);
                r.c = arith::copy_span(r.c, inc, span);
                r.carry = carry;
            }
            ArithOp::CompareAB => {
                let (diff, borrow) = arith::sub(r.a, r.b, span, 0);
                r.t = arith::copy_span(r.t, diff, span);
                r.carry = borrow;
            }
            ArithOp::SwapBC => {
                let (b, c) = arith::swap_span(r.b, r.c, span);
                r.b = b;
                r.c = c;
            }
            ArithOp::ShiftRightC => r.c = arith::shr(r.c, span),
            ArithOp::TestAGeOne => {
                let (_, borrow) = arith::sub(r.a, zero, span, 1);
                r.carry = borrow;
            }
            ArithOp::ShiftRightB => r.b = arith::shr(r.b, span),
            ArithOp::DoubleC => {
                let (sum, carry) = arith::add(r.c, r.c, span, 0);
                r.c = arith::copy_span(r.c, sum, span);
                r.carry = carry;
            }
            ArithOp::ShiftRightA => r.a = arith::shr(r.a, span),
            ArithOp::ClearA => r.a = arith::zero_span(r.a, span),
            ArithOp::SubAbToA => {
                let (diff, borrow) = arith::sub(r.a, r.b, span, 0);
                r.a = diff;
                r.carry = borrow;
            }
            ArithOp::SwapAB => {
                let (a, b) = arith::swap_span(r.a, r.b, span);
                r.a = a;
                r.b = b;
            }
            ArithOp::SubAcToA => {
                let (diff, borrow) = arith::sub(r.a, r.c, span, 0);
                r.a = diff;
                r.carry = borrow;
            }
            ArithOp::DecrementA => {
                let (dec, borrow) = arith::sub(r.a, zero, span, 1);
                r.a = dec;
                r.carry = borrow;
            }
            ArithOp::AddAbToA => {
                let (sum, carry) = arith::add(r.a, r.b, span, 0);
                r.a = sum;
                r.carry = carry;
            }
            ArithOp::SwapAC => {
                let (a, c) = arith::swap_span(r.a, r.c, span);
                r.a = a;
                r.c = c;
            }
            ArithOp::AddAcToA => {
                let (sum, carry) = arith::add(r.a, r.c, span, 0);
                r.a = sum;
                r.carry = carry;
            }
            ArithOp::IncrementA => {
                let (inc, carry) = arith::add(r.a, zero, span, 1);
                r.a = inc;
                r.carry = carry;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::encode;

    fn cpu_with(ops: &[MicroOp]) -> Cpu {
        let words: Vec<u16> = ops.iter().map(|op| encode(op).word()).collect();
        Cpu::new(Rom::from_words(&words))
    }

    #[test]
    fn test_clear_registers_is_idempotent() {
        let mut cpu = cpu_with(&[MicroOp::ClearRegisters, MicroOp::ClearRegisters]);
        cpu.regs.a = Reg::from_u64(42);
        cpu.regs.c = Reg::from_u64(7);
        cpu.regs.m = Reg::from_u64(9);
        cpu.step();
        assert!(cpu.regs.a.is_zero());
        assert!(cpu.regs.c.is_zero());
        assert!(cpu.regs.m.is_zero());
        let snapshot = cpu.regs.clone();
        cpu.step();
        assert_eq!(cpu.regs.a, snapshot.a);
        assert_eq!(cpu.regs.m, snapshot.m);
    }

    #[test]
    fn test_push_then_pop_stack_semantics() {
        let mut cpu = cpu_with(&[MicroOp::StackPush, MicroOp::StackPop]);
        let (c0, d0, e0, f0) = (
            Reg::from_u64(1),
            Reg::from_u64(2),
            Reg::from_u64(3),
            Reg::from_u64(4),
        );
        cpu.regs.c = c0;
        cpu.regs.d = d0;
        cpu.regs.e = e0;
        cpu.regs.f = f0;

        cpu.step();
        // Lift: the old top level is lost, C is duplicated into D.
        assert_eq!(cpu.regs.c, c0);
        assert_eq!(cpu.regs.d, c0);
        assert_eq!(cpu.regs.e, d0);
        assert_eq!(cpu.regs.f, e0);

        cpu.step();
        // Drop into A: D and E come back; F keeps the duplicated level.
        assert_eq!(cpu.regs.a, c0);
        assert_eq!(cpu.regs.c, c0);
        assert_eq!(cpu.regs.d, d0);
        assert_eq!(cpu.regs.e, e0);
        assert_eq!(cpu.regs.f, e0);
    }

    #[test]
    fn test_rotate_down() {
        let mut cpu = cpu_with(&[MicroOp::RotateDown]);
        cpu.regs.c = Reg::from_u64(1);
        cpu.regs.d = Reg::from_u64(2);
        cpu.regs.e = Reg::from_u64(3);
        cpu.regs.f = Reg::from_u64(4);
        cpu.step();
        assert_eq!(cpu.regs.c.to_u64(), 2);
        assert_eq!(cpu.regs.d.to_u64(), 3);
        assert_eq!(cpu.regs.e.to_u64(), 4);
        assert_eq!(cpu.regs.f.to_u64(), 1);
    }

    #[test]
    fn test_full_word_add_with_carry_out() {
        let mut cpu = cpu_with(&[MicroOp::Arith {
            op: ArithOp::AddAcToA,
            field: Field::W,
        }]);
        cpu.regs.a = Reg::from_u64(99_999_999_999_999);
        cpu.regs.c = Reg::from_u64(1);
        cpu.step();
        assert_eq!(cpu.regs.a.to_u64(), 0);
        assert_eq!(cpu.regs.carry, 1);
    }

    #[test]
    fn test_branch_consumes_previous_carry() {
        // Increment overflows (carry 1), so the branch must fall through.
        let mut cpu = cpu_with(&[
            MicroOp::Arith { op: ArithOp::IncrementA, field: Field::W },
            MicroOp::BranchIfNoCarry { target: 100 },
        ]);
        cpu.regs.a = Reg::from_u64(99_999_999_999_999);
        cpu.step();
        cpu.step();
        assert_eq!(cpu.regs.pc, 2);

        // No overflow: the branch is taken.
        let mut cpu = cpu_with(&[
            MicroOp::Arith { op: ArithOp::IncrementA, field: Field::W },
            MicroOp::BranchIfNoCarry { target: 100 },
        ]);
        cpu.regs.a = Reg::from_u64(5);
        cpu.step();
        cpu.step();
        assert_eq!(cpu.regs.pc, 100);
    }

    #[test]
    fn test_arith_resets_carry_each_cycle() {
        let mut cpu = cpu_with(&[
            MicroOp::Arith { op: ArithOp::IncrementA, field: Field::W },
            MicroOp::Arith { op: ArithOp::AddAcToA, field: Field::W },
        ]);
        cpu.regs.a = Reg::from_u64(99_999_999_999_999);
        cpu.step();
        assert_eq!(cpu.regs.carry, 1);
        // A is now zero, C is zero: the add produces no carry and must not
        // inherit the previous one.
        cpu.step();
        assert_eq!(cpu.regs.carry, 0);
    }

    #[test]
    fn test_decrement_borrows_through_zero() {
        let mut cpu = cpu_with(&[MicroOp::Arith {
            op: ArithOp::DecrementC,
            field: Field::X,
        }]);
        cpu.step();
        // Exponent field wraps decimally; the rest of C is untouched.
        assert_eq!(cpu.regs.c.digit(0), 9);
        assert_eq!(cpu.regs.c.digit(1), 9);
        assert_eq!(cpu.regs.c.digit(2), 9);
        assert_eq!(cpu.regs.c.digit(3), 0);
        assert_eq!(cpu.regs.carry, 1);
    }

    #[test]
    fn test_compare_writes_scratch_not_operand() {
        let mut cpu = cpu_with(&[MicroOp::Arith {
            op: ArithOp::CompareAC,
            field: Field::W,
        }]);
        cpu.regs.a = Reg::from_u64(500);
        cpu.regs.c = Reg::from_u64(123);
        cpu.step();
        assert_eq!(cpu.regs.a.to_u64(), 500);
        assert_eq!(cpu.regs.c.to_u64(), 123);
        assert_eq!(cpu.regs.t.to_u64(), 377);
        assert_eq!(cpu.regs.carry, 0);

        // A < C sets the borrow.
        let mut cpu = cpu_with(&[MicroOp::Arith {
            op: ArithOp::CompareAC,
            field: Field::W,
        }]);
        cpu.regs.a = Reg::from_u64(100);
        cpu.regs.c = Reg::from_u64(200);
        cpu.step();
        assert_eq!(cpu.regs.carry, 1);
    }

    #[test]
    fn test_test_ops_leave_targets_untouched() {
        let mut cpu = cpu_with(&[
            MicroOp::Arith { op: ArithOp::TestCZero, field: Field::M },
            MicroOp::Arith { op: ArithOp::TestCGeOne, field: Field::M },
        ]);
        cpu.regs.c = Reg::from_u64(5_000);
        let before = cpu.regs.c;
        cpu.step();
        assert_eq!(cpu.regs.c, before);
        assert_eq!(cpu.regs.carry, 1);
        cpu.step();
        assert_eq!(cpu.regs.c, before);
        assert_eq!(cpu.regs.carry, 0);
    }

    #[test]
    fn test_pointer_field_tracks_p() {
        let mut cpu = cpu_with(&[
            MicroOp::SetPointer { value: 5 },
            MicroOp::Arith { op: ArithOp::IncrementA, field: Field::P },
        ]);
        cpu.step();
        cpu.step();
        assert_eq!(cpu.regs.a.digit(5), 1);
        assert!(cpu
            .regs
            .a
            .digits()
            .iter()
            .enumerate()
            .all(|(i, &d)| i == 5 || d == 0));
    }

    #[test]
    fn test_load_constant_walks_pointer_down() {
        let mut cpu = cpu_with(&[
            MicroOp::SetPointer { value: 12 },
            MicroOp::LoadConstant { nibble: 3 },
            MicroOp::LoadConstant { nibble: 1 },
            MicroOp::LoadConstant { nibble: 4 },
        ]);
        for _ in 0..4 {
            cpu.step();
        }
        assert_eq!(cpu.regs.c.digit(12), 3);
        assert_eq!(cpu.regs.c.digit(11), 1);
        assert_eq!(cpu.regs.c.digit(10), 4);
        assert_eq!(cpu.regs.p, 9);
    }

    #[test]
    fn test_call_and_return_single_level() {
        let mut cpu = cpu_with(&[MicroOp::Call { target: 5 }]);
        cpu.step();
        assert_eq!(cpu.regs.pc, 5);
        assert_eq!(cpu.regs.ret, 1);

        // The word at 5 is a padding no-op; plant a return at 5 instead.
        let mut words = vec![encode(&MicroOp::Call { target: 5 }).word(), 0, 0, 0, 0];
        words.push(encode(&MicroOp::Return).word());
        let mut cpu = Cpu::new(Rom::from_words(&words));
        cpu.step();
        cpu.step();
        assert_eq!(cpu.regs.pc, 1);
    }

    #[test]
    fn test_key_latch_protocol() {
        let mut cpu = cpu_with(&[MicroOp::Nop, MicroOp::JumpOnKey]);
        assert!(!cpu.regs.status(STATUS_KEY_PENDING));

        cpu.press_key(46);
        assert!(cpu.key_latched());

        // Intake happens at the start of the next cycle.
        cpu.step();
        assert!(!cpu.key_latched());
        assert!(cpu.regs.status(STATUS_KEY_PENDING));
        assert_eq!(cpu.regs.key_rom, 46);

        // Jump-on-key turns the code into a control-flow target.
        cpu.step();
        assert_eq!(cpu.regs.pc, 46);
        assert!(!cpu.regs.status(STATUS_KEY_PENDING));
    }

    #[test]
    fn test_select_rom_switches_bank() {
        let mut words = vec![0u16; 2 * crate::cpu::rom::BANK_WORDS];
        words[0] = encode(&MicroOp::SelectRom { bank: 1 }).word();
        // Bank 1, address 1: set a status bit we can observe.
        words[crate::cpu::rom::BANK_WORDS + 1] = encode(&MicroOp::SetStatus { bit: 5 }).word();
        let mut cpu = Cpu::new(Rom::from_words(&words));
        cpu.step();
        assert_eq!(cpu.regs.offset, 1);
        cpu.step();
        assert!(cpu.regs.status(5));

    }

    #[test]
    fn test_reselecting_current_bank_is_noop() {
        let mut cpu = cpu_with(&[MicroOp::SelectRom { bank: 0 }]);
        cpu.regs.a = Reg::from_u64(77);
        let before = cpu.regs.clone();
        cpu.step();
        assert_eq!(cpu.regs.offset, 0);
        assert_eq!(cpu.regs.a, before.a);
        assert_eq!(cpu.regs.pc, 1);
    }

    #[test]
    fn test_display_toggle_falling_edge() {
        let mut cpu = cpu_with(&[
            MicroOp::DisplayToggle,
            MicroOp::DisplayToggle,
            MicroOp::DisplayToggle,
            MicroOp::DisplayOff,
        ]);
        let ev = cpu.step();
        assert!(cpu.regs.display_on);
        assert!(!ev.display_fell);

        let ev = cpu.step();
        assert!(!cpu.regs.display_on);
        assert!(ev.display_fell);

        // Off cancels the pending update: no frame on the forced drop.
        let ev = cpu.step();
        assert!(cpu.regs.display_on);
        assert!(!ev.display_fell);
        let ev = cpu.step();
        assert!(!cpu.regs.display_on);
        assert!(!ev.display_fell);
    }

    #[test]
    fn test_error_trap_signal() {
        let mut cpu = cpu_with(&[MicroOp::Call { target: ERROR_PC }]);
        let ev = cpu.step();
        assert!(ev.error_trap);

        // Same address in another bank is not the trap.
        let mut words = vec![0u16; 2 * crate::cpu::rom::BANK_WORDS];
        words[0] = encode(&MicroOp::SelectRom { bank: 1 }).word();
        words[crate::cpu::rom::BANK_WORDS + 1] =
            encode(&MicroOp::Call { target: ERROR_PC }).word();
        let mut cpu = Cpu::new(Rom::from_words(&words));
        cpu.step();
        let ev = cpu.step();
        assert!(!ev.error_trap);
    }

    #[test]
    fn test_digits_stay_decimal_after_arith() {
        let mut cpu = cpu_with(&[
            MicroOp::Arith { op: ArithOp::AddAcToA, field: Field::W },
            MicroOp::Arith { op: ArithOp::SubAcToA, field: Field::W },
        ]);
        cpu.regs.a = Reg::from_u64(86_420_975_318_642);
        cpu.regs.c = Reg::from_u64(97_531_086_420_975);
        cpu.step();
        cpu.step();
        for i in 0..Reg::WIDTH {
            assert!(cpu.regs.a.digit(i) <= 9, "digit {} out of range", i);
        }
    }
}
