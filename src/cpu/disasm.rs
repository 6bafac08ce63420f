//! Microcode disassembler.
//!
//! Renders decoded microinstructions in the classic mnemonic style
//! ("a + c -> a[w]", "if n/c go to 123"). Used by the CLI listing
//! command and the front-panel debugger.

use crate::cpu::decode::{decode, ArithOp, Field, MicroInstruction, MicroOp};
use crate::cpu::rom::{Rom, BANK_WORDS};

/// Disassemble a single microinstruction to text.
pub fn disassemble_instruction(mi: MicroInstruction) -> String {
    format_op(&decode(mi))
}

/// Disassemble one ROM bank as a listing.
pub fn disassemble_bank(rom: &Rom, bank: u8) -> String {
    let mut output = String::new();
    for pc in 0..BANK_WORDS {
        let mi = rom.fetch(bank, pc as u8);
        output.push_str(&format!(
            "{}:{:03}  {:03x}  {}\n",
            bank,
            pc,
            mi.word(),
            format_op(&decode(mi))
        ));
    }
    output
}

fn format_op(op: &MicroOp) -> String {
    match *op {
        MicroOp::Call { target } => format!("jsb {}", target),
        MicroOp::Arith { op, field } => format_arith(op, field),
        MicroOp::BranchIfNoCarry { target } => format!("if n/c go to {}", target),
        MicroOp::Return => "return".into(),
        MicroOp::SelectRom { bank } => format!("select rom {}", bank),
        MicroOp::JumpOnKey => "keys -> rom address".into(),
        MicroOp::TestStatus { bit } => format!("if s{} = 1", bit),
        MicroOp::SetStatus { bit } => format!("1 -> s{}", bit),
        MicroOp::ClearStatus { bit } => format!("0 -> s{}", bit),
        MicroOp::ClearAllStatus => "clear status".into(),
        MicroOp::TestPointer { value } => format!("if p = {}", value),
        MicroOp::SetPointer { value } => format!("{} -> p", value),
        MicroOp::IncPointer => "p + 1 -> p".into(),
        MicroOp::DecPointer => "p - 1 -> p".into(),
        MicroOp::LoadConstant { nibble } => format!("load constant {}", nibble),
        MicroOp::SwapCM => "c exchange m".into(),
        MicroOp::StackPush => "c -> stack".into(),
        MicroOp::StackPop => "stack -> a".into(),
        MicroOp::RecallM => "m -> c".into(),
        MicroOp::RotateDown => "down rotate".into(),
        MicroOp::ClearRegisters => "clear registers".into(),
        MicroOp::DisplayOff => "display off".into(),
        MicroOp::DisplayToggle => "display toggle".into(),
        MicroOp::Nop => "no operation".into(),
    }
}

fn format_arith(op: ArithOp, field: Field) -> String {
    let f = field;
    match op {
        ArithOp::TestBZero => format!("if b[{}] = 0", f),
        ArithOp::ClearB => format!("0 -> b[{}]", f),
        ArithOp::CompareAC => format!("if a >= c[{}]", f),
        ArithOp::TestCGeOne => format!("if c[{}] >= 1", f),
        ArithOp::BToC => format!("b -> c[{}]", f),
        ArithOp::NegateC => format!("0 - c -> c[{}]", f),
        ArithOp::ClearC => format!("0 -> c[{}]", f),
        ArithOp::ComplementC => format!("0 - c - 1 -> c[{}]", f),
        ArithOp::ShiftLeftA => format!("shift left a[{}]", f),
        ArithOp::AToB => format!("a -> b[{}]", f),
        ArithOp::SubAcToC => format!("a - c -> c[{}]", f),
        ArithOp::DecrementC => format!("c - 1 -> c[{}]", f),
        ArithOp::CToA => format!("c -> a[{}]", f),
        ArithOp::TestCZero => format!("if c[{}] = 0", f),
        ArithOp::AddAcToC => format!("a + c -> c[{}]", f),
        ArithOp::IncrementC => format!("c + 1 -> c[{}]", f),
        ArithOp::CompareAB => format!("if a >= b[{}]", f),
        ArithOp::SwapBC => format!("b exchange c[{}]", f),
        ArithOp::ShiftRightC => format!("shift right c[{}]", f),
        ArithOp::TestAGeOne => format!("if a[{}] >= 1", f),
        ArithOp::ShiftRightB => format!("shift right b[{}]", f),
        ArithOp::DoubleC => format!("c + c -> c[{}]", f),
        ArithOp::ShiftRightA => format!("shift right a[{}]", f),
        ArithOp::ClearA => format!("0 -> a[{}]", f),
        ArithOp::SubAbToA => format!("a - b -> a[{}]", f),
        ArithOp::SwapAB => format!("a exchange b[{}]", f),
        ArithOp::SubAcToA => format!("a - c -> a[{}]", f),
        ArithOp::DecrementA => format!("a - 1 -> a[{}]", f),
        ArithOp::AddAbToA => format!("a + b -> a[{}]", f),
        ArithOp::SwapAC => format!("a exchange c[{}]", f),
        ArithOp::AddAcToA => format!("a + c -> a[{}]", f),
        ArithOp::IncrementA => format!("a + 1 -> a[{}]", f),
    }
}
