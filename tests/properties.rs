//! Property suite for the BCD data path and the decoder.

use hp35::bcd::{arith, Reg, Span};
use hp35::cpu::{decode, encode, ArithOp, Cpu, Field, MicroInstruction, MicroOp, Rom};
use proptest::prelude::*;

/// 10^14, the modulus of a full register word.
const WORD_MOD: u64 = 100_000_000_000_000;

proptest! {
    #[test]
    fn full_word_add_matches_integer_sum(x in 0..WORD_MOD, y in 0..WORD_MOD) {
        let (r, carry) = arith::add(Reg::from_u64(x), Reg::from_u64(y), Span::word(), 0);
        let sum = x + y;
        prop_assert_eq!(r.to_u64(), sum % WORD_MOD);
        prop_assert_eq!(carry == 1, sum >= WORD_MOD);
    }

    #[test]
    fn full_word_sub_matches_integer_difference(x in 0..WORD_MOD, y in 0..WORD_MOD) {
        let (r, borrow) = arith::sub(Reg::from_u64(x), Reg::from_u64(y), Span::word(), 0);
        let diff = (WORD_MOD + x - y) % WORD_MOD;
        prop_assert_eq!(r.to_u64(), diff);
        prop_assert_eq!(borrow == 1, y > x);
    }

    #[test]
    fn add_microinstruction_matches_integer_sum(x in 0..WORD_MOD, y in 0..WORD_MOD) {
        let word = encode(&MicroOp::Arith { op: ArithOp::AddAcToA, field: Field::W }).word();
        let mut cpu = Cpu::new(Rom::from_words(&[word]));
        cpu.regs.a = Reg::from_u64(x);
        cpu.regs.c = Reg::from_u64(y);
        cpu.step();
        let sum = x + y;
        prop_assert_eq!(cpu.regs.a.to_u64(), sum % WORD_MOD);
        prop_assert_eq!(cpu.regs.carry == 1, sum >= WORD_MOD);
        prop_assert_eq!(cpu.regs.c.to_u64(), y);
    }

    #[test]
    fn spans_confine_mutation(
        x in 0..WORD_MOD,
        y in 0..WORD_MOD,
        first in 0usize..14,
        len in 1usize..14,
    ) {
        let span = Span::new(first, (first + len - 1).min(13));
        let before = Reg::from_u64(x);
        let (added, _) = arith::add(before, Reg::from_u64(y), span, 0);
        let (subbed, _) = arith::sub(before, Reg::from_u64(y), span, 0);
        for i in 0..Reg::WIDTH {
            if !span.contains(i) {
                prop_assert_eq!(added.digit(i), before.digit(i), "add touched digit {}", i);
                prop_assert_eq!(subbed.digit(i), before.digit(i), "sub touched digit {}", i);
            }
        }
    }

    #[test]
    fn digits_stay_decimal(x in 0..WORD_MOD, y in 0..WORD_MOD, seed in 0u8..2) {
        let (r, _) = arith::add(Reg::from_u64(x), Reg::from_u64(y), Span::word(), seed);
        for i in 0..Reg::WIDTH {
            prop_assert!(r.digit(i) <= 9);
        }
    }

    #[test]
    fn decoder_is_total_and_encode_agrees(h in 0u8..4, l in any::<u8>()) {
        let op = decode(MicroInstruction::new(h, l));
        // Re-encoding may canonicalize the word, but never the meaning.
        prop_assert_eq!(decode(encode(&op)), op);
    }

    #[test]
    fn u64_roundtrip(value in 0..WORD_MOD) {
        prop_assert_eq!(Reg::from_u64(value).to_u64(), value);
    }
}
