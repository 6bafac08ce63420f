//! Slice arithmetic over BCD registers.
//!
//! Every arithmetic-family microinstruction reduces to one of these loops
//! over a digit span. Operations take register values and return new ones;
//! digits outside the span are always copied from the first operand, so a
//! wholesale assignment back to the target register cannot disturb
//! anything the instruction did not select.

use crate::bcd::digit::{add_digit, sub_digit};
use crate::bcd::word::{Reg, Span};

/// Decimal add `x + y` over the span, threading the carry upward.
///
/// Returns the result and the final carry-out.
pub fn add(x: Reg, y: Reg, span: Span, carry_in: u8) -> (Reg, u8) {
    let mut out = x;
    let mut carry = carry_in;
    for i in span.range() {
        let (s, c) = add_digit(x.digit(i), y.digit(i), carry);
        out.set_digit(i, s);
        carry = c;
    }
    (out, carry)
}

/// Decimal subtract `x - y` over the span, threading the borrow upward.
///
/// Returns the result and the final borrow-out.
pub fn sub(x: Reg, y: Reg, span: Span, borrow_in: u8) -> (Reg, u8) {
    let mut out = x;
    let mut borrow = borrow_in;
    for i in span.range() {
        let (d, b) = sub_digit(x.digit(i), y.digit(i), borrow);
        out.set_digit(i, d);
        borrow = b;
    }
    (out, borrow)
}

/// Shift the span one digit toward the most significant end.
/// The vacated low position fills with zero; the top digit is lost.
pub fn shl(x: Reg, span: Span) -> Reg {
    let mut out = x;
    for i in span.range().rev() {
        let d = if i > span.first { x.digit(i - 1) } else { 0 };
        out.set_digit(i, d);
    }
    out
}

/// Shift the span one digit toward the least significant end.
/// The vacated high position fills with zero; the bottom digit is lost.
pub fn shr(x: Reg, span: Span) -> Reg {
    let mut out = x;
    for i in span.range() {
        let d = if i < span.last { x.digit(i + 1) } else { 0 };
        out.set_digit(i, d);
    }
    out
}

/// True when any digit in the span is nonzero.
pub fn any_nonzero(x: Reg, span: Span) -> bool {
    span.range().any(|i| x.digit(i) != 0)
}

/// Zero every digit in the span.
pub fn zero_span(x: Reg, span: Span) -> Reg {
    let mut out = x;
    for i in span.range() {
        out.set_digit(i, 0);
    }
    out
}

/// Copy the span digits of `src` into `dst`.
pub fn copy_span(dst: Reg, src: Reg, span: Span) -> Reg {
    let mut out = dst;
    for i in span.range() {
        out.set_digit(i, src.digit(i));
    }
    out
}

/// Exchange the span digits of two registers.
pub fn swap_span(a: Reg, b: Reg, span: Span) -> (Reg, Reg) {
    (copy_span(a, b, span), copy_span(b, a, span))
}
