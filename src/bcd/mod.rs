//! Binary-coded decimal primitives.
//!
//! This module provides the data path of the HP-35:
//! - [`digit`] - single-nibble decimal add/subtract
//! - [`Reg`] - a 14-nibble working register
//! - [`Span`] - an inclusive digit range selected by an instruction field
//! - [`arith`] - slice arithmetic built on the digit primitives

pub mod arith;
pub mod digit;
mod word;

pub use word::{Reg, Span, REG_WIDTH};
