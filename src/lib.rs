//! # HP-35 Emulator
//!
//! A cycle-level emulator of the Hewlett-Packard HP-35 (1972), the first
//! scientific pocket calculator.
//!
//! The emulator executes the original 768-word microcode ROM against the
//! machine's 56-bit BCD registers, one microinstruction per cycle, and
//! adds a script sequencer that types virtual keys to synthesize the
//! functions the ROM never had (hyperbolics, coordinate conversions,
//! present value, normal density, log-gamma, quadratic roots).

pub mod bcd;
pub mod cpu;
pub mod display;
pub mod keys;
pub mod script;
pub mod shell;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use bcd::{Reg, Span};
pub use cpu::{Cpu, MicroInstruction, MicroOp, Registers, Rom, RomError, StepEvent};
pub use display::{Frame, FRAME_CELLS};
pub use keys::{ExtFunction, Key, KeyAction, KeyEvent, Keypad};
pub use script::Sequencer;
pub use shell::{Calculator, TickOutput};

#[cfg(feature = "tui")]
pub use tui::run_panel;
