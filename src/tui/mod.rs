//! Interactive front panel for the HP-35 emulator.
//!
//! Provides a terminal UI with:
//! - The calculator display line and error banner
//! - Register file view (A..F, M, T) and status bits
//! - Microcode disassembly around the program counter
//! - Free-running or single-stepped execution

mod app;
mod ui;

pub use app::{run_panel, PanelApp};
