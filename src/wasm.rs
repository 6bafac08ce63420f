//! WebAssembly bindings for the HP-35 emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core
//! calculator: construct from ROM bytes, press keys, run cycles and read
//! the display.

use crate::keys::{ExtFunction, Key, KeyEvent};
use crate::{Calculator, Rom};
use wasm_bindgen::prelude::*;

/// WebAssembly-friendly calculator wrapper.
#[wasm_bindgen]
pub struct WasmCalculator {
    calc: Calculator,
}

#[wasm_bindgen]
impl WasmCalculator {
    /// Create a calculator from a ROM image.
    #[wasm_bindgen(constructor)]
    pub fn new(rom_bytes: &[u8]) -> Result<WasmCalculator, JsError> {
        let rom = Rom::from_bytes(rom_bytes).map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(Self { calc: Calculator::new(rom) })
    }

    /// Press a canonical HP-35 key by its matrix code.
    #[wasm_bindgen]
    pub fn press_code(&mut self, code: u8) -> bool {
        match Key::from_code(code) {
            Some(key) => {
                self.calc.press_key(key);
                true
            }
            None => false,
        }
    }

    /// Press an extended function by id (64..77).
    #[wasm_bindgen]
    pub fn press_ext(&mut self, id: u8) -> bool {
        match ExtFunction::from_id(id) {
            Some(func) => {
                self.calc.press_ext(func);
                true
            }
            None => false,
        }
    }

    /// Deliver a host matrix key (0..15).
    #[wasm_bindgen]
    pub fn press_matrix(&mut self, index: u8) {
        self.calc.press(KeyEvent::Matrix(index));
    }

    /// Press the function (layer) key.
    #[wasm_bindgen]
    pub fn press_function(&mut self) {
        self.calc.press(KeyEvent::Function);
    }

    /// Run a number of microcycles.
    #[wasm_bindgen]
    pub fn run(&mut self, cycles: u32) {
        self.calc.run(cycles as u64);
    }

    /// Run until the display settles.
    #[wasm_bindgen]
    pub fn settle(&mut self) {
        self.calc.settle();
    }

    /// The current display text, trimmed.
    #[wasm_bindgen]
    pub fn display_text(&self) -> String {
        self.calc.display_text().trim().to_string()
    }

    /// The last seven-segment frame (8 cells, bit 7 = decimal point).
    #[wasm_bindgen]
    pub fn frame(&self) -> Vec<u8> {
        self.calc
            .last_frame()
            .map(|f| f.cells.to_vec())
            .unwrap_or_else(|| vec![0; crate::display::FRAME_CELLS])
    }

    /// Whether the error banner is showing.
    #[wasm_bindgen]
    pub fn error(&self) -> bool {
        self.calc.error()
    }

    /// Whether an extended-function script is still typing.
    #[wasm_bindgen]
    pub fn script_active(&self) -> bool {
        self.calc.script_active()
    }

    /// Executed microcycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.calc.cpu().cycles
    }

    /// Register file as a JSON string.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> String {
        let regs = &self.calc.cpu().regs;
        format!(
            r#"{{"a":"{}","b":"{}","c":"{}","p":{},"pc":{},"offset":{},"carry":{}}}"#,
            regs.a, regs.b, regs.c, regs.p, regs.pc, regs.offset, regs.carry
        )
    }
}
