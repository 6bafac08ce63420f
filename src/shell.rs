//! Top-level calculator shell.
//!
//! Ties the CPU, the script sequencer, the keypad layers and the display
//! projector into the cooperative loop: per iteration the shell delivers
//! at most one key, runs exactly one CPU microcycle, then lets the
//! sequencer feed its tape. All state lives here; the host only scans
//! keys and renders frames.

use crate::cpu::{Cpu, Rom};
use crate::display::{project_text, Frame};
use crate::keys::{ExtFunction, Key, KeyAction, KeyEvent, Keypad};
use crate::script::Sequencer;
use serde::{Deserialize, Serialize};

/// Observable output of one shell iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutput {
    /// A freshly projected frame, when the display latch fell.
    pub frame: Option<Frame>,
    /// The error banner is latched.
    pub error: bool,
    /// The screen is blanked by the third F press.
    pub screen_off: bool,
    /// The host should bump the display brightness.
    pub brightness_bump: bool,
}

/// The complete emulated calculator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Calculator {
    cpu: Cpu,
    sequencer: Sequencer,
    keypad: Keypad,
    /// Hyp prefix armed: the next trig key selects a hyperbolic tape.
    hyp: bool,
    /// Arc seen while the Hyp prefix was armed.
    arc_hyp: bool,
    /// Error banner, latched on the ROM trap until the next key.
    error: bool,
    /// Brightness request pending for the next tick output.
    brightness: bool,
    /// Text form of the last projected frame.
    last_text: String,
    /// Last projected frame, if any.
    last_frame: Option<Frame>,
}

impl Calculator {
    /// Build a calculator around a ROM image.
    pub fn new(rom: Rom) -> Self {
        Self {
            cpu: Cpu::new(rom),
            sequencer: Sequencer::new(),
            keypad: Keypad::new(),
            hyp: false,
            arc_hyp: false,
            error: false,
            brightness: false,
            last_text: String::new(),
            last_frame: None,
        }
    }

    /// The CPU, for inspection.
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Text of the most recent display update.
    pub fn display_text(&self) -> &str {
        &self.last_text
    }

    /// The most recent frame.
    pub fn last_frame(&self) -> Option<Frame> {
        self.last_frame
    }

    /// Whether the error banner is showing.
    pub fn error(&self) -> bool {
        self.error
    }

    /// Whether the script sequencer is mid-tape.
    pub fn script_active(&self) -> bool {
        self.sequencer.is_active()
    }

    /// Deliver a host scanner event through the keypad layers.
    pub fn press(&mut self, event: KeyEvent) {
        match self.keypad.translate(event) {
            Some(KeyAction::Cpu(key)) => self.press_key(key),
            Some(KeyAction::Ext(func)) => self.press_ext(func),
            None => {}
        }
    }

    /// Deliver a canonical HP-35 key.
    ///
    /// Any key clears the error banner. While the Hyp prefix is armed the
    /// trig keys are intercepted and select a hyperbolic tape; Arc stacks
    /// onto the prefix for the inverse functions. Other keys drop the
    /// prefix and go to the CPU as usual.
    pub fn press_key(&mut self, key: Key) {
        self.error = false;

        if self.hyp {
            match key {
                Key::Arc => {
                    self.arc_hyp = true;
                    return;
                }
                Key::Sin | Key::Cos | Key::Tan => {
                    let func = hyperbolic(key, self.arc_hyp);
                    self.hyp = false;
                    self.arc_hyp = false;
                    self.sequencer.arm(func);
                    return;
                }
                _ => {
                    self.hyp = false;
                    self.arc_hyp = false;
                }
            }
        }

        self.cpu.press_key(key.code());
    }

    /// Deliver an extended-function id.
    pub fn press_ext(&mut self, func: ExtFunction) {
        self.error = false;
        match func {
            ExtFunction::Hyp => self.hyp = true,
            ExtFunction::Brightness => self.brightness = true,
            _ => self.sequencer.arm(func),
        }
    }

    /// One iteration of the cooperative loop: exactly one CPU microcycle,
    /// then the sequencer's slot.
    pub fn tick(&mut self) -> TickOutput {
        let mut out = TickOutput {
            screen_off: self.keypad.screen_off(),
            brightness_bump: std::mem::take(&mut self.brightness),
            ..TickOutput::default()
        };

        let event = self.cpu.step();

        if event.display_fell {
            let regs = &self.cpu.regs;
            self.last_text = project_text(&regs.a, &regs.b);
            let frame = Frame::project(&regs.a, &regs.b);
            self.last_frame = Some(frame);
            out.frame = Some(frame);
            // Frame boundary: the previous virtual keystroke has settled.
            self.sequencer.frame_complete();
        }
        if event.error_trap {
            self.error = true;
        }

        if let Some(code) = self.sequencer.tick() {
            self.cpu.press_key(code);
        }

        out.error = self.error;
        out
    }

    /// Run `cycles` iterations, returning the last output that carried a
    /// frame, if any did.
    pub fn run(&mut self, cycles: u64) -> Option<Frame> {
        let mut last = None;
        for _ in 0..cycles {
            if let Some(frame) = self.tick().frame {
                last = Some(frame);
            }
        }
        last
    }

    /// Press a key and run until the ROM has settled.
    ///
    /// Settled means the display has not updated for a comfortable
    /// stretch of cycles and no tape is being fed; trig and exponential
    /// routines take a few thousand cycles, scripted functions far more.
    pub fn press_and_settle(&mut self, key: Key) -> &str {
        self.press_key(key);
        self.settle();
        self.display_text()
    }

    /// Run until quiet (see [`Self::press_and_settle`]).
    pub fn settle(&mut self) {
        const QUIET: u64 = 4_096;
        const LIMIT: u64 = 4_000_000;
        let mut since_update: u64 = 0;
        for _ in 0..LIMIT {
            let out = self.tick();
            if out.frame.is_some() || self.sequencer.is_active() {
                since_update = 0;
            } else {
                since_update += 1;
                if since_update >= QUIET {
                    return;
                }
            }
        }
    }
}

fn hyperbolic(key: Key, inverse: bool) -> ExtFunction {
    match (key, inverse) {
        (Key::Sin, false) => ExtFunction::Sinh,
        (Key::Cos, false) => ExtFunction::Cosh,
        (Key::Tan, false) => ExtFunction::Tanh,
        (Key::Sin, true) => ExtFunction::Asinh,
        (Key::Cos, true) => ExtFunction::Acosh,
        (Key::Tan, true) => ExtFunction::Atanh,
        _ => unreachable!("not a trig key"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::{encode, MicroOp};

    fn shell_with(ops: &[MicroOp]) -> Calculator {
        let words: Vec<u16> = ops.iter().map(|op| encode(op).word()).collect();
        Calculator::new(Rom::from_words(&words))
    }

    #[test]
    fn test_tick_runs_one_cycle() {
        let mut calc = shell_with(&[MicroOp::Nop, MicroOp::Nop]);
        assert_eq!(calc.cpu().cycles, 0);
        calc.tick();
        assert_eq!(calc.cpu().cycles, 1);
    }

    #[test]
    fn test_frame_on_display_fall() {
        let mut calc = shell_with(&[MicroOp::DisplayToggle, MicroOp::DisplayToggle]);
        assert!(calc.tick().frame.is_none());
        let out = calc.tick();
        assert!(out.frame.is_some());
        assert_eq!(calc.last_frame(), out.frame);
    }

    #[test]
    fn test_error_banner_latches_until_key() {
        let mut calc = shell_with(&[
            MicroOp::Call { target: crate::cpu::ERROR_PC },
        ]);
        let out = calc.tick();
        assert!(out.error);
        // Still latched while nothing is pressed.
        assert!(calc.tick().error);
        calc.press_key(Key::Clx);
        assert!(!calc.error());
    }

    #[test]
    fn test_hyp_prefix_arms_tape() {
        let mut calc = shell_with(&[MicroOp::Nop]);
        calc.press_ext(ExtFunction::Hyp);
        assert!(!calc.script_active());
        calc.press_key(Key::Sin);
        assert!(calc.script_active());
    }

    #[test]
    fn test_arc_hyp_prefix_selects_inverse() {
        let mut calc = shell_with(&[MicroOp::Nop]);
        calc.press_ext(ExtFunction::Hyp);
        calc.press_key(Key::Arc);
        calc.press_key(Key::Tan);
        assert!(calc.script_active());
    }

    #[test]
    fn test_hyp_prefix_dropped_by_other_key() {
        let mut calc = shell_with(&[MicroOp::Nop]);
        calc.press_ext(ExtFunction::Hyp);
        calc.press_key(Key::D5);
        assert!(!calc.script_active());
        // The digit still reaches the CPU latch.
        assert!(calc.cpu().key_latched());
    }

    #[test]
    fn test_brightness_surfaces_once() {
        let mut calc = shell_with(&[MicroOp::Nop, MicroOp::Nop]);
        calc.press_ext(ExtFunction::Brightness);
        assert!(calc.tick().brightness_bump);
        assert!(!calc.tick().brightness_bump);
    }

    #[test]
    fn test_sequencer_feeds_on_frame_boundaries() {
        // ROM that toggles the display twice per pass: each pass produces
        // one falling edge, releasing one tape byte.
        let mut calc = shell_with(&[
            MicroOp::DisplayToggle,
            MicroOp::DisplayToggle,
            MicroOp::BranchIfNoCarry { target: 0 },
        ]);
        calc.press_ext(ExtFunction::Sinh);
        let mut fed = 0;
        for _ in 0..2_000 {
            calc.tick();
            if !calc.script_active() {
                break;
            }
            // The latch is visible between the injection and the next
            // cycle's intake.
            if calc.cpu().key_latched() {
                fed += 1;
            }
        }
        assert!(fed > 0, "sequencer never injected a key");
    }

    #[test]
    fn test_matrix_press_reaches_cpu() {
        let mut calc = shell_with(&[MicroOp::Nop]);
        calc.press(KeyEvent::Matrix(12)); // layer 0: digit 0
        assert!(calc.cpu().key_latched());
    }
}
