//! Script sequencer for the extended functions.
//!
//! The HP-35 ROM has no hyperbolics, coordinate conversions or finance
//! functions. The sequencer synthesizes them by typing: each extended
//! function is a tape of canonical key codes, fed into the CPU's key
//! latch one key per display-complete event. The ROM finishes every
//! user-visible operation by dropping the display latch, so the falling
//! edge is the natural "previous keystroke has settled" signal.
//!
//! The pacing is an explicit state machine: `Idle` until armed,
//! `Armed` when the next tape byte may be injected, `Cooling` for the
//! tick window after an injection. A frame interlock blocks injection
//! until the ROM has produced a display update for the previous key.

use crate::keys::{ExtFunction, Key};
use serde::{Deserialize, Serialize};

/// Tape terminator.
pub const END: u8 = 0xFF;

/// Minimum shell iterations between two injected keys.
pub const FEED_INTERVAL: u32 = 6;

const STO: u8 = Key::Sto as u8;
const RCL: u8 = Key::Rcl as u8;
const ENTER: u8 = Key::Enter as u8;
const SWAP: u8 = Key::Swap as u8;
const ROT: u8 = Key::Rot as u8;
const CHS: u8 = Key::Chs as u8;
const ADD: u8 = Key::Add as u8;
const SUB: u8 = Key::Sub as u8;
const MUL: u8 = Key::Mul as u8;
const DIV: u8 = Key::Div as u8;
const EXP: u8 = Key::Exp as u8;
const LN: u8 = Key::Ln as u8;
const SQRT: u8 = Key::Sqrt as u8;
const POW: u8 = Key::Pow as u8;
const INV: u8 = Key::Inv as u8;
const SIN: u8 = Key::Sin as u8;
const COS: u8 = Key::Cos as u8;
const TAN: u8 = Key::Tan as u8;
const ARC: u8 = Key::Arc as u8;
const PI: u8 = Key::Pi as u8;
const DOT: u8 = Key::Dot as u8;
const D1: u8 = Key::D1 as u8;
const D2: u8 = Key::D2 as u8;
const D3: u8 = Key::D3 as u8;
const D5: u8 = Key::D5 as u8;
const D8: u8 = Key::D8 as u8;
const D9: u8 = Key::D9 as u8;

/// sinh x = (e^x - e^-x) / 2, with x saved in M.
const SINH: &[u8] = &[STO, EXP, RCL, CHS, EXP, SUB, D2, DIV, END];

/// cosh x = (e^x + e^-x) / 2.
const COSH: &[u8] = &[STO, EXP, RCL, CHS, EXP, ADD, D2, DIV, END];

/// tanh x = (e^2x - 1) / (e^2x + 1).
const TANH: &[u8] = &[D2, MUL, EXP, STO, D1, SUB, RCL, D1, ADD, DIV, END];

/// asinh x = ln(x + sqrt(x^2 + 1)).
const ASINH: &[u8] = &[STO, ENTER, MUL, D1, ADD, SQRT, RCL, ADD, LN, END];

/// acosh x = ln(x + sqrt(x^2 - 1)); defined for x >= 1.
const ACOSH: &[u8] = &[STO, ENTER, MUL, D1, SUB, SQRT, RCL, ADD, LN, END];

/// atanh x = ln((1 + x) / (1 - x)) / 2; defined for |x| < 1.
const ATANH: &[u8] = &[STO, CHS, D1, ADD, RCL, D1, ADD, SWAP, DIV, LN, D2, DIV, END];

/// Rectangular to polar: Y = y, X = x in; X = r, Y = theta out.
/// theta = atan(y/x), r = x / cos(theta). Undefined at x = 0, like the
/// division it rests on.
const R2P: &[u8] = &[STO, SWAP, RCL, DIV, ARC, TAN, STO, COS, DIV, RCL, SWAP, END];

/// Polar to rectangular: Y = theta, X = r in; X = r cos(theta),
/// Y = r sin(theta) out.
const P2R: &[u8] = &[STO, SWAP, ENTER, SIN, RCL, MUL, ROT, COS, MUL, SWAP, ROT, END];

/// Present value of an annuity factor: Y = i, X = n in;
/// X = (1 - (1+i)^-n) / i out.
const PV: &[u8] = &[SWAP, STO, D1, ADD, SWAP, CHS, POW, CHS, D1, ADD, RCL, DIV, END];

/// Standard normal density: X = e^(-x^2/2) / sqrt(2 pi).
const ND: &[u8] = &[ENTER, MUL, D2, DIV, CHS, EXP, D2, PI, MUL, SQRT, DIV, END];

/// Stirling's series for ln gamma(x):
/// (x - 1/2) ln x - x + ln(2 pi)/2 + 1/(12x).
const GAMMA: &[u8] = &[
    STO, LN, RCL, DOT, D5, SUB, MUL, RCL, SUB,
    DOT, D9, D1, D8, D9, D3, D9, ADD,
    RCL, D1, D2, MUL, INV, ADD, END,
];

/// Roots of x^2 + px + q: Y = p, X = q in; X and Y are the two roots.
/// The second root comes from the product identity q = r1 * r2.
const QE: &[u8] = &[
    SWAP, D2, DIV, CHS, ENTER, ENTER, MUL, SWAP, ROT, SWAP, SUB, SQRT,
    ROT, ROT, ROT, ADD, STO, DIV, RCL, SWAP, END,
];

/// The tape for a scripted function; `None` for the two mode keys.
pub fn tape(func: ExtFunction) -> Option<&'static [u8]> {
    use ExtFunction::*;
    match func {
        Hyp | Brightness => None,
        RectToPolar => Some(R2P),
        PolarToRect => Some(P2R),
        PresentValue => Some(PV),
        NormalDensity => Some(ND),
        LogGamma => Some(GAMMA),
        Quadratic => Some(QE),
        Sinh => Some(SINH),
        Cosh => Some(COSH),
        Tanh => Some(TANH),
        Asinh => Some(ASINH),
        Acosh => Some(ACOSH),
        Atanh => Some(ATANH),
    }
}

/// Sequencer pacing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencerState {
    /// No tape armed.
    Idle,
    /// Ready to inject the byte at `pos`.
    Armed { func: ExtFunction, pos: usize },
    /// Waiting out the tick window after an injection.
    Cooling { func: ExtFunction, pos: usize, ticks: u32 },
}

/// Feeds one extended-function tape into the CPU key latch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequencer {
    state: SequencerState,
    /// Set on every injection; cleared when the display latch falls.
    locked: bool,
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            state: SequencerState::Idle,
            locked: false,
        }
    }

    /// Arm a scripted function from the top of its tape.
    ///
    /// Arming a mode key (Hyp, Brightness) is a shell bug; it is dropped.
    pub fn arm(&mut self, func: ExtFunction) {
        if tape(func).is_none() {
            debug_assert!(false, "{:?} has no tape", func);
            return;
        }
        self.state = SequencerState::Armed { func, pos: 0 };
        self.locked = false;
    }

    /// Whether a tape is armed or cooling.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, SequencerState::Idle)
    }

    /// Current pacing state.
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Frame boundary: the CPU's display latch fell, the previous
    /// keystroke has fully settled.
    pub fn frame_complete(&mut self) {
        self.locked = false;
    }

    /// One shell iteration. Returns a key code to inject, if any.
    pub fn tick(&mut self) -> Option<u8> {
        match self.state {
            SequencerState::Idle => None,
            SequencerState::Armed { func, pos } => {
                if self.locked {
                    return None;
                }
                let bytes = tape(func).expect("armed function has a tape");
                let code = bytes[pos];
                if code == END {
                    self.state = SequencerState::Idle;
                    return None;
                }
                self.state = SequencerState::Cooling { func, pos: pos + 1, ticks: 0 };
                self.locked = true;
                Some(code)
            }
            SequencerState::Cooling { func, pos, ticks } => {
                let ticks = ticks + 1;
                if ticks >= FEED_INTERVAL && !self.locked {
                    self.state = SequencerState::Armed { func, pos };
                } else {
                    self.state = SequencerState::Cooling { func, pos, ticks };
                }
                None
            }
        }
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tape_is_terminated() {
        for id in 64..=77u8 {
            let func = ExtFunction::from_id(id).unwrap();
            if let Some(bytes) = tape(func) {
                assert_eq!(*bytes.last().unwrap(), END, "{:?}", func);
                // Every byte before the sentinel is a real key code.
                for &code in &bytes[..bytes.len() - 1] {
                    assert!(Key::from_code(code).is_some(), "{:?} holds {}", func, code);
                }
            }
        }
    }

    #[test]
    fn test_mode_keys_have_no_tape() {
        assert!(tape(ExtFunction::Hyp).is_none());
        assert!(tape(ExtFunction::Brightness).is_none());
    }

    #[test]
    fn test_idle_until_armed() {
        let mut seq = Sequencer::new();
        assert!(!seq.is_active());
        assert_eq!(seq.tick(), None);
    }

    #[test]
    fn test_injection_sets_interlock() {
        let mut seq = Sequencer::new();
        seq.arm(ExtFunction::Sinh);
        let first = seq.tick();
        assert_eq!(first, Some(Key::Sto as u8));
        // Locked and cooling: nothing more until a frame completes and
        // the window elapses.
        for _ in 0..20 {
            assert_eq!(seq.tick(), None);
        }
        seq.frame_complete();
        let mut next = None;
        for _ in 0..FEED_INTERVAL + 1 {
            next = seq.tick();
            if next.is_some() {
                break;
            }
        }
        assert_eq!(next, Some(Key::Exp as u8));
    }

    #[test]
    fn test_runs_to_sentinel_and_disarms() {
        let mut seq = Sequencer::new();
        seq.arm(ExtFunction::Cosh);
        let expected = tape(ExtFunction::Cosh).unwrap();
        let mut fed = Vec::new();
        // Generous iteration bound; each key costs at most the window
        // plus the frame event.
        for _ in 0..1000 {
            if let Some(code) = seq.tick() {
                fed.push(code);
                seq.frame_complete();
            }
            if !seq.is_active() {
                break;
            }
        }
        assert_eq!(fed.as_slice(), &expected[..expected.len() - 1]);
        assert!(!seq.is_active());
    }

    #[test]
    fn test_interlock_blocks_without_frame() {
        let mut seq = Sequencer::new();
        seq.arm(ExtFunction::Tanh);
        assert!(seq.tick().is_some());
        // No frame_complete: the tape must stall no matter how long.
        for _ in 0..100 {
            assert_eq!(seq.tick(), None);
        }
        assert!(seq.is_active());
    }

    #[test]
    fn test_rearm_restarts_tape() {
        let mut seq = Sequencer::new();
        seq.arm(ExtFunction::Sinh);
        assert_eq!(seq.tick(), Some(Key::Sto as u8));
        seq.arm(ExtFunction::Cosh);
        assert_eq!(seq.tick(), Some(Key::Sto as u8));
    }
}
