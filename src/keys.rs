//! HP-35 key-code space and the host keypad mapping.
//!
//! The ROM addresses keys by their position in the original key matrix:
//! the code latched by the shell becomes the jump-on-key target, so the
//! numbering below is part of the machine, not a convention of ours.
//!
//! The host board has a 4x4 key matrix plus a function key. Three
//! function layers map the 16 matrix positions onto the 35 HP-35 keys
//! and the extended-function ids; the F key cycles the layer and, on a
//! third press, blanks the screen.

use serde::{Deserialize, Serialize};

/// Latched code meaning "no key".
pub const NO_KEY: u8 = 0xFF;

/// Canonical HP-35 key codes.
///
/// The discriminants are the ROM's key-matrix numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Key {
    Clr = 0,
    Exp = 2,
    Ln = 3,
    Log = 4,
    Pow = 6,
    Rcl = 8,
    Sto = 10,
    Rot = 11,
    Swap = 12,
    Inv = 14,
    D6 = 18,
    D5 = 19,
    D4 = 20,
    Add = 22,
    D3 = 26,
    D2 = 27,
    D1 = 28,
    Mul = 30,
    Pi = 34,
    Dot = 35,
    D0 = 36,
    Div = 38,
    Tan = 40,
    Cos = 42,
    Sin = 43,
    Arc = 44,
    Sqrt = 46,
    D9 = 50,
    D8 = 51,
    D7 = 52,
    Sub = 54,
    Clx = 56,
    Eex = 58,
    Chs = 59,
    Enter = 62,
}

impl Key {
    /// The key-matrix code delivered to the CPU.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look a key up by its matrix code.
    pub fn from_code(code: u8) -> Option<Key> {
        use Key::*;
        Some(match code {
            0 => Clr,
            2 => Exp,
            3 => Ln,
            4 => Log,
            6 => Pow,
            8 => Rcl,
            10 => Sto,
            11 => Rot,
            12 => Swap,
            14 => Inv,
            18 => D6,
            19 => D5,
            20 => D4,
            22 => Add,
            26 => D3,
            27 => D2,
            28 => D1,
            30 => Mul,
            34 => Pi,
            35 => Dot,
            36 => D0,
            38 => Div,
            40 => Tan,
            42 => Cos,
            43 => Sin,
            44 => Arc,
            46 => Sqrt,
            50 => D9,
            51 => D8,
            52 => D7,
            54 => Sub,
            56 => Clx,
            58 => Eex,
            59 => Chs,
            62 => Enter,
            _ => return None,
        })
    }

    /// The key for a decimal digit 0..9.
    pub fn digit(d: u8) -> Key {
        match d {
            0 => Key::D0,
            1 => Key::D1,
            2 => Key::D2,
            3 => Key::D3,
            4 => Key::D4,
            5 => Key::D5,
            6 => Key::D6,
            7 => Key::D7,
            8 => Key::D8,
            9 => Key::D9,
            _ => panic!("not a decimal digit: {}", d),
        }
    }
}

/// Extended functions synthesized outside the ROM.
///
/// Ids 64..77 never reach the CPU; the shell turns them into mode
/// changes (Hyp, Brightness) or script-sequencer arming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ExtFunction {
    Hyp = 64,
    Brightness = 65,
    RectToPolar = 66,
    PolarToRect = 67,
    PresentValue = 68,
    NormalDensity = 69,
    LogGamma = 70,
    Quadratic = 71,
    Sinh = 72,
    Cosh = 73,
    Tanh = 74,
    Asinh = 75,
    Acosh = 76,
    Atanh = 77,
}

impl ExtFunction {
    /// The extended-function id.
    #[inline]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Look an extended function up by id.
    pub fn from_id(id: u8) -> Option<ExtFunction> {
        use ExtFunction::*;
        Some(match id {
            64 => Hyp,
            65 => Brightness,
            66 => RectToPolar,
            67 => PolarToRect,
            68 => PresentValue,
            69 => NormalDensity,
            70 => LogGamma,
            71 => Quadratic,
            72 => Sinh,
            73 => Cosh,
            74 => Tanh,
            75 => Asinh,
            76 => Acosh,
            77 => Atanh,
            _ => return None,
        })
    }
}

/// What a keypad position resolves to under the active function layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAction {
    /// A canonical key delivered to the CPU latch.
    Cpu(Key),
    /// An extended function handled by the shell.
    Ext(ExtFunction),
}

/// Matrix positions on the host keypad.
pub const MATRIX_KEYS: usize = 16;

/// Function layers.
pub const LAYER_COUNT: usize = 3;

/// The 3x16 dispatch table.
///
/// Layer 0 is the numeric face; layer 1 the scientific face; layer 2
/// memory, constants and the extended functions. The six hyperbolics are
/// reached through Hyp (and Arc) rather than their own positions.
pub const LAYERS: [[KeyAction; MATRIX_KEYS]; LAYER_COUNT] = {
    use ExtFunction as E;
    use Key as K;
    use KeyAction::{Cpu, Ext};
    [
        [
            Cpu(K::D7), Cpu(K::D8), Cpu(K::D9), Cpu(K::Div),
            Cpu(K::D4), Cpu(K::D5), Cpu(K::D6), Cpu(K::Mul),
            Cpu(K::D1), Cpu(K::D2), Cpu(K::D3), Cpu(K::Sub),
            Cpu(K::D0), Cpu(K::Dot), Cpu(K::Enter), Cpu(K::Add),
        ],
        [
            Cpu(K::Sin), Cpu(K::Cos), Cpu(K::Tan), Cpu(K::Arc),
            Cpu(K::Ln), Cpu(K::Log), Cpu(K::Exp), Cpu(K::Pow),
            Cpu(K::Sqrt), Cpu(K::Inv), Cpu(K::Chs), Cpu(K::Eex),
            Cpu(K::Clx), Cpu(K::Clr), Cpu(K::Swap), Cpu(K::Rot),
        ],
        [
            Ext(E::RectToPolar), Ext(E::PolarToRect), Ext(E::PresentValue), Ext(E::NormalDensity),
            Ext(E::LogGamma), Ext(E::Quadratic), Ext(E::Hyp), Ext(E::Brightness),
            Cpu(K::Sto), Cpu(K::Rcl), Cpu(K::Pi), Cpu(K::Swap),
            Cpu(K::Clx), Cpu(K::Clr), Cpu(K::Enter), Cpu(K::Chs),
        ],
    ]
};

/// Events from the host key scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    /// A matrix position, 0..15.
    Matrix(u8),
    /// The function key.
    Function,
}

/// Function-layer and screen-blank state of the host keypad.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Keypad {
    fg: u8,
    screen_off: bool,
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active function layer.
    pub fn layer(&self) -> u8 {
        self.fg
    }

    /// Whether the third F press has blanked the screen.
    pub fn screen_off(&self) -> bool {
        self.screen_off
    }

    /// Translate a scanner event under the current layer.
    ///
    /// The F key cycles the layer and yields no action; its third press
    /// blanks the screen. Any matrix key wakes a blanked screen without
    /// being delivered. Shifted layers are one-shot: after a layer 1 or 2
    /// key the keypad drops back to layer 0.
    pub fn translate(&mut self, event: KeyEvent) -> Option<KeyAction> {
        match event {
            KeyEvent::Function => {
                if self.fg == 2 {
                    self.fg = 0;
                    self.screen_off = true;
                } else {
                    self.fg += 1;
                }
                None
            }
            KeyEvent::Matrix(index) => {
                let index = (index as usize) % MATRIX_KEYS;
                if self.screen_off {
                    self.screen_off = false;
                    return None;
                }
                let action = LAYERS[self.fg as usize][index];
                self.fg = 0;
                Some(action)
            }
        }
    }
}
