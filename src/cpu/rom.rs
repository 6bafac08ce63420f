//! HP-35 microcode ROM image.
//!
//! The calculator's program lives in three 256-word ROM chips. Each
//! 10-bit microinstruction is stored as a big-endian byte pair `(H, L)`
//! with the two high-order instruction bits in `H`. The byte index of
//! address `pc` within bank `offset` is `offset * 512 + pc * 2`.

use crate::cpu::decode::MicroInstruction;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Microinstructions per ROM bank.
pub const BANK_WORDS: usize = 256;

/// Bytes per ROM bank.
pub const BANK_BYTES: usize = BANK_WORDS * 2;

/// Maximum addressable banks (3-bit bank selector).
pub const MAX_BANKS: usize = 8;

/// Banks populated in the HP-35 image.
pub const HP35_BANKS: usize = 3;

/// An immutable, banked microcode image.
#[derive(Clone, Serialize, Deserialize)]
pub struct Rom {
    data: Vec<u8>,
}

impl Rom {
    /// Build a ROM from raw image bytes.
    ///
    /// The image must be a whole number of 512-byte banks, at most eight.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RomError> {
        if bytes.is_empty() || bytes.len() % BANK_BYTES != 0 || bytes.len() > MAX_BANKS * BANK_BYTES
        {
            return Err(RomError::BadLength { len: bytes.len() });
        }
        Ok(Self { data: bytes.to_vec() })
    }

    /// Load a ROM image from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RomError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Pack a microprogram of 10-bit words into a ROM, padding the final
    /// bank with zeros. Intended for tests and synthetic programs.
    pub fn from_words(words: &[u16]) -> Self {
        let banks = (words.len() + BANK_WORDS - 1) / BANK_WORDS;
        let banks = banks.max(1);
        let mut data = vec![0u8; banks * BANK_BYTES];
        for (i, &w) in words.iter().enumerate() {
            data[i * 2] = ((w >> 8) & 0x03) as u8;
            data[i * 2 + 1] = (w & 0xFF) as u8;
        }
        Self { data }
    }

    /// Number of banks present in the image.
    pub fn banks(&self) -> usize {
        self.data.len() / BANK_BYTES
    }

    /// Fetch the microinstruction at `(bank, pc)`.
    ///
    /// A correct ROM never selects an absent bank; such a fetch is a
    /// programming error and decodes as a no-op in release builds.
    pub fn fetch(&self, bank: u8, pc: u8) -> MicroInstruction {
        let index = bank as usize * BANK_BYTES + pc as usize * 2;
        if index + 1 >= self.data.len() {
            debug_assert!(false, "fetch from absent bank {} at pc {}", bank, pc);
            return MicroInstruction::new(0, 0);
        }
        MicroInstruction::new(self.data[index], self.data[index + 1])
    }
}

impl std::fmt::Debug for Rom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rom")
            .field("banks", &self.banks())
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Errors that can occur when loading a ROM image.
#[derive(Debug, Error)]
pub enum RomError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image length {len} is not a whole number of 512-byte banks (max 8)")]
    BadLength { len: usize },
}
