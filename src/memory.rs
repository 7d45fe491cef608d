//! Word-addressable storage backing both instructions and data

use crate::error::SimulatorError;
use crate::error::SimulatorResult;

/// A flat memory image of 32-bit words.
///
/// Values are carried as `u64` so arithmetic overflow in the datapath never
/// wraps into sign ambiguity; loaded words occupy only the low 32 bits.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    words: Vec<u64>,
}

impl MemoryStore {
    /// Builds the image from a little-endian byte stream, four bytes per
    /// word, low byte first. Trailing bytes that do not form a whole word
    /// are not consumed.
    pub fn from_bytes(data: &[u8]) -> Self {
        let words = data
            .chunks_exact(4)
            .map(|chunk| {
                u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
                    as u64
            })
            .collect();
        Self { words }
    }

    /// Reads the word at the given byte address. Fractional word bits of
    /// the address are silently truncated.
    pub fn read(&self, byte_address: u64) -> SimulatorResult<u64> {
        let index = byte_address >> 2;
        self.words
            .get(index as usize)
            .copied()
            .ok_or(SimulatorError::AddressOutOfBounds(byte_address))
    }

    /// Writes the word at the given byte address. Fractional word bits of
    /// the address are silently truncated.
    pub fn write(&mut self, byte_address: u64, word: u64) -> SimulatorResult<()> {
        let index = byte_address >> 2;
        let slot = self
            .words
            .get_mut(index as usize)
            .ok_or(SimulatorError::AddressOutOfBounds(byte_address))?;
        *slot = word;
        Ok(())
    }

    /// Number of loaded words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
