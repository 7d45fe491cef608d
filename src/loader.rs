//! Loads a flat binary file into a memory image

use std::fs;
use std::path::Path;

use crate::error::SimulatorError;
use crate::error::SimulatorResult;
use crate::memory::MemoryStore;

/// Reads the file at the given path into a word-addressable memory image.
/// The file is a headerless sequence of little-endian 32-bit words.
pub fn load_image<P: AsRef<Path>>(path: P) -> SimulatorResult<MemoryStore> {
    let path = path.as_ref();
    let data = fs::read(path)
        .map_err(|e| SimulatorError::ImageLoad(path.to_path_buf(), e))?;
    Ok(MemoryStore::from_bytes(&data))
}
