//! Machine memory.
//!
//! A flat array of 32768 words. The loaded program image is copied in at
//! address 0 and the rest stays zero until written; memory is both the
//! program and its data, so programs may rewrite themselves. Cells hold
//! raw tokens: computed values stay in the 15-bit range, but operand
//! words of the image may carry register references up to 32775.

use crate::machine::Word;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The number of addressable words.
pub const MEMORY_SIZE: usize = 32768;

/// Machine memory: 32768 words, addresses 0..=32767.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<Word>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read the word at `addr`.
    ///
    /// Addresses must be 15-bit. A program can compute one that is
    /// not: `rmem` copies raw cells into registers, and cells may hold
    /// register tokens up to 32775, so the range check is a real
    /// failure path rather than an assertion.
    #[inline]
    pub fn read(&self, addr: Word) -> Result<Word, MemoryError> {
        self.cells
            .get(addr as usize)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange(addr))
    }

    /// Write `value` at `addr`.
    #[inline]
    pub fn write(&mut self, addr: Word, value: Word) -> Result<(), MemoryError> {
        match self.cells.get_mut(addr as usize) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(MemoryError::AddressOutOfRange(addr)),
        }
    }

    /// Fetch the word at a raw index, as the program counter does.
    ///
    /// Unlike [`read`](Self::read) the index is unconstrained, so this
    /// returns `None` past the end of the address space.
    #[inline]
    pub fn fetch(&self, index: usize) -> Option<Word> {
        self.cells.get(index).copied()
    }

    /// The full word array, for disassembly and tracing.
    pub fn words(&self) -> &[Word] {
        &self.cells
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = 0;
        }
    }

    /// Copy a program image into memory starting at address 0.
    pub fn load_image(&mut self, image: &[Word]) -> Result<(), MemoryError> {
        if image.len() > MEMORY_SIZE {
            return Err(MemoryError::ImageTooLarge {
                size: image.len(),
                capacity: MEMORY_SIZE,
            });
        }
        self.cells[..image.len()].copy_from_slice(image);
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|cell| **cell != 0).count();
        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("memory address {0} out of range (0-32767)")]
    AddressOutOfRange(Word),

    #[error("image size {size} exceeds memory capacity {capacity}")]
    ImageTooLarge { size: usize, capacity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_starts_zeroed() {
        let mem = Memory::new();
        assert_eq!(mem.read(0), Ok(0));
        assert_eq!(mem.read(32767), Ok(0));
    }

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();
        mem.write(100, 12345).unwrap();
        assert_eq!(mem.read(100), Ok(12345));
    }

    #[test]
    fn test_memory_bounds() {
        let mut mem = Memory::new();
        // Register tokens are representable words but not addresses
        assert_eq!(mem.read(32768), Err(MemoryError::AddressOutOfRange(32768)));
        assert_eq!(
            mem.write(32775, 1),
            Err(MemoryError::AddressOutOfRange(32775))
        );
    }

    #[test]
    fn test_fetch_out_of_bounds() {
        let mem = Memory::new();
        assert_eq!(mem.fetch(32767), Some(0));
        assert_eq!(mem.fetch(32768), None);
    }

    #[test]
    fn test_load_image() {
        let mut mem = Memory::new();
        mem.load_image(&[9, 32768, 1, 2]).unwrap();

        assert_eq!(mem.read(0), Ok(9));
        assert_eq!(mem.read(1), Ok(32768));
        assert_eq!(mem.read(3), Ok(2));
        // Memory past the image stays zero
        assert_eq!(mem.read(4), Ok(0));
    }

    #[test]
    fn test_load_image_too_large() {
        let mut mem = Memory::new();
        let oversized = vec![0; MEMORY_SIZE + 1];
        assert_eq!(
            mem.load_image(&oversized),
            Err(MemoryError::ImageTooLarge {
                size: MEMORY_SIZE + 1,
                capacity: MEMORY_SIZE,
            })
        );
    }
}
