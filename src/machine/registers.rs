//! The register file.
//!
//! 8 general-purpose 15-bit registers, named by tokens 32768..=32775.
//! Value-form operand resolution lives here because it is the only
//! place a token needs register contents.

use crate::machine::decode::{DecodeError, Operand, NUM_REGISTERS};
use crate::machine::Word;
use serde::{Deserialize, Serialize};

/// The 8-register file, all zeroed at construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    regs: [Word; NUM_REGISTERS],
}

impl Registers {
    /// Create a new register file with all registers zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read register `index`.
    ///
    /// # Panics
    /// Panics if `index` is not in 0..8.
    #[inline]
    pub fn get(&self, index: usize) -> Word {
        self.regs[index]
    }

    /// Write register `index`.
    ///
    /// # Panics
    /// Panics if `index` is not in 0..8.
    #[inline]
    pub fn set(&mut self, index: usize, value: Word) {
        self.regs[index] = value;
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        self.regs = [0; NUM_REGISTERS];
    }

    /// Resolve a token in value form.
    ///
    /// A literal resolves to itself, a register reference to the
    /// register's current content.
    pub fn resolve(&self, token: Word) -> Result<Word, DecodeError> {
        match Operand::decode(token)? {
            Operand::Literal(value) => Ok(value),
            Operand::Register(index) => Ok(self.get(index)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_start_zeroed() {
        let regs = Registers::new();
        for i in 0..NUM_REGISTERS {
            assert_eq!(regs.get(i), 0);
        }
    }

    #[test]
    fn test_get_set() {
        let mut regs = Registers::new();
        regs.set(3, 12345);
        assert_eq!(regs.get(3), 12345);
        regs.reset();
        assert_eq!(regs.get(3), 0);
    }

    #[test]
    fn test_resolve_literal() {
        let regs = Registers::new();
        assert_eq!(regs.resolve(0), Ok(0));
        assert_eq!(regs.resolve(32767), Ok(32767));
    }

    #[test]
    fn test_resolve_register() {
        let mut regs = Registers::new();
        regs.set(0, 42);
        regs.set(7, 99);
        assert_eq!(regs.resolve(32768), Ok(42));
        assert_eq!(regs.resolve(32775), Ok(99));
    }

    #[test]
    fn test_resolve_invalid_token() {
        let regs = Registers::new();
        assert_eq!(regs.resolve(32776), Err(DecodeError::InvalidOperand(32776)));
    }
}
