//! Instruction decoding: the opcode table and operand addressing modes.
//!
//! An instruction is an opcode word followed by zero to three operand
//! tokens. A token below 32768 is a literal value; 32768..=32775 names
//! one of the 8 registers; anything higher is malformed.

use crate::machine::Word;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest value a literal token may take.
pub const MAX_LITERAL: Word = 32767;

/// First token value that names a register.
pub const REGISTER_BASE: Word = 32768;

/// Number of general-purpose registers.
pub const NUM_REGISTERS: usize = 8;

/// The instruction set, one variant per opcode, discriminants 0-21.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum Opcode {
    /// Stop execution.
    Halt = 0,
    /// `set a b` - register a := b
    Set = 1,
    /// `push a` - push a onto the stack
    Push = 2,
    /// `pop a` - pop into register a; empty stack is an error
    Pop = 3,
    /// `eq a b c` - register a := 1 if b == c else 0
    Eq = 4,
    /// `gt a b c` - register a := 1 if b > c else 0
    Gt = 5,
    /// `jmp a` - jump to a
    Jmp = 6,
    /// `jt a b` - jump to b if a is nonzero
    Jt = 7,
    /// `jf a b` - jump to b if a is zero
    Jf = 8,
    /// `add a b c` - register a := (b + c) mod 32768
    Add = 9,
    /// `mult a b c` - register a := (b * c) mod 32768
    Mult = 10,
    /// `mod a b c` - register a := b mod c
    Mod = 11,
    /// `and a b c` - register a := b & c
    And = 12,
    /// `or a b c` - register a := b | c
    Or = 13,
    /// `not a b` - register a := 15-bit complement of b
    Not = 14,
    /// `rmem a b` - register a := memory[b]
    Rmem = 15,
    /// `wmem a b` - memory[a] := b
    Wmem = 16,
    /// `call a` - push the address of the next instruction, jump to a
    Call = 17,
    /// `ret` - pop an address and jump to it; empty stack halts
    Ret = 18,
    /// `out a` - emit the character with code a
    Out = 19,
    /// `in a` - register a := next input character code
    In = 20,
    /// `noop` - no operation
    Noop = 21,
}

impl Opcode {
    /// Decode an opcode word.
    pub fn from_word(word: Word) -> Result<Self, DecodeError> {
        Ok(match word {
            0 => Opcode::Halt,
            1 => Opcode::Set,
            2 => Opcode::Push,
            3 => Opcode::Pop,
            4 => Opcode::Eq,
            5 => Opcode::Gt,
            6 => Opcode::Jmp,
            7 => Opcode::Jt,
            8 => Opcode::Jf,
            9 => Opcode::Add,
            10 => Opcode::Mult,
            11 => Opcode::Mod,
            12 => Opcode::And,
            13 => Opcode::Or,
            14 => Opcode::Not,
            15 => Opcode::Rmem,
            16 => Opcode::Wmem,
            17 => Opcode::Call,
            18 => Opcode::Ret,
            19 => Opcode::Out,
            20 => Opcode::In,
            21 => Opcode::Noop,
            _ => return Err(DecodeError::UnknownOpcode(word)),
        })
    }

    /// Instruction size in words, including the opcode word itself.
    pub const fn size(self) -> usize {
        match self {
            Opcode::Halt | Opcode::Ret | Opcode::Noop => 1,
            Opcode::Push | Opcode::Pop | Opcode::Jmp | Opcode::Call | Opcode::Out | Opcode::In => {
                2
            }
            Opcode::Set | Opcode::Jt | Opcode::Jf | Opcode::Not | Opcode::Rmem | Opcode::Wmem => 3,
            Opcode::Eq
            | Opcode::Gt
            | Opcode::Add
            | Opcode::Mult
            | Opcode::Mod
            | Opcode::And
            | Opcode::Or => 4,
        }
    }

    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Halt => "halt",
            Opcode::Set => "set",
            Opcode::Push => "push",
            Opcode::Pop => "pop",
            Opcode::Eq => "eq",
            Opcode::Gt => "gt",
            Opcode::Jmp => "jmp",
            Opcode::Jt => "jt",
            Opcode::Jf => "jf",
            Opcode::Add => "add",
            Opcode::Mult => "mult",
            Opcode::Mod => "mod",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Not => "not",
            Opcode::Rmem => "rmem",
            Opcode::Wmem => "wmem",
            Opcode::Call => "call",
            Opcode::Ret => "ret",
            Opcode::Out => "out",
            Opcode::In => "in",
            Opcode::Noop => "noop",
        }
    }

    /// True for opcodes that set the program counter themselves.
    ///
    /// All other opcodes advance the pc by [`size`](Self::size) after
    /// executing.
    pub const fn sets_pc(self) -> bool {
        matches!(
            self,
            Opcode::Jmp | Opcode::Jt | Opcode::Jf | Opcode::Call | Opcode::Ret
        )
    }
}

/// A decoded operand token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// A 15-bit value used directly.
    Literal(Word),
    /// A reference to one of the 8 registers.
    Register(usize),
}

impl Operand {
    /// Decode a raw token by its addressing mode.
    pub fn decode(token: Word) -> Result<Self, DecodeError> {
        if token <= MAX_LITERAL {
            Ok(Operand::Literal(token))
        } else if token < REGISTER_BASE + NUM_REGISTERS as Word {
            Ok(Operand::Register((token - REGISTER_BASE) as usize))
        } else {
            Err(DecodeError::InvalidOperand(token))
        }
    }
}

/// Decode a destination token, which must name a register.
///
/// Literals are never valid destinations, so any token outside
/// 32768..=32775 is rejected.
pub fn register_target(token: Word) -> Result<usize, DecodeError> {
    if (REGISTER_BASE..REGISTER_BASE + NUM_REGISTERS as Word).contains(&token) {
        Ok((token - REGISTER_BASE) as usize)
    } else {
        Err(DecodeError::InvalidRegisterOperand(token))
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode {0}")]
    UnknownOpcode(Word),

    #[error("token {0} is neither a literal nor a register reference")]
    InvalidOperand(Word),

    #[error("token {0} does not name a register")]
    InvalidRegisterOperand(Word),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcodes_decode_at_the_right_index() {
        let table = [
            (0, Opcode::Halt),
            (1, Opcode::Set),
            (2, Opcode::Push),
            (3, Opcode::Pop),
            (4, Opcode::Eq),
            (5, Opcode::Gt),
            (6, Opcode::Jmp),
            (7, Opcode::Jt),
            (8, Opcode::Jf),
            (9, Opcode::Add),
            (10, Opcode::Mult),
            (11, Opcode::Mod),
            (12, Opcode::And),
            (13, Opcode::Or),
            (14, Opcode::Not),
            (15, Opcode::Rmem),
            (16, Opcode::Wmem),
            (17, Opcode::Call),
            (18, Opcode::Ret),
            (19, Opcode::Out),
            (20, Opcode::In),
            (21, Opcode::Noop),
        ];
        for (word, op) in table {
            assert_eq!(Opcode::from_word(word).unwrap(), op);
            assert_eq!(op as Word, word);
        }
    }

    #[test]
    fn test_unknown_opcode_rejected() {
        assert_eq!(Opcode::from_word(22), Err(DecodeError::UnknownOpcode(22)));
        assert_eq!(
            Opcode::from_word(32767),
            Err(DecodeError::UnknownOpcode(32767))
        );
    }

    #[test]
    fn test_instruction_sizes() {
        assert_eq!(Opcode::Halt.size(), 1);
        assert_eq!(Opcode::Set.size(), 3);
        assert_eq!(Opcode::Push.size(), 2);
        assert_eq!(Opcode::Pop.size(), 2);
        assert_eq!(Opcode::Eq.size(), 4);
        assert_eq!(Opcode::Jt.size(), 3);
        assert_eq!(Opcode::Add.size(), 4);
        assert_eq!(Opcode::Ret.size(), 1);
        assert_eq!(Opcode::Out.size(), 2);
        assert_eq!(Opcode::Noop.size(), 1);
    }

    #[test]
    fn test_operand_addressing_modes() {
        assert_eq!(Operand::decode(0), Ok(Operand::Literal(0)));
        assert_eq!(Operand::decode(32767), Ok(Operand::Literal(32767)));
        assert_eq!(Operand::decode(32768), Ok(Operand::Register(0)));
        assert_eq!(Operand::decode(32775), Ok(Operand::Register(7)));
        assert_eq!(
            Operand::decode(32776),
            Err(DecodeError::InvalidOperand(32776))
        );
    }

    #[test]
    fn test_register_target() {
        assert_eq!(register_target(32768), Ok(0));
        assert_eq!(register_target(32775), Ok(7));
        // A literal is never a valid destination
        assert_eq!(
            register_target(5),
            Err(DecodeError::InvalidRegisterOperand(5))
        );
        assert_eq!(
            register_target(32776),
            Err(DecodeError::InvalidRegisterOperand(32776))
        );
    }
}
