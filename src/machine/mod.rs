//! Emulation of the Synacor machine.
//!
//! This module implements the complete architecture:
//! - 32768 fifteen-bit memory words, image loaded at address 0
//! - 8 general-purpose registers and an unbounded value stack
//! - 22-instruction set with literal and register addressing modes

pub mod decode;
pub mod execute;
pub mod io;
pub mod memory;
pub mod registers;

pub use decode::{DecodeError, Opcode, Operand};
pub use execute::{Machine, VmError, VmState};
pub use io::{Console, LineSink, LineSource};
pub use memory::{Memory, MemoryError};
pub use registers::Registers;

/// The machine's native value type.
///
/// Stored as a `u16`, but every value the machine computes stays in
/// `0..=32767`; arithmetic wraps modulo 32768. Raw instruction tokens
/// additionally use `32768..=32775` to name registers.
pub type Word = u16;
