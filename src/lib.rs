//! # Synacor VM
//!
//! An emulator of the Synacor challenge's 15-bit virtual machine:
//! 32768 words of memory, 8 registers, an unbounded value stack, and a
//! 22-opcode instruction set over values in 0..=32767. Programs ship
//! as little-endian binary images loaded at address 0.

pub mod machine;
pub mod program;

// Re-export commonly used types
pub use machine::{
    Console, DecodeError, LineSink, LineSource, Machine, Memory, Opcode, Operand, Registers,
    VmError, VmState, Word,
};
pub use program::{disassemble, format_instruction, load_image, parse_image, ImageError};
