//! Program images and their tooling.
//!
//! This module provides:
//! - The binary image loader/validator (bytes → validated tokens)
//! - A disassembler (tokens → readable listing), also used for tracing

pub mod disasm;
pub mod image;

pub use disasm::{disassemble, format_instruction};
pub use image::{load_image, parse_image, ImageError};
