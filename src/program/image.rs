//! Binary program images.
//!
//! An image is a byte file of even length, decoded as little-endian
//! 16-bit words. Every word must be a literal or register token
//! (0..=32775); anything else rejects the whole image before a single
//! instruction runs.

use crate::machine::decode::{NUM_REGISTERS, REGISTER_BASE};
use crate::machine::Word;
use std::path::Path;
use thiserror::Error;

/// Highest token value an image may contain (register r7).
pub const MAX_TOKEN: Word = REGISTER_BASE + NUM_REGISTERS as Word - 1;

/// Decode and validate an image from raw bytes.
pub fn parse_image(bytes: &[u8]) -> Result<Vec<Word>, ImageError> {
    if bytes.len() % 2 != 0 {
        return Err(ImageError::OddLength(bytes.len()));
    }

    let mut tokens = Vec::with_capacity(bytes.len() / 2);
    for (pos, pair) in bytes.chunks_exact(2).enumerate() {
        let token = Word::from_le_bytes([pair[0], pair[1]]);
        if token > MAX_TOKEN {
            return Err(ImageError::TokenOutOfRange { pos, token });
        }
        tokens.push(token);
    }

    Ok(tokens)
}

/// Load and validate an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Vec<Word>, ImageError> {
    let bytes = std::fs::read(path.as_ref()).map_err(|e| ImageError::Io(e.to_string()))?;
    parse_image(&bytes)
}

/// Errors that can occur while loading an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("image has odd byte length {0}")]
    OddLength(usize),

    #[error("token {token} at word {pos} is outside the valid range 0..=32775")]
    TokenOutOfRange { pos: usize, token: Word },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_little_endian() {
        // 0x0009 = add, 0x8000 = r0
        let tokens = parse_image(&[0x09, 0x00, 0x00, 0x80]).unwrap();
        assert_eq!(tokens, vec![9, 32768]);
    }

    #[test]
    fn test_parse_empty_image() {
        assert_eq!(parse_image(&[]).unwrap(), Vec::<Word>::new());
    }

    #[test]
    fn test_odd_length_rejected() {
        assert_eq!(parse_image(&[0x01, 0x02, 0x03]), Err(ImageError::OddLength(3)));
    }

    #[test]
    fn test_token_out_of_range_rejected() {
        // 0x8008 = 32776, one past register r7
        let result = parse_image(&[0x00, 0x00, 0x08, 0x80]);
        assert_eq!(
            result,
            Err(ImageError::TokenOutOfRange {
                pos: 1,
                token: 32776
            })
        );
    }

    #[test]
    fn test_max_token_accepted() {
        // 0x8007 = register r7, the last valid token
        let tokens = parse_image(&[0x07, 0x80]).unwrap();
        assert_eq!(tokens, vec![32775]);
    }
}
