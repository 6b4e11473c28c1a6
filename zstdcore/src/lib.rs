//! # zstdcore
//!
//! A pure-Rust Zstandard **decompression** core: frame demuxer, block
//! splitter, block decompressor, and sequence executor, backed by the
//! Huffman and FSE entropy coders Zstandard uses for its literals and
//! sequences sections.
//!
//! Compression is out of scope — this crate implements the decoder only,
//! plus dictionary support for decode and a small test-fixture encoder
//! (raw/RLE blocks only) used by this crate's own tests.
//!
//! ## Example
//!
//! ```rust
//! use zstdcore::decompress_to_vec;
//!
//! // Magic + single-segment descriptor + content size 1 + raw block "A"
//! let frame = [0x28, 0xB5, 0x2F, 0xFD, 0x20, 0x01, 0x01, 0x00, 0x00, 0x41];
//! let out = decompress_to_vec(&frame).unwrap();
//! assert_eq!(out, b"A");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dictionary;
mod frame;
mod fse;
mod huffman;
mod literals;
mod sequences;

pub use dictionary::Dictionary;
pub use frame::{
    decompress, decompress_to_vec, decompress_to_vec_with_dict, decompress_with_dict,
    get_decompressed_size,
};

use zstdcore_base::error::{Result, ZstdCoreError};

/// Zstandard data-frame magic number (`0xFD2FB528`, little-endian on the wire).
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Low end of the skippable-frame magic number range (`0x184D2A50`).
pub const SKIPPABLE_MAGIC_LOW: u32 = 0x184D2A50;

/// High end of the skippable-frame magic number range (`0x184D2A5F`).
pub const SKIPPABLE_MAGIC_HIGH: u32 = 0x184D2A5F;

/// Largest window size this decoder will honor (8 MiB). A frame whose
/// header demands a larger window is rejected rather than serviced with a
/// truncated history.
pub const MAX_WINDOW_SIZE: u64 = 8 * 1024 * 1024;

/// Largest decompressed size permitted for a single block (128 KiB).
pub const MAX_BLOCK_SIZE: usize = 128 * 1024;

/// A block's type, carried in bits 1-2 of the 3-byte block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// Literal bytes, copied verbatim.
    Raw,
    /// A single byte, repeated.
    Rle,
    /// Literals section followed by a sequences section.
    Compressed,
    /// Reserved; always an error if encountered.
    Reserved,
}

impl BlockType {
    /// Decode from a 2-bit field.
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits & 0x03 {
            0 => Ok(BlockType::Raw),
            1 => Ok(BlockType::Rle),
            2 => Ok(BlockType::Compressed),
            3 => Err(ZstdCoreError::reserved("block type 3 is reserved")),
            _ => unreachable!(),
        }
    }
}

/// A literals section's encoding, carried in bits 0-1 of its header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralsBlockType {
    /// Uncompressed literal bytes.
    Raw,
    /// A single byte, repeated.
    Rle,
    /// Huffman-compressed, table description included.
    Compressed,
    /// Huffman-compressed, reusing the previous block's table.
    Treeless,
}

impl LiteralsBlockType {
    /// Decode from a 2-bit field.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => LiteralsBlockType::Raw,
            1 => LiteralsBlockType::Rle,
            2 => LiteralsBlockType::Compressed,
            3 => LiteralsBlockType::Treeless,
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_type_from_bits() {
        assert_eq!(BlockType::from_bits(0).unwrap(), BlockType::Raw);
        assert_eq!(BlockType::from_bits(1).unwrap(), BlockType::Rle);
        assert_eq!(BlockType::from_bits(2).unwrap(), BlockType::Compressed);
        assert!(BlockType::from_bits(3).is_err());
    }

    #[test]
    fn test_literals_block_type_from_bits() {
        assert_eq!(LiteralsBlockType::from_bits(0), LiteralsBlockType::Raw);
        assert_eq!(LiteralsBlockType::from_bits(1), LiteralsBlockType::Rle);
        assert_eq!(
            LiteralsBlockType::from_bits(2),
            LiteralsBlockType::Compressed
        );
        assert_eq!(LiteralsBlockType::from_bits(3), LiteralsBlockType::Treeless);
    }

    #[test]
    fn test_zstd_magic_matches_wire_value() {
        assert_eq!(u32::from_le_bytes(ZSTD_MAGIC), 0xFD2F_B528);
    }

    #[test]
    fn test_skippable_range() {
        assert_eq!(SKIPPABLE_MAGIC_LOW, 0x184D_2A50);
        assert_eq!(SKIPPABLE_MAGIC_HIGH, 0x184D_2A5F);
    }
}
