//! Dictionary parsing for Zstandard decode.
//!
//! A dictionary blob is either *raw content* (used only as prefix history)
//! or *formatted*: a magic-prefixed blob carrying a precomputed Huffman
//! table, three precomputed FSE tables, and three starting offset-history
//! values ahead of its raw content.

use crate::fse::{FseTable, read_fse_table_description};
use crate::huffman::{HuffmanTable, read_huffman_table};
use crate::sequences::{LL_MAX_SYMBOL, ML_MAX_SYMBOL, OF_MAX_SYMBOL, SEQUENCE_MAX_ACCURACY_LOG};
use std::rc::Rc;
use zstdcore_base::error::{Result, ZstdCoreError};

/// Formatted-dictionary magic number (0xEC30A437 little-endian).
pub const DICTIONARY_MAGIC: [u8; 4] = [0x37, 0xA4, 0x30, 0xEC];

/// Shortest length a blob must have to possibly carry the formatted magic
/// and a dictionary id.
const MIN_FORMATTED_LEN: usize = 8;

/// A parsed Zstandard dictionary.
///
/// Precomputed tables are reference-counted so a frame can adopt them
/// directly (via `Repeat` mode) without a deep copy; the frame only ever
/// replaces its working table outright when a block supplies its own.
#[derive(Debug, Clone)]
pub struct Dictionary {
    /// Raw content, used as prefix history for back-references that reach
    /// before the start of the frame's own output.
    pub raw_content: Vec<u8>,
    /// Dictionary id, present only for formatted dictionaries.
    pub dict_id: Option<u32>,
    /// Precomputed Huffman table, present only for formatted dictionaries.
    pub huffman_table: Option<Rc<HuffmanTable>>,
    /// Precomputed FSE tables, stored as (literal-length, offset,
    /// match-length) to match `SequencesDecoder::with_tables`'s argument
    /// order — present only for formatted dictionaries. On the wire these
    /// three table descriptions are read in the order offset,
    /// match-length, literal-length; see `parse`.
    pub fse_tables: Option<(Rc<FseTable>, Rc<FseTable>, Rc<FseTable>)>,
    /// Starting offset history, `[1, 4, 8]` for raw-content dictionaries.
    pub offset_history: [u32; 3],
}

impl Dictionary {
    /// Parse a dictionary blob. A blob whose first 4 bytes (little-endian)
    /// do not match the dictionary magic is treated as raw content in its
    /// entirety.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_FORMATTED_LEN || data[0..4] != DICTIONARY_MAGIC {
            return Ok(Self {
                raw_content: data.to_vec(),
                dict_id: None,
                huffman_table: None,
                fse_tables: None,
                offset_history: [1, 4, 8],
            });
        }

        let dict_id = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let mut pos = 8;

        let (huffman_table, huffman_size) = read_huffman_table(&data[pos..])?;
        pos += huffman_size;

        // Wire order is offset, match-length, literal-length (reference
        // decoder's `parse_dictionary`), not the literal-length-first order
        // the sequences-section mode byte names its components in.
        let (of_table, of_size) =
            read_fse_table_description(&data[pos..], OF_MAX_SYMBOL, SEQUENCE_MAX_ACCURACY_LOG)?;
        pos += of_size;
        let (ml_table, ml_size) =
            read_fse_table_description(&data[pos..], ML_MAX_SYMBOL, SEQUENCE_MAX_ACCURACY_LOG)?;
        pos += ml_size;
        let (ll_table, ll_size) =
            read_fse_table_description(&data[pos..], LL_MAX_SYMBOL, SEQUENCE_MAX_ACCURACY_LOG)?;
        pos += ll_size;

        if data.len() < pos + 12 {
            return Err(ZstdCoreError::eof(pos + 12, data.len()));
        }
        let remaining_content_len = (data.len() - (pos + 12)) as u64;
        let mut offset_history = [0u32; 3];
        for (i, slot) in offset_history.iter_mut().enumerate() {
            let base = pos + i * 4;
            *slot = u32::from_le_bytes([
                data[base],
                data[base + 1],
                data[base + 2],
                data[base + 3],
            ]);
            if *slot == 0 {
                return Err(ZstdCoreError::table_malformed(
                    "dictionary starting offset is zero",
                ));
            }
            if *slot as u64 > remaining_content_len {
                return Err(ZstdCoreError::table_malformed(
                    "dictionary starting offset exceeds dictionary content length",
                ));
            }
        }
        pos += 12;

        Ok(Self {
            raw_content: data[pos..].to_vec(),
            dict_id: Some(dict_id),
            huffman_table: Some(Rc::new(huffman_table)),
            fse_tables: Some((Rc::new(ll_table), Rc::new(of_table), Rc::new(ml_table))),
            offset_history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_blob_is_raw_content() {
        let dict = Dictionary::parse(b"abc").unwrap();
        assert_eq!(dict.raw_content, b"abc");
        assert!(dict.huffman_table.is_none());
        assert_eq!(dict.offset_history, [1, 4, 8]);
    }

    #[test]
    fn test_unrecognized_magic_is_raw_content() {
        let data = vec![0u8; 16];
        let dict = Dictionary::parse(&data).unwrap();
        assert_eq!(dict.raw_content, data);
        assert!(dict.dict_id.is_none());
    }

    #[test]
    fn test_formatted_magic_without_enough_bytes_errors() {
        let mut data = DICTIONARY_MAGIC.to_vec();
        data.extend_from_slice(&[0u8; 3]); // dict id truncated
        assert!(Dictionary::parse(&data).is_err());
    }
}
