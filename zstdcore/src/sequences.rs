//! Sequences section decoding for Zstandard (E2 consumer, L3 half).
//!
//! A sequence is a `(literal_length, offset, match_length)` triple. This
//! module decodes the raw values the bitstream encodes; it does not
//! resolve repeat-offset references or replay back-references against
//! output — that is the sequence executor's job (`frame::execute_sequences`,
//! L4), since the repeat-offset history is frame-lifetime state, not
//! something the entropy layer needs to know about.

use crate::fse::{
    FseBitReader, FseDecoder, FseTable, MAX_ACCURACY_LOG, read_fse_table_description,
};
use std::rc::Rc;
use zstdcore_base::error::{Result, ZstdCoreError};

/// Maximum accuracy log for the three sequence-component FSE tables.
pub const SEQUENCE_MAX_ACCURACY_LOG: u8 = MAX_ACCURACY_LOG;

/// Largest literal-length code (36 codes, 0..=35).
pub const LL_MAX_SYMBOL: u8 = 35;
/// Largest offset code. The wire format leaves this open-ended ("offset
/// unbounded, validated via offset range check"); 31 is the conventional
/// ceiling used by the reference encoder/decoder pair, corresponding to
/// offsets representable with a 31-bit extra-bits field.
pub const OF_MAX_SYMBOL: u8 = 31;
/// Largest match-length code (53 codes, 0..=52).
pub const ML_MAX_SYMBOL: u8 = 52;

/// A decoded sequence. `offset` is the *raw* value from the bitstream —
/// the sequence executor resolves it to an effective back-reference
/// distance, possibly consulting and updating the offset history.
#[derive(Debug, Clone, Copy)]
pub struct Sequence {
    /// Number of literal bytes to copy before the match.
    pub literal_length: usize,
    /// Number of bytes the match copies.
    pub match_length: usize,
    /// Raw offset value decoded from the bitstream.
    pub offset: u32,
}

/// Compression mode for one sequence-component (literal-length, offset,
/// or match-length).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    /// Use the format's fixed built-in distribution.
    Predefined,
    /// A single RLE symbol follows.
    Rle,
    /// An FSE table description follows.
    Fse,
    /// Reuse the table from the previous block (or dictionary).
    Repeat,
}

impl CompressionMode {
    /// Decode from a 2-bit field.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => CompressionMode::Predefined,
            1 => CompressionMode::Rle,
            2 => CompressionMode::Fse,
            3 => CompressionMode::Repeat,
            _ => unreachable!(),
        }
    }
}

/// Parsed sequences-section header.
#[derive(Debug)]
pub struct SequencesHeader {
    /// Number of sequences in the block.
    pub num_sequences: usize,
    /// Literal-length component mode.
    pub ll_mode: CompressionMode,
    /// Offset component mode.
    pub of_mode: CompressionMode,
    /// Match-length component mode.
    pub ml_mode: CompressionMode,
    /// Bytes consumed by the count field plus, when `num_sequences > 0`,
    /// the mode byte.
    pub header_size: usize,
}

/// Parse the variable-length sequence count and (if nonzero) the mode byte.
pub fn parse_sequences_header(data: &[u8]) -> Result<SequencesHeader> {
    if data.is_empty() {
        return Err(ZstdCoreError::eof(1, 0));
    }

    let byte0 = data[0];
    let (num_sequences, count_size) = if byte0 == 0 {
        (0, 1)
    } else if byte0 < 128 {
        (byte0 as usize, 1)
    } else if byte0 < 255 {
        if data.len() < 2 {
            return Err(ZstdCoreError::eof(2, data.len()));
        }
        (((byte0 as usize - 128) << 8) + data[1] as usize, 2)
    } else {
        if data.len() < 3 {
            return Err(ZstdCoreError::eof(3, data.len()));
        }
        (
            data[1] as usize + ((data[2] as usize) << 8) + 0x7F00,
            3,
        )
    };

    if num_sequences == 0 {
        return Ok(SequencesHeader {
            num_sequences: 0,
            ll_mode: CompressionMode::Predefined,
            of_mode: CompressionMode::Predefined,
            ml_mode: CompressionMode::Predefined,
            header_size: count_size,
        });
    }

    if data.len() <= count_size {
        return Err(ZstdCoreError::eof(count_size + 1, data.len()));
    }
    let modes_byte = data[count_size];
    if modes_byte & 0x03 != 0 {
        return Err(ZstdCoreError::reserved("sequences mode byte low bits set"));
    }

    Ok(SequencesHeader {
        num_sequences,
        ll_mode: CompressionMode::from_bits(modes_byte >> 6),
        of_mode: CompressionMode::from_bits(modes_byte >> 4),
        ml_mode: CompressionMode::from_bits(modes_byte >> 2),
        header_size: count_size + 1,
    })
}

/// Literal-length code -> (baseline, extra bits), 36 entries.
const LL_BASELINE: [u32; 36] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 18, 20, 22, 24, 28, 32, 40, 48, 64,
    128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768, 65538,
];
const LL_EXTRA: [u8; 36] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 3, 3, 4, 6, 7, 8, 9, 10, 11,
    12, 13, 14, 15, 16,
];

/// Match-length code -> (baseline, extra bits), 53 entries.
const ML_BASELINE: [u32; 53] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27,
    28, 29, 30, 31, 32, 33, 34, 35, 37, 39, 41, 43, 47, 51, 59, 67, 83, 99, 131, 259, 515, 1027,
    2051, 4099, 8195, 16387, 32771, 65539,
];
const ML_EXTRA: [u8; 53] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    1, 1, 1, 1, 2, 2, 3, 3, 4, 4, 5, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16,
];

/// Predefined literal-length distribution (accuracy log 6, §6).
const LL_PREDEFINED: [i16; 36] = [
    4, 3, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 3, 2, 1, 1, 1, 1, 1,
    -1, -1, -1, -1,
];
/// Predefined offset distribution (accuracy log 5, §6).
const OF_PREDEFINED: [i16; 29] = [
    1, 1, 1, 1, 1, 1, 2, 2, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, -1, -1, -1, -1, -1,
];
/// Predefined match-length distribution (accuracy log 6, §6).
const ML_PREDEFINED: [i16; 53] = [
    1, 4, 3, 2, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, -1, -1, -1, -1, -1, -1, -1,
];

fn predefined_ll_table() -> FseTable {
    FseTable::new(6, &LL_PREDEFINED).expect("predefined literal-length table is always valid")
}
fn predefined_of_table() -> FseTable {
    FseTable::new(5, &OF_PREDEFINED).expect("predefined offset table is always valid")
}
fn predefined_ml_table() -> FseTable {
    FseTable::new(6, &ML_PREDEFINED).expect("predefined match-length table is always valid")
}

/// Shared three-table state threaded through a frame's blocks. Tables are
/// reference-counted so a dictionary's precomputed tables, or a previous
/// block's freshly-built ones, can be adopted by `Repeat` mode without a
/// copy; any non-`Repeat` mode replaces the `Rc` outright.
pub struct SequencesDecoder {
    ll_table: Option<Rc<FseTable>>,
    of_table: Option<Rc<FseTable>>,
    ml_table: Option<Rc<FseTable>>,
}

impl SequencesDecoder {
    /// Create a decoder with no prior tables (first block of a frame with
    /// no dictionary, or a dictionary that carries no precomputed tables).
    pub fn new() -> Self {
        Self {
            ll_table: None,
            of_table: None,
            ml_table: None,
        }
    }

    /// Create a decoder seeded with a dictionary's precomputed tables, so
    /// the first block in a frame may use `Repeat` mode against them.
    pub fn with_tables(ll: Rc<FseTable>, of: Rc<FseTable>, ml: Rc<FseTable>) -> Self {
        Self {
            ll_table: Some(ll),
            of_table: Some(of),
            ml_table: Some(ml),
        }
    }

    /// Decode one sequences section, returning the sequences and the
    /// number of bytes of `data` consumed (always all of it — the
    /// sequences section runs to the end of the compressed block body).
    pub fn decode(&mut self, data: &[u8]) -> Result<(Vec<Sequence>, usize)> {
        let header = parse_sequences_header(data)?;
        if header.num_sequences == 0 {
            return Ok((Vec::new(), header.header_size));
        }

        let mut pos = header.header_size;
        pos += self.setup_table(Component::LiteralLength, &data[pos..], header.ll_mode)?;
        pos += self.setup_table(Component::Offset, &data[pos..], header.of_mode)?;
        pos += self.setup_table(Component::MatchLength, &data[pos..], header.ml_mode)?;

        let sequences = self.decode_bitstream(&data[pos..], header.num_sequences)?;
        Ok((sequences, data.len()))
    }

    fn setup_table(&mut self, which: Component, data: &[u8], mode: CompressionMode) -> Result<usize> {
        let (slot, max_symbol, predefined): (&mut Option<Rc<FseTable>>, u8, fn() -> FseTable) =
            match which {
                Component::LiteralLength => (&mut self.ll_table, LL_MAX_SYMBOL, predefined_ll_table),
                Component::Offset => (&mut self.of_table, OF_MAX_SYMBOL, predefined_of_table),
                Component::MatchLength => (&mut self.ml_table, ML_MAX_SYMBOL, predefined_ml_table),
            };

        match mode {
            CompressionMode::Predefined => {
                *slot = Some(Rc::new(predefined()));
                Ok(0)
            }
            CompressionMode::Rle => {
                if data.is_empty() {
                    return Err(ZstdCoreError::eof(1, 0));
                }
                *slot = Some(Rc::new(FseTable::rle(data[0])));
                Ok(1)
            }
            CompressionMode::Fse => {
                let (table, consumed) =
                    read_fse_table_description(data, max_symbol, SEQUENCE_MAX_ACCURACY_LOG)?;
                *slot = Some(Rc::new(table));
                Ok(consumed)
            }
            CompressionMode::Repeat => {
                if slot.is_none() {
                    return Err(ZstdCoreError::table_malformed(
                        "repeat mode requested with no prior sequence table",
                    ));
                }
                Ok(0)
            }
        }
    }

    fn decode_bitstream(&self, data: &[u8], count: usize) -> Result<Vec<Sequence>> {
        let ll_table = self
            .ll_table
            .as_ref()
            .ok_or_else(|| ZstdCoreError::table_malformed("no literal-length table"))?;
        let of_table = self
            .of_table
            .as_ref()
            .ok_or_else(|| ZstdCoreError::table_malformed("no offset table"))?;
        let ml_table = self
            .ml_table
            .as_ref()
            .ok_or_else(|| ZstdCoreError::table_malformed("no match-length table"))?;

        let mut reader = FseBitReader::new(data)?;

        // Declaration order: literal-length, offset, match-length.
        let mut ll_decoder = FseDecoder::new(ll_table, &mut reader);
        let mut of_decoder = FseDecoder::new(of_table, &mut reader);
        let mut ml_decoder = FseDecoder::new(ml_table, &mut reader);

        let mut sequences = Vec::with_capacity(count);

        for i in 0..count {
            // Peek all three current symbols before consuming any extra
            // bits; decode order afterward is offset, match-length,
            // literal-length (spec §4.3), a true data dependency on the
            // shared bit cursor.
            let of_code = of_decoder.peek_symbol();
            let ml_code = ml_decoder.peek_symbol();
            let ll_code = ll_decoder.peek_symbol();

            let offset_extra = reader.read_bits(of_code);
            let offset = (1u32 << of_code) + offset_extra;

            let ml_idx = ml_code as usize;
            if ml_idx >= ML_BASELINE.len() {
                return Err(ZstdCoreError::size_invalid("match-length code out of range"));
            }
            let ml_extra = reader.read_bits(ML_EXTRA[ml_idx]);
            let match_length = ML_BASELINE[ml_idx] as usize + ml_extra as usize;

            let ll_idx = ll_code as usize;
            if ll_idx >= LL_BASELINE.len() {
                return Err(ZstdCoreError::size_invalid("literal-length code out of range"));
            }
            let ll_extra = reader.read_bits(LL_EXTRA[ll_idx]);
            let literal_length = LL_BASELINE[ll_idx] as usize + ll_extra as usize;

            sequences.push(Sequence {
                literal_length,
                match_length,
                offset,
            });

            if i + 1 < count {
                // State update order: literal-length, match-length, offset.
                ll_decoder.update_state(&mut reader);
                ml_decoder.update_state(&mut reader);
                of_decoder.update_state(&mut reader);
            }
        }

        if !reader.is_empty() {
            return Err(ZstdCoreError::desync(
                "sequences bitstream did not terminate at bit 0",
            ));
        }

        Ok(sequences)
    }
}

impl Default for SequencesDecoder {
    fn default() -> Self {
        Self::new()
    }
}

enum Component {
    LiteralLength,
    Offset,
    MatchLength,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_mode_from_bits() {
        assert_eq!(CompressionMode::from_bits(0), CompressionMode::Predefined);
        assert_eq!(CompressionMode::from_bits(1), CompressionMode::Rle);
        assert_eq!(CompressionMode::from_bits(2), CompressionMode::Fse);
        assert_eq!(CompressionMode::from_bits(3), CompressionMode::Repeat);
    }

    #[test]
    fn test_parse_zero_sequences() {
        let data = [0];
        let header = parse_sequences_header(&data).unwrap();
        assert_eq!(header.num_sequences, 0);
        assert_eq!(header.header_size, 1);
    }

    #[test]
    fn test_parse_small_sequence_count() {
        let data = [10, 0b0000_0000];
        let header = parse_sequences_header(&data).unwrap();
        assert_eq!(header.num_sequences, 10);
        assert_eq!(header.ll_mode, CompressionMode::Predefined);
        assert_eq!(header.of_mode, CompressionMode::Predefined);
        assert_eq!(header.ml_mode, CompressionMode::Predefined);
    }

    #[test]
    fn test_parse_mid_range_sequence_count() {
        // 128 <= byte0 < 255: count = ((byte0-128)<<8) + byte1
        let data = [200u8, 0x10, 0b0000_0000];
        let header = parse_sequences_header(&data).unwrap();
        assert_eq!(header.num_sequences, ((200 - 128) << 8) + 0x10);
    }

    #[test]
    fn test_reserved_mode_bits_rejected() {
        let data = [5u8, 0b0000_0001];
        assert!(parse_sequences_header(&data).is_err());
    }

    #[test]
    fn test_predefined_tables_build() {
        assert_eq!(predefined_ll_table().accuracy_log(), 6);
        assert_eq!(predefined_of_table().accuracy_log(), 5);
        assert_eq!(predefined_ml_table().accuracy_log(), 6);
    }

    #[test]
    fn test_repeat_without_prior_table_fails() {
        let mut decoder = SequencesDecoder::new();
        let result = decoder.setup_table(Component::LiteralLength, &[], CompressionMode::Repeat);
        assert!(result.is_err());
    }

    #[test]
    fn test_rle_mode_consumes_one_byte() {
        let mut decoder = SequencesDecoder::new();
        let consumed = decoder
            .setup_table(Component::Offset, &[7], CompressionMode::Rle)
            .unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(decoder.of_table.as_ref().unwrap().get(0).symbol, 7);
    }
}
