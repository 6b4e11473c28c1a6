//! Huffman coding for Zstandard literals.
//!
//! Zstandard uses canonical Huffman coding for literal compression.
//! Maximum code length is 11 bits.

use crate::fse::{
    FseBitReader, decode_interleaved_weights, read_fse_table_description,
    MAX_HUFFMAN_WEIGHT_ACCURACY_LOG,
};
use zstdcore_base::error::{Result, ZstdCoreError};

/// Maximum Huffman code length in Zstandard.
pub const MAX_CODE_LENGTH: u8 = 11;

/// Maximum number of symbols (byte values).
pub const MAX_SYMBOLS: usize = 256;

/// Huffman decoding table entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct HuffmanEntry {
    /// Decoded symbol.
    pub symbol: u8,
    /// Number of bits for this code.
    pub num_bits: u8,
}

/// Huffman decoding table.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    /// Decoding entries indexed by prefix.
    entries: Vec<HuffmanEntry>,
    /// Table depth (max code length actually used).
    depth: u8,
}

impl HuffmanTable {
    /// Build a decoding table from a list of symbol weights, where the
    /// last symbol's weight is *not* included in `explicit_weights` and is
    /// deduced so the rank sum is a power of two (spec.md §4.5).
    pub fn from_explicit_weights(explicit_weights: &[u8]) -> Result<Self> {
        if explicit_weights.is_empty() || explicit_weights.len() >= MAX_SYMBOLS {
            return Err(ZstdCoreError::size_invalid(
                "huffman symbol count out of range",
            ));
        }

        let mut rank_sum = 0u32;
        for &w in explicit_weights {
            if w > 0 {
                rank_sum += 1u32 << (w - 1);
            }
        }
        if rank_sum == 0 {
            return Err(ZstdCoreError::table_malformed(
                "huffman weights sum to zero",
            ));
        }

        // B (table_bound below) must be *strictly* greater than rank_sum,
        // even when rank_sum is itself already a power of two.
        let depth = 32 - rank_sum.leading_zeros();
        let depth = depth.min(MAX_CODE_LENGTH as u32) as u8;
        let table_bound = 1u32 << depth;

        let missing = table_bound - rank_sum;
        if missing == 0 || !missing.is_power_of_two() {
            return Err(ZstdCoreError::table_malformed(
                "huffman last weight is not a power of two",
            ));
        }
        let last_weight = (32 - missing.leading_zeros()) as u8; // log2(missing) + 1

        let mut weights = Vec::with_capacity(explicit_weights.len() + 1);
        weights.extend_from_slice(explicit_weights);
        weights.push(last_weight);

        Self::from_weights(&weights, depth)
    }

    /// Build a decoding table from a complete list of weights (one per
    /// symbol, including the deduced last one) and the already-computed
    /// table depth.
    fn from_weights(weights: &[u8], depth: u8) -> Result<Self> {
        let table_size = 1usize << depth;
        let mut entries = vec![HuffmanEntry::default(); table_size];

        // Rank-based two-pass canonical build: count symbols per code
        // length, derive each length's starting slot, then assign
        // contiguous slots to symbols in ascending symbol order within a
        // rank. This is the order the reference table builder actually
        // produces (processing symbols by increasing weight / increasing
        // code length, original symbol index as the tiebreaker).
        let mut rank_count = [0u32; MAX_CODE_LENGTH as usize + 2];
        let mut code_length = vec![0u8; weights.len()];
        for (symbol, &weight) in weights.iter().enumerate() {
            if weight > 0 {
                let len = depth + 1 - weight;
                code_length[symbol] = len;
                rank_count[len as usize] += 1;
            }
        }

        let mut rank_start = [0u32; MAX_CODE_LENGTH as usize + 2];
        let mut total_slots = 0u32;
        for len in (1..=depth as usize).rev() {
            rank_start[len] = total_slots;
            total_slots += rank_count[len] * (1u32 << (depth as usize - len));
        }
        if total_slots != table_size as u32 {
            return Err(ZstdCoreError::table_malformed(
                "huffman rank slot sum does not cover the table",
            ));
        }

        for (symbol, &len) in code_length.iter().enumerate() {
            if len == 0 {
                continue;
            }
            let slots = 1u32 << (depth - len);
            let base = rank_start[len as usize] as usize;
            for entry in entries.iter_mut().skip(base).take(slots as usize) {
                *entry = HuffmanEntry {
                    symbol: symbol as u8,
                    num_bits: len,
                };
            }
            rank_start[len as usize] += slots;
        }

        Ok(Self { entries, depth })
    }

    /// Look up the table entry for the current `depth`-bit reader state.
    #[inline]
    pub fn decode(&self, state: u32) -> &HuffmanEntry {
        let idx = state as usize & ((1 << self.depth) - 1);
        &self.entries[idx]
    }

    /// Table depth (bits of lookahead required).
    pub fn depth(&self) -> u8 {
        self.depth
    }
}

/// Read a Huffman table description, returning the table and bytes consumed.
pub fn read_huffman_table(data: &[u8]) -> Result<(HuffmanTable, usize)> {
    if data.is_empty() {
        return Err(ZstdCoreError::eof(1, 0));
    }

    if data[0] >= 128 {
        read_huffman_table_direct(data)
    } else {
        read_huffman_table_fse(data)
    }
}

/// Read a Huffman table with direct 4-bit weights (header byte >= 128).
fn read_huffman_table_direct(data: &[u8]) -> Result<(HuffmanTable, usize)> {
    let header = data[0];
    let explicit_count = (header - 127) as usize;

    if explicit_count == 0 || explicit_count >= MAX_SYMBOLS {
        return Err(ZstdCoreError::size_invalid(
            "invalid explicit huffman weight count",
        ));
    }

    let bytes_needed = explicit_count.div_ceil(2);
    if data.len() < 1 + bytes_needed {
        return Err(ZstdCoreError::eof(1 + bytes_needed, data.len()));
    }

    let mut weights = vec![0u8; explicit_count];
    for (i, weight) in weights.iter_mut().enumerate() {
        let byte_idx = 1 + i / 2;
        *weight = if i % 2 == 0 {
            data[byte_idx] >> 4
        } else {
            data[byte_idx] & 0x0F
        };
    }

    let table = HuffmanTable::from_explicit_weights(&weights)?;
    Ok((table, 1 + bytes_needed))
}

/// Read a Huffman table with FSE-compressed weights (header byte < 128).
fn read_huffman_table_fse(data: &[u8]) -> Result<(HuffmanTable, usize)> {
    let compressed_size = data[0] as usize;
    if compressed_size == 0 {
        return Err(ZstdCoreError::size_invalid(
            "zero-length fse-compressed huffman weights",
        ));
    }
    if data.len() < 1 + compressed_size {
        return Err(ZstdCoreError::eof(1 + compressed_size, data.len()));
    }

    let fse_data = &data[1..1 + compressed_size];

    // Weight values range 0..=11 (code lengths up to MAX_CODE_LENGTH), so
    // the weight alphabet's max symbol is 11; the FSE table itself is
    // capped at MAX_HUFFMAN_WEIGHT_ACCURACY_LOG rather than the sequence
    // tables' higher ceiling.
    let (fse_table, fse_bytes) =
        read_fse_table_description(fse_data, 11, MAX_HUFFMAN_WEIGHT_ACCURACY_LOG)?;

    let bitstream_data = &fse_data[fse_bytes..];
    let mut reader = FseBitReader::new(bitstream_data)?;
    let weights = decode_interleaved_weights(&fse_table, &mut reader);

    if weights.is_empty() {
        return Err(ZstdCoreError::table_malformed(
            "no huffman weights decoded from fse stream",
        ));
    }

    let table = HuffmanTable::from_explicit_weights(&weights)?;
    Ok((table, 1 + compressed_size))
}

/// Decode a single Huffman-compressed stream into `output`.
///
/// Uses the incremental shift-state form: the reader state always holds
/// `table.depth()` bits of lookahead; each step looks up the symbol for
/// the current state, consumes that symbol's code length, and the next
/// `peek` naturally includes the freshly shifted-in bits.
pub fn decode_stream(table: &HuffmanTable, data: &[u8], output: &mut [u8]) -> Result<()> {
    if output.is_empty() {
        return Ok(());
    }

    let mut reader = FseBitReader::new(data)?;
    let depth = table.depth();

    for out_byte in output.iter_mut() {
        let state = reader.peek_bits(depth);
        let entry = table.decode(state);
        reader.consume(entry.num_bits);
        *out_byte = entry.symbol;
    }

    // The bit cursor must land exactly `depth` bits past the true start of
    // the stream (the initial full-depth peek that was never "consumed"
    // past the real data): bits_remaining == -depth.
    if reader.bits_remaining() != -(depth as i64) {
        return Err(ZstdCoreError::desync(
            "huffman stream did not terminate at -depth bits",
        ));
    }

    Ok(())
}
