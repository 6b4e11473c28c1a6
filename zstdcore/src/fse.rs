//! Finite State Entropy (FSE) codec.
//!
//! FSE is the table-driven entropy coder Zstandard uses for literal-length,
//! match-length, and offset codes, and for Huffman weight tables.

use std::io::Cursor;
use zstdcore_base::bitstream::BitReader;
use zstdcore_base::error::{Result, ZstdCoreError};

/// Maximum accuracy log for sequence FSE tables.
pub const MAX_ACCURACY_LOG: u8 = 9;

/// Maximum accuracy log for the Huffman-weight FSE table.
///
/// The wire spec's field width would allow up to 6, but the reference
/// decoder's weight-table reader actually enforces 7 as the ceiling; this
/// crate follows the reference's actual behavior.
pub const MAX_HUFFMAN_WEIGHT_ACCURACY_LOG: u8 = 7;

/// Maximum number of symbols.
pub const MAX_SYMBOLS: usize = 256;

/// FSE decoding table entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct FseTableEntry {
    /// Symbol to emit.
    pub symbol: u8,
    /// Number of bits to read for next state.
    pub num_bits: u8,
    /// Baseline for calculating next state.
    pub baseline: u16,
}

/// FSE decoding table.
#[derive(Debug, Clone)]
pub struct FseTable {
    /// Table entries indexed by state.
    entries: Vec<FseTableEntry>,
    /// Accuracy log (table size = 1 << accuracy_log).
    accuracy_log: u8,
}

impl FseTable {
    /// Build a decoding table from normalized symbol probabilities.
    ///
    /// `probabilities[s] == -1` marks a "less than one" symbol, reserved a
    /// single slot at the high end of the table.
    pub fn new(accuracy_log: u8, probabilities: &[i16]) -> Result<Self> {
        if accuracy_log == 0 || accuracy_log > MAX_ACCURACY_LOG {
            return Err(ZstdCoreError::size_invalid("fse accuracy log out of range"));
        }

        let table_size = 1usize << accuracy_log;
        let table_mask = table_size - 1;

        // Scratch: symbol occupying each table position, before nbBits/baseline
        // are known. `symbol_next` doubles as a per-symbol rank counter: first
        // the count/1 of states owed to that symbol, then (second pass) the
        // running "next free rank" used to compute each entry's baseline.
        let mut symbols = vec![0u8; table_size];
        let mut symbol_next = vec![0u32; probabilities.len()];

        let mut high_threshold = table_size - 1;
        for (s, &prob) in probabilities.iter().enumerate() {
            if prob == -1 {
                symbols[high_threshold] = s as u8;
                high_threshold -= 1;
                symbol_next[s] = 1;
            } else if prob > 0 {
                symbol_next[s] = prob as u32;
            }
        }

        let step = (table_size >> 1) + (table_size >> 3) + 3;
        let mut position = 0usize;
        for (s, &prob) in probabilities.iter().enumerate() {
            if prob <= 0 {
                continue;
            }
            for _ in 0..prob {
                symbols[position] = s as u8;
                loop {
                    position = (position + step) & table_mask;
                    if position <= high_threshold {
                        break;
                    }
                }
            }
        }
        if position != 0 {
            return Err(ZstdCoreError::table_malformed(
                "fse symbol scatter did not return to position 0",
            ));
        }

        let mut entries = vec![FseTableEntry::default(); table_size];
        for (u, entry) in entries.iter_mut().enumerate() {
            let symbol = symbols[u];
            let next_state = symbol_next[symbol as usize];
            symbol_next[symbol as usize] += 1;
            let num_bits = accuracy_log - highest_bit_set(next_state as u16);
            entry.symbol = symbol;
            entry.num_bits = num_bits;
            entry.baseline = ((next_state << num_bits) as i64 - table_size as i64) as u16;
        }

        Ok(Self {
            entries,
            accuracy_log,
        })
    }

    /// Build a 1-entry RLE table: always emits `symbol`, consumes 0 bits.
    pub fn rle(symbol: u8) -> Self {
        Self {
            entries: vec![FseTableEntry {
                symbol,
                num_bits: 0,
                baseline: 0,
            }],
            accuracy_log: 0,
        }
    }

    /// Get table entry for a given state.
    #[inline]
    pub fn get(&self, state: usize) -> &FseTableEntry {
        &self.entries[state]
    }

    /// Get the accuracy log.
    pub fn accuracy_log(&self) -> u8 {
        self.accuracy_log
    }

    /// Get the table size.
    pub fn size(&self) -> usize {
        self.entries.len()
    }
}

/// Backward bitstream reader shared by FSE state decode and Huffman decode.
///
/// Zstandard's entropy-coded payloads are read from the end of the buffer
/// toward the start; the highest set bit of the last byte is a padding
/// sentinel, not data. `peek_bits`/`consume` are kept separate so callers
/// can look up a table entry before knowing how many bits that entry
/// consumes.
pub struct FseBitReader<'a> {
    /// Input bytes (read backwards).
    data: &'a [u8],
    /// Unread bits remaining in `data`, counted from the front.
    bit_pos: usize,
    /// Accumulated bits, LSB-first.
    bits: u64,
    /// Number of valid bits in the accumulator.
    bits_count: u8,
    /// Total data bits available (excludes padding and sentinel).
    total_bits: i64,
    /// Bits consumed so far; may exceed `total_bits` once the stream runs
    /// into its zero-filled tail.
    consumed: i64,
}

impl<'a> FseBitReader<'a> {
    /// Create a new FSE bit reader positioned at the end of `data`.
    ///
    /// The last byte's own real data bits (everything below its highest set
    /// bit, the padding sentinel) are loaded directly here, since they don't
    /// make up a whole byte and `refill` only ever pulls whole bytes.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(ZstdCoreError::eof(1, 0));
        }

        let last_byte = data[data.len() - 1];
        if last_byte == 0 {
            return Err(ZstdCoreError::table_malformed(
                "fse bitstream missing padding sentinel",
            ));
        }

        let sentinel_pos = highest_bit_set(last_byte as u16);
        let last_byte_data_bits = sentinel_pos;
        let total_bits = ((data.len() - 1) * 8) as i64 + last_byte_data_bits as i64;

        let mut reader = Self {
            data,
            bit_pos: (data.len() - 1) * 8,
            bits: (last_byte as u64) & ((1u64 << last_byte_data_bits) - 1),
            bits_count: last_byte_data_bits,
            total_bits,
            consumed: 0,
        };
        reader.refill();
        Ok(reader)
    }

    /// Refill the bit buffer with whole bytes below the current cursor.
    fn refill(&mut self) {
        while self.bits_count <= 56 && self.bit_pos >= 8 {
            self.bit_pos -= 8;
            let byte_idx = self.bit_pos / 8;
            self.bits |= (self.data[byte_idx] as u64) << self.bits_count;
            self.bits_count += 8;
        }
    }

    /// Peek `n` bits without consuming them. Once the stream is exhausted,
    /// phantom bits read as zero.
    #[inline]
    pub fn peek_bits(&mut self, n: u8) -> u32 {
        if n == 0 {
            return 0;
        }
        self.refill();
        let mask = (1u64 << n) - 1;
        (self.bits & mask) as u32
    }

    /// Consume `n` bits previously returned by `peek_bits`.
    #[inline]
    pub fn consume(&mut self, n: u8) {
        if n == 0 {
            return;
        }
        self.bits >>= n;
        self.bits_count = self.bits_count.saturating_sub(n);
        self.consumed += n as i64;
    }

    /// Read and consume `n` bits in one step.
    #[inline]
    pub fn read_bits(&mut self, n: u8) -> u32 {
        let value = self.peek_bits(n);
        self.consume(n);
        value
    }

    /// Bits remaining before the stream runs into its zero-filled tail.
    /// Goes negative once phantom bits have been consumed.
    pub fn bits_remaining(&self) -> i64 {
        self.total_bits - self.consumed
    }

    /// True once every real bit has been consumed (remaining <= 0).
    pub fn is_empty(&self) -> bool {
        self.bits_remaining() <= 0
    }
}

/// FSE decoder state machine.
///
/// `peek_symbol`/`update_state` are split so that Zstandard's sequence
/// decoder can peek the current symbol for all three interleaved FSE
/// states before any of them advances (the extra bits consumed in between
/// depend on the peeked symbol's code, but state advancement must happen
/// in a fixed order afterward).
pub struct FseDecoder<'a> {
    table: &'a FseTable,
    state: usize,
}

impl<'a> FseDecoder<'a> {
    /// Create a new decoder, initializing state by reading `accuracy_log` bits.
    pub fn new(table: &'a FseTable, reader: &mut FseBitReader) -> Self {
        let state = reader.read_bits(table.accuracy_log()) as usize;
        Self { table, state }
    }

    /// Peek at the current symbol without advancing state.
    pub fn peek_symbol(&self) -> u8 {
        self.table.get(self.state).symbol
    }

    /// Number of bits `update_state` will consume for the current state.
    pub fn update_bits(&self) -> u8 {
        self.table.get(self.state).num_bits
    }

    /// Advance to the next state by consuming this state's bits.
    pub fn update_state(&mut self, reader: &mut FseBitReader) {
        let entry = self.table.get(self.state);
        let bits = reader.read_bits(entry.num_bits);
        self.state = entry.baseline as usize + bits as usize;
    }

    /// Decode one symbol and advance: equivalent to `peek_symbol` followed
    /// by `update_state`. Only valid when nothing else needs to read bits
    /// between the peek and the state update (true for the Huffman-weight
    /// decode, not for Zstandard sequences).
    pub fn decode(&mut self, reader: &mut FseBitReader) -> u8 {
        let symbol = self.peek_symbol();
        self.update_state(reader);
        symbol
    }
}

/// Decode a Huffman weight table compressed with two interleaved FSE states.
///
/// Two states are initialized from the tail of the bitstream and decoded
/// alternately (state1, state2, state1, ...). The moment consuming a
/// state's bits would read past the real data into the zero-filled tail,
/// that symbol is kept as the last one and decoding stops.
pub fn decode_interleaved_weights(table: &FseTable, reader: &mut FseBitReader) -> Vec<u8> {
    let mut state1 = FseDecoder::new(table, reader);
    let mut state2 = FseDecoder::new(table, reader);
    let mut weights = Vec::with_capacity(MAX_SYMBOLS);

    loop {
        weights.push(state1.peek_symbol());
        state1.update_state(reader);
        if reader.is_empty() || weights.len() >= MAX_SYMBOLS {
            break;
        }

        weights.push(state2.peek_symbol());
        state2.update_state(reader);
        if reader.is_empty() || weights.len() >= MAX_SYMBOLS {
            break;
        }
    }

    weights
}

/// Read an FSE table description from a forward (LSB-first) bitstream,
/// returning the built table and the number of bytes consumed.
///
/// Uses the shared [`zstdcore_base::bitstream::BitReader`] — this header is
/// the one place in the decoder that reads a forward bitstream, as opposed
/// to the backward-read entropy-coded payloads `FseBitReader` handles.
pub fn read_fse_table_description(
    data: &[u8],
    max_symbol: u8,
    max_accuracy_log: u8,
) -> Result<(FseTable, usize)> {
    if data.is_empty() {
        return Err(ZstdCoreError::eof(1, 0));
    }

    let mut reader = BitReader::new(Cursor::new(data));

    let accuracy_log = reader.read_bits(4)? as u8 + 5;
    if accuracy_log > max_accuracy_log {
        return Err(ZstdCoreError::size_invalid(
            "fse table accuracy log exceeds protocol maximum",
        ));
    }

    // Total probability mass plus one, per spec: starts at 2^accuracy_log + 1
    // and must land on exactly 1 when every symbol has been read.
    let mut remaining: i32 = (1i32 << accuracy_log) + 1;
    let mut probabilities: Vec<i16> = Vec::with_capacity(max_symbol as usize + 1);
    let mut symbol = 0u8;

    while remaining > 1 && symbol <= max_symbol {
        let width = highest_bit_set(remaining as u16) + 1;
        let low_bits_count = width - 1;
        let half = 1u32 << low_bits_count;

        let low_value = reader.read_bits(low_bits_count)?;
        let removal_threshold = (1u32 << width) - 1 - remaining as u32;

        let decoded_value = if low_value < removal_threshold {
            low_value
        } else {
            let high_bit = reader.read_bits(1)?;
            let combined = low_value | (high_bit << low_bits_count);
            if combined >= half {
                combined - removal_threshold
            } else {
                combined
            }
        };

        let prob: i16 = decoded_value as i16 - 1;
        probabilities.push(prob);

        if prob != 0 {
            remaining -= prob.unsigned_abs() as i32;
        }
        symbol += 1;

        if prob == 0 {
            loop {
                let repeat = reader.read_bits(2)?;
                probabilities.resize(probabilities.len() + repeat as usize, 0);
                symbol += repeat as u8;
                if repeat < 3 {
                    break;
                }
            }
        }
    }

    if remaining != 1 {
        return Err(ZstdCoreError::table_malformed(
            "fse header probability mass did not sum exactly",
        ));
    }
    if symbol as usize > max_symbol as usize + 1 {
        return Err(ZstdCoreError::size_invalid(
            "fse header symbol count exceeds maximum",
        ));
    }

    let bytes_consumed = (reader.bits_read() as usize).div_ceil(8);
    let table = FseTable::new(accuracy_log, &probabilities)?;

    Ok((table, bytes_consumed))
}

/// Find the position of the highest set bit (0-indexed from LSB).
#[inline]
fn highest_bit_set(value: u16) -> u8 {
    if value == 0 {
        0
    } else {
        15 - value.leading_zeros() as u8
    }
}

/// RLE mode table helper: builds the 1-entry table for a sequences
/// component whose mode byte selects RLE.
pub fn rle_table(symbol: u8) -> FseTable {
    FseTable::rle(symbol)
}
