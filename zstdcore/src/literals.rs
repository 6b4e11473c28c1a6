//! Literals section decoding for Zstandard.
//!
//! The literals section contains literal bytes that are copied directly
//! to the output, either uncompressed or Huffman-encoded.

use crate::LiteralsBlockType;
use crate::huffman::{HuffmanTable, decode_stream, read_huffman_table};
use std::rc::Rc;
use zstdcore_base::error::{Result, ZstdCoreError};

/// Maximum regenerated size of a literals section (128 KiB).
pub const MAX_LITERALS_SIZE: usize = 128 * 1024;

/// Decoded literals section header.
#[derive(Debug)]
pub struct LiteralsHeader {
    /// Block type.
    pub block_type: LiteralsBlockType,
    /// Regenerated (uncompressed) size.
    pub regenerated_size: usize,
    /// Compressed size (for compressed types).
    pub compressed_size: usize,
    /// Number of streams (1 or 4).
    pub num_streams: usize,
    /// Header size in bytes.
    pub header_size: usize,
}

/// Parse literals section header.
pub fn parse_literals_header(data: &[u8]) -> Result<LiteralsHeader> {
    if data.is_empty() {
        return Err(ZstdCoreError::eof(1, 0));
    }

    let byte0 = data[0];
    let block_type = LiteralsBlockType::from_bits(byte0 & 0x03);
    let size_format = (byte0 >> 2) & 0x03;

    let header = match block_type {
        LiteralsBlockType::Raw | LiteralsBlockType::Rle => {
            let (regenerated_size, header_size) = match size_format {
                0 | 2 => ((byte0 >> 3) as usize, 1),
                1 => {
                    if data.len() < 2 {
                        return Err(ZstdCoreError::eof(2, data.len()));
                    }
                    let size = ((byte0 >> 4) as usize) | ((data[1] as usize) << 4);
                    (size, 2)
                }
                3 => {
                    if data.len() < 3 {
                        return Err(ZstdCoreError::eof(3, data.len()));
                    }
                    let size = ((byte0 >> 4) as usize)
                        | ((data[1] as usize) << 4)
                        | ((data[2] as usize) << 12);
                    (size, 3)
                }
                _ => unreachable!(),
            };

            LiteralsHeader {
                block_type,
                regenerated_size,
                compressed_size: if block_type == LiteralsBlockType::Rle {
                    1
                } else {
                    regenerated_size
                },
                num_streams: 1,
                header_size,
            }
        }
        LiteralsBlockType::Compressed | LiteralsBlockType::Treeless => {
            let (regenerated_size, compressed_size, num_streams, header_size) = match size_format
            {
                0 => {
                    if data.len() < 3 {
                        return Err(ZstdCoreError::eof(3, data.len()));
                    }
                    let combined =
                        ((byte0 >> 4) as u32) | ((data[1] as u32) << 4) | ((data[2] as u32) << 12);
                    let regen = (combined & 0x3FF) as usize;
                    let comp = ((combined >> 10) & 0x3FF) as usize;
                    (regen, comp, 1, 3)
                }
                1 => {
                    if data.len() < 3 {
                        return Err(ZstdCoreError::eof(3, data.len()));
                    }
                    let combined =
                        ((byte0 >> 4) as u32) | ((data[1] as u32) << 4) | ((data[2] as u32) << 12);
                    let regen = (combined & 0x3FF) as usize;
                    let comp = ((combined >> 10) & 0x3FF) as usize;
                    (regen, comp, 4, 3)
                }
                2 => {
                    if data.len() < 4 {
                        return Err(ZstdCoreError::eof(4, data.len()));
                    }
                    let combined = ((byte0 >> 4) as u32)
                        | ((data[1] as u32) << 4)
                        | ((data[2] as u32) << 12)
                        | ((data[3] as u32) << 20);
                    let regen = (combined & 0x3FFF) as usize;
                    let comp = ((combined >> 14) & 0x3FFF) as usize;
                    (regen, comp, 4, 4)
                }
                3 => {
                    if data.len() < 5 {
                        return Err(ZstdCoreError::eof(5, data.len()));
                    }
                    let combined = ((byte0 >> 4) as u64)
                        | ((data[1] as u64) << 4)
                        | ((data[2] as u64) << 12)
                        | ((data[3] as u64) << 20)
                        | ((data[4] as u64) << 28);
                    let regen = (combined & 0x3FFFF) as usize;
                    let comp = ((combined >> 18) & 0x3FFFF) as usize;
                    (regen, comp, 4, 5)
                }
                _ => unreachable!(),
            };

            LiteralsHeader {
                block_type,
                regenerated_size,
                compressed_size,
                num_streams,
                header_size,
            }
        }
    };

    if header.regenerated_size > MAX_LITERALS_SIZE {
        return Err(ZstdCoreError::size_invalid(
            "literals regenerated size exceeds 128 KiB",
        ));
    }
    if header.block_type == LiteralsBlockType::Compressed
        || header.block_type == LiteralsBlockType::Treeless
    {
        if header.compressed_size > header.regenerated_size {
            return Err(ZstdCoreError::size_invalid(
                "literals compressed size exceeds regenerated size",
            ));
        }
    }

    Ok(header)
}

/// Literals decoder state: carries the last-used Huffman table across
/// blocks within a frame, for `Treeless` ("repeat tree") literals.
///
/// The table is reference-counted so that a dictionary's precomputed tree
/// can be shared into a frame without a deep copy; the table is only ever
/// replaced outright (on a non-`Treeless` block), never mutated in place,
/// so sharing is always safe.
pub struct LiteralsDecoder {
    huffman_table: Option<Rc<HuffmanTable>>,
}

impl LiteralsDecoder {
    /// Create a new literals decoder with no prior table.
    pub fn new() -> Self {
        Self {
            huffman_table: None,
        }
    }

    /// Create a literals decoder seeded with a dictionary's precomputed
    /// Huffman table, so the first block in a frame may use `Treeless`
    /// mode against the dictionary's tree.
    pub fn with_table(table: Rc<HuffmanTable>) -> Self {
        Self {
            huffman_table: Some(table),
        }
    }

    /// Decode one literals section, returning the literal bytes and the
    /// number of input bytes consumed (header + payload).
    pub fn decode(&mut self, data: &[u8]) -> Result<(Vec<u8>, usize)> {
        let header = parse_literals_header(data)?;
        let content = &data[header.header_size..];

        match header.block_type {
            LiteralsBlockType::Raw => {
                if content.len() < header.regenerated_size {
                    return Err(ZstdCoreError::eof(header.regenerated_size, content.len()));
                }
                let literals = content[..header.regenerated_size].to_vec();
                Ok((literals, header.header_size + header.regenerated_size))
            }
            LiteralsBlockType::Rle => {
                if content.is_empty() {
                    return Err(ZstdCoreError::eof(1, 0));
                }
                let literals = vec![content[0]; header.regenerated_size];
                Ok((literals, header.header_size + 1))
            }
            LiteralsBlockType::Compressed => {
                if content.len() < header.compressed_size {
                    return Err(ZstdCoreError::eof(header.compressed_size, content.len()));
                }

                let (table, table_size) = read_huffman_table(content)?;
                self.huffman_table = Some(Rc::new(table));

                let stream_data = &content[table_size..header.compressed_size];
                let literals = self.decode_huffman_streams(
                    stream_data,
                    header.regenerated_size,
                    header.num_streams,
                )?;

                Ok((literals, header.header_size + header.compressed_size))
            }
            LiteralsBlockType::Treeless => {
                if self.huffman_table.is_none() {
                    return Err(ZstdCoreError::table_malformed(
                        "treeless literals without a previously transmitted tree",
                    ));
                }
                if content.len() < header.compressed_size {
                    return Err(ZstdCoreError::eof(header.compressed_size, content.len()));
                }

                let stream_data = &content[..header.compressed_size];
                let literals = self.decode_huffman_streams(
                    stream_data,
                    header.regenerated_size,
                    header.num_streams,
                )?;

                Ok((literals, header.header_size + header.compressed_size))
            }
        }
    }

    fn decode_huffman_streams(
        &self,
        data: &[u8],
        total_size: usize,
        num_streams: usize,
    ) -> Result<Vec<u8>> {
        let table = self
            .huffman_table
            .as_ref()
            .ok_or_else(|| ZstdCoreError::table_malformed("no huffman table available"))?;

        if num_streams == 1 {
            decode_single_stream(data, total_size, table)
        } else {
            decode_four_streams(data, total_size, table)
        }
    }
}

impl Default for LiteralsDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a single Huffman stream of `size` output bytes.
fn decode_single_stream(data: &[u8], size: usize, table: &HuffmanTable) -> Result<Vec<u8>> {
    let mut output = vec![0u8; size];
    decode_stream(table, data, &mut output)?;
    Ok(output)
}

/// Decode four interleaved Huffman streams via the jump table.
fn decode_four_streams(data: &[u8], total_size: usize, table: &HuffmanTable) -> Result<Vec<u8>> {
    if data.len() < 6 {
        return Err(ZstdCoreError::eof(6, data.len()));
    }

    let jump1 = u16::from_le_bytes([data[0], data[1]]) as usize;
    let jump2 = u16::from_le_bytes([data[2], data[3]]) as usize;
    let jump3 = u16::from_le_bytes([data[4], data[5]]) as usize;

    let stream_data = &data[6..];

    if jump1 > stream_data.len() || jump2 > stream_data.len() || jump3 > stream_data.len() {
        return Err(ZstdCoreError::size_invalid("invalid stream jump offsets"));
    }
    if jump1 > jump2 || jump2 > jump3 {
        return Err(ZstdCoreError::size_invalid("stream jump offsets not ordered"));
    }

    let stream1 = &stream_data[..jump1];
    let stream2 = &stream_data[jump1..jump2];
    let stream3 = &stream_data[jump2..jump3];
    let stream4 = &stream_data[jump3..];

    let quarter = total_size.div_ceil(4);
    let size4 = total_size - quarter.saturating_mul(3).min(total_size);

    let mut output = Vec::with_capacity(total_size);
    output.extend(decode_single_stream(stream1, quarter, table)?);
    output.extend(decode_single_stream(stream2, quarter, table)?);
    output.extend(decode_single_stream(stream3, quarter, table)?);
    output.extend(decode_single_stream(stream4, size4, table)?);

    Ok(output)
}
