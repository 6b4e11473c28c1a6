//! End-to-end behavior over the public API: the properties that must
//! hold regardless of which path produced a compressed stream, plus a
//! handful of byte-exact fixtures exercising the entropy decoders.

mod common;

use common::{rle_frame, raw_frame, skippable_frame};
use zstdcore::{decompress_to_vec, decompress_to_vec_with_dict, get_decompressed_size};

#[test]
fn round_trip_raw_block() {
    let content = b"the quick brown fox jumps over the lazy dog".to_vec();
    let frame = raw_frame(&content);
    let out = decompress_to_vec(&frame).unwrap();
    assert_eq!(out, content);
}

#[test]
fn round_trip_rle_block() {
    let frame = rle_frame(0x5A, 4096);
    let out = decompress_to_vec(&frame).unwrap();
    assert_eq!(out.len(), 4096);
    assert!(out.iter().all(|&b| b == 0x5A));
}

#[test]
fn concatenated_frames_decode_in_order() {
    let mut data = raw_frame(b"first");
    data.extend(raw_frame(b"second"));
    data.extend(rle_frame(b'!', 3));
    let out = decompress_to_vec(&data).unwrap();
    assert_eq!(out, b"firstsecond!!!");
}

#[test]
fn skippable_frames_are_transparent() {
    let mut data = skippable_frame(0x3, b"vendor metadata, ignored entirely");
    data.extend(raw_frame(b"payload"));
    let mut trailing = data.clone();
    trailing.extend(skippable_frame(0x0, b"trailer"));

    assert_eq!(decompress_to_vec(&data).unwrap(), b"payload");
    assert_eq!(decompress_to_vec(&trailing).unwrap(), b"payload");
}

#[test]
fn get_decompressed_size_sums_across_frames() {
    let mut data = raw_frame(b"abc");
    data.extend(rle_frame(b'x', 10));
    assert_eq!(get_decompressed_size(&data), Some(13));
}

#[test]
fn dictionary_id_mismatch_fails_before_emitting_output() {
    // Frame header declares dict_id=9; a raw-content dictionary blob has
    // no id of its own (treated as 0), so the two must not match.
    let mut data = vec![0x28, 0xB5, 0x2F, 0xFD];
    data.push(0x21); // single segment, dict_id_flag=1 (1 byte)
    data.push(9); // dict id
    data.push(5); // content size
    data.extend_from_slice(&[0x29, 0x00, 0x00]); // block header: last, raw, size 5
    data.extend_from_slice(b"hello");

    let dict_bytes = b"some dictionary content".to_vec();

    let result = decompress_to_vec_with_dict(&data, &dict_bytes);
    assert!(result.is_err());
}

/// Two compressed blocks in one frame: the first carries a fresh Huffman
/// tree over a two-symbol alphabet, the second is Treeless and reuses it.
/// Each block's single-byte bitstream is built from a hand-placed padding
/// sentinel bit plus real data bits below it, per the backward bit-reader
/// convention; the final read in each stream lands on an implicit zero
/// bit past the real data, which the tree's first canonical code (symbol
/// 0) absorbs.
#[test]
fn treeless_literals_reuse_the_previous_blocks_huffman_tree() {
    let data: [u8; 24] = [
        0x28, 0xB5, 0x2F, 0xFD, // magic
        0x20, 0x08, // single segment, content size = 8
        0x3C, 0x00, 0x00, // block 1 header: not last, compressed, size 7
        0x42, 0xC0, 0x00, // literals header: new huffman tree, regen=4, comp=3
        0x80, 0x10, // direct-representation table, one explicit weight (1)
        0x0D, // bitstream: real bits 1,0,1 then an implicit 0
        0x00, // sequences: count=0
        0x2D, 0x00, 0x00, // block 2 header: last, compressed, size 5
        0x43, 0x40, 0x00, // literals header: treeless, regen=4, comp=1
        0x0A, // bitstream: real bits 0,1,0 then an implicit 0
        0x00, // sequences: count=0
    ];
    let out = decompress_to_vec(&data).unwrap();
    assert_eq!(out, [0x01, 0x00, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00]);
}

/// A genuine formatted-dictionary blob: magic, dict id, a real
/// direct-representation Huffman table (one explicit weight), three real
/// FSE table descriptions in the on-wire offset/match-length/literal-length
/// order, three starting offset-history values, and raw content. Unlike
/// `frame.rs`'s own dictionary test (which builds a `Dictionary` struct
/// literal directly), this goes through `Dictionary::parse` itself.
fn formatted_dictionary() -> Vec<u8> {
    let mut data = vec![0x37, 0xA4, 0x30, 0xEC]; // dictionary magic
    data.extend_from_slice(&42u32.to_le_bytes()); // dict id
    data.extend_from_slice(&[0x80, 0x10]); // huffman: one explicit weight (1)
    data.extend_from_slice(&[0xF0, 0x03]); // offset fse table (single symbol)
    data.extend_from_slice(&[0xF0, 0x03]); // match-length fse table
    data.extend_from_slice(&[0xF0, 0x03]); // literal-length fse table
    data.extend_from_slice(&5u32.to_le_bytes()); // offset history slot 1
    data.extend_from_slice(&7u32.to_le_bytes()); // offset history slot 2
    data.extend_from_slice(&11u32.to_le_bytes()); // offset history slot 3
    data.extend_from_slice(b"0123456789ABCDEF"); // raw content, 16 bytes
    data
}

/// Round-trips a frame against a real formatted dictionary, exercising
/// `Repeat` mode on all three sequence components and `Treeless` literals
/// reusing the dictionary's own Huffman tree.
///
/// Each of the dictionary's three FSE tables is a single-symbol (always
/// decodes symbol 0) table, so the block's one sequence comes out as
/// literal_length=0, raw offset=1, match_length=3. With literal_length==0
/// the repeat-offset index is raw_offset+1 = 2, which reads offset-history
/// slot two (value 7); since nothing has been emitted yet in this frame,
/// that reference resolves entirely against the dictionary's raw content
/// (bytes "9AB" at content offset 7 from the end), and the two literal
/// bytes the Huffman stream regenerates ([1, 0]) trail after it.
#[test]
fn formatted_dictionary_repeat_mode_round_trip() {
    let dict = formatted_dictionary();

    let data: [u8; 18] = [
        0x28, 0xB5, 0x2F, 0xFD, // magic
        0x21, 0x2A, 0x05, // single segment, dict id = 42, content size = 5
        0x45, 0x00, 0x00, // block header: last, compressed, size 8
        0x23, 0x40, 0x00, 0x03, // literals: treeless, regen=2, comp=1, stream byte
        0x01, 0xFC, 0x00, 0x80, // sequences: count=1, all-repeat modes, bitstream
    ];

    let out = decompress_to_vec_with_dict(&data, &dict).unwrap();
    assert_eq!(out, [0x39, 0x41, 0x42, 0x01, 0x00]);
}
