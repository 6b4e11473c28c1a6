//! Error types for zstdcore operations.
//!
//! This module realizes the decoder's flat error taxonomy as a single
//! `thiserror`-derived enum. There is no recovery within the decoder:
//! any error from a primitive propagates to frame level and is final.

use thiserror::Error;

/// The error type returned by zstdcore decode operations.
#[derive(Debug, Error)]
pub enum ZstdCoreError {
    /// Input exhausted before a required field was fully read.
    #[error("unexpected end of input: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        /// Number of bytes the read required.
        needed: usize,
        /// Number of bytes actually remaining.
        available: usize,
    },

    /// Destination buffer cannot hold the decoded content.
    #[error("output buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available in the destination.
        available: usize,
    },

    /// The 4-byte frame magic did not match a data or skippable frame.
    #[error("invalid magic number: found {found:#010x}")]
    InvalidMagic {
        /// The 4 bytes actually read, as a little-endian u32.
        found: u32,
    },

    /// A reserved bit or field was nonzero, or a reserved enum value was used.
    #[error("reserved field set: {context}")]
    ReservedField {
        /// Which field was found set.
        context: &'static str,
    },

    /// A Huffman or FSE table failed a structural invariant.
    #[error("malformed table: {context}")]
    TableMalformed {
        /// Description of the failed invariant.
        context: &'static str,
    },

    /// A bit-reader cursor did not land where the format requires.
    #[error("bitstream desynchronized: {context}")]
    BitstreamDesync {
        /// Description of the expected vs. observed cursor position.
        context: &'static str,
    },

    /// A resolved back-reference offset fell outside the legal window.
    #[error("invalid offset {offset}: exceeds limit {limit}")]
    OffsetInvalid {
        /// The offset that was rejected.
        offset: u64,
        /// The maximum legal offset at that point.
        limit: u64,
    },

    /// A declared size violated a protocol limit.
    #[error("invalid size: {context}")]
    SizeInvalid {
        /// Description of which size and limit were violated.
        context: &'static str,
    },

    /// A table or buffer allocation was refused because the request
    /// exceeded a protocol-derived bound.
    #[error("allocation refused: requested {requested} bytes")]
    AllocationFailed {
        /// The size that was requested.
        requested: usize,
    },

    /// A frame named a dictionary id that does not match the supplied dictionary.
    #[error("dictionary mismatch: frame expects {expected:#010x}, supplied {found:#010x}")]
    DictionaryMismatch {
        /// Dictionary id named by the frame header.
        expected: u32,
        /// Dictionary id of the dictionary actually supplied.
        found: u32,
    },
}

/// Result type alias for zstdcore operations.
pub type Result<T> = std::result::Result<T, ZstdCoreError>;

impl ZstdCoreError {
    /// Create an unexpected-EOF error.
    pub fn eof(needed: usize, available: usize) -> Self {
        Self::UnexpectedEof { needed, available }
    }

    /// Create a buffer-too-small error.
    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        Self::BufferTooSmall { needed, available }
    }

    /// Create an invalid-magic error.
    pub fn invalid_magic(found: u32) -> Self {
        Self::InvalidMagic { found }
    }

    /// Create a reserved-field error.
    pub fn reserved(context: &'static str) -> Self {
        Self::ReservedField { context }
    }

    /// Create a table-malformed error.
    pub fn table_malformed(context: &'static str) -> Self {
        Self::TableMalformed { context }
    }

    /// Create a bitstream-desynchronized error.
    pub fn desync(context: &'static str) -> Self {
        Self::BitstreamDesync { context }
    }

    /// Create an invalid-offset error.
    pub fn offset_invalid(offset: u64, limit: u64) -> Self {
        Self::OffsetInvalid { offset, limit }
    }

    /// Create a size-invalid error.
    pub fn size_invalid(context: &'static str) -> Self {
        Self::SizeInvalid { context }
    }

    /// Create an allocation-failed error.
    pub fn allocation_failed(requested: usize) -> Self {
        Self::AllocationFailed { requested }
    }

    /// Create a dictionary-mismatch error.
    pub fn dictionary_mismatch(expected: u32, found: u32) -> Self {
        Self::DictionaryMismatch { expected, found }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ZstdCoreError::invalid_magic(0xdeadbeef);
        assert!(err.to_string().contains("invalid magic"));

        let err = ZstdCoreError::eof(4, 1);
        assert!(err.to_string().contains("needed 4"));

        let err = ZstdCoreError::dictionary_mismatch(1, 2);
        assert!(err.to_string().contains("dictionary mismatch"));
    }
}
