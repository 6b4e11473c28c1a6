//! # zstdcore-base
//!
//! Shared primitives used by the [`zstdcore`](../zstdcore/index.html) decoder:
//!
//! - [`bitstream`]: forward, LSB-first bit reading for Huffman/FSE table descriptions
//! - [`error`]: the flat error taxonomy returned by every decode operation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ zstdcore: frame / block / literals / sequences          │
//! │           Huffman (E1) and FSE (E2) entropy decoders     │
//! ├─────────────────────────────────────────────────────────┤
//! │ zstdcore-base (this crate)                               │
//! │     BitReader, ZstdCoreError                             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use zstdcore_base::bitstream::BitReader;
//! use std::io::Cursor;
//!
//! let mut reader = BitReader::new(Cursor::new(vec![0xAB, 0xCD]));
//! let bits = reader.read_bits(12).unwrap();
//! assert_eq!(bits, 0xBAB);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod error;

pub use bitstream::BitReader;
pub use error::{Result, ZstdCoreError};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::BitReader;
    pub use crate::error::{Result, ZstdCoreError};
}
