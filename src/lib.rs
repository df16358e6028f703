//! # Static Huffman Compression
//!
//! This crate compresses and expands files using a static Huffman code.
//! The whole input is scanned once to count symbols, the code is built from
//! the counts, and the tree is stored in front of the packed data so the
//! expander can rebuild it.
//!
//! The format lives in the `huff` module, the building blocks (tree nodes,
//! queue, stack, bit streams) are in `tools`.

pub mod tools;
pub mod huff;

type DYNERR = Box<dyn std::error::Error>;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// Number of distinct symbols, each symbol is one byte
pub const ALPHABET: usize = 256;

/// Compression Errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("file format mismatch")]
    FileFormatMismatch,
    #[error("file too large")]
    FileTooLarge,
    #[error("collection is full")]
    CollectionFull,
    #[error("collection is empty")]
    CollectionEmpty,
    #[error("frequency table has no entries")]
    EmptyHistogram,
    #[error("malformed tree")]
    MalformedTree,
    #[error("symbol {0} has no code")]
    MissingCode(u8),
    #[error("unexpected end of compressed data")]
    UnexpectedEnd,
    #[error("options cannot be satisfied")]
    BadOptions
}

/// Options controlling compression
#[derive(Clone)]
pub struct Options {
    /// starting position in the input file
    pub in_offset: u64,
    /// size of the blocks used for raw reads and for flushing packed bits
    pub block_size: usize,
    /// return error if file is larger
    pub max_file_size: u64
}

pub const STD_OPTIONS: Options = Options {
    in_offset: 0,
    block_size: 4096,
    max_file_size: u32::MAX as u64
};
