//! Static Huffman Compression
//!
//! The input is scanned once to build a frequency table, a Huffman tree is
//! built from the table, and the input is scanned again to emit the codes.
//! The tree never changes while coding.
//!
//! Compressed layout, all integers little endian:
//!
//! | offset | size | field |
//! |--------|------|-------|
//! | 0 | 4 | magic `0xBEEFBBAD` |
//! | 4 | 2 | permission bits of the original file |
//! | 6 | 2 | `tree_size`, length of the tree dump |
//! | 8 | 8 | `file_size`, number of expanded bytes |
//! | 16 | `tree_size` | post-order tree dump |
//! | ... | ... | packed codes, LSB first, zero padded |
//!
//! There is no end-of-data code, expansion stops after `file_size` symbols.

use std::io::{Cursor,Read,Write,Seek,SeekFrom,ErrorKind};
use crate::tools::node::Node;
use crate::tools::bit_io::{BitWriter,BitReader,read_block};
use crate::tools::static_tree;
use crate::{DYNERR,Error,Options,ALPHABET};

pub const MAGIC: u32 = 0xBEEFBBAD;
pub const HEADER_SIZE: usize = 16;

/// Fixed size header at the start of the compressed stream
#[derive(Clone,Debug,PartialEq)]
pub struct Header {
    pub magic: u32,
    pub permissions: u16,
    pub tree_size: u16,
    pub file_size: u64
}

impl Header {
    pub fn to_bytes(&self) -> [u8;HEADER_SIZE] {
        let mut ans = [0;HEADER_SIZE];
        ans[0..4].copy_from_slice(&u32::to_le_bytes(self.magic));
        ans[4..6].copy_from_slice(&u16::to_le_bytes(self.permissions));
        ans[6..8].copy_from_slice(&u16::to_le_bytes(self.tree_size));
        ans[8..16].copy_from_slice(&u64::to_le_bytes(self.file_size));
        ans
    }
    pub fn from_bytes(buf: &[u8;HEADER_SIZE]) -> Self {
        Self {
            magic: u32::from_le_bytes([buf[0],buf[1],buf[2],buf[3]]),
            permissions: u16::from_le_bytes([buf[4],buf[5]]),
            tree_size: u16::from_le_bytes([buf[6],buf[7]]),
            file_size: u64::from_le_bytes([buf[8],buf[9],buf[10],buf[11],buf[12],buf[13],buf[14],buf[15]])
        }
    }
}

/// Count occurrences of each byte value until the end of `reader`.
/// Symbols 0 and 255 are bumped by one so the tree always has at least two leaves.
/// Returns the table and the number of bytes scanned (not counting the bumps).
pub fn histogram<R: Read>(reader: &mut R, block_size: usize) -> Result<([u64;ALPHABET],u64),std::io::Error> {
    let mut hist = [0;ALPHABET];
    let mut buf = vec![0;block_size];
    let mut count: u64 = 0;
    hist[0] += 1;
    hist[ALPHABET-1] += 1;
    loop {
        let n = read_block(reader,&mut buf)?;
        if n == 0 {
            break;
        }
        for c in &buf[0..n] {
            hist[*c as usize] += 1;
        }
        count += n as u64;
    }
    Ok((hist,count))
}

/// Tree walking states of the decoder
#[derive(Clone,Copy,Debug,PartialEq)]
pub enum DecodeState {
    /// about to start a new symbol
    AtRoot,
    /// part way down the tree
    Descending,
    /// all expected symbols have been produced
    Done
}

/// Walks the tree one bit at a time, producing a symbol at every leaf.
pub struct Decoder<'a> {
    root: &'a Node,
    curr: &'a Node,
    state: DecodeState,
    decoded: u64,
    expected: u64
}

impl <'a> Decoder<'a> {
    pub fn new(root: &'a Node, expected: u64) -> Self {
        Self {
            root,
            curr: root,
            state: match expected {
                0 => DecodeState::Done,
                _ => DecodeState::AtRoot
            },
            decoded: 0,
            expected
        }
    }
    pub fn state(&self) -> DecodeState {
        self.state
    }
    pub fn is_done(&self) -> bool {
        self.state == DecodeState::Done
    }
    pub fn decoded(&self) -> u64 {
        self.decoded
    }
    /// Consume one bit, returning the symbol if a leaf was reached.
    /// Bits offered after `Done` are ignored.
    pub fn step(&mut self, bit: bool) -> Result<Option<u8>,Error> {
        if self.state == DecodeState::Done {
            return Ok(None);
        }
        // an interior node missing a child cannot come from a well formed dump
        let next = match self.curr.child(bit) {
            Some(n) => n,
            None => {
                log::error!("tree walk hit a missing child after {} symbols",self.decoded);
                return Err(Error::MalformedTree);
            }
        };
        if next.is_leaf() {
            self.decoded += 1;
            self.curr = self.root;
            self.state = match self.decoded == self.expected {
                true => DecodeState::Done,
                false => DecodeState::AtRoot
            };
            return Ok(Some(next.symbol));
        }
        self.curr = next;
        self.state = DecodeState::Descending;
        Ok(None)
    }
}

/// Main compression function.
/// `expanded_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `compressed_out` is an object with the `Write` trait, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// `permissions` is stored in the header for the benefit of whoever expands the data.
/// Returns (in_size,out_size) or error.
pub fn compress<R,W>(expanded_in: &mut R, compressed_out: &mut W, permissions: u16, opt: &Options) -> Result<(u64,u64),DYNERR>
where R: Read + Seek, W: Write {
    if opt.block_size == 0 {
        return Err(Box::new(Error::BadOptions));
    }
    let mut expanded_length = expanded_in.seek(SeekFrom::End(0))?;
    if opt.in_offset > expanded_length {
        return Err(Box::new(Error::FileFormatMismatch));
    }
    expanded_length -= opt.in_offset;
    if expanded_length > opt.max_file_size {
        return Err(Box::new(Error::FileTooLarge));
    }

    expanded_in.seek(SeekFrom::Start(opt.in_offset))?;
    let (hist,file_size) = histogram(expanded_in,opt.block_size)?;
    log::debug!("scanned {} bytes",file_size);
    let root = static_tree::build_tree(&hist)?;
    let table = static_tree::build_codes(&root)?;
    let tree = static_tree::serialize(&root);
    log::debug!("tree has {} leaves, dump is {} bytes",root.count_leaves(),tree.len());
    drop(root);

    let header = Header {
        magic: MAGIC,
        permissions,
        tree_size: tree.len() as u16,
        file_size
    };
    compressed_out.write_all(&header.to_bytes())?;
    compressed_out.write_all(&tree)?;

    log::debug!("entering loop over blocks");
    expanded_in.seek(SeekFrom::Start(opt.in_offset))?;
    let mut buf = vec![0;opt.block_size];
    let mut count: u64 = 0;
    let mut writer = BitWriter::create(compressed_out,opt.block_size);
    loop {
        let n = read_block(expanded_in,&mut buf)?;
        if n == 0 {
            break;
        }
        for c in &buf[0..n] {
            let code = table.get(*c).ok_or(Error::MissingCode(*c))?;
            writer.write_code(code)?;
        }
        count += n as u64;
    }
    writer.flush()?;
    if count != file_size {
        log::error!("input changed from {} to {} bytes during compression",file_size,count);
        return Err(Box::new(Error::FileFormatMismatch));
    }
    let out_size = (HEADER_SIZE + tree.len()) as u64 + writer.bytes_written();
    Ok((expanded_length,out_size))
}

/// Main decompression function.
/// `compressed_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `expanded_out` is an object with the `Write` trait, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Nothing is written unless the whole stream decodes.
/// Returns (in_size,out_size,permissions) or error.
pub fn expand<R,W>(compressed_in: &mut R, expanded_out: &mut W, opt: &Options) -> Result<(u64,u64,u16),DYNERR>
where R: Read + Seek, W: Write {
    if opt.block_size == 0 {
        return Err(Box::new(Error::BadOptions));
    }
    let mut compressed_size = compressed_in.seek(SeekFrom::End(0))?;
    if opt.in_offset > compressed_size {
        return Err(Box::new(Error::FileFormatMismatch));
    }
    compressed_size -= opt.in_offset;
    if compressed_size > opt.max_file_size {
        return Err(Box::new(Error::FileTooLarge));
    }
    compressed_in.seek(SeekFrom::Start(opt.in_offset))?;

    let mut header_bytes = [0;HEADER_SIZE];
    match compressed_in.read_exact(&mut header_bytes) {
        Ok(()) => {},
        Err(e) if e.kind()==ErrorKind::UnexpectedEof => {
            log::error!("stream is too short for a header");
            return Err(Box::new(Error::FileFormatMismatch));
        },
        Err(e) => return Err(Box::new(e))
    }
    let header = Header::from_bytes(&header_bytes);
    if header.magic != MAGIC {
        log::error!("bad magic number {:#010x}",header.magic);
        return Err(Box::new(Error::FileFormatMismatch));
    }
    let tree_size = header.tree_size as usize;
    let leaves = (tree_size + 1) / 3;
    if leaves < 2 || leaves > ALPHABET || static_tree::serialized_size(leaves) != tree_size {
        log::error!("tree size {} is not possible",tree_size);
        return Err(Box::new(Error::MalformedTree));
    }
    if header.file_size > opt.max_file_size {
        return Err(Box::new(Error::FileTooLarge));
    }
    log::debug!("header: tree {} bytes, file {} bytes",tree_size,header.file_size);

    let mut tree = vec![0;tree_size];
    match compressed_in.read_exact(&mut tree) {
        Ok(()) => {},
        Err(e) if e.kind()==ErrorKind::UnexpectedEof => {
            log::error!("stream ended inside the tree");
            return Err(Box::new(Error::MalformedTree));
        },
        Err(e) => return Err(Box::new(e))
    }
    let root = static_tree::deserialize(&tree)?;

    log::debug!("enter main decoding loop");
    let mut ans: Vec<u8> = Vec::new();
    let mut reader = BitReader::create(compressed_in,opt.block_size);
    let mut decoder = Decoder::new(&root,header.file_size);
    while !decoder.is_done() {
        let bit = match reader.read_bit()? {
            Some(b) => b,
            None => {
                log::error!("data ended after {} of {} symbols",decoder.decoded(),header.file_size);
                return Err(Box::new(Error::UnexpectedEnd));
            }
        };
        if let Some(c) = decoder.step(bit)? {
            ans.push(c);
        }
    }
    expanded_out.write_all(&ans)?;
    expanded_out.flush()?;
    Ok((compressed_size,ans.len() as u64,header.permissions))
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8],permissions: u16,opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,&mut ans,permissions,opt)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

// *************** TESTS *****************

#[cfg(test)]
use crate::{STDRESULT,STD_OPTIONS};

#[cfg(test)]
fn is_error(result: Result<Vec<u8>,DYNERR>, expected: Error) -> bool {
    match result {
        Ok(_) => false,
        Err(e) => match e.downcast_ref::<Error>() {
            Some(err) => std::mem::discriminant(err) == std::mem::discriminant(&expected),
            None => false
        }
    }
}

#[test]
fn compression_works() -> STDRESULT {
    let test_data = "AAAAA".as_bytes();
    let huff_str = "ADBBEFBE A401 0800 0500000000000000 4CFF4C00494C4149 1F";
    let compressed = compress_slice(test_data,0o644,&STD_OPTIONS)?;
    assert_eq!(compressed,hex::decode(huff_str.replace(" ",""))?);
    Ok(())
}

#[test]
fn empty_input() -> STDRESULT {
    let huff_str = "ADBBEFBE A401 0500 0000000000000000 4CFF4C0049";
    let compressed = compress_slice(&[],0o644,&STD_OPTIONS)?;
    assert_eq!(compressed,hex::decode(huff_str.replace(" ",""))?);
    assert_eq!(expand_slice(&compressed,&STD_OPTIONS)?,Vec::<u8>::new());
    // trailing bits are never consulted
    let padded = [compressed,vec![0xff,0x00,0x13]].concat();
    assert_eq!(expand_slice(&padded,&STD_OPTIONS)?,Vec::<u8>::new());
    Ok(())
}

#[test]
fn invertibility() -> STDRESULT {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data,0o600,&STD_OPTIONS)?;
    let expanded = expand_slice(&compressed,&STD_OPTIONS)?;
    assert_eq!(test_data.to_vec(),expanded);

    let test_data = "AAAAA".as_bytes();
    let compressed = compress_slice(test_data,0o600,&STD_OPTIONS)?;
    let expanded = expand_slice(&compressed,&STD_OPTIONS)?;
    assert_eq!(test_data.to_vec(),expanded);
    Ok(())
}

#[test]
fn invertibility_small_blocks() -> STDRESULT {
    // every symbol present, skewed counts, blocks much smaller than the data
    let mut test_data = Vec::new();
    for i in 0..4000usize {
        test_data.push(((i * i + 7 * i) % 256) as u8);
        if i % 3 == 0 {
            test_data.push(b'e');
        }
    }
    let mut opt = STD_OPTIONS;
    opt.block_size = 3;
    let compressed = compress_slice(&test_data,0o644,&opt)?;
    let expanded = expand_slice(&compressed,&opt)?;
    assert_eq!(test_data,expanded);
    // block size is not part of the format
    let expanded = expand_slice(&compressed,&STD_OPTIONS)?;
    assert_eq!(test_data,expanded);
    Ok(())
}

#[test]
fn header_fields() -> STDRESULT {
    let test_data = "abracadabra".as_bytes();
    let compressed = compress_slice(test_data,0o751,&STD_OPTIONS)?;
    let mut buf = [0;HEADER_SIZE];
    buf.copy_from_slice(&compressed[0..HEADER_SIZE]);
    let header = Header::from_bytes(&buf);
    // a b c d r plus the two bumped symbols
    assert_eq!(header,Header {
        magic: MAGIC,
        permissions: 0o751,
        tree_size: 20,
        file_size: 11
    });
    assert_eq!(header.to_bytes(),buf);
    let mut src = Cursor::new(compressed);
    let mut out: Vec<u8> = Vec::new();
    let (_,out_size,permissions) = expand(&mut src,&mut out,&STD_OPTIONS)?;
    assert_eq!(out_size,11);
    assert_eq!(permissions,0o751);
    Ok(())
}

#[test]
fn offsets() -> STDRESULT {
    let test_data = "xxxxhello hello hello".as_bytes();
    let mut opt = STD_OPTIONS;
    opt.in_offset = 4;
    let compressed = compress_slice(test_data,0o644,&opt)?;
    let prefixed = ["yy".as_bytes().to_vec(),compressed].concat();
    opt.in_offset = 2;
    assert_eq!(expand_slice(&prefixed,&opt)?,"hello hello hello".as_bytes().to_vec());
    opt.in_offset = 100;
    assert!(is_error(expand_slice(&prefixed,&opt),Error::FileFormatMismatch));
    Ok(())
}

#[test]
fn bad_magic() -> STDRESULT {
    let mut compressed = compress_slice("hello".as_bytes(),0o644,&STD_OPTIONS)?;
    compressed[0] ^= 0x01;
    let mut src = Cursor::new(compressed.clone());
    let mut out: Vec<u8> = Vec::new();
    assert!(expand(&mut src,&mut out,&STD_OPTIONS).is_err());
    assert!(out.is_empty());
    assert!(is_error(expand_slice(&compressed,&STD_OPTIONS),Error::FileFormatMismatch));
    assert!(is_error(expand_slice(&compressed[0..5],&STD_OPTIONS),Error::FileFormatMismatch));
    Ok(())
}

#[test]
fn bad_tree() -> STDRESULT {
    let compressed = compress_slice("hello".as_bytes(),0o644,&STD_OPTIONS)?;
    // tree size that no tree can have
    let mut bad = compressed.clone();
    bad[6] = 7;
    assert!(is_error(expand_slice(&bad,&STD_OPTIONS),Error::MalformedTree));
    // right size, unbalanced tokens
    let mut bad = compressed.clone();
    for i in 0..bad[6] as usize {
        bad[HEADER_SIZE+i] = b'I';
    }
    assert!(is_error(expand_slice(&bad,&STD_OPTIONS),Error::MalformedTree));
    // stream ends inside the tree
    assert!(is_error(expand_slice(&compressed[0..HEADER_SIZE+4],&STD_OPTIONS),Error::MalformedTree));
    Ok(())
}

#[test]
fn truncated_data() -> STDRESULT {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data,0o644,&STD_OPTIONS)?;
    let short = &compressed[0..compressed.len()-2];
    let mut src = Cursor::new(short);
    let mut out: Vec<u8> = Vec::new();
    let err = match expand(&mut src,&mut out,&STD_OPTIONS) {
        Ok(_) => panic!("truncated data was accepted"),
        Err(e) => e
    };
    assert!(matches!(err.downcast_ref::<Error>(),Some(Error::UnexpectedEnd)));
    assert!(out.is_empty());
    Ok(())
}

#[test]
fn size_limit() {
    let mut opt = STD_OPTIONS;
    opt.max_file_size = 4;
    assert!(is_error(compress_slice("hello".as_bytes(),0o644,&opt),Error::FileTooLarge));
    opt = STD_OPTIONS;
    opt.block_size = 0;
    assert!(is_error(compress_slice("hello".as_bytes(),0o644,&opt),Error::BadOptions));
}

#[test]
fn histogram_bumps() -> STDRESULT {
    let mut src = Cursor::new(vec![0u8,7,7,255]);
    let (hist,count) = histogram(&mut src,2)?;
    assert_eq!(count,4);
    assert_eq!(hist[0],2);
    assert_eq!(hist[7],2);
    assert_eq!(hist[255],2);
    assert_eq!(hist.iter().sum::<u64>(),6);
    Ok(())
}

#[test]
fn decoder_states() -> STDRESULT {
    // root: left = (255,0), right = 65
    let root = static_tree::deserialize(&[b'L',255,b'L',0,b'I',b'L',65,b'I'])?;
    let mut decoder = Decoder::new(&root,2);
    assert_eq!(decoder.state(),DecodeState::AtRoot);
    assert_eq!(decoder.step(false)?,None);
    assert_eq!(decoder.state(),DecodeState::Descending);
    assert_eq!(decoder.step(true)?,Some(0));
    assert_eq!(decoder.state(),DecodeState::AtRoot);
    assert_eq!(decoder.step(true)?,Some(65));
    assert_eq!(decoder.state(),DecodeState::Done);
    assert_eq!(decoder.decoded(),2);
    // padding is ignored
    assert_eq!(decoder.step(true)?,None);
    assert_eq!(decoder.decoded(),2);
    assert!(Decoder::new(&root,0).is_done());
    Ok(())
}

#[test]
fn missing_child_is_an_error() {
    // a lone leaf has no child to descend into
    let leaf = Node::create(7,0);
    let mut decoder = Decoder::new(&leaf,1);
    assert!(matches!(decoder.step(false),Err(Error::MalformedTree)));
    assert!(matches!(decoder.step(true),Err(Error::MalformedTree)));
    assert_eq!(decoder.decoded(),0);
}

#[test]
fn deepest_tree_round_trip() -> STDRESULT {
    // saturated equal counts chain the tree, giving 255 bit codes
    let root = static_tree::build_tree(&[u64::MAX;ALPHABET])?;
    let table = static_tree::build_codes(&root)?;
    let tree = static_tree::serialize(&root);
    let test_data: Vec<u8> = (0..=255u8).rev().chain(0..=255u8).collect();
    let mut bits: Vec<u8> = Vec::new();
    let mut writer = BitWriter::create(&mut bits,STD_OPTIONS.block_size);
    for c in &test_data {
        writer.write_code(table.get(*c).ok_or(Error::MissingCode(*c))?)?;
    }
    writer.flush()?;
    let header = Header {
        magic: MAGIC,
        permissions: 0o644,
        tree_size: tree.len() as u16,
        file_size: test_data.len() as u64
    };
    let stream = [header.to_bytes().to_vec(),tree,bits].concat();
    assert_eq!(expand_slice(&stream,&STD_OPTIONS)?,test_data);
    Ok(())
}

#[test]
fn doubling_counts_round_trip() -> STDRESULT {
    // symbol k appears 2^k times, each symbol adds a level to the tree
    let mut test_data = Vec::new();
    for k in 1..17u8 {
        test_data.extend(std::iter::repeat(k).take(1usize << k));
    }
    let mut opt = STD_OPTIONS;
    opt.block_size = 64;
    let compressed = compress_slice(&test_data,0o644,&opt)?;
    assert_eq!(expand_slice(&compressed,&opt)?,test_data);
    Ok(())
}
