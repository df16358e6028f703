//! Block buffered bit streams.
//!
//! Bits are packed least significant first within each byte.  The writer
//! accumulates whole blocks before writing them out, the reader pulls whole
//! blocks as needed and doles out one bit at a time.

use std::io::{Read,Write,ErrorKind};
use super::bit_path::BitPath;

/// Fill `buf` from `reader`, stopping early only at end of input.
/// Returns the number of bytes actually read.
pub fn read_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize,std::io::Error> {
    let mut count = 0;
    while count < buf.len() {
        match reader.read(&mut buf[count..]) {
            Ok(0) => break,
            Ok(n) => count += n,
            Err(e) if e.kind()==ErrorKind::Interrupted => continue,
            Err(e) => return Err(e)
        }
    }
    Ok(count)
}

pub struct BitWriter<'a,W: Write> {
    writer: &'a mut W,
    buf: Vec<u8>,
    /// index of the next bit in `buf`
    bit_index: usize,
    /// bytes sent to `writer` so far
    count: u64
}

impl <'a,W: Write> BitWriter<'a,W> {
    pub fn create(writer: &'a mut W, block_size: usize) -> Self {
        Self {
            writer,
            buf: vec![0;block_size],
            bit_index: 0,
            count: 0
        }
    }
    /// append every bit of `code`, writing out each block as it fills
    pub fn write_code(&mut self, code: &BitPath) -> Result<(),std::io::Error> {
        for bit in code.iter() {
            self.write_bit(bit)?;
        }
        Ok(())
    }
    pub fn write_bit(&mut self, bit: bool) -> Result<(),std::io::Error> {
        if bit {
            self.buf[self.bit_index >> 3] |= 1 << (self.bit_index & 7);
        }
        self.bit_index += 1;
        if self.bit_index == self.buf.len() * 8 {
            self.writer.write_all(&self.buf)?;
            self.count += self.buf.len() as u64;
            self.buf.fill(0);
            self.bit_index = 0;
        }
        Ok(())
    }
    /// Write out whatever is buffered.  A partial last byte is included,
    /// its unused high bits are zero because the buffer starts zeroed.
    pub fn flush(&mut self) -> Result<(),std::io::Error> {
        let num_bytes = (self.bit_index + 7) >> 3;
        self.writer.write_all(&self.buf[0..num_bytes])?;
        self.count += num_bytes as u64;
        self.buf.fill(0);
        self.bit_index = 0;
        self.writer.flush()
    }
    /// number of bytes written to the underlying stream
    pub fn bytes_written(&self) -> u64 {
        self.count
    }
}

pub struct BitReader<'a,R: Read> {
    reader: &'a mut R,
    buf: Vec<u8>,
    num_bytes: usize,
    byte_index: usize,
    bit_index: usize
}

impl <'a,R: Read> BitReader<'a,R> {
    pub fn create(reader: &'a mut R, block_size: usize) -> Self {
        Self {
            reader,
            buf: vec![0;block_size],
            num_bytes: 0,
            byte_index: 0,
            bit_index: 0
        }
    }
    /// Get the next bit, or `None` once the source is exhausted.
    pub fn read_bit(&mut self) -> Result<Option<bool>,std::io::Error> {
        if self.byte_index == self.num_bytes {
            self.num_bytes = read_block(self.reader,&mut self.buf)?;
            self.byte_index = 0;
            self.bit_index = 0;
            if self.num_bytes == 0 {
                return Ok(None);
            }
        }
        let bit = (self.buf[self.byte_index] >> self.bit_index) & 1 == 1;
        self.bit_index += 1;
        if self.bit_index == 8 {
            self.bit_index = 0;
            self.byte_index += 1;
        }
        Ok(Some(bit))
    }
}

#[cfg(test)]
fn pattern(n: usize) -> Vec<bool> {
    (0..n).map(|i| (i*7 + i/3) % 5 < 2).collect()
}

#[test]
fn pack_and_unpack_across_blocks() {
    // 4 byte blocks, 75 bits crosses two block boundaries
    let bits = pattern(75);
    let mut out: Vec<u8> = Vec::new();
    let mut writer = BitWriter::create(&mut out,4);
    for b in &bits {
        writer.write_bit(*b).expect("write failed");
    }
    writer.flush().expect("flush failed");
    assert_eq!(writer.bytes_written(),10);
    assert_eq!(out.len(),10);
    let mut src = std::io::Cursor::new(out);
    let mut reader = BitReader::create(&mut src,4);
    let mut read_back = Vec::new();
    for _i in 0..bits.len() {
        read_back.push(reader.read_bit().expect("read failed").expect("early end"));
    }
    assert_eq!(read_back,bits);
}

#[test]
fn lsb_first_packing() {
    let mut code = BitPath::new();
    for b in [true,false,true,true] {
        code.push(b).expect("push failed");
    }
    let mut out: Vec<u8> = Vec::new();
    let mut writer = BitWriter::create(&mut out,16);
    writer.write_code(&code).expect("write failed");
    writer.write_code(&code).expect("write failed");
    writer.write_code(&code).expect("write failed");
    writer.flush().expect("flush failed");
    assert_eq!(out,vec![0xDD,0x0D]);
}

#[test]
fn end_of_stream() {
    let mut src = std::io::Cursor::new(vec![0x01]);
    let mut reader = BitReader::create(&mut src,8);
    assert_eq!(reader.read_bit().expect("read failed"),Some(true));
    for _i in 1..8 {
        assert_eq!(reader.read_bit().expect("read failed"),Some(false));
    }
    assert_eq!(reader.read_bit().expect("read failed"),None);
    assert_eq!(reader.read_bit().expect("read failed"),None);
}
