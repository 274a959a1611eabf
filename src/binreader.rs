//! Little-endian primitive reads, length-prefixed strings, and C-strings
//! over a byte source (component A).
//!
//! Mirrors the reference tool's `BinaryReader` helper class: a thin
//! wrapper that turns "read N bytes and interpret them" into named,
//! checked operations instead of scattered `read_exact` calls.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::{self, Read, Seek, SeekFrom};

use crate::error::StructuralError;

/// Wraps any [`Read`] source with the primitive reads this format needs.
pub struct BinaryReader<R> {
    inner: R,
}

impl<R: Read> BinaryReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Reads exactly `n` bytes, failing if fewer remain.
    pub fn read(&mut self, n: usize) -> Result<Vec<u8>, StructuralError> {
        let mut buf = vec![0u8; n];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| wrap_eof(e, n))?;
        Ok(buf)
    }

    pub fn read_i32(&mut self) -> Result<i32, StructuralError> {
        Ok(self.inner.read_i32::<LittleEndian>().map_err(|e| wrap_eof(e, 4))?)
    }

    pub fn read_i64(&mut self) -> Result<i64, StructuralError> {
        Ok(self.inner.read_i64::<LittleEndian>().map_err(|e| wrap_eof(e, 8))?)
    }

    pub fn read_u16(&mut self) -> Result<u16, StructuralError> {
        Ok(self.inner.read_u16::<LittleEndian>().map_err(|e| wrap_eof(e, 2))?)
    }

    pub fn read_u16_be(&mut self) -> Result<u16, StructuralError> {
        Ok(self.inner.read_u16::<BigEndian>().map_err(|e| wrap_eof(e, 2))?)
    }

    /// `i32` length prefix followed by that many bytes, decoded as UTF-8
    /// (lossy, matching the engine's loose narrow-string handling).
    pub fn read_length_prefixed_string(&mut self) -> Result<String, StructuralError> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(StructuralError::LengthPrefixOverrun { len: len as i64 });
        }
        let bytes = self.read(len as usize)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Bytes up to and including a NUL terminator; the NUL is stripped.
    pub fn read_cstring(&mut self) -> Result<Vec<u8>, StructuralError> {
        let mut out = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            self.inner.read_exact(&mut byte).map_err(|e| wrap_eof(e, 1))?;
            if byte[0] == 0 {
                break;
            }
            out.push(byte[0]);
        }
        Ok(out)
    }
}

impl<R: Read + Seek> BinaryReader<R> {
    pub fn seek(&mut self, offset: u64) -> Result<u64, StructuralError> {
        Ok(self.inner.seek(SeekFrom::Start(offset))?)
    }

    pub fn position(&mut self) -> Result<u64, StructuralError> {
        Ok(self.inner.seek(SeekFrom::Current(0))?)
    }
}

fn wrap_eof(e: io::Error, wanted: usize) -> StructuralError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        StructuralError::UnexpectedEof {
            wanted,
            available: 0,
        }
    } else {
        StructuralError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_primitives() {
        let data = vec![0x01, 0x02, 0x03, 0x04, 0xff, 0xff, 0xff, 0xff];
        let mut r = BinaryReader::new(Cursor::new(data));
        assert_eq!(r.read_i32().unwrap(), 0x0403_0201);
        assert_eq!(r.read_i32().unwrap(), -1);
    }

    #[test]
    fn reads_u16_be_vs_le() {
        let data = vec![0x00, 0x10];
        let mut r = BinaryReader::new(Cursor::new(data.clone()));
        assert_eq!(r.read_u16_be().unwrap(), 0x0010);

        let mut r = BinaryReader::new(Cursor::new(data));
        assert_eq!(r.read_u16().unwrap(), 0x1000);
    }

    #[test]
    fn reads_length_prefixed_string() {
        let mut data = vec![5, 0, 0, 0];
        data.extend_from_slice(b"hello");
        let mut r = BinaryReader::new(Cursor::new(data));
        assert_eq!(r.read_length_prefixed_string().unwrap(), "hello");
    }

    #[test]
    fn rejects_negative_length_prefix() {
        let data: Vec<u8> = vec![0xff, 0xff, 0xff, 0xff];
        let mut r = BinaryReader::new(Cursor::new(data));
        assert!(r.read_length_prefixed_string().is_err());
    }

    #[test]
    fn reads_cstring() {
        let mut data = b"abc".to_vec();
        data.push(0);
        data.extend_from_slice(b"trailing");
        let mut r = BinaryReader::new(Cursor::new(data));
        assert_eq!(r.read_cstring().unwrap(), b"abc");
    }

    #[test]
    fn errors_on_truncated_read() {
        let data = vec![0x01, 0x02];
        let mut r = BinaryReader::new(Cursor::new(data));
        assert!(r.read(10).is_err());
    }

    #[test]
    fn seek_and_position() {
        let data = vec![0u8; 16];
        let mut r = BinaryReader::new(Cursor::new(data));
        r.seek(8).unwrap();
        assert_eq!(r.position().unwrap(), 8);
    }
}
