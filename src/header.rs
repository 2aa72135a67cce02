//! Stream-oriented reading of framed EBML elements.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{Error, Result, map_eof};
use crate::vint::{ElementId, VInt64};

/// Header of one EBML element: ID, size, and where its content lives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ElementHeader {
    /// Element ID, marker bits included.
    pub id: ElementId,
    /// Content size in bytes. Meaningless when `unknown_size` is set.
    pub size: u64,
    /// The size field held the reserved all-ones marker; the element runs
    /// to the end of the file.
    pub unknown_size: bool,
    /// On-disk width of the ID field.
    pub id_len: u8,
    /// On-disk width of the size field.
    pub size_len: u8,
    /// Absolute offset of the first content byte.
    pub data_offset: u64,
    /// Absolute offset one past the last content byte.
    pub end_offset: u64,
}

impl ElementHeader {
    /// Absolute offset of the first header byte.
    pub fn header_offset(&self) -> u64 {
        self.data_offset - u64::from(self.id_len) - u64::from(self.size_len)
    }

    /// Total on-disk length, header included.
    pub fn total_len(&self) -> u64 {
        self.end_offset - self.header_offset()
    }

    /// Read the element header at the current position, leaving the
    /// position at the first content byte.
    pub fn read_from<R: Read + Seek>(r: &mut R) -> Result<Self> {
        let id = ElementId::read_from(r)?;
        let size = VInt64::read_from(r)?;
        let data_offset = r.stream_position()?;
        let end_offset = if size.is_unknown {
            // unknown-size elements propagate to the end of the file
            let end = r.seek(SeekFrom::End(0))?;
            r.seek(SeekFrom::Start(data_offset))?;
            end
        } else {
            data_offset + size.value
        };
        Ok(Self {
            id,
            size: size.value,
            unknown_size: size.is_unknown,
            id_len: id.width(),
            size_len: size.width,
            data_offset,
            end_offset,
        })
    }

    /// Read the header at the current position, then seek back to it.
    pub fn peek_from<R: Read + Seek>(r: &mut R) -> Result<Self> {
        let pos = r.stream_position()?;
        let header = Self::read_from(r);
        r.seek(SeekFrom::Start(pos))?;
        header
    }

    /// Seek past the element's content.
    pub fn skip<R: Seek>(&self, r: &mut R) -> Result<()> {
        if self.unknown_size {
            return Err(Error::Corrupt("cannot skip an unknown-size element"));
        }
        r.seek(SeekFrom::Start(self.end_offset))?;
        Ok(())
    }

    /// Read the content as a big-endian unsigned integer. An empty payload
    /// is zero.
    pub fn read_uint<R: Read + Seek>(&self, r: &mut R) -> Result<u64> {
        if self.size > 8 {
            return Err(Error::Corrupt("integer payload wider than eight bytes"));
        }
        r.seek(SeekFrom::Start(self.data_offset))?;
        let mut bytes = [0u8; 8];
        r.read_exact(&mut bytes[..self.size as usize]).map_err(map_eof)?;
        Ok(bytes[..self.size as usize]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    /// Read the content as a big-endian signed integer, sign-extended from
    /// the top bit of the first payload byte.
    pub fn read_int<R: Read + Seek>(&self, r: &mut R) -> Result<i64> {
        if self.size > 8 {
            return Err(Error::Corrupt("integer payload wider than eight bytes"));
        }
        r.seek(SeekFrom::Start(self.data_offset))?;
        let mut bytes = [0u8; 8];
        r.read_exact(&mut bytes[..self.size as usize]).map_err(map_eof)?;
        if self.size == 0 {
            return Ok(0);
        }
        let mut value: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        for b in &bytes[..self.size as usize] {
            value = (value << 8) | i64::from(*b);
        }
        Ok(value)
    }

    /// Read the content as a float. The payload must be empty, four, or
    /// eight bytes.
    pub fn read_float<R: Read + Seek>(&self, r: &mut R) -> Result<f64> {
        r.seek(SeekFrom::Start(self.data_offset))?;
        match self.size {
            0 => Ok(0.0),
            4 => {
                let mut bytes = [0u8; 4];
                r.read_exact(&mut bytes).map_err(map_eof)?;
                Ok(f64::from(f32::from_be_bytes(bytes)))
            }
            8 => {
                let mut bytes = [0u8; 8];
                r.read_exact(&mut bytes).map_err(map_eof)?;
                Ok(f64::from_be_bytes(bytes))
            }
            _ => Err(Error::Corrupt("float payload must be zero, four, or eight bytes")),
        }
    }

    /// Read the content as a UTF-8 string, stripping trailing NUL padding.
    pub fn read_string<R: Read + Seek>(&self, r: &mut R) -> Result<String> {
        let mut bytes = self.read_binary(r)?;
        while bytes.last() == Some(&0) {
            bytes.pop();
        }
        String::from_utf8(bytes).map_err(|_| Error::Corrupt("string payload is not valid UTF-8"))
    }

    /// Read the whole content into a fresh buffer.
    pub fn read_binary<R: Read + Seek>(&self, r: &mut R) -> Result<Vec<u8>> {
        r.seek(SeekFrom::Start(self.data_offset))?;
        let mut bytes = vec![0u8; self.size as usize];
        r.read_exact(&mut bytes).map_err(map_eof)?;
        Ok(bytes)
    }

    /// Read as much content as fits into `out`, returning the byte count.
    pub fn read_binary_into<R: Read + Seek>(&self, r: &mut R, out: &mut [u8]) -> Result<usize> {
        r.seek(SeekFrom::Start(self.data_offset))?;
        let n = (self.size as usize).min(out.len());
        r.read_exact(&mut out[..n]).map_err(map_eof)?;
        Ok(n)
    }
}

/// Whether the current position is at or past the end of `parent`'s content.
pub fn at_end<R: Seek>(r: &mut R, parent: &ElementHeader) -> Result<bool> {
    Ok(r.stream_position()? >= parent.end_offset)
}
