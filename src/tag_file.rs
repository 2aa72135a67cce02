//! Seekable byte source/sink over one file descriptor.
//!
//! Reads go through a small buffer windowed over an arbitrary file offset,
//! since the element walk is dominated by short header reads. Writes go
//! straight to the file and invalidate the window.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{Error, Result};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// A Matroska file opened for tag access.
#[derive(Debug)]
pub struct TagFile {
    file: File,
    writable: bool,
    len: u64,
    buf: Box<[u8]>,
    /// File offset of `buf[0]`.
    buf_offset: u64,
    /// Valid bytes in `buf`.
    buf_len: usize,
    /// Cursor within `buf`; logical position is `buf_offset + buf_pos`.
    buf_pos: usize,
    // invariant: the descriptor's own offset is always buf_offset + buf_len
}

impl TagFile {
    /// Open a file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_mode(path, false)
    }

    /// Open a file for reading and writing.
    pub fn open_rw(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_mode(path, true)
    }

    fn with_mode(path: impl AsRef<Path>, writable: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            writable,
            len,
            buf: vec![0u8; READ_BUFFER_SIZE].into_boxed_slice(),
            buf_offset: 0,
            buf_len: 0,
            buf_pos: 0,
        })
    }

    /// Current length of the file in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the file is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the file was opened read-write.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Current logical position.
    pub fn position(&self) -> u64 {
        self.buf_offset + self.buf_pos as u64
    }

    /// Seek to an absolute offset.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Write `data` at the current position, extending the file as needed.
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if !self.writable {
            return Err(Error::ReadOnly);
        }
        let pos = self.position();
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.write_all(data)?;
        // the window may now hold stale bytes
        let end = pos + data.len() as u64;
        self.buf_offset = end;
        self.buf_pos = 0;
        self.buf_len = 0;
        if end > self.len {
            self.len = end;
        }
        Ok(())
    }

    /// Flush file contents to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn refill(&mut self) -> io::Result<()> {
        self.buf_offset += self.buf_len as u64;
        let n = self.file.read(&mut self.buf)?;
        self.buf_pos = 0;
        self.buf_len = n;
        Ok(())
    }
}

impl Read for TagFile {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        if self.buf_pos >= self.buf_len {
            self.refill()?;
            if self.buf_len == 0 {
                return Ok(0);
            }
        }
        let available = self.buf_len - self.buf_pos;
        let n = available.min(out.len());
        out[..n].copy_from_slice(&self.buf[self.buf_pos..self.buf_pos + n]);
        self.buf_pos += n;
        Ok(n)
    }
}

impl Seek for TagFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.position()) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.len) + i128::from(delta),
        };
        if target < 0 || target > i128::from(u64::MAX) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek outside the addressable range",
            ));
        }
        let target = target as u64;
        if target >= self.buf_offset && target <= self.buf_offset + self.buf_len as u64 {
            // still inside the buffered window
            self.buf_pos = (target - self.buf_offset) as usize;
        } else {
            self.file.seek(SeekFrom::Start(target))?;
            self.buf_offset = target;
            self.buf_pos = 0;
            self.buf_len = 0;
        }
        Ok(target)
    }
}
