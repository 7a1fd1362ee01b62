/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Stop-bit stream reader.
//!
//! Strict inverse of the [`StreamWriter`](crate::writer::StreamWriter):
//! decodes stop-bit primitives from any `io::Read` source, one value at a
//! time. The codec is self-delimiting, so no seeking or look-ahead beyond a
//! single byte is required.

use ferrofast_core::{FastError, Result};
use std::io::{ErrorKind, Read};

/// Stop-bit decoder over a byte source.
#[derive(Debug)]
pub struct StreamReader<R> {
    source: R,
    /// Byte pulled ahead of time by [`StreamReader::at_eof`].
    peeked: Option<u8>,
}

impl<R: Read> StreamReader<R> {
    /// Creates a reader over the given byte source.
    pub fn new(source: R) -> Self {
        Self {
            source,
            peeked: None,
        }
    }

    /// Returns true if the source is exhausted.
    ///
    /// # Errors
    /// Returns `FastError::Io` if the underlying source fails.
    pub fn at_eof(&mut self) -> Result<bool> {
        if self.peeked.is_some() {
            return Ok(false);
        }
        let mut byte = [0u8; 1];
        loop {
            match self.source.read(&mut byte) {
                Ok(0) => return Ok(true),
                Ok(_) => {
                    self.peeked = Some(byte[0]);
                    return Ok(false);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Decodes a raw stop-bit unsigned integer, without nullable framing.
    ///
    /// # Errors
    /// `FastError::Truncated` if the stop bit never arrives;
    /// `FastError::Overflow` past 64 bits.
    pub fn read_uint_raw(&mut self) -> Result<u64> {
        let mut result: u64 = 0;
        loop {
            let byte = self.next_byte()?;
            if result > (u64::MAX >> 7) {
                return Err(FastError::Overflow { bits: 64 });
            }
            result = (result << 7) | u64::from(byte & 0x7F);
            if byte & 0x80 != 0 {
                return Ok(result);
            }
        }
    }

    /// Decodes a raw stop-bit signed integer, sign-extended from the high
    /// payload bit of the first byte.
    ///
    /// # Errors
    /// `FastError::Truncated` if the stop bit never arrives;
    /// `FastError::Overflow` past 64 bits.
    pub fn read_int_raw(&mut self) -> Result<i64> {
        let mut byte = self.next_byte()?;
        let mut result: i64 = if byte & 0x40 != 0 { -1 } else { 0 };
        loop {
            if result > (i64::MAX >> 7) || result < (i64::MIN >> 7) {
                return Err(FastError::Overflow { bits: 64 });
            }
            result = (result << 7) | i64::from(byte & 0x7F);
            if byte & 0x80 != 0 {
                return Ok(result);
            }
            byte = self.next_byte()?;
        }
    }

    /// Decodes an unsigned integer; `None` is the decoded null.
    ///
    /// # Errors
    /// `FastError::Truncated` or `FastError::Overflow` as for the raw form.
    pub fn read_uint(&mut self, nullable: bool) -> Result<Option<u64>> {
        let raw = self.read_uint_raw()?;
        if nullable {
            Ok(raw.checked_sub(1))
        } else {
            Ok(Some(raw))
        }
    }

    /// Decodes an unsigned integer narrowed to 32 bits.
    ///
    /// # Errors
    /// `FastError::Overflow` if the value does not fit a `u32`.
    pub fn read_u32(&mut self, nullable: bool) -> Result<Option<u32>> {
        match self.read_uint(nullable)? {
            None => Ok(None),
            Some(v) => u32::try_from(v)
                .map(Some)
                .map_err(|_| FastError::Overflow { bits: 32 }),
        }
    }

    /// Decodes a signed integer; `None` is the decoded null.
    ///
    /// # Errors
    /// `FastError::Truncated` or `FastError::Overflow` as for the raw form.
    pub fn read_int(&mut self, nullable: bool) -> Result<Option<i64>> {
        let raw = self.read_int_raw()?;
        if nullable {
            match raw {
                0 => Ok(None),
                v if v > 0 => Ok(Some(v - 1)),
                v => Ok(Some(v)),
            }
        } else {
            Ok(Some(raw))
        }
    }

    /// Decodes a signed integer narrowed to 32 bits.
    ///
    /// # Errors
    /// `FastError::Overflow` if the value does not fit an `i32`.
    pub fn read_i32(&mut self, nullable: bool) -> Result<Option<i32>> {
        match self.read_int(nullable)? {
            None => Ok(None),
            Some(v) => i32::try_from(v)
                .map(Some)
                .map_err(|_| FastError::Overflow { bits: 32 }),
        }
    }

    /// Decodes an ASCII string; `None` is the decoded null.
    ///
    /// The single byte `0x80` is the empty mandatory string or the optional
    /// null; `0x00 0x80` is the empty optional string.
    ///
    /// # Errors
    /// `FastError::Truncated` if the stop bit never arrives.
    pub fn read_ascii(&mut self, nullable: bool) -> Result<Option<String>> {
        let mut payload = Vec::new();
        loop {
            let byte = self.next_byte()?;
            payload.push(byte & 0x7F);
            if byte & 0x80 != 0 {
                break;
            }
        }

        if payload == [0x00] {
            return Ok(if nullable { None } else { Some(String::new()) });
        }
        if nullable && payload == [0x00, 0x00] {
            return Ok(Some(String::new()));
        }
        // Payload bytes are masked to 7 bits, so they are always valid UTF-8.
        Ok(Some(String::from_utf8_lossy(&payload).into_owned()))
    }

    /// Decodes a length-prefixed byte vector; `None` is the decoded null.
    ///
    /// # Errors
    /// `FastError::Truncated` if fewer bytes than the length prefix remain.
    pub fn read_byte_vector(&mut self, nullable: bool) -> Result<Option<Vec<u8>>> {
        match self.read_uint(nullable)? {
            None => Ok(None),
            Some(len) => self.read_exact_vec(len as usize).map(Some),
        }
    }

    fn read_exact_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len.min(4096));
        if len == 0 {
            return Ok(out);
        }
        if let Some(b) = self.peeked.take() {
            out.push(b);
        }
        let mut chunk = [0u8; 256];
        while out.len() < len {
            let want = (len - out.len()).min(chunk.len());
            match self.source.read(&mut chunk[..want]) {
                Ok(0) => return Err(FastError::Truncated),
                Ok(n) => out.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(out)
    }

    /// Reads one raw byte, used by the presence-map loader.
    pub(crate) fn read_raw_byte(&mut self) -> Result<u8> {
        self.next_byte()
    }

    fn next_byte(&mut self) -> Result<u8> {
        if let Some(b) = self.peeked.take() {
            return Ok(b);
        }
        let mut byte = [0u8; 1];
        loop {
            match self.source.read(&mut byte) {
                Ok(0) => return Err(FastError::Truncated),
                Ok(_) => return Ok(byte[0]),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}
