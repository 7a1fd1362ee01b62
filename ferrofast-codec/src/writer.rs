/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Stop-bit stream writer.
//!
//! This module provides encoding of primitive values using FAST stop-bit
//! encoding: every byte carries 7 payload bits and the high bit is set only
//! on the final byte of a value. Nullable framing reserves value 0 as the
//! null sentinel and shifts non-negative values by +1.

use bytes::{BufMut, BytesMut};
use ferrofast_core::{FastError, Result};
use smallvec::SmallVec;

/// Stop-bit encoder over a growable byte buffer.
///
/// The writer is used for the deferred message body: the presence map is
/// physically prefixed on the wire but finalized last, so field bytes are
/// buffered here and flushed after the pmap.
#[derive(Debug, Default)]
pub struct StreamWriter {
    buffer: BytesMut,
}

impl StreamWriter {
    /// Creates a new writer with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Creates a new writer with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Encodes an unsigned integer.
    ///
    /// Nullable framing shifts the value by +1; null itself is written with
    /// [`StreamWriter::write_nil`].
    ///
    /// # Errors
    /// Returns `FastError::Overflow` if the nullable shift overflows 64 bits.
    pub fn write_uint(&mut self, nullable: bool, value: u64) -> Result<()> {
        let wire = if nullable {
            value
                .checked_add(1)
                .ok_or(FastError::Overflow { bits: 64 })?
        } else {
            value
        };
        self.put_uint_stop_bit(wire);
        Ok(())
    }

    /// Encodes a signed integer with sign extension into the high payload
    /// bit of the first wire byte.
    ///
    /// Nullable framing shifts non-negative values by +1; negative values
    /// are unchanged.
    ///
    /// # Errors
    /// Returns `FastError::Overflow` if the nullable shift overflows 64 bits.
    pub fn write_int(&mut self, nullable: bool, value: i64) -> Result<()> {
        let wire = if nullable && value >= 0 {
            value
                .checked_add(1)
                .ok_or(FastError::Overflow { bits: 64 })?
        } else {
            value
        };
        self.put_int_stop_bit(wire);
        Ok(())
    }

    /// Encodes an ASCII string, stop bit set on the last byte.
    ///
    /// An empty mandatory string is a single `0x80`; an empty optional
    /// string is `0x00 0x80` so that the single `0x80` stays reserved for
    /// null.
    pub fn write_ascii(&mut self, nullable: bool, value: &str) {
        let bytes = value.as_bytes();

        if bytes.is_empty() {
            if nullable {
                self.buffer.put_u8(0x00);
            }
            self.buffer.put_u8(0x80);
            return;
        }

        for (i, &b) in bytes.iter().enumerate() {
            if i == bytes.len() - 1 {
                self.buffer.put_u8(b | 0x80);
            } else {
                self.buffer.put_u8(b & 0x7F);
            }
        }
    }

    /// Encodes a byte vector: stop-bit length prefix, then the raw bytes.
    ///
    /// A null vector is written with [`StreamWriter::write_nil`], which for
    /// the length-prefixed form doubles as the null length field.
    ///
    /// # Errors
    /// Returns `FastError::Overflow` if the nullable length shift overflows.
    pub fn write_byte_vector(&mut self, nullable: bool, value: &[u8]) -> Result<()> {
        self.write_uint(nullable, value.len() as u64)?;
        self.buffer.extend_from_slice(value);
        Ok(())
    }

    /// Writes the null sentinel, a single `0x80` byte.
    pub fn write_nil(&mut self) {
        self.buffer.put_u8(0x80);
    }

    /// Appends raw pre-encoded bytes.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Returns the buffered bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer and returns its buffer.
    #[must_use]
    pub fn into_bytes(self) -> BytesMut {
        self.buffer
    }

    /// Returns the current buffer length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clears the buffer for reuse.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn put_uint_stop_bit(&mut self, value: u64) {
        let mut scratch: SmallVec<[u8; 10]> = SmallVec::new();
        let mut v = value;

        loop {
            scratch.push((v & 0x7F) as u8);
            v >>= 7;
            if v == 0 {
                break;
            }
        }

        // Scratch holds least-significant group first; the wire wants the
        // most-significant group first with the stop bit on the last byte.
        scratch[0] |= 0x80;
        for &b in scratch.iter().rev() {
            self.buffer.put_u8(b);
        }
    }

    fn put_int_stop_bit(&mut self, value: i64) {
        // Minimal group count such that sign extension reconstructs the
        // value: stop growing once the remaining bits agree with the sign
        // of the highest emitted payload bit.
        let mut groups = 1u32;
        while groups < 10 {
            let remaining = value >> (7 * groups);
            let sign = (value >> (7 * groups - 1)) & 1;
            if (remaining == 0 && sign == 0) || (remaining == -1 && sign == 1) {
                break;
            }
            groups += 1;
        }

        for i in (0..groups).rev() {
            let mut byte = ((value >> (7 * i)) & 0x7F) as u8;
            if i == 0 {
                byte |= 0x80;
            }
            self.buffer.put_u8(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut StreamWriter)) -> Vec<u8> {
        let mut writer = StreamWriter::new();
        f(&mut writer);
        writer.as_slice().to_vec()
    }

    #[test]
    fn test_write_uint_zero() {
        assert_eq!(written(|w| w.write_uint(false, 0).unwrap()), vec![0x80]);
    }

    #[test]
    fn test_write_uint_one() {
        assert_eq!(written(|w| w.write_uint(false, 1).unwrap()), vec![0x81]);
    }

    #[test]
    fn test_write_uint_multi_byte() {
        // 942 = 7 * 128 + 46
        assert_eq!(
            written(|w| w.write_uint(false, 942).unwrap()),
            vec![0x07, 0xAE]
        );
        assert_eq!(
            written(|w| w.write_uint(false, 942_755).unwrap()),
            vec![0x39, 0x45, 0xA3]
        );
    }

    #[test]
    fn test_write_uint_nullable_shift() {
        assert_eq!(written(|w| w.write_uint(true, 0).unwrap()), vec![0x81]);
        assert_eq!(written(|w| w.write_uint(true, 2).unwrap()), vec![0x83]);
    }

    #[test]
    fn test_write_uint_nullable_overflow() {
        let mut writer = StreamWriter::new();
        assert!(matches!(
            writer.write_uint(true, u64::MAX),
            Err(FastError::Overflow { bits: 64 })
        ));
    }

    #[test]
    fn test_write_int_sign_boundaries() {
        assert_eq!(written(|w| w.write_int(false, 3).unwrap()), vec![0x83]);
        assert_eq!(written(|w| w.write_int(false, -1).unwrap()), vec![0xFF]);
        assert_eq!(written(|w| w.write_int(false, 63).unwrap()), vec![0xBF]);
        assert_eq!(
            written(|w| w.write_int(false, 64).unwrap()),
            vec![0x00, 0xC0]
        );
        assert_eq!(written(|w| w.write_int(false, -64).unwrap()), vec![0xC0]);
        assert_eq!(
            written(|w| w.write_int(false, -65).unwrap()),
            vec![0x7F, 0xBF]
        );
    }

    #[test]
    fn test_write_int_nullable_shift() {
        assert_eq!(written(|w| w.write_int(true, 0).unwrap()), vec![0x81]);
        // Negative values do not shift.
        assert_eq!(written(|w| w.write_int(true, -1).unwrap()), vec![0xFF]);
    }

    #[test]
    fn test_write_ascii() {
        assert_eq!(
            written(|w| w.write_ascii(false, "Hi!")),
            vec![b'H', b'i', b'!' | 0x80]
        );
    }

    #[test]
    fn test_write_ascii_empty_mandatory() {
        assert_eq!(written(|w| w.write_ascii(false, "")), vec![0x80]);
    }

    #[test]
    fn test_write_ascii_empty_optional() {
        assert_eq!(written(|w| w.write_ascii(true, "")), vec![0x00, 0x80]);
    }

    #[test]
    fn test_write_byte_vector() {
        assert_eq!(
            written(|w| w.write_byte_vector(false, &[1, 2, 3]).unwrap()),
            vec![0x83, 1, 2, 3]
        );
        assert_eq!(
            written(|w| w.write_byte_vector(true, &[9]).unwrap()),
            vec![0x82, 9]
        );
    }

    #[test]
    fn test_write_nil() {
        assert_eq!(written(StreamWriter::write_nil), vec![0x80]);
    }

    #[test]
    fn test_clear() {
        let mut writer = StreamWriter::new();
        writer.write_uint(false, 42).unwrap();
        assert!(!writer.is_empty());
        writer.clear();
        assert!(writer.is_empty());
    }
}
