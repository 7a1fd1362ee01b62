/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Presence map handling.
//!
//! The presence map (pmap) is a per-message bitmap indicating which
//! operator-controlled fields are present on the wire. Bits are appended in
//! template order during encode and consumed in the same order during
//! decode. On the wire the map is a stop-bit-terminated sequence of 7-bit
//! groups, most-significant bit first within each byte.

use crate::reader::StreamReader;
use ferrofast_core::Result;
use std::io::Read;

/// Growable presence-map bit sequence with a read cursor.
#[derive(Debug, Clone, Default)]
pub struct PresenceMap {
    bits: Vec<bool>,
    position: usize,
}

impl PresenceMap {
    /// Creates an empty presence map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bits: Vec::new(),
            position: 0,
        }
    }

    /// Creates a presence map from raw bits, cursor at 0.
    #[must_use]
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits, position: 0 }
    }

    /// Reads a presence map from the stream, consuming bytes up to and
    /// including the stop byte. The cursor is positioned at bit 0.
    ///
    /// # Errors
    /// Returns `FastError::Truncated` if the stop bit never arrives.
    pub fn read_from<R: Read>(reader: &mut StreamReader<R>) -> Result<Self> {
        let mut bits = Vec::new();
        loop {
            let byte = reader.read_raw_byte()?;
            for i in (0..7).rev() {
                bits.push((byte >> i) & 1 == 1);
            }
            if byte & 0x80 != 0 {
                return Ok(Self { bits, position: 0 });
            }
        }
    }

    /// Appends the next bit during encode.
    pub fn set_next_bit(&mut self, present: bool) {
        self.bits.push(present);
    }

    /// Consumes and returns the next bit during decode.
    ///
    /// Returns `false` once the map is exhausted: trailing zero bits of the
    /// final 7-bit group are indistinguishable from padding.
    #[inline]
    pub fn next_bit(&mut self) -> bool {
        if self.position < self.bits.len() {
            let bit = self.bits[self.position];
            self.position += 1;
            bit
        } else {
            false
        }
    }

    /// Returns the bit at the given position without consuming it.
    #[must_use]
    pub fn bit(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    /// Returns the number of bits in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns true if no bits have been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Moves the read cursor back to bit 0.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Serializes the map: 7 bits per byte, most-significant first, stop bit
    /// on the trailing byte. An empty map is the single byte `0x80`.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        if self.bits.is_empty() {
            return vec![0x80];
        }

        let mut result = Vec::with_capacity(self.bits.len().div_ceil(7));
        let mut bit_index = 0;

        while bit_index < self.bits.len() {
            let mut byte: u8 = 0;
            for i in (0..7).rev() {
                if bit_index < self.bits.len() && self.bits[bit_index] {
                    byte |= 1 << i;
                }
                bit_index += 1;
            }
            if bit_index >= self.bits.len() {
                byte |= 0x80;
            }
            result.push(byte);
        }

        result
    }
}
