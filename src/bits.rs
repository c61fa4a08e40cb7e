use crate::FilterError;

/// MSB-first bit reader over a finite byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Read the next bit. Fails with [`FilterError::OutOfBits`] once every
    /// bit has been consumed.
    pub fn next_bit(&mut self) -> Result<bool, FilterError> {
        if !self.has_more_bits() {
            return Err(FilterError::OutOfBits);
        }
        let bit = ((self.data[self.pos / 8] >> (7 - (self.pos % 8))) & 1) != 0;
        self.pos += 1;
        Ok(bit)
    }

    /// True while any bit, including the rest of a partly read byte, is left.
    pub fn has_more_bits(&self) -> bool {
        self.pos < self.data.len() * 8
    }

    pub fn bits_read(&self) -> usize {
        self.pos
    }

    pub fn bits_remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// Read `n` bits as an unsigned integer, first bit most significant.
    pub fn read_bits(&mut self, n: u8) -> Result<u64, FilterError> {
        debug_assert!(n <= 64);
        let mut value = 0u64;
        for _ in 0..n {
            value = (value << 1) | self.next_bit()? as u64;
        }
        Ok(value)
    }
}
