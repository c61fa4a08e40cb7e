//! Golomb-coded set decoding.
//!
//! Each entry is a delta against the previous value, split into a unary
//! quotient (`q` zero bits closed by a one bit) and a `log_p`-bit binary
//! remainder. There is no entry count: the set ends when a unary scan runs
//! out of bits before finding its closing one bit. Running out of bits
//! inside a remainder is a malformed payload.

use tracing::debug;

use crate::bits::BitReader;
use crate::FilterError;

/// Largest Rice parameter whose shifts stay inside `u64`.
pub const MAX_LOG_P: u8 = 63;

/// Streaming decoder yielding the values of one Golomb-coded set in order.
///
/// After the first error the decoder is fused and yields nothing more.
#[derive(Debug, Clone)]
pub struct GolombSetDecoder<'a> {
    reader: BitReader<'a>,
    log_p: u8,
    previous: u64,
    done: bool,
}

impl<'a> GolombSetDecoder<'a> {
    pub fn new(reader: BitReader<'a>, log_p: u8) -> Result<Self, FilterError> {
        if log_p > MAX_LOG_P {
            return Err(FilterError::InvalidRiceParameter(log_p));
        }
        Ok(Self {
            reader,
            log_p,
            previous: 0,
            done: false,
        })
    }

    pub fn from_slice(payload: &'a [u8], log_p: u8) -> Result<Self, FilterError> {
        Self::new(BitReader::from_slice(payload), log_p)
    }

    /// Count zero bits up to the closing one bit. `None` marks the end of
    /// the set.
    fn read_unary(&mut self) -> Result<Option<u64>, FilterError> {
        let mut q = 0u64;
        while self.reader.has_more_bits() {
            if self.reader.next_bit()? {
                return Ok(Some(q));
            }
            q += 1;
        }
        Ok(None)
    }

    fn next_value(&mut self) -> Result<Option<u64>, FilterError> {
        let Some(q) = self.read_unary()? else {
            return Ok(None);
        };
        let r = self.reader.read_bits(self.log_p)?;
        let delta = q
            .checked_mul(1u64 << self.log_p)
            .and_then(|v| v.checked_add(r))
            .ok_or(FilterError::ValueOverflow)?;
        let value = self
            .previous
            .checked_add(delta)
            .ok_or(FilterError::ValueOverflow)?;
        self.previous = value;
        Ok(Some(value))
    }
}

impl Iterator for GolombSetDecoder<'_> {
    type Item = Result<u64, FilterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_value() {
            Ok(Some(v)) => Some(Ok(v)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Decode a whole payload into its ascending value sequence.
pub fn decode_gcs(payload: &[u8], log_p: u8) -> Result<DecodedSet, FilterError> {
    let values = GolombSetDecoder::from_slice(payload, log_p)?.collect::<Result<Vec<_>, _>>()?;
    debug!(
        payload_bytes = payload.len(),
        entries = values.len(),
        log_p,
        "decoded golomb set"
    );
    Ok(DecodedSet { values })
}

/// Values of one issuer's set, non-decreasing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedSet {
    values: Vec<u64>,
}

impl DecodedSet {
    /// Binary search for `candidate`.
    ///
    /// `false` only means the filter does not flag the candidate; `true` is
    /// subject to the encoding's false positive rate.
    pub fn contains(&self, candidate: u64) -> bool {
        self.values.binary_search(&candidate).is_ok()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u64> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> Option<u64> {
        self.values.first().copied()
    }

    pub fn max(&self) -> Option<u64> {
        self.values.last().copied()
    }

    pub fn into_vec(self) -> Vec<u64> {
        self.values
    }
}

impl<'a> IntoIterator for &'a DecodedSet {
    type Item = &'a u64;
    type IntoIter = std::slice::Iter<'a, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
