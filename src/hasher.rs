//! Mapping of certificate identifiers into the truncated value domain of a
//! filter.
//!
//! The producer hashes the lowercase hex rendering of a serial number (no
//! prefix, no leading zeros) and keeps the low `nbits` bits of the digest
//! read as a big-endian integer, where
//! `nbits = ceil(log2(entry_count)) + log_p`. The width is not stored in the
//! filter; callers learn it out of band or derive it from a decoded set.

use std::marker::PhantomData;

use sha1::{Digest, Sha1};

use crate::FilterError;

/// Maps an external identifier to a candidate value for membership tests.
pub trait CandidateHasher {
    fn candidate(&self, identifier: &str) -> u64;
}

/// Digest of the identifier truncated to its low `nbits` bits.
#[derive(Debug, Clone, Copy)]
pub struct TruncatedDigest<D = Sha1> {
    nbits: u32,
    _digest: PhantomData<fn() -> D>,
}

impl<D: Digest> TruncatedDigest<D> {
    pub fn new(nbits: u32) -> Result<Self, FilterError> {
        if !(1..=64).contains(&nbits) {
            return Err(FilterError::InvalidHashWidth(nbits));
        }
        Ok(Self {
            nbits,
            _digest: PhantomData,
        })
    }

    pub fn nbits(&self) -> u32 {
        self.nbits
    }

    pub fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        let digest = D::digest(bytes);
        let tail = &digest[digest.len().saturating_sub(8)..];
        let value = tail.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
        if self.nbits < 64 {
            value & ((1u64 << self.nbits) - 1)
        } else {
            value
        }
    }

    /// Hash a serial number given as big-endian bytes.
    pub fn hash_serial(&self, serial: &[u8]) -> u64 {
        self.hash_bytes(serial_hex(serial).as_bytes())
    }
}

impl<D: Digest> CandidateHasher for TruncatedDigest<D> {
    fn candidate(&self, identifier: &str) -> u64 {
        self.hash_bytes(identifier.as_bytes())
    }
}

/// Lowercase hex of the serial's integer value without leading zeros.
pub fn serial_hex(serial: &[u8]) -> String {
    let hex = hex::encode(serial);
    match hex.trim_start_matches('0') {
        "" => "0".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Hash width the producer uses for a set of `entry_count` values.
///
/// The log term is computed in floating point as `ceil(ln(n) / ln(2))`, the
/// same way the producer does it. That differs from an exact integer
/// ceil-log2 at some exact powers of two (2^29, 2^31, 2^39 among them),
/// where the float quotient lands just above the integer and one more bit is
/// used; matching the producer matters more than the exact logarithm.
pub fn hash_bits(entry_count: usize, log_p: u8) -> u32 {
    let log_term = if entry_count == 0 {
        0
    } else {
        ((entry_count as f64).ln() / 2f64.ln()).ceil() as u32
    };
    log_term + log_p as u32
}
