use thiserror::Error;

use crate::format::{Field, IssuerId};

#[derive(Error, Debug)]
pub enum FilterError {
    /// Input ended before a field was complete.
    #[error("truncated record: {field} needs {needed} bytes, only {available} available")]
    TruncatedRecord {
        field: Field,
        needed: u64,
        available: u64,
    },

    /// A bit was requested past the end of a payload.
    #[error("out of bits")]
    OutOfBits,

    /// The same issuer id appeared twice and the policy rejects duplicates.
    #[error("duplicate issuer {0}")]
    DuplicateIssuer(IssuerId),

    /// Rice parameter too wide for 64-bit values.
    #[error("rice parameter {0} exceeds 63")]
    InvalidRiceParameter(u8),

    /// A delta or running sum does not fit in 64 bits.
    #[error("decoded value overflows u64")]
    ValueOverflow,

    #[error("hash width {0} outside 1..=64")]
    InvalidHashWidth(u32),

    #[error("invalid issuer id: {0}")]
    InvalidIssuerId(String),

    /// The parser failed earlier in this session and accepts no more input.
    #[error("parser halted after an earlier error")]
    Halted,

    /// Propagated I/O error from the byte supply.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FilterError>;
