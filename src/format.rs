//! Wire layout of a revocation filter.
//!
//! ```text
//! [version: u32 LE][log_p: u8] { [issuer_id: 20][payload_length: u32 LE][payload] }*
//! ```
//!
//! Records repeat until the end of input. Payloads are Golomb-coded bit
//! streams read MSB-first within each byte.

use std::fmt;
use std::str::FromStr;

use crate::FilterError;

pub const VERSION_LEN: usize = 4;
pub const LOG_P_LEN: usize = 1;
/// Size of the fixed filter header in bytes.
pub const HEADER_LEN: usize = VERSION_LEN + LOG_P_LEN;
pub const ISSUER_ID_LEN: usize = 20;
pub const PAYLOAD_LENGTH_LEN: usize = 4;

/// Filter header. Parsed once per filter and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    /// Rice parameter; each looked-up value has a `2^-log_p` false positive rate.
    pub log_p: u8,
}

/// Opaque 20-byte issuer identifier, compared byte for byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IssuerId([u8; ISSUER_ID_LEN]);

impl IssuerId {
    pub const fn new(bytes: [u8; ISSUER_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ISSUER_ID_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; ISSUER_ID_LEN]> for IssuerId {
    fn from(bytes: [u8; ISSUER_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for IssuerId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for IssuerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for IssuerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IssuerId({})", self.to_hex())
    }
}

impl FromStr for IssuerId {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| FilterError::InvalidIssuerId(e.to_string()))?;
        let arr: [u8; ISSUER_ID_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            let msg = format!("expected {ISSUER_ID_LEN} bytes, got {}", b.len());
            FilterError::InvalidIssuerId(msg)
        })?;
        Ok(Self(arr))
    }
}

/// Names the field a parser was reading, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Version,
    LogP,
    IssuerId,
    PayloadLength,
    Payload,
}

impl Field {
    /// Fixed width of the field, `None` for the variable-length payload.
    pub fn width(self) -> Option<usize> {
        match self {
            Field::Version => Some(VERSION_LEN),
            Field::LogP => Some(LOG_P_LEN),
            Field::IssuerId => Some(ISSUER_ID_LEN),
            Field::PayloadLength => Some(PAYLOAD_LENGTH_LEN),
            Field::Payload => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Version => "version",
            Field::LogP => "log_p",
            Field::IssuerId => "issuer_id",
            Field::PayloadLength => "payload_length",
            Field::Payload => "payload",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_hex_roundtrip() {
        let id = IssuerId::new([0xAB; ISSUER_ID_LEN]);
        let parsed: IssuerId = id.to_hex().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn issuer_wrong_length_rejected() {
        assert!(matches!(
            "abcd".parse::<IssuerId>(),
            Err(FilterError::InvalidIssuerId(_))
        ));
        assert!("zz".parse::<IssuerId>().is_err());
    }

    #[test]
    fn field_widths() {
        assert_eq!(Field::Version.width(), Some(4));
        assert_eq!(Field::IssuerId.width(), Some(20));
        assert_eq!(Field::Payload.width(), None);
    }
}
