use std::collections::HashMap;
use std::io::Read;
use std::sync::OnceLock;

use sha1::{Digest, Sha1};
use tracing::debug;

use crate::config::Config;
use crate::format::{Header, IssuerId};
use crate::gcs::{decode_gcs, DecodedSet};
use crate::hasher::{hash_bits, CandidateHasher, TruncatedDigest};
use crate::stream::{feed_reader, FilterParser, Record, Retain, StreamSummary};
use crate::FilterError;

/// Answer of a revocation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The candidate is in the issuer's set (possibly a false positive).
    Present,
    /// The filter does not flag the candidate. Not proof of validity.
    Absent,
    /// The filter carries no set for this issuer.
    UnknownIssuer,
}

impl Verdict {
    fn of(set: &DecodedSet, candidate: u64) -> Self {
        if set.contains(candidate) {
            Verdict::Present
        } else {
            Verdict::Absent
        }
    }
}

/// Payload bytes of one issuer and its set, decoded on first lookup.
#[derive(Debug, Clone)]
struct IssuerSet {
    payload: Vec<u8>,
    decoded: OnceLock<DecodedSet>,
}

/// A fully materialized filter: header plus every issuer's payload bytes.
#[derive(Debug, Clone)]
pub struct CrlFilter {
    header: Header,
    sets: HashMap<IssuerId, IssuerSet>,
    order: Vec<IssuerId>,
}

impl CrlFilter {
    /// Parse a complete filter held in memory.
    pub fn from_bytes(data: &[u8], config: &Config) -> Result<Self, FilterError> {
        let mut parser = FilterParser::with_config(Retain::default(), config);
        let records = parser.feed(data)?;
        Ok(Self::assemble(parser.finish()?, records))
    }

    /// Parse a filter pulled from `reader` in `config.read_chunk_size` chunks.
    pub fn from_reader<R: Read>(reader: R, config: &Config) -> Result<Self, FilterError> {
        let mut parser = FilterParser::with_config(Retain::default(), config);
        let mut records = Vec::new();
        feed_reader(&mut parser, reader, config.read_chunk_size, |r| records.push(r))?;
        Ok(Self::assemble(parser.finish()?, records))
    }

    // The parser already applied the duplicate policy, so a repeat here
    // means overwrite.
    fn assemble(summary: StreamSummary, records: Vec<Record<Vec<u8>>>) -> Self {
        let mut filter = Self {
            header: summary.header,
            sets: HashMap::with_capacity(records.len()),
            order: Vec::with_capacity(records.len()),
        };
        for record in records {
            let set = IssuerSet {
                payload: record.payload,
                decoded: OnceLock::new(),
            };
            if filter.sets.insert(record.issuer, set).is_none() {
                filter.order.push(record.issuer);
            }
        }
        filter
    }

    pub fn header(&self) -> Header {
        self.header
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    pub fn log_p(&self) -> u8 {
        self.header.log_p
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Issuer ids in the order they first appeared in the input.
    pub fn issuers(&self) -> impl Iterator<Item = &IssuerId> {
        self.order.iter()
    }

    pub fn payload(&self, issuer: &IssuerId) -> Option<&[u8]> {
        self.sets.get(issuer).map(|set| set.payload.as_slice())
    }

    /// Decoded set of `issuer`, `None` when the filter has no record for it.
    ///
    /// The payload is decoded on the first call and cached; a decode error is
    /// not cached and repeats on every call.
    pub fn decode(&self, issuer: &IssuerId) -> Result<Option<&DecodedSet>, FilterError> {
        let Some(entry) = self.sets.get(issuer) else {
            return Ok(None);
        };
        if let Some(set) = entry.decoded.get() {
            return Ok(Some(set));
        }
        let set = decode_gcs(&entry.payload, self.header.log_p)?;
        Ok(Some(entry.decoded.get_or_init(|| set)))
    }

    /// Whether `issuer`'s set has been decoded already.
    pub fn is_decoded(&self, issuer: &IssuerId) -> bool {
        self.sets
            .get(issuer)
            .is_some_and(|set| set.decoded.get().is_some())
    }

    /// Look up an already hashed candidate value.
    pub fn check(&self, issuer: &IssuerId, candidate: u64) -> Result<Verdict, FilterError> {
        Ok(match self.decode(issuer)? {
            Some(set) => Verdict::of(set, candidate),
            None => Verdict::UnknownIssuer,
        })
    }

    /// Look up a certificate serial (big-endian bytes), hashing it with
    /// SHA-1 the way the producer does. The hash width is derived from the
    /// set size.
    pub fn check_serial(&self, issuer: &IssuerId, serial: &[u8]) -> Result<Verdict, FilterError> {
        self.check_serial_with::<Sha1>(issuer, serial)
    }

    pub fn check_serial_with<D: Digest>(
        &self,
        issuer: &IssuerId,
        serial: &[u8],
    ) -> Result<Verdict, FilterError> {
        let Some(set) = self.decode(issuer)? else {
            return Ok(Verdict::UnknownIssuer);
        };
        if set.is_empty() {
            return Ok(Verdict::Absent);
        }
        let nbits = hash_bits(set.len(), self.header.log_p);
        let candidate = TruncatedDigest::<D>::new(nbits)?.hash_serial(serial);
        debug!(%issuer, nbits, candidate, "checking serial");
        Ok(Verdict::of(set, candidate))
    }

    /// Look up an identifier with a caller-supplied hasher.
    pub fn check_with<H: CandidateHasher>(
        &self,
        issuer: &IssuerId,
        identifier: &str,
        hasher: &H,
    ) -> Result<Verdict, FilterError> {
        self.check(issuer, hasher.candidate(identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;

    fn filter_bytes(log_p: u8, records: &[([u8; 20], &[u8])]) -> Vec<u8> {
        let mut out = 1u32.to_le_bytes().to_vec();
        out.push(log_p);
        for (id, payload) in records {
            out.extend_from_slice(id);
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            out.extend_from_slice(payload);
        }
        out
    }

    #[test]
    fn materializes_and_checks() {
        let data = filter_bytes(7, &[([1; 20], &[0x86, 0xE6])]);
        let filter = CrlFilter::from_bytes(&data, &Config::default()).unwrap();
        let issuer = IssuerId::new([1; 20]);
        assert_eq!(filter.len(), 1);
        assert_eq!(filter.log_p(), 7);
        assert_eq!(filter.check(&issuer, 108).unwrap(), Verdict::Present);
        assert_eq!(filter.check(&issuer, 5).unwrap(), Verdict::Absent);
        assert_eq!(
            filter.check(&IssuerId::new([2; 20]), 6).unwrap(),
            Verdict::UnknownIssuer
        );
    }

    #[test]
    fn overwrite_keeps_later_payload() {
        let data = filter_bytes(3, &[([1; 20], &[0x01]), ([2; 20], &[]), ([1; 20], &[0x02])]);
        let config = Config {
            duplicate_policy: DuplicatePolicy::Overwrite,
            ..Config::default()
        };
        let filter = CrlFilter::from_bytes(&data, &config).unwrap();
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.payload(&IssuerId::new([1; 20])), Some(&[0x02][..]));
        let order: Vec<_> = filter.issuers().copied().collect();
        assert_eq!(order, vec![IssuerId::new([1; 20]), IssuerId::new([2; 20])]);
    }

    #[test]
    fn reader_and_bytes_agree() {
        let data = filter_bytes(7, &[([1; 20], &[0x86, 0xE6]), ([9; 20], &[0xFF])]);
        let config = Config {
            read_chunk_size: 1,
            ..Config::default()
        };
        let a = CrlFilter::from_bytes(&data, &config).unwrap();
        let b = CrlFilter::from_reader(data.as_slice(), &config).unwrap();
        assert_eq!(a.header(), b.header());
        for issuer in a.issuers() {
            assert_eq!(a.payload(issuer), b.payload(issuer));
        }
    }

    #[test]
    fn empty_set_serial_is_absent() {
        let data = filter_bytes(7, &[([1; 20], &[])]);
        let filter = CrlFilter::from_bytes(&data, &Config::default()).unwrap();
        assert_eq!(
            filter.check_serial(&IssuerId::new([1; 20]), &[0x01]).unwrap(),
            Verdict::Absent
        );
    }

    #[test]
    fn repeated_lookups_reuse_the_decoded_set() {
        let data = filter_bytes(7, &[([1; 20], &[0x86, 0xE6]), ([2; 20], &[0x86])]);
        let filter = CrlFilter::from_bytes(&data, &Config::default()).unwrap();
        let issuer = IssuerId::new([1; 20]);
        assert!(!filter.is_decoded(&issuer));
        for _ in 0..100 {
            assert_eq!(filter.check(&issuer, 6).unwrap(), Verdict::Present);
            assert_eq!(filter.check(&issuer, 7).unwrap(), Verdict::Absent);
        }
        assert!(filter.is_decoded(&issuer));
        let first = filter.decode(&issuer).unwrap().unwrap();
        let again = filter.decode(&issuer).unwrap().unwrap();
        assert!(std::ptr::eq(first, again));
        assert!(!filter.is_decoded(&IssuerId::new([2; 20])));
    }

    #[test]
    fn decode_error_is_not_cached() {
        // 0b0100_0000 with log_p 7: quotient 1, then only six remainder bits.
        let data = filter_bytes(7, &[([2; 20], &[0x40])]);
        let filter = CrlFilter::from_bytes(&data, &Config::default()).unwrap();
        let issuer = IssuerId::new([2; 20]);
        assert!(matches!(filter.check(&issuer, 6), Err(FilterError::OutOfBits)));
        assert!(matches!(filter.check(&issuer, 6), Err(FilterError::OutOfBits)));
        assert!(!filter.is_decoded(&issuer));
    }
}
