//! Decoder for compact certificate revocation filters.
//!
//! A filter is a small header followed by one record per issuer, each
//! holding a Golomb-coded set of truncated hashes of revoked serials. The
//! container can be parsed either fully materialized ([`CrlFilter`]) or as a
//! bounded-memory stream over chunks of any size ([`FilterParser`] with the
//! [`Discard`] sink).

pub mod bits;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod gcs;
pub mod hasher;
pub mod io_utils;
pub mod logging;
pub mod stream;

pub use bits::BitReader;
pub use config::{Config, DuplicatePolicy};
pub use error::{FilterError, Result};
pub use filter::{CrlFilter, Verdict};
pub use format::{Field, Header, IssuerId, HEADER_LEN, ISSUER_ID_LEN};
pub use gcs::{decode_gcs, DecodedSet, GolombSetDecoder};
pub use hasher::{hash_bits, serial_hex, CandidateHasher, TruncatedDigest};
pub use stream::{
    feed_reader, scan_chunks, scan_reader, Discard, FilterParser, HeaderProgress,
    MaterializingParser, PayloadPreview, PayloadSink, Record, Retain, SkippingParser,
    StreamState, StreamSummary,
};
