//! Resumable record walker shared by the materializing and skipping parse
//! modes.
//!
//! Input arrives as chunks of any size. No chunk has to line up with a
//! field or record boundary, so partially received fixed-width fields are
//! assembled in a small scratch buffer and partially received payloads are
//! tracked as owed bytes. What happens to payload bytes is decided by the
//! [`PayloadSink`]: [`Retain`] keeps them, [`Discard`] drops them and keeps
//! a short preview.

use std::collections::HashSet;
use std::io::{self, Read};

use tracing::{debug, trace, warn};

use crate::config::{Config, DuplicatePolicy};
use crate::format::{
    Field, Header, IssuerId, ISSUER_ID_LEN, LOG_P_LEN, PAYLOAD_LENGTH_LEN, VERSION_LEN,
};
use crate::FilterError;

/// How much of the header a session has seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProgress {
    None,
    VersionKnown,
    Complete,
}

/// Carry-over state of a streaming session.
#[derive(Debug, Clone)]
pub struct StreamState {
    header_progress: HeaderProgress,
    version: u32,
    log_p: u8,
    expecting: Field,
    halted: bool,
    scratch: Vec<u8>,
    issuer: IssuerId,
    payload_length: u32,
    owed_payload_bytes: u32,
    record_offset: u64,
    bytes_consumed: u64,
    records: u64,
    seen: HashSet<IssuerId>,
}

impl Default for StreamState {
    fn default() -> Self {
        Self {
            header_progress: HeaderProgress::None,
            version: 0,
            log_p: 0,
            expecting: Field::Version,
            halted: false,
            scratch: Vec::with_capacity(ISSUER_ID_LEN),
            issuer: IssuerId::new([0; ISSUER_ID_LEN]),
            payload_length: 0,
            owed_payload_bytes: 0,
            record_offset: 0,
            bytes_consumed: 0,
            records: 0,
            seen: HashSet::new(),
        }
    }
}

impl StreamState {
    pub fn header_progress(&self) -> HeaderProgress {
        self.header_progress
    }

    pub fn header(&self) -> Option<Header> {
        match self.header_progress {
            HeaderProgress::Complete => Some(Header {
                version: self.version,
                log_p: self.log_p,
            }),
            _ => None,
        }
    }

    /// Payload bytes of the current record not yet seen.
    pub fn owed_payload_bytes(&self) -> u32 {
        self.owed_payload_bytes
    }

    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// True between records: nothing owed and no field half read.
    pub fn at_record_boundary(&self) -> bool {
        !self.halted && self.expecting == Field::IssuerId && self.scratch.is_empty()
    }

    /// Take an `N`-byte field from the front of `input`, buffering across
    /// calls when the chunk ends inside it.
    fn take<const N: usize>(&mut self, input: &mut &[u8]) -> Option<[u8; N]> {
        if self.scratch.is_empty() && input.len() >= N {
            let (head, rest) = input.split_at(N);
            *input = rest;
            self.bytes_consumed += N as u64;
            return head.try_into().ok();
        }
        let n = (N - self.scratch.len()).min(input.len());
        self.scratch.extend_from_slice(&input[..n]);
        *input = &input[n..];
        self.bytes_consumed += n as u64;
        if self.scratch.len() < N {
            return None;
        }
        let field = self.scratch.as_slice().try_into().ok();
        self.scratch.clear();
        field
    }

    fn truncation(&self) -> FilterError {
        match self.expecting {
            Field::Payload => FilterError::TruncatedRecord {
                field: Field::Payload,
                needed: self.payload_length as u64,
                available: (self.payload_length - self.owed_payload_bytes) as u64,
            },
            field => FilterError::TruncatedRecord {
                field,
                needed: field.width().unwrap_or_default() as u64,
                available: self.scratch.len() as u64,
            },
        }
    }
}

/// Receives the payload bytes of each record.
pub trait PayloadSink {
    type Payload;

    fn begin(&mut self, issuer: &IssuerId, length: u32);
    fn accept(&mut self, bytes: &[u8]);
    fn complete(&mut self) -> Self::Payload;
}

/// Upper bound on the capacity reserved up front from a declared length.
const RETAIN_RESERVE_LIMIT: usize = 1 << 20;

/// Keeps every payload byte.
#[derive(Debug, Default)]
pub struct Retain {
    buf: Vec<u8>,
}

impl PayloadSink for Retain {
    type Payload = Vec<u8>;

    fn begin(&mut self, _issuer: &IssuerId, length: u32) {
        self.buf = Vec::with_capacity((length as usize).min(RETAIN_RESERVE_LIMIT));
    }

    fn accept(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn complete(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

pub const PREVIEW_LEN: usize = 2;

/// First bytes of a skipped payload, kept for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PayloadPreview {
    bytes: [u8; PREVIEW_LEN],
    len: u8,
}

impl PayloadPreview {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The preview as a string of `0`/`1`, MSB first.
    pub fn bits(&self) -> String {
        self.as_bytes().iter().map(|b| format!("{b:08b}")).collect()
    }
}

/// Drops payload bytes, keeping only a [`PayloadPreview`].
#[derive(Debug, Default)]
pub struct Discard {
    preview: PayloadPreview,
}

impl PayloadSink for Discard {
    type Payload = PayloadPreview;

    fn begin(&mut self, _issuer: &IssuerId, _length: u32) {
        self.preview = PayloadPreview::default();
    }

    fn accept(&mut self, bytes: &[u8]) {
        let have = self.preview.len as usize;
        let n = (PREVIEW_LEN - have).min(bytes.len());
        self.preview.bytes[have..have + n].copy_from_slice(&bytes[..n]);
        self.preview.len += n as u8;
    }

    fn complete(&mut self) -> PayloadPreview {
        std::mem::take(&mut self.preview)
    }
}

/// One issuer record as reported by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<P> {
    pub issuer: IssuerId,
    pub payload_length: u32,
    /// Byte offset of the record's issuer id within the whole input.
    pub offset: u64,
    pub payload: P,
}

/// Totals of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub header: Header,
    pub records: u64,
    pub bytes_consumed: u64,
}

/// Chunk-driven filter parser.
#[derive(Debug)]
pub struct FilterParser<S> {
    state: StreamState,
    sink: S,
    duplicate_policy: DuplicatePolicy,
}

pub type MaterializingParser = FilterParser<Retain>;
pub type SkippingParser = FilterParser<Discard>;

impl<S: PayloadSink> FilterParser<S> {
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, &Config::default())
    }

    pub fn with_config(sink: S, config: &Config) -> Self {
        Self {
            state: StreamState::default(),
            sink,
            duplicate_policy: config.duplicate_policy,
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    pub fn header(&self) -> Option<Header> {
        self.state.header()
    }

    /// Process one chunk and return the records it completed.
    ///
    /// On error the parser halts; later calls return [`FilterError::Halted`].
    /// Records completed earlier in the failing chunk are dropped; use
    /// [`FilterParser::feed_into`] to keep them.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Record<S::Payload>>, FilterError> {
        let mut records = Vec::new();
        self.feed_into(chunk, &mut records)?;
        Ok(records)
    }

    /// Process one chunk, appending completed records to `out`.
    ///
    /// Records completed before an error stay in `out`.
    pub fn feed_into(
        &mut self,
        chunk: &[u8],
        out: &mut Vec<Record<S::Payload>>,
    ) -> Result<(), FilterError> {
        if self.state.halted {
            return Err(FilterError::Halted);
        }
        let before = out.len();
        self.walk(chunk, out).map_err(|e| {
            self.state.halted = true;
            debug!(
                error = %e,
                offset = self.state.bytes_consumed,
                completed = out.len() - before,
                "filter parser halted"
            );
            e
        })
    }

    /// End the session. Succeeds only on a record boundary after a complete
    /// header.
    pub fn finish(self) -> Result<StreamSummary, FilterError> {
        if self.state.halted {
            return Err(FilterError::Halted);
        }
        if !self.state.at_record_boundary() {
            return Err(self.state.truncation());
        }
        let header = self.state.header().ok_or_else(|| self.state.truncation())?;
        Ok(StreamSummary {
            header,
            records: self.state.records,
            bytes_consumed: self.state.bytes_consumed,
        })
    }

    fn walk(
        &mut self,
        mut input: &[u8],
        out: &mut Vec<Record<S::Payload>>,
    ) -> Result<(), FilterError> {
        while !input.is_empty() {
            match self.state.expecting {
                Field::Version => {
                    if let Some(bytes) = self.state.take::<VERSION_LEN>(&mut input) {
                        self.state.version = u32::from_le_bytes(bytes);
                        self.state.header_progress = HeaderProgress::VersionKnown;
                        self.state.expecting = Field::LogP;
                    }
                }
                Field::LogP => {
                    if let Some([log_p]) = self.state.take::<LOG_P_LEN>(&mut input) {
                        self.state.log_p = log_p;
                        self.state.header_progress = HeaderProgress::Complete;
                        debug!(version = self.state.version, log_p, "parsed filter header");
                        self.start_record();
                    }
                }
                Field::IssuerId => {
                    if let Some(bytes) = self.state.take::<ISSUER_ID_LEN>(&mut input) {
                        self.state.issuer = IssuerId::from(bytes);
                        self.state.expecting = Field::PayloadLength;
                    }
                }
                Field::PayloadLength => {
                    if let Some(bytes) = self.state.take::<PAYLOAD_LENGTH_LEN>(&mut input) {
                        let length = u32::from_le_bytes(bytes);
                        let issuer = self.state.issuer;
                        self.check_duplicate(issuer)?;
                        self.state.payload_length = length;
                        self.state.owed_payload_bytes = length;
                        self.sink.begin(&issuer, length);
                        if length == 0 {
                            out.push(self.complete_record());
                        } else {
                            self.state.expecting = Field::Payload;
                        }
                    }
                }
                Field::Payload => {
                    let n = (self.state.owed_payload_bytes as usize).min(input.len());
                    self.sink.accept(&input[..n]);
                    input = &input[n..];
                    self.state.owed_payload_bytes -= n as u32;
                    self.state.bytes_consumed += n as u64;
                    if self.state.owed_payload_bytes == 0 {
                        out.push(self.complete_record());
                    }
                }
            }
        }
        Ok(())
    }

    fn check_duplicate(&mut self, issuer: IssuerId) -> Result<(), FilterError> {
        if self.state.seen.insert(issuer) {
            return Ok(());
        }
        match self.duplicate_policy {
            DuplicatePolicy::Reject => Err(FilterError::DuplicateIssuer(issuer)),
            DuplicatePolicy::Overwrite => {
                warn!(%issuer, offset = self.state.record_offset, "duplicate issuer record");
                Ok(())
            }
        }
    }

    fn start_record(&mut self) {
        self.state.expecting = Field::IssuerId;
        self.state.record_offset = self.state.bytes_consumed;
    }

    fn complete_record(&mut self) -> Record<S::Payload> {
        let record = Record {
            issuer: self.state.issuer,
            payload_length: self.state.payload_length,
            offset: self.state.record_offset,
            payload: self.sink.complete(),
        };
        self.state.records += 1;
        trace!(
            issuer = %record.issuer,
            length = record.payload_length,
            offset = record.offset,
            "issuer record"
        );
        self.start_record();
        record
    }
}

/// Pull chunks of `chunk_size` bytes from `reader` into `parser`, handing
/// every completed record to `on_record`. Does not finish the session.
pub fn feed_reader<S, R, F>(
    parser: &mut FilterParser<S>,
    mut reader: R,
    chunk_size: usize,
    mut on_record: F,
) -> Result<(), FilterError>
where
    S: PayloadSink,
    R: Read,
    F: FnMut(Record<S::Payload>),
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut records = Vec::new();
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        let fed = parser.feed_into(&buf[..n], &mut records);
        records.drain(..).for_each(&mut on_record);
        fed?;
    }
}

/// Walk a whole filter from `reader` in skip mode.
pub fn scan_reader<R, F>(
    reader: R,
    config: &Config,
    on_record: F,
) -> Result<StreamSummary, FilterError>
where
    R: Read,
    F: FnMut(Record<PayloadPreview>),
{
    let mut parser = FilterParser::with_config(Discard::default(), config);
    feed_reader(&mut parser, reader, config.read_chunk_size, on_record)?;
    parser.finish()
}

/// Walk a filter delivered as explicit chunks in skip mode.
pub fn scan_chunks<'a, I>(
    chunks: I,
    config: &Config,
) -> Result<(Vec<Record<PayloadPreview>>, StreamSummary), FilterError>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut parser = FilterParser::with_config(Discard::default(), config);
    let mut records = Vec::new();
    for chunk in chunks {
        records.extend(parser.feed(chunk)?);
    }
    let summary = parser.finish()?;
    Ok((records, summary))
}
