/// What to do when an issuer id repeats inside one filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail the parse with [`crate::FilterError::DuplicateIssuer`].
    #[default]
    Reject,
    /// Keep the later record and log a warning.
    Overwrite,
}

/// Runtime configuration for parsing filters.
#[derive(Debug, Clone)]
pub struct Config {
    pub duplicate_policy: DuplicatePolicy,
    /// Chunk size used when pulling bytes from an `io::Read` supply.
    pub read_chunk_size: usize,
}

pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

impl Default for Config {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Reject,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}
