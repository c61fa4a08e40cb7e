use std::fmt;
use std::io;
use std::path::Path;

#[derive(Debug)]
pub struct CliError {
    pub msg: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.msg.fmt(f)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Format a user friendly I/O error message with suggestions.
pub fn format_io_error(operation: &str, path: &Path, err: &io::Error) -> String {
    use io::ErrorKind::*;
    let suggestion = match err.kind() {
        NotFound => "Check that the file exists and the path is correct.",
        PermissionDenied => "Check permissions or run as a different user.",
        UnexpectedEof => "File appears truncated or corrupted.",
        _ => "Check the path and try again.",
    };
    format!(
        "Error {} '{}': {}. {}",
        operation,
        path.display(),
        err,
        suggestion
    )
}

/// Convert an I/O error into a CLI error with context.
pub fn io_cli_error(operation: &str, path: &Path, err: io::Error) -> CliError {
    CliError {
        msg: format_io_error(operation, path, &err),
        source: Some(Box::new(err)),
    }
}

pub fn simple_cli_error(msg: &str) -> CliError {
    CliError {
        msg: msg.to_string(),
        source: None,
    }
}

/// Convert a filter error into a CLI error with a hint.
pub fn filter_cli_error(context: &str, err: crate::FilterError) -> CliError {
    CliError {
        msg: format!("{}: {}", context, cli_hint(&err)),
        source: Some(Box::new(err)),
    }
}

/// Return an actionable hint for a filter error variant.
pub fn cli_hint(err: &crate::FilterError) -> String {
    use crate::FilterError::*;
    match err {
        TruncatedRecord { .. } => format!("{err}. Filter appears truncated, fetch it again."),
        OutOfBits | ValueOverflow => format!("{err}. Issuer payload is malformed."),
        DuplicateIssuer(_) => format!("{err}. Pass --allow-duplicates to keep the last record."),
        InvalidRiceParameter(_) => format!("{err}. Header is corrupt or from an unknown producer."),
        InvalidHashWidth(_) => format!("{err}. Check the hash width."),
        InvalidIssuerId(_) => format!("{err}. Issuer ids are 40 hex digits."),
        Halted => format!("{err}. This is a bug."),
        Io(io) => format!("{io}"),
    }
}
