//! Structured error types for sampletrace
//!
//! Every variant implements Display through thiserror.
//! Nothing here is recovered locally: every variant aborts the enclosing
//! encode, report or dump run.

use thiserror::Error;

/// The byte stream is not a well-formed report stream
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("not a stream generated by the report-sample command (bad magic)")]
    BadMagic,

    #[error("unsupported stream version {found}, expected {expected}")]
    UnsupportedVersion { found: u16, expected: u16 },

    #[error("stream ended before the zero-length terminator")]
    MissingTerminator,

    #[error("record truncated: expected {expected} bytes, got {actual}")]
    TruncatedRecord { expected: u32, actual: usize },

    #[error("malformed record body: {0}")]
    MalformedRecord(#[from] prost::DecodeError),

    #[error("unexpected record type")]
    UnknownRecordKind,
}

/// Cross-record references in a stream don't hold together
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("file id doesn't increase orderly, expected {expected}, really {actual}")]
    FileIdOutOfOrder { expected: u32, actual: u32 },

    #[error("unexpected symbol_id {symbol_id} for file_id {file_id}")]
    InvalidSymbolId { file_id: u32, symbol_id: i32 },

    #[error("file_id({file_id}) >= file count ({file_count})")]
    FileIdOutOfRange { file_id: u32, file_count: usize },

    #[error("symbol_id({symbol_id}) >= symbol count ({symbol_count}) in file_id({file_id})")]
    SymbolIdOutOfRange { file_id: u32, symbol_id: i32, symbol_count: u32 },
}

/// Failure while writing or reading a report stream
#[derive(Error, Debug)]
pub enum StreamError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("failed to encode record: {0}")]
    Encoding(String),

    #[error("record written after the stream terminator")]
    EncoderFinished,
}

/// Failure while turning a record file into a report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid record file: {0}")]
    InvalidInput(#[from] serde_json::Error),

    #[error("sample refers to event type {index}, but only {count} event types are known")]
    UnknownEventType { index: usize, count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_error_display() {
        let err = IntegrityError::SymbolIdOutOfRange { file_id: 2, symbol_id: 5, symbol_count: 5 };
        assert_eq!(err.to_string(), "symbol_id(5) >= symbol count (5) in file_id(2)");
    }

    #[test]
    fn test_file_order_error_names_both_ids() {
        let err = IntegrityError::FileIdOutOfOrder { expected: 1, actual: 3 };
        assert!(err.to_string().contains("expected 1"));
        assert!(err.to_string().contains("really 3"));
    }

    #[test]
    fn test_stream_error_wraps_format_error() {
        let err: StreamError = FormatError::UnsupportedVersion { found: 7, expected: 1 }.into();
        assert_eq!(err.to_string(), "unsupported stream version 7, expected 1");
    }
}
