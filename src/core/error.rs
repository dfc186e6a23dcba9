//! Error types for gffmerge
//!
//! Defines all error types used throughout the library.

use thiserror::Error;

/// Main error type for gffmerge operations
#[derive(Debug, Error)]
pub enum GffMergeError {
    /// Record parsing errors
    #[error("Record parse error: {0}")]
    Parse(#[from] RecordParseError),

    /// Invalid genomic position string (e.g. for popup queries)
    #[error("Invalid genomic position: {0}")]
    InvalidPosition(String),

    /// Unsupported compression format
    #[error("Unsupported compression format: {0}")]
    UnsupportedCompression(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while parsing a single GFF3/GTF line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordParseError {
    /// Line is empty
    #[error("Empty line")]
    EmptyLine,

    /// Line has fewer than the nine mandatory columns
    #[error("Too few fields: expected {expected}, found {found}")]
    TooFewFields { expected: usize, found: usize },

    /// A field is not valid UTF-8
    #[error("Invalid UTF-8 in field: {0}")]
    InvalidUtf8(&'static str),

    /// A coordinate field is not a valid integer
    #[error("Invalid number in field {0}: {1}")]
    InvalidNumber(&'static str, String),

    /// Strand column is not '+', '-' or '.'
    #[error("Invalid strand: {0}")]
    InvalidStrand(String),
}

/// Result type alias for gffmerge operations
pub type Result<T> = std::result::Result<T, GffMergeError>;

/// Result type alias for line parsing operations
pub type ParseResult<T> = std::result::Result<T, RecordParseError>;
