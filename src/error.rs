//! Typed error taxonomy for the cache/packages/languages readers (§4.8).
//!
//! Each subsystem gets its own enum so callers can match on failure kind
//! instead of string-sniffing; [`Error`] composes them for code that talks
//! to more than one subsystem at once.

use thiserror::Error;

/// Bad magic, unsupported version, truncated record, or a length prefix
/// that exceeds the remaining bytes in the stream. Fatal to the current
/// archive or catalog.
#[derive(Error, Debug)]
pub enum StructuralError {
    #[error("unexpected end of stream: wanted {wanted} bytes, had {available}")]
    UnexpectedEof { wanted: usize, available: usize },

    #[error("bad magic: expected {expected:02x?}, got {actual:02x?}")]
    BadMagic { expected: Vec<u8>, actual: Vec<u8> },

    #[error("unsupported version {0}")]
    UnsupportedVersion(i32),

    #[error("length prefix {len} exceeds remaining input")]
    LengthPrefixOverrun { len: i64 },

    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("duplicate package path: {0}")]
    DuplicatePackagePath(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Chunk size mismatch, lookback out of range, or an oversize run. Fatal
/// only to the entry currently being decompressed.
#[derive(Error, Debug)]
pub enum DecompressionError {
    #[error("chunk produced {actual} bytes, header declared {expected}")]
    ChunkSizeMismatch { expected: u16, actual: usize },

    #[error("stream produced {actual} bytes, expected {expected}")]
    StreamSizeMismatch { expected: usize, actual: usize },

    #[error("lookback {lookback} at output length {output_len} reads before the start of output")]
    LookbackUnderflow { lookback: usize, output_len: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The package text grammar failed to parse at a given byte offset.
#[derive(Error, Debug)]
#[error("grammar error at byte {offset}: {message}")]
pub struct GrammarError {
    pub offset: usize,
    pub message: String,
}

impl GrammarError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Missing parent package or an inheritance cycle. Fatal only to the
/// package tree being resolved.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("package has no parent registered for key {0}")]
    MissingParent(String),

    #[error("inheritance cycle detected at {0}")]
    Cycle(String),

    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// Crate-wide error, for call sites that cross subsystem boundaries (e.g.
/// a CLI binary driving the whole pipeline).
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Decompression(#[from] DecompressionError),

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
