//! Error type for PE decoding.

use thiserror::Error;

/// Error produced while decoding a PE image.
///
/// A semantic violation is always [`PeError::Malformed`] with the absolute
/// offset of the violated field. Running out of input is a distinct
/// condition and is never reported as a malformed structure.
#[derive(Error, Debug)]
pub enum PeError {
    /// A structural rule of the format was violated.
    #[error("malformed PE at offset {offset:#x}: {reason}")]
    Malformed { offset: u64, reason: String },

    /// The byte source ended in the middle of a read.
    #[error("unexpected end of data at offset {offset:#x}: {needed} more bytes required")]
    UnexpectedEof { offset: u64, needed: usize },

    /// I/O failure while writing extracted resources.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PeError {
    /// Creates a new Malformed error.
    pub fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        Self::Malformed { offset, reason: reason.into() }
    }
}
