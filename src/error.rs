//! User-facing error categories, shared by the file validator and the parser.

use serde::Serialize;
use std::fmt;

/// Broad category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The file is not a PNG by name or MIME type.
    InvalidFileType,
    /// The file is larger than the configured limit.
    FileTooLarge,
    /// Bad signature, missing or duplicate IHDR, CRC mismatch, empty file.
    CorruptedFile,
    /// A structural problem in the chunk stream.
    ParseError,
    /// Reserved for allocation failures around the parser.
    MemoryError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::InvalidFileType => "invalid file type",
            ErrorKind::FileTooLarge => "file too large",
            ErrorKind::CorruptedFile => "corrupted file",
            ErrorKind::ParseError => "parse error",
            ErrorKind::MemoryError => "memory error",
        })
    }
}

/// A failure as shown to a user: a category, a message, and optionally
/// technical details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
