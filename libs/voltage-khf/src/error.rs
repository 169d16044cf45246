//! KH-F Protocol Error Types
//!
//! `DecodeError` describes why a received line was discarded. None of these
//! conditions is fatal: the monitor logs them and carries on with the next
//! line. `KhfError` covers failures of the collaborators around the protocol
//! (serial writes, configuration).

use thiserror::Error;

/// Result type for voltage-khf operations
pub type Result<T> = std::result::Result<T, KhfError>;

/// Reasons a line is dropped without publishing anything
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Message addressed to another device on the bus
    #[error("Address mismatch: expected {expected}, got {actual}")]
    AddressMismatch { expected: u8, actual: i64 },

    /// Declared checksum does not match the field tail
    #[error("Checksum mismatch: declared {declared}, computed {computed}")]
    ChecksumMismatch { declared: i64, computed: i64 },

    /// A field failed to tokenize; the whole message is abandoned
    #[error("Malformed field: {field}")]
    MalformedField { field: &'static str },

    /// Line does not start with a known message leader
    #[error("Unrecognized line")]
    UnrecognizedLine,
}

impl DecodeError {
    pub fn malformed(field: &'static str) -> Self {
        DecodeError::MalformedField { field }
    }

    /// Expected discards on a shared bus, as opposed to corrupted data
    pub fn is_filtered(&self) -> bool {
        matches!(
            self,
            DecodeError::AddressMismatch { .. } | DecodeError::UnrecognizedLine
        )
    }
}

/// Errors raised by the collaborators around the protocol
#[derive(Debug, Error, Clone)]
pub enum KhfError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// Transport errors (link closed, writer gone)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for KhfError {
    fn from(err: std::io::Error) -> Self {
        KhfError::Io(err.to_string())
    }
}

impl KhfError {
    pub fn transport(msg: impl Into<String>) -> Self {
        KhfError::Transport(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        KhfError::Config(msg.into())
    }
}
