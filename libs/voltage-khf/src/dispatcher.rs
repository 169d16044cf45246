//! Message dispatch
//!
//! A response line looks like `:r50=<fields>`. The two-character leader
//! `:r` marks a device response, the sub-code selects the record type.
//! After dispatch each message goes through the same three gates before any
//! value is trusted: address filter, checksum, then field decoding.

use tracing::trace;

use crate::checksum::verify_checksum;
use crate::error::DecodeError;
use crate::settings::SettingsRecord;
use crate::status::StatusRecord;
use crate::tokenizer::TokenCursor;

const RESPONSE_LEADER: &[u8] = b":r";
const STATUS_CODE: &[u8] = b"50=";
const SETTINGS_CODE: &[u8] = b"51=";
const PREFIX_LEN: usize = 5;

/// Message types understood by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Status,
    Settings,
}

impl MessageKind {
    /// Two-digit sub-code used on the wire
    pub fn code(&self) -> u8 {
        match self {
            MessageKind::Status => 50,
            MessageKind::Settings => 51,
        }
    }

    /// Request frame asking `address` for this message
    pub fn request_frame(&self, address: u8) -> String {
        format!(":R{}={},2,1,\r\n", self.code(), address)
    }
}

/// A recognised line, not yet validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMessage<'a> {
    pub kind: MessageKind,
    /// Field text after the `:rNN=` prefix
    pub fields: &'a [u8],
}

/// A fully validated and decoded message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Status(StatusRecord),
    Settings(SettingsRecord),
}

/// Identify the message type of a completed line
pub fn classify(line: &[u8]) -> Result<RawMessage<'_>, DecodeError> {
    if !line.starts_with(RESPONSE_LEADER) {
        return Err(DecodeError::UnrecognizedLine);
    }
    let code = &line[RESPONSE_LEADER.len()..];
    let kind = if code.starts_with(STATUS_CODE) {
        MessageKind::Status
    } else if code.starts_with(SETTINGS_CODE) {
        MessageKind::Settings
    } else {
        return Err(DecodeError::UnrecognizedLine);
    };
    Ok(RawMessage {
        kind,
        fields: &line[PREFIX_LEN..],
    })
}

/// Check address and checksum, leaving the cursor on the first data field
pub fn open_fields(fields: &[u8], address: u8) -> Result<TokenCursor<'_>, DecodeError> {
    let mut cursor = TokenCursor::new(fields);
    let actual = cursor.next_field("address")?;
    if actual != i64::from(address) {
        return Err(DecodeError::AddressMismatch {
            expected: address,
            actual,
        });
    }
    let declared = cursor.next_field("checksum")?;
    verify_checksum(declared, cursor.remaining())?;
    Ok(cursor)
}

impl RawMessage<'_> {
    /// Validate and decode. Nothing is returned unless every gate passed.
    pub fn decode(&self, address: u8) -> Result<Message, DecodeError> {
        let mut cursor = open_fields(self.fields, address)?;
        let message = match self.kind {
            MessageKind::Status => Message::Status(StatusRecord::decode(&mut cursor)?),
            MessageKind::Settings => Message::Settings(SettingsRecord::decode(&mut cursor)?),
        };
        trace!(kind = ?self.kind, "decoded");
        Ok(message)
    }
}

/// Classify and decode a completed line in one step
pub fn dispatch_line(line: &[u8], address: u8) -> Result<Message, DecodeError> {
    classify(line)?.decode(address)
}
