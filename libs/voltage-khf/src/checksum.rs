//! Checksum verification
//!
//! The checksum field covers every field after itself: `(sum % 255) + 1`.
//! Reserved fields count too, so the whole tail is consumed rather than a
//! fixed number of fields.

use tracing::trace;

use crate::error::DecodeError;
use crate::tokenizer::TokenCursor;

const CHECKSUM_MODULUS: i64 = 255;

/// Compute the checksum of a field tail, stopping at the first token that
/// fails to parse.
pub fn compute_checksum(tail: &[u8]) -> i64 {
    let mut cursor = TokenCursor::new(tail);
    let mut total: i64 = 0;
    while let Some(value) = cursor.try_next() {
        total = total.wrapping_add(value);
    }
    (total % CHECKSUM_MODULUS) + 1
}

/// Compare a declared checksum against the tail that follows it
pub fn verify_checksum(declared: i64, tail: &[u8]) -> Result<(), DecodeError> {
    let computed = compute_checksum(tail);
    trace!(declared, computed, "checksum");
    if computed == declared {
        Ok(())
    } else {
        Err(DecodeError::ChecksumMismatch { declared, computed })
    }
}
