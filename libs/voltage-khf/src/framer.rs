//! Line framer
//!
//! Accumulates serial bytes into a fixed buffer until a carriage return.
//! Line feeds are dropped. Bytes beyond capacity are discarded so an overlong
//! line arrives truncated instead of overflowing. A partial line survives
//! across calls, which lets a line straddle several scheduling cycles.

use crate::traits::ByteSource;

/// Default line buffer capacity, one slot kept free as terminator
pub const MAX_LINE_LEN: usize = 120;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Bounded CR-terminated line accumulator
#[derive(Debug, Clone)]
pub struct LineFramer<const N: usize = MAX_LINE_LEN> {
    buffer: [u8; N],
    /// Write position of the line being accumulated
    pos: usize,
    /// Length of the most recently completed line
    line_len: usize,
}

impl<const N: usize> Default for LineFramer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LineFramer<N> {
    pub fn new() -> Self {
        Self {
            buffer: [0; N],
            pos: 0,
            line_len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        N
    }

    /// Bytes held for the line still being accumulated
    pub fn pending(&self) -> usize {
        self.pos
    }

    /// Feed a single byte. Returns `true` when it completed a line.
    pub fn push(&mut self, byte: u8) -> bool {
        match byte {
            CR => {
                self.line_len = self.pos;
                self.pos = 0;
                true
            },
            LF => false,
            _ => {
                if self.pos + 1 < N {
                    self.buffer[self.pos] = byte;
                    self.pos += 1;
                    self.buffer[self.pos] = 0;
                }
                false
            },
        }
    }

    /// Drain available bytes until a line completes or the source runs dry.
    ///
    /// Bytes after the terminator stay in the source for the next call.
    pub fn read_line<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> bool {
        while source.available() {
            let Some(byte) = source.read() else {
                break;
            };
            if self.push(byte) {
                return true;
            }
        }
        false
    }

    /// The last completed line, without its terminator
    pub fn line(&self) -> &[u8] {
        &self.buffer[..self.line_len]
    }
}
