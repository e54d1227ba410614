//! Decoder for category codes arriving as ASCII text.
//!
//! The classifier writes small decimal integers with loose framing: usually
//! `"1\n"`, sometimes a bare `"3"` with no terminator at all. Digits
//! accumulate into a number, any other byte ends it, and a number still open
//! when the channel goes quiet is completed by `flush()`.

use std::collections::VecDeque;

#[derive(Debug, Default, Clone)]
pub struct CodeDecoder {
    pending: Option<u32>,
}

impl CodeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte; returns a code when this byte terminates a number.
    pub fn push(&mut self, byte: u8) -> Option<u8> {
        if byte.is_ascii_digit() {
            let digit = u32::from(byte - b'0');
            let acc = self.pending.unwrap_or(0);
            self.pending = Some(acc.saturating_mul(10).saturating_add(digit));
            None
        } else {
            self.complete()
        }
    }

    /// Complete a number left open by the last byte received.
    pub fn flush(&mut self) -> Option<u8> {
        self.complete()
    }

    /// True while digits have been seen but not yet terminated.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed a chunk, appending every completed code to `out`.
    pub fn decode_into(&mut self, bytes: &[u8], out: &mut VecDeque<u8>) {
        for &b in bytes {
            if let Some(code) = self.push(b) {
                out.push_back(code);
            }
        }
    }

    /// Decode one read's worth of bytes and complete any number left open
    /// at its end.
    ///
    /// The classifier may send a bare code with no terminator and then, once
    /// it sees the next `ok`, a second code; treating every read as a frame
    /// boundary keeps the two from running together.
    pub fn decode_chunk(&mut self, bytes: &[u8], out: &mut VecDeque<u8>) {
        self.decode_into(bytes, out);
        if let Some(code) = self.flush() {
            out.push_back(code);
        }
    }

    fn complete(&mut self) -> Option<u8> {
        let value = self.pending.take()?;
        match u8::try_from(value) {
            Ok(code) => Some(code),
            Err(_) => {
                tracing::warn!(value, "discarding out-of-range category code");
                None
            }
        }
    }
}
