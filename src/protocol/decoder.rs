//! Turns raw byte chunks from the port into display records.
//!
//! Words are decoded little-endian with a 4-byte stride; a trailing partial
//! word is dropped, never padded.
use std::fmt::Write;

use super::config::ReadInterpretation;
use crate::core::logs::DisplayRecord;

/// Upper bound on a single non-blocking read.
pub const READ_CHUNK_SIZE: usize = 512;

const WORD_SIZE: usize = 4;

/// Decode one chunk. Returns `None` when there is nothing to show: an empty
/// chunk, or a word-mode chunk shorter than one word.
pub fn decode(chunk: &[u8], mode: ReadInterpretation) -> Option<DisplayRecord> {
    if chunk.is_empty() {
        return None;
    }
    let body = match mode {
        ReadInterpretation::Text => decode_text(chunk),
        ReadInterpretation::Hex => decode_hex(chunk),
        ReadInterpretation::Int32 => decode_words(chunk, i32::from_le_bytes)?,
        ReadInterpretation::Uint32 => decode_words(chunk, u32::from_le_bytes)?,
    };
    Some(DisplayRecord::received(&body))
}

fn decode_text(chunk: &[u8]) -> String {
    let trimmed = match chunk {
        [head @ .., b'\n'] if chunk.len() > 2 => head,
        _ => chunk,
    };
    String::from_utf8_lossy(trimmed).into_owned()
}

fn decode_hex(chunk: &[u8]) -> String {
    chunk.iter().fold(String::with_capacity(chunk.len() * 3), |mut out, b| {
        let _ = write!(out, "{b:02X} ");
        out
    })
}

fn decode_words<T, F>(chunk: &[u8], from_bytes: F) -> Option<String>
where
    T: std::fmt::Display,
    F: Fn([u8; WORD_SIZE]) -> T,
{
    let words = chunk.chunks_exact(WORD_SIZE);
    if words.len() == 0 {
        return None;
    }
    let mut out = String::new();
    for word in words {
        let mut bytes = [0u8; WORD_SIZE];
        bytes.copy_from_slice(word);
        let _ = write!(out, "{} ", from_bytes(bytes));
    }
    Some(out)
}
