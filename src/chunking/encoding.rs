//! Strict text decoding for byte-level chunking
//!
//! Decoding distinguishes a prefix that merely ends mid-character from one
//! that contains malformed bytes. The first is a boundary problem the scanner
//! can step back from; the second ends the scan.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported source encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf16Le,
    Latin1,
    Ascii,
}

/// Result of decoding a byte range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Whole range decoded
    Complete(String),

    /// Range ends inside a character; `valid_up_to` bytes decode cleanly
    Incomplete { valid_up_to: usize },

    /// Invalid bytes begin `valid_up_to` bytes into the range
    Malformed { valid_up_to: usize },
}

impl TextEncoding {
    /// Stable name used in params and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf8",
            TextEncoding::Utf16Le => "utf16le",
            TextEncoding::Latin1 => "latin1",
            TextEncoding::Ascii => "ascii",
        }
    }

    /// Decode `bytes` strictly
    pub fn decode(&self, bytes: &[u8]) -> Decoded {
        match self {
            TextEncoding::Utf8 => decode_utf8(bytes),
            TextEncoding::Utf16Le => decode_utf16le(bytes),
            TextEncoding::Latin1 => Decoded::Complete(bytes.iter().map(|&b| char::from(b)).collect()),
            TextEncoding::Ascii => {
                match bytes.iter().position(|b| !b.is_ascii()) {
                    None => Decoded::Complete(bytes.iter().map(|&b| char::from(b)).collect()),
                    Some(valid_up_to) => Decoded::Malformed { valid_up_to },
                }
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "utf8" => Ok(TextEncoding::Utf8),
            "utf16le" | "ucs2" => Ok(TextEncoding::Utf16Le),
            "latin1" | "binary" | "iso88591" => Ok(TextEncoding::Latin1),
            "ascii" => Ok(TextEncoding::Ascii),
            other => Err(format!("Unsupported encoding: {}", other)),
        }
    }
}

fn decode_utf8(bytes: &[u8]) -> Decoded {
    match std::str::from_utf8(bytes) {
        Ok(text) => Decoded::Complete(text.to_string()),
        // error_len() is None only when the input ends mid-sequence
        Err(e) if e.error_len().is_none() => Decoded::Incomplete {
            valid_up_to: e.valid_up_to(),
        },
        Err(e) => Decoded::Malformed {
            valid_up_to: e.valid_up_to(),
        },
    }
}

fn decode_utf16le(bytes: &[u8]) -> Decoded {
    let even = bytes.len() - bytes.len() % 2;
    let mut units: Vec<u16> = bytes[..even]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    // A trailing high surrogate waits for its low half
    let dangling_high = matches!(units.last(), Some(&u) if (0xD800..0xDC00).contains(&u));
    if dangling_high {
        units.pop();
    }

    let mut text = String::with_capacity(units.len());
    let mut decoded_units = 0;
    for ch in char::decode_utf16(units.iter().copied()) {
        match ch {
            Ok(c) => {
                decoded_units += c.len_utf16();
                text.push(c);
            }
            Err(_) => {
                return Decoded::Malformed {
                    valid_up_to: decoded_units * 2,
                }
            }
        }
    }

    let valid_up_to = units.len() * 2;
    if valid_up_to == bytes.len() {
        Decoded::Complete(text)
    } else {
        Decoded::Incomplete { valid_up_to }
    }
}
