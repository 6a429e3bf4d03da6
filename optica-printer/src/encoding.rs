//! Latin code page utilities for thermal printers
//!
//! The printers in the shops run the WPC1252 code page, so text is sent as
//! Windows-1252. Every mappable character is one byte wide, which keeps the
//! fixed-column receipt layout a matter of counting characters.

use encoding_rs::WINDOWS_1252;

/// ESC t n code page number for WPC1252
pub const CODE_PAGE_WPC1252: u8 = 16;

/// Byte substituted for characters the code page cannot represent
const UNMAPPABLE: u8 = b'?';

/// Get the printed width of a string in columns
///
/// Windows-1252 is single-byte, so each character takes one column.
pub fn latin_width(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string to at most `max_width` columns
pub fn truncate_latin(s: &str, max_width: usize) -> String {
    s.chars().take(max_width).collect()
}

/// Pad a string to a specific column width
///
/// If the string is longer than the width, it will be truncated.
pub fn pad_latin(s: &str, width: usize, align_right: bool) -> String {
    let current_width = latin_width(s);
    if current_width >= width {
        return truncate_latin(s, width);
    }
    let spaces = width - current_width;
    if align_right {
        format!("{}{}", " ".repeat(spaces), s)
    } else {
        format!("{}{}", s, " ".repeat(spaces))
    }
}

/// Encode UTF-8 text to Windows-1252
///
/// ASCII passes through unchanged. Characters outside the code page become
/// `?` instead of the HTML numeric references `encoding_rs` would emit.
pub fn encode_latin(s: &str) -> Vec<u8> {
    if s.is_ascii() {
        return s.as_bytes().to_vec();
    }

    let mut out = Vec::with_capacity(s.len());
    let mut tmp = [0u8; 4];
    for c in s.chars() {
        let (bytes, _, had_errors) = WINDOWS_1252.encode(c.encode_utf8(&mut tmp));
        if had_errors {
            out.push(UNMAPPABLE);
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}
