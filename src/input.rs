//! Typed parsing of a line of user input
//!
//! Numbers are read from the first whitespace-separated token of the line.
//! Each read consumes the whole line, so a failed parse leaves nothing
//! behind for the next prompt.

/// Parse a signed integer
pub fn parse_integer(line: &str) -> Option<i64> {
    line.split_whitespace().next()?.parse().ok()
}

/// Parse a byte in `0..=255`; anything out of range fails
pub fn parse_byte(line: &str) -> Option<u8> {
    parse_integer(line).and_then(|value| u8::try_from(value).ok())
}
