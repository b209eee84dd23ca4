//! Escape-aware text rendering
//!
//! Drawn strings may carry inline color changes:
//!
//! | Sequence | Meaning |
//! |----------|---------|
//! | `#FB`    | set foreground to `F` and background to `B` (`0`-`9`, or `X` to keep) |
//! | `\#`     | escaped mark, consumed without drawing anything |
//! | other    | drawn as one cell with the current attribute |
//!
//! A color change applies to every following character until the next one.
//! `#` with fewer than two characters after it is drawn literally.
//!
//! Formatting happens before scanning: callers format into a [`TextBuffer`],
//! whose fixed capacity turns oversized text into an error instead of a
//! partial draw.

use std::fmt::{self, Write};
use std::str::Chars;

use super::attr::{Attribute, Color};
use super::grid::{Backbuffer, Vector2};
use crate::error::{ConsoleError, Result};

/// Default [`TextBuffer`] capacity in characters
pub const TEXT_BUFFER_CAPACITY: usize = 1024;

/// One unit of a scanned string
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    /// A character that occupies one cell
    Glyph(char),
    /// `#FB`: `None` leaves that half of the attribute unchanged
    SetColors {
        foreground: Option<Color>,
        background: Option<Color>,
    },
    /// `\#`
    EscapedMark,
}

impl Token {
    /// Apply a color change to `attribute`; glyphs and marks leave it alone
    pub fn apply(self, attribute: &mut Attribute) {
        if let Token::SetColors {
            foreground,
            background,
        } = self
        {
            if let Some(fg) = foreground {
                attribute.foreground = fg;
            }
            if let Some(bg) = background {
                attribute.background = bg;
            }
        }
    }
}

/// Left-to-right scanner over the escape grammar
#[derive(Clone, Debug)]
pub struct Tokens<'a> {
    chars: Chars<'a>,
}

/// Scan `text` into tokens
pub fn tokens(text: &str) -> Tokens<'_> {
    Tokens {
        chars: text.chars(),
    }
}

/// A color code: `X` keeps the current color, anything else is
/// `code - '0'` truncated to four bits
fn color_code(code: char) -> Option<Color> {
    if code == 'X' {
        None
    } else {
        Some(Color::from_nibble((code as u32).wrapping_sub('0' as u32) as u8))
    }
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let ch = self.chars.next()?;
        match ch {
            '\\' if self.chars.clone().next() == Some('#') => {
                self.chars.next();
                Some(Token::EscapedMark)
            }
            '#' => {
                let mut ahead = self.chars.clone();
                match (ahead.next(), ahead.next()) {
                    (Some(fg), Some(bg)) => {
                        self.chars = ahead;
                        Some(Token::SetColors {
                            foreground: color_code(fg),
                            background: color_code(bg),
                        })
                    }
                    _ => Some(Token::Glyph('#')),
                }
            }
            ch => Some(Token::Glyph(ch)),
        }
    }
}

/// Number of cells `text` occupies once escapes are interpreted
pub fn visible_len(text: &str) -> usize {
    tokens(text)
        .filter(|token| matches!(token, Token::Glyph(_)))
        .count()
}

/// Horizontal placement of drawn text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    /// Text starts at the given column
    #[default]
    Left,
    /// Text is centered on the given column, never starting before column 0
    Center,
}

/// Inclusive column range written by a draw, relative to its row.
///
/// An empty draw has `last == first - 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub first: i32,
    pub last: i32,
}

impl Span {
    pub const fn new(first: i32, last: i32) -> Self {
        Self { first, last }
    }

    pub fn len(&self) -> usize {
        (self.last - self.first + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }

    /// First column after the span, for chaining draws
    pub fn end(&self) -> i32 {
        self.last + 1
    }
}

/// Draw `text` into row `position.y` of `buffer`.
///
/// Characters stop at the right edge: once `position.x + drawn` reaches the
/// grid width nothing else in the string is scanned. Returns the columns
/// actually written.
///
/// # Panics
///
/// Panics if `position.y` is outside the grid or `position.x` is negative.
pub fn render(
    buffer: &mut Backbuffer,
    position: Vector2,
    mut attribute: Attribute,
    align: Align,
    text: &str,
) -> Span {
    assert!(
        position.x >= 0,
        "text column must not be negative, got {}",
        position.x
    );

    let width = buffer.width();
    let row = buffer.row_mut(position.y);

    let column = position.x as usize;
    let first = match align {
        Align::Left => column,
        Align::Center => column - (visible_len(text) / 2).min(column),
    };

    let mut drawn = 0usize;
    for token in tokens(text) {
        if column + drawn >= width {
            break;
        }
        match token {
            Token::Glyph(ch) => {
                row[first + drawn].character = ch;
                row[first + drawn].attribute = attribute;
                drawn += 1;
            }
            other => other.apply(&mut attribute),
        }
    }

    let first = first as i32;
    Span::new(first, first + drawn as i32 - 1)
}

/// Fixed-capacity buffer that formatted text is expanded into before drawing
#[derive(Debug, Clone)]
pub struct TextBuffer {
    text: String,
    capacity: usize,
    chars: usize,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new(TEXT_BUFFER_CAPACITY)
    }
}

impl TextBuffer {
    /// Create a buffer holding at most `capacity` characters
    pub fn new(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            capacity,
            chars: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Replace the contents with `text` formatted through `Display`.
    ///
    /// On overflow the buffer is left empty and the error names the capacity.
    pub fn format(&mut self, text: impl fmt::Display) -> Result<&str> {
        self.text.clear();
        self.chars = 0;
        if write!(self, "{}", text).is_err() {
            self.text.clear();
            self.chars = 0;
            return Err(ConsoleError::FormatOverflow {
                capacity: self.capacity,
            });
        }
        Ok(self.text.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Write for TextBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let count = s.chars().count();
        if self.chars + count > self.capacity {
            return Err(fmt::Error);
        }
        self.text.push_str(s);
        self.chars += count;
        Ok(())
    }
}
