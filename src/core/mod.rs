//! Core rendering components.
//!
//! - **attr**: 4-bit console colors and packed attributes
//! - **grid**: coordinates, cells and the backbuffer
//! - **text**: inline color escapes, visible length and string rendering
//!
//! # Data Flow
//!
//! ```text
//! draw call ──► text::render ──► Backbuffer cells
//!                                     │
//!                 flush ──► Backbuffer::commit ──► Device::write_cells
//! ```

pub mod attr;
pub mod grid;
pub mod text;

pub use attr::{Attribute, Color};
pub use grid::{Backbuffer, Cell, Vector2};
pub use text::{visible_len, Align, Span, TextBuffer, TEXT_BUFFER_CAPACITY};
