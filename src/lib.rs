//! conbuf - a double-buffered character grid for the Windows console
//!
//! Draw calls write (character, color) cells into an off-screen grid, and a
//! single flush hands the whole grid to the console at once, so frames never
//! tear.
//!
//! # Features
//!
//! - **Backbuffer**: row-major cell grid with point, line and full fills
//! - **Inline colors**: `#FB` escapes switch foreground/background mid-string
//! - **Centering and clipping**: strings center on a column and stop at the edge
//! - **Devices**: native Win32 console, any crossterm terminal, or headless memory
//!
//! # Module Hierarchy
//!
//! ```text
//! conbuf/
//! ├── core/      - colors, cells, backbuffer, escape-aware text
//! ├── device/    - display/input collaborators
//! ├── console    - Console session (draw + flush + input)
//! ├── input      - typed line parsing
//! ├── config     - ~/.conbuf/config.toml
//! └── error      - ConsoleError
//! ```

pub mod config;
pub mod console;
pub mod core;
pub mod device;
pub mod error;
pub mod input;

pub use config::Config;
pub use console::{Console, ConsoleOption};
pub use crate::core::{visible_len, Align, Attribute, Backbuffer, Cell, Color, Span, Vector2};
pub use device::{Device, MemoryDevice, ScreenInfo, TerminalDevice, TextMode};
#[cfg(windows)]
pub use device::Win32Console;
pub use error::{ConsoleError, Result};
