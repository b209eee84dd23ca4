//! Error types for conbuf.
//!
//! Contract violations (coordinates outside the grid, zero-sized grids) are
//! not represented here: they panic in every build profile. Everything that
//! depends on the host console or on caller-supplied text is reported through
//! [`ConsoleError`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::Vector2;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Formatted text exceeds the {capacity} character text buffer")]
    FormatOverflow { capacity: usize },

    #[error("Failed to {op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[cfg(windows)]
    #[error("Failed to {op}: {source}")]
    Win32 {
        op: &'static str,
        #[source]
        source: windows::core::Error,
    },

    #[error("Device rejected {op} to {}x{}", .requested.x, .requested.y)]
    Rejected { op: &'static str, requested: Vector2 },

    #[error("Device does not support {0}")]
    Unsupported(&'static str),

    #[error("Invalid config file {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, ConsoleError>;

impl ConsoleError {
    /// Wrap an I/O failure with the operation that produced it
    pub(crate) fn io(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io { op, source }
    }

    #[cfg(windows)]
    pub(crate) fn win32(op: &'static str) -> impl FnOnce(windows::core::Error) -> Self {
        move |source| Self::Win32 { op, source }
    }
}
