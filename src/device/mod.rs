//! Display/input devices a console session draws to.
//!
//! - **memory**: headless device that records frames (tests, `--headless`)
//! - **terminal**: crossterm-driven terminal
//! - **win32**: native Windows console (Windows only)
//!
//! A [`Device`] never sees individual draws. It receives the complete grid
//! through [`Device::write_cells`] once per flush.

use bitflags::bitflags;

use crate::core::{Attribute, Cell, Vector2};
use crate::error::Result;

pub mod memory;
pub mod terminal;
#[cfg(windows)]
pub mod win32;

pub use memory::MemoryDevice;
pub use terminal::TerminalDevice;
#[cfg(windows)]
pub use win32::Win32Console;

bitflags! {
    /// Console input mode bits
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct TextMode: u32 {
        const PROCESSED_INPUT = 0x0001;
        const LINE_INPUT      = 0x0002;
        const ECHO_INPUT      = 0x0004;
        const WINDOW_INPUT    = 0x0008;
        const MOUSE_INPUT     = 0x0010;
        const INSERT_MODE     = 0x0020;
        const QUICK_EDIT      = 0x0040;
        const EXTENDED_FLAGS  = 0x0080;
    }
}

impl TextMode {
    /// Text selection with the mouse is active
    pub fn highlighting(self) -> bool {
        self.contains(Self::QUICK_EDIT | Self::EXTENDED_FLAGS)
    }
}

/// Sizes reported by a device, in character cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScreenInfo {
    /// Size of the scrollable buffer behind the window
    pub buffer_size: Vector2,
    /// Visible window size
    pub window_size: Vector2,
    /// Largest window the device allows for the current buffer and font
    pub max_window_size: Vector2,
}

/// Platform display and input collaborator
pub trait Device {
    /// Query buffer, window and maximum window sizes
    fn screen_info(&mut self) -> Result<ScreenInfo>;

    /// Size of the visible window
    fn drawable_size(&mut self) -> Result<Vector2> {
        Ok(self.screen_info()?.window_size)
    }

    /// Resize the buffer behind the window
    fn set_buffer_size(&mut self, size: Vector2) -> Result<()>;

    /// Resize the visible window to `size` anchored at (0, 0)
    fn set_window_rect(&mut self, size: Vector2) -> Result<()>;

    /// Remove the window's resize and maximize affordances
    fn lock_window_size(&mut self) -> Result<()>;

    /// Write `cells` (row-major, `size.x * size.y` long) covering (0,0)-(size)
    fn write_cells(&mut self, size: Vector2, cells: &[Cell]) -> Result<()>;

    fn set_cursor_position(&mut self, position: Vector2) -> Result<()>;

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()>;

    fn cursor_visible(&mut self) -> Result<bool>;

    fn text_mode(&mut self) -> Result<TextMode>;

    fn set_text_mode(&mut self, mode: TextMode) -> Result<()>;

    fn title(&mut self) -> Result<String>;

    fn set_title(&mut self, title: &str) -> Result<()>;

    /// Block until one line of input is available, without the line ending
    fn read_line(&mut self) -> Result<String>;

    /// Pointer position relative to the window, in cells
    fn pointer_position(&mut self) -> Result<Vector2>;

    /// Drop any pending unread input
    fn discard_input(&mut self) -> Result<()>;

    /// Attribute applied to text the user types
    fn set_input_attribute(&mut self, attribute: Attribute) -> Result<()>;
}

impl<D: Device + ?Sized> Device for &mut D {
    fn screen_info(&mut self) -> Result<ScreenInfo> {
        (**self).screen_info()
    }

    fn set_buffer_size(&mut self, size: Vector2) -> Result<()> {
        (**self).set_buffer_size(size)
    }

    fn set_window_rect(&mut self, size: Vector2) -> Result<()> {
        (**self).set_window_rect(size)
    }

    fn lock_window_size(&mut self) -> Result<()> {
        (**self).lock_window_size()
    }

    fn write_cells(&mut self, size: Vector2, cells: &[Cell]) -> Result<()> {
        (**self).write_cells(size, cells)
    }

    fn set_cursor_position(&mut self, position: Vector2) -> Result<()> {
        (**self).set_cursor_position(position)
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        (**self).set_cursor_visible(visible)
    }

    fn cursor_visible(&mut self) -> Result<bool> {
        (**self).cursor_visible()
    }

    fn text_mode(&mut self) -> Result<TextMode> {
        (**self).text_mode()
    }

    fn set_text_mode(&mut self, mode: TextMode) -> Result<()> {
        (**self).set_text_mode(mode)
    }

    fn title(&mut self) -> Result<String> {
        (**self).title()
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        (**self).set_title(title)
    }

    fn read_line(&mut self) -> Result<String> {
        (**self).read_line()
    }

    fn pointer_position(&mut self) -> Result<Vector2> {
        (**self).pointer_position()
    }

    fn discard_input(&mut self) -> Result<()> {
        (**self).discard_input()
    }

    fn set_input_attribute(&mut self, attribute: Attribute) -> Result<()> {
        (**self).set_input_attribute(attribute)
    }
}
