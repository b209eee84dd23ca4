//! Console session
//!
//! A [`Console`] owns the backbuffer and the device it is flushed to. All
//! drawing goes to the backbuffer; [`Console::flush`] is the only operation
//! that pushes cells to the display.
//!
//! # Example
//!
//! ```
//! use conbuf::{Attribute, Color, Console, MemoryDevice, Vector2};
//!
//! let device = MemoryDevice::new(Vector2::new(10, 3));
//! let mut console = Console::initialize(device).unwrap();
//!
//! let span = console
//!     .draw_string(Vector2::new(0, 0), Attribute::fg(Color::WHITE), "hi")
//!     .unwrap();
//! assert_eq!((span.first, span.last), (0, 1));
//!
//! console.flush().unwrap();
//! assert_eq!(console.device().flush_count(), 1);
//! ```

use std::fmt;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::text::{render, visible_len, Align, Span, TextBuffer};
use crate::core::{Attribute, Backbuffer, Color, Vector2};
use crate::device::{Device, TextMode};
use crate::error::Result;
use crate::input;

/// Console behaviors that can be toggled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleOption {
    /// Blinking text cursor
    Cursor,
    /// Mouse text selection (quick-edit)
    Highlighting,
}

/// A console session bound to one device
pub struct Console<D: Device> {
    device: D,
    buffer: Backbuffer,
    text: TextBuffer,
}

impl<D: Device> Console<D> {
    /// Take over `device` with the default configuration
    pub fn initialize(device: D) -> Result<Self> {
        Self::with_config(device, &Config::default())
    }

    /// Take over `device`, sizing the grid from its window unless `config`
    /// fixes a size
    pub fn with_config(mut device: D, config: &Config) -> Result<Self> {
        let window = device.drawable_size()?;
        let size = config.grid.resolve(window);
        info!(
            "Initializing console: grid {}x{}, window {}x{}",
            size.x, size.y, window.x, window.y
        );

        let mut console = Self {
            device,
            buffer: Backbuffer::new(size),
            text: TextBuffer::new(config.text.capacity),
        };

        // matching the window to the buffer also removes the scrollbar
        console.resize_device(size)?;

        if config.window.lock_size {
            console.device.lock_window_size()?;
        }
        if let Some(title) = &config.title {
            console.device.set_title(title)?;
        }
        if !config.highlighting {
            console.disable(ConsoleOption::Highlighting)?;
        }
        console.device.set_input_attribute(config.input.attribute())?;

        Ok(console)
    }

    /// Commit the backbuffer to the device in one batch
    pub fn flush(&mut self) -> Result<()> {
        self.buffer.commit(&mut self.device)
    }

    /// Resize the grid and the device window, discarding unflushed drawing
    ///
    /// # Errors
    ///
    /// If the device refuses the new size the grid goes back to its previous
    /// size (blank), so the next flush still matches the device window.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is not positive.
    pub fn set_grid_size(&mut self, size: Vector2) -> Result<()> {
        let previous = self.buffer.resize(size);
        if let Err(e) = self.resize_device(size) {
            warn!(
                "Grid resize to {}x{} failed, keeping {}x{}: {}",
                size.x, size.y, previous.x, previous.y, e
            );
            self.buffer.resize(previous);
            return Err(e);
        }
        debug!(
            "Grid resized from {}x{} to {}x{}",
            previous.x, previous.y, size.x, size.y
        );
        Ok(())
    }

    /// Grid size in characters
    pub fn size(&self) -> Vector2 {
        self.buffer.size()
    }

    /// Make the device window and buffer exactly `size`.
    ///
    /// A console window can never exceed its buffer, and the buffer can never
    /// be smaller than its window, so the buffer is grown first when the
    /// window would not fit, and the window is retried once after growing
    /// the buffer if the device still refuses it.
    fn resize_device(&mut self, size: Vector2) -> Result<()> {
        let info = self.device.screen_info()?;

        // too wide (right edge past the largest window)
        if size.x - 1 > info.max_window_size.x {
            debug!("Widening buffer to {} before resizing window", size.x);
            self.device
                .set_buffer_size(Vector2::new(size.x, info.buffer_size.y))?;
        }

        let info = self.device.screen_info()?;

        // too tall
        if size.y - 1 > info.max_window_size.y {
            debug!("Heightening buffer to {} before resizing window", size.y);
            self.device
                .set_buffer_size(Vector2::new(info.buffer_size.x, size.y))?;
        }

        if let Err(e) = self.device.set_window_rect(size) {
            warn!("Window resize to {}x{} rejected ({}), retrying", size.x, size.y, e);
            let info = self.device.screen_info()?;
            let buffer = Vector2::new(
                info.buffer_size.x.max(size.x),
                info.buffer_size.y.max(size.y),
            );
            if buffer != info.buffer_size {
                self.device.set_buffer_size(buffer)?;
            }
            self.device.set_window_rect(size)?;
        }

        self.device.set_buffer_size(size)
    }

    /// Shorthand for `fill(black on black, ' ')`
    pub fn clear(&mut self) {
        self.fill(Attribute::new(Color::BLACK, Color::BLACK), ' ');
    }

    /// Fill the whole grid with one character
    pub fn fill(&mut self, attribute: Attribute, character: char) {
        self.buffer.fill(attribute, character);
    }

    /// Fill row `y`
    pub fn hline(&mut self, y: i32, attribute: Attribute, character: char) {
        self.buffer.fill_row(y, attribute, character);
    }

    /// Fill column `x`
    pub fn vline(&mut self, x: i32, attribute: Attribute, character: char) {
        self.buffer.fill_column(x, attribute, character);
    }

    /// Draw a single character
    pub fn character(&mut self, position: Vector2, attribute: Attribute, character: char) {
        self.buffer.put(position, attribute, character);
    }

    /// Format `text` and draw it starting at `position`.
    ///
    /// Accepts anything `Display`, including `format_args!`. Returns the
    /// columns written; nothing is drawn if the formatted text overflows
    /// the text buffer.
    pub fn draw_string(
        &mut self,
        position: Vector2,
        attribute: Attribute,
        text: impl fmt::Display,
    ) -> Result<Span> {
        self.draw(position, attribute, Align::Left, text)
    }

    /// Format `text` and draw it horizontally centered on `position`
    pub fn draw_string_centered(
        &mut self,
        position: Vector2,
        attribute: Attribute,
        text: impl fmt::Display,
    ) -> Result<Span> {
        self.draw(position, attribute, Align::Center, text)
    }

    fn draw(
        &mut self,
        position: Vector2,
        attribute: Attribute,
        align: Align,
        text: impl fmt::Display,
    ) -> Result<Span> {
        let formatted = self.text.format(text)?;
        Ok(render(&mut self.buffer, position, attribute, align, formatted))
    }

    /// Visible length of `text` once formatted and stripped of escapes
    pub fn string_len(&mut self, text: impl fmt::Display) -> Result<usize> {
        Ok(visible_len(self.text.format(text)?))
    }

    /// Read-only view of the backbuffer
    pub fn backbuffer(&self) -> &Backbuffer {
        &self.buffer
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn title(&mut self) -> Result<String> {
        self.device.title()
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.device.set_title(title)
    }

    pub fn move_cursor(&mut self, position: Vector2) -> Result<()> {
        self.device.set_cursor_position(position)
    }

    /// Pointer position relative to the window, in characters
    pub fn mouse_position(&mut self) -> Result<Vector2> {
        self.device.pointer_position()
    }

    pub fn enable(&mut self, option: ConsoleOption) -> Result<()> {
        match option {
            ConsoleOption::Cursor => self.device.set_cursor_visible(true),
            ConsoleOption::Highlighting => {
                let mode = self.device.text_mode()?;
                self.device
                    .set_text_mode(mode | TextMode::QUICK_EDIT | TextMode::EXTENDED_FLAGS)
            }
        }
    }

    pub fn disable(&mut self, option: ConsoleOption) -> Result<()> {
        match option {
            ConsoleOption::Cursor => self.device.set_cursor_visible(false),
            ConsoleOption::Highlighting => {
                let mode = self.device.text_mode()?;
                self.device
                    .set_text_mode((mode - TextMode::QUICK_EDIT) | TextMode::EXTENDED_FLAGS)
            }
        }
    }

    pub fn enabled(&mut self, option: ConsoleOption) -> Result<bool> {
        match option {
            ConsoleOption::Cursor => self.device.cursor_visible(),
            ConsoleOption::Highlighting => Ok(self.device.text_mode()?.highlighting()),
        }
    }

    /// Discard pending input
    pub fn reset_input(&mut self) -> Result<()> {
        self.device.discard_input()
    }

    /// Color of text the user types
    pub fn input_color(&mut self, attribute: Attribute) -> Result<()> {
        self.device.set_input_attribute(attribute)
    }

    /// Show the cursor at `position`, run `read`, then restore the previous
    /// cursor visibility whether or not `read` succeeded
    fn with_cursor_at<T>(
        &mut self,
        position: Vector2,
        read: impl FnOnce(&mut D) -> Result<T>,
    ) -> Result<T> {
        let was_visible = self.device.cursor_visible()?;
        self.device.set_cursor_visible(true)?;

        let result = self
            .device
            .set_cursor_position(position)
            .and_then(|()| read(&mut self.device));

        if !was_visible {
            let restored = self.device.set_cursor_visible(false);
            return result.and_then(|value| restored.map(|()| value));
        }
        result
    }

    /// Read one line of text typed at `position`
    pub fn read_line(&mut self, position: Vector2) -> Result<String> {
        self.with_cursor_at(position, |device| device.read_line())
    }

    /// Read an integer typed at `position`; `Ok(None)` if the line does not
    /// parse, so the caller can prompt again
    pub fn read_integer(&mut self, position: Vector2) -> Result<Option<i64>> {
        let line = self.read_line(position)?;
        Ok(input::parse_integer(&line))
    }

    /// Read a byte (`0..=255`) typed at `position`; `Ok(None)` on invalid or
    /// out-of-range input
    pub fn read_byte(&mut self, position: Vector2) -> Result<Option<u8>> {
        let line = self.read_line(position)?;
        Ok(input::parse_byte(&line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Cell;
    use crate::device::MemoryDevice;
    use crate::error::ConsoleError;

    fn console(w: i32, h: i32) -> Console<MemoryDevice> {
        Console::initialize(MemoryDevice::new(Vector2::new(w, h))).unwrap()
    }

    fn white() -> Attribute {
        Attribute::new(Color::WHITE, Color::BLACK)
    }

    #[test]
    fn test_initialize_sizes_grid_from_window() {
        let console = console(80, 25);
        assert_eq!(console.size(), Vector2::new(80, 25));
        assert!(console.device().is_locked());
        assert_eq!(console.device().buffer_size(), Vector2::new(80, 25));
        assert!(console.backbuffer().cells().iter().all(|c| *c == Cell::BLANK));
    }

    #[test]
    fn test_initialize_with_config() {
        let mut config = Config::default();
        config.title = Some("demo".to_string());
        config.highlighting = false;
        config.grid.width = Some(40);
        config.window.lock_size = false;

        let mut console =
            Console::with_config(MemoryDevice::new(Vector2::new(80, 25)), &config).unwrap();
        assert_eq!(console.size(), Vector2::new(40, 25));
        assert_eq!(console.device().window_size(), Vector2::new(40, 25));
        assert!(!console.device().is_locked());
        assert_eq!(console.title().unwrap(), "demo");
        assert!(!console.enabled(ConsoleOption::Highlighting).unwrap());
    }

    #[test]
    fn test_draw_string_scenario() {
        let mut console = console(10, 3);
        let span = console.draw_string(Vector2::new(0, 0), white(), "hi").unwrap();

        assert_eq!(span, Span::new(0, 1));
        let grid = console.backbuffer();
        assert_eq!(grid.cell(Vector2::new(0, 0)), Some(&Cell::new('h', white())));
        assert_eq!(grid.cell(Vector2::new(1, 0)), Some(&Cell::new('i', white())));
        assert_eq!(grid.cell(Vector2::new(2, 0)), Some(&Cell::BLANK));
    }

    #[test]
    fn test_draw_string_centered_scenario() {
        let mut console = console(10, 3);
        assert_eq!(console.string_len("abcd").unwrap(), 4);
        let span = console
            .draw_string_centered(Vector2::new(5, 1), white(), "abcd")
            .unwrap();
        assert_eq!(span, Span::new(3, 6));
    }

    #[test]
    fn test_draw_string_formats_arguments() {
        let mut console = console(20, 2);
        let span = console
            .draw_string(Vector2::new(2, 1), white(), format_args!("#4Xhp {}/{}", 7, 10))
            .unwrap();
        assert_eq!(span, Span::new(2, 8));
        assert_eq!(console.string_len(format_args!("#4Xhp {}/{}", 7, 10)).unwrap(), 7);
        let cell = console.backbuffer().cell(Vector2::new(2, 1)).unwrap();
        assert_eq!(*cell, Cell::new('h', Attribute::new(Color::RED, Color::BLACK)));
    }

    #[test]
    fn test_overflow_leaves_grid_untouched() {
        let mut config = Config::default();
        config.text.capacity = 8;
        let mut console =
            Console::with_config(MemoryDevice::new(Vector2::new(20, 2)), &config).unwrap();
        console.fill(white(), '.');

        let err = console
            .draw_string(Vector2::new(0, 0), white(), "far too long for it")
            .unwrap_err();
        assert!(matches!(err, ConsoleError::FormatOverflow { capacity: 8 }));
        assert!(console.backbuffer().cells().iter().all(|c| *c == Cell::new('.', white())));
    }

    #[test]
    fn test_flush_commits_once() {
        let mut console = console(4, 2);
        console.character(Vector2::new(3, 1), white(), '@');
        assert_eq!(console.device().flush_count(), 0);

        console.flush().unwrap();
        assert_eq!(console.device().flush_count(), 1);
        assert_eq!(console.device().frame(), console.backbuffer().cells());
        assert_eq!(
            console.device().frame_cell(Vector2::new(3, 1)),
            Some(&Cell::new('@', white()))
        );
    }

    #[test]
    fn test_clear_and_lines() {
        let mut console = console(5, 4);
        console.clear();
        console.hline(0, white(), '=');
        console.vline(4, white(), '|');

        let grid = console.backbuffer();
        assert_eq!(grid.cell(Vector2::new(0, 0)).unwrap().character, '=');
        assert_eq!(grid.cell(Vector2::new(4, 0)).unwrap().character, '|');
        assert_eq!(grid.cell(Vector2::new(4, 3)).unwrap().character, '|');
        assert_eq!(
            grid.cell(Vector2::new(1, 2)),
            Some(&Cell::new(' ', Attribute::default()))
        );
    }

    #[test]
    fn test_set_grid_size_grows_buffer_first() {
        let mut console = console(80, 25);
        console.character(Vector2::new(0, 0), white(), 'x');
        console.set_grid_size(Vector2::new(100, 30)).unwrap();

        assert_eq!(console.size(), Vector2::new(100, 30));
        assert_eq!(console.device().window_size(), Vector2::new(100, 30));
        assert_eq!(console.device().buffer_size(), Vector2::new(100, 30));
        assert_eq!(console.backbuffer().cell(Vector2::new(0, 0)), Some(&Cell::BLANK));
    }

    #[test]
    fn test_set_grid_size_shrinks() {
        let mut console = console(80, 25);
        console.set_grid_size(Vector2::new(40, 10)).unwrap();
        assert_eq!(console.device().window_size(), Vector2::new(40, 10));
        assert_eq!(console.device().buffer_size(), Vector2::new(40, 10));
    }

    #[test]
    fn test_set_grid_size_retries_rejected_window() {
        // one column wider than the largest window: the edge check lets it
        // through, the device rejects it, the retry grows the buffer
        let mut console = console(80, 25);
        console.set_grid_size(Vector2::new(81, 25)).unwrap();
        assert_eq!(console.device().window_size(), Vector2::new(81, 25));
        assert_eq!(console.device().buffer_size(), Vector2::new(81, 25));
    }

    #[test]
    fn test_set_grid_size_beyond_device_limit_fails() {
        let device = MemoryDevice::new(Vector2::new(80, 25)).with_window_limit(Vector2::new(90, 40));
        let mut console = Console::initialize(device).unwrap();

        let err = console.set_grid_size(Vector2::new(120, 30)).unwrap_err();
        assert!(matches!(err, ConsoleError::Rejected { .. }));
        assert_eq!(console.device().window_size(), Vector2::new(80, 25));

        // the grid stays in step with the window it will be flushed to
        assert_eq!(console.size(), Vector2::new(80, 25));
        console.flush().unwrap();
        assert_eq!(console.device().frame_size(), Vector2::new(80, 25));
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn test_set_grid_size_zero_panics() {
        let mut console = console(10, 10);
        let _ = console.set_grid_size(Vector2::new(10, 0));
    }

    #[test]
    fn test_read_byte_restores_hidden_cursor() {
        let mut console = console(20, 5);
        console.disable(ConsoleOption::Cursor).unwrap();
        console.device_mut().push_input("200");
        console.device_mut().push_input("300");

        assert_eq!(console.read_byte(Vector2::new(3, 4)).unwrap(), Some(200));
        assert_eq!(console.device().last_read(), Some((Vector2::new(3, 4), true)));
        assert!(!console.enabled(ConsoleOption::Cursor).unwrap());

        // out of range is a parse failure, and the next read can retry
        assert_eq!(console.read_byte(Vector2::new(3, 4)).unwrap(), None);
        console.device_mut().push_input("7");
        assert_eq!(console.read_integer(Vector2::new(3, 4)).unwrap(), Some(7));
    }

    #[test]
    fn test_read_line_restores_cursor_on_error() {
        let mut console = console(20, 5);
        console.disable(ConsoleOption::Cursor).unwrap();

        assert!(console.read_line(Vector2::new(0, 0)).is_err());
        assert!(!console.enabled(ConsoleOption::Cursor).unwrap());
    }

    #[test]
    fn test_read_line_keeps_visible_cursor() {
        let mut console = console(20, 5);
        console.device_mut().push_input("hello world");
        assert_eq!(console.read_line(Vector2::new(1, 1)).unwrap(), "hello world");
        assert!(console.enabled(ConsoleOption::Cursor).unwrap());
    }

    #[test]
    fn test_highlighting_toggle() {
        let mut console = console(10, 2);
        assert!(console.enabled(ConsoleOption::Highlighting).unwrap());

        console.disable(ConsoleOption::Highlighting).unwrap();
        assert!(!console.enabled(ConsoleOption::Highlighting).unwrap());
        let mode = console.device_mut().text_mode().unwrap();
        assert!(mode.contains(TextMode::EXTENDED_FLAGS));

        console.enable(ConsoleOption::Highlighting).unwrap();
        assert!(console.enabled(ConsoleOption::Highlighting).unwrap());
    }

    #[test]
    fn test_session_passthroughs() {
        let mut console = console(10, 2);
        console.set_title("conbuf demo").unwrap();
        assert_eq!(console.title().unwrap(), "conbuf demo");

        console.move_cursor(Vector2::new(4, 1)).unwrap();
        assert_eq!(console.device().cursor(), Vector2::new(4, 1));

        console.device_mut().set_pointer(Vector2::new(2, 1));
        assert_eq!(console.mouse_position().unwrap(), Vector2::new(2, 1));

        let typed = Attribute::new(Color::GREEN | Color::INTENSE, Color::BLACK);
        console.input_color(typed).unwrap();
        assert_eq!(console.device().input_attribute(), typed);

        console.device_mut().push_input("pending");
        console.reset_input().unwrap();
        assert_eq!(console.device().pending_input(), 0);
    }

    #[test]
    fn test_borrowed_device() {
        let mut device = MemoryDevice::new(Vector2::new(6, 1));
        {
            let mut console = Console::initialize(&mut device).unwrap();
            console.draw_string(Vector2::ZERO, white(), "#20ok").unwrap();
            console.flush().unwrap();
        }
        assert_eq!(device.flush_count(), 1);
        assert_eq!(
            device.frame_cell(Vector2::new(1, 0)),
            Some(&Cell::new('k', Attribute::fg(Color::GREEN)))
        );
    }
}
