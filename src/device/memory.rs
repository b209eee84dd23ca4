//! Headless in-memory device
//!
//! Records the last committed frame and every piece of console state a
//! session touches. It also models the console rule that the window can
//! never be larger than the buffer behind it, so size negotiation can be
//! exercised without a real console.

use std::collections::VecDeque;
use std::io;

use super::{Device, ScreenInfo, TextMode};
use crate::core::{Attribute, Cell, Vector2};
use crate::error::{ConsoleError, Result};

/// Window size limit when none is configured (the console's `SHORT` range)
const UNLIMITED: Vector2 = Vector2::new(i16::MAX as i32, i16::MAX as i32);

#[derive(Debug, Clone)]
pub struct MemoryDevice {
    buffer_size: Vector2,
    window_size: Vector2,
    window_limit: Vector2,
    locked: bool,
    frame: Vec<Cell>,
    frame_size: Vector2,
    flushes: usize,
    cursor: Vector2,
    cursor_visible: bool,
    mode: TextMode,
    title: String,
    input: VecDeque<String>,
    pointer: Vector2,
    input_attribute: Attribute,
    /// Cursor position and visibility observed by the last `read_line`
    last_read: Option<(Vector2, bool)>,
}

impl MemoryDevice {
    /// Create a device whose buffer and window are both `window_size`
    pub fn new(window_size: Vector2) -> Self {
        Self {
            buffer_size: window_size,
            window_size,
            window_limit: UNLIMITED,
            locked: false,
            frame: Vec::new(),
            frame_size: Vector2::ZERO,
            flushes: 0,
            cursor: Vector2::ZERO,
            cursor_visible: true,
            mode: TextMode::PROCESSED_INPUT
                | TextMode::LINE_INPUT
                | TextMode::ECHO_INPUT
                | TextMode::INSERT_MODE
                | TextMode::QUICK_EDIT
                | TextMode::EXTENDED_FLAGS,
            title: String::from("conbuf"),
            input: VecDeque::new(),
            pointer: Vector2::ZERO,
            input_attribute: Attribute::default(),
            last_read: None,
        }
    }

    /// Cap the window size independently of the buffer (font / monitor limit)
    pub fn with_window_limit(mut self, limit: Vector2) -> Self {
        self.window_limit = limit;
        self
    }

    /// Queue a line for `read_line`
    pub fn push_input(&mut self, line: impl Into<String>) {
        self.input.push_back(line.into());
    }

    pub fn set_pointer(&mut self, position: Vector2) {
        self.pointer = position;
    }

    /// Cells of the last committed frame
    pub fn frame(&self) -> &[Cell] {
        &self.frame
    }

    pub fn frame_size(&self) -> Vector2 {
        self.frame_size
    }

    /// Cell of the last committed frame
    pub fn frame_cell(&self, position: Vector2) -> Option<&Cell> {
        let size = self.frame_size;
        if !(0..size.x).contains(&position.x) || !(0..size.y).contains(&position.y) {
            return None;
        }
        self.frame.get((position.x + position.y * size.x) as usize)
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    pub fn buffer_size(&self) -> Vector2 {
        self.buffer_size
    }

    pub fn window_size(&self) -> Vector2 {
        self.window_size
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn cursor(&self) -> Vector2 {
        self.cursor
    }

    pub fn input_attribute(&self) -> Attribute {
        self.input_attribute
    }

    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    pub fn last_read(&self) -> Option<(Vector2, bool)> {
        self.last_read
    }

    fn max_window_size(&self) -> Vector2 {
        Vector2::new(
            self.buffer_size.x.min(self.window_limit.x),
            self.buffer_size.y.min(self.window_limit.y),
        )
    }

    /// Render the last frame as text (for debugging)
    pub fn dump(&self) -> String {
        let size = self.frame_size;
        let mut output = String::new();

        output.push_str(&format!("=== Frame {}x{} ===\n", size.x, size.y));
        output.push_str(&format!(
            "Cursor: ({}, {}) visible={}\n",
            self.cursor.x, self.cursor.y, self.cursor_visible
        ));
        output.push_str(&format!("Title: {}\n", self.title));
        output.push_str("─".repeat(size.x.max(0) as usize).as_str());
        output.push('\n');

        for row in self.frame.chunks(size.x.max(1) as usize) {
            for cell in row {
                let ch = if cell.character == '\0' { ' ' } else { cell.character };
                output.push(ch);
            }
            output.push('\n');
        }

        output.push_str("─".repeat(size.x.max(0) as usize).as_str());
        output.push('\n');

        output
    }
}

impl Device for MemoryDevice {
    fn screen_info(&mut self) -> Result<ScreenInfo> {
        Ok(ScreenInfo {
            buffer_size: self.buffer_size,
            window_size: self.window_size,
            max_window_size: self.max_window_size(),
        })
    }

    fn set_buffer_size(&mut self, size: Vector2) -> Result<()> {
        // the buffer may never be smaller than the window it backs
        if size.x < self.window_size.x || size.y < self.window_size.y || size.x <= 0 || size.y <= 0 {
            return Err(ConsoleError::Rejected {
                op: "buffer resize",
                requested: size,
            });
        }
        self.buffer_size = size;
        Ok(())
    }

    fn set_window_rect(&mut self, size: Vector2) -> Result<()> {
        let max = self.max_window_size();
        if size.x > max.x || size.y > max.y || size.x <= 0 || size.y <= 0 {
            return Err(ConsoleError::Rejected {
                op: "window resize",
                requested: size,
            });
        }
        self.window_size = size;
        Ok(())
    }

    fn lock_window_size(&mut self) -> Result<()> {
        self.locked = true;
        Ok(())
    }

    fn write_cells(&mut self, size: Vector2, cells: &[Cell]) -> Result<()> {
        self.frame.clear();
        self.frame.extend_from_slice(cells);
        self.frame_size = size;
        self.flushes += 1;
        Ok(())
    }

    fn set_cursor_position(&mut self, position: Vector2) -> Result<()> {
        self.cursor = position;
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        self.cursor_visible = visible;
        Ok(())
    }

    fn cursor_visible(&mut self) -> Result<bool> {
        Ok(self.cursor_visible)
    }

    fn text_mode(&mut self) -> Result<TextMode> {
        Ok(self.mode)
    }

    fn set_text_mode(&mut self, mode: TextMode) -> Result<()> {
        self.mode = mode;
        Ok(())
    }

    fn title(&mut self) -> Result<String> {
        Ok(self.title.clone())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        self.title = title.to_string();
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        self.last_read = Some((self.cursor, self.cursor_visible));
        self.input.pop_front().ok_or_else(|| ConsoleError::Io {
            op: "read line",
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted input left"),
        })
    }

    fn pointer_position(&mut self) -> Result<Vector2> {
        Ok(self.pointer)
    }

    fn discard_input(&mut self) -> Result<()> {
        self.input.clear();
        Ok(())
    }

    fn set_input_attribute(&mut self, attribute: Attribute) -> Result<()> {
        self.input_attribute = attribute;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Color;

    #[test]
    fn test_window_cannot_exceed_buffer() {
        let mut device = MemoryDevice::new(Vector2::new(80, 25));
        assert!(device.set_window_rect(Vector2::new(100, 25)).is_err());

        device.set_buffer_size(Vector2::new(100, 25)).unwrap();
        device.set_window_rect(Vector2::new(100, 25)).unwrap();
        assert_eq!(device.window_size(), Vector2::new(100, 25));
    }

    #[test]
    fn test_buffer_cannot_shrink_below_window() {
        let mut device = MemoryDevice::new(Vector2::new(80, 25));
        assert!(device.set_buffer_size(Vector2::new(40, 25)).is_err());
    }

    #[test]
    fn test_scripted_input() {
        let mut device = MemoryDevice::new(Vector2::new(10, 2));
        device.push_input("first");
        assert_eq!(device.read_line().unwrap(), "first");
        assert!(device.read_line().is_err());
    }

    #[test]
    fn test_dump() {
        let mut device = MemoryDevice::new(Vector2::new(3, 2));
        let attr = Attribute::fg(Color::WHITE);
        let cells = [
            Cell::new('a', attr),
            Cell::new('b', attr),
            Cell::BLANK,
            Cell::BLANK,
            Cell::BLANK,
            Cell::new('c', attr),
        ];
        device.write_cells(Vector2::new(3, 2), &cells).unwrap();

        let dump = device.dump();
        assert!(dump.starts_with("=== Frame 3x2 ===\n"));
        assert!(dump.contains("\nab \n  c\n"));
        assert_eq!(device.frame_cell(Vector2::new(2, 1)), Some(&cells[5]));
    }
}
