//! Terminal device using crossterm
//!
//! Draws on the alternate screen of whatever terminal crossterm can drive.
//! Each flush repaints every row inside one synchronized update, coalescing
//! runs of equal attributes into a single color change.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event, execute, queue,
    style::{Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen, SetSize, SetTitle,
    },
};
use tracing::debug;
use unicode_width::UnicodeWidthChar;

use super::{Device, ScreenInfo, TextMode};
use crate::core::{Attribute, Cell, Vector2};
use crate::error::{ConsoleError, Result};

/// crossterm-backed device
pub struct TerminalDevice {
    /// Whether the alternate screen is active
    active: bool,
    buffer_size: Vector2,
    cursor: Vector2,
    cursor_visible: bool,
    mode: TextMode,
    /// Terminals cannot report their title, so the last one set is kept
    title: String,
}

impl TerminalDevice {
    /// Switch the terminal to the alternate screen and take it over
    pub fn open() -> Result<Self> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            DisableLineWrap,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )
        .map_err(ConsoleError::io("enter alternate screen"))?;

        let (cols, rows) = terminal::size().map_err(ConsoleError::io("query terminal size"))?;
        debug!("Terminal opened at {}x{}", cols, rows);

        Ok(Self {
            active: true,
            buffer_size: Vector2::new(cols as i32, rows as i32),
            cursor: Vector2::ZERO,
            cursor_visible: true,
            mode: TextMode::PROCESSED_INPUT | TextMode::LINE_INPUT | TextMode::ECHO_INPUT,
            title: String::new(),
        })
    }

    /// Restore the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let mut stdout = io::stdout();
        execute!(stdout, ResetColor, Show, EnableLineWrap, LeaveAlternateScreen)?;
        stdout.flush()
    }

    fn size() -> Result<Vector2> {
        let (cols, rows) = terminal::size().map_err(ConsoleError::io("query terminal size"))?;
        Ok(Vector2::new(cols as i32, rows as i32))
    }

    fn paint<W: Write>(&self, out: &mut W, size: Vector2, cells: &[Cell]) -> io::Result<()> {
        queue!(out, BeginSynchronizedUpdate, Hide)?;

        let mut line = String::with_capacity(size.x.max(0) as usize);
        for (y, row) in cells.chunks(size.x.max(1) as usize).enumerate() {
            queue!(out, MoveTo(0, y as u16))?;
            line.clear();

            let mut current: Option<Attribute> = None;
            let mut skip = false;
            for cell in row {
                // right half of a wide character drawn in the previous cell
                if skip {
                    skip = false;
                    continue;
                }

                if current != Some(cell.attribute) {
                    if let Some(attribute) = current {
                        write_run(out, attribute, &line)?;
                        line.clear();
                    }
                    current = Some(cell.attribute);
                }

                match cell.character.width() {
                    Some(1) => line.push(cell.character),
                    Some(2) => {
                        line.push(cell.character);
                        skip = true;
                    }
                    // NUL and other non-printing characters show as blanks
                    _ => line.push(' '),
                }
            }

            if let Some(attribute) = current {
                write_run(out, attribute, &line)?;
            }
        }

        queue!(out, ResetColor)?;
        if self.cursor_visible {
            queue!(out, MoveTo(self.cursor.x as u16, self.cursor.y as u16), Show)?;
        }
        queue!(out, EndSynchronizedUpdate)?;
        out.flush()
    }
}

/// Whether a grid of `requested` cells can be drawn on a terminal of `available` cells
fn fits(available: Vector2, requested: Vector2) -> bool {
    requested.x <= available.x && requested.y <= available.y
}

fn write_run<W: Write>(out: &mut W, attribute: Attribute, text: &str) -> io::Result<()> {
    queue!(
        out,
        SetForegroundColor(attribute.foreground.to_crossterm()),
        SetBackgroundColor(attribute.background.to_crossterm()),
        Print(text)
    )
}

impl Drop for TerminalDevice {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

impl Device for TerminalDevice {
    fn screen_info(&mut self) -> Result<ScreenInfo> {
        let window_size = Self::size()?;
        Ok(ScreenInfo {
            buffer_size: self.buffer_size,
            window_size,
            // terminals are sized by their host; smaller grids use the top-left corner
            max_window_size: window_size,
        })
    }

    fn set_buffer_size(&mut self, size: Vector2) -> Result<()> {
        self.buffer_size = size;
        Ok(())
    }

    fn set_window_rect(&mut self, size: Vector2) -> Result<()> {
        if fits(Self::size()?, size) {
            // the grid is drawn in the top-left corner; clear what it leaves uncovered
            execute!(io::stdout(), Clear(ClearType::All))
                .map_err(ConsoleError::io("clear terminal"))?;
            return Ok(());
        }

        execute!(io::stdout(), SetSize(size.x as u16, size.y as u16))
            .map_err(ConsoleError::io("resize terminal"))?;

        let available = Self::size()?;
        if !fits(available, size) {
            debug!(
                "Terminal stayed {}x{}, wanted {}x{}",
                available.x, available.y, size.x, size.y
            );
            return Err(ConsoleError::Rejected {
                op: "window resize",
                requested: size,
            });
        }
        Ok(())
    }

    fn lock_window_size(&mut self) -> Result<()> {
        debug!("Terminal windows have no resize affordances to remove");
        Ok(())
    }

    fn write_cells(&mut self, size: Vector2, cells: &[Cell]) -> Result<()> {
        let stdout = io::stdout();
        let mut out = io::BufWriter::with_capacity(65536, stdout.lock());
        self.paint(&mut out, size, cells)
            .map_err(ConsoleError::io("write cells"))
    }

    fn set_cursor_position(&mut self, position: Vector2) -> Result<()> {
        self.cursor = position;
        execute!(io::stdout(), MoveTo(position.x as u16, position.y as u16))
            .map_err(ConsoleError::io("move cursor"))
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        self.cursor_visible = visible;
        let result = if visible {
            execute!(io::stdout(), Show)
        } else {
            execute!(io::stdout(), Hide)
        };
        result.map_err(ConsoleError::io("toggle cursor"))
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
        execute!(io::stdout(), SetTitle(title)).map_err(ConsoleError::io("set title"))?;
        self.title = title.to_string();
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = io::stdin()
            .read_line(&mut line)
            .map_err(ConsoleError::io("read line"))?;
        if read == 0 {
            return Err(ConsoleError::Io {
                op: "read line",
                source: io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"),
            });
        }

        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(line)
    }

    fn pointer_position(&mut self) -> Result<Vector2> {
        Err(ConsoleError::Unsupported("pointer position"))
    }

    fn discard_input(&mut self) -> Result<()> {
        while event::poll(Duration::ZERO).map_err(ConsoleError::io("poll input"))? {
            event::read().map_err(ConsoleError::io("discard input"))?;
        }
        Ok(())
    }

    fn set_input_attribute(&mut self, attribute: Attribute) -> Result<()> {
        execute!(
            io::stdout(),
            SetForegroundColor(attribute.foreground.to_crossterm()),
            SetBackgroundColor(attribute.background.to_crossterm())
        )
        .map_err(ConsoleError::io("set input color"))
    }
}
