//! Native Windows console device
//!
//! Thin wrapper over the Win32 console API. A flush is a single
//! `WriteConsoleOutputW` call covering the whole window.

use std::io;

use tracing::debug;
use windows::core::HSTRING;
use windows::Win32::Foundation::{BOOL, FALSE, HANDLE, POINT, TRUE};
use windows::Win32::Graphics::Gdi::ScreenToClient;
use windows::Win32::System::Console::{
    FlushConsoleInputBuffer, GetConsoleCursorInfo, GetConsoleMode, GetConsoleScreenBufferInfo,
    GetConsoleTitleW, GetConsoleWindow, GetCurrentConsoleFont, GetStdHandle,
    SetConsoleCursorInfo, SetConsoleCursorPosition, SetConsoleMode, SetConsoleScreenBufferSize,
    SetConsoleTextAttribute, SetConsoleTitleW, SetConsoleWindowInfo, WriteConsoleOutputW,
    CHAR_INFO, CHAR_INFO_0, CONSOLE_CHARACTER_ATTRIBUTES, CONSOLE_CURSOR_INFO, CONSOLE_FONT_INFO,
    CONSOLE_MODE, CONSOLE_SCREEN_BUFFER_INFO, COORD, SMALL_RECT, STD_INPUT_HANDLE,
    STD_OUTPUT_HANDLE,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetCursorPos, GetWindowLongW, SetWindowLongW, GWL_STYLE, WS_MAXIMIZEBOX, WS_SIZEBOX,
};

use super::{Device, ScreenInfo, TextMode};
use crate::core::{Attribute, Cell, Vector2};
use crate::error::{ConsoleError, Result};

/// Longest title `GetConsoleTitleW` is asked for
const TITLE_CAPACITY: usize = 512;

/// Win32 console handles
pub struct Win32Console {
    out_handle: HANDLE,
    in_handle: HANDLE,
    /// Reused CHAR_INFO staging buffer
    staging: Vec<CHAR_INFO>,
}

fn coord(v: Vector2) -> COORD {
    COORD {
        X: v.x as i16,
        Y: v.y as i16,
    }
}

/// UTF-16 unit for a cell; characters outside the BMP become U+FFFD
fn utf16_unit(ch: char) -> u16 {
    let mut units = [0u16; 2];
    match ch.encode_utf16(&mut units) {
        [unit] => *unit,
        _ => 0xFFFD,
    }
}

/// Turn a `BOOL` result into the calling thread's last error
fn check(ok: BOOL, op: &'static str) -> Result<()> {
    if ok.as_bool() {
        Ok(())
    } else {
        Err(ConsoleError::win32(op)(windows::core::Error::from_win32()))
    }
}

impl Win32Console {
    /// Acquire the standard output and input console handles
    pub fn open() -> Result<Self> {
        unsafe {
            let out_handle =
                GetStdHandle(STD_OUTPUT_HANDLE).map_err(ConsoleError::win32("get output handle"))?;
            let in_handle =
                GetStdHandle(STD_INPUT_HANDLE).map_err(ConsoleError::win32("get input handle"))?;
            debug!("Console handles: out={:?} in={:?}", out_handle, in_handle);

            Ok(Self {
                out_handle,
                in_handle,
                staging: Vec::new(),
            })
        }
    }

    fn buffer_info(&self) -> Result<CONSOLE_SCREEN_BUFFER_INFO> {
        let mut info = CONSOLE_SCREEN_BUFFER_INFO::default();
        unsafe {
            GetConsoleScreenBufferInfo(self.out_handle, &mut info)
                .map_err(ConsoleError::win32("query screen buffer"))?;
        }
        Ok(info)
    }

    fn cursor_info(&self) -> Result<CONSOLE_CURSOR_INFO> {
        let mut info = CONSOLE_CURSOR_INFO::default();
        unsafe {
            GetConsoleCursorInfo(self.out_handle, &mut info)
                .map_err(ConsoleError::win32("query cursor"))?;
        }
        Ok(info)
    }
}

impl Device for Win32Console {
    fn screen_info(&mut self) -> Result<ScreenInfo> {
        let info = self.buffer_info()?;
        let window = info.srWindow;
        Ok(ScreenInfo {
            buffer_size: Vector2::new(info.dwSize.X as i32, info.dwSize.Y as i32),
            window_size: Vector2::new(
                (window.Right - window.Left + 1) as i32,
                (window.Bottom - window.Top + 1) as i32,
            ),
            max_window_size: Vector2::new(
                info.dwMaximumWindowSize.X as i32,
                info.dwMaximumWindowSize.Y as i32,
            ),
        })
    }

    fn set_buffer_size(&mut self, size: Vector2) -> Result<()> {
        unsafe {
            SetConsoleScreenBufferSize(self.out_handle, coord(size))
                .map_err(ConsoleError::win32("resize screen buffer"))
        }
    }

    fn set_window_rect(&mut self, size: Vector2) -> Result<()> {
        let rect = SMALL_RECT {
            Left: 0,
            Top: 0,
            Right: (size.x - 1) as i16,
            Bottom: (size.y - 1) as i16,
        };
        unsafe {
            SetConsoleWindowInfo(self.out_handle, TRUE, &rect)
                .map_err(ConsoleError::win32("resize window"))
        }
    }

    fn lock_window_size(&mut self) -> Result<()> {
        unsafe {
            let window = GetConsoleWindow();
            let style = GetWindowLongW(window, GWL_STYLE) as u32;
            let locked = style & !(WS_MAXIMIZEBOX.0 | WS_SIZEBOX.0);
            SetWindowLongW(window, GWL_STYLE, locked as i32);
        }
        Ok(())
    }

    fn write_cells(&mut self, size: Vector2, cells: &[Cell]) -> Result<()> {
        self.staging.clear();
        self.staging.extend(cells.iter().map(|cell| CHAR_INFO {
            Char: CHAR_INFO_0 {
                UnicodeChar: utf16_unit(cell.character),
            },
            Attributes: cell.attribute.to_native_word(),
        }));

        let mut region = SMALL_RECT {
            Left: 0,
            Top: 0,
            Right: size.x as i16,
            Bottom: size.y as i16,
        };
        unsafe {
            WriteConsoleOutputW(
                self.out_handle,
                self.staging.as_ptr(),
                coord(size),
                COORD { X: 0, Y: 0 },
                &mut region,
            )
            .map_err(ConsoleError::win32("write console output"))
        }
    }

    fn set_cursor_position(&mut self, position: Vector2) -> Result<()> {
        unsafe {
            SetConsoleCursorPosition(self.out_handle, coord(position))
                .map_err(ConsoleError::win32("move cursor"))
        }
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        let mut info = self.cursor_info()?;
        info.bVisible = visible.into();
        unsafe {
            SetConsoleCursorInfo(self.out_handle, &info)
                .map_err(ConsoleError::win32("toggle cursor"))
        }
    }

    fn cursor_visible(&mut self) -> Result<bool> {
        Ok(self.cursor_info()?.bVisible.as_bool())
    }

    fn text_mode(&mut self) -> Result<TextMode> {
        let mut mode = CONSOLE_MODE(0);
        unsafe {
            GetConsoleMode(self.in_handle, &mut mode)
                .map_err(ConsoleError::win32("query console mode"))?;
        }
        Ok(TextMode::from_bits_retain(mode.0))
    }

    fn set_text_mode(&mut self, mode: TextMode) -> Result<()> {
        unsafe {
            SetConsoleMode(self.in_handle, CONSOLE_MODE(mode.bits()))
                .map_err(ConsoleError::win32("set console mode"))
        }
    }

    fn title(&mut self) -> Result<String> {
        let mut buffer = [0u16; TITLE_CAPACITY];
        let len = unsafe { GetConsoleTitleW(&mut buffer) } as usize;
        Ok(String::from_utf16_lossy(&buffer[..len.min(TITLE_CAPACITY)]))
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        unsafe { SetConsoleTitleW(&HSTRING::from(title)).map_err(ConsoleError::win32("set title")) }
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
        unsafe {
            let mut point = POINT::default();
            GetCursorPos(&mut point).map_err(ConsoleError::win32("query pointer"))?;

            // relative to the console window's client area
            check(
                ScreenToClient(GetConsoleWindow(), &mut point),
                "map pointer to console window",
            )?;

            let mut font = CONSOLE_FONT_INFO::default();
            GetCurrentConsoleFont(self.out_handle, FALSE, &mut font)
                .map_err(ConsoleError::win32("query console font"))?;

            let cell_width = (font.dwFontSize.X as i32).max(1);
            let cell_height = (font.dwFontSize.Y as i32).max(1);
            Ok(Vector2::new(point.x / cell_width, point.y / cell_height))
        }
    }

    fn discard_input(&mut self) -> Result<()> {
        unsafe {
            FlushConsoleInputBuffer(self.in_handle).map_err(ConsoleError::win32("flush input"))
        }
    }

    fn set_input_attribute(&mut self, attribute: Attribute) -> Result<()> {
        unsafe {
            SetConsoleTextAttribute(
                self.out_handle,
                CONSOLE_CHARACTER_ATTRIBUTES(attribute.to_native_word()),
            )
            .map_err(ConsoleError::win32("set input color"))
        }
    }
}
