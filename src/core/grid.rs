//! Backbuffer grid
//!
//! Every draw lands in an off-screen row-major array of cells. Nothing
//! reaches the display until [`Backbuffer::commit`] hands the whole array to
//! the device in a single call, which is what keeps frames from tearing.

use tracing::trace;

use super::attr::{Attribute, Color};
use crate::device::Device;
use crate::error::Result;

/// A grid coordinate (or size) in character cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Vector2 {
    pub x: i32,
    pub y: i32,
}

impl Vector2 {
    pub const ZERO: Self = Self::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Vector2 {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// One character of the grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cell {
    pub character: char,
    pub attribute: Attribute,
}

impl Cell {
    /// Zeroed cell: NUL character, black on black
    pub const BLANK: Self = Self::new('\0', Attribute::new(Color::BLACK, Color::BLACK));

    pub const fn new(character: char, attribute: Attribute) -> Self {
        Self {
            character,
            attribute,
        }
    }
}

/// Off-screen character grid
#[derive(Debug, Clone)]
pub struct Backbuffer {
    size: Vector2,
    cells: Vec<Cell>,
}

impl Backbuffer {
    /// Allocate a zeroed grid
    ///
    /// # Panics
    ///
    /// Panics if either dimension is not positive.
    pub fn new(size: Vector2) -> Self {
        let mut buffer = Self {
            size: Vector2::ZERO,
            cells: Vec::new(),
        };
        buffer.resize(size);
        buffer
    }

    /// Reallocate the grid and zero every cell, returning the previous size.
    ///
    /// Anything drawn since the last commit is lost.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is not positive.
    pub fn resize(&mut self, size: Vector2) -> Vector2 {
        assert!(
            size.x > 0 && size.y > 0,
            "grid size must be positive, got {}x{}",
            size.x,
            size.y
        );

        let previous = std::mem::replace(&mut self.size, size);
        self.cells.clear();
        self.cells
            .resize(size.x as usize * size.y as usize, Cell::BLANK);
        previous
    }

    pub fn size(&self) -> Vector2 {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.x as usize
    }

    pub fn height(&self) -> usize {
        self.size.y as usize
    }

    /// Whether `position` lies inside the grid
    pub fn contains(&self, position: Vector2) -> bool {
        (0..self.size.x).contains(&position.x) && (0..self.size.y).contains(&position.y)
    }

    fn index(&self, position: Vector2) -> usize {
        assert!(
            self.contains(position),
            "({}, {}) is outside the {}x{} grid",
            position.x,
            position.y,
            self.size.x,
            self.size.y
        );
        position.x as usize + position.y as usize * self.width()
    }

    /// Read back one cell, `None` outside the grid
    pub fn cell(&self, position: Vector2) -> Option<&Cell> {
        if self.contains(position) {
            Some(&self.cells[self.index(position)])
        } else {
            None
        }
    }

    /// All cells in row-major order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Write one cell
    ///
    /// # Panics
    ///
    /// Panics if `position` is outside the grid.
    pub fn put(&mut self, position: Vector2, attribute: Attribute, character: char) {
        let index = self.index(position);
        self.cells[index] = Cell::new(character, attribute);
    }

    /// Overwrite every cell
    pub fn fill(&mut self, attribute: Attribute, character: char) {
        self.cells.fill(Cell::new(character, attribute));
    }

    /// Overwrite row `y`
    ///
    /// # Panics
    ///
    /// Panics if `y` is outside the grid.
    pub fn fill_row(&mut self, y: i32, attribute: Attribute, character: char) {
        let start = self.index(Vector2::new(0, y));
        let width = self.width();
        self.cells[start..start + width].fill(Cell::new(character, attribute));
    }

    /// Overwrite column `x`
    ///
    /// # Panics
    ///
    /// Panics if `x` is outside the grid.
    pub fn fill_column(&mut self, x: i32, attribute: Attribute, character: char) {
        let start = self.index(Vector2::new(x, 0));
        let width = self.width();
        for cell in self.cells.iter_mut().skip(start).step_by(width) {
            *cell = Cell::new(character, attribute);
        }
    }

    /// Mutable view of row `y`, used by the text renderer
    pub(crate) fn row_mut(&mut self, y: i32) -> &mut [Cell] {
        let start = self.index(Vector2::new(0, y));
        let width = self.width();
        &mut self.cells[start..start + width]
    }

    /// Hand the whole grid to `device` in one batch covering (0,0)-(w,h)
    pub fn commit<D: Device + ?Sized>(&self, device: &mut D) -> Result<()> {
        trace!("Committing {}x{} grid", self.size.x, self.size.y);
        device.write_cells(self.size, &self.cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Color;
    use crate::device::MemoryDevice;

    fn attr() -> Attribute {
        Attribute::new(Color::GOLD, Color::BLUE)
    }

    #[test]
    fn test_new_grid_is_blank() {
        let buffer = Backbuffer::new(Vector2::new(4, 3));
        assert_eq!(buffer.cells().len(), 12);
        assert!(buffer.cells().iter().all(|c| *c == Cell::BLANK));
    }

    #[test]
    fn test_fill_round_trip() {
        let mut buffer = Backbuffer::new(Vector2::new(7, 5));
        buffer.fill(attr(), '*');
        for y in 0..5 {
            for x in 0..7 {
                assert_eq!(buffer.cell(Vector2::new(x, y)), Some(&Cell::new('*', attr())));
            }
        }
    }

    #[test]
    fn test_resize_discards_drawing() {
        let mut buffer = Backbuffer::new(Vector2::new(3, 3));
        buffer.fill(attr(), 'x');
        let previous = buffer.resize(Vector2::new(5, 2));
        assert_eq!(previous, Vector2::new(3, 3));
        assert_eq!(buffer.size(), Vector2::new(5, 2));
        assert!(buffer.cells().iter().all(|c| *c == Cell::BLANK));
    }

    #[test]
    fn test_put_uses_row_major_index() {
        let mut buffer = Backbuffer::new(Vector2::new(4, 3));
        buffer.put(Vector2::new(1, 2), attr(), 'q');
        assert_eq!(buffer.cells()[1 + 2 * 4], Cell::new('q', attr()));
        assert_eq!(buffer.cell(Vector2::new(4, 0)), None);
        assert_eq!(buffer.cell(Vector2::new(-1, 0)), None);
    }

    #[test]
    fn test_fill_row_and_column() {
        let mut buffer = Backbuffer::new(Vector2::new(4, 3));
        buffer.fill_row(1, attr(), '-');
        buffer.fill_column(2, attr(), '|');

        for x in 0..4 {
            let expected = if x == 2 { '|' } else { '-' };
            assert_eq!(buffer.cell(Vector2::new(x, 1)).unwrap().character, expected);
        }
        assert_eq!(buffer.cell(Vector2::new(2, 0)).unwrap().character, '|');
        assert_eq!(buffer.cell(Vector2::new(2, 2)).unwrap().character, '|');
        assert_eq!(buffer.cell(Vector2::new(0, 0)), Some(&Cell::BLANK));
        assert_eq!(buffer.cell(Vector2::new(3, 2)), Some(&Cell::BLANK));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_put_out_of_range_panics() {
        let mut buffer = Backbuffer::new(Vector2::new(4, 3));
        buffer.put(Vector2::new(0, 3), attr(), 'x');
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn test_zero_size_panics() {
        Backbuffer::new(Vector2::new(0, 10));
    }

    #[test]
    fn test_commit_hands_over_whole_grid() {
        let mut device = MemoryDevice::new(Vector2::new(3, 2));
        let mut buffer = Backbuffer::new(Vector2::new(3, 2));
        buffer.put(Vector2::new(2, 1), attr(), 'z');
        buffer.commit(&mut device).unwrap();

        assert_eq!(device.flush_count(), 1);
        assert_eq!(device.frame_size(), Vector2::new(3, 2));
        assert_eq!(device.frame(), buffer.cells());
    }
}
