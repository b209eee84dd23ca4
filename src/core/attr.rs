//! Console color attributes
//!
//! A color is four bits: three primaries (blue, green, red) and an
//! intensity modifier. An [`Attribute`] pairs a foreground and a background
//! color and packs into the console's native 16-bit attribute word.

use bitflags::bitflags;

bitflags! {
    /// One of the 16 console colors
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Color: u8 {
        // primary colors
        const BLUE    = 0b0001;
        const GREEN   = 0b0010;
        const RED     = 0b0100;

        // secondary colors
        const CYAN    = Self::BLUE.bits() | Self::GREEN.bits();
        const GOLD    = Self::RED.bits() | Self::GREEN.bits();
        const PURPLE  = Self::RED.bits() | Self::BLUE.bits();

        const WHITE   = Self::BLUE.bits() | Self::GREEN.bits() | Self::RED.bits();

        // modifier
        const INTENSE = 0b1000;
    }
}

impl Color {
    pub const BLACK: Self = Self::empty();

    /// Build a color from the low four bits of `value`
    pub const fn from_nibble(value: u8) -> Self {
        Self::from_bits_truncate(value & 0x0F)
    }

    /// Convert to crossterm Color
    ///
    /// Console colors order their bits blue-green-red while ANSI palettes
    /// order them red-green-blue, so the outer bits are swapped.
    pub fn to_crossterm(self) -> crossterm::style::Color {
        let bits = self.bits();
        let mut index = bits & Self::GREEN.bits();
        if bits & Self::BLUE.bits() != 0 {
            index |= 0b100;
        }
        if bits & Self::RED.bits() != 0 {
            index |= 0b001;
        }
        if self.contains(Self::INTENSE) {
            index += 8;
        }
        crossterm::style::Color::AnsiValue(index)
    }
}

/// A foreground/background color pair
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub foreground: Color,
    pub background: Color,
}

impl Attribute {
    pub const fn new(foreground: Color, background: Color) -> Self {
        Self {
            foreground,
            background,
        }
    }

    /// Foreground color on a black background
    pub const fn fg(foreground: Color) -> Self {
        Self::new(foreground, Color::BLACK)
    }

    /// Pack into the native console attribute word.
    ///
    /// Bits 0-3 hold the foreground, bits 4-7 the background; the high byte
    /// is always zero.
    pub const fn to_native_word(self) -> u16 {
        (self.foreground.bits() as u16) | ((self.background.bits() as u16) << 4)
    }

    /// Unpack a native console attribute word, ignoring the high byte
    pub const fn from_native_word(word: u16) -> Self {
        Self {
            foreground: Color::from_nibble(word as u8),
            background: Color::from_nibble((word >> 4) as u8),
        }
    }

    pub const fn with_foreground(self, foreground: Color) -> Self {
        Self::new(foreground, self.background)
    }

    pub const fn with_background(self, background: Color) -> Self {
        Self::new(self.foreground, background)
    }
}

impl From<Color> for Attribute {
    fn from(foreground: Color) -> Self {
        Self::fg(foreground)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::style::Color as CtColor;

    #[test]
    fn test_composite_colors() {
        assert_eq!(Color::WHITE.bits(), 0b0111);
        assert_eq!(Color::GOLD, Color::RED | Color::GREEN);
        assert_eq!((Color::WHITE | Color::INTENSE).bits(), 15);
        assert_eq!(Color::BLACK.bits(), 0);
    }

    #[test]
    fn test_native_word_layout() {
        assert_eq!(Attribute::fg(Color::WHITE).to_native_word(), 0x0007);
        let attr = Attribute::new(Color::RED | Color::INTENSE, Color::BLUE);
        assert_eq!(attr.to_native_word(), 0x001C);
        assert_eq!(Attribute::from_native_word(0xFF1C), attr);
    }

    #[test]
    fn test_from_nibble_truncates() {
        assert_eq!(Color::from_nibble(17), Color::BLUE);
        assert_eq!(Color::from_nibble(9), Color::BLUE | Color::INTENSE);
    }

    #[test]
    fn test_crossterm_mapping() {
        assert_eq!(Color::BLACK.to_crossterm(), CtColor::AnsiValue(0));
        assert_eq!(Color::RED.to_crossterm(), CtColor::AnsiValue(1));
        assert_eq!(Color::GREEN.to_crossterm(), CtColor::AnsiValue(2));
        assert_eq!(Color::BLUE.to_crossterm(), CtColor::AnsiValue(4));
        assert_eq!(Color::GOLD.to_crossterm(), CtColor::AnsiValue(3));
        assert_eq!((Color::WHITE | Color::INTENSE).to_crossterm(), CtColor::AnsiValue(15));
    }
}
