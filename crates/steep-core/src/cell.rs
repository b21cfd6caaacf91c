//! Styled character cells and their SGR serialization.

use crossterm::queue;
use crossterm::style::{Attribute, Print, SetAttribute, SetBackgroundColor, SetForegroundColor};
use std::io::{self, Write};

pub use crossterm::style::Color;

/// The visual attributes of a [`Cell`], without its glyph.
///
/// `None` colors mean "terminal default".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellStyle {
    /// Foreground color.
    pub fg: Option<Color>,
    /// Background color.
    pub bg: Option<Color>,
    /// Bold intensity.
    pub bold: bool,
    /// Underlined.
    pub underline: bool,
}

impl CellStyle {
    /// The terminal's default style.
    pub const PLAIN: CellStyle = CellStyle {
        fg: None,
        bg: None,
        bold: false,
        underline: false,
    };

    /// Whether this is the terminal default (no SGR needed).
    pub fn is_plain(&self) -> bool {
        *self == Self::PLAIN
    }

    /// Set the foreground color.
    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    /// Set the background color.
    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    /// Enable bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Enable underline.
    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Queue the SGR sequences that turn `from` into `self`.
    ///
    /// Only attributes that differ are emitted; an unchanged style writes
    /// nothing. Attributes are cleared individually (`22`, `24`, `39`, `49`)
    /// rather than with a full reset so untouched attributes stay active.
    pub fn write_transition<W: Write>(&self, from: &CellStyle, w: &mut W) -> io::Result<()> {
        if self.bold != from.bold {
            let attr = if self.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            };
            queue!(w, SetAttribute(attr))?;
        }
        if self.underline != from.underline {
            let attr = if self.underline {
                Attribute::Underlined
            } else {
                Attribute::NoUnderline
            };
            queue!(w, SetAttribute(attr))?;
        }
        if self.fg != from.fg {
            queue!(w, SetForegroundColor(self.fg.unwrap_or(Color::Reset)))?;
        }
        if self.bg != from.bg {
            queue!(w, SetBackgroundColor(self.bg.unwrap_or(Color::Reset)))?;
        }
        Ok(())
    }
}

/// A single styled terminal character.
///
/// Cells are plain values: two cells are equal when glyph and every style
/// attribute match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// The glyph.
    pub ch: char,
    /// Visual attributes.
    pub style: CellStyle,
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

impl Cell {
    /// An unstyled space.
    pub const BLANK: Cell = Cell {
        ch: ' ',
        style: CellStyle::PLAIN,
    };

    /// An unstyled cell holding `ch`.
    pub const fn new(ch: char) -> Self {
        Self {
            ch,
            style: CellStyle::PLAIN,
        }
    }

    /// A cell with an explicit style.
    pub const fn styled(ch: char, style: CellStyle) -> Self {
        Self { ch, style }
    }

    /// Set the foreground color.
    pub fn fg(mut self, color: Color) -> Self {
        self.style.fg = Some(color);
        self
    }

    /// Set the background color.
    pub fn bg(mut self, color: Color) -> Self {
        self.style.bg = Some(color);
        self
    }

    /// Enable bold.
    pub fn bold(mut self) -> Self {
        self.style.bold = true;
        self
    }

    /// Enable underline.
    pub fn underline(mut self) -> Self {
        self.style.underline = true;
        self
    }

    /// Queue this cell as a self-contained sequence: style, glyph, reset.
    ///
    /// Plain cells are written as the bare glyph.
    pub fn write_ansi<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if self.style.is_plain() {
            return queue!(w, Print(self.ch));
        }
        self.style.write_transition(&CellStyle::PLAIN, w)?;
        queue!(w, Print(self.ch), SetAttribute(Attribute::Reset))
    }

    /// Serialize this cell with [`write_ansi`](Cell::write_ansi).
    pub fn to_ansi(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_ansi(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl From<char> for Cell {
    fn from(ch: char) -> Self {
        Cell::new(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(from: CellStyle, to: CellStyle) -> String {
        let mut buf = Vec::new();
        to.write_transition(&from, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(Cell::new('a').bold(), Cell::new('a').bold());
        assert_ne!(Cell::new('a'), Cell::new('a').underline());
        assert_ne!(Cell::new('a').fg(Color::Red), Cell::new('a').fg(Color::Blue));
    }

    #[test]
    fn plain_cell_serializes_as_glyph() {
        assert_eq!(Cell::new('x').to_ansi(), "x");
    }

    #[test]
    fn bold_cell_is_wrapped_in_sgr() {
        assert_eq!(Cell::new('x').bold().to_ansi(), "\x1b[1mx\x1b[0m");
    }

    #[test]
    fn unchanged_style_writes_nothing() {
        let s = CellStyle::PLAIN.bold().fg(Color::Green);
        assert_eq!(transition(s, s), "");
    }

    #[test]
    fn clearing_attributes_uses_targeted_codes() {
        let from = CellStyle::PLAIN.bold().underline();
        assert_eq!(transition(from, CellStyle::PLAIN), "\x1b[22m\x1b[24m");
    }

    #[test]
    fn dropping_colors_resets_to_default() {
        let from = CellStyle::PLAIN.fg(Color::Red).bg(Color::Blue);
        assert_eq!(transition(from, CellStyle::PLAIN), "\x1b[39m\x1b[49m");
    }

    #[test]
    fn rgb_foreground() {
        let to = CellStyle::PLAIN.fg(Color::Rgb { r: 1, g: 2, b: 3 });
        assert_eq!(transition(CellStyle::PLAIN, to), "\x1b[38;2;1;2;3m");
    }
}
