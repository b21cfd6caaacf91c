//! Rectangular frames of [`Cell`]s.

use crate::cell::{Cell, CellStyle, Color};
use crate::geometry::{Rect, Size};
use ratatui::buffer::Buffer;
use ratatui::style::Modifier;

/// A `height × width` array of cells representing one rendered frame.
///
/// Every row has exactly `width` cells. A grid is built fresh for each
/// render pass and is treated as immutable once handed to the
/// [`ScreenBuffer`](crate::screen::ScreenBuffer).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid {
    width: u16,
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    /// A grid filled with [`Cell::BLANK`].
    pub fn blank(width: u16, height: u16) -> Self {
        Self {
            width,
            rows: vec![vec![Cell::BLANK; width as usize]; height as usize],
        }
    }

    /// Build a grid from text lines, one row per line.
    ///
    /// The width is the longest line (in chars); shorter lines are padded
    /// with blanks.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let width = lines
            .iter()
            .map(|l| l.as_ref().chars().count())
            .max()
            .unwrap_or(0)
            .min(u16::MAX as usize) as u16;
        let mut grid = Self::blank(width, lines.len().min(u16::MAX as usize) as u16);
        for (y, line) in lines.iter().enumerate().take(grid.rows.len()) {
            grid.put_str(0, y as u16, line.as_ref(), CellStyle::PLAIN);
        }
        grid
    }

    /// Number of columns.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> u16 {
        self.rows.len() as u16
    }

    /// Width and height together.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height())
    }

    /// The cells of row `y`.
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        self.rows.get(y as usize).map(Vec::as_slice)
    }

    /// All rows, top to bottom.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// The cell at `(x, y)`.
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.rows.get(y as usize)?.get(x as usize)
    }

    /// Overwrite the cell at `(x, y)`. Out-of-range writes are ignored.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(slot) = self
            .rows
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
        {
            *slot = cell;
        }
    }

    /// Write `text` starting at `(x, y)`, clipped at the right edge.
    ///
    /// Returns the number of cells written.
    pub fn put_str(&mut self, x: u16, y: u16, text: &str, style: CellStyle) -> u16 {
        let Some(row) = self.rows.get_mut(y as usize) else {
            return 0;
        };
        let mut written = 0;
        for (slot, ch) in row.iter_mut().skip(x as usize).zip(text.chars()) {
            *slot = Cell::styled(ch, style);
            written += 1;
        }
        written
    }

    /// Fill `area` (clipped to the grid) with `cell`.
    pub fn fill(&mut self, area: Rect, cell: Cell) {
        let Some(area) = area.intersect(&Rect::from_size(self.size())) else {
            return;
        };
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.set(x, y, cell);
            }
        }
    }

    /// Copy `src` into this grid with its top-left corner at `(x, y)`.
    ///
    /// Cells of `src` falling outside this grid are dropped.
    pub fn blit(&mut self, x: u16, y: u16, src: &Grid) {
        self.blit_clipped(Rect::new(x, y, src.width, src.height()), src);
    }

    /// Copy `src` into `area`, dropping any part of `src` that does not fit
    /// inside `area` or inside this grid.
    pub fn blit_clipped(&mut self, area: Rect, src: &Grid) {
        for (dy, src_row) in src.rows.iter().enumerate().take(area.height as usize) {
            let Some(dst_row) = self.rows.get_mut(area.y as usize + dy) else {
                break;
            };
            for (dst, cell) in dst_row
                .iter_mut()
                .skip(area.x as usize)
                .zip(src_row.iter().take(area.width as usize))
            {
                *dst = *cell;
            }
        }
    }

    /// The glyphs of every row, joined by newlines, styles dropped.
    pub fn to_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.iter().map(|c| c.ch).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<&Buffer> for Grid {
    /// Convert a ratatui buffer, taking the first char of each symbol.
    fn from(buf: &Buffer) -> Self {
        let area = buf.area;
        let mut grid = Grid::blank(area.width, area.height);
        for y in 0..area.height {
            for x in 0..area.width {
                let src = &buf[(area.x + x, area.y + y)];
                let ch = src.symbol().chars().next().unwrap_or(' ');
                let style = CellStyle {
                    fg: convert_color(src.fg),
                    bg: convert_color(src.bg),
                    bold: src.modifier.contains(Modifier::BOLD),
                    underline: src.modifier.contains(Modifier::UNDERLINED),
                };
                grid.set(x, y, Cell::styled(ch, style));
            }
        }
        grid
    }
}

fn convert_color(color: ratatui::style::Color) -> Option<Color> {
    use ratatui::style::Color as R;
    Some(match color {
        R::Reset => return None,
        R::Black => Color::Black,
        R::Red => Color::DarkRed,
        R::Green => Color::DarkGreen,
        R::Yellow => Color::DarkYellow,
        R::Blue => Color::DarkBlue,
        R::Magenta => Color::DarkMagenta,
        R::Cyan => Color::DarkCyan,
        R::Gray => Color::Grey,
        R::DarkGray => Color::DarkGrey,
        R::LightRed => Color::Red,
        R::LightGreen => Color::Green,
        R::LightYellow => Color::Yellow,
        R::LightBlue => Color::Blue,
        R::LightMagenta => Color::Magenta,
        R::LightCyan => Color::Cyan,
        R::White => Color::White,
        R::Rgb(r, g, b) => Color::Rgb { r, g, b },
        R::Indexed(i) => Color::AnsiValue(i),
    })
}
