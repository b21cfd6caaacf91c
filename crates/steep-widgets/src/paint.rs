//! Drawing widgets with ratatui.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use steep_core::Grid;

/// Run `draw` against a blank `width × height` ratatui buffer and convert
/// the result into a [`Grid`].
///
/// This lets a [`steep_core::Widget`] reuse any ratatui widget:
///
/// ```
/// use ratatui::widgets::{Paragraph, Widget};
/// use steep_widgets::paint;
///
/// let grid = paint(5, 1, |area, buf| Paragraph::new("hi").render(area, buf));
/// assert_eq!(grid.to_text(), "hi   ");
/// ```
pub fn paint(width: u16, height: u16, draw: impl FnOnce(Rect, &mut Buffer)) -> Grid {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    if !area.is_empty() {
        draw(area, &mut buf);
    }
    Grid::from(&buf)
}
