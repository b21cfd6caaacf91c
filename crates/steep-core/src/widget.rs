use crate::event::WidgetEvent;
use crate::geometry::Point;
use crate::grid::Grid;

/// The contract every widget implements to be hosted by the
/// [`WidgetManager`](crate::manager::WidgetManager).
///
/// The manager is a widget's sole owner. State changes only through
/// [`receive`](Widget::receive), which the dispatcher calls one event at a
/// time; [`render`](Widget::render) must be a pure function of that state and
/// the requested dimensions.
///
/// # Example
///
/// ```
/// use steep_core::{Grid, Widget, WidgetEvent};
///
/// struct Counter { count: u32 }
///
/// impl Widget for Counter {
///     fn identifier(&self) -> &str { "counter" }
///
///     fn receive(&mut self, event: &WidgetEvent) {
///         if let WidgetEvent::KeyPress(name) = event {
///             if name == "up" { self.count += 1; }
///         }
///     }
///
///     fn render(&self, width: u16, height: u16) -> Grid {
///         let mut grid = Grid::blank(width, height);
///         grid.put_str(0, 0, &format!("Count: {}", self.count), Default::default());
///         grid
///     }
/// }
/// ```
pub trait Widget: Send + 'static {
    /// Stable identifier, unique among mounted widgets. Layout leaves refer
    /// to widgets by this name.
    fn identifier(&self) -> &str;

    /// Handle one event, mutating internal state.
    fn receive(&mut self, event: &WidgetEvent);

    /// Draw the current state into a grid no larger than `width × height`.
    ///
    /// Smaller grids are padded with blanks by the manager; larger ones are
    /// clipped.
    fn render(&self, width: u16, height: u16) -> Grid;

    /// Whether focus navigation may select this widget. Defaults to `true`.
    fn focusable(&self) -> bool {
        true
    }

    /// Where the terminal cursor should sit while this widget is focused,
    /// relative to the widget's top-left corner. `None` hides the cursor.
    ///
    /// `width` and `height` are the dimensions of the matching
    /// [`render`](Widget::render) call, so widgets that scroll can place the
    /// cursor without remembering how they were last drawn.
    fn cursor(&self, _width: u16, _height: u16) -> Option<Point> {
        None
    }
}
