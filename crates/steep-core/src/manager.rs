//! Widget ownership, focus, and frame composition.

use crate::event::WidgetEvent;
use crate::geometry::{Point, Rect, Size};
use crate::grid::Grid;
use crate::layout::{resolve, LayoutError, LayoutNode};
use crate::widget::Widget;
use std::collections::HashSet;
use tracing::debug;

/// One composed frame: the full-screen grid plus where the cursor belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The composed screen.
    pub grid: Grid,
    /// Absolute cursor position requested by the focused widget, if any.
    pub cursor: Option<Point>,
}

/// Owns the mounted widgets and the focus cursor, and composes them into
/// full-screen grids.
///
/// Widgets are kept in insertion order; focus navigation follows that order.
/// With a layout tree, every widget renders into its resolved rectangle.
/// Without one, only the focused widget is rendered, at full size.
pub struct WidgetManager {
    widgets: Vec<Box<dyn Widget>>,
    focus: Option<usize>,
    layout: Option<LayoutNode>,
}

impl std::fmt::Debug for WidgetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetManager")
            .field("widgets", &self.identifiers())
            .field("focus", &self.focus)
            .field("layout", &self.layout)
            .finish()
    }
}

impl WidgetManager {
    /// Mount `widgets` in order and focus the first focusable one.
    ///
    /// Fails if two widgets share an identifier.
    pub fn new(widgets: Vec<Box<dyn Widget>>) -> Result<Self, LayoutError> {
        let mut seen = HashSet::new();
        for w in &widgets {
            if !seen.insert(w.identifier()) {
                return Err(LayoutError::DuplicateWidget {
                    id: w.identifier().to_string(),
                });
            }
        }
        let focus = widgets.iter().position(|w| w.focusable());
        Ok(Self {
            widgets,
            focus,
            layout: None,
        })
    }

    /// Attach a layout tree, checking that every leaf names a mounted widget.
    pub fn with_layout(mut self, layout: LayoutNode) -> Result<Self, LayoutError> {
        layout.validate(self.widgets.iter().map(|w| w.identifier()))?;
        self.layout = Some(layout);
        Ok(self)
    }

    /// The layout tree, if one is attached.
    pub fn layout(&self) -> Option<&LayoutNode> {
        self.layout.as_ref()
    }

    /// Number of mounted widgets.
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    /// Whether no widgets are mounted.
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Identifiers in mount order.
    pub fn identifiers(&self) -> Vec<&str> {
        self.widgets.iter().map(|w| w.identifier()).collect()
    }

    /// Read-only access to a widget by identifier.
    pub fn widget(&self, id: &str) -> Option<&dyn Widget> {
        self.widgets
            .iter()
            .find(|w| w.identifier() == id)
            .map(|w| w.as_ref())
    }

    /// Index of the focused widget.
    pub fn focus_index(&self) -> Option<usize> {
        self.focus
    }

    /// Identifier of the focused widget.
    pub fn focused_id(&self) -> Option<&str> {
        self.focus.map(|i| self.widgets[i].identifier())
    }

    /// Focus the widget named `id` if it exists and is focusable.
    pub fn focus(&mut self, id: &str) -> bool {
        match self
            .widgets
            .iter()
            .position(|w| w.identifier() == id && w.focusable())
        {
            Some(i) => {
                self.focus = Some(i);
                true
            }
            None => false,
        }
    }

    /// Move focus to the next focusable widget, wrapping around.
    ///
    /// Returns the new focus index. No-op when nothing is focusable.
    pub fn focus_next(&mut self) -> Option<usize> {
        self.step_focus(true)
    }

    /// Move focus to the previous focusable widget, wrapping around.
    pub fn focus_prev(&mut self) -> Option<usize> {
        self.step_focus(false)
    }

    fn step_focus(&mut self, forward: bool) -> Option<usize> {
        let n = self.widgets.len();
        if n == 0 {
            return None;
        }
        let start = match self.focus {
            Some(i) => i,
            // Start just "before" index 0 going forward, or "after" the last
            // going backward, so the first step lands on an end.
            None if forward => n - 1,
            None => 0,
        };
        let next = (1..=n)
            .map(|step| {
                if forward {
                    (start + step) % n
                } else {
                    (start + n - step % n) % n
                }
            })
            .find(|&i| self.widgets[i].focusable());
        if next.is_some() {
            self.focus = next;
            debug!(focus = ?self.focused_id(), "focus moved");
        }
        self.focus
    }

    /// Deliver `event` to the focused widget only.
    ///
    /// Returns `false` when nothing is focused.
    pub fn route_to_focused(&mut self, event: &WidgetEvent) -> bool {
        match self.focus.and_then(|i| self.widgets.get_mut(i)) {
            Some(widget) => {
                widget.receive(event);
                true
            }
            None => false,
        }
    }

    /// Deliver `event` to every widget in mount order.
    pub fn broadcast(&mut self, event: &WidgetEvent) {
        for widget in &mut self.widgets {
            widget.receive(event);
        }
    }

    /// Compose a full `width × height` grid.
    pub fn compose(&self, width: u16, height: u16) -> Grid {
        self.compose_frame(Size::new(width, height)).grid
    }

    /// Compose a full-screen frame, including the cursor position.
    ///
    /// Cells not covered by any widget are blank. Widgets without a resolved
    /// rectangle (zero allocation) are not rendered at all.
    pub fn compose_frame(&self, size: Size) -> Frame {
        let mut grid = Grid::blank(size.width, size.height);
        let screen = Rect::from_size(size);
        let mut cursor = None;

        match &self.layout {
            Some(layout) => {
                let areas = resolve(layout, screen);
                for (i, widget) in self.widgets.iter().enumerate() {
                    let Some(area) = areas.get(widget.identifier()) else {
                        continue;
                    };
                    if area.is_empty() {
                        continue;
                    }
                    grid.blit_clipped(*area, &widget.render(area.width, area.height));
                    if self.focus == Some(i) {
                        cursor = place_cursor(widget.as_ref(), *area);
                    }
                }
            }
            None => {
                if let Some(widget) = self.focus.map(|i| &self.widgets[i]) {
                    grid.blit_clipped(screen, &widget.render(size.width, size.height));
                    cursor = place_cursor(widget.as_ref(), screen);
                }
            }
        }

        Frame { grid, cursor }
    }
}

/// Translate a widget-relative cursor into screen coordinates, dropping it
/// when it falls outside the widget's area.
fn place_cursor(widget: &dyn Widget, area: Rect) -> Option<Point> {
    let rel = widget.cursor(area.width, area.height)?;
    let abs = Point::new(area.x.saturating_add(rel.x), area.y.saturating_add(rel.y));
    area.contains(abs).then_some(abs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellStyle;
    use crate::layout::Constraint;

    struct Probe {
        id: &'static str,
        glyph: char,
        focusable: bool,
        received: Vec<WidgetEvent>,
        cursor: Option<Point>,
    }

    impl Probe {
        fn boxed(id: &'static str, glyph: char) -> Box<dyn Widget> {
            Box::new(Self::new(id, glyph))
        }

        fn new(id: &'static str, glyph: char) -> Self {
            Probe {
                id,
                glyph,
                focusable: true,
                received: Vec::new(),
                cursor: None,
            }
        }
    }

    impl Widget for Probe {
        fn identifier(&self) -> &str {
            self.id
        }

        fn receive(&mut self, event: &WidgetEvent) {
            self.received.push(event.clone());
            if let WidgetEvent::Input(c) = event {
                self.glyph = *c;
            }
        }

        fn render(&self, width: u16, height: u16) -> Grid {
            let mut g = Grid::blank(width, height);
            let line: String = std::iter::repeat(self.glyph).take(width as usize).collect();
            for y in 0..height {
                g.put_str(0, y, &line, CellStyle::PLAIN);
            }
            g
        }

        fn focusable(&self) -> bool {
            self.focusable
        }

        fn cursor(&self, _width: u16, _height: u16) -> Option<Point> {
            self.cursor
        }
    }

    /// Renders a single glyph regardless of the requested size.
    struct Tiny(&'static str, char);

    impl Widget for Tiny {
        fn identifier(&self) -> &str {
            self.0
        }
        fn receive(&mut self, _: &WidgetEvent) {}
        fn render(&self, _: u16, _: u16) -> Grid {
            Grid::from_lines(&[self.1.to_string()])
        }
    }

    fn three() -> WidgetManager {
        WidgetManager::new(vec![
            Probe::boxed("a", 'a'),
            Probe::boxed("b", 'b'),
            Probe::boxed("c", 'c'),
        ])
        .unwrap()
    }

    #[test]
    fn focus_starts_at_first_focusable() {
        let mut skip = Probe::new("skip", 's');
        skip.focusable = false;
        let m = WidgetManager::new(vec![Box::new(skip), Probe::boxed("x", 'x')]).unwrap();
        assert_eq!(m.focus_index(), Some(1));
    }

    #[test]
    fn focus_next_wraps_after_n_steps() {
        let mut m = three();
        for _ in 0..3 {
            m.focus_next();
        }
        assert_eq!(m.focus_index(), Some(0));
    }

    #[test]
    fn focus_prev_wraps_backwards() {
        let mut m = three();
        assert_eq!(m.focus_prev(), Some(2));
        assert_eq!(m.focus_prev(), Some(1));
    }

    #[test]
    fn non_focusable_widgets_are_skipped() {
        let mut middle = Probe::new("mid", 'm');
        middle.focusable = false;
        let mut m = WidgetManager::new(vec![
            Probe::boxed("a", 'a'),
            Box::new(middle),
            Probe::boxed("c", 'c'),
        ])
        .unwrap();
        assert_eq!(m.focus_next(), Some(2));
        assert_eq!(m.focus_next(), Some(0));
        assert_eq!(m.focus_prev(), Some(2));
        assert_eq!(m.focus_prev(), Some(0));
    }

    #[test]
    fn focus_is_noop_without_focusable_widgets() {
        let mut m = WidgetManager::new(vec![]).unwrap();
        assert_eq!(m.focus_next(), None);
        assert_eq!(m.focus_prev(), None);

        let mut only = Probe::new("x", 'x');
        only.focusable = false;
        let mut m = WidgetManager::new(vec![Box::new(only)]).unwrap();
        assert_eq!(m.focus_next(), None);
        assert!(!m.route_to_focused(&WidgetEvent::Input('z')));
    }

    #[test]
    fn focus_by_identifier() {
        let mut m = three();
        assert!(m.focus("c"));
        assert_eq!(m.focused_id(), Some("c"));
        assert!(!m.focus("nope"));
        assert_eq!(m.focused_id(), Some("c"));
    }

    #[test]
    fn route_reaches_only_focused() {
        let mut m = three();
        m.focus_next();
        m.route_to_focused(&WidgetEvent::Input('z'));
        assert_eq!(m.compose(3, 1).to_text(), "zzz");
        let layout = LayoutNode::horizontal([
            LayoutNode::leaf("a"),
            LayoutNode::leaf("b"),
            LayoutNode::leaf("c"),
        ]);
        let m = m.with_layout(layout).unwrap();
        assert_eq!(m.compose(3, 1).to_text(), "azc");
    }

    #[test]
    fn broadcast_reaches_everyone() {
        let layout = LayoutNode::horizontal([
            LayoutNode::leaf("a"),
            LayoutNode::leaf("b"),
            LayoutNode::leaf("c"),
        ]);
        let mut m = three().with_layout(layout).unwrap();
        m.broadcast(&WidgetEvent::Input('q'));
        assert_eq!(m.compose(6, 1).to_text(), "qqqqqq");
    }

    #[test]
    fn compose_without_layout_pads_focused_widget() {
        let m = WidgetManager::new(vec![Box::new(Tiny("t", 'X'))]).unwrap();
        let g = m.compose(3, 1);
        assert_eq!(g.size(), Size::new(3, 1));
        assert_eq!(g.to_text(), "X  ");
    }

    #[test]
    fn compose_with_layout_places_widgets() {
        let layout = LayoutNode::vertical([
            LayoutNode::leaf("a").constraint(Constraint::Length(1)),
            LayoutNode::horizontal([
                LayoutNode::leaf("b").constraint(Constraint::Percent(50)),
                LayoutNode::leaf("c"),
            ]),
        ]);
        let m = three().with_layout(layout).unwrap();
        assert_eq!(m.compose(4, 3).to_text(), "aaaa\nbbcc\nbbcc");
    }

    #[test]
    fn uncovered_cells_are_blank() {
        let layout = LayoutNode::horizontal([
            LayoutNode::leaf("a").constraint(Constraint::Length(2)),
            LayoutNode::leaf("t").constraint(Constraint::Length(2)),
        ]);
        let m = WidgetManager::new(vec![Probe::boxed("a", 'a'), Box::new(Tiny("t", 'T'))])
            .unwrap()
            .with_layout(layout)
            .unwrap();
        assert_eq!(m.compose(4, 2).to_text(), "aaT \naa  ");
    }

    #[test]
    fn zero_allocation_widget_renders_nothing() {
        let layout = LayoutNode::horizontal([
            LayoutNode::leaf("a").constraint(Constraint::Length(0)),
            LayoutNode::leaf("b"),
        ]);
        let m = WidgetManager::new(vec![Probe::boxed("a", 'a'), Probe::boxed("b", 'b')])
            .unwrap()
            .with_layout(layout)
            .unwrap();
        assert_eq!(m.compose(3, 1).to_text(), "bbb");
    }

    #[test]
    fn unmounted_layout_identifier_is_rejected() {
        let layout = LayoutNode::horizontal([LayoutNode::leaf("a"), LayoutNode::leaf("zzz")]);
        let err = three().with_layout(layout).unwrap_err();
        assert_eq!(err, LayoutError::UnmountedWidget { id: "zzz".into() });
    }

    #[test]
    fn duplicate_identifiers_are_rejected() {
        let err = WidgetManager::new(vec![Probe::boxed("a", '1'), Probe::boxed("a", '2')])
            .unwrap_err();
        assert_eq!(err, LayoutError::DuplicateWidget { id: "a".into() });
    }

    #[test]
    fn cursor_is_translated_to_screen_coordinates() {
        let mut b = Probe::new("b", 'b');
        b.cursor = Some(Point::new(1, 0));
        let layout = LayoutNode::horizontal([LayoutNode::leaf("a"), LayoutNode::leaf("b")]);
        let mut m = WidgetManager::new(vec![Probe::boxed("a", 'a'), Box::new(b)])
            .unwrap()
            .with_layout(layout)
            .unwrap();
        assert_eq!(m.compose_frame(Size::new(10, 2)).cursor, None);
        m.focus_next();
        assert_eq!(
            m.compose_frame(Size::new(10, 2)).cursor,
            Some(Point::new(6, 0))
        );
    }

    #[test]
    fn cursor_outside_area_is_dropped() {
        let mut a = Probe::new("a", 'a');
        a.cursor = Some(Point::new(9, 0));
        let m = WidgetManager::new(vec![Box::new(a)]).unwrap();
        assert_eq!(m.compose_frame(Size::new(4, 1)).cursor, None);
    }
}
