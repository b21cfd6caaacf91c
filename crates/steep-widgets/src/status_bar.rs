//! A three-section status line (left / center / right).

use crate::paint;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph, Widget as _};
use steep_core::{Grid, Widget, WidgetEvent};

/// A status bar filling one row, with left-aligned, centered and
/// right-aligned sections.
///
/// Never takes focus. Sections can be changed at runtime by broadcasting a
/// command named `<id>.left`, `<id>.center` or `<id>.right` with the new
/// text as payload.
///
/// # Example
///
/// ```
/// use steep_core::{Widget, WidgetEvent};
/// use steep_widgets::status_bar::StatusBar;
///
/// let mut bar = StatusBar::new("status").left("main").right("ok");
/// bar.receive(&WidgetEvent::Command { name: "status.right".into(), payload: Some("busy".into()) });
/// assert!(bar.render(20, 1).to_text().ends_with("busy"));
/// ```
#[derive(Debug, Clone)]
pub struct StatusBar {
    id: String,
    left: String,
    center: String,
    right: String,
    style: Style,
}

impl StatusBar {
    /// An empty status bar.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            left: String::new(),
            center: String::new(),
            right: String::new(),
            style: Style::default(),
        }
    }

    /// Set the left-aligned content.
    pub fn left(mut self, content: impl Into<String>) -> Self {
        self.left = content.into();
        self
    }

    /// Set the centered content.
    pub fn center(mut self, content: impl Into<String>) -> Self {
        self.center = content.into();
        self
    }

    /// Set the right-aligned content.
    pub fn right(mut self, content: impl Into<String>) -> Self {
        self.right = content.into();
        self
    }

    /// Set the base style (background color, etc.) for the whole bar.
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// The current `(left, center, right)` texts.
    pub fn sections(&self) -> (&str, &str, &str) {
        (&self.left, &self.center, &self.right)
    }
}

impl Widget for StatusBar {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn receive(&mut self, event: &WidgetEvent) {
        let WidgetEvent::Command { name, payload } = event else {
            return;
        };
        let Some(section) = name
            .strip_prefix(self.id.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
        else {
            return;
        };
        let text = payload.clone().unwrap_or_default();
        match section {
            "left" => self.left = text,
            "center" => self.center = text,
            "right" => self.right = text,
            _ => {}
        }
    }

    fn render(&self, width: u16, height: u16) -> Grid {
        paint(width, height.min(1), |area, buf| {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(33),
                    Constraint::Percentage(34),
                    Constraint::Percentage(33),
                ])
                .split(area);

            Block::default().style(self.style).render(area, buf);

            let sections = [
                (&self.left, Alignment::Left),
                (&self.center, Alignment::Center),
                (&self.right, Alignment::Right),
            ];
            for ((text, alignment), chunk) in sections.into_iter().zip(chunks.iter()) {
                if text.is_empty() {
                    continue;
                }
                Paragraph::new(Line::from(text.as_str()).patch_style(self.style))
                    .alignment(alignment)
                    .render(*chunk, buf);
            }
        })
    }

    fn focusable(&self) -> bool {
        false
    }
}
