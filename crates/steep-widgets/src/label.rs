//! Static, optionally bordered text.

use crate::paint;
use ratatui::style::Style;
use ratatui::text::Text;
use ratatui::widgets::{Block, Borders, Paragraph, Widget as _, Wrap};
use steep_core::{Grid, Widget, WidgetEvent};

/// Multi-line text with an optional titled border. Never focusable.
///
/// `<id>.set` replaces the text with the payload.
#[derive(Debug, Clone)]
pub struct Label {
    id: String,
    text: String,
    title: Option<String>,
    style: Style,
    wrap: bool,
}

impl Label {
    /// A label showing `text`.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            title: None,
            style: Style::default(),
            wrap: false,
        }
    }

    /// Draw a border with `title` around the text.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Text style.
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Wrap long lines at word boundaries instead of clipping.
    pub fn wrapped(mut self) -> Self {
        self.wrap = true;
        self
    }

    /// The current text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Widget for Label {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn receive(&mut self, event: &WidgetEvent) {
        if let WidgetEvent::Command { name, payload } = event {
            if name.strip_prefix(self.id.as_str()) == Some(".set") {
                self.text = payload.clone().unwrap_or_default();
            }
        }
    }

    fn render(&self, width: u16, height: u16) -> Grid {
        paint(width, height, |area, buf| {
            let mut paragraph = Paragraph::new(Text::styled(self.text.as_str(), self.style));
            if let Some(title) = &self.title {
                paragraph = paragraph.block(Block::default().borders(Borders::ALL).title(title.as_str()));
            }
            if self.wrap {
                paragraph = paragraph.wrap(Wrap { trim: true });
            }
            paragraph.render(area, buf);
        })
    }

    fn focusable(&self) -> bool {
        false
    }
}
