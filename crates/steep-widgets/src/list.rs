//! A scrollable, single-selection list of strings.

use crate::paint;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{List, ListItem, ListState, Paragraph, StatefulWidget, Widget as _};
use steep_core::{Grid, Widget, WidgetEvent};

/// A vertical list with a highlighted selection.
///
/// `up`/`k` and `down`/`j` move by one, `pageup`/`pagedown` by
/// [`page_size`](SelectList::with_page_size), `home`/`end` jump to the ends,
/// and `enter` or `space` choose the selected item. The view scrolls so the
/// selection stays visible.
///
/// Commands: `<id>.clear` removes every item, `<id>.push` appends the payload.
#[derive(Debug, Clone)]
pub struct SelectList {
    id: String,
    items: Vec<String>,
    selected: usize,
    chosen: Option<usize>,
    page_size: usize,
    placeholder: String,
    highlight: Style,
}

impl SelectList {
    /// A list over `items`, with the first one selected.
    pub fn new(id: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            id: id.into(),
            items,
            selected: 0,
            chosen: None,
            page_size: 10,
            placeholder: "No items".into(),
            highlight: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Rows moved by `pageup` / `pagedown`. At least one.
    pub fn with_page_size(mut self, rows: usize) -> Self {
        self.page_size = rows.max(1);
        self
    }

    /// Text shown when there are no items.
    pub fn with_placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = text.into();
        self
    }

    /// Style of the selected row.
    pub fn with_highlight(mut self, style: Style) -> Self {
        self.highlight = style;
        self
    }

    /// Index of the selected item, `None` when empty.
    pub fn selected(&self) -> Option<usize> {
        (!self.items.is_empty()).then_some(self.selected)
    }

    /// The selected item.
    pub fn selected_item(&self) -> Option<&str> {
        self.items.get(self.selected).map(String::as_str)
    }

    /// The item last chosen with `enter` or `space`.
    pub fn chosen(&self) -> Option<&str> {
        self.chosen
            .and_then(|i| self.items.get(i))
            .map(String::as_str)
    }

    /// All items.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Replace the items, keeping the selection in range.
    pub fn set_items(&mut self, items: Vec<String>) {
        self.items = items;
        self.chosen = None;
        self.select(self.selected);
    }

    fn select(&mut self, index: usize) {
        self.selected = index.min(self.items.len().saturating_sub(1));
    }

    fn key(&mut self, name: &str) {
        match name {
            "up" | "k" => self.select(self.selected.saturating_sub(1)),
            "down" | "j" => self.select(self.selected + 1),
            "pageup" => self.select(self.selected.saturating_sub(self.page_size)),
            "pagedown" => self.select(self.selected + self.page_size),
            "home" => self.select(0),
            "end" => self.select(usize::MAX),
            "enter" | "space" | " " => self.chosen = self.selected(),
            _ => {}
        }
    }
}

impl Widget for SelectList {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn receive(&mut self, event: &WidgetEvent) {
        match event {
            WidgetEvent::KeyPress(name) => self.key(name),
            WidgetEvent::Input(c) => self.key(c.encode_utf8(&mut [0; 4])),
            WidgetEvent::Command { name, payload } => {
                let action = name
                    .strip_prefix(self.id.as_str())
                    .and_then(|rest| rest.strip_prefix('.'));
                match (action, payload) {
                    (Some("clear"), _) => self.set_items(Vec::new()),
                    (Some("push"), Some(item)) => self.items.push(item.clone()),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn render(&self, width: u16, height: u16) -> Grid {
        paint(width, height, |area, buf| {
            if self.items.is_empty() {
                Paragraph::new(Line::styled(
                    self.placeholder.as_str(),
                    Style::default().fg(Color::DarkGray),
                ))
                .render(area, buf);
                return;
            }
            let offset = self
                .selected
                .saturating_sub(usize::from(area.height).saturating_sub(1));
            let mut state = ListState::default()
                .with_offset(offset)
                .with_selected(Some(self.selected));
            let items = self.items.iter().map(|item| ListItem::new(item.as_str()));
            StatefulWidget::render(
                List::new(items)
                    .highlight_style(self.highlight)
                    .highlight_symbol("▸ "),
                area,
                buf,
                &mut state,
            );
        })
    }
}
