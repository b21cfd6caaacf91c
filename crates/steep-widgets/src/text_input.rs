//! Single-line text input with cursor movement, word editing, paste,
//! submission history, and an optional character limit.

use crate::history::History;
use crate::paint;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget as _};
use steep_core::{Grid, Point, Widget, WidgetEvent};

/// How the value is displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EchoMode {
    /// Show the text as typed.
    #[default]
    Normal,
    /// Show each character as `*`.
    Password,
}

/// A single-line editor.
///
/// | Key | Action |
/// |-----|--------|
/// | `left` / `right` | Move one character |
/// | `home` / `ctrl+a` | Move to start |
/// | `end` / `ctrl+e` | Move to end |
/// | `backspace` / `delete` | Delete before / under the cursor |
/// | `ctrl+w` | Delete the word before the cursor |
/// | `ctrl+u` / `ctrl+k` | Delete to start / to end |
/// | `up` / `down` | Browse submitted entries |
/// | `enter` | Submit: record in history and clear |
///
/// Commands: `<id>.clear`, and `<id>.set` with the new value as payload.
///
/// # Example
///
/// ```
/// use steep_core::{Widget, WidgetEvent};
/// use steep_widgets::text_input::TextInput;
///
/// let mut input = TextInput::new("name").with_prompt("> ");
/// for c in "hi".chars() {
///     input.receive(&WidgetEvent::Input(c));
/// }
/// assert_eq!(input.value(), "hi");
/// assert_eq!(input.render(6, 1).to_text(), "> hi  ");
/// ```
#[derive(Debug, Clone)]
pub struct TextInput {
    id: String,
    prompt: String,
    placeholder: String,
    value: Vec<char>,
    cursor: usize,
    char_limit: Option<usize>,
    echo: EchoMode,
    history: History,
    submitted: Option<String>,
    placeholder_style: Style,
}

impl TextInput {
    /// An empty input.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: String::new(),
            placeholder: String::new(),
            value: Vec::new(),
            cursor: 0,
            char_limit: None,
            echo: EchoMode::Normal,
            history: History::new(100),
            submitted: None,
            placeholder_style: Style::default().fg(Color::DarkGray),
        }
    }

    /// Text drawn before the value.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Text shown while the value is empty.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Maximum number of characters accepted.
    pub fn with_char_limit(mut self, limit: usize) -> Self {
        self.char_limit = Some(limit);
        self
    }

    /// How the value is displayed.
    pub fn with_echo_mode(mut self, echo: EchoMode) -> Self {
        self.echo = echo;
        self
    }

    /// Keep at most `capacity` submitted entries.
    pub fn with_history(mut self, capacity: usize) -> Self {
        self.history = History::new(capacity);
        self
    }

    /// The current value.
    pub fn value(&self) -> String {
        self.value.iter().collect()
    }

    /// Replace the value and move the cursor to its end. Truncated to the
    /// character limit.
    pub fn set_value(&mut self, value: &str) {
        self.value = value.chars().collect();
        if let Some(limit) = self.char_limit {
            self.value.truncate(limit);
        }
        self.cursor = self.value.len();
    }

    /// Cursor index, in characters.
    pub fn cursor_position(&self) -> usize {
        self.cursor
    }

    /// The most recently submitted value.
    pub fn submitted(&self) -> Option<&str> {
        self.submitted.as_deref()
    }

    /// Submission history.
    pub fn history(&self) -> &History {
        &self.history
    }

    fn remaining(&self) -> usize {
        self.char_limit
            .map_or(usize::MAX, |limit| limit.saturating_sub(self.value.len()))
    }

    fn insert(&mut self, text: impl Iterator<Item = char>) {
        let chars: Vec<char> = text.filter(|c| !c.is_control()).take(self.remaining()).collect();
        let n = chars.len();
        self.value.splice(self.cursor..self.cursor, chars);
        self.cursor += n;
    }

    fn delete_word_backward(&mut self) {
        let mut start = self.cursor;
        while start > 0 && self.value[start - 1] == ' ' {
            start -= 1;
        }
        while start > 0 && self.value[start - 1] != ' ' {
            start -= 1;
        }
        self.value.drain(start..self.cursor);
        self.cursor = start;
    }

    fn submit(&mut self) {
        let value = self.value();
        self.history.push(value.clone());
        self.submitted = Some(value);
        self.value.clear();
        self.cursor = 0;
    }

    fn recall(&mut self, older: bool) {
        let current = self.value();
        let entry = if older {
            self.history.older(&current)
        } else {
            self.history.newer()
        };
        if let Some(entry) = entry.map(str::to_string) {
            self.set_value(&entry);
        }
    }

    fn key(&mut self, name: &str) {
        match name {
            "left" => self.cursor = self.cursor.saturating_sub(1),
            "right" => self.cursor = (self.cursor + 1).min(self.value.len()),
            "home" | "ctrl+a" => self.cursor = 0,
            "end" | "ctrl+e" => self.cursor = self.value.len(),
            "backspace" => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.value.remove(self.cursor);
                }
            }
            "delete" => {
                if self.cursor < self.value.len() {
                    self.value.remove(self.cursor);
                }
            }
            "ctrl+w" => self.delete_word_backward(),
            "ctrl+u" => {
                self.value.drain(..self.cursor);
                self.cursor = 0;
            }
            "ctrl+k" => self.value.truncate(self.cursor),
            "space" => self.insert(std::iter::once(' ')),
            "up" => self.recall(true),
            "down" => self.recall(false),
            "enter" => self.submit(),
            _ => {}
        }
    }

    fn command(&mut self, name: &str, payload: Option<&str>) {
        let Some(action) = name
            .strip_prefix(self.id.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
        else {
            return;
        };
        match action {
            "clear" => self.set_value(""),
            "set" => self.set_value(payload.unwrap_or_default()),
            _ => {}
        }
    }

    fn prompt_width(&self) -> usize {
        self.prompt.chars().count()
    }

    /// Columns left for the value at `width`.
    fn visible(&self, width: u16) -> usize {
        usize::from(width).saturating_sub(self.prompt_width())
    }

    /// First value character shown in `visible` columns: the view starts at
    /// the beginning and scrolls only as far as the cursor needs.
    fn offset(&self, visible: usize) -> usize {
        self.cursor.saturating_sub(visible.saturating_sub(1))
    }
}

impl Widget for TextInput {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn receive(&mut self, event: &WidgetEvent) {
        match event {
            WidgetEvent::Input(c) => self.insert(std::iter::once(*c)),
            WidgetEvent::Paste(text) => self.insert(text.chars()),
            WidgetEvent::KeyPress(name) => self.key(name),
            WidgetEvent::Command { name, payload } => self.command(name, payload.as_deref()),
            WidgetEvent::RenderRequest(_) => {}
        }
    }

    fn render(&self, width: u16, height: u16) -> Grid {
        let visible = self.visible(width);
        let offset = self.offset(visible);
        paint(width, height.min(1), |area, buf| {
            let mut spans = vec![Span::raw(self.prompt.as_str())];
            if self.value.is_empty() {
                spans.push(Span::styled(self.placeholder.as_str(), self.placeholder_style));
            } else {
                let shown: String = self.value[offset..]
                    .iter()
                    .take(visible)
                    .map(|&c| match self.echo {
                        EchoMode::Normal => c,
                        EchoMode::Password => '*',
                    })
                    .collect();
                spans.push(Span::raw(shown));
            }
            Paragraph::new(Line::from(spans)).render(area, buf);
        })
    }

    fn cursor(&self, width: u16, _height: u16) -> Option<Point> {
        let column = self.prompt_width() + self.cursor - self.offset(self.visible(width));
        Some(Point::new(u16::try_from(column).unwrap_or(u16::MAX), 0))
    }
}
