//! Animated loading spinner with multiple built-in frame sets.

use crate::paint;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget as _};
use steep_core::{Grid, Widget, WidgetEvent};

/// Built-in spinner frame sets.
pub mod frames {
    /// Braille dot spinner cycling through ten positions.
    pub const DOTS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    /// Classic ASCII line spinner: |, /, -, \.
    pub const LINE: &[&str] = &["|", "/", "-", "\\"];
    /// Compact braille dot spinner with six frames.
    pub const MINI_DOT: &[&str] = &["⠋", "⠙", "⠸", "⠴", "⠦", "⠇"];
    /// Block characters that pulse between solid and transparent.
    pub const PULSE: &[&str] = &["█", "▓", "▒", "░", "▒", "▓"];
    /// Three-dot pattern with a moving filled dot.
    pub const POINTS: &[&str] = &["∙∙∙", "●∙∙", "∙●∙", "∙∙●"];
    /// Meter-style bar that fills and empties.
    pub const METER: &[&str] = &["▱▱▱", "▰▱▱", "▰▰▱", "▰▰▰", "▰▰▱", "▰▱▱"];
    /// Growing ellipsis from empty to three dots.
    pub const ELLIPSIS: &[&str] = &["", ".", "..", "..."];
}

/// The render reason the event loop's ticker uses.
pub const TICK: &str = "tick";

/// A spinner that advances one frame per ticker render request while
/// spinning.
///
/// Commands: `<id>.start`, `<id>.stop`, and `<id>.title` (payload is the
/// new title).
#[derive(Debug, Clone)]
pub struct Spinner {
    id: String,
    frames: &'static [&'static str],
    frame_index: usize,
    title: String,
    style: Style,
    spinning: bool,
}

impl Spinner {
    /// A spinning spinner using [`frames::DOTS`].
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            frames: frames::DOTS,
            frame_index: 0,
            title: String::new(),
            style: Style::default().fg(Color::Cyan),
            spinning: true,
        }
    }

    /// Use a different frame set. An empty set is ignored.
    pub fn with_frames(mut self, frames: &'static [&'static str]) -> Self {
        if !frames.is_empty() {
            self.frames = frames;
            self.frame_index = 0;
        }
        self
    }

    /// Text shown after the spinner frame.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Style applied to the spinner frame.
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Whether the spinner is currently animating.
    pub fn is_spinning(&self) -> bool {
        self.spinning
    }

    /// The frame that would be drawn now.
    pub fn current_frame(&self) -> &'static str {
        self.frames[self.frame_index % self.frames.len()]
    }

    /// The current title.
    pub fn title(&self) -> &str {
        &self.title
    }

    fn command(&mut self, name: &str, payload: Option<&str>) {
        let Some(action) = name
            .strip_prefix(self.id.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
        else {
            return;
        };
        match action {
            "start" => self.spinning = true,
            "stop" => self.spinning = false,
            "title" => self.title = payload.unwrap_or_default().to_string(),
            _ => {}
        }
    }
}

impl Widget for Spinner {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn receive(&mut self, event: &WidgetEvent) {
        match event {
            WidgetEvent::RenderRequest(reason) if reason == TICK && self.spinning => {
                self.frame_index = (self.frame_index + 1) % self.frames.len();
            }
            WidgetEvent::Command { name, payload } => self.command(name, payload.as_deref()),
            _ => {}
        }
    }

    fn render(&self, width: u16, height: u16) -> Grid {
        paint(width, height.min(1), |area, buf| {
            let mut spans = Vec::with_capacity(3);
            if self.spinning {
                spans.push(Span::styled(self.current_frame(), self.style));
            }
            if !self.title.is_empty() {
                if self.spinning {
                    spans.push(Span::raw(" "));
                }
                spans.push(Span::raw(self.title.as_str()));
            }
            Paragraph::new(Line::from(spans)).render(area, buf);
        })
    }

    fn focusable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(s: &mut Spinner) {
        s.receive(&WidgetEvent::RenderRequest(TICK.into()));
    }

    fn command(s: &mut Spinner, name: &str, payload: Option<&str>) {
        s.receive(&WidgetEvent::Command {
            name: name.into(),
            payload: payload.map(String::from),
        });
    }

    #[test]
    fn ticks_advance_and_wrap() {
        let mut s = Spinner::new("sp").with_frames(frames::LINE);
        assert_eq!(s.current_frame(), "|");
        tick(&mut s);
        assert_eq!(s.current_frame(), "/");
        for _ in 0..3 {
            tick(&mut s);
        }
        assert_eq!(s.current_frame(), "|");
    }

    #[test]
    fn other_render_reasons_do_not_advance() {
        let mut s = Spinner::new("sp").with_frames(frames::LINE);
        s.receive(&WidgetEvent::RenderRequest("start".into()));
        s.receive(&WidgetEvent::KeyPress("up".into()));
        assert_eq!(s.current_frame(), "|");
    }

    #[test]
    fn stop_freezes_and_hides_frame() {
        let mut s = Spinner::new("sp").with_frames(frames::LINE).with_title("load");
        command(&mut s, "sp.stop", None);
        assert!(!s.is_spinning());
        tick(&mut s);
        assert_eq!(s.current_frame(), "|");
        assert_eq!(s.render(6, 1).to_text(), "load  ");

        command(&mut s, "sp.start", None);
        assert_eq!(s.render(6, 1).to_text(), "| load");
    }

    #[test]
    fn title_command_is_scoped() {
        let mut s = Spinner::new("sp");
        command(&mut s, "sp.title", Some("fetching"));
        command(&mut s, "spx.title", Some("nope"));
        assert_eq!(s.title(), "fetching");
    }

    #[test]
    fn empty_frame_set_is_ignored() {
        let s = Spinner::new("sp").with_frames(&[]);
        assert_eq!(s.current_frame(), "⠋");
    }

    #[test]
    fn renders_braille_frame() {
        let s = Spinner::new("sp");
        assert_eq!(s.render(3, 1).to_text(), "⠋  ");
    }
}
