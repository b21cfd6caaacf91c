use crate::command::TerminalCommand;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Instant;

/// Messages consumed by the [`Dispatcher`](crate::dispatcher::Dispatcher).
///
/// Input providers (the terminal reader, the ticker, an
/// [`EventLoopHandle`](crate::event_loop::EventLoopHandle)) produce these and
/// push them onto the event loop's input channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A printable character was typed.
    Input {
        /// The character.
        character: char,
        /// When it was read.
        timestamp: Instant,
    },
    /// A named key, e.g. `"enter"`, `"ctrl+c"`, `"shift+tab"`.
    KeyPress {
        /// Normalized key name (see [`key_name`]).
        name: String,
    },
    /// Bracketed-paste content.
    Paste {
        /// The pasted text.
        content: String,
    },
    /// The terminal was resized.
    Resize {
        /// New column count.
        columns: u16,
        /// New row count.
        rows: u16,
    },
    /// A named application command. `focus_next` and `focus_prev` move focus;
    /// anything else is broadcast to every widget.
    Command {
        /// Command name.
        name: String,
        /// Optional argument.
        payload: Option<String>,
    },
    /// Ask for a recomposition, e.g. from the animation ticker.
    RenderRequest {
        /// Why the frame was requested.
        reason: String,
    },
    /// A terminal control request forwarded to the renderer untouched.
    Terminal(TerminalCommand),
    /// Shut the pipeline down.
    Stop {
        /// Why shutdown was requested.
        reason: String,
    },
}

impl Event {
    /// A typed character stamped with the current time.
    pub fn input(character: char) -> Self {
        Event::Input {
            character,
            timestamp: Instant::now(),
        }
    }

    /// A named key press.
    pub fn key(name: impl Into<String>) -> Self {
        Event::KeyPress { name: name.into() }
    }

    /// A command without payload.
    pub fn command(name: impl Into<String>) -> Self {
        Event::Command {
            name: name.into(),
            payload: None,
        }
    }

    /// A command with a payload.
    pub fn command_with(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Event::Command {
            name: name.into(),
            payload: Some(payload.into()),
        }
    }

    /// A render request.
    pub fn render(reason: impl Into<String>) -> Self {
        Event::RenderRequest {
            reason: reason.into(),
        }
    }

    /// A stop request.
    pub fn stop(reason: impl Into<String>) -> Self {
        Event::Stop {
            reason: reason.into(),
        }
    }

    /// The name global key handlers are looked up by, for key-like events.
    ///
    /// Typed characters use the character itself (`"q"`).
    pub fn key_name(&self) -> Option<String> {
        match self {
            Event::Input { character, .. } => Some(character.to_string()),
            Event::KeyPress { name } => Some(name.clone()),
            _ => None,
        }
    }

    /// Convert a crossterm terminal event.
    ///
    /// Key releases, mouse and focus events have no counterpart and yield
    /// `None`. Unmodified (or shift-only) printable keys become
    /// [`Event::Input`]; everything else becomes a named [`Event::KeyPress`].
    pub fn from_terminal(event: crossterm::event::Event) -> Option<Self> {
        use crossterm::event::Event as Ct;
        match event {
            Ct::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                KeyCode::Char(c)
                    if key.modifiers.difference(KeyModifiers::SHIFT).is_empty() && !c.is_control() =>
                {
                    Some(Event::input(c))
                }
                _ => key_name(&key).map(Event::key),
            },
            Ct::Paste(content) => Some(Event::Paste { content }),
            Ct::Resize(columns, rows) => Some(Event::Resize { columns, rows }),
            _ => None,
        }
    }
}

/// Events delivered to widgets through [`Widget::receive`](crate::widget::Widget::receive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// A typed character.
    Input(char),
    /// A named key.
    KeyPress(String),
    /// Pasted text.
    Paste(String),
    /// A broadcast command.
    Command {
        /// Command name.
        name: String,
        /// Optional argument.
        payload: Option<String>,
    },
    /// A frame was requested; animated widgets advance here.
    RenderRequest(String),
}

/// Normalize a crossterm key event into a name such as `"a"`, `"enter"`,
/// `"ctrl+c"`, `"alt+x"`, `"shift+tab"` or `"f5"`.
///
/// Modifiers are prefixed in the fixed order `ctrl`, `alt`, `shift`. Shift
/// is folded into the character for printable keys. Returns `None` for key
/// codes with no stable name (media keys, lone modifiers).
pub fn key_name(key: &KeyEvent) -> Option<String> {
    let base = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_lowercase().to_string(),
        KeyCode::Enter => "enter".into(),
        KeyCode::Esc => "escape".into(),
        KeyCode::Backspace => "backspace".into(),
        KeyCode::Tab => "tab".into(),
        KeyCode::BackTab => return Some("shift+tab".into()),
        KeyCode::Delete => "delete".into(),
        KeyCode::Insert => "insert".into(),
        KeyCode::Up => "up".into(),
        KeyCode::Down => "down".into(),
        KeyCode::Left => "left".into(),
        KeyCode::Right => "right".into(),
        KeyCode::Home => "home".into(),
        KeyCode::End => "end".into(),
        KeyCode::PageUp => "pageup".into(),
        KeyCode::PageDown => "pagedown".into(),
        KeyCode::F(n) => format!("f{n}"),
        _ => return None,
    };

    let printable = matches!(key.code, KeyCode::Char(c) if c != ' ');
    let mut name = String::new();
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        name.push_str("ctrl+");
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        name.push_str("alt+");
    }
    if key.modifiers.contains(KeyModifiers::SHIFT) && !printable {
        name.push_str("shift+");
    }
    name.push_str(&base);
    Some(name)
}
