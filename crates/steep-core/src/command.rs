use crate::geometry::Point;
use base64::Engine;
use std::fmt;

/// Terminal control requests handled by the
/// [`DiffRenderer`](crate::renderer::DiffRenderer).
///
/// These travel through the pipeline alongside frame diffs, either from a
/// global key handler, from [`Event::Terminal`](crate::event::Event::Terminal),
/// or from the cursor controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCommand {
    /// Switch to the alternate screen buffer.
    EnterAltScreen,
    /// Return to the primary screen buffer.
    ExitAltScreen,
    /// Make the terminal cursor visible.
    ShowCursor,
    /// Hide the terminal cursor.
    HideCursor,
    /// Move the cursor to an absolute cell.
    MoveCursor(Point),
    /// Enable bracketed paste mode.
    EnableBracketedPaste,
    /// Disable bracketed paste mode.
    DisableBracketedPaste,
    /// Write text to the system clipboard via OSC 52.
    SetClipboard(String),
    /// Set the terminal window title.
    SetTitle(String),
    /// Clear the entire terminal screen.
    ClearScreen,
}

/// OSC 52 clipboard write: `ESC ] 52 ; c ; <base64> BEL`.
///
/// Implemented as a [`crossterm::Command`] so it can be queued next to the
/// other escape sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyToClipboard<'a>(pub &'a str);

impl crossterm::Command for CopyToClipboard<'_> {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        let encoded = base64::engine::general_purpose::STANDARD.encode(self.0);
        write!(f, "\x1b]52;c;{encoded}\x07")
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "OSC 52 requires ANSI support",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::Command;

    #[test]
    fn osc52_encodes_payload() {
        let mut out = String::new();
        CopyToClipboard("hello").write_ansi(&mut out).unwrap();
        assert_eq!(out, "\x1b]52;c;aGVsbG8=\x07");
    }

    #[test]
    fn osc52_empty_payload() {
        let mut out = String::new();
        CopyToClipboard("").write_ansi(&mut out).unwrap();
        assert_eq!(out, "\x1b]52;c;\x07");
    }
}
