//! ANSI output: the only stage that writes to the terminal sink.

use crate::cell::CellStyle;
use crate::command::{CopyToClipboard, TerminalCommand};
use crate::geometry::Point;
use crate::screen::ScreenDiff;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::queue;
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use std::io::{self, Write};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Messages consumed by the renderer stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderMessage {
    /// Apply a frame diff.
    Diff(ScreenDiff),
    /// Apply a terminal control command.
    Terminal(TerminalCommand),
    /// One upstream stage has finished.
    Stop,
}

/// Writes [`ScreenDiff`]s and [`TerminalCommand`]s to an output sink as ANSI
/// escape sequences.
///
/// The renderer tracks which terminal modes it has switched on so that
/// [`shutdown`](DiffRenderer::shutdown) can put back exactly what it changed.
#[derive(Debug)]
pub struct DiffRenderer<W: Write> {
    out: W,
    alt_screen: bool,
    bracketed_paste: bool,
    cursor_hidden: bool,
    cursor: Option<Point>,
}

impl<W: Write> DiffRenderer<W> {
    /// Wrap `out`. No bytes are written until the first message.
    pub fn new(out: W) -> Self {
        Self {
            out,
            alt_screen: false,
            bracketed_paste: false,
            cursor_hidden: false,
            cursor: None,
        }
    }

    /// Write one diff.
    ///
    /// Each changed row is redrawn in full from column 0. Style escapes are
    /// emitted only where the style changes from the previous cell on the
    /// row, and a styled row ends with a reset. An empty diff writes and
    /// flushes nothing.
    pub fn render(&mut self, diff: &ScreenDiff) -> io::Result<()> {
        if diff.is_empty() {
            return Ok(());
        }

        for change in &diff.rows {
            queue!(self.out, MoveTo(0, change.row))?;
            let mut style = CellStyle::PLAIN;
            for cell in &change.cells {
                cell.style.write_transition(&style, &mut self.out)?;
                queue!(self.out, Print(cell.ch))?;
                style = cell.style;
            }
            if !style.is_plain() {
                queue!(self.out, SetAttribute(Attribute::Reset))?;
            }
        }

        if let Some(row) = diff.clear_from {
            queue!(self.out, MoveTo(0, row), Clear(ClearType::FromCursorDown))?;
        }

        if let Some(p) = self.cursor {
            queue!(self.out, MoveTo(p.x, p.y))?;
        }

        self.out.flush()
    }

    /// Apply one terminal command and flush.
    pub fn apply(&mut self, cmd: &TerminalCommand) -> io::Result<()> {
        match cmd {
            TerminalCommand::EnterAltScreen => {
                queue!(self.out, EnterAlternateScreen)?;
                self.alt_screen = true;
            }
            TerminalCommand::ExitAltScreen => {
                queue!(self.out, LeaveAlternateScreen)?;
                self.alt_screen = false;
            }
            TerminalCommand::ShowCursor => {
                queue!(self.out, Show)?;
                self.cursor_hidden = false;
            }
            TerminalCommand::HideCursor => {
                queue!(self.out, Hide)?;
                self.cursor_hidden = true;
            }
            TerminalCommand::MoveCursor(p) => {
                queue!(self.out, MoveTo(p.x, p.y))?;
                self.cursor = Some(*p);
            }
            TerminalCommand::EnableBracketedPaste => {
                queue!(self.out, EnableBracketedPaste)?;
                self.bracketed_paste = true;
            }
            TerminalCommand::DisableBracketedPaste => {
                queue!(self.out, DisableBracketedPaste)?;
                self.bracketed_paste = false;
            }
            TerminalCommand::SetClipboard(text) => {
                queue!(self.out, CopyToClipboard(text))?;
            }
            TerminalCommand::SetTitle(title) => {
                queue!(self.out, SetTitle(title))?;
            }
            TerminalCommand::ClearScreen => {
                queue!(self.out, Clear(ClearType::All))?;
            }
        }
        self.out.flush()
    }

    /// Undo every mode this renderer switched on: show the cursor, disable
    /// bracketed paste and leave the alternate screen.
    pub fn shutdown(&mut self) -> io::Result<()> {
        queue!(self.out, SetAttribute(Attribute::Reset))?;
        if self.cursor_hidden {
            queue!(self.out, Show)?;
            self.cursor_hidden = false;
        }
        if self.bracketed_paste {
            queue!(self.out, DisableBracketedPaste)?;
            self.bracketed_paste = false;
        }
        if self.alt_screen {
            queue!(self.out, LeaveAlternateScreen)?;
            self.alt_screen = false;
        }
        self.out.flush()
    }

    /// Whether the alternate screen is active.
    pub fn in_alt_screen(&self) -> bool {
        self.alt_screen
    }

    /// Whether bracketed paste is enabled.
    pub fn bracketed_paste(&self) -> bool {
        self.bracketed_paste
    }

    /// Whether the cursor is hidden.
    pub fn cursor_hidden(&self) -> bool {
        self.cursor_hidden
    }

    /// The sink.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Mutable access to the sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Consume the renderer, returning the sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Renderer stage loop.
///
/// Handles messages until it has seen `upstreams` [`RenderMessage::Stop`]s
/// or every sender is dropped, then restores the terminal. Write errors are
/// logged and the loop keeps going.
pub(crate) async fn run<W: Write>(
    mut renderer: DiffRenderer<W>,
    mut rx: mpsc::UnboundedReceiver<RenderMessage>,
    upstreams: usize,
) -> DiffRenderer<W> {
    debug!("renderer started");
    let mut pending = upstreams;
    while pending > 0 {
        let Some(msg) = rx.recv().await else {
            break;
        };
        let result = match &msg {
            RenderMessage::Diff(diff) => {
                debug!(rows = diff.rows.len(), "render diff");
                renderer.render(diff)
            }
            RenderMessage::Terminal(cmd) => renderer.apply(cmd),
            RenderMessage::Stop => {
                pending -= 1;
                Ok(())
            }
        };
        if let Err(err) = result {
            warn!(%err, "renderer write failed");
        }
    }
    if let Err(err) = renderer.shutdown() {
        warn!(%err, "terminal restore failed");
    }
    debug!("renderer stopped");
    renderer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, Color};
    use crate::grid::Grid;
    use crate::screen::{RowChange, ScreenBuffer};

    fn output(r: DiffRenderer<Vec<u8>>) -> String {
        String::from_utf8(r.into_inner()).unwrap()
    }

    fn row(y: u16, cells: Vec<Cell>) -> ScreenDiff {
        ScreenDiff {
            rows: vec![RowChange { row: y, cells }],
            clear_from: None,
        }
    }

    /// Counts flushes to prove empty diffs are a true no-op.
    #[derive(Default)]
    struct Counting {
        bytes: usize,
        flushes: usize,
    }

    impl Write for Counting {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.bytes += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn empty_diff_writes_nothing() {
        let mut r = DiffRenderer::new(Counting::default());
        r.render(&ScreenDiff::default()).unwrap();
        assert_eq!(r.get_ref().bytes, 0);
        assert_eq!(r.get_ref().flushes, 0);
    }

    #[test]
    fn plain_row_is_positioned_one_indexed() {
        let mut r = DiffRenderer::new(Vec::new());
        r.render(&row(1, vec![Cell::new('a'), Cell::new('b')])).unwrap();
        assert_eq!(output(r), "\x1b[2;1Hab");
    }

    #[test]
    fn style_escapes_only_on_change() {
        let red = Cell::new('x').fg(Color::Red);
        let mut r = DiffRenderer::new(Vec::new());
        r.render(&row(0, vec![red, red, Cell::new('y')])).unwrap();
        assert_eq!(output(r), "\x1b[1;1H\x1b[38;5;9mxx\x1b[39my");
    }

    #[test]
    fn styled_row_end_is_reset() {
        let mut r = DiffRenderer::new(Vec::new());
        r.render(&row(0, vec![Cell::new('a').bold()])).unwrap();
        assert_eq!(output(r), "\x1b[1;1H\x1b[1ma\x1b[0m");
    }

    #[test]
    fn each_row_starts_plain() {
        let mut screen = ScreenBuffer::new();
        let mut g = Grid::blank(1, 2);
        g.set(0, 0, Cell::new('a').underline());
        g.set(0, 1, Cell::new('b').underline());
        let mut r = DiffRenderer::new(Vec::new());
        r.render(&screen.update(g)).unwrap();
        assert_eq!(
            output(r),
            "\x1b[1;1H\x1b[4ma\x1b[0m\x1b[2;1H\x1b[4mb\x1b[0m"
        );
    }

    #[test]
    fn clear_from_erases_below() {
        let mut r = DiffRenderer::new(Vec::new());
        r.render(&ScreenDiff {
            rows: vec![],
            clear_from: Some(3),
        })
        .unwrap();
        assert_eq!(output(r), "\x1b[4;1H\x1b[J");
    }

    #[test]
    fn cursor_is_restored_after_diff() {
        let mut r = DiffRenderer::new(Vec::new());
        r.apply(&TerminalCommand::MoveCursor(Point::new(4, 2))).unwrap();
        r.render(&row(0, vec![Cell::new('z')])).unwrap();
        assert_eq!(output(r), "\x1b[3;5H\x1b[1;1Hz\x1b[3;5H");
    }

    #[test]
    fn protocol_toggles() {
        let mut r = DiffRenderer::new(Vec::new());
        r.apply(&TerminalCommand::EnableBracketedPaste).unwrap();
        r.apply(&TerminalCommand::HideCursor).unwrap();
        r.apply(&TerminalCommand::ShowCursor).unwrap();
        r.apply(&TerminalCommand::DisableBracketedPaste).unwrap();
        assert_eq!(
            output(r),
            "\x1b[?2004h\x1b[?25l\x1b[?25h\x1b[?2004l"
        );
    }

    #[test]
    fn clipboard_uses_osc52() {
        let mut r = DiffRenderer::new(Vec::new());
        r.apply(&TerminalCommand::SetClipboard("hi".into())).unwrap();
        assert_eq!(output(r), "\x1b]52;c;aGk=\x07");
    }

    #[test]
    fn shutdown_restores_what_was_changed() {
        let mut r = DiffRenderer::new(Vec::new());
        r.apply(&TerminalCommand::EnterAltScreen).unwrap();
        r.apply(&TerminalCommand::HideCursor).unwrap();
        assert!(r.in_alt_screen() && r.cursor_hidden());
        r.shutdown().unwrap();
        assert!(!r.in_alt_screen() && !r.cursor_hidden());
        let out = output(r);
        assert!(out.ends_with("\x1b[0m\x1b[?25h\x1b[?1049l"), "{out:?}");
    }

    #[test]
    fn shutdown_leaves_untouched_modes_alone() {
        let mut r = DiffRenderer::new(Vec::new());
        r.shutdown().unwrap();
        assert_eq!(output(r), "\x1b[0m");
    }

    #[tokio::test]
    async fn stage_waits_for_every_upstream() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(RenderMessage::Terminal(TerminalCommand::HideCursor)).unwrap();
        tx.send(RenderMessage::Stop).unwrap();
        tx.send(RenderMessage::Diff(row(0, vec![Cell::new('q')]))).unwrap();
        tx.send(RenderMessage::Stop).unwrap();
        let r = run(DiffRenderer::new(Vec::new()), rx, 2).await;
        let out = output(r);
        assert!(out.contains('q'));
        assert!(out.ends_with("\x1b[?25h"));
    }

    #[tokio::test]
    async fn stage_cleans_up_when_senders_drop() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(RenderMessage::Terminal(TerminalCommand::EnterAltScreen)).unwrap();
        drop(tx);
        let r = run(DiffRenderer::new(Vec::new()), rx, 2).await;
        assert!(!r.in_alt_screen());
    }
}
