//! Cursor controller stage: turns per-frame cursor requests into the
//! minimal set of terminal commands.

use crate::command::TerminalCommand;
use crate::geometry::Point;
use crate::renderer::RenderMessage;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Messages consumed by the cursor controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Where the focused widget wants the cursor after the latest frame.
    /// `None` means no cursor is wanted.
    Cursor(Option<Point>),
    /// A terminal command to forward to the renderer.
    Terminal(TerminalCommand),
    /// The dispatcher has stopped.
    Stop,
}

/// Remembers the last cursor position and visibility sent to the terminal
/// and emits commands only when they change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorController {
    position: Option<Point>,
    visible: bool,
    auto_hide: bool,
}

impl CursorController {
    /// A controller for a terminal whose cursor starts hidden (`hidden`) or
    /// visible.
    ///
    /// When the cursor starts hidden it is shown only while a widget asks
    /// for it and hidden again afterwards. A visible cursor is only ever
    /// moved.
    pub fn new(hidden: bool) -> Self {
        Self {
            position: None,
            visible: !hidden,
            auto_hide: hidden,
        }
    }

    /// The last position sent.
    pub fn position(&self) -> Option<Point> {
        self.position
    }

    /// Whether the cursor is currently shown.
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// The commands needed to honor `msg`, updating tracked state.
    pub fn update(&mut self, msg: ControlMessage) -> Vec<TerminalCommand> {
        let mut out = Vec::new();
        match msg {
            ControlMessage::Cursor(Some(p)) => {
                if self.position != Some(p) {
                    self.position = Some(p);
                    out.push(TerminalCommand::MoveCursor(p));
                }
                if !self.visible {
                    self.visible = true;
                    out.push(TerminalCommand::ShowCursor);
                }
            }
            ControlMessage::Cursor(None) => {
                if self.visible && self.auto_hide {
                    self.visible = false;
                    out.push(TerminalCommand::HideCursor);
                }
            }
            ControlMessage::Terminal(cmd) => {
                match &cmd {
                    TerminalCommand::MoveCursor(p) => self.position = Some(*p),
                    TerminalCommand::ShowCursor => self.visible = true,
                    TerminalCommand::HideCursor => self.visible = false,
                    _ => {}
                }
                out.push(cmd);
            }
            ControlMessage::Stop => {}
        }
        out
    }
}

/// Cursor controller stage loop. Forwards to the renderer until
/// [`ControlMessage::Stop`] or until the dispatcher goes away.
pub(crate) async fn run(
    mut controller: CursorController,
    mut rx: mpsc::UnboundedReceiver<ControlMessage>,
    renderer: mpsc::UnboundedSender<RenderMessage>,
) -> CursorController {
    debug!("cursor controller started");
    while let Some(msg) = rx.recv().await {
        if msg == ControlMessage::Stop {
            break;
        }
        for cmd in controller.update(msg) {
            trace!(?cmd, "cursor");
            if renderer.send(RenderMessage::Terminal(cmd)).is_err() {
                debug!("renderer gone");
                return controller;
            }
        }
    }
    let _ = renderer.send(RenderMessage::Stop);
    debug!("cursor controller stopped");
    controller
}
