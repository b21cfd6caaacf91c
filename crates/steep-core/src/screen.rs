//! Row-granular frame diffing.

use crate::cell::Cell;
use crate::command::TerminalCommand;
use crate::grid::Grid;
use crate::renderer::RenderMessage;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// One changed row: its index and its complete new content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowChange {
    /// Row index, 0-indexed.
    pub row: u16,
    /// The full row as it should now appear.
    pub cells: Vec<Cell>,
}

/// The rows that changed between two consecutive frames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenDiff {
    /// Changed rows in ascending row order.
    pub rows: Vec<RowChange>,
    /// Set when the new frame is shorter than the previous one: every line
    /// from this row down is stale and must be erased.
    pub clear_from: Option<u16>,
}

impl ScreenDiff {
    /// Whether applying this diff would change nothing on screen.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.clear_from.is_none()
    }

    /// Indices of the changed rows.
    pub fn row_indices(&self) -> Vec<u16> {
        self.rows.iter().map(|r| r.row).collect()
    }
}

/// Holds the last rendered frame and diffs each new frame against it.
///
/// The stored frame is owned exclusively by the buffer; callers only ever
/// see the [`ScreenDiff`].
#[derive(Debug, Default)]
pub struct ScreenBuffer {
    previous: Option<Grid>,
}

impl ScreenBuffer {
    /// An empty buffer: the first update reports every row as changed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `next` against the stored frame, then store `next`.
    ///
    /// A row is reported when its cell sequence differs from the stored row
    /// in any cell or in length, or when the stored frame has no such row.
    /// Identical rows are omitted.
    pub fn update(&mut self, next: Grid) -> ScreenDiff {
        let prev_rows: &[Vec<Cell>] = match &self.previous {
            Some(grid) => grid.rows(),
            None => &[],
        };

        let rows = next
            .rows()
            .iter()
            .enumerate()
            .filter(|(y, row)| prev_rows.get(*y) != Some(*row))
            .map(|(y, row)| RowChange {
                row: y as u16,
                cells: row.clone(),
            })
            .collect();

        let clear_from = (prev_rows.len() > next.rows().len()).then_some(next.height());

        self.previous = Some(next);
        ScreenDiff { rows, clear_from }
    }

    /// Forget the stored frame so the next update redraws everything.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// The stored frame, if any.
    pub fn previous(&self) -> Option<&Grid> {
        self.previous.as_ref()
    }
}

/// Messages consumed by the screen stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenMessage {
    /// A newly composed frame.
    Frame(Grid),
    /// The terminal contents are no longer trustworthy (e.g. after a
    /// resize): clear it and redraw the next frame in full.
    Invalidate,
    /// The dispatcher has stopped.
    Stop,
}

/// Screen stage loop: diffs every frame and forwards the diff, empty or
/// not, to the renderer.
pub(crate) async fn run(
    mut screen: ScreenBuffer,
    mut rx: mpsc::UnboundedReceiver<ScreenMessage>,
    renderer: mpsc::UnboundedSender<RenderMessage>,
) -> ScreenBuffer {
    debug!("screen stage started");
    while let Some(msg) = rx.recv().await {
        let out = match msg {
            ScreenMessage::Frame(grid) => {
                let diff = screen.update(grid);
                trace!(rows = diff.rows.len(), "diff");
                RenderMessage::Diff(diff)
            }
            ScreenMessage::Invalidate => {
                screen.invalidate();
                RenderMessage::Terminal(TerminalCommand::ClearScreen)
            }
            ScreenMessage::Stop => break,
        };
        if renderer.send(out).is_err() {
            debug!("renderer gone");
            return screen;
        }
    }
    let _ = renderer.send(RenderMessage::Stop);
    debug!("screen stage stopped");
    screen
}
