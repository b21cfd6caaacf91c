//! Rendering and event pipeline for the **steep** terminal UI toolkit.
//!
//! `steep-core` turns keyboard input and widget state changes into minimal
//! ANSI output. Widgets draw into [`Grid`]s, a [`WidgetManager`] stitches
//! them together using a constraint-based [`LayoutNode`] tree, and a
//! [`ScreenBuffer`] diffs each frame against the last so only changed rows
//! are rewritten.
//!
//! # Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Widget`] | The contract every widget implements (receive / render) |
//! | [`LayoutNode`] | Split/leaf tree resolved to per-widget [`Rect`]s |
//! | [`WidgetManager`] | Owns widgets and focus; composes full-screen frames |
//! | [`Dispatcher`] | Routes [`Event`]s, runs global key handlers, recomposes |
//! | [`ScreenBuffer`] | Row-granular frame diffing |
//! | [`DiffRenderer`] | Writes diffs and [`TerminalCommand`]s as ANSI |
//! | [`EventLoop`] | Runs each stage as its own task, connected by channels |
//! | [`TestHarness`](testing::TestHarness) | Headless, synchronous pipeline for tests |
//!
//! # Pipeline
//!
//! 1. **input** -- [`terminal_input`] (or [`byte_input`], or an
//!    [`EventLoopHandle`]) pushes [`Event`]s onto the input channel.
//! 2. **dispatch** -- the [`Dispatcher`] consults global key handlers, then
//!    routes the event to the focused widget or broadcasts it, and composes
//!    a new frame.
//! 3. **diff** -- the screen stage compares the frame with the previous one.
//! 4. **cursor** -- the cursor controller turns the focused widget's cursor
//!    request into move/show/hide commands, only when they change.
//! 5. **render** -- the renderer writes changed rows and commands to the
//!    sink. It is the only stage that touches the terminal.
//!
//! # Quick example
//!
//! ```
//! use steep_core::testing::TestHarness;
//! use steep_core::{Dispatcher, Grid, KeyOutcome, Size, Widget, WidgetEvent, WidgetManager};
//!
//! struct Counter { count: u32 }
//!
//! impl Widget for Counter {
//!     fn identifier(&self) -> &str { "counter" }
//!
//!     fn receive(&mut self, event: &WidgetEvent) {
//!         if event == &WidgetEvent::KeyPress("up".into()) {
//!             self.count += 1;
//!         }
//!     }
//!
//!     fn render(&self, width: u16, height: u16) -> Grid {
//!         let mut grid = Grid::blank(width, height);
//!         grid.put_str(0, 0, &format!("Count: {}", self.count), Default::default());
//!         grid
//!     }
//! }
//!
//! let manager = WidgetManager::new(vec![Box::new(Counter { count: 0 })]).unwrap();
//! let dispatcher = Dispatcher::new(manager, Size::new(10, 1))
//!     .on_key("q", |_| KeyOutcome::Quit);
//!
//! let mut harness = TestHarness::new(dispatcher);
//! harness.press("up").press("up");
//! assert_eq!(harness.screen(), "Count: 2  ");
//! ```

pub mod cell;
pub mod command;
pub mod cursor;
pub mod dispatcher;
pub mod event;
pub mod event_loop;
pub mod geometry;
pub mod grid;
pub mod input;
pub mod layout;
pub mod logging;
pub mod manager;
pub mod renderer;
pub mod screen;
pub mod terminal;
pub mod testing;
pub mod widget;

pub use cell::{Cell, CellStyle, Color};
pub use command::{CopyToClipboard, TerminalCommand};
pub use cursor::{ControlMessage, CursorController};
pub use dispatcher::{Dispatch, Dispatcher, KeyOutcome};
pub use event::{key_name, Event, WidgetEvent};
pub use event_loop::{
    EventLoop, EventLoopHandle, EventLoopOptions, ProgramError, ShutdownReport, Stage,
};
pub use geometry::{GeometryError, Margin, Point, Rect, Size};
pub use grid::Grid;
pub use input::{byte_input, terminal_input, InputParser};
pub use layout::{resolve, Constraint, Direction, LayoutError, LayoutNode};
pub use logging::log_to_file;
pub use manager::{Frame, WidgetManager};
pub use renderer::{DiffRenderer, RenderMessage};
pub use screen::{RowChange, ScreenBuffer, ScreenDiff, ScreenMessage};
pub use terminal::{Output, OutputTarget, TerminalOptions};
pub use widget::Widget;

/// Run `dispatcher` in the terminal with default options until it quits.
pub async fn run(dispatcher: Dispatcher) -> Result<ShutdownReport, ProgramError> {
    terminal::run(dispatcher, TerminalOptions::default()).await
}

/// Run with custom options.
pub async fn run_with(
    dispatcher: Dispatcher,
    options: TerminalOptions,
) -> Result<ShutdownReport, ProgramError> {
    terminal::run(dispatcher, options).await
}
