//! **steep** -- a terminal UI toolkit with a diffing, channel-driven render
//! pipeline.
//!
//! This is the umbrella crate that re-exports everything needed to build a
//! steep application from a single dependency:
//!
//! ```toml
//! [dependencies]
//! steep = "0.1"
//! ```
//!
//! # Re-exports
//!
//! * All public items from [`steep_core`] are available at the crate root
//!   ([`Widget`], [`WidgetManager`], [`LayoutNode`], [`Dispatcher`],
//!   [`EventLoop`], [`run`], [`run_with`], etc.).
//! * The [`widgets`] module re-exports everything from [`steep_widgets`].
//! * [`ratatui`], [`crossterm`], and [`tokio`] are re-exported so downstream
//!   crates do not need to depend on them directly.
//!
//! # Quick start
//!
//! ```no_run
//! use steep::widgets::{Label, TextInput};
//! use steep::{Constraint, Dispatcher, KeyOutcome, LayoutNode, Size, WidgetManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), steep::ProgramError> {
//!     let layout = LayoutNode::vertical(vec![
//!         LayoutNode::leaf("title").constraint(Constraint::Length(1)),
//!         LayoutNode::leaf("name"),
//!     ]);
//!     let manager = WidgetManager::new(vec![
//!         Box::new(Label::new("title", "What is your name?")),
//!         Box::new(TextInput::new("name").with_prompt("> ")),
//!     ])?
//!     .with_layout(layout)?;
//!
//!     let dispatcher = Dispatcher::new(manager, Size::new(80, 24))
//!         .on_key("escape", |_| KeyOutcome::Quit);
//!     steep::run(dispatcher).await?;
//!     Ok(())
//! }
//! ```

pub use steep_core::*;
pub mod widgets {
    pub use steep_widgets::*;
}

// Re-export dependencies for use in demos and downstream crates
pub use crossterm;
pub use ratatui;
pub use tokio;
