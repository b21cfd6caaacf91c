//! Ready-made widgets for the **steep** terminal UI toolkit.
//!
//! Every widget here implements [`steep_core::Widget`], so it can be mounted
//! in a [`WidgetManager`](steep_core::WidgetManager) and placed with a
//! layout tree. Drawing is done with [`ratatui`] widgets into a scratch
//! buffer, converted to a [`Grid`](steep_core::Grid) by [`paint`].
//!
//! # Widgets
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`label`] | Static text, optionally bordered |
//! | [`list`] | Scrollable single-selection list |
//! | [`spinner`] | Animated spinner driven by the event loop ticker |
//! | [`status_bar`] | Left / center / right status line |
//! | [`text_input`] | Single-line text input with history |
//!
//! Widgets that can be changed from outside listen for commands named
//! `<identifier>.<action>`, e.g. `status.right` or `spinner.stop`.

pub mod history;
pub mod label;
pub mod list;
mod paint;
pub mod spinner;
pub mod status_bar;
pub mod text_input;

pub use label::Label;
pub use list::SelectList;
pub use paint::paint;
pub use spinner::Spinner;
pub use status_bar::StatusBar;
pub use text_input::{EchoMode, TextInput};
