//! A small dashboard: a task list, a spinner, a text input and a status bar.
//!
//! Run with `cargo run -p steep --example dashboard`.
//!
//! Keys: `tab` / `shift+tab` move focus, `f2` toggles the spinner,
//! `ctrl+y` copies a greeting to the clipboard, `escape` or `ctrl+c` quits.
//! Set `STEEP_LOG=debug` to get pipeline logs in `dashboard.log`.

use std::time::Duration;
use steep::ratatui::style::{Color, Style};
use steep::widgets::{Label, SelectList, Spinner, StatusBar, TextInput};
use steep::{
    Constraint, Dispatcher, Event, EventLoopOptions, KeyOutcome, LayoutNode, Size,
    TerminalCommand, TerminalOptions, WidgetManager,
};

fn build() -> Result<Dispatcher, steep::LayoutError> {
    let tasks = ["compile", "test", "package", "publish"]
        .into_iter()
        .map(String::from)
        .collect();

    let layout = LayoutNode::vertical([
        LayoutNode::leaf("header").constraint(Constraint::Length(3)),
        LayoutNode::horizontal([
            LayoutNode::leaf("tasks").constraint(Constraint::Percent(40)),
            LayoutNode::vertical([
                LayoutNode::leaf("spinner").constraint(Constraint::Length(1)),
                LayoutNode::leaf("input"),
            ]),
        ]),
        LayoutNode::leaf("status").constraint(Constraint::Length(1)),
    ]);

    let manager = WidgetManager::new(vec![
        Box::new(Label::new("header", "Build dashboard").with_title("steep")),
        Box::new(SelectList::new("tasks", tasks).with_page_size(2)),
        Box::new(Spinner::new("spinner").with_title("working")),
        Box::new(
            TextInput::new("input")
                .with_prompt("> ")
                .with_placeholder("type a note, enter to submit"),
        ),
        Box::new(
            StatusBar::new("status")
                .left("tab: focus")
                .center("f2: spinner")
                .right("esc: quit")
                .style(Style::default().bg(Color::Blue).fg(Color::White)),
        ),
    ])?
    .with_layout(layout)?;

    let mut spinning = true;
    Ok(Dispatcher::new(manager, Size::new(80, 24))
        .on_key("escape", |_| KeyOutcome::Quit)
        .on_key("ctrl+c", |_| KeyOutcome::Quit)
        .on_key("tab", |_| KeyOutcome::Redirect(Event::command("focus_next")))
        .on_key("shift+tab", |_| {
            KeyOutcome::Redirect(Event::command("focus_prev"))
        })
        .on_key("ctrl+y", |_| {
            KeyOutcome::Terminal(TerminalCommand::SetClipboard("hello from steep".into()))
        })
        .on_key("f2", move |_| {
            spinning = !spinning;
            let action = if spinning { "spinner.start" } else { "spinner.stop" };
            KeyOutcome::Redirect(Event::command(action))
        }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = build()?;
    let options = TerminalOptions {
        event_loop: EventLoopOptions {
            tick_rate: Some(Duration::from_millis(100)),
            ..EventLoopOptions::default()
        },
        log_file: Some("dashboard.log".into()),
        ..TerminalOptions::default()
    };

    let report = steep::run_with(dispatcher, options).await?;
    if !report.is_clean() {
        eprintln!("abandoned stages: {:?}", report.abandoned);
    }
    Ok(())
}
