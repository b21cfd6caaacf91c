use crate::command::TerminalCommand;
use crate::cursor::{self, CursorController};
use crate::dispatcher::{self, Dispatcher};
use crate::event::Event;
use crate::geometry::Size;
use crate::layout::LayoutError;
use crate::renderer::{self, DiffRenderer, RenderMessage};
use crate::screen::{self, ScreenBuffer};
use futures::StreamExt;
use std::fmt;
use std::io::Write;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info, warn};

/// Errors that can occur while setting up or driving an [`EventLoop`].
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// An I/O error from terminal setup, rendering, or teardown.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The widget tree is misconfigured.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// [`EventLoop::start`] was called twice.
    #[error("event loop already started")]
    AlreadyStarted,
    /// The event loop was stopped or waited on before it was started.
    #[error("event loop not started")]
    NotStarted,
}

/// Configuration options for an [`EventLoop`].
///
/// Use struct update syntax to override only what you need:
///
/// ```
/// use std::time::Duration;
/// use steep_core::EventLoopOptions;
///
/// let opts = EventLoopOptions {
///     tick_rate: Some(Duration::from_millis(100)),
///     alt_screen: false,
///     ..EventLoopOptions::default()
/// };
/// assert!(opts.bracketed_paste);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLoopOptions {
    /// Terminal dimensions at start (default: 80×24). The dispatcher is
    /// resized to this before the first frame.
    pub size: Size,
    /// Period of the animation ticker. `None` (default) disables it.
    pub tick_rate: Option<Duration>,
    /// How long [`EventLoop::stop`] waits for stages to finish (default: 2s).
    pub shutdown_timeout: Duration,
    /// Enter the alternate screen at start (default: true).
    pub alt_screen: bool,
    /// Enable bracketed paste at start (default: true).
    pub bracketed_paste: bool,
    /// Hide the cursor unless a focused widget asks for it (default: true).
    pub hide_cursor: bool,
}

impl Default for EventLoopOptions {
    fn default() -> Self {
        Self {
            size: Size::new(80, 24),
            tick_rate: None,
            shutdown_timeout: Duration::from_secs(2),
            alt_screen: true,
            bracketed_paste: true,
            hide_cursor: true,
        }
    }
}

/// A pipeline stage, as named in a [`ShutdownReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Routes events and recomposes.
    Dispatcher,
    /// Diffs frames.
    Screen,
    /// Tracks the cursor.
    Cursor,
    /// Writes to the sink.
    Renderer,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Dispatcher => "dispatcher",
            Stage::Screen => "screen",
            Stage::Cursor => "cursor",
            Stage::Renderer => "renderer",
        })
    }
}

/// What happened during shutdown.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Stages that finished before the deadline, in join order.
    pub acknowledged: Vec<Stage>,
    /// Stages that missed the deadline or panicked. They are detached, not
    /// killed.
    pub abandoned: Vec<Stage>,
    /// The dispatcher with its final widget state, if it finished in time.
    pub dispatcher: Option<Dispatcher>,
}

impl ShutdownReport {
    /// Whether every stage finished in time.
    pub fn is_clean(&self) -> bool {
        self.abandoned.is_empty()
    }
}

/// A cloneable handle for feeding a running [`EventLoop`] from other tasks
/// (input readers, timers, application code).
#[derive(Debug, Clone)]
pub struct EventLoopHandle {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventLoopHandle {
    /// Enqueue an event. Returns `false` once the dispatcher has stopped.
    pub fn send(&self, event: Event) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Ask the pipeline to stop. Events already queued are handled first.
    pub fn stop(&self, reason: impl Into<String>) -> bool {
        self.send(Event::stop(reason))
    }

    /// Whether the dispatcher has stopped accepting events.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

struct Running {
    dispatcher: JoinHandle<Dispatcher>,
    screen: JoinHandle<ScreenBuffer>,
    cursor: JoinHandle<CursorController>,
    renderer: JoinHandle<()>,
    ticker: Option<JoinHandle<()>>,
    finished: watch::Receiver<bool>,
}

/// The running pipeline: one task per stage, connected by channels.
///
/// ```text
/// input ──▶ dispatcher ──frames──▶ screen ──diffs──────▶ renderer ──▶ sink
///                     └──cursor──▶ cursor ──commands──▶┘
/// ```
///
/// Only the renderer writes to the sink. Every channel is FIFO, and the
/// dispatcher finishes one event's recomposition before taking the next.
///
/// # Example
///
/// ```no_run
/// use steep_core::{Dispatcher, Event, EventLoop, EventLoopOptions, WidgetManager};
///
/// # async fn demo() -> Result<(), steep_core::ProgramError> {
/// let manager = WidgetManager::new(vec![])?;
/// let dispatcher = Dispatcher::new(manager, Default::default());
/// let mut event_loop = EventLoop::new(dispatcher, std::io::stdout(), EventLoopOptions::default());
/// event_loop.start()?;
/// event_loop.handle().send(Event::render("hello"));
/// let report = event_loop.stop().await?;
/// assert!(report.is_clean());
/// # Ok(())
/// # }
/// ```
pub struct EventLoop<W: Write + Send + 'static> {
    options: EventLoopOptions,
    input_tx: mpsc::UnboundedSender<Event>,
    input_rx: Option<mpsc::UnboundedReceiver<Event>>,
    dispatcher: Option<Dispatcher>,
    sink: Option<W>,
    running: Option<Running>,
}

impl<W: Write + Send + 'static> EventLoop<W> {
    /// Build a stopped event loop. Nothing is spawned or written until
    /// [`start`](EventLoop::start).
    pub fn new(dispatcher: Dispatcher, sink: W, options: EventLoopOptions) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        Self {
            options,
            input_tx,
            input_rx: Some(input_rx),
            dispatcher: Some(dispatcher),
            sink: Some(sink),
            running: None,
        }
    }

    /// The options this loop was built with.
    pub fn options(&self) -> &EventLoopOptions {
        &self.options
    }

    /// A handle for sending events. May be taken before or after start.
    pub fn handle(&self) -> EventLoopHandle {
        EventLoopHandle {
            tx: self.input_tx.clone(),
        }
    }

    /// Whether the stages are running.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Spawn every stage, switch on the configured terminal modes and
    /// request the first frame.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&mut self) -> Result<(), ProgramError> {
        let (Some(mut dispatcher), Some(input_rx), Some(sink)) = (
            self.dispatcher.take(),
            self.input_rx.take(),
            self.sink.take(),
        ) else {
            return Err(ProgramError::AlreadyStarted);
        };
        dispatcher.resize(self.options.size);

        let (render_tx, render_rx) = mpsc::unbounded_channel();
        let (screen_tx, screen_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (finished_tx, finished) = watch::channel(false);

        for cmd in self.setup_commands() {
            let _ = render_tx.send(RenderMessage::Terminal(cmd));
        }

        let renderer = tokio::spawn(async move {
            renderer::run(DiffRenderer::new(sink), render_rx, 2).await;
            let _ = finished_tx.send(true);
        });
        let cursor = tokio::spawn(cursor::run(
            CursorController::new(self.options.hide_cursor),
            control_rx,
            render_tx.clone(),
        ));
        let screen = tokio::spawn(screen::run(ScreenBuffer::new(), screen_rx, render_tx));
        let dispatcher = tokio::spawn(dispatcher::run(dispatcher, input_rx, screen_tx, control_tx));
        let ticker = self
            .options
            .tick_rate
            .map(|period| tokio::spawn(tick(period, self.input_tx.clone())));

        let _ = self.input_tx.send(Event::render("start"));
        info!(size = ?self.options.size, "event loop started");

        self.running = Some(Running {
            dispatcher,
            screen,
            cursor,
            renderer,
            ticker,
            finished,
        });
        Ok(())
    }

    /// Send [`Event::Stop`] and wait, up to
    /// [`shutdown_timeout`](EventLoopOptions::shutdown_timeout) in total, for
    /// every stage to finish.
    ///
    /// Stages still running at the deadline are abandoned and listed in the
    /// report; this is logged but not an error.
    pub async fn stop(&mut self) -> Result<ShutdownReport, ProgramError> {
        let running = self.running.take().ok_or(ProgramError::NotStarted)?;
        let _ = self.input_tx.send(Event::stop("shutdown requested"));
        Ok(running.join(self.options.shutdown_timeout).await)
    }

    /// Wait until the pipeline stops by itself (e.g. a global key handler
    /// returned [`KeyOutcome::Quit`](crate::dispatcher::KeyOutcome::Quit) or a
    /// handle called [`stop`](EventLoopHandle::stop)), then collect the
    /// stages as [`stop`](EventLoop::stop) does.
    pub async fn wait(&mut self) -> Result<ShutdownReport, ProgramError> {
        let running = self.running.as_mut().ok_or(ProgramError::NotStarted)?;
        // An error means the renderer task is gone, which is also "finished".
        let _ = running.finished.wait_for(|done| *done).await;
        self.stop().await
    }

    fn setup_commands(&self) -> Vec<TerminalCommand> {
        let mut cmds = Vec::new();
        if self.options.alt_screen {
            cmds.push(TerminalCommand::EnterAltScreen);
        }
        if self.options.bracketed_paste {
            cmds.push(TerminalCommand::EnableBracketedPaste);
        }
        if self.options.hide_cursor {
            cmds.push(TerminalCommand::HideCursor);
        }
        cmds
    }
}

impl Running {
    async fn join(self, timeout: Duration) -> ShutdownReport {
        if let Some(ticker) = self.ticker {
            ticker.abort();
        }
        let deadline = Instant::now() + timeout;
        let mut report = ShutdownReport::default();
        report.dispatcher = settle(Stage::Dispatcher, self.dispatcher, deadline, &mut report).await;
        settle(Stage::Screen, self.screen, deadline, &mut report).await;
        settle(Stage::Cursor, self.cursor, deadline, &mut report).await;
        settle(Stage::Renderer, self.renderer, deadline, &mut report).await;
        if report.is_clean() {
            info!("event loop stopped");
        }
        report
    }
}

async fn settle<T>(
    stage: Stage,
    handle: JoinHandle<T>,
    deadline: Instant,
    report: &mut ShutdownReport,
) -> Option<T> {
    match tokio::time::timeout_at(deadline, handle).await {
        Ok(Ok(value)) => {
            report.acknowledged.push(stage);
            Some(value)
        }
        Ok(Err(err)) => {
            warn!(%stage, %err, "stage failed during shutdown");
            report.abandoned.push(stage);
            None
        }
        Err(_) => {
            warn!(%stage, "stage did not stop in time, abandoning");
            report.abandoned.push(stage);
            None
        }
    }
}

async fn tick(period: Duration, tx: mpsc::UnboundedSender<Event>) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = IntervalStream::new(interval);
    while ticks.next().await.is_some() {
        if tx.send(Event::render("tick")).is_err() {
            break;
        }
    }
    debug!("ticker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::KeyOutcome;
    use crate::event::WidgetEvent;
    use crate::geometry::Point;
    use crate::grid::Grid;
    use crate::manager::WidgetManager;
    use crate::testing::SharedBuffer;
    use crate::widget::Widget;

    /// Types characters into a line, counts ticks, and can be told to block.
    struct Line {
        text: String,
        ticks: usize,
    }

    impl Widget for Line {
        fn identifier(&self) -> &str {
            "line"
        }

        fn receive(&mut self, event: &WidgetEvent) {
            match event {
                WidgetEvent::Input(c) => self.text.push(*c),
                WidgetEvent::RenderRequest(reason) if reason == "tick" => self.ticks += 1,
                WidgetEvent::Command { name, .. } if name == "block" => {
                    std::thread::sleep(Duration::from_millis(400))
                }
                _ => {}
            }
        }

        fn render(&self, width: u16, height: u16) -> Grid {
            let mut g = Grid::blank(width, height);
            g.put_str(0, 0, &self.text, Default::default());
            if self.ticks > 0 {
                g.put_str(0, 1, &self.ticks.to_string(), Default::default());
            }
            g
        }

        fn cursor(&self, _width: u16, _height: u16) -> Option<Point> {
            Some(Point::new(self.text.chars().count() as u16, 0))
        }
    }

    fn dispatcher() -> Dispatcher {
        let manager = WidgetManager::new(vec![Box::new(Line {
            text: String::new(),
            ticks: 0,
        })])
        .unwrap();
        Dispatcher::new(manager, Size::default()).on_key("ctrl+c", |_| KeyOutcome::Quit)
    }

    fn options() -> EventLoopOptions {
        EventLoopOptions {
            size: Size::new(6, 2),
            ..EventLoopOptions::default()
        }
    }

    #[tokio::test]
    async fn renders_input_and_restores_terminal() {
        let out = SharedBuffer::new();
        let mut el = EventLoop::new(dispatcher(), out.clone(), options());
        el.start().unwrap();
        let handle = el.handle();
        handle.send(Event::input('h'));
        handle.send(Event::input('i'));
        let report = el.stop().await.unwrap();

        assert!(report.is_clean());
        assert_eq!(report.acknowledged.len(), 4);
        let text = out.contents();
        assert!(text.starts_with("\x1b[?1049h\x1b[?2004h\x1b[?25l"), "{text:?}");
        assert!(text.contains("hi    "));
        // Cursor follows the typed text: column 2, row 0.
        assert!(text.contains("\x1b[1;3H"));
        assert!(text.ends_with("\x1b[?2004l\x1b[?1049l"), "{text:?}");
    }

    #[tokio::test]
    async fn stop_hands_back_final_state() {
        let mut el = EventLoop::new(dispatcher(), SharedBuffer::new(), options());
        el.start().unwrap();
        el.handle().send(Event::input('z'));
        let report = el.stop().await.unwrap();
        let d = report.dispatcher.unwrap();
        assert_eq!(d.size(), Size::new(6, 2));
        assert!(d.recompose().grid.to_text().starts_with('z'));
    }

    #[tokio::test]
    async fn wait_returns_after_quit_key() {
        let mut el = EventLoop::new(dispatcher(), SharedBuffer::new(), options());
        el.start().unwrap();
        el.handle().send(Event::key("ctrl+c"));
        let report = el.wait().await.unwrap();
        assert!(report.is_clean());
        assert!(report.dispatcher.is_some());
        assert!(el.handle().is_closed());
    }

    #[tokio::test]
    async fn start_twice_is_an_error() {
        let mut el = EventLoop::new(dispatcher(), SharedBuffer::new(), options());
        el.start().unwrap();
        assert!(matches!(el.start(), Err(ProgramError::AlreadyStarted)));
        el.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_before_start_is_an_error() {
        let mut el = EventLoop::new(dispatcher(), SharedBuffer::new(), options());
        assert!(matches!(el.stop().await, Err(ProgramError::NotStarted)));
    }

    #[tokio::test]
    async fn optional_modes_are_skipped() {
        let out = SharedBuffer::new();
        let opts = EventLoopOptions {
            alt_screen: false,
            bracketed_paste: false,
            hide_cursor: false,
            ..options()
        };
        let mut el = EventLoop::new(dispatcher(), out.clone(), opts);
        el.start().unwrap();
        el.stop().await.unwrap();
        let text = out.contents();
        assert!(!text.contains("\x1b[?1049"));
        assert!(!text.contains("\x1b[?2004"));
        assert!(!text.contains("\x1b[?25"));
    }

    #[tokio::test]
    async fn ticker_injects_render_requests() {
        let mut el = EventLoop::new(
            dispatcher(),
            SharedBuffer::new(),
            EventLoopOptions {
                tick_rate: Some(Duration::from_millis(10)),
                ..options()
            },
        );
        el.start().unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        let report = el.stop().await.unwrap();
        let screen = report.dispatcher.unwrap().recompose().grid.to_text();
        let ticks: usize = screen.lines().nth(1).unwrap().trim().parse().unwrap();
        assert!(ticks >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slow_stage_is_abandoned_after_timeout() {
        let mut el = EventLoop::new(
            dispatcher(),
            SharedBuffer::new(),
            EventLoopOptions {
                shutdown_timeout: Duration::from_millis(50),
                ..options()
            },
        );
        el.start().unwrap();
        el.handle().send(Event::command("block"));
        let report = el.stop().await.unwrap();
        assert!(!report.is_clean());
        assert!(report.abandoned.contains(&Stage::Dispatcher));
        assert!(report.dispatcher.is_none());
    }
}
