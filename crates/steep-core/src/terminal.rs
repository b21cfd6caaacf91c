//! Running a pipeline against the real terminal.

use crate::dispatcher::Dispatcher;
use crate::event_loop::{EventLoop, EventLoopOptions, ProgramError, ShutdownReport};
use crate::geometry::Size;
use crate::input::terminal_input;
use crate::logging;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, LeaveAlternateScreen};
use std::io::{self, stderr, stdout, Stderr, Stdout, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// Output target for the terminal UI.
///
/// By default the UI renders to **stdout**. When stdout is piped (e.g. to
/// capture the program's data output), switch to
/// [`Stderr`](OutputTarget::Stderr) so the UI still reaches the terminal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to stdout (default).
    #[default]
    Stdout,
    /// Write to stderr.
    Stderr,
}

/// Writer that wraps either stdout or stderr.
pub enum Output {
    /// Standard output.
    Stdout(Stdout),
    /// Standard error.
    Stderr(Stderr),
}

impl Output {
    /// Open the given target.
    pub fn new(target: OutputTarget) -> Self {
        match target {
            OutputTarget::Stdout => Output::Stdout(stdout()),
            OutputTarget::Stderr => Output::Stderr(stderr()),
        }
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout(w) => w.write(buf),
            Output::Stderr(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout(w) => w.flush(),
            Output::Stderr(w) => w.flush(),
        }
    }
}

/// Options for [`run`].
///
/// `event_loop.size` is ignored: the real terminal size is used.
#[derive(Debug, Clone)]
pub struct TerminalOptions {
    /// Pipeline options.
    pub event_loop: EventLoopOptions,
    /// Where the UI is drawn (default: stdout).
    pub output: OutputTarget,
    /// Restore the terminal before a panic message is printed (default: true).
    pub catch_panics: bool,
    /// Send `tracing` output to this file.
    pub log_file: Option<PathBuf>,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            event_loop: EventLoopOptions::default(),
            output: OutputTarget::default(),
            catch_panics: true,
            log_file: None,
        }
    }
}

/// Raw mode for as long as this value lives.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Drive `dispatcher` against the real terminal until the pipeline stops
/// (a global key handler returns [`KeyOutcome::Quit`](crate::KeyOutcome::Quit),
/// or the process gets `SIGINT`).
///
/// Raw mode is enabled for the duration. The terminal is restored on every
/// exit path: by the renderer on a normal stop, here if the renderer was
/// abandoned, and by a panic hook if `catch_panics` is set.
pub async fn run(
    dispatcher: Dispatcher,
    options: TerminalOptions,
) -> Result<ShutdownReport, ProgramError> {
    if let Some(path) = &options.log_file {
        logging::log_to_file(path)?;
    }
    if options.catch_panics {
        install_panic_hook(options.event_loop.alt_screen, options.output);
    }

    let (columns, rows) = crossterm::terminal::size()?;
    let raw = RawMode::enable()?;
    let loop_options = EventLoopOptions {
        size: Size::new(columns, rows),
        ..options.event_loop.clone()
    };

    let mut event_loop = EventLoop::new(dispatcher, Output::new(options.output), loop_options);
    event_loop.start()?;
    info!(columns, rows, "terminal session started");

    let input = terminal_input(event_loop.handle());
    let interrupt = {
        let handle = event_loop.handle();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                handle.stop("interrupted");
            }
        })
    };

    let report = event_loop.wait().await;
    input.abort();
    interrupt.abort();

    if !report.as_ref().is_ok_and(ShutdownReport::is_clean) {
        warn!("pipeline did not shut down cleanly, restoring terminal");
        restore_terminal(options.event_loop.alt_screen, options.output);
    }
    drop(raw);
    report
}

fn install_panic_hook(alt_screen: bool, output: OutputTarget) {
    use std::sync::Once;
    static HOOK_INSTALLED: Once = Once::new();
    HOOK_INSTALLED.call_once(|| {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            restore_terminal(alt_screen, output);
            original_hook(info);
        }));
    });
}

/// Best effort: keep going even if individual steps fail.
fn restore_terminal(alt_screen: bool, output: OutputTarget) {
    let mut writer = Output::new(output);
    execute!(writer, DisableBracketedPaste).ok();
    execute!(writer, cursor::Show).ok();
    if alt_screen {
        execute!(writer, LeaveAlternateScreen).ok();
    }
}
