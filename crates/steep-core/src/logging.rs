use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `STEEP_LOG=steep_core=debug`.
pub const LOG_ENV: &str = "STEEP_LOG";

/// Route `tracing` output to a file.
///
/// A TUI owns the terminal, so logs cannot go to stdout or stderr. The file
/// is opened in append mode and filtered by [`LOG_ENV`] (default `info`).
///
/// Returns `Ok(false)` when a global subscriber is already installed, in
/// which case nothing changes.
///
/// # Example
///
/// ```no_run
/// steep_core::logging::log_to_file("debug.log").unwrap();
/// tracing::info!("logging to file");
/// ```
pub fn log_to_file(path: impl AsRef<Path>) -> io::Result<bool> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .is_ok();
    Ok(installed)
}
