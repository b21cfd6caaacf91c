//! Input providers: turn terminal bytes or crossterm events into pipeline
//! [`Event`]s and push them through an [`EventLoopHandle`].

use crate::event::Event;
use crate::event_loop::EventLoopHandle;
use crossterm::event::{Event as CtEvent, EventStream, KeyCode, KeyEvent, KeyModifiers};
use futures::StreamExt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

const PASTE_START: &[u8] = b"\x1b[200~";
const PASTE_END: &[u8] = b"\x1b[201~";
/// Pastes are emitted early once they reach this many bytes.
const MAX_PASTE: usize = 1 << 20;

/// How long a lone `ESC` may wait for the rest of an escape sequence before
/// it is taken to be the escape key.
pub const ESCAPE_TIMEOUT: Duration = Duration::from_millis(10);

enum Step {
    /// Consumed this many bytes, possibly producing an event.
    Consumed(usize, Option<Event>),
    /// Need more bytes.
    Incomplete,
}

/// Incremental decoder for raw terminal input bytes.
///
/// Handles printable UTF-8, control keys, CSI cursor and editing keys
/// (with xterm modifier parameters), SS3 `F1`–`F4`, and bracketed paste.
/// Unrecognized or malformed sequences are dropped without producing an
/// event.
///
/// Bytes may arrive split at any point; partial sequences are buffered until
/// the next [`feed`](InputParser::feed). A trailing lone `ESC` stays pending
/// until [`flush`](InputParser::flush) is called after [`ESCAPE_TIMEOUT`].
///
/// ```
/// use steep_core::{Event, InputParser};
///
/// let mut parser = InputParser::new();
/// let events = parser.feed(b"a\x1b[A\x03");
/// assert_eq!(events[1], Event::key("up"));
/// assert_eq!(events[2], Event::key("ctrl+c"));
/// ```
#[derive(Debug, Default)]
pub struct InputParser {
    buf: Vec<u8>,
    paste: Option<Vec<u8>>,
}

impl InputParser {
    /// An empty parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as many events as `data` (plus any buffered bytes) allows.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Event> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();
        while !self.buf.is_empty() {
            let step = if self.paste.is_some() {
                self.step_paste()
            } else {
                self.step()
            };
            match step {
                Step::Consumed(n, event) => {
                    self.buf.drain(..n);
                    events.extend(event);
                }
                Step::Incomplete => break,
            }
        }
        events
    }

    /// Whether bytes are buffered waiting for the rest of a sequence, or a
    /// paste is still open.
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty() || self.paste.is_some()
    }

    /// Resolve buffered bytes after the escape timeout: a lone `ESC` becomes
    /// the escape key, anything else incomplete is dropped. A paste whose end
    /// marker never arrived is closed and emitted with what it has so far.
    pub fn flush(&mut self) -> Vec<Event> {
        if let Some(mut content) = self.paste.take() {
            content.append(&mut self.buf);
            debug!(len = content.len(), "closing unterminated paste");
            return vec![paste_event(&content)];
        }
        let pending = std::mem::take(&mut self.buf);
        match pending.as_slice() {
            [] => Vec::new(),
            [0x1b] => vec![Event::key("escape")],
            [0x1b, rest @ ..] => {
                debug!(bytes = ?rest, "dropping incomplete escape sequence");
                Vec::new()
            }
            other => {
                debug!(bytes = ?other, "dropping incomplete input");
                Vec::new()
            }
        }
    }

    fn step(&mut self) -> Step {
        let first = self.buf[0];
        match first {
            0x1b => self.escape(),
            0x00 => consumed(1, key(KeyCode::Char(' '), KeyModifiers::CONTROL)),
            0x08 | 0x7f => consumed(1, key(KeyCode::Backspace, KeyModifiers::NONE)),
            b'\t' => consumed(1, key(KeyCode::Tab, KeyModifiers::NONE)),
            b'\r' | b'\n' => consumed(1, key(KeyCode::Enter, KeyModifiers::NONE)),
            0x01..=0x1a => {
                let c = (first - 1 + b'a') as char;
                consumed(1, key(KeyCode::Char(c), KeyModifiers::CONTROL))
            }
            0x20..=0x7e => consumed(1, key(KeyCode::Char(first as char), KeyModifiers::NONE)),
            0x80..=0xff => self.utf8(),
            _ => malformed(1),
        }
    }

    fn escape(&mut self) -> Step {
        let Some(&second) = self.buf.get(1) else {
            return Step::Incomplete;
        };
        match second {
            b'[' => self.csi(),
            b'O' => self.ss3(),
            0x1b => consumed(1, key(KeyCode::Esc, KeyModifiers::NONE)),
            0x20..=0x7e => consumed(2, key(KeyCode::Char(second as char), KeyModifiers::ALT)),
            _ => consumed(1, key(KeyCode::Esc, KeyModifiers::NONE)),
        }
    }

    fn csi(&mut self) -> Step {
        let mut end = 2;
        loop {
            let Some(&b) = self.buf.get(end) else {
                return Step::Incomplete;
            };
            match b {
                0x40..=0x7e => break,
                0x20..=0x3f => end += 1,
                _ => return malformed(end),
            }
        }

        let len = end + 1;
        if &self.buf[..len] == PASTE_START {
            self.paste = Some(Vec::new());
            return Step::Consumed(len, None);
        }

        let params: Vec<Option<u16>> = std::str::from_utf8(&self.buf[2..end])
            .unwrap_or_default()
            .split(';')
            .map(|p| p.parse().ok())
            .collect();
        let modifiers = params
            .get(1)
            .copied()
            .flatten()
            .map(xterm_modifiers)
            .unwrap_or(KeyModifiers::NONE);

        let code = match self.buf[end] {
            b'A' => KeyCode::Up,
            b'B' => KeyCode::Down,
            b'C' => KeyCode::Right,
            b'D' => KeyCode::Left,
            b'H' => KeyCode::Home,
            b'F' => KeyCode::End,
            b'P' => KeyCode::F(1),
            b'Q' => KeyCode::F(2),
            b'R' => KeyCode::F(3),
            b'S' => KeyCode::F(4),
            b'Z' => return consumed(len, key(KeyCode::BackTab, KeyModifiers::SHIFT)),
            b'~' => match params.first().copied().flatten() {
                Some(1 | 7) => KeyCode::Home,
                Some(2) => KeyCode::Insert,
                Some(3) => KeyCode::Delete,
                Some(4 | 8) => KeyCode::End,
                Some(5) => KeyCode::PageUp,
                Some(6) => KeyCode::PageDown,
                Some(n @ 11..=15) => KeyCode::F((n - 10) as u8),
                Some(n @ 17..=21) => KeyCode::F((n - 11) as u8),
                Some(n @ 23..=24) => KeyCode::F((n - 12) as u8),
                _ => return malformed(len),
            },
            _ => return malformed(len),
        };
        consumed(len, key(code, modifiers))
    }

    fn ss3(&mut self) -> Step {
        let Some(&b) = self.buf.get(2) else {
            return Step::Incomplete;
        };
        let code = match b {
            b'P' => KeyCode::F(1),
            b'Q' => KeyCode::F(2),
            b'R' => KeyCode::F(3),
            b'S' => KeyCode::F(4),
            b'A' => KeyCode::Up,
            b'B' => KeyCode::Down,
            b'C' => KeyCode::Right,
            b'D' => KeyCode::Left,
            b'H' => KeyCode::Home,
            b'F' => KeyCode::End,
            _ => return malformed(3),
        };
        consumed(3, key(code, KeyModifiers::NONE))
    }

    fn utf8(&mut self) -> Step {
        let len = match self.buf[0] {
            0xc2..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf4 => 4,
            _ => return malformed(1),
        };
        if self.buf.len() < len {
            return Step::Incomplete;
        }
        match std::str::from_utf8(&self.buf[..len]) {
            Ok(s) => match s.chars().next() {
                Some(c) => Step::Consumed(len, Some(Event::input(c))),
                None => malformed(len),
            },
            Err(_) => malformed(1),
        }
    }

    fn step_paste(&mut self) -> Step {
        let Some(content) = self.paste.as_mut() else {
            return Step::Incomplete;
        };
        if let Some(at) = find(&self.buf, PASTE_END) {
            content.extend_from_slice(&self.buf[..at]);
            let event = paste_event(content);
            self.paste = None;
            return Step::Consumed(at + PASTE_END.len(), Some(event));
        }
        // Keep a tail that could be the start of the end marker.
        let keep = PASTE_END.len() - 1;
        if self.buf.len() <= keep {
            return Step::Incomplete;
        }
        let take = self.buf.len() - keep;
        content.extend_from_slice(&self.buf[..take]);
        self.buf.drain(..take);
        if content.len() >= MAX_PASTE {
            warn!(len = content.len(), "paste too large, closing it early");
            let event = paste_event(content);
            self.paste = None;
            return Step::Consumed(0, Some(event));
        }
        Step::Incomplete
    }
}

fn paste_event(content: &[u8]) -> Event {
    Event::Paste {
        content: String::from_utf8_lossy(content).into_owned(),
    }
}

fn key(code: KeyCode, modifiers: KeyModifiers) -> Option<Event> {
    Event::from_terminal(CtEvent::Key(KeyEvent::new(code, modifiers)))
}

fn consumed(n: usize, event: Option<Event>) -> Step {
    Step::Consumed(n, event)
}

fn malformed(n: usize) -> Step {
    trace!(len = n, "dropping unrecognized input sequence");
    Step::Consumed(n, None)
}

/// xterm encodes modifiers as `1 + bits` with shift=1, alt=2, ctrl=4.
fn xterm_modifiers(param: u16) -> KeyModifiers {
    let bits = param.saturating_sub(1);
    let mut m = KeyModifiers::NONE;
    if bits & 1 != 0 {
        m |= KeyModifiers::SHIFT;
    }
    if bits & 2 != 0 {
        m |= KeyModifiers::ALT;
    }
    if bits & 4 != 0 {
        m |= KeyModifiers::CONTROL;
    }
    m
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Spawn a task that reads crossterm terminal events and feeds them to
/// `handle` until the event loop stops accepting events.
///
/// crossterm opens `/dev/tty` itself when stdin is not a terminal, so this
/// works with piped stdin too.
pub fn terminal_input(handle: EventLoopHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = EventStream::new();
        while let Some(result) = events.next().await {
            let event = match result {
                Ok(event) => event,
                Err(err) => {
                    debug!(%err, "terminal read failed");
                    continue;
                }
            };
            let Some(event) = Event::from_terminal(event) else {
                continue;
            };
            if !handle.send(event) {
                break;
            }
        }
        debug!("terminal input stopped");
    })
}

/// Spawn a task that decodes raw bytes from `reader` with an
/// [`InputParser`] and feeds the events to `handle`.
///
/// Useful for sources crossterm does not own, such as a socket or a pty.
/// Stops at end of input, on a read error, or when the event loop stops.
pub fn byte_input<R>(mut reader: R, handle: EventLoopHandle) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut parser = InputParser::new();
        let mut chunk = [0u8; 1024];
        loop {
            let read = if parser.has_pending() {
                match tokio::time::timeout(ESCAPE_TIMEOUT, reader.read(&mut chunk)).await {
                    Ok(read) => read,
                    Err(_) => {
                        if !send_all(&handle, parser.flush()) {
                            break;
                        }
                        continue;
                    }
                }
            } else {
                reader.read(&mut chunk).await
            };
            let n = match read {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) => {
                    debug!(%err, "input read failed");
                    break;
                }
            };
            if !send_all(&handle, parser.feed(&chunk[..n])) {
                break;
            }
        }
        send_all(&handle, parser.flush());
        debug!("byte input stopped");
    })
}

fn send_all(handle: &EventLoopHandle, events: Vec<Event>) -> bool {
    events.into_iter().all(|event| handle.send(event))
}
