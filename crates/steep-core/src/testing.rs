use crate::cursor::{ControlMessage, CursorController};
use crate::dispatcher::{Dispatch, Dispatcher};
use crate::event::Event;
use crate::geometry::Point;
use crate::manager::Frame;
use crate::renderer::DiffRenderer;
use crate::screen::{ScreenBuffer, ScreenDiff};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A cloneable in-memory sink. Every clone writes to the same buffer, so a
/// test can hand one clone to an [`EventLoop`](crate::EventLoop) and inspect
/// the bytes through another.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, as (lossy) UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    /// Everything written so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Discard everything written so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A headless harness that drives a [`Dispatcher`] through the whole
/// pipeline without a terminal or a runtime.
///
/// Each [`send`](TestHarness::send) runs the same steps the event loop
/// stages do (dispatch, diff, cursor tracking, ANSI output) synchronously,
/// so widgets and key bindings can be tested in a plain `#[test]`.
///
/// # Example
///
/// ```
/// use steep_core::testing::TestHarness;
/// use steep_core::{Dispatcher, Size, WidgetManager};
///
/// let manager = WidgetManager::new(vec![]).unwrap();
/// let mut harness = TestHarness::new(Dispatcher::new(manager, Size::new(3, 1)));
/// harness.type_str("abc");
/// assert_eq!(harness.screen(), "   ");
/// ```
pub struct TestHarness {
    dispatcher: Dispatcher,
    screen: ScreenBuffer,
    cursor: CursorController,
    renderer: DiffRenderer<Vec<u8>>,
    frame: Frame,
    last_diff: ScreenDiff,
    stopped: Option<String>,
}

impl TestHarness {
    /// Compose and render the first frame.
    pub fn new(dispatcher: Dispatcher) -> Self {
        let frame = dispatcher.recompose();
        let mut harness = Self {
            dispatcher,
            screen: ScreenBuffer::new(),
            cursor: CursorController::new(true),
            renderer: DiffRenderer::new(Vec::new()),
            frame: frame.clone(),
            last_diff: ScreenDiff::default(),
            stopped: None,
        };
        harness.present(frame);
        harness
    }

    /// Handle one event. Events after a stop are ignored.
    pub fn send(&mut self, event: Event) -> &mut Self {
        if self.stopped.is_some() {
            return self;
        }
        match self.dispatcher.dispatch(event) {
            Dispatch::Render(frame) => self.present(frame),
            Dispatch::Terminal(cmd) => self.control(ControlMessage::Terminal(cmd)),
            Dispatch::Stop { reason } => self.stopped = Some(reason),
        }
        self
    }

    /// Send each character of `text` as a typed character.
    pub fn type_str(&mut self, text: &str) -> &mut Self {
        for c in text.chars() {
            self.send(Event::input(c));
        }
        self
    }

    /// Send a named key.
    pub fn press(&mut self, key: &str) -> &mut Self {
        self.send(Event::key(key))
    }

    /// The last composed screen as text, one line per row.
    pub fn screen(&self) -> String {
        self.frame.grid.to_text()
    }

    /// The last composed frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Where the cursor was last placed.
    pub fn cursor(&self) -> Option<Point> {
        self.frame.cursor
    }

    /// The diff produced by the last recomposition.
    pub fn last_diff(&self) -> &ScreenDiff {
        &self.last_diff
    }

    /// The bytes written so far, as (lossy) UTF-8.
    pub fn output(&self) -> String {
        String::from_utf8_lossy(self.renderer.get_ref()).into_owned()
    }

    /// Return and clear the bytes written so far.
    pub fn take_output(&mut self) -> String {
        let bytes = std::mem::take(self.renderer.get_mut());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// The stop reason, once the dispatcher has asked to stop.
    pub fn stop_reason(&self) -> Option<&str> {
        self.stopped.as_deref()
    }

    /// The dispatcher, for inspecting widget and focus state.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Mutable access to the dispatcher.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    fn present(&mut self, frame: Frame) {
        let diff = self.screen.update(frame.grid.clone());
        // Writing into a Vec cannot fail.
        let _ = self.renderer.render(&diff);
        self.last_diff = diff;
        let cursor = frame.cursor;
        self.frame = frame;
        self.control(ControlMessage::Cursor(cursor));
    }

    fn control(&mut self, msg: ControlMessage) {
        for cmd in self.cursor.update(msg) {
            let _ = self.renderer.apply(&cmd);
        }
    }
}
