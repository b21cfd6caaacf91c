//! Routes pipeline events to widgets and decides when to recompose.

use crate::command::TerminalCommand;
use crate::cursor::ControlMessage;
use crate::event::{Event, WidgetEvent};
use crate::geometry::Size;
use crate::manager::{Frame, WidgetManager};
use crate::screen::ScreenMessage;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

/// What a global key handler decided about a key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not handled; the event continues to the focused widget.
    Pass,
    /// Handled; nothing else sees the event, but the screen is recomposed.
    Consumed,
    /// Stop the application.
    Quit,
    /// Handle this other event instead (e.g. `tab` → `focus_next`).
    Redirect(Event),
    /// Send a terminal command (e.g. an OSC 52 copy) and consume the key.
    Terminal(TerminalCommand),
}

type KeyHandler = Box<dyn FnMut(&Event) -> KeyOutcome + Send>;

/// The result of dispatching one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// State may have changed: here is the recomposed frame.
    Render(Frame),
    /// Forward a terminal command downstream; no recomposition.
    Terminal(TerminalCommand),
    /// Shut the pipeline down.
    Stop {
        /// Why shutdown was requested.
        reason: String,
    },
}

/// Routes [`Event`]s to the [`WidgetManager`], consulting global key
/// handlers first, and recomposes after every state-changing event.
///
/// Events are handled strictly one at a time: each call to
/// [`dispatch`](Dispatcher::dispatch) finishes its recomposition before
/// returning.
///
/// # Example
///
/// ```
/// use steep_core::{Dispatcher, Dispatch, Event, KeyOutcome, Size, WidgetManager};
///
/// let manager = WidgetManager::new(vec![]).unwrap();
/// let mut dispatcher = Dispatcher::new(manager, Size::new(80, 24))
///     .on_key("ctrl+c", |_| KeyOutcome::Quit)
///     .on_key("tab", |_| KeyOutcome::Redirect(Event::command("focus_next")));
///
/// assert!(matches!(dispatcher.dispatch(Event::key("ctrl+c")), Dispatch::Stop { .. }));
/// ```
pub struct Dispatcher {
    manager: WidgetManager,
    size: Size,
    handlers: HashMap<String, KeyHandler>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.handlers.keys().collect();
        keys.sort();
        f.debug_struct("Dispatcher")
            .field("manager", &self.manager)
            .field("size", &self.size)
            .field("handlers", &keys)
            .finish()
    }
}

/// Redirects may chain; cap the depth so a cycle cannot hang the dispatcher.
const MAX_REDIRECTS: usize = 8;

impl Dispatcher {
    /// Create a dispatcher for `manager` at the current terminal `size`.
    pub fn new(manager: WidgetManager, size: Size) -> Self {
        Self {
            manager,
            size,
            handlers: HashMap::new(),
        }
    }

    /// Register a global handler for the key called `name` (see
    /// [`key_name`](crate::event::key_name)). Typed characters are looked up
    /// by the character itself, e.g. `"q"`.
    ///
    /// A later registration for the same name replaces the earlier one.
    pub fn on_key(
        mut self,
        name: impl Into<String>,
        handler: impl FnMut(&Event) -> KeyOutcome + Send + 'static,
    ) -> Self {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    /// The current terminal size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Change the size used for the next recomposition.
    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    /// The widget manager.
    pub fn manager(&self) -> &WidgetManager {
        &self.manager
    }

    /// Mutable access to the widget manager, for setup outside the pipeline.
    pub fn manager_mut(&mut self) -> &mut WidgetManager {
        &mut self.manager
    }

    /// Compose a frame at the current size without handling any event.
    pub fn recompose(&self) -> Frame {
        self.manager.compose_frame(self.size)
    }

    /// Handle one event.
    pub fn dispatch(&mut self, event: Event) -> Dispatch {
        self.dispatch_depth(event, 0)
    }

    fn dispatch_depth(&mut self, event: Event, depth: usize) -> Dispatch {
        trace!(?event, "dispatch");

        if let Some(name) = event.key_name() {
            if let Some(handler) = self.handlers.get_mut(&name) {
                match handler(&event) {
                    KeyOutcome::Pass => {}
                    KeyOutcome::Consumed => return Dispatch::Render(self.recompose()),
                    KeyOutcome::Quit => {
                        return Dispatch::Stop {
                            reason: format!("key `{name}`"),
                        }
                    }
                    KeyOutcome::Terminal(cmd) => return Dispatch::Terminal(cmd),
                    KeyOutcome::Redirect(next) => {
                        if depth < MAX_REDIRECTS {
                            return self.dispatch_depth(next, depth + 1);
                        }
                        debug!(key = %name, "redirect chain too deep, dropping");
                        return Dispatch::Render(self.recompose());
                    }
                }
            }
        }

        match event {
            Event::Input { character, .. } => {
                self.manager.route_to_focused(&WidgetEvent::Input(character));
            }
            Event::KeyPress { name } => {
                self.manager.route_to_focused(&WidgetEvent::KeyPress(name));
            }
            Event::Paste { content } => {
                self.manager.route_to_focused(&WidgetEvent::Paste(content));
            }
            Event::Command { name, .. } if name == "focus_next" => {
                self.manager.focus_next();
            }
            Event::Command { name, .. } if name == "focus_prev" => {
                self.manager.focus_prev();
            }
            Event::Command { name, payload } => {
                self.manager
                    .broadcast(&WidgetEvent::Command { name, payload });
            }
            Event::RenderRequest { reason } => {
                self.manager.broadcast(&WidgetEvent::RenderRequest(reason));
            }
            Event::Resize { columns, rows } => {
                debug!(columns, rows, "resize");
                self.resize(Size::new(columns, rows));
            }
            Event::Terminal(cmd) => return Dispatch::Terminal(cmd),
            Event::Stop { reason } => return Dispatch::Stop { reason },
        }

        Dispatch::Render(self.recompose())
    }
}

/// Dispatcher stage loop.
///
/// Each event is fully handled, and its frame handed to the screen stage,
/// before the next one is received. On stop, both downstream stages are
/// told to finish and the dispatcher is returned with its final state.
pub(crate) async fn run(
    mut dispatcher: Dispatcher,
    mut rx: mpsc::UnboundedReceiver<Event>,
    screen: mpsc::UnboundedSender<ScreenMessage>,
    control: mpsc::UnboundedSender<ControlMessage>,
) -> Dispatcher {
    info!(size = ?dispatcher.size(), "dispatcher started");
    while let Some(event) = rx.recv().await {
        if matches!(event, Event::Resize { .. }) && screen.send(ScreenMessage::Invalidate).is_err() {
            debug!("screen stage gone");
            break;
        }
        let delivered = match dispatcher.dispatch(event) {
            Dispatch::Render(frame) => {
                trace!(size = ?frame.grid.size(), "recomposed");
                screen.send(ScreenMessage::Frame(frame.grid)).is_ok()
                    && control.send(ControlMessage::Cursor(frame.cursor)).is_ok()
            }
            Dispatch::Terminal(cmd) => control.send(ControlMessage::Terminal(cmd)).is_ok(),
            Dispatch::Stop { reason } => {
                info!(%reason, "dispatcher stopping");
                break;
            }
        };
        if !delivered {
            debug!("downstream stage gone, dispatcher stopping");
            break;
        }
    }
    // Whichever stage is still alive is told to finish.
    let _ = screen.send(ScreenMessage::Stop);
    let _ = control.send(ControlMessage::Stop);
    dispatcher
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::layout::LayoutNode;
    use crate::widget::Widget;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Shows the last event it received as text.
    struct Echo {
        id: &'static str,
        last: String,
    }

    impl Echo {
        fn boxed(id: &'static str) -> Box<dyn Widget> {
            Box::new(Echo {
                id,
                last: String::new(),
            })
        }
    }

    impl Widget for Echo {
        fn identifier(&self) -> &str {
            self.id
        }

        fn receive(&mut self, event: &WidgetEvent) {
            self.last = match event {
                WidgetEvent::Input(c) => format!("in:{c}"),
                WidgetEvent::KeyPress(k) => format!("key:{k}"),
                WidgetEvent::Paste(p) => format!("paste:{p}"),
                WidgetEvent::Command { name, .. } => format!("cmd:{name}"),
                WidgetEvent::RenderRequest(r) => format!("render:{r}"),
            };
        }

        fn render(&self, width: u16, height: u16) -> Grid {
            let mut g = Grid::blank(width, height);
            g.put_str(0, 0, &self.last, Default::default());
            g
        }
    }

    fn text(d: Dispatch) -> String {
        match d {
            Dispatch::Render(frame) => frame.grid.to_text(),
            other => panic!("expected a frame, got {other:?}"),
        }
    }

    fn pair() -> Dispatcher {
        let manager = WidgetManager::new(vec![Echo::boxed("a"), Echo::boxed("b")])
            .unwrap()
            .with_layout(LayoutNode::vertical([
                LayoutNode::leaf("a"),
                LayoutNode::leaf("b"),
            ]))
            .unwrap();
        Dispatcher::new(manager, Size::new(12, 2))
    }

    #[test]
    fn input_goes_to_focused_widget() {
        let mut d = pair();
        assert_eq!(
            text(d.dispatch(Event::input('x'))),
            "in:x        \n            "
        );
    }

    #[test]
    fn global_handler_consumes_key() {
        let mut d = pair().on_key("q", |_| KeyOutcome::Consumed);
        assert_eq!(text(d.dispatch(Event::input('q'))).trim(), "");
    }

    #[test]
    fn passing_handler_lets_event_through() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let mut d = pair().on_key("enter", move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            KeyOutcome::Pass
        });
        assert!(text(d.dispatch(Event::key("enter"))).starts_with("key:enter"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn quit_handler_stops() {
        let mut d = pair().on_key("ctrl+c", |_| KeyOutcome::Quit);
        assert!(matches!(d.dispatch(Event::key("ctrl+c")), Dispatch::Stop { .. }));
    }

    #[test]
    fn redirect_to_focus_next() {
        let mut d = pair().on_key("tab", |_| KeyOutcome::Redirect(Event::command("focus_next")));
        d.dispatch(Event::key("tab"));
        assert_eq!(d.manager().focused_id(), Some("b"));
        let out = text(d.dispatch(Event::input('z')));
        assert_eq!(out.lines().nth(1).unwrap().trim(), "in:z");
    }

    #[test]
    fn redirect_cycle_is_bounded() {
        let mut d = pair()
            .on_key("x", |_| KeyOutcome::Redirect(Event::key("y")))
            .on_key("y", |_| KeyOutcome::Redirect(Event::key("x")));
        assert!(matches!(d.dispatch(Event::key("x")), Dispatch::Render(_)));
    }

    #[test]
    fn terminal_outcome_is_forwarded() {
        let mut d = pair().on_key("ctrl+y", |_| {
            KeyOutcome::Terminal(TerminalCommand::SetClipboard("copied".into()))
        });
        assert_eq!(
            d.dispatch(Event::key("ctrl+y")),
            Dispatch::Terminal(TerminalCommand::SetClipboard("copied".into()))
        );
    }

    #[test]
    fn focus_commands_move_focus() {
        let mut d = pair();
        d.dispatch(Event::command("focus_prev"));
        assert_eq!(d.manager().focused_id(), Some("b"));
        d.dispatch(Event::command("focus_next"));
        assert_eq!(d.manager().focused_id(), Some("a"));
    }

    #[test]
    fn other_commands_are_broadcast() {
        let mut d = pair();
        let out = text(d.dispatch(Event::command("refresh")));
        assert_eq!(out, "cmd:refresh \ncmd:refresh ");
    }

    #[test]
    fn render_request_is_broadcast() {
        let mut d = pair();
        let out = text(d.dispatch(Event::render("tick")));
        assert_eq!(out, "render:tick \nrender:tick ");
    }

    #[test]
    fn paste_goes_to_focused() {
        let mut d = pair();
        let out = text(d.dispatch(Event::Paste {
            content: "hey".into(),
        }));
        assert!(out.starts_with("paste:hey"));
    }

    #[test]
    fn resize_recomposes_at_new_size() {
        let mut d = pair();
        match d.dispatch(Event::Resize {
            columns: 5,
            rows: 4,
        }) {
            Dispatch::Render(frame) => assert_eq!(frame.grid.size(), Size::new(5, 4)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(d.size(), Size::new(5, 4));
    }

    #[test]
    fn stop_event_stops() {
        let mut d = pair();
        assert_eq!(
            d.dispatch(Event::stop("bye")),
            Dispatch::Stop {
                reason: "bye".into()
            }
        );
    }

    #[test]
    fn rapid_events_produce_ordered_frames() {
        let mut d = pair();
        let first = text(d.dispatch(Event::input('1')));
        let second = text(d.dispatch(Event::input('2')));
        assert!(first.starts_with("in:1"));
        assert!(second.starts_with("in:2"));
    }

    #[tokio::test]
    async fn stage_emits_frames_in_order_then_stops_downstream() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stx, mut srx) = mpsc::unbounded_channel();
        let (ctx, mut crx) = mpsc::unbounded_channel();
        tx.send(Event::input('1')).unwrap();
        tx.send(Event::Resize { columns: 12, rows: 2 }).unwrap();
        tx.send(Event::stop("done")).unwrap();
        tx.send(Event::input('2')).unwrap();

        let d = run(pair(), rx, stx, ctx).await;
        assert_eq!(d.manager().focused_id(), Some("a"));

        let Some(ScreenMessage::Frame(first)) = srx.recv().await else {
            panic!("expected a frame");
        };
        assert!(first.to_text().starts_with("in:1"));
        assert_eq!(srx.recv().await, Some(ScreenMessage::Invalidate));
        assert!(matches!(srx.recv().await, Some(ScreenMessage::Frame(_))));
        assert_eq!(srx.recv().await, Some(ScreenMessage::Stop));
        assert_eq!(srx.recv().await, None);

        assert_eq!(crx.recv().await, Some(ControlMessage::Cursor(None)));
        assert_eq!(crx.recv().await, Some(ControlMessage::Cursor(None)));
        assert_eq!(crx.recv().await, Some(ControlMessage::Stop));
    }

    #[tokio::test]
    async fn stage_exits_when_screen_stage_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stx, srx) = mpsc::unbounded_channel();
        let (ctx, mut crx) = mpsc::unbounded_channel();
        drop(srx);
        tx.send(Event::input('1')).unwrap();

        // The input channel is still open, so only the failed send ends the loop.
        let d = run(pair(), rx, stx, ctx).await;
        assert_eq!(d.manager().focused_id(), Some("a"));
        assert_eq!(crx.recv().await, Some(ControlMessage::Stop));
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn stage_exits_when_cursor_stage_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stx, mut srx) = mpsc::unbounded_channel();
        let (ctx, crx) = mpsc::unbounded_channel();
        drop(crx);
        tx.send(Event::input('1')).unwrap();

        run(pair(), rx, stx, ctx).await;
        assert!(matches!(srx.recv().await, Some(ScreenMessage::Frame(_))));
        assert_eq!(srx.recv().await, Some(ScreenMessage::Stop));
        drop(tx);
    }
}
