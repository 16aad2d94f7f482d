//! Dispatcher: turns decoded frames into subscriber callbacks and query replies.
//!
//! # How it works (for beginners)
//!
//! Every frame read from the compositor lands in exactly one of three buckets:
//!
//! - **Reply** (`*_DATA` frames): handed to the [`Correlator`], which wakes
//!   the query that asked for it.
//! - **Event** (pointer, keyboard, window lifecycle, ...): converted to one or
//!   more [`Event`]s and passed to every subscriber registered for that
//!   [`EventKind`], in registration order.
//! - **Anything else** (a client-bound command echoed back, for example): logged
//!   and ignored.
//!
//! The dispatcher does no I/O and holds no locks.  The connection wraps it in
//! a mutex and calls [`Dispatcher::dispatch_frame`] once per frame.

use tracing::{debug, warn};

use crate::dispatch::correlator::{Correlator, ReplyError, ReplyReceiver};
use crate::dispatch::event::{Event, EventKind, Reply};
use crate::dispatch::pointer::route_pointer_event;
use crate::protocol::codec::{decode_frame, ProtocolError};
use crate::protocol::messages::{Frame, IcmMessage, MessageType, ReplyKind};

/// Callback invoked for each matching event.
pub type EventHandler = Box<dyn FnMut(&Event) + Send>;

/// Handle returned by [`Dispatcher::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    kind: EventKind,
    handler: EventHandler,
}

/// What happened to one dispatched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Events were emitted; `handlers` counts the callbacks invoked in total.
    Events { kinds: Vec<EventKind>, handlers: usize },
    /// A reply reached a waiter (`resolved`) or was dropped.
    Reply { kind: ReplyKind, resolved: bool },
    /// The message is not something a client receives.
    Ignored(MessageType),
}

#[derive(Default)]
pub struct Dispatcher {
    subscribers: Vec<Subscriber>,
    next_id: u64,
    correlator: Correlator,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Subscriptions ─────────────────────────────────────────────────────────

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event) + Send + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push(Subscriber {
            id,
            kind,
            handler: Box::new(handler),
        });
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.iter().filter(|s| s.kind == kind).count()
    }

    /// Invokes every handler registered for the event's kind.  Returns how
    /// many ran.
    pub fn emit(&mut self, event: &Event) -> usize {
        let kind = event.kind();
        let mut invoked = 0;
        for sub in self.subscribers.iter_mut().filter(|s| s.kind == kind) {
            (sub.handler)(event);
            invoked += 1;
        }
        invoked
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Registers interest in the next reply of `kind`.  See
    /// [`Correlator::register`].
    pub fn register_query(&mut self, kind: ReplyKind, sequence: u32) -> ReplyReceiver {
        self.correlator.register(kind, sequence)
    }

    pub fn pending_queries(&self, kind: ReplyKind) -> usize {
        self.correlator.pending(kind)
    }

    /// Fails all pending and future queries with `ConnectionClosed`.
    pub fn close(&mut self) {
        let failed = self.correlator.close();
        if failed > 0 {
            debug!(failed, "pending queries failed on close");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.correlator.is_closed()
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Decodes and dispatches one frame.
    ///
    /// A decode failure is returned to the caller, which logs it and moves on
    /// to the next frame.  If the frame was a reply, the query it answers
    /// (by echoed sequence, else the oldest of that kind) is failed with the
    /// decode error first.
    pub fn dispatch_frame(&mut self, frame: &Frame) -> Result<Delivery, ProtocolError> {
        match decode_frame(frame) {
            Ok(msg) => Ok(self.dispatch(msg, frame.header.sequence)),
            Err(err) => {
                let reply_kind = MessageType::try_from(frame.header.message_type)
                    .ok()
                    .and_then(ReplyKind::from_message_type);
                if let Some(kind) = reply_kind {
                    self.correlator.fail(
                        kind,
                        frame.header.sequence,
                        ReplyError::Decode(err.clone()),
                    );
                }
                Err(err)
            }
        }
    }

    /// Dispatches an already-decoded message.
    pub fn dispatch(&mut self, msg: IcmMessage, sequence: u32) -> Delivery {
        use IcmMessage as M;

        let events = match msg {
            M::WindowPositionData(d) => return self.reply(Reply::WindowPosition(d), sequence),
            M::WindowSizeData(d) => return self.reply(Reply::WindowSize(d), sequence),
            M::WindowAttributesData(d) => {
                return self.reply(Reply::WindowAttributes(d), sequence)
            }
            M::WindowLayerData(d) => return self.reply(Reply::WindowLayer(d), sequence),
            M::WindowStateData(d) => return self.reply(Reply::WindowState(d), sequence),
            M::ScreenDimensionsData(d) => {
                return self.reply(Reply::ScreenDimensions(d), sequence)
            }
            M::MonitorsData(d) => return self.reply(Reply::Monitors(d), sequence),
            M::WindowInfoData(d) => return self.reply(Reply::WindowInfo(d), sequence),
            M::ScreenCopyData(d) => return self.reply(Reply::ScreenCopy(d), sequence),
            M::ToplevelWindowsData(d) => {
                return self.reply(Reply::ToplevelWindows(d), sequence)
            }

            M::PointerEvent(ev) => route_pointer_event(&ev),
            M::KeyboardEvent(ev) => vec![Event::Keyboard(ev)],
            M::KeybindEvent { keybind_id } => vec![Event::Keybind { keybind_id }],
            M::WindowCreated(ev) => vec![Event::WindowCreated(ev)],
            M::WindowDestroyed { window_id } => vec![Event::WindowDestroyed { window_id }],
            M::ClickRegionEvent(ev) => vec![Event::ClickRegion(ev)],
            M::CompositorShutdown => vec![Event::CompositorShutdown],
            M::WindowTitleChanged { window_id, title } => {
                vec![Event::WindowTitleChanged { window_id, title }]
            }
            M::WindowStateChanged(ev) => vec![Event::WindowStateChanged(ev)],

            other @ (
                // Commands
                M::CreateBuffer(_)
                | M::DestroyBuffer { .. }
                | M::DrawRect(_)
                | M::DrawLine(_)
                | M::DrawCircle(_)
                | M::DrawPolygon(_)
                | M::BatchBegin { .. }
                | M::BatchEnd { .. }
                | M::ExportSurface(_)
                | M::ImportSurface(_)
                | M::RegisterPointerEvent { .. }
                | M::RegisterKeyboardEvent { .. }
                | M::CaptureMouse { .. }
                | M::CaptureKeyboard { .. }
                | M::UploadImage(_)
                | M::DestroyImage { .. }
                | M::DrawUploadedImage(_)
                | M::DrawText(_)
                | M::SetWindowVisible { .. }
                | M::RegisterKeybind(_)
                | M::UnregisterKeybind { .. }
                | M::RegisterClickRegion(_)
                | M::UnregisterClickRegion { .. }
                | M::RegisterGlobalPointerEvent
                | M::RegisterGlobalKeyboardEvent
                | M::RegisterGlobalCaptureMouse
                | M::RegisterGlobalCaptureKeyboard
                | M::UnregisterGlobalCaptureKeyboard
                | M::UnregisterGlobalCaptureMouse
                | M::SetWindowPosition(_)
                | M::SetWindowSize(_)
                | M::SetWindowOpacity { .. }
                | M::SetWindowTransform(_)
                | M::SetWindowBlur { .. }
                | M::SetScreenEffect { .. }
                | M::SetWindowEffect { .. }
                | M::SetWindowLayer { .. }
                | M::RaiseWindow { .. }
                | M::LowerWindow { .. }
                | M::SetWindowParent { .. }
                | M::SetWindowTransform3d(_)
                | M::SetWindowMatrix { .. }
                | M::SetWindowState { .. }
                | M::FocusWindow { .. }
                | M::BlurWindow { .. }
                | M::AnimateWindow(_)
                | M::StopAnimation { .. }
                | M::SetWindowMeshTransform(_)
                | M::ClearWindowMeshTransform { .. }
                | M::UpdateWindowMeshVertices(_)
                | M::SubscribeWindowEvents { .. }
                | M::UnsubscribeWindowEvents { .. }
                | M::SetWindowDecorations(_)
                | M::RequestWindowDecorations { .. }
                | M::LaunchApp { .. }
                // Queries
                | M::QueryWindowPosition { .. }
                | M::QueryWindowSize { .. }
                | M::QueryWindowAttributes { .. }
                | M::QueryWindowLayer { .. }
                | M::QueryWindowState { .. }
                | M::QueryWindowInfo { .. }
                | M::QueryScreenDimensions
                | M::QueryMonitors
                | M::RequestScreenCopy(_)
                | M::QueryToplevelWindows { .. }
            ) => {
                let message_type = other.message_type();
                warn!(?message_type, "ignoring message that only clients send");
                return Delivery::Ignored(message_type);
            }
        };

        let kinds = events.iter().map(Event::kind).collect();
        let handlers = events.iter().map(|ev| self.emit(ev)).sum();
        Delivery::Events { kinds, handlers }
    }

    fn reply(&mut self, reply: Reply, sequence: u32) -> Delivery {
        let kind = reply.kind();
        let resolved = self.correlator.resolve(reply, sequence);
        if !resolved {
            debug!(?kind, sequence, "reply with no pending query dropped");
        }
        Delivery::Reply { kind, resolved }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::protocol::codec::encode_payload;
    use crate::protocol::messages::{
        button, FrameHeader, PointerEvent, ScreenDimensions, WindowPosition, HEADER_SIZE,
    };

    fn frame_of(msg: &IcmMessage, sequence: u32) -> Frame {
        let payload = encode_payload(msg);
        Frame {
            header: FrameHeader {
                length: (HEADER_SIZE + payload.len()) as u32,
                message_type: msg.message_type() as u16,
                flags: 0,
                sequence,
                num_fds: 0,
            },
            payload,
        }
    }

    /// Subscribes a handler that records every event it sees.
    fn record(d: &mut Dispatcher, kind: EventKind) -> Arc<Mutex<Vec<Event>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        d.subscribe(kind, move |ev| sink.lock().unwrap().push(ev.clone()));
        seen
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        // Arrange
        let mut d = Dispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            d.subscribe(EventKind::Keybind, move |_| order.lock().unwrap().push(tag));
        }

        // Act
        let delivery = d.dispatch(IcmMessage::KeybindEvent { keybind_id: 9 }, 0);

        // Assert
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
        assert_eq!(
            delivery,
            Delivery::Events {
                kinds: vec![EventKind::Keybind],
                handlers: 3
            }
        );
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        // Arrange
        let mut d = Dispatcher::new();
        let count = Arc::new(Mutex::new(0));
        let c = Arc::clone(&count);
        let id = d.subscribe(EventKind::CompositorShutdown, move |_| *c.lock().unwrap() += 1);

        // Act
        d.dispatch(IcmMessage::CompositorShutdown, 0);
        assert!(d.unsubscribe(id));
        d.dispatch(IcmMessage::CompositorShutdown, 0);

        // Assert
        assert_eq!(*count.lock().unwrap(), 1);
        assert!(!d.unsubscribe(id), "second unsubscribe is a no-op");
    }

    #[test]
    fn test_pointer_press_fans_out_to_pointer_and_click() {
        // Arrange
        let mut d = Dispatcher::new();
        let pointer = record(&mut d, EventKind::Pointer);
        let click = record(&mut d, EventKind::Click);
        let global = record(&mut d, EventKind::GlobalPointer);
        let ev = PointerEvent {
            window_id: 3,
            time: 1,
            button: button::LEFT,
            state: 1,
            x: 10,
            y: 20,
        };

        // Act
        d.dispatch(IcmMessage::PointerEvent(ev), 0);

        // Assert
        assert_eq!(*pointer.lock().unwrap(), vec![Event::Pointer(ev)]);
        assert_eq!(click.lock().unwrap().len(), 1);
        assert!(global.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reply_resolves_query() {
        // Arrange
        let mut d = Dispatcher::new();
        let mut rx = d.register_query(ReplyKind::ScreenDimensions, 4);
        let dims = ScreenDimensions {
            total_width: 2560,
            total_height: 1440,
            scale: 1.0,
        };

        // Act
        let delivery = d.dispatch_frame(&frame_of(&IcmMessage::ScreenDimensionsData(dims), 0));

        // Assert
        assert_eq!(
            delivery,
            Ok(Delivery::Reply {
                kind: ReplyKind::ScreenDimensions,
                resolved: true
            })
        );
        assert_eq!(rx.try_recv().unwrap(), Ok(Reply::ScreenDimensions(dims)));
    }

    #[test]
    fn test_unsolicited_reply_is_dropped() {
        let mut d = Dispatcher::new();
        let reply = IcmMessage::WindowPositionData(WindowPosition {
            window_id: 1,
            x: 0,
            y: 0,
        });
        assert_eq!(
            d.dispatch(reply, 0),
            Delivery::Reply {
                kind: ReplyKind::WindowPosition,
                resolved: false
            }
        );
    }

    #[test]
    fn test_truncated_reply_fails_oldest_query() {
        // Arrange – a monitors reply claiming two records but carrying none
        let mut d = Dispatcher::new();
        let mut rx = d.register_query(ReplyKind::Monitors, 1);
        let frame = Frame {
            header: FrameHeader {
                length: (HEADER_SIZE + 4) as u32,
                message_type: MessageType::MonitorsData as u16,
                flags: 0,
                sequence: 0,
                num_fds: 0,
            },
            payload: 2u32.to_le_bytes().to_vec(),
        };

        // Act
        let result = d.dispatch_frame(&frame);

        // Assert
        let err = result.unwrap_err();
        assert!(matches!(err, ProtocolError::TruncatedPayload { .. }));
        assert_eq!(rx.try_recv().unwrap(), Err(ReplyError::Decode(err)));
    }

    #[test]
    fn test_truncated_reply_with_echoed_sequence_fails_that_query() {
        // Arrange – two monitor queries; the broken reply echoes the second
        let mut d = Dispatcher::new();
        let mut first = d.register_query(ReplyKind::Monitors, 1);
        let mut second = d.register_query(ReplyKind::Monitors, 2);
        let frame = Frame {
            header: FrameHeader {
                length: (HEADER_SIZE + 4) as u32,
                message_type: MessageType::MonitorsData as u16,
                flags: 0,
                sequence: 2,
                num_fds: 0,
            },
            payload: 3u32.to_le_bytes().to_vec(),
        };

        // Act
        let err = d.dispatch_frame(&frame).unwrap_err();

        // Assert
        assert!(first.try_recv().is_err(), "first query still pending");
        assert_eq!(second.try_recv().unwrap(), Err(ReplyError::Decode(err)));
    }

    #[test]
    fn test_unknown_type_is_reported_and_touches_nothing() {
        // Arrange
        let mut d = Dispatcher::new();
        let mut rx = d.register_query(ReplyKind::Monitors, 1);
        let frame = Frame {
            header: FrameHeader {
                length: HEADER_SIZE as u32,
                message_type: 999,
                flags: 0,
                sequence: 0,
                num_fds: 0,
            },
            payload: Vec::new(),
        };

        // Act
        let result = d.dispatch_frame(&frame);

        // Assert
        assert_eq!(result, Err(ProtocolError::UnknownMessageType(999)));
        assert!(rx.try_recv().is_err(), "query still pending");
    }

    #[test]
    fn test_client_only_message_is_ignored() {
        // Arrange
        let mut d = Dispatcher::new();
        let mut rx = d.register_query(ReplyKind::ScreenDimensions, 1);
        let sent_by_clients = [
            IcmMessage::QueryScreenDimensions,
            IcmMessage::RaiseWindow { window_id: 1 },
            IcmMessage::RegisterGlobalPointerEvent,
        ];

        for msg in sent_by_clients {
            // Act
            let message_type = msg.message_type();
            let delivery = d.dispatch(msg, 1);

            // Assert
            assert_eq!(delivery, Delivery::Ignored(message_type));
        }
        assert!(rx.try_recv().is_err(), "query still pending");
    }

    #[test]
    fn test_close_fails_pending_and_future_queries() {
        // Arrange
        let mut d = Dispatcher::new();
        let mut before = d.register_query(ReplyKind::WindowInfo, 1);

        // Act
        d.close();
        let mut after = d.register_query(ReplyKind::WindowInfo, 2);

        // Assert
        assert!(d.is_closed());
        assert_eq!(before.try_recv().unwrap(), Err(ReplyError::ConnectionClosed));
        assert_eq!(after.try_recv().unwrap(), Err(ReplyError::ConnectionClosed));
    }

    #[test]
    fn test_lifecycle_events_use_the_same_registry() {
        let mut d = Dispatcher::new();
        let closed = record(&mut d, EventKind::Closed);
        assert_eq!(d.emit(&Event::Closed), 1);
        assert_eq!(*closed.lock().unwrap(), vec![Event::Closed]);
        assert_eq!(d.subscriber_count(EventKind::Closed), 1);
    }
}
