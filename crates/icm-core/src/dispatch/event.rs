//! Notifications delivered to subscribers, and the replies delivered to queries.

use serde::{Deserialize, Serialize};

use crate::dispatch::pointer::ButtonTransition;
use crate::protocol::codec::ProtocolError;
use crate::protocol::messages::{
    ClickRegionEvent, KeyboardEvent, MonitorInfo, PointerEvent, ReplyKind, ScreenCopy,
    ScreenDimensions, ToplevelWindow, WindowAttributes, WindowCreated, WindowInfo, WindowLayer,
    WindowPosition, WindowSize, WindowStateChanged, WindowStateInfo,
};

/// Anything a subscriber can be told about.
///
/// Server events map one-to-one onto protocol events, except pointer events,
/// which are split into windowed, global, click and release notifications by
/// [`crate::dispatch::route_pointer_event`].  The last four variants come from
/// the connection itself rather than from a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Pointer(PointerEvent),
    GlobalPointer(PointerEvent),
    Click(ButtonTransition),
    Release(ButtonTransition),
    Keyboard(KeyboardEvent),
    Keybind { keybind_id: u32 },
    WindowCreated(WindowCreated),
    WindowDestroyed { window_id: u32 },
    ClickRegion(ClickRegionEvent),
    WindowTitleChanged { window_id: u32, title: String },
    WindowStateChanged(WindowStateChanged),
    CompositorShutdown,
    Connected,
    Closed,
    /// The socket failed; the text is the I/O error's description.
    TransportError(String),
    /// The byte stream desynchronised and the connection was torn down.
    ProtocolViolation(ProtocolError),
}

/// Subscription key: one per [`Event`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Pointer,
    GlobalPointer,
    Click,
    Release,
    Keyboard,
    Keybind,
    WindowCreated,
    WindowDestroyed,
    ClickRegion,
    WindowTitleChanged,
    WindowStateChanged,
    CompositorShutdown,
    Connected,
    Closed,
    TransportError,
    ProtocolViolation,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Pointer(_) => EventKind::Pointer,
            Event::GlobalPointer(_) => EventKind::GlobalPointer,
            Event::Click(_) => EventKind::Click,
            Event::Release(_) => EventKind::Release,
            Event::Keyboard(_) => EventKind::Keyboard,
            Event::Keybind { .. } => EventKind::Keybind,
            Event::WindowCreated(_) => EventKind::WindowCreated,
            Event::WindowDestroyed { .. } => EventKind::WindowDestroyed,
            Event::ClickRegion(_) => EventKind::ClickRegion,
            Event::WindowTitleChanged { .. } => EventKind::WindowTitleChanged,
            Event::WindowStateChanged(_) => EventKind::WindowStateChanged,
            Event::CompositorShutdown => EventKind::CompositorShutdown,
            Event::Connected => EventKind::Connected,
            Event::Closed => EventKind::Closed,
            Event::TransportError(_) => EventKind::TransportError,
            Event::ProtocolViolation(_) => EventKind::ProtocolViolation,
        }
    }
}

/// A decoded reply, handed to exactly one pending query.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    WindowPosition(WindowPosition),
    WindowSize(WindowSize),
    WindowAttributes(WindowAttributes),
    WindowLayer(WindowLayer),
    WindowState(WindowStateInfo),
    ScreenDimensions(ScreenDimensions),
    Monitors(Vec<MonitorInfo>),
    WindowInfo(WindowInfo),
    ScreenCopy(ScreenCopy),
    ToplevelWindows(Vec<ToplevelWindow>),
}

impl Reply {
    pub fn kind(&self) -> ReplyKind {
        match self {
            Reply::WindowPosition(_) => ReplyKind::WindowPosition,
            Reply::WindowSize(_) => ReplyKind::WindowSize,
            Reply::WindowAttributes(_) => ReplyKind::WindowAttributes,
            Reply::WindowLayer(_) => ReplyKind::WindowLayer,
            Reply::WindowState(_) => ReplyKind::WindowState,
            Reply::ScreenDimensions(_) => ReplyKind::ScreenDimensions,
            Reply::Monitors(_) => ReplyKind::Monitors,
            Reply::WindowInfo(_) => ReplyKind::WindowInfo,
            Reply::ScreenCopy(_) => ReplyKind::ScreenCopy,
            Reply::ToplevelWindows(_) => ReplyKind::ToplevelWindows,
        }
    }
}
