//! Derivation of pointer notifications from raw pointer events.
//!
//! The compositor sends one kind of pointer frame for motion and button
//! transitions alike.  Subscribers see up to two notifications per frame:
//!
//! | `window_id` | button / state                     | notifications         |
//! |-------------|------------------------------------|-----------------------|
//! | 0 (root)    | any                                | `GlobalPointer`       |
//! | non-zero    | not left/right/middle, or state ≥2 | `Pointer`             |
//! | non-zero    | left/right/middle, state 1         | `Pointer`, `Click`    |
//! | non-zero    | left/right/middle, state 0         | `Pointer`, `Release`  |

use serde::{Deserialize, Serialize};

use crate::dispatch::event::Event;
use crate::protocol::messages::{button, PointerEvent, ROOT_WINDOW};

/// The three buttons that produce click and release notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Maps a Linux input button code to a button, if it is one we track.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            button::LEFT => Some(MouseButton::Left),
            button::RIGHT => Some(MouseButton::Right),
            button::MIDDLE => Some(MouseButton::Middle),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            MouseButton::Left => button::LEFT,
            MouseButton::Right => button::RIGHT,
            MouseButton::Middle => button::MIDDLE,
        }
    }
}

/// Payload of click and release notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonTransition {
    pub window_id: u32,
    pub button: MouseButton,
    pub x: i32,
    pub y: i32,
    pub time: u32,
}

/// Returns the notifications one pointer frame produces, in delivery order.
pub fn route_pointer_event(ev: &PointerEvent) -> Vec<Event> {
    if ev.window_id == ROOT_WINDOW {
        return vec![Event::GlobalPointer(*ev)];
    }

    let mut out = vec![Event::Pointer(*ev)];
    if let Some(button) = MouseButton::from_code(ev.button) {
        let transition = ButtonTransition {
            window_id: ev.window_id,
            button,
            x: ev.x,
            y: ev.y,
            time: ev.time,
        };
        match ev.state {
            1 => out.push(Event::Click(transition)),
            0 => out.push(Event::Release(transition)),
            _ => {}
        }
    }
    out
}
