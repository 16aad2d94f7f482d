//! Event dispatch and reply correlation for inbound frames.

pub mod correlator;
pub mod dispatcher;
pub mod event;
pub mod pointer;

pub use correlator::{Correlator, ReplyError, ReplyReceiver, ReplyResult};
pub use dispatcher::{Delivery, Dispatcher, EventHandler, SubscriptionId};
pub use event::{Event, EventKind, Reply};
pub use pointer::{route_pointer_event, ButtonTransition, MouseButton};
