//! # icm-core
//!
//! Protocol and dispatch layer for clients of the ICM compositor.
//!
//! This crate knows how ICM frames look on the wire and what to do with them
//! once they arrive.  It does no I/O of its own: the `icm-client` crate owns
//! the socket and feeds bytes through the types defined here.
//!
//! # Architecture overview (for beginners)
//!
//! ICM is a compositor that draws client windows and forwards input to them.
//! A client talks to it over a Unix stream socket using small binary frames
//! (16-byte header + payload).  Three kinds of frame travel on that socket:
//!
//! - **Commands** (client → server): create a buffer, draw a rectangle, move
//!   a window.  Fire-and-forget.
//! - **Queries and replies**: the client asks for, say, a window's position
//!   and the server answers with a `*_DATA` frame.
//! - **Events** (server → client): pointer, keyboard and window lifecycle
//!   notifications.
//!
//! The crate is split in two:
//!
//! - **`protocol`** – Message types, the binary codec, and the
//!   [`FrameDecoder`] that cuts a byte stream into frames.
//!
//! - **`dispatch`** – The [`Dispatcher`], which routes decoded events to
//!   subscribers and matches replies to the queries waiting for them.

pub mod dispatch;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `icm_core::IcmMessage` instead of `icm_core::protocol::messages::IcmMessage`.
pub use dispatch::{
    Delivery, Dispatcher, Event, EventKind, Reply, ReplyError, ReplyReceiver, SubscriptionId,
};
pub use protocol::codec::{decode_frame, encode_frame, ProtocolError};
pub use protocol::messages::{Frame, FrameHeader, IcmMessage, MessageType, ReplyKind};
pub use protocol::sequence::SequenceCounter;
pub use protocol::stream::FrameDecoder;
