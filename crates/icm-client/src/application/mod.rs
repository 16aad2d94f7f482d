//! Application layer of the client: the operations a program performs
//! against the compositor.
//!
//! # What lives here?
//!
//! - **`shell`** – [`shell::IcmClient`], one method per command and query,
//!   plus event subscriptions.  Commands are fire-and-forget; queries are
//!   `async` and resolve with the matching reply.
//!
//! - **`windows`** – window and image id allocation and the advisory cache
//!   of window geometry this client last requested.

pub mod shell;
pub mod windows;
