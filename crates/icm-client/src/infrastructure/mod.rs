//! Infrastructure layer for the client.
//!
//! **Dependency rule**: this layer may depend on `icm_core`, but MUST NOT
//! import from `application`.
//!
//! # Sub-modules
//!
//! - **`connection`** – owns the Unix-socket stream.  A reader task feeds
//!   bytes through the frame decoder into the dispatcher; a writer task
//!   drains the outbound queue so frames hit the socket in send order.
//!
//! - **`config`** – socket path resolution and the optional TOML config file.

pub mod config;
pub mod connection;
