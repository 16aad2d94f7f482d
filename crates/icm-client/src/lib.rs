//! icm-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does icm-client do? (for beginners)
//!
//! The compositor listens on a Unix socket (`$XDG_RUNTIME_DIR/icm.sock`).
//! A program that wants to draw windows, move them around, or react to
//! input connects to that socket and speaks the ICM binary protocol.
//!
//! This crate is that program's side of the socket:
//!
//! 1. [`IcmClient::connect`] opens the socket and spawns a reader and a
//!    writer task.
//! 2. Command methods (`create_window`, `draw_rect`, ...) encode a frame
//!    and queue it.
//! 3. Query methods (`query_monitors`, ...) additionally wait for the reply.
//! 4. Events pushed by the compositor (pointer, keyboard, window lifecycle)
//!    reach subscribers registered with [`IcmClient::subscribe`] or
//!    [`IcmClient::on`].
//!
//! ```no_run
//! use icm_client::{ClientConfig, IcmClient, WindowOptions};
//!
//! # async fn run() -> Result<(), icm_client::ClientError> {
//! let mut client = IcmClient::new(ClientConfig::default());
//! client.connect().await?;
//! let win = client.create_window(WindowOptions::new(400, 300).at(100, 100))?;
//! client.draw_rect(win, 0, 0, 400, 300, 0x2020_30FF)?;
//! let screen = client.query_screen_dimensions().await?;
//! println!("{}x{}", screen.total_width, screen.total_height);
//! # Ok(())
//! # }
//! ```

/// Application layer: the client operation surface.
pub mod application;

/// Crate-wide error type.
pub mod error;

/// Infrastructure layer: socket connection and configuration.
pub mod infrastructure;

pub use application::shell::{
    DrawImageOptions, EventSubscription, IcmClient, ScreenRegion, DEFAULT_FONT_SIZE,
    DEFAULT_SCREEN_COPY_REGION,
};
pub use application::windows::{ImageId, WindowGeometry, WindowId, WindowOptions};
pub use error::ClientError;
pub use infrastructure::config::ClientConfig;
pub use icm_core::{Event, EventKind, Reply, ReplyKind, SubscriptionId};
