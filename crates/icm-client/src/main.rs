//! ICM client entry point.
//!
//! Connects to the compositor, reports the screen layout, then logs window
//! lifecycle events until the compositor shuts down or Ctrl-C is pressed.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()            -- ~/.config/icm/client.toml (optional)
//!  └─ IcmClient::connect()     -- spawns reader + writer tasks
//!  └─ query screen + monitors
//!  └─ event loop
//!       ├─ WindowCreated / WindowDestroyed / WindowTitleChanged -> log
//!       ├─ CompositorShutdown / Closed                          -> stop
//!       └─ Ctrl-C                                               -> close
//! ```

use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use icm_client::infrastructure::config::load_config;
use icm_core::protocol::messages::WindowEventMask;
use icm_client::{Event, EventKind, IcmClient};

/// Event kinds the binary logs or reacts to.
const WATCHED: [EventKind; 7] = [
    EventKind::WindowCreated,
    EventKind::WindowDestroyed,
    EventKind::WindowTitleChanged,
    EventKind::CompositorShutdown,
    EventKind::TransportError,
    EventKind::ProtocolViolation,
    EventKind::Closed,
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;

    // RUST_LOG overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str())),
        )
        .init();

    let socket = config.resolved_socket_path();
    info!("ICM client starting (socket {})", socket.display());

    let mut client = IcmClient::new(config);

    // ── Event fan-in ──────────────────────────────────────────────────────────
    let (tx, mut events) = mpsc::unbounded_channel::<Event>();
    for kind in WATCHED {
        let tx = tx.clone();
        client.on(kind, move |ev| {
            let _ = tx.send(ev.clone());
        });
    }
    drop(tx);

    client.connect().await?;

    // ── Screen report ─────────────────────────────────────────────────────────
    let screen = client.query_screen_dimensions().await?;
    info!(
        "screen {}x{} (scale {})",
        screen.total_width, screen.total_height, screen.scale
    );
    for m in client.query_monitors().await? {
        info!(
            "monitor {} {}x{}+{}+{} @ {}.{:03} Hz{}",
            m.name,
            m.width,
            m.height,
            m.x,
            m.y,
            m.refresh_rate / 1000,
            m.refresh_rate % 1000,
            if m.primary { " (primary)" } else { "" }
        );
    }
    client.subscribe_window_events(WindowEventMask::ALL)?;

    // ── Event loop ────────────────────────────────────────────────────────────
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                client.close();
                break;
            }
            ev = events.recv() => match ev {
                Some(Event::WindowCreated(w)) => {
                    info!("window {} created ({}x{})", w.window_id, w.width, w.height);
                }
                Some(Event::WindowDestroyed { window_id }) => {
                    info!("window {window_id} destroyed");
                }
                Some(Event::WindowTitleChanged { window_id, title }) => {
                    info!("window {window_id} title: {title}");
                }
                Some(Event::CompositorShutdown) => {
                    info!("compositor is shutting down");
                    client.close();
                }
                Some(Event::TransportError(e)) => warn!("transport error: {e}"),
                Some(Event::ProtocolViolation(e)) => warn!("protocol violation: {e}"),
                Some(Event::Closed) | None => break,
                Some(_) => {}
            }
        }
    }

    info!("ICM client stopped");
    Ok(())
}
