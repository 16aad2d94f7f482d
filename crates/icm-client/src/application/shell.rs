//! `IcmClient`: the public operation surface of the ICM client.
//!
//! # How operations travel (for beginners)
//!
//! Every method here builds one [`IcmMessage`] and hands it to the
//! [`Connection`]:
//!
//! - **Commands** (`draw_rect`, `set_window_position`, ...) are queued for
//!   the writer task and return immediately.  The compositor never answers
//!   them, so `Ok(())` means "queued", not "applied".
//! - **Queries** (`query_window_position`, `query_monitors`, ...) are `async`.
//!   They register a waiter with the dispatcher, queue the query, and resolve
//!   when the reader task sees the matching reply.
//!
//! Queries have no timeout.  Dropping a query future abandons it; the reply,
//! if it ever arrives, goes to the next waiter of the same kind.
//!
//! Subscriptions may be registered before [`IcmClient::connect`] so that the
//! `Connected` notification is observable.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use icm_core::protocol::messages::{
    ClickRegion, CreateBuffer, DrawCircle, DrawLine, DrawPolygon, DrawRect, DrawText,
    DrawUploadedImage, ExportSurface, ImportSurface, MeshTransform, MeshVertex, MeshVertexUpdate,
    MonitorInfo, RegisterKeybind, ScreenCopy, ScreenCopyRequest, ScreenDimensions, ToplevelWindow,
    UploadImage, WindowAttributes, WindowDecorations, WindowEventMask, WindowInfo, WindowLayer,
    WindowPosition, WindowSize, WindowStateFlags, WindowStateInfo, WindowTransform,
    WindowTransform3d, FORMAT_ARGB8888,
};
use icm_core::protocol::AnimationTargets;
use icm_core::{Dispatcher, Event, EventKind, IcmMessage, Reply, ReplyKind, SubscriptionId};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::debug;

use crate::application::windows::{
    ImageId, WindowGeometry, WindowId, WindowOptions, WindowRegistry,
};
use crate::error::ClientError;
use crate::infrastructure::config::ClientConfig;
use crate::infrastructure::connection::{lock, Connection};

/// Default font size for [`IcmClient::draw_text`].
pub const DEFAULT_FONT_SIZE: u32 = 12;

/// Region captured by [`IcmClient::request_screen_copy`] when none is given.
pub const DEFAULT_SCREEN_COPY_REGION: ScreenRegion = ScreenRegion {
    x: 0,
    y: 0,
    width: 1920,
    height: 1080,
};

/// Rectangle on the virtual screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Parameters for [`IcmClient::draw_image`].
///
/// Zero width/height and a zero source rectangle leave the choice to the
/// compositor, which draws the whole image at its natural size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawImageOptions {
    pub image_id: ImageId,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub src_x: u32,
    pub src_y: u32,
    pub src_width: u32,
    pub src_height: u32,
    pub alpha: u8,
}

impl DrawImageOptions {
    /// Whole image at `(x, y)`, fully opaque.
    pub fn new(image_id: ImageId, x: i32, y: i32) -> Self {
        Self {
            image_id,
            x,
            y,
            width: 0,
            height: 0,
            src_x: 0,
            src_y: 0,
            src_width: 0,
            src_height: 0,
            alpha: u8::MAX,
        }
    }
}

/// Channel-backed event subscription returned by [`IcmClient::subscribe`].
///
/// The channel stays open after the connection closes; watch for
/// [`EventKind::Closed`] to know when no more events will come.
#[derive(Debug)]
pub struct EventSubscription {
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventSubscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event.  Returns `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Returns an already-delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

/// Pulls the payload out of a reply, or reports a kind mismatch.
macro_rules! expect_reply {
    ($reply:expr, $variant:ident) => {
        match $reply {
            Reply::$variant(v) => Ok(v),
            other => Err(ClientError::UnexpectedReply {
                expected: ReplyKind::$variant,
                actual: other.kind(),
            }),
        }
    };
}

fn lock_windows(windows: &Mutex<WindowRegistry>) -> MutexGuard<'_, WindowRegistry> {
    windows.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Client for one compositor connection.
pub struct IcmClient {
    config: ClientConfig,
    dispatcher: Arc<Mutex<Dispatcher>>,
    connection: Option<Connection>,
    windows: Arc<Mutex<WindowRegistry>>,
    next_image_id: AtomicU32,
}

impl IcmClient {
    /// Creates an unconnected client.
    pub fn new(config: ClientConfig) -> Self {
        let dispatcher = Arc::new(Mutex::new(Dispatcher::new()));
        let windows = Arc::new(Mutex::new(WindowRegistry::new()));

        // Forget windows the compositor reports as gone.
        let registry = Arc::clone(&windows);
        lock(&dispatcher).subscribe(EventKind::WindowDestroyed, move |ev| {
            if let Event::WindowDestroyed { window_id } = ev {
                lock_windows(&registry).remove(*window_id);
            }
        });

        Self {
            config,
            dispatcher,
            connection: None,
            windows,
            next_image_id: AtomicU32::new(1),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Connects to the socket named by the config.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connect`] if the socket cannot be opened.
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        let path = self.config.resolved_socket_path();
        self.connect_to(&path).await
    }

    /// Connects to an explicit socket path, ignoring the config.
    pub async fn connect_to(&mut self, path: &Path) -> Result<(), ClientError> {
        let conn = Connection::open(path, Arc::clone(&self.dispatcher)).await?;
        self.connection = Some(conn);
        Ok(())
    }

    /// Runs the client over an already-open stream.  Used with in-memory
    /// streams in tests and with sockets opened elsewhere.
    pub fn connect_with_stream<S>(&mut self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        self.connection = Some(Connection::start(stream, Arc::clone(&self.dispatcher)));
    }

    /// Half-closes the write side after already-queued frames.  Pending
    /// queries fail once the compositor closes its end.
    pub fn close(&self) {
        if let Some(conn) = &self.connection {
            conn.close();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(|c| !c.is_closed())
    }

    // ── Subscriptions ─────────────────────────────────────────────────────────

    /// Forwards every event of `kind` into a channel.
    pub fn subscribe(&self, kind: EventKind) -> EventSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = lock(&self.dispatcher).subscribe(kind, move |ev| {
            let _ = tx.send(ev.clone());
        });
        EventSubscription { id, rx }
    }

    /// Registers a callback for `kind`.
    ///
    /// The callback runs on the reader task while the dispatcher is locked,
    /// so it must return quickly and must not call subscription methods on
    /// this client.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event) + Send + 'static,
    {
        lock(&self.dispatcher).subscribe(kind, handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        lock(&self.dispatcher).unsubscribe(id)
    }

    // ── Plumbing ──────────────────────────────────────────────────────────────

    fn connection(&self) -> Result<&Connection, ClientError> {
        self.connection.as_ref().ok_or(ClientError::NotConnected)
    }

    fn send(&self, msg: IcmMessage) -> Result<(), ClientError> {
        self.connection()?.send(&msg)
    }

    async fn query(&self, msg: IcmMessage) -> Result<Reply, ClientError> {
        let rx = self.connection()?.query(&msg)?;
        match rx.await {
            Ok(result) => Ok(result?),
            // Waiter dropped without an answer: the dispatcher went away.
            Err(_) => Err(ClientError::ConnectionClosed),
        }
    }

    // ── Windows ───────────────────────────────────────────────────────────────

    /// Creates a window: allocates a buffer, positions and sizes it, sets the
    /// layer if one is given, and registers for its pointer and keyboard
    /// events.  Returns the new window id.
    pub fn create_window(&self, opts: WindowOptions) -> Result<WindowId, ClientError> {
        let conn = self.connection()?;
        let window_id = lock_windows(&self.windows).allocate();

        conn.send(&IcmMessage::CreateBuffer(CreateBuffer {
            buffer_id: window_id,
            width: opts.width,
            height: opts.height,
            format: FORMAT_ARGB8888,
            usage_flags: 0,
        }))?;
        conn.send(&IcmMessage::SetWindowPosition(WindowPosition {
            window_id,
            x: opts.x,
            y: opts.y,
        }))?;
        conn.send(&IcmMessage::SetWindowSize(WindowSize {
            window_id,
            width: opts.width,
            height: opts.height,
        }))?;
        if let Some(layer) = opts.layer {
            conn.send(&IcmMessage::SetWindowLayer { window_id, layer })?;
        }
        conn.send(&IcmMessage::RegisterPointerEvent { window_id })?;
        conn.send(&IcmMessage::RegisterKeyboardEvent { window_id })?;

        lock_windows(&self.windows).insert(
            window_id,
            WindowGeometry {
                x: opts.x,
                y: opts.y,
                width: opts.width,
                height: opts.height,
            },
        );
        debug!(window_id, width = opts.width, height = opts.height, "window created");
        Ok(window_id)
    }

    pub fn destroy_window(&self, window_id: WindowId) -> Result<(), ClientError> {
        self.send(IcmMessage::DestroyBuffer {
            buffer_id: window_id,
        })?;
        lock_windows(&self.windows).remove(window_id);
        Ok(())
    }

    /// Last geometry this client requested for `window_id`.  Advisory only.
    pub fn cached_geometry(&self, window_id: WindowId) -> Option<WindowGeometry> {
        lock_windows(&self.windows).get(window_id)
    }

    /// Ids of the windows this client created and has not destroyed.
    pub fn window_ids(&self) -> Vec<WindowId> {
        lock_windows(&self.windows).ids()
    }

    pub fn set_window_position(
        &self,
        window_id: WindowId,
        x: i32,
        y: i32,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::SetWindowPosition(WindowPosition { window_id, x, y }))?;
        lock_windows(&self.windows).moved(window_id, x, y);
        Ok(())
    }

    pub fn set_window_size(
        &self,
        window_id: WindowId,
        width: u32,
        height: u32,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::SetWindowSize(WindowSize {
            window_id,
            width,
            height,
        }))?;
        lock_windows(&self.windows).resized(window_id, width, height);
        Ok(())
    }

    pub fn set_window_visible(
        &self,
        window_id: WindowId,
        visible: bool,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::SetWindowVisible { window_id, visible })
    }

    pub fn set_window_opacity(&self, window_id: WindowId, opacity: f32) -> Result<(), ClientError> {
        self.send(IcmMessage::SetWindowOpacity { window_id, opacity })
    }

    pub fn set_window_blur(
        &self,
        window_id: WindowId,
        radius: f32,
        enabled: bool,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::SetWindowBlur {
            window_id,
            radius,
            enabled,
        })
    }

    pub fn set_window_transform(
        &self,
        window_id: WindowId,
        scale_x: f32,
        scale_y: f32,
        rotation: f32,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::SetWindowTransform(WindowTransform {
            window_id,
            scale_x,
            scale_y,
            rotation,
        }))
    }

    pub fn set_window_transform_3d(
        &self,
        window_id: WindowId,
        translate: [f32; 3],
        rotate: [f32; 3],
        scale: [f32; 3],
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::SetWindowTransform3d(WindowTransform3d {
            window_id,
            translate,
            rotate,
            scale,
        }))
    }

    /// Sets a full 4x4 transform, column-major.
    pub fn set_window_matrix(
        &self,
        window_id: WindowId,
        matrix: [f32; 16],
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::SetWindowMatrix { window_id, matrix })
    }

    /// See [`icm_core::protocol::messages::layer`] for the named layers.
    pub fn set_window_layer(&self, window_id: WindowId, layer: i32) -> Result<(), ClientError> {
        self.send(IcmMessage::SetWindowLayer { window_id, layer })
    }

    pub fn set_window_parent(
        &self,
        window_id: WindowId,
        parent_id: WindowId,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::SetWindowParent {
            window_id,
            parent_id,
        })
    }

    pub fn set_window_state(
        &self,
        window_id: WindowId,
        state: WindowStateFlags,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::SetWindowState { window_id, state })
    }

    pub fn raise_window(&self, window_id: WindowId) -> Result<(), ClientError> {
        self.send(IcmMessage::RaiseWindow { window_id })
    }

    pub fn lower_window(&self, window_id: WindowId) -> Result<(), ClientError> {
        self.send(IcmMessage::LowerWindow { window_id })
    }

    pub fn focus_window(&self, window_id: WindowId) -> Result<(), ClientError> {
        self.send(IcmMessage::FocusWindow { window_id })
    }

    pub fn blur_window(&self, window_id: WindowId) -> Result<(), ClientError> {
        self.send(IcmMessage::BlurWindow { window_id })
    }

    pub fn set_window_decorations(
        &self,
        decorations: WindowDecorations,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::SetWindowDecorations(decorations))
    }

    pub fn request_window_decorations(&self, window_id: WindowId) -> Result<(), ClientError> {
        self.send(IcmMessage::RequestWindowDecorations { window_id })
    }

    // ── Effects and animation ─────────────────────────────────────────────────

    /// Applies a pixel-effect equation to the whole screen.  Equations longer
    /// than 256 bytes are truncated.
    pub fn set_screen_effect(&self, equation: &str, enabled: bool) -> Result<(), ClientError> {
        self.send(IcmMessage::SetScreenEffect {
            equation: equation.to_string(),
            enabled,
        })
    }

    pub fn set_window_effect(
        &self,
        window_id: WindowId,
        equation: &str,
        enabled: bool,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::SetWindowEffect {
            window_id,
            equation: equation.to_string(),
            enabled,
        })
    }

    pub fn animate_window(&self, targets: &AnimationTargets) -> Result<(), ClientError> {
        self.send(IcmMessage::AnimateWindow(targets.build()))
    }

    pub fn stop_animation(&self, window_id: WindowId) -> Result<(), ClientError> {
        self.send(IcmMessage::StopAnimation { window_id })
    }

    /// Warps a window through a `mesh_width` x `mesh_height` vertex grid,
    /// row-major.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MeshSize`] if `vertices` does not hold exactly
    /// `mesh_width * mesh_height` entries.
    pub fn set_mesh_transform(
        &self,
        window_id: WindowId,
        mesh_width: u32,
        mesh_height: u32,
        vertices: Vec<MeshVertex>,
    ) -> Result<(), ClientError> {
        let expected = (mesh_width as usize).saturating_mul(mesh_height as usize);
        if vertices.len() != expected {
            return Err(ClientError::MeshSize {
                width: mesh_width,
                height: mesh_height,
                expected,
                actual: vertices.len(),
            });
        }
        self.send(IcmMessage::SetWindowMeshTransform(MeshTransform {
            window_id,
            mesh_width,
            mesh_height,
            vertices,
        }))
    }

    pub fn clear_mesh_transform(&self, window_id: WindowId) -> Result<(), ClientError> {
        self.send(IcmMessage::ClearWindowMeshTransform { window_id })
    }

    /// Replaces vertices starting at `start_index` of the current mesh.
    pub fn update_mesh_vertices(
        &self,
        window_id: WindowId,
        start_index: u32,
        vertices: Vec<MeshVertex>,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::UpdateWindowMeshVertices(MeshVertexUpdate {
            window_id,
            start_index,
            vertices,
        }))
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    pub fn draw_rect(
        &self,
        window_id: WindowId,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        color_rgba: u32,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::DrawRect(DrawRect {
            window_id,
            x,
            y,
            width,
            height,
            color_rgba,
        }))
    }

    pub fn draw_line(
        &self,
        window_id: WindowId,
        from: (i32, i32),
        to: (i32, i32),
        color_rgba: u32,
        thickness: u32,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::DrawLine(DrawLine {
            window_id,
            x0: from.0,
            y0: from.1,
            x1: to.0,
            y1: to.1,
            color_rgba,
            thickness,
        }))
    }

    pub fn draw_circle(
        &self,
        window_id: WindowId,
        center: (i32, i32),
        radius: u32,
        color_rgba: u32,
        fill: bool,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::DrawCircle(DrawCircle {
            window_id,
            cx: center.0,
            cy: center.1,
            radius,
            color_rgba,
            fill,
        }))
    }

    pub fn draw_polygon(
        &self,
        window_id: WindowId,
        points: &[(i32, i32)],
        color_rgba: u32,
        fill: bool,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::DrawPolygon(DrawPolygon {
            window_id,
            color_rgba,
            fill,
            points: points.to_vec(),
        }))
    }

    /// Draws UTF-8 text.  `font_size` defaults to [`DEFAULT_FONT_SIZE`].
    pub fn draw_text(
        &self,
        window_id: WindowId,
        x: i32,
        y: i32,
        text: &str,
        color_rgba: u32,
        font_size: Option<u32>,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::DrawText(DrawText {
            window_id,
            x,
            y,
            color_rgba,
            font_size: font_size.unwrap_or(DEFAULT_FONT_SIZE),
            text: text.to_string(),
        }))
    }

    /// Uploads raw pixels (format 0 = RGBA) and returns the new image id.
    pub fn upload_image(
        &self,
        width: u32,
        height: u32,
        format: u32,
        data: Vec<u8>,
    ) -> Result<ImageId, ClientError> {
        let conn = self.connection()?;
        let image_id = self.next_image_id.fetch_add(1, Ordering::Relaxed);
        conn.send(&IcmMessage::UploadImage(UploadImage {
            image_id,
            width,
            height,
            format,
            data,
        }))?;
        Ok(image_id)
    }

    pub fn destroy_image(&self, image_id: ImageId) -> Result<(), ClientError> {
        self.send(IcmMessage::DestroyImage { image_id })
    }

    pub fn draw_image(
        &self,
        window_id: WindowId,
        opts: DrawImageOptions,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::DrawUploadedImage(DrawUploadedImage {
            window_id,
            image_id: opts.image_id,
            x: opts.x,
            y: opts.y,
            width: opts.width,
            height: opts.height,
            src_x: opts.src_x,
            src_y: opts.src_y,
            src_width: opts.src_width,
            src_height: opts.src_height,
            alpha: opts.alpha,
        }))
    }

    /// Opens a batch; the compositor defers presenting until the matching
    /// [`IcmClient::end_batch`].
    pub fn begin_batch(&self, batch_id: u32, expected_commands: u32) -> Result<(), ClientError> {
        self.send(IcmMessage::BatchBegin {
            batch_id,
            expected_commands,
        })
    }

    pub fn end_batch(&self, batch_id: u32) -> Result<(), ClientError> {
        self.send(IcmMessage::BatchEnd { batch_id })
    }

    // ── Surfaces ──────────────────────────────────────────────────────────────

    pub fn export_surface(
        &self,
        window_id: WindowId,
        surface_id: u32,
        flags: u32,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::ExportSurface(ExportSurface {
            window_id,
            surface_id,
            flags,
        }))
    }

    pub fn import_surface(&self, import: ImportSurface) -> Result<(), ClientError> {
        self.send(IcmMessage::ImportSurface(import))
    }

    // ── Input registration ────────────────────────────────────────────────────

    pub fn register_pointer_events(&self, window_id: WindowId) -> Result<(), ClientError> {
        self.send(IcmMessage::RegisterPointerEvent { window_id })
    }

    pub fn register_keyboard_events(&self, window_id: WindowId) -> Result<(), ClientError> {
        self.send(IcmMessage::RegisterKeyboardEvent { window_id })
    }

    pub fn register_global_pointer_events(&self) -> Result<(), ClientError> {
        self.send(IcmMessage::RegisterGlobalPointerEvent)
    }

    pub fn register_global_keyboard_events(&self) -> Result<(), ClientError> {
        self.send(IcmMessage::RegisterGlobalKeyboardEvent)
    }

    pub fn capture_mouse(&self, window_id: WindowId) -> Result<(), ClientError> {
        self.send(IcmMessage::CaptureMouse { window_id })
    }

    pub fn capture_keyboard(&self, window_id: WindowId) -> Result<(), ClientError> {
        self.send(IcmMessage::CaptureKeyboard { window_id })
    }

    pub fn register_global_capture_mouse(&self) -> Result<(), ClientError> {
        self.send(IcmMessage::RegisterGlobalCaptureMouse)
    }

    pub fn register_global_capture_keyboard(&self) -> Result<(), ClientError> {
        self.send(IcmMessage::RegisterGlobalCaptureKeyboard)
    }

    pub fn unregister_global_capture_mouse(&self) -> Result<(), ClientError> {
        self.send(IcmMessage::UnregisterGlobalCaptureMouse)
    }

    pub fn unregister_global_capture_keyboard(&self) -> Result<(), ClientError> {
        self.send(IcmMessage::UnregisterGlobalCaptureKeyboard)
    }

    pub fn register_keybind(
        &self,
        keybind_id: u32,
        modifiers: u32,
        keycode: u32,
    ) -> Result<(), ClientError> {
        self.send(IcmMessage::RegisterKeybind(RegisterKeybind {
            keybind_id,
            modifiers,
            keycode,
        }))
    }

    pub fn unregister_keybind(&self, keybind_id: u32) -> Result<(), ClientError> {
        self.send(IcmMessage::UnregisterKeybind { keybind_id })
    }

    pub fn register_click_region(&self, region: ClickRegion) -> Result<(), ClientError> {
        self.send(IcmMessage::RegisterClickRegion(region))
    }

    pub fn unregister_click_region(&self, region_id: u32) -> Result<(), ClientError> {
        self.send(IcmMessage::UnregisterClickRegion { region_id })
    }

    pub fn subscribe_window_events(&self, mask: WindowEventMask) -> Result<(), ClientError> {
        self.send(IcmMessage::SubscribeWindowEvents { mask })
    }

    pub fn unsubscribe_window_events(&self, mask: WindowEventMask) -> Result<(), ClientError> {
        self.send(IcmMessage::UnsubscribeWindowEvents { mask })
    }

    /// Asks the compositor to spawn `command` through the shell.
    pub fn launch_app(&self, command: &str) -> Result<(), ClientError> {
        self.send(IcmMessage::LaunchApp {
            command: command.to_string(),
        })
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub async fn query_window_position(
        &self,
        window_id: WindowId,
    ) -> Result<WindowPosition, ClientError> {
        let reply = self.query(IcmMessage::QueryWindowPosition { window_id }).await?;
        expect_reply!(reply, WindowPosition)
    }

    pub async fn query_window_size(&self, window_id: WindowId) -> Result<WindowSize, ClientError> {
        let reply = self.query(IcmMessage::QueryWindowSize { window_id }).await?;
        expect_reply!(reply, WindowSize)
    }

    pub async fn query_window_attributes(
        &self,
        window_id: WindowId,
    ) -> Result<WindowAttributes, ClientError> {
        let reply = self.query(IcmMessage::QueryWindowAttributes { window_id }).await?;
        expect_reply!(reply, WindowAttributes)
    }

    pub async fn query_window_layer(
        &self,
        window_id: WindowId,
    ) -> Result<WindowLayer, ClientError> {
        let reply = self.query(IcmMessage::QueryWindowLayer { window_id }).await?;
        expect_reply!(reply, WindowLayer)
    }

    pub async fn query_window_state(
        &self,
        window_id: WindowId,
    ) -> Result<WindowStateInfo, ClientError> {
        let reply = self.query(IcmMessage::QueryWindowState { window_id }).await?;
        expect_reply!(reply, WindowState)
    }

    pub async fn query_window_info(&self, window_id: WindowId) -> Result<WindowInfo, ClientError> {
        let reply = self.query(IcmMessage::QueryWindowInfo { window_id }).await?;
        expect_reply!(reply, WindowInfo)
    }

    pub async fn query_screen_dimensions(&self) -> Result<ScreenDimensions, ClientError> {
        let reply = self.query(IcmMessage::QueryScreenDimensions).await?;
        expect_reply!(reply, ScreenDimensions)
    }

    pub async fn query_monitors(&self) -> Result<Vec<MonitorInfo>, ClientError> {
        let reply = self.query(IcmMessage::QueryMonitors).await?;
        expect_reply!(reply, Monitors)
    }

    /// Lists top-level windows of every client, optionally only visible ones.
    pub async fn query_toplevel_windows(
        &self,
        visible_only: bool,
    ) -> Result<Vec<ToplevelWindow>, ClientError> {
        let reply = self.query(IcmMessage::QueryToplevelWindows { visible_only }).await?;
        expect_reply!(reply, ToplevelWindows)
    }

    /// Captures a region of the screen.  `region` defaults to
    /// [`DEFAULT_SCREEN_COPY_REGION`].
    pub async fn request_screen_copy(
        &self,
        request_id: u32,
        region: Option<ScreenRegion>,
    ) -> Result<ScreenCopy, ClientError> {
        let r = region.unwrap_or(DEFAULT_SCREEN_COPY_REGION);
        let reply = self
            .query(IcmMessage::RequestScreenCopy(ScreenCopyRequest {
                request_id,
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
            }))
            .await?;
        expect_reply!(reply, ScreenCopy)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_before_connect_fail_not_connected() {
        // Arrange
        let client = IcmClient::new(ClientConfig::default());

        // Act
        let result = client.draw_rect(1, 0, 0, 10, 10, 0xFF00_00FF);

        // Assert
        assert!(matches!(result, Err(ClientError::NotConnected)));
        assert!(!client.is_connected());
    }

    #[test]
    fn test_create_window_before_connect_mints_nothing() {
        let client = IcmClient::new(ClientConfig::default());
        let result = client.create_window(WindowOptions::new(100, 100));
        assert!(matches!(result, Err(ClientError::NotConnected)));
        assert!(client.window_ids().is_empty());
    }

    #[test]
    fn test_query_before_connect_fails_not_connected() {
        let client = IcmClient::new(ClientConfig::default());
        let result = tokio_test::block_on(client.query_monitors());
        assert!(matches!(result, Err(ClientError::NotConnected)));
    }

    #[test]
    fn test_mesh_size_is_validated_before_sending() {
        // Arrange – no connection needed: validation comes first
        let client = IcmClient::new(ClientConfig::default());

        // Act
        let result = client.set_mesh_transform(1, 3, 2, vec![MeshVertex::default(); 5]);

        // Assert
        assert!(matches!(
            result,
            Err(ClientError::MeshSize {
                expected: 6,
                actual: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_subscription_before_connect_is_registered() {
        let client = IcmClient::new(ClientConfig::default());
        let sub = client.subscribe(EventKind::Connected);
        assert!(client.unsubscribe(sub.id()));
    }

    #[test]
    fn test_draw_image_options_default_to_opaque_whole_image() {
        let opts = DrawImageOptions::new(4, 10, 20);
        assert_eq!(opts.alpha, 255);
        assert_eq!((opts.width, opts.src_width), (0, 0));
    }

    #[test]
    fn test_expect_reply_reports_mismatch() {
        let reply = Reply::Monitors(Vec::new());
        let result: Result<WindowPosition, ClientError> = expect_reply!(reply, WindowPosition);
        assert!(matches!(
            result,
            Err(ClientError::UnexpectedReply {
                expected: ReplyKind::WindowPosition,
                actual: ReplyKind::Monitors,
            })
        ));
    }
}
