//! All ICM protocol message types.
//!
//! Every frame on the wire is a 16-byte header followed by a payload whose
//! layout is selected by the header's type code.  The payload structs below
//! mirror those layouts field for field; the byte offsets live in
//! [`crate::protocol::codec`].

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Size of the frame header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Capacity of the process-name field in window-info replies.
pub const PROCESS_NAME_CAPACITY: usize = 255;

/// Capacity of the monitor-name field in monitor records.
pub const MONITOR_NAME_CAPACITY: usize = 32;

/// Capacity of pixel-effect equation fields.
pub const EQUATION_CAPACITY: usize = 256;

/// Capacity of window titles in toplevel entries and title-changed events.
pub const TITLE_CAPACITY: usize = 256;

/// Capacity of application ids in toplevel entries.
pub const APP_ID_CAPACITY: usize = 128;

/// Pixel format passed to create-buffer by the window helpers (`"AR24"`).
pub const FORMAT_ARGB8888: u32 = 0x3432_5241;

/// Identifier of the root window; pointer events carrying it are global.
pub const ROOT_WINDOW: u32 = 0;

// ── Message type codes ────────────────────────────────────────────────────────

/// All message type codes understood by this client.
///
/// Codes the compositor reserves for DMABUF and file-descriptor passing
/// are deliberately absent and decode as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum MessageType {
    DrawRect = 6,
    DrawLine = 10,
    DrawCircle = 11,
    DrawPolygon = 12,
    BatchBegin = 15,
    BatchEnd = 16,
    ExportSurface = 17,
    ImportSurface = 18,
    CreateBuffer = 19,
    DestroyBuffer = 20,
    RegisterPointerEvent = 22,
    RegisterKeyboardEvent = 23,
    QueryCaptureMouse = 24,
    QueryCaptureKeyboard = 25,
    PointerEvent = 26,
    KeyboardEvent = 27,
    UploadImage = 28,
    DestroyImage = 29,
    DrawUploadedImage = 30,
    DrawText = 31,
    SetWindowVisible = 32,
    RegisterKeybind = 33,
    UnregisterKeybind = 34,
    KeybindEvent = 35,
    WindowCreated = 36,
    WindowDestroyed = 37,
    RegisterClickRegion = 38,
    UnregisterClickRegion = 39,
    ClickRegionEvent = 40,
    RequestScreenCopy = 41,
    ScreenCopyData = 42,
    RegisterGlobalPointerEvent = 43,
    RegisterGlobalKeyboardEvent = 44,
    RegisterGlobalCaptureMouse = 45,
    RegisterGlobalCaptureKeyboard = 46,
    SetWindowPosition = 47,
    SetWindowSize = 48,
    SetWindowOpacity = 49,
    SetWindowTransform = 50,
    CompositorShutdown = 51,
    QueryWindowPosition = 52,
    QueryWindowSize = 53,
    QueryWindowAttributes = 54,
    WindowPositionData = 55,
    WindowSizeData = 56,
    WindowAttributesData = 57,
    UnregisterGlobalCaptureKeyboard = 58,
    UnregisterGlobalCaptureMouse = 59,
    SetWindowLayer = 60,
    RaiseWindow = 61,
    LowerWindow = 62,
    SetWindowParent = 63,
    SetWindowTransform3d = 64,
    SetWindowMatrix = 65,
    SetWindowState = 66,
    FocusWindow = 67,
    QueryWindowLayer = 68,
    QueryWindowState = 69,
    WindowLayerData = 70,
    WindowStateData = 71,
    QueryScreenDimensions = 72,
    ScreenDimensionsData = 73,
    QueryMonitors = 74,
    MonitorsData = 75,
    QueryWindowInfo = 76,
    WindowInfoData = 77,
    SetWindowBlur = 78,
    SetScreenEffect = 79,
    SetWindowEffect = 80,
    AnimateWindow = 81,
    StopAnimation = 82,
    BlurWindow = 83,
    SetWindowMeshTransform = 84,
    ClearWindowMeshTransform = 85,
    UpdateWindowMeshVertices = 86,
    QueryToplevelWindows = 87,
    ToplevelWindowsData = 88,
    SubscribeWindowEvents = 89,
    UnsubscribeWindowEvents = 90,
    WindowTitleChanged = 91,
    WindowStateChanged = 92,
    SetWindowDecorations = 93,
    RequestWindowDecorations = 94,
    LaunchApp = 95,
}

impl TryFrom<u16> for MessageType {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, ()> {
        use MessageType::*;
        let t = match value {
            6 => DrawRect,
            10 => DrawLine,
            11 => DrawCircle,
            12 => DrawPolygon,
            15 => BatchBegin,
            16 => BatchEnd,
            17 => ExportSurface,
            18 => ImportSurface,
            19 => CreateBuffer,
            20 => DestroyBuffer,
            22 => RegisterPointerEvent,
            23 => RegisterKeyboardEvent,
            24 => QueryCaptureMouse,
            25 => QueryCaptureKeyboard,
            26 => PointerEvent,
            27 => KeyboardEvent,
            28 => UploadImage,
            29 => DestroyImage,
            30 => DrawUploadedImage,
            31 => DrawText,
            32 => SetWindowVisible,
            33 => RegisterKeybind,
            34 => UnregisterKeybind,
            35 => KeybindEvent,
            36 => WindowCreated,
            37 => WindowDestroyed,
            38 => RegisterClickRegion,
            39 => UnregisterClickRegion,
            40 => ClickRegionEvent,
            41 => RequestScreenCopy,
            42 => ScreenCopyData,
            43 => RegisterGlobalPointerEvent,
            44 => RegisterGlobalKeyboardEvent,
            45 => RegisterGlobalCaptureMouse,
            46 => RegisterGlobalCaptureKeyboard,
            47 => SetWindowPosition,
            48 => SetWindowSize,
            49 => SetWindowOpacity,
            50 => SetWindowTransform,
            51 => CompositorShutdown,
            52 => QueryWindowPosition,
            53 => QueryWindowSize,
            54 => QueryWindowAttributes,
            55 => WindowPositionData,
            56 => WindowSizeData,
            57 => WindowAttributesData,
            58 => UnregisterGlobalCaptureKeyboard,
            59 => UnregisterGlobalCaptureMouse,
            60 => SetWindowLayer,
            61 => RaiseWindow,
            62 => LowerWindow,
            63 => SetWindowParent,
            64 => SetWindowTransform3d,
            65 => SetWindowMatrix,
            66 => SetWindowState,
            67 => FocusWindow,
            68 => QueryWindowLayer,
            69 => QueryWindowState,
            70 => WindowLayerData,
            71 => WindowStateData,
            72 => QueryScreenDimensions,
            73 => ScreenDimensionsData,
            74 => QueryMonitors,
            75 => MonitorsData,
            76 => QueryWindowInfo,
            77 => WindowInfoData,
            78 => SetWindowBlur,
            79 => SetScreenEffect,
            80 => SetWindowEffect,
            81 => AnimateWindow,
            82 => StopAnimation,
            83 => BlurWindow,
            84 => SetWindowMeshTransform,
            85 => ClearWindowMeshTransform,
            86 => UpdateWindowMeshVertices,
            87 => QueryToplevelWindows,
            88 => ToplevelWindowsData,
            89 => SubscribeWindowEvents,
            90 => UnsubscribeWindowEvents,
            91 => WindowTitleChanged,
            92 => WindowStateChanged,
            93 => SetWindowDecorations,
            94 => RequestWindowDecorations,
            95 => LaunchApp,
            _ => return Err(()),
        };
        Ok(t)
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// 16-byte header prepended to every frame on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    /// Total frame length in bytes, header included.
    pub length: u32,
    /// Raw type code; see [`MessageType`].
    pub message_type: u16,
    /// Unused by the current protocol; always 0 on outbound frames.
    pub flags: u16,
    /// Query correlation number; 0 on commands and on unechoed replies.
    pub sequence: u32,
    /// Number of file descriptors passed alongside the frame; always 0 here.
    pub num_fds: i32,
}

impl FrameHeader {
    /// Length of the payload that follows this header.
    ///
    /// Saturates at 0 for a malformed header whose `length` is below
    /// [`HEADER_SIZE`].
    pub fn payload_len(&self) -> usize {
        (self.length as usize).saturating_sub(HEADER_SIZE)
    }
}

/// One complete frame cut from the inbound byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Vec<u8>,
}

// ── Flag words ────────────────────────────────────────────────────────────────

/// Window state bitfield used by set-window-state and the state replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowStateFlags(pub u32);

impl WindowStateFlags {
    pub const MINIMIZED: u32 = 1 << 0;
    pub const MAXIMIZED: u32 = 1 << 1;
    pub const FULLSCREEN: u32 = 1 << 2;
    pub const DECORATED: u32 = 1 << 3;

    pub fn minimized(&self) -> bool {
        self.0 & Self::MINIMIZED != 0
    }

    pub fn maximized(&self) -> bool {
        self.0 & Self::MAXIMIZED != 0
    }

    pub fn fullscreen(&self) -> bool {
        self.0 & Self::FULLSCREEN != 0
    }

    pub fn decorated(&self) -> bool {
        self.0 & Self::DECORATED != 0
    }
}

/// Bitmask selecting which window lifecycle notifications the server sends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowEventMask(pub u32);

impl WindowEventMask {
    pub const CREATED: u32 = 1 << 0;
    pub const DESTROYED: u32 = 1 << 1;
    pub const TITLE: u32 = 1 << 2;
    pub const STATE: u32 = 1 << 3;
    pub const FOCUS: u32 = 1 << 4;

    /// Every notification kind the server knows about.
    pub const ALL: WindowEventMask = WindowEventMask(0x1F);
}

/// Which target groups an animate-window command drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimationFlags(pub u32);

impl AnimationFlags {
    pub const POSITION: u32 = 1 << 0;
    pub const SCALE: u32 = 1 << 1;
    pub const OPACITY: u32 = 1 << 2;
    pub const TRANSLATE_3D: u32 = 1 << 3;
    pub const ROTATE_3D: u32 = 1 << 4;
    pub const SCALE_3D: u32 = 1 << 5;

    pub fn contains(&self, bit: u32) -> bool {
        self.0 & bit == bit
    }
}

/// Stacking layers understood by the compositor, lowest first.
pub mod layer {
    pub const BACKGROUND: i32 = 0;
    pub const BOTTOM: i32 = 1;
    pub const NORMAL: i32 = 2;
    pub const TOP: i32 = 3;
    pub const OVERLAY: i32 = 4;
    pub const CURSOR: i32 = 5;
}

/// Linux input button codes carried by pointer events.
pub mod button {
    pub const LEFT: u32 = 0x110;
    pub const RIGHT: u32 = 0x111;
    pub const MIDDLE: u32 = 0x112;
}

// ── Command payloads ──────────────────────────────────────────────────────────

/// CREATE_BUFFER (19): allocates the drawable surface backing a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBuffer {
    /// Client-minted window id.
    pub buffer_id: u32,
    pub width: u32,
    pub height: u32,
    /// DRM fourcc pixel format.
    pub format: u32,
    pub usage_flags: u32,
}

/// DRAW_RECT (6): fills a rectangle in window-local coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRect {
    pub window_id: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub color_rgba: u32,
}

/// DRAW_LINE (10).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawLine {
    pub window_id: u32,
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    pub color_rgba: u32,
    pub thickness: u32,
}

/// DRAW_CIRCLE (11).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawCircle {
    pub window_id: u32,
    pub cx: i32,
    pub cy: i32,
    pub radius: u32,
    pub color_rgba: u32,
    /// `false` draws the outline only.
    pub fill: bool,
}

/// DRAW_POLYGON (12): the point count on the wire is `points.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawPolygon {
    pub window_id: u32,
    pub color_rgba: u32,
    pub fill: bool,
    pub points: Vec<(i32, i32)>,
}

/// EXPORT_SURFACE (17): publishes a window as a nestable surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSurface {
    pub window_id: u32,
    pub surface_id: u32,
    pub flags: u32,
}

/// IMPORT_SURFACE (18): places an exported surface inside another window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSurface {
    pub surface_id: u32,
    pub window_id: u32,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// UPLOAD_IMAGE (28): hands raw pixel data to the server under `image_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadImage {
    pub image_id: u32,
    pub width: u32,
    pub height: u32,
    /// 0 = RGBA.
    pub format: u32,
    pub data: Vec<u8>,
}

/// DRAW_UPLOADED_IMAGE (30): blits a region of an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawUploadedImage {
    pub window_id: u32,
    pub image_id: u32,
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

/// DRAW_TEXT (31).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawText {
    pub window_id: u32,
    pub x: i32,
    pub y: i32,
    pub color_rgba: u32,
    pub font_size: u32,
    pub text: String,
}

/// REGISTER_KEYBIND (33).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterKeybind {
    pub keybind_id: u32,
    pub modifiers: u32,
    pub keycode: u32,
}

/// REGISTER_CLICK_REGION (38): a hit-test rectangle reported via click-region events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickRegion {
    pub window_id: u32,
    pub region_id: u32,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// SET_WINDOW_TRANSFORM (50): 2-D scale and rotation (degrees).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowTransform {
    pub window_id: u32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub rotation: f32,
}

/// SET_WINDOW_TRANSFORM_3D (64).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowTransform3d {
    pub window_id: u32,
    pub translate: [f32; 3],
    /// Degrees around each axis.
    pub rotate: [f32; 3],
    pub scale: [f32; 3],
}

/// ANIMATE_WINDOW (81).  Build with [`crate::protocol::AnimationTargets`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimateWindow {
    pub window_id: u32,
    pub duration_ms: u32,
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub opacity: f32,
    pub translate: [f32; 3],
    pub rotate: [f32; 3],
    pub scale_z: f32,
    pub flags: AnimationFlags,
}

/// One vertex of a window deformation mesh, all coordinates normalised to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshVertex {
    pub x: f32,
    pub y: f32,
    pub u: f32,
    pub v: f32,
}

/// SET_WINDOW_MESH_TRANSFORM (84): `vertices` holds `mesh_width * mesh_height` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshTransform {
    pub window_id: u32,
    pub mesh_width: u32,
    pub mesh_height: u32,
    pub vertices: Vec<MeshVertex>,
}

/// UPDATE_WINDOW_MESH_VERTICES (86).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshVertexUpdate {
    pub window_id: u32,
    pub start_index: u32,
    pub vertices: Vec<MeshVertex>,
}

/// SET_WINDOW_DECORATIONS (93).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDecorations {
    pub window_id: u32,
    pub server_side: bool,
    pub title_height: u32,
    pub border_width: u32,
    pub color_focused: u32,
    pub color_unfocused: u32,
}

/// REQUEST_SCREEN_COPY (41).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenCopyRequest {
    pub request_id: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

// ── Reply payloads ────────────────────────────────────────────────────────────

/// Window position; also the payload of SET_WINDOW_POSITION (47).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPosition {
    pub window_id: u32,
    pub x: i32,
    pub y: i32,
}

/// Window size; also the payload of SET_WINDOW_SIZE (48).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub window_id: u32,
    pub width: u32,
    pub height: u32,
}

/// WINDOW_ATTRIBUTES_DATA (57).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAttributes {
    pub window_id: u32,
    pub visible: bool,
    pub opacity: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub rotation: f32,
}

/// WINDOW_LAYER_DATA (70).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowLayer {
    pub window_id: u32,
    pub layer: i32,
    /// 0 when the window is parented to the root.
    pub parent_id: u32,
}

/// WINDOW_STATE_DATA (71).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowStateInfo {
    pub window_id: u32,
    pub state: WindowStateFlags,
    pub focused: bool,
}

/// SCREEN_DIMENSIONS_DATA (73): the bounding box of all monitors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenDimensions {
    pub total_width: u32,
    pub total_height: u32,
    pub scale: f32,
}

/// One 66-byte record of MONITORS_DATA (75).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorInfo {
    /// Position on the virtual screen.
    pub x: i32,
    pub y: i32,
    /// Dimensions in pixels.
    pub width: u32,
    pub height: u32,
    /// Physical size in millimetres.
    pub physical_width: u32,
    pub physical_height: u32,
    /// Refresh rate in mHz (60000 for 60 Hz).
    pub refresh_rate: u32,
    pub scale: f32,
    pub enabled: bool,
    pub primary: bool,
    /// Connector name, at most [`MONITOR_NAME_CAPACITY`] bytes on the wire.
    pub name: String,
}

/// WINDOW_INFO_DATA (77).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub window_id: u32,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub visible: bool,
    pub opacity: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub rotation: f32,
    pub layer: i32,
    pub parent_id: u32,
    pub state: WindowStateFlags,
    pub focused: bool,
    /// Process id of the owning application.
    pub pid: u32,
    pub process_name: String,
}

/// SCREEN_COPY_DATA (42).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenCopy {
    pub request_id: u32,
    pub width: u32,
    pub height: u32,
    pub format: u32,
    pub data: Vec<u8>,
}

/// One 412-byte entry of TOPLEVEL_WINDOWS_DATA (88).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToplevelWindow {
    pub window_id: u32,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub visible: bool,
    pub focused: bool,
    pub state: WindowStateFlags,
    pub title: String,
    pub app_id: String,
}

// ── Event payloads ────────────────────────────────────────────────────────────

/// POINTER_EVENT (26): motion or a button transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// [`ROOT_WINDOW`] for global pointer events.
    pub window_id: u32,
    /// Milliseconds, compositor clock.
    pub time: u32,
    /// Linux button code (see [`button`]); 0 for pure motion.
    pub button: u32,
    /// 1 = pressed, 0 = released.
    pub state: u32,
    pub x: i32,
    pub y: i32,
}

/// KEYBOARD_EVENT (27).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardEvent {
    pub window_id: u32,
    pub time: u32,
    pub keycode: u32,
    pub state: u32,
    pub modifiers: u32,
}

/// WINDOW_CREATED (36).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCreated {
    pub window_id: u32,
    pub width: u32,
    pub height: u32,
    pub decorated: bool,
    pub focused: bool,
}

/// CLICK_REGION_EVENT (40).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickRegionEvent {
    pub region_id: u32,
    pub button: u32,
    pub state: u32,
}

/// WINDOW_STATE_CHANGED (92).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowStateChanged {
    pub window_id: u32,
    pub state: WindowStateFlags,
    pub visible: bool,
    pub focused: bool,
}

// ── Reply kinds ───────────────────────────────────────────────────────────────

/// The server frames that answer a query.  Pending queries are keyed by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplyKind {
    WindowPosition,
    WindowSize,
    WindowAttributes,
    WindowLayer,
    WindowState,
    ScreenDimensions,
    Monitors,
    WindowInfo,
    ScreenCopy,
    ToplevelWindows,
}

impl ReplyKind {
    /// Type code of the reply frame.
    pub fn message_type(self) -> MessageType {
        match self {
            ReplyKind::WindowPosition => MessageType::WindowPositionData,
            ReplyKind::WindowSize => MessageType::WindowSizeData,
            ReplyKind::WindowAttributes => MessageType::WindowAttributesData,
            ReplyKind::WindowLayer => MessageType::WindowLayerData,
            ReplyKind::WindowState => MessageType::WindowStateData,
            ReplyKind::ScreenDimensions => MessageType::ScreenDimensionsData,
            ReplyKind::Monitors => MessageType::MonitorsData,
            ReplyKind::WindowInfo => MessageType::WindowInfoData,
            ReplyKind::ScreenCopy => MessageType::ScreenCopyData,
            ReplyKind::ToplevelWindows => MessageType::ToplevelWindowsData,
        }
    }

    /// Returns the reply kind carried by frames of `message_type`, if any.
    pub fn from_message_type(message_type: MessageType) -> Option<ReplyKind> {
        let kind = match message_type {
            MessageType::WindowPositionData => ReplyKind::WindowPosition,
            MessageType::WindowSizeData => ReplyKind::WindowSize,
            MessageType::WindowAttributesData => ReplyKind::WindowAttributes,
            MessageType::WindowLayerData => ReplyKind::WindowLayer,
            MessageType::WindowStateData => ReplyKind::WindowState,
            MessageType::ScreenDimensionsData => ReplyKind::ScreenDimensions,
            MessageType::MonitorsData => ReplyKind::Monitors,
            MessageType::WindowInfoData => ReplyKind::WindowInfo,
            MessageType::ScreenCopyData => ReplyKind::ScreenCopy,
            MessageType::ToplevelWindowsData => ReplyKind::ToplevelWindows,
            _ => return None,
        };
        Some(kind)
    }
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// Every ICM protocol message, in both directions.
///
/// Variants are grouped by family: commands and queries travel client to
/// server, replies and events travel server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IcmMessage {
    // Commands
    CreateBuffer(CreateBuffer),
    DestroyBuffer { buffer_id: u32 },
    DrawRect(DrawRect),
    DrawLine(DrawLine),
    DrawCircle(DrawCircle),
    DrawPolygon(DrawPolygon),
    BatchBegin { batch_id: u32, expected_commands: u32 },
    BatchEnd { batch_id: u32 },
    ExportSurface(ExportSurface),
    ImportSurface(ImportSurface),
    RegisterPointerEvent { window_id: u32 },
    RegisterKeyboardEvent { window_id: u32 },
    CaptureMouse { window_id: u32 },
    CaptureKeyboard { window_id: u32 },
    UploadImage(UploadImage),
    DestroyImage { image_id: u32 },
    DrawUploadedImage(DrawUploadedImage),
    DrawText(DrawText),
    SetWindowVisible { window_id: u32, visible: bool },
    RegisterKeybind(RegisterKeybind),
    UnregisterKeybind { keybind_id: u32 },
    RegisterClickRegion(ClickRegion),
    UnregisterClickRegion { region_id: u32 },
    RegisterGlobalPointerEvent,
    RegisterGlobalKeyboardEvent,
    RegisterGlobalCaptureMouse,
    RegisterGlobalCaptureKeyboard,
    UnregisterGlobalCaptureKeyboard,
    UnregisterGlobalCaptureMouse,
    SetWindowPosition(WindowPosition),
    SetWindowSize(WindowSize),
    SetWindowOpacity { window_id: u32, opacity: f32 },
    SetWindowTransform(WindowTransform),
    SetWindowBlur { window_id: u32, radius: f32, enabled: bool },
    SetScreenEffect { equation: String, enabled: bool },
    SetWindowEffect { window_id: u32, equation: String, enabled: bool },
    SetWindowLayer { window_id: u32, layer: i32 },
    RaiseWindow { window_id: u32 },
    LowerWindow { window_id: u32 },
    SetWindowParent { window_id: u32, parent_id: u32 },
    SetWindowTransform3d(WindowTransform3d),
    SetWindowMatrix { window_id: u32, matrix: [f32; 16] },
    SetWindowState { window_id: u32, state: WindowStateFlags },
    FocusWindow { window_id: u32 },
    BlurWindow { window_id: u32 },
    AnimateWindow(AnimateWindow),
    StopAnimation { window_id: u32 },
    SetWindowMeshTransform(MeshTransform),
    ClearWindowMeshTransform { window_id: u32 },
    UpdateWindowMeshVertices(MeshVertexUpdate),
    SubscribeWindowEvents { mask: WindowEventMask },
    UnsubscribeWindowEvents { mask: WindowEventMask },
    SetWindowDecorations(WindowDecorations),
    RequestWindowDecorations { window_id: u32 },
    LaunchApp { command: String },

    // Queries
    QueryWindowPosition { window_id: u32 },
    QueryWindowSize { window_id: u32 },
    QueryWindowAttributes { window_id: u32 },
    QueryWindowLayer { window_id: u32 },
    QueryWindowState { window_id: u32 },
    QueryWindowInfo { window_id: u32 },
    QueryScreenDimensions,
    QueryMonitors,
    RequestScreenCopy(ScreenCopyRequest),
    QueryToplevelWindows { visible_only: bool },

    // Replies
    WindowPositionData(WindowPosition),
    WindowSizeData(WindowSize),
    WindowAttributesData(WindowAttributes),
    WindowLayerData(WindowLayer),
    WindowStateData(WindowStateInfo),
    ScreenDimensionsData(ScreenDimensions),
    MonitorsData(Vec<MonitorInfo>),
    WindowInfoData(WindowInfo),
    ScreenCopyData(ScreenCopy),
    ToplevelWindowsData(Vec<ToplevelWindow>),

    // Events
    PointerEvent(PointerEvent),
    KeyboardEvent(KeyboardEvent),
    KeybindEvent { keybind_id: u32 },
    WindowCreated(WindowCreated),
    WindowDestroyed { window_id: u32 },
    ClickRegionEvent(ClickRegionEvent),
    CompositorShutdown,
    WindowTitleChanged { window_id: u32, title: String },
    WindowStateChanged(WindowStateChanged),
}

impl IcmMessage {
    /// Returns the [`MessageType`] code for this message.
    pub fn message_type(&self) -> MessageType {
        use IcmMessage as M;
        match self {
            M::CreateBuffer(_) => MessageType::CreateBuffer,
            M::DestroyBuffer { .. } => MessageType::DestroyBuffer,
            M::DrawRect(_) => MessageType::DrawRect,
            M::DrawLine(_) => MessageType::DrawLine,
            M::DrawCircle(_) => MessageType::DrawCircle,
            M::DrawPolygon(_) => MessageType::DrawPolygon,
            M::BatchBegin { .. } => MessageType::BatchBegin,
            M::BatchEnd { .. } => MessageType::BatchEnd,
            M::ExportSurface(_) => MessageType::ExportSurface,
            M::ImportSurface(_) => MessageType::ImportSurface,
            M::RegisterPointerEvent { .. } => MessageType::RegisterPointerEvent,
            M::RegisterKeyboardEvent { .. } => MessageType::RegisterKeyboardEvent,
            M::CaptureMouse { .. } => MessageType::QueryCaptureMouse,
            M::CaptureKeyboard { .. } => MessageType::QueryCaptureKeyboard,
            M::UploadImage(_) => MessageType::UploadImage,
            M::DestroyImage { .. } => MessageType::DestroyImage,
            M::DrawUploadedImage(_) => MessageType::DrawUploadedImage,
            M::DrawText(_) => MessageType::DrawText,
            M::SetWindowVisible { .. } => MessageType::SetWindowVisible,
            M::RegisterKeybind(_) => MessageType::RegisterKeybind,
            M::UnregisterKeybind { .. } => MessageType::UnregisterKeybind,
            M::RegisterClickRegion(_) => MessageType::RegisterClickRegion,
            M::UnregisterClickRegion { .. } => MessageType::UnregisterClickRegion,
            M::RegisterGlobalPointerEvent => MessageType::RegisterGlobalPointerEvent,
            M::RegisterGlobalKeyboardEvent => MessageType::RegisterGlobalKeyboardEvent,
            M::RegisterGlobalCaptureMouse => MessageType::RegisterGlobalCaptureMouse,
            M::RegisterGlobalCaptureKeyboard => MessageType::RegisterGlobalCaptureKeyboard,
            M::UnregisterGlobalCaptureKeyboard => MessageType::UnregisterGlobalCaptureKeyboard,
            M::UnregisterGlobalCaptureMouse => MessageType::UnregisterGlobalCaptureMouse,
            M::SetWindowPosition(_) => MessageType::SetWindowPosition,
            M::SetWindowSize(_) => MessageType::SetWindowSize,
            M::SetWindowOpacity { .. } => MessageType::SetWindowOpacity,
            M::SetWindowTransform(_) => MessageType::SetWindowTransform,
            M::SetWindowBlur { .. } => MessageType::SetWindowBlur,
            M::SetScreenEffect { .. } => MessageType::SetScreenEffect,
            M::SetWindowEffect { .. } => MessageType::SetWindowEffect,
            M::SetWindowLayer { .. } => MessageType::SetWindowLayer,
            M::RaiseWindow { .. } => MessageType::RaiseWindow,
            M::LowerWindow { .. } => MessageType::LowerWindow,
            M::SetWindowParent { .. } => MessageType::SetWindowParent,
            M::SetWindowTransform3d(_) => MessageType::SetWindowTransform3d,
            M::SetWindowMatrix { .. } => MessageType::SetWindowMatrix,
            M::SetWindowState { .. } => MessageType::SetWindowState,
            M::FocusWindow { .. } => MessageType::FocusWindow,
            M::BlurWindow { .. } => MessageType::BlurWindow,
            M::AnimateWindow(_) => MessageType::AnimateWindow,
            M::StopAnimation { .. } => MessageType::StopAnimation,
            M::SetWindowMeshTransform(_) => MessageType::SetWindowMeshTransform,
            M::ClearWindowMeshTransform { .. } => MessageType::ClearWindowMeshTransform,
            M::UpdateWindowMeshVertices(_) => MessageType::UpdateWindowMeshVertices,
            M::SubscribeWindowEvents { .. } => MessageType::SubscribeWindowEvents,
            M::UnsubscribeWindowEvents { .. } => MessageType::UnsubscribeWindowEvents,
            M::SetWindowDecorations(_) => MessageType::SetWindowDecorations,
            M::RequestWindowDecorations { .. } => MessageType::RequestWindowDecorations,
            M::LaunchApp { .. } => MessageType::LaunchApp,
            M::QueryWindowPosition { .. } => MessageType::QueryWindowPosition,
            M::QueryWindowSize { .. } => MessageType::QueryWindowSize,
            M::QueryWindowAttributes { .. } => MessageType::QueryWindowAttributes,
            M::QueryWindowLayer { .. } => MessageType::QueryWindowLayer,
            M::QueryWindowState { .. } => MessageType::QueryWindowState,
            M::QueryWindowInfo { .. } => MessageType::QueryWindowInfo,
            M::QueryScreenDimensions => MessageType::QueryScreenDimensions,
            M::QueryMonitors => MessageType::QueryMonitors,
            M::RequestScreenCopy(_) => MessageType::RequestScreenCopy,
            M::QueryToplevelWindows { .. } => MessageType::QueryToplevelWindows,
            M::WindowPositionData(_) => MessageType::WindowPositionData,
            M::WindowSizeData(_) => MessageType::WindowSizeData,
            M::WindowAttributesData(_) => MessageType::WindowAttributesData,
            M::WindowLayerData(_) => MessageType::WindowLayerData,
            M::WindowStateData(_) => MessageType::WindowStateData,
            M::ScreenDimensionsData(_) => MessageType::ScreenDimensionsData,
            M::MonitorsData(_) => MessageType::MonitorsData,
            M::WindowInfoData(_) => MessageType::WindowInfoData,
            M::ScreenCopyData(_) => MessageType::ScreenCopyData,
            M::ToplevelWindowsData(_) => MessageType::ToplevelWindowsData,
            M::PointerEvent(_) => MessageType::PointerEvent,
            M::KeyboardEvent(_) => MessageType::KeyboardEvent,
            M::KeybindEvent { .. } => MessageType::KeybindEvent,
            M::WindowCreated(_) => MessageType::WindowCreated,
            M::WindowDestroyed { .. } => MessageType::WindowDestroyed,
            M::ClickRegionEvent(_) => MessageType::ClickRegionEvent,
            M::CompositorShutdown => MessageType::CompositorShutdown,
            M::WindowTitleChanged { .. } => MessageType::WindowTitleChanged,
            M::WindowStateChanged(_) => MessageType::WindowStateChanged,
        }
    }

    /// For a query, the reply kind that answers it.  `None` for every other family.
    pub fn expected_reply(&self) -> Option<ReplyKind> {
        use IcmMessage as M;
        let kind = match self {
            M::QueryWindowPosition { .. } => ReplyKind::WindowPosition,
            M::QueryWindowSize { .. } => ReplyKind::WindowSize,
            M::QueryWindowAttributes { .. } => ReplyKind::WindowAttributes,
            M::QueryWindowLayer { .. } => ReplyKind::WindowLayer,
            M::QueryWindowState { .. } => ReplyKind::WindowState,
            M::QueryWindowInfo { .. } => ReplyKind::WindowInfo,
            M::QueryScreenDimensions => ReplyKind::ScreenDimensions,
            M::QueryMonitors => ReplyKind::Monitors,
            M::RequestScreenCopy(_) => ReplyKind::ScreenCopy,
            M::QueryToplevelWindows { .. } => ReplyKind::ToplevelWindows,
            _ => return None,
        };
        Some(kind)
    }
}
