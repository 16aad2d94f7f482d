//! Binary codec for ICM protocol frames.
//!
//! Wire format:
//! ```text
//! [length:4][type:2][flags:2][sequence:4][num_fds:4][payload:length-16]
//! ```
//! Header size: 16 bytes.  Every multi-byte field, in the header and in
//! payloads, is little-endian.  `length` counts the header itself.
//!
//! Payloads carry no per-field tags: the header's type code selects one fixed
//! layout, and each layout is listed field by field in the helpers below.
//! Decoders check the layout's minimum size up front and read variable tails
//! through their explicit count or length field, so a short or lying payload
//! yields [`ProtocolError::TruncatedPayload`] instead of a panic.

use thiserror::Error;

use crate::protocol::messages::{
    AnimateWindow, AnimationFlags, ClickRegion, ClickRegionEvent, CreateBuffer, DrawCircle,
    DrawLine, DrawPolygon, DrawRect, DrawText, DrawUploadedImage, ExportSurface, Frame,
    FrameHeader, IcmMessage, ImportSurface, KeyboardEvent, MeshTransform, MeshVertex,
    MeshVertexUpdate, MessageType, MonitorInfo, PointerEvent, RegisterKeybind, ScreenCopy,
    ScreenCopyRequest, ScreenDimensions, ToplevelWindow, UploadImage, WindowAttributes,
    WindowCreated, WindowDecorations, WindowEventMask, WindowInfo, WindowLayer, WindowPosition,
    WindowSize, WindowStateChanged, WindowStateFlags, WindowStateInfo, WindowTransform,
    WindowTransform3d, APP_ID_CAPACITY, EQUATION_CAPACITY, HEADER_SIZE, MONITOR_NAME_CAPACITY,
    PROCESS_NAME_CAPACITY, TITLE_CAPACITY,
};
use crate::protocol::wire::{
    put_bool, put_bool32, put_f32, put_i32, put_u16, put_u32, put_zeros, write_fixed_str,
    PayloadReader,
};

/// Size of one monitor record inside MONITORS_DATA.
pub const MONITOR_RECORD_SIZE: usize = 66;

/// Size of one entry inside TOPLEVEL_WINDOWS_DATA.
pub const TOPLEVEL_ENTRY_SIZE: usize = 412;

/// Size of one mesh vertex (four `f32`).
pub const MESH_VERTEX_SIZE: usize = 16;

/// Errors raised while framing or decoding inbound bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The header declares a total length shorter than the header itself.
    /// The stream position is lost and the connection cannot continue.
    #[error("malformed frame: declared length {length} is below the 16-byte header")]
    MalformedFrame { length: u32 },

    /// A payload is shorter than its layout requires.
    #[error("truncated {kind} payload: need at least {needed} bytes, got {available}")]
    TruncatedPayload {
        kind: &'static str,
        needed: usize,
        available: usize,
    },

    /// The header's type code has no entry in the codec table.
    #[error("unknown message type: {0}")]
    UnknownMessageType(u16),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a complete frame: header followed by payload.
///
/// Commands should pass `sequence = 0`; queries pass a fresh value from a
/// [`crate::protocol::SequenceCounter`].
///
/// # Examples
///
/// ```rust
/// use icm_core::protocol::{decode_payload, encode_frame, parse_header, IcmMessage, MessageType};
///
/// let msg = IcmMessage::RaiseWindow { window_id: 9 };
/// let bytes = encode_frame(&msg, 0);
/// let header = parse_header(&bytes).unwrap();
/// assert_eq!(header.length as usize, bytes.len());
/// assert_eq!(header.message_type, MessageType::RaiseWindow as u16);
/// assert_eq!(decode_payload(MessageType::RaiseWindow, &bytes[16..]).unwrap(), msg);
/// ```
pub fn encode_frame(msg: &IcmMessage, sequence: u32) -> Vec<u8> {
    let payload = encode_payload(msg);
    let header = FrameHeader {
        length: (HEADER_SIZE + payload.len()) as u32,
        message_type: msg.message_type() as u16,
        flags: 0,
        sequence,
        num_fds: 0,
    };
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &header);
    buf.extend_from_slice(&payload);
    buf
}

/// Appends the 16-byte encoding of `header` to `buf`.
pub fn write_header(buf: &mut Vec<u8>, header: &FrameHeader) {
    put_u32(buf, header.length);
    put_u16(buf, header.message_type);
    put_u16(buf, header.flags);
    put_u32(buf, header.sequence);
    put_i32(buf, header.num_fds);
}

/// Parses the header at the start of `bytes`.
///
/// Only checks that 16 bytes are present; validating `length` is the
/// stream decoder's job.
pub fn parse_header(bytes: &[u8]) -> Result<FrameHeader, ProtocolError> {
    let mut r = PayloadReader::new(bytes, "FrameHeader", HEADER_SIZE)?;
    Ok(FrameHeader {
        length: r.u32()?,
        message_type: r.u16()?,
        flags: r.u16()?,
        sequence: r.u32()?,
        num_fds: r.i32()?,
    })
}

/// Decodes a frame produced by [`crate::protocol::FrameDecoder`].
///
/// # Errors
///
/// [`ProtocolError::UnknownMessageType`] for a type code outside the table,
/// [`ProtocolError::TruncatedPayload`] for a payload too short for its type.
pub fn decode_frame(frame: &Frame) -> Result<IcmMessage, ProtocolError> {
    let code = frame.header.message_type;
    let msg_type =
        MessageType::try_from(code).map_err(|_| ProtocolError::UnknownMessageType(code))?;
    decode_payload(msg_type, &frame.payload)
}

// ── Payload encoding ──────────────────────────────────────────────────────────

/// Encodes the payload of `msg` without a header.  Never fails.
pub fn encode_payload(msg: &IcmMessage) -> Vec<u8> {
    use IcmMessage as M;
    let mut buf = Vec::new();
    let b = &mut buf;
    match msg {
        M::CreateBuffer(m) => encode_create_buffer(b, m),
        M::DrawRect(m) => encode_draw_rect(b, m),
        M::DrawLine(m) => encode_draw_line(b, m),
        M::DrawCircle(m) => encode_draw_circle(b, m),
        M::DrawPolygon(m) => encode_draw_polygon(b, m),
        M::BatchBegin {
            batch_id,
            expected_commands,
        } => {
            put_u32(b, *batch_id);
            put_u32(b, *expected_commands);
        }
        M::ExportSurface(m) => {
            put_u32(b, m.window_id);
            put_u32(b, m.surface_id);
            put_u32(b, m.flags);
        }
        M::ImportSurface(m) => encode_import_surface(b, m),
        M::UploadImage(m) => encode_upload_image(b, m),
        M::DrawUploadedImage(m) => encode_draw_uploaded_image(b, m),
        M::DrawText(m) => encode_draw_text(b, m),
        M::SetWindowVisible { window_id, visible } => {
            put_u32(b, *window_id);
            put_bool(b, *visible);
        }
        M::RegisterKeybind(m) => {
            put_u32(b, m.keybind_id);
            put_u32(b, m.modifiers);
            put_u32(b, m.keycode);
        }
        M::RegisterClickRegion(m) => encode_click_region(b, m),
        M::SetWindowPosition(m) | M::WindowPositionData(m) => encode_window_position(b, m),
        M::SetWindowSize(m) | M::WindowSizeData(m) => encode_window_size(b, m),
        M::SetWindowOpacity { window_id, opacity } => {
            put_u32(b, *window_id);
            put_f32(b, *opacity);
        }
        M::SetWindowTransform(m) => {
            put_u32(b, m.window_id);
            put_f32(b, m.scale_x);
            put_f32(b, m.scale_y);
            put_f32(b, m.rotation);
        }
        M::SetWindowBlur {
            window_id,
            radius,
            enabled,
        } => {
            put_u32(b, *window_id);
            put_f32(b, *radius);
            put_bool(b, *enabled);
        }
        M::SetScreenEffect { equation, enabled } => {
            write_fixed_str(b, equation, EQUATION_CAPACITY);
            put_bool(b, *enabled);
        }
        M::SetWindowEffect {
            window_id,
            equation,
            enabled,
        } => {
            put_u32(b, *window_id);
            write_fixed_str(b, equation, EQUATION_CAPACITY);
            put_bool(b, *enabled);
        }
        M::SetWindowLayer { window_id, layer } => {
            put_u32(b, *window_id);
            put_i32(b, *layer);
        }
        M::SetWindowParent {
            window_id,
            parent_id,
        } => {
            put_u32(b, *window_id);
            put_u32(b, *parent_id);
        }
        M::SetWindowTransform3d(m) => encode_transform_3d(b, m),
        M::SetWindowMatrix { window_id, matrix } => {
            put_u32(b, *window_id);
            for v in matrix {
                put_f32(b, *v);
            }
        }
        M::SetWindowState { window_id, state } => {
            put_u32(b, *window_id);
            put_u32(b, state.0);
        }
        M::AnimateWindow(m) => encode_animate_window(b, m),
        M::SetWindowMeshTransform(m) => {
            put_u32(b, m.window_id);
            put_u32(b, m.mesh_width);
            put_u32(b, m.mesh_height);
            encode_mesh_vertices(b, &m.vertices);
        }
        M::UpdateWindowMeshVertices(m) => {
            put_u32(b, m.window_id);
            put_u32(b, m.start_index);
            put_u32(b, m.vertices.len() as u32);
            encode_mesh_vertices(b, &m.vertices);
        }
        M::SubscribeWindowEvents { mask } | M::UnsubscribeWindowEvents { mask } => {
            put_u32(b, mask.0)
        }
        M::SetWindowDecorations(m) => encode_window_decorations(b, m),
        M::LaunchApp { command } => {
            let bytes = command.as_bytes();
            put_u32(b, bytes.len() as u32 + 1);
            b.extend_from_slice(bytes);
            b.push(0);
        }

        // Single-id payloads
        M::DestroyBuffer { buffer_id: id }
        | M::BatchEnd { batch_id: id }
        | M::RegisterPointerEvent { window_id: id }
        | M::RegisterKeyboardEvent { window_id: id }
        | M::CaptureMouse { window_id: id }
        | M::CaptureKeyboard { window_id: id }
        | M::DestroyImage { image_id: id }
        | M::UnregisterKeybind { keybind_id: id }
        | M::UnregisterClickRegion { region_id: id }
        | M::RaiseWindow { window_id: id }
        | M::LowerWindow { window_id: id }
        | M::FocusWindow { window_id: id }
        | M::BlurWindow { window_id: id }
        | M::StopAnimation { window_id: id }
        | M::ClearWindowMeshTransform { window_id: id }
        | M::RequestWindowDecorations { window_id: id }
        | M::QueryWindowPosition { window_id: id }
        | M::QueryWindowSize { window_id: id }
        | M::QueryWindowAttributes { window_id: id }
        | M::QueryWindowLayer { window_id: id }
        | M::QueryWindowState { window_id: id }
        | M::QueryWindowInfo { window_id: id }
        | M::KeybindEvent { keybind_id: id }
        | M::WindowDestroyed { window_id: id } => put_u32(b, *id),

        // Empty payloads
        M::RegisterGlobalPointerEvent
        | M::RegisterGlobalKeyboardEvent
        | M::RegisterGlobalCaptureMouse
        | M::RegisterGlobalCaptureKeyboard
        | M::UnregisterGlobalCaptureKeyboard
        | M::UnregisterGlobalCaptureMouse
        | M::QueryScreenDimensions
        | M::QueryMonitors
        | M::CompositorShutdown => {}

        M::RequestScreenCopy(m) => {
            put_u32(b, m.request_id);
            put_u32(b, m.x);
            put_u32(b, m.y);
            put_u32(b, m.width);
            put_u32(b, m.height);
        }
        M::QueryToplevelWindows { visible_only } => put_bool32(b, *visible_only),

        M::WindowAttributesData(m) => {
            put_u32(b, m.window_id);
            put_bool32(b, m.visible);
            put_f32(b, m.opacity);
            put_f32(b, m.scale_x);
            put_f32(b, m.scale_y);
            put_f32(b, m.rotation);
        }
        M::WindowLayerData(m) => {
            put_u32(b, m.window_id);
            put_i32(b, m.layer);
            put_u32(b, m.parent_id);
        }
        M::WindowStateData(m) => {
            put_u32(b, m.window_id);
            put_u32(b, m.state.0);
            put_bool32(b, m.focused);
        }
        M::ScreenDimensionsData(m) => {
            put_u32(b, m.total_width);
            put_u32(b, m.total_height);
            put_f32(b, m.scale);
        }
        M::MonitorsData(monitors) => {
            put_u32(b, monitors.len() as u32);
            for monitor in monitors {
                encode_monitor(b, monitor);
            }
        }
        M::WindowInfoData(m) => encode_window_info(b, m),
        M::ScreenCopyData(m) => {
            put_u32(b, m.request_id);
            put_u32(b, m.width);
            put_u32(b, m.height);
            put_u32(b, m.format);
            put_u32(b, m.data.len() as u32);
            b.extend_from_slice(&m.data);
        }
        M::ToplevelWindowsData(windows) => {
            put_u32(b, windows.len() as u32);
            for window in windows {
                encode_toplevel_window(b, window);
            }
        }

        M::PointerEvent(m) => encode_pointer_event(b, m),
        M::KeyboardEvent(m) => {
            put_u32(b, m.window_id);
            put_u32(b, m.time);
            put_u32(b, m.keycode);
            put_u32(b, m.state);
            put_u32(b, m.modifiers);
        }
        M::WindowCreated(m) => {
            put_u32(b, m.window_id);
            put_u32(b, m.width);
            put_u32(b, m.height);
            put_bool(b, m.decorated);
            put_bool(b, m.focused);
        }
        M::ClickRegionEvent(m) => {
            put_u32(b, m.region_id);
            put_u32(b, m.button);
            put_u32(b, m.state);
        }
        M::WindowTitleChanged { window_id, title } => {
            put_u32(b, *window_id);
            write_fixed_str(b, title, TITLE_CAPACITY);
        }
        M::WindowStateChanged(m) => {
            put_u32(b, m.window_id);
            put_u32(b, m.state.0);
            put_bool(b, m.visible);
            put_bool(b, m.focused);
        }
    }
    buf
}

// ── Payload decoding ──────────────────────────────────────────────────────────

/// Decodes the payload of a frame whose type code is `msg_type`.
///
/// Bytes past the end of the layout are ignored; the server sends some
/// structures with trailing alignment padding.
pub fn decode_payload(msg_type: MessageType, p: &[u8]) -> Result<IcmMessage, ProtocolError> {
    use IcmMessage as M;
    use MessageType as T;
    let msg = match msg_type {
        T::CreateBuffer => M::CreateBuffer(decode_create_buffer(p)?),
        T::DestroyBuffer => M::DestroyBuffer {
            buffer_id: single_id(p, "DestroyBuffer")?,
        },
        T::DrawRect => M::DrawRect(decode_draw_rect(p)?),
        T::DrawLine => M::DrawLine(decode_draw_line(p)?),
        T::DrawCircle => M::DrawCircle(decode_draw_circle(p)?),
        T::DrawPolygon => M::DrawPolygon(decode_draw_polygon(p)?),
        T::BatchBegin => {
            let mut r = PayloadReader::new(p, "BatchBegin", 8)?;
            M::BatchBegin {
                batch_id: r.u32()?,
                expected_commands: r.u32()?,
            }
        }
        T::BatchEnd => M::BatchEnd {
            batch_id: single_id(p, "BatchEnd")?,
        },
        T::ExportSurface => {
            let mut r = PayloadReader::new(p, "ExportSurface", 12)?;
            M::ExportSurface(ExportSurface {
                window_id: r.u32()?,
                surface_id: r.u32()?,
                flags: r.u32()?,
            })
        }
        T::ImportSurface => M::ImportSurface(decode_import_surface(p)?),
        T::RegisterPointerEvent => M::RegisterPointerEvent {
            window_id: single_id(p, "RegisterPointerEvent")?,
        },
        T::RegisterKeyboardEvent => M::RegisterKeyboardEvent {
            window_id: single_id(p, "RegisterKeyboardEvent")?,
        },
        T::QueryCaptureMouse => M::CaptureMouse {
            window_id: single_id(p, "CaptureMouse")?,
        },
        T::QueryCaptureKeyboard => M::CaptureKeyboard {
            window_id: single_id(p, "CaptureKeyboard")?,
        },
        T::UploadImage => M::UploadImage(decode_upload_image(p)?),
        T::DestroyImage => M::DestroyImage {
            image_id: single_id(p, "DestroyImage")?,
        },
        T::DrawUploadedImage => M::DrawUploadedImage(decode_draw_uploaded_image(p)?),
        T::DrawText => M::DrawText(decode_draw_text(p)?),
        T::SetWindowVisible => {
            let mut r = PayloadReader::new(p, "SetWindowVisible", 5)?;
            M::SetWindowVisible {
                window_id: r.u32()?,
                visible: r.bool()?,
            }
        }
        T::RegisterKeybind => {
            let mut r = PayloadReader::new(p, "RegisterKeybind", 12)?;
            M::RegisterKeybind(RegisterKeybind {
                keybind_id: r.u32()?,
                modifiers: r.u32()?,
                keycode: r.u32()?,
            })
        }
        T::UnregisterKeybind => M::UnregisterKeybind {
            keybind_id: single_id(p, "UnregisterKeybind")?,
        },
        T::RegisterClickRegion => M::RegisterClickRegion(decode_click_region(p)?),
        T::UnregisterClickRegion => M::UnregisterClickRegion {
            region_id: single_id(p, "UnregisterClickRegion")?,
        },
        T::RegisterGlobalPointerEvent => M::RegisterGlobalPointerEvent,
        T::RegisterGlobalKeyboardEvent => M::RegisterGlobalKeyboardEvent,
        T::RegisterGlobalCaptureMouse => M::RegisterGlobalCaptureMouse,
        T::RegisterGlobalCaptureKeyboard => M::RegisterGlobalCaptureKeyboard,
        T::UnregisterGlobalCaptureKeyboard => M::UnregisterGlobalCaptureKeyboard,
        T::UnregisterGlobalCaptureMouse => M::UnregisterGlobalCaptureMouse,
        T::SetWindowPosition => {
            M::SetWindowPosition(decode_window_position(p, "SetWindowPosition")?)
        }
        T::SetWindowSize => M::SetWindowSize(decode_window_size(p, "SetWindowSize")?),
        T::SetWindowOpacity => {
            let mut r = PayloadReader::new(p, "SetWindowOpacity", 8)?;
            M::SetWindowOpacity {
                window_id: r.u32()?,
                opacity: r.f32()?,
            }
        }
        T::SetWindowTransform => {
            let mut r = PayloadReader::new(p, "SetWindowTransform", 16)?;
            M::SetWindowTransform(WindowTransform {
                window_id: r.u32()?,
                scale_x: r.f32()?,
                scale_y: r.f32()?,
                rotation: r.f32()?,
            })
        }
        T::SetWindowBlur => {
            let mut r = PayloadReader::new(p, "SetWindowBlur", 9)?;
            M::SetWindowBlur {
                window_id: r.u32()?,
                radius: r.f32()?,
                enabled: r.bool()?,
            }
        }
        T::SetScreenEffect => {
            let mut r = PayloadReader::new(p, "SetScreenEffect", EQUATION_CAPACITY + 1)?;
            M::SetScreenEffect {
                equation: r.fixed_str(EQUATION_CAPACITY)?,
                enabled: r.bool()?,
            }
        }
        T::SetWindowEffect => {
            let mut r = PayloadReader::new(p, "SetWindowEffect", 4 + EQUATION_CAPACITY + 1)?;
            M::SetWindowEffect {
                window_id: r.u32()?,
                equation: r.fixed_str(EQUATION_CAPACITY)?,
                enabled: r.bool()?,
            }
        }
        T::SetWindowLayer => {
            let mut r = PayloadReader::new(p, "SetWindowLayer", 8)?;
            M::SetWindowLayer {
                window_id: r.u32()?,
                layer: r.i32()?,
            }
        }
        T::RaiseWindow => M::RaiseWindow {
            window_id: single_id(p, "RaiseWindow")?,
        },
        T::LowerWindow => M::LowerWindow {
            window_id: single_id(p, "LowerWindow")?,
        },
        T::SetWindowParent => {
            let mut r = PayloadReader::new(p, "SetWindowParent", 8)?;
            M::SetWindowParent {
                window_id: r.u32()?,
                parent_id: r.u32()?,
            }
        }
        T::SetWindowTransform3d => M::SetWindowTransform3d(decode_transform_3d(p)?),
        T::SetWindowMatrix => {
            let mut r = PayloadReader::new(p, "SetWindowMatrix", 68)?;
            let window_id = r.u32()?;
            let mut matrix = [0.0f32; 16];
            for v in matrix.iter_mut() {
                *v = r.f32()?;
            }
            M::SetWindowMatrix { window_id, matrix }
        }
        T::SetWindowState => {
            let mut r = PayloadReader::new(p, "SetWindowState", 8)?;
            M::SetWindowState {
                window_id: r.u32()?,
                state: WindowStateFlags(r.u32()?),
            }
        }
        T::FocusWindow => M::FocusWindow {
            window_id: single_id(p, "FocusWindow")?,
        },
        T::BlurWindow => M::BlurWindow {
            window_id: single_id(p, "BlurWindow")?,
        },
        T::AnimateWindow => M::AnimateWindow(decode_animate_window(p)?),
        T::StopAnimation => M::StopAnimation {
            window_id: single_id(p, "StopAnimation")?,
        },
        T::SetWindowMeshTransform => M::SetWindowMeshTransform(decode_mesh_transform(p)?),
        T::ClearWindowMeshTransform => M::ClearWindowMeshTransform {
            window_id: single_id(p, "ClearWindowMeshTransform")?,
        },
        T::UpdateWindowMeshVertices => M::UpdateWindowMeshVertices(decode_mesh_update(p)?),
        T::SubscribeWindowEvents => M::SubscribeWindowEvents {
            mask: WindowEventMask(single_id(p, "SubscribeWindowEvents")?),
        },
        T::UnsubscribeWindowEvents => M::UnsubscribeWindowEvents {
            mask: WindowEventMask(single_id(p, "UnsubscribeWindowEvents")?),
        },
        T::SetWindowDecorations => M::SetWindowDecorations(decode_window_decorations(p)?),
        T::RequestWindowDecorations => M::RequestWindowDecorations {
            window_id: single_id(p, "RequestWindowDecorations")?,
        },
        T::LaunchApp => {
            let mut r = PayloadReader::new(p, "LaunchApp", 4)?;
            let len = r.u32()? as usize;
            M::LaunchApp {
                command: crate::protocol::wire::read_fixed_str(r.bytes(len)?),
            }
        }

        T::QueryWindowPosition => M::QueryWindowPosition {
            window_id: single_id(p, "QueryWindowPosition")?,
        },
        T::QueryWindowSize => M::QueryWindowSize {
            window_id: single_id(p, "QueryWindowSize")?,
        },
        T::QueryWindowAttributes => M::QueryWindowAttributes {
            window_id: single_id(p, "QueryWindowAttributes")?,
        },
        T::QueryWindowLayer => M::QueryWindowLayer {
            window_id: single_id(p, "QueryWindowLayer")?,
        },
        T::QueryWindowState => M::QueryWindowState {
            window_id: single_id(p, "QueryWindowState")?,
        },
        T::QueryWindowInfo => M::QueryWindowInfo {
            window_id: single_id(p, "QueryWindowInfo")?,
        },
        T::QueryScreenDimensions => M::QueryScreenDimensions,
        T::QueryMonitors => M::QueryMonitors,
        T::RequestScreenCopy => {
            let mut r = PayloadReader::new(p, "RequestScreenCopy", 20)?;
            M::RequestScreenCopy(ScreenCopyRequest {
                request_id: r.u32()?,
                x: r.u32()?,
                y: r.u32()?,
                width: r.u32()?,
                height: r.u32()?,
            })
        }
        T::QueryToplevelWindows => {
            let mut r = PayloadReader::new(p, "QueryToplevelWindows", 4)?;
            M::QueryToplevelWindows {
                visible_only: r.bool32()?,
            }
        }

        T::WindowPositionData => {
            M::WindowPositionData(decode_window_position(p, "WindowPositionData")?)
        }
        T::WindowSizeData => M::WindowSizeData(decode_window_size(p, "WindowSizeData")?),
        T::WindowAttributesData => {
            let mut r = PayloadReader::new(p, "WindowAttributesData", 24)?;
            M::WindowAttributesData(WindowAttributes {
                window_id: r.u32()?,
                visible: r.bool32()?,
                opacity: r.f32()?,
                scale_x: r.f32()?,
                scale_y: r.f32()?,
                rotation: r.f32()?,
            })
        }
        T::WindowLayerData => {
            let mut r = PayloadReader::new(p, "WindowLayerData", 12)?;
            M::WindowLayerData(WindowLayer {
                window_id: r.u32()?,
                layer: r.i32()?,
                parent_id: r.u32()?,
            })
        }
        T::WindowStateData => {
            let mut r = PayloadReader::new(p, "WindowStateData", 12)?;
            M::WindowStateData(WindowStateInfo {
                window_id: r.u32()?,
                state: WindowStateFlags(r.u32()?),
                focused: r.bool32()?,
            })
        }
        T::ScreenDimensionsData => {
            let mut r = PayloadReader::new(p, "ScreenDimensionsData", 12)?;
            M::ScreenDimensionsData(ScreenDimensions {
                total_width: r.u32()?,
                total_height: r.u32()?,
                scale: r.f32()?,
            })
        }
        T::MonitorsData => M::MonitorsData(decode_monitors(p)?),
        T::WindowInfoData => M::WindowInfoData(decode_window_info(p)?),
        T::ScreenCopyData => M::ScreenCopyData(decode_screen_copy(p)?),
        T::ToplevelWindowsData => M::ToplevelWindowsData(decode_toplevel_windows(p)?),

        T::PointerEvent => M::PointerEvent(decode_pointer_event(p)?),
        T::KeyboardEvent => {
            let mut r = PayloadReader::new(p, "KeyboardEvent", 20)?;
            M::KeyboardEvent(KeyboardEvent {
                window_id: r.u32()?,
                time: r.u32()?,
                keycode: r.u32()?,
                state: r.u32()?,
                modifiers: r.u32()?,
            })
        }
        T::KeybindEvent => M::KeybindEvent {
            keybind_id: single_id(p, "KeybindEvent")?,
        },
        T::WindowCreated => {
            let mut r = PayloadReader::new(p, "WindowCreated", 14)?;
            M::WindowCreated(WindowCreated {
                window_id: r.u32()?,
                width: r.u32()?,
                height: r.u32()?,
                decorated: r.bool()?,
                focused: r.bool()?,
            })
        }
        T::WindowDestroyed => M::WindowDestroyed {
            window_id: single_id(p, "WindowDestroyed")?,
        },
        T::ClickRegionEvent => {
            let mut r = PayloadReader::new(p, "ClickRegionEvent", 12)?;
            M::ClickRegionEvent(ClickRegionEvent {
                region_id: r.u32()?,
                button: r.u32()?,
                state: r.u32()?,
            })
        }
        T::CompositorShutdown => M::CompositorShutdown,
        T::WindowTitleChanged => {
            let mut r = PayloadReader::new(p, "WindowTitleChanged", 4 + TITLE_CAPACITY)?;
            M::WindowTitleChanged {
                window_id: r.u32()?,
                title: r.fixed_str(TITLE_CAPACITY)?,
            }
        }
        T::WindowStateChanged => {
            let mut r = PayloadReader::new(p, "WindowStateChanged", 10)?;
            M::WindowStateChanged(WindowStateChanged {
                window_id: r.u32()?,
                state: WindowStateFlags(r.u32()?),
                visible: r.bool()?,
                focused: r.bool()?,
            })
        }
    };
    Ok(msg)
}

// ── Per-message encode helpers ────────────────────────────────────────────────

fn encode_create_buffer(buf: &mut Vec<u8>, m: &CreateBuffer) {
    put_u32(buf, m.buffer_id);
    put_u32(buf, m.width);
    put_u32(buf, m.height);
    put_u32(buf, m.format);
    put_u32(buf, m.usage_flags);
}

fn encode_draw_rect(buf: &mut Vec<u8>, m: &DrawRect) {
    put_u32(buf, m.window_id);
    put_u32(buf, m.x);
    put_u32(buf, m.y);
    put_u32(buf, m.width);
    put_u32(buf, m.height);
    put_u32(buf, m.color_rgba);
}

fn encode_draw_line(buf: &mut Vec<u8>, m: &DrawLine) {
    put_u32(buf, m.window_id);
    put_i32(buf, m.x0);
    put_i32(buf, m.y0);
    put_i32(buf, m.x1);
    put_i32(buf, m.y1);
    put_u32(buf, m.color_rgba);
    put_u32(buf, m.thickness);
}

fn encode_draw_circle(buf: &mut Vec<u8>, m: &DrawCircle) {
    put_u32(buf, m.window_id);
    put_i32(buf, m.cx);
    put_i32(buf, m.cy);
    put_u32(buf, m.radius);
    put_u32(buf, m.color_rgba);
    put_bool32(buf, m.fill);
}

fn encode_draw_polygon(buf: &mut Vec<u8>, m: &DrawPolygon) {
    put_u32(buf, m.window_id);
    put_u32(buf, m.points.len() as u32);
    put_u32(buf, m.color_rgba);
    put_bool32(buf, m.fill);
    for &(x, y) in &m.points {
        put_i32(buf, x);
        put_i32(buf, y);
    }
}

fn encode_import_surface(buf: &mut Vec<u8>, m: &ImportSurface) {
    put_u32(buf, m.surface_id);
    put_u32(buf, m.window_id);
    put_i32(buf, m.x);
    put_i32(buf, m.y);
    put_u32(buf, m.width);
    put_u32(buf, m.height);
}

fn encode_upload_image(buf: &mut Vec<u8>, m: &UploadImage) {
    put_u32(buf, m.image_id);
    put_u32(buf, m.width);
    put_u32(buf, m.height);
    put_u32(buf, m.format);
    put_u32(buf, m.data.len() as u32);
    buf.extend_from_slice(&m.data);
}

fn encode_draw_uploaded_image(buf: &mut Vec<u8>, m: &DrawUploadedImage) {
    put_u32(buf, m.window_id);
    put_u32(buf, m.image_id);
    put_i32(buf, m.x);
    put_i32(buf, m.y);
    put_u32(buf, m.width);
    put_u32(buf, m.height);
    put_u32(buf, m.src_x);
    put_u32(buf, m.src_y);
    put_u32(buf, m.src_width);
    put_u32(buf, m.src_height);
    buf.push(m.alpha);
}

fn encode_draw_text(buf: &mut Vec<u8>, m: &DrawText) {
    put_u32(buf, m.window_id);
    put_i32(buf, m.x);
    put_i32(buf, m.y);
    put_u32(buf, m.color_rgba);
    put_u32(buf, m.font_size);
    buf.extend_from_slice(m.text.as_bytes());
    buf.push(0);
}

fn encode_click_region(buf: &mut Vec<u8>, m: &ClickRegion) {
    put_u32(buf, m.window_id);
    put_u32(buf, m.region_id);
    put_i32(buf, m.x);
    put_i32(buf, m.y);
    put_u32(buf, m.width);
    put_u32(buf, m.height);
}

fn encode_window_position(buf: &mut Vec<u8>, m: &WindowPosition) {
    put_u32(buf, m.window_id);
    put_i32(buf, m.x);
    put_i32(buf, m.y);
}

fn encode_window_size(buf: &mut Vec<u8>, m: &WindowSize) {
    put_u32(buf, m.window_id);
    put_u32(buf, m.width);
    put_u32(buf, m.height);
}

fn encode_transform_3d(buf: &mut Vec<u8>, m: &WindowTransform3d) {
    put_u32(buf, m.window_id);
    for v in m.translate.iter().chain(&m.rotate).chain(&m.scale) {
        put_f32(buf, *v);
    }
}

fn encode_animate_window(buf: &mut Vec<u8>, m: &AnimateWindow) {
    put_u32(buf, m.window_id);
    put_u32(buf, m.duration_ms);
    put_f32(buf, m.x);
    put_f32(buf, m.y);
    put_f32(buf, m.scale_x);
    put_f32(buf, m.scale_y);
    put_f32(buf, m.opacity);
    for v in m.translate.iter().chain(&m.rotate) {
        put_f32(buf, *v);
    }
    put_f32(buf, m.scale_z);
    put_u32(buf, m.flags.0);
}

fn encode_mesh_vertices(buf: &mut Vec<u8>, vertices: &[MeshVertex]) {
    for v in vertices {
        put_f32(buf, v.x);
        put_f32(buf, v.y);
        put_f32(buf, v.u);
        put_f32(buf, v.v);
    }
}

fn encode_window_decorations(buf: &mut Vec<u8>, m: &WindowDecorations) {
    put_u32(buf, m.window_id);
    put_bool(buf, m.server_side);
    put_zeros(buf, 3);
    put_u32(buf, m.title_height);
    put_u32(buf, m.border_width);
    put_u32(buf, m.color_focused);
    put_u32(buf, m.color_unfocused);
}

fn encode_monitor(buf: &mut Vec<u8>, m: &MonitorInfo) {
    put_i32(buf, m.x);
    put_i32(buf, m.y);
    put_u32(buf, m.width);
    put_u32(buf, m.height);
    put_u32(buf, m.physical_width);
    put_u32(buf, m.physical_height);
    put_u32(buf, m.refresh_rate);
    put_f32(buf, m.scale);
    put_bool(buf, m.enabled);
    put_bool(buf, m.primary);
    write_fixed_str(buf, &m.name, MONITOR_NAME_CAPACITY);
}

fn encode_window_info(buf: &mut Vec<u8>, m: &WindowInfo) {
    put_u32(buf, m.window_id);
    put_i32(buf, m.x);
    put_i32(buf, m.y);
    put_u32(buf, m.width);
    put_u32(buf, m.height);
    put_bool(buf, m.visible);
    put_zeros(buf, 3);
    put_f32(buf, m.opacity);
    put_f32(buf, m.scale_x);
    put_f32(buf, m.scale_y);
    put_f32(buf, m.rotation);
    put_i32(buf, m.layer);
    put_u32(buf, m.parent_id);
    put_u32(buf, m.state.0);
    put_bool32(buf, m.focused);
    put_u32(buf, m.pid);
    write_fixed_str(buf, &m.process_name, PROCESS_NAME_CAPACITY);
}

fn encode_toplevel_window(buf: &mut Vec<u8>, m: &ToplevelWindow) {
    put_u32(buf, m.window_id);
    put_i32(buf, m.x);
    put_i32(buf, m.y);
    put_u32(buf, m.width);
    put_u32(buf, m.height);
    put_bool(buf, m.visible);
    put_bool(buf, m.focused);
    put_zeros(buf, 2);
    put_u32(buf, m.state.0);
    write_fixed_str(buf, &m.title, TITLE_CAPACITY);
    write_fixed_str(buf, &m.app_id, APP_ID_CAPACITY);
}

fn encode_pointer_event(buf: &mut Vec<u8>, m: &PointerEvent) {
    put_u32(buf, m.window_id);
    put_u32(buf, m.time);
    put_u32(buf, m.button);
    put_u32(buf, m.state);
    put_i32(buf, m.x);
    put_i32(buf, m.y);
}

// ── Per-message decode helpers ────────────────────────────────────────────────

fn single_id(p: &[u8], kind: &'static str) -> Result<u32, ProtocolError> {
    PayloadReader::new(p, kind, 4)?.u32()
}

fn decode_create_buffer(p: &[u8]) -> Result<CreateBuffer, ProtocolError> {
    let mut r = PayloadReader::new(p, "CreateBuffer", 20)?;
    Ok(CreateBuffer {
        buffer_id: r.u32()?,
        width: r.u32()?,
        height: r.u32()?,
        format: r.u32()?,
        usage_flags: r.u32()?,
    })
}

fn decode_draw_rect(p: &[u8]) -> Result<DrawRect, ProtocolError> {
    let mut r = PayloadReader::new(p, "DrawRect", 24)?;
    Ok(DrawRect {
        window_id: r.u32()?,
        x: r.u32()?,
        y: r.u32()?,
        width: r.u32()?,
        height: r.u32()?,
        color_rgba: r.u32()?,
    })
}

fn decode_draw_line(p: &[u8]) -> Result<DrawLine, ProtocolError> {
    let mut r = PayloadReader::new(p, "DrawLine", 28)?;
    Ok(DrawLine {
        window_id: r.u32()?,
        x0: r.i32()?,
        y0: r.i32()?,
        x1: r.i32()?,
        y1: r.i32()?,
        color_rgba: r.u32()?,
        thickness: r.u32()?,
    })
}

fn decode_draw_circle(p: &[u8]) -> Result<DrawCircle, ProtocolError> {
    let mut r = PayloadReader::new(p, "DrawCircle", 24)?;
    Ok(DrawCircle {
        window_id: r.u32()?,
        cx: r.i32()?,
        cy: r.i32()?,
        radius: r.u32()?,
        color_rgba: r.u32()?,
        fill: r.bool32()?,
    })
}

fn decode_draw_polygon(p: &[u8]) -> Result<DrawPolygon, ProtocolError> {
    let mut r = PayloadReader::new(p, "DrawPolygon", 16)?;
    let window_id = r.u32()?;
    let num_points = r.u32()? as usize;
    let color_rgba = r.u32()?;
    let fill = r.bool32()?;
    let raw = r.records(num_points, 8)?;
    let points = raw
        .chunks_exact(8)
        .map(|c| {
            let mut pr = PayloadReader::new(c, "DrawPolygon.point", 8)?;
            Ok((pr.i32()?, pr.i32()?))
        })
        .collect::<Result<Vec<_>, ProtocolError>>()?;
    Ok(DrawPolygon {
        window_id,
        color_rgba,
        fill,
        points,
    })
}

fn decode_import_surface(p: &[u8]) -> Result<ImportSurface, ProtocolError> {
    let mut r = PayloadReader::new(p, "ImportSurface", 24)?;
    Ok(ImportSurface {
        surface_id: r.u32()?,
        window_id: r.u32()?,
        x: r.i32()?,
        y: r.i32()?,
        width: r.u32()?,
        height: r.u32()?,
    })
}

fn decode_upload_image(p: &[u8]) -> Result<UploadImage, ProtocolError> {
    let mut r = PayloadReader::new(p, "UploadImage", 20)?;
    let image_id = r.u32()?;
    let width = r.u32()?;
    let height = r.u32()?;
    let format = r.u32()?;
    let len = r.u32()? as usize;
    Ok(UploadImage {
        image_id,
        width,
        height,
        format,
        data: r.bytes(len)?.to_vec(),
    })
}

fn decode_draw_uploaded_image(p: &[u8]) -> Result<DrawUploadedImage, ProtocolError> {
    let mut r = PayloadReader::new(p, "DrawUploadedImage", 41)?;
    Ok(DrawUploadedImage {
        window_id: r.u32()?,
        image_id: r.u32()?,
        x: r.i32()?,
        y: r.i32()?,
        width: r.u32()?,
        height: r.u32()?,
        src_x: r.u32()?,
        src_y: r.u32()?,
        src_width: r.u32()?,
        src_height: r.u32()?,
        alpha: r.u8()?,
    })
}

fn decode_draw_text(p: &[u8]) -> Result<DrawText, ProtocolError> {
    let mut r = PayloadReader::new(p, "DrawText", 20)?;
    Ok(DrawText {
        window_id: r.u32()?,
        x: r.i32()?,
        y: r.i32()?,
        color_rgba: r.u32()?,
        font_size: r.u32()?,
        text: crate::protocol::wire::read_fixed_str(r.rest()),
    })
}

fn decode_click_region(p: &[u8]) -> Result<ClickRegion, ProtocolError> {
    let mut r = PayloadReader::new(p, "RegisterClickRegion", 24)?;
    Ok(ClickRegion {
        window_id: r.u32()?,
        region_id: r.u32()?,
        x: r.i32()?,
        y: r.i32()?,
        width: r.u32()?,
        height: r.u32()?,
    })
}

fn decode_window_position(p: &[u8], kind: &'static str) -> Result<WindowPosition, ProtocolError> {
    let mut r = PayloadReader::new(p, kind, 12)?;
    Ok(WindowPosition {
        window_id: r.u32()?,
        x: r.i32()?,
        y: r.i32()?,
    })
}

fn decode_window_size(p: &[u8], kind: &'static str) -> Result<WindowSize, ProtocolError> {
    let mut r = PayloadReader::new(p, kind, 12)?;
    Ok(WindowSize {
        window_id: r.u32()?,
        width: r.u32()?,
        height: r.u32()?,
    })
}

fn read_vec3(r: &mut PayloadReader<'_>) -> Result<[f32; 3], ProtocolError> {
    Ok([r.f32()?, r.f32()?, r.f32()?])
}

fn decode_transform_3d(p: &[u8]) -> Result<WindowTransform3d, ProtocolError> {
    let mut r = PayloadReader::new(p, "SetWindowTransform3d", 40)?;
    Ok(WindowTransform3d {
        window_id: r.u32()?,
        translate: read_vec3(&mut r)?,
        rotate: read_vec3(&mut r)?,
        scale: read_vec3(&mut r)?,
    })
}

fn decode_animate_window(p: &[u8]) -> Result<AnimateWindow, ProtocolError> {
    let mut r = PayloadReader::new(p, "AnimateWindow", 60)?;
    Ok(AnimateWindow {
        window_id: r.u32()?,
        duration_ms: r.u32()?,
        x: r.f32()?,
        y: r.f32()?,
        scale_x: r.f32()?,
        scale_y: r.f32()?,
        opacity: r.f32()?,
        translate: read_vec3(&mut r)?,
        rotate: read_vec3(&mut r)?,
        scale_z: r.f32()?,
        flags: AnimationFlags(r.u32()?),
    })
}

fn decode_mesh_vertices(raw: &[u8]) -> Result<Vec<MeshVertex>, ProtocolError> {
    raw.chunks_exact(MESH_VERTEX_SIZE)
        .map(|c| {
            let mut r = PayloadReader::new(c, "MeshVertex", MESH_VERTEX_SIZE)?;
            Ok(MeshVertex {
                x: r.f32()?,
                y: r.f32()?,
                u: r.f32()?,
                v: r.f32()?,
            })
        })
        .collect()
}

fn decode_mesh_transform(p: &[u8]) -> Result<MeshTransform, ProtocolError> {
    let mut r = PayloadReader::new(p, "SetWindowMeshTransform", 12)?;
    let window_id = r.u32()?;
    let mesh_width = r.u32()?;
    let mesh_height = r.u32()?;
    let count = (mesh_width as usize)
        .checked_mul(mesh_height as usize)
        .unwrap_or(usize::MAX);
    let vertices = decode_mesh_vertices(r.records(count, MESH_VERTEX_SIZE)?)?;
    Ok(MeshTransform {
        window_id,
        mesh_width,
        mesh_height,
        vertices,
    })
}

fn decode_mesh_update(p: &[u8]) -> Result<MeshVertexUpdate, ProtocolError> {
    let mut r = PayloadReader::new(p, "UpdateWindowMeshVertices", 12)?;
    let window_id = r.u32()?;
    let start_index = r.u32()?;
    let count = r.u32()? as usize;
    let vertices = decode_mesh_vertices(r.records(count, MESH_VERTEX_SIZE)?)?;
    Ok(MeshVertexUpdate {
        window_id,
        start_index,
        vertices,
    })
}

fn decode_window_decorations(p: &[u8]) -> Result<WindowDecorations, ProtocolError> {
    let mut r = PayloadReader::new(p, "SetWindowDecorations", 24)?;
    let window_id = r.u32()?;
    let server_side = r.bool()?;
    r.skip(3)?;
    Ok(WindowDecorations {
        window_id,
        server_side,
        title_height: r.u32()?,
        border_width: r.u32()?,
        color_focused: r.u32()?,
        color_unfocused: r.u32()?,
    })
}

fn decode_monitors(p: &[u8]) -> Result<Vec<MonitorInfo>, ProtocolError> {
    let mut r = PayloadReader::new(p, "MonitorsData", 4)?;
    let count = r.u32()? as usize;
    r.records(count, MONITOR_RECORD_SIZE)?
        .chunks_exact(MONITOR_RECORD_SIZE)
        .map(decode_monitor)
        .collect()
}

fn decode_monitor(record: &[u8]) -> Result<MonitorInfo, ProtocolError> {
    let mut r = PayloadReader::new(record, "MonitorInfo", MONITOR_RECORD_SIZE)?;
    Ok(MonitorInfo {
        x: r.i32()?,
        y: r.i32()?,
        width: r.u32()?,
        height: r.u32()?,
        physical_width: r.u32()?,
        physical_height: r.u32()?,
        refresh_rate: r.u32()?,
        scale: r.f32()?,
        enabled: r.bool()?,
        primary: r.bool()?,
        name: r.fixed_str(MONITOR_NAME_CAPACITY)?,
    })
}

fn decode_window_info(p: &[u8]) -> Result<WindowInfo, ProtocolError> {
    // 60 fixed bytes (visible is followed by 3 alignment bytes) + 255 name
    let mut r = PayloadReader::new(p, "WindowInfoData", 60 + PROCESS_NAME_CAPACITY)?;
    let window_id = r.u32()?;
    let x = r.i32()?;
    let y = r.i32()?;
    let width = r.u32()?;
    let height = r.u32()?;
    let visible = r.bool()?;
    r.skip(3)?;
    Ok(WindowInfo {
        window_id,
        x,
        y,
        width,
        height,
        visible,
        opacity: r.f32()?,
        scale_x: r.f32()?,
        scale_y: r.f32()?,
        rotation: r.f32()?,
        layer: r.i32()?,
        parent_id: r.u32()?,
        state: WindowStateFlags(r.u32()?),
        focused: r.bool32()?,
        pid: r.u32()?,
        process_name: r.fixed_str(PROCESS_NAME_CAPACITY)?,
    })
}

fn decode_screen_copy(p: &[u8]) -> Result<ScreenCopy, ProtocolError> {
    let mut r = PayloadReader::new(p, "ScreenCopyData", 20)?;
    let request_id = r.u32()?;
    let width = r.u32()?;
    let height = r.u32()?;
    let format = r.u32()?;
    let len = r.u32()? as usize;
    Ok(ScreenCopy {
        request_id,
        width,
        height,
        format,
        data: r.bytes(len)?.to_vec(),
    })
}

fn decode_toplevel_windows(p: &[u8]) -> Result<Vec<ToplevelWindow>, ProtocolError> {
    let mut r = PayloadReader::new(p, "ToplevelWindowsData", 4)?;
    let count = r.u32()? as usize;
    r.records(count, TOPLEVEL_ENTRY_SIZE)?
        .chunks_exact(TOPLEVEL_ENTRY_SIZE)
        .map(|entry| {
            let mut r = PayloadReader::new(entry, "ToplevelWindow", TOPLEVEL_ENTRY_SIZE)?;
            let window_id = r.u32()?;
            let x = r.i32()?;
            let y = r.i32()?;
            let width = r.u32()?;
            let height = r.u32()?;
            let visible = r.bool()?;
            let focused = r.bool()?;
            r.skip(2)?;
            Ok(ToplevelWindow {
                window_id,
                x,
                y,
                width,
                height,
                visible,
                focused,
                state: WindowStateFlags(r.u32()?),
                title: r.fixed_str(TITLE_CAPACITY)?,
                app_id: r.fixed_str(APP_ID_CAPACITY)?,
            })
        })
        .collect()
}

fn decode_pointer_event(p: &[u8]) -> Result<PointerEvent, ProtocolError> {
    let mut r = PayloadReader::new(p, "PointerEvent", 24)?;
    Ok(PointerEvent {
        window_id: r.u32()?,
        time: r.u32()?,
        button: r.u32()?,
        state: r.u32()?,
        x: r.i32()?,
        y: r.i32()?,
    })
}
