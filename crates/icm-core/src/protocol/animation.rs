//! Builder for animate-window commands.
//!
//! The wire struct always carries every target; the `flags` word tells the
//! compositor which of them to animate.  [`AnimationTargets`] lets callers
//! name only the targets they care about and derives the flags from that.

use crate::protocol::messages::{AnimateWindow, AnimationFlags};

/// Optional targets for one window animation.
///
/// A flag bit is set when any target of its group is given.  Targets that
/// are absent are sent as neutral values: 0 for position, translation and
/// rotation, 1 for scale and opacity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationTargets {
    pub window_id: u32,
    pub duration_ms: u32,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub scale_x: Option<f32>,
    pub scale_y: Option<f32>,
    pub opacity: Option<f32>,
    pub translate: Option<[f32; 3]>,
    pub rotate: Option<[f32; 3]>,
    pub scale_z: Option<f32>,
}

impl AnimationTargets {
    pub fn new(window_id: u32, duration_ms: u32) -> Self {
        Self {
            window_id,
            duration_ms,
            ..Self::default()
        }
    }

    pub fn position(mut self, x: f32, y: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.scale_x = Some(scale_x);
        self.scale_y = Some(scale_y);
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn translate_3d(mut self, translate: [f32; 3]) -> Self {
        self.translate = Some(translate);
        self
    }

    pub fn rotate_3d(mut self, degrees: [f32; 3]) -> Self {
        self.rotate = Some(degrees);
        self
    }

    pub fn scale_z(mut self, scale_z: f32) -> Self {
        self.scale_z = Some(scale_z);
        self
    }

    /// Resolves defaults and computes the flag word.
    pub fn build(&self) -> AnimateWindow {
        let mut flags = 0;
        if self.x.is_some() || self.y.is_some() {
            flags |= AnimationFlags::POSITION;
        }
        if self.scale_x.is_some() || self.scale_y.is_some() {
            flags |= AnimationFlags::SCALE;
        }
        if self.opacity.is_some() {
            flags |= AnimationFlags::OPACITY;
        }
        if self.translate.is_some() {
            flags |= AnimationFlags::TRANSLATE_3D;
        }
        if self.rotate.is_some() {
            flags |= AnimationFlags::ROTATE_3D;
        }
        if self.scale_z.is_some() {
            flags |= AnimationFlags::SCALE_3D;
        }

        AnimateWindow {
            window_id: self.window_id,
            duration_ms: self.duration_ms,
            x: self.x.unwrap_or(0.0),
            y: self.y.unwrap_or(0.0),
            scale_x: self.scale_x.unwrap_or(1.0),
            scale_y: self.scale_y.unwrap_or(1.0),
            opacity: self.opacity.unwrap_or(1.0),
            translate: self.translate.unwrap_or([0.0; 3]),
            rotate: self.rotate.unwrap_or([0.0; 3]),
            scale_z: self.scale_z.unwrap_or(1.0),
            flags: AnimationFlags(flags),
        }
    }
}
