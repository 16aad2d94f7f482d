//! Client-side window bookkeeping.
//!
//! Window ids are minted here, and each window the client creates gets an
//! advisory geometry record.  The compositor is the source of truth: these
//! records only reflect what this client last asked for, and nothing in the
//! protocol path reads them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Client-minted window (buffer) id.  0 is the root window.
pub type WindowId = u32;

/// Client-minted image id.
pub type ImageId = u32;

/// Parameters for [`crate::IcmClient::create_window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowOptions {
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    /// Stacking layer; left to the compositor's default when `None`.
    pub layer: Option<i32>,
}

impl WindowOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            x: 0,
            y: 0,
            layer: None,
        }
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn on_layer(mut self, layer: i32) -> Self {
        self.layer = Some(layer);
        self
    }
}

/// Last requested geometry of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
pub struct WindowRegistry {
    next_id: WindowId,
    windows: HashMap<WindowId, WindowGeometry>,
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self {
            next_id: 1,
            windows: HashMap::new(),
        }
    }
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints the next window id.  Ids start at 1 and are never reused.
    pub fn allocate(&mut self) -> WindowId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    pub fn insert(&mut self, id: WindowId, geometry: WindowGeometry) {
        self.windows.insert(id, geometry);
    }

    pub fn remove(&mut self, id: WindowId) -> Option<WindowGeometry> {
        self.windows.remove(&id)
    }

    pub fn get(&self, id: WindowId) -> Option<WindowGeometry> {
        self.windows.get(&id).copied()
    }

    /// Updates the cached position; unknown windows are ignored.
    pub fn moved(&mut self, id: WindowId, x: i32, y: i32) {
        if let Some(g) = self.windows.get_mut(&id) {
            g.x = x;
            g.y = y;
        }
    }

    /// Updates the cached size; unknown windows are ignored.
    pub fn resized(&mut self, id: WindowId, width: u32, height: u32) {
        if let Some(g) = self.windows.get_mut(&id) {
            g.width = width;
            g.height = height;
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Ids of all known windows, ascending.
    pub fn ids(&self) -> Vec<WindowId> {
        let mut ids: Vec<_> = self.windows.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(x: i32, y: i32, width: u32, height: u32) -> WindowGeometry {
        WindowGeometry {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut reg = WindowRegistry::new();
        assert_eq!(reg.allocate(), 1);
        assert_eq!(reg.allocate(), 2);
        assert_eq!(reg.allocate(), 3);
    }

    #[test]
    fn test_allocation_skips_root_on_wrap() {
        let mut reg = WindowRegistry {
            next_id: u32::MAX,
            windows: HashMap::new(),
        };
        assert_eq!(reg.allocate(), u32::MAX);
        assert_eq!(reg.allocate(), 1);
    }

    #[test]
    fn test_moved_and_resized_update_cache() {
        // Arrange
        let mut reg = WindowRegistry::new();
        let id = reg.allocate();
        reg.insert(id, geometry(0, 0, 100, 100));

        // Act
        reg.moved(id, 30, -5);
        reg.resized(id, 640, 480);

        // Assert
        assert_eq!(reg.get(id), Some(geometry(30, -5, 640, 480)));
    }

    #[test]
    fn test_updates_to_unknown_window_are_ignored() {
        let mut reg = WindowRegistry::new();
        reg.moved(42, 1, 1);
        reg.resized(42, 1, 1);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_remove_forgets_window() {
        let mut reg = WindowRegistry::new();
        reg.insert(7, geometry(0, 0, 1, 1));
        reg.insert(3, geometry(0, 0, 1, 1));
        assert_eq!(reg.ids(), vec![3, 7]);

        assert!(reg.remove(7).is_some());

        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(7), None);
    }

    #[test]
    fn test_window_options_builder() {
        let opts = WindowOptions::new(800, 600).at(10, 20).on_layer(3);
        assert_eq!((opts.x, opts.y, opts.layer), (10, 20, Some(3)));
    }
}
