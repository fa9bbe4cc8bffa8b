//! Window-backed container
//!
//! The window plays the part of the host element: its inner size is the
//! client size and its scale factor is the device pixel ratio. Layers are
//! bookkeeping only, since the window has a single swapchain.

use std::sync::Arc;
use winit::window::Window;

use vrview_render::{Container, LayerId, LayerKind};

/// Container for the display, backed by a winit window
pub struct WindowContainer {
    window: Arc<Window>,
    layers: Vec<(LayerId, LayerKind, i32)>,
    next_layer: u32,
    keyboard_passthrough: bool,
}

impl WindowContainer {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            layers: Vec::new(),
            next_layer: 0,
            keyboard_passthrough: false,
        }
    }

    /// Layers in stacking order, lowest first
    pub fn layers(&self) -> Vec<(LayerId, LayerKind, i32)> {
        let mut layers = self.layers.clone();
        layers.sort_by_key(|(_, _, z)| *z);
        layers
    }

    pub fn keyboard_passthrough(&self) -> bool {
        self.keyboard_passthrough
    }

    fn logical_size(&self) -> (u32, u32) {
        let logical = self
            .window
            .inner_size()
            .to_logical::<f64>(self.window.scale_factor());
        (logical.width.round() as u32, logical.height.round() as u32)
    }
}

impl Container for WindowContainer {
    fn client_width(&self) -> u32 {
        self.logical_size().0
    }

    fn client_height(&self) -> u32 {
        self.logical_size().1
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
    }

    fn append_layer(&mut self, kind: LayerKind, z_index: i32) -> LayerId {
        self.next_layer += 1;
        let id = LayerId(self.next_layer);
        self.layers.push((id, kind, z_index));
        log::debug!("Layer {:?} ({:?}) appended at z={}", id, kind, z_index);
        id
    }

    fn remove_layer(&mut self, id: LayerId) {
        self.layers.retain(|(layer, _, _)| *layer != id);
    }

    fn clear_children(&mut self) {
        self.layers.clear();
    }

    fn child_count(&self) -> usize {
        self.layers.len()
    }

    fn register_keyboard_passthrough(&mut self) {
        // winit already routes key events to the application handler
        self.keyboard_passthrough = true;
    }
}
