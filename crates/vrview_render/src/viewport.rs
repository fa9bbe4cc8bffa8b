//! Viewport measurement
//!
//! The host container reports its client size and device pixel ratio;
//! [`ViewportSizer::measure`] turns that into [`ViewportMetrics`]. Metrics are
//! derived on every query and never cached.

/// Identifier of a layer appended to a [`Container`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(pub u32);

/// Which surface a layer belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    Raster,
    Overlay,
}

/// The host element the viewer renders into
pub trait Container {
    /// Client width in logical pixels
    fn client_width(&self) -> u32;
    /// Client height in logical pixels
    fn client_height(&self) -> u32;
    /// Physical pixels per logical pixel
    fn device_pixel_ratio(&self) -> f64;
    /// Append a layer stacked at `z_index`
    fn append_layer(&mut self, kind: LayerKind, z_index: i32) -> LayerId;
    /// Remove a previously appended layer; unknown ids are ignored
    fn remove_layer(&mut self, id: LayerId);
    /// Remove every child of the container
    fn clear_children(&mut self);
    /// Number of children currently attached
    fn child_count(&self) -> usize;
    /// Let keyboard events reach the viewer
    fn register_keyboard_passthrough(&mut self);
}

/// Screen orientation of a viewport
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Size of the container at the time of measurement
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportMetrics {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl ViewportMetrics {
    /// Portrait when taller than wide
    pub fn orientation(&self) -> Orientation {
        if self.height > self.width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }

    /// Width over height, or 1.0 for a zero height
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Physical size in device pixels
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width as f64 * self.pixel_ratio).round() as u32,
            (self.height as f64 * self.pixel_ratio).round() as u32,
        )
    }
}

/// Computes [`ViewportMetrics`] from a container
pub struct ViewportSizer;

impl ViewportSizer {
    pub fn measure(container: &dyn Container) -> ViewportMetrics {
        let pixel_ratio = container.device_pixel_ratio();
        ViewportMetrics {
            width: container.client_width(),
            height: container.client_height(),
            pixel_ratio: if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
                pixel_ratio
            } else {
                1.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedContainer {
        width: u32,
        height: u32,
        dpr: f64,
    }

    impl Container for FixedContainer {
        fn client_width(&self) -> u32 {
            self.width
        }
        fn client_height(&self) -> u32 {
            self.height
        }
        fn device_pixel_ratio(&self) -> f64 {
            self.dpr
        }
        fn append_layer(&mut self, _kind: LayerKind, _z_index: i32) -> LayerId {
            LayerId(0)
        }
        fn remove_layer(&mut self, _id: LayerId) {}
        fn clear_children(&mut self) {}
        fn child_count(&self) -> usize {
            0
        }
        fn register_keyboard_passthrough(&mut self) {}
    }

    #[test]
    fn test_measure_reports_container_size() {
        let container = FixedContainer { width: 800, height: 600, dpr: 2.0 };
        let metrics = ViewportSizer::measure(&container);
        assert_eq!(metrics, ViewportMetrics { width: 800, height: 600, pixel_ratio: 2.0 });
        assert_eq!(metrics.orientation(), Orientation::Landscape);
        assert!((metrics.aspect() - 800.0 / 600.0).abs() < 0.0001);
        assert_eq!(metrics.physical_size(), (1600, 1200));
    }

    #[test]
    fn test_zero_extent_yields_zeros() {
        let container = FixedContainer { width: 0, height: 0, dpr: 1.0 };
        let metrics = ViewportSizer::measure(&container);
        assert_eq!(metrics.width, 0);
        assert_eq!(metrics.height, 0);
        assert_eq!(metrics.aspect(), 1.0);
    }

    #[test]
    fn test_portrait() {
        let container = FixedContainer { width: 400, height: 900, dpr: 1.0 };
        assert_eq!(ViewportSizer::measure(&container).orientation(), Orientation::Portrait);
        assert_eq!(Orientation::Portrait.as_str(), "portrait");
    }

    #[test]
    fn test_invalid_pixel_ratio_falls_back() {
        let container = FixedContainer { width: 10, height: 10, dpr: 0.0 };
        assert_eq!(ViewportSizer::measure(&container).pixel_ratio, 1.0);
    }
}
