//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`VRV_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::Path;
use std::time::Duration;

use vrview_math::Vec3;
use vrview_render::{ReferenceSpace, VIGNETTE_DARKNESS, VIGNETTE_OFFSET};
use vrview_xr::SessionConfig;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Window configuration
    #[serde(default)]
    pub window: WindowConfig,
    /// Camera configuration
    #[serde(default)]
    pub camera: CameraConfig,
    /// Display (surfaces and scene content)
    #[serde(default)]
    pub display: DisplayConfig,
    /// Post-processing
    #[serde(default)]
    pub effects: EffectsConfig,
    /// VR session behaviour
    #[serde(default)]
    pub vr: VrConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // VRV_VR__MAX_ENTER_ATTEMPTS=5 -> vr.max_enter_attempts = 5
        figment = figment.merge(Env::prefixed("VRV_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Start in fullscreen mode
    pub fullscreen: bool,
    /// Enable VSync
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "vrview".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Starting position [x, y, z]
    pub start_position: [f32; 3],
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start_position: [0.0, 1.6, 3.0],
            fov: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraConfig {
    pub fn start_position(&self) -> Vec3 {
        let [x, y, z] = self.start_position;
        Vec3::new(x, y, z)
    }
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Raster clear colour [r, g, b, a]
    pub clear_color: [f32; 4],
    /// Scene file loaded at start-up
    pub scene_path: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            scene_path: "scenes/demo.ron".to_string(),
        }
    }
}

/// Post-processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Build the effect chain on start-up
    pub enabled: bool,
    pub vignette_offset: f32,
    pub vignette_darkness: f32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            vignette_offset: VIGNETTE_OFFSET,
            vignette_darkness: VIGNETTE_DARKNESS,
        }
    }
}

/// VR session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VrConfig {
    /// Allow entering VR at all
    pub enabled: bool,
    /// Enter presentation as soon as a device is found
    pub auto_enter: bool,
    /// Enter attempts while the device claims to be presenting already
    pub max_enter_attempts: u32,
    /// Wait between a forced exit and the retry, in milliseconds
    pub retry_delay_ms: u64,
    /// Wait before scanning for gamepads, in milliseconds
    pub gamepad_scan_delay_ms: u64,
    pub reference_space: ReferenceSpace,
}

impl Default for VrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_enter: true,
            max_enter_attempts: 3,
            retry_delay_ms: 1000,
            gamepad_scan_delay_ms: 1000,
            reference_space: ReferenceSpace::LocalFloor,
        }
    }
}

impl VrConfig {
    /// Convert to the session controller's settings
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            enabled: self.enabled,
            auto_enter: self.auto_enter,
            max_enter_attempts: self.max_enter_attempts.max(1),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            gamepad_scan_delay: Duration::from_millis(self.gamepad_scan_delay_ms),
            reference_space: self.reference_space,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log frame timings
    pub show_stats: bool,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_stats: false,
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}
