//! Device backend interface
//!
//! The backend wraps whatever VR runtime the host offers. Calls that would
//! complete asynchronously (device requests, support queries, display
//! enumeration, timers) return immediately; the host later feeds the result
//! back to the controller as a [`SessionEvent`] carrying the same [`Ticket`].

use std::time::Duration;

use vrview_render::{DeviceId, GamepadId, RasterSurface};

use crate::error::SessionError;

/// Which device API the runtime offers, in probe priority order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeviceApi {
    /// Next-generation XR device API
    Xr,
    /// Legacy VR display API
    LegacyVr,
    /// No VR API at all
    #[default]
    None,
}

/// Kind of device a handle refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceKind {
    XrDevice,
    VrDisplay,
}

/// A VR display or XR device reported by the backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceHandle {
    pub id: DeviceId,
    pub kind: DeviceKind,
    pub name: String,
}

impl DeviceHandle {
    pub fn new(id: u32, kind: DeviceKind, name: impl Into<String>) -> Self {
        Self {
            id: DeviceId(id),
            kind,
            name: name.into(),
        }
    }
}

/// Session object handed out by an XR device when presentation starts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(pub u32);

/// Generation stamp of a discovery attempt
///
/// Continuations carrying an outdated ticket are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket(pub u64);

/// Timers the controller can schedule
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timer {
    /// Retry entering after a forced exit
    RetryEnter,
    /// Record the connected gamepads after legacy enumeration
    GamepadScan,
}

/// Results and device notifications delivered to the controller
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// Answer to [`DeviceBackend::request_xr_device`]
    XrDeviceResolved {
        ticket: Ticket,
        result: Result<DeviceHandle, SessionError>,
    },
    /// Answer to [`DeviceBackend::query_immersive_support`]
    XrSupportResolved {
        ticket: Ticket,
        device: DeviceHandle,
        supported: bool,
    },
    /// Answer to [`DeviceBackend::enumerate_displays`]
    DisplaysEnumerated {
        ticket: Ticket,
        result: Result<Vec<DeviceHandle>, SessionError>,
    },
    DisplayConnected(DeviceHandle),
    DisplayDisconnected(DeviceId),
    DisplayPresentChange { device: DeviceId, presenting: bool },
    DisplayActivate(DeviceId),
    GamepadConnected(GamepadId),
    GamepadDisconnected(GamepadId),
    /// A timer from [`DeviceBackend::schedule`] elapsed
    TimerFired { ticket: Ticket, timer: Timer },
    /// Unrecoverable error on a device
    DeviceError { device: DeviceId, message: String },
}

/// Host VR runtime
pub trait DeviceBackend {
    /// Which API is available
    fn probe(&self) -> DeviceApi;

    /// Ask the XR API for a device; answered with [`SessionEvent::XrDeviceResolved`]
    fn request_xr_device(&mut self, ticket: Ticket);

    /// Ask whether `device` supports immersive sessions; answered with
    /// [`SessionEvent::XrSupportResolved`]
    fn query_immersive_support(&mut self, device: &DeviceHandle, ticket: Ticket);

    /// Start delivering legacy display and gamepad events
    fn subscribe_display_events(&mut self);

    fn unsubscribe_display_events(&mut self);

    /// List legacy displays; answered with [`SessionEvent::DisplaysEnumerated`]
    fn enumerate_displays(&mut self, ticket: Ticket);

    /// Whether `device` is currently presenting
    fn is_presenting(&self, device: DeviceId) -> bool;

    /// Start presenting `target` on `device`
    ///
    /// XR devices return the session object that must be ended on exit.
    fn request_present(
        &mut self,
        device: DeviceId,
        target: &dyn RasterSurface,
    ) -> Result<Option<SessionId>, SessionError>;

    fn exit_present(&mut self, device: DeviceId);

    fn end_session(&mut self, session: SessionId);

    /// Fire [`SessionEvent::TimerFired`] after `delay`
    fn schedule(&mut self, delay: Duration, timer: Timer, ticket: Ticket);

    /// Gamepads connected right now
    fn connected_gamepads(&self) -> Vec<GamepadId>;

    /// Displays still presenting, e.g. left over from a previous page
    fn active_displays(&self) -> Vec<DeviceId>;

    /// Show a blocking message to the user
    fn show_message(&mut self, message: &str);
}
