//! Backend for hosts without any VR runtime

use std::time::Duration;

use vrview_render::{DeviceId, GamepadId, RasterSurface};

use crate::device::{DeviceApi, DeviceBackend, DeviceHandle, SessionId, Ticket, Timer};
use crate::error::SessionError;

/// Reports [`DeviceApi::None`] and routes user messages to the log
#[derive(Debug, Default)]
pub struct UnsupportedBackend;

impl UnsupportedBackend {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceBackend for UnsupportedBackend {
    fn probe(&self) -> DeviceApi {
        DeviceApi::None
    }

    fn request_xr_device(&mut self, _ticket: Ticket) {}

    fn query_immersive_support(&mut self, _device: &DeviceHandle, _ticket: Ticket) {}

    fn subscribe_display_events(&mut self) {}

    fn unsubscribe_display_events(&mut self) {}

    fn enumerate_displays(&mut self, _ticket: Ticket) {}

    fn is_presenting(&self, _device: DeviceId) -> bool {
        false
    }

    fn request_present(
        &mut self,
        _device: DeviceId,
        _target: &dyn RasterSurface,
    ) -> Result<Option<SessionId>, SessionError> {
        Err(SessionError::NoVrSupport)
    }

    fn exit_present(&mut self, _device: DeviceId) {}

    fn end_session(&mut self, _session: SessionId) {}

    fn schedule(&mut self, _delay: Duration, _timer: Timer, _ticket: Ticket) {}

    fn connected_gamepads(&self) -> Vec<GamepadId> {
        Vec::new()
    }

    fn active_displays(&self) -> Vec<DeviceId> {
        Vec::new()
    }

    fn show_message(&mut self, message: &str) {
        for line in message.lines().filter(|l| !l.trim().is_empty()) {
            log::warn!("{}", line);
        }
    }
}
