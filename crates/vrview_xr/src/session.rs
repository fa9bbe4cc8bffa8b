//! VR/XR presentation session state machine
//!
//! Drives discovery of a VR device, binding it to the raster surface,
//! entering and leaving presentation, and reacting to device events.
//!
//! ```text
//!  Inactive --toggle--> Discovering --bound--> Available --enter--> Presenting
//!      ^                     |                     |                     |
//!      |                     +--none/failed--> Unavailable               |
//!      +--------------------------- exit / disconnect / error -----------+
//! ```
//!
//! Asynchronous answers arrive through [`DeviceSessionController::handle_event`].
//! Each discovery attempt and each exit advances a generation counter, so
//! answers addressed to an earlier attempt are dropped.

use std::collections::VecDeque;
use std::time::Duration;

use vrview_render::{GamepadId, RasterSurface, ReferenceSpace};

use crate::device::{
    DeviceApi, DeviceBackend, DeviceHandle, SessionEvent, SessionId, Ticket, Timer,
};
use crate::error::SessionError;
use crate::message::no_vr_message;

/// Presentation state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No VR requested
    #[default]
    Inactive,
    /// Probing for a device
    Discovering,
    /// A device is bound but not presenting
    Available,
    /// The device is presenting the raster surface
    Presenting,
    /// The last discovery attempt failed
    Unavailable,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Discovering => "discovering",
            Self::Available => "available",
            Self::Presenting => "presenting",
            Self::Unavailable => "unavailable",
        }
    }
}

/// Session behaviour settings
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// When false, toggling VR does nothing
    pub enabled: bool,
    /// Enter presentation as soon as a device is bound
    pub auto_enter: bool,
    /// Total enter attempts while the device reports it is already presenting
    pub max_enter_attempts: u32,
    /// Delay between a forced exit and the next enter attempt
    pub retry_delay: Duration,
    /// Delay between legacy enumeration and the gamepad scan
    pub gamepad_scan_delay: Duration,
    pub reference_space: ReferenceSpace,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_enter: true,
            max_enter_attempts: 3,
            retry_delay: Duration::from_secs(1),
            gamepad_scan_delay: Duration::from_secs(1),
            reference_space: ReferenceSpace::default(),
        }
    }
}

/// Something the owner of the controller has to act on
#[derive(Clone, Debug, PartialEq)]
pub enum SessionNotice {
    StateChanged { from: SessionState, to: SessionState },
    /// Rebuild both controller bindings
    RebindControllers,
    /// Drop both controller bindings
    ReleaseControllers,
}

/// The VR/XR session state machine
pub struct DeviceSessionController {
    backend: Box<dyn DeviceBackend>,
    config: SessionConfig,
    state: SessionState,
    bound: Option<DeviceHandle>,
    session: Option<SessionId>,
    displays: Vec<DeviceHandle>,
    gamepads: Vec<GamepadId>,
    generation: u64,
    enter_attempts: u32,
    listening: bool,
    last_error: Option<SessionError>,
    notices: VecDeque<SessionNotice>,
}

impl DeviceSessionController {
    pub fn new(backend: Box<dyn DeviceBackend>, config: SessionConfig) -> Self {
        Self {
            backend,
            config,
            state: SessionState::Inactive,
            bound: None,
            session: None,
            displays: Vec::new(),
            gamepads: Vec::new(),
            generation: 0,
            enter_attempts: 0,
            listening: false,
            last_error: None,
            notices: VecDeque::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The bound device, if any
    pub fn device(&self) -> Option<&DeviceHandle> {
        self.bound.as_ref()
    }

    /// Displays found by the last legacy enumeration
    pub fn displays(&self) -> &[DeviceHandle] {
        &self.displays
    }

    pub fn gamepads(&self) -> &[GamepadId] {
        &self.gamepads
    }

    /// Error that ended the last attempt, if any
    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    /// Current discovery generation
    pub fn ticket(&self) -> Ticket {
        Ticket(self.generation)
    }

    /// Notices produced since the last call
    pub fn take_notices(&mut self) -> Vec<SessionNotice> {
        self.notices.drain(..).collect()
    }

    /// Start discovery when idle, otherwise exit
    pub fn toggle(&mut self, surface: Option<&mut dyn RasterSurface>) {
        if !self.config.enabled {
            log::info!("VR is disabled; ignoring toggle");
            return;
        }
        match self.state {
            SessionState::Inactive | SessionState::Unavailable => self.start_discovery(),
            SessionState::Discovering | SessionState::Available | SessionState::Presenting => {
                self.exit(surface)
            }
        }
    }

    fn start_discovery(&mut self) {
        self.generation += 1;
        self.enter_attempts = 0;
        self.last_error = None;
        self.set_state(SessionState::Discovering);

        let ticket = self.ticket();
        match self.backend.probe() {
            DeviceApi::Xr => {
                log::info!("VR: probing XR device API");
                self.backend.request_xr_device(ticket);
            }
            DeviceApi::LegacyVr => {
                log::info!("VR: probing legacy VR display API");
                if !self.listening {
                    self.backend.subscribe_display_events();
                    self.listening = true;
                }
                self.displays.clear();
                self.gamepads.clear();
                self.backend.enumerate_displays(ticket);
            }
            DeviceApi::None => {
                self.backend.show_message(&no_vr_message());
                self.not_found(SessionError::NoVrSupport);
            }
        }
    }

    /// Request presentation on the bound device
    pub fn enter(&mut self, surface: Option<&mut dyn RasterSurface>) -> Result<(), SessionError> {
        if self.state != SessionState::Available {
            return Err(SessionError::InvalidState(self.state.as_str()));
        }
        self.enter_attempts = 0;
        self.try_enter(surface)
    }

    fn try_enter(&mut self, surface: Option<&mut dyn RasterSurface>) -> Result<(), SessionError> {
        let Some(device) = self.bound.as_ref().map(|d| d.id) else {
            return Err(SessionError::InvalidState(self.state.as_str()));
        };
        let Some(surface) = surface else {
            return Err(SessionError::NoSurface);
        };
        self.enter_attempts += 1;

        if self.backend.is_presenting(device) {
            if self.enter_attempts >= self.config.max_enter_attempts {
                let err = SessionError::DeviceBusy {
                    attempts: self.enter_attempts,
                };
                log::warn!("VR: {}", err);
                self.release_binding(Some(surface));
                self.last_error = Some(err.clone());
                self.set_state(SessionState::Unavailable);
                return Err(err);
            }
            log::info!(
                "VR: device already presenting; forcing exit and retrying in {:?} (attempt {}/{})",
                self.config.retry_delay,
                self.enter_attempts,
                self.config.max_enter_attempts
            );
            self.backend.exit_present(device);
            let ticket = self.ticket();
            self.backend.schedule(self.config.retry_delay, Timer::RetryEnter, ticket);
            return Ok(());
        }

        match self.backend.request_present(device, &*surface) {
            Ok(session) => {
                self.session = session;
                self.enter_attempts = 0;
                surface.set_device_rendering(true);
                self.set_state(SessionState::Presenting);
                self.notices.push_back(SessionNotice::RebindControllers);
                Ok(())
            }
            Err(err) => {
                log::warn!("VR: present request failed: {}", err);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Leave VR from any state; safe to call repeatedly
    pub fn exit(&mut self, surface: Option<&mut dyn RasterSurface>) {
        let idle = self.state == SessionState::Inactive
            && self.bound.is_none()
            && self.session.is_none()
            && self.displays.is_empty()
            && !self.listening;
        if idle {
            return;
        }

        self.generation += 1;

        let mut surface = surface;
        let released = self.bound.as_ref().map(|d| d.id);
        self.release_binding(reborrow(&mut surface));
        if let Some(session) = self.session.take() {
            self.backend.end_session(session);
        }
        if let Some(surface) = surface {
            if surface.device_rendering() {
                surface.set_device_rendering(false);
            }
        }
        for display in self.displays.drain(..) {
            if Some(display.id) != released {
                self.backend.exit_present(display.id);
            }
        }
        if self.listening {
            self.backend.unsubscribe_display_events();
            self.listening = false;
        }
        self.gamepads.clear();
        self.enter_attempts = 0;

        self.notices.push_back(SessionNotice::ReleaseControllers);
        self.set_state(SessionState::Inactive);
    }

    /// Exit presentation on displays left presenting by an earlier page
    pub fn release_active_displays(&mut self) {
        for device in self.backend.active_displays() {
            log::info!("VR: exiting stale presentation on {:?}", device);
            self.backend.exit_present(device);
        }
    }

    /// Feed an asynchronous answer or device notification
    pub fn handle_event(&mut self, event: SessionEvent, surface: Option<&mut dyn RasterSurface>) {
        match event {
            SessionEvent::XrDeviceResolved { ticket, result } => {
                if !self.is_current(ticket, "XR device") || self.state != SessionState::Discovering {
                    return;
                }
                match result {
                    Ok(device) => self.backend.query_immersive_support(&device, ticket),
                    Err(err) => self.not_found(err),
                }
            }
            SessionEvent::XrSupportResolved { ticket, device, supported } => {
                if !self.is_current(ticket, "XR support") || self.state != SessionState::Discovering {
                    return;
                }
                if supported {
                    self.bind(device, surface);
                } else {
                    self.not_found(SessionError::DeviceNotFound);
                }
            }
            SessionEvent::DisplaysEnumerated { ticket, result } => {
                if !self.is_current(ticket, "display list") {
                    return;
                }
                // a connect event may have bound a display before the list arrived
                let discovering = self.state == SessionState::Discovering;
                match result {
                    Ok(displays) => {
                        log::info!("VR: {} display(s) found", displays.len());
                        for display in displays {
                            if !self.displays.iter().any(|d| d.id == display.id) {
                                self.displays.push(display);
                            }
                        }
                        self.backend
                            .schedule(self.config.gamepad_scan_delay, Timer::GamepadScan, ticket);
                        if discovering {
                            match self.displays.first().cloned() {
                                Some(first) => self.bind(first, surface),
                                None => self.not_found(SessionError::DeviceNotFound),
                            }
                        }
                    }
                    Err(err) if discovering => self.not_found(err),
                    Err(err) => log::warn!("VR: display enumeration failed: {}", err),
                }
            }
            SessionEvent::DisplayConnected(device) => {
                if !self.listening {
                    return;
                }
                log::info!("VR: display connected: {}", device.name);
                if !self.displays.iter().any(|d| d.id == device.id) {
                    self.displays.push(device.clone());
                }
                if self.state != SessionState::Presenting {
                    self.bind(device, surface);
                }
            }
            SessionEvent::DisplayDisconnected(id) => {
                if !self.listening {
                    return;
                }
                log::info!("VR: display disconnected: {:?}", id);
                self.displays.retain(|d| d.id != id);
                if self.bound.as_ref().map(|d| d.id) != Some(id) {
                    return;
                }
                if self.state == SessionState::Presenting {
                    self.exit(surface);
                } else {
                    self.release_binding(surface);
                    self.not_found(SessionError::DeviceNotFound);
                }
            }
            SessionEvent::DisplayPresentChange { device, presenting } => {
                if !self.listening || self.bound.as_ref().map(|d| d.id) != Some(device) {
                    return;
                }
                match (self.state, presenting) {
                    (SessionState::Available, true) => {
                        if let Some(surface) = surface {
                            surface.set_device_rendering(true);
                        }
                        self.set_state(SessionState::Presenting);
                        self.notices.push_back(SessionNotice::RebindControllers);
                    }
                    (SessionState::Presenting, false) => {
                        if let Some(surface) = surface {
                            surface.set_device_rendering(false);
                        }
                        self.notices.push_back(SessionNotice::ReleaseControllers);
                        self.set_state(SessionState::Available);
                    }
                    _ => {}
                }
            }
            SessionEvent::DisplayActivate(id) => {
                if !self.listening || self.state == SessionState::Presenting {
                    return;
                }
                let Some(device) = self.displays.iter().find(|d| d.id == id).cloned() else {
                    log::debug!("VR: activate for unknown display {:?}", id);
                    return;
                };
                let mut surface = surface;
                if self.bound.as_ref().map(|d| d.id) != Some(id) {
                    let auto_enter = self.config.auto_enter;
                    self.config.auto_enter = false;
                    self.bind(device, reborrow(&mut surface));
                    self.config.auto_enter = auto_enter;
                }
                if let Err(err) = self.enter(surface) {
                    log::warn!("VR: activate failed: {}", err);
                }
            }
            SessionEvent::GamepadConnected(gamepad) => {
                log::info!("Gamepad {} connected", gamepad.0);
                if !self.gamepads.contains(&gamepad) {
                    self.gamepads.push(gamepad);
                }
                if self.state == SessionState::Presenting {
                    self.notices.push_back(SessionNotice::RebindControllers);
                }
            }
            SessionEvent::GamepadDisconnected(gamepad) => {
                log::info!("Gamepad {} disconnected", gamepad.0);
                self.gamepads.retain(|g| *g != gamepad);
                if self.state == SessionState::Presenting {
                    self.notices.push_back(SessionNotice::RebindControllers);
                }
            }
            SessionEvent::TimerFired { ticket, timer } => {
                if !self.is_current(ticket, "timer") {
                    return;
                }
                match timer {
                    Timer::RetryEnter => {
                        if self.state == SessionState::Available {
                            if let Err(err) = self.try_enter(surface) {
                                log::warn!("VR: retry failed: {}", err);
                            }
                        }
                    }
                    Timer::GamepadScan => {
                        self.gamepads = self.backend.connected_gamepads();
                        log::info!("VR: {} controller(s) connected", self.gamepads.len());
                        self.notices.push_back(SessionNotice::RebindControllers);
                    }
                }
            }
            SessionEvent::DeviceError { device, message } => {
                if self.bound.as_ref().map(|d| d.id) != Some(device) {
                    return;
                }
                log::warn!("VR: device error: {}", message);
                self.exit(surface);
                self.last_error = Some(SessionError::Device(message));
            }
        }
    }

    fn is_current(&self, ticket: Ticket, what: &str) -> bool {
        if ticket == self.ticket() {
            true
        } else {
            log::debug!("VR: ignoring stale {} ({:?}, current {:?})", what, ticket, self.ticket());
            false
        }
    }

    fn bind(&mut self, device: DeviceHandle, surface: Option<&mut dyn RasterSurface>) {
        let Some(surface) = surface else {
            log::warn!("VR: cannot bind {} without a raster surface", device.name);
            self.not_found(SessionError::NoSurface);
            return;
        };
        if self.bound.as_ref().is_some_and(|d| d.id != device.id) {
            self.release_binding(Some(&mut *surface));
        }
        log::info!("VR: bound to {}", device.name);
        surface.bind_device(Some(device.id));
        surface.set_reference_space(self.config.reference_space);
        self.bound = Some(device);
        self.set_state(SessionState::Available);

        if self.config.auto_enter {
            if let Err(err) = self.enter(Some(surface)) {
                log::warn!("VR: automatic enter failed: {}", err);
            }
        }
    }

    fn release_binding(&mut self, surface: Option<&mut dyn RasterSurface>) {
        if let Some(device) = self.bound.take() {
            self.backend.exit_present(device.id);
            if let Some(surface) = surface {
                surface.bind_device(None);
            }
        }
    }

    fn not_found(&mut self, err: SessionError) {
        log::warn!("VR: {}", err);
        self.last_error = Some(err);
        self.set_state(SessionState::Unavailable);
    }

    fn set_state(&mut self, to: SessionState) {
        let from = self.state;
        if from == to {
            return;
        }
        log::info!("VR session: {} -> {}", from.as_str(), to.as_str());
        self.state = to;
        self.notices.push_back(SessionNotice::StateChanged { from, to });
    }
}

/// Shorten the borrow of an optional surface so it can be used again
fn reborrow<'a>(surface: &'a mut Option<&mut dyn RasterSurface>) -> Option<&'a mut dyn RasterSurface> {
    match surface {
        Some(surface) => Some(&mut **surface),
        None => None,
    }
}
