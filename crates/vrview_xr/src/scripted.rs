//! Scripted device backend
//!
//! Answers requests from a [`BackendScript`] and queues the resulting
//! [`SessionEvent`]s in a shared [`BackendLog`] instead of resolving them
//! later. Every call is recorded so callers can assert on the exact
//! sequence. Timers fire when the outbox is drained, not after their delay.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use vrview_render::{DeviceId, GamepadId, RasterSurface};

use crate::device::{
    DeviceApi, DeviceBackend, DeviceHandle, DeviceKind, SessionEvent, SessionId, Ticket, Timer,
};
use crate::error::SessionError;

/// What the scripted runtime reports
#[derive(Clone, Debug, Default)]
pub struct BackendScript {
    pub api: DeviceApi,
    /// Device returned by the XR API; `None` rejects the request
    pub xr_device: Option<DeviceHandle>,
    pub immersive_supported: bool,
    /// Displays returned by legacy enumeration
    pub displays: Vec<DeviceHandle>,
    /// Devices presenting right now
    pub presenting: HashSet<DeviceId>,
    /// When set, `exit_present` leaves devices presenting
    pub stuck: bool,
    /// Error returned by the next `request_present`
    pub fail_present: Option<SessionError>,
    pub gamepads: Vec<GamepadId>,
}

/// A recorded backend call
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    RequestXrDevice(Ticket),
    QuerySupport(DeviceId, Ticket),
    Subscribe,
    Unsubscribe,
    Enumerate(Ticket),
    RequestPresent(DeviceId),
    ExitPresent(DeviceId),
    EndSession(SessionId),
    Schedule { delay: Duration, timer: Timer, ticket: Ticket },
    Message(String),
}

/// Calls made so far and events waiting for delivery
#[derive(Debug, Default)]
pub struct BackendLog {
    pub script: BackendScript,
    pub calls: Vec<BackendCall>,
    pub outbox: VecDeque<SessionEvent>,
    next_session: u32,
}

impl BackendLog {
    pub fn count(&self, matches: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|c| matches(c)).count()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::Message(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }
}

pub type SharedLog = Rc<RefCell<BackendLog>>;

/// Backend driven by a [`BackendScript`]
pub struct ScriptedBackend {
    log: SharedLog,
}

impl ScriptedBackend {
    pub fn new(script: BackendScript) -> Self {
        let log = BackendLog {
            script,
            ..Default::default()
        };
        Self {
            log: Rc::new(RefCell::new(log)),
        }
    }

    /// Backend exposing one legacy display
    pub fn legacy_display(id: u32) -> Self {
        Self::new(BackendScript {
            api: DeviceApi::LegacyVr,
            displays: vec![DeviceHandle::new(id, DeviceKind::VrDisplay, "Scripted Display")],
            ..Default::default()
        })
    }

    /// Backend exposing one XR device with immersive support
    pub fn xr_device(id: u32) -> Self {
        Self::new(BackendScript {
            api: DeviceApi::Xr,
            xr_device: Some(DeviceHandle::new(id, DeviceKind::XrDevice, "Scripted Headset")),
            immersive_supported: true,
            ..Default::default()
        })
    }

    pub fn log(&self) -> SharedLog {
        Rc::clone(&self.log)
    }

    fn record(&self, call: BackendCall) {
        self.log.borrow_mut().calls.push(call);
    }

    fn push(&self, event: SessionEvent) {
        self.log.borrow_mut().outbox.push_back(event);
    }
}

impl DeviceBackend for ScriptedBackend {
    fn probe(&self) -> DeviceApi {
        self.log.borrow().script.api
    }

    fn request_xr_device(&mut self, ticket: Ticket) {
        self.record(BackendCall::RequestXrDevice(ticket));
        let result = self
            .log
            .borrow()
            .script
            .xr_device
            .clone()
            .ok_or(SessionError::DeviceNotFound);
        self.push(SessionEvent::XrDeviceResolved { ticket, result });
    }

    fn query_immersive_support(&mut self, device: &DeviceHandle, ticket: Ticket) {
        self.record(BackendCall::QuerySupport(device.id, ticket));
        let supported = self.log.borrow().script.immersive_supported;
        self.push(SessionEvent::XrSupportResolved {
            ticket,
            device: device.clone(),
            supported,
        });
    }

    fn subscribe_display_events(&mut self) {
        self.record(BackendCall::Subscribe);
    }

    fn unsubscribe_display_events(&mut self) {
        self.record(BackendCall::Unsubscribe);
    }

    fn enumerate_displays(&mut self, ticket: Ticket) {
        self.record(BackendCall::Enumerate(ticket));
        let displays = self.log.borrow().script.displays.clone();
        self.push(SessionEvent::DisplaysEnumerated {
            ticket,
            result: Ok(displays),
        });
    }

    fn is_presenting(&self, device: DeviceId) -> bool {
        self.log.borrow().script.presenting.contains(&device)
    }

    fn request_present(
        &mut self,
        device: DeviceId,
        _target: &dyn RasterSurface,
    ) -> Result<Option<SessionId>, SessionError> {
        self.record(BackendCall::RequestPresent(device));
        let mut log = self.log.borrow_mut();
        if let Some(err) = log.script.fail_present.take() {
            return Err(err);
        }
        log.script.presenting.insert(device);

        let is_xr = log
            .script
            .xr_device
            .as_ref()
            .is_some_and(|d| d.id == device);
        if is_xr {
            log.next_session += 1;
            Ok(Some(SessionId(log.next_session)))
        } else {
            Ok(None)
        }
    }

    fn exit_present(&mut self, device: DeviceId) {
        self.record(BackendCall::ExitPresent(device));
        let mut log = self.log.borrow_mut();
        if !log.script.stuck {
            log.script.presenting.remove(&device);
        }
    }

    fn end_session(&mut self, session: SessionId) {
        self.record(BackendCall::EndSession(session));
    }

    fn schedule(&mut self, delay: Duration, timer: Timer, ticket: Ticket) {
        self.record(BackendCall::Schedule { delay, timer, ticket });
        self.push(SessionEvent::TimerFired { ticket, timer });
    }

    fn connected_gamepads(&self) -> Vec<GamepadId> {
        self.log.borrow().script.gamepads.clone()
    }

    fn active_displays(&self) -> Vec<DeviceId> {
        let log = self.log.borrow();
        let mut active: Vec<DeviceId> = log.script.presenting.iter().copied().collect();
        active.sort_by_key(|d| d.0);
        active
    }

    fn show_message(&mut self, message: &str) {
        self.record(BackendCall::Message(message.to_string()));
    }
}
