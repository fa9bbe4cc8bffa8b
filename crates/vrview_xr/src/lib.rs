//! VR/XR device integration for the vrview viewer
//!
//! - [`session::DeviceSessionController`] - Discovery and presentation state machine
//! - [`device::DeviceBackend`] - Interface to the host VR runtime
//! - `scripted::ScriptedBackend` - Backend answering from a script (`testing` feature)
//! - [`unsupported::UnsupportedBackend`] - Backend for hosts without VR

pub mod device;
pub mod error;
pub mod message;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;
pub mod session;
pub mod unsupported;

pub use device::{DeviceApi, DeviceBackend, DeviceHandle, DeviceKind, SessionEvent, SessionId, Ticket, Timer};
pub use error::SessionError;
pub use session::{DeviceSessionController, SessionConfig, SessionNotice, SessionState};
pub use unsupported::UnsupportedBackend;
