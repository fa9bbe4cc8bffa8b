/// Errors raised by the device session controller
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Neither the XR device API nor the legacy VR display API is present
    NoVrSupport,
    /// The API is present but reported no usable device
    DeviceNotFound,
    /// The device kept reporting it was already presenting
    DeviceBusy { attempts: u32 },
    /// There is no raster surface to present from
    NoSurface,
    /// The operation is not valid in the current session state
    InvalidState(&'static str),
    /// Error reported by the device or runtime
    Device(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::NoVrSupport => write!(f, "No VR support found"),
            SessionError::DeviceNotFound => write!(f, "No VR device found"),
            SessionError::DeviceBusy { attempts } => {
                write!(f, "VR device still presenting after {} attempts", attempts)
            }
            SessionError::NoSurface => write!(f, "No raster surface to present from"),
            SessionError::InvalidState(state) => write!(f, "Operation not valid while {}", state),
            SessionError::Device(msg) => write!(f, "VR device error: {}", msg),
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_display() {
        assert_eq!(format!("{}", SessionError::NoVrSupport), "No VR support found");
        assert_eq!(
            format!("{}", SessionError::DeviceBusy { attempts: 3 }),
            "VR device still presenting after 3 attempts"
        );
        assert_eq!(
            format!("{}", SessionError::InvalidState("inactive")),
            "Operation not valid while inactive"
        );
    }
}
