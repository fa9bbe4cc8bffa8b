/// Render error types
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Surface was lost (window resized, minimized, etc.)
    SurfaceLost,
    /// GPU out of memory
    OutOfMemory,
    /// No compatible adapter or device
    NoAdapter,
    /// A surface could not be created
    CreationFailed(String),
    /// Other surface error
    Other(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::SurfaceLost => write!(f, "Surface lost"),
            RenderError::OutOfMemory => write!(f, "Out of memory"),
            RenderError::NoAdapter => write!(f, "No compatible GPU adapter"),
            RenderError::CreationFailed(msg) => write!(f, "Surface creation failed: {}", msg),
            RenderError::Other(msg) => write!(f, "Render error: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => RenderError::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            other => RenderError::Other(format!("{:?}", other)),
        }
    }
}

impl From<wgpu::CreateSurfaceError> for RenderError {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        RenderError::CreationFailed(err.to_string())
    }
}

impl From<wgpu::RequestDeviceError> for RenderError {
    fn from(err: wgpu::RequestDeviceError) -> Self {
        RenderError::CreationFailed(err.to_string())
    }
}
