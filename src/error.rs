use thiserror::Error;

/// Errors raised by the cloak pipeline and its collaborators
#[derive(Debug, Error)]
pub enum CloakError {
    /// The camera could not be opened. Fatal for the current run.
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    /// A single frame read failed. Fatal for the current run.
    #[error("failed to read frame: {0}")]
    ReadError(String),

    /// Frame, background and mask disagree on dimensions
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

pub type Result<T> = std::result::Result<T, CloakError>;
