use super::{FrameSource, SourceOpener};
use crate::error::{CloakError, Result};
use crate::frame::Frame;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

/// The only camera this version talks to
pub const DEFAULT_CAMERA_INDEX: u32 = 0;

pub struct WebcamCapture {
    camera: Camera,
    width: u32,
    height: u32,
}

impl WebcamCapture {
    pub fn new(device_index: u32) -> Result<Self> {
        tracing::info!("Initializing webcam {}", device_index);

        let index = CameraIndex::Index(device_index);
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

        let mut camera = Camera::new(index, requested)
            .map_err(|e| CloakError::DeviceUnavailable(format!("failed to open camera: {e}")))?;

        camera.open_stream().map_err(|e| {
            CloakError::DeviceUnavailable(format!("failed to open camera stream: {e}"))
        })?;

        let resolution = camera.resolution();
        tracing::info!(
            "Webcam initialized at {}x{}",
            resolution.width(),
            resolution.height()
        );

        Ok(Self {
            camera,
            width: resolution.width(),
            height: resolution.height(),
        })
    }
}

impl FrameSource for WebcamCapture {
    fn read_frame(&mut self) -> Result<Frame> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CloakError::ReadError(format!("failed to capture frame: {e}")))?;

        let resolution = buffer.resolution();
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CloakError::ReadError(format!("failed to decode frame: {e}")))?;

        Frame::from_rgb_bytes(resolution.width(), resolution.height(), &decoded.into_raw())
            .ok_or_else(|| CloakError::ReadError("decoded frame has unexpected size".into()))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for WebcamCapture {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!("Failed to stop camera stream: {}", e);
        }
        tracing::info!("Webcam released");
    }
}

/// Opens the default camera through nokhwa
#[derive(Debug, Clone, Copy)]
pub struct WebcamOpener {
    device_index: u32,
}

impl Default for WebcamOpener {
    fn default() -> Self {
        Self {
            device_index: DEFAULT_CAMERA_INDEX,
        }
    }
}

impl SourceOpener for WebcamOpener {
    type Source = WebcamCapture;

    fn open(&mut self) -> Result<WebcamCapture> {
        WebcamCapture::new(self.device_index)
    }
}
