//! Frame sources.
//!
//! A [`SourceOpener`] acquires the camera, the returned [`FrameSource`] yields
//! frames, and dropping the source releases the device.

#[cfg(any(test, feature = "testing"))]
mod memory;
#[cfg(feature = "camera")]
mod webcam;

#[cfg(any(test, feature = "testing"))]
pub use memory::{MemoryOpener, MemorySource};
#[cfg(feature = "camera")]
pub use webcam::{WebcamCapture, WebcamOpener, DEFAULT_CAMERA_INDEX};

use crate::error::Result;
use crate::frame::Frame;

/// Trait for camera capture sources
pub trait FrameSource {
    /// Capture a single frame
    fn read_frame(&mut self) -> Result<Frame>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Result<Frame> {
        (**self).read_frame()
    }

    fn resolution(&self) -> (u32, u32) {
        (**self).resolution()
    }
}

/// Acquires an exclusive frame source
pub trait SourceOpener {
    type Source: FrameSource;

    /// Open the device. Fails with `DeviceUnavailable`.
    fn open(&mut self) -> Result<Self::Source>;
}

/// Read and throw away `count` frames. Failed reads are skipped.
///
/// Returns how many of the reads failed.
pub fn discard_frames<S: FrameSource + ?Sized>(source: &mut S, count: u32) -> u32 {
    let mut failures = 0;
    for _ in 0..count {
        if let Err(e) = source.read_frame() {
            tracing::debug!("Ignoring discarded read failure: {}", e);
            failures += 1;
        }
    }
    failures
}

/// Source adapter that mirrors every frame horizontally, exactly once
pub struct Mirrored<S> {
    inner: S,
}

impl<S: FrameSource> Mirrored<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: FrameSource> FrameSource for Mirrored<S> {
    fn read_frame(&mut self) -> Result<Frame> {
        let mut frame = self.inner.read_frame()?;
        frame.mirror_horizontal();
        Ok(frame)
    }

    fn resolution(&self) -> (u32, u32) {
        self.inner.resolution()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirrored_flips_once() {
        let frame = Frame::from_raw(2, 1, vec![1, 1, 1, 2, 2, 2]).unwrap();
        let mut source = Mirrored::new(MemorySource::new(vec![Ok(frame)]));
        let read = source.read_frame().unwrap();
        assert_eq!(read.as_raw(), &[2, 2, 2, 1, 1, 1]);
    }

    #[test]
    fn test_discard_frames_skips_failures() {
        let mut source = MemorySource::new(vec![
            Ok(Frame::filled(1, 1, [1, 1, 1])),
            Err(crate::error::CloakError::ReadError("glitch".into())),
            Ok(Frame::filled(1, 1, [2, 2, 2])),
            Ok(Frame::filled(1, 1, [3, 3, 3])),
        ]);
        assert_eq!(discard_frames(&mut source, 3), 1);
        assert_eq!(source.read_frame().unwrap().pixel(0, 0), [3, 3, 3]);
    }

    #[test]
    fn test_mirrored_passes_errors_through() {
        let mut source = Mirrored::new(MemorySource::new(vec![]));
        assert!(source.read_frame().is_err());
    }
}
