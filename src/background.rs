//! Reference background capture and ownership.

use crate::capture::{discard_frames, FrameSource};
use crate::frame::Frame;
use serde::Deserialize;

/// Frames discarded right after the camera opens, about one second at 30 fps
pub const DEFAULT_WARMUP_FRAMES: u32 = 30;

/// Frames discarded while the camera settles exposure and white balance
pub const DEFAULT_SETTLE_FRAMES: u32 = 60;

/// Frames read when sampling the background
pub const DEFAULT_SAMPLE_FRAMES: u32 = 30;

/// How many frames are discarded on open, and how many background capture
/// discards and samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub warmup_frames: u32,
    pub settle_frames: u32,
    pub sample_frames: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            warmup_frames: DEFAULT_WARMUP_FRAMES,
            settle_frames: DEFAULT_SETTLE_FRAMES,
            sample_frames: DEFAULT_SAMPLE_FRAMES,
        }
    }
}

/// Immutable snapshot of the scene without the subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Background(Frame);

impl Background {
    pub fn frame(&self) -> &Frame {
        &self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }
}

/// Owns the background used for compositing
#[derive(Debug, Default)]
pub struct BackgroundManager {
    background: Option<Background>,
}

impl BackgroundManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn is_captured(&self) -> bool {
        self.background.is_some()
    }

    /// Capture a new background from `source`.
    ///
    /// The first `settle_frames` reads are thrown away. Of the next
    /// `sample_frames` reads the last successful one is kept. Failed reads
    /// are skipped in both phases. If no sample succeeds, `fallback` is used;
    /// with no fallback either, nothing is stored and `None` is returned.
    pub fn capture<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
        settle_frames: u32,
        sample_frames: u32,
        fallback: Option<&Frame>,
    ) -> Option<&Background> {
        let _span = tracing::debug_span!("capture_background").entered();

        discard_frames(source, settle_frames);

        let mut latest = None;
        let mut failures = 0u32;
        for _ in 0..sample_frames {
            match source.read_frame() {
                Ok(frame) => latest = Some(frame),
                Err(_) => failures += 1,
            }
        }
        if failures > 0 {
            tracing::debug!("{} of {} background samples failed", failures, sample_frames);
        }

        let frame = match latest {
            Some(frame) => frame,
            None => {
                let Some(fallback) = fallback else {
                    tracing::warn!("No background sample succeeded and no fallback frame");
                    return None;
                };
                tracing::warn!("No background sample succeeded, using frame in hand");
                fallback.clone()
            }
        };

        tracing::info!("Background captured at {}x{}", frame.width(), frame.height());
        self.background = Some(Background(frame));
        self.background.as_ref()
    }

    /// Drop the held background, if any
    pub fn invalidate(&mut self) {
        if self.background.take().is_some() {
            tracing::info!("Background invalidated");
        }
    }
}
