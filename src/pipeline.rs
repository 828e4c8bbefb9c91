//! Per-frame orchestration and the start/stop/recapture state machine.
//!
//! The caller owns a [`PipelineState`] and passes it into every call. The
//! pipeline owns the open camera, if any, and drops it on every path that
//! leaves the running states.

use crate::background::{Background, BackgroundManager, CaptureSettings};
use crate::capture::{discard_frames, FrameSource, Mirrored, SourceOpener};
use crate::compositor::composite;
use crate::error::{CloakError, Result};
use crate::events::{EventSink, StatusEvent};
use crate::frame::{mask_to_rgb, Frame};
use crate::segmentation::{ColorMaskSegmenter, Mask, MaskRefiner};
use image::RgbImage;

/// Observable pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Stopped,
    AwaitingBackground,
    Running,
}

/// Session state owned by the host
#[derive(Debug, Default)]
pub struct PipelineState {
    running: bool,
    backgrounds: BackgroundManager,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn background(&self) -> Option<&Background> {
        self.backgrounds.background()
    }

    pub fn status(&self) -> PipelineStatus {
        match (self.running, self.backgrounds.is_captured()) {
            (false, _) => PipelineStatus::Stopped,
            (true, false) => PipelineStatus::AwaitingBackground,
            (true, true) => PipelineStatus::Running,
        }
    }
}

/// Result of the per-frame path
#[derive(Debug, Clone)]
pub struct Processed {
    /// Composited frame, BGR
    pub output: Frame,
    /// Refined mask that drove the composite
    pub mask: Mask,
}

impl Processed {
    /// Composited frame for display
    pub fn to_rgb(&self) -> RgbImage {
        self.output.to_rgb_image()
    }

    /// Mask visualization for display
    pub fn mask_rgb(&self) -> RgbImage {
        mask_to_rgb(&self.mask)
    }
}

/// What a single `step` produced
#[derive(Debug)]
pub enum StepOutcome {
    /// Pipeline is stopped; nothing was read
    Idle,
    /// A new background was captured; no frame is rendered this iteration
    BackgroundCaptured,
    /// A composited frame
    Rendered(Processed),
}

pub struct CloakPipeline<O: SourceOpener> {
    opener: O,
    source: Option<Mirrored<O::Source>>,
    segmenter: ColorMaskSegmenter,
    refiner: MaskRefiner,
    capture: CaptureSettings,
}

impl<O: SourceOpener> CloakPipeline<O> {
    pub fn new(
        opener: O,
        segmenter: ColorMaskSegmenter,
        refiner: MaskRefiner,
        capture: CaptureSettings,
    ) -> Self {
        Self {
            opener,
            source: None,
            segmenter,
            refiner,
            capture,
        }
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Whether the camera is currently held
    pub fn has_device(&self) -> bool {
        self.source.is_some()
    }

    /// Open the camera and begin running. No-op when already running.
    ///
    /// The first `warmup_frames` reads after opening are thrown away, so a
    /// restart with a background already held does not composite frames
    /// from a camera that is still adjusting. On open failure
    /// `CameraUnavailable` is emitted and the state stays stopped.
    pub fn start(&mut self, state: &mut PipelineState, events: &mut dyn EventSink) -> Result<()> {
        if state.running {
            tracing::debug!("start ignored, already running");
            return Ok(());
        }

        match self.opener.open() {
            Ok(source) => {
                let (width, height) = source.resolution();
                tracing::info!("Camera opened ({}x{})", width, height);
                let mut source = Mirrored::new(source);
                let failures = discard_frames(&mut source, self.capture.warmup_frames);
                tracing::debug!(
                    "Warm-up discarded {} frames ({} failed)",
                    self.capture.warmup_frames,
                    failures
                );
                self.source = Some(source);
                state.running = true;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to start: {}", e);
                events.emit(StatusEvent::CameraUnavailable);
                Err(e)
            }
        }
    }

    /// Stop running and release the camera. No-op when stopped.
    pub fn stop(&mut self, state: &mut PipelineState) {
        if !state.running && self.source.is_none() {
            return;
        }
        self.release(state);
        tracing::info!("Pipeline stopped");
    }

    /// Throw away the background so the next step captures a new one.
    ///
    /// Ignored while a capture is already pending.
    pub fn recapture(&mut self, state: &mut PipelineState, events: &mut dyn EventSink) {
        match state.status() {
            PipelineStatus::Running => {
                state.backgrounds.invalidate();
                events.emit(StatusEvent::RecaptureRequested);
            }
            PipelineStatus::AwaitingBackground => {
                tracing::debug!("recapture ignored, background capture already pending");
            }
            PipelineStatus::Stopped => state.backgrounds.invalidate(),
        }
    }

    /// Run one loop iteration.
    ///
    /// A failed read stops the pipeline, releases the camera, emits
    /// `ReadErrorStopping` and returns the error.
    pub fn step(
        &mut self,
        state: &mut PipelineState,
        events: &mut dyn EventSink,
    ) -> Result<StepOutcome> {
        if !state.running {
            return Ok(StepOutcome::Idle);
        }

        let read = match self.source.as_mut() {
            Some(source) => source.read_frame(),
            None => Err(CloakError::ReadError("no camera open".into())),
        };
        let frame = match read {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Frame read failed: {}", e);
                self.release(state);
                events.emit(StatusEvent::ReadErrorStopping);
                return Err(e);
            }
        };

        if !state.backgrounds.is_captured() {
            events.emit(StatusEvent::CapturingBackground);
            if let Some(source) = self.source.as_mut() {
                state.backgrounds.capture(
                    source,
                    self.capture.settle_frames,
                    self.capture.sample_frames,
                    Some(&frame),
                );
            }
            events.emit(StatusEvent::BackgroundCaptured);
            return Ok(StepOutcome::BackgroundCaptured);
        }

        let Some(background) = state.backgrounds.background() else {
            return Ok(StepOutcome::Idle);
        };
        let processed = self.process(&frame, background).map_err(|e| {
            tracing::error!("Compositing failed: {}", e);
            e
        })?;
        Ok(StepOutcome::Rendered(processed))
    }

    /// Segment, refine and composite a single frame against `background`
    pub fn process(&self, frame: &Frame, background: &Background) -> Result<Processed> {
        let raw = self.segmenter.segment(frame);
        let mask = self.refiner.refine(&raw);
        let output = composite(frame, background, &mask)?;
        Ok(Processed { output, mask })
    }

    fn release(&mut self, state: &mut PipelineState) {
        // Dropping the source closes the device
        self.source = None;
        state.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{MemoryOpener, MemorySource};

    const RED: [u8; 3] = [0, 0, 255];
    const GREEN: [u8; 3] = [0, 255, 0];
    const GRAY: [u8; 3] = [90, 90, 90];

    fn pipeline(opener: MemoryOpener, settle: u32, sample: u32) -> CloakPipeline<MemoryOpener> {
        CloakPipeline::new(
            opener,
            ColorMaskSegmenter::default(),
            MaskRefiner::default(),
            CaptureSettings {
                warmup_frames: 0,
                settle_frames: settle,
                sample_frames: sample,
            },
        )
    }

    fn frames(colors: &[[u8; 3]]) -> MemorySource {
        MemorySource::from_frames(colors.iter().map(|&c| Frame::filled(8, 6, c)))
    }

    #[test]
    fn test_start_awaits_background_then_runs() {
        let opener = MemoryOpener::new(vec![frames(&[GRAY, GRAY, GRAY])]);
        let mut pipeline = pipeline(opener, 1, 1);
        let mut state = PipelineState::new();
        let mut events: Vec<StatusEvent> = Vec::new();

        pipeline.start(&mut state, &mut events).unwrap();
        assert_eq!(state.status(), PipelineStatus::AwaitingBackground);

        let outcome = pipeline.step(&mut state, &mut events).unwrap();
        assert!(matches!(outcome, StepOutcome::BackgroundCaptured));
        assert_eq!(state.status(), PipelineStatus::Running);
        assert_eq!(
            events,
            vec![
                StatusEvent::CapturingBackground,
                StatusEvent::BackgroundCaptured
            ]
        );
    }

    #[test]
    fn test_start_is_idempotent() {
        let opener = MemoryOpener::new(vec![frames(&[]), frames(&[])]);
        let mut pipeline = pipeline(opener, 0, 1);
        let mut state = PipelineState::new();
        let mut events: Vec<StatusEvent> = Vec::new();
        pipeline.start(&mut state, &mut events).unwrap();
        pipeline.start(&mut state, &mut events).unwrap();
        assert_eq!(pipeline.opener().open_count(), 1);
    }

    #[test]
    fn test_open_failure_stays_stopped() {
        let mut pipeline = pipeline(MemoryOpener::unavailable(), 0, 1);
        let mut state = PipelineState::new();
        let mut events: Vec<StatusEvent> = Vec::new();
        let err = pipeline.start(&mut state, &mut events).unwrap_err();
        assert!(matches!(err, CloakError::DeviceUnavailable(_)));
        assert_eq!(state.status(), PipelineStatus::Stopped);
        assert_eq!(events, vec![StatusEvent::CameraUnavailable]);
    }

    #[test]
    fn test_read_failure_stops_and_releases() {
        let opener = MemoryOpener::new(vec![frames(&[])]);
        let mut pipeline = pipeline(opener, 0, 1);
        let mut state = PipelineState::new();
        let mut events: Vec<StatusEvent> = Vec::new();
        pipeline.start(&mut state, &mut events).unwrap();
        assert_eq!(pipeline.opener().live_handles(), 1);

        let err = pipeline.step(&mut state, &mut events).unwrap_err();
        assert!(matches!(err, CloakError::ReadError(_)));
        assert!(!state.is_running());
        assert!(!pipeline.has_device());
        assert_eq!(pipeline.opener().live_handles(), 0);
        assert_eq!(events, vec![StatusEvent::ReadErrorStopping]);
    }

    #[test]
    fn test_red_frame_shows_background() {
        let opener = MemoryOpener::new(vec![frames(&[GRAY, GRAY, RED])]);
        let mut pipeline = pipeline(opener, 0, 1);
        let mut state = PipelineState::new();
        let mut events: Vec<StatusEvent> = Vec::new();
        pipeline.start(&mut state, &mut events).unwrap();
        pipeline.step(&mut state, &mut events).unwrap();

        match pipeline.step(&mut state, &mut events).unwrap() {
            StepOutcome::Rendered(processed) => {
                assert_eq!(processed.output, Frame::filled(8, 6, GRAY));
                assert!(processed.mask.pixels().all(|p| p[0] == 255));
            }
            other => panic!("expected a rendered frame, got {other:?}"),
        }
    }

    #[test]
    fn test_green_frame_passes_through() {
        let opener = MemoryOpener::new(vec![frames(&[GRAY, GRAY, GREEN])]);
        let mut pipeline = pipeline(opener, 0, 1);
        let mut state = PipelineState::new();
        let mut events: Vec<StatusEvent> = Vec::new();
        pipeline.start(&mut state, &mut events).unwrap();
        pipeline.step(&mut state, &mut events).unwrap();

        match pipeline.step(&mut state, &mut events).unwrap() {
            StepOutcome::Rendered(processed) => {
                assert_eq!(processed.output, Frame::filled(8, 6, GREEN));
                assert_eq!(processed.to_rgb().get_pixel(0, 0).0, [0, 255, 0]);
            }
            other => panic!("expected a rendered frame, got {other:?}"),
        }
    }

    #[test]
    fn test_recapture_while_awaiting_is_ignored() {
        let opener = MemoryOpener::new(vec![frames(&[])]);
        let mut pipeline = pipeline(opener, 0, 1);
        let mut state = PipelineState::new();
        let mut events: Vec<StatusEvent> = Vec::new();
        pipeline.start(&mut state, &mut events).unwrap();
        pipeline.recapture(&mut state, &mut events);
        assert_eq!(state.status(), PipelineStatus::AwaitingBackground);
        assert!(events.is_empty());
    }

    #[test]
    fn test_stop_is_idempotent_and_keeps_background() {
        let opener = MemoryOpener::new(vec![frames(&[GRAY, GRAY])]);
        let mut pipeline = pipeline(opener, 0, 1);
        let mut state = PipelineState::new();
        let mut events: Vec<StatusEvent> = Vec::new();
        pipeline.start(&mut state, &mut events).unwrap();
        pipeline.step(&mut state, &mut events).unwrap();

        pipeline.stop(&mut state);
        pipeline.stop(&mut state);
        assert_eq!(state.status(), PipelineStatus::Stopped);
        assert!(state.background().is_some());
        assert_eq!(pipeline.opener().live_handles(), 0);
        assert!(matches!(
            pipeline.step(&mut state, &mut events).unwrap(),
            StepOutcome::Idle
        ));
    }

    #[test]
    fn test_restart_with_background_goes_straight_to_running() {
        let opener = MemoryOpener::new(vec![frames(&[GRAY, GRAY]), frames(&[GREEN])]);
        let mut pipeline = pipeline(opener, 0, 1);
        let mut state = PipelineState::new();
        let mut events: Vec<StatusEvent> = Vec::new();
        pipeline.start(&mut state, &mut events).unwrap();
        pipeline.step(&mut state, &mut events).unwrap();
        pipeline.stop(&mut state);

        pipeline.start(&mut state, &mut events).unwrap();
        assert_eq!(state.status(), PipelineStatus::Running);
        let outcome = pipeline.step(&mut state, &mut events).unwrap();
        let StepOutcome::Rendered(processed) = outcome else {
            panic!("expected a rendered frame, got {outcome:?}");
        };
        assert_eq!(processed.output, Frame::filled(8, 6, GREEN));
        assert_eq!(pipeline.opener().open_count(), 2);
    }

    #[test]
    fn test_recapture_while_stopped_recaptures_on_next_start() {
        let opener = MemoryOpener::new(vec![frames(&[GRAY, GRAY]), frames(&[GRAY, GRAY])]);
        let mut pipeline = pipeline(opener, 0, 1);
        let mut state = PipelineState::new();
        let mut events: Vec<StatusEvent> = Vec::new();
        pipeline.start(&mut state, &mut events).unwrap();
        pipeline.step(&mut state, &mut events).unwrap();
        pipeline.stop(&mut state);

        pipeline.recapture(&mut state, &mut events);
        assert!(state.background().is_none());
        pipeline.start(&mut state, &mut events).unwrap();
        assert_eq!(state.status(), PipelineStatus::AwaitingBackground);
        assert!(!events.contains(&StatusEvent::RecaptureRequested));

        assert!(matches!(
            pipeline.step(&mut state, &mut events).unwrap(),
            StepOutcome::BackgroundCaptured
        ));
        assert_eq!(state.status(), PipelineStatus::Running);
    }

    #[test]
    fn test_warmup_reads_are_discarded_on_every_open() {
        let opener = MemoryOpener::new(vec![
            frames(&[RED, GRAY, GRAY]),
            frames(&[RED, RED, GREEN]),
        ]);
        let mut pipeline = CloakPipeline::new(
            opener,
            ColorMaskSegmenter::default(),
            MaskRefiner::default(),
            CaptureSettings {
                warmup_frames: 1,
                settle_frames: 0,
                sample_frames: 1,
            },
        );
        let mut state = PipelineState::new();
        let mut events: Vec<StatusEvent> = Vec::new();

        // The red warm-up frame never becomes the background
        pipeline.start(&mut state, &mut events).unwrap();
        pipeline.step(&mut state, &mut events).unwrap();
        assert_eq!(
            state.background().map(|b| b.frame().clone()),
            Some(Frame::filled(8, 6, GRAY))
        );
        pipeline.stop(&mut state);

        // A restart with a background held skips warm-up frames before compositing
        pipeline.capture.warmup_frames = 2;
        pipeline.start(&mut state, &mut events).unwrap();
        let outcome = pipeline.step(&mut state, &mut events).unwrap();
        let StepOutcome::Rendered(processed) = outcome else {
            panic!("expected a rendered frame, got {outcome:?}");
        };
        assert_eq!(processed.output, Frame::filled(8, 6, GREEN));
    }
}
