//! Real-time "invisibility cloak" for a webcam feed.
//!
//! Pixels of the target color (red by default) are replaced with a
//! previously captured background. [`CloakPipeline`] drives the per-frame
//! path: read, segment, refine, composite.

pub mod background;
pub mod capture;
pub mod compositor;
pub mod config;
pub mod controls;
pub mod error;
pub mod events;
pub mod frame;
pub mod output;
pub mod pipeline;
pub mod segmentation;

pub use background::{Background, BackgroundManager, CaptureSettings};
pub use capture::{FrameSource, SourceOpener};
pub use compositor::composite;
pub use config::CloakConfig;
pub use error::CloakError;
pub use events::{EventSink, StatusEvent, TracingEvents};
pub use frame::Frame;
pub use pipeline::{CloakPipeline, PipelineState, PipelineStatus, Processed, StepOutcome};
pub use segmentation::{ColorMaskSegmenter, ColorRange, Mask, MaskRefiner};
