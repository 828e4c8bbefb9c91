//! Status notifications emitted by the pipeline for the presentation layer.

use std::fmt;

/// User-facing status changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    CapturingBackground,
    BackgroundCaptured,
    RecaptureRequested,
    CameraUnavailable,
    ReadErrorStopping,
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            StatusEvent::CapturingBackground => "Capturing background... Please step out of view!",
            StatusEvent::BackgroundCaptured => "Background captured!",
            StatusEvent::RecaptureRequested => "Background recapture requested...",
            StatusEvent::CameraUnavailable => "Cannot open camera. Please check permissions.",
            StatusEvent::ReadErrorStopping => "Could not read frame from camera. Stopping.",
        };
        f.write_str(message)
    }
}

/// Receiver for status events
pub trait EventSink {
    fn emit(&mut self, event: StatusEvent);
}

/// Collects events, mostly useful in tests
impl EventSink for Vec<StatusEvent> {
    fn emit(&mut self, event: StatusEvent) {
        self.push(event);
    }
}

/// Writes events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl EventSink for TracingEvents {
    fn emit(&mut self, event: StatusEvent) {
        match event {
            StatusEvent::CameraUnavailable => tracing::error!("{}", event),
            StatusEvent::ReadErrorStopping => tracing::warn!("{}", event),
            _ => tracing::info!("{}", event),
        }
    }
}
