use super::{FrameSource, SourceOpener};
use crate::error::{CloakError, Result};
use crate::frame::Frame;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory frame source that replays a scripted sequence of reads.
///
/// Once the script is exhausted every read fails with `ReadError`.
pub struct MemorySource {
    reads: VecDeque<Result<Frame>>,
    resolution: (u32, u32),
    live: Option<Arc<AtomicUsize>>,
}

impl MemorySource {
    pub fn new(reads: Vec<Result<Frame>>) -> Self {
        let resolution = reads
            .iter()
            .find_map(|r| r.as_ref().ok().map(Frame::dimensions))
            .unwrap_or((0, 0));
        Self {
            reads: reads.into(),
            resolution,
            live: None,
        }
    }

    /// Source that yields each frame once, in order
    pub fn from_frames<I: IntoIterator<Item = Frame>>(frames: I) -> Self {
        Self::new(frames.into_iter().map(Ok).collect())
    }

    /// Number of scripted reads not yet consumed
    pub fn remaining(&self) -> usize {
        self.reads.len()
    }
}

impl FrameSource for MemorySource {
    fn read_frame(&mut self) -> Result<Frame> {
        self.reads
            .pop_front()
            .unwrap_or_else(|| Err(CloakError::ReadError("end of stream".into())))
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }
}

impl Drop for MemorySource {
    fn drop(&mut self) {
        if let Some(live) = &self.live {
            live.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Hands out scripted [`MemorySource`]s, one per `open()`.
///
/// Opening after the queue is empty fails with `DeviceUnavailable`. The
/// opener tracks how many of its sources are still alive.
#[derive(Default)]
pub struct MemoryOpener {
    sources: VecDeque<MemorySource>,
    live: Arc<AtomicUsize>,
    opened: usize,
}

impl MemoryOpener {
    pub fn new(sources: Vec<MemorySource>) -> Self {
        Self {
            sources: sources.into(),
            ..Default::default()
        }
    }

    /// Opener whose device can never be opened
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Sources opened and not yet dropped
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Total successful opens
    pub fn open_count(&self) -> usize {
        self.opened
    }
}

impl SourceOpener for MemoryOpener {
    type Source = MemorySource;

    fn open(&mut self) -> Result<MemorySource> {
        let mut source = self
            .sources
            .pop_front()
            .ok_or_else(|| CloakError::DeviceUnavailable("no scripted device".into()))?;
        self.live.fetch_add(1, Ordering::AcqRel);
        source.live = Some(Arc::clone(&self.live));
        self.opened += 1;
        Ok(source)
    }
}
