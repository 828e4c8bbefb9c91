//! Destinations for rendered frames.

mod loopback;
mod png_sequence;

pub use loopback::V4L2Output;
pub use png_sequence::PngSequenceOutput;

use anyhow::Result;
use image::RgbImage;

/// Trait for output destinations
pub trait OutputSink {
    /// Write a rendered RGB frame to the output
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Get the expected output resolution, if the sink has a fixed one
    fn resolution(&self) -> Option<(u32, u32)>;
}

impl<T: OutputSink + ?Sized> OutputSink for Box<T> {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        (**self).write_frame(frame)
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        (**self).resolution()
    }
}
