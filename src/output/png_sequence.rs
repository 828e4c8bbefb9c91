use super::OutputSink;
use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Writes each rendered frame as a numbered PNG file
pub struct PngSequenceOutput {
    dir: PathBuf,
    next_index: u64,
}

impl PngSequenceOutput {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        tracing::info!("Writing frames to {}", dir.display());
        Ok(Self { dir, next_index: 0 })
    }

    fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

impl OutputSink for PngSequenceOutput {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let path = self.path_for(self.next_index);
        frame
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.next_index += 1;
        Ok(())
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        None
    }
}
