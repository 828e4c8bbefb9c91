use super::OutputSink;
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Virtual camera output through a v4l2loopback device
pub struct V4L2Output {
    file: File,
    width: u32,
    height: u32,
}

impl V4L2Output {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening v4l2loopback device at {} ({}x{})",
            path.display(),
            width,
            height
        );

        // v4l2loopback accepts raw frames written straight to the device file
        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open v4l2loopback device at {}", path.display()))?;

        Ok(Self {
            file,
            width,
            height,
        })
    }
}

/// Pack an RGB image as YUYV (YUV 4:2:2), the format v4l2loopback expects.
///
/// Each pair of pixels shares one U and one V sample. An odd last column is
/// paired with itself.
pub fn rgb_to_yuyv(rgb_image: &RgbImage) -> Vec<u8> {
    let (width, height) = rgb_image.dimensions();
    let mut yuyv = Vec::with_capacity((width.div_ceil(2) * 4 * height) as usize);

    for y in 0..height {
        for x in (0..width).step_by(2) {
            let left = rgb_image.get_pixel(x, y);
            let right = if x + 1 < width {
                rgb_image.get_pixel(x + 1, y)
            } else {
                left
            };

            let (y1, u1, v1) = rgb_to_yuv(left[0], left[1], left[2]);
            let (y2, u2, v2) = rgb_to_yuv(right[0], right[1], right[2]);
            let u = ((u1 as u16 + u2 as u16) / 2) as u8;
            let v = ((v1 as u16 + v2 as u16) / 2) as u8;

            yuyv.extend_from_slice(&[y1, u, y2, v]);
        }
    }

    yuyv
}

fn rgb_to_yuv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (r as f32, g as f32, b as f32);

    let y = (0.299 * r + 0.587 * g + 0.114 * b).clamp(0.0, 255.0) as u8;
    let u = ((-0.147 * r - 0.289 * g + 0.436 * b) + 128.0).clamp(0.0, 255.0) as u8;
    let v = ((0.615 * r - 0.515 * g - 0.100 * b) + 128.0).clamp(0.0, 255.0) as u8;

    (y, u, v)
}

impl OutputSink for V4L2Output {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let yuyv = if frame.dimensions() != (self.width, self.height) {
            let resized = imageops::resize(frame, self.width, self.height, FilterType::Triangle);
            rgb_to_yuyv(&resized)
        } else {
            rgb_to_yuyv(frame)
        };

        self.file
            .write_all(&yuyv)
            .context("Failed to write frame to v4l2loopback device")
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        Some((self.width, self.height))
    }
}
