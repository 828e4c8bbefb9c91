//! Frame type shared by every stage of the pipeline.
//!
//! Pixels are stored in blue-green-red order. Conversion to RGB happens only
//! at the device boundary (camera decode) and the presentation boundary
//! (rendered output).

use image::{GrayImage, Rgb, RgbImage};

/// Bytes per pixel (B, G, R)
pub const CHANNELS: usize = 3;

/// A captured camera frame in BGR order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Create a frame filled with a single BGR color
    pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let data = bgr
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS)
            .collect();
        Self {
            data,
            width,
            height,
        }
    }

    /// Build a frame from raw BGR bytes. Returns `None` if the buffer length
    /// does not match the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * CHANNELS {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
        })
    }

    /// Build a frame by evaluating `f(x, y) -> [b, g, r]` for every pixel
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [u8; 3],
    {
        let mut data = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Convert packed RGB bytes (as decoded from the camera) into a BGR frame.
    /// Returns `None` if the buffer length does not match the dimensions.
    pub fn from_rgb_bytes(width: u32, height: u32, rgb: &[u8]) -> Option<Self> {
        if rgb.len() != width as usize * height as usize * CHANNELS {
            return None;
        }
        let data = rgb
            .chunks_exact(CHANNELS)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect();
        Some(Self {
            data,
            width,
            height,
        })
    }

    /// Convert an RGB image into a BGR frame
    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let data = image
            .as_raw()
            .chunks_exact(CHANNELS)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect();
        Self {
            data,
            width,
            height,
        }
    }

    /// Convert to an RGB image for display
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let [b, g, r] = self.pixel(x, y);
            Rgb([r, g, b])
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw BGR bytes, row-major
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// BGR triple at (x, y). Panics if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Iterate over BGR pixels in row-major order
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data
            .chunks_exact(CHANNELS)
            .map(|px| [px[0], px[1], px[2]])
    }

    /// Mirror the frame horizontally (flip left-right) in place
    pub fn mirror_horizontal(&mut self) {
        let width = self.width as usize;
        let row_len = width * CHANNELS;
        if row_len == 0 {
            return;
        }

        for row in self.data.chunks_exact_mut(row_len) {
            for x in 0..width / 2 {
                let left = x * CHANNELS;
                let right = (width - 1 - x) * CHANNELS;
                for i in 0..CHANNELS {
                    row.swap(left + i, right + i);
                }
            }
        }
    }
}

/// Render a binary mask as a grayscale RGB image
pub fn mask_to_rgb(mask: &GrayImage) -> RgbImage {
    RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        let value = mask.get_pixel(x, y)[0];
        Rgb([value, value, value])
    })
}
