use super::types::Mask;
use serde::Deserialize;

/// Cleans up a raw color mask with morphological operations.
///
/// Opening (erode then dilate, `open_iterations` times each) drops small
/// isolated detections, then a final dilation regrows the surviving regions
/// and closes small gaps. Structuring elements are square `kernel_size`
/// boxes; pixels outside the image do not take part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MaskRefiner {
    pub kernel_size: u32,
    pub open_iterations: u32,
    pub dilate_iterations: u32,
}

impl Default for MaskRefiner {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            open_iterations: 2,
            dilate_iterations: 1,
        }
    }
}

impl MaskRefiner {
    pub fn refine(&self, mask: &Mask) -> Mask {
        let _span = tracing::debug_span!("refine").entered();
        let opened = self.open_only(mask);
        dilate(&opened, self.radius(), self.dilate_iterations)
    }

    /// The opening step alone
    pub fn open_only(&self, mask: &Mask) -> Mask {
        let eroded = erode(mask, self.radius(), self.open_iterations);
        dilate(&eroded, self.radius(), self.open_iterations)
    }

    fn radius(&self) -> u32 {
        self.kernel_size / 2
    }
}

/// Minimum filter over a `(2r+1)` square, repeated `iterations` times
pub fn erode(mask: &Mask, radius: u32, iterations: u32) -> Mask {
    morph(mask, radius, iterations, u8::min)
}

/// Maximum filter over a `(2r+1)` square, repeated `iterations` times
pub fn dilate(mask: &Mask, radius: u32, iterations: u32) -> Mask {
    morph(mask, radius, iterations, u8::max)
}

fn morph(mask: &Mask, radius: u32, iterations: u32, pick: fn(u8, u8) -> u8) -> Mask {
    let mut out = mask.clone();
    if radius == 0 {
        return out;
    }
    for _ in 0..iterations {
        // A square element separates into a row pass and a column pass
        let rows = pass(&out, radius, pick, true);
        out = pass(&rows, radius, pick, false);
    }
    out
}

fn pass(src: &Mask, radius: u32, pick: fn(u8, u8) -> u8, horizontal: bool) -> Mask {
    let (width, height) = src.dimensions();
    Mask::from_fn(width, height, |x, y| {
        let (center, limit) = if horizontal { (x, width) } else { (y, height) };
        let lo = center.saturating_sub(radius);
        let hi = (center + radius).min(limit - 1);
        let mut acc = src.get_pixel(x, y)[0];
        for i in lo..=hi {
            let v = if horizontal {
                src.get_pixel(i, y)[0]
            } else {
                src.get_pixel(x, i)[0]
            };
            acc = pick(acc, v);
        }
        image::Luma([acc])
    })
}
