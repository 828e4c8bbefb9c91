use image::GrayImage;
use serde::Deserialize;

/// Binary per-pixel selector: 255 inside the cloak region, 0 elsewhere.
/// Dimensions match the frame it was computed from.
pub type Mask = GrayImage;

/// Value written into a mask for a selected pixel
pub const MASK_ON: u8 = 255;

/// Number of non-zero pixels in a mask
pub fn mask_area(mask: &Mask) -> usize {
    mask.as_raw().iter().filter(|&&v| v != 0).count()
}

/// A color in 8-bit hue-saturation-value space.
///
/// Hue is half the angle in degrees (0..=179), saturation and value span
/// 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "[u8; 3]")]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

impl From<[u8; 3]> for Hsv {
    fn from([h, s, v]: [u8; 3]) -> Self {
        Self { h, s, v }
    }
}

/// Inclusive HSV box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HsvRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl HsvRange {
    pub const fn new(lower: Hsv, upper: Hsv) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: Hsv) -> bool {
        (self.lower.h..=self.upper.h).contains(&hsv.h)
            && (self.lower.s..=self.upper.s).contains(&hsv.s)
            && (self.lower.v..=self.upper.v).contains(&hsv.v)
    }

    /// True when no bound is above its upper counterpart
    pub fn is_ordered(&self) -> bool {
        self.lower.h <= self.upper.h && self.lower.s <= self.upper.s && self.lower.v <= self.upper.v
    }
}

/// Target color as a union of HSV sub-ranges.
///
/// Colors that straddle the ends of the hue circle (red) are expressed as
/// two sub-ranges, one at each end.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColorRange {
    ranges: Vec<HsvRange>,
}

impl ColorRange {
    pub fn new(ranges: Vec<HsvRange>) -> Self {
        Self { ranges }
    }

    /// Bright red: both ends of the hue circle, saturation >= 120, value >= 70
    pub fn red() -> Self {
        Self::new(vec![
            HsvRange::new(Hsv::new(0, 120, 70), Hsv::new(10, 255, 255)),
            HsvRange::new(Hsv::new(170, 120, 70), Hsv::new(180, 255, 255)),
        ])
    }

    pub fn ranges(&self) -> &[HsvRange] {
        &self.ranges
    }
}

impl Default for ColorRange {
    fn default() -> Self {
        Self::red()
    }
}
