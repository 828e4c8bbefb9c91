mod hsv;
mod refine;
mod segmenter;
pub mod types;

pub use hsv::bgr_to_hsv;
pub use refine::{dilate, erode, MaskRefiner};
pub use segmenter::ColorMaskSegmenter;
pub use types::{mask_area, ColorRange, Hsv, HsvRange, Mask};
