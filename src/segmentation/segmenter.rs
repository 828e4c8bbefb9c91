use super::hsv::bgr_to_hsv;
use super::types::{ColorRange, Hsv, HsvRange, Mask, MASK_ON};
use crate::frame::Frame;

/// Produces a binary mask of the pixels that fall inside a target color range
#[derive(Debug, Clone, Default)]
pub struct ColorMaskSegmenter {
    range: ColorRange,
}

impl ColorMaskSegmenter {
    pub fn new(range: ColorRange) -> Self {
        Self { range }
    }

    /// Segment a BGR frame.
    ///
    /// Each sub-range yields its own component mask. Components are merged
    /// with saturating addition, so overlapping sub-ranges cannot wrap.
    pub fn segment(&self, frame: &Frame) -> Mask {
        let _span = tracing::debug_span!("segment").entered();

        let (width, height) = frame.dimensions();
        let hsv: Vec<Hsv> = frame.pixels().map(bgr_to_hsv).collect();

        let mut mask = Mask::new(width, height);
        for range in self.range.ranges() {
            let component = in_range(&hsv, width, height, range);
            accumulate(&mut mask, &component);
        }
        mask
    }
}

/// 255 where the pixel lies inside `range`, 0 elsewhere
fn in_range(hsv: &[Hsv], width: u32, height: u32, range: &HsvRange) -> Mask {
    let data = hsv
        .iter()
        .map(|&px| if range.contains(px) { MASK_ON } else { 0 })
        .collect();
    // Length is width * height by construction
    Mask::from_raw(width, height, data).unwrap_or_else(|| Mask::new(width, height))
}

fn accumulate(acc: &mut Mask, component: &Mask) {
    for (a, c) in acc.iter_mut().zip(component.iter()) {
        *a = a.saturating_add(*c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::types::mask_area;

    const RED: [u8; 3] = [0, 0, 255];
    const GREEN: [u8; 3] = [0, 255, 0];

    #[test]
    fn test_pure_red_is_fully_selected() {
        let frame = Frame::filled(4, 3, RED);
        let mask = ColorMaskSegmenter::default().segment(&frame);
        assert_eq!(mask.dimensions(), (4, 3));
        assert!(mask.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_pure_green_is_not_selected() {
        let frame = Frame::filled(4, 3, GREEN);
        let mask = ColorMaskSegmenter::default().segment(&frame);
        assert_eq!(mask_area(&mask), 0);
    }

    #[test]
    fn test_high_end_red_is_selected() {
        // Hue ~175, on the far side of the wraparound
        let frame = Frame::filled(2, 2, [40, 0, 255]);
        let mask = ColorMaskSegmenter::default().segment(&frame);
        assert_eq!(mask_area(&mask), 4);
    }

    #[test]
    fn test_dark_or_washed_out_red_is_rejected() {
        let dark = Frame::filled(1, 1, [0, 0, 60]);
        let pale = Frame::filled(1, 1, [200, 200, 255]);
        let segmenter = ColorMaskSegmenter::default();
        assert_eq!(mask_area(&segmenter.segment(&dark)), 0);
        assert_eq!(mask_area(&segmenter.segment(&pale)), 0);
    }

    #[test]
    fn test_overlapping_ranges_saturate() {
        let full = HsvRange::new(Hsv::new(0, 0, 0), Hsv::new(180, 255, 255));
        let segmenter = ColorMaskSegmenter::new(ColorRange::new(vec![full, full]));
        let mask = segmenter.segment(&Frame::filled(2, 1, GREEN));
        assert!(mask.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_low_only_range_selects_red_that_rounds_to_hue_zero() {
        // Hue works out to -0.5 units here, which rounds up to 0
        let low_red = ColorRange::new(vec![HsvRange::new(
            Hsv::new(0, 120, 70),
            Hsv::new(10, 255, 255),
        )]);
        let mask = ColorMaskSegmenter::new(low_red).segment(&Frame::filled(1, 1, [2, 0, 120]));
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_injected_range_selects_only_matching_pixels() {
        let green_only = ColorRange::new(vec![HsvRange::new(
            Hsv::new(50, 100, 100),
            Hsv::new(70, 255, 255),
        )]);
        let frame = Frame::from_fn(2, 1, |x, _| if x == 0 { GREEN } else { RED });
        let mask = ColorMaskSegmenter::new(green_only).segment(&frame);
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
        assert_eq!(mask.get_pixel(1, 0)[0], 0);
    }
}
