use crate::background::Background;
use crate::error::{CloakError, Result};
use crate::frame::{Frame, CHANNELS};
use crate::segmentation::Mask;

/// Replace masked pixels of `frame` with the matching `background` pixels.
///
/// Computed as `(background & mask) + (frame & !mask)` with saturating
/// per-channel addition. The two terms never overlap, so no channel clips.
pub fn composite(frame: &Frame, background: &Background, mask: &Mask) -> Result<Frame> {
    let _span = tracing::debug_span!("composite").entered();

    let expected = mask.dimensions();
    for actual in [frame.dimensions(), background.dimensions()] {
        if actual != expected {
            return Err(CloakError::ShapeMismatch { expected, actual });
        }
    }

    let data = frame
        .as_raw()
        .chunks_exact(CHANNELS)
        .zip(background.frame().as_raw().chunks_exact(CHANNELS))
        .zip(mask.as_raw())
        .flat_map(|((fg, bg), &m)| {
            let keep = !m;
            [0usize, 1, 2].map(|c| (bg[c] & m).saturating_add(fg[c] & keep))
        })
        .collect();

    Frame::from_raw(expected.0, expected.1, data).ok_or(CloakError::ShapeMismatch {
        expected,
        actual: frame.dimensions(),
    })
}
