use super::types::Hsv;

/// Convert one BGR pixel to 8-bit HSV.
///
/// Hue is scaled to 0..=179 (degrees / 2, halves rounded up), saturation is
/// `255 * (max - min) / max` and value is the largest channel.
pub fn bgr_to_hsv([b, g, r]: [u8; 3]) -> Hsv {
    let (b, g, r) = (b as i32, g as i32, r as i32);
    let v = b.max(g).max(r);
    let min = b.min(g).min(r);
    let diff = v - min;

    let s = if v == 0 {
        0
    } else {
        (255 * diff + v / 2) / v
    };

    let h = if diff == 0 {
        0
    } else {
        // Sector offsets in units of `diff`, a full turn being 6 * diff
        let sector = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        // floor(sector * 30 / diff + 0.5), rounding halves upward
        let mut h = (sector * 60 + diff).div_euclid(2 * diff);
        if h < 0 {
            h += 180;
        }
        if h >= 180 {
            h -= 180;
        }
        h
    };

    Hsv::new(h as u8, s as u8, v as u8)
}
