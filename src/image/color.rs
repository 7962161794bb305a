//! Oklab color micro-shift.
//!
//! Hue, chroma and lightness are adjusted in OkLCh so the change reads as neutral grading rather
//! than a channel tint.

use rayon::prelude::*;

use crate::image::buffer::FloatFrame;
use crate::profile::params::ColorShift;

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Convert sRGB in `[0, 1]` to Oklab `(L, a, b)`.
pub fn srgb_to_oklab(rgb: [f32; 3]) -> [f32; 3] {
    let [r, g, b] = rgb.map(srgb_to_linear);
    let l = 0.412_221_46 * r + 0.536_332_55 * g + 0.051_445_995 * b;
    let m = 0.211_903_5 * r + 0.680_699_5 * g + 0.107_396_96 * b;
    let s = 0.088_302_46 * r + 0.281_718_85 * g + 0.629_978_7 * b;
    let (l, m, s) = (l.cbrt(), m.cbrt(), s.cbrt());
    [
        0.210_454_26 * l + 0.793_617_8 * m - 0.004_072_047 * s,
        1.977_998_5 * l - 2.428_592_2 * m + 0.450_593_7 * s,
        0.025_904_037 * l + 0.782_771_77 * m - 0.808_675_77 * s,
    ]
}

/// Convert Oklab back to sRGB in `[0, 1]` (unclamped).
pub fn oklab_to_srgb(lab: [f32; 3]) -> [f32; 3] {
    let [l, a, b] = lab;
    let l_ = l + 0.396_337_78 * a + 0.215_803_76 * b;
    let m_ = l - 0.105_561_346 * a - 0.063_854_17 * b;
    let s_ = l - 0.089_484_18 * a - 1.291_485_5 * b;
    let (l, m, s) = (l_ * l_ * l_, m_ * m_ * m_, s_ * s_ * s_);
    [
        4.076_741_7 * l - 3.307_711_6 * m + 0.230_969_94 * s,
        -1.268_438 * l + 2.609_757_4 * m - 0.341_319_38 * s,
        -0.004_196_086_3 * l - 0.703_418_6 * m + 1.707_614_7 * s,
    ]
    .map(linear_to_srgb)
}

/// Shift one pixel's lightness, chroma and hue.
pub fn shift_pixel(rgb: [f32; 3], shift: &ColorShift) -> [f32; 3] {
    let [l, a, b] = srgb_to_oklab(rgb);
    let chroma = a.hypot(b) * (1.0 + shift.saturation as f32);
    let hue = b.atan2(a) + (shift.hue_deg as f32).to_radians();
    let l = (l * (1.0 + shift.lightness as f32)).clamp(0.0, 1.0);
    oklab_to_srgb([l, chroma * hue.cos(), chroma * hue.sin()]).map(|v| v.clamp(0.0, 1.0))
}

/// Apply the shift to every pixel of a frame with at least three color channels.
pub fn apply_color_shift(frame: &mut FloatFrame, shift: &ColorShift) {
    if frame.color_channels() < 3 {
        // Gray frames only carry lightness.
        let gain = (1.0 + shift.lightness) as f32;
        frame
            .data
            .par_iter_mut()
            .for_each(|v| *v = (*v * gain).clamp(0.0, 255.0));
        return;
    }
    let c = usize::from(frame.channels);
    frame.data.par_chunks_mut(c).for_each(|px| {
        let rgb = [px[0] / 255.0, px[1] / 255.0, px[2] / 255.0];
        let out = shift_pixel(rgb, shift);
        for (dst, v) in px.iter_mut().zip(out) {
            *dst = v * 255.0;
        }
    });
}

#[cfg(test)]
#[path = "../../tests/unit/image/color.rs"]
mod tests;
