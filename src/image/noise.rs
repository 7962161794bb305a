use std::f64::consts::TAU;

use rayon::prelude::*;

use crate::foundation::math::{fade, lattice_hash, lerp};
use crate::image::buffer::FloatFrame;
use crate::profile::params::{NoiseParams, TextureParams};

fn gradient(seed: u64, ix: i64, iy: i64) -> (f64, f64) {
    let h = lattice_hash(seed, ix, iy);
    let angle = (h >> 11) as f64 * (1.0 / (1u64 << 53) as f64) * TAU;
    (angle.cos(), angle.sin())
}

/// 2-D gradient noise in roughly `[-0.71, 0.71]`, zero at lattice points.
pub fn perlin(seed: u64, x: f64, y: f64) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let (fx, fy) = (x - x0, y - y0);
    let (ix, iy) = (x0 as i64, y0 as i64);
    let dot = |gx: i64, gy: i64, dx: f64, dy: f64| {
        let (g0, g1) = gradient(seed, gx, gy);
        g0 * dx + g1 * dy
    };
    let n00 = dot(ix, iy, fx, fy);
    let n10 = dot(ix + 1, iy, fx - 1.0, fy);
    let n01 = dot(ix, iy + 1, fx, fy - 1.0);
    let n11 = dot(ix + 1, iy + 1, fx - 1.0, fy - 1.0);
    let u = fade(fx);
    let v = fade(fy);
    lerp(lerp(n00, n10, u), lerp(n01, n11, u), v)
}

/// Fractal sum of [`perlin`] octaves at pixel `(x, y)`, normalized to about `[-1, 1]`.
pub fn fbm(params: &NoiseParams, x: f64, y: f64) -> f64 {
    let mut sum = 0.0;
    let mut norm = 0.0;
    let mut amp = 1.0;
    let mut freq = 1.0 / params.cell_px.max(1.0);
    for octave in 0..params.octaves.max(1) {
        let seed = params.seed.wrapping_add(u64::from(octave));
        sum += amp * perlin(seed, x * freq, y * freq);
        norm += amp;
        amp *= 0.5;
        freq *= 2.0;
    }
    (sum / norm * std::f64::consts::SQRT_2).clamp(-1.0, 1.0)
}

fn blend_field(frame: &mut FloatFrame, opacity: f64, field: impl Fn(u32, u32) -> f64 + Sync) {
    if opacity <= 0.0 {
        return;
    }
    let alpha = opacity.clamp(0.0, 1.0) as f32;
    let c = usize::from(frame.channels);
    let colors = frame.color_channels();
    let stride = frame.stride();
    frame
        .data
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(c).enumerate() {
                let layer = (127.5 * (1.0 + field(x as u32, y as u32))) as f32;
                for v in &mut px[..colors] {
                    *v = ((1.0 - alpha) * *v + alpha * layer).clamp(0.0, 255.0);
                }
            }
        });
}

/// Blend a coherent gray noise layer over the frame at the drawn opacity.
pub fn apply_noise(frame: &mut FloatFrame, params: &NoiseParams) {
    blend_field(frame, params.opacity, |x, y| {
        fbm(params, f64::from(x) + 0.5, f64::from(y) + 0.5)
    });
}

/// Blend a per-pixel hashed texture over the frame.
pub fn apply_texture(frame: &mut FloatFrame, params: &TextureParams) {
    blend_field(frame, params.opacity, |x, y| {
        let h = lattice_hash(params.seed, i64::from(x), i64::from(y));
        (h >> 11) as f64 * (2.0 / (1u64 << 53) as f64) - 1.0
    });
}

#[cfg(test)]
#[path = "../../tests/unit/image/noise.rs"]
mod tests;
