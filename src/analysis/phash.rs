use std::f64::consts::PI;

use crate::foundation::core::{RasterFrame, frame_byte_len};
use crate::foundation::error::{ShiftError, ShiftResult};

const PRE_SIZE: usize = 64;
const DCT_SIZE: usize = 32;
const HASH_SIZE: usize = 8;

/// Number of bits in a [`PerceptualHash`].
pub const HASH_BITS: u32 = 64;

/// 64-bit DCT perceptual hash. Bit `u * 8 + v` is set when DCT coefficient `(u, v)` exceeds the
/// median of the low-frequency block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PerceptualHash(pub u64);

impl PerceptualHash {
    /// Count of differing bits.
    pub fn hamming(self, other: Self) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// `hamming / 64 * 100`.
    pub fn delta_percent(self, other: Self) -> f64 {
        f64::from(self.hamming(other)) / f64::from(HASH_BITS) * 100.0
    }

    /// Sixteen lowercase hex digits.
    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }
}

impl std::fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Resize a single-channel plane by exact area averaging (box filter with fractional coverage).
pub fn area_resize(src: &[f64], sw: usize, sh: usize, dw: usize, dh: usize) -> Vec<f64> {
    let horizontal = resize_axis(src, sw, sh, dw, true);
    resize_axis(&horizontal, dw, sh, dh, false)
}

fn resize_axis(src: &[f64], w: usize, h: usize, out_len: usize, along_x: bool) -> Vec<f64> {
    let in_len = if along_x { w } else { h };
    let lanes = if along_x { h } else { w };
    let step = in_len as f64 / out_len as f64;
    // (first source index, weights) per output sample.
    let spans: Vec<(usize, Vec<f64>)> = (0..out_len)
        .map(|o| {
            let a = o as f64 * step;
            let b = a + step;
            let first = a.floor() as usize;
            let last = (b.ceil() as usize).min(in_len);
            let weights = (first..last)
                .map(|i| ((i + 1) as f64).min(b) - (i as f64).max(a))
                .map(|cover| cover / step)
                .collect();
            (first, weights)
        })
        .collect();
    let (out_w, out_h) = if along_x { (out_len, h) } else { (w, out_len) };
    let mut out = vec![0.0; out_w * out_h];
    for lane in 0..lanes {
        for (o, (first, weights)) in spans.iter().enumerate() {
            let mut acc = 0.0;
            for (k, wgt) in weights.iter().enumerate() {
                let i = first + k;
                let v = if along_x { src[lane * w + i] } else { src[i * w + lane] };
                acc += wgt * v;
            }
            if along_x {
                out[lane * out_w + o] = acc;
            } else {
                out[o * out_w + lane] = acc;
            }
        }
    }
    out
}

fn dct_table() -> Vec<f64> {
    let n = DCT_SIZE as f64;
    let mut t = vec![0.0; HASH_SIZE * DCT_SIZE];
    for u in 0..HASH_SIZE {
        for x in 0..DCT_SIZE {
            t[u * DCT_SIZE + x] = (PI * (2.0 * x as f64 + 1.0) * u as f64 / (2.0 * n)).cos();
        }
    }
    t
}

/// Low-frequency 8x8 block of the 2-D DCT-II of a 32x32 plane, row-major by `(u, v)`.
pub fn dct_low_block(plane: &[f64]) -> [f64; HASH_SIZE * HASH_SIZE] {
    let t = dct_table();
    // Rows first: 32 rows x 8 horizontal frequencies.
    let mut rows = [0.0; DCT_SIZE * HASH_SIZE];
    for y in 0..DCT_SIZE {
        for v in 0..HASH_SIZE {
            rows[y * HASH_SIZE + v] = (0..DCT_SIZE)
                .map(|x| plane[y * DCT_SIZE + x] * t[v * DCT_SIZE + x])
                .sum();
        }
    }
    let mut out = [0.0; HASH_SIZE * HASH_SIZE];
    for u in 0..HASH_SIZE {
        for v in 0..HASH_SIZE {
            out[u * HASH_SIZE + v] = (0..DCT_SIZE)
                .map(|y| rows[y * HASH_SIZE + v] * t[u * DCT_SIZE + y])
                .sum();
        }
    }
    out
}

fn median(values: &[f64]) -> f64 {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) * 0.5
    } else {
        v[mid]
    }
}

/// Hash a frame: luma, coarse 64x64 area pre-downsample, 32x32 area downsample, DCT, median split.
pub fn phash(frame: &RasterFrame) -> ShiftResult<PerceptualHash> {
    let expected = frame_byte_len(frame.width, frame.height, frame.channels)
        .map_err(|e| ShiftError::analysis(e.to_string()))?;
    if !matches!(frame.channels, 1 | 3 | 4)
        || frame.width == 0
        || frame.height == 0
        || frame.data.len() != expected
    {
        return Err(ShiftError::analysis(format!(
            "cannot hash malformed frame {}x{}x{} with {} bytes",
            frame.width,
            frame.height,
            frame.channels,
            frame.data.len()
        )));
    }
    let luma: Vec<f64> = frame.luma().into_iter().map(|v| f64::from(v) * 255.0).collect();
    let (w, h) = (frame.width as usize, frame.height as usize);
    let coarse = area_resize(&luma, w, h, PRE_SIZE, PRE_SIZE);
    let small = area_resize(&coarse, PRE_SIZE, PRE_SIZE, DCT_SIZE, DCT_SIZE);
    let block = dct_low_block(&small);
    if block.iter().any(|v| !v.is_finite()) {
        return Err(ShiftError::analysis("non-finite DCT coefficient"));
    }
    let med = median(&block);
    let bits = block
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, &c)| if c > med { acc | (1u64 << i) } else { acc });
    Ok(PerceptualHash(bits))
}

#[cfg(test)]
#[path = "../../tests/unit/analysis/phash.rs"]
mod tests;
