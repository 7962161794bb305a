//! Duration-preserving pitch shift: WSOLA time-stretch by the pitch ratio, then resample back by
//! its inverse.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use crate::foundation::error::{ShiftError, ShiftResult};

const WINDOW: usize = 1024;
const SYNTH_HOP: usize = WINDOW / 2;
const SEEK: usize = 128;
const RESAMPLE_CHUNK: usize = 4096;

fn hann(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let x = std::f32::consts::PI * i as f32 / n as f32;
            x.sin().powi(2)
        })
        .collect()
}

fn mono_mix(planar: &[Vec<f32>]) -> Vec<f32> {
    let len = planar.first().map(Vec::len).unwrap_or(0);
    let inv = 1.0 / planar.len().max(1) as f32;
    (0..len)
        .map(|i| planar.iter().map(|c| c[i]).sum::<f32>() * inv)
        .collect()
}

fn best_offset(guide: &[f32], natural: usize, nominal: usize) -> usize {
    let lo = nominal.saturating_sub(SEEK);
    let hi = (nominal + SEEK).min(guide.len().saturating_sub(WINDOW));
    if lo >= hi || natural + WINDOW > guide.len() {
        return nominal.min(guide.len().saturating_sub(WINDOW));
    }
    let reference = &guide[natural..natural + WINDOW];
    let mut best = nominal.clamp(lo, hi);
    let mut best_score = f32::NEG_INFINITY;
    for cand in (lo..=hi).step_by(2) {
        let seg = &guide[cand..cand + WINDOW];
        let score: f32 = seg
            .iter()
            .zip(reference)
            .step_by(2)
            .map(|(a, b)| a * b)
            .sum();
        if score > best_score {
            best_score = score;
            best = cand;
        }
    }
    best
}

/// Stretch every channel to `ratio` times its length without changing pitch.
///
/// Segment alignment is chosen on the mono mix and applied to all channels so they stay phase
/// coherent. Inputs shorter than two windows are returned unchanged.
pub fn wsola_stretch(planar: &[Vec<f32>], ratio: f64) -> Vec<Vec<f32>> {
    let len = planar.first().map(Vec::len).unwrap_or(0);
    if len < 2 * WINDOW || (ratio - 1.0).abs() < 1e-9 {
        return planar.to_vec();
    }
    let out_len = (len as f64 * ratio).round() as usize;
    let guide = mono_mix(planar);
    let window = hann(WINDOW);
    let mut out = vec![vec![0.0f32; out_len + WINDOW]; planar.len()];
    let mut norm = vec![0.0f32; out_len + WINDOW];

    let mut prev: Option<usize> = None;
    let mut synth = 0usize;
    while synth < out_len {
        let nominal = ((synth as f64 / ratio).round() as usize).min(len - WINDOW);
        let pos = match prev {
            None => nominal,
            Some(p) => best_offset(&guide, p + SYNTH_HOP, nominal),
        };
        for (dst, src) in out.iter_mut().zip(planar) {
            for i in 0..WINDOW {
                dst[synth + i] += src[pos + i] * window[i];
            }
        }
        for (n, w) in norm[synth..synth + WINDOW].iter_mut().zip(&window) {
            *n += w;
        }
        prev = Some(pos);
        synth += SYNTH_HOP;
    }

    for ch in &mut out {
        for (s, &n) in ch.iter_mut().zip(&norm) {
            if n > 1e-3 {
                *s /= n;
            }
        }
        ch.truncate(out_len);
    }
    out
}

/// Resample each channel by `ratio` (output/input length) with a polynomial resampler.
pub fn resample(planar: &[Vec<f32>], ratio: f64) -> ShiftResult<Vec<Vec<f32>>> {
    let channels = planar.len();
    let len = planar.first().map(Vec::len).unwrap_or(0);
    if channels == 0 || len == 0 || (ratio - 1.0).abs() < 1e-12 {
        return Ok(planar.to_vec());
    }
    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        1.0,
        PolynomialDegree::Septic,
        RESAMPLE_CHUNK,
        channels,
    )
    .map_err(|e| ShiftError::transform(format!("failed to create resampler: {e}")))?;
    let delay = resampler.output_delay();
    let mut out = vec![Vec::with_capacity((len as f64 * ratio) as usize + delay + 16); channels];

    let mut pos = 0usize;
    while pos + RESAMPLE_CHUNK <= len {
        let slices: Vec<&[f32]> = planar.iter().map(|c| &c[pos..pos + RESAMPLE_CHUNK]).collect();
        let chunk = resampler
            .process(&slices, None)
            .map_err(|e| ShiftError::transform(format!("resampling failed: {e}")))?;
        for (dst, src) in out.iter_mut().zip(chunk) {
            dst.extend(src);
        }
        pos += RESAMPLE_CHUNK;
    }
    if pos < len {
        let tail: Vec<&[f32]> = planar.iter().map(|c| &c[pos..]).collect();
        let chunk = resampler
            .process_partial(Some(tail.as_slice()), None)
            .map_err(|e| ShiftError::transform(format!("resampling failed: {e}")))?;
        for (dst, src) in out.iter_mut().zip(chunk) {
            dst.extend(src);
        }
    }
    let flush = resampler
        .process_partial::<&[f32]>(None, None)
        .map_err(|e| ShiftError::transform(format!("resampling failed: {e}")))?;
    for (dst, src) in out.iter_mut().zip(flush) {
        dst.extend(src);
    }

    let want = (len as f64 * ratio).round() as usize;
    for ch in &mut out {
        ch.drain(..delay.min(ch.len()));
        ch.resize(want, 0.0);
    }
    Ok(out)
}

/// Raise pitch by `ratio` while keeping exactly the input length.
pub fn pitch_shift(planar: &[Vec<f32>], ratio: f64) -> ShiftResult<Vec<Vec<f32>>> {
    if !(ratio.is_finite() && ratio > 0.0) {
        return Err(ShiftError::transform(format!("invalid pitch ratio {ratio}")));
    }
    let len = planar.first().map(Vec::len).unwrap_or(0);
    let stretched = wsola_stretch(planar, ratio);
    let stretched_len = stretched.first().map(Vec::len).unwrap_or(0);
    if stretched_len == len {
        return Ok(stretched);
    }
    let mut out = resample(&stretched, len as f64 / stretched_len as f64)?;
    for ch in &mut out {
        ch.resize(len, 0.0);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/pitch.rs"]
mod tests;
