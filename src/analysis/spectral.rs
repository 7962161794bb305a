use std::f64::consts::PI;

use crate::foundation::core::AudioTrack;
use crate::foundation::error::{ShiftError, ShiftResult};

/// Time-frequency analysis settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Hann window length in samples.
    pub window: usize,
    /// Hop between windows in samples.
    pub hop: usize,
    /// Number of log-spaced bands.
    pub bands: usize,
    /// Lowest band center in Hz.
    pub min_hz: f64,
    /// Highest band center in Hz, capped below Nyquist.
    pub max_hz: f64,
    /// Only the first this-many seconds are compared.
    pub max_seconds: f64,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            window: 1024,
            hop: 512,
            bands: 32,
            min_hz: 60.0,
            max_hz: 16_000.0,
            max_seconds: 60.0,
        }
    }
}

fn band_centers(cfg: &SpectralConfig, sample_rate: u32) -> Vec<f64> {
    let top = cfg.max_hz.min(0.45 * f64::from(sample_rate)).max(cfg.min_hz);
    let n = cfg.bands.max(1);
    if n == 1 {
        return vec![cfg.min_hz];
    }
    let ratio = (top / cfg.min_hz).ln() / (n - 1) as f64;
    (0..n).map(|i| cfg.min_hz * (ratio * i as f64).exp()).collect()
}

fn goertzel(frame: &[f64], freq: f64, sample_rate: f64) -> f64 {
    let coeff = 2.0 * (2.0 * PI * freq / sample_rate).cos();
    let (mut s1, mut s2) = (0.0, 0.0);
    for &x in frame {
        let s0 = x + coeff * s1 - s2;
        s2 = s1;
        s1 = s0;
    }
    (s1 * s1 + s2 * s2 - coeff * s1 * s2).max(0.0).sqrt()
}

/// Flattened `frames x bands` magnitude matrix of a mono signal.
pub fn spectrogram(mono: &[f32], sample_rate: u32, cfg: &SpectralConfig) -> Vec<f64> {
    let window = cfg.window.max(16);
    let hop = cfg.hop.max(1);
    let limit = ((cfg.max_seconds * f64::from(sample_rate)) as usize).min(mono.len());
    let signal = &mono[..limit];
    if signal.len() < window {
        return Vec::new();
    }
    let hann: Vec<f64> = (0..window)
        .map(|i| (PI * i as f64 / window as f64).sin().powi(2))
        .collect();
    let centers = band_centers(cfg, sample_rate);
    let fs = f64::from(sample_rate);
    let mut out = Vec::with_capacity((signal.len() / hop + 1) * centers.len());
    let mut buf = vec![0.0; window];
    let mut start = 0;
    while start + window <= signal.len() {
        for (i, b) in buf.iter_mut().enumerate() {
            *b = f64::from(signal[start + i]) * hann[i];
        }
        out.extend(centers.iter().map(|&f| goertzel(&buf, f, fs)));
        start += hop;
    }
    out
}

/// Cosine similarity of two non-negative vectors over their common prefix, in percent.
pub fn cosine_similarity_percent(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    let (mut dot, mut na, mut nb) = (0.0, 0.0, 0.0);
    for i in 0..n {
        dot += a[i] * b[i];
        na += a[i] * a[i];
        nb += b[i] * b[i];
    }
    match (na > 0.0, nb > 0.0) {
        (false, false) => 100.0,
        (true, true) => (dot / (na.sqrt() * nb.sqrt()) * 100.0).clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Spectral similarity between two tracks in percent (100 means identical spectra).
pub fn audio_similarity(
    source: &AudioTrack,
    output: &AudioTrack,
    cfg: &SpectralConfig,
) -> ShiftResult<f64> {
    if source.sample_rate != output.sample_rate {
        return Err(ShiftError::analysis(format!(
            "sample rate mismatch: source {} Hz, output {} Hz",
            source.sample_rate, output.sample_rate
        )));
    }
    let a = spectrogram(&source.mono(), source.sample_rate, cfg);
    let b = spectrogram(&output.mono(), output.sample_rate, cfg);
    if a.is_empty() || b.is_empty() {
        return Err(ShiftError::analysis(
            "audio too short for spectral comparison",
        ));
    }
    let sim = cosine_similarity_percent(&a, &b);
    if !sim.is_finite() {
        return Err(ShiftError::analysis("non-finite spectral similarity"));
    }
    Ok(sim)
}

#[cfg(test)]
#[path = "../../tests/unit/analysis/spectral.rs"]
mod tests;
