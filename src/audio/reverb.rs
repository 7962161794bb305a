use crate::profile::params::ReverbTap;

/// Stereo spread added to each successive channel's tap delays, in milliseconds.
const CHANNEL_SPREAD_MS: f64 = 0.37;

/// Convolve each channel with a sparse early-reflection response and mix at `wet`.
///
/// Output length equals input length; reflections past the end are dropped.
pub fn apply_reverb(planar: &mut [Vec<f32>], sample_rate: u32, taps: &[ReverbTap], wet: f64) {
    if wet <= 0.0 || taps.is_empty() {
        return;
    }
    let fs = f64::from(sample_rate);
    for (c, ch) in planar.iter_mut().enumerate() {
        let kernel: Vec<(usize, f32)> = taps
            .iter()
            .map(|t| {
                let ms = t.delay_ms + CHANNEL_SPREAD_MS * c as f64;
                (((ms / 1000.0) * fs).round() as usize, t.gain as f32)
            })
            .filter(|&(d, _)| d > 0)
            .collect();
        let dry = ch.clone();
        let wet = wet as f32;
        for (n, out) in ch.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for &(d, g) in &kernel {
                if let Some(i) = n.checked_sub(d) {
                    acc += g * dry[i];
                }
            }
            *out = dry[n] + wet * acc;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/reverb.rs"]
mod tests;
