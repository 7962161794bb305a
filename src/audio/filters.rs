use std::f64::consts::PI;

use crate::foundation::math::Rng64;

/// Normalized RBJ biquad coefficients (`a0 == 1`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    fn normalized(b: [f64; 3], a: [f64; 3]) -> Self {
        Self {
            b0: b[0] / a[0],
            b1: b[1] / a[0],
            b2: b[2] / a[0],
            a1: a[1] / a[0],
            a2: a[2] / a[0],
        }
    }

    /// Second-order high-pass at `f0` Hz.
    pub fn high_pass(sample_rate: f64, f0: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * f0 / sample_rate;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q);
        Self::normalized(
            [(1.0 + cos) / 2.0, -(1.0 + cos), (1.0 + cos) / 2.0],
            [1.0 + alpha, -2.0 * cos, 1.0 - alpha],
        )
    }

    /// High shelf at `f0` Hz with `gain_db` boost (negative cuts), shelf slope 1.
    pub fn high_shelf(sample_rate: f64, f0: f64, gain_db: f64) -> Self {
        let a = 10f64.powf(gain_db / 40.0);
        let w0 = 2.0 * PI * f0 / sample_rate;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / 2.0 * 2f64.sqrt();
        let sqa = 2.0 * a.sqrt() * alpha;
        Self::normalized(
            [
                a * ((a + 1.0) + (a - 1.0) * cos + sqa),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cos),
                a * ((a + 1.0) + (a - 1.0) * cos - sqa),
            ],
            [
                (a + 1.0) - (a - 1.0) * cos + sqa,
                2.0 * ((a - 1.0) - (a + 1.0) * cos),
                (a + 1.0) - (a - 1.0) * cos - sqa,
            ],
        )
    }

    /// Magnitude response at `freq` Hz.
    pub fn magnitude_at(&self, sample_rate: f64, freq: f64) -> f64 {
        let w = 2.0 * PI * freq / sample_rate;
        let (c1, s1) = (w.cos(), -w.sin());
        let (c2, s2) = ((2.0 * w).cos(), -(2.0 * w).sin());
        let num = (self.b0 + self.b1 * c1 + self.b2 * c2, self.b1 * s1 + self.b2 * s2);
        let den = (1.0 + self.a1 * c1 + self.a2 * c2, self.a1 * s1 + self.a2 * s2);
        num.0.hypot(num.1) / den.0.hypot(den.1)
    }
}

/// Transposed direct form II biquad state.
#[derive(Clone, Copy, Debug)]
pub struct Biquad {
    c: BiquadCoeffs,
    z1: f64,
    z2: f64,
}

impl Biquad {
    /// Zero-state filter.
    pub fn new(c: BiquadCoeffs) -> Self {
        Self { c, z1: 0.0, z2: 0.0 }
    }

    /// Filter one sample.
    pub fn process(&mut self, x: f64) -> f64 {
        let y = self.c.b0 * x + self.z1;
        self.z1 = self.c.b1 * x - self.c.a1 * y + self.z2;
        self.z2 = self.c.b2 * x - self.c.a2 * y;
        y
    }

    /// Filter a whole buffer in place.
    pub fn run(&mut self, buf: &mut [f32]) {
        for s in buf {
            *s = self.process(f64::from(*s)) as f32;
        }
    }
}

/// Run `coeffs` over every channel with independent state.
pub fn filter_channels(planar: &mut [Vec<f32>], coeffs: BiquadCoeffs) {
    for ch in planar {
        Biquad::new(coeffs).run(ch);
    }
}

/// Add seeded white noise, high-passed above `cutoff_hz`, at `amplitude` peak.
///
/// Skipped when the band sits too close to Nyquist to be represented.
pub fn add_ultrasonic_noise(
    planar: &mut [Vec<f32>],
    sample_rate: u32,
    cutoff_hz: f64,
    amplitude: f64,
    seed: u64,
) {
    let fs = f64::from(sample_rate);
    if amplitude <= 0.0 || cutoff_hz >= 0.45 * fs {
        return;
    }
    let hp = BiquadCoeffs::high_pass(fs, cutoff_hz, std::f64::consts::FRAC_1_SQRT_2);
    for (c, ch) in planar.iter_mut().enumerate() {
        let mut rng = Rng64::new(seed).fork(c as u64 + 1);
        let mut stages = [Biquad::new(hp); 4];
        for s in ch.iter_mut() {
            let mut n = rng.signed(1.0);
            for st in &mut stages {
                n = st.process(n);
            }
            *s += (n * amplitude) as f32;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/filters.rs"]
mod tests;
