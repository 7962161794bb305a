use std::f64::consts::TAU;

use crate::foundation::core::{Resolution, Vec2};
use crate::foundation::error::{ShiftError, ShiftResult};
use crate::foundation::math::Rng64;
use crate::profile::level::{LevelProfile, ParamRange, UniquenessLevel};
use crate::random::source::{EffectGroup, RandomnessSource};

/// Nominal keyframe interval before jitter.
pub const BASE_KEYINT: u32 = 30;
/// B-frames between references, fixed for every output.
pub const B_FRAMES: u32 = 3;

/// Axis-aligned crop window in source pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CropBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// Static spatial parameters shared by every frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeometryParams {
    /// Crop window in the source.
    pub crop: CropBox,
    /// Scale about the output center.
    pub scale: f64,
    /// Displacement of the output corners in target pixels, ordered
    /// top-left, top-right, bottom-right, bottom-left.
    pub perspective: [Vec2; 4],
}

/// Coherent noise overlay.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NoiseParams {
    /// Lattice seed.
    pub seed: u64,
    /// Blend opacity in `[0, 1]`.
    pub opacity: f64,
    /// Base lattice cell size in target pixels.
    pub cell_px: f64,
    /// fBm octave count.
    pub octaves: u8,
}

/// Oklab/OkLCh micro-shift.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorShift {
    /// Hue rotation in degrees.
    pub hue_deg: f64,
    /// Relative chroma change.
    pub saturation: f64,
    /// Relative lightness change.
    pub lightness: f64,
}

/// High-frequency texture overlay.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextureParams {
    /// Per-pixel hash seed.
    pub seed: u64,
    /// Blend opacity in `[0, 1]`.
    pub opacity: f64,
}

/// One sinusoidal component `amp * sin(TAU * freq_hz * t + phase)`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Harmonic {
    /// Amplitude in target pixels.
    pub amp: f64,
    /// Frequency in Hz.
    pub freq_hz: f64,
    /// Phase in radians.
    pub phase: f64,
}

impl Harmonic {
    /// Evaluate at `t` seconds.
    pub fn eval(&self, t: f64) -> f64 {
        self.amp * (TAU * self.freq_hz * t + self.phase).sin()
    }
}

/// Coefficients of the time-varying video curves.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TemporalParams {
    /// Zoom drift per second.
    pub zoom_rate_per_sec: f64,
    /// Zoom ceiling.
    pub zoom_max: f64,
    /// Horizontal pan harmonics.
    pub pan_x: Vec<Harmonic>,
    /// Vertical pan harmonics.
    pub pan_y: Vec<Harmonic>,
    /// Horizontal jitter harmonics.
    pub jitter_x: Vec<Harmonic>,
    /// Vertical jitter harmonics.
    pub jitter_y: Vec<Harmonic>,
    /// Corner darkening amount.
    pub vignette_strength: f64,
    /// Gaussian sigma applied to the centroid track, in seconds.
    pub vignette_smoothing_secs: f64,
}

/// Encoder settings selected once per asset.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EncodeParams {
    /// Video codec passed to the encoder.
    pub codec: String,
    /// Keyframe interval (GOP size).
    pub keyint: u32,
    /// B-frames between references.
    pub b_frames: u32,
    /// Constant rate factor.
    pub crf: u8,
    /// Encoder preset.
    pub preset: String,
    /// Optional H.264 profile.
    pub profile: Option<String>,
    /// Output pixel format.
    pub pix_fmt: String,
}

impl EncodeParams {
    /// Fallback used when the first encode attempt fails.
    pub fn conservative(&self) -> Self {
        Self {
            codec: "libx264".to_string(),
            keyint: BASE_KEYINT,
            b_frames: 0,
            crf: 23,
            preset: "medium".to_string(),
            profile: Some("baseline".to_string()),
            pix_fmt: "yuv420p".to_string(),
        }
    }
}

/// One reverb reflection.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReverbTap {
    /// Delay in milliseconds.
    pub delay_ms: f64,
    /// Linear gain.
    pub gain: f64,
}

/// Audio chain parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioParams {
    /// Pitch ratio, `1 + percent / 100`.
    pub pitch_ratio: f64,
    /// High-pass corner.
    pub low_cut_hz: f64,
    /// High-shelf corner.
    pub high_shelf_hz: f64,
    /// High-shelf gain in dB.
    pub high_shelf_db: f64,
    /// Peak ultrasonic noise amplitude.
    pub ultrasonic_amplitude: f64,
    /// Lower edge of the ultrasonic band.
    pub ultrasonic_cutoff_hz: f64,
    /// Noise seed.
    pub ultrasonic_seed: u64,
    /// Reverb wet mix.
    pub reverb_wet: f64,
    /// Reverb reflections, ascending by delay.
    pub reverb_taps: Vec<ReverbTap>,
}

/// Fully resolved draw for one asset. Immutable once drawn.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EffectParameters {
    /// Level the draw came from.
    pub level: UniquenessLevel,
    /// Seed of the draw.
    pub seed: u64,
    /// Source dimensions.
    pub source: Resolution,
    /// Output dimensions.
    pub target: Resolution,
    /// Crop, scale and perspective.
    pub geometry: GeometryParams,
    /// Coherent noise.
    pub noise: NoiseParams,
    /// Color micro-shift.
    pub color: ColorShift,
    /// Optional texture overlay.
    pub texture: Option<TextureParams>,
    /// Video curves.
    pub temporal: TemporalParams,
    /// Encoder settings.
    pub encode: EncodeParams,
    /// Audio chain.
    pub audio: AudioParams,
}

fn draw_in(rng: &mut Rng64, r: ParamRange) -> f64 {
    rng.uniform(r.min, r.max)
}

fn draw_geometry(
    rng: &mut Rng64,
    p: &LevelProfile,
    source: Resolution,
    target: Resolution,
) -> GeometryParams {
    let (sw, sh) = (f64::from(source.width), f64::from(source.height));
    let frac = draw_in(rng, p.crop_fraction);
    let width = sw * (1.0 - frac);
    let height = sh * (1.0 - frac);
    let x = rng.uniform(0.0, sw - width);
    let y = rng.uniform(0.0, sh - height);
    let scale = rng.uniform(1.0 - p.scale_deviation, 1.0 + p.scale_deviation);
    let reach = p.perspective_fraction * target.diagonal();
    let mut perspective = [Vec2::ZERO; 4];
    for corner in &mut perspective {
        *corner = Vec2::new(rng.signed(reach), rng.signed(reach));
    }
    GeometryParams {
        crop: CropBox {
            x,
            y,
            width,
            height,
        },
        scale,
        perspective,
    }
}

fn draw_harmonics(rng: &mut Rng64, count: usize, peak: f64, freq: (f64, f64)) -> Vec<Harmonic> {
    let weights: Vec<f64> = (0..count).map(|_| rng.uniform(0.5, 1.0)).collect();
    let total: f64 = weights.iter().sum();
    weights
        .into_iter()
        .map(|w| Harmonic {
            amp: peak * w / total,
            freq_hz: rng.uniform(freq.0, freq.1),
            phase: rng.uniform(0.0, TAU),
        })
        .collect()
}

fn draw_temporal(rng: &mut Rng64, p: &LevelProfile, target: Resolution) -> TemporalParams {
    let pan_x = draw_harmonics(rng, 2, p.pan_amplitude * f64::from(target.width), (0.03, 0.15));
    let pan_y = draw_harmonics(rng, 2, p.pan_amplitude * f64::from(target.height), (0.03, 0.15));
    let jitter_x = draw_harmonics(rng, 3, p.jitter_px, (0.4, 2.0));
    let jitter_y = draw_harmonics(rng, 3, p.jitter_px, (0.4, 2.0));
    TemporalParams {
        zoom_rate_per_sec: p.zoom_rate_per_sec,
        zoom_max: p.zoom_max,
        pan_x,
        pan_y,
        jitter_x,
        jitter_y,
        vignette_strength: draw_in(rng, p.vignette_strength),
        vignette_smoothing_secs: 0.5,
    }
}

fn draw_encode(rng: &mut Rng64, p: &LevelProfile) -> EncodeParams {
    let jitter = i64::from(p.keyint_jitter.min(5));
    let keyint = i64::from(BASE_KEYINT) + rng.range_inclusive(-jitter, jitter);
    EncodeParams {
        codec: "libx264".to_string(),
        keyint: keyint as u32,
        b_frames: B_FRAMES,
        crf: p.crf,
        preset: "medium".to_string(),
        profile: None,
        pix_fmt: "yuv420p".to_string(),
    }
}

fn draw_audio(rng: &mut Rng64, p: &LevelProfile) -> AudioParams {
    let pitch_percent = draw_in(rng, p.pitch_shift_percent);
    let low_cut_hz = draw_in(rng, p.low_cut_hz);
    let high_shelf_hz = rng.uniform(7_000.0, 10_000.0);
    let high_shelf_db = rng.signed(p.high_shelf_db);
    let ultrasonic_seed = rng.next_u64();
    let reverb_wet = draw_in(rng, p.reverb_wet);
    let mut delays: Vec<f64> = (0..6).map(|_| rng.uniform(7.0, 60.0)).collect();
    delays.sort_by(f64::total_cmp);
    let reverb_taps = delays
        .into_iter()
        .map(|delay_ms| ReverbTap {
            delay_ms,
            gain: 0.7 * (-delay_ms / 40.0).exp(),
        })
        .collect();
    AudioParams {
        pitch_ratio: 1.0 + pitch_percent / 100.0,
        low_cut_hz,
        high_shelf_hz,
        high_shelf_db,
        ultrasonic_amplitude: p.ultrasonic_amplitude,
        ultrasonic_cutoff_hz: 18_000.0,
        ultrasonic_seed,
        reverb_wet,
        reverb_taps,
    }
}

impl EffectParameters {
    /// Draw every parameter for one asset.
    ///
    /// Pure: identical inputs always produce bit-identical output. Each effect group reads its own
    /// forked stream so the groups never shift each other's values.
    pub fn draw(
        level: UniquenessLevel,
        seed: u64,
        source: Resolution,
        target: Resolution,
    ) -> ShiftResult<Self> {
        let source = Resolution::new(source.width, source.height)?;
        let target = Resolution::new(target.width, target.height)?;
        let p = LevelProfile::for_level(level);
        let src = RandomnessSource::new(seed);

        let geometry = draw_geometry(&mut src.stream(EffectGroup::Geometry), p, source, target);

        let mut rng = src.stream(EffectGroup::Noise);
        let noise = NoiseParams {
            seed: rng.next_u64(),
            opacity: draw_in(&mut rng, p.noise_opacity),
            cell_px: rng.uniform(24.0, 48.0),
            octaves: 3,
        };

        let mut rng = src.stream(EffectGroup::Color);
        let color = ColorShift {
            hue_deg: rng.triangular(-p.hue_shift_deg, p.hue_shift_deg),
            saturation: rng.triangular(-p.saturation_shift, p.saturation_shift),
            lightness: rng.triangular(-p.lightness_shift, p.lightness_shift),
        };

        let mut rng = src.stream(EffectGroup::Texture);
        let texture = (p.texture_opacity > 0.0).then(|| TextureParams {
            seed: rng.next_u64(),
            opacity: p.texture_opacity,
        });

        let temporal = draw_temporal(&mut src.stream(EffectGroup::Temporal), p, target);
        let encode = draw_encode(&mut src.stream(EffectGroup::Encode), p);
        let audio = draw_audio(&mut src.stream(EffectGroup::Audio), p);

        Ok(Self {
            level,
            seed,
            source,
            target,
            geometry,
            noise,
            color,
            texture,
            temporal,
            encode,
            audio,
        })
    }

    /// Check that a persisted draw belongs to the given run.
    pub fn ensure_matches(&self, level: UniquenessLevel, seed: u64) -> ShiftResult<()> {
        if self.level != level || self.seed != seed {
            return Err(ShiftError::checkpoint_corrupt(format!(
                "parameters were drawn for level {} seed {}, run uses level {} seed {}",
                self.level.get(),
                self.seed,
                level.get(),
                seed
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/profile/params.rs"]
mod tests;
