use crate::foundation::error::{ShiftError, ShiftResult};

/// Discrete uniqueness level in `1..=5`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct UniquenessLevel(u8);

impl UniquenessLevel {
    /// Lowest level.
    pub const MIN: Self = Self(1);
    /// Highest level.
    pub const MAX: Self = Self(5);

    /// Validate a raw level.
    pub fn new(level: u8) -> ShiftResult<Self> {
        if !(1..=5).contains(&level) {
            return Err(ShiftError::validation(format!(
                "uniqueness level must be in 1..=5, got {level}"
            )));
        }
        Ok(Self(level))
    }

    /// Raw value.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Low",
            2 => "Medium",
            3 => "High",
            4 => "Very high",
            _ => "Extreme",
        }
    }

    /// All levels in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=5).map(Self)
    }
}

impl TryFrom<u8> for UniquenessLevel {
    type Error = ShiftError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UniquenessLevel> for u8 {
    fn from(value: UniquenessLevel) -> Self {
        value.0
    }
}

impl std::fmt::Display for UniquenessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.0, self.label())
    }
}

/// Closed numeric interval `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParamRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl ParamRange {
    const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Return `true` if `v` lies inside the interval.
    pub fn contains(self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Numeric ranges for every effect at one level.
///
/// Fractions are relative to the frame (crop, pan) or the frame diagonal (perspective); percentages
/// are stored as fractions except `pitch_shift_percent`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LevelProfile {
    /// Level this profile belongs to.
    pub level: UniquenessLevel,
    /// Fraction of width and height removed by the crop.
    pub crop_fraction: ParamRange,
    /// Maximum deviation of the scale factor from 1.
    pub scale_deviation: f64,
    /// Maximum corner displacement as a fraction of the diagonal.
    pub perspective_fraction: f64,
    /// Blend opacity of the coherent noise layer.
    pub noise_opacity: ParamRange,
    /// Maximum hue rotation in degrees.
    pub hue_shift_deg: f64,
    /// Maximum relative chroma change.
    pub saturation_shift: f64,
    /// Maximum relative lightness change.
    pub lightness_shift: f64,
    /// Texture overlay opacity; zero disables it.
    pub texture_opacity: f64,
    /// Zoom drift per second.
    pub zoom_rate_per_sec: f64,
    /// Upper bound on the zoom factor.
    pub zoom_max: f64,
    /// Peak spatial jitter in pixels.
    pub jitter_px: f64,
    /// Peak pan offset as a fraction of frame size.
    pub pan_amplitude: f64,
    /// Darkening at the frame corners.
    pub vignette_strength: ParamRange,
    /// Maximum keyframe interval deviation from 30.
    pub keyint_jitter: u32,
    /// x264 constant rate factor.
    pub crf: u8,
    /// Upward pitch shift in percent.
    pub pitch_shift_percent: ParamRange,
    /// High-pass corner frequency.
    pub low_cut_hz: ParamRange,
    /// Maximum high-shelf gain magnitude in dB.
    pub high_shelf_db: f64,
    /// Peak amplitude of the ultrasonic noise band.
    pub ultrasonic_amplitude: f64,
    /// Reverb wet mix.
    pub reverb_wet: ParamRange,
}

const PROFILES: [LevelProfile; 5] = [
    LevelProfile {
        level: UniquenessLevel(1),
        crop_fraction: ParamRange::new(0.02, 0.03),
        scale_deviation: 0.005,
        perspective_fraction: 0.003,
        noise_opacity: ParamRange::new(0.002, 0.003),
        hue_shift_deg: 0.5,
        saturation_shift: 0.01,
        lightness_shift: 0.015,
        texture_opacity: 0.0,
        zoom_rate_per_sec: 0.002,
        zoom_max: 1.2,
        jitter_px: 1.0,
        pan_amplitude: 0.002,
        vignette_strength: ParamRange::new(0.02, 0.03),
        keyint_jitter: 1,
        crf: 22,
        pitch_shift_percent: ParamRange::new(0.8, 1.2),
        low_cut_hz: ParamRange::new(20.0, 30.0),
        high_shelf_db: 0.5,
        ultrasonic_amplitude: 0.0005,
        reverb_wet: ParamRange::new(0.02, 0.04),
    },
    LevelProfile {
        level: UniquenessLevel(2),
        crop_fraction: ParamRange::new(0.02, 0.04),
        scale_deviation: 0.015,
        perspective_fraction: 0.005,
        noise_opacity: ParamRange::new(0.002, 0.004),
        hue_shift_deg: 0.8,
        saturation_shift: 0.015,
        lightness_shift: 0.025,
        texture_opacity: 0.0,
        zoom_rate_per_sec: 0.003,
        zoom_max: 1.2,
        jitter_px: 1.5,
        pan_amplitude: 0.003,
        vignette_strength: ParamRange::new(0.02, 0.04),
        keyint_jitter: 2,
        crf: 21,
        pitch_shift_percent: ParamRange::new(1.4, 1.9),
        low_cut_hz: ParamRange::new(25.0, 40.0),
        high_shelf_db: 1.0,
        ultrasonic_amplitude: 0.001,
        reverb_wet: ParamRange::new(0.03, 0.06),
    },
    LevelProfile {
        level: UniquenessLevel(3),
        crop_fraction: ParamRange::new(0.03, 0.06),
        scale_deviation: 0.03,
        perspective_fraction: 0.008,
        noise_opacity: ParamRange::new(0.003, 0.005),
        hue_shift_deg: 1.0,
        saturation_shift: 0.02,
        lightness_shift: 0.03,
        texture_opacity: 0.0015,
        zoom_rate_per_sec: 0.005,
        zoom_max: 1.2,
        jitter_px: 2.0,
        pan_amplitude: 0.005,
        vignette_strength: ParamRange::new(0.03, 0.05),
        keyint_jitter: 3,
        crf: 20,
        pitch_shift_percent: ParamRange::new(2.1, 2.5),
        low_cut_hz: ParamRange::new(30.0, 50.0),
        high_shelf_db: 1.5,
        ultrasonic_amplitude: 0.0015,
        reverb_wet: ParamRange::new(0.05, 0.08),
    },
    LevelProfile {
        level: UniquenessLevel(4),
        crop_fraction: ParamRange::new(0.04, 0.07),
        scale_deviation: 0.035,
        perspective_fraction: 0.010,
        noise_opacity: ParamRange::new(0.004, 0.006),
        hue_shift_deg: 1.3,
        saturation_shift: 0.025,
        lightness_shift: 0.035,
        texture_opacity: 0.002,
        zoom_rate_per_sec: 0.006,
        zoom_max: 1.2,
        jitter_px: 2.0,
        pan_amplitude: 0.006,
        vignette_strength: ParamRange::new(0.04, 0.06),
        keyint_jitter: 4,
        crf: 19,
        pitch_shift_percent: ParamRange::new(2.6, 3.2),
        low_cut_hz: ParamRange::new(35.0, 60.0),
        high_shelf_db: 2.0,
        ultrasonic_amplitude: 0.002,
        reverb_wet: ParamRange::new(0.06, 0.10),
    },
    LevelProfile {
        level: UniquenessLevel(5),
        crop_fraction: ParamRange::new(0.05, 0.08),
        scale_deviation: 0.04,
        perspective_fraction: 0.012,
        noise_opacity: ParamRange::new(0.005, 0.008),
        hue_shift_deg: 1.6,
        saturation_shift: 0.03,
        lightness_shift: 0.04,
        texture_opacity: 0.003,
        zoom_rate_per_sec: 0.007,
        zoom_max: 1.2,
        jitter_px: 2.0,
        pan_amplitude: 0.008,
        vignette_strength: ParamRange::new(0.04, 0.06),
        keyint_jitter: 5,
        crf: 18,
        pitch_shift_percent: ParamRange::new(3.0, 4.0),
        low_cut_hz: ParamRange::new(40.0, 70.0),
        high_shelf_db: 2.5,
        ultrasonic_amplitude: 0.0025,
        reverb_wet: ParamRange::new(0.08, 0.12),
    },
];

impl LevelProfile {
    /// Profile for `level`.
    pub fn for_level(level: UniquenessLevel) -> &'static LevelProfile {
        &PROFILES[usize::from(level.0 - 1)]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/profile/level.rs"]
mod tests;
