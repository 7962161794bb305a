use crate::audio::filters::{BiquadCoeffs, add_ultrasonic_noise, filter_channels};
use crate::audio::pitch::pitch_shift;
use crate::audio::reverb::apply_reverb;
use crate::foundation::core::AudioTrack;
use crate::foundation::error::{ShiftError, ShiftResult};
use crate::profile::params::AudioParams;

const LOW_CUT_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Audio chain: pitch shift with tempo held, low cut, high shelf, ultrasonic noise, reverb.
#[derive(Clone, Copy, Debug)]
pub struct AudioTransformer<'a> {
    params: &'a AudioParams,
}

impl<'a> AudioTransformer<'a> {
    /// Bind drawn parameters.
    pub fn new(params: &'a AudioParams) -> Self {
        Self { params }
    }

    /// Transform a track. The output has the same rate, channel count and length as the input.
    #[tracing::instrument(skip_all, fields(frames = track.frames(), channels = track.channels))]
    pub fn transform(&self, track: &AudioTrack) -> ShiftResult<AudioTrack> {
        if track.is_empty() {
            return Ok(track.clone());
        }
        let p = self.params;
        let fs = f64::from(track.sample_rate);
        let nyquist = fs / 2.0;

        let mut planar = pitch_shift(&track.to_planar(), p.pitch_ratio)?;

        if p.low_cut_hz > 0.0 && p.low_cut_hz < nyquist {
            filter_channels(&mut planar, BiquadCoeffs::high_pass(fs, p.low_cut_hz, LOW_CUT_Q));
        }
        if p.high_shelf_db != 0.0 && p.high_shelf_hz < nyquist {
            filter_channels(
                &mut planar,
                BiquadCoeffs::high_shelf(fs, p.high_shelf_hz, p.high_shelf_db),
            );
        }
        add_ultrasonic_noise(
            &mut planar,
            track.sample_rate,
            p.ultrasonic_cutoff_hz,
            p.ultrasonic_amplitude,
            p.ultrasonic_seed,
        );
        apply_reverb(&mut planar, track.sample_rate, &p.reverb_taps, p.reverb_wet);

        for ch in &mut planar {
            for s in ch.iter_mut() {
                if !s.is_finite() {
                    return Err(ShiftError::transform("audio chain produced non-finite samples"));
                }
                *s = s.clamp(-1.0, 1.0);
            }
        }
        tracing::debug!(pitch_ratio = p.pitch_ratio, "audio transformed");
        AudioTrack::from_planar(track.sample_rate, &planar)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/transformer.rs"]
mod tests;
