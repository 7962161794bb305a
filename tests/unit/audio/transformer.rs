use super::*;
use crate::foundation::core::Resolution;
use crate::profile::level::UniquenessLevel;
use crate::profile::params::EffectParameters;

fn params(level: u8, seed: u64) -> AudioParams {
    let r = Resolution::new(16, 16).unwrap();
    EffectParameters::draw(UniquenessLevel::new(level).unwrap(), seed, r, r)
        .unwrap()
        .audio
}

fn tone(frames: usize, channels: u16, amp: f32) -> AudioTrack {
    let mut s = Vec::with_capacity(frames * usize::from(channels));
    for i in 0..frames {
        let v = amp * (2.0 * std::f32::consts::PI * 330.0 * i as f32 / 48_000.0).sin();
        for _ in 0..channels {
            s.push(v);
        }
    }
    AudioTrack::new(48_000, channels, s).unwrap()
}

#[test]
fn duration_is_preserved_for_every_level() {
    let src = tone(48_000 * 2 + 17, 2, 0.5);
    for level in 1..=5 {
        let out = AudioTransformer::new(&params(level, 3)).transform(&src).unwrap();
        assert_eq!(out.frames(), src.frames(), "level {level}");
        assert_eq!(out.channels, 2);
        assert_eq!(out.sample_rate, 48_000);
    }
}

#[test]
fn output_is_clamped() {
    let src = tone(24_000, 1, 1.0);
    let out = AudioTransformer::new(&params(5, 1)).transform(&src).unwrap();
    assert!(out.samples.iter().all(|v| (-1.0..=1.0).contains(v)));
}

#[test]
fn transform_is_deterministic_and_audible_change_is_small() {
    let src = tone(48_000, 2, 0.3);
    let p = params(3, 42);
    let a = AudioTransformer::new(&p).transform(&src).unwrap();
    let b = AudioTransformer::new(&p).transform(&src).unwrap();
    assert_eq!(a, b);
    assert_ne!(a.samples, src.samples);
    let peak = a.samples.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    assert!(peak < 0.45, "peak {peak}");
}

#[test]
fn empty_track_passes_through() {
    let src = AudioTrack::new(48_000, 2, vec![]).unwrap();
    let out = AudioTransformer::new(&params(3, 1)).transform(&src).unwrap();
    assert!(out.is_empty());
}
