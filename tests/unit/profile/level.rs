use super::*;

#[test]
fn level_bounds_are_validated() {
    assert!(UniquenessLevel::new(0).is_err());
    assert!(UniquenessLevel::new(6).is_err());
    assert_eq!(UniquenessLevel::new(3).unwrap().get(), 3);
    assert_eq!(UniquenessLevel::all().count(), 5);
}

#[test]
fn level_serde_is_a_plain_integer() {
    let l = UniquenessLevel::new(4).unwrap();
    assert_eq!(serde_json::to_string(&l).unwrap(), "4");
    assert_eq!(serde_json::from_str::<UniquenessLevel>("4").unwrap(), l);
    assert!(serde_json::from_str::<UniquenessLevel>("9").is_err());
}

#[test]
fn profiles_widen_monotonically() {
    let profiles: Vec<_> = UniquenessLevel::all().map(LevelProfile::for_level).collect();
    for pair in profiles.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        assert!(hi.crop_fraction.min >= lo.crop_fraction.min);
        assert!(hi.crop_fraction.max >= lo.crop_fraction.max);
        assert!(hi.scale_deviation >= lo.scale_deviation);
        assert!(hi.perspective_fraction >= lo.perspective_fraction);
        assert!(hi.noise_opacity.max >= lo.noise_opacity.max);
        assert!(hi.hue_shift_deg >= lo.hue_shift_deg);
        assert!(hi.saturation_shift >= lo.saturation_shift);
        assert!(hi.lightness_shift >= lo.lightness_shift);
        assert!(hi.texture_opacity >= lo.texture_opacity);
        assert!(hi.zoom_rate_per_sec >= lo.zoom_rate_per_sec);
        assert!(hi.jitter_px >= lo.jitter_px);
        assert!(hi.pan_amplitude >= lo.pan_amplitude);
        assert!(hi.vignette_strength.max >= lo.vignette_strength.max);
        assert!(hi.keyint_jitter >= lo.keyint_jitter);
        assert!(hi.crf <= lo.crf);
        assert!(hi.pitch_shift_percent.max >= lo.pitch_shift_percent.max);
        assert!(hi.reverb_wet.max >= lo.reverb_wet.max);
    }
}

#[test]
fn level_three_matches_nominal_magnitudes() {
    let p = LevelProfile::for_level(UniquenessLevel::new(3).unwrap());
    assert!(p.crop_fraction.min >= 0.02 && p.crop_fraction.max <= 0.06);
    assert_eq!(p.scale_deviation, 0.03);
    assert_eq!(p.perspective_fraction, 0.008);
    assert!(p.pitch_shift_percent.contains(2.3));
    assert!(p.keyint_jitter <= 5);
}
