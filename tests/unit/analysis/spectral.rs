use super::*;

fn tone(freq: f32, secs: f32, amp: f32) -> AudioTrack {
    let n = (48_000.0 * secs) as usize;
    let s = (0..n)
        .map(|i| amp * (2.0 * std::f32::consts::PI * freq * i as f32 / 48_000.0).sin())
        .collect();
    AudioTrack::new(48_000, 1, s).unwrap()
}

#[test]
fn identical_tracks_are_fully_similar() {
    let a = tone(440.0, 1.0, 0.5);
    let sim = audio_similarity(&a, &a, &SpectralConfig::default()).unwrap();
    assert!((sim - 100.0).abs() < 1e-9);
}

#[test]
fn gain_does_not_change_similarity() {
    let a = tone(440.0, 1.0, 0.5);
    let b = tone(440.0, 1.0, 0.25);
    let sim = audio_similarity(&a, &b, &SpectralConfig::default()).unwrap();
    assert!(sim > 99.9);
}

#[test]
fn different_pitches_score_lower() {
    let a = tone(200.0, 1.0, 0.5);
    let b = tone(3_000.0, 1.0, 0.5);
    let sim = audio_similarity(&a, &b, &SpectralConfig::default()).unwrap();
    assert!(sim < 50.0, "similarity {sim}");
}

#[test]
fn goertzel_peaks_at_its_frequency() {
    let fs = 48_000.0;
    let frame: Vec<f64> = (0..1024)
        .map(|i| (2.0 * PI * 1_000.0 * i as f64 / fs).sin())
        .collect();
    assert!(goertzel(&frame, 1_000.0, fs) > 10.0 * goertzel(&frame, 4_000.0, fs));
}

#[test]
fn mismatched_rates_and_short_audio_are_analysis_errors() {
    let a = tone(440.0, 0.5, 0.5);
    let b = AudioTrack::new(44_100, 1, vec![0.0; 44_100]).unwrap();
    assert!(audio_similarity(&a, &b, &SpectralConfig::default()).is_err());
    let short = AudioTrack::new(48_000, 1, vec![0.1; 100]).unwrap();
    assert!(audio_similarity(&short, &short, &SpectralConfig::default()).is_err());
}

#[test]
fn cosine_edge_cases() {
    assert_eq!(cosine_similarity_percent(&[0.0, 0.0], &[0.0, 0.0]), 100.0);
    assert_eq!(cosine_similarity_percent(&[1.0, 0.0], &[0.0, 0.0]), 0.0);
    assert!((cosine_similarity_percent(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-12);
}
