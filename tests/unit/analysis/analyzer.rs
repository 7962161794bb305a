use super::*;
use crate::foundation::core::{AudioTrack, Fps, FrameIndex, RasterFrame};

fn frame(i: u64, shade: u8) -> RasterFrame {
    let mut data = Vec::with_capacity(64 * 36 * 3);
    for y in 0..36u32 {
        for x in 0..64u32 {
            let v = ((x * 4 + y * 2) as u8).wrapping_add(shade);
            data.extend_from_slice(&[v, v, v]);
        }
    }
    RasterFrame::new(64, 36, 3, FrameIndex(i), i as f64 / 30.0, data).unwrap()
}

fn video(n: u64, shade: u8) -> MediaAsset {
    let frames = (0..n).map(|i| frame(i, shade)).collect();
    MediaAsset::video(frames, Fps::new(30, 1).unwrap(), None).unwrap()
}

#[test]
fn sample_count_tracks_duration_within_bounds() {
    let a = PerceptualAnalyzer::default();
    assert_eq!(a.sample_indices(300, 10.0).len(), 10);
    assert_eq!(a.sample_indices(900, 30.0).len(), 10);
    assert_eq!(a.sample_indices(60, 2.0).len(), 5);
    assert_eq!(a.sample_indices(210, 7.9).len(), 7);
    assert_eq!(a.sample_indices(3, 10.0), vec![0, 1, 2]);
    assert_eq!(a.sample_indices(1, 0.1), vec![0]);
    assert!(a.sample_indices(0, 5.0).is_empty());
}

#[test]
fn samples_include_first_and_last() {
    let a = PerceptualAnalyzer::default();
    let s = a.sample_indices(300, 10.0);
    assert_eq!(s.first(), Some(&0));
    assert_eq!(s.last(), Some(&299));
    assert!(s.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn reference_frame_is_capped_at_half_duration() {
    let a = PerceptualAnalyzer::default();
    assert_eq!(a.reference_index(&video(300, 0)), 90);
    assert_eq!(a.reference_index(&video(60, 0)), 30);
    let still = MediaAsset::image(frame(0, 0)).unwrap();
    assert_eq!(a.reference_index(&still), 0);
}

#[test]
fn identical_video_is_high_risk() {
    let a = PerceptualAnalyzer::default();
    let v = video(150, 0);
    let r = a.compare(&v, &v, 1234).unwrap();
    assert_eq!(r.hash_delta_percent, Some(0.0));
    assert_eq!(r.risk_level, RiskLevel::High);
    assert_eq!(r.frame_deltas.len(), 5);
    assert_eq!(r.size_bytes, 1234);
    assert_eq!(r.source_hash, r.output_hash);
    assert!(r.degraded.is_none());
}

#[test]
fn audio_similarity_reported_when_both_have_audio() {
    let a = PerceptualAnalyzer::default();
    let samples = (0..48_000).map(|i| (i as f32 * 0.05).sin() * 0.3).collect();
    let audio = AudioTrack::new(48_000, 1, samples).unwrap();
    let mut v = video(30, 0);
    v.audio = Some(audio);
    let r = a.compare(&v, &v, 0).unwrap();
    let sim = r.audio_similarity.unwrap();
    assert!((sim - 100.0).abs() < 1e-6);
}

#[test]
fn short_audio_keeps_the_visual_verdict() {
    let a = PerceptualAnalyzer::default();
    let tone = |n: usize| (0..n).map(|i| (i as f32 * 0.1).sin() * 0.2).collect::<Vec<_>>();
    let mut src = video(6, 0);
    src.audio = Some(AudioTrack::new(8_000, 1, tone(800)).unwrap());
    let mut out = video(6, 40);
    out.audio = Some(AudioTrack::new(8_000, 1, tone(800)).unwrap());

    let r = a.compare_or_degrade(&src, &out, 10);
    assert!(r.degraded.is_none(), "{:?}", r.degraded);
    assert_eq!(r.audio_similarity, None);
    assert!(r.hash_delta_percent.is_some());
    assert_ne!(r.risk_level, RiskLevel::Unknown);
    assert!(r.source_hash.is_some());
}

#[test]
fn sample_rate_mismatch_omits_audio_similarity() {
    let a = PerceptualAnalyzer::default();
    let tone = |n: usize| (0..n).map(|i| (i as f32 * 0.05).sin() * 0.3).collect::<Vec<_>>();
    let mut src = video(30, 0);
    src.audio = Some(AudioTrack::new(48_000, 1, tone(48_000)).unwrap());
    let mut out = video(30, 0);
    out.audio = Some(AudioTrack::new(44_100, 1, tone(44_100)).unwrap());

    let r = a.compare(&src, &out, 0).unwrap();
    assert_eq!(r.audio_similarity, None);
    assert_eq!(r.hash_delta_percent, Some(0.0));
    assert_eq!(r.risk_level, RiskLevel::High);
}

#[test]
fn failures_degrade_to_unknown() {
    let a = PerceptualAnalyzer::default();
    let src = video(30, 0);
    let mut out = video(30, 0);
    out.frames.iter_mut().for_each(|f| f.data.truncate(5));
    let r = a.compare_or_degrade(&src, &out, 99);
    assert_eq!(r.risk_level, RiskLevel::Unknown);
    assert!(r.degraded.is_some());
    assert_eq!(r.hash_delta_percent, None);
    assert_eq!(r.size_bytes, 99);
}

#[test]
fn output_with_fewer_frames_is_mapped_proportionally() {
    let a = PerceptualAnalyzer::default();
    let r = a.compare(&video(300, 0), &video(150, 0), 0).unwrap();
    assert_eq!(r.frame_deltas.len(), 10);
    assert_eq!(r.hash_delta_percent, Some(0.0));
}

#[test]
fn analyze_source_uses_reference_frame() {
    let a = PerceptualAnalyzer::default();
    let s = a.analyze_source(&video(300, 0)).unwrap();
    assert_eq!(s.frame_index, 90);
    assert_eq!(s.hash.len(), 16);
    assert!((s.duration_seconds - 10.0).abs() < 1e-9);
}
