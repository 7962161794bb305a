use super::*;
use crate::profile::level::UniquenessLevel;
use crate::profile::params::EffectParameters;

fn temporal(level: u8, seed: u64) -> TemporalParams {
    let r = Resolution::new(640, 360).unwrap();
    EffectParameters::draw(UniquenessLevel::new(level).unwrap(), seed, r, r)
        .unwrap()
        .temporal
}

fn solid(w: u32, h: u32, index: u64) -> RasterFrame {
    RasterFrame::new(w, h, 3, FrameIndex(index), 0.0, vec![90; (w * h * 3) as usize]).unwrap()
}

#[test]
fn zoom_drifts_linearly_then_caps() {
    let p = temporal(3, 1);
    assert_eq!(zoom_at(&p, 0.0), 1.0);
    assert!((zoom_at(&p, 2.0) - 1.01).abs() < 1e-12);
    assert_eq!(zoom_at(&p, 1.0e6), p.zoom_max);
}

#[test]
fn jitter_is_bounded_and_continuous() {
    let p = temporal(5, 3);
    let fps = 30.0;
    let mut prev = jitter_at(&p, 0.0);
    for i in 1..900 {
        let j = jitter_at(&p, f64::from(i) / fps);
        assert!(j.x.abs() <= 2.0 + 1e-9 && j.y.abs() <= 2.0 + 1e-9);
        // Highest harmonic is 2 Hz, so one frame moves at most TAU * 2 * 2 / 30 px.
        assert!((j - prev).hypot() < 1.2, "frame {i} jumped");
        prev = j;
    }
}

#[test]
fn curves_are_pure_functions_of_time() {
    let p = temporal(4, 9);
    assert_eq!(pan_at(&p, 3.3), pan_at(&p, 3.3));
    assert_eq!(jitter_at(&p, 0.7), jitter_at(&p, 0.7));
}

#[test]
fn centroid_of_uniform_frame_is_center() {
    let track = CentroidTrack::from_frames(&[solid(40, 20, 0)]);
    let c = track.smoothed(0, 0.0);
    assert!((c.x - 0.5).abs() < 1e-9 && (c.y - 0.5).abs() < 1e-9);
}

#[test]
fn centroid_follows_bright_region() {
    let mut f = RasterFrame::new(10, 10, 1, FrameIndex(0), 0.0, vec![0; 100]).unwrap();
    f.data[9 * 10 + 9] = 255;
    let c = CentroidTrack::from_frames(&[f]).smoothed(0, 0.0);
    assert!((c.x - 0.95).abs() < 1e-9 && (c.y - 0.95).abs() < 1e-9);
}

#[test]
fn smoothing_averages_neighbors() {
    let track = CentroidTrack::new(vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 0.0),
    ]);
    let c = track.smoothed(1, 1.0);
    assert!(c.x > 0.0 && c.x < 1.0);
    assert!((c.x - c.y).abs() < 1e-12);
    assert_eq!(track.smoothed(1, 0.0), Point::new(1.0, 1.0));
    assert_eq!(CentroidTrack::default().smoothed(4, 1.0), Point::new(0.5, 0.5));
}

#[test]
fn driver_state_is_independent_of_evaluation_order() {
    let p = temporal(3, 2);
    let frames: Vec<_> = (0..20).map(|i| solid(16, 9, i)).collect();
    let track = CentroidTrack::from_frames(&frames);
    let target = Resolution::new(16, 9).unwrap();
    let d = TemporalEffectDriver::new(&p, Fps::new(30, 1).unwrap(), target, &track);
    let late = d.state(FrameIndex(17));
    let _ = d.state(FrameIndex(3));
    assert_eq!(d.state(FrameIndex(17)), late);
    assert!((late.vignette_center.x - 8.0).abs() < 1e-9);
}
