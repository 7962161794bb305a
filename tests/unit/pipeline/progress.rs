use super::*;

#[test]
fn cancel_token_is_shared_between_clones() {
    let a = CancelToken::new();
    let b = a.clone();
    assert!(!b.is_cancelled());
    a.cancel();
    assert!(b.is_cancelled());
    b.reset();
    assert!(!a.is_cancelled());
}

#[test]
fn snapshot_tracks_counters() {
    let p = Progress::new(10);
    let s = p.snapshot();
    assert_eq!(s.stage, Stage::Loaded);
    assert_eq!(s.frames_done, 0);
    assert_eq!(s.eta_secs, None);

    p.set_stage(Stage::Transforming);
    p.add_frames(4);
    p.mark_audio_done();
    let s = p.snapshot();
    assert_eq!(s.stage, Stage::Transforming);
    assert_eq!(s.frames_done, 4);
    assert!((s.fraction - 0.4).abs() < 1e-12);
    assert!(s.audio_done);
    assert!(s.eta_secs.is_some_and(|e| e >= 0.0));
}

#[test]
fn resumed_frames_do_not_count_toward_throughput() {
    let p = Progress::new(8);
    p.resume_from(6);
    let s = p.snapshot();
    assert_eq!(s.frames_done, 6);
    assert_eq!(s.eta_secs, None);
    p.add_frames(2);
    let s = p.snapshot();
    assert_eq!(s.fraction, 1.0);
    assert_eq!(s.eta_secs, Some(0.0));
}

#[test]
fn empty_asset_is_complete() {
    assert_eq!(Progress::new(0).snapshot().fraction, 1.0);
}
