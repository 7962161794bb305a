use super::*;

#[test]
fn defaults_are_valid() {
    let cfg = PipelineConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.preview_secs, 3.0);
    assert_eq!(cfg.analysis.min_samples, 5);
    assert_eq!(cfg.analysis.max_samples, 10);
    assert_eq!(cfg.target_delta_percent, None);
}

#[test]
fn target_delta_must_be_a_percentage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.json");
    std::fs::write(&path, r#"{ "target_delta_percent": 12.5 }"#).unwrap();
    let cfg = PipelineConfig::from_json_path(&path).unwrap();
    assert_eq!(cfg.target_delta_percent, Some(12.5));

    for bad in [-1.0, 100.5, f64::NAN] {
        let cfg = PipelineConfig {
            target_delta_percent: Some(bad),
            ..PipelineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ShiftError::Validation(_))), "{bad}");
    }
}

#[test]
fn partial_json_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.json");
    std::fs::write(
        &path,
        r#"{ "frames_per_checkpoint": 8, "target_resolution": { "width": 640, "height": 360 } }"#,
    )
    .unwrap();
    let cfg = PipelineConfig::from_json_path(&path).unwrap();
    assert_eq!(cfg.frames_per_checkpoint, 8);
    assert_eq!(cfg.target_resolution, Some(Resolution::new(640, 360).unwrap()));
    assert_eq!(cfg.ffmpeg_bin, "ffmpeg");
    assert_eq!(cfg.analysis, AnalysisConfig::default());
}

#[test]
fn unknown_keys_and_bad_values_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.json");
    std::fs::write(&path, r#"{ "frames_per_chekpoint": 8 }"#).unwrap();
    assert!(matches!(
        PipelineConfig::from_json_path(&path),
        Err(ShiftError::Validation(_))
    ));

    std::fs::write(&path, r#"{ "threads": 0 }"#).unwrap();
    assert!(matches!(
        PipelineConfig::from_json_path(&path),
        Err(ShiftError::Validation(_))
    ));

    let mut cfg = PipelineConfig::default();
    cfg.analysis.max_samples = 2;
    assert!(cfg.validate().is_err());

    let cfg = PipelineConfig {
        target_resolution: Some(Resolution { width: 0, height: 10 }),
        ..PipelineConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(PipelineConfig::from_json_path(&dir.path().join("none.json")).is_err());
}

#[test]
fn thread_pool_honors_count() {
    assert!(build_thread_pool(Some(0)).is_err());
    assert_eq!(build_thread_pool(Some(3)).unwrap().current_num_threads(), 3);
}
