use super::*;
use crate::profile::params::EncodeParams;

#[test]
fn f32le_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.f32le");
    let samples = vec![0.0, -1.0, 0.25, 1.0e-7];
    write_f32le(&path, &samples).unwrap();
    assert_eq!(read_f32le(&path).unwrap(), samples);
}

#[test]
fn misaligned_pcm_is_rejected() {
    assert!(matches!(f32le_to_samples(&[0, 0, 0]), Err(ShiftError::Decode(_))));
}

#[test]
fn parent_dir_helpers() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a/b/out.mp4");
    ensure_parent_dir(&nested).unwrap();
    assert!(dir.path().join("a/b").is_dir());
    assert_eq!(parent_or_cwd(Path::new("out.png")), PathBuf::from("."));
    assert_eq!(parent_or_cwd(&nested), dir.path().join("a/b"));
}

#[test]
fn missing_source_is_a_decode_error() {
    let codec = FfmpegCodec::default();
    let err = codec.decode(Path::new("/definitely/not/here.mp4")).unwrap_err();
    assert!(matches!(err, ShiftError::Decode(_)));
}

#[test]
fn unknown_binary_is_an_encode_error() {
    let codec = FfmpegCodec::new("mediashift-no-such-ffmpeg", "mediashift-no-such-ffprobe");
    let frames = vec![RasterFrame::new(4, 4, 3, FrameIndex(0), 0.0, vec![0; 48]).unwrap()];
    let params = EncodeParams {
        codec: "libx264".to_string(),
        keyint: 30,
        b_frames: 3,
        crf: 20,
        preset: "medium".to_string(),
        profile: None,
        pix_fmt: "yuv420p".to_string(),
    };
    let req = EncodeRequest {
        kind: MediaKind::Video,
        frames: &frames,
        audio: None,
        fps: Fps::new(30, 1).unwrap(),
        params: &params,
        output_path: Path::new("out.mp4"),
    };
    assert!(matches!(codec.encode(&req), Err(ShiftError::Encode(_))));
}

#[test]
fn ffmpeg_round_trip_keeps_dimensions_and_audio() {
    if !is_ffmpeg_on_path() || !is_binary_available("ffprobe") {
        eprintln!("skipping: ffmpeg/ffprobe not on PATH");
        return;
    }
    let frames: Vec<RasterFrame> = (0..12u64)
        .map(|i| {
            let data = (0..32 * 24)
                .flat_map(|p| {
                    let v = ((p % 32) * 8) as u8;
                    [v, v.wrapping_add(i as u8 * 10), 128]
                })
                .collect();
            RasterFrame::new(32, 24, 3, FrameIndex(i), i as f64 / 12.0, data).unwrap()
        })
        .collect();
    let audio = AudioTrack::new(
        48_000,
        2,
        (0..48_000 * 2)
            .map(|i| 0.2 * ((i / 2) as f32 * 0.05).sin())
            .collect(),
    )
    .unwrap();
    let params = EncodeParams {
        codec: "libx264".to_string(),
        keyint: 6,
        b_frames: 0,
        crf: 18,
        preset: "ultrafast".to_string(),
        profile: None,
        pix_fmt: "yuv420p".to_string(),
    };
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("clip.mp4");
    let codec = FfmpegCodec::default();
    let bytes = codec
        .encode(&EncodeRequest {
            kind: MediaKind::Video,
            frames: &frames,
            audio: Some(&audio),
            fps: Fps::new(12, 1).unwrap(),
            params: &params,
            output_path: &out,
        })
        .unwrap();
    std::fs::write(&out, bytes).unwrap();

    let asset = codec.decode(&out).unwrap();
    assert_eq!(asset.kind, MediaKind::Video);
    assert_eq!(asset.resolution, Resolution::new(32, 24).unwrap());
    assert_eq!(asset.fps, Fps::new(12, 1).unwrap());
    assert!(!asset.frames.is_empty());
    assert!(asset.audio.is_some());
}
