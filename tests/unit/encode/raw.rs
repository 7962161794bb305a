use super::*;
use crate::profile::params::EncodeParams;

fn frames(n: u64) -> Vec<RasterFrame> {
    (0..n)
        .map(|i| {
            let data = (0..6 * 4 * 3).map(|j| (j as u64 * 3 + i) as u8).collect();
            RasterFrame::new(6, 4, 3, FrameIndex(i), i as f64 / 25.0, data).unwrap()
        })
        .collect()
}

fn params(keyint: u32) -> EncodeParams {
    EncodeParams {
        codec: "libx264".to_string(),
        keyint,
        b_frames: 3,
        crf: 20,
        preset: "medium".to_string(),
        profile: None,
        pix_fmt: "yuv420p".to_string(),
    }
}

fn encode(frames: &[RasterFrame], audio: Option<&AudioTrack>, p: &EncodeParams) -> Vec<u8> {
    RawCodec::encode_bytes(&EncodeRequest {
        kind: MediaKind::Video,
        frames,
        audio,
        fps: Fps::new(25, 1).unwrap(),
        params: p,
        output_path: Path::new("out.raw"),
    })
    .unwrap()
}

#[test]
fn video_with_audio_survives_the_container() {
    let src = frames(5);
    let samples = (0..400).map(|i| i as f32 / 400.0 - 0.5).collect();
    let audio = AudioTrack::new(8_000, 2, samples).unwrap();
    let bytes = encode(&src, Some(&audio), &params(28));

    let asset = RawCodec::decode_bytes(&bytes).unwrap();
    assert_eq!(asset.kind, MediaKind::Video);
    assert_eq!(asset.frames, src);
    assert_eq!(asset.audio.as_ref(), Some(&audio));
    assert_eq!(asset.fps, Fps::new(25, 1).unwrap());
    assert!((asset.duration_secs - 0.2).abs() < 1e-12);
}

#[test]
fn header_records_encode_settings() {
    let h = RawCodec::read_header(&encode(&frames(3), None, &params(33))).unwrap();
    assert_eq!(h.keyint, 33);
    assert_eq!(h.b_frames, 3);
    assert_eq!(h.crf, 20);
    assert_eq!(h.frame_count, 3);
    assert_eq!((h.width, h.height, h.channels), (6, 4, 3));
    assert_eq!(h.audio_samples, 0);
}

#[test]
fn truncation_and_bit_flips_are_decode_errors() {
    let bytes = encode(&frames(2), None, &params(30));
    assert!(matches!(
        RawCodec::decode_bytes(&bytes[..bytes.len() - 3]),
        Err(ShiftError::Decode(_))
    ));
    assert!(matches!(RawCodec::decode_bytes(&bytes[..10]), Err(ShiftError::Decode(_))));

    let mut flipped = bytes.clone();
    flipped[HEADER_LEN + 1] ^= 0x40;
    assert!(matches!(RawCodec::decode_bytes(&flipped), Err(ShiftError::Decode(_))));

    let mut magic = bytes;
    magic[0] = b'X';
    assert!(matches!(RawCodec::decode_bytes(&magic), Err(ShiftError::Decode(_))));
}

#[test]
fn missing_file_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RawCodec::new().decode(&dir.path().join("nope.raw")).unwrap_err();
    assert!(matches!(err, ShiftError::Decode(_)));
}

#[test]
fn injected_failures_are_consumed_in_order() {
    let codec = RawCodec::with_encode_failures(1);
    let src = frames(1);
    let p = params(30);
    let req = EncodeRequest {
        kind: MediaKind::Image,
        frames: &src,
        audio: None,
        fps: Fps::new(1, 1).unwrap(),
        params: &p,
        output_path: Path::new("out.raw"),
    };
    assert!(matches!(codec.encode(&req), Err(ShiftError::Encode(_))));
    let bytes = codec.encode(&req).unwrap();
    assert_eq!(codec.encode_attempts(), 2);

    let asset = RawCodec::decode_bytes(&bytes).unwrap();
    assert_eq!(asset.kind, MediaKind::Image);
    assert_eq!(asset.frames.len(), 1);
}
