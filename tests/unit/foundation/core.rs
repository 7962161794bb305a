use super::*;

#[test]
fn fps_frames_secs_roundtrip_floor() {
    let fps = Fps::new(30000, 1001).unwrap();
    let secs = fps.frames_to_secs(123);
    assert_eq!(fps.secs_to_frames_floor(secs), 123);
}

#[test]
fn fps_parse_ratio_accepts_fraction_and_integer() {
    assert_eq!(Fps::parse_ratio("30000/1001").unwrap(), Fps::new(30000, 1001).unwrap());
    assert_eq!(Fps::parse_ratio("25").unwrap(), Fps::new(25, 1).unwrap());
    assert!(Fps::parse_ratio("0/0").is_err());
    assert!(Fps::parse_ratio("abc").is_err());
}

#[test]
fn media_kind_from_extension() {
    assert_eq!(MediaKind::from_path(Path::new("a/clip.MP4")), MediaKind::Video);
    assert_eq!(MediaKind::from_path(Path::new("clip.webm")), MediaKind::Video);
    assert_eq!(MediaKind::from_path(Path::new("photo.png")), MediaKind::Image);
    assert_eq!(MediaKind::from_path(Path::new("noext")), MediaKind::Image);
}

#[test]
fn raster_frame_rejects_size_mismatch() {
    assert!(RasterFrame::new(4, 4, 3, FrameIndex(0), 0.0, vec![0; 47]).is_err());
    assert!(RasterFrame::new(4, 4, 2, FrameIndex(0), 0.0, vec![0; 32]).is_err());
    assert!(RasterFrame::new(4, 4, 4, FrameIndex(0), 0.0, vec![0; 64]).is_ok());
}

#[test]
fn raster_frame_rgb_conversion_drops_alpha() {
    let f = RasterFrame::new(1, 2, 4, FrameIndex(0), 0.0, vec![1, 2, 3, 255, 4, 5, 6, 0]).unwrap();
    let img = f.to_rgb_image().unwrap();
    assert_eq!(img.into_raw(), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn luma_of_white_is_one() {
    let f = RasterFrame::new(2, 1, 3, FrameIndex(0), 0.0, vec![255; 6]).unwrap();
    for v in f.luma() {
        assert!((v - 1.0).abs() < 1e-5);
    }
}

#[test]
fn audio_planar_roundtrip_preserves_order() {
    let t = AudioTrack::new(48_000, 2, vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3]).unwrap();
    let planar = t.to_planar();
    assert_eq!(planar[0], vec![0.1, 0.2, 0.3]);
    assert_eq!(planar[1], vec![-0.1, -0.2, -0.3]);
    assert_eq!(AudioTrack::from_planar(48_000, &planar).unwrap(), t);
    assert_eq!(t.frames(), 3);
    assert!((t.mono()[1]).abs() < 1e-7);
}

#[test]
fn audio_rejects_ragged_interleave() {
    assert!(AudioTrack::new(48_000, 2, vec![0.0; 3]).is_err());
    assert!(AudioTrack::new(0, 2, vec![]).is_err());
}

#[test]
fn video_asset_requires_uniform_resolution() {
    let a = RasterFrame::new(2, 2, 3, FrameIndex(0), 0.0, vec![0; 12]).unwrap();
    let b = RasterFrame::new(3, 2, 3, FrameIndex(1), 0.1, vec![0; 18]).unwrap();
    let fps = Fps::new(10, 1).unwrap();
    assert!(MediaAsset::video(vec![a.clone(), b], fps, None).is_err());
    let ok = MediaAsset::video(vec![a.clone(), a], fps, None).unwrap();
    assert_eq!(ok.frame_count(), 2);
    assert!((ok.duration_secs - 0.2).abs() < 1e-9);
    assert!(MediaAsset::video(vec![], fps, None).is_err());
}

#[test]
fn asset_id_validation_and_content_hash() {
    assert!(AssetId::new("clip_01-a").is_ok());
    assert!(AssetId::new("../etc").is_err());
    assert!(AssetId::new("").is_err());
    let a = AssetId::from_bytes(b"hello");
    let b = AssetId::from_bytes(b"hello");
    assert_eq!(a, b);
    assert_eq!(a.as_str().len(), 16);
    assert_ne!(a, AssetId::from_bytes(b"hellp"));
}
