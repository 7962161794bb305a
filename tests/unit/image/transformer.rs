use super::*;
use crate::foundation::core::{FrameIndex, Resolution};
use crate::profile::level::UniquenessLevel;

fn checker(w: u32, h: u32) -> RasterFrame {
    let mut data = Vec::with_capacity((w * h * 3) as usize);
    for y in 0..h {
        for x in 0..w {
            let v = if ((x / 8) + (y / 8)) % 2 == 0 { 220 } else { 30 };
            data.extend_from_slice(&[v, v / 2, 255 - v]);
        }
    }
    RasterFrame::new(w, h, 3, FrameIndex(0), 0.0, data).unwrap()
}

fn params(level: u8, seed: u64, src: Resolution, dst: Resolution) -> EffectParameters {
    EffectParameters::draw(UniquenessLevel::new(level).unwrap(), seed, src, dst).unwrap()
}

#[test]
fn output_has_target_dimensions() {
    let src = checker(96, 64);
    for (w, h) in [(96, 64), (50, 30), (128, 72)] {
        let p = params(3, 42, src.resolution(), Resolution::new(w, h).unwrap());
        let out = ImageTransformer::new(&p).unwrap().transform(&src).unwrap();
        assert_eq!((out.width, out.height, out.channels), (w, h, 3));
        assert_eq!(out.data.len(), (w * h * 3) as usize);
    }
}

#[test]
fn transform_is_deterministic_and_changes_pixels() {
    let src = checker(96, 64);
    let p = params(4, 7, src.resolution(), src.resolution());
    let t = ImageTransformer::new(&p).unwrap();
    let a = t.transform(&src).unwrap();
    let b = t.transform(&src).unwrap();
    assert_eq!(a, b);
    assert_ne!(a.data, src.data);
}

#[test]
fn mismatched_source_is_a_frame_tagged_transform_error() {
    let src = checker(96, 64);
    let p = params(3, 1, Resolution::new(100, 64).unwrap(), src.resolution());
    let err = ImageTransformer::new(&p).unwrap().transform(&src).unwrap_err();
    assert!(matches!(err, ShiftError::Transform { frame: Some(0), .. }));
}

#[test]
fn grayscale_frames_are_supported() {
    let src = RasterFrame::new(32, 32, 1, FrameIndex(0), 0.0, vec![128; 32 * 32]).unwrap();
    let p = params(2, 5, src.resolution(), src.resolution());
    let out = ImageTransformer::new(&p).unwrap().transform(&src).unwrap();
    assert_eq!(out.channels, 1);
}
