use super::*;
use crate::foundation::core::{FrameIndex, Point, Resolution, Vec2};
use crate::profile::level::UniquenessLevel;

fn frames(n: u64, w: u32, h: u32) -> Vec<RasterFrame> {
    (0..n)
        .map(|i| {
            let mut data = Vec::with_capacity((w * h * 3) as usize);
            for y in 0..h {
                for x in 0..w {
                    let v = ((x + y + i as u32 * 3) % 200) as u8 + 20;
                    data.extend_from_slice(&[v, 255 - v, v / 2]);
                }
            }
            RasterFrame::new(w, h, 3, FrameIndex(i), i as f64 / 30.0, data).unwrap()
        })
        .collect()
}

fn params(level: u8, seed: u64, r: Resolution) -> EffectParameters {
    EffectParameters::draw(UniquenessLevel::new(level).unwrap(), seed, r, r).unwrap()
}

fn pool(threads: usize) -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap()
}

#[test]
fn batch_preserves_count_order_and_size() {
    let src = frames(12, 48, 27);
    let p = params(5, 3, src[0].resolution());
    let fps = Fps::new(30, 1).unwrap();
    let t = VideoTransformer::new(&p, fps, CentroidTrack::from_frames(&src)).unwrap();
    let out = t.transform_batch(&src, &pool(3)).unwrap();
    assert_eq!(out.len(), 12);
    for (i, f) in out.iter().enumerate() {
        assert_eq!(f.index, FrameIndex(i as u64));
        assert_eq!((f.width, f.height), (48, 27));
    }
}

#[test]
fn parallel_matches_serial() {
    let src = frames(8, 32, 18);
    let p = params(4, 11, src[0].resolution());
    let fps = Fps::new(30, 1).unwrap();
    let t = VideoTransformer::new(&p, fps, CentroidTrack::from_frames(&src)).unwrap();
    let serial = t.transform_batch(&src, &pool(1)).unwrap();
    let parallel = t.transform_batch(&src, &pool(4)).unwrap();
    assert_eq!(serial, parallel);
}

#[test]
fn single_frame_matches_batch_result() {
    let src = frames(6, 32, 18);
    let p = params(3, 5, src[0].resolution());
    let fps = Fps::new(30, 1).unwrap();
    let t = VideoTransformer::new(&p, fps, CentroidTrack::from_frames(&src)).unwrap();
    let batch = t.transform_batch(&src, &pool(2)).unwrap();
    assert_eq!(t.transform_frame(&src[4]).unwrap(), batch[4]);
}

#[test]
fn bad_frame_aborts_with_its_index() {
    let mut src = frames(4, 32, 18);
    src[2] = RasterFrame::new(16, 18, 3, FrameIndex(2), 0.0, vec![0; 16 * 18 * 3]).unwrap();
    let p = params(3, 5, src[0].resolution());
    let fps = Fps::new(30, 1).unwrap();
    let t = VideoTransformer::new(&p, fps, CentroidTrack::from_frames(&src)).unwrap();
    let err = t.transform_batch(&src, &pool(2)).unwrap_err();
    assert!(matches!(err, ShiftError::Transform { frame: Some(2), .. }));
}

#[test]
fn vignette_darkens_corners_not_center() {
    let mut f = FloatFrame::zeroed(41, 41, 3);
    f.data.iter_mut().for_each(|v| *v = 200.0);
    let state = FrameState {
        zoom: 1.0,
        pan: Vec2::ZERO,
        jitter: Vec2::ZERO,
        vignette_center: Point::new(20.5, 20.5),
    };
    apply_vignette(&mut f, &state, 0.05);
    let at = |x: usize, y: usize| f.data[(y * 41 + x) * 3];
    assert_eq!(at(20, 20), 200.0);
    assert!(at(0, 0) < 200.0 && at(0, 0) >= 189.0);
}

#[test]
fn encode_params_come_from_the_draw() {
    let r = Resolution::new(32, 18).unwrap();
    let p = params(5, 8, r);
    let t = VideoTransformer::new(&p, Fps::new(30, 1).unwrap(), CentroidTrack::default()).unwrap();
    assert_eq!(t.encode_params(), &p.encode);
    assert!((25..=35).contains(&t.encode_params().keyint));
    assert_eq!(t.encode_params().b_frames, 3);
}
