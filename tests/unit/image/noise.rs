use super::*;

fn params(opacity: f64) -> NoiseParams {
    NoiseParams {
        seed: 11,
        opacity,
        cell_px: 32.0,
        octaves: 3,
    }
}

#[test]
fn perlin_vanishes_on_lattice() {
    for (x, y) in [(0.0, 0.0), (3.0, -2.0), (17.0, 5.0)] {
        assert!(perlin(5, x, y).abs() < 1e-12);
    }
}

#[test]
fn fbm_is_bounded_and_smooth() {
    let p = params(0.004);
    let mut prev = fbm(&p, 0.5, 10.5);
    for i in 1..500 {
        let v = fbm(&p, 0.5 + f64::from(i), 10.5);
        assert!((-1.0..=1.0).contains(&v));
        // Neighboring pixels differ far less than white noise would.
        assert!((v - prev).abs() < 0.25, "jump at {i}: {prev} -> {v}");
        prev = v;
    }
}

#[test]
fn noise_is_seeded() {
    let a = params(0.004);
    let mut b = a;
    b.seed = 12;
    assert_eq!(fbm(&a, 40.3, 7.1), fbm(&a, 40.3, 7.1));
    assert_ne!(fbm(&a, 40.3, 7.1), fbm(&b, 40.3, 7.1));
}

#[test]
fn low_opacity_noise_is_imperceptible() {
    let mut f = FloatFrame::zeroed(64, 64, 3);
    f.data.iter_mut().for_each(|v| *v = 100.0);
    apply_noise(&mut f, &params(0.004));
    let max_dev = f.data.iter().map(|v| (v - 100.0).abs()).fold(0.0f32, f32::max);
    assert!(max_dev > 0.0);
    assert!(max_dev <= 1.0, "deviation {max_dev}");
}

#[test]
fn alpha_channel_is_untouched() {
    let mut f = FloatFrame::zeroed(8, 8, 4);
    f.data.iter_mut().for_each(|v| *v = 200.0);
    apply_texture(&mut f, &TextureParams { seed: 3, opacity: 0.5 });
    for px in f.data.chunks_exact(4) {
        assert_eq!(px[3], 200.0);
    }
}

#[test]
fn zero_opacity_is_identity() {
    let mut f = FloatFrame::zeroed(8, 8, 3);
    f.data.iter_mut().for_each(|v| *v = 42.0);
    let before = f.clone();
    apply_noise(&mut f, &params(0.0));
    assert_eq!(f, before);
}
