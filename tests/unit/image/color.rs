use super::*;

const NONE: ColorShift = ColorShift {
    hue_deg: 0.0,
    saturation: 0.0,
    lightness: 0.0,
};

#[test]
fn oklab_roundtrip_is_close() {
    for rgb in [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [0.8, 0.2, 0.1], [0.1, 0.5, 0.9]] {
        let back = oklab_to_srgb(srgb_to_oklab(rgb));
        for (a, b) in rgb.iter().zip(back) {
            assert!((a - b).abs() < 1e-3, "{rgb:?} -> {back:?}");
        }
    }
}

#[test]
fn white_has_unit_lightness_and_no_chroma() {
    let [l, a, b] = srgb_to_oklab([1.0, 1.0, 1.0]);
    assert!((l - 1.0).abs() < 1e-3);
    assert!(a.abs() < 1e-3 && b.abs() < 1e-3);
}

#[test]
fn zero_shift_is_identity() {
    let px = [0.3, 0.6, 0.2];
    let out = shift_pixel(px, &NONE);
    for (a, b) in px.iter().zip(out) {
        assert!((a - b).abs() < 1e-3);
    }
}

#[test]
fn small_shift_stays_small() {
    let shift = ColorShift {
        hue_deg: 1.0,
        saturation: 0.02,
        lightness: 0.03,
    };
    let px = [0.5, 0.4, 0.3];
    let out = shift_pixel(px, &shift);
    for (a, b) in px.iter().zip(out) {
        assert!((a - b).abs() < 0.05);
    }
    assert_ne!(out, shift_pixel(px, &NONE));
}

#[test]
fn saturated_inputs_remain_in_gamut() {
    let shift = ColorShift {
        hue_deg: -1.6,
        saturation: 0.03,
        lightness: 0.04,
    };
    let mut f = FloatFrame::zeroed(2, 1, 3);
    f.data = vec![255.0, 0.0, 0.0, 255.0, 255.0, 255.0];
    apply_color_shift(&mut f, &shift);
    assert!(f.data.iter().all(|v| (0.0..=255.0).contains(v)));
}
