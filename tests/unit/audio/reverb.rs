use super::*;

fn taps() -> Vec<ReverbTap> {
    vec![
        ReverbTap {
            delay_ms: 10.0,
            gain: 0.5,
        },
        ReverbTap {
            delay_ms: 20.0,
            gain: 0.25,
        },
    ]
}

#[test]
fn impulse_produces_delayed_reflections() {
    let mut x = vec![vec![0.0f32; 2_000]];
    x[0][0] = 1.0;
    apply_reverb(&mut x, 48_000, &taps(), 0.1);
    assert_eq!(x[0][0], 1.0);
    assert!((x[0][480] - 0.05).abs() < 1e-6);
    assert!((x[0][960] - 0.025).abs() < 1e-6);
    assert_eq!(x[0][100], 0.0);
    assert_eq!(x[0].len(), 2_000);
}

#[test]
fn channels_are_decorrelated() {
    let mut x = vec![vec![0.0f32; 2_000]; 2];
    x[0][0] = 1.0;
    x[1][0] = 1.0;
    apply_reverb(&mut x, 48_000, &taps(), 0.1);
    assert_ne!(x[0], x[1]);
}

#[test]
fn dry_only_when_wet_is_zero() {
    let mut x = vec![vec![0.3f32; 100]];
    apply_reverb(&mut x, 48_000, &taps(), 0.0);
    assert!(x[0].iter().all(|&v| v == 0.3));
}
