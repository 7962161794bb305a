//! Time-varying video curves.
//!
//! Every curve is a pure function of the frame time and the drawn coefficients, so any frame can be
//! transformed on its own.

use rayon::prelude::*;

use crate::foundation::core::{Fps, FrameIndex, Point, RasterFrame, Resolution, Vec2};
use crate::profile::params::{Harmonic, TemporalParams};

/// Zoom factor at `t` seconds: `min(1 + rate * t, zoom_max)`.
pub fn zoom_at(params: &TemporalParams, t: f64) -> f64 {
    (1.0 + params.zoom_rate_per_sec * t.max(0.0)).min(params.zoom_max.max(1.0))
}

fn sum_harmonics(hs: &[Harmonic], t: f64) -> f64 {
    hs.iter().map(|h| h.eval(t)).sum()
}

/// Slow pan offset in target pixels.
pub fn pan_at(params: &TemporalParams, t: f64) -> Vec2 {
    Vec2::new(sum_harmonics(&params.pan_x, t), sum_harmonics(&params.pan_y, t))
}

/// Band-limited jitter offset in target pixels.
pub fn jitter_at(params: &TemporalParams, t: f64) -> Vec2 {
    Vec2::new(
        sum_harmonics(&params.jitter_x, t),
        sum_harmonics(&params.jitter_y, t),
    )
}

/// Per-frame luminance centroids, normalized to `[0, 1]` on both axes.
///
/// Computed once from the source frames and treated as an immutable input afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CentroidTrack {
    points: Vec<Point>,
}

impl CentroidTrack {
    /// Wrap precomputed centroids.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Compute the luminance-weighted centroid of every frame.
    pub fn from_frames(frames: &[RasterFrame]) -> Self {
        Self {
            points: frames.par_iter().map(luma_centroid).collect(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Return `true` when the track is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Gaussian-weighted average around `index` with standard deviation `sigma_frames`.
    pub fn smoothed(&self, index: usize, sigma_frames: f64) -> Point {
        if self.points.is_empty() {
            return Point::new(0.5, 0.5);
        }
        let idx = index.min(self.points.len() - 1);
        if sigma_frames <= 0.0 {
            return self.points[idx];
        }
        let reach = (3.0 * sigma_frames).ceil() as usize;
        let lo = idx.saturating_sub(reach);
        let hi = (idx + reach).min(self.points.len() - 1);
        let inv = 1.0 / (2.0 * sigma_frames * sigma_frames);
        let (mut sx, mut sy, mut sw) = (0.0, 0.0, 0.0);
        for (i, p) in self.points[lo..=hi].iter().enumerate() {
            let d = (lo + i) as f64 - idx as f64;
            let w = (-d * d * inv).exp();
            sx += w * p.x;
            sy += w * p.y;
            sw += w;
        }
        Point::new(sx / sw, sy / sw)
    }
}

fn luma_centroid(frame: &RasterFrame) -> Point {
    let luma = frame.luma();
    let w = frame.width as usize;
    let (mut sx, mut sy, mut total) = (0.0f64, 0.0f64, 0.0f64);
    for (i, &v) in luma.iter().enumerate() {
        let v = f64::from(v);
        sx += v * ((i % w) as f64 + 0.5);
        sy += v * ((i / w) as f64 + 0.5);
        total += v;
    }
    if total <= f64::EPSILON {
        return Point::new(0.5, 0.5);
    }
    Point::new(
        sx / total / f64::from(frame.width),
        sy / total / f64::from(frame.height),
    )
}

/// Curve values for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameState {
    /// Zoom factor, at least 1.
    pub zoom: f64,
    /// Pan offset in target pixels.
    pub pan: Vec2,
    /// Jitter offset in target pixels.
    pub jitter: Vec2,
    /// Vignette center in target pixels.
    pub vignette_center: Point,
}

/// Evaluates the temporal curves for any frame index.
#[derive(Clone, Debug)]
pub struct TemporalEffectDriver<'a> {
    params: &'a TemporalParams,
    fps: Fps,
    target: Resolution,
    track: &'a CentroidTrack,
}

impl<'a> TemporalEffectDriver<'a> {
    /// Bind curves to a frame rate, output size and centroid track.
    pub fn new(
        params: &'a TemporalParams,
        fps: Fps,
        target: Resolution,
        track: &'a CentroidTrack,
    ) -> Self {
        Self {
            params,
            fps,
            target,
            track,
        }
    }

    /// Evaluate every curve at `index`.
    pub fn state(&self, index: FrameIndex) -> FrameState {
        let t = self.fps.frames_to_secs(index.0);
        let sigma = self.params.vignette_smoothing_secs * self.fps.as_f64();
        let c = self.track.smoothed(index.0 as usize, sigma);
        FrameState {
            zoom: zoom_at(self.params, t),
            pan: pan_at(self.params, t),
            jitter: jitter_at(self.params, t),
            vignette_center: Point::new(
                c.x * f64::from(self.target.width),
                c.y * f64::from(self.target.height),
            ),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/video/temporal.rs"]
mod tests;
