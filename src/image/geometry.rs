use rayon::prelude::*;

use crate::foundation::core::{Affine, Point, RasterFrame, Resolution, Vec2};
use crate::foundation::error::{ShiftError, ShiftResult};
use crate::image::buffer::FloatFrame;
use crate::profile::params::GeometryParams;

const SINGULAR_EPS: f64 = 1e-12;

/// Projective 2-D transform stored row-major with `m[8] == 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    m: [f64; 9],
}

impl Homography {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    /// Solve for the transform mapping each `from[i]` onto `to[i]`.
    pub fn from_quads(from: [Point; 4], to: [Point; 4]) -> ShiftResult<Self> {
        let mut a = [[0.0f64; 9]; 8];
        for i in 0..4 {
            let (x, y) = (from[i].x, from[i].y);
            let (u, v) = (to[i].x, to[i].y);
            a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u, u];
            a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v, v];
        }
        let h = solve_8x8(a)?;
        let out = Self {
            m: [h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0],
        };
        if out.determinant().abs() < SINGULAR_EPS || out.m.iter().any(|v| !v.is_finite()) {
            return Err(ShiftError::transform("degenerate perspective matrix"));
        }
        Ok(out)
    }

    /// Determinant of the 3x3 matrix.
    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0] * (m[4] * m[8] - m[5] * m[7]) - m[1] * (m[3] * m[8] - m[5] * m[6])
            + m[2] * (m[3] * m[7] - m[4] * m[6])
    }

    /// Map a point. Returns `None` when it lands on the line at infinity.
    pub fn apply(&self, p: Point) -> Option<Point> {
        let m = &self.m;
        let w = m[6] * p.x + m[7] * p.y + m[8];
        if w.abs() < SINGULAR_EPS {
            return None;
        }
        Some(Point::new(
            (m[0] * p.x + m[1] * p.y + m[2]) / w,
            (m[3] * p.x + m[4] * p.y + m[5]) / w,
        ))
    }

    fn w_at(&self, p: Point) -> f64 {
        self.m[6] * p.x + self.m[7] * p.y + self.m[8]
    }
}

fn solve_8x8(mut a: [[f64; 9]; 8]) -> ShiftResult<[f64; 8]> {
    for col in 0..8 {
        let pivot = (col..8)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < SINGULAR_EPS {
            return Err(ShiftError::transform("degenerate perspective matrix"));
        }
        a.swap(col, pivot);
        for row in 0..8 {
            if row == col {
                continue;
            }
            let f = a[row][col] / a[col][col];
            if f == 0.0 {
                continue;
            }
            for k in col..9 {
                a[row][k] -= f * a[col][k];
            }
        }
    }
    let mut out = [0.0; 8];
    for (i, v) in out.iter_mut().enumerate() {
        *v = a[i][8] / a[i][i];
    }
    Ok(out)
}

/// Output-to-source pixel mapping: optional projective step followed by an affine one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryMapping {
    /// Output plane to pre-perspective plane.
    pub perspective: Option<Homography>,
    /// Pre-perspective plane to source pixels.
    pub affine: Affine,
}

impl GeometryMapping {
    /// Mapping from plain affine geometry.
    pub fn affine(affine: Affine) -> Self {
        Self {
            perspective: None,
            affine,
        }
    }

    /// Source coordinate sampled for output coordinate `q`.
    pub fn source_point(&self, q: Point) -> Option<Point> {
        let p = match &self.perspective {
            Some(h) => h.apply(q)?,
            None => q,
        };
        Some(self.affine * p)
    }
}

/// Affine taking target-frame coordinates onto the crop window, with the scale applied about the
/// target center.
pub fn crop_scale_affine(geometry: &GeometryParams, target: Resolution) -> ShiftResult<Affine> {
    if !(geometry.scale.is_finite() && geometry.scale > 0.0) {
        return Err(ShiftError::transform(format!(
            "invalid scale factor {}",
            geometry.scale
        )));
    }
    let crop = geometry.crop;
    if !(crop.width > 0.0 && crop.height > 0.0) {
        return Err(ShiftError::transform("empty crop window"));
    }
    let to_crop = Affine::translate(Vec2::new(crop.x, crop.y))
        * Affine::scale_non_uniform(
            crop.width / f64::from(target.width),
            crop.height / f64::from(target.height),
        );
    let unscale = Affine::scale_about(1.0 / geometry.scale, target.center());
    Ok(to_crop * unscale)
}

/// Homography undoing the corner displacement of the perspective warp.
pub fn perspective_homography(
    offsets: &[Vec2; 4],
    target: Resolution,
) -> ShiftResult<Homography> {
    let (w, h) = (f64::from(target.width), f64::from(target.height));
    let corners = [
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    ];
    let moved = [
        corners[0] + offsets[0],
        corners[1] + offsets[1],
        corners[2] + offsets[2],
        corners[3] + offsets[3],
    ];
    let hom = Homography::from_quads(moved, corners)?;
    // All output corners must stay on the same side of the horizon.
    let sign = hom.w_at(corners[0]).signum();
    if corners.iter().any(|&c| hom.w_at(c).signum() != sign) {
        return Err(ShiftError::transform("perspective warp folds the frame"));
    }
    Ok(hom)
}

/// Compose crop, scale and perspective into one mapping.
pub fn still_mapping(
    geometry: &GeometryParams,
    target: Resolution,
) -> ShiftResult<GeometryMapping> {
    Ok(GeometryMapping {
        perspective: Some(perspective_homography(&geometry.perspective, target)?),
        affine: crop_scale_affine(geometry, target)?,
    })
}

/// Bilinear sample with clamp-to-edge at pixel-center coordinates.
fn sample_bilinear(src: &RasterFrame, x: f64, y: f64, out: &mut [f32]) {
    let max_x = f64::from(src.width - 1);
    let max_y = f64::from(src.height - 1);
    let x = (x - 0.5).clamp(0.0, max_x);
    let y = (y - 0.5).clamp(0.0, max_y);
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = (x - x0) as f32;
    let fy = (y - y0) as f32;
    let x0 = x0 as usize;
    let y0 = y0 as usize;
    let x1 = (x0 + 1).min(src.width as usize - 1);
    let y1 = (y0 + 1).min(src.height as usize - 1);
    let c = usize::from(src.channels);
    let stride = src.width as usize * c;
    let at = |px: usize, py: usize, ch: usize| f32::from(src.data[py * stride + px * c + ch]);
    for (ch, o) in out.iter_mut().enumerate() {
        let top = at(x0, y0, ch) * (1.0 - fx) + at(x1, y0, ch) * fx;
        let bottom = at(x0, y1, ch) * (1.0 - fx) + at(x1, y1, ch) * fx;
        *o = top * (1.0 - fy) + bottom * fy;
    }
}

/// Resample `src` into a `target`-sized float frame through `mapping`.
pub fn warp(
    src: &RasterFrame,
    mapping: &GeometryMapping,
    target: Resolution,
) -> ShiftResult<FloatFrame> {
    let mut out = FloatFrame::zeroed(target.width, target.height, src.channels);
    let stride = out.stride();
    let c = usize::from(src.channels);
    out.data
        .par_chunks_mut(stride)
        .enumerate()
        .try_for_each(|(y, row)| -> ShiftResult<()> {
            for (x, px) in row.chunks_exact_mut(c).enumerate() {
                let q = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let p = mapping
                    .source_point(q)
                    .filter(|p| p.x.is_finite() && p.y.is_finite())
                    .ok_or_else(|| {
                        ShiftError::transform(format!("pixel ({x}, {y}) maps to infinity"))
                    })?;
                sample_bilinear(src, p.x, p.y, px);
            }
            Ok(())
        })?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/image/geometry.rs"]
mod tests;
