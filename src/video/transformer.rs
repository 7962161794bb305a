use rayon::prelude::*;

use crate::foundation::core::{Affine, Fps, RasterFrame};
use crate::foundation::error::{ShiftError, ShiftResult};
use crate::foundation::math::smoothstep;
use crate::image::buffer::FloatFrame;
use crate::image::geometry::{GeometryMapping, crop_scale_affine, warp};
use crate::image::transformer::{apply_photometric, ensure_source_size};
use crate::profile::params::{EffectParameters, EncodeParams};
use crate::video::temporal::{CentroidTrack, FrameState, TemporalEffectDriver};

/// Per-frame video transform driven by [`TemporalEffectDriver`].
///
/// Static parameters are shared by every frame; only the temporal curves vary with the index.
#[derive(Debug)]
pub struct VideoTransformer<'a> {
    params: &'a EffectParameters,
    fps: Fps,
    base: Affine,
    track: CentroidTrack,
}

impl<'a> VideoTransformer<'a> {
    /// Prepare a transformer. `track` must be computed from the full source sequence.
    pub fn new(params: &'a EffectParameters, fps: Fps, track: CentroidTrack) -> ShiftResult<Self> {
        let base = crop_scale_affine(&params.geometry, params.target)?;
        Ok(Self {
            params,
            fps,
            base,
            track,
        })
    }

    /// Encoder settings for the whole output.
    pub fn encode_params(&self) -> &EncodeParams {
        &self.params.encode
    }

    fn driver(&self) -> TemporalEffectDriver<'_> {
        TemporalEffectDriver::new(&self.params.temporal, self.fps, self.params.target, &self.track)
    }

    /// Compose crop, scale, zoom, pan and jitter into one output-to-source mapping.
    pub fn frame_mapping(&self, state: &FrameState) -> GeometryMapping {
        let center = self.params.target.center();
        let motion = Affine::translate(-(state.pan + state.jitter))
            * Affine::scale_about(1.0 / state.zoom, center);
        GeometryMapping::affine(self.base * motion)
    }

    /// Transform one frame. Errors are tagged with the frame index.
    pub fn transform_frame(&self, frame: &RasterFrame) -> ShiftResult<RasterFrame> {
        let tag = |e: ShiftError| e.at_frame(frame.index.0);
        ensure_source_size(frame, self.params)?;
        let state = self.driver().state(frame.index);
        if !(state.zoom.is_finite() && state.pan.is_finite() && state.jitter.is_finite()) {
            return Err(ShiftError::transform_at(
                frame.index.0,
                "temporal curves produced non-finite values",
            ));
        }
        let mut out = warp(frame, &self.frame_mapping(&state), self.params.target).map_err(tag)?;
        apply_vignette(&mut out, &state, self.params.temporal.vignette_strength);
        apply_photometric(&mut out, self.params);
        out.quantize(frame.index, frame.timestamp_secs).map_err(tag)
    }

    /// Transform a batch on `pool`, preserving order. The first failing frame aborts the batch.
    pub fn transform_batch(
        &self,
        frames: &[RasterFrame],
        pool: &rayon::ThreadPool,
    ) -> ShiftResult<Vec<RasterFrame>> {
        let results = pool.install(|| {
            frames
                .par_iter()
                .map(|f| self.transform_frame(f))
                .collect::<Vec<_>>()
        });
        let mut out = Vec::with_capacity(results.len());
        for item in results {
            out.push(item?);
        }
        Ok(out)
    }
}

/// Darken toward the corners around the tracked center.
pub fn apply_vignette(frame: &mut FloatFrame, state: &FrameState, strength: f64) {
    if strength <= 0.0 {
        return;
    }
    let (w, h) = (f64::from(frame.width), f64::from(frame.height));
    let reach = 0.5 * w.hypot(h);
    let center = state.vignette_center;
    let c = usize::from(frame.channels);
    let colors = frame.color_channels();
    let stride = frame.stride();
    frame
        .data
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let dy = y as f64 + 0.5 - center.y;
            for (x, px) in row.chunks_exact_mut(c).enumerate() {
                let dx = x as f64 + 0.5 - center.x;
                let r = (dx.hypot(dy) / reach).min(1.0);
                let gain = (1.0 - strength * smoothstep(0.4, 1.0, r)) as f32;
                for v in &mut px[..colors] {
                    *v *= gain;
                }
            }
        });
}

#[cfg(test)]
#[path = "../../tests/unit/video/transformer.rs"]
mod tests;
