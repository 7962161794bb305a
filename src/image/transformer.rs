use crate::foundation::core::RasterFrame;
use crate::foundation::error::{ShiftError, ShiftResult};
use crate::image::buffer::FloatFrame;
use crate::image::color::apply_color_shift;
use crate::image::geometry::{GeometryMapping, still_mapping, warp};
use crate::image::noise::{apply_noise, apply_texture};
use crate::profile::params::EffectParameters;

/// Still-image transform: crop, scale and perspective in one resample, then noise, color shift and
/// texture.
#[derive(Clone, Debug)]
pub struct ImageTransformer<'a> {
    params: &'a EffectParameters,
    mapping: GeometryMapping,
}

impl<'a> ImageTransformer<'a> {
    /// Precompute the geometry for `params`.
    pub fn new(params: &'a EffectParameters) -> ShiftResult<Self> {
        let mapping = still_mapping(&params.geometry, params.target)?;
        Ok(Self { params, mapping })
    }

    /// Composed output-to-source mapping.
    pub fn mapping(&self) -> &GeometryMapping {
        &self.mapping
    }

    /// Transform one frame into a new frame of the target dimensions.
    pub fn transform(&self, frame: &RasterFrame) -> ShiftResult<RasterFrame> {
        ensure_source_size(frame, self.params)?;
        let mut out = warp(frame, &self.mapping, self.params.target)?;
        apply_photometric(&mut out, self.params);
        out.quantize(frame.index, frame.timestamp_secs)
    }
}

pub(crate) fn ensure_source_size(
    frame: &RasterFrame,
    params: &EffectParameters,
) -> ShiftResult<()> {
    if frame.resolution() != params.source {
        return Err(ShiftError::transform_at(
            frame.index.0,
            format!(
                "frame is {}x{}, parameters were drawn for {}x{}",
                frame.width, frame.height, params.source.width, params.source.height
            ),
        ));
    }
    Ok(())
}

/// Noise, color and texture stages shared by stills and video frames.
pub fn apply_photometric(frame: &mut FloatFrame, params: &EffectParameters) {
    apply_noise(frame, &params.noise);
    apply_color_shift(frame, &params.color);
    if let Some(texture) = &params.texture {
        apply_texture(frame, texture);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/image/transformer.rs"]
mod tests;
