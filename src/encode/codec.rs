use std::path::Path;

use crate::foundation::core::{
    AudioTrack, Fps, FrameIndex, MediaAsset, MediaKind, RasterFrame, Resolution,
};
use crate::foundation::error::{ShiftError, ShiftResult};
use crate::profile::params::EncodeParams;

/// Everything an encoder needs to produce one output.
#[derive(Clone, Copy, Debug)]
pub struct EncodeRequest<'a> {
    /// Still or moving output.
    pub kind: MediaKind,
    /// Transformed frames in presentation order.
    pub frames: &'a [RasterFrame],
    /// Transformed audio, if any.
    pub audio: Option<&'a AudioTrack>,
    /// Output frame rate.
    pub fps: Fps,
    /// Codec settings.
    pub params: &'a EncodeParams,
    /// Declared destination. Codecs use it to pick a container or still format; they never write
    /// to it.
    pub output_path: &'a Path,
}

impl EncodeRequest<'_> {
    /// Shared dimensions of the request's frames.
    pub fn resolution(&self) -> ShiftResult<Resolution> {
        let first = self
            .frames
            .first()
            .ok_or_else(|| ShiftError::encode("nothing to encode: no frames"))?;
        let res = first.resolution();
        if self.frames.iter().any(|f| f.resolution() != res) {
            return Err(ShiftError::encode("frames have mixed dimensions"));
        }
        Ok(res)
    }
}

/// Swappable decode/encode capability.
///
/// The pipeline only sees this trait, so tests can run against an in-process container while
/// production shells out to an external tool.
pub trait MediaCodec: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Decode `path` into frames and optional audio.
    ///
    /// Unreadable or corrupt input must surface as [`ShiftError::Decode`].
    fn decode(&self, path: &Path) -> ShiftResult<MediaAsset>;

    /// Encode a request into the bytes of the output file.
    fn encode(&self, request: &EncodeRequest<'_>) -> ShiftResult<Vec<u8>>;
}

/// Lossless or maximum-quality still formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StillFormat {
    /// PNG, lossless.
    Png,
    /// JPEG at quality 100.
    Jpeg,
    /// WebP, lossless.
    WebP,
}

impl StillFormat {
    /// Pick a format from the output extension.
    pub fn from_path(path: &Path) -> ShiftResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::WebP),
            other => Err(ShiftError::validation(format!(
                "unsupported still output extension '{other}' (expected png, jpg, jpeg or webp)"
            ))),
        }
    }

    /// Encode one frame.
    pub fn encode(self, frame: &RasterFrame) -> ShiftResult<Vec<u8>> {
        use image::codecs::{jpeg::JpegEncoder, png::PngEncoder, webp::WebPEncoder};

        let rgb = frame.to_rgb_image()?;
        let mut buf = Vec::new();
        let res = match self {
            Self::Png => rgb.write_with_encoder(PngEncoder::new(&mut buf)),
            Self::Jpeg => rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, 100)),
            Self::WebP => rgb.write_with_encoder(WebPEncoder::new_lossless(&mut buf)),
        };
        res.map_err(|e| ShiftError::encode(format!("{self:?} encode failed: {e}")))?;
        Ok(buf)
    }
}

/// Decode a still with the `image` crate into a single RGB frame asset.
pub fn decode_still(path: &Path) -> ShiftResult<MediaAsset> {
    let img = image::open(path)
        .map_err(|e| ShiftError::decode(format!("failed to decode '{}': {e}", path.display())))?;
    let frame = RasterFrame::from_rgb_image(img.to_rgb8(), FrameIndex(0), 0.0);
    MediaAsset::image(frame).map_err(|e| ShiftError::decode(e.to_string()))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/codec.rs"]
mod tests;
