use crate::foundation::core::{FrameIndex, RasterFrame};
use crate::foundation::error::ShiftResult;
use crate::foundation::math::quantize_u8;

/// Floating-point working copy of a frame, samples in `[0, 255]`.
///
/// Every stage between decode and encode works on this buffer so the result is quantized exactly
/// once.
#[derive(Clone, Debug, PartialEq)]
pub struct FloatFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Interleaved channel count.
    pub channels: u8,
    /// Row-major interleaved samples.
    pub data: Vec<f32>,
}

impl FloatFrame {
    /// Zero-filled buffer.
    pub fn zeroed(width: u32, height: u32, channels: u8) -> Self {
        let len = width as usize * height as usize * usize::from(channels);
        Self {
            width,
            height,
            channels,
            data: vec![0.0; len],
        }
    }

    /// Widen an 8-bit frame.
    pub fn from_raster(frame: &RasterFrame) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            channels: frame.channels,
            data: frame.data.iter().map(|&v| f32::from(v)).collect(),
        }
    }

    /// Number of color channels, excluding alpha.
    pub fn color_channels(&self) -> usize {
        match self.channels {
            4 => 3,
            c => usize::from(c),
        }
    }

    /// Row stride in samples.
    pub fn stride(&self) -> usize {
        self.width as usize * usize::from(self.channels)
    }

    /// Round, clamp and narrow into an 8-bit frame.
    pub fn quantize(&self, index: FrameIndex, timestamp_secs: f64) -> ShiftResult<RasterFrame> {
        let data = self.data.iter().map(|&v| quantize_u8(v)).collect();
        RasterFrame::new(
            self.width,
            self.height,
            self.channels,
            index,
            timestamp_secs,
            data,
        )
    }
}
