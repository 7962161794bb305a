use std::path::Path;

use crate::foundation::error::{ShiftError, ShiftResult};

pub use kurbo::{Affine, Point, Vec2};

/// Absolute 0-based frame index within one asset.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Stable identifier of one source asset, used to key seeds and checkpoints.
///
/// Restricted to `[A-Za-z0-9_-]` so it is always a valid file stem.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct AssetId(String);

impl AssetId {
    /// Validate and wrap an identifier.
    pub fn new(id: impl Into<String>) -> ShiftResult<Self> {
        let id = id.into();
        if id.is_empty() || id.len() > 128 {
            return Err(ShiftError::validation(format!(
                "asset id must be 1..=128 chars, got {}",
                id.len()
            )));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ShiftError::validation(format!(
                "asset id '{id}' may only contain [A-Za-z0-9_-]"
            )));
        }
        Ok(Self(id))
    }

    /// Id derived from a byte key: its xxh3 hash as 16 hex digits.
    ///
    /// [`crate::AssetJob::resolved_id`] keys on the source path, not the file contents.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:016x}", xxhash_rust::xxh3::xxh3_64(bytes)))
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ShiftResult<Self> {
        if den == 0 {
            return Err(ShiftError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ShiftError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Parse an ffprobe-style rate such as `30000/1001` or `25`.
    pub fn parse_ratio(s: &str) -> ShiftResult<Self> {
        let s = s.trim();
        let (num, den) = match s.split_once('/') {
            Some((n, d)) => (n.trim(), d.trim()),
            None => (s, "1"),
        };
        let num = num
            .parse::<u32>()
            .map_err(|e| ShiftError::validation(format!("invalid fps numerator '{num}': {e}")))?;
        let den = den
            .parse::<u32>()
            .map_err(|e| ShiftError::validation(format!("invalid fps denominator '{den}': {e}")))?;
        Self::new(num, den)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert a frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Convert seconds to frame count using floor semantics.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        (secs * self.as_f64()).floor().max(0.0) as u64
    }
}

/// Raster dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Create a validated non-empty resolution.
    pub fn new(width: u32, height: u32) -> ShiftResult<Self> {
        if width == 0 || height == 0 {
            return Err(ShiftError::validation(format!(
                "resolution must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Length of the frame diagonal in pixels.
    pub fn diagonal(self) -> f64 {
        f64::from(self.width).hypot(f64::from(self.height))
    }

    /// Geometric center in pixel coordinates.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) * 0.5, f64::from(self.height) * 0.5)
    }

    /// Total number of pixels.
    pub fn area(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Kind of source media handled by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// A single still frame.
    Image,
    /// A frame sequence with optional audio.
    Video,
}

impl MediaKind {
    const VIDEO_EXTENSIONS: [&'static str; 5] = ["mp4", "mov", "avi", "mkv", "webm"];

    /// Classify a path by extension. Anything not recognized as video is treated as an image.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if Self::VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else {
            Self::Image
        }
    }
}

/// A 2-D grid of 8-bit samples with frame position metadata.
///
/// Stages never mutate a frame in place across stage boundaries: each stage consumes a frame and
/// produces a new one.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Interleaved channel count (1, 3 or 4).
    pub channels: u8,
    /// Position in the source sequence.
    pub index: FrameIndex,
    /// Presentation time in seconds.
    pub timestamp_secs: f64,
    /// Row-major interleaved samples, `width * height * channels` bytes.
    pub data: Vec<u8>,
}

impl RasterFrame {
    /// Create a validated frame.
    pub fn new(
        width: u32,
        height: u32,
        channels: u8,
        index: FrameIndex,
        timestamp_secs: f64,
        data: Vec<u8>,
    ) -> ShiftResult<Self> {
        if !matches!(channels, 1 | 3 | 4) {
            return Err(ShiftError::validation(format!(
                "unsupported channel count {channels} (expected 1, 3 or 4)"
            )));
        }
        let expected = frame_byte_len(width, height, channels)?;
        if data.len() != expected {
            return Err(ShiftError::validation(format!(
                "frame data is {} bytes, expected {expected} for {width}x{height}x{channels}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            index,
            timestamp_secs,
            data,
        })
    }

    /// Wrap an RGB8 image as frame `index`.
    pub fn from_rgb_image(img: image::RgbImage, index: FrameIndex, timestamp_secs: f64) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: 3,
            index,
            timestamp_secs,
            data: img.into_raw(),
        }
    }

    /// Convert to an RGB8 image, dropping alpha or expanding gray as needed.
    pub fn to_rgb_image(&self) -> ShiftResult<image::RgbImage> {
        let rgb = match self.channels {
            3 => self.data.clone(),
            4 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            1 => self.data.iter().flat_map(|&v| [v, v, v]).collect(),
            c => {
                return Err(ShiftError::validation(format!(
                    "cannot convert {c}-channel frame to rgb"
                )));
            }
        };
        image::RgbImage::from_raw(self.width, self.height, rgb)
            .ok_or_else(|| ShiftError::validation("frame buffer does not match its dimensions"))
    }

    /// Frame dimensions.
    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }

    /// Rec. 601 luma in `[0, 1]`, one value per pixel.
    pub fn luma(&self) -> Vec<f32> {
        let c = usize::from(self.channels);
        self.data
            .chunks_exact(c)
            .map(|px| {
                if c >= 3 {
                    (0.299 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.114 * f32::from(px[2]))
                        / 255.0
                } else {
                    f32::from(px[0]) / 255.0
                }
            })
            .collect()
    }
}

pub(crate) fn frame_byte_len(width: u32, height: u32, channels: u8) -> ShiftResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(usize::from(channels)))
        .ok_or_else(|| ShiftError::validation("frame buffer size overflow"))
}

/// Decoded interleaved floating-point PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioTrack {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples in `[-1, 1]`.
    pub samples: Vec<f32>,
}

impl AudioTrack {
    /// Create a validated track.
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> ShiftResult<Self> {
        if sample_rate == 0 {
            return Err(ShiftError::validation("audio sample_rate must be non-zero"));
        }
        if channels == 0 {
            return Err(ShiftError::validation("audio channels must be non-zero"));
        }
        if !samples.len().is_multiple_of(usize::from(channels)) {
            return Err(ShiftError::validation(
                "audio sample count is not a multiple of the channel count",
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
            samples,
        })
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Return `true` when the track holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Split interleaved samples into one buffer per channel.
    pub fn to_planar(&self) -> Vec<Vec<f32>> {
        let ch = usize::from(self.channels);
        let mut planar = vec![Vec::with_capacity(self.frames()); ch];
        for frame in self.samples.chunks_exact(ch) {
            for (c, &s) in frame.iter().enumerate() {
                planar[c].push(s);
            }
        }
        planar
    }

    /// Build an interleaved track from per-channel buffers of equal length.
    pub fn from_planar(sample_rate: u32, planar: &[Vec<f32>]) -> ShiftResult<Self> {
        let channels = u16::try_from(planar.len())
            .map_err(|_| ShiftError::validation("too many audio channels"))?;
        let frames = planar.first().map(Vec::len).unwrap_or(0);
        if planar.iter().any(|c| c.len() != frames) {
            return Err(ShiftError::validation(
                "planar audio channels have different lengths",
            ));
        }
        let mut samples = Vec::with_capacity(frames * planar.len());
        for i in 0..frames {
            for ch in planar {
                samples.push(ch[i]);
            }
        }
        Self::new(sample_rate, channels, samples)
    }

    /// Average all channels into one mono buffer.
    pub fn mono(&self) -> Vec<f32> {
        let ch = usize::from(self.channels.max(1));
        let inv = 1.0 / ch as f32;
        self.samples
            .chunks_exact(ch)
            .map(|f| f.iter().sum::<f32>() * inv)
            .collect()
    }
}

/// Immutable handle to a decoded source.
#[derive(Clone, Debug)]
pub struct MediaAsset {
    /// Still or moving media.
    pub kind: MediaKind,
    /// Decoded frames in presentation order (exactly one for images).
    pub frames: Vec<RasterFrame>,
    /// Optional audio track (videos only).
    pub audio: Option<AudioTrack>,
    /// Frame rate. Images use 1/1.
    pub fps: Fps,
    /// Dimensions shared by every frame.
    pub resolution: Resolution,
    /// Duration in seconds. Images report zero.
    pub duration_secs: f64,
}

impl MediaAsset {
    /// Wrap a single still frame.
    pub fn image(frame: RasterFrame) -> ShiftResult<Self> {
        let resolution = Resolution::new(frame.width, frame.height)?;
        Ok(Self {
            kind: MediaKind::Image,
            frames: vec![frame],
            audio: None,
            fps: Fps { num: 1, den: 1 },
            resolution,
            duration_secs: 0.0,
        })
    }

    /// Wrap a frame sequence. All frames must share one resolution.
    pub fn video(
        frames: Vec<RasterFrame>,
        fps: Fps,
        audio: Option<AudioTrack>,
    ) -> ShiftResult<Self> {
        let first = frames
            .first()
            .ok_or_else(|| ShiftError::validation("video asset must contain at least one frame"))?;
        let resolution = Resolution::new(first.width, first.height)?;
        if let Some(bad) = frames.iter().find(|f| f.resolution() != resolution) {
            return Err(ShiftError::validation(format!(
                "frame {} is {}x{}, expected {}x{}",
                bad.index.0, bad.width, bad.height, resolution.width, resolution.height
            )));
        }
        let duration_secs = fps.frames_to_secs(frames.len() as u64);
        Ok(Self {
            kind: MediaKind::Video,
            frames,
            audio: audio.filter(|a| !a.is_empty()),
            fps,
            resolution,
            duration_secs,
        })
    }

    /// Number of frames.
    pub fn frame_count(&self) -> u64 {
        self.frames.len() as u64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
