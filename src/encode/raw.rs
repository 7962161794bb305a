use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::encode::codec::{EncodeRequest, MediaCodec};
use crate::foundation::core::{
    AudioTrack, Fps, FrameIndex, MediaAsset, MediaKind, RasterFrame, frame_byte_len,
};
use crate::foundation::error::{ShiftError, ShiftResult};

const MAGIC: &[u8; 8] = b"MSHIFT01";
const HEADER_LEN: usize = 8 + 1 + 4 + 4 + 1 + 4 + 4 + 8 + 4 + 4 + 1 + 4 + 2 + 8;
const CHECKSUM_LEN: usize = 8;

/// Fixed-size header of a raw container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawHeader {
    /// Still or moving content.
    pub kind: MediaKind,
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// Interleaved channels per pixel.
    pub channels: u8,
    /// Frame rate.
    pub fps: Fps,
    /// Number of frames that follow the header.
    pub frame_count: u64,
    /// Keyframe interval recorded at encode time.
    pub keyint: u32,
    /// B-frame count recorded at encode time.
    pub b_frames: u32,
    /// CRF recorded at encode time.
    pub crf: u8,
    /// Audio sample rate, zero when there is no audio.
    pub sample_rate: u32,
    /// Audio channel count, zero when there is no audio.
    pub audio_channels: u16,
    /// Interleaved audio sample count.
    pub audio_samples: u64,
}

/// Lossless in-process container: header, raw frames, `f32le` audio, xxh3 trailer.
///
/// Used by tests and for debugging pipeline output without an external encoder. Encode settings
/// are recorded in the header so callers can verify them.
#[derive(Debug, Default)]
pub struct RawCodec {
    fail_encodes: AtomicUsize,
    encode_attempts: AtomicUsize,
}

impl RawCodec {
    /// Codec that never fails on purpose.
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec whose first `n` encode calls fail with [`ShiftError::Encode`].
    pub fn with_encode_failures(n: usize) -> Self {
        Self {
            fail_encodes: AtomicUsize::new(n),
            encode_attempts: AtomicUsize::new(0),
        }
    }

    /// Number of `encode` calls so far, including failed ones.
    pub fn encode_attempts(&self) -> usize {
        self.encode_attempts.load(Ordering::SeqCst)
    }

    /// Parse and validate only the header of `bytes`.
    pub fn read_header(bytes: &[u8]) -> ShiftResult<RawHeader> {
        if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
            return Err(ShiftError::decode(format!(
                "raw container truncated: {} bytes",
                bytes.len()
            )));
        }
        let mut r = Reader { buf: bytes, pos: 0 };
        if r.take(8)? != MAGIC {
            return Err(ShiftError::decode("raw container has a bad magic number"));
        }
        let kind = match r.u8()? {
            0 => MediaKind::Image,
            1 => MediaKind::Video,
            other => return Err(ShiftError::decode(format!("unknown media kind tag {other}"))),
        };
        let width = r.u32()?;
        let height = r.u32()?;
        let channels = r.u8()?;
        let fps_num = r.u32()?;
        let fps_den = r.u32()?;
        let fps = Fps::new(fps_num, fps_den).map_err(|e| ShiftError::decode(e.to_string()))?;
        Ok(RawHeader {
            kind,
            width,
            height,
            channels,
            fps,
            frame_count: r.u64()?,
            keyint: r.u32()?,
            b_frames: r.u32()?,
            crf: r.u8()?,
            sample_rate: r.u32()?,
            audio_channels: r.u16()?,
            audio_samples: r.u64()?,
        })
    }

    /// Decode a full container held in memory.
    pub fn decode_bytes(bytes: &[u8]) -> ShiftResult<MediaAsset> {
        let header = Self::read_header(bytes)?;
        let body_end = bytes.len() - CHECKSUM_LEN;
        let stored = u64::from_le_bytes(
            bytes[body_end..]
                .try_into()
                .map_err(|_| ShiftError::decode("raw container checksum missing"))?,
        );
        if xxhash_rust::xxh3::xxh3_64(&bytes[..body_end]) != stored {
            return Err(ShiftError::decode("raw container checksum mismatch"));
        }

        let frame_len = frame_byte_len(header.width, header.height, header.channels)
            .map_err(|e| ShiftError::decode(e.to_string()))?;
        let frames_len = usize::try_from(header.frame_count)
            .ok()
            .and_then(|n| n.checked_mul(frame_len));
        let audio_len = usize::try_from(header.audio_samples)
            .ok()
            .and_then(|n| n.checked_mul(4));
        let (Some(frames_len), Some(audio_len)) = (frames_len, audio_len) else {
            return Err(ShiftError::decode("raw container sizes overflow"));
        };
        if HEADER_LEN + frames_len + audio_len != body_end {
            return Err(ShiftError::decode(format!(
                "raw container body is {} bytes, header describes {}",
                body_end - HEADER_LEN,
                frames_len + audio_len
            )));
        }

        let mut r = Reader {
            buf: &bytes[..body_end],
            pos: HEADER_LEN,
        };
        let mut frames = Vec::with_capacity(frames_len / frame_len.max(1));
        for i in 0..header.frame_count {
            let data = r.take(frame_len)?.to_vec();
            let ts = match header.kind {
                MediaKind::Image => 0.0,
                MediaKind::Video => header.fps.frames_to_secs(i),
            };
            frames.push(
                RasterFrame::new(
                    header.width,
                    header.height,
                    header.channels,
                    FrameIndex(i),
                    ts,
                    data,
                )
                .map_err(|e| ShiftError::decode(e.to_string()))?,
            );
        }
        let audio = if header.audio_samples > 0 {
            let samples = r
                .take(audio_len)?
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            Some(
                AudioTrack::new(header.sample_rate, header.audio_channels, samples)
                    .map_err(|e| ShiftError::decode(e.to_string()))?,
            )
        } else {
            None
        };

        let asset = match header.kind {
            MediaKind::Image => {
                let [frame] = <[RasterFrame; 1]>::try_from(frames).map_err(|f| {
                    ShiftError::decode(format!("image container holds {} frames", f.len()))
                })?;
                MediaAsset::image(frame)
            }
            MediaKind::Video => MediaAsset::video(frames, header.fps, audio),
        };
        asset.map_err(|e| ShiftError::decode(e.to_string()))
    }

    /// Serialize a request without any failure injection.
    pub fn encode_bytes(request: &EncodeRequest<'_>) -> ShiftResult<Vec<u8>> {
        let res = request.resolution()?;
        let channels = request.frames[0].channels;
        if request.frames.iter().any(|f| f.channels != channels) {
            return Err(ShiftError::encode("frames have mixed channel counts"));
        }
        let frame_len = frame_byte_len(res.width, res.height, channels)?;
        let audio_samples = request.audio.map(|a| a.samples.len()).unwrap_or(0);

        let mut out =
            Vec::with_capacity(HEADER_LEN + frame_len * request.frames.len() + audio_samples * 4);
        out.extend_from_slice(MAGIC);
        out.push(match request.kind {
            MediaKind::Image => 0,
            MediaKind::Video => 1,
        });
        out.extend_from_slice(&res.width.to_le_bytes());
        out.extend_from_slice(&res.height.to_le_bytes());
        out.push(channels);
        out.extend_from_slice(&request.fps.num.to_le_bytes());
        out.extend_from_slice(&request.fps.den.to_le_bytes());
        out.extend_from_slice(&(request.frames.len() as u64).to_le_bytes());
        out.extend_from_slice(&request.params.keyint.to_le_bytes());
        out.extend_from_slice(&request.params.b_frames.to_le_bytes());
        out.push(request.params.crf);
        out.extend_from_slice(&request.audio.map(|a| a.sample_rate).unwrap_or(0).to_le_bytes());
        out.extend_from_slice(&request.audio.map(|a| a.channels).unwrap_or(0).to_le_bytes());
        out.extend_from_slice(&(audio_samples as u64).to_le_bytes());
        debug_assert_eq!(out.len(), HEADER_LEN);

        for f in request.frames {
            out.extend_from_slice(&f.data);
        }
        if let Some(audio) = request.audio {
            for s in &audio.samples {
                out.extend_from_slice(&s.to_le_bytes());
            }
        }
        let checksum = xxhash_rust::xxh3::xxh3_64(&out);
        out.extend_from_slice(&checksum.to_le_bytes());
        Ok(out)
    }
}

impl MediaCodec for RawCodec {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn decode(&self, path: &Path) -> ShiftResult<MediaAsset> {
        let bytes = std::fs::read(path)
            .map_err(|e| ShiftError::decode(format!("failed to read '{}': {e}", path.display())))?;
        Self::decode_bytes(&bytes)
    }

    fn encode(&self, request: &EncodeRequest<'_>) -> ShiftResult<Vec<u8>> {
        self.encode_attempts.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .fail_encodes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(ShiftError::encode("injected encoder failure"));
        }
        Self::encode_bytes(request)
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> ShiftResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| ShiftError::decode("raw container truncated"))?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> ShiftResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> ShiftResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> ShiftResult<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> ShiftResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> ShiftResult<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/raw.rs"]
mod tests;
