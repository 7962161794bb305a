use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::encode::codec::{EncodeRequest, MediaCodec, StillFormat, decode_still};
use crate::foundation::core::{
    AudioTrack, Fps, FrameIndex, MediaAsset, MediaKind, RasterFrame, Resolution,
};
use crate::foundation::error::{ShiftError, ShiftResult};

/// Stream layout reported by `ffprobe`.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeInfo {
    /// Video dimensions.
    pub resolution: Resolution,
    /// Video frame rate.
    pub fps: Fps,
    /// Container duration, when reported.
    pub duration_secs: Option<f64>,
    /// Audio `(sample_rate, channels)` of the first audio stream.
    pub audio: Option<(u32, u16)>,
}

/// Production codec: `ffprobe`/`ffmpeg` subprocesses for video, the `image` crate for stills.
#[derive(Clone, Debug)]
pub struct FfmpegCodec {
    ffmpeg: String,
    ffprobe: String,
}

impl Default for FfmpegCodec {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegCodec {
    /// Codec using the given binary names or paths.
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Probe the first video stream and the first audio stream of `path`.
    pub fn probe(&self, path: &Path) -> ShiftResult<ProbeInfo> {
        #[derive(serde::Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
            r_frame_rate: Option<String>,
            avg_frame_rate: Option<String>,
            sample_rate: Option<String>,
            channels: Option<u16>,
        }
        #[derive(serde::Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }
        #[derive(serde::Deserialize)]
        struct ProbeOut {
            streams: Vec<ProbeStream>,
            format: Option<ProbeFormat>,
        }

        let out = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .map_err(|e| ShiftError::decode(format!("failed to run {}: {e}", self.ffprobe)))?;
        if !out.status.success() {
            return Err(ShiftError::decode(format!(
                "ffprobe failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
            .map_err(|e| ShiftError::decode(format!("ffprobe json parse failed: {e}")))?;
        let video = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| ShiftError::decode("no video stream found"))?;
        let (Some(width), Some(height)) = (video.width, video.height) else {
            return Err(ShiftError::decode("missing video dimensions from ffprobe"));
        };
        let resolution =
            Resolution::new(width, height).map_err(|e| ShiftError::decode(e.to_string()))?;
        let fps = [&video.r_frame_rate, &video.avg_frame_rate]
            .into_iter()
            .flatten()
            .find_map(|r| Fps::parse_ratio(r).ok())
            .ok_or_else(|| ShiftError::decode("video stream reports no usable frame rate"))?;
        let audio = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("audio"))
            .map(|s| {
                let rate = s
                    .sample_rate
                    .as_deref()
                    .and_then(|r| r.parse::<u32>().ok())
                    .filter(|&r| r > 0)
                    .unwrap_or(48_000);
                (rate, s.channels.filter(|&c| c > 0).unwrap_or(2))
            });
        let duration_secs = parsed
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0);

        Ok(ProbeInfo {
            resolution,
            fps,
            duration_secs,
            audio,
        })
    }

    fn decode_frames(&self, path: &Path, info: &ProbeInfo) -> ShiftResult<Vec<RasterFrame>> {
        let out = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .output()
            .map_err(|e| {
                ShiftError::decode(format!("failed to run ffmpeg for video decode: {e}"))
            })?;
        if !out.status.success() {
            return Err(ShiftError::decode(format!(
                "ffmpeg video decode failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let Resolution { width, height } = info.resolution;
        let frame_len = width as usize * height as usize * 3;
        if out.stdout.is_empty() || !out.stdout.len().is_multiple_of(frame_len) {
            return Err(ShiftError::decode(format!(
                "decoded video has invalid size: got {} bytes, expected multiples of {frame_len}",
                out.stdout.len()
            )));
        }
        out.stdout
            .chunks_exact(frame_len)
            .enumerate()
            .map(|(i, chunk)| {
                let i = i as u64;
                RasterFrame::new(
                    width,
                    height,
                    3,
                    FrameIndex(i),
                    info.fps.frames_to_secs(i),
                    chunk.to_vec(),
                )
                .map_err(|e| ShiftError::decode(e.to_string()))
            })
            .collect()
    }

    fn decode_audio(
        &self,
        path: &Path,
        sample_rate: u32,
        channels: u16,
    ) -> ShiftResult<Option<AudioTrack>> {
        let out = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-i"])
            .arg(path)
            .args([
                "-vn",
                "-f",
                "f32le",
                "-acodec",
                "pcm_f32le",
                "-ac",
                &channels.to_string(),
                "-ar",
                &sample_rate.to_string(),
                "pipe:1",
            ])
            .output()
            .map_err(|e| {
                ShiftError::decode(format!("failed to run ffmpeg for audio decode: {e}"))
            })?;

        if !out.status.success() {
            let msg = String::from_utf8_lossy(&out.stderr);
            // ffmpeg reports a missing audio stream as an error.
            if msg.contains("Stream specifier")
                || msg.contains("matches no streams")
                || msg.contains("Output file #0 does not contain any stream")
            {
                return Ok(None);
            }
            return Err(ShiftError::decode(format!(
                "ffmpeg audio decode failed for '{}': {}",
                path.display(),
                msg.trim()
            )));
        }

        let samples = f32le_to_samples(&out.stdout)?;
        if samples.is_empty() {
            return Ok(None);
        }
        AudioTrack::new(sample_rate, channels, samples)
            .map(Some)
            .map_err(|e| ShiftError::decode(e.to_string()))
    }

    fn encode_video(&self, request: &EncodeRequest<'_>) -> ShiftResult<Vec<u8>> {
        let res = request.resolution()?;
        if !res.width.is_multiple_of(2) || !res.height.is_multiple_of(2) {
            return Err(ShiftError::validation(
                "video width/height must be even (required for yuv420p output)",
            ));
        }

        let scratch = tempfile::Builder::new()
            .prefix("mediashift-encode-")
            .tempdir()
            .map_err(|e| ShiftError::encode(format!("failed to create scratch dir: {e}")))?;
        let ext = request
            .output_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        let out_path = scratch.path().join(format!("out.{ext}"));

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", res.width, res.height),
        ]);
        push_input_fps(&mut cmd, request.fps);
        cmd.args(["-i", "pipe:0"]);

        if let Some(audio) = request.audio.filter(|a| !a.is_empty()) {
            let audio_path = scratch.path().join("audio.f32le");
            write_f32le(&audio_path, &audio.samples)?;
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&audio_path)
            .args(["-c:a", "aac", "-shortest"]);
        } else {
            cmd.arg("-an");
        }

        let p = request.params;
        cmd.args([
            "-c:v",
            &p.codec,
            "-preset",
            &p.preset,
            "-crf",
            &p.crf.to_string(),
            "-g",
            &p.keyint.to_string(),
            "-keyint_min",
            &p.keyint.to_string(),
            "-sc_threshold",
            "0",
            "-bf",
            &p.b_frames.to_string(),
            "-pix_fmt",
            &p.pix_fmt,
        ]);
        if let Some(profile) = &p.profile {
            cmd.args(["-profile:v", profile]);
        }
        cmd.args(["-movflags", "+faststart"]).arg(&out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ShiftError::encode(format!(
                "failed to spawn {} (is it installed and on PATH?): {e}",
                self.ffmpeg
            ))
        })?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ShiftError::encode("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ShiftError::encode("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok::<_, std::io::Error>(bytes)
        });

        let mut write_err = None;
        for frame in request.frames {
            let rgb;
            let data = if frame.channels == 3 {
                &frame.data
            } else {
                rgb = frame.to_rgb_image()?.into_raw();
                &rgb
            };
            if let Err(e) = stdin.write_all(data) {
                write_err = Some(e);
                break;
            }
        }
        drop(stdin);

        let status = child
            .wait()
            .map_err(|e| ShiftError::encode(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr_bytes = stderr_drain
            .join()
            .map_err(|_| ShiftError::encode("ffmpeg stderr drain thread panicked"))?
            .map_err(|e| ShiftError::encode(format!("ffmpeg stderr read failed: {e}")))?;
        if !status.success() {
            return Err(ShiftError::encode(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        if let Some(e) = write_err {
            return Err(ShiftError::encode(format!(
                "failed to write frames to ffmpeg stdin: {e}"
            )));
        }

        std::fs::read(&out_path)
            .map_err(|e| ShiftError::encode(format!("failed to read encoded output: {e}")))
    }
}

impl MediaCodec for FfmpegCodec {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn decode(&self, path: &Path) -> ShiftResult<MediaAsset> {
        if !path.is_file() {
            return Err(ShiftError::decode(format!(
                "source '{}' does not exist",
                path.display()
            )));
        }
        match MediaKind::from_path(path) {
            MediaKind::Image => decode_still(path),
            MediaKind::Video => {
                let info = self.probe(path)?;
                let frames = self.decode_frames(path, &info)?;
                let audio = match info.audio {
                    Some((rate, channels)) => self.decode_audio(path, rate, channels)?,
                    None => None,
                };
                MediaAsset::video(frames, info.fps, audio)
                    .map_err(|e| ShiftError::decode(e.to_string()))
            }
        }
    }

    fn encode(&self, request: &EncodeRequest<'_>) -> ShiftResult<Vec<u8>> {
        match request.kind {
            MediaKind::Image => {
                let frame = request
                    .frames
                    .first()
                    .ok_or_else(|| ShiftError::encode("nothing to encode: no frames"))?;
                StillFormat::from_path(request.output_path)?.encode(frame)
            }
            MediaKind::Video => self.encode_video(request),
        }
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // Rawvideo input needs `-r` before `-i`.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn f32le_to_samples(bytes: &[u8]) -> ShiftResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(ShiftError::decode(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

pub(crate) fn write_f32le(path: &Path, samples: &[f32]) -> ShiftResult<()> {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    std::fs::write(path, bytes).map_err(|e| {
        ShiftError::encode(format!("failed to write audio '{}': {e}", path.display()))
    })
}

pub(crate) fn read_f32le(path: &Path) -> ShiftResult<Vec<f32>> {
    let bytes = std::fs::read(path)
        .map_err(|e| ShiftError::decode(format!("failed to read '{}': {e}", path.display())))?;
    f32le_to_samples(&bytes)
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ShiftResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    is_binary_available("ffmpeg")
}

pub(crate) fn is_binary_available(bin: &str) -> bool {
    Command::new(bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Parent directory of `path`, or the current directory for bare file names.
pub(crate) fn parent_or_cwd(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
