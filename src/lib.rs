//! mediashift perturbs images, video and audio so that their perceptual fingerprints diverge from
//! the source while the content stays visually and aurally equivalent, then measures how far the
//! fingerprints moved.
//!
//! Every random choice for an asset is drawn up front from one seed into [`EffectParameters`],
//! so a run is reproducible bit for bit:
//!
//! - Decode through a [`MediaCodec`] ([`FfmpegCodec`] in production, [`RawCodec`] in tests)
//! - Transform frames ([`ImageTransformer`], [`VideoTransformer`]) and audio
//!   ([`AudioTransformer`]) concurrently
//! - Encode, then compare source and output with [`PerceptualAnalyzer`]
//!
//! [`Orchestrator`] ties the stages together with checkpointed, cancellable progress.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod analysis;
mod audio;
mod encode;
mod foundation;
mod image;
mod pipeline;
mod profile;
mod random;
mod video;

pub use crate::foundation::core::{
    Affine, AssetId, AudioTrack, Fps, FrameIndex, MediaAsset, MediaKind, Point, RasterFrame,
    Resolution, Vec2,
};
pub use crate::foundation::error::{ErrorKind, ShiftError, ShiftResult};
pub use crate::foundation::math::Rng64;

pub use crate::random::source::{
    EffectGroup, RandomnessSource, assign_seed, derived_seed, recorded_seed, release_seed,
};

pub use crate::profile::level::{LevelProfile, ParamRange, UniquenessLevel};
pub use crate::profile::params::{
    AudioParams, B_FRAMES, BASE_KEYINT, ColorShift, CropBox, EffectParameters, EncodeParams,
    GeometryParams, Harmonic, NoiseParams, ReverbTap, TemporalParams, TextureParams,
};

pub use crate::image::buffer::FloatFrame;
pub use crate::image::color::{apply_color_shift, oklab_to_srgb, shift_pixel, srgb_to_oklab};
pub use crate::image::geometry::{
    GeometryMapping, Homography, crop_scale_affine, perspective_homography, still_mapping, warp,
};
pub use crate::image::noise::{apply_noise, apply_texture, fbm, perlin};
pub use crate::image::transformer::{ImageTransformer, apply_photometric};

pub use crate::video::temporal::{
    CentroidTrack, FrameState, TemporalEffectDriver, jitter_at, pan_at, zoom_at,
};
pub use crate::video::transformer::{VideoTransformer, apply_vignette};

pub use crate::audio::filters::{Biquad, BiquadCoeffs, add_ultrasonic_noise, filter_channels};
pub use crate::audio::pitch::{pitch_shift, resample, wsola_stretch};
pub use crate::audio::reverb::apply_reverb;
pub use crate::audio::transformer::AudioTransformer;

pub use crate::analysis::analyzer::{
    AnalysisConfig, AnalysisReport, FrameDelta, PerceptualAnalyzer, SourceAnalysis,
};
pub use crate::analysis::phash::{HASH_BITS, PerceptualHash, phash};
pub use crate::analysis::risk::{LOW_RISK_MIN_SCORE, MEDIUM_RISK_MIN_SCORE, RiskLevel};
pub use crate::analysis::spectral::{
    SpectralConfig, audio_similarity, cosine_similarity_percent, spectrogram,
};

pub use crate::encode::codec::{EncodeRequest, MediaCodec, StillFormat, decode_still};
pub use crate::encode::ffmpeg::{FfmpegCodec, ProbeInfo, ensure_parent_dir, is_ffmpeg_on_path};
pub use crate::encode::raw::{RawCodec, RawHeader};

pub use crate::pipeline::checkpoint::{Checkpoint, CheckpointStore};
pub use crate::pipeline::config::{PipelineConfig, build_thread_pool};
pub use crate::pipeline::orchestrator::{AssetJob, Orchestrator, RunObserver};
pub use crate::pipeline::progress::{CancelToken, Progress, ProgressSnapshot};
pub use crate::pipeline::report::{RunReport, RunStatus, Stage, write_reports};
