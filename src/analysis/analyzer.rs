use rayon::prelude::*;

use crate::analysis::phash::{PerceptualHash, phash};
use crate::analysis::risk::RiskLevel;
use crate::analysis::spectral::{SpectralConfig, audio_similarity};
use crate::foundation::core::{MediaAsset, MediaKind};
use crate::foundation::error::{ShiftError, ShiftResult};

/// Analyzer settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Fewest sampled frames for video.
    pub min_samples: usize,
    /// Most sampled frames for video.
    pub max_samples: usize,
    /// Time of the representative frame used for the headline hashes, capped at half the duration.
    pub reference_secs: f64,
    /// Audio comparison settings.
    pub spectral: SpectralConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_samples: 5,
            max_samples: 10,
            reference_secs: 3.0,
            spectral: SpectralConfig::default(),
        }
    }
}

/// Delta of one sampled frame pair.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameDelta {
    /// Source frame index.
    pub index: u64,
    /// Hash delta in percent.
    pub delta_percent: f64,
}

/// Outcome of comparing a source with its transformed output.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisReport {
    /// Hex hash of the representative source frame.
    pub source_hash: Option<String>,
    /// Hex hash of the representative output frame.
    pub output_hash: Option<String>,
    /// Mean hash delta in percent.
    pub hash_delta_percent: Option<f64>,
    /// Per-sample deltas (one entry for stills).
    pub frame_deltas: Vec<FrameDelta>,
    /// Spectral similarity in percent, when both sides carry audio.
    pub audio_similarity: Option<f64>,
    /// Risk tier derived from `hash_delta_percent`.
    pub risk_level: RiskLevel,
    /// Encoded output size.
    pub size_bytes: u64,
    /// Output duration.
    pub duration_seconds: f64,
    /// Reason the report is incomplete.
    pub degraded: Option<String>,
}

impl AnalysisReport {
    /// Report for an export whose analysis failed.
    pub fn degraded(reason: impl Into<String>, size_bytes: u64, duration_seconds: f64) -> Self {
        Self {
            source_hash: None,
            output_hash: None,
            hash_delta_percent: None,
            frame_deltas: Vec::new(),
            audio_similarity: None,
            risk_level: RiskLevel::Unknown,
            size_bytes,
            duration_seconds,
            degraded: Some(reason.into()),
        }
    }
}

/// Headline fingerprint of an untransformed source.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SourceAnalysis {
    /// Hex hash of the representative frame.
    pub hash: String,
    /// Index of the representative frame.
    pub frame_index: u64,
    /// Source duration.
    pub duration_seconds: f64,
}

/// Perceptual-hash and spectral comparison engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerceptualAnalyzer {
    cfg: AnalysisConfig,
}

impl PerceptualAnalyzer {
    /// Analyzer with explicit settings.
    pub fn new(cfg: AnalysisConfig) -> Self {
        Self { cfg }
    }

    /// Evenly spaced sample indices, always including the first and last frame.
    ///
    /// The count is the whole-second duration clamped to the configured bounds, never more than
    /// the frame count.
    pub fn sample_indices(&self, frame_count: usize, duration_secs: f64) -> Vec<usize> {
        if frame_count == 0 {
            return Vec::new();
        }
        let lo = self.cfg.min_samples.max(2);
        let hi = self.cfg.max_samples.max(lo);
        let count = (duration_secs.max(0.0).floor() as usize)
            .clamp(lo, hi)
            .min(frame_count);
        if count <= 1 {
            return vec![0];
        }
        let last = frame_count - 1;
        let mut out: Vec<usize> = (0..count)
            .map(|i| ((i * last) as f64 / (count - 1) as f64).round() as usize)
            .collect();
        out.dedup();
        out
    }

    /// Index of the representative frame: `min(reference_secs, duration / 2)`.
    pub fn reference_index(&self, asset: &MediaAsset) -> usize {
        if asset.kind == MediaKind::Image || asset.frames.is_empty() {
            return 0;
        }
        let secs = self.cfg.reference_secs.min(asset.duration_secs / 2.0);
        (asset.fps.secs_to_frames_floor(secs) as usize).min(asset.frames.len() - 1)
    }

    /// Hash the representative frame of a source without transforming it.
    pub fn analyze_source(&self, asset: &MediaAsset) -> ShiftResult<SourceAnalysis> {
        let idx = self.reference_index(asset);
        let frame = asset
            .frames
            .get(idx)
            .ok_or_else(|| ShiftError::analysis("asset has no frames"))?;
        Ok(SourceAnalysis {
            hash: phash(frame)?.to_hex(),
            frame_index: idx as u64,
            duration_seconds: asset.duration_secs,
        })
    }

    /// Compare `output` against `source` and classify the divergence.
    #[tracing::instrument(skip_all, fields(kind = ?source.kind, frames = source.frames.len()))]
    pub fn compare(
        &self,
        source: &MediaAsset,
        output: &MediaAsset,
        size_bytes: u64,
    ) -> ShiftResult<AnalysisReport> {
        if source.frames.is_empty() || output.frames.is_empty() {
            return Err(ShiftError::analysis("cannot compare empty assets"));
        }
        let n = source.frames.len();
        let m = output.frames.len();
        let samples = match source.kind {
            MediaKind::Image => vec![0],
            MediaKind::Video => self.sample_indices(n, source.duration_secs),
        };
        let map_out = |i: usize| {
            if n <= 1 {
                0
            } else {
                ((i * (m - 1)) as f64 / (n - 1) as f64).round() as usize
            }
        };

        let deltas = samples
            .par_iter()
            .map(|&i| -> ShiftResult<FrameDelta> {
                let a = phash(&source.frames[i])?;
                let b = phash(&output.frames[map_out(i)])?;
                Ok(FrameDelta {
                    index: i as u64,
                    delta_percent: a.delta_percent(b),
                })
            })
            .collect::<Vec<_>>();
        let mut frame_deltas = Vec::with_capacity(deltas.len());
        for d in deltas {
            frame_deltas.push(d?);
        }
        let mean = frame_deltas.iter().map(|d| d.delta_percent).sum::<f64>()
            / frame_deltas.len() as f64;

        let ref_idx = self.reference_index(source);
        let source_hash: PerceptualHash = phash(&source.frames[ref_idx])?;
        let output_hash = phash(&output.frames[map_out(ref_idx)])?;

        let audio_similarity = match (&source.audio, &output.audio) {
            // A failed spectral pass only drops the audio score.
            (Some(a), Some(b)) => match audio_similarity(a, b, &self.cfg.spectral) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(error = %e, "audio comparison failed, similarity omitted");
                    None
                }
            },
            _ => None,
        };

        tracing::info!(
            hash_delta_percent = mean,
            samples = frame_deltas.len(),
            audio_similarity = ?audio_similarity,
            "analysis complete"
        );
        Ok(AnalysisReport {
            source_hash: Some(source_hash.to_hex()),
            output_hash: Some(output_hash.to_hex()),
            hash_delta_percent: Some(mean),
            frame_deltas,
            audio_similarity,
            risk_level: RiskLevel::classify(mean),
            size_bytes,
            duration_seconds: output.duration_secs,
            degraded: None,
        })
    }

    /// Like [`Self::compare`], but folds any failure into a degraded `Unknown` report.
    pub fn compare_or_degrade(
        &self,
        source: &MediaAsset,
        output: &MediaAsset,
        size_bytes: u64,
    ) -> AnalysisReport {
        self.compare(source, output, size_bytes).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "analysis failed, reporting degraded result");
            AnalysisReport::degraded(e.to_string(), size_bytes, output.duration_secs)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/analysis/analyzer.rs"]
mod tests;
