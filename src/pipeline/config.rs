use std::path::{Path, PathBuf};

use crate::analysis::analyzer::AnalysisConfig;
use crate::foundation::core::Resolution;
use crate::foundation::error::{ShiftError, ShiftResult};

/// Runtime settings for [`crate::Orchestrator`].
///
/// Every field has a default, so a JSON file only needs the keys it overrides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding checkpoint records and spools.
    pub checkpoint_dir: PathBuf,
    /// Frames transformed between two checkpoints.
    pub frames_per_checkpoint: usize,
    /// Worker threads for frame batches. `None` uses rayon's default.
    pub threads: Option<usize>,
    /// Assets processed at once by [`crate::Orchestrator::process_batch`].
    pub max_parallel_assets: usize,
    /// Output dimensions. `None` keeps the source dimensions.
    pub target_resolution: Option<Resolution>,
    /// Seconds of video rendered by [`crate::Orchestrator::preview`].
    pub preview_secs: f64,
    /// Minimum mean hash delta, in percent, a run should reach. `None` skips the check.
    ///
    /// Missing the target never fails a run; it only sets [`crate::RunReport::target_met`].
    pub target_delta_percent: Option<f64>,
    /// Analyzer settings.
    pub analysis: AnalysisConfig,
    /// `ffmpeg` binary name or path.
    pub ffmpeg_bin: String,
    /// `ffprobe` binary name or path.
    pub ffprobe_bin: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from(".mediashift/checkpoints"),
            frames_per_checkpoint: 64,
            threads: None,
            max_parallel_assets: 2,
            target_resolution: None,
            preview_secs: 3.0,
            target_delta_percent: None,
            analysis: AnalysisConfig::default(),
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a JSON config file.
    pub fn from_json_path(path: &Path) -> ShiftResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text).map_err(|e| {
            ShiftError::validation(format!("invalid config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> ShiftResult<()> {
        if self.frames_per_checkpoint == 0 {
            return Err(ShiftError::validation("frames_per_checkpoint must be >= 1"));
        }
        if self.threads == Some(0) {
            return Err(ShiftError::validation("threads must be >= 1 when set"));
        }
        if self.max_parallel_assets == 0 {
            return Err(ShiftError::validation("max_parallel_assets must be >= 1"));
        }
        if let Some(r) = self.target_resolution {
            Resolution::new(r.width, r.height)?;
        }
        if !(self.preview_secs.is_finite() && self.preview_secs > 0.0) {
            return Err(ShiftError::validation("preview_secs must be finite and > 0"));
        }
        if let Some(t) = self.target_delta_percent
            && !(0.0..=100.0).contains(&t)
        {
            return Err(ShiftError::validation(
                "target_delta_percent must lie in 0..=100",
            ));
        }
        let a = &self.analysis;
        if a.min_samples == 0 || a.max_samples < a.min_samples {
            return Err(ShiftError::validation(
                "analysis sample bounds must satisfy 1 <= min_samples <= max_samples",
            ));
        }
        if !(a.reference_secs.is_finite() && a.reference_secs >= 0.0) {
            return Err(ShiftError::validation("analysis.reference_secs must be >= 0"));
        }
        let s = &a.spectral;
        if s.window < 16 || s.hop == 0 || s.bands == 0 {
            return Err(ShiftError::validation(
                "analysis.spectral needs window >= 16, hop >= 1 and bands >= 1",
            ));
        }
        if !(s.min_hz > 0.0 && s.max_hz > s.min_hz) {
            return Err(ShiftError::validation(
                "analysis.spectral needs 0 < min_hz < max_hz",
            ));
        }
        if !(s.max_seconds.is_finite() && s.max_seconds > 0.0) {
            return Err(ShiftError::validation(
                "analysis.spectral.max_seconds must be finite and > 0",
            ));
        }
        if self.ffmpeg_bin.trim().is_empty() || self.ffprobe_bin.trim().is_empty() {
            return Err(ShiftError::validation("ffmpeg/ffprobe binary names must be non-empty"));
        }
        Ok(())
    }
}

/// Build the frame worker pool.
pub fn build_thread_pool(threads: Option<usize>) -> ShiftResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ShiftError::validation("'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("mediashift-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ShiftError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/config.rs"]
mod tests;
