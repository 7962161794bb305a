use std::path::{Path, PathBuf};

use crate::analysis::analyzer::AnalysisReport;
use crate::foundation::error::{ErrorKind, ShiftError, ShiftResult};

/// Pipeline state of one asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Source decoded, parameters drawn.
    Loaded,
    /// Frames and audio in flight.
    Transforming,
    /// Handing transformed media to the codec.
    Encoding,
    /// Output written, fingerprints being compared.
    Analyzing,
    /// Terminal success.
    Done,
    /// Terminal failure.
    Failed,
}

impl Stage {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Loaded => 0,
            Self::Transforming => 1,
            Self::Encoding => 2,
            Self::Analyzing => 3,
            Self::Done => 4,
            Self::Failed => 5,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Loaded,
            1 => Self::Transforming,
            2 => Self::Encoding,
            3 => Self::Analyzing,
            4 => Self::Done,
            _ => Self::Failed,
        }
    }

    /// Return `true` for `Done` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Final status of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Output written and analyzed.
    Completed,
    /// Stopped by an error; no output at the declared path.
    Failed,
    /// Stopped between batches; the last checkpoint can be resumed.
    Cancelled,
}

/// JSON-serializable outcome of one asset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunReport {
    /// Asset identifier.
    pub asset_id: String,
    /// Source path.
    pub source: PathBuf,
    /// Declared output path.
    pub output: PathBuf,
    /// Uniqueness level used.
    pub level: u8,
    /// Seed used, once known.
    pub seed: Option<u64>,
    /// Final status.
    pub status: RunStatus,
    /// Last stage reached.
    pub stage: Stage,
    /// Error taxonomy tag when `status` is `Failed`.
    pub error_kind: Option<ErrorKind>,
    /// Human-readable failure or cancellation reason.
    pub reason: Option<String>,
    /// Whether the run continued from a checkpoint.
    pub resumed: bool,
    /// Whether the encoder fell back to conservative settings.
    pub encode_retried: bool,
    /// Frames in the output.
    pub frames: u64,
    /// Fingerprint comparison, present once analysis ran.
    pub analysis: Option<AnalysisReport>,
    /// Whether the mean hash delta reached the configured target. `None` when no target is set
    /// or no analysis ran.
    pub target_met: Option<bool>,
    /// Wall-clock time of the run.
    pub elapsed_secs: f64,
}

impl RunReport {
    pub(crate) fn failed(
        asset_id: impl Into<String>,
        source: &Path,
        output: &Path,
        level: u8,
        err: &ShiftError,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            level,
            seed: None,
            status: RunStatus::Failed,
            stage: Stage::Failed,
            error_kind: Some(err.kind()),
            reason: Some(err.to_string()),
            resumed: false,
            encode_retried: false,
            frames: 0,
            analysis: None,
            target_met: None,
            elapsed_secs: 0.0,
        }
    }

    /// Return `true` when the output was written.
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Pretty JSON rendering.
    pub fn to_json_pretty(&self) -> ShiftResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ShiftError::validation(format!("failed to serialize report: {e}")))
    }
}

/// Write one or more reports as a JSON array.
pub fn write_reports(path: &Path, reports: &[RunReport]) -> ShiftResult<()> {
    use anyhow::Context as _;
    crate::encode::ffmpeg::ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(reports)
        .map_err(|e| ShiftError::validation(format!("failed to serialize reports: {e}")))?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report '{}'", path.display()))?;
    Ok(())
}
