use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::encode::ffmpeg::{read_f32le, write_f32le};
use crate::foundation::core::{AssetId, FrameIndex, RasterFrame, Resolution, frame_byte_len};
use crate::foundation::error::{ShiftError, ShiftResult};
use crate::pipeline::report::Stage;
use crate::profile::level::UniquenessLevel;
use crate::profile::params::EffectParameters;

/// Persisted resume point of one asset.
///
/// Transitions are explicit: a run can be resumed from any value that passes
/// [`Checkpoint::validate_for`], including one built by hand.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Checkpoint {
    /// Asset the checkpoint belongs to.
    pub asset_id: AssetId,
    /// Level of the interrupted run.
    pub level: UniquenessLevel,
    /// Seed of the interrupted run.
    pub seed: u64,
    /// Stage reached.
    pub stage: Stage,
    /// Frames of the source the run covers.
    pub total_frames: u64,
    /// Leading frames already transformed and spooled.
    pub frames_completed: u64,
    /// Whether transformed audio is spooled.
    pub audio_completed: bool,
    /// Parameters drawn by the interrupted run. Resumes reuse them verbatim.
    pub params: EffectParameters,
    /// Spool of transformed frames.
    pub partial_output_path: PathBuf,
    /// Spool of transformed interleaved `f32le` audio.
    pub partial_audio_path: PathBuf,
}

impl Checkpoint {
    /// Check that this checkpoint can continue a run of `asset_id` at `level`/`seed` over a
    /// source of `total_frames` frames at `source` resolution, rendering at `target`.
    pub fn validate_for(
        &self,
        asset_id: &AssetId,
        level: UniquenessLevel,
        seed: u64,
        total_frames: u64,
        source: Resolution,
        target: Resolution,
    ) -> ShiftResult<()> {
        if &self.asset_id != asset_id {
            return Err(ShiftError::checkpoint_corrupt(format!(
                "checkpoint belongs to '{}', not '{asset_id}'",
                self.asset_id
            )));
        }
        if self.stage.is_terminal() {
            return Err(ShiftError::checkpoint_corrupt(format!(
                "checkpoint is in terminal stage {:?}",
                self.stage
            )));
        }
        if self.level != level || self.seed != seed {
            return Err(ShiftError::checkpoint_corrupt(format!(
                "checkpoint was written for level {} seed {}, run uses level {} seed {seed}",
                self.level.get(),
                self.seed,
                level.get()
            )));
        }
        self.params.ensure_matches(level, seed)?;
        if self.params.source != source {
            return Err(ShiftError::checkpoint_corrupt(format!(
                "checkpoint parameters were drawn for {}x{}, source is {}x{}",
                self.params.source.width, self.params.source.height, source.width, source.height
            )));
        }
        if self.params.target != target {
            return Err(ShiftError::checkpoint_corrupt(format!(
                "checkpoint renders at {}x{}, run wants {}x{}",
                self.params.target.width, self.params.target.height, target.width, target.height
            )));
        }
        if self.total_frames != total_frames || self.frames_completed > total_frames {
            return Err(ShiftError::checkpoint_corrupt(format!(
                "checkpoint covers {}/{} frames, source has {total_frames}",
                self.frames_completed, self.total_frames
            )));
        }
        Ok(())
    }
}

/// Directory of checkpoint records: `<id>.json`, `<id>.frames`, `<id>.f32le`.
#[derive(Clone, Debug)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the JSON record for `id`.
    pub fn record_path(&self, id: &AssetId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Path of the frame spool for `id`.
    pub fn frames_path(&self, id: &AssetId) -> PathBuf {
        self.dir.join(format!("{id}.frames"))
    }

    /// Path of the audio spool for `id`.
    pub fn audio_path(&self, id: &AssetId) -> PathBuf {
        self.dir.join(format!("{id}.f32le"))
    }

    /// Fresh checkpoint for a run that has just drawn its parameters.
    pub fn start(
        &self,
        params: EffectParameters,
        asset_id: AssetId,
        total_frames: u64,
    ) -> Checkpoint {
        Checkpoint {
            partial_output_path: self.frames_path(&asset_id),
            partial_audio_path: self.audio_path(&asset_id),
            asset_id,
            level: params.level,
            seed: params.seed,
            stage: Stage::Loaded,
            total_frames,
            frames_completed: 0,
            audio_completed: false,
            params,
        }
    }

    /// Load the record for `id`. `Ok(None)` when there is none; unreadable records are
    /// [`ShiftError::CheckpointCorrupt`].
    pub fn load(&self, id: &AssetId) -> ShiftResult<Option<Checkpoint>> {
        let path = self.record_path(id);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ShiftError::checkpoint_corrupt(format!(
                    "failed to read '{}': {e}",
                    path.display()
                )));
            }
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            ShiftError::checkpoint_corrupt(format!("failed to parse '{}': {e}", path.display()))
        })
    }

    /// Persist `cp` atomically.
    pub fn save(&self, cp: &Checkpoint) -> ShiftResult<()> {
        use anyhow::Context as _;
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create checkpoint dir '{}'", self.dir.display())
        })?;
        let json = serde_json::to_vec_pretty(cp)
            .map_err(|e| ShiftError::validation(format!("failed to serialize checkpoint: {e}")))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .context("failed to create checkpoint temp file")?;
        tmp.write_all(&json)
            .context("failed to write checkpoint temp file")?;
        let path = self.record_path(&cp.asset_id);
        tmp.persist(&path)
            .with_context(|| format!("failed to persist checkpoint '{}'", path.display()))?;
        Ok(())
    }

    /// Append transformed frames to the spool. Call before [`Self::save`] advances
    /// `frames_completed`.
    pub fn append_frames(&self, cp: &Checkpoint, frames: &[RasterFrame]) -> ShiftResult<()> {
        use anyhow::Context as _;
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create checkpoint dir '{}'", self.dir.display())
        })?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cp.partial_output_path)
            .with_context(|| format!("failed to open '{}'", cp.partial_output_path.display()))?;
        for f in frames {
            file.write_all(&f.data).with_context(|| {
                format!("failed to append to '{}'", cp.partial_output_path.display())
            })?;
        }
        file.flush().context("failed to flush frame spool")?;
        Ok(())
    }

    /// Read back the `frames_completed` spooled frames.
    ///
    /// A spool longer than the record (a batch appended before its record was saved) is
    /// truncated to the record; a shorter one is corrupt.
    pub fn load_frames(
        &self,
        cp: &Checkpoint,
        channels: u8,
        timestamps: impl Fn(u64) -> f64,
    ) -> ShiftResult<Vec<RasterFrame>> {
        if cp.frames_completed == 0 {
            self.clear_frames(cp)?;
            return Ok(Vec::new());
        }
        let target = cp.params.target;
        let frame_len = frame_byte_len(target.width, target.height, channels)?;
        let want = (cp.frames_completed as usize)
            .checked_mul(frame_len)
            .ok_or_else(|| ShiftError::checkpoint_corrupt("frame spool size overflow"))?;
        let mut bytes = std::fs::read(&cp.partial_output_path).map_err(|e| {
            ShiftError::checkpoint_corrupt(format!(
                "failed to read '{}': {e}",
                cp.partial_output_path.display()
            ))
        })?;
        if bytes.len() < want {
            return Err(ShiftError::checkpoint_corrupt(format!(
                "frame spool holds {} bytes, record needs {want}",
                bytes.len()
            )));
        }
        if bytes.len() > want {
            tracing::debug!(
                extra = bytes.len() - want,
                "truncating frame spool to the checkpoint record"
            );
            bytes.truncate(want);
            std::fs::write(&cp.partial_output_path, &bytes).map_err(|e| {
                ShiftError::checkpoint_corrupt(format!("failed to truncate frame spool: {e}"))
            })?;
        }
        bytes
            .chunks_exact(frame_len)
            .enumerate()
            .map(|(i, chunk)| {
                let i = i as u64;
                RasterFrame::new(
                    target.width,
                    target.height,
                    channels,
                    FrameIndex(i),
                    timestamps(i),
                    chunk.to_vec(),
                )
                .map_err(|e| ShiftError::checkpoint_corrupt(e.to_string()))
            })
            .collect()
    }

    /// Spool transformed audio samples.
    pub fn write_audio(&self, cp: &Checkpoint, samples: &[f32]) -> ShiftResult<()> {
        use anyhow::Context as _;
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create checkpoint dir '{}'", self.dir.display())
        })?;
        write_f32le(&cp.partial_audio_path, samples)
    }

    /// Read spooled audio samples.
    pub fn read_audio(&self, cp: &Checkpoint) -> ShiftResult<Vec<f32>> {
        read_f32le(&cp.partial_audio_path)
            .map_err(|e| ShiftError::checkpoint_corrupt(e.to_string()))
    }

    fn clear_frames(&self, cp: &Checkpoint) -> ShiftResult<()> {
        remove_if_exists(&cp.partial_output_path)
    }

    /// Delete the record and both spools of `id`.
    pub fn remove(&self, id: &AssetId) -> ShiftResult<()> {
        remove_if_exists(&self.record_path(id))?;
        remove_if_exists(&self.frames_path(id))?;
        remove_if_exists(&self.audio_path(id))
    }
}

fn remove_if_exists(path: &Path) -> ShiftResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("failed to remove '{}'", path.display()))
            .into()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/checkpoint.rs"]
mod tests;
