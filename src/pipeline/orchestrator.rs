use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::analysis::analyzer::{AnalysisReport, PerceptualAnalyzer, SourceAnalysis};
use crate::audio::transformer::AudioTransformer;
use crate::encode::codec::{EncodeRequest, MediaCodec};
use crate::encode::ffmpeg::{FfmpegCodec, ensure_parent_dir, parent_or_cwd};
use crate::foundation::core::{AssetId, AudioTrack, MediaAsset, MediaKind, RasterFrame};
use crate::foundation::error::{ShiftError, ShiftResult};
use crate::image::transformer::ImageTransformer;
use crate::pipeline::checkpoint::{Checkpoint, CheckpointStore};
use crate::pipeline::config::{PipelineConfig, build_thread_pool};
use crate::pipeline::progress::{CancelToken, Progress, ProgressSnapshot};
use crate::pipeline::report::{RunReport, RunStatus, Stage};
use crate::profile::level::UniquenessLevel;
use crate::profile::params::{EffectParameters, EncodeParams};
use crate::random::source::{assign_seed, recorded_seed, release_seed};
use crate::video::temporal::CentroidTrack;
use crate::video::transformer::VideoTransformer;

/// One source to transform.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetJob {
    /// Source media.
    pub source: PathBuf,
    /// Declared output path.
    pub output: PathBuf,
    /// Uniqueness level.
    pub level: UniquenessLevel,
    /// Explicit seed. `None` reuses a checkpointed or recorded seed, else derives one.
    pub seed: Option<u64>,
    /// Explicit id. `None` derives one from the source path.
    pub asset_id: Option<AssetId>,
}

impl AssetJob {
    /// Job with derived id and seed.
    pub fn new(
        source: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        level: UniquenessLevel,
    ) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            level,
            seed: None,
            asset_id: None,
        }
    }

    /// Pin the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Pin the asset id.
    pub fn with_asset_id(mut self, id: AssetId) -> Self {
        self.asset_id = Some(id);
        self
    }

    /// Id used for seeds and checkpoints.
    pub fn resolved_id(&self) -> AssetId {
        self.asset_id.clone().unwrap_or_else(|| {
            AssetId::from_bytes(self.source.to_string_lossy().as_bytes())
        })
    }
}

/// Hooks called from the run loop. All methods default to no-ops.
pub trait RunObserver: Send + Sync {
    /// Called on every stage transition.
    fn on_stage(&self, _asset: &AssetId, _stage: Stage) {}

    /// Called after each frame batch is committed.
    fn on_batch(&self, _asset: &AssetId, _progress: &ProgressSnapshot) {}
}

/// Drives decode, transform, encode and analysis for one or many assets.
pub struct Orchestrator {
    cfg: PipelineConfig,
    codec: Arc<dyn MediaCodec>,
    analyzer: PerceptualAnalyzer,
    pool: rayon::ThreadPool,
    store: CheckpointStore,
    cancel: CancelToken,
    observer: Option<Arc<dyn RunObserver>>,
}

#[derive(Default)]
struct Restored {
    frames: Vec<RasterFrame>,
    audio: Option<AudioTrack>,
}

struct Rendered {
    frames: Vec<RasterFrame>,
    audio: Option<AudioTrack>,
}

enum RenderOutcome {
    Finished(Rendered),
    Cancelled,
}

enum FrameStage<'a> {
    Still(ImageTransformer<'a>),
    Video(VideoTransformer<'a>),
}

impl FrameStage<'_> {
    fn run(
        &self,
        frames: &[RasterFrame],
        pool: &rayon::ThreadPool,
    ) -> ShiftResult<Vec<RasterFrame>> {
        match self {
            Self::Still(t) => pool.install(|| frames.iter().map(|f| t.transform(f)).collect()),
            Self::Video(t) => t.transform_batch(frames, pool),
        }
    }
}

/// Checkpoint record shared by the frame loop and the audio worker.
struct Session<'a> {
    store: &'a CheckpointStore,
    cp: Mutex<Checkpoint>,
}

impl Session<'_> {
    fn commit(&self, update: impl FnOnce(&mut Checkpoint)) -> ShiftResult<()> {
        let mut cp = self.cp.lock().unwrap_or_else(PoisonError::into_inner);
        update(&mut cp);
        self.store.save(&cp)
    }

    fn commit_frames(&self, frames: &[RasterFrame]) -> ShiftResult<()> {
        let mut cp = self.cp.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.append_frames(&cp, frames)?;
        cp.frames_completed += frames.len() as u64;
        self.store.save(&cp)
    }

    fn commit_audio(&self, track: &AudioTrack) -> ShiftResult<()> {
        let mut cp = self.cp.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.write_audio(&cp, &track.samples)?;
        cp.audio_completed = true;
        self.store.save(&cp)
    }

    fn frames_completed(&self) -> u64 {
        self.cp
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .frames_completed
    }
}

impl Orchestrator {
    /// Orchestrator over an arbitrary codec.
    pub fn new(cfg: PipelineConfig, codec: Arc<dyn MediaCodec>) -> ShiftResult<Self> {
        cfg.validate()?;
        let pool = build_thread_pool(cfg.threads)?;
        Ok(Self {
            analyzer: PerceptualAnalyzer::new(cfg.analysis),
            store: CheckpointStore::new(cfg.checkpoint_dir.clone()),
            cfg,
            codec,
            pool,
            cancel: CancelToken::new(),
            observer: None,
        })
    }

    /// Orchestrator over the configured `ffmpeg`/`ffprobe` binaries.
    pub fn with_ffmpeg(cfg: PipelineConfig) -> ShiftResult<Self> {
        let codec = FfmpegCodec::new(cfg.ffmpeg_bin.clone(), cfg.ffprobe_bin.clone());
        Self::new(cfg, Arc::new(codec))
    }

    /// Attach an observer.
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Token that cancels every run of this orchestrator. It stays set until reset.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Checkpoint directory accessor.
    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.store
    }

    fn notify_stage(&self, id: &AssetId, progress: &Progress, stage: Stage) {
        progress.set_stage(stage);
        tracing::info!(asset = %id, ?stage, "stage");
        if let Some(obs) = &self.observer {
            obs.on_stage(id, stage);
        }
    }

    /// Transform one asset, resuming from its checkpoint when one is usable.
    ///
    /// Returns `Ok` for completed and cancelled runs. Errors leave no file at the declared output
    /// path and keep the last checkpoint.
    #[tracing::instrument(
        skip_all,
        fields(source = %job.source.display(), level = job.level.get())
    )]
    pub fn process(&self, job: &AssetJob) -> ShiftResult<RunReport> {
        let started = Instant::now();
        let id = job.resolved_id();
        let asset = self.codec.decode(&job.source)?;
        let progress = Progress::new(asset.frame_count());
        self.notify_stage(&id, &progress, Stage::Loaded);

        let (cp, restored, resumed) = match self.resume_point(&id, job, &asset) {
            Some((cp, restored)) => {
                assign_seed(&id, Some(cp.seed));
                tracing::info!(
                    asset = %id,
                    frames_completed = cp.frames_completed,
                    audio_completed = cp.audio_completed,
                    "resuming from checkpoint"
                );
                (cp, restored, true)
            }
            None => {
                let seed = assign_seed(&id, job.seed);
                let target = self.cfg.target_resolution.unwrap_or(asset.resolution);
                let params = EffectParameters::draw(job.level, seed, asset.resolution, target)?;
                self.store.remove(&id)?;
                let cp = self.store.start(params, id.clone(), asset.frame_count());
                self.store.save(&cp)?;
                (cp, Restored::default(), false)
            }
        };
        let params = cp.params.clone();
        progress.resume_from(restored.frames.len() as u64);
        if restored.audio.is_some() {
            progress.mark_audio_done();
        }

        let session = Session {
            store: &self.store,
            cp: Mutex::new(cp),
        };
        session.commit(|cp| cp.stage = Stage::Transforming)?;
        self.notify_stage(&id, &progress, Stage::Transforming);

        let mut report = RunReport {
            asset_id: id.to_string(),
            source: job.source.clone(),
            output: job.output.clone(),
            level: job.level.get(),
            seed: Some(params.seed),
            status: RunStatus::Completed,
            stage: Stage::Transforming,
            error_kind: None,
            reason: None,
            resumed,
            encode_retried: false,
            frames: 0,
            analysis: None,
            target_met: None,
            elapsed_secs: 0.0,
        };

        let outcome = self.render(&id, &asset, &params, restored, Some(&session), &progress)?;
        let rendered = match outcome {
            RenderOutcome::Finished(r) => r,
            RenderOutcome::Cancelled => {
                let done = session.frames_completed();
                tracing::info!(asset = %id, frames_completed = done, "run cancelled");
                report.status = RunStatus::Cancelled;
                report.reason = Some(format!("cancelled after {done} frames"));
                report.frames = done;
                report.elapsed_secs = started.elapsed().as_secs_f64();
                return Ok(report);
            }
        };

        session.commit(|cp| cp.stage = Stage::Encoding)?;
        self.notify_stage(&id, &progress, Stage::Encoding);
        let (size, retried) =
            self.encode_and_write(&asset, &rendered, &params.encode, &job.output)?;
        session.commit(|cp| cp.stage = Stage::Analyzing)?;
        self.notify_stage(&id, &progress, Stage::Analyzing);

        let analysis = self.analyze_output(&asset, &job.output, size);
        self.store.remove(&id)?;
        release_seed(&id);
        self.notify_stage(&id, &progress, Stage::Done);

        report.stage = Stage::Done;
        report.encode_retried = retried;
        report.frames = rendered.frames.len() as u64;
        report.target_met = self.check_target(&id, &analysis);
        report.analysis = Some(analysis);
        report.elapsed_secs = started.elapsed().as_secs_f64();
        Ok(report)
    }

    /// Like [`Self::process`], folding errors into a `Failed` report.
    pub fn outcome(&self, job: &AssetJob) -> RunReport {
        let started = Instant::now();
        self.process(job).unwrap_or_else(|e| {
            let id = job.resolved_id();
            tracing::warn!(asset = %id, error = %e, "asset failed");
            let mut report =
                RunReport::failed(id.to_string(), &job.source, &job.output, job.level.get(), &e);
            report.seed = job.seed.or_else(|| recorded_seed(&id));
            report.elapsed_secs = started.elapsed().as_secs_f64();
            report
        })
    }

    /// Process many assets, at most `max_parallel_assets` at a time. Failures are isolated per
    /// asset; reports come back in job order.
    pub fn process_batch(&self, jobs: &[AssetJob]) -> Vec<RunReport> {
        let workers = self.cfg.max_parallel_assets.min(jobs.len());
        if workers <= 1 {
            return jobs.iter().map(|j| self.outcome(j)).collect();
        }
        let next = std::sync::atomic::AtomicUsize::new(0);
        let mut indexed: Vec<(usize, RunReport)> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    s.spawn(|| {
                        let mut done = Vec::new();
                        loop {
                            let i = next.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                            let Some(job) = jobs.get(i) else { break };
                            done.push((i, self.outcome(job)));
                        }
                        done
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| match h.join() {
                    Ok(done) => done,
                    Err(_) => {
                        tracing::warn!("batch worker panicked");
                        Vec::new()
                    }
                })
                .collect()
        });
        indexed.sort_by_key(|(i, _)| *i);
        let mut out = Vec::with_capacity(jobs.len());
        let mut it = indexed.into_iter().peekable();
        for (i, job) in jobs.iter().enumerate() {
            match it.next_if(|(j, _)| *j == i) {
                Some((_, report)) => out.push(report),
                None => out.push(RunReport::failed(
                    job.resolved_id().to_string(),
                    &job.source,
                    &job.output,
                    job.level.get(),
                    &ShiftError::transform("worker panicked"),
                )),
            }
        }
        out
    }

    /// Fingerprint a source without transforming it.
    #[tracing::instrument(skip(self))]
    pub fn analyze_source(&self, source: &Path) -> ShiftResult<SourceAnalysis> {
        let asset = self.codec.decode(source)?;
        self.pool.install(|| self.analyzer.analyze_source(&asset))
    }

    /// Transform the first `preview_secs` of a video (or the whole still) into `job.output`.
    ///
    /// Writes no checkpoints and leaves the seed table untouched for explicit seeds.
    #[tracing::instrument(
        skip_all,
        fields(source = %job.source.display(), level = job.level.get())
    )]
    pub fn preview(&self, job: &AssetJob) -> ShiftResult<RunReport> {
        let started = Instant::now();
        let id = job.resolved_id();
        let full = self.codec.decode(&job.source)?;
        let asset = truncate_asset(full, self.cfg.preview_secs)?;
        let progress = Progress::new(asset.frame_count());

        let seed = job.seed.unwrap_or_else(|| assign_seed(&id, None));
        let target = self.cfg.target_resolution.unwrap_or(asset.resolution);
        let params = EffectParameters::draw(job.level, seed, asset.resolution, target)?;
        let outcome = self.render(&id, &asset, &params, Restored::default(), None, &progress)?;
        let rendered = match outcome {
            RenderOutcome::Finished(r) => r,
            RenderOutcome::Cancelled => {
                return Ok(RunReport {
                    asset_id: id.to_string(),
                    source: job.source.clone(),
                    output: job.output.clone(),
                    level: job.level.get(),
                    seed: Some(seed),
                    status: RunStatus::Cancelled,
                    stage: Stage::Transforming,
                    error_kind: None,
                    reason: Some("preview cancelled".to_string()),
                    resumed: false,
                    encode_retried: false,
                    frames: 0,
                    analysis: None,
                    target_met: None,
                    elapsed_secs: started.elapsed().as_secs_f64(),
                });
            }
        };
        let (size, retried) =
            self.encode_and_write(&asset, &rendered, &params.encode, &job.output)?;
        let analysis = self.analyze_output(&asset, &job.output, size);
        Ok(RunReport {
            asset_id: id.to_string(),
            source: job.source.clone(),
            output: job.output.clone(),
            level: job.level.get(),
            seed: Some(seed),
            status: RunStatus::Completed,
            stage: Stage::Done,
            error_kind: None,
            reason: None,
            resumed: false,
            encode_retried: retried,
            frames: rendered.frames.len() as u64,
            target_met: self.check_target(&id, &analysis),
            analysis: Some(analysis),
            elapsed_secs: started.elapsed().as_secs_f64(),
        })
    }

    fn resume_point(
        &self,
        id: &AssetId,
        job: &AssetJob,
        asset: &MediaAsset,
    ) -> Option<(Checkpoint, Restored)> {
        let cp = match self.store.load(id) {
            Ok(Some(cp)) => cp,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(asset = %id, error = %e, "discarding unreadable checkpoint");
                self.discard(id);
                return None;
            }
        };
        let seed = job.seed.unwrap_or(cp.seed);
        let target = self.cfg.target_resolution.unwrap_or(asset.resolution);
        let restored = cp
            .validate_for(id, job.level, seed, asset.frame_count(), asset.resolution, target)
            .and_then(|()| self.restore(&cp, asset));
        match restored {
            Ok(r) => Some((cp, r)),
            Err(e) => {
                tracing::warn!(
                    asset = %id,
                    error = %e,
                    "discarding unusable checkpoint, starting fresh"
                );
                self.discard(id);
                None
            }
        }
    }

    fn check_target(&self, id: &AssetId, analysis: &AnalysisReport) -> Option<bool> {
        let target = self.cfg.target_delta_percent?;
        let met = analysis.hash_delta_percent.is_some_and(|d| d >= target);
        if !met {
            tracing::warn!(
                asset = %id,
                target_delta_percent = target,
                hash_delta_percent = ?analysis.hash_delta_percent,
                "hash delta below target"
            );
        }
        Some(met)
    }

    fn discard(&self, id: &AssetId) {
        if let Err(e) = self.store.remove(id) {
            tracing::warn!(asset = %id, error = %e, "failed to remove checkpoint");
        }
    }

    fn restore(&self, cp: &Checkpoint, asset: &MediaAsset) -> ShiftResult<Restored> {
        let channels = asset
            .frames
            .first()
            .map(|f| f.channels)
            .ok_or_else(|| ShiftError::checkpoint_corrupt("source has no frames"))?;
        let frames = self.store.load_frames(cp, channels, |i| {
            asset
                .frames
                .get(i as usize)
                .map(|f| f.timestamp_secs)
                .unwrap_or(0.0)
        })?;
        let audio = match (&asset.audio, cp.audio_completed) {
            (Some(src), true) => {
                let samples = self.store.read_audio(cp)?;
                if samples.len() != src.samples.len() {
                    return Err(ShiftError::checkpoint_corrupt(format!(
                        "audio spool holds {} samples, source has {}",
                        samples.len(),
                        src.samples.len()
                    )));
                }
                Some(
                    AudioTrack::new(src.sample_rate, src.channels, samples)
                        .map_err(|e| ShiftError::checkpoint_corrupt(e.to_string()))?,
                )
            }
            _ => None,
        };
        Ok(Restored { frames, audio })
    }

    /// Frame batches on the pool, audio on a scoped thread. Cancellation is checked before each
    /// batch; the audio worker always runs to completion.
    fn render(
        &self,
        id: &AssetId,
        asset: &MediaAsset,
        params: &EffectParameters,
        restored: Restored,
        session: Option<&Session<'_>>,
        progress: &Progress,
    ) -> ShiftResult<RenderOutcome> {
        let stage = match asset.kind {
            MediaKind::Image => FrameStage::Still(ImageTransformer::new(params)?),
            MediaKind::Video => {
                let track = self.pool.install(|| CentroidTrack::from_frames(&asset.frames));
                FrameStage::Video(VideoTransformer::new(params, asset.fps, track)?)
            }
        };
        let batch = self.cfg.frames_per_checkpoint;
        let Restored {
            frames: mut out,
            audio: ready_audio,
        } = restored;
        let pending_audio = match (&ready_audio, &asset.audio) {
            (None, Some(track)) => Some(track),
            _ => None,
        };

        std::thread::scope(|s| -> ShiftResult<RenderOutcome> {
            let audio_worker = pending_audio.map(|track| {
                s.spawn(move || -> ShiftResult<AudioTrack> {
                    let transformed = AudioTransformer::new(&params.audio).transform(track)?;
                    if let Some(session) = session {
                        session.commit_audio(&transformed)?;
                    }
                    progress.mark_audio_done();
                    tracing::debug!(asset = %id, "audio transformed");
                    Ok(transformed)
                })
            });

            let mut frames_result: ShiftResult<()> = Ok(());
            let mut cancelled = false;
            let mut start = out.len();
            while start < asset.frames.len() {
                if self.cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }
                let end = (start + batch).min(asset.frames.len());
                let step = stage.run(&asset.frames[start..end], &self.pool).and_then(|done| {
                    if let Some(session) = session {
                        session.commit_frames(&done)?;
                    }
                    Ok(done)
                });
                match step {
                    Ok(done) => {
                        progress.add_frames(done.len() as u64);
                        out.extend(done);
                        let snapshot = progress.snapshot();
                        tracing::debug!(
                            asset = %id,
                            frames_done = snapshot.frames_done,
                            frames_total = snapshot.frames_total,
                            eta_secs = ?snapshot.eta_secs,
                            "frame batch committed"
                        );
                        if let Some(obs) = &self.observer {
                            obs.on_batch(id, &snapshot);
                        }
                    }
                    Err(e) => {
                        frames_result = Err(e);
                        break;
                    }
                }
                start = end;
            }

            let audio = match audio_worker {
                Some(handle) => Some(
                    handle
                        .join()
                        .map_err(|_| ShiftError::transform("audio worker panicked")),
                ),
                None => None,
            };
            frames_result?;
            let audio = match audio {
                Some(joined) => Some(joined??),
                None => ready_audio,
            };
            if cancelled {
                return Ok(RenderOutcome::Cancelled);
            }
            Ok(RenderOutcome::Finished(Rendered { frames: out, audio }))
        })
    }

    fn encode_and_write(
        &self,
        asset: &MediaAsset,
        rendered: &Rendered,
        params: &EncodeParams,
        output: &Path,
    ) -> ShiftResult<(u64, bool)> {
        let request = EncodeRequest {
            kind: asset.kind,
            frames: &rendered.frames,
            audio: rendered.audio.as_ref(),
            fps: asset.fps,
            params,
            output_path: output,
        };
        let (bytes, retried) = match self.codec.encode(&request) {
            Ok(bytes) => (bytes, false),
            Err(ShiftError::Encode(msg)) => {
                tracing::warn!(
                    codec = self.codec.name(),
                    error = %msg,
                    "encode failed, retrying with conservative settings"
                );
                let fallback = params.conservative();
                let retry = EncodeRequest {
                    params: &fallback,
                    ..request
                };
                (self.codec.encode(&retry)?, true)
            }
            Err(e) => return Err(e),
        };
        write_atomic(output, &bytes)?;
        tracing::info!(output = %output.display(), bytes = bytes.len(), retried, "output written");
        Ok((bytes.len() as u64, retried))
    }

    fn analyze_output(
        &self,
        source: &MediaAsset,
        output: &Path,
        size_bytes: u64,
    ) -> AnalysisReport {
        let decoded = match self.codec.decode(output) {
            Ok(asset) => asset,
            Err(e) => {
                tracing::warn!(error = %e, "failed to decode output for analysis");
                let duration = if source.kind == MediaKind::Image {
                    0.0
                } else {
                    source.duration_secs
                };
                return AnalysisReport::degraded(e.to_string(), size_bytes, duration);
            }
        };
        self.pool
            .install(|| self.analyzer.compare_or_degrade(source, &decoded, size_bytes))
    }
}

/// Persist `bytes` at `path` through a sibling temp file, so readers never see partial output.
fn write_atomic(path: &Path, bytes: &[u8]) -> ShiftResult<()> {
    use anyhow::Context as _;
    ensure_parent_dir(path)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent_or_cwd(path))
        .context("failed to create output temp file")?;
    tmp.write_all(bytes).context("failed to write output temp file")?;
    tmp.persist(path)
        .with_context(|| format!("failed to persist output '{}'", path.display()))?;
    Ok(())
}

/// First `secs` seconds of a video; stills pass through.
fn truncate_asset(asset: MediaAsset, secs: f64) -> ShiftResult<MediaAsset> {
    if asset.kind == MediaKind::Image {
        return Ok(asset);
    }
    let keep = (asset.fps.secs_to_frames_floor(secs).max(1) as usize).min(asset.frames.len());
    let MediaAsset {
        mut frames,
        audio,
        fps,
        ..
    } = asset;
    frames.truncate(keep);
    let audio = audio
        .map(|a| {
            let secs = fps.frames_to_secs(keep as u64);
            let keep_frames = (secs * f64::from(a.sample_rate)).round() as usize;
            let keep_samples = (keep_frames * usize::from(a.channels)).min(a.samples.len());
            AudioTrack::new(a.sample_rate, a.channels, a.samples[..keep_samples].to_vec())
        })
        .transpose()?;
    MediaAsset::video(frames, fps, audio)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrator.rs"]
mod tests;
