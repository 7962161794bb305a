use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::time::Instant;

use crate::pipeline::report::Stage;

/// Cooperative cancellation flag, checked between frame batches.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear a previous request so the owner can run again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lock-free progress counters for one asset.
///
/// Workers only increment; a single consumer reads [`Progress::snapshot`].
#[derive(Debug)]
pub struct Progress {
    stage: AtomicU8,
    frames_total: AtomicU64,
    frames_done: AtomicU64,
    frames_resumed: AtomicU64,
    audio_done: AtomicBool,
    started: Instant,
}

/// Point-in-time view of [`Progress`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ProgressSnapshot {
    /// Current stage.
    pub stage: Stage,
    /// Frames finished, including frames restored from a checkpoint.
    pub frames_done: u64,
    /// Frames in the asset.
    pub frames_total: u64,
    /// Whether audio is finished (or absent).
    pub audio_done: bool,
    /// Completed fraction of the frame work in `[0, 1]`.
    pub fraction: f64,
    /// Estimated seconds until all frames are done, from this run's throughput.
    pub eta_secs: Option<f64>,
}

impl Progress {
    /// Counters for an asset of `frames_total` frames, starting now.
    pub fn new(frames_total: u64) -> Self {
        Self {
            stage: AtomicU8::new(Stage::Loaded.as_u8()),
            frames_total: AtomicU64::new(frames_total),
            frames_done: AtomicU64::new(0),
            frames_resumed: AtomicU64::new(0),
            audio_done: AtomicBool::new(false),
            started: Instant::now(),
        }
    }

    /// Account for frames restored from a checkpoint. They do not count toward throughput.
    pub fn resume_from(&self, frames: u64) {
        self.frames_resumed.store(frames, Ordering::Relaxed);
        self.frames_done.store(frames, Ordering::Relaxed);
    }

    /// Move to `stage`.
    pub fn set_stage(&self, stage: Stage) {
        self.stage.store(stage.as_u8(), Ordering::Relaxed);
    }

    /// Count `n` newly finished frames.
    pub fn add_frames(&self, n: u64) {
        self.frames_done.fetch_add(n, Ordering::Relaxed);
    }

    /// Mark audio as finished.
    pub fn mark_audio_done(&self) {
        self.audio_done.store(true, Ordering::Relaxed);
    }

    /// Read all counters.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let total = self.frames_total.load(Ordering::Relaxed);
        let done = self.frames_done.load(Ordering::Relaxed).min(total);
        let resumed = self.frames_resumed.load(Ordering::Relaxed).min(done);
        let fraction = if total == 0 {
            1.0
        } else {
            done as f64 / total as f64
        };
        let fresh = done - resumed;
        let eta_secs = (fresh > 0).then(|| {
            let per_frame = self.started.elapsed().as_secs_f64() / fresh as f64;
            per_frame * (total - done) as f64
        });
        ProgressSnapshot {
            stage: Stage::from_u8(self.stage.load(Ordering::Relaxed)),
            frames_done: done,
            frames_total: total,
            audio_done: self.audio_done.load(Ordering::Relaxed),
            fraction,
            eta_secs,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/progress.rs"]
mod tests;
