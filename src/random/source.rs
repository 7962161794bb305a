use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::foundation::core::AssetId;
use crate::foundation::math::Rng64;

/// Independent draw streams, one per effect group.
///
/// Salts are part of the persisted parameter contract and must never be renumbered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectGroup {
    /// Crop, scale and perspective.
    Geometry,
    /// Coherent noise overlay.
    Noise,
    /// Oklab color shift.
    Color,
    /// High-frequency texture overlay.
    Texture,
    /// Zoom, pan, jitter and vignette curves.
    Temporal,
    /// Keyframe interval and encoder settings.
    Encode,
    /// Pitch, filters, ultrasonic noise and reverb.
    Audio,
}

impl EffectGroup {
    fn salt(self) -> u64 {
        match self {
            Self::Geometry => 0x01,
            Self::Noise => 0x02,
            Self::Color => 0x03,
            Self::Texture => 0x04,
            Self::Temporal => 0x05,
            Self::Encode => 0x06,
            Self::Audio => 0x07,
        }
    }
}

/// Seeded root of all stochastic draws for one asset.
#[derive(Clone, Copy, Debug)]
pub struct RandomnessSource {
    seed: u64,
    root: Rng64,
}

impl RandomnessSource {
    /// Create a source for `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            root: Rng64::new(seed),
        }
    }

    /// Seed this source was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fresh generator for `group`. Calling twice yields identical streams.
    pub fn stream(&self, group: EffectGroup) -> Rng64 {
        self.root.fork(group.salt())
    }
}

fn seed_table() -> &'static Mutex<HashMap<AssetId, u64>> {
    static TABLE: OnceLock<Mutex<HashMap<AssetId, u64>>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Seed derived purely from the asset id.
pub fn derived_seed(asset_id: &AssetId) -> u64 {
    xxhash_rust::xxh3::xxh3_64(asset_id.as_str().as_bytes())
}

/// Resolve and record the seed for `asset_id` in the process-wide table.
///
/// An explicit seed always wins and replaces any earlier entry. Without one, a previously
/// recorded seed is reused, else one is derived from the id.
pub fn assign_seed(asset_id: &AssetId, explicit: Option<u64>) -> u64 {
    let mut table = match seed_table().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    match explicit {
        Some(seed) => {
            table.insert(asset_id.clone(), seed);
            seed
        }
        None => *table
            .entry(asset_id.clone())
            .or_insert_with(|| derived_seed(asset_id)),
    }
}

/// Seed currently recorded for `asset_id`, if any.
pub fn recorded_seed(asset_id: &AssetId) -> Option<u64> {
    let table = match seed_table().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    table.get(asset_id).copied()
}

/// Drop the table entry for `asset_id` once its run is finished.
pub fn release_seed(asset_id: &AssetId) {
    let mut table = match seed_table().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    table.remove(asset_id);
}

#[cfg(test)]
#[path = "../../tests/unit/random/source.rs"]
mod tests;
