use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::core::{CraftingConfig, ResourceCost};

/// Slot name the calculator has always stored its state under.
pub const STORAGE_KEY: &str = "calculateCraftingData";

#[derive(thiserror::Error, Debug)]
enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One named durable slot holding a serialized `CraftingConfig`.
///
/// Persistence is a convenience, not a correctness dependency: loads fail
/// open to the built-in defaults and saves swallow their failures, leaving
/// the in-memory record authoritative for the session.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Store addressing `<dir>/<key>.json`.
    pub fn open(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    /// Store addressing an explicit snapshot file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the slot, falling back to the default record when the slot is
    /// absent, unreadable, or not a JSON object. Individual malformed fields
    /// fall back on their own without discarding the rest of the snapshot.
    pub fn load(&self) -> CraftingConfig {
        match self.try_load() {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "falling back to default state");
                CraftingConfig::default()
            }
        }
    }

    /// Serializes and overwrites the whole slot. Failures are logged and
    /// swallowed.
    pub fn save(&self, config: &CraftingConfig) {
        if let Err(err) = self.try_save(config) {
            warn!(path = %self.path.display(), %err, "failed to persist state");
        }
    }

    fn try_load(&self) -> Result<CraftingConfig, StoreError> {
        if !self.path.exists() {
            return Ok(CraftingConfig::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        // Parsed into a value tree first so a field of the wrong type can be
        // dropped without desyncing the rest of the document.
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        let snapshot: Snapshot = serde_json::from_value(value)?;
        Ok(snapshot.into_config())
    }

    fn try_save(&self, config: &CraftingConfig) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(config)?)?;
        Ok(())
    }
}

/// Tolerant mirror of `CraftingConfig`: every field optional, every field
/// individually allowed to fail deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Snapshot {
    #[serde(deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    resources: Option<Vec<ResourceSnapshot>>,
    #[serde(deserialize_with = "lenient")]
    artifact: Option<ResourceSnapshot>,
    #[serde(deserialize_with = "lenient")]
    factory_price: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    realization_price: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    return_percent: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    return_percent_list: Option<Vec<f64>>,
    #[serde(deserialize_with = "lenient")]
    initial_amount_items: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResourceSnapshot {
    #[serde(deserialize_with = "lenient")]
    price: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    amount: Option<f64>,
}

impl Snapshot {
    fn into_config(self) -> CraftingConfig {
        let defaults = CraftingConfig::default();

        let resources = match self.resources {
            Some(lines) => lines.into_iter().map(ResourceSnapshot::into_cost).collect(),
            None => defaults.resources,
        };

        let return_percent_list = match self.return_percent_list {
            Some(entries) => normalize_percent_list(entries),
            None => defaults.return_percent_list,
        };

        // A stored selection that no longer matches a preset is cleared
        // rather than repaired; the selection invariant holds either way.
        let return_percent = self
            .return_percent
            .filter(|selected| return_percent_list.iter().any(|entry| entry == selected));

        CraftingConfig {
            id: self.id.unwrap_or(defaults.id),
            resources,
            artifact: self
                .artifact
                .map(ResourceSnapshot::into_cost)
                .unwrap_or_default(),
            factory_price: amount_or_zero(self.factory_price),
            realization_price: amount_or_zero(self.realization_price),
            return_percent,
            return_percent_list,
            initial_amount_items: amount_or_zero(self.initial_amount_items),
        }
    }
}

impl ResourceSnapshot {
    fn into_cost(self) -> ResourceCost {
        ResourceCost {
            price: amount_or_zero(self.price),
            amount: amount_or_zero(self.amount),
        }
    }
}

fn amount_or_zero(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

fn normalize_percent_list(entries: Vec<f64>) -> Vec<f64> {
    let mut list: Vec<f64> = entries
        .into_iter()
        .filter(|p| p.is_finite() && *p > 0.0 && *p < 100.0)
        .collect();
    list.sort_by(f64::total_cmp);
    list.dedup();
    list
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(T::deserialize(deserializer).ok())
}
