//! Process-lifetime mapping from dataset name to in-memory table.
//!
//! The registry is a cheap-to-clone handle: every clone shares the same map
//! and counter, so one instance is created at startup and passed to both the
//! ingestion pipeline and the script engine.
//!
//! Datasets are stored as `Arc<DataFrame>`. A load parses into a private
//! frame and only takes the write lock to swap the pointer in, so a reader
//! never sees a partially built dataset and unrelated loads never serialize
//! on each other's parse.

use crate::error::{ExplorerError, Result};
use polars::prelude::DataFrame;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// A registered dataset. Shared, never mutated in place.
pub type Dataset = Arc<DataFrame>;

/// Point-in-time copy of the name → dataset mapping. Rebinding entries in a
/// snapshot never affects the registry; the frames themselves are shared.
pub type Snapshot = BTreeMap<String, Dataset>;

pub const DEFAULT_NAME_PREFIX: &str = "df_";

#[derive(Clone, Default)]
pub struct DatasetRegistry {
    datasets: Arc<RwLock<HashMap<String, Dataset>>>,
    counter: Arc<AtomicU64>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the name a load will use. Mints `df_N` when none is given;
    /// the counter only ever moves forward, even if the load later fails.
    pub fn resolve_name(&self, requested: Option<&str>) -> String {
        match requested {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => {
                let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
                format!("{DEFAULT_NAME_PREFIX}{n}")
            }
        }
    }

    /// Stores `value` under `name` (minting one if absent), replacing any
    /// previous entry without warning.
    ///
    /// # Errors
    ///
    /// Returns an error only if the lock was poisoned by a panicking writer.
    pub fn register(&self, name: Option<&str>, value: DataFrame) -> Result<String> {
        let name = self.resolve_name(name);
        self.insert(name.clone(), Arc::new(value))?;
        Ok(name)
    }

    /// # Errors
    ///
    /// Returns an error only if the lock was poisoned.
    pub fn insert(&self, name: String, value: Dataset) -> Result<()> {
        let mut datasets = self
            .datasets
            .write()
            .map_err(|e| ExplorerError::Other(format!("Lock poisoned: {e}")))?;
        if datasets.insert(name.clone(), value).is_some() {
            tracing::debug!("Replaced dataset {name}");
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Dataset> {
        self.datasets
            .read()
            .ok()
            .and_then(|datasets| datasets.get(name).cloned())
    }

    /// Snapshot of every entry, ordered by name.
    pub fn all(&self) -> Snapshot {
        self.datasets
            .read()
            .map(|datasets| {
                datasets
                    .iter()
                    .map(|(name, df)| (name.clone(), Arc::clone(df)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.all().into_keys().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.datasets
            .read()
            .is_ok_and(|datasets| datasets.contains_key(name))
    }

    pub fn len(&self) -> usize {
        self.datasets.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
