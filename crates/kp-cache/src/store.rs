#![forbid(unsafe_code)]

//! In-memory measurement store.
//!
//! Maps (signature, IO configuration) keys to measured results for one
//! back-end variant, and remembers the file path it is bound to. The store
//! is exclusively owned by the profiling session holding it; persistence
//! only touches it during an explicit `open`/`save` (see `persist`).

use crate::CacheKey;
use crate::record::{CpuMeasurement, GpuMeasurement, MeasureRecord};
use kp_core::{CpuKernelSignature, GpuKernelSignature, KernelSignature};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum StoreError {
    /// A result-dependent query was invoked for a key that is not present.
    /// Callers are expected to check `contains` first.
    MissingKey { detail: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingKey { detail } => write!(f, "no cached measurement for {detail}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Key→result container for one back-end variant, bound to a cache file.
///
/// All operations are O(1) amortized on the structural hash/equality of the
/// key. `lookup`/`contains`/`remove` never fail on absent keys;
/// `insert_or_update` overwrites — last write wins, no history.
#[derive(Debug, Clone)]
pub struct MeasureStore<S, R> {
    file: PathBuf,
    entries: HashMap<CacheKey<S>, R>,
}

/// Host-side cache: CPU signatures mapped to raw costs.
pub type CpuMeasureStore = MeasureStore<CpuKernelSignature, CpuMeasurement>;

/// Accelerator cache: GPU signatures mapped to cost-or-algorithm records.
pub type GpuMeasureStore = MeasureStore<GpuKernelSignature, GpuMeasurement>;

impl<S: KernelSignature, R: MeasureRecord> MeasureStore<S, R> {
    /// Fresh empty store bound to `file`. Nothing is read or written until
    /// `open`/`save`.
    #[must_use]
    pub fn empty(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            entries: HashMap::new(),
        }
    }

    pub(crate) fn from_entries(file: PathBuf, entries: HashMap<CacheKey<S>, R>) -> Self {
        Self { file, entries }
    }

    /// The file this store loads from and saves to.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn lookup(&self, key: &CacheKey<S>) -> Option<&R> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &CacheKey<S>) -> bool {
        self.entries.contains_key(key)
    }

    /// Record a measurement. Overwrites any previous result for the key.
    pub fn insert_or_update(&mut self, key: CacheKey<S>, record: R) {
        self.entries.insert(key, record);
    }

    /// Drop a key. Returns the previous record, `None` if absent.
    pub fn remove(&mut self, key: &CacheKey<S>) -> Option<R> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CacheKey<S>, &R)> {
        self.entries.iter()
    }
}

impl<S: KernelSignature> MeasureStore<S, GpuMeasurement> {
    /// True iff the stored record for `key` is the algorithm-candidate
    /// variant rather than a raw cost. Absent keys are a caller error and
    /// fail loudly rather than defaulting.
    pub fn can_select_algorithm(&self, key: &CacheKey<S>) -> Result<bool, StoreError> {
        match self.entries.get(key) {
            Some(record) => Ok(record.has_algorithm_choices()),
            None => Err(StoreError::MissingKey {
                detail: format!(
                    "{} (io={})",
                    key.signature.description(),
                    key.io.as_str()
                ),
            }),
        }
    }
}
