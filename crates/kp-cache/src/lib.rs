#![forbid(unsafe_code)]

pub mod env;
pub mod persist;
pub mod record;
pub mod stability;
pub mod store;

use serde::{Deserialize, Serialize};

pub use env::EnvFingerprint;
pub use persist::{PersistError, SCHEMA_VERSION, default_cache_dir, default_cache_file};
pub use record::{
    AlgorithmCandidate, CacheKind, CpuMeasurement, GpuMeasurement, MeasureRecord, RecordError,
};
pub use store::{CpuMeasureStore, GpuMeasureStore, MeasureStore, StoreError};

/// Opaque descriptor of the runtime placement/configuration of a kernel's
/// tensors (e.g., memory residency per port). Defined by the caller; the
/// cache only relies on value equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IoConfig(String);

impl IoConfig {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Full cache key: results are unique only per exact
/// (signature, IO configuration) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey<S> {
    pub signature: S,
    pub io: IoConfig,
}

impl<S> CacheKey<S> {
    #[must_use]
    pub fn new(signature: S, io: IoConfig) -> Self {
        Self { signature, io }
    }
}
