#![forbid(unsafe_code)]

//! Measured results stored per cache key.
//!
//! Host-side kernels record a single measured cost. Accelerator kernels
//! record either a cost or the ordered list of viable algorithm candidates
//! the selection pass chooses among — an explicit tagged union, matched
//! exhaustively at every consumption site.

use serde::{Deserialize, Serialize};

/// Which back-end family a cache file belongs to. Persisted in the file
/// header so a store of one kind can never be loaded as the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    Cpu,
    Gpu,
}

impl CacheKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
        }
    }
}

/// Marker for record types storable in a [`crate::MeasureStore`], tying
/// each record type to its cache kind.
pub trait MeasureRecord {
    const KIND: CacheKind;
}

/// Measured cost of one host-side kernel instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuMeasurement {
    pub cost: f64,
}

impl CpuMeasurement {
    #[must_use]
    pub fn new(cost: f64) -> Self {
        Self { cost }
    }
}

impl MeasureRecord for CpuMeasurement {
    const KIND: CacheKind = CacheKind::Cpu;
}

/// One accelerator algorithm candidate: an opaque identifying token plus
/// the measured score used to pick among candidates (lower is better).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmCandidate {
    pub token: String,
    pub score: f64,
}

impl AlgorithmCandidate {
    #[must_use]
    pub fn new(token: impl Into<String>, score: f64) -> Self {
        Self {
            token: token.into(),
            score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The algorithm-list variant requires at least one candidate.
    EmptyCandidateList,
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCandidateList => {
                write!(f, "algorithm measurement requires a non-empty candidate list")
            }
        }
    }
}

impl std::error::Error for RecordError {}

/// Measured result of one accelerator kernel instance: a raw cost, or the
/// candidate list an algorithm-selection pass chooses among — never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpuMeasurement {
    Cost(f64),
    Algorithms(Vec<AlgorithmCandidate>),
}

impl GpuMeasurement {
    #[must_use]
    pub fn cost(cost: f64) -> Self {
        Self::Cost(cost)
    }

    /// Build the candidate-list variant. The list must be non-empty; the
    /// candidate order is preserved as measured.
    pub fn algorithms(candidates: Vec<AlgorithmCandidate>) -> Result<Self, RecordError> {
        if candidates.is_empty() {
            return Err(RecordError::EmptyCandidateList);
        }
        Ok(Self::Algorithms(candidates))
    }

    /// True iff this record carries algorithm candidates to select among.
    #[must_use]
    pub fn has_algorithm_choices(&self) -> bool {
        match self {
            Self::Cost(_) => false,
            Self::Algorithms(_) => true,
        }
    }

    /// Best-scoring candidate (lowest score), if this is the list variant.
    #[must_use]
    pub fn preferred(&self) -> Option<&AlgorithmCandidate> {
        match self {
            Self::Cost(_) => None,
            Self::Algorithms(candidates) => candidates.iter().min_by(|a, b| {
                a.score
                    .partial_cmp(&b.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
        }
    }
}

impl MeasureRecord for GpuMeasurement {
    const KIND: CacheKind = CacheKind::Gpu;
}
