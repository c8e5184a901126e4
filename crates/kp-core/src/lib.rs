#![forbid(unsafe_code)]

#[cfg(test)]
pub mod proptest_strategies;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    F16,
    Bf16,
    F32,
    F64,
    I8,
    U8,
    I32,
    I64,
    Bool,
}

impl DType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::F16 => "f16",
            Self::Bf16 => "bf16",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Bool => "bool",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub dims: Vec<u32>,
}

impl Shape {
    #[must_use]
    pub fn new(dims: Vec<u32>) -> Self {
        Self { dims }
    }

    #[must_use]
    pub fn scalar() -> Self {
        Self { dims: Vec::new() }
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    #[must_use]
    pub fn element_count(&self) -> Option<u64> {
        self.dims
            .iter()
            .try_fold(1_u64, |acc, dim| acc.checked_mul(u64::from(*dim)))
    }
}

// ── Hardware Memory Layouts ────────────────────────────────────────

/// Raw layout identifier as yielded by a graph-node adapter.
///
/// Native libraries expose memory layouts either as an enum-like integer or
/// as a version-dependent string label. Neither form is a stable equality
/// basis across library versions, so both are canonicalized into
/// [`LayoutFormat`] before a signature stores them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutLabel {
    Code(u32),
    Name(String),
}

/// Canonical enumeration of known hardware memory layouts.
///
/// Each variant carries a fixed `u8` code; unrecognized adapter input maps
/// to `Unknown` rather than being stored raw. Serialized by variant name,
/// so persisted caches survive enum reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LayoutFormat {
    Undef = 0,
    Any = 1,
    Flat = 2,
    Nc = 3,
    Nchw = 4,
    Nhwc = 5,
    Chwn = 6,
    NChw8c = 7,
    NChw16c = 8,
    Oihw = 9,
    OIhw8i8o = 10,
    OIhw16i16o = 11,
    Goihw = 12,
    Unknown = 255,
}

impl LayoutFormat {
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Undef,
            1 => Self::Any,
            2 => Self::Flat,
            3 => Self::Nc,
            4 => Self::Nchw,
            5 => Self::Nhwc,
            6 => Self::Chwn,
            7 => Self::NChw8c,
            8 => Self::NChw16c,
            9 => Self::Oihw,
            10 => Self::OIhw8i8o,
            11 => Self::OIhw16i16o,
            12 => Self::Goihw,
            _ => Self::Unknown,
        }
    }

    /// Map a library-native string label to its canonical variant.
    /// Labels from unsupported library versions fail closed to `Unknown`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "undef" => Self::Undef,
            "any" => Self::Any,
            "x" => Self::Flat,
            "nc" => Self::Nc,
            "nchw" => Self::Nchw,
            "nhwc" => Self::Nhwc,
            "chwn" => Self::Chwn,
            "nChw8c" => Self::NChw8c,
            "nChw16c" => Self::NChw16c,
            "oihw" => Self::Oihw,
            "OIhw8i8o" => Self::OIhw8i8o,
            "OIhw16i16o" => Self::OIhw16i16o,
            "goihw" => Self::Goihw,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn canonicalize(label: &LayoutLabel) -> Self {
        match label {
            LayoutLabel::Code(code) => Self::from_code(*code),
            LayoutLabel::Name(name) => Self::from_label(name),
        }
    }

    #[must_use]
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Undef => "undef",
            Self::Any => "any",
            Self::Flat => "x",
            Self::Nc => "nc",
            Self::Nchw => "nchw",
            Self::Nhwc => "nhwc",
            Self::Chwn => "chwn",
            Self::NChw8c => "nChw8c",
            Self::NChw16c => "nChw16c",
            Self::Oihw => "oihw",
            Self::OIhw8i8o => "OIhw8i8o",
            Self::OIhw16i16o => "OIhw16i16o",
            Self::Goihw => "goihw",
            Self::Unknown => "unknown",
        }
    }
}

// ── Operator Node Accessor ─────────────────────────────────────────

/// Read-only accessor surface over a live operator-graph node.
///
/// Implemented by a thin adapter outside this crate; the signature
/// projections below never see the adapter's native representation. Ports
/// are indexed from zero in graph order. The two layout accessors only
/// matter for host-side kernels; accelerator adapters can rely on the
/// defaults.
pub trait OperatorNode {
    /// Operator kind name (e.g., "Convolution"). Not unique on its own.
    fn description(&self) -> &str;

    fn input_count(&self) -> usize;

    fn output_count(&self) -> usize;

    fn input_shape(&self, port: usize) -> Shape;

    fn output_shape(&self, port: usize) -> Shape;

    fn input_dtype(&self, port: usize) -> DType;

    fn output_dtype(&self, port: usize) -> DType;

    /// Whether the node is pinned to the hardware-optimized kernel path.
    fn is_hardware_optimized(&self) -> bool {
        false
    }

    /// Raw layout identifier for one input port. Only consulted when
    /// `is_hardware_optimized` returns true.
    fn input_layout(&self, _port: usize) -> LayoutLabel {
        LayoutLabel::Code(0)
    }
}

// ── Kernel Signatures ──────────────────────────────────────────────

/// Shared role of the two signature variants: a structurally-equal,
/// hashable key identifying one profiled kernel instance.
pub trait KernelSignature: Clone + Eq + std::hash::Hash {
    fn description(&self) -> &str;

    fn input_count(&self) -> usize;

    fn output_count(&self) -> usize;
}

/// Signature of a host-side (CPU) kernel instance.
///
/// Equality is deep and order-significant across every field: two signatures
/// compare equal iff description, per-port shapes, per-port element types,
/// the hardware-optimization flag, and the canonical layout run all match.
/// The derived hash is consistent with that equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CpuKernelSignature {
    pub description: String,
    pub input_shapes: Vec<Shape>,
    pub output_shapes: Vec<Shape>,
    pub input_dtypes: Vec<DType>,
    pub output_dtypes: Vec<DType>,
    pub hardware_optimized: bool,
    /// One canonical layout per input port when `hardware_optimized` is
    /// set; empty otherwise.
    pub input_layouts: SmallVec<[LayoutFormat; 4]>,
}

impl CpuKernelSignature {
    /// Project a signature from a node. Pure: equal node content always
    /// yields equal signatures — the premise the cache depends on.
    #[must_use]
    pub fn from_node(node: &dyn OperatorNode) -> Self {
        let hardware_optimized = node.is_hardware_optimized();
        let input_layouts = if hardware_optimized {
            (0..node.input_count())
                .map(|port| LayoutFormat::canonicalize(&node.input_layout(port)))
                .collect()
        } else {
            SmallVec::new()
        };

        Self {
            description: node.description().to_owned(),
            input_shapes: (0..node.input_count()).map(|p| node.input_shape(p)).collect(),
            output_shapes: (0..node.output_count()).map(|p| node.output_shape(p)).collect(),
            input_dtypes: (0..node.input_count()).map(|p| node.input_dtype(p)).collect(),
            output_dtypes: (0..node.output_count()).map(|p| node.output_dtype(p)).collect(),
            hardware_optimized,
            input_layouts,
        }
    }
}

impl KernelSignature for CpuKernelSignature {
    fn description(&self) -> &str {
        &self.description
    }

    fn input_count(&self) -> usize {
        self.input_shapes.len()
    }

    fn output_count(&self) -> usize {
        self.output_shapes.len()
    }
}

/// Signature of an accelerator-side (GPU) kernel instance.
///
/// Same shape/type profile as [`CpuKernelSignature`] without the
/// hardware-layout fields — accelerator kernels are selected per algorithm,
/// not per memory format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GpuKernelSignature {
    pub description: String,
    pub input_shapes: Vec<Shape>,
    pub output_shapes: Vec<Shape>,
    pub input_dtypes: Vec<DType>,
    pub output_dtypes: Vec<DType>,
}

impl GpuKernelSignature {
    #[must_use]
    pub fn from_node(node: &dyn OperatorNode) -> Self {
        Self {
            description: node.description().to_owned(),
            input_shapes: (0..node.input_count()).map(|p| node.input_shape(p)).collect(),
            output_shapes: (0..node.output_count()).map(|p| node.output_shape(p)).collect(),
            input_dtypes: (0..node.input_count()).map(|p| node.input_dtype(p)).collect(),
            output_dtypes: (0..node.output_count()).map(|p| node.output_dtype(p)).collect(),
        }
    }
}

impl KernelSignature for GpuKernelSignature {
    fn description(&self) -> &str {
        &self.description
    }

    fn input_count(&self) -> usize {
        self.input_shapes.len()
    }

    fn output_count(&self) -> usize {
        self.output_shapes.len()
    }
}
