#![forbid(unsafe_code)]

//! Shared fixtures for the kernprobe conformance suites.
//!
//! `FixtureNode` is a plain-field [`OperatorNode`] implementation standing
//! in for a live graph-node adapter, so the oracles can project signatures
//! without a foreign framework in the loop.

use kp_cache::{
    AlgorithmCandidate, CacheKey, CpuMeasurement, EnvFingerprint, GpuMeasurement, IoConfig,
};
use kp_core::{CpuKernelSignature, DType, GpuKernelSignature, LayoutLabel, OperatorNode, Shape};

/// Operator-graph node fixture with fully caller-controlled content.
#[derive(Debug, Clone)]
pub struct FixtureNode {
    pub description: String,
    pub inputs: Vec<(Shape, DType)>,
    pub outputs: Vec<(Shape, DType)>,
    pub hardware_optimized: bool,
    pub layouts: Vec<LayoutLabel>,
}

impl FixtureNode {
    /// 2-D convolution in the hardware-optimized layout path.
    #[must_use]
    pub fn conv2d() -> Self {
        Self {
            description: "Convolution".to_owned(),
            inputs: vec![
                (Shape::new(vec![1, 3, 224, 224]), DType::F32),
                (Shape::new(vec![64, 3, 7, 7]), DType::F32),
            ],
            outputs: vec![(Shape::new(vec![1, 64, 112, 112]), DType::F32)],
            hardware_optimized: true,
            layouts: vec![
                LayoutLabel::Name("nChw16c".to_owned()),
                LayoutLabel::Name("OIhw16i16o".to_owned()),
            ],
        }
    }

    /// Plain matrix multiply, no hardware layout pinning.
    #[must_use]
    pub fn matmul(m: u32, k: u32, n: u32) -> Self {
        Self {
            description: "FullyConnected".to_owned(),
            inputs: vec![
                (Shape::new(vec![m, k]), DType::F32),
                (Shape::new(vec![k, n]), DType::F32),
            ],
            outputs: vec![(Shape::new(vec![m, n]), DType::F32)],
            hardware_optimized: false,
            layouts: Vec::new(),
        }
    }

    #[must_use]
    pub fn cpu_key(&self, io: &str) -> CacheKey<CpuKernelSignature> {
        CacheKey::new(CpuKernelSignature::from_node(self), IoConfig::new(io))
    }

    #[must_use]
    pub fn gpu_key(&self, io: &str) -> CacheKey<GpuKernelSignature> {
        CacheKey::new(GpuKernelSignature::from_node(self), IoConfig::new(io))
    }
}

impl OperatorNode for FixtureNode {
    fn description(&self) -> &str {
        &self.description
    }

    fn input_count(&self) -> usize {
        self.inputs.len()
    }

    fn output_count(&self) -> usize {
        self.outputs.len()
    }

    fn input_shape(&self, port: usize) -> Shape {
        self.inputs[port].0.clone()
    }

    fn output_shape(&self, port: usize) -> Shape {
        self.outputs[port].0.clone()
    }

    fn input_dtype(&self, port: usize) -> DType {
        self.inputs[port].1
    }

    fn output_dtype(&self, port: usize) -> DType {
        self.outputs[port].1
    }

    fn is_hardware_optimized(&self) -> bool {
        self.hardware_optimized
    }

    fn input_layout(&self, port: usize) -> LayoutLabel {
        self.layouts[port].clone()
    }
}

/// Environment token for a named test stack.
#[must_use]
pub fn env(label: &str) -> EnvFingerprint {
    EnvFingerprint::from_components([("stack", label)])
}

/// A cost-only CPU measurement.
#[must_use]
pub fn cpu_cost(cost: f64) -> CpuMeasurement {
    CpuMeasurement::new(cost)
}

/// A two-candidate GPU algorithm measurement.
#[must_use]
pub fn gpu_algorithms() -> GpuMeasurement {
    GpuMeasurement::algorithms(vec![
        AlgorithmCandidate::new("implicit_gemm", 0.81),
        AlgorithmCandidate::new("winograd", 0.64),
    ])
    .expect("fixture list is non-empty")
}
