#![forbid(unsafe_code)]

//! Signature serialization stability harness.
//!
//! Detects accidental drift of the persisted signature form by comparing
//! canonical signatures against golden reference JSON. If a field is added,
//! renamed, or reordered, these checks fail immediately — a drifted form
//! silently orphans every previously persisted partition, turning warm
//! caches into cold ones without any visible error.

use kp_core::{CpuKernelSignature, DType, GpuKernelSignature, LayoutFormat, Shape};

/// Canonical CPU-side reference signature (hardware-optimized conv2d).
#[must_use]
pub fn golden_cpu_signature() -> CpuKernelSignature {
    CpuKernelSignature {
        description: "Convolution".to_owned(),
        input_shapes: vec![
            Shape::new(vec![1, 3, 224, 224]),
            Shape::new(vec![64, 3, 7, 7]),
        ],
        output_shapes: vec![Shape::new(vec![1, 64, 112, 112])],
        input_dtypes: vec![DType::F32, DType::F32],
        output_dtypes: vec![DType::F32],
        hardware_optimized: true,
        input_layouts: [LayoutFormat::NChw16c, LayoutFormat::OIhw16i16o]
            .into_iter()
            .collect(),
    }
}

/// Canonical GPU-side reference signature (plain matmul).
#[must_use]
pub fn golden_gpu_signature() -> GpuKernelSignature {
    GpuKernelSignature {
        description: "FullyConnected".to_owned(),
        input_shapes: vec![Shape::new(vec![64, 128]), Shape::new(vec![128, 64])],
        output_shapes: vec![Shape::new(vec![64, 64])],
        input_dtypes: vec![DType::F32, DType::F32],
        output_dtypes: vec![DType::F32],
    }
}

/// Serialize the golden signatures and return `(description, json)` pairs.
/// Use this to capture new golden values or detect drift.
#[must_use]
pub fn capture_golden_forms() -> Vec<(String, String)> {
    let cpu = golden_cpu_signature();
    let gpu = golden_gpu_signature();
    vec![
        (
            "cpu conv2d".to_owned(),
            serde_json::to_string(&cpu).expect("golden signature must serialize"),
        ),
        (
            "gpu matmul".to_owned(),
            serde_json::to_string(&gpu).expect("golden signature must serialize"),
        ),
    ]
}

/// Compare current serialized forms against previously captured golden
/// values. Returns a list of mismatches (empty = stable).
#[must_use]
pub fn verify_golden_forms(golden: &[(String, String)]) -> Vec<String> {
    let current = capture_golden_forms();
    let mut mismatches = Vec::new();

    for ((description, expected), (_, actual)) in golden.iter().zip(current.iter()) {
        if expected != actual {
            mismatches.push(format!(
                "DRIFT: {description}: expected={expected}, actual={actual}"
            ));
        }
    }

    mismatches
}
