use crate::{CpuKernelSignature, DType, GpuKernelSignature, LayoutFormat, Shape};
use proptest::prelude::*;
use smallvec::SmallVec;

pub fn arb_dtype() -> impl Strategy<Value = DType> {
    prop_oneof![
        Just(DType::F16),
        Just(DType::Bf16),
        Just(DType::F32),
        Just(DType::F64),
        Just(DType::I8),
        Just(DType::U8),
        Just(DType::I32),
        Just(DType::I64),
        Just(DType::Bool),
    ]
}

pub fn arb_shape() -> impl Strategy<Value = Shape> {
    prop::collection::vec(1..=64u32, 0..=4).prop_map(Shape::new)
}

pub fn arb_layout() -> impl Strategy<Value = LayoutFormat> {
    prop_oneof![
        Just(LayoutFormat::Nchw),
        Just(LayoutFormat::Nhwc),
        Just(LayoutFormat::NChw8c),
        Just(LayoutFormat::NChw16c),
        Just(LayoutFormat::Oihw),
        Just(LayoutFormat::Unknown),
    ]
}

pub fn arb_ports() -> impl Strategy<Value = Vec<(Shape, DType)>> {
    prop::collection::vec((arb_shape(), arb_dtype()), 1..=3)
}

pub fn arb_cpu_signature() -> impl Strategy<Value = CpuKernelSignature> {
    (
        "[A-Z][a-z]{3,10}",
        arb_ports(),
        arb_ports(),
        any::<bool>(),
    )
        .prop_map(|(description, inputs, outputs, hardware_optimized)| {
            let input_layouts: SmallVec<[LayoutFormat; 4]> = if hardware_optimized {
                inputs.iter().map(|_| LayoutFormat::Nchw).collect()
            } else {
                SmallVec::new()
            };
            CpuKernelSignature {
                description,
                input_shapes: inputs.iter().map(|(s, _)| s.clone()).collect(),
                output_shapes: outputs.iter().map(|(s, _)| s.clone()).collect(),
                input_dtypes: inputs.iter().map(|(_, d)| *d).collect(),
                output_dtypes: outputs.iter().map(|(_, d)| *d).collect(),
                hardware_optimized,
                input_layouts,
            }
        })
}

pub fn arb_gpu_signature() -> impl Strategy<Value = GpuKernelSignature> {
    ("[A-Z][a-z]{3,10}", arb_ports(), arb_ports()).prop_map(|(description, inputs, outputs)| {
        GpuKernelSignature {
            description,
            input_shapes: inputs.iter().map(|(s, _)| s.clone()).collect(),
            output_shapes: outputs.iter().map(|(s, _)| s.clone()).collect(),
            input_dtypes: inputs.iter().map(|(_, d)| *d).collect(),
            output_dtypes: outputs.iter().map(|(_, d)| *d).collect(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    proptest! {
        #[test]
        fn clone_preserves_equality_and_hash(sig in arb_cpu_signature()) {
            let copy = sig.clone();
            prop_assert_eq!(&sig, &copy);
            prop_assert_eq!(hash_of(&sig), hash_of(&copy));
        }

        #[test]
        fn serde_round_trip_is_identity(sig in arb_gpu_signature()) {
            let raw = serde_json::to_string(&sig).expect("serialize");
            let back: GpuKernelSignature = serde_json::from_str(&raw).expect("deserialize");
            prop_assert_eq!(sig, back);
        }

        #[test]
        fn reversed_distinct_ports_change_equality(
            description in "[A-Z][a-z]{3,8}",
            ports in arb_ports(),
        ) {
            prop_assume!(ports.len() >= 2);
            let mut reversed = ports.clone();
            reversed.reverse();
            prop_assume!(reversed != ports);

            let build = |ports: &[(Shape, DType)]| GpuKernelSignature {
                description: description.clone(),
                input_shapes: ports.iter().map(|(s, _)| s.clone()).collect(),
                output_shapes: vec![Shape::scalar()],
                input_dtypes: ports.iter().map(|(_, d)| *d).collect(),
                output_dtypes: vec![DType::F32],
            };
            prop_assert_ne!(build(&ports), build(&reversed));
        }
    }
}
