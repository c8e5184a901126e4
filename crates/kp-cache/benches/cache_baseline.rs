use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kp_cache::{CacheKey, GpuMeasureStore, GpuMeasurement, IoConfig};
use kp_core::{CpuKernelSignature, DType, GpuKernelSignature, LayoutLabel, OperatorNode, Shape};

struct BenchNode {
    inputs: Vec<(Shape, DType)>,
    outputs: Vec<(Shape, DType)>,
}

impl OperatorNode for BenchNode {
    fn description(&self) -> &str {
        "Convolution"
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
        true
    }

    fn input_layout(&self, _port: usize) -> LayoutLabel {
        LayoutLabel::Name("nChw16c".to_owned())
    }
}

fn conv_node() -> BenchNode {
    BenchNode {
        inputs: vec![
            (Shape::new(vec![1, 3, 224, 224]), DType::F32),
            (Shape::new(vec![64, 3, 7, 7]), DType::F32),
        ],
        outputs: vec![(Shape::new(vec![1, 64, 112, 112]), DType::F32)],
    }
}

fn gpu_key(dim: u32) -> CacheKey<GpuKernelSignature> {
    CacheKey::new(
        GpuKernelSignature {
            description: "Gemm".to_owned(),
            input_shapes: vec![Shape::new(vec![dim, dim]), Shape::new(vec![dim, dim])],
            output_shapes: vec![Shape::new(vec![dim, dim])],
            input_dtypes: vec![DType::F32, DType::F32],
            output_dtypes: vec![DType::F32],
        },
        IoConfig::new("device:device"),
    )
}

fn bench_signature_projection(c: &mut Criterion) {
    let node = conv_node();
    c.bench_function("signature/cpu/conv2d", |b| {
        b.iter(|| CpuKernelSignature::from_node(black_box(&node)))
    });
}

fn bench_store_lookup(c: &mut Criterion) {
    let mut store = GpuMeasureStore::empty("bench.json");
    for dim in 1..=512u32 {
        store.insert_or_update(gpu_key(dim), GpuMeasurement::cost(f64::from(dim)));
    }
    let hot = gpu_key(256);

    c.bench_function("store/lookup/512_entries", |b| {
        b.iter(|| store.lookup(black_box(&hot)))
    });
}

criterion_group!(benches, bench_signature_projection, bench_store_lookup);
criterion_main!(benches);
