use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use glam::{Mat3, Mat4, Vec3, Vec4};
use vesper_driver::{InterfaceBlock, UniformBuffer, UniformType};

fn bench_uniform_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("uniform_buffer");

    group.bench_function("set_uniform_inline", |b| {
        let mut buffer = UniformBuffer::with_size(96);
        b.iter(|| {
            buffer.set_uniform(0, black_box(Mat4::IDENTITY));
            buffer.set_uniform(64, black_box(Vec4::ONE));
            buffer.set_uniform(80, black_box(0.5f32));
            buffer.clean();
        });
    });

    group.bench_function("set_uniform_mat3", |b| {
        let mut buffer = UniformBuffer::with_size(48);
        b.iter(|| buffer.set_uniform(0, black_box(Mat3::IDENTITY)));
    });

    group.bench_function("set_uniform_array_vec3", |b| {
        let values = vec![Vec3::new(1.0, 2.0, 3.0); 64];
        let mut buffer = UniformBuffer::with_size(64 * 16);
        b.iter(|| buffer.set_uniform_array(0, black_box(values.as_slice())));
    });

    group.bench_function("set_uniform_by_name", |b| {
        let block = InterfaceBlock::builder("Material")
            .add("baseColor", UniformType::Float4)
            .add("emissive", UniformType::Float3)
            .add("roughness", UniformType::Float)
            .build()
            .expect("valid block");
        let mut buffer = UniformBuffer::from_interface_block(&block);
        b.iter(|| {
            buffer.set_uniform_by_name(&block, "baseColor", 0, black_box(Vec4::ONE));
            buffer.set_uniform_by_name(&block, "roughness", 0, black_box(0.5f32));
            buffer.set_uniform_by_name(&block, "clearcoat", 0, black_box(1.0f32));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_uniform_writes);
criterion_main!(benches);
