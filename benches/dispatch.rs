//! Benchmarks for dispatch-plus-sync latency of the example workloads.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempo::prelude::*;
use tempo::workloads::{ColorToGray, ImageData, VectorAdd};

fn bench_device() -> Option<DeviceClass> {
    for class in [DeviceClass::Gpu, DeviceClass::Cpu] {
        if DeviceContext::acquire(class).is_ok() {
            return Some(class);
        }
    }
    None
}

fn bench_vector_add(c: &mut Criterion) {
    let Some(class) = bench_device() else {
        eprintln!("no compute device available, skipping vector_add bench");
        return;
    };
    let config = Config::default();
    let mut workload = VectorAdd::new(class, &config).unwrap();

    c.bench_function("vector_add_trial", |b| {
        b.iter(|| black_box(workload.trial().unwrap()));
    });
}

fn bench_color_to_gray(c: &mut Criterion) {
    let Some(class) = bench_device() else {
        eprintln!("no compute device available, skipping color_to_gray bench");
        return;
    };
    let width: u32 = 512;
    let height: u32 = 512;
    let pixels: Vec<u8> = (0..width * height * 4).map(|i| (i % 251) as u8).collect();
    let input = ImageData::new(width, height, pixels).unwrap();

    let config = Config::default();
    let mut workload = ColorToGray::new(class, &config, input).unwrap();

    c.bench_function("color_to_gray_trial", |b| {
        b.iter(|| black_box(workload.trial().unwrap()));
    });
}

criterion_group!(benches, bench_vector_add, bench_color_to_gray);
criterion_main!(benches);
