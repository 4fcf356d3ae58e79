#![allow(missing_docs)]

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use strata_core::{
    FixedClimateSampler, FixedLabelSource, LabelProvider, LabelSource, Slice, SliceOverlay,
};
use strata_utils::Identifier;

fn build_overlay(slice_count: u32) -> SliceOverlay {
    let slices = (0..slice_count)
        .map(|i| {
            Slice::new(
                Identifier::vanilla(&format!("slice_{i}")),
                1 + i,
                LabelProvider::Passthrough,
            )
        })
        .collect();
    let underlying: Arc<dyn LabelSource> =
        Arc::new(FixedLabelSource::new(Identifier::vanilla("plains")));
    SliceOverlay::new(Identifier::vanilla("overworld"), 0, 4, slices, underlying)
        .expect("valid overlay")
}

/// Sweep a chunk-like 4x4 quart footprint with 24 vertical samples per
/// column, the shape of a real generation workload. Column-major so the
/// per-thread cache sees the same locality the generator produces.
fn sweep_labels(overlay: &SliceOverlay, chunk_x: i32, chunk_z: i32) {
    let climate = FixedClimateSampler::default();
    for lx in 0..4_i32 {
        for lz in 0..4_i32 {
            for y in 0..24_i32 {
                let qx = chunk_x * 4 + lx;
                let qz = chunk_z * 4 + lz;
                black_box(overlay.label_at(qx, y, qz, &climate));
            }
        }
    }
}

fn bench_slice_at(c: &mut Criterion) {
    let overlay = build_overlay(4);

    c.bench_function("slice_at_single_chunk", |b| {
        b.iter(|| {
            for lx in 0..4_i32 {
                for lz in 0..4_i32 {
                    black_box(overlay.slice_at(black_box(lx), black_box(lz)));
                }
            }
        });
    });
}

fn bench_label_at_chunk_grid(c: &mut Criterion) {
    let overlay = build_overlay(4);

    c.bench_function("label_at_chunk_grid_9x9", |b| {
        b.iter(|| {
            for cx in -4..=4 {
                for cz in -4..=4 {
                    sweep_labels(&overlay, black_box(cx), black_box(cz));
                }
            }
        });
    });
}

fn bench_zoomed_query(c: &mut Criterion) {
    let overlay = build_overlay(4);

    c.bench_function("zoomed_slice_at_line", |b| {
        b.iter(|| {
            for x in 0..256 {
                black_box(overlay.zoomed_slice_at(black_box(x), 64, black_box(-x)));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_slice_at,
    bench_label_at_chunk_grid,
    bench_zoomed_query
);
criterion_main!(benches);
