//! Performance benchmarks for chroma enhancement

use chroma_enhance::{enhance, enhance_batch, ChromaMatrix, EnhanceConfig, NUM_PITCH_CLASSES};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Synthetic chromagram: a slowly rotating triad over a low noise floor
fn synthetic_chroma(frames: usize) -> ChromaMatrix {
    let data = (0..frames)
        .map(|i| {
            let mut f = [0.001f32; NUM_PITCH_CLASSES];
            let root = (i / 40) % NUM_PITCH_CLASSES;
            f[root] = 1.0;
            f[(root + 4) % NUM_PITCH_CLASSES] = 0.7;
            f[(root + 7) % NUM_PITCH_CLASSES] = 0.8;
            f[(i * 5) % NUM_PITCH_CLASSES] += 0.3;
            f
        })
        .collect();
    ChromaMatrix::new(data).expect("synthetic chroma is valid")
}

fn bench_enhance(c: &mut Criterion) {
    // ~30 seconds at 44.1 kHz with hop 512
    let chroma = synthetic_chroma(2584);

    c.bench_function("enhance_30s", |b| {
        b.iter(|| {
            let _ = enhance(black_box(&chroma));
        });
    });
}

fn bench_enhance_batch(c: &mut Criterion) {
    let chromas: Vec<ChromaMatrix> = (0..8).map(|_| synthetic_chroma(862)).collect();
    let config = EnhanceConfig::default();

    c.bench_function("enhance_batch_8x10s", |b| {
        b.iter(|| {
            let _ = enhance_batch(black_box(&chromas), black_box(&config));
        });
    });
}

criterion_group!(benches, bench_enhance, bench_enhance_batch);
criterion_main!(benches);
