use criterion::{Criterion, criterion_group, criterion_main};
use malla_effects::Reverb;
use std::hint::black_box;

fn bench_reverb_tick(c: &mut Criterion) {
    let mut reverb = Reverb::new(48000);
    reverb.set_enabled(true);
    reverb.set_mix(0.5);
    c.bench_function("reverb tick, fully wet", |b| {
        b.iter(|| black_box(reverb.tick(black_box(0.3), black_box(-0.2))));
    });
}

criterion_group!(benches, bench_reverb_tick);
criterion_main!(benches);
