use criterion::{Criterion, criterion_group, criterion_main};
use malla_core::model::{Model, Point, Tag, Value};
use malla_core::{Graph, step};
use std::hint::black_box;

fn populated_model() -> Model {
    let mut model = Model::new();
    for y in (0..malla_core::HEIGHT as i32).step_by(3) {
        for x in (0..malla_core::WIDTH as i32).step_by(5) {
            model.set(Point::new(x, y), Value::operator(Tag::Add).powered());
            model.set(Point::new(x - 1, y), Value::literal(((x + y) % 36) as i32));
            model.set(Point::new(x + 1, y), Value::literal(((x * 2 + y) % 36) as i32));
        }
    }
    model
}

fn bench_step(c: &mut Criterion) {
    let mut model = populated_model();
    let mut graph = Graph::new();
    c.bench_function("step sparse grid", |b| {
        b.iter(|| {
            step(black_box(&mut model), black_box(&mut graph));
        });
    });
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
