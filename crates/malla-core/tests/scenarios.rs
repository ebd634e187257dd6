use malla_core::model::{Graph, Model, Point, Tag, Value};
use malla_core::pool::snapshot_channel;
use malla_core::step;
use malla_core::storage::ModelStorage;

#[test]
fn store_then_load_round_trips_through_a_register() {
    let mut model = Model::new();
    let mut graph = Graph::new();

    // STORE at (1,1): west holds register index 5, east holds the payload.
    model.set(Point::new(0, 1), Value::literal(5));
    model.set(Point::new(2, 1), Value::literal(22));
    model.set(Point::new(1, 1), Value::operator(Tag::Store).powered());

    step(&mut model, &mut graph);
    assert_eq!(model.registers[5], Value::literal(22));

    // LOAD at (10,10): west holds the same register index, reads it south.
    model.set(Point::new(9, 10), Value::literal(5));
    model.set(Point::new(10, 10), Value::operator(Tag::Load).powered());

    step(&mut model, &mut graph);
    assert_eq!(model.get(Point::new(10, 11)), Value::literal(22));
}

#[test]
fn quote_followed_by_bang_produces_a_live_operator() {
    let mut model = Model::new();
    let mut graph = Graph::new();

    // QUOTE reads an index west and writes the corresponding operator tag
    // south, already powered; index 0 names BANG itself, index 1 the first
    // real operator slot (ADD).
    model.set(Point::new(0, 0), Value::literal(0));
    model.set(Point::new(1, 0), Value::operator(Tag::Quote).powered());

    step(&mut model, &mut graph);
    let produced = model.get(Point::new(1, 1));
    assert_eq!(produced.tag, Tag::Bang);
    assert!(produced.powered);

    let mut model = Model::new();
    let mut graph = Graph::new();
    model.set(Point::new(0, 0), Value::literal(1));
    model.set(Point::new(1, 0), Value::operator(Tag::Quote).powered());

    step(&mut model, &mut graph);
    let produced = model.get(Point::new(1, 1));
    assert_eq!(produced.tag, Tag::Add);
    assert!(produced.powered);
}

#[test]
fn quote_out_of_range_index_yields_none() {
    let mut model = Model::new();
    let mut graph = Graph::new();

    model.set(Point::new(0, 0), Value::literal(35));
    model.set(Point::new(1, 0), Value::operator(Tag::Quote).powered());

    step(&mut model, &mut graph);
    // index 35 is well past the operator table; QUOTE must not panic and
    // must fall back to NONE.
    assert_eq!(model.get(Point::new(1, 1)), Value::NONE);
}

#[test]
fn saved_program_reloads_bit_exact_except_frame_and_rng() {
    let mut model = Model::new();
    model.set(Point::new(2, 2), Value::operator(Tag::Mul).powered());
    model.set(Point::new(1, 2), Value::literal(6));
    model.set(Point::new(3, 2), Value::literal(6));
    model.registers[0] = Value::literal(30);

    let mut graph = Graph::new();
    step(&mut model, &mut graph);
    assert_ne!(model.frame, 0);

    let mut buf = Vec::new();
    ModelStorage::write(&model, &mut buf).unwrap();
    let loaded = ModelStorage::read(&mut &buf[..]).unwrap();

    assert_eq!(loaded.frame, 0);
    for y in 0..malla_core::HEIGHT {
        for x in 0..malla_core::WIDTH {
            assert_eq!(
                loaded.map[y][x],
                model.map[y][x],
                "cell ({x}, {y}) mismatched after round trip"
            );
        }
    }
    assert_eq!(loaded.registers, model.registers);
}

#[test]
fn editor_publishes_snapshots_and_audio_thread_swaps_to_them() {
    let (mut producer, mut consumer, active) = snapshot_channel(3, Model::new());

    let published = producer.edit_and_publish(&active, |m| {
        m.set(Point::new(0, 0), Value::literal(1));
    });
    assert!(published);

    let newest = consumer.try_swap(active);
    assert_eq!(newest.get(Point::new(0, 0)), Value::literal(1));
}
