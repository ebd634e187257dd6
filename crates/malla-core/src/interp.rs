//! The small-step grid interpreter: `step` advances a [`Model`] by one beat.
//!
//! Evaluation is two sweeps over the map in English reading order (rows
//! top-to-bottom, columns left-to-right within a row):
//!
//! 1. **Pre-pass** — clear every cell's `pulse` flag and replace every
//!    `BANG` with `NONE`.
//! 2. **Main pass** — for each cell, gather its four neighbours, decide
//!    whether it fires (powered, or adjacent to a `BANG`), and if so
//!    dispatch on its tag. Writes made during the main pass are visible to
//!    cells visited later in the same sweep — this is how `BANG`
//!    propagates, and it is a deliberate property of the language, not an
//!    implementation accident.
//!
//! Every operator read goes through [`record_read`], every write through
//! [`record_write`]; both also append a [`GraphEdge`] purely for
//! introspection/rendering — edges never influence semantics.

use crate::model::{
    Direction, Graph, GraphEdge, GraphEdgeTag, Model, Point, Tag, Value, add_unit_vector,
    map_zero, quote_tag, read_literal, RADIX,
};

const ATTR_LEFT_ADDEND: &str = "LEFT ADDEND";
const ATTR_RIGHT_ADDEND: &str = "RIGHT ADDEND";
const ATTR_MINUEND: &str = "MINUEND";
const ATTR_SUBTRAHEND: &str = "SUBTRAHEND";
const ATTR_MULTIPLIER: &str = "MULTIPLIER";
const ATTR_MULTIPLICAND: &str = "MULTIPLICAND";
const ATTR_DIVIDEND: &str = "DIVIDEND";
const ATTR_DIVISOR: &str = "DIVISOR";
const ATTR_LEFT_COMPARATE: &str = "LEFT COMPARATE";
const ATTR_RIGHT_COMPARATE: &str = "RIGHT COMPARATE";
const ATTR_LEFT_CONJUNCT: &str = "LEFT CONJUNCT";
const ATTR_RIGHT_CONJUNCT: &str = "RIGHT CONJUNCT";
const ATTR_LEFT_DISJUNCT: &str = "LEFT DISJUNCT";
const ATTR_RIGHT_DISJUNCT: &str = "RIGHT DISJUNCT";
const ATTR_MINIMUM: &str = "MINIMUM";
const ATTR_MAXIMUM: &str = "MAXIMUM";
const ATTR_RATE: &str = "RATE";
const ATTR_TIME: &str = "TIME";
const ATTR_X: &str = "X";
const ATTR_Y: &str = "Y";
const ATTR_INPUT: &str = "INPUT";
const ATTR_REGISTER: &str = "REGISTER";
const ATTR_INDEX: &str = "INDEX";
const ATTR_OUTPUT: &str = "OUTPUT";

/// Major scale semitone offsets, indexed by scale degree 0..7. Used by NOTE.
const SCALE: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

fn record_read(model: &Model, graph: &mut Graph, origin: Point, target: Point, cause: Tag, attribute: &'static str) -> Value {
    let value = model.get(target);
    graph.push(GraphEdge {
        tag: GraphEdgeTag::Input,
        origin,
        target,
        cause,
        attribute,
    });
    value
}

fn record_write(model: &mut Model, graph: &mut Graph, origin: Point, target: Point, cause: Tag, attribute: &'static str, value: Value) {
    model.set(target, value);
    graph.push(GraphEdge {
        tag: GraphEdgeTag::Output,
        origin,
        target,
        cause,
        attribute,
    });
}

/// Advance `model` by one beat, recording the step's data flow into `graph`
/// (which is cleared on entry).
pub fn step(model: &mut Model, graph: &mut Graph) {
    graph.clear();

    // Pre-pass: clear pulse flags, BANG -> NONE.
    for row in model.map.iter_mut() {
        for cell in row.iter_mut() {
            cell.pulse = false;
            if cell.tag == Tag::Bang {
                *cell = Value::NONE;
            }
        }
    }

    // Main pass: English reading order.
    for y in 0..crate::model::HEIGHT as i32 {
        for x in 0..crate::model::WIDTH as i32 {
            let origin = Point::new(x, y);
            let v = model.get(origin);

            let bang_adjacent = Direction::ALL
                .iter()
                .any(|d| model.get(add_unit_vector(origin, *d)).is_bang());

            if !v.powered && bang_adjacent {
                let mut pulsed = v;
                pulsed.pulse = true;
                model.set(origin, pulsed);
            }

            if v.powered || bang_adjacent {
                dispatch(model, graph, origin, v);
            }
        }
    }

    model.frame += 1;
}

fn dispatch(model: &mut Model, graph: &mut Graph, origin: Point, v: Value) {
    let north = add_unit_vector(origin, Direction::North);
    let east = add_unit_vector(origin, Direction::East);
    let south = add_unit_vector(origin, Direction::South);
    let west = add_unit_vector(origin, Direction::West);

    match v.tag {
        Tag::Add => {
            let l = record_read(model, graph, origin, west, v.tag, ATTR_LEFT_ADDEND);
            let r = record_read(model, graph, origin, east, v.tag, ATTR_RIGHT_ADDEND);
            let result = Value::literal(read_literal(l, 0) + read_literal(r, 0));
            record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, result);
        }
        Tag::Sub => {
            let m = record_read(model, graph, origin, west, v.tag, ATTR_MINUEND);
            let s = record_read(model, graph, origin, east, v.tag, ATTR_SUBTRAHEND);
            let result = Value::literal(read_literal(m, 0) - read_literal(s, 0));
            record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, result);
        }
        Tag::Mul => {
            let l = record_read(model, graph, origin, west, v.tag, ATTR_MULTIPLIER);
            let r = record_read(model, graph, origin, east, v.tag, ATTR_MULTIPLICAND);
            let result = Value::literal(read_literal(l, 0) * read_literal(r, 0));
            record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, result);
        }
        Tag::Div => {
            let l = record_read(model, graph, origin, west, v.tag, ATTR_DIVIDEND);
            let r = record_read(model, graph, origin, east, v.tag, ATTR_DIVISOR);
            let divisor = read_literal(r, 0);
            if divisor != 0 {
                let result = Value::literal(read_literal(l, 0) / divisor);
                record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, result);
            }
        }
        Tag::Equal | Tag::Greater | Tag::Lesser => {
            let l = record_read(model, graph, origin, west, v.tag, ATTR_LEFT_COMPARATE);
            let r = record_read(model, graph, origin, east, v.tag, ATTR_RIGHT_COMPARATE);
            if l.is_literal() && r.is_literal() {
                let holds = match v.tag {
                    Tag::Equal => l.literal == r.literal,
                    Tag::Greater => l.literal > r.literal,
                    Tag::Lesser => l.literal < r.literal,
                    _ => unreachable!(),
                };
                if holds {
                    record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, Value::BANG);
                }
            }
        }
        Tag::And | Tag::Or => {
            let l = record_read(model, graph, origin, west, v.tag, ATTR_LEFT_CONJUNCT);
            let r = record_read(model, graph, origin, east, v.tag, ATTR_RIGHT_CONJUNCT);
            if l.is_literal() && r.is_literal() {
                let result = if v.tag == Tag::And {
                    l.literal & r.literal
                } else {
                    l.literal | r.literal
                };
                record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, Value::literal(result));
            } else {
                let fires = if v.tag == Tag::And {
                    !l.is_none() && !r.is_none()
                } else {
                    !l.is_none() || !r.is_none()
                };
                if fires {
                    record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, Value::BANG);
                }
            }
        }
        Tag::Alter => {
            let east1 = add_unit_vector(east, Direction::East);
            let min = record_read(model, graph, origin, east1, v.tag, ATTR_MINIMUM);
            let east2 = add_unit_vector(east1, Direction::East);
            let max = record_read(model, graph, origin, east2, v.tag, ATTR_MAXIMUM);
            let t = record_read(model, graph, origin, west, v.tag, ATTR_TIME);
            let t_lit = read_literal(t, 0);
            let min_lit = read_literal(min, 0);
            let max_lit = read_literal(max, 0);
            let result = ((RADIX - 1 - t_lit) * min_lit + t_lit * max_lit) / (RADIX - 1);
            record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, Value::literal(result));
        }
        Tag::Bottom | Tag::Top => {
            let l = record_read(model, graph, origin, west, v.tag, ATTR_LEFT_COMPARATE);
            let r = record_read(model, graph, origin, east, v.tag, ATTR_RIGHT_COMPARATE);
            let l_lit = read_literal(l, 0);
            let r_lit = read_literal(r, 0);
            let result = if v.tag == Tag::Bottom {
                l_lit.min(r_lit)
            } else {
                l_lit.max(r_lit)
            };
            record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, Value::literal(result));
        }
        Tag::Clock => {
            let rate = record_read(model, graph, origin, west, v.tag, ATTR_RATE);
            let modulus = record_read(model, graph, origin, east, v.tag, ATTR_INPUT);
            let period = (read_literal(rate, 0) + 1) as u64;
            if period != 0 && model.frame % period == 0 {
                let divisor = map_zero(modulus, RADIX);
                let result = ((model.frame / period) as i32) % divisor;
                record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, Value::literal(result));
            }
        }
        Tag::Delay => {
            let rate = record_read(model, graph, origin, west, v.tag, ATTR_RATE);
            let modulus = record_read(model, graph, origin, east, v.tag, ATTR_INPUT);
            let period = (read_literal(rate, 0) + 1) as u64;
            let divisor = map_zero(modulus, RADIX);
            let clock_value = if period == 0 { 0 } else { ((model.frame / period) as i32) % divisor };
            if clock_value == 0 {
                record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, Value::BANG);
            }
        }
        Tag::Hop => {
            let value = record_read(model, graph, origin, west, v.tag, ATTR_INPUT);
            record_write(model, graph, origin, east, v.tag, ATTR_OUTPUT, value);
        }
        Tag::Jump => {
            let value = record_read(model, graph, origin, north, v.tag, ATTR_INPUT);
            record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, value);
        }
        Tag::Interfere => {
            let west1 = west;
            let west2 = add_unit_vector(west1, Direction::West);
            let x = record_read(model, graph, origin, west2, v.tag, ATTR_X);
            let y = record_read(model, graph, origin, west1, v.tag, ATTR_Y);
            let payload = record_read(model, graph, origin, east, v.tag, ATTR_INPUT);
            if x.is_literal() && y.is_literal() {
                let target = Point::new(x.literal, y.literal + 1);
                record_write(model, graph, origin, target, v.tag, ATTR_OUTPUT, payload);
            }
        }
        Tag::Multiplex => {
            let east1 = east;
            let east2 = add_unit_vector(east1, Direction::East);
            let x = record_read(model, graph, origin, east1, v.tag, ATTR_X);
            let y = record_read(model, graph, origin, east2, v.tag, ATTR_Y);
            let x_lit = read_literal(x, 0);
            let y_lit = read_literal(y, 0);
            let source = Point::new(origin.x - (x_lit + 1), origin.y - y_lit);
            let value = record_read(model, graph, origin, source, v.tag, ATTR_INPUT);
            record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, value);
        }
        Tag::Note => {
            let idx = record_read(model, graph, origin, west, v.tag, ATTR_INPUT);
            let result = if idx.is_literal() {
                let degree = idx.literal;
                Value::literal(12 * (degree / 7) + SCALE[(degree % 7) as usize])
            } else {
                Value::NONE
            };
            record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, result);
        }
        Tag::Oddment => {
            let w = record_read(model, graph, origin, west, v.tag, ATTR_DIVIDEND);
            let e = record_read(model, graph, origin, east, v.tag, ATTR_DIVISOR);
            let result = if w.is_literal() {
                let divisor = map_zero(e, RADIX);
                Value::literal(w.literal % divisor)
            } else {
                Value::NONE
            };
            record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, result);
        }
        Tag::Quote => {
            let idx = record_read(model, graph, origin, west, v.tag, ATTR_INDEX);
            let result = if idx.is_literal() {
                quote_tag(idx.literal)
                    .map(|tag| Value::operator(tag).powered())
                    .unwrap_or(Value::NONE)
            } else {
                Value::NONE
            };
            record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, result);
        }
        Tag::Random => {
            let rate = record_read(model, graph, origin, west, v.tag, ATTR_RATE);
            let modulus = record_read(model, graph, origin, east, v.tag, ATTR_INPUT);
            if rate.is_literal() && modulus.is_literal() {
                let period = map_zero(rate, RADIX) as u64;
                if period != 0 && model.frame % period == 0 {
                    let divisor = map_zero(modulus, RADIX) as u32;
                    let drawn = model.rng.next_mod(divisor as u32) as i32;
                    record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, Value::literal(drawn));
                }
            }
        }
        Tag::Store => {
            let index = record_read(model, graph, origin, west, v.tag, ATTR_REGISTER);
            let payload = record_read(model, graph, origin, east, v.tag, ATTR_INPUT);
            if index.is_literal() {
                model.registers[index.literal as usize] = payload;
                graph.push(GraphEdge {
                    tag: GraphEdgeTag::Output,
                    origin,
                    target: origin,
                    cause: v.tag,
                    attribute: ATTR_REGISTER,
                });
            }
        }
        Tag::Load => {
            let index = record_read(model, graph, origin, west, v.tag, ATTR_REGISTER);
            let result = if index.is_literal() {
                model.registers[index.literal as usize]
            } else {
                Value::NONE
            };
            record_write(model, graph, origin, south, v.tag, ATTR_OUTPUT, result);
        }
        // SYNTH/SAMPLER/MIDI produce audio triggers, handled by the mixer
        // step walking the map after `step` returns; the interpreter itself
        // makes no map write for them.
        Tag::Sampler | Tag::Synth | Tag::Midi => {}
        // Reserved/unimplemented operator slots: inert.
        Tag::ReservedE
        | Tag::ReservedF
        | Tag::ReservedG
        | Tag::ReservedK
        | Tag::ReservedP
        | Tag::ReservedU
        | Tag::ReservedV
        | Tag::ReservedW => {}
        Tag::None | Tag::Literal | Tag::Bang => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (Model, Graph) {
        (Model::new(), Graph::new())
    }

    // S1 — Adder.
    #[test]
    fn adder_scenario() {
        let (mut m, mut g) = fresh();
        m.set(Point::new(4, 4), Value::literal(3));
        m.set(Point::new(5, 4), Value::operator(Tag::Add).powered());
        m.set(Point::new(6, 4), Value::literal(5));
        step(&mut m, &mut g);
        assert_eq!(m.get(Point::new(5, 5)), Value::literal(8));
        step(&mut m, &mut g);
        assert_eq!(m.get(Point::new(5, 5)), Value::literal(8));
    }

    // S2 — Clock period: rate=1 (period 2), mod=4; writes only land on
    // frames where `frame % period == 0`.
    #[test]
    fn clock_period_scenario() {
        let (mut m, mut g) = fresh();
        m.set(Point::new(1, 0), Value::operator(Tag::Clock).powered());
        m.set(Point::new(0, 0), Value::literal(1)); // rate
        m.set(Point::new(2, 0), Value::literal(4)); // mod
        for frame in 0..16u64 {
            step(&mut m, &mut g);
            if frame % 2 == 0 {
                let expected = (frame / 2) % 4;
                assert_eq!(m.get(Point::new(1, 1)), Value::literal(expected as i32));
            }
        }
    }

    // S3 — BANG fires unpowered operator.
    #[test]
    fn bang_fires_unpowered_operator() {
        let (mut m, mut g) = fresh();
        m.set(Point::new(2, 2), Value::operator(Tag::Add));
        m.set(Point::new(1, 2), Value::literal(2));
        m.set(Point::new(3, 2), Value::literal(2));
        m.set(Point::new(2, 1), Value::BANG);
        step(&mut m, &mut g);
        assert_eq!(m.get(Point::new(2, 3)), Value::literal(4));
        assert!(!m.get(Point::new(2, 1)).is_bang());
        assert!(m.get(Point::new(2, 2)).pulse);
    }

    #[test]
    fn bang_lifetime() {
        let (mut m, mut g) = fresh();
        m.set(Point::new(0, 0), Value::BANG);
        step(&mut m, &mut g);
        for row in m.map.iter() {
            for cell in row.iter() {
                assert!(!cell.is_bang());
            }
        }
    }

    #[test]
    fn literal_results_stay_in_radix() {
        let (mut m, mut g) = fresh();
        m.set(Point::new(5, 5), Value::operator(Tag::Mul).powered());
        m.set(Point::new(4, 5), Value::literal(35));
        m.set(Point::new(6, 5), Value::literal(35));
        step(&mut m, &mut g);
        let result = m.get(Point::new(5, 6));
        assert!(result.is_literal());
        assert!(result.literal >= 0 && result.literal < RADIX);
    }

    #[test]
    fn div_by_zero_skips_write() {
        let (mut m, mut g) = fresh();
        m.set(Point::new(5, 5), Value::operator(Tag::Div).powered());
        m.set(Point::new(4, 5), Value::literal(10));
        // east stays NONE -> divisor 0 -> no write
        step(&mut m, &mut g);
        assert_eq!(m.get(Point::new(5, 6)), Value::NONE);
    }

    #[test]
    fn and_requires_both_non_none_for_bang_fallback() {
        let (mut m, mut g) = fresh();
        m.set(Point::new(5, 5), Value::operator(Tag::And).powered());
        m.set(Point::new(4, 5), Value::BANG);
        // east stays NONE
        step(&mut m, &mut g);
        assert_eq!(m.get(Point::new(5, 6)), Value::NONE);
    }

    #[test]
    fn or_fires_with_one_non_none() {
        let (mut m, mut g) = fresh();
        m.set(Point::new(5, 5), Value::operator(Tag::Or).powered());
        m.set(Point::new(4, 5), Value::BANG);
        step(&mut m, &mut g);
        assert!(m.get(Point::new(5, 6)).is_bang());
    }

    #[test]
    fn out_of_bounds_write_is_dropped() {
        let (mut m, mut g) = fresh();
        m.set(Point::new(0, 0), Value::operator(Tag::Jump).powered());
        step(&mut m, &mut g);
        // north of (0,0) is out of bounds -> NONE copied south, nothing panics
        assert_eq!(m.get(Point::new(0, 1)), Value::NONE);
    }

    #[test]
    fn determinism_without_random() {
        let (mut m1, mut g1) = fresh();
        m1.set(Point::new(3, 3), Value::operator(Tag::Add).powered());
        m1.set(Point::new(2, 3), Value::literal(1));
        m1.set(Point::new(4, 3), Value::literal(2));
        let mut m2 = m1;
        let mut g2 = Graph::new();
        step(&mut m1, &mut g1);
        step(&mut m2, &mut g2);
        for y in 0..crate::model::HEIGHT {
            for x in 0..crate::model::WIDTH {
                assert_eq!(m1.map[y][x], m2.map[y][x]);
            }
        }
    }
}
