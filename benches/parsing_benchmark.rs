use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vedirect_bridge::vedirect::codec::parse_int;
use vedirect_bridge::vedirect::frame::{DecodeEvent, FrameDecoder};
use vedirect_bridge::vedirect::{FieldRegistry, BMV_FIELDS};

const BMV_LINES: [&str; 17] = [
    "PID\t0xA381",
    "V\t12488",
    "VS\t12950",
    "I\t-1500",
    "P\t-19",
    "CE\t-22830",
    "SOC\t912",
    "TTG\t2881",
    "Alarm\tOFF",
    "Relay\tOFF",
    "AR\t0",
    "BMV\t712 Smart",
    "FW\t0413",
    "MON\t0",
    "H1\t-277191",
    "H2\t-22830",
    "T\t21",
];

fn bmv_frame() -> Vec<u8> {
    let mut frame = Vec::new();
    for line in BMV_LINES {
        frame.extend_from_slice(b"\r\n");
        frame.extend_from_slice(line.as_bytes());
    }
    frame.extend_from_slice(b"\r\nChecksum\t");
    let sum = frame.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    frame.push(0u8.wrapping_sub(sum));
    frame
}

fn benchmark_decode_frame(c: &mut Criterion) {
    let data = bmv_frame();

    c.bench_function("decode_frame", |b| {
        let mut decoder = FrameDecoder::default();
        b.iter(|| {
            for &byte in black_box(&data) {
                black_box(decoder.process_byte(byte));
            }
        })
    });
}

fn benchmark_decode_and_load(c: &mut Criterion) {
    let data = bmv_frame();

    c.bench_function("decode_and_load", |b| {
        let mut decoder = FrameDecoder::default();
        let mut registry = FieldRegistry::new(&BMV_FIELDS);
        b.iter(|| {
            for &byte in black_box(&data) {
                match decoder.process_byte(byte) {
                    DecodeEvent::LineReady(line) => {
                        registry.load_key_value(&line, 1);
                    }
                    DecodeEvent::FrameComplete(_) => registry.reset(),
                    DecodeEvent::Continue => {}
                }
            }
        })
    });
}

fn benchmark_parse_int(c: &mut Criterion) {
    c.bench_function("parse_int", |b| {
        b.iter(|| {
            black_box(parse_int(black_box("-277191")));
            black_box(parse_int(black_box("0xA381")));
            black_box(parse_int(black_box("---")));
        })
    });
}

criterion_group!(
    benches,
    benchmark_decode_frame,
    benchmark_decode_and_load,
    benchmark_parse_int
);
criterion_main!(benches);
