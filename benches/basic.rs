use chameleon_term::command::{parse, translate};
use chameleon_term::protocol::decode;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::time::Duration;

pub fn bench_line_to_frame(c: &mut Criterion) {
    let lines = ["hw version", "hf 14a raw 26 93 20 a1 b2", "data setslot 3", "hf mf rdbl 0"];
    c.bench_function("parse_translate_encode", |b| {
        b.iter(|| {
            for line in lines {
                let frame = parse(black_box(line))
                    .and_then(|command| translate(&command).ok())
                    .map(|command| command.to_frame());
                black_box(frame);
            }
        })
    });
}

pub fn bench_decode(c: &mut Criterion) {
    let reply = b"\x00ChameleonUltra v2.0 (build 1234)";
    c.bench_function("decode_reply", |b| {
        b.iter(|| black_box(decode(black_box(reply))))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(2));
    targets = bench_line_to_frame, bench_decode
}
criterion_main!(benches);
