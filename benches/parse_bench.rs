use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fluxline::LineProtocolParser;

fn build_payload(lines: usize) -> String {
    let mut payload = String::new();
    for i in 0..lines {
        payload.push_str(&format!(
            "weather,location=us-midwest,station=kord-{} temperature={},humidity={}i 146583983010040020{}\n",
            i % 50,
            80 + (i % 10),
            40 + (i % 20),
            i % 10,
        ));
    }
    payload
}

pub fn parse_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for lines in [100, 1_000, 10_000].iter() {
        let payload = build_payload(*lines);
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(lines),
            &payload,
            |b, payload| {
                b.iter(|| LineProtocolParser::new(black_box(payload)).count());
            },
        );
    }
    group.finish();
}

pub fn serialize_benchmark(c: &mut Criterion) {
    let payload = build_payload(1_000);
    let points: Vec<_> = LineProtocolParser::new(&payload).collect();

    let mut group = c.benchmark_group("serialize");
    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("canonical", |b| {
        b.iter(|| {
            for point in &points {
                black_box(point.to_string());
            }
        })
    });
    group.finish();
}

criterion_group!(benches, parse_benchmark, serialize_benchmark);
criterion_main!(benches);
