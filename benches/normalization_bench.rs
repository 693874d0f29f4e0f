//! Normalizer throughput benchmarks.
//!
//! Every ingested payload goes through the normalizer before routing, so it
//! sits on the hot path of the dispatcher task.
//!
//! # Groups
//!
//! | Group | What it measures |
//! |-------|-----------------|
//! | `json` | Compact, nested, and wide structured lines |
//! | `recognizers` | One line per built-in third-party shape, plus a miss |
//! | `mixed_corpus` | A multi-line payload mixing all of the above |
//!
//! # Viewing results
//!
//! ```sh
//! cargo bench --bench normalization_bench
//! open target/criterion/report/index.html
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pando_core::Normalizer;
use std::hint::black_box;

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn json_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("json");
    let normalizer = Normalizer::default();

    let compact = r#"{"level":"info","message":"ok"}"#.to_string();
    let nested = r#"{"level":"error","message":{"request":{"id":"abc","path":"/api"},"user":{"id":42}}}"#
        .to_string();
    let wide = {
        let mut obj = serde_json::Map::new();
        for i in 0..50usize {
            obj.insert(format!("field_{i}"), format!("value_{i}").into());
        }
        serde_json::Value::Object(obj).to_string()
    };

    group.throughput(Throughput::Elements(1));
    for (name, line) in [("compact", &compact), ("nested", &nested), ("wide_rendered", &wide)] {
        group.bench_with_input(BenchmarkId::new(name, ""), line, |b, line| {
            b.iter(|| normalizer.normalize(black_box(line)))
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Recognizer chain
// ---------------------------------------------------------------------------

fn recognizer_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("recognizers");
    let normalizer = Normalizer::default();

    let lines = [
        ("bracketed_timestamp", "[2024-01-15T10:00:03Z] WARN: Disk usage at 92%"),
        ("env_logger", "[2024-01-15T10:00:00Z INFO  my_crate::net] listening on 0.0.0.0:80"),
        ("tracing_fmt", "2024-01-15T10:00:00.123456Z  WARN pando::hub: queue is full"),
        ("timestamp_level", "2024-01-15 10:00:01 ERROR Failed to connect"),
        ("nginx_error", "2024/01/15 10:00:00 [crit] 1234#0: *1 connect() failed"),
        ("logback", "10:00:05.123 [main] DEBUG o.s.w.s.DispatcherServlet - Initializing"),
        ("logfmt", "ts=2024-01-15T10:00:00Z level=info msg=\"Server started\" port=8080"),
        ("level_prefix", "ERROR: NullPointerException"),
        ("unclaimed", "GET /api/v1/users 200 47ms"),
    ];

    group.throughput(Throughput::Elements(1));
    for (name, line) in lines {
        group.bench_with_input(BenchmarkId::new(name, ""), line, |b, line| {
            b.iter(|| normalizer.normalize_line(black_box(line)))
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Mixed corpus
// ---------------------------------------------------------------------------

fn mixed_corpus_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_corpus");
    let normalizer = Normalizer::default();

    let shapes = [
        r#"{"level":"warn","message":"slow query"}"#,
        "level=error msg=\"connection refused\" host=db",
        "2024-01-15 10:00:01 INFO request served",
        "plain text without any severity",
    ];
    for rows in [4usize, 64, 1024] {
        let payload: Vec<&str> = shapes.iter().copied().cycle().take(rows).collect();
        let payload = payload.join("\n");
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &payload, |b, payload| {
            b.iter(|| normalizer.normalize(black_box(payload)))
        });
    }
    group.finish();
}

criterion_group!(benches, json_bench, recognizer_bench, mixed_corpus_bench);
criterion_main!(benches);
