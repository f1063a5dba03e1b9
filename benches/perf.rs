use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use golazo_terminal::capture::ImagePayload;
use golazo_terminal::gemini::{
    build_request_body, parse_report_response, parse_report_text, report_schema,
};

fn bench_report_schema_build(c: &mut Criterion) {
    c.bench_function("report_schema_build", |b| {
        b.iter(|| {
            let schema = report_schema();
            black_box(schema["required"].as_array().map(|a| a.len()));
        })
    });
}

fn bench_envelope_parse(c: &mut Criterion) {
    c.bench_function("envelope_parse", |b| {
        b.iter(|| {
            let report = parse_report_response(black_box(ENVELOPE_JSON)).unwrap();
            black_box(report.btts);
        })
    });
}

fn bench_report_parse(c: &mut Criterion) {
    c.bench_function("report_parse", |b| {
        b.iter(|| {
            let report = parse_report_text(black_box(REPORT_JSON)).unwrap();
            black_box(report.statistical_tips.len());
        })
    });
}

fn bench_request_body_build(c: &mut Criterion) {
    let payload = ImagePayload {
        data: "QUJD".repeat(60_000),
        mime: "image/png",
    };
    c.bench_function("request_body_build", |b| {
        b.iter(|| {
            let body = build_request_body(black_box(&payload));
            black_box(body["contents"].is_array());
        })
    });
}

criterion_group!(
    perf,
    bench_report_schema_build,
    bench_envelope_parse,
    bench_report_parse,
    bench_request_body_build
);
criterion_main!(perf);

static REPORT_JSON: &str = include_str!("../tests/fixtures/report.json");
static ENVELOPE_JSON: &str = include_str!("../tests/fixtures/gemini_envelope.json");
