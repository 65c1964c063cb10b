//! Benchmarks for the CPU-bound probe stages.
//!
//! Run with: cargo bench -p shotprobe-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageFormat};
use shotprobe_core::config::{LimitsConfig, RemoteConfig};
use shotprobe_core::pipeline::resolver::scan_page;
use shotprobe_core::pipeline::{IdGenerator, Validator};
use std::io::Cursor;

const CAPTURE_PAGE: &str = r#"<!DOCTYPE html><html><head><title>Screenshot</title></head><body>
<div class="header"><img class="logo" src="/static/logo.svg"></div>
<div class="image-constrain js-image-wrap">
<img class="no-click screenshot-image" src="https://image.prntscr.com/image/abc123.png" crossorigin="anonymous" alt="Lightshot screenshot" id="screenshot-image" image-id="abc123">
</div></body></html>"#;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn benchmark_scan_page(c: &mut Criterion) {
    let prefixes = RemoteConfig::default().placeholder_prefixes;

    c.bench_function("scan_capture_page", |b| {
        b.iter(|| scan_page(black_box(CAPTURE_PAGE), &prefixes))
    });
}

fn benchmark_validate(c: &mut Criterion) {
    let validator = Validator::new(LimitsConfig::default());
    let bytes = png_bytes(1920, 1080);

    c.bench_function("validate_png_1080p", |b| {
        b.iter(|| {
            let _ = validator.validate("bench", black_box(&bytes), Some("image/png"));
        })
    });
}

fn benchmark_identifiers(c: &mut Criterion) {
    let mut ids = IdGenerator::from_seed(6, 42);

    c.bench_function("next_identifier", |b| b.iter(|| ids.next_id()));
}

criterion_group!(
    benches,
    benchmark_scan_page,
    benchmark_validate,
    benchmark_identifiers
);
criterion_main!(benches);
