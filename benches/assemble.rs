//! Benchmarks for package assembly.
//!
//! Run with: cargo bench

use std::io::Cursor;

use criterion::{Criterion, criterion_group, criterion_main};

use tsuzuri::convert::image_section_lines;
use tsuzuri::{BookInfo, EpubAssembler, EpubConfig, Error, ImageSource, TextConverter};

/// A synthetic book: `sections` sections of `paragraphs` lines each, with a
/// heading at the top of every section.
fn sample_text(sections: usize, paragraphs: usize) -> String {
    let mut text = String::new();
    for s in 0..sections {
        if s > 0 {
            text.push_str("［＃改ページ］\n");
        }
        text.push_str(&format!("第{s}章［＃「第{s}章」は中見出し］\n"));
        for p in 0..paragraphs {
            text.push_str(&format!("吾輩は猫である。名前はまだ無い。{p}\n"));
        }
    }
    text
}

fn assemble(text: &str, book: &BookInfo, config: EpubConfig) -> Vec<u8> {
    let mut diagnostics: Vec<Error> = Vec::new();
    let (_, output) = EpubAssembler::new()
        .with_config(config)
        .assemble_to_writer(
            &mut TextConverter::new(),
            &mut Cursor::new(text.as_bytes()),
            &ImageSource::Directory(".".into()),
            Cursor::new(Vec::new()),
            book,
            &mut diagnostics,
        )
        .unwrap();
    output.into_inner()
}

// ============================================================================
// Assembly
// ============================================================================

fn bench_assemble_small(c: &mut Criterion) {
    let text = sample_text(10, 50);
    let book = BookInfo::new("T", "C");

    c.bench_function("assemble_small", |b| {
        b.iter(|| assemble(&text, &book, EpubConfig::default()));
    });
}

fn bench_assemble_many_sections(c: &mut Criterion) {
    let text = sample_text(500, 5);
    let book = BookInfo::new("T", "C");

    c.bench_function("assemble_many_sections", |b| {
        b.iter(|| assemble(&text, &book, EpubConfig::default()));
    });
}

fn bench_assemble_fast_deflate(c: &mut Criterion) {
    let text = sample_text(10, 2000);
    let book = BookInfo::new("T", "C");
    let config = EpubConfig {
        compression_level: Some(1),
        ..EpubConfig::default()
    };

    c.bench_function("assemble_fast_deflate", |b| {
        b.iter(|| assemble(&text, &book, config.clone()));
    });
}

// ============================================================================
// Pre-scan
// ============================================================================

fn bench_image_section_lines(c: &mut Criterion) {
    let text = sample_text(500, 20);

    c.bench_function("image_section_lines", |b| {
        b.iter(|| image_section_lines(&text));
    });
}

criterion_group!(
    benches,
    bench_assemble_small,
    bench_assemble_many_sections,
    bench_assemble_fast_deflate,
    bench_image_section_lines,
);
criterion_main!(benches);
