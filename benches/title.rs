//! Benchmarks for title computation and edit dispatch.

use std::rc::Rc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use scratch_title::config::TitleConfig;
use scratch_title::editor::TextBuffer;
use scratch_title::prelude::*;
use scratch_title::title::truncate_title;

fn bench_first_row(c: &mut Criterion) {
    let editor = Editor::new("  a first row that is long enough to be truncated somewhere  \nbody");
    let config = TitleConfig::default();
    c.bench_function("title_first_row", |b| {
        b.iter(|| compute_title(black_box(&*editor), black_box(&config)))
    });
}

fn bench_scan_blank_prefix(c: &mut Criterion) {
    let text = format!("{}found it", "   \n".repeat(2_000));
    let editor = Editor::with_buffer(TextBuffer::from_text(&text));
    let config = TitleConfig {
        scan_for_first_row: true,
        ..TitleConfig::default()
    };
    c.bench_function("title_scan_blank_prefix", |b| {
        b.iter(|| compute_title(black_box(&*editor), black_box(&config)))
    });
}

fn bench_truncate(c: &mut Criterion) {
    let title = "ünïcödé ".repeat(20);
    c.bench_function("truncate_title", |b| {
        b.iter(|| truncate_title(black_box(&title), Some(40)))
    });
}

fn bench_typing(c: &mut Criterion) {
    let workspace = Rc::new(MemoryWorkspace::new());
    let store = Rc::new(MemoryConfigStore::with_defaults());
    let controller = FeatureController::new(
        Rc::clone(&workspace) as Rc<dyn Workspace>,
        Rc::clone(&store) as Rc<dyn ConfigStore>,
    );
    controller.activate();
    let editor = workspace.open_editor("title\n");
    editor.set_cursor(1, 0);
    c.bench_function("typing_below_first_row", |b| {
        b.iter(|| editor.insert_text(black_box("x")))
    });
}

criterion_group!(
    benches,
    bench_first_row,
    bench_scan_blank_prefix,
    bench_truncate,
    bench_typing
);
criterion_main!(benches);
