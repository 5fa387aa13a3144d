use criterion::{black_box, criterion_group, criterion_main, Criterion};
use notesgen::markup::{compile, escape_html, tokenize};

fn make_doc(repeats: usize) -> String {
    let chunk = "# Section\n\nThe quick brown fox @1 + 1@ jumps over the lazy dog.\n\
                 Mail me @ home, not @work.\n\n@@\nlocal t = 0\nt + 1\n@@\n\n";
    chunk.repeat(repeats)
}

fn make_plain(repeats: usize) -> String {
    "The quick brown FOX jumps over the lazy dog. ".repeat(repeats)
}

fn bench_scan(c: &mut Criterion) {
    let doc_small = make_doc(10);
    let doc_large = make_doc(1000);
    let plain = make_plain(1000);

    let mut g = c.benchmark_group("tokenize");
    g.bench_function("snippets_small", |b| b.iter(|| tokenize(black_box(&doc_small))));
    g.bench_function("snippets_large", |b| b.iter(|| tokenize(black_box(&doc_large))));
    g.bench_function("plain_large", |b| b.iter(|| tokenize(black_box(&plain))));
    g.finish();

    // Compile without the evaluating extension: constructs render as source.
    let tree = tokenize(&doc_large);
    let mut g = c.benchmark_group("compile");
    g.bench_function("no_eval_large", |b| {
        b.iter(|| compile(black_box(&doc_large), black_box(&tree), &mut []))
    });
    g.finish();

    let markup = "<a href=\"x\">&'</a> ".repeat(1000);
    let mut g = c.benchmark_group("escape");
    g.bench_function("markup", |b| b.iter(|| escape_html(black_box(&markup))));
    g.bench_function("plain", |b| b.iter(|| escape_html(black_box(&plain))));
    g.finish();
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
