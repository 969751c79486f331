use boolret_core::Analyzer;
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_normalize(c: &mut Criterion) {
    let text = include_str!("../../sample_data/corpus.jsonl");
    let analyzer = Analyzer::default();
    c.bench_function("normalize_corpus", |b| b.iter(|| analyzer.normalize(text)));
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
