use criterion::{criterion_group, criterion_main, Criterion};
use vitrine_core::tokenizer::normalize;
use vitrine_core::{Document, SearchConfig, SearchIndex};

const TITLES: &[&str] = &[
    "Kit 10 lembrancinhas maternidade personalizadas",
    "Bolsa de crochê com alça de bambu",
    "Tapete de barbante 1,20m para sala",
    "Mandala de crochê 40cm decoração",
    "Caneca de porcelana personalizada 325ml",
    "Topo de bolo aniversário 1 ano",
];

fn bench_normalize(c: &mut Criterion) {
    let text = TITLES.join(" ");
    c.bench_function("normalize_titles", |b| b.iter(|| normalize(&text)));
}

fn bench_search(c: &mut Criterion) {
    let docs = (0..2000u64).map(|i| {
        let mut d = Document::new(i, TITLES[i as usize % TITLES.len()]);
        d.concatenated_tags = Some(format!("tag{} presente {}", i % 97, i % 13));
        d.view_counts = Some((i % 500) as f64);
        d
    });
    let idx = SearchIndex::build(docs, SearchConfig::default()).expect("bench corpus builds");
    let none: [(&str, &str); 0] = [];
    c.bench_function("search_croche", |b| b.iter(|| idx.search("bolsa de crochê", 10, none)));
}

criterion_group!(benches, bench_normalize, bench_search);
criterion_main!(benches);
