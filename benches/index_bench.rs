use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use wiki_tfidf::{
    CorpusIndex, DocumentNormalizer, DocumentRecord, ExtractedPage, LemmaDictionary, StopwordFilter,
};

const PARAGRAPH: &str = "Evolution is change in the heritable characteristics of biological \
    populations over successive generations. Evolutionary processes give rise to biodiversity \
    at every level of biological organisation, including species, individual organisms and \
    molecules such as DNA and proteins. ";

fn normalizer() -> DocumentNormalizer {
    let lemmas = LemmaDictionary::from_pairs([
        ("population", "populations"),
        ("generation", "generations"),
        ("organism", "organisms"),
        ("molecule", "molecules"),
        ("protein", "proteins"),
    ]);
    DocumentNormalizer::new(Arc::new(lemmas), Arc::new(StopwordFilter::default()))
}

// Tokenize, filter and lemmatize text of growing size
fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    let normalizer = normalizer();

    for paragraphs in [1, 10, 100] {
        let text = PARAGRAPH.repeat(paragraphs);
        group.bench_with_input(BenchmarkId::from_parameter(paragraphs), &text, |b, text| {
            b.iter(|| black_box(normalizer.normalize(text)));
        });
    }

    group.finish();
}

// One transactional document commit against an in-memory corpus of growing size
fn bench_add_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_document");
    let normalizer = normalizer();
    let keywords = normalizer.normalize(PARAGRAPH);

    for corpus_size in [10, 100, 1000] {
        let index = CorpusIndex::open_in_memory().unwrap();
        for i in 0..corpus_size {
            let record = DocumentRecord::new(
                ExtractedPage::default(),
                format!("https://en.wikipedia.org/wiki/Seed_{}", i),
                keywords.clone(),
            );
            index.add_document(&record).unwrap();
        }

        let mut next = 0u64;
        group.bench_with_input(BenchmarkId::from_parameter(corpus_size), &corpus_size, |b, _| {
            b.iter(|| {
                next += 1;
                let record = DocumentRecord::new(
                    ExtractedPage::default(),
                    format!("https://en.wikipedia.org/wiki/Bench_{}", next),
                    keywords.clone(),
                );
                black_box(index.add_document(&record).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_recompute(c: &mut Criterion) {
    let normalizer = normalizer();
    let keywords = normalizer.normalize(PARAGRAPH);
    let index = CorpusIndex::open_in_memory().unwrap();
    for i in 0..500 {
        let record = DocumentRecord::new(
            ExtractedPage::default(),
            format!("https://en.wikipedia.org/wiki/Doc_{}", i),
            keywords.clone(),
        );
        index.add_document(&record).unwrap();
    }

    c.bench_function("recompute_all_tfidf_500_docs", |b| {
        b.iter(|| black_box(index.recompute_all_tfidf().unwrap()));
    });
}

criterion_group!(benches, bench_normalize, bench_add_document, bench_recompute);
criterion_main!(benches);
