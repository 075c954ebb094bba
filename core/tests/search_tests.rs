use std::collections::HashMap;
use vitrine_core::filter::{self, parse_predicates};
use vitrine_core::tokenizer::normalize;
use vitrine_core::{cosine_similarity, Document, ProductId, SearchConfig, SearchIndex};

fn no_filters() -> Vec<(&'static str, &'static str)> {
    Vec::new()
}

fn furniture() -> SearchIndex {
    let docs = vec![
        Document::new(1, "red chair"),
        Document::new(2, "blue chair"),
        Document::new(3, "red table"),
    ];
    SearchIndex::build(docs, SearchConfig::default()).unwrap()
}

fn crafts() -> Vec<Document> {
    let rows: [(ProductId, &str, &str, f64, Option<f64>); 6] = [
        (11, "Bolsa de croche", "bolsa croche praia", 89.9, Some(30.0)),
        (12, "Bolsa de couro", "bolsa couro", 257.65, Some(500.0)),
        (13, "Tapete de barbante", "tapete sala croche", 150.0, Some(1800.0)),
        (14, "Mandala de croche", "mandala decoracao parede", 45.0, Some(80.0)),
        (15, "Lembrancinha maternidade", "lembrancinha bebe", 3.5, None),
        (16, "", "", 10.0, None),
    ];
    rows.into_iter()
        .map(|(id, title, tags, price, weight)| {
            let mut d = Document::new(id, title);
            d.concatenated_tags = Some(tags.to_string());
            d.price = price;
            d.weight = weight;
            d.view_counts = Some(id as f64 * 10.0);
            d.order_counts = Some((id % 3) as f64);
            d.category = if id % 2 == 0 { "Bolsas".into() } else { "Decoração".into() };
            d
        })
        .collect()
}

#[test]
fn red_query_ranks_only_red_documents() {
    let idx = furniture();
    let hits = idx.search("red", 10, no_filters()).unwrap();
    assert_eq!(hits.len(), 2);
    let mut sorted = hits.clone();
    sorted.sort();
    assert_eq!(sorted, vec![1, 3]);
}

#[test]
fn out_of_vocabulary_query_is_empty() {
    let idx = furniture();
    assert!(idx.search("sofa lampada", 10, no_filters()).unwrap().is_empty());
}

#[test]
fn vectors_span_vocabulary_plus_features() {
    let idx = SearchIndex::build(crafts(), SearchConfig::default()).unwrap();
    for id in [11, 12, 13, 14, 15, 16] {
        assert_eq!(idx.vector_for(id).unwrap().len(), idx.vocabulary_size() + idx.feature_count());
    }
    assert_eq!(idx.document_count(), 6);
    assert_eq!(idx.feature_count(), 2);
}

#[test]
fn idf_is_at_least_one_and_falls_with_df() {
    let idx = SearchIndex::build(crafts(), SearchConfig::default()).unwrap();
    let model = idx.model();
    for term in model.vocabulary() {
        assert!(model.idf(term) >= 1.0, "{term}");
    }
    let croche = model.idf(&normalize("croche")[0]); // df = 3
    let bolsa = model.idf(&normalize("bolsa")[0]); // df = 2
    let mandala = model.idf(&normalize("mandala")[0]); // df = 1
    assert!(croche < bolsa && bolsa < mandala);
    assert!((mandala - (1.0 + 6.0f32.ln())).abs() < 1e-5);
}

#[test]
fn every_titled_document_is_a_candidate_for_its_title() {
    let docs = crafts();
    let idx = SearchIndex::build(docs.clone(), SearchConfig::default()).unwrap();
    for doc in docs.iter().filter(|d| d.title.as_deref().is_some_and(|t| !normalize(t).is_empty())) {
        let title = doc.title.as_deref().unwrap();
        assert!(idx.candidates_for_text(title).contains(&doc.product_id), "{title}");
    }
}

#[test]
fn textless_document_is_never_a_lexical_hit() {
    let idx = SearchIndex::build(crafts(), SearchConfig::default()).unwrap();
    let hits = idx.search("bolsa croche tapete mandala lembrancinha", 100, no_filters()).unwrap();
    assert!(!hits.contains(&16));
    assert_eq!(idx.browse(100, &parse_predicates([("price_max", "10")]).unwrap()), vec![15, 16]);
}

#[test]
fn price_max_drops_expensive_items_and_keeps_order() {
    let idx = SearchIndex::build(crafts(), SearchConfig::default()).unwrap();
    let unfiltered = idx.search("croche", 10, no_filters()).unwrap();
    assert!(unfiltered.contains(&13));
    let filtered = idx.search("croche", 10, [("price_max", "100")]).unwrap();
    let expected: Vec<ProductId> = unfiltered.iter().copied().filter(|&id| id != 13).collect();
    assert_eq!(filtered, expected);
}

#[test]
fn filter_preserves_relative_order() {
    let mut docs = HashMap::new();
    for (id, price) in [(1, 150.0), (2, 20.0), (3, 99.0)] {
        let mut d = Document::new(id, "x");
        d.price = price;
        docs.insert(id, d);
    }
    let preds = parse_predicates([("price_max", "100")]).unwrap();
    let ranking: Vec<ProductId> = vec![3, 1, 2];
    assert_eq!(filter::apply(ranking, &preds, &docs), vec![3, 2]);
}

#[test]
fn malformed_predicate_surfaces_an_error() {
    let idx = furniture();
    assert!(idx.search("red", 10, [("price_min", "barato")]).is_err());
    // Unknown keys are a no-op.
    assert_eq!(idx.search("red", 10, [("cor", "azul")]).unwrap().len(), 2);
}

#[test]
fn scaling_a_document_vector_keeps_its_score() {
    let idx = SearchIndex::build(crafts(), SearchConfig::default()).unwrap();
    let terms = normalize("bolsa croche");
    let query = idx.ranker().query_vector(&terms).unwrap();
    let doc = idx.vector_for(11).unwrap();
    let scaled: Vec<f32> = doc.iter().map(|x| x * 7.0).collect();
    assert!((cosine_similarity(&query, doc) - cosine_similarity(&query, &scaled)).abs() < 1e-6);
}

#[test]
fn query_vector_has_neutral_features() {
    let idx = furniture();
    let terms = normalize("red red blue sofa");
    let query = idx.ranker().query_vector(&terms).unwrap();
    let vocab = idx.vocabulary_size();
    assert_eq!(&query[vocab..], &[1.0, 1.0]);
    let red = idx.model().term_id(&normalize("red")[0]).unwrap() as usize;
    let expected = 2.0 / 4.0 * idx.model().idf(&normalize("red")[0]);
    assert!((query[red] - expected).abs() < 1e-6);
}

#[test]
fn parallel_scoring_matches_sequential() {
    let sequential = SearchIndex::build(crafts(), SearchConfig::default()).unwrap();
    let parallel_config = SearchConfig { parallel: true, parallel_threshold: 1, ..SearchConfig::default() };
    let parallel = SearchIndex::build(crafts(), parallel_config).unwrap();
    for q in ["croche", "bolsa couro", "tapete sala decoracao"] {
        assert_eq!(
            sequential.search(q, 10, no_filters()).unwrap(),
            parallel.search(q, 10, no_filters()).unwrap(),
            "{q}"
        );
    }
}

#[test]
fn rankings_are_reproducible() {
    let idx = furniture();
    let first = idx.search("chair", 10, no_filters()).unwrap();
    for _ in 0..5 {
        assert_eq!(idx.search("chair", 10, no_filters()).unwrap(), first);
    }
}
