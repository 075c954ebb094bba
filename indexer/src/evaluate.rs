//! Replays historical (query, product, page, position) rows against the index
//! and reports how far each product lands from where it was observed.

use crate::dataset::DatasetRow;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use vitrine_core::{ProductId, SearchIndex};

/// Products shown per page of the historical search results.
pub const PAGE_SIZE: usize = 38;
const PROGRESS_EVERY: usize = 25;

#[derive(Debug, Clone, PartialEq)]
pub struct EvalCase {
    pub product_id: ProductId,
    pub query: String,
    pub expected_position: usize,
}

impl EvalCase {
    /// Rows without a query, page or position are not replayable.
    pub fn from_row(row: &DatasetRow) -> Option<Self> {
        let query = row.query.as_ref()?.trim();
        if query.is_empty() {
            return None;
        }
        Some(Self {
            product_id: row.product_id,
            query: query.to_string(),
            expected_position: expected_position(row.search_page?, row.position?),
        })
    }
}

/// Absolute position across pages: `position + (search_page - 1) * 38 + 1`.
pub fn expected_position(search_page: u32, position: u32) -> usize {
    position as usize + (search_page.saturating_sub(1) as usize) * PAGE_SIZE + 1
}

/// Distance between the expected position and the product's index in our
/// ranking, or `limit` when the product is not ranked at all.
pub fn query_error(index: &SearchIndex, case: &EvalCase, limit: usize) -> usize {
    let ranking = index.search_scored(&case.query, limit, &[]);
    match ranking.iter().position(|s| s.product_id == case.product_id) {
        Some(found) => case.expected_position.abs_diff(found),
        None => limit,
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub errors: Vec<usize>,
    pub mse: f64,
    pub rmse: f64,
    pub std_dev: f64,
}

pub fn summarize(errors: Vec<usize>) -> Report {
    if errors.is_empty() {
        return Report { errors, mse: 0.0, rmse: 0.0, std_dev: 0.0 };
    }
    let n = errors.len() as f64;
    let mean = errors.iter().map(|&e| e as f64).sum::<f64>() / n;
    let mse = errors.iter().map(|&e| (e as f64).powi(2)).sum::<f64>() / n;
    let variance = errors.iter().map(|&e| (e as f64 - mean).powi(2)).sum::<f64>() / n;
    Report { errors, mse, rmse: mse.sqrt(), std_dev: variance.sqrt() }
}

/// Sample `num_queries` cases with replacement using a seeded generator and
/// score each one.
pub fn run(index: &SearchIndex, cases: &[EvalCase], num_queries: usize, seed: u64, limit: usize) -> Result<Report> {
    if cases.is_empty() {
        anyhow::bail!("dataset has no rows with query, search_page and position");
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut errors = Vec::with_capacity(num_queries);
    for i in 0..num_queries {
        let case = &cases[rng.gen_range(0..cases.len())];
        errors.push(query_error(index, case, limit));
        if (i + 1) % PROGRESS_EVERY == 0 {
            tracing::info!(done = i + 1, total = num_queries, "evaluating");
        }
    }
    Ok(summarize(errors))
}

/// Equal-width buckets over `[0, max]` as `(low, high, count)`.
pub fn histogram(errors: &[usize], bins: usize) -> Vec<(usize, usize, usize)> {
    let Some(&max) = errors.iter().max() else { return Vec::new() };
    let bins = bins.max(1);
    let width = (max / bins + 1).max(1);
    let mut counts = vec![0usize; bins];
    for &e in errors {
        counts[(e / width).min(bins - 1)] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| (i * width, (i + 1) * width - 1, c))
        .collect()
}

pub fn render(report: &Report, bins: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "queries: {}", report.errors.len());
    let _ = writeln!(out, "rmse:    {:.3}", report.rmse);
    let _ = writeln!(out, "std dev: {:.3}", report.std_dev);
    let buckets = histogram(&report.errors, bins);
    let tallest = buckets.iter().map(|b| b.2).max().unwrap_or(0).max(1);
    for (lo, hi, count) in buckets {
        let bar = "#".repeat(count * 40 / tallest);
        let _ = writeln!(out, "{lo:>6}-{hi:<6} {count:>5} {bar}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_core::{Document, SearchConfig};

    #[test]
    fn position_spans_pages() {
        assert_eq!(expected_position(1, 0), 1);
        assert_eq!(expected_position(1, 5), 6);
        assert_eq!(expected_position(2, 0), 39);
    }

    #[test]
    fn summary_statistics() {
        let report = summarize(vec![3, 4]);
        assert!((report.mse - 12.5).abs() < 1e-9);
        assert!((report.rmse - 12.5f64.sqrt()).abs() < 1e-9);
        assert!((report.std_dev - 0.5).abs() < 1e-9);
    }

    #[test]
    fn histogram_counts_everything() {
        let errors = vec![0, 1, 5, 9, 10, 1000];
        let buckets = histogram(&errors, 4);
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets.iter().map(|b| b.2).sum::<usize>(), errors.len());
        assert!(histogram(&[], 4).is_empty());
    }

    #[test]
    fn missing_product_costs_the_limit() {
        let docs = vec![Document::new(1, "caneca azul"), Document::new(2, "caneca verde"), Document::new(3, "vaso")];
        let index = SearchIndex::build(docs, SearchConfig::default()).unwrap();
        let case = EvalCase { product_id: 3, query: "caneca".into(), expected_position: 1 };
        assert_eq!(query_error(&index, &case, 1000), 1000);

        let found = EvalCase { product_id: 1, query: "caneca azul".into(), expected_position: 1 };
        assert_eq!(query_error(&index, &found, 1000), 1);
    }

    #[test]
    fn seeded_runs_repeat() {
        let docs = vec![Document::new(1, "caneca azul"), Document::new(2, "vaso de barro")];
        let index = SearchIndex::build(docs, SearchConfig::default()).unwrap();
        let cases = vec![
            EvalCase { product_id: 1, query: "caneca".into(), expected_position: 3 },
            EvalCase { product_id: 2, query: "vaso".into(), expected_position: 1 },
        ];
        let a = run(&index, &cases, 10, 7, 1000).unwrap();
        let b = run(&index, &cases, 10, 7, 1000).unwrap();
        assert_eq!(a.errors, b.errors);
        assert!(run(&index, &[], 10, 7, 1000).is_err());
    }
}
