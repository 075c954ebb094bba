//! Cosine-similarity ranking of index candidates against a query vector.

use crate::config::SearchConfig;
use crate::document::ProductId;
use crate::index::InvertedIndex;
use crate::model::{VectorSpaceModel, NEUTRAL_FEATURE};
use crate::tokenizer::normalize;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredDoc {
    pub product_id: ProductId,
    pub score: f32,
}

pub struct Ranker<'a> {
    model: &'a VectorSpaceModel,
    index: &'a InvertedIndex,
    config: &'a SearchConfig,
}

impl<'a> Ranker<'a> {
    pub fn new(model: &'a VectorSpaceModel, index: &'a InvertedIndex, config: &'a SearchConfig) -> Self {
        Self { model, index, config }
    }

    /// Normalize `query_text` and rank the products sharing at least one term with it.
    pub fn rank(&self, query_text: &str) -> Vec<ScoredDoc> {
        let terms = normalize(query_text);
        tracing::debug!(?terms, "normalized query");
        self.rank_terms(&terms)
    }

    /// Rank candidates for already-normalized `terms`, best first; equal scores
    /// fall back to ascending product id.
    pub fn rank_terms(&self, terms: &[String]) -> Vec<ScoredDoc> {
        let Some(query) = self.query_vector(terms) else {
            return Vec::new();
        };
        let candidates: Vec<ProductId> = self.index.candidate_ids(terms).into_iter().collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let score = |id: ProductId| {
            self.model
                .vector_for(id)
                .ok()
                .map(|doc| ScoredDoc { product_id: id, score: cosine_similarity(&query, doc) })
        };
        let mut scored: Vec<ScoredDoc> =
            if self.config.parallel && candidates.len() >= self.config.parallel_threshold {
                candidates.par_iter().filter_map(|&id| score(id)).collect()
            } else {
                candidates.iter().filter_map(|&id| score(id)).collect()
            };
        sort_ranking(&mut scored);
        tracing::debug!(candidates = scored.len(), "ranked");
        scored
    }

    /// Query vector in document space: raw counts over the query length times
    /// idf for known terms, and [`NEUTRAL_FEATURE`] in every feature column.
    /// `None` for an empty query.
    pub fn query_vector(&self, terms: &[String]) -> Option<Vec<f32>> {
        if terms.is_empty() {
            return None;
        }
        let vocab = self.model.vocabulary_size();
        let mut vec = vec![0.0f32; self.model.dimension()];
        for term in terms {
            if let Some(tid) = self.model.term_id(term) {
                vec[tid as usize] += 1.0;
            }
        }
        let len = terms.len() as f32;
        for (tid, w) in vec[..vocab].iter_mut().enumerate() {
            if *w > 0.0 {
                *w = *w / len * self.model.idf_by_id(tid as u32);
            }
        }
        vec[vocab..].fill(NEUTRAL_FEATURE);
        Some(vec)
    }
}

/// `dot(a, b) / (|a| * |b|)`, or 0 when either vector is all zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

pub(crate) fn sort_ranking(scored: &mut [ScoredDoc]) {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let s = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 1.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn cosine_ignores_positive_scaling() {
        let q = [0.4, 0.0, 1.0, 1.0];
        let d = [0.2, 0.7, 1.3, 1.1];
        let scaled: Vec<f32> = d.iter().map(|x| x * 3.5).collect();
        assert!((cosine_similarity(&q, &d) - cosine_similarity(&q, &scaled)).abs() < 1e-6);
    }

    #[test]
    fn ties_break_on_ascending_id() {
        let mut v = vec![
            ScoredDoc { product_id: 9, score: 0.5 },
            ScoredDoc { product_id: 3, score: 0.5 },
            ScoredDoc { product_id: 7, score: 0.9 },
        ];
        sort_ranking(&mut v);
        let ids: Vec<_> = v.iter().map(|s| s.product_id).collect();
        assert_eq!(ids, vec![7, 3, 9]);
    }
}
