//! TF-IDF vector space over the vocabulary, with normalized non-textual
//! feature columns appended to every document row.
//!
//! Row `i` of the matrix belongs to `doc_ids[i]`; column `j < V` to
//! `vocabulary[j]`; the last [`FEATURE_COUNT`] columns hold the features.

use crate::document::{Document, ProductId};
use crate::error::{Error, Result};
use crate::index::TermId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Non-textual signals appended to each document vector, in column order.
pub const FEATURES: [&str; 2] = ["view_counts", "order_counts"];
pub const FEATURE_COUNT: usize = FEATURES.len();

/// Weight of every feature column in a query vector.
pub const NEUTRAL_FEATURE: f32 = 1.0;

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl DenseMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: vec![0.0; rows * cols] }
    }

    pub fn rows(&self) -> usize { self.rows }
    pub fn cols(&self) -> usize { self.cols }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    fn row_mut(&mut self, i: usize) -> &mut [f32] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    fn check_shape(&self) -> Result<()> {
        if self.data.len() != self.rows * self.cols {
            return Err(Error::invalid(format!(
                "matrix holds {} values, expected {} x {}",
                self.data.len(),
                self.rows,
                self.cols
            )));
        }
        Ok(())
    }
}

/// Length-normalized term frequencies of one document, sorted by term id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub entries: Vec<(TermId, f32)>,
}

impl SparseVector {
    pub fn get(&self, term: TermId) -> Option<f32> {
        self.entries
            .binary_search_by_key(&term, |&(t, _)| t)
            .ok()
            .map(|i| self.entries[i].1)
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// `1 + value / max(value)` per feature; missing values count as 0 and a zero
/// corpus maximum leaves the column at 1.
pub fn feature_columns(documents: &[Document]) -> Vec<[f32; FEATURE_COUNT]> {
    let raw = |d: &Document| -> [f64; FEATURE_COUNT] {
        [
            d.view_counts.filter(|v| v.is_finite()).unwrap_or(0.0),
            d.order_counts.filter(|v| v.is_finite()).unwrap_or(0.0),
        ]
    };
    let mut max = [0.0f64; FEATURE_COUNT];
    for d in documents {
        for (m, v) in max.iter_mut().zip(raw(d)) {
            *m = m.max(v);
        }
    }
    documents
        .iter()
        .map(|d| {
            let mut out = [NEUTRAL_FEATURE; FEATURE_COUNT];
            for ((o, v), m) in out.iter_mut().zip(raw(d)).zip(max) {
                if m > 0.0 {
                    *o = (1.0 + v / m) as f32;
                }
            }
            out
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct VectorSpaceModel {
    vocabulary: Vec<String>,
    word_idx: HashMap<String, TermId>,
    doc_ids: Vec<ProductId>,
    doc_idx: HashMap<ProductId, usize>,
    idf: Vec<f32>,
    term_freq: Vec<SparseVector>,
    matrix: DenseMatrix,
}

impl VectorSpaceModel {
    /// Materialize the dense matrix. `idf` is indexed by term id, `term_freq`
    /// and `features` by document row.
    pub(crate) fn assemble(
        vocabulary: Vec<String>,
        doc_ids: Vec<ProductId>,
        idf: Vec<f32>,
        term_freq: Vec<SparseVector>,
        features: &[[f32; FEATURE_COUNT]],
    ) -> Self {
        let vocab = vocabulary.len();
        let mut matrix = DenseMatrix::zeros(doc_ids.len(), vocab + FEATURE_COUNT);
        for (row, (tf, feats)) in term_freq.iter().zip(features).enumerate() {
            let out = matrix.row_mut(row);
            for &(term, freq) in &tf.entries {
                out[term as usize] = freq * idf[term as usize];
            }
            out[vocab..].copy_from_slice(feats);
        }
        let word_idx = vocabulary
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as TermId))
            .collect();
        let doc_idx = doc_ids.iter().enumerate().map(|(i, &d)| (d, i)).collect();
        Self { vocabulary, word_idx, doc_ids, doc_idx, idf, term_freq, matrix }
    }

    /// Rebuild from the persisted named structures, checking that they agree.
    pub fn from_parts(
        word_idx: HashMap<String, TermId>,
        doc_idx: HashMap<ProductId, usize>,
        inv_doc_freq: &HashMap<String, f32>,
        term_freq: &HashMap<ProductId, HashMap<String, f32>>,
        matrix: DenseMatrix,
    ) -> Result<Self> {
        matrix.check_shape()?;
        let vocabulary = dense_order(word_idx.iter().map(|(w, &i)| (i as usize, w.clone())), "word_idx")?;
        let doc_ids = dense_order(doc_idx.iter().map(|(&d, &i)| (i, d)), "doc_idx")?;

        if matrix.rows() != doc_ids.len() || matrix.cols() != vocabulary.len() + FEATURE_COUNT {
            return Err(Error::invalid(format!(
                "matrix is {} x {}, expected {} x {}",
                matrix.rows(),
                matrix.cols(),
                doc_ids.len(),
                vocabulary.len() + FEATURE_COUNT
            )));
        }

        let idf = vocabulary
            .iter()
            .map(|w| {
                inv_doc_freq
                    .get(w)
                    .copied()
                    .ok_or_else(|| Error::invalid(format!("no idf for term {w:?}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut sparse = Vec::with_capacity(doc_ids.len());
        for id in &doc_ids {
            let freqs = term_freq
                .get(id)
                .ok_or_else(|| Error::invalid(format!("no term frequencies for product {id}")))?;
            let mut entries = freqs
                .iter()
                .map(|(w, &f)| {
                    word_idx
                        .get(w)
                        .map(|&t| (t, f))
                        .ok_or_else(|| Error::invalid(format!("term {w:?} missing from word_idx")))
                })
                .collect::<Result<Vec<_>>>()?;
            entries.sort_by_key(|&(t, _)| t);
            sparse.push(SparseVector { entries });
        }

        Ok(Self { vocabulary, word_idx, doc_ids, doc_idx, idf, term_freq: sparse, matrix })
    }

    /// Dense vector of `product_id`: `vocabulary_size() + feature_count()` values.
    pub fn vector_for(&self, product_id: ProductId) -> Result<&[f32]> {
        self.doc_idx
            .get(&product_id)
            .map(|&row| self.matrix.row(row))
            .ok_or_else(|| Error::NotFound(format!("document {product_id}")))
    }

    /// Inverse document frequency of `term`, or 1.0 for unseen terms.
    pub fn idf(&self, term: &str) -> f32 {
        self.term_id(term).map(|t| self.idf[t as usize]).unwrap_or(1.0)
    }

    pub fn idf_by_id(&self, term: TermId) -> f32 { self.idf[term as usize] }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.word_idx.get(term).copied() }

    pub fn term_freq(&self, product_id: ProductId) -> Option<&SparseVector> {
        self.doc_idx.get(&product_id).map(|&row| &self.term_freq[row])
    }

    pub fn vocabulary(&self) -> &[String] { &self.vocabulary }
    pub fn doc_ids(&self) -> &[ProductId] { &self.doc_ids }
    pub fn word_idx(&self) -> &HashMap<String, TermId> { &self.word_idx }
    pub fn doc_idx(&self) -> &HashMap<ProductId, usize> { &self.doc_idx }
    pub fn matrix(&self) -> &DenseMatrix { &self.matrix }

    pub fn vocabulary_size(&self) -> usize { self.vocabulary.len() }
    pub fn document_count(&self) -> usize { self.doc_ids.len() }
    pub fn feature_count(&self) -> usize { self.matrix.cols() - self.vocabulary.len() }
    pub fn dimension(&self) -> usize { self.matrix.cols() }

    pub fn inv_doc_freq_map(&self) -> HashMap<String, f32> {
        self.vocabulary.iter().cloned().zip(self.idf.iter().copied()).collect()
    }

    pub fn term_freq_map(&self) -> HashMap<ProductId, HashMap<String, f32>> {
        self.doc_ids
            .iter()
            .zip(&self.term_freq)
            .map(|(&id, tf)| {
                let terms = tf
                    .entries
                    .iter()
                    .map(|&(t, f)| (self.vocabulary[t as usize].clone(), f))
                    .collect();
                (id, terms)
            })
            .collect()
    }
}

/// Order values by their index, requiring indices to be exactly `0..n`.
fn dense_order<T>(pairs: impl Iterator<Item = (usize, T)>, what: &str) -> Result<Vec<T>> {
    let mut slots: Vec<Option<T>> = Vec::new();
    let pairs: Vec<(usize, T)> = pairs.collect();
    slots.resize_with(pairs.len(), || None);
    for (i, value) in pairs {
        if i >= slots.len() || slots[i].is_some() {
            return Err(Error::invalid(format!("{what} indices are not contiguous")));
        }
        slots[i] = Some(value);
    }
    slots
        .into_iter()
        .collect::<Option<Vec<T>>>()
        .ok_or_else(|| Error::invalid(format!("{what} indices are not contiguous")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: ProductId, views: Option<f64>, orders: Option<f64>) -> Document {
        let mut d = Document::new(id, "x");
        d.view_counts = views;
        d.order_counts = orders;
        d
    }

    #[test]
    fn features_scale_against_corpus_max() {
        let docs = vec![doc(1, Some(50.0), Some(0.0)), doc(2, Some(100.0), None), doc(3, None, Some(f64::NAN))];
        let f = feature_columns(&docs);
        assert_eq!(f[0], [1.5, 1.0]);
        assert_eq!(f[1], [2.0, 1.0]);
        assert_eq!(f[2], [1.0, 1.0]);
    }

    #[test]
    fn assemble_places_tfidf_and_features() {
        let model = VectorSpaceModel::assemble(
            vec!["red".into(), "chair".into()],
            vec![10, 20],
            vec![2.0, 1.5],
            vec![
                SparseVector { entries: vec![(0, 0.5), (1, 0.5)] },
                SparseVector::default(),
            ],
            &[[1.0, 1.0], [2.0, 1.0]],
        );
        assert_eq!(model.vector_for(10).unwrap(), &[1.0, 0.75, 1.0, 1.0]);
        assert_eq!(model.vector_for(20).unwrap(), &[0.0, 0.0, 2.0, 1.0]);
        assert_eq!(model.feature_count(), FEATURE_COUNT);
        assert!(matches!(model.vector_for(30), Err(Error::NotFound(_))));
    }

    #[test]
    fn idf_defaults_to_one_for_unknown_terms() {
        let model = VectorSpaceModel::assemble(
            vec!["red".into()],
            vec![1],
            vec![1.7],
            vec![SparseVector { entries: vec![(0, 1.0)] }],
            &[[1.0, 1.0]],
        );
        assert_eq!(model.idf("red"), 1.7);
        assert_eq!(model.idf("blue"), 1.0);
    }

    #[test]
    fn dense_order_rejects_gaps() {
        assert!(dense_order(vec![(0, 'a'), (2, 'b')].into_iter(), "word_idx").is_err());
        assert_eq!(dense_order(vec![(1, 'b'), (0, 'a')].into_iter(), "x").unwrap(), vec!['a', 'b']);
    }
}
