//! Immutable search snapshot: inverted index, vector space model and the
//! document attributes, queried by reference. A rebuild produces a new
//! snapshot; nothing here mutates after construction.

use crate::builder::{build, BuiltIndex};
use crate::config::SearchConfig;
use crate::document::{Document, ProductId};
use crate::error::{Error, Result};
use crate::filter::{self, explicit_cap, parse_predicates, Predicate};
use crate::index::InvertedIndex;
use crate::model::VectorSpaceModel;
use crate::persist::IndexParts;
use crate::ranker::{Ranker, ScoredDoc};
use crate::tokenizer::normalize;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct SearchIndex {
    inverted: InvertedIndex,
    model: VectorSpaceModel,
    documents: HashMap<ProductId, Document>,
    config: SearchConfig,
}

impl SearchIndex {
    /// Build a snapshot from the full document set. Zero documents or a repeated
    /// product id is `InvalidInput`.
    pub fn build<I>(documents: I, config: SearchConfig) -> Result<Self>
    where
        I: IntoIterator<Item = Document>,
    {
        let BuiltIndex { inverted, model, documents } = build(documents)?;
        Ok(Self { inverted, model, documents, config })
    }

    /// Ranked product ids for `query_text`, filtered by `key=value` predicates in
    /// the order given, capped at `result_limit` unless `prods_to_show` is present.
    pub fn search<P, K, V>(&self, query_text: &str, result_limit: usize, predicates: P) -> Result<Vec<ProductId>>
    where
        P: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let predicates = parse_predicates(predicates)?;
        Ok(self
            .search_scored(query_text, result_limit, &predicates)
            .into_iter()
            .map(|s| s.product_id)
            .collect())
    }

    /// Like [`search`](Self::search) with typed predicates, keeping the scores.
    pub fn search_scored(&self, query_text: &str, result_limit: usize, predicates: &[Predicate]) -> Vec<ScoredDoc> {
        let ranking = self.ranker().rank(query_text);
        let total = ranking.len();
        let mut results = filter::apply(ranking, predicates, &self.documents);
        if explicit_cap(predicates).is_none() {
            results.truncate(result_limit);
        }
        tracing::debug!(query = query_text, candidates = total, returned = results.len(), "search");
        results
    }

    /// Filter-only listing over every document in row order. This is how
    /// documents without indexable text can be reached.
    pub fn browse(&self, result_limit: usize, predicates: &[Predicate]) -> Vec<ProductId> {
        let all = self.model.doc_ids().to_vec();
        let mut results = filter::apply(all, predicates, &self.documents);
        if explicit_cap(predicates).is_none() {
            results.truncate(result_limit);
        }
        results
    }

    pub fn ranker(&self) -> Ranker<'_> {
        Ranker::new(&self.model, &self.inverted, &self.config)
    }

    /// Products sharing at least one term with `terms`.
    pub fn candidate_ids<S: AsRef<str>>(&self, terms: &[S]) -> BTreeSet<ProductId> {
        self.inverted.candidate_ids(terms)
    }

    /// Shorthand for normalizing `text` and looking up its candidates.
    pub fn candidates_for_text(&self, text: &str) -> BTreeSet<ProductId> {
        self.candidate_ids(&normalize(text))
    }

    pub fn document(&self, product_id: ProductId) -> Result<&Document> {
        self.documents
            .get(&product_id)
            .ok_or_else(|| Error::NotFound(format!("document {product_id}")))
    }

    pub fn vector_for(&self, product_id: ProductId) -> Result<&[f32]> {
        self.model.vector_for(product_id)
    }

    pub fn vocabulary_size(&self) -> usize { self.model.vocabulary_size() }
    pub fn document_count(&self) -> usize { self.model.document_count() }
    pub fn feature_count(&self) -> usize { self.model.feature_count() }

    pub fn model(&self) -> &VectorSpaceModel { &self.model }
    pub fn inverted_index(&self) -> &InvertedIndex { &self.inverted }
    pub fn config(&self) -> &SearchConfig { &self.config }

    /// Copy out the named structures for persistence.
    pub fn to_parts(&self) -> IndexParts {
        IndexParts {
            inverted_index: self.inverted.clone().into_postings(),
            tfidf_matrix: self.model.matrix().clone(),
            word_idx: self.model.word_idx().clone(),
            doc_idx: self.model.doc_idx().clone(),
            inv_doc_freq: self.model.inv_doc_freq_map(),
            term_freq: self.model.term_freq_map(),
            documents: self.documents.clone(),
        }
    }

    /// Reassemble a snapshot from persisted structures without re-running the build.
    pub fn from_parts(parts: IndexParts, config: SearchConfig) -> Result<Self> {
        let IndexParts { inverted_index, tfidf_matrix, word_idx, doc_idx, inv_doc_freq, term_freq, documents } = parts;
        let model = VectorSpaceModel::from_parts(word_idx, doc_idx, &inv_doc_freq, &term_freq, tfidf_matrix)?;

        if documents.len() != model.document_count()
            || model.doc_ids().iter().any(|id| !documents.contains_key(id))
        {
            return Err(Error::invalid("documents do not match doc_idx"));
        }
        for (term, ids) in &inverted_index {
            if model.term_id(term).is_none() {
                return Err(Error::invalid(format!("posting term {term:?} missing from word_idx")));
            }
            if let Some(id) = ids.iter().find(|id| !documents.contains_key(*id)) {
                return Err(Error::invalid(format!("posting for {term:?} names unknown product {id}")));
            }
        }

        Ok(Self {
            inverted: InvertedIndex::from_postings(inverted_index),
            model,
            documents,
            config,
        })
    }
}
