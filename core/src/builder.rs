use crate::document::{Document, ProductId};
use crate::error::{Error, Result};
use crate::index::{InvertedIndex, TermId};
use crate::model::{feature_columns, SparseVector, VectorSpaceModel};
use crate::tokenizer::normalize_field;
use std::collections::{HashMap, HashSet};

/// Output of [`IndexBuilder::finish`].
pub struct BuiltIndex {
    pub inverted: InvertedIndex,
    pub model: VectorSpaceModel,
    pub documents: HashMap<ProductId, Document>,
}

/// Accumulates documents, then computes idf and the matrix in one pass at
/// [`finish`](IndexBuilder::finish). Term and row ids follow first-seen order.
#[derive(Default)]
pub struct IndexBuilder {
    inverted: InvertedIndex,
    vocabulary: Vec<String>,
    dictionary: HashMap<String, TermId>,
    df: Vec<u32>,
    // Per row: raw counts sorted by term id, and the token total.
    counts: Vec<(Vec<(TermId, u32)>, usize)>,
    documents: Vec<Document>,
    seen: HashSet<ProductId>,
}

impl IndexBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.documents.len() }
    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    pub fn add(&mut self, doc: Document) -> Result<()> {
        if !self.seen.insert(doc.product_id) {
            return Err(Error::invalid(format!("duplicate product id {}", doc.product_id)));
        }

        let mut tokens = normalize_field(doc.title.as_deref());
        tokens.extend(normalize_field(doc.concatenated_tags.as_deref()));

        let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
        for term in &tokens {
            let tid = match self.dictionary.get(term) {
                Some(&tid) => tid,
                None => {
                    let tid = self.vocabulary.len() as TermId;
                    self.dictionary.insert(term.clone(), tid);
                    self.vocabulary.push(term.clone());
                    self.df.push(0);
                    tid
                }
            };
            *tf_counts.entry(tid).or_insert(0) += 1;
            self.inverted.add_occurrence(term, doc.product_id);
        }
        for &tid in tf_counts.keys() {
            self.df[tid as usize] += 1;
        }

        let mut counts: Vec<(TermId, u32)> = tf_counts.into_iter().collect();
        counts.sort_by_key(|&(t, _)| t);
        self.counts.push((counts, tokens.len()));
        self.documents.push(doc);
        Ok(())
    }

    pub fn finish(self) -> Result<BuiltIndex> {
        if self.documents.is_empty() {
            return Err(Error::invalid("cannot build an index from zero documents"));
        }
        let n = self.documents.len() as f32;
        let idf: Vec<f32> = self.df.iter().map(|&df| 1.0 + (n / df as f32).ln()).collect();

        let term_freq: Vec<SparseVector> = self
            .counts
            .into_iter()
            .map(|(counts, total)| SparseVector {
                entries: counts
                    .into_iter()
                    .map(|(t, c)| (t, c as f32 / total as f32))
                    .collect(),
            })
            .collect();

        let features = feature_columns(&self.documents);
        let doc_ids: Vec<ProductId> = self.documents.iter().map(|d| d.product_id).collect();
        let model = VectorSpaceModel::assemble(self.vocabulary, doc_ids, idf, term_freq, &features);
        tracing::info!(
            num_docs = model.document_count(),
            num_terms = model.vocabulary_size(),
            columns = model.dimension(),
            "index built"
        );

        let documents = self.documents.into_iter().map(|d| (d.product_id, d)).collect();
        Ok(BuiltIndex { inverted: self.inverted, model, documents })
    }
}

/// Build every structure from `documents` in one go.
pub fn build<I>(documents: I) -> Result<BuiltIndex>
where
    I: IntoIterator<Item = Document>,
{
    let mut builder = IndexBuilder::new();
    for doc in documents {
        builder.add(doc)?;
    }
    builder.finish()
}
