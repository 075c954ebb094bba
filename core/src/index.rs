use crate::document::ProductId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub type TermId = u32;

/// Term -> product ids, one entry per occurrence (a product repeating a term
/// appears repeatedly). Retrieval treats each list as a set.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: HashMap<String, Vec<ProductId>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn from_postings(postings: HashMap<String, Vec<ProductId>>) -> Self {
        Self { postings }
    }

    pub(crate) fn add_occurrence(&mut self, term: &str, product_id: ProductId) {
        match self.postings.get_mut(term) {
            Some(list) => list.push(product_id),
            None => { self.postings.insert(term.to_string(), vec![product_id]); }
        }
    }

    /// Posting list for `term`, empty when the term was never indexed.
    pub fn postings(&self, term: &str) -> &[ProductId] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, term: &str) -> bool { self.postings.contains_key(term) }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<ProductId>)> {
        self.postings.iter()
    }

    /// Distinct products containing at least one of `terms`, in ascending id order.
    /// Unknown terms contribute nothing.
    pub fn candidate_ids<S: AsRef<str>>(&self, terms: &[S]) -> BTreeSet<ProductId> {
        terms
            .iter()
            .flat_map(|t| self.postings(t.as_ref()).iter().copied())
            .collect()
    }

    pub fn into_postings(self) -> HashMap<String, Vec<ProductId>> { self.postings }
}
