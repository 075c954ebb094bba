//! Structured post-filtering of a ranking.
//!
//! Predicates come in as `key=value` strings and are parsed into [`Predicate`].
//! They are applied as a conjunction, in the order given; unknown keys are skipped.

use crate::document::{Document, ProductId};
use crate::error::{Error, Result};
use crate::ranker::ScoredDoc;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    SellerId(u64),
    /// Exact title match.
    Title(String),
    PriceMin(f64),
    PriceMax(f64),
    WeightMin(f64),
    WeightMax(f64),
    ExpressDelivery(bool),
    /// Keep products whose minimum purchase quantity is at least this.
    MinQuantity(u32),
    Category(String),
    /// Truncate the ranking here; replaces the caller's result limit.
    ProdsToShow(usize),
}

impl Predicate {
    /// Parse one `key=value` pair. Unknown keys give `Ok(None)`; a value that does
    /// not fit its key's type is `InvalidInput`.
    pub fn parse(key: &str, value: &str) -> Result<Option<Self>> {
        let key = key.trim();
        let value = value.trim();
        let predicate = match key {
            "seller_id" => Predicate::SellerId(parse_value(key, value)?),
            "title" => Predicate::Title(value.to_string()),
            "price_min" => Predicate::PriceMin(parse_value(key, value)?),
            "price_max" => Predicate::PriceMax(parse_value(key, value)?),
            "weight_min" => Predicate::WeightMin(parse_value(key, value)?),
            "weight_max" => Predicate::WeightMax(parse_value(key, value)?),
            "express_delivery" => Predicate::ExpressDelivery(parse_flag(key, value)?),
            "min_quantity" => Predicate::MinQuantity(parse_value(key, value)?),
            "category" => Predicate::Category(value.to_string()),
            "prods_to_show" => Predicate::ProdsToShow(parse_value(key, value)?),
            _ => return Ok(None),
        };
        Ok(Some(predicate))
    }

    /// Whether `doc` passes. [`Predicate::ProdsToShow`] passes everything.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Predicate::SellerId(id) => doc.seller_id == *id,
            Predicate::Title(title) => doc.title.as_deref() == Some(title.as_str()),
            Predicate::PriceMin(min) => doc.price >= *min,
            Predicate::PriceMax(max) => doc.price <= *max,
            Predicate::WeightMin(min) => doc.weight.is_some_and(|w| w >= *min),
            Predicate::WeightMax(max) => doc.weight.is_some_and(|w| w <= *max),
            Predicate::ExpressDelivery(flag) => doc.express_delivery == *flag,
            Predicate::MinQuantity(min) => doc.minimum_quantity >= *min,
            Predicate::Category(category) => doc.category == *category,
            Predicate::ProdsToShow(_) => true,
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::invalid(format!("{key}: cannot parse {value:?}")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "sim" => Ok(true),
        "false" | "0" | "no" | "nao" | "não" => Ok(false),
        _ => Err(Error::invalid(format!("{key}: expected a boolean, got {value:?}"))),
    }
}

/// Parse `key=value` pairs in order, dropping unknown keys.
pub fn parse_predicates<I, K, V>(pairs: I) -> Result<Vec<Predicate>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = Vec::new();
    for (key, value) in pairs {
        match Predicate::parse(key.as_ref(), value.as_ref())? {
            Some(p) => out.push(p),
            None => tracing::debug!(key = key.as_ref(), "ignoring unknown predicate"),
        }
    }
    Ok(out)
}

/// Anything in a ranking that names a product.
pub trait Ranked {
    fn product_id(&self) -> ProductId;
}

impl Ranked for ProductId {
    fn product_id(&self) -> ProductId { *self }
}

impl Ranked for ScoredDoc {
    fn product_id(&self) -> ProductId { self.product_id }
}

/// Order-preserving filter of `ranking`. Products missing from `documents` are dropped.
pub fn apply<T: Ranked>(
    mut ranking: Vec<T>,
    predicates: &[Predicate],
    documents: &HashMap<ProductId, Document>,
) -> Vec<T> {
    for predicate in predicates {
        match predicate {
            Predicate::ProdsToShow(n) => ranking.truncate(*n),
            _ => ranking.retain(|r| {
                documents
                    .get(&r.product_id())
                    .is_some_and(|doc| predicate.matches(doc))
            }),
        }
    }
    ranking
}

/// The `prods_to_show` cap if one is present.
pub fn explicit_cap(predicates: &[Predicate]) -> Option<usize> {
    predicates.iter().rev().find_map(|p| match p {
        Predicate::ProdsToShow(n) => Some(*n),
        _ => None,
    })
}
