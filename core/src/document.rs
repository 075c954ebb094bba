use serde::{Deserialize, Serialize};

pub type ProductId = u64;

/// A catalog entry. Built once from the dataset and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub product_id: ProductId,
    pub seller_id: u64,
    pub title: Option<String>,
    pub concatenated_tags: Option<String>,
    pub creation_date: Option<String>,
    pub price: f64,
    /// Unknown weight fails every weight bound.
    pub weight: Option<f64>,
    pub express_delivery: bool,
    pub minimum_quantity: u32,
    pub view_counts: Option<f64>,
    pub order_counts: Option<f64>,
    pub category: String,
}

impl Document {
    /// A document with only an id and a title; the rest takes neutral values.
    pub fn new(product_id: ProductId, title: impl Into<String>) -> Self {
        Self {
            product_id,
            seller_id: 0,
            title: Some(title.into()),
            concatenated_tags: None,
            creation_date: None,
            price: 0.0,
            weight: None,
            express_delivery: false,
            minimum_quantity: 1,
            view_counts: None,
            order_counts: None,
            category: String::new(),
        }
    }
}
