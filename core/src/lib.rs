//! Product catalog search: Portuguese text normalization, an inverted index,
//! a TF-IDF vector space with appended popularity features, cosine ranking and
//! structured post-filters.

pub mod builder;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod filter;
pub mod index;
pub mod model;
pub mod numerals;
pub mod persist;
pub mod ranker;
pub mod tokenizer;

pub use config::SearchConfig;
pub use document::{Document, ProductId};
pub use engine::SearchIndex;
pub use error::{Error, Result};
pub use filter::Predicate;
pub use index::{InvertedIndex, TermId};
pub use model::{VectorSpaceModel, FEATURES, FEATURE_COUNT};
pub use ranker::{cosine_similarity, Ranker, ScoredDoc};
