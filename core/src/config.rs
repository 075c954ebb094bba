use serde::{Deserialize, Serialize};

/// Query-time settings shared by every search on a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Result cap when the caller gives none and no `prods_to_show` predicate is present.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Score candidates on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
    /// Minimum candidate count before `parallel` takes effect.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_limit() -> usize { 10 }
fn default_parallel_threshold() -> usize { 2048 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            parallel: false,
            parallel_threshold: default_parallel_threshold(),
        }
    }
}
