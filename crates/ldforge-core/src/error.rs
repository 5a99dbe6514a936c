//! Hard-failure taxonomy for the engine boundary
//!
//! Everything the validator and charter checker find is soft and is
//! returned as data; these variants are the only ways an operation fails.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    /// Draft graph is not valid JSON
    #[error("draft graph is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Draft graph parsed but carries no `@graph` array
    #[error("draft graph has no @graph array")]
    MissingGraph,

    /// No active rule matched any specificity level
    #[error("no active rule matches the page classification")]
    NoMatchingRule,
}
