//! Draft graph parsing and canonical serialization
//!
//! Parsing is the hard boundary of the engine: invalid JSON or a missing
//! `@graph` array fails the whole operation. Everything parseable beyond
//! that is accepted and repaired by the canonicalizer, so node extraction
//! here is deliberately tolerant.

use serde_json::Value as JsonValue;

use crate::error::GraphError;
use crate::types::{Graph, Node};

/// Parse an untrusted draft graph string.
///
/// Hard errors: invalid JSON, or a top level without an `@graph` array.
/// Non-object entries in `@graph` are dropped; nodes without an `@id`
/// receive a deterministic blank id (`_:n{index}`) so repeated runs over
/// the engine's own output stay stable.
pub fn parse_graph(raw: &str) -> Result<Graph, GraphError> {
    let value: JsonValue = serde_json::from_str(raw)?;

    let items = value
        .get("@graph")
        .and_then(|g| g.as_array())
        .ok_or(GraphError::MissingGraph)?;

    let context = value
        .get("@context")
        .cloned()
        .unwrap_or_else(|| JsonValue::String("https://schema.org".to_string()));

    let mut nodes = node_list(items);
    for (idx, node) in nodes.iter_mut().enumerate() {
        if node.id.is_empty() {
            node.id = format!("_:n{idx}");
        }
    }

    Ok(Graph { context, nodes })
}

/// Tolerantly extract nodes from a `@graph` array value.
///
/// Object entries always deserialize (every Node field has a lenient
/// default); anything else is skipped.
pub fn node_list(items: &[JsonValue]) -> Vec<Node> {
    items
        .iter()
        .filter(|item| item.is_object())
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

/// Serialize a canonical graph as pretty-printed JSON
pub fn to_pretty_string(graph: &Graph) -> Result<String, GraphError> {
    Ok(serde_json::to_string_pretty(graph)?)
}
