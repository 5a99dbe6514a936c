//! Reference Index: id lookup and adjacency view over a graph
//!
//! Built once per pass and consumed by both the canonicalizer and the
//! validator. Tens of nodes per graph, so owned strings are fine.

use std::collections::HashMap;

use serde_json::{Value as JsonValue, json};

use crate::types::{Graph, Node};

/// An outgoing reference edge, keyed by the property that carries it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub predicate: String,
    pub target: String,
}

/// Id-indexed lookup plus adjacency over one graph
#[derive(Debug, Default)]
pub struct GraphIndex {
    positions: HashMap<String, usize>,
    counts: HashMap<String, usize>,
    adjacency: HashMap<String, Vec<Reference>>,
    reference_count: usize,
}

impl GraphIndex {
    pub fn build(nodes: &[Node]) -> Self {
        let mut index = Self::default();

        for (pos, node) in nodes.iter().enumerate() {
            if !node.id.is_empty() {
                index.positions.entry(node.id.clone()).or_insert(pos);
                *index.counts.entry(node.id.clone()).or_insert(0) += 1;
            }

            for (predicate, value) in &node.properties {
                for target in collect_reference_ids(value) {
                    index.reference_count += 1;
                    index
                        .adjacency
                        .entry(node.id.clone())
                        .or_default()
                        .push(Reference {
                            predicate: predicate.clone(),
                            target: target.to_string(),
                        });
                }
            }
        }

        index
    }

    pub fn from_graph(graph: &Graph) -> Self {
        Self::build(&graph.nodes)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Ids appearing on more than one node, with their occurrence counts
    pub fn duplicates(&self) -> Vec<(&str, usize)> {
        let mut dupes: Vec<(&str, usize)> = self
            .counts
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(id, count)| (id.as_str(), *count))
            .collect();
        dupes.sort();
        dupes
    }

    /// Outgoing reference edges of a node
    pub fn outgoing(&self, id: &str) -> &[Reference] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total reference-shaped property values in the graph
    pub fn reference_count(&self) -> usize {
        self.reference_count
    }
}

/// A reference is an object whose only key is `@id` with a string value.
///
/// Objects carrying `@id` alongside other keys are embedded values, not
/// references; treating them as references would let cleanup destroy
/// inline content.
pub fn reference_id(value: &JsonValue) -> Option<&str> {
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    obj.get("@id").and_then(|id| id.as_str())
}

/// All reference targets inside a property value (direct or in an array)
pub fn collect_reference_ids(value: &JsonValue) -> Vec<&str> {
    match value {
        JsonValue::Array(items) => items.iter().filter_map(reference_id).collect(),
        _ => reference_id(value).into_iter().collect(),
    }
}

/// Build a reference value pointing at `id`
pub fn make_reference(id: &str) -> JsonValue {
    json!({ "@id": id })
}
