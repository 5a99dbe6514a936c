//! Structural graph validation
//!
//! Pure, read-only checker over a graph value. Produces a diagnostics
//! report and never mutates or repairs anything; repair is the
//! canonicalizer's job. All findings are soft and returned as data.

use std::collections::HashSet;

use serde_json::Value as JsonValue;

use crate::index::GraphIndex;
use crate::parser::node_list;
use crate::types::{
    Graph, GraphStats, Node, Severity, ValidationIssue, ValidationResult,
};
use crate::url_utils::{is_external, normalize_origin};

/// Validate a raw graph value.
///
/// Operates on untyped JSON so that a missing `@context` or `@graph` is
/// observable as a structural error; either one missing short-circuits
/// the remaining checks. Stats are computed from whatever nodes were
/// readable.
pub fn validate(raw: &JsonValue, canonical_origin: Option<&str>) -> ValidationResult {
    let mut issues: Vec<ValidationIssue> = Vec::new();

    let has_context = raw.get("@context").is_some();
    let graph_items = raw.get("@graph").and_then(|v| v.as_array());

    if !has_context {
        issues.push(ValidationIssue::error(
            "structure",
            "graph is missing an @context",
            None,
        ));
    }
    if graph_items.is_none() {
        issues.push(ValidationIssue::error(
            "structure",
            "graph is missing the top-level @graph array",
            None,
        ));
    }

    let nodes = graph_items.map(|items| node_list(items)).unwrap_or_default();
    let index = GraphIndex::build(&nodes);
    let stats = build_stats(&nodes, &index);

    if !has_context || graph_items.is_none() {
        return ValidationResult {
            valid: false,
            issues,
            stats,
        };
    }

    let origin = canonical_origin.map(normalize_origin);
    let origin = origin.as_deref();

    check_required_nodes(&nodes, &mut issues);
    check_dangling_references(&nodes, &index, origin, &mut issues);
    check_cycles(&nodes, &index, &mut issues);
    if let Some(origin) = origin {
        check_origin_membership(&nodes, origin, &mut issues);
    }
    check_required_properties(&nodes, &mut issues);
    check_duplicate_ids(&index, &mut issues);

    let valid = !issues.iter().any(|i| i.severity == Severity::Error);
    ValidationResult {
        valid,
        issues,
        stats,
    }
}

/// Convenience wrapper over an already-parsed graph
pub fn validate_graph(graph: &Graph, canonical_origin: Option<&str>) -> ValidationResult {
    match serde_json::to_value(graph) {
        Ok(value) => validate(&value, canonical_origin),
        Err(_) => validate(&JsonValue::Null, canonical_origin),
    }
}

fn check_required_nodes(nodes: &[Node], issues: &mut Vec<ValidationIssue>) {
    if !nodes.iter().any(|n| n.has_type("Organization")) {
        issues.push(ValidationIssue::error(
            "required-node",
            "graph has no Organization node",
            None,
        ));
    }
    if !nodes.iter().any(|n| n.has_type("WebPage")) {
        issues.push(ValidationIssue::warning(
            "required-node",
            "graph has no page-level (WebPage) node",
            None,
        ));
    }
}

fn check_dangling_references(
    nodes: &[Node],
    index: &GraphIndex,
    origin: Option<&str>,
    issues: &mut Vec<ValidationIssue>,
) {
    // The index merges edges of same-id nodes under one key; visit each
    // id once so duplicated ids do not multiply the findings.
    let mut visited: HashSet<&str> = HashSet::new();
    for node in nodes {
        if !visited.insert(node.id.as_str()) {
            continue;
        }
        for edge in index.outgoing(&node.id) {
            if index.contains(&edge.target) || is_external(&edge.target, origin) {
                continue;
            }
            issues.push(ValidationIssue::error(
                "dangling-reference",
                format!(
                    "property '{}' references unknown id '{}'",
                    edge.predicate, edge.target
                ),
                Some(node.id.clone()),
            ));
        }
    }
}

/// Depth-first traversal from the Organization node. The current path is
/// cloned per branch so sibling branches sharing an ancestor are not
/// misreported as cycles; revisiting a node already on the path is.
fn check_cycles(nodes: &[Node], index: &GraphIndex, issues: &mut Vec<ValidationIssue>) {
    let Some(org) = nodes.iter().find(|n| n.has_type("Organization")) else {
        return;
    };
    let path = vec![org.id.clone()];
    walk_cycles(index, &org.id, &path, issues);
}

fn walk_cycles(
    index: &GraphIndex,
    current: &str,
    path: &[String],
    issues: &mut Vec<ValidationIssue>,
) {
    for edge in index.outgoing(current) {
        if !index.contains(&edge.target) {
            continue;
        }
        if path.iter().any(|seen| *seen == edge.target) {
            let cycle = path
                .iter()
                .cloned()
                .chain([edge.target.clone()])
                .collect::<Vec<_>>()
                .join(" -> ");
            issues.push(ValidationIssue::warning(
                "cycle",
                format!("reference cycle detected: {cycle}"),
                Some(edge.target.clone()),
            ));
            continue;
        }
        let mut branch = path.to_vec();
        branch.push(edge.target.clone());
        walk_cycles(index, &edge.target, &branch, issues);
    }
}

fn check_origin_membership(nodes: &[Node], origin: &str, issues: &mut Vec<ValidationIssue>) {
    for node in nodes {
        if let Some(url) = node.str_property("url") {
            if !url.starts_with(origin) {
                issues.push(ValidationIssue::warning(
                    "origin",
                    format!("url '{url}' is outside the canonical origin"),
                    Some(node.id.clone()),
                ));
            }
        }

        let id = node.id.as_str();
        let is_fragment = id.starts_with('#') || id.starts_with("_:");
        if !id.is_empty() && !is_fragment && !id.starts_with(origin) {
            issues.push(ValidationIssue::warning(
                "origin",
                format!("id '{id}' is outside the canonical origin"),
                Some(node.id.clone()),
            ));
        }
    }
}

fn check_required_properties(nodes: &[Node], issues: &mut Vec<ValidationIssue>) {
    for node in nodes {
        let has_name = node.str_property("name").is_some();

        if node.has_type("Organization") {
            if !has_name {
                issues.push(ValidationIssue::error(
                    "required-property",
                    "Organization node is missing a name",
                    Some(node.id.clone()),
                ));
            }
            if node.str_property("url").is_none() {
                issues.push(ValidationIssue::warning(
                    "required-property",
                    "Organization node is missing a url",
                    Some(node.id.clone()),
                ));
            }
        }

        if node.has_type("WebPage")
            && !has_name
            && node.str_property("headline").is_none()
        {
            issues.push(ValidationIssue::warning(
                "required-property",
                "page node has neither name nor headline",
                Some(node.id.clone()),
            ));
        }

        if node.has_type("Brand") && !has_name {
            issues.push(ValidationIssue::error(
                "required-property",
                "Brand node is missing a name",
                Some(node.id.clone()),
            ));
        }
    }
}

fn check_duplicate_ids(index: &GraphIndex, issues: &mut Vec<ValidationIssue>) {
    for (id, count) in index.duplicates() {
        issues.push(ValidationIssue::error(
            "duplicate-id",
            format!("id '{id}' appears on {count} nodes"),
            Some(id.to_string()),
        ));
    }
}

fn build_stats(nodes: &[Node], index: &GraphIndex) -> GraphStats {
    let mut stats = GraphStats {
        node_count: nodes.len(),
        reference_count: index.reference_count(),
        ..Default::default()
    };

    for node in nodes {
        for ty in &node.types {
            *stats.type_counts.entry(ty.clone()).or_insert(0) += 1;
        }
    }

    // A bare price property is disqualifying even without an Offer node.
    let has_commerce = nodes.iter().any(|n| {
        n.has_type("Offer")
            || n.has_type("AggregateOffer")
            || n.properties.contains_key("price")
            || n.properties.contains_key("offers")
    });
    stats.no_commerce_schema = !has_commerce;

    stats
}
