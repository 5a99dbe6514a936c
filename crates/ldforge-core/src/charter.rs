//! Charter compliance: advisory policy checks over a canonical graph
//!
//! Distinct from structural validation: these are editorial policy
//! expectations, returned as plain warning strings and never blocking.

use crate::index::{GraphIndex, collect_reference_ids, reference_id};
use crate::types::{Graph, PageClassification};

/// Properties through which other nodes are expected to acknowledge the
/// Organization node
const ORG_LINK_PROPS: [&str; 4] = ["publisher", "manufacturer", "parentOrganization", "brand"];

/// Check a canonical graph against the content charter.
///
/// Returns an empty list when fully compliant.
pub fn check_charter(graph: &Graph, classification: &PageClassification) -> Vec<String> {
    let mut warnings = Vec::new();
    let index = GraphIndex::from_graph(graph);

    let org = graph.first_of_type("Organization");
    match org {
        None => warnings.push("Organization node is missing from the graph".to_string()),
        Some(org) => {
            let acknowledged = graph.nodes.iter().any(|node| {
                node.id != org.id
                    && ORG_LINK_PROPS.iter().any(|prop| {
                        node.properties
                            .get(*prop)
                            .map(|value| {
                                collect_reference_ids(value).contains(&org.id.as_str())
                            })
                            .unwrap_or(false)
                    })
            });
            if !acknowledged {
                warnings.push(
                    "Organization node is not referenced by any publisher, manufacturer, parentOrganization, or brand property"
                        .to_string(),
                );
            }
        }
    }

    let website_id = graph.first_of_type("WebSite").map(|n| n.id.clone());
    for node in &graph.nodes {
        if !node.has_type("WebPage") {
            continue;
        }
        let resolves = node
            .properties
            .get("isPartOf")
            .and_then(reference_id)
            .zip(website_id.as_deref())
            .is_some_and(|(target, site)| target == site);
        if !resolves {
            warnings.push(format!(
                "page '{}' has an isPartOf that does not resolve to the WebSite node",
                node.id
            ));
        }
    }

    if !classification.faq_allowed() {
        let faq_count = graph
            .nodes
            .iter()
            .filter(|n| n.has_type("FAQPage") || n.has_type("Question"))
            .count();
        if faq_count > 0 {
            warnings.push(format!(
                "{faq_count} FAQ node(s) present although FAQ content is suppressed for this page"
            ));
        }
    }

    for (id, count) in index.duplicates() {
        warnings.push(format!(
            "charter violation: id '{id}' is carried by {count} nodes"
        ));
    }

    let competing = graph
        .nodes
        .iter()
        .filter(|n| n.has_type("WebPage") && n.properties.contains_key("mainEntity"))
        .count();
    if competing > 1 {
        warnings.push(format!(
            "{competing} page nodes carry a mainEntity reference; competing primary entities"
        ));
    }

    warnings
}
