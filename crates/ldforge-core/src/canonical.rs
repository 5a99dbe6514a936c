//! Graph canonicalization: deterministic rewrite of a draft graph into a
//! canonical, internally-consistent one
//!
//! The pipeline runs its steps in a fixed order because later steps rely
//! on invariants established earlier (breadcrumb normalization assumes
//! the primary entity already carries its final display name). Every step
//! is individually idempotent, so re-running the whole pipeline on its
//! own output changes nothing. Drafts are untrusted: missing nodes are
//! synthesized, malformed shapes repaired, nothing past the parse
//! boundary ever errors.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value as JsonValue, json};
use tracing::debug;

use crate::images::resolve_images;
use crate::index::{GraphIndex, make_reference, reference_id};
use crate::types::{Graph, Node, OrgConfig, PageClassification, shorten_iri};
use crate::url_utils::{is_external, last_path_segment, normalize_origin};

/// FAQ-family schema types removed when a page suppresses FAQ content
const FAQ_TYPES: [&str; 3] = ["FAQPage", "Question", "Answer"];

/// Descriptive properties that may be copied from a Brand node onto the
/// primary entity. Offer, price, and availability data never transfer.
const BRAND_COPY_PROPS: [&str; 5] = [
    "description",
    "slogan",
    "award",
    "countryOfOrigin",
    "foundingDate",
];

static NAME_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(review|prices?)\s*$").expect("invalid suffix regex"));

/// Well-known Organization node id for a canonical origin
pub fn organization_id(origin: &str) -> String {
    format!("{}/#organization", normalize_origin(origin))
}

/// Well-known WebSite node id for a canonical origin
pub fn website_id(origin: &str) -> String {
    format!("{}/#website", normalize_origin(origin))
}

/// Rewrite a draft graph into canonical form.
///
/// Total over any parseable draft; the organization configuration is
/// authoritative and passed explicitly so the pipeline stays a pure
/// function of its inputs.
pub fn canonicalize(
    draft: &Graph,
    classification: &PageClassification,
    raw_html: &str,
    org: &OrgConfig,
    canonical_origin: &str,
) -> Graph {
    let origin = normalize_origin(canonical_origin);
    let org_id = organization_id(&origin);
    let site_id = website_id(&origin);

    let mut graph = draft.clone();

    enforce_website(&mut graph, &site_id, &org_id, &origin);
    enrich_organization(&mut graph, &org_id, org);
    repair_page_linkage(&mut graph, &site_id, &org_id);
    remove_faq_nodes(&mut graph, classification);
    prune_dangling_references(&mut graph, &origin);

    if classification.is_brand_detail() {
        let display_name =
            canonicalize_brand_entity(&mut graph, classification, raw_html, org, &origin);
        normalize_breadcrumbs(&mut graph, &origin, &display_name);
    }

    if classification.is_brand_index() {
        link_collection_entries(&mut graph);
    }

    inject_external_identifier(&mut graph, classification);

    graph
}

/// Remove every node with `id`, returning the removed nodes and the
/// position the survivor should be reinserted at
fn extract_by_id(nodes: &mut Vec<Node>, id: &str) -> (usize, Vec<Node>) {
    let first_pos = nodes
        .iter()
        .position(|n| n.id == id)
        .unwrap_or(nodes.len());

    let mut removed = Vec::new();
    let mut i = 0;
    while i < nodes.len() {
        if nodes[i].id == id {
            removed.push(nodes.remove(i));
        } else {
            i += 1;
        }
    }

    (first_pos, removed)
}

/// Step 1: exactly one WebSite node under the fixed id, publisher forced
fn enforce_website(graph: &mut Graph, site_id: &str, org_id: &str, origin: &str) {
    let (pos, mut found) = extract_by_id(&mut graph.nodes, site_id);

    let mut site = match found.drain(..).next() {
        Some(existing) => existing,
        None => {
            debug!(%site_id, "synthesizing WebSite node");
            Node::new(site_id, "WebSite")
        }
    };

    if !site.has_type("WebSite") {
        site.types.push("WebSite".to_string());
    }
    if site.str_property("url").is_none() {
        site.properties
            .insert("url".to_string(), json!(format!("{origin}/")));
    }
    site.properties
        .insert("publisher".to_string(), make_reference(org_id));

    let pos = pos.min(graph.nodes.len());
    graph.nodes.insert(pos, site);
}

/// Step 2: exactly one Organization node under the fixed id, every field
/// overwritten from the static configuration. Draft content for this node
/// is discarded wholesale.
fn enrich_organization(graph: &mut Graph, org_id: &str, org: &OrgConfig) {
    let (pos, discarded) = extract_by_id(&mut graph.nodes, org_id);
    if discarded.len() > 1 {
        debug!(count = discarded.len(), "collapsed duplicate Organization nodes");
    }

    let mut node = Node::new(org_id, "Organization");
    node.properties.insert("name".to_string(), json!(org.name));
    node.properties.insert("url".to_string(), json!(org.url));
    node.properties
        .insert("description".to_string(), json!(org.description));
    node.properties
        .insert("logo".to_string(), json!(org.logo_url));
    if !org.same_as.is_empty() {
        node.properties
            .insert("sameAs".to_string(), json!(org.same_as));
    }
    node.properties
        .insert("foundingDate".to_string(), json!(org.founding_year.to_string()));
    node.properties.insert(
        "founder".to_string(),
        json!({ "@type": "Person", "name": org.founder }),
    );
    node.properties.insert(
        "address".to_string(),
        json!({
            "@type": "PostalAddress",
            "streetAddress": org.street_address,
            "addressLocality": org.address_locality,
            "postalCode": org.postal_code,
            "addressCountry": org.address_country,
        }),
    );

    let pos = pos.min(graph.nodes.len());
    graph.nodes.insert(pos, node);
}

/// Step 3: every page-level node points at the WebSite and Organization
fn repair_page_linkage(graph: &mut Graph, site_id: &str, org_id: &str) {
    for node in &mut graph.nodes {
        if !node.has_type("WebPage") {
            continue;
        }
        node.properties
            .insert("isPartOf".to_string(), make_reference(site_id));

        let publisher_ok = node
            .properties
            .get("publisher")
            .and_then(reference_id)
            .is_some_and(|id| id == org_id);
        if !publisher_ok {
            node.properties
                .insert("publisher".to_string(), make_reference(org_id));
        }
    }
}

fn is_faq_type(ty: &str) -> bool {
    FAQ_TYPES
        .iter()
        .any(|faq| shorten_iri(ty).eq_ignore_ascii_case(faq))
}

/// Step 4: strip FAQ-family content when the classification suppresses it.
/// Mixed-type nodes only lose the FAQ tags; a node is dropped entirely
/// when its type set empties.
fn remove_faq_nodes(graph: &mut Graph, classification: &PageClassification) {
    if classification.faq_allowed() {
        return;
    }

    let before = graph.nodes.len();
    graph.nodes.retain_mut(|node| {
        if !node.types.iter().any(|t| is_faq_type(t)) {
            return true;
        }
        node.types.retain(|t| !is_faq_type(t));
        !node.types.is_empty()
    });

    if graph.nodes.len() != before {
        debug!(removed = before - graph.nodes.len(), "removed FAQ nodes");
    }
}

/// Step 5: filter reference-shaped properties against the live id index.
/// Emptied properties are deleted rather than left as null artifacts;
/// references to external absolute URLs are exempt.
fn prune_dangling_references(graph: &mut Graph, origin: &str) {
    let index = GraphIndex::from_graph(graph);
    let keep = |id: &str| index.contains(id) || is_external(id, Some(origin));

    for node in &mut graph.nodes {
        let mut dead: Vec<String> = Vec::new();

        for (key, value) in node.properties.iter_mut() {
            match value {
                JsonValue::Array(items) => {
                    if items.iter().any(|v| reference_id(v).is_some()) {
                        items.retain(|v| match reference_id(v) {
                            Some(id) => keep(id),
                            None => true,
                        });
                        if items.is_empty() {
                            dead.push(key.clone());
                        }
                    }
                }
                _ => {
                    if let Some(id) = reference_id(value) {
                        if !keep(id) {
                            dead.push(key.clone());
                        }
                    }
                }
            }
        }

        for key in dead {
            debug!(node = %node.id, property = %key, "removed dangling reference property");
            node.properties.remove(&key);
        }
    }
}

/// Step 6: find-or-synthesize the primary entity on an item-detail page,
/// settle its display name, fold in descriptive brand data, resolve hero
/// and logo images, and repoint the page at the entity. Returns the
/// display name for breadcrumb normalization.
fn canonicalize_brand_entity(
    graph: &mut Graph,
    classification: &PageClassification,
    raw_html: &str,
    org: &OrgConfig,
    origin: &str,
) -> String {
    let page_pos = graph.nodes.iter().position(|n| n.has_type("WebPage"));

    let page_url = page_pos
        .and_then(|i| graph.nodes[i].str_property("url").map(str::to_string))
        .or_else(|| {
            page_pos
                .map(|i| graph.nodes[i].id.clone())
                .filter(|id| id.starts_with("http"))
        })
        .unwrap_or_else(|| format!("{origin}/"));

    let display_name = page_pos
        .and_then(|i| graph.nodes[i].str_property("name"))
        .map(strip_known_suffixes)
        .filter(|s| !s.is_empty())
        .or_else(|| last_path_segment(&page_url).map(|s| title_case(&s)))
        .unwrap_or_else(|| org.name.clone());

    let entity_pos = match graph.nodes.iter().position(|n| n.has_type("Product")) {
        Some(pos) => pos,
        None => {
            debug!(name = %display_name, "synthesizing primary entity");
            graph
                .nodes
                .push(Node::new(format!("{page_url}#product"), "Product"));
            graph.nodes.len() - 1
        }
    };
    let entity_id = graph.nodes[entity_pos].id.clone();

    graph.nodes[entity_pos]
        .properties
        .insert("name".to_string(), json!(display_name));

    let brand_pos = graph
        .nodes
        .iter()
        .position(|n| n.has_type("Brand") && n.id != entity_id);

    if let Some(bi) = brand_pos {
        for key in BRAND_COPY_PROPS {
            if graph.nodes[entity_pos].properties.contains_key(key) {
                continue;
            }
            if let Some(value) = graph.nodes[bi].properties.get(key).cloned() {
                graph.nodes[entity_pos]
                    .properties
                    .insert(key.to_string(), value);
            }
        }
    }

    let entity = &mut graph.nodes[entity_pos];
    if let Some(abv) = classification.strength_abv {
        ensure_additional_property(entity, "abv", json!(abv));
    }
    if let Some(style) = &classification.style {
        ensure_additional_property(entity, "style", json!(style));
    }
    if let Some(year) = classification.launch_year {
        ensure_additional_property(entity, "launched", json!(year));
    }

    // Hero and logo, each through its own fallback chain.
    let resolved = resolve_images(raw_html, &display_name, origin);
    let brand_image = brand_pos.and_then(|i| {
        image_url_value(graph.nodes[i].properties.get("image"))
            .or_else(|| image_url_value(graph.nodes[i].properties.get("logo")))
    });
    let brand_logo = brand_pos.and_then(|i| image_url_value(graph.nodes[i].properties.get("logo")));
    let existing_image = image_url_value(graph.nodes[entity_pos].properties.get("image"));

    let hero = resolved
        .hero
        .map(|c| c.resolved_url)
        .or_else(|| classification.hero_image_override.clone())
        .or(brand_image)
        .or(existing_image)
        .unwrap_or_else(|| org.logo_url.clone());

    let logo = resolved
        .logo
        .map(|c| c.resolved_url)
        .or(brand_logo)
        .unwrap_or_else(|| org.logo_url.clone());

    graph.nodes[entity_pos]
        .properties
        .insert("image".to_string(), json!(hero));

    if let Some(pi) = page_pos {
        graph.nodes[pi]
            .properties
            .insert("image".to_string(), json!(hero));
    }

    // Reduce the brand node to a link-only shape and wire the entity to it.
    if let Some(bi) = brand_pos {
        let brand_id = graph.nodes[bi].id.clone();
        let brand = &mut graph.nodes[bi];
        let mut kept = Map::new();
        for key in ["name", "url", "brand"] {
            if let Some(value) = brand.properties.get(key) {
                kept.insert(key.to_string(), value.clone());
            }
        }
        kept.insert("image".to_string(), json!(hero));
        kept.insert("logo".to_string(), json!(logo));
        brand.properties = kept;

        graph.nodes[entity_pos]
            .properties
            .insert("brand".to_string(), make_reference(&brand_id));
    }

    // The page's main-subject references point at the primary entity only.
    if let Some(pi) = page_pos {
        let page = &mut graph.nodes[pi];
        page.properties
            .insert("mainEntity".to_string(), make_reference(&entity_id));
        if page.properties.contains_key("about") {
            page.properties
                .insert("about".to_string(), make_reference(&entity_id));
        }
    }

    display_name
}

/// Step 7: force the fixed 3-level breadcrumb regardless of the draft
fn normalize_breadcrumbs(graph: &mut Graph, origin: &str, display_name: &str) {
    graph.nodes.retain(|n| !n.has_type("BreadcrumbList"));

    let id = format!("{origin}/#breadcrumb");
    let mut node = Node::new(&id, "BreadcrumbList");
    node.properties.insert(
        "itemListElement".to_string(),
        json!([
            { "@type": "ListItem", "position": 1, "name": "Home", "item": format!("{origin}/") },
            { "@type": "ListItem", "position": 2, "name": "Brands", "item": format!("{origin}/brands/") },
            { "@type": "ListItem", "position": 3, "name": display_name },
        ]),
    );
    graph.nodes.push(node);

    if let Some(page) = graph.nodes.iter_mut().find(|n| n.has_type("WebPage")) {
        page.properties
            .insert("breadcrumb".to_string(), make_reference(&id));
    }
}

/// Step 8: rewrite collection-list entries whose url matches a known
/// detail entity into bare references, strengthening connectivity.
/// Unmatched entries are left untouched.
fn link_collection_entries(graph: &mut Graph) {
    let mut by_url: HashMap<String, String> = HashMap::new();
    for node in &graph.nodes {
        if node.has_type("Product") {
            if let Some(url) = node.str_property("url") {
                by_url.insert(url.trim_end_matches('/').to_string(), node.id.clone());
            }
        }
    }
    if by_url.is_empty() {
        return;
    }

    for node in &mut graph.nodes {
        if node.has_type("ItemList") {
            if let Some(JsonValue::Array(items)) = node.properties.get_mut("itemListElement") {
                rewrite_list_entries(items, &by_url);
            }
        }
        if node.has_type("WebPage") || node.has_type("CollectionPage") {
            if let Some(main) = node.properties.get_mut("mainEntity") {
                if let Some(items) = main
                    .get_mut("itemListElement")
                    .and_then(|v| v.as_array_mut())
                {
                    rewrite_list_entries(items, &by_url);
                }
            }
        }
    }
}

fn rewrite_list_entries(items: &mut [JsonValue], by_url: &HashMap<String, String>) {
    for item in items.iter_mut() {
        if reference_id(item).is_some() {
            continue;
        }
        let target = item
            .get("url")
            .and_then(|v| v.as_str())
            .or_else(|| item.get("item").and_then(|v| v.as_str()));
        if let Some(url) = target {
            if let Some(id) = by_url.get(url.trim_end_matches('/')) {
                *item = make_reference(id);
            }
        }
    }
}

/// Step 9: append the external canonical identifier to the primary
/// entity's profile-link list. Never duplicates, never replaces the list.
fn inject_external_identifier(graph: &mut Graph, classification: &PageClassification) {
    let Some(external_id) = &classification.external_id else {
        return;
    };

    let pos = graph
        .nodes
        .iter()
        .position(|n| n.has_type("Product"))
        .or_else(|| graph.nodes.iter().position(|n| n.has_type("Brand")));
    let Some(pos) = pos else {
        return;
    };

    let node = &mut graph.nodes[pos];
    match node.properties.get_mut("sameAs") {
        None => {
            node.properties
                .insert("sameAs".to_string(), json!([external_id]));
        }
        Some(JsonValue::String(existing)) => {
            if existing != external_id {
                let old = existing.clone();
                node.properties
                    .insert("sameAs".to_string(), json!([old, external_id]));
            }
        }
        Some(JsonValue::Array(items)) => {
            let already = items
                .iter()
                .any(|v| v.as_str() == Some(external_id.as_str()));
            if !already {
                items.push(json!(external_id));
            }
        }
        Some(_) => {}
    }
}

fn ensure_additional_property(entity: &mut Node, name: &str, value: JsonValue) {
    let list = entity
        .properties
        .entry("additionalProperty".to_string())
        .or_insert_with(|| json!([]));
    if !list.is_array() {
        let old = list.take();
        *list = json!([old]);
    }
    if let Some(items) = list.as_array_mut() {
        let exists = items
            .iter()
            .any(|v| v.get("name").and_then(|n| n.as_str()) == Some(name));
        if !exists {
            items.push(json!({ "@type": "PropertyValue", "name": name, "value": value }));
        }
    }
}

/// First usable URL string out of an image-shaped property value
fn image_url_value(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Object(obj) => obj
            .get("url")
            .or_else(|| obj.get("@id"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        JsonValue::Array(items) => items
            .iter()
            .find_map(|v| image_url_value(Some(v))),
        _ => None,
    }
}

/// Strip site-name separators and known trailing words from a page title
fn strip_known_suffixes(name: &str) -> String {
    let mut s = name;
    for sep in [" | ", " – ", " - "] {
        if let Some(pos) = s.find(sep) {
            s = &s[..pos];
        }
    }
    let mut out = s.trim().to_string();
    loop {
        let next = NAME_SUFFIX_RE.replace(&out, "").trim().to_string();
        if next == out {
            break;
        }
        out = next;
    }
    out
}

/// "glen-ardach" → "Glen Ardach"
fn title_case(segment: &str) -> String {
    segment
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_graph;

    const ORIGIN: &str = "https://www.example.com";

    fn org_config() -> OrgConfig {
        OrgConfig {
            name: "Glen Ardach Distillery".to_string(),
            url: "https://www.example.com/".to_string(),
            description: "Independent highland distillery.".to_string(),
            logo_url: "https://www.example.com/img/site-logo.png".to_string(),
            same_as: vec!["https://www.wikidata.org/wiki/Q999001".to_string()],
            founding_year: 1897,
            founder: "A. Ardach".to_string(),
            street_address: "1 Distillery Lane".to_string(),
            address_locality: "Glen Ardach".to_string(),
            postal_code: "AB12 3CD".to_string(),
            address_country: "GB".to_string(),
        }
    }

    fn run(draft: &str, classification: &PageClassification, html: &str) -> Graph {
        let graph = parse_graph(draft).unwrap();
        canonicalize(&graph, classification, html, &org_config(), ORIGIN)
    }

    #[test]
    fn synthesizes_website_with_publisher() {
        let out = run(r#"{"@graph": []}"#, &PageClassification::default(), "");

        let sites: Vec<_> = out
            .nodes
            .iter()
            .filter(|n| n.id == website_id(ORIGIN))
            .collect();
        assert_eq!(sites.len(), 1);
        assert!(sites[0].has_type("WebSite"));
        assert_eq!(
            reference_id(sites[0].properties.get("publisher").unwrap()),
            Some(organization_id(ORIGIN).as_str())
        );
    }

    #[test]
    fn collapses_duplicate_well_known_nodes() {
        let site_id = website_id(ORIGIN);
        let org_id = organization_id(ORIGIN);
        let draft = format!(
            r#"{{"@graph": [
                {{"@id": "{site_id}", "@type": "WebSite", "name": "dupe one"}},
                {{"@id": "{site_id}", "@type": "WebSite", "name": "dupe two"}},
                {{"@id": "{org_id}", "@type": "Organization", "name": "stale"}},
                {{"@id": "{org_id}", "name": "also stale"}}
            ]}}"#
        );

        let out = run(&draft, &PageClassification::default(), "");
        assert_eq!(out.nodes.iter().filter(|n| n.id == site_id).count(), 1);
        assert_eq!(out.nodes.iter().filter(|n| n.id == org_id).count(), 1);
    }

    #[test]
    fn organization_config_is_authoritative() {
        let org_id = organization_id(ORIGIN);
        let draft = format!(
            r#"{{"@graph": [
                {{"@id": "{org_id}", "@type": "Organization",
                 "name": "Hallucinated Name", "description": "made up", "employees": 4000}}
            ]}}"#
        );

        let out = run(&draft, &PageClassification::default(), "");
        let org = out.nodes.iter().find(|n| n.id == org_id).unwrap();
        assert_eq!(org.str_property("name"), Some("Glen Ardach Distillery"));
        assert_eq!(org.str_property("foundingDate"), Some("1897"));
        assert!(org.properties.get("employees").is_none());
        assert_eq!(org.properties["founder"]["name"], "A. Ardach");
        assert_eq!(org.properties["address"]["addressCountry"], "GB");
    }

    #[test]
    fn page_nodes_are_linked_to_site_and_publisher() {
        let draft = r#"{"@graph": [
            {"@id": "https://www.example.com/about/", "@type": "WebPage", "name": "About",
             "isPartOf": {"@id": "wrong"}, "publisher": "malformed string"}
        ]}"#;

        let out = run(draft, &PageClassification::default(), "");
        let page = out.first_of_type("WebPage").unwrap();
        assert_eq!(
            reference_id(&page.properties["isPartOf"]),
            Some(website_id(ORIGIN).as_str())
        );
        assert_eq!(
            reference_id(&page.properties["publisher"]),
            Some(organization_id(ORIGIN).as_str())
        );
    }

    #[test]
    fn suppressed_faq_nodes_are_removed() {
        let draft = r#"{"@graph": [
            {"@id": "faq", "@type": "FAQPage", "name": "FAQ"},
            {"@id": "q1", "@type": "Question", "name": "Q?"},
            {"@id": "mixed", "@type": ["WebPage", "FAQPage"], "name": "Page"}
        ]}"#;

        let classification = PageClassification::default(); // hasFaq false, auto
        let out = run(draft, &classification, "");

        assert!(out.nodes.iter().all(|n| !n.has_type("FAQPage")));
        assert!(out.nodes.iter().all(|n| !n.has_type("Question")));

        // Mixed-type node survives with the FAQ tag dropped.
        let mixed = out.nodes.iter().find(|n| n.id == "mixed").unwrap();
        assert_eq!(mixed.types, vec!["WebPage"]);
    }

    #[test]
    fn faq_nodes_survive_when_allowed() {
        let draft = r#"{"@graph": [{"@id": "faq", "@type": "FAQPage"}]}"#;
        let classification = PageClassification {
            has_faq: true,
            ..Default::default()
        };
        let out = run(draft, &classification, "");
        assert!(out.nodes.iter().any(|n| n.has_type("FAQPage")));
    }

    #[test]
    fn dangling_list_references_are_filtered_or_dropped() {
        let draft = r#"{"@graph": [
            {"@id": "page", "@type": "WebPage", "name": "P",
             "hasPart": [{"@id": "exists"}, {"@id": "ghost"}],
             "relatedLink": [{"@id": "phantom"}],
             "sameAs": [{"@id": "https://other.site/profile"}]},
            {"@id": "exists", "@type": "Thing"}
        ]}"#;

        let out = run(draft, &PageClassification::default(), "");
        let page = out.nodes.iter().find(|n| n.id == "page").unwrap();

        let parts = page.properties["hasPart"].as_array().unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(reference_id(&parts[0]), Some("exists"));

        // Emptied list property is removed, not left as [].
        assert!(page.properties.get("relatedLink").is_none());

        // External references are exempt from local integrity.
        assert!(page.properties.get("sameAs").is_some());
    }

    #[test]
    fn references_to_origin_extending_hosts_survive_pruning() {
        let draft = r#"{"@graph": [
            {"@id": "page", "@type": "WebPage", "name": "P",
             "sameAs": [{"@id": "https://www.example.community/profile"}],
             "subjectOf": {"@id": "https://www.example.com:8443/mirror"}}
        ]}"#;

        let out = run(draft, &PageClassification::default(), "");
        let page = out.nodes.iter().find(|n| n.id == "page").unwrap();

        let same_as = page.properties["sameAs"].as_array().unwrap();
        assert_eq!(
            reference_id(&same_as[0]),
            Some("https://www.example.community/profile")
        );
        assert_eq!(
            reference_id(&page.properties["subjectOf"]),
            Some("https://www.example.com:8443/mirror")
        );
    }

    fn brand_detail_classification() -> PageClassification {
        PageClassification {
            domain: "whisky".to_string(),
            page_type: Some("brand".to_string()),
            strength_abv: Some(43.0),
            style: Some("highland single malt".to_string()),
            external_id: Some("https://www.wikidata.org/wiki/Q555777".to_string()),
            ..Default::default()
        }
    }

    const DETAIL_DRAFT: &str = r#"{"@graph": [
        {"@id": "https://www.example.com/brands/glen-ardach/", "@type": "WebPage",
         "name": "Glen Ardach 12 | Glen Ardach Distillery",
         "url": "https://www.example.com/brands/glen-ardach/",
         "about": {"@id": "brand-node"}},
        {"@id": "brand-node", "@type": "Brand", "name": "Glen Ardach",
         "description": "A venerable highland brand.",
         "offers": {"price": 39.95},
         "logo": "https://www.example.com/img/glen-ardach-logo.png"}
    ]}"#;

    #[test]
    fn synthesizes_primary_entity_with_clean_name() {
        let out = run(DETAIL_DRAFT, &brand_detail_classification(), "");

        let entity = out.first_of_type("Product").unwrap();
        assert_eq!(entity.str_property("name"), Some("Glen Ardach 12"));
        assert_eq!(entity.str_property("description"), Some("A venerable highland brand."));
        // Offer data never transfers.
        assert!(entity.properties.get("offers").is_none());

        let page = out.first_of_type("WebPage").unwrap();
        assert_eq!(
            reference_id(&page.properties["mainEntity"]),
            Some(entity.id.as_str())
        );
        assert_eq!(
            reference_id(&page.properties["about"]),
            Some(entity.id.as_str())
        );
    }

    #[test]
    fn display_name_falls_back_to_url_segment() {
        let draft = r#"{"@graph": [
            {"@id": "https://www.example.com/brands/glen-ardach/", "@type": "WebPage",
             "url": "https://www.example.com/brands/glen-ardach/"}
        ]}"#;

        let out = run(draft, &brand_detail_classification(), "");
        let entity = out.first_of_type("Product").unwrap();
        assert_eq!(entity.str_property("name"), Some("Glen Ardach"));
    }

    #[test]
    fn brand_node_is_reduced_to_link_shape() {
        let out = run(DETAIL_DRAFT, &brand_detail_classification(), "");
        let brand = out.nodes.iter().find(|n| n.id == "brand-node").unwrap();

        assert!(brand.properties.get("description").is_none());
        assert!(brand.properties.get("offers").is_none());
        assert_eq!(brand.str_property("name"), Some("Glen Ardach"));
        assert!(brand.properties.contains_key("image"));
        assert!(brand.properties.contains_key("logo"));

        let entity = out.first_of_type("Product").unwrap();
        assert_eq!(reference_id(&entity.properties["brand"]), Some("brand-node"));
    }

    #[test]
    fn hero_falls_back_to_brand_logo_without_markup() {
        let out = run(DETAIL_DRAFT, &brand_detail_classification(), "");
        let entity = out.first_of_type("Product").unwrap();
        assert_eq!(
            entity.str_property("image"),
            Some("https://www.example.com/img/glen-ardach-logo.png")
        );
    }

    #[test]
    fn logo_falls_through_to_org_logo() {
        let draft = r#"{"@graph": [
            {"@id": "https://www.example.com/brands/glen-ardach/", "@type": "WebPage",
             "name": "Glen Ardach 12",
             "url": "https://www.example.com/brands/glen-ardach/"},
            {"@id": "brand-node", "@type": "Brand", "name": "Glen Ardach"}
        ]}"#;

        let out = run(draft, &brand_detail_classification(), "");
        let brand = out.nodes.iter().find(|n| n.id == "brand-node").unwrap();
        assert_eq!(
            brand.str_property("logo"),
            Some("https://www.example.com/img/site-logo.png")
        );

        // With no markup and no brand imagery, the hero lands there too.
        let entity = out.first_of_type("Product").unwrap();
        assert_eq!(
            entity.str_property("image"),
            Some("https://www.example.com/img/site-logo.png")
        );
    }

    #[test]
    fn markup_hero_outranks_brand_fallback() {
        let html = r#"<html><head>
            <meta property="og:image" content="/img/glen-ardach-hero.jpg">
        </head></html>"#;

        let out = run(DETAIL_DRAFT, &brand_detail_classification(), html);
        let entity = out.first_of_type("Product").unwrap();
        assert_eq!(
            entity.str_property("image"),
            Some("https://www.example.com/img/glen-ardach-hero.jpg")
        );

        let page = out.first_of_type("WebPage").unwrap();
        assert_eq!(page.str_property("image"), entity.str_property("image"));
    }

    #[test]
    fn classification_extras_become_additional_properties() {
        let out = run(DETAIL_DRAFT, &brand_detail_classification(), "");
        let entity = out.first_of_type("Product").unwrap();
        let extras = entity.properties["additionalProperty"].as_array().unwrap();

        assert!(extras.iter().any(|v| v["name"] == "abv" && v["value"] == 43.0));
        assert!(extras.iter().any(|v| v["name"] == "style"));
    }

    #[test]
    fn breadcrumbs_are_forced_to_three_levels() {
        let draft = r#"{"@graph": [
            {"@id": "https://www.example.com/brands/glen-ardach/", "@type": "WebPage",
             "name": "Glen Ardach 12",
             "url": "https://www.example.com/brands/glen-ardach/"},
            {"@id": "bc", "@type": "BreadcrumbList",
             "itemListElement": [{"@type": "ListItem", "position": 1, "name": "Weird"}]}
        ]}"#;

        let out = run(draft, &brand_detail_classification(), "");
        let crumbs: Vec<_> = out
            .nodes
            .iter()
            .filter(|n| n.has_type("BreadcrumbList"))
            .collect();
        assert_eq!(crumbs.len(), 1);

        let items = crumbs[0].properties["itemListElement"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["name"], "Home");
        assert_eq!(items[1]["name"], "Brands");
        assert_eq!(items[2]["name"], "Glen Ardach 12");

        let page = out.first_of_type("WebPage").unwrap();
        assert_eq!(
            reference_id(&page.properties["breadcrumb"]),
            Some(crumbs[0].id.as_str())
        );
    }

    #[test]
    fn external_identifier_is_appended_once() {
        let out = run(DETAIL_DRAFT, &brand_detail_classification(), "");
        let entity = out.first_of_type("Product").unwrap();
        let same_as = entity.properties["sameAs"].as_array().unwrap();
        assert_eq!(same_as.len(), 1);
        assert_eq!(same_as[0], "https://www.wikidata.org/wiki/Q555777");
    }

    #[test]
    fn collection_entries_are_rewritten_to_references() {
        let draft = r#"{"@graph": [
            {"@id": "https://www.example.com/brands/", "@type": ["WebPage", "CollectionPage"],
             "name": "Brands",
             "mainEntity": {"@type": "ItemList", "itemListElement": [
                {"@type": "ListItem", "name": "Glen Ardach",
                 "url": "https://www.example.com/brands/glen-ardach/"},
                {"@type": "ListItem", "name": "Unknown",
                 "url": "https://www.example.com/brands/unknown/"}
             ]}},
            {"@id": "entity-1", "@type": "Product",
             "url": "https://www.example.com/brands/glen-ardach/"}
        ]}"#;

        let classification = PageClassification {
            domain: "whisky".to_string(),
            page_type: Some("brand-index".to_string()),
            ..Default::default()
        };
        let out = run(draft, &classification, "");

        let page = out
            .nodes
            .iter()
            .find(|n| n.has_type("CollectionPage"))
            .unwrap();
        let items = page.properties["mainEntity"]["itemListElement"]
            .as_array()
            .unwrap();
        assert_eq!(reference_id(&items[0]), Some("entity-1"));
        // Unmatched entries stay as-is.
        assert!(reference_id(&items[1]).is_none());
        assert_eq!(items[1]["name"], "Unknown");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        for (draft, classification) in [
            (DETAIL_DRAFT, brand_detail_classification()),
            (
                r#"{"@graph": [{"@id": "q", "@type": "Question"}]}"#,
                PageClassification::default(),
            ),
        ] {
            let once = run(draft, &classification, "");
            let twice = canonicalize(&once, &classification, "", &org_config(), ORIGIN);
            assert_eq!(
                serde_json::to_value(&once).unwrap(),
                serde_json::to_value(&twice).unwrap()
            );
        }
    }

    #[test]
    fn title_case_handles_slugs() {
        assert_eq!(title_case("glen-ardach"), "Glen Ardach");
        assert_eq!(title_case("glen_ardach_12"), "Glen Ardach 12");
        assert_eq!(title_case("plain"), "Plain");
    }

    #[test]
    fn known_suffixes_are_stripped() {
        assert_eq!(
            strip_known_suffixes("Glen Ardach 12 | Glen Ardach Distillery"),
            "Glen Ardach 12"
        );
        assert_eq!(strip_known_suffixes("Glen Ardach 12 Review"), "Glen Ardach 12");
        assert_eq!(strip_known_suffixes("Glen Ardach 12 prices"), "Glen Ardach 12");
        assert_eq!(strip_known_suffixes("Glen Ardach 12"), "Glen Ardach 12");
    }
}
