//! End-to-end pipeline tests: parse → canonicalize → validate → charter

use ldforge_core::types::{FaqMode, OrgConfig, PageClassification};
use ldforge_core::{
    canonicalize, check_charter, organization_id, parse_graph, to_pretty_string, validate_graph,
    website_id,
};

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

fn brand_classification() -> PageClassification {
    PageClassification {
        domain: "whisky".to_string(),
        page_type: Some("brand".to_string()),
        category: Some("single-malt".to_string()),
        strength_abv: Some(43.0),
        external_id: Some("https://www.wikidata.org/wiki/Q555777".to_string()),
        ..Default::default()
    }
}

// A deliberately messy machine-generated draft: no WebSite node, a stale
// Organization, a dangling hasPart, FAQ content, and an unlinked Brand.
const MESSY_DRAFT: &str = r#"{
    "@context": "https://schema.org",
    "@graph": [
        {"@id": "https://www.example.com/brands/glen-ardach/", "@type": "WebPage",
         "name": "Glen Ardach 12 | Glen Ardach Distillery",
         "url": "https://www.example.com/brands/glen-ardach/",
         "hasPart": [{"@id": "missing-section"}]},
        {"@id": "https://www.example.com/#organization", "@type": "Organization",
         "name": "Hallucinated Distillers Ltd"},
        {"@id": "brand-node", "@type": "Brand", "name": "Glen Ardach",
         "description": "A venerable highland brand.",
         "logo": "https://www.example.com/img/glen-ardach-logo.png"},
        {"@id": "faq-1", "@type": "FAQPage", "name": "Questions"},
        {"@id": "q-1", "@type": "Question", "name": "Is it peated?"}
    ]
}"#;

const PAGE_HTML: &str = r#"<html><head>
    <meta property="og:image" content="/img/glen-ardach-hero.jpg">
    <img src="/img/glen-ardach-bottle.jpg">
</head><body></body></html>"#;

#[test]
fn messy_draft_becomes_valid_canonical_graph() {
    let draft = parse_graph(MESSY_DRAFT).unwrap();
    let canonical = canonicalize(&draft, &brand_classification(), PAGE_HTML, &org_config(), ORIGIN);

    // Exactly one Organization and one WebSite under the fixed ids.
    let org_id = organization_id(ORIGIN);
    let site_id = website_id(ORIGIN);
    assert_eq!(canonical.nodes.iter().filter(|n| n.id == org_id).count(), 1);
    assert_eq!(canonical.nodes.iter().filter(|n| n.id == site_id).count(), 1);

    // Config is authoritative over the hallucinated draft organization.
    let org = canonical.nodes.iter().find(|n| n.id == org_id).unwrap();
    assert_eq!(org.str_property("name"), Some("Glen Ardach Distillery"));

    // FAQ content suppressed by default classification flags.
    assert!(canonical.nodes.iter().all(|n| !n.has_type("FAQPage")));
    assert!(canonical.nodes.iter().all(|n| !n.has_type("Question")));

    // The markup hero landed on both the entity and the page node.
    let entity = canonical.first_of_type("Product").unwrap();
    assert_eq!(
        entity.str_property("image"),
        Some("https://www.example.com/img/glen-ardach-hero.jpg")
    );

    // Structural validation passes, with no dangling references left.
    let report = validate_graph(&canonical, Some(ORIGIN));
    assert!(report.valid, "issues: {:?}", report.issues);
    assert!(report
        .issues
        .iter()
        .all(|i| i.category != "dangling-reference"));

    // Charter check is clean apart from the off-site brand-node id.
    let warnings = check_charter(&canonical, &brand_classification());
    assert!(
        warnings.iter().all(|w| !w.contains("charter violation")),
        "warnings: {warnings:?}"
    );
}

#[test]
fn canonical_output_is_a_fixed_point() {
    let draft = parse_graph(MESSY_DRAFT).unwrap();
    let classification = brand_classification();
    let org = org_config();

    let once = canonicalize(&draft, &classification, PAGE_HTML, &org, ORIGIN);

    // Round-trip through the serialized form, as a real re-run would.
    let printed = to_pretty_string(&once).unwrap();
    let reparsed = parse_graph(&printed).unwrap();
    let twice = canonicalize(&reparsed, &classification, PAGE_HTML, &org, ORIGIN);

    assert_eq!(
        serde_json::to_value(&once).unwrap(),
        serde_json::to_value(&twice).unwrap()
    );
}

#[test]
fn reference_integrity_holds_after_canonicalization() {
    let draft = parse_graph(MESSY_DRAFT).unwrap();
    let canonical = canonicalize(&draft, &brand_classification(), "", &org_config(), ORIGIN);

    let index = ldforge_core::GraphIndex::from_graph(&canonical);
    for node in &canonical.nodes {
        for edge in index.outgoing(&node.id) {
            let resolvable = index.contains(&edge.target);
            let external = edge.target.starts_with("http") && !edge.target.starts_with(ORIGIN);
            assert!(
                resolvable || external,
                "node '{}' property '{}' points at unresolvable '{}'",
                node.id,
                edge.predicate,
                edge.target
            );
        }
    }
}

#[test]
fn forced_faq_mode_keeps_faq_content() {
    let classification = PageClassification {
        domain: "whisky".to_string(),
        faq_mode: FaqMode::Forced,
        ..Default::default()
    };

    let draft = parse_graph(MESSY_DRAFT).unwrap();
    let canonical = canonicalize(&draft, &classification, "", &org_config(), ORIGIN);
    assert!(canonical.nodes.iter().any(|n| n.has_type("FAQPage")));

    // And the charter checker has nothing to say about FAQ presence.
    let warnings = check_charter(&canonical, &classification);
    assert!(warnings.iter().all(|w| !w.contains("FAQ")));
}

#[test]
fn charter_flags_faq_left_behind_by_a_foreign_canonicalizer() {
    // A graph canonicalized elsewhere with FAQ nodes still in it.
    let raw = r#"{"@context": "https://schema.org", "@graph": [
        {"@id": "https://www.example.com/#website", "@type": "WebSite",
         "publisher": {"@id": "https://www.example.com/#organization"}},
        {"@id": "https://www.example.com/#organization", "@type": "Organization",
         "name": "X", "url": "https://www.example.com/"},
        {"@id": "faq", "@type": "FAQPage"}
    ]}"#;

    let graph = parse_graph(raw).unwrap();
    let warnings = check_charter(&graph, &PageClassification::default());
    assert!(warnings.iter().any(|w| w.contains("FAQ")));
}

#[test]
fn unparseable_draft_fails_before_canonicalization() {
    assert!(parse_graph("not json at all").is_err());
    assert!(parse_graph(r#"{"@context": "https://schema.org"}"#).is_err());
}
