//! # ldforge-core
//!
//! Core engine for canonicalizing and validating JSON-LD/Schema.org
//! graphs attached to content pages.
//!
//! This library provides:
//! - Draft graph parsing with a hard boundary (invalid JSON or a missing
//!   `@graph` array fails the operation; everything else is repaired)
//! - Deterministic canonicalization enforcing fixed structural invariants
//! - Read-only structural validation with a diagnostics report
//! - Advisory charter compliance checking
//! - Specificity-ordered generation-rule selection
//! - Hero/logo image resolution out of raw page markup
//!
//! All components are synchronous pure functions over their explicit
//! inputs: no I/O, no shared state, safe to invoke concurrently for
//! independent pages.
//!
//! ## Example
//!
//! ```
//! use ldforge_core::{canonicalize, parse_graph, validate_graph};
//! use ldforge_core::types::{OrgConfig, PageClassification};
//!
//! # fn example() -> Result<(), ldforge_core::GraphError> {
//! let draft = r#"{"@context": "https://schema.org", "@graph": []}"#;
//! let graph = parse_graph(draft)?;
//!
//! let org = OrgConfig {
//!     name: "Glen Ardach Distillery".into(),
//!     url: "https://www.example.com/".into(),
//!     description: "Independent highland distillery.".into(),
//!     logo_url: "https://www.example.com/img/site-logo.png".into(),
//!     same_as: vec![],
//!     founding_year: 1897,
//!     founder: "A. Ardach".into(),
//!     street_address: "1 Distillery Lane".into(),
//!     address_locality: "Glen Ardach".into(),
//!     postal_code: "AB12 3CD".into(),
//!     address_country: "GB".into(),
//! };
//!
//! let canonical = canonicalize(
//!     &graph,
//!     &PageClassification::default(),
//!     "<html></html>",
//!     &org,
//!     "https://www.example.com",
//! );
//! let report = validate_graph(&canonical, Some("https://www.example.com"));
//! assert!(report.valid);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod canonical;
pub mod charter;
pub mod error;
pub mod images;
pub mod index;
pub mod parser;
pub mod rules;
pub mod types;
pub mod url_utils;
pub mod validate;

// Re-export the component entry points and commonly used types
pub use canonical::{canonicalize, organization_id, website_id};
pub use charter::check_charter;
pub use error::GraphError;
pub use images::resolve_images;
pub use index::GraphIndex;
pub use parser::{parse_graph, to_pretty_string};
pub use rules::select_rule;
pub use types::{
    Graph, GraphStats, ImageCandidate, Node, OrgConfig, PageClassification, ResolvedImages,
    Rule, Severity, ValidationIssue, ValidationResult,
};
pub use validate::{validate, validate_graph};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_ids_derive_from_origin() {
        assert_eq!(
            organization_id("https://www.example.com/some/page"),
            "https://www.example.com/#organization"
        );
        assert_eq!(
            website_id("https://www.example.com"),
            "https://www.example.com/#website"
        );
    }

    #[test]
    fn parse_then_validate_reports_on_draft() {
        let draft = r#"{"@context": "https://schema.org", "@graph": [
            {"@id": "p", "@type": "WebPage", "name": "P",
             "isPartOf": {"@id": "nowhere"}}
        ]}"#;

        let graph = parse_graph(draft).unwrap();
        let report = validate_graph(&graph, None);
        assert!(!report.valid);
        assert!(report
            .issues
            .iter()
            .any(|i| i.category == "dangling-reference"));
    }
}
