//! Common types used across ldforge

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A node in a linked-data graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "@id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(
        rename = "@type",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub types: Vec<String>,
    #[serde(flatten)]
    pub properties: Map<String, JsonValue>,
}

/// A linked-data graph: a context tag plus an ordered node list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    #[serde(rename = "@context", default = "default_context")]
    pub context: JsonValue,
    #[serde(rename = "@graph", default)]
    pub nodes: Vec<Node>,
}

fn default_context() -> JsonValue {
    JsonValue::String("https://schema.org".to_string())
}

impl Graph {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            context: default_context(),
            nodes,
        }
    }

    /// First node whose type set includes `ty` (see [`Node::has_type`])
    pub fn first_of_type(&self, ty: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.has_type(ty))
    }
}

impl Node {
    pub fn new(id: impl Into<String>, ty: &str) -> Self {
        Self {
            id: id.into(),
            types: vec![ty.to_string()],
            properties: Map::new(),
        }
    }

    /// Check whether the node carries a schema type, tolerating full IRIs
    /// ("https://schema.org/Product") and case differences.
    pub fn has_type(&self, target: &str) -> bool {
        let target_lower = target.to_lowercase();
        self.types
            .iter()
            .any(|t| shorten_iri(t).to_lowercase() == target_lower)
    }

    /// String value of a property, if present
    pub fn str_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }
}

/// Strip an IRI down to its local name (after the last `#` or `/`)
pub fn shorten_iri(iri: &str) -> &str {
    if let Some(pos) = iri.rfind('#') {
        &iri[pos + 1..]
    } else if let Some(pos) = iri.rfind('/') {
        &iri[pos + 1..]
    } else {
        iri
    }
}

/// Accept `@type` as either a single string or an array of strings
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(match value {
        JsonValue::String(s) => vec![s],
        JsonValue::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                JsonValue::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// How FAQ content is gated for a page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaqMode {
    /// Follow the page's `hasFaq` flag
    #[default]
    Auto,
    /// Always keep FAQ content
    Forced,
    /// Always strip FAQ content
    Off,
}

/// Read-only classification of a content page, supplied by the dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageClassification {
    pub domain: String,
    pub page_type: Option<String>,
    pub category: Option<String>,
    /// Alcohol strength in % ABV, for spirit detail pages
    pub strength_abv: Option<f64>,
    /// Style label, e.g. "peated single malt"
    pub style: Option<String>,
    pub launch_year: Option<i32>,
    /// External canonical identifier (knowledge-base URL)
    pub external_id: Option<String>,
    /// Editor-supplied hero image, overriding markup extraction
    pub hero_image_override: Option<String>,
    pub has_faq: bool,
    pub faq_mode: FaqMode,
    pub is_home_page: bool,
}

impl PageClassification {
    /// Item-detail branch of the canonicalizer
    pub fn is_brand_detail(&self) -> bool {
        self.page_type.as_deref() == Some("brand")
    }

    /// Collection/index branch of the canonicalizer
    pub fn is_brand_index(&self) -> bool {
        self.page_type.as_deref() == Some("brand-index")
    }

    /// Whether FAQ-family nodes may remain in the canonical graph
    pub fn faq_allowed(&self) -> bool {
        match self.faq_mode {
            FaqMode::Forced => true,
            FaqMode::Off => false,
            FaqMode::Auto => self.has_faq,
        }
    }
}

/// A generation ruleset as managed by the dashboard's admin workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: i64,
    pub domain: Option<String>,
    pub page_type: Option<String>,
    pub category: Option<String>,
    /// Opaque instruction text, passed through to the generator
    pub body: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Static organization configuration; authoritative over any draft content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgConfig {
    pub name: String,
    pub url: String,
    pub description: String,
    pub logo_url: String,
    /// External profile links (social accounts, knowledge-base entries)
    #[serde(default)]
    pub same_as: Vec<String>,
    pub founding_year: i32,
    pub founder: String,
    pub street_address: String,
    pub address_locality: String,
    pub postal_code: String,
    pub address_country: String,
}

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One finding from the graph validator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub category: String,
    pub message: String,
    /// Node id the issue concerns, when attributable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ValidationIssue {
    pub fn error(category: &str, message: impl Into<String>, path: Option<String>) -> Self {
        Self {
            severity: Severity::Error,
            category: category.to_string(),
            message: message.into(),
            path,
        }
    }

    pub fn warning(category: &str, message: impl Into<String>, path: Option<String>) -> Self {
        Self {
            severity: Severity::Warning,
            category: category.to_string(),
            message: message.into(),
            path,
        }
    }
}

/// Aggregate counts over a validated graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub type_counts: BTreeMap<String, usize>,
    pub reference_count: usize,
    /// True when the graph carries no commerce data at all: no
    /// Offer/AggregateOffer node and no `price`/`offers` property anywhere
    pub no_commerce_schema: bool,
}

/// Full validator report; `valid` means no error-severity issues
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub stats: GraphStats,
}

/// Where an image candidate was found in the markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateSource {
    /// og:image meta tag
    MetaPrimary,
    /// twitter:image meta tag
    MetaSecondary,
    /// Inline <img> element
    Inline,
}

/// A ranked image URL extracted from page markup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCandidate {
    /// What a viewer would load (possibly an optimizer-wrapped URL)
    pub display_url: String,
    /// Canonical non-wrapped URL to persist
    pub resolved_url: String,
    pub is_wrapped: bool,
    pub source: CandidateSource,
}

/// Outcome of image resolution for one page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedImages {
    pub hero: Option<ImageCandidate>,
    pub logo: Option<ImageCandidate>,
}
