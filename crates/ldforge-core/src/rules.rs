//! Rule selection by specificity
//!
//! Candidate keys are evaluated in strict order, most specific first:
//! (domain, pageType, category) → (domain, pageType, ∅) → (domain, ∅, ∅)
//! → (∅, ∅, ∅). A level matches on exact key equality (a null slot
//! matches only rules with a null in that slot, never as a wildcard).
//! The first non-empty level wins; within it, the most recently created
//! active rule is returned. Selection is a pure function of the inputs
//! and never depends on slice order.

use tracing::debug;

use crate::types::{PageClassification, Rule};

/// Pick the single applicable ruleset for a classified page.
///
/// Returns `None` when no specificity level yields an active match;
/// callers surface that as [`crate::GraphError::NoMatchingRule`].
pub fn select_rule<'a>(
    classification: &PageClassification,
    rules: &'a [Rule],
) -> Option<&'a Rule> {
    let domain = Some(classification.domain.as_str());
    let page_type = classification.page_type.as_deref();
    let category = classification.category.as_deref();

    let levels = [
        (domain, page_type, category),
        (domain, page_type, None),
        (domain, None, None),
        (None, None, None),
    ];

    for (d, p, c) in levels {
        let found = rules
            .iter()
            .filter(|rule| {
                rule.active
                    && rule.domain.as_deref() == d
                    && rule.page_type.as_deref() == p
                    && rule.category.as_deref() == c
            })
            // Ties on created_at are broken by id so callers get the same
            // answer regardless of how the rule list was ordered.
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        if let Some(rule) = found {
            debug!(rule_id = rule.id, ?d, ?p, ?c, "rule selected");
            return Some(rule);
        }
    }

    None
}
