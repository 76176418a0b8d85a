//! Category selector algebra.
//!
//! A selector is an order-irrelevant set of `(category, value)` constraints.
//! Composition of two selectors is constraint-set union; matching a label set
//! requires every constraint to be present verbatim. Constraints are keyed by
//! the full `(category_id, value)` pair, so two constraints on the same
//! category are both required to match.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// An atomic classification fact: one value of one tenant-defined category.
/// Attached to edge clusters as a label, or used in selectors as a constraint.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryLabel {
    pub category_id: String,
    pub value: String,
}

impl CategoryLabel {
    pub fn new(category_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
            value: value.into(),
        }
    }
}

/// A conjunction of category constraints used to match edge clusters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    constraints: BTreeSet<CategoryLabel>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn contains(&self, label: &CategoryLabel) -> bool {
        self.constraints.contains(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &CategoryLabel> {
        self.constraints.iter()
    }

    /// Add a single constraint in place.
    pub fn extend_label(&mut self, label: CategoryLabel) {
        self.constraints.insert(label);
    }

    /// AND-composition: the union of both constraint sets.
    pub fn and(&self, other: &Selector) -> Selector {
        let mut constraints = self.constraints.clone();
        constraints.extend(other.constraints.iter().cloned());
        Selector { constraints }
    }

    /// True iff every constraint has an exactly-equal label present.
    /// An empty selector matches everything (vacuous truth).
    pub fn matches(&self, labels: &[CategoryLabel]) -> bool {
        self.constraints.iter().all(|c| labels.contains(c))
    }
}

impl FromIterator<CategoryLabel> for Selector {
    fn from_iter<I: IntoIterator<Item = CategoryLabel>>(iter: I) -> Self {
        Selector {
            constraints: iter.into_iter().collect(),
        }
    }
}

/// An edge cluster's identity together with its category labels, as loaded in
/// a tenant-wide snapshot for resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeClusterLabels {
    pub edge_id: String,
    pub labels: Vec<CategoryLabel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(cat: &str, val: &str) -> CategoryLabel {
        CategoryLabel::new(cat, val)
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        let selector = Selector::new();
        assert!(selector.matches(&[]));
        assert!(selector.matches(&[label("env", "prod")]));
    }

    #[test]
    fn test_single_constraint_match() {
        let selector: Selector = [label("env", "prod")].into_iter().collect();
        assert!(selector.matches(&[label("env", "prod")]));
        assert!(selector.matches(&[label("env", "prod"), label("region", "us")]));
        assert!(!selector.matches(&[label("env", "dev")]));
        assert!(!selector.matches(&[]));
    }

    #[test]
    fn test_constraints_across_categories_are_anded() {
        let selector: Selector = [label("env", "prod"), label("region", "us")]
            .into_iter()
            .collect();
        assert!(selector.matches(&[label("env", "prod"), label("region", "us")]));
        assert!(!selector.matches(&[label("env", "prod")]));
        assert!(!selector.matches(&[label("region", "us")]));
    }

    #[test]
    fn test_same_category_constraints_both_required() {
        // Keyed by the full (category, value) pair: both constraints must be
        // satisfied, there is no per-category OR.
        let selector: Selector = [label("env", "prod"), label("env", "dev")]
            .into_iter()
            .collect();
        assert_eq!(selector.len(), 2);
        assert!(!selector.matches(&[label("env", "prod")]));
        assert!(selector.matches(&[label("env", "prod"), label("env", "dev")]));
    }

    #[test]
    fn test_duplicate_constraints_collapse() {
        let selector: Selector = [label("env", "prod"), label("env", "prod")]
            .into_iter()
            .collect();
        assert_eq!(selector.len(), 1);
    }

    #[test]
    fn test_and_is_union() {
        let a: Selector = [label("env", "prod")].into_iter().collect();
        let b: Selector = [label("region", "us"), label("env", "prod")]
            .into_iter()
            .collect();
        let combined = a.and(&b);
        assert_eq!(combined.len(), 2);
        assert!(combined.contains(&label("env", "prod")));
        assert!(combined.contains(&label("region", "us")));
    }

    #[test]
    fn test_and_with_empty_is_identity() {
        let a: Selector = [label("env", "prod")].into_iter().collect();
        assert_eq!(a.and(&Selector::new()), a);
        assert_eq!(Selector::new().and(&a), a);
    }

    #[test]
    fn test_and_is_order_irrelevant() {
        let a: Selector = [label("env", "prod")].into_iter().collect();
        let b: Selector = [label("region", "us")].into_iter().collect();
        assert_eq!(a.and(&b), b.and(&a));
    }
}
