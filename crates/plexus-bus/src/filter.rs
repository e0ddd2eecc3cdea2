// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription filters for broadcast delivery.

use plexus_core::{Category, Kind};

/// Which broadcast messages a subscriber wants.
///
/// A message matches when both its kind and its category are listed. An
/// empty filter matches no broadcast at all; such a subscriber only receives
/// messages explicitly addressed to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    kinds: Vec<Kind>,
    categories: Vec<Category>,
}

impl Filter {
    /// Create an empty filter that matches nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter for exactly one (kind, category) pair.
    pub fn only(kind: Kind, category: Category) -> Self {
        Self::new().kind(kind).category(category)
    }

    /// Also accept `kind`.
    pub fn kind(mut self, kind: Kind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    /// Also accept `category`.
    pub fn category(mut self, category: Category) -> Self {
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
        self
    }

    /// Whether a broadcast of `(kind, category)` passes.
    pub fn matches(&self, kind: Kind, category: Category) -> bool {
        self.kinds.contains(&kind) && self.categories.contains(&category)
    }

    /// Whether no kind or no category was added.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty() || self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_listed_pairs_only() {
        let f = Filter::new()
            .kind(Kind::DataList)
            .kind(Kind::Data)
            .category(Category::Request);
        assert!(f.matches(Kind::Data, Category::Request));
        assert!(f.matches(Kind::DataList, Category::Request));
        assert!(!f.matches(Kind::Data, Category::Response));
        assert!(!f.matches(Kind::Identify, Category::Request));
    }

    #[test]
    fn empty_filter_matches_nothing() {
        let f = Filter::new().kind(Kind::Identify);
        assert!(f.is_empty());
        assert!(!f.matches(Kind::Identify, Category::Request));
        assert!(!f.matches(Kind::Identify, Category::Response));
    }

    #[test]
    fn duplicate_entries_are_collapsed() {
        let a = Filter::only(Kind::Action, Category::Request).kind(Kind::Action);
        assert_eq!(a, Filter::only(Kind::Action, Category::Request));
    }
}
