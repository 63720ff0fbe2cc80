//! Priority-ordered matcher collections.

use std::fmt;

use crate::matcher::{Extracted, Matcher};

/// An ordered collection of matchers, kept sorted by descending priority.
///
/// Sets only ever grow. Matchers with equal priority keep the order in which
/// they were inserted, so the first one registered is the first one tried.
#[derive(Clone)]
pub struct MatcherSet<E> {
    matchers: Vec<Matcher<E>>,
}

impl<E> MatcherSet<E> {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            matchers: Vec::new(),
        }
    }

    /// Adds a matcher and restores priority order.
    pub fn insert(&mut self, matcher: Matcher<E>) {
        self.matchers.push(matcher);
        // `sort_by` is stable, which is what keeps registration order among ties.
        self.matchers.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Iterates matchers in the order they are tried.
    pub fn iter(&self) -> std::slice::Iter<'_, Matcher<E>> {
        self.matchers.iter()
    }

    /// Returns the number of matchers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// Returns `true` when no matcher has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Returns every matcher that claims `path`, in the order they are tried,
    /// with the value it extracts and the remainder it leaves.
    pub fn candidates<'s, 'p>(
        &'s self,
        path: &'p str,
    ) -> impl Iterator<Item = (&'s Matcher<E>, Extracted, &'p str)> + 's
    where
        'p: 's,
    {
        self.matchers.iter().filter_map(move |matcher| {
            matcher
                .check(path)
                .map(|(value, rest)| (matcher, value, rest))
        })
    }

    /// Returns the first matcher that claims `path`.
    #[must_use]
    pub fn first_match<'s, 'p>(
        &'s self,
        path: &'p str,
    ) -> Option<(&'s Matcher<E>, Extracted, &'p str)>
    where
        'p: 's,
    {
        self.candidates(path).next()
    }
}

impl<E> Default for MatcherSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, E> IntoIterator for &'a MatcherSet<E> {
    type Item = &'a Matcher<E>;
    type IntoIter = std::slice::Iter<'a, Matcher<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<E> fmt::Debug for MatcherSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.matchers.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatcherKind;
    use proptest::prelude::*;

    fn names(set: &MatcherSet<&'static str>) -> Vec<&'static str> {
        set.iter().map(|m| *m.execute()).collect()
    }

    #[test]
    fn test_literal_preferred_over_string_regardless_of_order() {
        let mut set = MatcherSet::new();
        set.insert(Matcher::new(MatcherKind::String, "string"));
        set.insert(Matcher::new(MatcherKind::literal("me"), "me"));

        let (matcher, value, rest) = set.first_match("/me").unwrap();
        assert_eq!(*matcher.execute(), "me");
        assert_eq!(value, Extracted::Unit);
        assert_eq!(rest, "");

        let (matcher, value, _) = set.first_match("/you").unwrap();
        assert_eq!(*matcher.execute(), "string");
        assert_eq!(value, Extracted::Text("you".into()));
    }

    #[test]
    fn test_ties_keep_registration_order() {
        let mut set = MatcherSet::new();
        set.insert(Matcher::new(MatcherKind::SignedInt, "int"));
        set.insert(Matcher::new(MatcherKind::String, "string"));
        set.insert(Matcher::new(MatcherKind::literal("a"), "a"));
        set.insert(Matcher::new(MatcherKind::Float, "float"));
        set.insert(Matcher::new(MatcherKind::Remainder, "rest"));

        assert_eq!(names(&set), ["a", "rest", "int", "string", "float"]);
    }

    #[test]
    fn test_candidates_yield_every_claim() {
        let mut set = MatcherSet::new();
        set.insert(Matcher::new(MatcherKind::String, "string"));
        set.insert(Matcher::new(MatcherKind::SignedInt, "int"));
        set.insert(Matcher::new(MatcherKind::literal("x"), "x"));

        let claimed: Vec<_> = set.candidates("/12/z").map(|(m, _, _)| *m.execute()).collect();
        assert_eq!(claimed, ["string", "int"]);
    }

    #[test]
    fn test_empty_set() {
        let set: MatcherSet<()> = MatcherSet::default();
        assert!(set.is_empty());
        assert!(set.first_match("/anything").is_none());
    }

    fn kind_strategy() -> impl Strategy<Value = MatcherKind> {
        prop_oneof![
            "[a-z]{1,4}".prop_map(MatcherKind::Literal),
            Just(MatcherKind::SignedInt),
            Just(MatcherKind::UnsignedInt),
            Just(MatcherKind::Float),
            Just(MatcherKind::String),
            Just(MatcherKind::Remainder),
        ]
    }

    proptest! {
        #[test]
        fn prop_sorted_descending_and_stable(kinds in proptest::collection::vec(kind_strategy(), 0..16)) {
            let mut set = MatcherSet::new();
            for (index, kind) in kinds.iter().enumerate() {
                set.insert(Matcher::new(kind.clone(), index));
            }

            let order: Vec<_> = set.iter().map(|m| (m.priority(), *m.execute())).collect();
            for pair in order.windows(2) {
                prop_assert!(pair[0].0 >= pair[1].0);
                if pair[0].0 == pair[1].0 {
                    prop_assert!(pair[0].1 < pair[1].1);
                }
            }
            prop_assert_eq!(set.len(), kinds.len());
        }
    }
}
