//! Matcher kinds and extraction.

use std::fmt;

use percent_encoding::percent_decode_str;

use crate::cursor::consume_until_slash;

/// Matching priority. Higher values are tried first.
pub type Priority = u8;

/// Priority of literal and remainder matchers.
pub const HIGH_PRIORITY: Priority = 2;

/// Priority of typed and string captures.
pub const LOW_PRIORITY: Priority = 1;

/// The kind of path a matcher claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatcherKind {
    /// Exactly one segment equal to the given text.
    ///
    /// The empty literal matches an empty segment, which is what the root
    /// path `/` consists of.
    Literal(String),
    /// One segment that parses as an `i64`.
    SignedInt,
    /// One segment that parses as a `u64`.
    UnsignedInt,
    /// One segment that parses as an `f64`.
    Float,
    /// One non-empty, percent-decodable segment.
    String,
    /// Everything that is left, as long as it is more than a lone slash.
    Remainder,
}

impl MatcherKind {
    /// Creates a literal matcher kind.
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Returns the priority used to order this kind inside a set.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        match self {
            Self::Literal(_) | Self::Remainder => HIGH_PRIORITY,
            Self::SignedInt | Self::UnsignedInt | Self::Float | Self::String => LOW_PRIORITY,
        }
    }

    /// Tests `path` against this kind.
    ///
    /// On a match, returns the extracted value and the unconsumed remainder,
    /// which is always a suffix of `path`.
    #[must_use]
    pub fn check<'p>(&self, path: &'p str) -> Option<(Extracted, &'p str)> {
        if matches!(self, Self::Remainder) {
            return (path.len() > 1).then(|| (Extracted::Text(path.to_owned()), &path[path.len()..]));
        }

        let (segment, rest) = consume_until_slash(path);
        let value = match self {
            Self::Literal(text) => (segment == text.as_str()).then_some(Extracted::Unit)?,
            Self::SignedInt => Extracted::Int(segment.parse().ok()?),
            Self::UnsignedInt => {
                // `u64::from_str` tolerates a leading '+', a decimal literal does not.
                if segment.starts_with('+') {
                    return None;
                }
                Extracted::Uint(segment.parse().ok()?)
            }
            Self::Float => Extracted::Float(segment.parse().ok()?),
            Self::String => Extracted::Text(decode_segment(segment)?),
            Self::Remainder => return None,
        };
        Some((value, rest))
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "literal({text:?})"),
            Self::SignedInt => f.write_str("int"),
            Self::UnsignedInt => f.write_str("uint"),
            Self::Float => f.write_str("float"),
            Self::String => f.write_str("string"),
            Self::Remainder => f.write_str("remainder"),
        }
    }
}

/// Percent-decodes a non-empty segment, rejecting malformed escapes and
/// sequences that do not decode to UTF-8.
fn decode_segment(segment: &str) -> Option<String> {
    if segment.is_empty() || !has_valid_escapes(segment) {
        return None;
    }
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(std::borrow::Cow::into_owned)
}

fn has_valid_escapes(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// The value a matcher extracted from the path.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// Literal matchers extract nothing.
    Unit,
    /// Signed integer capture.
    Int(i64),
    /// Unsigned integer capture.
    Uint(u64),
    /// Float capture.
    Float(f64),
    /// Decoded string capture, or the raw remainder.
    Text(String),
}

/// A matcher: a [`MatcherKind`] paired with the continuation to run when it
/// claims a path.
#[derive(Clone)]
pub struct Matcher<E> {
    kind: MatcherKind,
    execute: E,
}

impl<E> Matcher<E> {
    /// Creates a matcher.
    #[must_use]
    pub const fn new(kind: MatcherKind, execute: E) -> Self {
        Self { kind, execute }
    }

    /// Returns the matcher kind.
    #[must_use]
    pub const fn kind(&self) -> &MatcherKind {
        &self.kind
    }

    /// Returns the matcher priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.kind.priority()
    }

    /// Tests `path`; see [`MatcherKind::check`].
    #[must_use]
    pub fn check<'p>(&self, path: &'p str) -> Option<(Extracted, &'p str)> {
        self.kind.check(path)
    }

    /// Returns the continuation.
    #[must_use]
    pub const fn execute(&self) -> &E {
        &self.execute
    }
}

impl<E> fmt::Debug for Matcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("kind", &self.kind)
            .field("priority", &self.priority())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_matches_exact_segment() {
        let kind = MatcherKind::literal("api");
        assert_eq!(kind.check("/api/v1"), Some((Extracted::Unit, "/v1")));
        assert_eq!(kind.check("/apix/v1"), None);
        assert_eq!(kind.check("/API"), None);
    }

    #[test]
    fn test_empty_literal_matches_root() {
        let kind = MatcherKind::literal("");
        assert_eq!(kind.check("/"), Some((Extracted::Unit, "")));
        assert_eq!(kind.check(""), Some((Extracted::Unit, "")));
        assert_eq!(kind.check("/x"), None);
    }

    #[test]
    fn test_signed_int() {
        let kind = MatcherKind::SignedInt;
        assert_eq!(kind.check("/-42/x"), Some((Extracted::Int(-42), "/x")));
        assert_eq!(kind.check("/42"), Some((Extracted::Int(42), "")));
        assert_eq!(kind.check("/42abc"), None);
        assert_eq!(kind.check("/ 42"), None);
        assert_eq!(kind.check("/"), None);
    }

    #[test]
    fn test_unsigned_int() {
        let kind = MatcherKind::UnsignedInt;
        assert_eq!(kind.check("/7"), Some((Extracted::Uint(7), "")));
        assert_eq!(kind.check("/-7"), None);
        assert_eq!(kind.check("/+7"), None);
        assert_eq!(kind.check("/18446744073709551616"), None);
    }

    #[test]
    fn test_float() {
        let kind = MatcherKind::Float;
        assert_eq!(kind.check("/1.5/rest"), Some((Extracted::Float(1.5), "/rest")));
        assert_eq!(kind.check("/-0.25"), Some((Extracted::Float(-0.25), "")));
        assert_eq!(kind.check("/1.5x"), None);
    }

    #[test]
    fn test_string_decodes_and_rejects_empty() {
        let kind = MatcherKind::String;
        assert_eq!(
            kind.check("/hello%20world/x"),
            Some((Extracted::Text("hello world".into()), "/x"))
        );
        assert_eq!(kind.check("/"), None);
        assert_eq!(kind.check(""), None);
    }

    #[test]
    fn test_string_rejects_malformed_escapes() {
        let kind = MatcherKind::String;
        assert_eq!(kind.check("/bad%zz"), None);
        assert_eq!(kind.check("/bad%2"), None);
        assert_eq!(kind.check("/bad%ff"), None);
    }

    #[test]
    fn test_remainder_takes_everything() {
        let kind = MatcherKind::Remainder;
        assert_eq!(
            kind.check("/a/b/c"),
            Some((Extracted::Text("/a/b/c".into()), ""))
        );
        assert_eq!(kind.check("/"), None);
        assert_eq!(kind.check(""), None);
    }

    #[test]
    fn test_priorities() {
        assert_eq!(MatcherKind::literal("x").priority(), HIGH_PRIORITY);
        assert_eq!(MatcherKind::Remainder.priority(), HIGH_PRIORITY);
        assert_eq!(MatcherKind::SignedInt.priority(), LOW_PRIORITY);
        assert_eq!(MatcherKind::UnsignedInt.priority(), LOW_PRIORITY);
        assert_eq!(MatcherKind::Float.priority(), LOW_PRIORITY);
        assert_eq!(MatcherKind::String.priority(), LOW_PRIORITY);
    }

    #[test]
    fn test_check_does_not_consume_on_mismatch() {
        let matcher = Matcher::new(MatcherKind::SignedInt, ());
        let path = "/abc/def";
        assert!(matcher.check(path).is_none());
        assert_eq!(path, "/abc/def");
    }
}
