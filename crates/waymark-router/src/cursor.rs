//! Path cursor.
//!
//! A cursor never copies or rewrites the path; every step returns a shorter
//! suffix of the original string, so the position of a cursor inside the
//! request path is always `path.len() - cursor.len()`.

/// Splits the next segment off `path`.
///
/// Any number of leading slashes are skipped. The segment runs up to (not
/// including) the next slash; the remainder starts at that slash, or is empty
/// when there is none.
///
/// # Example
///
/// ```rust
/// use waymark_router::consume_until_slash;
///
/// assert_eq!(consume_until_slash("//api/v1"), ("api", "/v1"));
/// assert_eq!(consume_until_slash("/users"), ("users", ""));
/// assert_eq!(consume_until_slash("/"), ("", ""));
/// ```
#[must_use]
pub fn consume_until_slash(path: &str) -> (&str, &str) {
    let trimmed = path.trim_start_matches('/');
    match trimmed.find('/') {
        Some(end) => trimmed.split_at(end),
        None => (trimmed, ""),
    }
}

/// Immutable cursor over the part of a request path that has not been
/// matched yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathCursor<'a> {
    rest: &'a str,
}

impl<'a> PathCursor<'a> {
    /// Creates a cursor positioned at the start of `path`.
    #[must_use]
    pub const fn new(path: &'a str) -> Self {
        Self { rest: path }
    }

    /// Returns the unmatched part of the path.
    #[must_use]
    pub const fn as_str(&self) -> &'a str {
        self.rest
    }

    /// Returns the number of unmatched bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rest.len()
    }

    /// Returns `true` once the whole path has been consumed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Consumes the next segment, returning it and the advanced cursor.
    #[must_use]
    pub fn next_segment(self) -> (&'a str, Self) {
        let (segment, rest) = consume_until_slash(self.rest);
        (segment, Self { rest })
    }
}

impl<'a> From<&'a str> for PathCursor<'a> {
    fn from(path: &'a str) -> Self {
        Self::new(path)
    }
}
