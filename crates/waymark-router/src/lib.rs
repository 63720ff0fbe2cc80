//! Segment matchers for the Waymark routing engine.
//!
//! Routing in Waymark is not driven by a route table. Instead, every level of
//! the path is claimed by a [`Matcher`]: a small node that inspects the
//! remaining path, optionally extracts a value from it, and hands the rest of
//! the path to a continuation. Matchers registered at the same level live in a
//! [`MatcherSet`], which keeps them ordered by priority so that literal
//! segments are always tried before generic captures.
//!
//! This crate is transport-agnostic: the continuation type `E` is chosen by
//! the caller (the server crate stores an async-capable closure there).
//!
//! # Example
//!
//! ```rust
//! use waymark_router::{Extracted, Matcher, MatcherKind, MatcherSet};
//!
//! let mut set = MatcherSet::new();
//! set.insert(Matcher::new(MatcherKind::String, "by-name"));
//! set.insert(Matcher::new(MatcherKind::literal("me"), "current-user"));
//!
//! // The literal wins even though it was registered second.
//! let (matcher, value, rest) = set.first_match("/me/settings").unwrap();
//! assert_eq!(*matcher.execute(), "current-user");
//! assert_eq!(value, Extracted::Unit);
//! assert_eq!(rest, "/settings");
//! ```
//!
//! # Priorities
//!
//! | Kind | Priority |
//! |------|----------|
//! | literal, remainder | 2 |
//! | signed, unsigned, float, string | 1 |
//!
//! Equal priorities keep registration order.

mod cursor;
mod matcher;
mod set;

pub use cursor::{consume_until_slash, PathCursor};
pub use matcher::{Extracted, Matcher, MatcherKind, Priority, HIGH_PRIORITY, LOW_PRIORITY};
pub use set::MatcherSet;
