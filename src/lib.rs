//! Bash-style glob pattern matching.
//!
//! This compiles shell glob patterns into a reusable [`Glob`] matcher and
//! evaluates paths against it, reproducing bash semantics for brace
//! expansion, extended glob groups, globstar, character classes and
//! negation, without invoking a shell. Matching is pure string
//! classification; nothing here ever touches the filesystem.
//!
//! Here's a rather long matching example:
//!
//! ```
//! # use globpatterns::*;
//! # fn test() -> Result<(), ParseError> {
//! let glob = Glob::new("src/**/*.{rs,toml}")?;
//! assert!(glob.matches("src/lib.rs"));
//! assert!(glob.matches("src/deep/nested/mod.rs"));
//! assert!(glob.matches("src/Cargo.toml"));
//! assert!(!glob.matches("src/main.c"));
//! assert!(!glob.matches("tests/basic.rs"));
//!
//! // hidden directories need asking
//! assert!(!glob.matches("src/.hidden/mod.rs"));
//! let glob = Glob::with_options("src/**/*.{rs,toml}", Options::DOT)?;
//! assert!(glob.matches("src/.hidden/mod.rs"));
//!
//! // a leading ! inverts the pattern
//! let glob = Glob::new("!*.min.js")?;
//! assert!(glob.matches("app.js"));
//! assert!(!glob.matches("app.min.js"));
//!
//! // extended glob groups work too
//! let glob = Glob::new("*.!(js)")?;
//! assert!(glob.matches("index.css"));
//! assert!(!glob.matches("index.js"));
//!
//! // one-shot matching and list filtering
//! assert!(glob_match("photo.jpeg", "*.jp?(e)g", Options::default())?);
//! let paths = ["a.rs", "b.c", "c.rs"];
//! assert_eq!(filter_matching(paths, "*.rs", Options::default())?, ["a.rs", "c.rs"]);
//!
//! // the building blocks are exposed as well
//! assert_eq!(expand_braces("a{b,c}d"), ["abd", "acd"]);
//! let pair = balanced("{", "}", "a{b{c}d}e").unwrap();
//! assert_eq!((pair.pre, pair.body, pair.post), ("a", "b{c}d", "e"));
//! # Ok(())
//! # }
//! # test().unwrap()
//! ```

mod balanced;
mod brace;
mod glob;
mod pattern;

#[doc(inline)]
pub use balanced::{Balanced, balanced, balanced_regex};

#[doc(inline)]
pub use brace::expand_braces;

#[doc(inline)]
pub use glob::{Glob, filter_matching, glob_match};

#[doc(inline)]
pub use pattern::{MAX_SEGMENT_LENGTH, Options, ParseError};
