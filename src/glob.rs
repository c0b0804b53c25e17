//! The compiled glob matcher.

use std::borrow::Cow;

use fancy_regex::{Regex, RegexBuilder};
use once_cell::sync::OnceCell;
use tracing::trace;

use crate::brace::expand_braces;
use crate::pattern::{self, Options, ParseError, Segment};

/// A glob pattern compiled for repeated matching.
///
/// Construction classifies the pattern once (negation, comment, empty),
/// expands braces, splits every alternative into `/`-separated segments and
/// compiles each segment. After that the matcher is immutable and can be
/// shared freely between threads.
#[derive(Clone, Debug)]
pub struct Glob {
    /// Pattern text after trimming, separator normalization and negation
    /// stripping.
    pattern: String,

    options: Options,

    /// One entry per brace-expansion alternative, each a list of compiled
    /// path segments.
    set: Vec<Vec<Segment>>,

    negate: bool,
    comment: bool,
    empty: bool,

    /// Whole-pattern regex, built on first use.
    regex: OnceCell<Option<Regex>>,
}

impl Glob {
    /// Compile a pattern with default options.
    pub fn new(pattern: &str) -> Result<Self, ParseError> {
        Self::with_options(pattern, Options::default())
    }

    /// Compile a pattern.
    pub fn with_options(pattern: &str, options: Options) -> Result<Self, ParseError> {
        let pattern = normalize_separators(pattern.trim()).into_owned();
        let mut glob = Glob {
            pattern,
            options,
            set: Vec::new(),
            negate: false,
            comment: false,
            empty: false,
            regex: OnceCell::new(),
        };
        glob.make()?;
        Ok(glob)
    }

    fn make(&mut self) -> Result<(), ParseError> {
        // empty patterns and comments match nothing
        if !self.options.contains(Options::NO_COMMENT) && self.pattern.starts_with('#') {
            self.comment = true;
            return Ok(());
        }
        if self.pattern.is_empty() {
            self.empty = true;
            return Ok(());
        }

        self.parse_negate();

        let glob_set = self.brace_expand();
        if self.options.contains(Options::DEBUG) {
            trace!(pattern = %self.pattern, ?glob_set, "expanded braces");
        }

        let mut set = Vec::with_capacity(glob_set.len());
        for alternative in &glob_set {
            let mut segments = Vec::new();
            for part in split_on_slashes(alternative) {
                segments.push(pattern::compile(part, self.options)?);
            }
            set.push(segments);
        }
        if self.options.contains(Options::DEBUG) {
            trace!(pattern = %self.pattern, alternatives = set.len(), "compiled pattern set");
        }

        self.set = set;
        Ok(())
    }

    // a leading run of ! characters toggles negation
    fn parse_negate(&mut self) {
        if self.options.contains(Options::NO_NEGATE) {
            return;
        }
        let stripped = self.pattern.trim_start_matches('!');
        let count = self.pattern.len() - stripped.len();
        if count > 0 {
            self.pattern = stripped.to_string();
        }
        self.negate = count % 2 == 1;
    }

    // brace expansion is skipped when disabled or when no open brace comes
    // before a close brace
    fn brace_expand(&self) -> Vec<String> {
        let open = self.pattern.find('{').map_or(-1, |i| i as isize);
        let close = self.pattern.find('}').map_or(-1, |i| i as isize);
        if self.options.contains(Options::NO_BRACE) || open >= close {
            return vec![self.pattern.clone()];
        }
        expand_braces(&self.pattern)
    }

    /// The normalized pattern text (trimmed, separators unified, negation
    /// markers stripped).
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The options the pattern was compiled with.
    pub fn options(&self) -> Options {
        self.options
    }

    /// Whether the pattern was negated with a leading `!`.
    pub fn negated(&self) -> bool {
        self.negate
    }

    /// Whether the pattern is a `#` comment and matches nothing.
    pub fn is_comment(&self) -> bool {
        self.comment
    }

    /// Whether the pattern is empty and matches only the empty path.
    pub fn is_empty_pattern(&self) -> bool {
        self.empty
    }

    /// Whether `path` matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.matches_do(path, false)
    }

    /// Like [`matches`](Glob::matches), but running out of path segments
    /// while a globstar is still swallowing counts as a match. Useful to
    /// test whether a directory prefix could still lead to a full match.
    pub fn matches_partial(&self, path: &str) -> bool {
        self.matches_do(path, true)
    }

    fn matches_do(&self, path: &str, partial: bool) -> bool {
        // comments match nothing, the empty pattern matches only ""
        if self.comment {
            return false;
        }
        if self.empty {
            return path.is_empty();
        }
        if partial && path == "/" {
            return true;
        }

        let path = normalize_separators(path);
        let file = split_on_slashes(&path);
        if self.options.contains(Options::DEBUG) {
            trace!(pattern = %self.pattern, ?file, "matching split path");
        }

        // the basename is the last non-empty segment
        let basename = [file
            .iter()
            .rev()
            .find(|segment| !segment.is_empty())
            .copied()
            .unwrap_or("")];

        // one alternative matching is enough either way, so the first hit
        // decides
        for alternative in &self.set {
            let candidate: &[&str] =
                if self.options.contains(Options::MATCH_BASE) && alternative.len() == 1 {
                    &basename
                } else {
                    &file
                };
            if self.match_one(candidate, alternative, partial) {
                if self.options.contains(Options::FLIP_NEGATE) {
                    return true;
                }
                return !self.negate;
            }
        }

        // no hits: success for a negated pattern, failure otherwise
        if self.options.contains(Options::FLIP_NEGATE) {
            false
        } else {
            self.negate
        }
    }

    // Walk the path and pattern segments in lockstep. A globstar tries the
    // rest of the pattern against every suffix of the remaining path:
    //
    // a/**/b/**/c matching a/b/x/y/z/c
    // - a matches a
    // - doublestar
    //   - match_one(b/x/y/z/c, b/**/c)
    //     - b matches b
    //     - doublestar
    //       - match_one(x/y/z/c, c) -> no
    //       - match_one(y/z/c, c) -> no
    //       - match_one(z/c, c) -> no
    //       - match_one(c, c) -> hit
    fn match_one(&self, file: &[&str], pattern: &[Segment], partial: bool) -> bool {
        let dot = self.options.contains(Options::DOT);
        let mut fi = 0;
        let mut pi = 0;

        while fi < file.len() && pi < pattern.len() {
            let hit = match &pattern[pi] {
                Segment::Globstar => {
                    let pr = pi + 1;
                    if pr == pattern.len() {
                        // a trailing ** swallows the rest, but never . or
                        // .., and dotfiles only when asked
                        return file[fi..].iter().all(|f| !never_swallowed(f, dot));
                    }

                    let mut fr = fi;
                    while fr < file.len() {
                        let swallowee = file[fr];
                        if self.match_one(&file[fr..], &pattern[pr..], partial) {
                            return true;
                        }
                        if never_swallowed(swallowee, dot) {
                            break;
                        }
                        // swallow a segment and try again
                        fr += 1;
                    }

                    if partial && fr == file.len() {
                        // ran out of path while everything so far agreed
                        return true;
                    }
                    return false;
                }
                Segment::Literal { text } => {
                    if self.options.contains(Options::NO_CASE) {
                        file[fi].to_lowercase() == text.to_lowercase()
                    } else {
                        file[fi] == text.as_str()
                    }
                }
                Segment::Regex { regex, .. } => regex.is_match(file[fi]).unwrap_or(false),
            };

            if !hit {
                return false;
            }
            fi += 1;
            pi += 1;
        }

        if fi == file.len() && pi == pattern.len() {
            // ran out of pattern and path at the same time: an exact hit
            true
        } else if fi == file.len() {
            // ran out of path with pattern left over
            false
        } else {
            // ran out of pattern with path left over; only acceptable for
            // the single empty segment of a path with a trailing slash, so
            // that a/* matches a/b/ but not a/b/c
            fi == file.len() - 1 && file[fi].is_empty()
        }
    }

    /// The whole-pattern regex equivalent of this glob, built on first use
    /// and cached for the matcher's lifetime.
    ///
    /// `None` when the pattern set is empty (comments, empty patterns) or
    /// when the synthesized expression does not compile.
    pub fn to_regex(&self) -> Option<&Regex> {
        self.regex.get_or_init(|| self.build_regex()).as_ref()
    }

    fn build_regex(&self) -> Option<Regex> {
        if self.set.is_empty() {
            return None;
        }

        let two_star = if self.options.contains(Options::NO_GLOBSTAR) {
            pattern::STAR
        } else if self.options.contains(Options::DOT) {
            pattern::TWO_STAR_DOT
        } else {
            pattern::TWO_STAR_NO_DOT
        };

        let source = self
            .set
            .iter()
            .map(|alternative| {
                alternative
                    .iter()
                    .map(|segment| match segment {
                        Segment::Globstar => Cow::Borrowed(two_star),
                        Segment::Literal { text } => Cow::Owned(regex_escape(text)),
                        Segment::Regex { source, .. } => Cow::Borrowed(source.as_str()),
                    })
                    .collect::<Vec<_>>()
                    .join(r"\/")
            })
            .collect::<Vec<_>>()
            .join("|");

        // must match the entire path
        let source = format!("^(?:{source})$");
        // a negated pattern matches anything the positive version does not
        let source = if self.negate {
            format!("^(?!{source}).*$")
        } else {
            source
        };

        RegexBuilder::new(&source)
            .case_insensitive(self.options.contains(Options::NO_CASE))
            .build()
            .ok()
    }
}

/// Test a single path against a pattern without keeping the compiled glob.
///
/// ```
/// # use globpatterns::{glob_match, Options};
/// # fn test() -> Result<(), globpatterns::ParseError> {
/// assert!(glob_match("src/lib.rs", "src/*.rs", Options::default())?);
/// assert!(!glob_match("src/lib.c", "src/*.rs", Options::default())?);
/// # Ok(())
/// # }
/// # test().unwrap()
/// ```
pub fn glob_match(path: &str, pattern: &str, options: Options) -> Result<bool, ParseError> {
    // comments match nothing, the empty pattern matches only ""
    if !options.contains(Options::NO_COMMENT) && pattern.starts_with('#') {
        return Ok(false);
    }
    if pattern.trim().is_empty() {
        return Ok(path.is_empty());
    }
    Ok(Glob::with_options(pattern, options)?.matches(path))
}

/// Filter `paths` down to the ones matching `pattern`.
///
/// With [`Options::NO_NULL`] an empty result is replaced by the pattern
/// itself, mirroring shell behavior for globs that match nothing.
pub fn filter_matching<I, S>(
    paths: I,
    pattern: &str,
    options: Options,
) -> Result<Vec<String>, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let glob = Glob::with_options(pattern, options)?;
    let mut matched: Vec<String> = paths
        .into_iter()
        .filter(|path| glob.matches(path.as_ref()))
        .map(|path| path.as_ref().to_string())
        .collect();
    if matched.is_empty() && options.contains(Options::NO_NULL) {
        matched.push(pattern.to_string());
    }
    Ok(matched)
}

// . and .. are never swallowed by a globstar, and dotfiles only with DOT
fn never_swallowed(segment: &str, dot: bool) -> bool {
    segment == "." || segment == ".." || (!dot && segment.starts_with('.'))
}

// split on runs of slashes, keeping leading and trailing empty segments
fn split_on_slashes(path: &str) -> Vec<&str> {
    let bytes = path.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'/' {
            parts.push(&path[start..i]);
            while i < bytes.len() && bytes[i] == b'/' {
                i += 1;
            }
            start = i;
        } else {
            i += 1;
        }
    }
    parts.push(&path[start..]);
    parts
}

// windows support: patterns and paths use /, not the platform separator
fn normalize_separators(text: &str) -> Cow<'_, str> {
    if std::path::MAIN_SEPARATOR == '/' {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.replace(std::path::MAIN_SEPARATOR, "/"))
    }
}

// escape plain text for splicing into regex source
fn regex_escape(text: &str) -> String {
    const ESCAPED: &[char] = &[
        '-', '[', ']', '{', '}', '(', ')', '*', '+', '?', '.', ',', '\\', '^', '$', '|', '#',
    ];
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if ESCAPED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
fn check(pattern: &str, options: Options, files: &[&str], expect: &[&str]) {
    let mut actual = filter_matching(files.iter().copied(), pattern, options).unwrap();
    actual.sort();
    let mut expect: Vec<String> = expect.iter().map(|s| s.to_string()).collect();
    expect.sort();
    assert_eq!(actual, expect, "pattern {pattern:?}");
}

#[cfg(test)]
const BASH_FILES: &[&str] = &[
    "a", "b", "c", "d", "abc", "abd", "abe", "bb", "bcd", "ca", "cb", "dd", "de", "bdir/",
    "bdir/cfile",
];

#[test]
fn bash_glob_corpus() {
    // http://www.bashcookbook.com/bashinfo/source/bash-1.14.7/tests/glob-test
    check("a*", Options::default(), BASH_FILES, &["a", "abc", "abd", "abe"]);
    check("X*", Options::NO_NULL, BASH_FILES, &["X*"]);
    check("X*", Options::default(), BASH_FILES, &[]);

    // \* is not un-escaped to literal "*" in a failed match, but it does
    // make it get treated as a literal star
    check(r"\*", Options::NO_NULL, BASH_FILES, &[r"\*"]);
    check(r"\**", Options::NO_NULL, BASH_FILES, &[r"\**"]);
    check(r"\*\*", Options::NO_NULL, BASH_FILES, &[r"\*\*"]);

    check("b*/", Options::default(), BASH_FILES, &["bdir/"]);
    check("c*", Options::default(), BASH_FILES, &["c", "ca", "cb"]);
    check("**", Options::default(), BASH_FILES, BASH_FILES);

    check(r"\.\./*/", Options::NO_NULL, BASH_FILES, &[r"\.\./*/"]);
    check(r"s/\..*//", Options::NO_NULL, BASH_FILES, &[r"s/\..*//"]);

    // legendary larry crashes bashes
    check(
        r"/^root:/{s/^[^:]*:[^:]*:([^:]*).*$/\1/",
        Options::NO_NULL,
        BASH_FILES,
        &[r"/^root:/{s/^[^:]*:[^:]*:([^:]*).*$/\1/"],
    );
}

#[test]
fn character_classes() {
    check(
        "[a-c]b*",
        Options::default(),
        BASH_FILES,
        &["abc", "abd", "abe", "bb", "cb"],
    );
    check(
        "[a-y]*[^c]",
        Options::default(),
        BASH_FILES,
        &["abd", "abe", "bb", "bcd", "bdir/", "ca", "cb", "dd", "de"],
    );
    check("a*[^c]", Options::default(), BASH_FILES, &["abd", "abe"]);

    let with_dashes: Vec<&str> = BASH_FILES.iter().copied().chain(["a-b", "aXb"]).collect();
    check("a[X-]b", Options::default(), &with_dashes, &["a-b", "aXb"]);

    let with_dotfiles: Vec<&str> = with_dashes.iter().copied().chain([".x", ".y"]).collect();
    check("[^a-c]*", Options::default(), &with_dotfiles, &["d", "dd", "de"]);

    check("a[b]c", Options::default(), BASH_FILES, &["abc"]);
    check("a?c", Options::default(), BASH_FILES, &["abc"]);
    check(r"a\*c", Options::default(), &["abc"], &[]);

    check("[-abc]", Options::default(), &["-"], &["-"]);
    check("[abc-]", Options::default(), &["-"], &["-"]);
    check(r"[\\]", Options::default(), &["\\"], &["\\"]);
    check("[[]", Options::default(), &["["], &["["]);
    check("[", Options::default(), &["["], &["["]);
    check("[*", Options::default(), &["[abc"], &["[abc"]);

    // a right bracket first in the list represents itself
    check("[]]", Options::default(), &["]"], &["]"]);
    check("[]-]", Options::default(), &["]"], &["]"]);
    check("[a-z]", Options::default(), &["p"], &["p"]);
    check("[]", Options::default(), &["a"], &[]);
    check("[abc", Options::default(), &["["], &[]);
}

#[test]
fn escaped_patterns() {
    let escaped: Vec<&str> = BASH_FILES
        .iter()
        .copied()
        .chain(["a*b/", "a*b/ooo"])
        .collect();
    check(r"a\*b/*", Options::default(), &escaped, &["a*b/ooo"]);
    check(r"a\*?/*", Options::default(), &escaped, &["a*b/ooo"]);

    check(r"*\\!*", Options::default(), &["echo !7"], &[]);
    check(r"*\!*", Options::default(), &["echo !7"], &["echo !7"]);
    check(r"*.\*", Options::default(), &["r.*"], &["r.*"]);
    check(r"\", Options::default(), &["\\"], &["\\"]);
    check("", Options::default(), &[""], &[""]);
}

#[test]
fn star_batteries() {
    // http://www.opensource.apple.com/source/bash/bash-23/bash/tests/glob-test
    let man: Vec<&str> = BASH_FILES
        .iter()
        .copied()
        .chain(["man/", "man/man1/", "man/man1/bash.1"])
        .collect();
    check("*/man*/bash.*", Options::default(), &man, &["man/man1/bash.1"]);
    check("man/man1/bash.1", Options::default(), &man, &["man/man1/bash.1"]);

    for pattern in [
        "a***c", "a*****?c", "?*****??", "*****??", "?*****?c", "?***?****c", "?***?****?",
        "?***?****", "*******c", "*******?",
    ] {
        check(pattern, Options::default(), &["abc"], &["abc"]);
    }

    for pattern in [
        "a*cd**?**??k",
        "a**?**cd**?**??k",
        "a**?**cd**?**??k***",
        "a**?**cd**?**??***k",
        "a**?**cd**?**??***k**",
        "a****c**?**??*****",
    ] {
        check(pattern, Options::default(), &["abcdecdhjk"], &["abcdecdhjk"]);
    }

    for pattern in [
        "??**********?****?",
        "??**********?****c",
        "?************c****?****",
        "*c*?**",
        "a*****c*?**",
        "a********???*******",
    ] {
        check(pattern, Options::default(), &["abc"], &[]);
    }
}

#[test]
fn nocase_matching() {
    let files = &["xYz", "ABC", "IjK"];
    check("XYZ", Options::NO_CASE, files, &["xYz"]);
    check("ab*", Options::NO_CASE, files, &["ABC"]);
    check("[ia]?[ck]", Options::NO_CASE, files, &["ABC", "IjK"]);
}

#[test]
fn onestar_twostar() {
    check("{/*,*}", Options::default(), &["/asdf/asdf/asdf"], &[]);
    check(
        "{/?,*}",
        Options::default(),
        &["/a", "/b/b", "/a/b/c", "bb"],
        &["/a", "bb"],
    );
}

#[test]
fn dots_need_asking() {
    check("**", Options::default(), &["a/b", "a/.d", ".a/.d"], &["a/b"]);
    check(
        "**",
        Options::DOT,
        &[".a/.d", "a/.d", "a/b"],
        &[".a/.d", "a/.d", "a/b"],
    );

    // . and .. can only match patterns starting with ., even with DOT set
    let files = &["a/./b", "a/../b", "a/c/b", "a/.d/b"];
    check("a/*/b", Options::DOT, files, &["a/c/b", "a/.d/b"]);
    check("a/.*/b", Options::DOT, files, &["a/./b", "a/../b", "a/.d/b"]);
    check("a/*/b", Options::default(), files, &["a/c/b"]);
    check("a/.*/b", Options::default(), files, &["a/./b", "a/../b", "a/.d/b"]);
}

#[test]
fn paren_sets_cannot_contain_slashes() {
    check("*(a/b)", Options::NO_NULL, &["a/b"], &["*(a/b)"]);
}

#[test]
fn brace_sets_trump_extglobs() {
    // brace expansion comes before extglob parsing, so alternation groups
    // can be assembled from brace alternatives
    check(
        "*(a|{b),c)}",
        Options::default(),
        &["a", "ab", "ac", "ad"],
        &["a", "ab", "ac"],
    );
}

#[test]
fn partial_parsing_with_comment_and_negation_chars() {
    check("[!a*", Options::default(), &["[!ab", "[ab"], &["[!ab"]);
    check("[#a*", Options::default(), &["[#ab", "[ab"], &["[#ab"]);
}

#[test]
fn unclosed_alternation_with_escapes() {
    // like {a,b|c\\,d\\\|e} except it's unclosed, so it has to be escaped
    check(
        "+(a|*\\|c\\\\|d\\\\\\|e\\\\\\\\|f\\\\\\\\\\|g",
        Options::default(),
        &["+(a|b\\|c\\\\|d\\\\|e\\\\\\\\|f\\\\\\\\|g", "a", "b\\c"],
        &["+(a|b\\|c\\\\|d\\\\|e\\\\\\\\|f\\\\\\\\|g"],
    );
}

#[test]
fn nested_brace_and_extglob_sets() {
    let files = &[
        "a", "b", "c", "d", "ab", "ac", "ad", "bc", "cb", "bc,d", "c,db", "c,d", "d)", "(b|c",
        "*(b|c", "b|c", "b|cc", "cb|c", "x(a|b|c)", "x(a|c)", "(a|b|c)", "(a|c)",
    ];
    check("*(a|{b,c})", Options::default(), files, &["a", "b", "c", "ab", "ac"]);
    check(
        "{a,*(b|c,d)}",
        Options::default(),
        files,
        &["a", "(b|c", "*(b|c", "d)"],
    );
    check(
        "{a,*(b|{c,d})}",
        Options::default(),
        files,
        &["a", "b", "bc", "cb", "c", "d"],
    );
    check(
        "*(a|{b|c,c})",
        Options::default(),
        files,
        &["a", "b", "c", "ab", "ac", "bc", "cb"],
    );
    check(
        "*(a|{b|c,c})",
        Options::NO_EXT,
        files,
        &["x(a|b|c)", "x(a|c)", "(a|b|c)", "(a|c)"],
    );
}

#[test]
fn match_base_and_comments() {
    check(
        "a?b",
        Options::MATCH_BASE,
        &["x/y/acb", "acb/", "acb/d/e", "x/y/acb/d"],
        &["x/y/acb", "acb/"],
    );
    check("#*", Options::NO_COMMENT, &["#a", "#b", "c#d"], &["#a", "#b"]);
}

#[test]
fn negation_patterns() {
    let files = &["d", "e", "!ab", "!abc", "a!b", r"\!a"];

    // anything that is NOT a* matches
    check("!a*", Options::default(), files, &[r"\!a", "d", "e", "!ab", "!abc"]);
    // anything that IS !a* matches
    check("!a*", Options::NO_NEGATE, files, &["!ab", "!abc"]);
    // anything that IS a* matches
    check("!!a*", Options::default(), files, &["a!b"]);
    // anything that is NOT !a* matches
    check(r"!\!a*", Options::default(), files, &["a!b", "d", "e", r"\!a"]);
}

#[test]
fn negation_nestled_within_a_pattern() {
    let files = &["foo.js", "foo.bar", "foo.js.js", "blar.js", "foo.", "boo.js.boo"];
    // the last one is tricky: * matches foo, . matches ., and 'js.js' != 'js'
    check(
        "*.!(js)",
        Options::default(),
        files,
        &["foo.bar", "foo.", "boo.js.boo", "foo.js.js"],
    );
}

#[test]
fn globstar_deep_dotted_directories() {
    let files = &[
        "a/b/.x/c", "a/b/.x/c/d", "a/b/.x/c/d/e", "a/b/.x", "a/b/.x/", "a/.x/b", ".x", ".x/",
        ".x/a", ".x/a/b", "a/.x/b/.x/c", ".x/.x",
    ];
    check(
        "**/.x/**",
        Options::default(),
        files,
        &[
            ".x/", ".x/a", ".x/a/b", "a/.x/b", "a/b/.x/", "a/b/.x/c", "a/b/.x/c/d",
            "a/b/.x/c/d/e",
        ],
    );
}

#[test]
fn invalid_classes_match_nothing() {
    check("[z-a]", Options::default(), BASH_FILES, &[]);
    check("a/[2015-03-10T00:23:08.647Z]/z", Options::default(), BASH_FILES, &[]);
    check("[a-0][a-\u{100}]", Options::default(), BASH_FILES, &[]);
}

#[test]
fn globstar_swallowing() {
    let glob = Glob::new("a/**/c").unwrap();
    assert!(glob.matches("a/b/x/y/c"));
    assert!(glob.matches("a/c"));
    assert!(!glob.matches("a/.x/c"));

    let glob = Glob::with_options("a/**/c", Options::DOT).unwrap();
    assert!(glob.matches("a/.x/c"));

    let glob = Glob::new("a/**").unwrap();
    assert!(glob.matches("a/b"));
    assert!(glob.matches("a/b/c"));
    assert!(!glob.matches("a/.b/c"));
}

#[test]
fn tricky_negations() {
    let cases: &[(&str, &str, bool)] = &[
        ("bar.min.js", "*.!(js|css)", true),
        ("bar.min.js", "!*.+(js|css)", false),
        ("a-integration-test.js", "*.!(j)", true),
        ("a-integration-test.js", "!(*-integration-test.js)", false),
        ("a-integration-test.js", "*-!(integration-)test.js", true),
        ("a-integration-test.js", "*-!(integration)-test.js", false),
        ("a-integration-test.js", "*!(-integration)-test.js", true),
        ("a-integration-test.js", "*!(-integration-)test.js", true),
        ("a-integration-test.js", "*!(integration)-test.js", true),
        ("a-integration-test.js", "*!(integration-test).js", true),
        ("a-integration-test.js", "*-!(integration-test).js", true),
        ("a-integration-test.js", "*-!(integration-test.js)", true),
        ("a-integration-test.js", "*-!(integra)tion-test.js", false),
        ("a-integration-test.js", "*-integr!(ation)-test.js", false),
        ("a-integration-test.js", "*-integr!(ation-t)est.js", false),
        ("a-integration-test.js", "*-i!(ntegration-)test.js", false),
        ("a-integration-test.js", "*i!(ntegration-)test.js", true),
        ("a-integration-test.js", "*te!(gration-te)st.js", true),
        ("a-integration-test.js", "*-!(integration)?test.js", false),
        ("a-integration-test.js", "*?!(integration)?test.js", true),
        ("foo-integration-test.js", "foo-integration-test.js", true),
        ("foo-integration-test.js", "!(*-integration-test.js)", false),
        ("foo.jszzz.js", "*.!(js).js", true),
        ("asd.jss", "*.!(js)", true),
        ("asd.jss.xyz", "*.!(js).!(xy)", true),
        ("asd.jss.xy", "*.!(js).!(xy)", false),
        ("asd.js.xyz", "*.!(js).!(xy)", false),
        ("asd.js.xy", "*.!(js).!(xy)", false),
        ("asd.sjs.zxy", "*.!(js).!(xy)", true),
        ("asd..xyz", "*.!(js).!(xy)", true),
        ("asd..xy", "*.!(js).!(xy)", false),
        ("asd..xy", "*.!(js|x).!(xy)", false),
        ("foo.js.js", "*.!(js)", true),
        ("testjson.json", "*(*.json|!(*.js))", true),
        ("testjson.json", "+(*.json|!(*.js))", true),
        ("testjson.json", "@(*.json|!(*.js))", true),
        ("testjson.json", "?(*.json|!(*.js))", true),
        ("foojs.js", "*(*.json|!(*.js))", false),
        ("foojs.js", "+(*.json|!(*.js))", false),
        ("foojs.js", "@(*.json|!(*.js))", false),
        ("foojs.js", "?(*.json|!(*.js))", false),
        ("other.bar", "*(*.json|!(*.js))", true),
        ("other.bar", "+(*.json|!(*.js))", true),
        ("other.bar", "@(*.json|!(*.js))", true),
        ("other.bar", "?(*.json|!(*.js))", true),
    ];
    for &(file, pattern, expected) in cases {
        assert_eq!(
            glob_match(file, pattern, Options::NO_NEGATE).unwrap(),
            expected,
            "{file} against {pattern}"
        );
    }
}

#[test]
fn unfinished_extglobs_match_themselves() {
    for ty in ['!', '?', '+', '*', '@'] {
        let pattern = format!("{ty}(a|B");
        assert!(glob_match(&pattern, &pattern, Options::NO_NEGATE).unwrap());
        assert!(!glob_match("B", &pattern, Options::NO_NEGATE).unwrap());
    }
}

#[test]
fn extglob_ending_with_state_char() {
    assert!(!glob_match("ax", "a?(b*)", Options::default()).unwrap());
    assert!(glob_match("ax", "?(a*|b)", Options::default()).unwrap());
}

#[test]
fn redos_guards() {
    let backslashes = "\\".repeat(1024 * 15 + 1);

    // within the limits, and a valid (negated) match
    let exploit = format!("!({backslashes}A");
    assert!(glob_match("A", &exploit, Options::default()).unwrap());

    // within the limits, and simply no match
    let exploit = format!("[!({backslashes}A");
    assert!(!glob_match("A", &exploit, Options::default()).unwrap());

    // over the segment limit: compilation refuses
    let backslashes = "\\".repeat(1024 * 64 + 1);
    let exploit = format!("!({backslashes}A)");
    assert!(matches!(
        glob_match("A", &exploit, Options::default()),
        Err(ParseError::PatternTooLong { .. })
    ));
}

#[test]
fn comments_and_empty_patterns() {
    let glob = Glob::new("#comment").unwrap();
    assert!(glob.is_comment());
    assert!(!glob.matches("#comment"));
    assert!(glob.to_regex().is_none());

    let glob = Glob::with_options("#comment", Options::NO_COMMENT).unwrap();
    assert!(!glob.is_comment());
    assert!(glob.matches("#comment"));

    let glob = Glob::new("   ").unwrap();
    assert!(glob.is_empty_pattern());
    assert!(glob.matches(""));
    assert!(!glob.matches("a"));

    assert!(glob_match("", "", Options::default()).unwrap());
    assert!(!glob_match("a", "", Options::default()).unwrap());
}

#[test]
fn flip_negate() {
    let glob = Glob::with_options("!a*", Options::FLIP_NEGATE).unwrap();
    assert!(glob.negated());
    assert!(glob.matches("abc"));
    assert!(!glob.matches("xyz"));
}

#[test]
fn no_brace_keeps_groups_literal() {
    let glob = Glob::with_options("a{b,c}d", Options::NO_BRACE).unwrap();
    assert!(glob.matches("a{b,c}d"));
    assert!(!glob.matches("abd"));
}

#[test]
fn trailing_slash_segments() {
    let glob = Glob::new("a/*").unwrap();
    assert!(glob.matches("a/b"));
    assert!(glob.matches("a/b/"));
    assert!(!glob.matches("a/b/c"));
    assert!(!glob.matches("a/"));
}

#[test]
fn partial_matching() {
    let glob = Glob::new("a/**/z").unwrap();
    assert!(glob.matches_partial("a/b/c"));
    assert!(!glob.matches("a/b/c"));
    assert!(glob.matches_partial("/"));
    assert!(glob.matches("a/b/z"));
    assert!(glob.matches_partial("a/b/z"));
}

#[test]
fn literal_round_trip() {
    for pattern in ["foo", "foo/bar", "foo.bar-baz_qux", "man/man1/bash.1"] {
        assert!(glob_match(pattern, pattern, Options::default()).unwrap());
    }
}

#[test]
fn derived_regex_text() {
    fn re_src(pattern: &str, options: Options) -> String {
        Glob::with_options(pattern, options)
            .unwrap()
            .to_regex()
            .map(|regex| regex.as_str().to_string())
            .unwrap_or_else(|| "none".to_string())
    }

    assert_eq!(re_src("a*", Options::default()), r"^(?:(?=.)a[^/]*?)$");
    assert_eq!(re_src("b*/", Options::default()), r"^(?:(?=.)b[^/]*?\/)$");
    assert_eq!(re_src("**", Options::default()), r"^(?:(?:(?!(?:\/|^)\.).)*?)$");
    assert_eq!(
        re_src("**", Options::DOT),
        r"^(?:(?:(?!(?:\/|^)(?:\.{1,2})($|\/)).)*?)$"
    );
    assert_eq!(
        re_src("man/man1/bash.1", Options::default()),
        r"^(?:man\/man1\/bash\.1)$"
    );
    assert_eq!(re_src("!a*", Options::default()), r"^(?!^(?:(?=.)a[^/]*?)$).*$");
    assert_eq!(
        re_src("*.!(js)", Options::default()),
        r"^(?:(?!\.)(?=.)[^/]*?\.(?:(?!(?:js)$)[^/]*?))$"
    );
    assert_eq!(
        re_src("{/?,*}", Options::default()),
        r"^(?:\/(?!\.)(?=.)[^/]|(?!\.)(?=.)[^/]*?)$"
    );
}

#[test]
fn deterministic_compilation() {
    let first = Glob::new("a/**/{b,c}*.!(js)").unwrap();
    let second = Glob::new("a/**/{b,c}*.!(js)").unwrap();
    assert_eq!(
        first.to_regex().map(Regex::as_str),
        second.to_regex().map(Regex::as_str)
    );
    for path in ["a/x/by.txt", "a/x/by.js", "a/c.md", "q", ""] {
        assert_eq!(first.matches(path), second.matches(path));
    }
}

#[test]
fn whole_regex_agrees_with_matcher() {
    for (pattern, paths) in [
        ("a*", &["a", "abc", "b", ""][..]),
        ("a/*/b", &["a/c/b", "a/b", "a/c/d/b"][..]),
        ("*.!(js)", &["foo.js", "foo.bar", "foo.js.js"][..]),
    ] {
        let glob = Glob::new(pattern).unwrap();
        let regex = glob.to_regex().unwrap();
        for path in paths {
            assert_eq!(
                glob.matches(path),
                regex.is_match(path).unwrap(),
                "{pattern} against {path}"
            );
        }
    }
}

#[test]
fn filter_matching_no_null() {
    let files = ["a.rs", "b.c", "c.rs"];
    assert_eq!(
        filter_matching(files, "*.rs", Options::default()).unwrap(),
        ["a.rs", "c.rs"]
    );
    assert_eq!(
        filter_matching(files, "*.zig", Options::default()).unwrap(),
        Vec::<String>::new()
    );
    assert_eq!(
        filter_matching(files, "*.zig", Options::NO_NULL).unwrap(),
        ["*.zig"]
    );
}
