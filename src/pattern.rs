//! Compilation of single glob segments into literal, regex or globstar
//! matchers.

use bitflags::bitflags;
use fancy_regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Longest allowed path segment in a pattern, in characters.
///
/// Bounds the work any single segment can cause, which keeps adversarial
/// patterns from turning into catastrophic regex backtracking.
pub const MAX_SEGMENT_LENGTH: usize = 64 * 1024;

// any single thing other than /
const QMARK: &str = "[^/]";

// * => any number of characters
pub(crate) const STAR: &str = "[^/]*?";

// ** when dots are allowed.  Anything goes, except .. and .
// not (^ or / followed by one or two dots followed by $ or /),
// followed by anything, any number of times.
pub(crate) const TWO_STAR_DOT: &str = r"(?:(?!(?:\/|^)(?:\.{1,2})($|\/)).)*?";

// not a ^ or / followed by a dot, followed by anything, any number of times.
pub(crate) const TWO_STAR_NO_DOT: &str = r"(?:(?!(?:\/|^)\.).)*?";

// looks for a character after the end of the text, which there never is
pub(crate) const NEVER_MATCH: &str = "$.";

// characters that need to be escaped when emitted into regex text
const RE_SPECIALS: &[char] = &[
    '(', ')', '.', '*', '{', '}', '+', '?', '[', ']', '^', '$', '\\', '!',
];

#[rustfmt::skip]
bitflags! {
    /// Flags controlling how patterns are compiled and matched.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Options: u16 {
        /// Emit trace output while compiling and matching. No semantic effect.
        const DEBUG       = 0x0001;

        /// Do not expand `{a,b}` or `{1..3}` groups.
        const NO_BRACE    = 0x0002;

        /// Treat `**` like an ordinary `*`.
        const NO_GLOBSTAR = 0x0004;

        /// Let wildcards match dotfiles. `.` and `..` still never match
        /// anything that does not start with a dot.
        const DOT         = 0x0008;

        /// Disable `!(...)`, `?(...)`, `+(...)`, `*(...)` and `@(...)`
        /// extglob groups.
        const NO_EXT      = 0x0010;

        /// Compare case-insensitively.
        const NO_CASE     = 0x0020;

        /// [`filter_matching`](crate::filter_matching) returns the pattern
        /// itself instead of an empty result.
        const NO_NULL     = 0x0040;

        /// A pattern without slashes is matched against the basename of the
        /// path: `a?b` matches `x/y/acb`.
        const MATCH_BASE  = 0x0080;

        /// Treat a leading `#` as part of the pattern instead of a comment.
        const NO_COMMENT  = 0x0100;

        /// Treat a leading `!` as part of the pattern instead of a negation.
        const NO_NEGATE   = 0x0200;

        /// A hit on the pattern is a match even when the pattern is negated,
        /// and a miss is a non-match.
        const FLIP_NEGATE = 0x0400;
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::empty()
    }
}

/// Errors from compiling a glob pattern.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParseError {
    /// A single path segment exceeded [`MAX_SEGMENT_LENGTH`] characters.
    #[error("glob segment is too long ({length} characters)")]
    PatternTooLong {
        /// Length of the offending segment, in characters.
        length: usize,
    },
}

/// One compiled path segment of a glob pattern.
#[derive(Clone, Debug)]
pub(crate) enum Segment {
    /// A `**` segment, matching any number of path segments.
    Globstar,

    /// A segment without magic characters, compared as plain text.
    Literal { text: String },

    /// A segment with wildcards, compiled to an anchored regex. `source` is
    /// the unanchored regex text, kept for whole-pattern synthesis.
    Regex { source: String, regex: Regex },
}

/// The extglob group types and their regex skeletons.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum GroupKind {
    /// `!(...)`
    Negated,
    /// `?(...)`
    ZeroOrOne,
    /// `+(...)`
    OneOrMore,
    /// `*(...)`
    ZeroOrMore,
    /// `@(...)`
    ExactlyOne,
}

impl GroupKind {
    fn from_state_char(c: char) -> Option<Self> {
        Some(match c {
            '!' => GroupKind::Negated,
            '?' => GroupKind::ZeroOrOne,
            '+' => GroupKind::OneOrMore,
            '*' => GroupKind::ZeroOrMore,
            '@' => GroupKind::ExactlyOne,
            _ => return None,
        })
    }

    fn glob_char(self) -> char {
        match self {
            GroupKind::Negated => '!',
            GroupKind::ZeroOrOne => '?',
            GroupKind::OneOrMore => '+',
            GroupKind::ZeroOrMore => '*',
            GroupKind::ExactlyOne => '@',
        }
    }

    // negation is (?:(?!(?:<pattern>))[^/]*?), the others are
    // (?:<pattern>)<quantifier>
    fn open_fragment(self) -> &'static str {
        match self {
            GroupKind::Negated => "(?:(?!(?:",
            _ => "(?:",
        }
    }

    fn close_fragment(self) -> &'static str {
        match self {
            GroupKind::Negated => "))[^/]*?)",
            GroupKind::ZeroOrOne => ")?",
            GroupKind::OneOrMore => ")+",
            GroupKind::ZeroOrMore => ")*",
            GroupKind::ExactlyOne => ")",
        }
    }
}

/// An extglob group opened during the scan.
#[derive(Clone, Copy, Debug)]
struct Group {
    kind: GroupKind,
    /// Index into the output buffer where the group's open fragment starts.
    re_start: usize,
    /// Index just past the group's close fragment, set when the group closes.
    re_end: usize,
}

struct SubParse {
    source: Vec<char>,
    has_magic: bool,
}

/// Scanner state for a single segment.
///
/// The output buffer is a char vector so the recovery splices (unterminated
/// classes and groups, negated-group relocation) can never land inside a
/// multi-byte character.
struct SegmentParser {
    chars: Vec<char>,
    options: Options,
    is_sub: bool,
    re: Vec<char>,
    has_magic: bool,
    escaping: bool,
    in_class: bool,
    class_start: usize,
    re_class_start: usize,
    state_char: Option<char>,
    group_stack: Vec<Group>,
    negative_groups: Vec<Group>,
}

impl SegmentParser {
    fn new(pattern: &str, options: Options, is_sub: bool) -> Self {
        SegmentParser {
            chars: pattern.chars().collect(),
            options,
            is_sub,
            re: Vec::new(),
            // case folding has to reach the non-magic characters too, so
            // NO_CASE always compiles to a real regex
            has_magic: options.contains(Options::NO_CASE),
            escaping: false,
            in_class: false,
            class_start: 0,
            re_class_start: 0,
            state_char: None,
            group_stack: Vec::new(),
            negative_groups: Vec::new(),
        }
    }

    fn push_str(&mut self, text: &str) {
        self.re.extend(text.chars());
    }

    fn prepend(&mut self, prefix: &str) {
        let mut prefixed: Vec<char> = prefix.chars().collect();
        prefixed.append(&mut self.re);
        self.re = prefixed;
    }

    // flush a state-tracking character that was not consumed by a group open
    fn clear_state_char(&mut self) {
        if let Some(c) = self.state_char.take() {
            match c {
                '*' => {
                    self.push_str(STAR);
                    self.has_magic = true;
                }
                '?' => {
                    self.push_str(QMARK);
                    self.has_magic = true;
                }
                _ => {
                    self.re.push('\\');
                    self.re.push(c);
                }
            }
        }
    }

    // . and .. never match anything that doesn't start with ., even when
    // DOT is set
    fn pattern_start(&self) -> &'static str {
        if self.chars.first() == Some(&'.') {
            ""
        } else if self.options.contains(Options::DOT) {
            r"(?!(?:^|\/)\.{1,2}(?:$|\/))"
        } else {
            r"(?!\.)"
        }
    }

    fn run(mut self) -> SubParse {
        let len = self.chars.len();
        let mut i = 0;
        while i < len {
            let mut c = self.chars[i];

            // skip over any that are escaped
            if self.escaping && RE_SPECIALS.contains(&c) {
                self.re.push('\\');
                self.re.push(c);
                self.escaping = false;
                i += 1;
                continue;
            }

            match c {
                '\\' => {
                    self.clear_state_char();
                    self.escaping = true;
                }

                // the extglob state characters
                '?' | '*' | '+' | '@' | '!' => {
                    if self.in_class {
                        // all literals inside a class, except that [!a]
                        // means [^a]
                        if c == '!' && i == self.class_start + 1 {
                            c = '^';
                        }
                        self.re.push(c);
                    } else {
                        // a pending state char means something like ** or
                        // +? was in there; flush it, then track this one
                        self.clear_state_char();
                        self.state_char = Some(c);
                        // without extglob, +(asdf|foo) isn't a thing, so
                        // the char is flushed right away
                        if self.options.contains(Options::NO_EXT) {
                            self.clear_state_char();
                        }
                    }
                }

                '(' => {
                    if self.in_class {
                        self.re.push('(');
                    } else if let Some(kind) =
                        self.state_char.take().and_then(GroupKind::from_state_char)
                    {
                        self.group_stack.push(Group {
                            kind,
                            re_start: self.re.len(),
                            re_end: 0,
                        });
                        self.push_str(kind.open_fragment());
                    } else {
                        self.push_str("\\(");
                    }
                }

                ')' => {
                    if self.in_class {
                        self.push_str("\\)");
                    } else if let Some(mut group) = self.group_stack.pop() {
                        self.clear_state_char();
                        self.has_magic = true;
                        self.push_str(group.kind.close_fragment());
                        group.re_end = self.re.len();
                        if group.kind == GroupKind::Negated {
                            self.negative_groups.push(group);
                        }
                    } else {
                        self.push_str("\\)");
                    }
                }

                '|' => {
                    if self.in_class || self.group_stack.is_empty() || self.escaping {
                        self.push_str("\\|");
                        self.escaping = false;
                    } else {
                        self.clear_state_char();
                        self.re.push('|');
                    }
                }

                '[' => {
                    self.clear_state_char();
                    if self.in_class {
                        self.push_str("\\[");
                    } else {
                        self.in_class = true;
                        self.class_start = i;
                        self.re_class_start = self.re.len();
                        self.re.push('[');
                    }
                }

                ']' => {
                    // a right bracket first in the list loses its special
                    // meaning and represents itself
                    if !self.in_class || i == self.class_start + 1 {
                        self.push_str("\\]");
                    } else {
                        // "[z-a]" is not a valid class and stands for the
                        // literal text "[z-a]": try the body as a trial
                        // class, and on failure re-walk it as its own
                        // sub-pattern so characters that were passed
                        // through as-is get re-translated
                        let body: String = self.chars[self.class_start + 1..i].iter().collect();
                        if Regex::new(&format!("[{body}]")).is_err() {
                            let sub = SegmentParser::new(&body, self.options, true).run();
                            self.re.truncate(self.re_class_start);
                            self.push_str("\\[");
                            self.re.extend(sub.source);
                            self.push_str("\\]");
                            self.has_magic = self.has_magic || sub.has_magic;
                        } else {
                            self.has_magic = true;
                            self.re.push(']');
                        }
                        self.in_class = false;
                    }
                }

                _ => {
                    self.clear_state_char();
                    if self.escaping {
                        self.escaping = false;
                    } else if RE_SPECIALS.contains(&c) && !(c == '^' && self.in_class) {
                        self.re.push('\\');
                    }
                    self.re.push(c);
                }
            }

            i += 1;
        }

        // a class left open, like "[abc", is the literal text "[abc":
        // re-walk its contents to escape what was passed through as-is
        if self.in_class {
            let body: String = self.chars[self.class_start + 1..].iter().collect();
            let sub = SegmentParser::new(&body, self.options, true).run();
            self.re.truncate(self.re_class_start);
            self.push_str("\\[");
            self.re.extend(sub.source);
            self.has_magic = self.has_magic || sub.has_magic;
        }

        // groups left open, like "+(a|b": re-emit the opener as literal
        // text and make sure every alternation pipe in the tail ends up
        // escaped
        while let Some(group) = self.group_stack.pop() {
            let open_len = group.kind.open_fragment().chars().count();
            let tail: String = self.re[group.re_start + open_len..].iter().collect();
            let tail = normalize_tail(&tail);
            let prefix = match group.kind.glob_char() {
                '*' => STAR.to_string(),
                '?' => QMARK.to_string(),
                c => format!("\\{c}"),
            };
            self.has_magic = true;
            self.re.truncate(group.re_start);
            self.push_str(&prefix);
            self.push_str("\\(");
            self.push_str(&tail);
        }

        self.clear_state_char();
        if self.escaping {
            // trailing backslash
            self.push_str("\\\\");
        }

        // the leading-dot guard is only needed when the expression starts
        // with something that could capture a dot
        let add_pattern_start = matches!(self.re.first().copied(), Some('.' | '[' | '('));

        // The engine has no lookbehind, so a negated group has to look all
        // the way ahead: *.!(x).!(y|z) must not match "a.xyz.yz". Relocate
        // whatever follows each negated group into its lookahead, and close
        // it with an end anchor when nothing follows at the top level.
        for idx in (0..self.negative_groups.len()).rev() {
            let group = self.negative_groups[idx];
            let re_len = self.re.len();
            let re_start = group.re_start.min(re_len);
            let re_end = group.re_end.min(re_len);
            let split = re_end.saturating_sub(8).max(re_start);

            let before: String = self.re[..re_start].iter().collect();
            let first: String = self.re[re_start..split].iter().collect();
            let last: String = self.re[split..re_end].iter().collect();
            let after: String = self.re[re_end..].iter().collect();

            let last = format!("{last}{after}");

            // groups opened before the negated section keep their closers:
            // *(*.js|!(*.json)) must not swallow the closing paren of *()
            let open_parens_before = before.chars().filter(|&c| c == '(').count();
            let mut clean_after = after;
            for _ in 0..open_parens_before {
                clean_after = strip_first_group_close(&clean_after);
            }

            let dollar = if clean_after.is_empty() && !self.is_sub {
                "$"
            } else {
                ""
            };
            let patched = format!("{before}{first}{clean_after}{dollar}{last}");
            self.re = patched.chars().collect();
        }

        // magic expressions never match an empty path part; otherwise a/*
        // would match a/
        if !self.re.is_empty() && self.has_magic {
            self.prepend("(?=.)");
        }
        if add_pattern_start {
            let start = self.pattern_start();
            self.prepend(start);
        }

        SubParse {
            source: self.re,
            has_magic: self.has_magic,
        }
    }
}

// Rewrite the tail of an unterminated group so every `|` ends up escaped:
// the even run of backslashes in front of a pipe re-escapes by repeating
// itself, and an unescaped pipe gains its own backslash. At most 64 escape
// pairs take part per pipe; anything longer stays as it is.
fn normalize_tail(tail: &str) -> String {
    let chars: Vec<char> = tail.chars().collect();
    let mut out = String::with_capacity(tail.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' && chars[i] != '|' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let run_start = i;
        while i < chars.len() && chars[i] == '\\' {
            i += 1;
        }
        let run = i - run_start;
        if i >= chars.len() || chars[i] != '|' {
            for _ in 0..run {
                out.push('\\');
            }
            continue;
        }

        let consumed = run.min(129);
        let pairs = if consumed == 129 { 64 } else { consumed / 2 };
        for _ in 0..(run - consumed) {
            out.push('\\');
        }
        for _ in 0..pairs * 4 {
            out.push('\\');
        }
        out.push('\\');
        out.push('|');
        i += 1;
    }
    out
}

// remove the first `)` and a quantifier right after it, if any
fn strip_first_group_close(text: &str) -> String {
    let Some(pos) = text.find(')') else {
        return text.to_string();
    };
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..pos]);
    let rest = &text[pos + 1..];
    let rest = match rest.chars().next() {
        Some(c @ ('+' | '*' | '?')) => &rest[c.len_utf8()..],
        _ => rest,
    };
    out.push_str(rest);
    out
}

// replace stuff like \* with *
pub(crate) fn glob_unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(chars.next().unwrap_or('\\'));
        } else {
            out.push(c);
        }
    }
    out
}

pub(crate) fn never_matching() -> Segment {
    Segment::Regex {
        source: NEVER_MATCH.to_string(),
        regex: Regex::new(NEVER_MATCH).expect("the sentinel is a valid expression"),
    }
}

/// Compile one `/`-free path segment of a glob pattern.
///
/// Following bash, `**` is only special when it is the whole segment; any
/// other series of `*` is equivalent to a single `*`.
pub(crate) fn compile(segment: &str, options: Options) -> Result<Segment, ParseError> {
    let length = segment.chars().count();
    if length > MAX_SEGMENT_LENGTH {
        return Err(ParseError::PatternTooLong { length });
    }

    if !options.contains(Options::NO_GLOBSTAR) && segment == "**" {
        return Ok(Segment::Globstar);
    }
    if segment.is_empty() {
        return Ok(Segment::Literal {
            text: String::new(),
        });
    }
    // segments are produced by the slash splitter and cannot contain
    // separators; a stray one cannot be compiled into anything sensible
    if segment.contains('/') {
        return Ok(never_matching());
    }

    let sub = SegmentParser::new(segment, options, false).run();

    // no magic characters means an exact match; unescape the pattern so it
    // compares equal to the file text
    if !sub.has_magic {
        return Ok(Segment::Literal {
            text: glob_unescape(segment),
        });
    }

    let source: String = sub.source.into_iter().collect();
    match RegexBuilder::new(&format!("^{source}$"))
        .case_insensitive(options.contains(Options::NO_CASE))
        .build()
    {
        Ok(regex) => Ok(Segment::Regex { source, regex }),
        // an expression that does not compile cannot match anything
        Err(_) => Ok(never_matching()),
    }
}

#[cfg(test)]
fn source_of(segment: &str, options: Options) -> String {
    match compile(segment, options).unwrap() {
        Segment::Regex { source, .. } => source,
        other => panic!("expected a regex segment, got {other:?}"),
    }
}

#[cfg(test)]
fn literal_of(segment: &str, options: Options) -> String {
    match compile(segment, options).unwrap() {
        Segment::Literal { text } => text,
        other => panic!("expected a literal segment, got {other:?}"),
    }
}

#[test]
fn literal_segments() {
    assert_eq!(literal_of("man", Options::default()), "man");
    assert_eq!(literal_of("bash.1", Options::default()), "bash.1");
    assert_eq!(literal_of(r"a\*c", Options::default()), "a*c");
    assert_eq!(literal_of(r"\", Options::default()), "\\");
    assert_eq!(literal_of("", Options::default()), "");
}

#[test]
fn globstar_segments() {
    assert!(matches!(
        compile("**", Options::default()),
        Ok(Segment::Globstar)
    ));
    // without globstar, ** is just two ordinary stars
    assert_eq!(source_of("**", Options::NO_GLOBSTAR), "(?=.)[^/]*?[^/]*?");
}

#[test]
fn segment_regex_sources() {
    assert_eq!(source_of("a*", Options::default()), "(?=.)a[^/]*?");
    assert_eq!(source_of("a?c", Options::default()), "(?=.)a[^/]c");
    assert_eq!(
        source_of("[a-c]b*", Options::default()),
        r"(?!\.)(?=.)[a-c]b[^/]*?"
    );
    assert_eq!(
        source_of("[a-c]b*", Options::DOT),
        r"(?!(?:^|\/)\.{1,2}(?:$|\/))(?=.)[a-c]b[^/]*?"
    );
    // a segment starting with a dot gets no leading-dot guard
    assert_eq!(source_of(".*", Options::default()), r"(?=.)\.[^/]*?");
    assert_eq!(
        source_of(r"*\\!*", Options::default()),
        r"(?=.)[^/]*?\\\![^/]*?"
    );
}

#[test]
fn extglob_sources() {
    assert_eq!(
        source_of("*.!(js)", Options::default()),
        r"(?!\.)(?=.)[^/]*?\.(?:(?!(?:js)$)[^/]*?)"
    );
    assert_eq!(
        source_of("@(a|b)", Options::default()),
        r"(?!\.)(?=.)(?:a|b)"
    );
    assert_eq!(source_of("+(ab)", Options::default()), r"(?!\.)(?=.)(?:ab)+");
    // extglob disabled: the quantifier and parens are literal text
    assert_eq!(
        source_of("*(a|b)", Options::NO_EXT),
        r"(?!\.)(?=.)[^/]*?\(a\|b\)"
    );
}

#[test]
fn unterminated_constructs_recover() {
    // open classes become literal text
    assert_eq!(literal_of("[abc", Options::default()), "[abc");
    assert_eq!(literal_of("[", Options::default()), "[");
    assert_eq!(
        source_of("[*", Options::default()),
        r"(?=.)\[(?!\.)(?=.)[^/]*?"
    );
    assert_eq!(
        source_of("[!a*", Options::default()),
        r"(?=.)\[(?=.)\!a[^/]*?"
    );

    // open groups become literal text with escaped pipes
    assert_eq!(source_of("!(a|B", Options::default()), r"(?=.)\!\(a\|B");
    assert_eq!(source_of("?(a|B", Options::default()), r"(?=.)[^/]\(a\|B");
    assert_eq!(source_of("*(a|B", Options::default()), r"(?=.)[^/]*?\(a\|B");
}

#[test]
fn invalid_classes_degrade() {
    // a reversed range is not a valid class and stands for its own text
    assert_eq!(literal_of("[z-a]", Options::default()), "[z-a]");
    // a valid class right next to an invalid one still compiles to a regex
    let segment = compile("[a-0][a-c]", Options::default()).unwrap();
    assert!(matches!(segment, Segment::Regex { .. }));
}

#[test]
fn nocase_forces_regex() {
    let segment = compile("abc", Options::NO_CASE).unwrap();
    match segment {
        Segment::Regex { regex, .. } => {
            assert!(regex.is_match("ABC").unwrap());
            assert!(regex.is_match("abc").unwrap());
            assert!(!regex.is_match("abd").unwrap());
        }
        other => panic!("expected a regex segment, got {other:?}"),
    }
}

#[test]
fn segment_length_guard() {
    let segment = "a".repeat(MAX_SEGMENT_LENGTH);
    assert!(compile(&segment, Options::default()).is_ok());

    let segment = "a".repeat(MAX_SEGMENT_LENGTH + 1);
    assert!(matches!(
        compile(&segment, Options::default()),
        Err(ParseError::PatternTooLong { length }) if length == MAX_SEGMENT_LENGTH + 1
    ));
}
