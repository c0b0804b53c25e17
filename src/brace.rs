//! Bash-style brace expansion: `a{b,c}d`, `{1..5}`, nested groups.

use fancy_regex::Regex;
use once_cell::sync::Lazy;

use crate::balanced::balanced;

// Escaped characters are swapped for these markers before expansion so the
// group scan cannot see them, and swapped back at the very end.
const ESC_SLASH: &str = "\0SLASH\0";
const ESC_OPEN: &str = "\0OPEN\0";
const ESC_CLOSE: &str = "\0CLOSE\0";
const ESC_COMMA: &str = "\0COMMA\0";
const ESC_PERIOD: &str = "\0PERIOD\0";

static NUMERIC_SEQUENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+\.\.-?\d+(?:\.\.-?\d+)?$").expect("valid sequence pattern"));
static ALPHA_SEQUENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]\.\.[a-zA-Z](?:\.\.-?\d+)?$").expect("valid sequence pattern"));

/// Expand a bash brace expression into its full list of alternatives.
///
/// Comma lists, numeric and alphabetic ranges (with optional step) and
/// arbitrary nesting are supported. Invalid or unbalanced groups degrade to
/// literal text instead of failing: `expand_braces("a{b}c")` is `["a{b}c"]`.
///
/// ```
/// # use globpatterns::expand_braces;
/// assert_eq!(expand_braces("a{b,c}d"), ["abd", "acd"]);
/// assert_eq!(expand_braces("a{1..3}b"), ["a1b", "a2b", "a3b"]);
/// ```
pub fn expand_braces(pattern: &str) -> Vec<String> {
    // Bash 4.3 preserves the first two bytes of anything starting with {},
    // but only at the top level: "{},a}b" does not expand, while "a{},b}c"
    // expands to "a}c" and "abc".
    let escaped = if let Some(rest) = pattern.strip_prefix("{}") {
        escape_braces(&format!("\\{{\\}}{rest}"))
    } else {
        escape_braces(pattern)
    };

    expand(&escaped, true)
        .iter()
        .map(|expansion| unescape_braces(expansion))
        .collect()
}

fn escape_braces(text: &str) -> String {
    text.replace("\\\\", ESC_SLASH)
        .replace("\\{", ESC_OPEN)
        .replace("\\}", ESC_CLOSE)
        .replace("\\,", ESC_COMMA)
        .replace("\\.", ESC_PERIOD)
}

fn unescape_braces(text: &str) -> String {
    text.replace(ESC_SLASH, "\\")
        .replace(ESC_OPEN, "{")
        .replace(ESC_CLOSE, "}")
        .replace(ESC_COMMA, ",")
        .replace(ESC_PERIOD, ".")
}

fn numeric(text: &str) -> i64 {
    text.parse::<i64>()
        .unwrap_or_else(|_| text.chars().next().map_or(0, |c| c as i64))
}

// Basically `text.split(',')`, except nested braced sections count as single
// members, like `{a,{b,c},d}`.
fn parse_comma_parts(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let Some(m) = balanced("{", "}", text) else {
        return text.split(',').map(str::to_string).collect();
    };

    let mut parts: Vec<String> = m.pre.split(',').map(str::to_string).collect();
    let last = parts.len() - 1;
    parts[last].push('{');
    parts[last].push_str(m.body);
    parts[last].push('}');

    let mut post_parts = parse_comma_parts(m.post);
    if !m.post.is_empty() {
        parts[last].push_str(&post_parts.remove(0));
        parts.append(&mut post_parts);
    }

    parts
}

// A sequence endpoint forces zero padding when it starts with 0 or -0
// followed by another digit.
fn is_padded(endpoint: &str) -> bool {
    let b = endpoint.as_bytes();
    (b.len() >= 3 && b.starts_with(b"-0") && b[2].is_ascii_digit())
        || (b.len() >= 2 && b[0] == b'0' && b[1].is_ascii_digit())
}

fn index_of_char(text: &str, c: char) -> isize {
    text.find(c).map_or(-1, |i| i as isize)
}

fn expand(text: &str, is_top: bool) -> Vec<String> {
    let Some(m) = balanced("{", "}", text) else {
        return vec![text.to_string()];
    };
    // a $ right before the group keeps shell-variable placeholders intact
    if m.pre.ends_with('$') {
        return vec![text.to_string()];
    }

    let is_numeric = NUMERIC_SEQUENCE.is_match(m.body).unwrap_or(false);
    let is_alpha = ALPHA_SEQUENCE.is_match(m.body).unwrap_or(false);
    let is_sequence = is_numeric || is_alpha;
    let is_options = m.body.contains(',');

    if !is_sequence && !is_options {
        // {a},b}: when a comma shows up before the next close in the
        // remainder, the close of this group is demoted to literal text and
        // the whole thing is expanded again (bash does the same)
        if index_of_char(m.post, ',') < index_of_char(m.post, '}') {
            let retried = format!("{}{{{}{}{}", m.pre, m.body, ESC_CLOSE, m.post);
            return expand(&retried, false);
        }
        return vec![text.to_string()];
    }

    let mut parts: Vec<String>;
    if is_sequence {
        parts = m.body.split("..").map(str::to_string).collect();
    } else {
        parts = parse_comma_parts(m.body);
        if parts.len() == 1 {
            // x{{a,b}}y ==> x{a}y x{b}y
            parts = expand(&parts[0], false)
                .into_iter()
                .map(|part| format!("{{{part}}}"))
                .collect();
            if parts.len() == 1 {
                let post = if m.post.is_empty() {
                    vec![String::new()]
                } else {
                    expand(m.post, false)
                };
                return post
                    .into_iter()
                    .map(|p| format!("{}{}{}", m.pre, parts[0], p))
                    .collect();
            }
        }
    }

    // at this point parts holds the group's members, and it is not a comma
    // set with a single entry

    // pre is guaranteed to be free of brace sets, no need to expand it
    let pre = m.pre;
    let post = if m.post.is_empty() {
        vec![String::new()]
    } else {
        expand(m.post, false)
    };

    let values: Vec<String> = if is_sequence {
        let x = numeric(&parts[0]);
        let y = numeric(&parts[1]);
        let width = parts[0].len().max(parts[1].len());
        let mut incr = if parts.len() == 3 {
            numeric(&parts[2]).abs()
        } else {
            1
        };
        if incr == 0 {
            incr = 1;
        }
        let reverse = y < x;
        if reverse {
            incr = -incr;
        }
        let pad = parts.iter().any(|part| is_padded(part));

        let mut values = Vec::new();
        let mut i = x;
        while if reverse { i >= y } else { i <= y } {
            let value = if is_alpha {
                match u32::try_from(i).ok().and_then(char::from_u32) {
                    Some('\\') | None => String::new(),
                    Some(c) => c.to_string(),
                }
            } else {
                let digits = i.to_string();
                if pad && width > digits.len() {
                    let zeros = "0".repeat(width - digits.len());
                    if i < 0 {
                        format!("-{}{}", zeros, &digits[1..])
                    } else {
                        format!("{zeros}{digits}")
                    }
                } else {
                    digits
                }
            };
            values.push(value);
            i += incr;
        }
        values
    } else {
        parts.iter().flat_map(|part| expand(part, false)).collect()
    };

    let mut expansions = Vec::with_capacity(values.len() * post.len());
    for value in &values {
        for p in &post {
            let expansion = format!("{pre}{value}{p}");
            // bash drops bare empty results at the top level, unless an
            // explicit sequence produced them
            if !is_top || is_sequence || !expansion.is_empty() {
                expansions.push(expansion);
            }
        }
    }
    expansions
}

#[test]
fn expands_comma_lists() {
    assert_eq!(
        expand_braces("a{b,c{d,e},{f,g}h}x{y,z}"),
        [
            "abxy", "abxz", "acdxy", "acdxz", "acexy", "acexz", "afhxy", "afhxz", "aghxy", "aghxz",
        ]
    );
    assert_eq!(expand_braces("a{b,c}d"), ["abd", "acd"]);
    assert_eq!(expand_braces("a{d,c,b}e"), ["ade", "ace", "abe"]);
    assert_eq!(expand_braces("-v{,,,,}"), ["-v", "-v", "-v", "-v", "-v"]);
}

#[test]
fn single_member_groups_stay_literal() {
    assert_eq!(expand_braces("a{b}c"), ["a{b}c"]);
    assert_eq!(expand_braces("{a..9}"), ["{a..9}"]);
}

#[test]
fn expands_numeric_sequences() {
    assert_eq!(expand_braces("a{1..5}b"), ["a1b", "a2b", "a3b", "a4b", "a5b"]);
    assert_eq!(
        expand_braces("a{1..2}b{2..3}c"),
        ["a1b2c", "a1b3c", "a2b2c", "a2b3c"]
    );
    assert_eq!(expand_braces("{1..2}{2..3}"), ["12", "13", "22", "23"]);
    assert_eq!(expand_braces("{0..8..2}"), ["0", "2", "4", "6", "8"]);
    assert_eq!(expand_braces("{1..8..2}"), ["1", "3", "5", "7"]);
    assert_eq!(expand_braces("{3..-2}"), ["3", "2", "1", "0", "-1", "-2"]);
}

#[test]
fn expands_alpha_sequences() {
    assert_eq!(
        expand_braces("1{a..b}2{b..c}3"),
        ["1a2b3", "1a2c3", "1b2b3", "1b2c3"]
    );
    assert_eq!(expand_braces("{a..b}{b..c}"), ["ab", "ac", "bb", "bc"]);
    assert_eq!(expand_braces("{a..k..2}"), ["a", "c", "e", "g", "i", "k"]);
    assert_eq!(expand_braces("{b..k..2}"), ["b", "d", "f", "h", "j"]);
}

#[test]
fn expands_reversed_sequences() {
    assert_eq!(expand_braces("{3..1}"), ["3", "2", "1"]);
    assert_eq!(expand_braces("{10..8}"), ["10", "9", "8"]);
    assert_eq!(expand_braces("{10..08}"), ["10", "09", "08"]);
    assert_eq!(expand_braces("{c..a}"), ["c", "b", "a"]);
    assert_eq!(expand_braces("{4..0..2}"), ["4", "2", "0"]);
    assert_eq!(expand_braces("{4..0..-2}"), ["4", "2", "0"]);
    assert_eq!(expand_braces("{e..a..2}"), ["e", "c", "a"]);
}

#[test]
fn preserves_zero_padding() {
    assert_eq!(expand_braces("{9..11}"), ["9", "10", "11"]);
    assert_eq!(expand_braces("{09..11}"), ["09", "10", "11"]);
    assert_eq!(
        expand_braces("a{00..05}b"),
        ["a00b", "a01b", "a02b", "a03b", "a04b", "a05b"]
    );
}

#[test]
fn ignores_dollar_prefixed_groups() {
    assert_eq!(expand_braces("${1..3}"), ["${1..3}"]);
    assert_eq!(expand_braces("${a,b}${c,d}"), ["${a,b}${c,d}"]);
    assert_eq!(expand_braces("x${a,b}x${c,d}x"), ["x${a,b}x${c,d}x"]);
}

#[test]
fn expands_nested_groups() {
    assert_eq!(expand_braces("{a,b{1..3},c}"), ["a", "b1", "b2", "b3", "c"]);
    let alphabet: Vec<String> = ('A'..='Z')
        .chain('a'..='z')
        .map(|c| c.to_string())
        .collect();
    assert_eq!(expand_braces("{{A..Z},{a..z}}"), alphabet);
    assert_eq!(
        expand_braces("ppp{,config,oe{,conf}}"),
        ["ppp", "pppconfig", "pppoe", "pppoeconf"]
    );
}

#[test]
fn handles_unbalanced_groups() {
    assert_eq!(expand_braces("z{a,b},c}d"), ["za,c}d", "zb,c}d"]);
    assert_eq!(expand_braces("z{a,b{,c}d"), ["z{a,bd", "z{a,bcd"]);
    assert_eq!(expand_braces("a{b{c{d,e}f}g}h"), ["a{b{cdf}g}h", "a{b{cef}g}h"]);
    assert_eq!(
        expand_braces("a{b{c{d,e}f{x,y}}g}h"),
        ["a{b{cdfx}g}h", "a{b{cdfy}g}h", "a{b{cefx}g}h", "a{b{cefy}g}h"]
    );
    assert_eq!(
        expand_braces("a{b{c{d,e}f{x,y{}g}h"),
        ["a{b{cdfxh", "a{b{cdfy{}gh", "a{b{cefxh", "a{b{cefy{}gh"]
    );
}

#[test]
fn protects_leading_empty_group() {
    assert_eq!(expand_braces("{},a}b"), ["{},a}b"]);
    assert_eq!(expand_braces("a{},b}c"), ["a}c", "abc"]);
}
