//! Balanced delimiter pair matching, like `{` and `}` or `<b>` and `</b>`.

use fancy_regex::Regex;

/// The first non-nested delimiter pair found in a string.
///
/// `start` and `end` are the byte offsets of the open and close tokens;
/// `pre`, `body` and `post` are the surrounding substrings with the tokens
/// themselves removed, so `pre + open + body + close + post` reassembles the
/// original input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Balanced<'a> {
    /// Byte offset of the open token.
    pub start: usize,
    /// Byte offset of the matching close token.
    pub end: usize,
    /// Everything before the open token.
    pub pre: &'a str,
    /// Everything between the pair, tokens not included.
    pub body: &'a str,
    /// Everything after the close token.
    pub post: &'a str,
}

/// Find the first non-nested matching pair of `open` and `close` in `text`.
///
/// If `text` contains more `open`s than `close`s, the first pair that gets
/// closed wins: `{{a}` matches `["{", "a", ""]` and `{a}}` matches
/// `["", "a", "}"]`. When `open` and `close` are the same token, the pair is
/// simply the first two occurrences. Returns `None` when no pair exists.
pub fn balanced<'a>(open: &str, close: &str, text: &'a str) -> Option<Balanced<'a>> {
    let (start, end) = balanced_range(open, close, text)?;
    Some(Balanced {
        start,
        end,
        pre: &text[..start],
        body: if start + open.len() <= end {
            &text[start + open.len()..end]
        } else {
            ""
        },
        post: &text[end + close.len()..],
    })
}

/// Works like [`balanced`], but accepts regex patterns: the first match of
/// each pattern in `text` becomes the token for the rest of the algorithm.
pub fn balanced_regex<'a>(open: &Regex, close: &Regex, text: &'a str) -> Option<Balanced<'a>> {
    let open = open.find(text).ok().flatten()?;
    let close = close.find(text).ok().flatten()?;
    balanced(open.as_str(), close.as_str(), text)
}

/// Byte offsets of the first non-nested pair of `open` and `close`, tokens
/// included.
///
/// The scan walks successive `open`/`close` occurrences left to right while
/// stacking pending opens. The innermost pair that gets closed is the
/// result; if opens outnumber closes, the widest pair recorded while
/// unwinding is used instead.
fn balanced_range(open: &str, close: &str, text: &str) -> Option<(usize, usize)> {
    let mut ai = index_of(text, open, 0);
    let mut bi = index_of(text, close, (ai + 1).max(0) as usize);

    if ai < 0 || bi < 0 {
        return None;
    }
    if open == close {
        return Some((ai as usize, bi as usize));
    }

    let mut begs: Vec<isize> = Vec::new();
    let mut left = text.len() as isize;
    let mut right: isize = -1;
    let mut i = ai;
    let mut result: Option<(isize, isize)> = None;

    while i >= 0 && result.is_none() {
        if i == ai {
            begs.push(i);
            ai = index_of(text, open, (i + 1) as usize);
        } else if begs.len() == 1 {
            result = begs.pop().map(|beg| (beg, bi));
        } else if let Some(beg) = begs.pop() {
            if beg < left {
                left = beg;
                right = bi;
            }
            bi = index_of(text, close, (i + 1) as usize);
        }

        i = if ai < bi && ai >= 0 { ai } else { bi };
    }

    if !begs.is_empty() && right >= 0 {
        result = Some((left, right));
    }

    result.map(|(a, b)| (a as usize, b as usize))
}

/// `str::find` starting at a byte offset, with `-1` when absent.
fn index_of(text: &str, token: &str, from: usize) -> isize {
    let mut from = from;
    while from < text.len() && !text.is_char_boundary(from) {
        from += 1;
    }
    if from > text.len() {
        return -1;
    }
    match text[from..].find(token) {
        Some(i) => (from + i) as isize,
        None => -1,
    }
}

#[test]
fn balanced_braces() {
    let r = balanced("{", "}", "pre{in{nest}}post").unwrap();
    assert_eq!((r.start, r.end), (3, 12));
    assert_eq!((r.pre, r.body, r.post), ("pre", "in{nest}", "post"));

    let r = balanced("{", "}", "{{{{{{{{{in}post").unwrap();
    assert_eq!((r.start, r.end), (8, 11));
    assert_eq!((r.pre, r.body, r.post), ("{{{{{{{{", "in", "post"));

    let r = balanced("{", "}", "pre{body{in}post").unwrap();
    assert_eq!((r.start, r.end), (8, 11));
    assert_eq!((r.pre, r.body, r.post), ("pre{body", "in", "post"));

    let r = balanced("{", "}", "pre{in}po}st").unwrap();
    assert_eq!((r.start, r.end), (3, 6));
    assert_eq!((r.pre, r.body, r.post), ("pre", "in", "po}st"));

    let r = balanced("{", "}", "pre}{in{nest}}post").unwrap();
    assert_eq!((r.start, r.end), (4, 13));
    assert_eq!((r.pre, r.body, r.post), ("pre}", "in{nest}", "post"));

    let r = balanced("{", "}", "pre{body}between{body2}post").unwrap();
    assert_eq!((r.start, r.end), (3, 8));
    assert_eq!((r.pre, r.body, r.post), ("pre", "body", "between{body2}post"));

    let r = balanced("{", "}", "pre{{first}in{second}post").unwrap();
    assert_eq!((r.start, r.end), (4, 10));
    assert_eq!((r.pre, r.body, r.post), ("pre{", "first", "in{second}post"));
}

#[test]
fn balanced_multi_char_tokens() {
    let r = balanced("<b>", "</b>", "pre<b>in<b>nest</b></b>post").unwrap();
    assert_eq!((r.start, r.end), (3, 19));
    assert_eq!((r.pre, r.body, r.post), ("pre", "in<b>nest</b>", "post"));

    let r = balanced("<b>", "</b>", "pre</b><b>in<b>nest</b></b>post").unwrap();
    assert_eq!((r.start, r.end), (7, 23));
    assert_eq!((r.pre, r.body, r.post), ("pre</b>", "in<b>nest</b>", "post"));

    let r = balanced("{{", "}}", "pre{{{in}}}post").unwrap();
    assert_eq!((r.start, r.end), (3, 9));
    assert_eq!((r.pre, r.body, r.post), ("pre", "{in}", "post"));

    let r = balanced("{{{", "}}", "pre{{{in}}}post").unwrap();
    assert_eq!((r.start, r.end), (3, 8));
    assert_eq!((r.pre, r.body, r.post), ("pre", "in", "}post"));

    // tokens may overlap in the text
    let r = balanced("<?", "?>", "pre<?>post").unwrap();
    assert_eq!((r.start, r.end), (3, 4));
    assert_eq!((r.pre, r.body, r.post), ("pre", "", "post"));
}

#[test]
fn balanced_equal_tokens() {
    let r = balanced("___", "___", "PRE ___BODY___ POST").unwrap();
    assert_eq!((r.start, r.end), (4, 11));
    assert_eq!((r.pre, r.body, r.post), ("PRE ", "BODY", " POST"));
}

#[test]
fn balanced_misses() {
    assert_eq!(balanced("{", "}", "nope"), None);
    assert_eq!(balanced("{", "}", "{nope"), None);
    assert_eq!(balanced("{", "}", "nope}"), None);
    assert_eq!(balanced("{", "}", "}{"), None);
}

#[test]
fn balanced_regex_tokens() {
    let open = Regex::new(r"\{").unwrap();
    let close = Regex::new(r"\}").unwrap();
    assert_eq!(balanced_regex(&open, &close, "nope"), None);

    let open = Regex::new(r"\s+\{\s+").unwrap();
    let close = Regex::new(r"\s+\}\s+").unwrap();
    let r = balanced_regex(&open, &close, "pre  {   in{nest}   }  post").unwrap();
    assert_eq!((r.start, r.end), (3, 17));
    assert_eq!((r.pre, r.body, r.post), ("pre", "in{nest}", "post"));
}
