//! Delimiter boundary scanning.
//!
//! Depth counting is family specific: a scan started on `(` only counts
//! parentheses, a scan started on `[` only brackets. Delimiters inside string
//! or comment literals are counted like any other.

use serde::{Deserialize, Serialize};

/// Opening/closing delimiter family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Paren,
    Bracket,
    Brace,
}

impl Delimiter {
    pub const fn open(self) -> u8 {
        match self {
            Self::Paren => b'(',
            Self::Bracket => b'[',
            Self::Brace => b'{',
        }
    }

    pub const fn close(self) -> u8 {
        match self {
            Self::Paren => b')',
            Self::Bracket => b']',
            Self::Brace => b'}',
        }
    }

    pub const fn from_open(byte: u8) -> Option<Self> {
        match byte {
            b'(' => Some(Self::Paren),
            b'[' => Some(Self::Bracket),
            b'{' => Some(Self::Brace),
            _ => None,
        }
    }

    pub const fn from_close(byte: u8) -> Option<Self> {
        match byte {
            b')' => Some(Self::Paren),
            b']' => Some(Self::Bracket),
            b'}' => Some(Self::Brace),
            _ => None,
        }
    }
}

/// Half-open byte range `[start, end)` of a source text.
///
/// `truncated` marks a scan that hit end-of-text before its delimiters balanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            truncated: false,
        }
    }

    pub const fn truncated(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            truncated: true,
        }
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub const fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Structural kind of a delimited form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormKind {
    #[serde(rename = "list_lit")]
    List,
    #[serde(rename = "vec_lit")]
    Vector,
    #[serde(rename = "map_lit")]
    Map,
    #[serde(rename = "set_lit")]
    Set,
}

impl FormKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list_lit",
            Self::Vector => "vec_lit",
            Self::Map => "map_lit",
            Self::Set => "set_lit",
        }
    }

    /// Kind for a tree-sitter node kind, if it is a collection literal
    pub fn from_node_kind(kind: &str) -> Option<Self> {
        match kind {
            "list_lit" => Some(Self::List),
            "vec_lit" => Some(Self::Vector),
            "map_lit" => Some(Self::Map),
            "set_lit" => Some(Self::Set),
            _ => None,
        }
    }
}

/// A delimited form located by scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub kind: FormKind,
    pub span: Span,
    pub depth: usize,
}

/// Scan from the opening delimiter at `start` to its partner.
///
/// Returns `None` when `start` is not an opening delimiter. On unbalanced
/// input the span runs to end-of-text and is flagged truncated.
pub fn scan_form(text: &str, start: usize) -> Option<Span> {
    let bytes = text.as_bytes();
    let delimiter = Delimiter::from_open(*bytes.get(start)?)?;
    let (open, close) = (delimiter.open(), delimiter.close());

    let mut depth = 0usize;
    for (idx, &byte) in bytes.iter().enumerate().skip(start) {
        if byte == open {
            depth += 1;
        } else if byte == close {
            depth -= 1;
            if depth == 0 {
                return Some(Span::new(start, idx + 1));
            }
        }
    }

    log::debug!(
        "Unbalanced {:?} form at byte {}; span truncated at end of text",
        delimiter,
        start
    );
    Some(Span::truncated(start, bytes.len()))
}

/// Scan backwards from the closing delimiter at `end` to its partner's offset
pub fn scan_back(text: &str, end: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let delimiter = Delimiter::from_close(*bytes.get(end)?)?;
    let (open, close) = (delimiter.open(), delimiter.close());

    let mut depth = 0usize;
    for idx in (0..=end).rev() {
        let byte = bytes[idx];
        if byte == close {
            depth += 1;
        } else if byte == open {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

/// Every top-level form in document order
pub fn top_level_forms(text: &str) -> Vec<Form> {
    let bytes = text.as_bytes();
    let mut forms = Vec::new();
    let mut idx = 0;

    while idx < bytes.len() {
        let Some(delimiter) = Delimiter::from_open(bytes[idx]) else {
            idx += 1;
            continue;
        };
        let Some(mut span) = scan_form(text, idx) else {
            idx += 1;
            continue;
        };
        let kind = match delimiter {
            Delimiter::Paren => FormKind::List,
            Delimiter::Bracket => FormKind::Vector,
            Delimiter::Brace if idx > 0 && bytes[idx - 1] == b'#' => {
                span.start = idx - 1;
                FormKind::Set
            }
            Delimiter::Brace => FormKind::Map,
        };
        idx = span.end;
        forms.push(Form {
            kind,
            span,
            depth: 0,
        });
    }

    forms
}

/// The top-level form whose span contains `offset`
pub fn enclosing_top_level(text: &str, offset: usize) -> Option<Form> {
    top_level_forms(text)
        .into_iter()
        .find(|form| form.span.contains(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_form_kind_from_node_kind() {
        for kind in [FormKind::List, FormKind::Vector, FormKind::Map, FormKind::Set] {
            assert_eq!(FormKind::from_node_kind(kind.as_str()), Some(kind));
        }
        assert_eq!(FormKind::from_node_kind("sym_lit"), None);
    }

    #[test]
    fn test_scan_balanced_list() {
        let text = "(defn f [x] (inc x)) (g)";
        assert_eq!(scan_form(text, 0), Some(Span::new(0, 20)));
        assert_eq!(scan_form(text, 21), Some(Span::new(21, 24)));
    }

    #[test]
    fn test_scan_counts_only_its_family() {
        let text = "[a (b] c]";
        assert_eq!(scan_form(text, 0), Some(Span::new(0, 6)));
    }

    #[test]
    fn test_scan_not_an_opener() {
        assert_eq!(scan_form("abc", 0), None);
        assert_eq!(scan_form("(a)", 10), None);
    }

    #[test]
    fn test_one_missing_close_truncates_at_end() {
        let text = "(defn f [x] (inc x)";
        let span = scan_form(text, 0).unwrap();
        assert_eq!(span.end, text.len());
        assert!(span.truncated);
    }

    #[test]
    fn test_delimiters_in_strings_are_counted() {
        let text = r#"(println "(") (next)"#;
        let span = scan_form(text, 0).unwrap();
        assert!(span.truncated, "string paren should unbalance the scan: {span:?}");
    }

    #[test]
    fn test_scan_back() {
        let text = "(a [b] (c d))";
        assert_eq!(scan_back(text, 12), Some(0));
        assert_eq!(scan_back(text, 5), Some(3));
        assert_eq!(scan_back(text, 0), None);
    }

    #[test]
    fn test_top_level_forms() {
        let text = "(ns a)\n[1 2]\n#{:x}\n{:k 1}\n(defn f [] 1)";
        let forms = top_level_forms(text);
        let kinds: Vec<_> = forms.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FormKind::List,
                FormKind::Vector,
                FormKind::Set,
                FormKind::Map,
                FormKind::List
            ]
        );
        assert_eq!(&text[forms[2].span.start..forms[2].span.end], "#{:x}");
    }

    #[test]
    fn test_enclosing_top_level() {
        let text = "(a)\n\n(b (c))";
        assert_eq!(enclosing_top_level(text, 4), None);
        let form = enclosing_top_level(text, 9).unwrap();
        assert_eq!(form.span, Span::new(5, 12));
    }

    proptest! {
        #[test]
        fn proptest_scan_terminates_within_text(text in "[()\\[\\]{} a]{1,60}") {
            for (idx, byte) in text.bytes().enumerate() {
                if Delimiter::from_open(byte).is_some() {
                    let span = scan_form(&text, idx).unwrap();
                    prop_assert!(span.start == idx);
                    prop_assert!(span.end <= text.len());
                    prop_assert!(span.end > span.start);
                    if span.truncated {
                        prop_assert_eq!(span.end, text.len());
                    }
                }
            }
        }

        #[test]
        fn proptest_unbalanced_by_one_runs_to_end(depth in 1usize..30) {
            let text = format!("{}x{}", "(".repeat(depth), ")".repeat(depth - 1));
            let span = scan_form(&text, 0).unwrap();
            prop_assert!(span.truncated);
            prop_assert_eq!(span.end, text.len());
        }
    }
}
