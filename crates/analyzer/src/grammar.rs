//! Shared handle on the tree-sitter Clojure grammar and parse-tree helpers.

use crate::error::{AnalyzerError, DetailError, Result};
use std::fmt;
use tree_sitter::{Language, Node, Parser, Tree};

/// Immutable handle on the Clojure grammar.
///
/// A parser is created per parse call, so one handle can be shared by any
/// number of threads without locking.
#[derive(Clone)]
pub struct ClojureGrammar {
    language: Language,
}

impl ClojureGrammar {
    /// Load the grammar and check that a parser accepts it
    pub fn new() -> Result<Self> {
        let grammar = Self {
            language: tree_sitter_clojure::LANGUAGE.into(),
        };
        grammar
            .parser()
            .map_err(|e| AnalyzerError::tree_sitter(e.to_string()))?;
        Ok(grammar)
    }

    fn parser(&self) -> std::result::Result<Parser, DetailError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| DetailError::ParserUnavailable(format!("Failed to set language: {e}")))?;
        Ok(parser)
    }

    /// Parse a single, self-contained form
    pub fn parse(&self, text: &str) -> std::result::Result<Tree, DetailError> {
        self.parser()?
            .parse(text, None)
            .ok_or(DetailError::ParseFailed)
    }
}

impl fmt::Debug for ClojureGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClojureGrammar")
            .field("abi_version", &self.language.version())
            .finish()
    }
}

/// Text covered by `node`
pub(crate) fn node_text<'a>(content: &'a str, node: Node<'_>) -> &'a str {
    content.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Named children that carry a value (comments and `#_` forms skipped)
pub(crate) fn value_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !matches!(child.kind(), "comment" | "dis_expr"))
        .collect()
}

/// First collection literal at the top of a parsed tree
pub(crate) fn first_form<'t>(tree: &'t Tree, kind: &str) -> Option<Node<'t>> {
    value_children(tree.root_node())
        .into_iter()
        .find(|child| child.kind() == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_form() {
        let grammar = ClojureGrammar::new().unwrap();
        let text = "(defn f \"doc\" [x] ; note\n x)";
        let tree = grammar.parse(text).unwrap();
        let list = first_form(&tree, "list_lit").unwrap();
        let kinds: Vec<_> = value_children(list).iter().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec!["sym_lit", "sym_lit", "str_lit", "vec_lit", "sym_lit"]);
        assert_eq!(node_text(text, value_children(list)[2]), "\"doc\"");
    }

    #[test]
    fn test_grammar_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClojureGrammar>();
    }
}
