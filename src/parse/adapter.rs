//! Source parser adapter
//!
//! One shared [`ParserAdapter`] is reused across all parses. Grammars are
//! loaded once per language through the [`GrammarRegistry`]; a language
//! without a grammar fails with [`ParseFailure::GrammarUnavailable`].
//! Parsing itself never fails: malformed input yields a partial tree with
//! `ERROR` nodes, and [`SyntaxTree::find_first_error`] is the syntax gate.

use crate::language::Language;
use crate::parse::grammar::{self, BlockStyle, Grammar};
use crate::parse::tree::{NodeId, SyntaxNode, SyntaxTree, ERROR_KIND};
use rustc_hash::FxHashMap;
use std::fmt;
use std::rc::Rc;

/// Failure to obtain a grammar. Distinct from syntax errors, which are
/// represented inside the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    GrammarUnavailable { language: Language },
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFailure::GrammarUnavailable { language } => {
                write!(f, "could not load grammar for {}", language)
            }
        }
    }
}

impl std::error::Error for ParseFailure {}

/// Load-once-per-language grammar cache.
pub struct GrammarRegistry {
    loader: fn(Language) -> Option<Grammar>,
    loaded: FxHashMap<Language, Rc<Grammar>>,
}

impl GrammarRegistry {
    /// Registry backed by the bundled grammars.
    pub fn new() -> Self {
        GrammarRegistry {
            loader: grammar::load,
            loaded: FxHashMap::default(),
        }
    }

    /// Registry with no grammars at all; every load fails. Used to exercise
    /// the `GrammarUnavailable` path.
    pub fn unavailable() -> Self {
        GrammarRegistry {
            loader: |_| None,
            loaded: FxHashMap::default(),
        }
    }

    pub fn load(&mut self, language: Language) -> Result<Rc<Grammar>, ParseFailure> {
        if let Some(g) = self.loaded.get(&language) {
            return Ok(Rc::clone(g));
        }
        let grammar = (self.loader)(language)
            .ok_or(ParseFailure::GrammarUnavailable { language })?;
        let grammar = Rc::new(grammar);
        self.loaded.insert(language, Rc::clone(&grammar));
        Ok(grammar)
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The shared parser instance.
pub struct ParserAdapter {
    registry: GrammarRegistry,
}

impl ParserAdapter {
    pub fn new() -> Self {
        ParserAdapter {
            registry: GrammarRegistry::new(),
        }
    }

    pub fn with_registry(registry: GrammarRegistry) -> Self {
        ParserAdapter { registry }
    }

    /// The grammar handle for a language, loading it on first use.
    pub fn grammar(&mut self, language: Language) -> Result<Rc<Grammar>, ParseFailure> {
        self.registry.load(language)
    }

    /// Parse source into a concrete syntax tree. Only grammar loading can
    /// fail; malformed source produces a tree with error markers instead.
    pub fn parse(&mut self, code: &str, language: Language) -> Result<SyntaxTree, ParseFailure> {
        let grammar = self.registry.load(language)?;
        let mut builder = TreeBuilder::new(&grammar);
        for (idx, line) in code.lines().enumerate() {
            builder.feed_line(idx + 1, line);
        }
        Ok(builder.finish())
    }
}

impl Default for ParserAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of scanning one physical line for strings, comments, and
/// delimiters.
struct LineScan {
    /// Line text with any trailing comment removed.
    code: String,
    /// Column (1-based) of an opening quote whose string never closes.
    unterminated_string: Option<usize>,
    open_braces: usize,
    close_braces: usize,
    open_parens: usize,
    close_parens: usize,
}

fn scan_line(line: &str, grammar: &Grammar) -> LineScan {
    let comment = grammar.line_comment;
    let mut code = String::with_capacity(line.len());
    let mut in_string: Option<(char, usize)> = None;
    let mut open_braces = 0;
    let mut close_braces = 0;
    let mut open_parens = 0;
    let mut close_parens = 0;

    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    let mut byte_pos = 0;
    while i < chars.len() {
        let c = chars[i];
        match in_string {
            Some((quote, _)) => {
                code.push(c);
                if c == '\\' && i + 1 < chars.len() {
                    code.push(chars[i + 1]);
                    byte_pos += c.len_utf8() + chars[i + 1].len_utf8();
                    i += 2;
                    continue;
                }
                if c == quote {
                    in_string = None;
                }
            }
            None => {
                if line[byte_pos..].starts_with(comment) {
                    break;
                }
                if grammar.string_quotes.contains(&c) {
                    in_string = Some((c, i + 1));
                } else {
                    match c {
                        '{' => open_braces += 1,
                        '}' => close_braces += 1,
                        '(' => open_parens += 1,
                        ')' => close_parens += 1,
                        _ => {}
                    }
                }
                code.push(c);
            }
        }
        byte_pos += c.len_utf8();
        i += 1;
    }

    LineScan {
        code,
        unterminated_string: in_string.map(|(_, col)| col),
        open_braces,
        close_braces,
        open_parens,
        close_parens,
    }
}

/// Builds a tree line by line, tracking block structure.
struct TreeBuilder<'g> {
    grammar: &'g Grammar,
    tree: SyntaxTree,
    /// Open blocks: `(node, header_indent)`. The root sits at the bottom and
    /// is never popped.
    parents: Vec<(NodeId, usize)>,
    last_line: usize,
}

impl<'g> TreeBuilder<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let tree = SyntaxTree::new(grammar.root_kind);
        TreeBuilder {
            grammar,
            tree,
            parents: vec![(0, 0)],
            last_line: 1,
        }
    }

    fn current_parent(&self) -> NodeId {
        self.parents.last().map(|(id, _)| *id).unwrap_or(0)
    }

    fn push_error(&mut self, line: usize, start_column: usize, end_column: usize, text: &str) {
        let parent = self.current_parent();
        self.tree.push_node(
            parent,
            SyntaxNode {
                kind: ERROR_KIND,
                name: None,
                line,
                start_column,
                end_column: end_column.max(start_column),
                text: text.to_string(),
                children: Vec::new(),
            },
        );
    }

    fn feed_line(&mut self, line_no: usize, raw: &str) {
        self.last_line = line_no;
        if raw.trim().is_empty() {
            return;
        }
        let scan = scan_line(raw, self.grammar);
        let trimmed = scan.code.trim();
        if trimmed.is_empty() {
            return;
        }
        let indent = scan.code.len() - scan.code.trim_start().len();

        if let Some(col) = scan.unterminated_string {
            self.push_error(line_no, col, raw.chars().count(), trimmed);
            return;
        }
        // A line that closes more parens than it opens is malformed on its
        // own; the opposite may legitimately continue on the next line.
        if scan.close_parens > scan.open_parens {
            self.push_error(line_no, indent + 1, indent + trimmed.len(), trimmed);
            return;
        }

        match self.grammar.block_style {
            BlockStyle::Braces => self.feed_braced(line_no, trimmed, indent, &scan),
            BlockStyle::Indent => self.feed_indented(line_no, trimmed, indent),
        }
    }

    fn feed_braced(&mut self, line_no: usize, trimmed: &str, indent: usize, scan: &LineScan) {
        let mut text = trimmed;
        let mut closes = scan.close_braces;
        let opens = scan.open_braces;

        // Leading closers end blocks before any new statement on the line.
        while text.starts_with('}') {
            if self.parents.len() > 1 {
                self.parents.pop();
            } else {
                self.push_error(line_no, indent + 1, indent + trimmed.len(), trimmed);
                return;
            }
            closes = closes.saturating_sub(1);
            text = text[1..].trim_start_matches([' ', ';']);
        }
        if text.is_empty() {
            return;
        }

        let classified = self.grammar.classify(text);
        let parent = self.current_parent();
        let node = self.tree.push_node(
            parent,
            SyntaxNode {
                kind: classified.kind,
                name: classified.name,
                line: line_no,
                start_column: indent + 1,
                end_column: indent + trimmed.len(),
                text: text.to_string(),
                children: Vec::new(),
            },
        );

        if opens > closes {
            self.parents.push((node, indent));
        } else if closes > opens {
            let extra = closes - opens;
            for _ in 0..extra {
                if self.parents.len() > 1 {
                    self.parents.pop();
                } else {
                    self.push_error(line_no, indent + 1, indent + trimmed.len(), trimmed);
                    return;
                }
            }
        }
    }

    fn feed_indented(&mut self, line_no: usize, trimmed: &str, indent: usize) {
        while self.parents.len() > 1 {
            let (_, header_indent) = self.parents[self.parents.len() - 1];
            if indent <= header_indent {
                self.parents.pop();
            } else {
                break;
            }
        }

        let classified = self.grammar.classify(trimmed);
        let parent = self.current_parent();
        let node = self.tree.push_node(
            parent,
            SyntaxNode {
                kind: classified.kind,
                name: classified.name,
                line: line_no,
                start_column: indent + 1,
                end_column: indent + trimmed.len(),
                text: trimmed.to_string(),
                children: Vec::new(),
            },
        );

        if trimmed.ends_with(':') {
            self.parents.push((node, indent));
        }
    }

    fn finish(mut self) -> SyntaxTree {
        if self.grammar.block_style == BlockStyle::Braces && self.parents.len() > 1 {
            let line = self.last_line;
            self.push_error(line, 1, 1, "unclosed block at end of input");
        }
        self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(code: &str, language: Language) -> SyntaxTree {
        let mut adapter = ParserAdapter::new();
        adapter.parse(code, language).unwrap()
    }

    #[test]
    fn python_tree_shape() {
        let tree = parse(
            "def add(a, b):\n    return a + b\n\nx = add(1, 2)\nprint(x)\n",
            Language::Python,
        );
        assert!(!tree.has_error());
        let root = tree.root();
        assert_eq!(root.children.len(), 3);
        let def = tree.node(root.children[0]);
        assert_eq!(def.kind, "function_definition");
        assert_eq!(def.children.len(), 1);
        assert_eq!(tree.node(def.children[0]).kind, "return_statement");
        assert_eq!(tree.node(root.children[2]).kind, "call");
    }

    #[test]
    fn braces_nest_blocks() {
        let tree = parse(
            "fn main() {\n    let a = 5;\n    if a > 1 {\n        let b = 2;\n    }\n}\n",
            Language::Rust,
        );
        assert!(!tree.has_error());
        let root = tree.root();
        assert_eq!(root.children.len(), 1);
        let main = tree.node(root.children[0]);
        assert_eq!(main.kind, "function_item");
        assert_eq!(main.children.len(), 2);
        let if_node = tree.node(main.children[1]);
        assert_eq!(if_node.kind, "if_expression");
        assert_eq!(if_node.children.len(), 1);
    }

    #[test]
    fn unterminated_string_is_error() {
        let tree = parse("x = \"oops\nprint(x)\n", Language::Python);
        assert!(tree.has_error());
        let err = tree.find_first_error().unwrap();
        assert_eq!(tree.node(err).line, 1);
    }

    #[test]
    fn unclosed_brace_is_error() {
        let tree = parse("fn main() {\n    let a = 1;\n", Language::Rust);
        assert!(tree.has_error());
        assert!(tree.find_first_error().is_some());
    }

    #[test]
    fn stray_close_paren_is_error() {
        let tree = parse("a = (1 + 2))\n", Language::Python);
        assert!(tree.has_error());
    }

    #[test]
    fn comments_are_ignored(){
        let tree = parse("# leading comment\nx = 1  # trailing\n", Language::Python);
        assert!(!tree.has_error());
        assert_eq!(tree.root().children.len(), 1);
    }

    #[test]
    fn grammar_unavailable() {
        let mut adapter = ParserAdapter::with_registry(GrammarRegistry::unavailable());
        let err = adapter.parse("x = 1", Language::Python).unwrap_err();
        assert_eq!(
            err,
            ParseFailure::GrammarUnavailable {
                language: Language::Python
            }
        );
    }

    #[test]
    fn grammar_loaded_once_and_shared() {
        let mut adapter = ParserAdapter::new();
        let a = adapter.grammar(Language::Go).unwrap();
        let b = adapter.grammar(Language::Go).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }
}
