use std::collections::BTreeSet;

use tree_sitter::{Query, QueryCursor, StreamingIterator};

use crate::types::{ClassInfo, DocError, FunctionInfo, Result};

/// Raw structural facts gathered by one syntax-tree walk
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub exports: BTreeSet<String>,
    pub branch_count: usize,
}

impl Extraction {
    pub fn new() -> Self {
        Self::default()
    }
}

pub trait Parser: Send + Sync {
    /// Walk the source once; `Err` means the grammar rejected it
    fn parse(&self, content: &str) -> Result<Extraction>;
    fn language(&self) -> super::Language;
}

/// Extract text content from a tree-sitter node.
/// Returns empty string if extraction fails (with debug logging).
#[inline]
pub fn get_node_text<'a>(node: tree_sitter::Node, content: &'a [u8]) -> &'a str {
    node.utf8_text(content).unwrap_or_else(|e| {
        tracing::debug!(
            "UTF-8 extraction failed at {}:{}: {}",
            node.start_position().row + 1,
            node.start_position().column,
            e
        );
        ""
    })
}

/// Text of a named field child, if present
pub fn field_text<'a>(node: tree_sitter::Node, field: &str, content: &'a [u8]) -> Option<&'a str> {
    node.child_by_field_name(field)
        .map(|child| get_node_text(child, content))
        .filter(|text| !text.is_empty())
}

/// Whether `node` has a direct child (named or anonymous) of `kind`
pub fn has_child_kind(node: tree_sitter::Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|child| child.kind() == kind)
}

/// Pre-order visit of every node below `root`, without recursion.
pub fn walk_tree<'t, F>(root: tree_sitter::Node<'t>, mut visit: F)
where
    F: FnMut(tree_sitter::Node<'t>),
{
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Execute a tree-sitter query and process every capture with a callback.
pub fn execute_query<F>(
    language: &tree_sitter::Language,
    query_str: &str,
    root: tree_sitter::Node,
    content: &[u8],
    mut callback: F,
) where
    F: FnMut(tree_sitter::Node, &str),
{
    match Query::new(language, query_str) {
        Ok(query) => {
            let mut cursor = QueryCursor::new();
            let mut matches = cursor.matches(&query, root, content);

            while let Some(m) = matches.next() {
                for cap in m.captures.iter() {
                    let text = get_node_text(cap.node, content);
                    callback(cap.node, text);
                }
            }
        }
        Err(e) => tracing::debug!("Invalid query: {}", e),
    }
}

/// Create a tree-sitter parser for the given grammar.
pub fn create_ts_parser<L: Into<tree_sitter::Language>>(
    language: L,
    lang_name: &str,
) -> Result<tree_sitter::Parser> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&language.into())
        .map_err(|e| DocError::parse(lang_name, format!("Failed to set language: {}", e)))?;
    Ok(parser)
}

/// Parse `content`, rejecting trees that contain syntax errors.
pub fn parse_tree<L: Into<tree_sitter::Language>>(
    language: L,
    lang_name: &str,
    content: &str,
) -> Result<tree_sitter::Tree> {
    let mut parser = create_ts_parser(language, lang_name)?;
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| DocError::parse(lang_name, "parser returned no tree"))?;

    let root = tree.root_node();
    if root.has_error() {
        let position = first_error_position(root)
            .map(|(row, col)| format!(" near line {}, column {}", row + 1, col))
            .unwrap_or_default();
        return Err(DocError::parse(
            lang_name,
            format!("syntax error{}", position),
        ));
    }
    Ok(tree)
}

fn first_error_position(node: tree_sitter::Node) -> Option<(usize, usize)> {
    if node.is_error() || node.is_missing() {
        let pos = node.start_position();
        return Some((pos.row, pos.column));
    }
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.has_error())
        .find_map(first_error_position)
}

/// Names of the identifier-like children inside a parameter list.
///
/// `name_of` maps one parameter node to its bound name; parameters without a
/// simple name (destructuring patterns) keep their source text.
pub fn collect_parameters<F>(params: Option<tree_sitter::Node>, content: &[u8], name_of: F) -> Vec<String>
where
    F: Fn(tree_sitter::Node, &[u8]) -> Option<String>,
{
    let Some(params) = params else {
        return Vec::new();
    };
    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .map(|child| name_of(child, content).unwrap_or_else(|| get_node_text(child, content).to_string()))
        .filter(|name| !name.is_empty())
        .collect()
}
