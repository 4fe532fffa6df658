use super::{
    Extraction, Language, Parser, collect_parameters, field_text, get_node_text, has_child_kind,
    parse_tree, walk_tree,
};
use crate::types::{ClassInfo, FunctionInfo, Result};

const BRANCH_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "except_clause",
    "conditional_expression",
    "case_clause",
];

pub struct PythonParser;

impl PythonParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for PythonParser {
    fn parse(&self, content: &str) -> Result<Extraction> {
        let tree = parse_tree(tree_sitter_python::LANGUAGE, "python", content)?;
        let root = tree.root_node();
        let src = content.as_bytes();

        let mut result = Extraction::new();

        walk_tree(root, |node| {
            let kind = node.kind();
            if BRANCH_KINDS.contains(&kind) {
                result.branch_count += 1;
                return;
            }
            match kind {
                "function_definition" if !is_method(node) => {
                    if let Some(name) = field_text(node, "name", src) {
                        let parameters =
                            collect_parameters(node.child_by_field_name("parameters"), src, parameter_name);
                        let is_async = has_child_kind(node, "async");
                        result.functions.push(FunctionInfo::new(name, parameters, is_async));
                    }
                }
                "class_definition" => {
                    if let Some(name) = field_text(node, "name", src) {
                        let methods = node
                            .child_by_field_name("body")
                            .map(count_methods)
                            .unwrap_or(0);
                        result.classes.push(ClassInfo::new(name, methods));
                    }
                }
                "assignment" => {
                    // handler = lambda event: ...
                    if let Some(right) = node.child_by_field_name("right")
                        && right.kind() == "lambda"
                        && let Some(left) = node.child_by_field_name("left")
                        && left.kind() == "identifier"
                    {
                        let parameters =
                            collect_parameters(right.child_by_field_name("parameters"), src, parameter_name);
                        result.functions.push(FunctionInfo::new(
                            get_node_text(left, src),
                            parameters,
                            false,
                        ));
                    }
                }
                _ => {}
            }
        });

        result.exports = match dunder_all(root, src) {
            Some(names) => names.into_iter().collect(),
            None => public_top_level_names(root, src).into_iter().collect(),
        };

        Ok(result)
    }

    fn language(&self) -> Language {
        Language::Python
    }
}

/// A `def` directly inside a class body (possibly decorated)
fn is_method(node: tree_sitter::Node) -> bool {
    let mut parent = node.parent();
    if let Some(p) = parent
        && p.kind() == "decorated_definition"
    {
        parent = p.parent();
    }
    parent
        .filter(|p| p.kind() == "block")
        .and_then(|block| block.parent())
        .is_some_and(|owner| owner.kind() == "class_definition")
}

fn count_methods(body: tree_sitter::Node) -> usize {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|stmt| match stmt.kind() {
            "function_definition" => true,
            "decorated_definition" => stmt
                .child_by_field_name("definition")
                .is_some_and(|d| d.kind() == "function_definition"),
            _ => false,
        })
        .count()
}

fn parameter_name(node: tree_sitter::Node, src: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" => Some(get_node_text(node, src).to_string()),
        "default_parameter" | "typed_default_parameter" => {
            field_text(node, "name", src).map(str::to_string)
        }
        // `x: int` has no name field; the identifier is the first child
        "typed_parameter" => node
            .named_child(0)
            .map(|inner| get_node_text(inner, src).to_string()),
        _ => None,
    }
}

/// Names listed in a module-level `__all__ = [...]`
fn dunder_all(root: tree_sitter::Node, src: &[u8]) -> Option<Vec<String>> {
    let mut cursor = root.walk();
    for stmt in root.named_children(&mut cursor) {
        if stmt.kind() != "expression_statement" {
            continue;
        }
        let Some(assignment) = stmt.named_child(0).filter(|n| n.kind() == "assignment") else {
            continue;
        };
        if field_text(assignment, "left", src) != Some("__all__") {
            continue;
        }
        let list = assignment.child_by_field_name("right")?;
        let mut list_cursor = list.walk();
        let names = list
            .named_children(&mut list_cursor)
            .filter(|item| item.kind() == "string")
            .map(|item| {
                get_node_text(item, src)
                    .trim_matches(['"', '\''])
                    .to_string()
            })
            .filter(|name| !name.is_empty())
            .collect();
        return Some(names);
    }
    None
}

fn public_top_level_names(root: tree_sitter::Node, src: &[u8]) -> Vec<String> {
    let mut cursor = root.walk();
    root.named_children(&mut cursor)
        .filter_map(|stmt| {
            let definition = match stmt.kind() {
                "decorated_definition" => stmt.child_by_field_name("definition")?,
                "function_definition" | "class_definition" => stmt,
                _ => return None,
            };
            field_text(definition, "name", src)
        })
        .filter(|name| !name.starts_with('_'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
import os

class DataProcessor:
    def __init__(self, name):
        self.name = name

    @staticmethod
    def normalize(value: str, strict: bool = False):
        return value.strip() if strict else value

    async def flush(self):
        pass

def fibonacci(n):
    if n <= 1:
        return n
    return fibonacci(n - 1) + fibonacci(n - 2)

async def _fetch(url, *args, **kwargs):
    for attempt in range(3):
        try:
            return await os.fetch(url)
        except OSError:
            continue

square = lambda x: x * x
"#;

    #[test]
    fn test_functions_and_methods() {
        let result = PythonParser::new().parse(FIXTURE).unwrap();
        let names: Vec<_> = result.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["fibonacci", "_fetch", "square"]);
        assert_eq!(result.functions[0].parameters, vec!["n"]);
        assert!(result.functions[1].is_async);
        assert_eq!(result.functions[2].parameters, vec!["x"]);

        assert_eq!(result.classes.len(), 1);
        assert_eq!(result.classes[0].name, "DataProcessor");
        assert_eq!(result.classes[0].method_count, 3);
    }

    #[test]
    fn test_branches() {
        let result = PythonParser::new().parse(FIXTURE).unwrap();
        // if, conditional expression, for, except
        assert_eq!(result.branch_count, 4);
    }

    #[test]
    fn test_public_names_exported_without_dunder_all() {
        let result = PythonParser::new().parse(FIXTURE).unwrap();
        let exports: Vec<_> = result.exports.iter().map(String::as_str).collect();
        assert_eq!(exports, vec!["DataProcessor", "fibonacci"]);
    }

    #[test]
    fn test_dunder_all_wins() {
        let result = PythonParser::new()
            .parse("__all__ = ['run', \"Config\"]\n\ndef run():\n    pass\n\ndef helper():\n    pass\n")
            .unwrap();
        let exports: Vec<_> = result.exports.iter().map(String::as_str).collect();
        assert_eq!(exports, vec!["Config", "run"]);
    }
}
