use std::collections::HashMap;

use super::{Extraction, Language, Parser, field_text, get_node_text, parse_tree, walk_tree};
use crate::types::{ClassInfo, FunctionInfo, Result};

const BRANCH_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    "expression_case",
    "type_case",
    "communication_case",
];

pub struct GoParser;

impl GoParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GoParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for GoParser {
    fn parse(&self, content: &str) -> Result<Extraction> {
        let tree = parse_tree(tree_sitter_go::LANGUAGE, "go", content)?;
        let root = tree.root_node();
        let src = content.as_bytes();

        let mut result = Extraction::new();
        let mut type_names: Vec<String> = Vec::new();
        let mut methods_by_type: HashMap<String, usize> = HashMap::new();

        walk_tree(root, |node| {
            let kind = node.kind();
            if BRANCH_KINDS.contains(&kind) {
                result.branch_count += 1;
                return;
            }
            match kind {
                "function_declaration" => {
                    if let Some(name) = field_text(node, "name", src) {
                        let parameters = parameter_names(node.child_by_field_name("parameters"), src);
                        result.functions.push(FunctionInfo::new(name, parameters, false));
                        export_if_capitalized(name, &mut result);
                    }
                }
                "method_declaration" => {
                    if let Some(receiver) = receiver_type(node, src) {
                        *methods_by_type.entry(receiver).or_default() += 1;
                    }
                }
                "type_spec" => {
                    if let Some(name) = field_text(node, "name", src) {
                        let is_class_like = node
                            .child_by_field_name("type")
                            .is_some_and(|t| matches!(t.kind(), "struct_type" | "interface_type"));
                        if is_class_like {
                            type_names.push(name.to_string());
                        }
                        if is_top_level_spec(node) {
                            export_if_capitalized(name, &mut result);
                        }
                    }
                }
                "const_spec" | "var_spec" if is_top_level_spec(node) => {
                    let mut cursor = node.walk();
                    for name in node.children_by_field_name("name", &mut cursor) {
                        export_if_capitalized(get_node_text(name, src), &mut result);
                    }
                }
                "interface_type" => {
                    // Interface method specs count towards the owning type
                    if let Some(spec) = node.parent().filter(|p| p.kind() == "type_spec")
                        && let Some(name) = field_text(spec, "name", src)
                    {
                        let mut cursor = node.walk();
                        let count = node
                            .named_children(&mut cursor)
                            .filter(|c| matches!(c.kind(), "method_elem" | "method_spec"))
                            .count();
                        *methods_by_type.entry(name.to_string()).or_default() += count;
                    }
                }
                _ => {}
            }
        });

        result.classes = type_names
            .into_iter()
            .map(|name| {
                let methods = methods_by_type.get(&name).copied().unwrap_or(0);
                ClassInfo::new(name, methods)
            })
            .collect();

        Ok(result)
    }

    fn language(&self) -> Language {
        Language::Go
    }
}

fn export_if_capitalized(name: &str, result: &mut Extraction) {
    if name.chars().next().is_some_and(char::is_uppercase) {
        result.exports.insert(name.to_string());
    }
}

/// Specs declared at package level (not inside a function body)
fn is_top_level_spec(node: tree_sitter::Node) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "source_file" => return true,
            "block" | "function_declaration" | "method_declaration" | "func_literal" => return false,
            _ => current = parent.parent(),
        }
    }
    false
}

/// `a, b int` declares two parameters in one declaration
fn parameter_names(list: Option<tree_sitter::Node>, src: &[u8]) -> Vec<String> {
    let Some(list) = list else {
        return Vec::new();
    };
    let mut names = Vec::new();
    let mut cursor = list.walk();
    for decl in list.named_children(&mut cursor) {
        if !matches!(
            decl.kind(),
            "parameter_declaration" | "variadic_parameter_declaration"
        ) {
            continue;
        }
        let mut name_cursor = decl.walk();
        let declared: Vec<String> = decl
            .children_by_field_name("name", &mut name_cursor)
            .map(|n| get_node_text(n, src).to_string())
            .collect();
        if declared.is_empty() {
            // Unnamed parameter, keep its type
            if let Some(ty) = field_text(decl, "type", src) {
                names.push(ty.to_string());
            }
        } else {
            names.extend(declared);
        }
    }
    names
}

/// `func (s *Server) Run()` -> `Server`
fn receiver_type(node: tree_sitter::Node, src: &[u8]) -> Option<String> {
    let receiver = node.child_by_field_name("receiver")?;
    let mut cursor = receiver.walk();
    let decl = receiver
        .named_children(&mut cursor)
        .find(|c| c.kind() == "parameter_declaration")?;
    let ty = field_text(decl, "type", src)?;
    let name = ty.trim_start_matches('*');
    let name = name.split('[').next().unwrap_or(name).trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"package server

const Version = "1.0"

var defaultPort = 8080

type Server struct {
	addr string
}

type Handler interface {
	Serve(req string) error
}

func NewServer(addr string, port, retries int) *Server {
	if port == 0 {
		port = defaultPort
	}
	return &Server{addr: addr}
}

func (s *Server) Run() error {
	for i := 0; i < 3; i++ {
		switch i {
		case 0:
			continue
		default:
			return nil
		}
	}
	return nil
}

func (s Server) stop() {}

func helper(...string) {}
"#;

    #[test]
    fn test_functions_and_parameters() {
        let result = GoParser::new().parse(SOURCE).unwrap();
        let names: Vec<_> = result.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["NewServer", "helper"]);
        assert_eq!(result.functions[0].parameters, vec!["addr", "port", "retries"]);
    }

    #[test]
    fn test_types_with_receivers() {
        let result = GoParser::new().parse(SOURCE).unwrap();
        let classes: Vec<_> = result
            .classes
            .iter()
            .map(|c| (c.name.as_str(), c.method_count))
            .collect();
        assert_eq!(classes, vec![("Server", 2), ("Handler", 1)]);
    }

    #[test]
    fn test_capitalized_exports() {
        let result = GoParser::new().parse(SOURCE).unwrap();
        let exports: Vec<_> = result.exports.iter().map(String::as_str).collect();
        assert_eq!(exports, vec!["Handler", "NewServer", "Server", "Version"]);
    }

    #[test]
    fn test_branches() {
        let result = GoParser::new().parse(SOURCE).unwrap();
        // if, for, one expression case (default_case is not counted)
        assert_eq!(result.branch_count, 3);
    }
}
