//! JavaScript / TypeScript structural parser.
//!
//! JavaScript and JSX are parsed with the TSX grammar, which accepts plain
//! JavaScript as well as JSX and type annotations.

use super::{
    Extraction, Language, Parser, collect_parameters, execute_query, field_text, get_node_text,
    has_child_kind, parse_tree, walk_tree,
};
use crate::types::{ClassInfo, FunctionInfo, Result};

const BRANCH_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
    "switch_case",
    "catch_clause",
    "ternary_expression",
];

const FUNCTION_VALUE_KINDS: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

const EXPORT_QUERY: &str = r#"
    (export_statement
        declaration: [
            (function_declaration name: (identifier) @name)
            (generator_function_declaration name: (identifier) @name)
            (class_declaration name: (type_identifier) @name)
            (abstract_class_declaration name: (type_identifier) @name)
            (lexical_declaration (variable_declarator name: (identifier) @name))
            (variable_declaration (variable_declarator name: (identifier) @name))
            (interface_declaration name: (type_identifier) @name)
            (type_alias_declaration name: (type_identifier) @name)
            (enum_declaration name: (identifier) @name)
        ]
    )
    (export_statement
        (export_clause (export_specifier name: (_) @name !alias)))
    (export_statement
        (export_clause (export_specifier alias: (_) @name)))
"#;

pub struct TypeScriptParser {
    language: Language,
}

impl TypeScriptParser {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    fn grammar(&self) -> tree_sitter::Language {
        match self.language {
            Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            _ => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

impl Parser for TypeScriptParser {
    fn parse(&self, content: &str) -> Result<Extraction> {
        let grammar = self.grammar();
        let tree = parse_tree(grammar.clone(), self.language.as_str(), content)?;
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
                "function_declaration" | "generator_function_declaration" => {
                    if let Some(name) = field_text(node, "name", src) {
                        result.functions.push(function_info(name, node, src));
                    }
                }
                "variable_declarator" => {
                    if let Some(value) = node.child_by_field_name("value")
                        && FUNCTION_VALUE_KINDS.contains(&value.kind())
                        && let Some(name) = field_text(node, "name", src)
                    {
                        result.functions.push(function_info(name, value, src));
                    }
                }
                "assignment_expression" => {
                    extract_commonjs(node, src, &mut result);
                }
                "class_declaration" | "abstract_class_declaration" | "class" if node.is_named() => {
                    if let Some(name) = class_name(node, src) {
                        let methods = node
                            .child_by_field_name("body")
                            .map(count_methods)
                            .unwrap_or(0);
                        result.classes.push(ClassInfo::new(name, methods));
                    }
                }
                "export_statement" if has_child_kind(node, "default") => {
                    result.exports.insert("default".to_string());
                }
                _ => {}
            }
        });

        execute_query(&grammar, EXPORT_QUERY, root, src, |_, name| {
            if !name.is_empty() {
                result.exports.insert(name.to_string());
            }
        });

        Ok(result)
    }

    fn language(&self) -> Language {
        self.language
    }
}

fn function_info(name: &str, node: tree_sitter::Node, src: &[u8]) -> FunctionInfo {
    let is_async = has_child_kind(node, "async");
    // `x => x` has a single `parameter` field instead of a list
    let parameters = match node.child_by_field_name("parameters") {
        Some(list) => collect_parameters(Some(list), src, parameter_name),
        None => node
            .child_by_field_name("parameter")
            .map(|p| vec![get_node_text(p, src).to_string()])
            .unwrap_or_default(),
    };
    FunctionInfo::new(name, parameters, is_async)
}

fn parameter_name(node: tree_sitter::Node, src: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" => Some(get_node_text(node, src).to_string()),
        "required_parameter" | "optional_parameter" => node
            .child_by_field_name("pattern")
            .and_then(|pattern| parameter_name(pattern, src)),
        "assignment_pattern" => node
            .child_by_field_name("left")
            .and_then(|left| parameter_name(left, src)),
        "rest_pattern" => node
            .named_child(0)
            .map(|inner| format!("...{}", get_node_text(inner, src))),
        _ => None,
    }
}

/// Class declarations name the class directly; class expressions take the
/// name of the variable they are assigned to.
fn class_name(node: tree_sitter::Node, src: &[u8]) -> Option<String> {
    if let Some(name) = field_text(node, "name", src) {
        return Some(name.to_string());
    }
    let parent = node.parent()?;
    (parent.kind() == "variable_declarator")
        .then(|| field_text(parent, "name", src))
        .flatten()
        .map(str::to_string)
}

fn count_methods(body: tree_sitter::Node) -> usize {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|member| match member.kind() {
            "method_definition" | "abstract_method_signature" => true,
            "public_field_definition" | "field_definition" => member
                .child_by_field_name("value")
                .is_some_and(|v| FUNCTION_VALUE_KINDS.contains(&v.kind())),
            _ => false,
        })
        .count()
}

/// `module.exports = {...}`, `module.exports.x = ...`, `exports.x = ...`
fn extract_commonjs(node: tree_sitter::Node, src: &[u8], result: &mut Extraction) {
    let Some(left) = node.child_by_field_name("left") else {
        return;
    };
    if left.kind() != "member_expression" {
        return;
    }
    let target = get_node_text(left, src);
    let right = node.child_by_field_name("right");

    if target == "module.exports" {
        let Some(right) = right else { return };
        match right.kind() {
            "object" => {
                let mut cursor = right.walk();
                for member in right.named_children(&mut cursor) {
                    let key = match member.kind() {
                        "shorthand_property_identifier" => Some(get_node_text(member, src)),
                        "pair" | "method_definition" => member
                            .child_by_field_name("key")
                            .or_else(|| member.child_by_field_name("name"))
                            .map(|k| get_node_text(k, src)),
                        _ => None,
                    };
                    if let Some(key) = key.filter(|k| !k.is_empty()) {
                        result.exports.insert(key.trim_matches(['"', '\'']).to_string());
                    }
                }
            }
            "identifier" => {
                result.exports.insert(get_node_text(right, src).to_string());
            }
            _ => {
                result.exports.insert("default".to_string());
            }
        }
        return;
    }

    let is_named_export = target.starts_with("exports.") || target.starts_with("module.exports.");
    if !is_named_export {
        return;
    }
    let Some(property) = field_text(left, "property", src) else {
        return;
    };
    result.exports.insert(property.to_string());

    if let Some(right) = right
        && FUNCTION_VALUE_KINDS.contains(&right.kind())
    {
        result.functions.push(function_info(property, right, src));
    }
}
