use std::collections::HashMap;

use super::{
    Extraction, Language, Parser, collect_parameters, field_text, get_node_text, has_child_kind,
    parse_tree, walk_tree,
};
use crate::types::{ClassInfo, FunctionInfo, Result};

const BRANCH_KINDS: &[&str] = &[
    "if_expression",
    "match_arm",
    "while_expression",
    "loop_expression",
    "for_expression",
];

const TYPE_ITEM_KINDS: &[&str] = &["struct_item", "enum_item", "trait_item", "union_item"];

const EXPORTABLE_KINDS: &[&str] = &[
    "function_item",
    "struct_item",
    "enum_item",
    "trait_item",
    "union_item",
    "type_item",
    "const_item",
    "static_item",
    "mod_item",
    "macro_definition",
];

pub struct RustParser;

impl RustParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for RustParser {
    fn parse(&self, content: &str) -> Result<Extraction> {
        let tree = parse_tree(tree_sitter_rust::LANGUAGE, "rust", content)?;
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

            if EXPORTABLE_KINDS.contains(&kind)
                && is_module_level(node)
                && has_pub_visibility(node, src)
                && let Some(name) = field_text(node, "name", src)
            {
                result.exports.insert(name.to_string());
            }

            match kind {
                "function_item" if !is_associated(node) => {
                    if let Some(name) = field_text(node, "name", src) {
                        result.functions.push(function_info(name, node, src));
                    }
                }
                "impl_item" => {
                    if let Some(ty) = field_text(node, "type", src) {
                        let count = node
                            .child_by_field_name("body")
                            .map(|body| count_children(body, &["function_item"]))
                            .unwrap_or(0);
                        *methods_by_type.entry(base_type_name(ty)).or_default() += count;
                    }
                }
                k if TYPE_ITEM_KINDS.contains(&k) => {
                    if let Some(name) = field_text(node, "name", src) {
                        if k == "trait_item" {
                            let count = node
                                .child_by_field_name("body")
                                .map(|body| {
                                    count_children(body, &["function_item", "function_signature_item"])
                                })
                                .unwrap_or(0);
                            *methods_by_type.entry(name.to_string()).or_default() += count;
                        }
                        type_names.push(name.to_string());
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
        Language::Rust
    }
}

fn function_info(name: &str, node: tree_sitter::Node, src: &[u8]) -> FunctionInfo {
    let parameters = collect_parameters(node.child_by_field_name("parameters"), src, parameter_name);
    let mut cursor = node.walk();
    let is_async = node
        .children(&mut cursor)
        .any(|child| child.kind() == "function_modifiers" && has_child_kind(child, "async"));
    FunctionInfo::new(name, parameters, is_async)
}

fn parameter_name(node: tree_sitter::Node, src: &[u8]) -> Option<String> {
    match node.kind() {
        "parameter" => field_text(node, "pattern", src).map(str::to_string),
        "self_parameter" => Some("self".to_string()),
        "attribute_item" | "line_comment" | "block_comment" => Some(String::new()),
        _ => None,
    }
}

/// Functions inside `impl` / `trait` bodies are counted as methods
fn is_associated(node: tree_sitter::Node) -> bool {
    node.parent()
        .filter(|p| p.kind() == "declaration_list")
        .and_then(|list| list.parent())
        .is_some_and(|owner| matches!(owner.kind(), "impl_item" | "trait_item"))
}

fn is_module_level(node: tree_sitter::Node) -> bool {
    match node.parent() {
        Some(p) if p.kind() == "source_file" => true,
        Some(p) if p.kind() == "declaration_list" => p
            .parent()
            .is_some_and(|owner| owner.kind() == "mod_item"),
        _ => false,
    }
}

fn has_pub_visibility(node: tree_sitter::Node, src: &[u8]) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|child| {
        child.kind() == "visibility_modifier" && get_node_text(child, src).starts_with("pub")
    })
}

fn count_children(body: tree_sitter::Node, kinds: &[&str]) -> usize {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|child| kinds.contains(&child.kind()))
        .count()
}

/// `Cache<K, V>` -> `Cache`, `crate::a::Cache` -> `Cache`
fn base_type_name(ty: &str) -> String {
    let without_generics = ty.split('<').next().unwrap_or(ty);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .trim()
        .to_string()
}
