//! Pattern-based analysis for sources without a usable syntax tree.
//!
//! Approximates the same shape as the structural parsers from line patterns.
//! No branch counting; class method counts are not recovered.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{ClassInfo, CodeAnalysis, Complexity, FallbackReason, FunctionInfo, ParseMode};

static RE_FUNCTION_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?P<async>\basync\s+)?\bfunction\b\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)\s*\((?P<params>[^)]*)\)").unwrap()
});
static RE_ARROW_BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)\b(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*=\s*(?P<async>async\s+)?(?:\((?P<params>[^)]*)\)|(?P<single>[A-Za-z_$][\w$]*))\s*=>").unwrap()
});
static RE_PYTHON_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?P<async>async\s+)?def\s+(?P<name>\w+)\s*\((?P<params>[^)]*)\)").unwrap()
});
static RE_RUST_FN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?P<async>\basync\s+)?\bfn\s+(?P<name>\w+)\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)\)").unwrap()
});
static RE_GO_FUNC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^func\s+(?:\([^)]*\)\s*)?(?P<name>\w+)\s*\((?P<params>[^)]*)\)").unwrap()
});
static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?:pub(?:\([^)]*\))?\s+)?(?:public\s+|abstract\s+|final\s+)*(?:class|struct|interface|trait)\s+(?P<name>[A-Za-z_]\w*)").unwrap()
});
static RE_ES_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*export\s+(?:default\s+)?(?:async\s+)?(?:function\s*\*?|class|const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)").unwrap()
});
static RE_COMMONJS_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)\b(?:module\.)?exports\.(?P<name>[A-Za-z_$][\w$]*)\s*=").unwrap()
});
static RE_PUB_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^pub\s+(?:async\s+)?(?:fn|struct|enum|trait|const|static|type|mod)\s+(?P<name>\w+)").unwrap()
});
static RE_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:import\b|from\s+[\w.]+\s+import\b|use\s+[\w:{]|#include\b|using\s+[\w.]+\s*;|require\b)|\brequire\s*\(").unwrap()
});

/// Run the pattern heuristics. Never fails.
pub fn analyze(source: &str, reason: FallbackReason) -> CodeAnalysis {
    let functions = extract_functions(source);
    let classes = extract_classes(source);
    let exports = extract_exports(source);
    let complexity = Complexity::from_function_count(functions.len());

    CodeAnalysis {
        functions,
        classes,
        exports,
        complexity,
        parse_mode: ParseMode::Fallback {
            reason,
            line_count: source.lines().count(),
            import_count: RE_IMPORT.find_iter(source).count(),
            max_brace_depth: max_brace_depth(source),
        },
    }
}

fn extract_functions(source: &str) -> Vec<FunctionInfo> {
    let patterns: [&Regex; 5] = [
        &RE_FUNCTION_KEYWORD,
        &RE_ARROW_BINDING,
        &RE_PYTHON_DEF,
        &RE_RUST_FN,
        &RE_GO_FUNC,
    ];

    // (offset, info) so results keep source order across patterns
    let mut found: Vec<(usize, FunctionInfo)> = Vec::new();
    for re in patterns {
        for caps in re.captures_iter(source) {
            let Some(name) = caps.name("name") else {
                continue;
            };
            let parameters = match (caps.name("params"), caps.name("single")) {
                (Some(list), _) => split_parameters(list.as_str()),
                (None, Some(single)) => vec![single.as_str().to_string()],
                (None, None) => Vec::new(),
            };
            let is_async = caps.name("async").is_some();
            found.push((name.start(), FunctionInfo::new(name.as_str(), parameters, is_async)));
        }
    }
    found.sort_by_key(|(offset, _)| *offset);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .map(|(_, info)| info)
        .filter(|info| seen.insert(info.name.clone()))
        .collect()
}

/// Parameter names with annotations, defaults and receivers stripped.
fn split_parameters(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|param| {
            let head = param.split([':', '=']).next().unwrap_or(param).trim();
            let name = head
                .split_whitespace()
                .find(|token| *token != "mut")
                .unwrap_or("")
                .trim_start_matches(['&', '*', '.']);
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

fn extract_classes(source: &str) -> Vec<ClassInfo> {
    let mut seen = HashSet::new();
    RE_CLASS
        .captures_iter(source)
        .filter_map(|caps| caps.name("name").map(|m| m.as_str().to_string()))
        .filter(|name| seen.insert(name.clone()))
        .map(|name| ClassInfo::new(name, 0))
        .collect()
}

fn extract_exports(source: &str) -> BTreeSet<String> {
    [&RE_ES_EXPORT, &RE_COMMONJS_EXPORT, &RE_PUB_ITEM]
        .into_iter()
        .flat_map(|re| re.captures_iter(source))
        .filter_map(|caps| caps.name("name").map(|m| m.as_str().to_string()))
        .collect()
}

/// Deepest `{` nesting; unmatched closers never drive the depth negative.
fn max_brace_depth(source: &str) -> usize {
    let mut depth = 0usize;
    let mut max_depth = 0usize;
    for c in source.chars() {
        match c {
            '{' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max_depth
}
