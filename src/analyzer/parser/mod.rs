//! Language Parser Module
//!
//! Tree-sitter based structural parsers. Each parser walks the syntax tree
//! once and reports functions, classes, exports and branch counts.
//!
//! ```rust,ignore
//! use codescribe::analyzer::parser::{Language, create_parser};
//!
//! let parser = create_parser(Language::Rust).expect("rust has a parser");
//! let extraction = parser.parse(content)?;
//! ```

pub mod go;
pub mod language;
pub mod python;
pub mod rust_lang;
pub mod traits;
pub mod typescript;

pub use go::GoParser;
pub use language::Language;
pub use python::PythonParser;
pub use rust_lang::RustParser;
pub use traits::{
    Extraction, Parser, collect_parameters, create_ts_parser, execute_query, field_text,
    get_node_text, has_child_kind, parse_tree, walk_tree,
};
pub use typescript::TypeScriptParser;

/// Create the structural parser for `language`, if one exists.
pub fn create_parser(language: Language) -> Option<Box<dyn Parser>> {
    match language {
        Language::JavaScript | Language::Jsx | Language::TypeScript | Language::Tsx => {
            Some(Box::new(TypeScriptParser::new(language)))
        }
        Language::Python => Some(Box::new(PythonParser::new())),
        Language::Rust => Some(Box::new(RustParser::new())),
        Language::Go => Some(Box::new(GoParser::new())),
        _ => None,
    }
}
