//! Language Table
//!
//! Maps declared language names (as supplied by callers) to a `Language`
//! variant. Only a subset of languages carries a structural parser; the rest
//! are recognised so fallback results can name them.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Language metadata entry
struct LanguageMeta {
    /// Canonical lowercase identifier (also used for code fences)
    id: &'static str,
    extensions: &'static [&'static str],
    aliases: &'static [&'static str],
    has_parser: bool,
}

macro_rules! lang_meta {
    ($id:literal, [$($ext:literal),*], [$($alias:literal),*], $parser:literal) => {
        LanguageMeta {
            id: $id,
            extensions: &[$($ext),*],
            aliases: &[$($alias),*],
            has_parser: $parser,
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
    Python,
    Rust,
    Go,

    // Recognised, no structural parser
    Java,
    Kotlin,
    C,
    Cpp,
    CSharp,
    Ruby,
    Php,
    Swift,
    Bash,

    #[default]
    Unknown,
}

impl Language {
    fn meta(&self) -> LanguageMeta {
        match self {
            Language::JavaScript => lang_meta!("javascript", ["js", "mjs", "cjs"], ["javascript", "js", "node", "ecmascript"], true),
            Language::Jsx => lang_meta!("jsx", ["jsx"], ["jsx", "react"], true),
            Language::TypeScript => lang_meta!("typescript", ["ts", "mts", "cts"], ["typescript", "ts"], true),
            Language::Tsx => lang_meta!("tsx", ["tsx"], ["tsx"], true),
            Language::Python => lang_meta!("python", ["py", "pyi", "pyw"], ["python", "py", "python3"], true),
            Language::Rust => lang_meta!("rust", ["rs"], ["rust", "rs"], true),
            Language::Go => lang_meta!("go", ["go"], ["go", "golang"], true),

            Language::Java => lang_meta!("java", ["java"], ["java"], false),
            Language::Kotlin => lang_meta!("kotlin", ["kt", "kts"], ["kotlin", "kt"], false),
            Language::C => lang_meta!("c", ["c", "h"], ["c"], false),
            Language::Cpp => lang_meta!("cpp", ["cpp", "cc", "cxx", "hpp", "hh"], ["cpp", "c++", "cxx"], false),
            Language::CSharp => lang_meta!("csharp", ["cs"], ["csharp", "c#", "cs"], false),
            Language::Ruby => lang_meta!("ruby", ["rb", "rake"], ["ruby", "rb"], false),
            Language::Php => lang_meta!("php", ["php"], ["php"], false),
            Language::Swift => lang_meta!("swift", ["swift"], ["swift"], false),
            Language::Bash => lang_meta!("bash", ["sh", "bash", "zsh"], ["bash", "sh", "shell"], false),

            Language::Unknown => lang_meta!("text", [], ["unknown", "text", "plaintext"], false),
        }
    }

    const ALL: [Language; 16] = [
        Language::JavaScript,
        Language::Jsx,
        Language::TypeScript,
        Language::Tsx,
        Language::Python,
        Language::Rust,
        Language::Go,
        Language::Java,
        Language::Kotlin,
        Language::C,
        Language::Cpp,
        Language::CSharp,
        Language::Ruby,
        Language::Php,
        Language::Swift,
        Language::Bash,
    ];

    pub fn as_str(&self) -> &'static str {
        self.meta().id
    }

    /// Resolve a caller-declared language name; unrecognised names map to `Unknown`
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }

    pub fn from_extension(ext: &str) -> Self {
        let ext_lower = ext.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.meta().extensions.contains(&ext_lower.as_str()))
            .unwrap_or_default()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or_default()
    }

    pub fn has_parser_support(&self) -> bool {
        self.meta().has_parser
    }

    /// JavaScript dialects share the TSX grammar
    pub fn is_javascript_family(&self) -> bool {
        matches!(
            self,
            Language::JavaScript | Language::Jsx | Language::TypeScript | Language::Tsx
        )
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s_lower = s.trim().to_lowercase();
        if s_lower.is_empty() {
            return Ok(Language::Unknown);
        }
        Self::ALL
            .into_iter()
            .chain(std::iter::once(Language::Unknown))
            .find(|lang| lang.meta().aliases.contains(&s_lower.as_str()))
            .ok_or(())
    }
}
