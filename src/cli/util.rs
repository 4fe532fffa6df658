//! CLI Common Utilities
//!
//! Shared input handling and configuration overrides for CLI commands.

use std::fs;
use std::path::Path;

use crate::analyzer::parser::Language;
use crate::config::{Config, ConfigLoader, ProviderKind};
use crate::types::{DocError, Result};

/// Provider settings given on the command line; highest priority layer
#[derive(Debug, Clone, Default)]
pub struct ProviderOverrides {
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
}

impl ProviderOverrides {
    /// Apply onto a loaded config. A provider switch without a model resets
    /// the model to the new provider's default.
    pub fn apply(&self, config: &mut Config) {
        if let Some(provider) = self.provider
            && provider != config.llm.provider
        {
            config.llm.provider = provider;
            config.llm.model = None;
            config.llm.api_base = None;
        }
        if let Some(model) = &self.model {
            config.llm.model = Some(model.clone());
        }
    }
}

/// Load layered config and apply CLI overrides
pub fn load_config(overrides: &ProviderOverrides) -> Result<Config> {
    let mut config = ConfigLoader::load()?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Read a UTF-8 source or documentation file
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => {
            DocError::Config(format!("{} is not valid UTF-8", path.display()))
        }
        _ => DocError::Io(e),
    })
}

/// Declared language, else one inferred from the file extension
pub fn resolve_language(explicit: Option<&str>, path: &Path) -> String {
    if let Some(language) = explicit.map(str::trim).filter(|l| !l.is_empty()) {
        return language.to_string();
    }
    match Language::from_path(path) {
        Language::Unknown => path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase(),
        language => language.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_resolve_language() {
        assert_eq!(resolve_language(Some("python"), Path::new("x.js")), "python");
        assert_eq!(resolve_language(Some("  "), Path::new("src/app.tsx")), "tsx");
        assert_eq!(resolve_language(None, Path::new("main.go")), "go");
        assert_eq!(resolve_language(None, Path::new("legacy.cbl")), "cbl");
        assert_eq!(resolve_language(None, &PathBuf::from("Makefile")), "");
    }

    #[test]
    fn test_provider_switch_resets_model() {
        let mut config = Config::default();
        config.llm.model = Some("claude-sonnet-4-20250514".to_string());

        ProviderOverrides {
            provider: Some(ProviderKind::Ollama),
            model: None,
        }
        .apply(&mut config);
        assert_eq!(config.llm.provider, ProviderKind::Ollama);
        assert!(config.llm.model.is_none());

        ProviderOverrides {
            provider: Some(ProviderKind::Ollama),
            model: Some("llama3:8b".to_string()),
        }
        .apply(&mut config);
        assert_eq!(config.llm.model.as_deref(), Some("llama3:8b"));
    }

    #[test]
    fn test_read_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("add.js");
        fs::write(&path, "function add(a,b){return a+b}").unwrap();
        assert_eq!(read_text(&path).unwrap(), "function add(a,b){return a+b}");

        let binary = dir.path().join("blob.bin");
        fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(read_text(&binary), Err(DocError::Config(_))));

        assert!(matches!(
            read_text(&dir.path().join("missing.js")),
            Err(DocError::Io(_))
        ));
    }
}
