//! Score Command
//!
//! Score existing documentation against the rubric without calling a
//! provider.
//!
//! Usage:
//!   codescribe score README.md --source src/index.js --doc-type README

use std::path::Path;

use crate::analyzer::CodeAnalyzer;
use crate::cli::ui::Output;
use crate::cli::util::{ProviderOverrides, load_config, read_text, resolve_language};
use crate::scoring::QualityScorer;
use crate::types::{DocType, Result};

pub fn run(
    doc: &Path,
    source: &Path,
    doc_type: DocType,
    language: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = load_config(&ProviderOverrides::default())?;
    let scorer = QualityScorer::with_weights(config.scoring.weight_overrides()?);

    let documentation = read_text(doc)?;
    let code = read_text(source)?;
    let analysis = CodeAnalyzer::new().analyze(&code, &resolve_language(language, source));
    let score = scorer.score(&documentation, &analysis, doc_type);

    if json {
        println!("{}", serde_json::to_string_pretty(&score)?);
        return Ok(());
    }

    let out = Output::new();
    out.header(&format!("{} ({})", doc.display(), doc_type));
    out.score(&score);
    Ok(())
}
