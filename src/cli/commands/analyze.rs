//! Analyze Command
//!
//! Print the structural summary the generator would send to the model.

use std::path::Path;

use crate::analyzer::CodeAnalyzer;
use crate::cli::ui::Output;
use crate::cli::util::{read_text, resolve_language};
use crate::types::Result;

pub fn run(file: &Path, language: Option<&str>, json: bool) -> Result<()> {
    let source = read_text(file)?;
    let language = resolve_language(language, file);
    let analysis = CodeAnalyzer::new().analyze(&source, &language);

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    let out = Output::new();
    out.header(&format!("{}", file.display()));
    out.info(&analysis.summary_line());
    out.analysis(&analysis);
    Ok(())
}
