use console::style;

use crate::ai::ProviderMetadata;
use crate::types::{CodeAnalysis, CriterionStatus, Grade, ParseMode, QualityScore};

/// Styled terminal output. Status lines go to stderr so generated
/// documentation on stdout stays pipeable.
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        eprintln!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        eprintln!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        eprintln!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        eprintln!("\n{}", style(message).bold());
        eprintln!("{}", "─".repeat(40));
    }

    pub fn score(&self, score: &QualityScore) {
        let grade = match score.grade {
            Grade::A | Grade::B => style(score.grade.to_string()).green().bold(),
            Grade::C => style(score.grade.to_string()).yellow().bold(),
            Grade::D | Grade::F => style(score.grade.to_string()).red().bold(),
        };
        self.section("Quality");
        eprintln!("  Score: {}/100  Grade: {}", score.score, grade);
        eprintln!();

        for (criterion, entry) in &score.breakdown {
            let marker = match entry.status {
                CriterionStatus::Complete => style("●").green(),
                CriterionStatus::Partial => style("◐").yellow(),
                CriterionStatus::Missing => style("○").red(),
            };
            eprintln!(
                "  {} {:<14} {:>3}/{:<3}",
                marker,
                criterion.as_str(),
                entry.points_earned,
                entry.points_max
            );
        }

        if !score.summary.improvements.is_empty() {
            eprintln!();
            eprintln!("  {} {}", style("Next:").bold(), score.summary.top_suggestion);
        }
    }

    pub fn metadata(&self, metadata: &ProviderMetadata) {
        let cached = if metadata.was_cached { ", cached" } else { "" };
        eprintln!(
            "  {} {} · {} in / {} out tokens{} · {}ms · {} attempt(s)",
            style(&metadata.provider).dim(),
            style(&metadata.model).dim(),
            metadata.input_tokens,
            metadata.output_tokens,
            cached,
            metadata.latency_ms,
            metadata.attempts
        );
    }

    pub fn analysis(&self, analysis: &CodeAnalysis) {
        self.section("Analysis");
        match &analysis.parse_mode {
            ParseMode::Structural {
                language,
                branch_count,
            } => {
                eprintln!("  Mode:       structural ({}, {} branches)", language, branch_count);
            }
            ParseMode::Fallback {
                line_count,
                import_count,
                max_brace_depth,
                ..
            } => {
                eprintln!(
                    "  Mode:       {} ({} lines, {} imports, brace depth {})",
                    style("fallback").yellow(),
                    line_count,
                    import_count,
                    max_brace_depth
                );
            }
        }
        eprintln!("  Complexity: {}", analysis.complexity);

        if !analysis.functions.is_empty() {
            eprintln!("  Functions:");
            for function in &analysis.functions {
                let prefix = if function.is_async { "async " } else { "" };
                eprintln!(
                    "    {}{}({})",
                    prefix,
                    function.name,
                    function.parameters.join(", ")
                );
            }
        }
        if !analysis.classes.is_empty() {
            eprintln!("  Classes:");
            for class in &analysis.classes {
                eprintln!("    {} ({} methods)", class.name, class.method_count);
            }
        }
        if !analysis.exports.is_empty() {
            let exports: Vec<&str> = analysis.exports.iter().map(String::as_str).collect();
            eprintln!("  Exports:    {}", exports.join(", "));
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
