//! Section-based prompt assembly.
//!
//! Every strategy renders its instructions through `SectionWriter` so all
//! doc types share one layout: role, objectives, required output shape,
//! rules, anti-patterns.

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Numbered objectives
    Objectives(Vec<String>),
    /// Ordered key-value facts
    Context(Vec<(String, String)>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Bulleted list under a header
    List { header: String, items: Vec<String> },
    /// Hard rules the output must follow
    Rules(Vec<String>),
    /// Anti-patterns with good/bad examples
    AntiPatterns { bad: Vec<String>, good: Vec<String> },
}

/// Builder for consistent prompt text
#[derive(Debug, Clone, Default)]
pub struct SectionWriter {
    sections: Vec<PromptSection>,
}

impl SectionWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    pub fn objectives(mut self, objectives: &[&str]) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.iter().map(|o| o.to_string()).collect(),
        ));
        self
    }

    /// Add a context fact, appending to the existing context section
    pub fn context_item(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        for section in &mut self.sections {
            if let PromptSection::Context(items) = section {
                items.push((key.to_string(), value));
                return self;
            }
        }
        self.sections
            .push(PromptSection::Context(vec![(key.to_string(), value)]));
        self
    }

    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    pub fn section(mut self, header: &str, content: impl Into<String>) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.into(),
        });
        self
    }

    pub fn list(mut self, header: &str, items: &[&str]) -> Self {
        self.sections.push(PromptSection::List {
            header: header.to_string(),
            items: items.iter().map(|i| i.to_string()).collect(),
        });
        self
    }

    pub fn rules(mut self, rules: &[&str]) -> Self {
        self.sections.push(PromptSection::Rules(
            rules.iter().map(|r| r.to_string()).collect(),
        ));
        self
    }

    pub fn anti_patterns(mut self, bad: &[&str], good: &[&str]) -> Self {
        self.sections.push(PromptSection::AntiPatterns {
            bad: bad.iter().map(|b| b.to_string()).collect(),
            good: good.iter().map(|g| g.to_string()).collect(),
        });
        self
    }

    /// Render all sections in insertion order
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Context(items) => {
                    prompt.push_str("# Context\n\n");
                    for (key, value) in items {
                        prompt.push_str(&format!("**{}**: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::List { header, items } => {
                    prompt.push_str(&format!("# {}\n\n", header));
                    for item in items {
                        prompt.push_str(&format!("- {}\n", item));
                    }
                    prompt.push('\n');
                }
                PromptSection::Rules(rules) => {
                    prompt.push_str("<RULES>\n");
                    for rule in rules {
                        prompt.push_str(&format!("- {}\n", rule));
                    }
                    prompt.push_str("</RULES>\n\n");
                }
                PromptSection::AntiPatterns { bad, good } => {
                    prompt.push_str("## ANTI-PATTERNS\n\n");
                    prompt.push_str("<what_not_to_do>\n");
                    for example in bad {
                        prompt.push_str(&format!("WRONG: {}\n", example));
                    }
                    prompt.push_str("</what_not_to_do>\n\n");
                    prompt.push_str("<what_to_do>\n");
                    for example in good {
                        prompt.push_str(&format!("CORRECT: {}\n", example));
                    }
                    prompt.push_str("</what_to_do>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_and_objectives() {
        let prompt = SectionWriter::new()
            .role("technical writer", "README files")
            .objectives(&["Explain purpose", "Show usage"])
            .build();

        assert!(prompt.contains("<ROLE>"));
        assert!(prompt.contains("technical writer"));
        assert!(prompt.contains("1. Explain purpose"));
        assert!(prompt.contains("2. Show usage"));
    }

    #[test]
    fn test_context_items_keep_order() {
        let prompt = SectionWriter::new()
            .context_item("Language", "javascript")
            .context_item("Functions", "add")
            .build();

        let language = prompt.find("**Language**: javascript").unwrap();
        let functions = prompt.find("**Functions**: add").unwrap();
        assert!(language < functions);
        assert_eq!(prompt.matches("# Context").count(), 1);
    }

    #[test]
    fn test_rules_and_anti_patterns() {
        let prompt = SectionWriter::new()
            .rules(&["Output markdown only"])
            .anti_patterns(&["Restating the code"], &["Explaining intent"])
            .build();

        assert!(prompt.contains("<RULES>\n- Output markdown only"));
        assert!(prompt.contains("WRONG: Restating the code"));
        assert!(prompt.contains("CORRECT: Explaining intent"));
    }
}
