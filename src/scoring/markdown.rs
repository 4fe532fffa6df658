//! Minimal markdown structure extraction for scoring.
//!
//! Line-oriented: ATX headings, fenced code blocks, and prose lines outside
//! fences. Anything more elaborate is irrelevant to the rubric.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub body: String,
}

/// One line of the document, tagged by what it is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Heading { level: usize, text: &'a str },
    Fence,
    Code(&'a str),
    Prose(&'a str),
    Blank,
}

/// Parsed view of a markdown document
#[derive(Debug, Clone)]
pub struct MarkdownDoc<'a> {
    pub lines: Vec<LineKind<'a>>,
}

impl<'a> MarkdownDoc<'a> {
    pub fn parse(text: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut open_fence: Option<&'a str> = None;

        for raw in text.lines() {
            let trimmed = raw.trim_start();
            let marker = fence_marker(trimmed);

            if let Some(fence) = open_fence {
                if marker == Some(fence) && trimmed.trim_start_matches(fence).trim().is_empty() {
                    open_fence = None;
                    lines.push(LineKind::Fence);
                } else {
                    lines.push(LineKind::Code(raw));
                }
                continue;
            }

            if let Some(fence) = marker {
                open_fence = Some(fence);
                lines.push(LineKind::Fence);
            } else if let Some((level, heading)) = parse_heading(trimmed) {
                lines.push(LineKind::Heading {
                    level,
                    text: heading,
                });
            } else if trimmed.is_empty() {
                lines.push(LineKind::Blank);
            } else {
                lines.push(LineKind::Prose(raw));
            }
        }

        Self { lines }
    }

    pub fn headings(&self) -> Vec<Heading> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(line, kind)| match kind {
                LineKind::Heading { level, text } => Some(Heading {
                    level: *level,
                    text: text.to_string(),
                    line,
                }),
                _ => None,
            })
            .collect()
    }

    /// Fenced blocks; an unterminated fence still counts as one block
    pub fn code_blocks(&self) -> Vec<CodeBlock> {
        let mut blocks = Vec::new();
        let mut current: Option<Vec<&str>> = None;

        for kind in &self.lines {
            match (kind, current.as_mut()) {
                (LineKind::Fence, None) => current = Some(Vec::new()),
                (LineKind::Fence, Some(body)) => {
                    blocks.push(CodeBlock {
                        body: body.join("\n"),
                    });
                    current = None;
                }
                (LineKind::Code(line), Some(body)) => body.push(*line),
                _ => {}
            }
        }
        if let Some(body) = current {
            blocks.push(CodeBlock {
                body: body.join("\n"),
            });
        }
        blocks
    }

    /// Prose words of the introduction: the section under a leading `#`
    /// title, otherwise whatever precedes the first heading.
    pub fn intro_word_count(&self) -> usize {
        let start = match self
            .lines
            .iter()
            .position(|k| matches!(k, LineKind::Heading { .. }))
        {
            Some(i) if matches!(self.lines[i], LineKind::Heading { level: 1, .. }) => i + 1,
            _ => 0,
        };
        self.lines[start..]
            .iter()
            .take_while(|k| !matches!(k, LineKind::Heading { .. }))
            .map(|k| match k {
                LineKind::Prose(text) => word_count(text),
                _ => 0,
            })
            .sum()
    }

    /// Prose words in the section that starts at heading line `heading_line`
    pub fn section_word_count(&self, heading_line: usize) -> usize {
        self.lines
            .iter()
            .skip(heading_line + 1)
            .take_while(|k| !matches!(k, LineKind::Heading { .. }))
            .map(|k| match k {
                LineKind::Prose(text) => word_count(text),
                _ => 0,
            })
            .sum()
    }

    /// Text of every non-code line (headings and prose)
    pub fn text_lines(&self) -> impl Iterator<Item = (usize, &'a str)> + '_ {
        self.lines.iter().enumerate().filter_map(|(i, k)| match k {
            LineKind::Heading { text, .. } => Some((i, *text)),
            LineKind::Prose(text) => Some((i, *text)),
            _ => None,
        })
    }

    pub fn prose_text(&self) -> String {
        self.lines
            .iter()
            .filter_map(|k| match k {
                LineKind::Prose(text) => Some(*text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn fence_marker(trimmed: &str) -> Option<&'static str> {
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

/// `## Title ##` -> (2, "Title"); requires a space after the hashes
fn parse_heading(trimmed: &str) -> Option<(usize, &str)> {
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim();
    Some((level, text))
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

/// Whole-identifier match (`add` does not match `address`)
pub fn contains_identifier(haystack: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let is_ident = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
    let mut search_from = 0;
    while let Some(found) = haystack[search_from..].find(name) {
        let start = search_from + found;
        let end = start + name.len();
        let before_ok = haystack[..start].chars().next_back().is_none_or(|c| !is_ident(c));
        let after_ok = haystack[end..].chars().next().is_none_or(|c| !is_ident(c));
        if before_ok && after_ok {
            return true;
        }
        search_from = end;
        if search_from >= haystack.len() {
            break;
        }
    }
    false
}
