//! Per-format criterion checks.
//!
//! Each check returns the earned share of a criterion as a `Share`
//! (numerator over denominator); the scorer turns shares into points.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::markdown::{LineKind, MarkdownDoc, contains_identifier, word_count};
use super::rubric::{
    self, API_HEADINGS, INSTALLATION_HEADINGS, INSTALLATION_PHRASES, JSDOC_OVERVIEW_TAGS,
    JSDOC_TAGS, OPENAPI_OPERATION_KEYS, OPENAPI_SECTIONS, OVERVIEW_HEADINGS, USAGE_HEADINGS,
};
use crate::constants::scoring as scoring_constants;

static RE_JSDOC_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@[A-Za-z]+").unwrap());

/// Fraction of a criterion's points earned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Share {
    pub num: u32,
    pub den: u32,
}

impl Share {
    pub const NONE: Share = Share { num: 0, den: 1 };
    pub const HALF: Share = Share { num: 1, den: 2 };
    pub const FULL: Share = Share { num: 1, den: 1 };

    pub fn percent(pct: u32) -> Self {
        Share {
            num: pct.min(100),
            den: 100,
        }
    }

    pub fn ratio(num: usize, den: usize) -> Self {
        if den == 0 {
            return Share::FULL;
        }
        Share {
            num: num.min(den) as u32,
            den: den as u32,
        }
    }

    /// Floor of `max * share`; never exceeds `max`
    pub fn points(&self, max: u32) -> u32 {
        if self.den == 0 {
            return max;
        }
        ((max as u64 * self.num as u64) / self.den as u64).min(max as u64) as u32
    }
}

/// Credit ladder for example counts: 1 -> 60%, 2 -> 80%, 3+ -> full
pub fn example_ladder(count: usize) -> Share {
    match count {
        0 => Share::NONE,
        1 => Share::percent(60),
        2 => Share::percent(80),
        _ => Share::FULL,
    }
}

// ---------------------------------------------------------------------------
// Narrative markdown (README, API, ARCHITECTURE)
// ---------------------------------------------------------------------------

pub mod narrative {
    use super::*;

    pub fn overview(doc: &MarkdownDoc<'_>) -> Share {
        let overview_sections: Vec<usize> = doc
            .headings()
            .into_iter()
            .filter(|h| rubric::mentions_any(&h.text, OVERVIEW_HEADINGS))
            .map(|h| doc.section_word_count(h.line))
            .collect();
        let intro = doc.intro_word_count();

        if intro >= scoring_constants::OVERVIEW_FULL_WORDS
            || overview_sections
                .iter()
                .any(|words| *words >= scoring_constants::OVERVIEW_PARTIAL_WORDS)
        {
            Share::FULL
        } else if intro >= scoring_constants::OVERVIEW_PARTIAL_WORDS
            || !overview_sections.is_empty()
        {
            Share::HALF
        } else {
            Share::NONE
        }
    }

    pub fn installation(doc: &MarkdownDoc<'_>, text: &str) -> Share {
        if doc
            .headings()
            .iter()
            .any(|h| rubric::mentions_any(&h.text, INSTALLATION_HEADINGS))
        {
            Share::FULL
        } else if rubric::mentions_any(text, INSTALLATION_PHRASES) {
            Share::percent(60)
        } else {
            Share::NONE
        }
    }

    pub fn examples(doc: &MarkdownDoc<'_>) -> Share {
        let blocks = doc.code_blocks().len();
        if blocks == 0
            && doc
                .headings()
                .iter()
                .any(|h| rubric::mentions_any(&h.text, USAGE_HEADINGS))
        {
            return Share::percent(25);
        }
        example_ladder(blocks)
    }

    pub fn api_docs(doc: &MarkdownDoc<'_>, names: &[&str]) -> Share {
        if names.is_empty() {
            let has_api_section = doc
                .headings()
                .iter()
                .any(|h| rubric::mentions_any(&h.text, API_HEADINGS));
            return if has_api_section { Share::FULL } else { Share::HALF };
        }
        let documented = names.iter().filter(|name| is_described(doc, name)).count();
        Share::ratio(documented, names.len())
    }

    /// Name appears outside code with enough prose around it
    fn is_described(doc: &MarkdownDoc<'_>, name: &str) -> bool {
        let window = scoring_constants::REFERENCE_WINDOW_LINES;
        doc.text_lines()
            .filter(|(_, text)| contains_identifier(text, name))
            .any(|(line, _)| {
                let start = line.saturating_sub(window);
                let end = (line + window + 1).min(doc.lines.len());
                let words: usize = doc.lines[start..end]
                    .iter()
                    .map(|kind| match kind {
                        LineKind::Prose(text) => descriptive_words(text, name),
                        _ => 0,
                    })
                    .sum();
                words >= scoring_constants::REFERENCE_MIN_WORDS
            })
    }

    fn descriptive_words(text: &str, name: &str) -> usize {
        text.split_whitespace()
            .filter(|w| w.chars().any(char::is_alphanumeric))
            .filter(|w| !contains_identifier(w, name))
            .count()
    }

    pub fn structure(doc: &MarkdownDoc<'_>) -> Share {
        let headings = doc.headings();
        let levels: BTreeSet<usize> = headings.iter().map(|h| h.level).collect();
        let depth_bonus = match levels.len() {
            0 | 1 => 0,
            2 => 30,
            _ => 40,
        };
        let count = headings.len().min(scoring_constants::FULL_HEADING_COUNT) as u32;
        Share::percent(count * 10 + depth_bonus)
    }
}

// ---------------------------------------------------------------------------
// JSDoc-annotated source
// ---------------------------------------------------------------------------

pub mod jsdoc {
    use super::*;

    /// A `/** ... */` block with its line span (inclusive)
    #[derive(Debug, Clone)]
    pub struct DocBlock {
        pub start: usize,
        pub end: usize,
        pub body: String,
    }

    pub fn blocks(text: &str) -> Vec<DocBlock> {
        let mut blocks = Vec::new();
        let mut current: Option<(usize, Vec<&str>)> = None;

        for (i, line) in text.lines().enumerate() {
            match current.as_mut() {
                None => {
                    let Some(open) = line.find("/**") else {
                        continue;
                    };
                    let rest = &line[open + 3..];
                    if let Some(close) = rest.find("*/") {
                        blocks.push(DocBlock {
                            start: i,
                            end: i,
                            body: rest[..close].to_string(),
                        });
                    } else {
                        current = Some((i, vec![rest]));
                    }
                }
                Some((start, body)) => {
                    if let Some(close) = line.find("*/") {
                        body.push(&line[..close]);
                        blocks.push(DocBlock {
                            start: *start,
                            end: i,
                            body: body.join("\n"),
                        });
                        current = None;
                    } else {
                        body.push(line);
                    }
                }
            }
        }
        blocks
    }

    fn tags(text: &str) -> BTreeSet<String> {
        RE_JSDOC_TAG
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }

    pub fn overview(text: &str, blocks: &[DocBlock]) -> Share {
        let present = tags(text);
        if JSDOC_OVERVIEW_TAGS.iter().any(|t| present.contains(*t)) {
            Share::FULL
        } else if blocks
            .iter()
            .any(|b| word_count(&b.body) >= scoring_constants::OVERVIEW_PARTIAL_WORDS)
        {
            Share::HALF
        } else {
            Share::NONE
        }
    }

    pub fn examples(text: &str) -> Share {
        let tagged = RE_JSDOC_TAG
            .find_iter(text)
            .filter(|m| m.as_str().eq_ignore_ascii_case("@example"))
            .count();
        let fenced = MarkdownDoc::parse(text).code_blocks().len();
        example_ladder(tagged.max(fenced))
    }

    pub fn api_docs(text: &str, blocks: &[DocBlock], names: &[&str]) -> Share {
        if names.is_empty() {
            return if blocks.is_empty() { Share::HALF } else { Share::FULL };
        }
        let lines: Vec<&str> = text.lines().collect();
        let documented = names
            .iter()
            .filter(|name| {
                names_in_tags(blocks, name) || preceded_by_block(&lines, blocks, name)
            })
            .count();
        Share::ratio(documented, names.len())
    }

    /// `@function name`, `@class name` and friends
    fn names_in_tags(blocks: &[DocBlock], name: &str) -> bool {
        const NAMING_TAGS: &[&str] = &["@function", "@func", "@method", "@class", "@name", "@callback", "@typedef"];
        blocks.iter().any(|block| {
            let tokens: Vec<&str> = block.body.split_whitespace().collect();
            tokens.windows(2).any(|pair| {
                NAMING_TAGS.contains(&pair[0].to_lowercase().as_str())
                    && pair[1].trim_matches(|c: char| c == '{' || c == '}') == name
            })
        })
    }

    /// A line outside any block names `name` within a few lines of a block's end
    fn preceded_by_block(lines: &[&str], blocks: &[DocBlock], name: &str) -> bool {
        let window = scoring_constants::REFERENCE_WINDOW_LINES;
        blocks.iter().any(|block| {
            let first = block.end + 1;
            let last = (block.end + window).min(lines.len().saturating_sub(1));
            (first..=last).any(|i| {
                i < lines.len()
                    && !blocks.iter().any(|b| b.start <= i && i <= b.end)
                    && contains_identifier(lines[i], name)
            })
        })
    }

    pub fn structure(text: &str) -> Share {
        let present = tags(text);
        let distinct = JSDOC_TAGS.iter().filter(|t| present.contains(**t)).count();
        Share::percent(distinct.min(5) as u32 * 20)
    }
}

// ---------------------------------------------------------------------------
// OpenAPI documents (YAML or JSON)
// ---------------------------------------------------------------------------

pub mod openapi {
    use super::*;

    /// A `key: value` line, quoted (JSON) or bare (YAML)
    #[derive(Debug, Clone, Copy)]
    pub struct KeyLine<'a> {
        pub line: usize,
        pub indent: usize,
        pub key: &'a str,
        pub value: &'a str,
    }

    pub fn key_lines(text: &str) -> Vec<KeyLine<'_>> {
        text.lines()
            .enumerate()
            .filter_map(|(line, raw)| {
                let body = raw.trim_start();
                let indent = raw.len() - body.len();
                let body = body.trim_start_matches("- ");
                let unquoted = body.trim_start_matches('"');
                let key_end = unquoted.find(|c: char| c == '"' || c == ':')?;
                let key = &unquoted[..key_end];
                if key.is_empty() || key.contains(char::is_whitespace) {
                    return None;
                }
                let after = unquoted[key_end..].trim_start_matches('"').trim_start();
                let value = after.strip_prefix(':')?;
                Some(KeyLine {
                    line,
                    indent,
                    key,
                    value: value.trim().trim_end_matches(',').trim_matches('"'),
                })
            })
            .collect()
    }

    fn has_key(keys: &[KeyLine<'_>], key: &str) -> bool {
        keys.iter().any(|k| k.key.eq_ignore_ascii_case(key))
    }

    /// Lines belonging to the block opened at `open`: until the next
    /// non-blank line indented no deeper than the opener.
    fn block_lines<'a>(text: &'a str, open: &KeyLine<'_>) -> Vec<&'a str> {
        text.lines()
            .skip(open.line + 1)
            .take_while(|raw| {
                let trimmed = raw.trim_start();
                trimmed.is_empty() || raw.len() - trimmed.len() > open.indent
            })
            .collect()
    }

    pub fn overview(text: &str, keys: &[KeyLine<'_>]) -> Share {
        let Some(info) = keys.iter().find(|k| k.key.eq_ignore_ascii_case("info")) else {
            return Share::NONE;
        };
        let inner = key_lines_in(&block_lines(text, info));
        let has_value = |name: &str| {
            inner
                .iter()
                .any(|(key, value)| key.eq_ignore_ascii_case(name) && !value.is_empty())
        };
        if has_value("description") {
            Share::FULL
        } else if has_value("title") {
            Share::HALF
        } else {
            Share::NONE
        }
    }

    fn key_lines_in(lines: &[&str]) -> Vec<(String, String)> {
        let joined = lines.join("\n");
        key_lines(&joined)
            .into_iter()
            .map(|k| (k.key.to_string(), k.value.to_string()))
            .collect()
    }

    pub fn installation(keys: &[KeyLine<'_>]) -> Share {
        if has_key(keys, "servers") || has_key(keys, "host") {
            Share::FULL
        } else if has_key(keys, "security") || has_key(keys, "securitySchemes") {
            Share::percent(60)
        } else {
            Share::NONE
        }
    }

    pub fn examples(keys: &[KeyLine<'_>]) -> Share {
        let count = keys
            .iter()
            .filter(|k| k.key.eq_ignore_ascii_case("example") || k.key.eq_ignore_ascii_case("examples"))
            .count();
        example_ladder(count)
    }

    pub fn api_docs(text: &str, keys: &[KeyLine<'_>], names: &[&str]) -> Share {
        if names.is_empty() {
            return if has_key(keys, "paths") { Share::FULL } else { Share::HALF };
        }
        let documented = names
            .iter()
            .filter(|name| {
                keys.iter().any(|k| {
                    OPENAPI_OPERATION_KEYS.contains(&k.key.to_lowercase().as_str())
                        && contains_identifier(k.value, name)
                }) || text.lines().any(|line| is_path_line(line) && line.contains(**name))
            })
            .count();
        Share::ratio(documented, names.len())
    }

    fn is_path_line(line: &str) -> bool {
        let trimmed = line.trim_start().trim_start_matches('"');
        trimmed.starts_with('/')
    }

    pub fn structure(keys: &[KeyLine<'_>]) -> Share {
        let present = OPENAPI_SECTIONS
            .iter()
            .filter(|section| match **section {
                "openapi" => has_key(keys, "openapi") || has_key(keys, "swagger"),
                other => has_key(keys, other),
            })
            .count();
        Share::percent(present as u32 * 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_points_floor() {
        assert_eq!(Share::percent(60).points(20), 12);
        assert_eq!(Share::ratio(1, 3).points(25), 8);
        assert_eq!(Share::HALF.points(15), 7);
        assert_eq!(Share::percent(250).points(10), 10);
        assert_eq!(Share::ratio(0, 0).points(10), 10);
    }

    #[test]
    fn test_narrative_structure_depth_bonus() {
        let flat = MarkdownDoc::parse("## A\n## B\n");
        assert_eq!(narrative::structure(&flat), Share::percent(20));
        let nested = MarkdownDoc::parse("# A\n## B\n### C\n");
        assert_eq!(narrative::structure(&nested), Share::percent(70));
    }

    #[test]
    fn test_narrative_api_needs_prose_near_name() {
        let doc = MarkdownDoc::parse("## API\n\n### add(a, b)\n\nAdds two numbers and returns the sum.\n");
        assert_eq!(narrative::api_docs(&doc, &["add"]), Share::ratio(1, 1));

        let bare = MarkdownDoc::parse("## API\n\n- add\n");
        assert_eq!(narrative::api_docs(&bare, &["add"]), Share::ratio(0, 1));
    }

    #[test]
    fn test_names_inside_code_do_not_count() {
        let doc = MarkdownDoc::parse("Some words here to pad the window out.\n\n```js\nadd(1, 2)\n```\n");
        assert_eq!(narrative::api_docs(&doc, &["add"]), Share::ratio(0, 1));
    }

    #[test]
    fn test_jsdoc_blocks() {
        let source = "/** One liner */\nconst a = 1;\n/**\n * Adds.\n * @param {number} a\n */\nfunction add(a, b) {}\n";
        let blocks = jsdoc::blocks(source);
        assert_eq!(blocks.len(), 2);
        assert_eq!((blocks[1].start, blocks[1].end), (2, 5));
        assert_eq!(jsdoc::api_docs(source, &blocks, &["add", "sub"]), Share::ratio(1, 2));
    }

    #[test]
    fn test_jsdoc_structure_counts_distinct_tags() {
        let source = "/**\n * @param a\n * @param b\n * @returns x\n * @throws E\n */";
        assert_eq!(jsdoc::structure(source), Share::percent(60));
    }

    #[test]
    fn test_openapi_key_lines_yaml_and_json() {
        let yaml = "openapi: 3.0.0\ninfo:\n  title: Pets\n  description: Pet store API\npaths:\n  /pets:\n    get:\n      operationId: listPets\n";
        let keys = openapi::key_lines(yaml);
        assert_eq!(openapi::overview(yaml, &keys), Share::FULL);
        assert_eq!(openapi::structure(&keys), Share::percent(60));
        assert_eq!(openapi::api_docs(yaml, &keys, &["listPets"]), Share::ratio(1, 1));

        let json = "{\n  \"openapi\": \"3.0.0\",\n  \"info\": {\n    \"title\": \"Pets\"\n  },\n  \"servers\": []\n}";
        let keys = openapi::key_lines(json);
        assert_eq!(openapi::overview(json, &keys), Share::HALF);
        assert_eq!(openapi::installation(&keys), Share::FULL);
    }
}
