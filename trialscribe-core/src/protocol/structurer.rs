//! Turns free-form completion text into a [`Protocol`].
//!
//! Headings are recognized line by line. A line counts as a heading candidate
//! when it carries a heading marker: markdown `#`, a whole-line bold wrapper,
//! an outline number (`3.`, `3)`, `III.`), a decimal subsection number
//! (`3.1`), or a trailing colon on a short line. Lines marked only by a number
//! or a colon must also read like a title, so numbered criteria and
//! colon-terminated sentences stay in the body.
//!
//! The marker-stripped title is split on `and`, `&`, `/`, parentheses and
//! commas, and every part is matched case-insensitively against
//! [`SECTION_RULES`]. A combined heading such as "Study Overview and
//! Objectives" feeds its body to every section it names.
//!
//! Outline-numbered headings without any other marker must move the heading
//! numbering forward. A number that continues the current numbered list, or
//! that restarts at or below the last numbered heading, is a list item.

use super::{Protocol, ProtocolSection};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Longest line still considered a colon-terminated heading
const MAX_COLON_HEADING_LEN: usize = 80;

const MAX_HEADING_WORDS: usize = 12;

/// Colon headings this short may be sentence case ("Inclusion criteria:")
const SHORT_HEADING_WORDS: usize = 4;

/// Words a title-cased heading may leave lowercase
const MINOR_WORDS: &[&str] = &[
    "with", "from", "into", "over", "upon", "than", "during", "within", "without", "versus",
];

/// Keyword rules in priority order
pub const SECTION_RULES: &[(ProtocolSection, &[&str])] = &[
    (
        ProtocolSection::Overview,
        &["overview", "background", "synopsis", "introduction"],
    ),
    (ProtocolSection::Objectives, &["objective", "aim"]),
    (
        ProtocolSection::Inclusion,
        &["patient selection", "inclusion", "eligibility"],
    ),
    (ProtocolSection::Exclusion, &["exclusion"]),
    (ProtocolSection::Safety, &["safety", "adverse", "ethic"]),
    (
        ProtocolSection::Endpoints,
        &["efficacy", "endpoint", "outcome", "statistic"],
    ),
    (
        ProtocolSection::Procedures,
        &[
            "design",
            "methodology",
            "treatment",
            "procedure",
            "intervention",
            "schedule",
        ],
    ),
];

static MARKDOWN_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6}\s*(?P<title>.+?)\s*#*$").expect("valid regex"));
static BOLD_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\*\*|__)(?P<title>.+?)(?:\*\*|__)\s*:?$").expect("valid regex")
});
static OUTLINE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?P<sub>\d{1,2}(?:\.\d{1,2})+)\.?|(?P<top>\d{1,2})[.)]|(?P<roman>[IVX]{1,5})[.)])\s+(?P<title>\S.*)$",
    )
    .expect("valid regex")
});
static TITLE_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?:and|&)\s+|[/(),;]").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuringFailure {
    #[error("completion response was empty")]
    EmptyResponse,
    #[error("completion response contained no recognizable protocol sections")]
    NoRecognizedSections,
    #[error("protocol is missing sections: {}", format_sections(.0))]
    MissingSections(Vec<ProtocolSection>),
}

fn format_sections(sections: &[ProtocolSection]) -> String {
    sections
        .iter()
        .map(|section| section.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Markdown,
    Bold,
    /// Only a top-level outline number (`3.`, `IV)`)
    Outline,
    /// Only a decimal subsection number (`3.1`)
    Subsection,
    Colon,
}

#[derive(Debug)]
struct HeadingLine {
    marker: Marker,
    /// Top-level outline number carried by the heading, if any
    number: Option<u32>,
    title: String,
}

/// Outline numbering seen so far
#[derive(Debug, Default)]
struct Numbering {
    last_heading: Option<u32>,
    last_item: Option<u32>,
}

impl Numbering {
    fn accepts(&self, heading: &HeadingLine, in_section: bool) -> bool {
        if heading.marker != Marker::Outline {
            return true;
        }
        let Some(number) = heading.number else {
            return false;
        };
        if number > 1 && self.last_item == Some(number - 1) {
            return false;
        }
        match self.last_heading {
            Some(last) => number > last,
            // numbered lines inside an unnumbered section are list items
            None => !in_section,
        }
    }

    fn heading(&mut self, number: Option<u32>) {
        if number.is_some() {
            self.last_heading = number;
        }
        self.last_item = None;
    }

    fn body_line(&mut self, line: &str) {
        if let Some((Some(number), _, _)) = split_outline(line) {
            self.last_item = Some(number);
        }
    }
}

/// Structure raw completion text into the fixed section mapping
pub fn structure(raw_text: &str) -> Result<Protocol, StructuringFailure> {
    if raw_text.trim().is_empty() {
        return Err(StructuringFailure::EmptyResponse);
    }

    let mut preamble: Vec<&str> = Vec::new();
    let mut blocks: Vec<(Vec<ProtocolSection>, Vec<&str>)> = Vec::new();
    let mut numbering = Numbering::default();

    for line in raw_text.lines() {
        let trimmed = line.trim();
        if let Some(heading) = parse_heading(trimmed) {
            let sections = sections_for_title(&heading.title);
            if !sections.is_empty() && numbering.accepts(&heading, !blocks.is_empty()) {
                numbering.heading(heading.number);
                blocks.push((sections, Vec::new()));
                continue;
            }
        }
        numbering.body_line(trimmed);
        match blocks.last_mut() {
            Some((_, body)) => body.push(line),
            None => preamble.push(line),
        }
    }

    if blocks.is_empty() {
        return Err(StructuringFailure::NoRecognizedSections);
    }

    let mut protocol = Protocol::empty();
    let preamble = join_body(&preamble);
    if !preamble.is_empty() {
        tracing::debug!(chars = preamble.len(), "keeping preamble in overview");
        protocol
            .body_mut(ProtocolSection::Overview)
            .push_str(&preamble);
    }

    for (sections, lines) in &blocks {
        let body = join_body(lines);
        if body.is_empty() {
            continue;
        }
        for section in sections {
            let target = protocol.body_mut(*section);
            if !target.is_empty() {
                target.push_str("\n\n");
            }
            target.push_str(&body);
        }
    }

    tracing::debug!(
        headings = blocks.len(),
        empty_sections = protocol.iter().filter(|(_, body)| body.is_empty()).count(),
        "structured completion text"
    );
    Ok(protocol)
}

/// Sections a single heading line maps to; empty when the line is not a
/// recognized heading. Numbering context is only applied by [`structure`].
pub fn classify_heading(line: &str) -> Vec<ProtocolSection> {
    parse_heading(line.trim())
        .map(|heading| sections_for_title(&heading.title))
        .unwrap_or_default()
}

fn sections_for_title(title: &str) -> Vec<ProtocolSection> {
    let title = title.to_lowercase();
    let mut sections = Vec::new();
    for part in TITLE_SPLIT.split(&title) {
        if let Some(section) = match_rule(part) {
            if !sections.contains(&section) {
                sections.push(section);
            }
        }
    }
    if sections.is_empty() {
        sections.extend(match_rule(&title));
    }
    sections
}

fn match_rule(text: &str) -> Option<ProtocolSection> {
    SECTION_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| text.contains(keyword)))
        .map(|(section, _)| *section)
}

fn parse_heading(line: &str) -> Option<HeadingLine> {
    if line.is_empty() {
        return None;
    }

    let wrapped = MARKDOWN_HEADING
        .captures(line)
        .map(|caps| (Marker::Markdown, caps))
        .or_else(|| BOLD_LINE.captures(line).map(|caps| (Marker::Bold, caps)));
    if let Some((marker, caps)) = wrapped {
        let title = clean_title(&caps["title"]);
        return Some(match split_outline(&title) {
            Some((number, _, rest)) => HeadingLine {
                marker,
                number,
                title: rest,
            },
            None => HeadingLine {
                marker,
                number: None,
                title,
            },
        });
    }

    if let Some((number, is_subsection, title)) = split_outline(line) {
        if !reads_like_title(&title, false) {
            return None;
        }
        let marker = if is_subsection {
            Marker::Subsection
        } else {
            Marker::Outline
        };
        return Some(HeadingLine {
            marker,
            number,
            title,
        });
    }

    if let Some(stripped) = line.strip_suffix(':') {
        if line.len() <= MAX_COLON_HEADING_LEN && !line.starts_with(['-', '*', '•']) {
            let title = clean_title(stripped);
            if reads_like_title(&title, true) {
                return Some(HeadingLine {
                    marker: Marker::Colon,
                    number: None,
                    title,
                });
            }
        }
    }

    None
}

/// `(top-level number, is subsection, title)` for an outline-numbered line
fn split_outline(line: &str) -> Option<(Option<u32>, bool, String)> {
    let caps = OUTLINE_PREFIX.captures(line)?;
    let title = clean_title(&caps["title"]);
    if caps.name("sub").is_some() {
        return Some((None, true, title));
    }
    let number = match (caps.name("top"), caps.name("roman")) {
        (Some(top), _) => top.as_str().parse().ok(),
        (None, Some(roman)) => roman_value(roman.as_str()),
        (None, None) => None,
    };
    Some((number, false, title))
}

fn roman_value(numeral: &str) -> Option<u32> {
    let mut total: u32 = 0;
    let mut highest = 0;
    for c in numeral.chars().rev() {
        let value = match c {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            _ => return None,
        };
        if value < highest {
            total = total.saturating_sub(value);
        } else {
            total += value;
            highest = value;
        }
    }
    Some(total)
}

/// Title case, all caps, or (when allowed) a short sentence-case phrase
fn reads_like_title(title: &str, allow_short_sentence: bool) -> bool {
    if title.is_empty() || title.ends_with('.') {
        return false;
    }
    let words: Vec<&str> = title.split_whitespace().collect();
    if words.len() > MAX_HEADING_WORDS {
        return false;
    }
    let starts_upper = title
        .chars()
        .find(|c| c.is_alphabetic())
        .is_some_and(char::is_uppercase);
    if !starts_upper {
        return false;
    }
    if allow_short_sentence && words.len() <= SHORT_HEADING_WORDS {
        return true;
    }
    words
        .iter()
        .filter(|word| {
            let letters = word.chars().filter(|c| c.is_alphabetic()).count();
            letters > 3 && !MINOR_WORDS.contains(&word.to_lowercase().as_str())
        })
        .all(|word| {
            word.chars()
                .find(|c| c.is_alphabetic())
                .is_some_and(char::is_uppercase)
        })
}

fn clean_title(title: &str) -> String {
    title
        .trim()
        .trim_matches(|c| c == '*' || c == '_')
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_string()
}

fn join_body(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}
