//! Tokenizer: wire-format string ⇄ [`Document`] conversion.
//!
//! # Wire format
//!
//! Literal spans interleaved with placeholder tokens written as `open name close` (`[Name]` with
//! the default delimiters). Delimiters are reserved and have no escape sequence.
//!
//! # Parsing
//!
//! The input is scanned for maximal alternating segments:
//!
//! - a bracketed segment: the shortest `open … close` span on a single line
//! - a free-text segment: a maximal run of characters that are neither delimiter
//!
//! A bracketed segment whose inner text is an accepted name becomes a placeholder run. Any other
//! bracketed segment is dropped entirely, as are stray delimiter characters that do not belong to
//! a segment. Adjacent free text is coalesced, so a parsed document never holds two neighbouring
//! text runs.
//!
//! # Serialization
//!
//! Runs are concatenated (placeholders wrapped in delimiters), the engine's zero-width markers are
//! removed, the ends are trimmed and every whitespace run collapses to one space. The in-memory
//! document is never normalized.

use crate::config::{AcceptedSet, ConfigError, Delimiters};
use crate::document::Document;
use crate::run::{Run, is_marker};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static DEFAULT_TOKENIZER: LazyLock<Tokenizer> = LazyLock::new(Tokenizer::default);

/// Parse `input` with the default delimiters.
pub fn parse(input: &str, accepted: &AcceptedSet) -> Document {
    DEFAULT_TOKENIZER.parse(input, accepted)
}

/// Serialize `document` with the default delimiters.
pub fn serialize(document: &Document) -> String {
    DEFAULT_TOKENIZER.serialize(document)
}

/// Trim `text` and collapse each whitespace run to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Delimiter-aware parser and serializer.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    delimiters: Delimiters,
    segment: Regex,
}

impl Tokenizer {
    /// Build a tokenizer for `delimiters`.
    pub fn new(delimiters: Delimiters) -> Result<Self, ConfigError> {
        delimiters.validate()?;
        let open = regex::escape(&delimiters.open.to_string());
        let close = regex::escape(&delimiters.close.to_string());
        let segment = Regex::new(&format!("{open}.*?{close}|[^{open}{close}]+"))?;
        Ok(Self {
            delimiters,
            segment,
        })
    }

    /// Delimiters this tokenizer reads and writes.
    pub fn delimiters(&self) -> Delimiters {
        self.delimiters
    }

    /// Parse a wire-format string against the accepted set.
    pub fn parse(&self, input: &str, accepted: &AcceptedSet) -> Document {
        let mut document = Document::new();
        for segment in self.segment.find_iter(input).map(|m| m.as_str()) {
            match self.placeholder_name(segment) {
                Some(name) if accepted.contains(name) => {
                    document.push(Run::placeholder(name));
                }
                Some(name) => {
                    debug!(name, "discarding placeholder token outside the accepted set");
                }
                None => push_text(&mut document, segment),
            }
        }
        document
    }

    /// Serialize `document` to the host-facing string.
    pub fn serialize(&self, document: &Document) -> String {
        let mut raw = String::new();
        for run in document.runs() {
            match run {
                Run::Text(content) => raw.push_str(content),
                Run::Placeholder(placeholder) => {
                    raw.push_str(&self.delimiters.wrap(placeholder.name()))
                }
            }
        }
        raw.retain(|c| !is_marker(c));
        normalize_whitespace(&raw)
    }

    /// Inner text of a bracketed segment, or `None` for free text.
    fn placeholder_name<'s>(&self, segment: &'s str) -> Option<&'s str> {
        segment
            .strip_prefix(self.delimiters.open)?
            .strip_suffix(self.delimiters.close)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(Delimiters::default()).expect("default delimiters always compile")
    }
}

fn push_text(document: &mut Document, segment: &str) {
    let last = document.len().checked_sub(1);
    if let Some(Run::Text(content)) = last.and_then(|index| document.get_mut(index)) {
        content.push_str(segment);
    } else {
        document.push(Run::text(segment));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(names: &[&str]) -> AcceptedSet {
        AcceptedSet::new(names.iter().copied()).unwrap()
    }

    #[test]
    fn test_parse_mixed_template() {
        let document = parse("Hello [Name], from [Company]", &accepted(&["Name", "Company"]));
        assert_eq!(
            document.runs(),
            &[
                Run::text("Hello "),
                Run::placeholder("Name"),
                Run::text(", from "),
                Run::placeholder("Company"),
            ]
        );
    }

    #[test]
    fn test_parse_drops_unknown_tokens_and_coalesces_text() {
        let document = parse("a [Unknown] b", &accepted(&["Name"]));
        assert_eq!(document.runs(), &[Run::text("a  b")]);
    }

    #[test]
    fn test_parse_drops_stray_delimiters() {
        let document = parse("a ] b [ c", &accepted(&[]));
        assert_eq!(document.runs(), &[Run::text("a  b  c")]);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse("", &accepted(&["Name"])).is_empty());
    }

    #[test]
    fn test_bracketed_segment_does_not_span_lines() {
        let document = parse("[Na\nme]", &accepted(&["Na\nme"]));
        assert_eq!(document.runs(), &[Run::text("Na\nme")]);
    }

    #[test]
    fn test_serialize_normalizes_whitespace_and_markers() {
        let document = Document::from_runs(vec![
            Run::text("  Hello\u{200B}  "),
            Run::placeholder("Name"),
            Run::text("\u{200B} \t there \u{FEFF}"),
        ]);
        assert_eq!(serialize(&document), "Hello [Name] there");
    }

    #[test]
    fn test_custom_delimiters() {
        let tokenizer = Tokenizer::new(Delimiters::new('{', '}')).unwrap();
        let document = tokenizer.parse("x {A} [A]", &accepted(&["A"]));
        assert_eq!(
            document.runs(),
            &[Run::text("x "), Run::placeholder("A"), Run::text(" [A]")]
        );
        assert_eq!(tokenizer.serialize(&document), "x {A} [A]");
    }
}
