//! Runs: the atomic content units of a template line.
//!
//! A line is an ordered sequence of [`Run`]s. A [`Run::Text`] holds free text verbatim; a
//! [`Run::Placeholder`] stands for a named variable field and is never edited in place. When the
//! view reports a placeholder whose rendered text no longer matches its name, the edit
//! normalizer turns it back into text (decay).

use crate::text::{char_len, split_at_char, strip_markers};
use std::borrow::Cow;

/// Zero-width boundary marker used by guard runs and guarded placeholders.
pub const BOUNDARY_MARKER: char = '\u{200B}';

/// Zero-width non-breaking marker that keeps an otherwise empty surface anchorable.
pub const SENTINEL_MARKER: char = '\u{FEFF}';

/// Returns `true` for the zero-width markers the engine inserts on its own.
pub fn is_marker(c: char) -> bool {
    c == BOUNDARY_MARKER || c == SENTINEL_MARKER
}

/// Content of the guard run inserted next to a placeholder edge: a boundary marker and a space.
pub fn guard_text() -> String {
    format!("{BOUNDARY_MARKER} ")
}

/// A named placeholder token.
///
/// `guarded` records that a boundary marker was re-prepended to the rendered text (backspace
/// guard); the name itself is never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placeholder {
    name: String,
    guarded: bool,
}

impl Placeholder {
    /// Create an unguarded placeholder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guarded: false,
        }
    }

    /// Placeholder name (without delimiters).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a boundary marker currently precedes the name in the rendered text.
    pub fn is_guarded(&self) -> bool {
        self.guarded
    }

    pub(crate) fn set_guarded(&mut self, guarded: bool) {
        self.guarded = guarded;
    }

    /// Text shown on the editing surface for this placeholder.
    pub fn rendered(&self) -> Cow<'_, str> {
        if self.guarded {
            Cow::Owned(format!("{BOUNDARY_MARKER}{}", self.name))
        } else {
            Cow::Borrowed(&self.name)
        }
    }

    /// Length of the rendered text in chars.
    pub fn char_len(&self) -> usize {
        char_len(&self.name) + usize::from(self.guarded)
    }

    /// Returns `true` when `rendered` still spells this placeholder's name once markers are
    /// ignored.
    pub fn matches_rendered(&self, rendered: &str) -> bool {
        strip_markers(rendered) == self.name
    }
}

/// One content unit of a [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Run {
    /// Free text, kept verbatim.
    Text(String),
    /// An atomic named placeholder.
    Placeholder(Placeholder),
}

impl Run {
    /// Create a text run.
    pub fn text(content: impl Into<String>) -> Self {
        Run::Text(content.into())
    }

    /// Create a placeholder run.
    ///
    /// The engine itself only creates placeholders for names in the session's accepted set.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Run::Placeholder(Placeholder::new(name))
    }

    /// Rendered content of the run.
    pub fn rendered(&self) -> Cow<'_, str> {
        match self {
            Run::Text(content) => Cow::Borrowed(content),
            Run::Placeholder(placeholder) => placeholder.rendered(),
        }
    }

    /// Length of the rendered content in chars.
    pub fn char_len(&self) -> usize {
        match self {
            Run::Text(content) => char_len(content),
            Run::Placeholder(placeholder) => placeholder.char_len(),
        }
    }

    /// Returns `true` for text runs.
    pub fn is_text(&self) -> bool {
        matches!(self, Run::Text(_))
    }

    /// Returns `true` for placeholder runs.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Run::Placeholder(_))
    }

    /// Text content, if this is a text run.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Run::Text(content) => Some(content),
            Run::Placeholder(_) => None,
        }
    }

    /// Placeholder, if this is a placeholder run.
    pub fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            Run::Text(_) => None,
            Run::Placeholder(placeholder) => Some(placeholder),
        }
    }

    /// Returns `true` if the run contributes no visible characters.
    pub fn is_visibly_empty(&self) -> bool {
        match self {
            Run::Text(content) => content.chars().all(is_marker),
            Run::Placeholder(placeholder) => placeholder.name.is_empty(),
        }
    }

    /// Split the rendered content at `offset` into up to two new text runs.
    ///
    /// Empty pieces are omitted; `offset` is clamped to the run length.
    pub fn split_at(&self, offset: usize) -> (Option<Run>, Option<Run>) {
        let rendered = self.rendered();
        let (before, after) = split_at_char(&rendered, offset);
        let piece = |s: &str| (!s.is_empty()).then(|| Run::text(s));
        (piece(before), piece(after))
    }
}
