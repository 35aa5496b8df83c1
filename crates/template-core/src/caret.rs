//! Caret Locator: maps a view-supplied anchor to a logical `(run, offset)` position.
//!
//! # Anchors
//!
//! The view describes the caret in terms of its own projection, which has three levels:
//!
//! ```text
//! Root                      session container, children = run elements
//! └── Element(i)            run element for run i, one child (its leaf)
//!     └── Leaf(i)           text leaf holding run i's rendered content
//! ```
//!
//! An anchor is a node plus an offset: a child offset for `Root` and `Element`, a char offset for
//! `Leaf`. The owning run follows the nearest-block-or-self rule: when the anchor's parent is
//! the root container the anchor itself is the owning element, otherwise the locator climbs to
//! the parent element.

use crate::document::Document;
use crate::run::{Placeholder, Run};
use crate::text::char_len;

/// Logical caret location: run index plus char offset within the run's rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CaretPosition {
    /// Index of the run holding the caret.
    pub run: usize,
    /// Char offset inside the run, `0..=run.char_len()`.
    pub offset: usize,
}

impl CaretPosition {
    /// Create a caret position.
    pub fn new(run: usize, offset: usize) -> Self {
        Self { run, offset }
    }

    /// Caret immediately after the last run, or `None` for an empty document.
    pub fn end_of(document: &Document) -> Option<Self> {
        let run = document.len().checked_sub(1)?;
        Some(Self::new(run, document.get(run)?.char_len()))
    }

    /// Clamp the offset to the run length; `None` if the run index is out of range.
    pub fn clamped(self, document: &Document) -> Option<Self> {
        let run = document.get(self.run)?;
        Some(Self::new(self.run, self.offset.min(run.char_len())))
    }
}

/// A node of the view projection an anchor can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorNode {
    /// The session's root container.
    Root,
    /// The element projecting run `i`.
    Element(usize),
    /// The text leaf inside the element projecting run `i`.
    Leaf(usize),
}

impl AnchorNode {
    /// Parent node in the projection.
    pub fn parent(self) -> Option<AnchorNode> {
        match self {
            AnchorNode::Root => None,
            AnchorNode::Element(_) => Some(AnchorNode::Root),
            AnchorNode::Leaf(run) => Some(AnchorNode::Element(run)),
        }
    }
}

/// Opaque caret handle reported by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaretAnchor {
    /// Node holding the caret.
    pub node: AnchorNode,
    /// Child offset (`Root`, `Element`) or char offset (`Leaf`).
    pub offset: usize,
}

impl CaretAnchor {
    /// Anchor inside the text leaf of run `run`.
    pub fn in_run(run: usize, offset: usize) -> Self {
        Self {
            node: AnchorNode::Leaf(run),
            offset,
        }
    }

    /// Anchor on the element of run `run`, before (`0`) or after (`1`) its leaf.
    pub fn on_element(run: usize, child_offset: usize) -> Self {
        Self {
            node: AnchorNode::Element(run),
            offset: child_offset,
        }
    }

    /// Anchor between the root container's children.
    pub fn on_root(child_offset: usize) -> Self {
        Self {
            node: AnchorNode::Root,
            offset: child_offset,
        }
    }
}

impl From<CaretPosition> for CaretAnchor {
    fn from(position: CaretPosition) -> Self {
        Self::in_run(position.run, position.offset)
    }
}

/// The run under a located caret, classified by variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretTarget<'a> {
    /// Caret inside a text run.
    Text {
        /// Run index.
        index: usize,
        /// Char offset inside the run.
        offset: usize,
        /// Run content.
        content: &'a str,
    },
    /// Caret on a placeholder run.
    Placeholder {
        /// Run index.
        index: usize,
        /// Char offset inside the rendered placeholder.
        offset: usize,
        /// The placeholder.
        placeholder: &'a Placeholder,
    },
}

/// Resolves anchors against one document.
#[derive(Debug, Clone, Copy)]
pub struct CaretLocator<'a> {
    document: &'a Document,
}

impl<'a> CaretLocator<'a> {
    /// Create a locator for `document`.
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Index of the run owning `anchor`, if it exists in the document.
    pub fn owning_run(&self, anchor: &CaretAnchor) -> Option<usize> {
        let owner = match anchor.node.parent() {
            Some(AnchorNode::Root) => anchor.node,
            Some(parent) => parent,
            None => return self.root_child(anchor.offset).map(|(run, _)| run),
        };
        match owner {
            AnchorNode::Element(run) | AnchorNode::Leaf(run) if run < self.document.len() => {
                Some(run)
            }
            _ => None,
        }
    }

    /// Char count from the start of `run`'s content up to the caret described by `anchor`.
    pub fn cursor_index_within(&self, run: usize, anchor: &CaretAnchor) -> usize {
        let len = self.document.get(run).map_or(0, Run::char_len);
        self.cursor_index_in(len, anchor)
    }

    /// Resolve an anchor reported after a native edit of the owning run.
    ///
    /// The offset is measured against `edited`, the run's rendered text after the edit, which
    /// may be longer than the run the document still holds.
    pub fn locate_edited(&self, anchor: &CaretAnchor, edited: &str) -> Option<CaretPosition> {
        let run = self.owning_run(anchor)?;
        let offset = self.cursor_index_in(char_len(edited), anchor);
        Some(CaretPosition::new(run, offset))
    }

    fn cursor_index_in(&self, len: usize, anchor: &CaretAnchor) -> usize {
        match anchor.node {
            AnchorNode::Leaf(_) => anchor.offset.min(len),
            AnchorNode::Element(_) => {
                if anchor.offset == 0 {
                    0
                } else {
                    len
                }
            }
            AnchorNode::Root => match self.root_child(anchor.offset) {
                Some((_, true)) => len,
                _ => 0,
            },
        }
    }

    /// Resolve `anchor` to a logical position.
    pub fn locate(&self, anchor: &CaretAnchor) -> Option<CaretPosition> {
        let run = self.owning_run(anchor)?;
        Some(CaretPosition::new(run, self.cursor_index_within(run, anchor)))
    }

    /// Classify the run under `position`.
    pub fn classify(&self, position: CaretPosition) -> Option<CaretTarget<'a>> {
        let position = position.clamped(self.document)?;
        let target = match self.document.get(position.run)? {
            Run::Text(content) => CaretTarget::Text {
                index: position.run,
                offset: position.offset,
                content,
            },
            Run::Placeholder(placeholder) => CaretTarget::Placeholder {
                index: position.run,
                offset: position.offset,
                placeholder,
            },
        };
        Some(target)
    }

    /// Run addressed by a root child offset, and whether the caret sits at that run's end.
    fn root_child(&self, child_offset: usize) -> Option<(usize, bool)> {
        if child_offset < self.document.len() {
            Some((child_offset, false))
        } else {
            self.document.len().checked_sub(1).map(|last| (last, true))
        }
    }
}
