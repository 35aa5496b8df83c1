//! View/Render Adapter contract.
//!
//! The view is a pure, rebuildable projection of a [`Document`]. It owns no editing logic: it
//! draws a [`ViewSnapshot`], reports the caret as an opaque [`CaretAnchor`] and re-anchors the
//! caret after every mutation, in the same synchronous turn that produced it.

use crate::caret::{CaretAnchor, CaretPosition};
use crate::document::Document;
use crate::run::{Run, is_marker};
use crate::text::{char_width, str_width};
use std::ops::Range;

/// Host-side projection of a document onto an editing surface.
pub trait ViewAdapter {
    /// Handle identifying one rendered projection.
    type Handle;

    /// Project `document` onto the surface.
    fn render(&mut self, document: &Document) -> Self::Handle;

    /// Current caret on the surface, if the surface has one.
    fn current_caret(&self, view: &Self::Handle) -> Option<CaretAnchor>;

    /// Re-anchor the caret after a mutation.
    fn set_caret(&mut self, view: &Self::Handle, caret: CaretPosition);
}

/// Kind of a projected span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// Free text.
    Text,
    /// Placeholder chip.
    Placeholder,
}

/// One projected run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSpan {
    /// Index of the projected run.
    pub run: usize,
    /// Span kind.
    pub kind: SpanKind,
    /// Rendered text, zero-width markers included (caret offsets count these).
    pub rendered: String,
    /// Displayed text with zero-width markers removed.
    pub display: String,
    /// Display columns occupied by this span on the flattened line (half-open).
    pub columns: Range<usize>,
}

impl ViewSpan {
    /// Display column (relative to the span start) of a char offset into `rendered`.
    pub fn column_of_offset(&self, offset: usize) -> usize {
        self.rendered.chars().take(offset).map(char_width).sum()
    }

    /// Smallest char offset into `rendered` whose display column reaches `column`.
    ///
    /// A column inside a wide character resolves to the offset after it.
    pub fn offset_of_column(&self, column: usize) -> usize {
        let mut seen = 0;
        for (offset, c) in self.rendered.chars().enumerate() {
            if seen >= column {
                return offset;
            }
            seen += char_width(c);
        }
        self.rendered.chars().count()
    }
}

/// Flattened, display-ready projection of a document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewSnapshot {
    /// Spans in document order.
    pub spans: Vec<ViewSpan>,
}

impl ViewSnapshot {
    /// Project `document`.
    pub fn from_document(document: &Document) -> Self {
        let mut spans = Vec::with_capacity(document.len());
        let mut column = 0;
        for (run_index, run) in document.runs().iter().enumerate() {
            let rendered = run.rendered().into_owned();
            let display: String = rendered.chars().filter(|&c| !is_marker(c)).collect();
            let width = str_width(&display);
            spans.push(ViewSpan {
                run: run_index,
                kind: match run {
                    Run::Text(_) => SpanKind::Text,
                    Run::Placeholder(_) => SpanKind::Placeholder,
                },
                rendered,
                display,
                columns: column..column + width,
            });
            column += width;
        }
        Self { spans }
    }

    /// Total display width.
    pub fn width(&self) -> usize {
        self.spans.last().map_or(0, |span| span.columns.end)
    }

    /// Display column of `caret` on the flattened line.
    pub fn column_of(&self, caret: CaretPosition) -> Option<usize> {
        let span = self.spans.get(caret.run)?;
        Some(span.columns.start + span.column_of_offset(caret.offset))
    }

    /// Caret for a display column (e.g. a mouse click).
    ///
    /// Columns inside a placeholder snap to its nearer edge; columns past the end land after
    /// the last run.
    pub fn caret_at_column(&self, column: usize) -> Option<CaretPosition> {
        let span = self
            .spans
            .iter()
            .find(|span| column < span.columns.end)
            .or_else(|| self.spans.last())?;
        let local = column.saturating_sub(span.columns.start);
        let offset = match span.kind {
            SpanKind::Text => span.offset_of_column(local),
            SpanKind::Placeholder if local * 2 < span.columns.len() => 0,
            SpanKind::Placeholder => span.rendered.chars().count(),
        };
        Some(CaretPosition::new(span.run, offset))
    }
}

/// Handle returned by [`HeadlessView::render`]: the render generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadlessHandle(u64);

/// In-memory view used by tests and by hosts that drive a session programmatically.
///
/// Caret queries against a stale handle (an older render) return `None`, mirroring a surface
/// whose selection no longer reflects the current projection.
#[derive(Debug, Clone, Default)]
pub struct HeadlessView {
    snapshot: ViewSnapshot,
    caret: Option<CaretPosition>,
    generation: u64,
}

impl HeadlessView {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last rendered projection.
    pub fn snapshot(&self) -> &ViewSnapshot {
        &self.snapshot
    }

    /// Caret as last set by the session or the user.
    pub fn caret(&self) -> Option<CaretPosition> {
        self.caret
    }

    /// Simulate the user placing the caret.
    pub fn place_caret(&mut self, caret: Option<CaretPosition>) {
        self.caret = caret;
    }
}

impl ViewAdapter for HeadlessView {
    type Handle = HeadlessHandle;

    fn render(&mut self, document: &Document) -> HeadlessHandle {
        self.snapshot = ViewSnapshot::from_document(document);
        self.generation += 1;
        HeadlessHandle(self.generation)
    }

    fn current_caret(&self, view: &HeadlessHandle) -> Option<CaretAnchor> {
        if view.0 != self.generation {
            return None;
        }
        self.caret.map(CaretAnchor::from)
    }

    fn set_caret(&mut self, view: &HeadlessHandle, caret: CaretPosition) {
        if view.0 == self.generation {
            self.caret = Some(caret);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::guard_text;

    fn document() -> Document {
        Document::from_runs(vec![
            Run::text("Hi "),
            Run::placeholder("Name"),
            Run::text(guard_text()),
        ])
    }

    #[test]
    fn test_snapshot_columns_skip_markers() {
        let snapshot = ViewSnapshot::from_document(&document());
        assert_eq!(snapshot.spans[0].columns, 0..3);
        assert_eq!(snapshot.spans[1].columns, 3..7);
        assert_eq!(snapshot.spans[1].kind, SpanKind::Placeholder);
        assert_eq!(snapshot.spans[2].display, " ");
        assert_eq!(snapshot.spans[2].columns, 7..8);
        assert_eq!(snapshot.width(), 8);
        assert_eq!(snapshot.column_of(CaretPosition::new(2, 1)), Some(7));
        assert_eq!(snapshot.column_of(CaretPosition::new(2, 2)), Some(8));
    }

    #[test]
    fn test_caret_at_column_snaps_placeholders() {
        let snapshot = ViewSnapshot::from_document(&document());
        assert_eq!(
            snapshot.caret_at_column(1),
            Some(CaretPosition::new(0, 1))
        );
        assert_eq!(
            snapshot.caret_at_column(4),
            Some(CaretPosition::new(1, 0))
        );
        assert_eq!(
            snapshot.caret_at_column(6),
            Some(CaretPosition::new(1, 4))
        );
        assert_eq!(
            snapshot.caret_at_column(40),
            Some(CaretPosition::new(2, 2))
        );
    }

    #[test]
    fn test_wide_characters_take_two_columns() {
        let document = Document::from_runs(vec![
            Run::text("名a"),
            Run::placeholder("名前"),
            Run::text(guard_text()),
        ]);
        let snapshot = ViewSnapshot::from_document(&document);
        assert_eq!(snapshot.spans[0].columns, 0..3);
        assert_eq!(snapshot.spans[1].columns, 3..7);
        assert_eq!(snapshot.width(), 8);
        assert_eq!(snapshot.column_of(CaretPosition::new(0, 1)), Some(2));
        assert_eq!(snapshot.column_of(CaretPosition::new(0, 2)), Some(3));
        assert_eq!(snapshot.caret_at_column(1), Some(CaretPosition::new(0, 1)));
        assert_eq!(snapshot.caret_at_column(2), Some(CaretPosition::new(0, 1)));
        assert_eq!(snapshot.caret_at_column(6), Some(CaretPosition::new(1, 2)));
    }

    #[test]
    fn test_stale_handle_has_no_caret() {
        let mut view = HeadlessView::new();
        let first = view.render(&document());
        view.set_caret(&first, CaretPosition::new(0, 2));
        assert_eq!(
            view.current_caret(&first),
            Some(CaretAnchor::in_run(0, 2))
        );

        let second = view.render(&document());
        assert_eq!(view.current_caret(&first), None);
        view.set_caret(&first, CaretPosition::new(0, 0));
        assert_eq!(
            view.current_caret(&second),
            Some(CaretAnchor::in_run(0, 2))
        );
    }
}
