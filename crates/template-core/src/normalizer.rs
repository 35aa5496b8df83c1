//! Edit Normalizer: the state machine that keeps a [`Document`] consistent under editing.
//!
//! # Overview
//!
//! Each [`EditEvent`] is applied against the caret's located [`CaretPosition`]. The implicit
//! state is the variant of the run under the caret (*in-Placeholder* or *in-Text*); an
//! unresolved caret makes every event except [`EditEvent::InsertPlaceholder`] a no-op that leaves
//! the document untouched.
//!
//! | Event               | Caret                          | Rule                         |
//! |---------------------|--------------------------------|------------------------------|
//! | `Input`             | placeholder, text ≠ name       | decay into text              |
//! | `Input`             | text containing accepted name  | promote substring            |
//! | `Space`             | placeholder trailing edge      | guard run after              |
//! | `Enter`             | placeholder leading edge       | guard run before             |
//! | `Backspace`         | placeholder offset 1           | re-prepend boundary marker   |
//! | `InsertPlaceholder` | anywhere / saved / none        | split, insert after, append  |
//!
//! After every resolved event the empty-surface guard runs: a document without visible text is
//! reset to the single sentinel run so the view always has an anchor.

use crate::caret::{CaretLocator, CaretPosition, CaretTarget};
use crate::config::AcceptedSet;
use crate::document::Document;
use crate::run::{BOUNDARY_MARKER, Run, guard_text};
use crate::text::{char_len, joining_separator};
use tracing::{debug, trace};

/// An edit event raised by the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    /// The caret's run was edited natively; carries the run's rendered text after the edit.
    Input(String),
    /// Space key pressed (before the native insertion).
    Space,
    /// Enter key pressed (before the native insertion).
    Enter,
    /// Backspace key pressed (before the native deletion).
    Backspace,
    /// Insert the named placeholder at the caret.
    InsertPlaceholder(String),
}

/// Which normalization rule an event triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditRule {
    /// Input written into a text run without promotion.
    TextUpdate,
    /// A placeholder turned into text.
    Decay,
    /// A text substring turned into a placeholder.
    Promotion,
    /// Guard run inserted after a placeholder.
    SpaceGuard,
    /// Guard run inserted before a placeholder.
    EnterGuard,
    /// Boundary marker re-prepended to a placeholder.
    BackspaceGuard,
    /// Explicit placeholder insertion.
    Insertion,
}

/// Result of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditOutcome {
    /// Rule that fired, if any.
    pub rule: Option<EditRule>,
    /// Caret to re-anchor the view at; `None` when the event was not resolved.
    pub caret: Option<CaretPosition>,
    /// Whether the run sequence changed.
    pub document_changed: bool,
    /// Whether the empty-surface guard reset the document.
    pub surface_reset: bool,
    /// Whether the key was fully handled; the host must then skip its native default action.
    pub consumed: bool,
}

impl EditOutcome {
    fn resolved(caret: CaretPosition) -> Self {
        Self {
            caret: Some(caret),
            ..Self::default()
        }
    }

    fn fired(rule: EditRule, caret: CaretPosition) -> Self {
        Self {
            rule: Some(rule),
            caret: Some(caret),
            ..Self::default()
        }
    }

    fn consuming(mut self) -> Self {
        self.consumed = true;
        self
    }

    /// Returns `true` if the event changed neither the document nor the caret.
    pub fn is_noop(&self) -> bool {
        self.caret.is_none() && !self.document_changed
    }
}

/// Applies edit events to a document for one accepted set.
#[derive(Debug, Clone, Copy)]
pub struct EditNormalizer<'a> {
    accepted: &'a AcceptedSet,
}

impl<'a> EditNormalizer<'a> {
    /// Create a normalizer for `accepted`.
    pub fn new(accepted: &'a AcceptedSet) -> Self {
        Self { accepted }
    }

    /// Apply `event` at `caret`, mutating `document`.
    pub fn apply(
        &self,
        document: &mut Document,
        event: &EditEvent,
        caret: Option<CaretPosition>,
    ) -> EditOutcome {
        let before = document.clone();
        // An `Input` caret addresses the run as it reads after the edit, so only its run index
        // is checked here; `input` clamps the offset against the new text.
        let caret = match event {
            EditEvent::Input(_) => caret.filter(|caret| caret.run < document.len()),
            _ => caret.and_then(|caret| caret.clamped(document)),
        };

        let outcome = match event {
            EditEvent::Input(text) => caret.map(|caret| self.input(document, caret, text)),
            EditEvent::Space => caret.map(|caret| space_guard(document, caret)),
            EditEvent::Enter => caret.map(|caret| enter_guard(document, caret)),
            EditEvent::Backspace => caret.map(|caret| backspace_guard(document, caret)),
            EditEvent::InsertPlaceholder(name) => self.insert_placeholder(document, caret, name),
        };
        let Some(mut outcome) = outcome else {
            trace!(?event, "edit event not applied");
            return EditOutcome::default();
        };

        if let Some(caret) = guard_empty_surface(document) {
            outcome.caret = Some(caret);
            outcome.surface_reset = !before.is_sentinel();
        }
        outcome.document_changed = *document != before;
        if let Some(rule) = outcome.rule {
            debug!(?rule, caret = ?outcome.caret, "edit rule applied");
        }
        outcome
    }

    fn input(&self, document: &mut Document, caret: CaretPosition, text: &str) -> EditOutcome {
        let offset = caret.offset.min(char_len(text));
        match document.get_mut(caret.run) {
            Some(Run::Placeholder(placeholder)) => {
                if placeholder.matches_rendered(text) {
                    placeholder.set_guarded(text.starts_with(BOUNDARY_MARKER));
                    EditOutcome::resolved(CaretPosition::new(caret.run, offset))
                } else {
                    decay(document, caret.run, text, offset)
                }
            }
            Some(Run::Text(content)) => {
                text.clone_into(content);
                self.promote(document, caret.run).unwrap_or_else(|| {
                    EditOutcome::fired(EditRule::TextUpdate, CaretPosition::new(caret.run, offset))
                })
            }
            None => EditOutcome::default(),
        }
    }

    /// Materialize the first accepted name found in the text run at `index`.
    fn promote(&self, document: &mut Document, index: usize) -> Option<EditOutcome> {
        let content = document.get(index)?.as_text()?;
        let (start, name) = self.accepted.first_match_in(content)?;
        let before = &content[..start];
        let after = &content[start + name.len()..];

        let mut runs = Vec::with_capacity(3);
        if !before.is_empty() {
            runs.push(Run::text(before));
        }
        let placeholder_index = index + runs.len();
        runs.push(Run::placeholder(name));
        if !after.is_empty() {
            runs.push(Run::text(after));
        }
        document.splice(index, runs);

        Some(EditOutcome::fired(
            EditRule::Promotion,
            CaretPosition::new(placeholder_index, char_len(name)),
        ))
    }

    fn insert_placeholder(
        &self,
        document: &mut Document,
        caret: Option<CaretPosition>,
        name: &str,
    ) -> Option<EditOutcome> {
        if !self.accepted.contains(name) {
            debug!(name, "refusing to insert a placeholder outside the accepted set");
            return None;
        }
        let placeholder = Run::placeholder(name);
        let target = match caret {
            Some(caret) => CaretLocator::new(document).classify(caret),
            None => None,
        };
        let index = match target {
            Some(CaretTarget::Text { index, offset, .. }) => {
                let gap = document.split_run(index, offset);
                document.insert_before(gap, placeholder)
            }
            Some(CaretTarget::Placeholder { index, .. }) => {
                document.insert_after(index, placeholder)
            }
            None => document.push(placeholder),
        };
        let caret = CaretPosition::new(index, char_len(name));
        Some(EditOutcome::fired(EditRule::Insertion, caret).consuming())
    }
}

/// Replace the placeholder at `index` with its mutated rendered text, merging into text
/// neighbours.
fn decay(document: &mut Document, index: usize, mutated: &str, cursor: usize) -> EditOutcome {
    let left = index
        .checked_sub(1)
        .and_then(|left| document.get(left))
        .and_then(Run::as_text)
        .map(str::to_owned);
    let right = document
        .get(index + 1)
        .and_then(Run::as_text)
        .map(str::to_owned);

    let caret = match (left, right) {
        (Some(left), right) => {
            let separator = joining_separator(&left, mutated);
            let mut merged = format!("{left}{separator}{mutated}");
            let caret = char_len(&left) + separator.len() + cursor;
            let mut absorbed = 1;
            if let Some(right) = right {
                merged.push_str(joining_separator(&merged, &right));
                merged.push_str(&right);
                absorbed += 1;
            }
            document.replace(index - 1, Run::Text(merged));
            for _ in 0..absorbed {
                document.remove(index);
            }
            CaretPosition::new(index - 1, caret)
        }
        (None, Some(right)) => {
            let separator = joining_separator(mutated, &right);
            document.replace(index + 1, Run::text(format!("{mutated}{separator}{right}")));
            document.remove(index);
            CaretPosition::new(index, cursor + separator.len())
        }
        (None, None) => {
            document.replace(index, Run::text(mutated));
            CaretPosition::new(index, cursor)
        }
    };
    EditOutcome::fired(EditRule::Decay, caret)
}

fn space_guard(document: &mut Document, caret: CaretPosition) -> EditOutcome {
    match document.get(caret.run) {
        Some(Run::Placeholder(placeholder)) if caret.offset == placeholder.char_len() => {
            let guard = document.insert_after(caret.run, Run::text(guard_text()));
            EditOutcome::fired(EditRule::SpaceGuard, CaretPosition::new(guard, 1))
        }
        _ => EditOutcome::resolved(caret),
    }
}

fn enter_guard(document: &mut Document, caret: CaretPosition) -> EditOutcome {
    match document.get(caret.run) {
        Some(Run::Placeholder(_)) if caret.offset == 0 => {
            let guard = document.insert_before(caret.run, Run::text(guard_text()));
            EditOutcome::fired(EditRule::EnterGuard, CaretPosition::new(guard, 1)).consuming()
        }
        _ => EditOutcome::resolved(caret),
    }
}

fn backspace_guard(document: &mut Document, caret: CaretPosition) -> EditOutcome {
    match document.get_mut(caret.run) {
        Some(Run::Placeholder(placeholder)) if caret.offset == 1 => {
            placeholder.set_guarded(true);
            EditOutcome::fired(
                EditRule::BackspaceGuard,
                CaretPosition::new(caret.run, 2),
            )
        }
        _ => EditOutcome::resolved(caret),
    }
}

/// Reset a document without visible text to the single sentinel run.
///
/// Returns the caret to use (just after the sentinel) when the guard applies.
pub fn guard_empty_surface(document: &mut Document) -> Option<CaretPosition> {
    if !document.is_visibly_empty() {
        return None;
    }
    if !document.is_sentinel() {
        *document = Document::sentinel();
    }
    Some(CaretPosition::new(0, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::SENTINEL_MARKER;

    fn accepted() -> AcceptedSet {
        AcceptedSet::new(["Name", "X", "P"]).unwrap()
    }

    fn apply(
        runs: Vec<Run>,
        event: EditEvent,
        caret: Option<CaretPosition>,
    ) -> (Document, EditOutcome) {
        let accepted = accepted();
        let mut document = Document::from_runs(runs);
        let outcome = EditNormalizer::new(&accepted).apply(&mut document, &event, caret);
        (document, outcome)
    }

    #[test]
    fn test_decay_merges_both_neighbours() {
        let (document, outcome) = apply(
            vec![Run::text("a "), Run::placeholder("X"), Run::text(" b")],
            EditEvent::Input("Xx".into()),
            Some(CaretPosition::new(1, 2)),
        );
        assert_eq!(document.runs(), &[Run::text("a Xx b")]);
        assert_eq!(outcome.rule, Some(EditRule::Decay));
        assert_eq!(outcome.caret, Some(CaretPosition::new(0, 4)));
    }

    #[test]
    fn test_decay_inserts_separator_into_left_sibling() {
        let (document, outcome) = apply(
            vec![Run::text("a"), Run::placeholder("Name")],
            EditEvent::Input("Nme".into()),
            Some(CaretPosition::new(1, 1)),
        );
        assert_eq!(document.runs(), &[Run::text("a Nme")]);
        assert_eq!(outcome.caret, Some(CaretPosition::new(0, 3)));
    }

    #[test]
    fn test_decay_prepends_to_right_sibling() {
        let (document, outcome) = apply(
            vec![Run::placeholder("Name"), Run::text("b")],
            EditEvent::Input("Namex".into()),
            Some(CaretPosition::new(0, 5)),
        );
        assert_eq!(document.runs(), &[Run::text("Namex b")]);
        assert_eq!(outcome.caret, Some(CaretPosition::new(0, 6)));
    }

    #[test]
    fn test_decay_standalone() {
        let (document, outcome) = apply(
            vec![Run::placeholder("Name")],
            EditEvent::Input("Nam".into()),
            Some(CaretPosition::new(0, 3)),
        );
        assert_eq!(document.runs(), &[Run::text("Nam")]);
        assert_eq!(outcome.caret, Some(CaretPosition::new(0, 3)));
    }

    #[test]
    fn test_promotion_splits_around_first_match() {
        let (document, outcome) = apply(
            vec![Run::text("Hello Name there")],
            EditEvent::Input("Hello Name there".into()),
            Some(CaretPosition::new(0, 10)),
        );
        assert_eq!(
            document.runs(),
            &[
                Run::text("Hello "),
                Run::placeholder("Name"),
                Run::text(" there")
            ]
        );
        assert_eq!(outcome.rule, Some(EditRule::Promotion));
        assert_eq!(outcome.caret, Some(CaretPosition::new(1, 4)));
    }

    #[test]
    fn test_input_growing_a_text_run_keeps_caret_past_old_end() {
        let (document, outcome) = apply(
            vec![Run::text("ab")],
            EditEvent::Input("abc".into()),
            Some(CaretPosition::new(0, 3)),
        );
        assert_eq!(document.runs(), &[Run::text("abc")]);
        assert_eq!(outcome.rule, Some(EditRule::TextUpdate));
        assert_eq!(outcome.caret, Some(CaretPosition::new(0, 3)));
    }

    #[test]
    fn test_space_guard_only_at_trailing_edge() {
        let (document, outcome) = apply(
            vec![Run::placeholder("Name")],
            EditEvent::Space,
            Some(CaretPosition::new(0, 4)),
        );
        assert_eq!(
            document.runs(),
            &[Run::placeholder("Name"), Run::text(guard_text())]
        );
        assert_eq!(outcome.caret, Some(CaretPosition::new(1, 1)));
        assert!(!outcome.consumed);

        let (document, outcome) = apply(
            vec![Run::placeholder("Name")],
            EditEvent::Space,
            Some(CaretPosition::new(0, 0)),
        );
        assert_eq!(document.runs(), &[Run::placeholder("Name")]);
        assert_eq!(outcome.rule, None);
        assert!(!outcome.document_changed);
    }

    #[test]
    fn test_backspace_guard_prepends_marker() {
        let (document, outcome) = apply(
            vec![Run::placeholder("Name")],
            EditEvent::Backspace,
            Some(CaretPosition::new(0, 1)),
        );
        let placeholder = document.get(0).and_then(Run::as_placeholder).unwrap();
        assert!(placeholder.is_guarded());
        assert_eq!(placeholder.name(), "Name");
        assert_eq!(
            placeholder.rendered(),
            format!("{BOUNDARY_MARKER}Name").as_str()
        );
        assert_eq!(outcome.caret, Some(CaretPosition::new(0, 2)));
        assert!(!outcome.consumed);
    }

    #[test]
    fn test_insertion_inside_placeholder_goes_after_it() {
        let (document, outcome) = apply(
            vec![Run::placeholder("Name"), Run::text("z")],
            EditEvent::InsertPlaceholder("P".into()),
            Some(CaretPosition::new(0, 2)),
        );
        assert_eq!(
            document.runs(),
            &[
                Run::placeholder("Name"),
                Run::placeholder("P"),
                Run::text("z")
            ]
        );
        assert_eq!(outcome.caret, Some(CaretPosition::new(1, 1)));
    }

    #[test]
    fn test_insertion_without_caret_appends() {
        let (document, outcome) = apply(
            vec![Run::text("abc")],
            EditEvent::InsertPlaceholder("P".into()),
            None,
        );
        assert_eq!(document.runs(), &[Run::text("abc"), Run::placeholder("P")]);
        assert_eq!(outcome.caret, Some(CaretPosition::new(1, 1)));
    }

    #[test]
    fn test_insertion_rejects_unknown_names() {
        let (document, outcome) = apply(
            vec![Run::text("abc")],
            EditEvent::InsertPlaceholder("Nope".into()),
            Some(CaretPosition::new(0, 1)),
        );
        assert_eq!(document.runs(), &[Run::text("abc")]);
        assert!(outcome.is_noop());
    }

    #[test]
    fn test_empty_input_installs_sentinel() {
        let (document, outcome) = apply(
            vec![Run::text("a")],
            EditEvent::Input(String::new()),
            Some(CaretPosition::new(0, 0)),
        );
        assert_eq!(document.runs(), &[Run::text(SENTINEL_MARKER.to_string())]);
        assert!(outcome.surface_reset);
        assert_eq!(outcome.caret, Some(CaretPosition::new(0, 1)));
    }

    #[test]
    fn test_unresolved_caret_is_noop() {
        for event in [
            EditEvent::Input("zz".into()),
            EditEvent::Space,
            EditEvent::Enter,
            EditEvent::Backspace,
        ] {
            let runs = vec![Run::text("a "), Run::placeholder("X")];
            let (document, outcome) = apply(runs.clone(), event.clone(), None);
            assert_eq!(document.runs(), runs.as_slice());
            assert!(outcome.is_noop());

            let (document, outcome) = apply(runs.clone(), event, Some(CaretPosition::new(5, 0)));
            assert_eq!(document.runs(), runs.as_slice());
            assert!(outcome.is_noop());
        }
    }
}
