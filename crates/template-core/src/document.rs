//! Document model: the owned run sequence.
//!
//! All structural mutations are total. Out-of-range indices clamp to the sequence bounds for
//! insertions and are ignored for replacements and removals.

use crate::run::{Run, SENTINEL_MARKER, is_marker};

/// An ordered sequence of [`Run`]s representing one template line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Document {
    runs: Vec<Run>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from an existing run sequence.
    pub fn from_runs(runs: Vec<Run>) -> Self {
        Self { runs }
    }

    /// Create the single-run document shown on an empty surface.
    pub fn sentinel() -> Self {
        Self::from_runs(vec![Run::text(SENTINEL_MARKER.to_string())])
    }

    /// Read access to the run sequence.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Number of runs.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Returns `true` if the document holds no runs.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Run at `index`.
    pub fn get(&self, index: usize) -> Option<&Run> {
        self.runs.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Run> {
        self.runs.get_mut(index)
    }

    /// Insert `run` before the run at `index`. Returns the index the run landed at.
    pub fn insert_before(&mut self, index: usize, run: Run) -> usize {
        let index = index.min(self.runs.len());
        self.runs.insert(index, run);
        index
    }

    /// Insert `run` after the run at `index`. Returns the index the run landed at.
    pub fn insert_after(&mut self, index: usize, run: Run) -> usize {
        let index = index.saturating_add(1).min(self.runs.len());
        self.runs.insert(index, run);
        index
    }

    /// Append `run`. Returns its index.
    pub fn push(&mut self, run: Run) -> usize {
        self.runs.push(run);
        self.runs.len() - 1
    }

    /// Replace the run at `index`, returning the previous run.
    pub fn replace(&mut self, index: usize, run: Run) -> Option<Run> {
        let slot = self.runs.get_mut(index)?;
        Some(std::mem::replace(slot, run))
    }

    /// Remove the run at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Run> {
        (index < self.runs.len()).then(|| self.runs.remove(index))
    }

    /// Replace the run at `index` with the given runs (possibly none).
    pub(crate) fn splice(&mut self, index: usize, runs: impl IntoIterator<Item = Run>) {
        if index < self.runs.len() {
            self.runs.splice(index..=index, runs);
        }
    }

    /// Split the text run at `index` at char `offset`, omitting empty pieces.
    ///
    /// Returns the gap index: the position where a run inserted with
    /// [`insert_before`](Self::insert_before) lands between the two pieces. Placeholder runs are
    /// never split; the gap is then before (offset 0) or after the placeholder. An out-of-range
    /// `index` leaves the document untouched and returns its length.
    pub fn split_run(&mut self, index: usize, offset: usize) -> usize {
        let Some(run) = self.runs.get(index) else {
            return self.runs.len();
        };
        if run.is_placeholder() {
            return if offset == 0 { index } else { index + 1 };
        }

        let (before, after) = run.split_at(offset);
        let gap = index + usize::from(before.is_some());
        self.splice(index, before.into_iter().chain(after));
        gap
    }

    /// Remove all runs.
    pub fn clear(&mut self) {
        self.runs.clear();
    }

    /// Combined rendered text with the engine's zero-width markers removed.
    pub fn visible_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            out.extend(run.rendered().chars().filter(|&c| !is_marker(c)));
        }
        out
    }

    /// Returns `true` if no run contributes a visible character (including the zero-run case).
    pub fn is_visibly_empty(&self) -> bool {
        self.runs.iter().all(Run::is_visibly_empty)
    }

    /// Returns `true` if this document is exactly the empty-surface sentinel.
    pub fn is_sentinel(&self) -> bool {
        match self.runs.as_slice() {
            [Run::Text(content)] => content.chars().eq(std::iter::once(SENTINEL_MARKER)),
            _ => false,
        }
    }

    /// Names of all placeholders, in order.
    pub fn placeholder_names(&self) -> impl Iterator<Item = &str> {
        self.runs
            .iter()
            .filter_map(Run::as_placeholder)
            .map(|placeholder| placeholder.name())
    }
}

impl From<Vec<Run>> for Document {
    fn from(runs: Vec<Run>) -> Self {
        Self::from_runs(runs)
    }
}
