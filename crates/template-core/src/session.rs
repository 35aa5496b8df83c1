//! Editing session: one document, one caret, one accepted set.
//!
//! # Overview
//!
//! [`TemplateSession`] owns the source-of-truth [`Document`] for one editing session and routes
//! every edit through the [`EditNormalizer`]. It also tracks a version number and notifies
//! subscribers with the serialized value on every content-affecting mutation.
//!
//! Hosts with a native editing surface report edits with [`handle`](TemplateSession::handle)
//! (or [`dispatch_via`](TemplateSession::dispatch_via) for the full view round trip). Hosts
//! without one (terminals, tests) use the keyboard helpers such as
//! [`type_char`](TemplateSession::type_char) and [`backspace`](TemplateSession::backspace), which
//! perform the native edit on the caret's run themselves and then report it as `Input`.
//!
//! # Example
//!
//! ```rust
//! use template_core::{AcceptedSet, TemplateSession};
//!
//! let accepted = AcceptedSet::new(["Name"]).unwrap();
//! let mut session = TemplateSession::with_accepted(accepted, "Hello ");
//!
//! session.type_text("Name rocks");
//! assert_eq!(session.value(), "Hello [Name] rocks");
//! ```

use crate::caret::{CaretAnchor, CaretLocator, CaretPosition};
use crate::config::{AcceptedSet, ConfigError, SessionConfig};
use crate::document::Document;
use crate::normalizer::{EditEvent, EditNormalizer, EditOutcome, guard_empty_surface};
use crate::run::Run;
use crate::text::{char_len, insert_at_char, remove_char_before};
use crate::tokenizer::Tokenizer;
use crate::view::ViewAdapter;
use tracing::debug;

/// Change type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Run sequence modified
    DocumentModified,
    /// Caret moved without a content change
    CaretMoved,
}

/// Change record delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateChange {
    /// Change type
    pub kind: ChangeKind,
    /// Old version number
    pub old_version: u64,
    /// New version number
    pub new_version: u64,
    /// Serialized template after the change (document changes only).
    pub value: Option<String>,
}

/// Change callback function type
pub type TemplateChangeCallback = Box<dyn FnMut(&TemplateChange) + Send>;

/// A single editing session over one template line.
pub struct TemplateSession {
    accepted: AcceptedSet,
    tokenizer: Tokenizer,
    document: Document,
    caret: Option<CaretPosition>,
    /// Last selection reported by the view; target of explicit placeholder insertion.
    saved_caret: Option<CaretPosition>,
    version: u64,
    callbacks: Vec<TemplateChangeCallback>,
}

impl TemplateSession {
    /// Open a session from a validated configuration.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let tokenizer = Tokenizer::new(config.delimiters)?;
        let mut session = Self::from_parts(config.accepted_placeholders, tokenizer);
        session.load(&config.initial_template);
        Ok(session)
    }

    /// Open a session with the default delimiters.
    pub fn with_accepted(accepted: AcceptedSet, template: &str) -> Self {
        let mut session = Self::from_parts(accepted, Tokenizer::default());
        session.load(template);
        session
    }

    fn from_parts(accepted: AcceptedSet, tokenizer: Tokenizer) -> Self {
        Self {
            accepted,
            tokenizer,
            document: Document::sentinel(),
            caret: None,
            saved_caret: None,
            version: 0,
            callbacks: Vec::new(),
        }
    }

    fn load(&mut self, template: &str) {
        self.document = self.tokenizer.parse(template, &self.accepted);
        guard_empty_surface(&mut self.document);
        self.caret = CaretPosition::end_of(&self.document);
        self.saved_caret = None;
    }

    /// The current document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Current caret.
    pub fn caret(&self) -> Option<CaretPosition> {
        self.caret
    }

    /// Caret saved for the next explicit placeholder insertion.
    pub fn saved_caret(&self) -> Option<CaretPosition> {
        self.saved_caret
    }

    /// Session accepted set.
    pub fn accepted(&self) -> &AcceptedSet {
        &self.accepted
    }

    /// Session tokenizer.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Version number, incremented on every observable change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Serialized template value.
    pub fn value(&self) -> String {
        self.tokenizer.serialize(&self.document)
    }

    /// Replace the whole document with a newly parsed template.
    pub fn set_value(&mut self, template: &str) {
        let before = self.document.clone();
        self.load(template);
        if self.document != before {
            self.notify(ChangeKind::DocumentModified);
        }
    }

    /// Subscribe to changes.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&TemplateChange) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Resolve a view anchor against the current document.
    pub fn locate(&self, anchor: &CaretAnchor) -> Option<CaretPosition> {
        CaretLocator::new(&self.document).locate(anchor)
    }

    /// Apply `event` at the caret described by `anchor`.
    pub fn handle(&mut self, event: EditEvent, anchor: Option<&CaretAnchor>) -> EditOutcome {
        let locator = CaretLocator::new(&self.document);
        let caret = anchor.and_then(|anchor| match &event {
            EditEvent::Input(edited) => locator.locate_edited(anchor, edited),
            _ => locator.locate(anchor),
        });
        self.apply(event, caret)
    }

    /// Apply `event` at the session's own caret.
    pub fn dispatch(&mut self, event: EditEvent) -> EditOutcome {
        self.apply(event, self.caret)
    }

    /// Full view round trip: read the caret from `view`, apply `event`, re-render and
    /// re-anchor the caret. Returns the outcome and the handle of the new projection.
    pub fn dispatch_via<V: ViewAdapter>(
        &mut self,
        view: &mut V,
        handle: &V::Handle,
        event: EditEvent,
    ) -> (EditOutcome, V::Handle) {
        let anchor = view.current_caret(handle);
        let outcome = self.handle(event, anchor.as_ref());
        let handle = view.render(&self.document);
        if let Some(caret) = outcome.caret {
            view.set_caret(&handle, caret);
        }
        (outcome, handle)
    }

    /// Render the current document into `view` and anchor the session caret there.
    pub fn render_into<V: ViewAdapter>(&self, view: &mut V) -> V::Handle {
        let handle = view.render(&self.document);
        if let Some(caret) = self.caret {
            view.set_caret(&handle, caret);
        }
        handle
    }

    /// Move the caret. Returns `false` if `caret` does not address a run.
    pub fn set_caret(&mut self, caret: CaretPosition) -> bool {
        let Some(caret) = caret.clamped(&self.document) else {
            return false;
        };
        self.saved_caret = Some(caret);
        if self.caret != Some(caret) {
            self.caret = Some(caret);
            self.notify(ChangeKind::CaretMoved);
        }
        true
    }

    /// Remember the view's selection for the next [`insert_placeholder`](Self::insert_placeholder).
    pub fn save_caret(&mut self, anchor: Option<&CaretAnchor>) {
        self.saved_caret = anchor.and_then(|anchor| self.locate(anchor));
    }

    /// Insert `name` at the saved caret, or append it when no caret was saved.
    pub fn insert_placeholder(&mut self, name: &str) -> EditOutcome {
        self.apply(EditEvent::InsertPlaceholder(name.to_string()), self.saved_caret)
    }

    /// Type one character at the caret.
    ///
    /// A space first raises [`EditEvent::Space`]; the native insertion follows unless the event
    /// was consumed.
    pub fn type_char(&mut self, c: char) -> EditOutcome {
        if c == ' ' {
            let outcome = self.dispatch(EditEvent::Space);
            if outcome.consumed {
                return outcome;
            }
        }
        let mut buf = [0u8; 4];
        self.native_insert(c.encode_utf8(&mut buf))
    }

    /// Type `text` one character at a time. Returns the outcome of the last keystroke.
    pub fn type_text(&mut self, text: &str) -> EditOutcome {
        text.chars()
            .fold(EditOutcome::default(), |_, c| self.type_char(c))
    }

    /// Press Enter. The surface is a single line, so only the placeholder guard can apply.
    pub fn enter(&mut self) -> EditOutcome {
        self.dispatch(EditEvent::Enter)
    }

    /// Delete the character before the caret.
    pub fn backspace(&mut self) -> EditOutcome {
        let guard = self.dispatch(EditEvent::Backspace);
        let Some(caret) = self.current_caret() else {
            return guard;
        };
        let target = if caret.offset > 0 {
            caret
        } else if let Some(previous) = caret.run.checked_sub(1) {
            let len = self.document.get(previous).map_or(0, Run::char_len);
            CaretPosition::new(previous, len)
        } else {
            return guard;
        };

        let rendered = self.rendered(target.run);
        let Some(updated) = remove_char_before(&rendered, target.offset) else {
            return guard;
        };
        let caret = CaretPosition::new(target.run, target.offset - 1);
        self.apply(EditEvent::Input(updated), Some(caret))
    }

    /// Move the caret one step left; placeholders are crossed in one step.
    pub fn move_left(&mut self) -> bool {
        let Some(caret) = self.current_caret() else {
            return false;
        };
        let next = match self.document.get(caret.run) {
            Some(Run::Placeholder(_)) if caret.offset > 0 => CaretPosition::new(caret.run, 0),
            Some(_) if caret.offset > 0 => CaretPosition::new(caret.run, caret.offset - 1),
            _ => match caret.run.checked_sub(1).and_then(|run| {
                self.document.get(run).map(|previous| (run, previous))
            }) {
                Some((run, Run::Placeholder(_))) => CaretPosition::new(run, 0),
                Some((run, previous)) => {
                    CaretPosition::new(run, previous.char_len().saturating_sub(1))
                }
                None => return false,
            },
        };
        self.set_caret(next)
    }

    /// Move the caret one step right; placeholders are crossed in one step.
    pub fn move_right(&mut self) -> bool {
        let Some(caret) = self.current_caret() else {
            return false;
        };
        let next = match self.document.get(caret.run) {
            Some(Run::Placeholder(placeholder)) if caret.offset < placeholder.char_len() => {
                CaretPosition::new(caret.run, placeholder.char_len())
            }
            Some(run) if caret.offset < run.char_len() => {
                CaretPosition::new(caret.run, caret.offset + 1)
            }
            _ => match self.document.get(caret.run + 1) {
                Some(Run::Placeholder(placeholder)) => {
                    CaretPosition::new(caret.run + 1, placeholder.char_len())
                }
                Some(next) => CaretPosition::new(caret.run + 1, next.char_len().min(1)),
                None => return false,
            },
        };
        self.set_caret(next)
    }

    /// Move the caret to the start of the line.
    pub fn move_home(&mut self) -> bool {
        !self.document.is_empty() && self.set_caret(CaretPosition::new(0, 0))
    }

    /// Move the caret to the end of the line.
    pub fn move_end(&mut self) -> bool {
        CaretPosition::end_of(&self.document).is_some_and(|end| self.set_caret(end))
    }

    fn current_caret(&self) -> Option<CaretPosition> {
        self.caret.and_then(|caret| caret.clamped(&self.document))
    }

    fn rendered(&self, run: usize) -> String {
        self.document
            .get(run)
            .map(|run| run.rendered().into_owned())
            .unwrap_or_default()
    }

    /// Perform the surface's native insertion at the caret, then report it as `Input`.
    fn native_insert(&mut self, text: &str) -> EditOutcome {
        let Some(caret) = self.current_caret() else {
            return EditOutcome::default();
        };
        let updated = insert_at_char(&self.rendered(caret.run), caret.offset, text);
        let caret = CaretPosition::new(caret.run, caret.offset + char_len(text));
        self.apply(EditEvent::Input(updated), Some(caret))
    }

    fn apply(&mut self, event: EditEvent, caret: Option<CaretPosition>) -> EditOutcome {
        let outcome =
            EditNormalizer::new(&self.accepted).apply(&mut self.document, &event, caret);

        let caret_changed = outcome.caret.is_some_and(|caret| self.caret != Some(caret));
        if let Some(caret) = outcome.caret {
            self.caret = Some(caret);
            self.saved_caret = Some(caret);
        }

        if outcome.document_changed {
            self.notify(ChangeKind::DocumentModified);
        } else if caret_changed {
            self.notify(ChangeKind::CaretMoved);
        }
        outcome
    }

    fn notify(&mut self, kind: ChangeKind) {
        let old_version = self.version;
        self.version += 1;
        let value = matches!(kind, ChangeKind::DocumentModified).then(|| self.value());
        debug!(?kind, version = self.version, "template session changed");

        let change = TemplateChange {
            kind,
            old_version,
            new_version: self.version,
            value,
        };
        for callback in &mut self.callbacks {
            callback(&change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(template: &str) -> TemplateSession {
        let accepted = AcceptedSet::new(["Name", "Company"]).unwrap();
        TemplateSession::with_accepted(accepted, template)
    }

    #[test]
    fn test_new_session_places_caret_at_end() {
        let session = session("Hi [Name]");
        assert_eq!(session.caret(), Some(CaretPosition::new(1, 4)));
        assert_eq!(session.version(), 0);
        assert_eq!(session.saved_caret(), None);
    }

    #[test]
    fn test_empty_template_gets_sentinel() {
        let session = session("");
        assert!(session.document().is_sentinel());
        assert_eq!(session.caret(), Some(CaretPosition::new(0, 1)));
        assert_eq!(session.value(), "");
    }

    #[test]
    fn test_config_errors_surface_from_new() {
        let config = SessionConfig::new(AcceptedSet::new(["a]b"]).unwrap(), "");
        assert!(matches!(
            TemplateSession::new(config),
            Err(ConfigError::NameContainsDelimiter { .. })
        ));
    }

    #[test]
    fn test_caret_moves_cross_placeholders_atomically() {
        let mut session = session("a[Name]b");
        assert!(session.move_home());
        assert!(session.move_right());
        assert_eq!(session.caret(), Some(CaretPosition::new(0, 1)));
        assert!(session.move_right());
        assert_eq!(session.caret(), Some(CaretPosition::new(1, 4)));
        assert!(session.move_right());
        assert_eq!(session.caret(), Some(CaretPosition::new(2, 1)));
        assert!(!session.move_right());

        assert!(session.move_left());
        assert_eq!(session.caret(), Some(CaretPosition::new(2, 0)));
        assert!(session.move_left());
        assert_eq!(session.caret(), Some(CaretPosition::new(1, 0)));
        assert!(session.move_left());
        assert_eq!(session.caret(), Some(CaretPosition::new(0, 0)));
        assert!(!session.move_left());
    }
}
