#![warn(missing_docs)]
//! Template Core - Headless Placeholder-Aware Template Editing Kernel
//!
//! # Overview
//!
//! `template-core` models one line of template text as an ordered sequence of runs: plain text
//! spans and named, atomic placeholder tokens. It parses the linear wire format
//! (`Hello [Name]`), serializes it back, and keeps the run sequence consistent while a user types,
//! deletes and inserts placeholders at an arbitrary caret.
//!
//! It does not render anything. A host projects the runs onto its own editing surface through
//! the [`ViewAdapter`] contract and reports the caret back as an opaque [`CaretAnchor`].
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Session (TemplateSession)                  │  ← Public API, change notifications
//! ├─────────────────────────────────────────────┤
//! │  View/Render Adapter contract               │  ← Host projection
//! ├─────────────────────────────────────────────┤
//! │  Edit Normalizer                            │  ← Decay / promotion / guards
//! ├─────────────────────────────────────────────┤
//! │  Caret Locator                              │  ← Anchor → (run, offset)
//! ├─────────────────────────────────────────────┤
//! │  Document Model (runs)                      │  ← Source of truth
//! ├─────────────────────────────────────────────┤
//! │  Tokenizer                                  │  ← Wire format ⇄ runs
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use template_core::{AcceptedSet, Run, parse, serialize};
//!
//! let accepted = AcceptedSet::new(["Name", "Company"]).unwrap();
//! let document = parse("Dear [Name],  welcome to [Company]. [Unknown]", &accepted);
//!
//! assert_eq!(document.runs()[1], Run::placeholder("Name"));
//! assert_eq!(serialize(&document), "Dear [Name], welcome to [Company].");
//! ```
//!
//! ## Using a Session
//!
//! ```rust
//! use template_core::{AcceptedSet, CaretPosition, TemplateSession};
//!
//! let accepted = AcceptedSet::new(["Name"]).unwrap();
//! let mut session = TemplateSession::with_accepted(accepted, "abcdef");
//!
//! session.subscribe(|change| {
//!     println!("v{} -> {:?}", change.new_version, change.value);
//! });
//!
//! session.set_caret(CaretPosition::new(0, 3));
//! session.insert_placeholder("Name");
//! assert_eq!(session.value(), "abc[Name]def");
//! ```
//!
//! # Module Description
//!
//! - [`run`] - Run variants and the zero-width markers
//! - [`document`] - Owned run sequence and its structural mutations
//! - [`tokenizer`] - Wire-format parsing and serialization
//! - [`caret`] - Caret positions, view anchors and the locator
//! - [`normalizer`] - Edit event state machine
//! - [`view`] - View/Render Adapter contract and projections
//! - [`session`] - Editing session and change notifications
//! - [`config`] - Accepted names, delimiters and session configuration

pub mod caret;
pub mod config;
pub mod document;
pub mod normalizer;
pub mod run;
pub mod session;
mod text;
pub mod tokenizer;
pub mod view;

pub use caret::{AnchorNode, CaretAnchor, CaretLocator, CaretPosition, CaretTarget};
pub use config::{AcceptedSet, ConfigError, Delimiters, SessionConfig};
pub use document::Document;
pub use normalizer::{EditEvent, EditNormalizer, EditOutcome, EditRule, guard_empty_surface};
pub use run::{BOUNDARY_MARKER, Placeholder, Run, SENTINEL_MARKER};
pub use session::{ChangeKind, TemplateChange, TemplateChangeCallback, TemplateSession};
pub use tokenizer::{Tokenizer, normalize_whitespace, parse, serialize};
pub use view::{HeadlessHandle, HeadlessView, SpanKind, ViewAdapter, ViewSnapshot, ViewSpan};
