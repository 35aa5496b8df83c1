//! Session configuration: accepted placeholder names, delimiters and the initial template.
//!
//! This is the only fallible surface of the crate. Everything downstream of a validated
//! [`SessionConfig`] is total.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while building a session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("placeholder names must not be empty")]
    /// An accepted placeholder name was the empty string.
    EmptyName,

    #[error("duplicate placeholder name '{0}'")]
    /// The same name appeared twice in the accepted set.
    DuplicateName(String),

    #[error("placeholder name '{name}' contains the delimiter '{delimiter}'")]
    /// A name contains a delimiter and could never be written in wire format.
    NameContainsDelimiter {
        /// Offending name.
        name: String,
        /// Delimiter found inside the name.
        delimiter: char,
    },

    #[error("open and close delimiters must differ (both are '{0}')")]
    /// Open and close delimiters are the same character.
    SameDelimiters(char),

    #[error("delimiter {0:?} is not allowed")]
    /// A delimiter is whitespace or one of the engine's zero-width markers.
    InvalidDelimiter(char),

    #[error("delimiter pattern error: {0}")]
    /// The tokenizer pattern failed to compile.
    Pattern(#[from] regex::Error),

    #[error("JSON parse error: {0}")]
    /// Configuration JSON could not be decoded.
    Json(#[from] serde_json::Error),
}

/// The pair of reserved characters marking a placeholder in the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    /// Opening delimiter.
    pub open: char,
    /// Closing delimiter.
    pub close: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            open: '[',
            close: ']',
        }
    }
}

impl Delimiters {
    /// Create a delimiter pair.
    pub fn new(open: char, close: char) -> Self {
        Self { open, close }
    }

    /// Check that the pair can be used by the tokenizer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for c in [self.open, self.close] {
            if c.is_whitespace() || crate::run::is_marker(c) {
                return Err(ConfigError::InvalidDelimiter(c));
            }
        }
        if self.open == self.close {
            return Err(ConfigError::SameDelimiters(self.open));
        }
        Ok(())
    }

    /// Returns `true` if `c` is one of the two delimiters.
    pub fn is_delimiter(&self, c: char) -> bool {
        c == self.open || c == self.close
    }

    /// Wrap `name` in the delimiters.
    pub fn wrap(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 2);
        out.push(self.open);
        out.push_str(name);
        out.push(self.close);
        out
    }
}

/// Ordered, distinct, non-empty placeholder names valid for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct AcceptedSet {
    names: Vec<String>,
}

impl AcceptedSet {
    /// Build a set, rejecting empty and duplicate names.
    pub fn new<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if name.is_empty() {
                return Err(ConfigError::EmptyName);
            }
            if out.contains(&name) {
                return Err(ConfigError::DuplicateName(name));
            }
            out.push(name);
        }
        Ok(Self { names: out })
    }

    /// Returns `true` if `name` is accepted.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Iterate names in their configured order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no names are accepted.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name at position `index` in configured order.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Earliest occurrence of any accepted name inside `text`.
    ///
    /// Returns the byte offset of the match and the matched name. When several names match at
    /// the same offset, the one configured first wins.
    pub fn first_match_in<'a>(&'a self, text: &str) -> Option<(usize, &'a str)> {
        self.names
            .iter()
            .filter_map(|name| text.find(name.as_str()).map(|pos| (pos, name.as_str())))
            .min_by_key(|&(pos, _)| pos)
    }
}

impl TryFrom<Vec<String>> for AcceptedSet {
    type Error = ConfigError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<AcceptedSet> for Vec<String> {
    fn from(set: AcceptedSet) -> Self {
        set.names
    }
}

/// Everything needed to open an editing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Names valid for this session.
    pub accepted_placeholders: AcceptedSet,
    /// Template parsed once at session start.
    #[serde(default)]
    pub initial_template: String,
    /// Wire-format delimiters.
    #[serde(default)]
    pub delimiters: Delimiters,
}

impl SessionConfig {
    /// Create a config with the default delimiters.
    pub fn new(accepted_placeholders: AcceptedSet, initial_template: impl Into<String>) -> Self {
        Self {
            accepted_placeholders,
            initial_template: initial_template.into(),
            delimiters: Delimiters::default(),
        }
    }

    /// Override the delimiters.
    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// Decode and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delimiters.validate()?;
        for name in self.accepted_placeholders.iter() {
            if let Some(delimiter) = name.chars().find(|&c| self.delimiters.is_delimiter(c)) {
                return Err(ConfigError::NameContainsDelimiter {
                    name: name.to_string(),
                    delimiter,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_set_rejects_empty_and_duplicates() {
        assert!(matches!(
            AcceptedSet::new(["a", ""]),
            Err(ConfigError::EmptyName)
        ));
        assert!(matches!(
            AcceptedSet::new(["a", "b", "a"]),
            Err(ConfigError::DuplicateName(name)) if name == "a"
        ));
        let set = AcceptedSet::new(["b", "a"]).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), ["b", "a"]);
    }

    #[test]
    fn test_first_match_prefers_earliest_then_configured_order() {
        let set = AcceptedSet::new(["Name", "First", "First Name"]).unwrap();
        assert_eq!(set.first_match_in("my First Name"), Some((3, "First")));
        assert_eq!(set.first_match_in("Name and First"), Some((0, "Name")));
        assert_eq!(set.first_match_in("nothing"), None);
    }

    #[test]
    fn test_config_from_json() {
        let config = SessionConfig::from_json(
            r#"{"acceptedPlaceholders": ["Company Name", "Agent Name"], "initialTemplate": "Hi [Agent Name]"}"#,
        )
        .unwrap();
        assert_eq!(config.accepted_placeholders.len(), 2);
        assert_eq!(config.initial_template, "Hi [Agent Name]");
        assert_eq!(config.delimiters, Delimiters::default());
    }

    #[test]
    fn test_config_rejects_bad_input() {
        assert!(matches!(
            SessionConfig::from_json(r#"{"acceptedPlaceholders": ["a", "a"]}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            SessionConfig::from_json(r#"{"acceptedPlaceholders": ["a[b"]}"#),
            Err(ConfigError::NameContainsDelimiter { delimiter: '[', .. })
        ));
        assert!(matches!(
            SessionConfig::from_json(
                r#"{"acceptedPlaceholders": [], "delimiters": {"open": "|", "close": "|"}}"#
            ),
            Err(ConfigError::SameDelimiters('|'))
        ));
        assert!(matches!(
            Delimiters::new(' ', ']').validate(),
            Err(ConfigError::InvalidDelimiter(' '))
        ));
    }
}
