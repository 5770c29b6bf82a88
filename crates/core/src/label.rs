use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid label (expected '//package:name'): {0}")]
pub struct LabelParseError(String);

/// Unique identifier for one build target, e.g. `//java/com/app:lib`.
///
/// Labels are interned behind an `Arc<str>` so they can be cloned freely
/// across the graph, cache and sync layers without copying the string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(Arc<str>);

impl Label {
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self(label.into())
    }

    /// Parse a label string, requiring the `//package:name` shape.
    pub fn parse(label: &str) -> Result<Self, LabelParseError> {
        let Some(rest) = label.strip_prefix("//") else {
            return Err(LabelParseError(label.to_string()));
        };
        let (package, name) = match rest.split_once(':') {
            Some((package, name)) => (package, name),
            // `//foo/bar` is shorthand for `//foo/bar:bar`
            None => (rest, rest.rsplit('/').next().unwrap_or(rest)),
        };
        if name.is_empty() || package.starts_with('/') {
            return Err(LabelParseError(label.to_string()));
        }
        Ok(Self(label.into()))
    }

    /// The package part, without the leading `//`.
    pub fn package(&self) -> &str {
        let rest = self.0.strip_prefix("//").unwrap_or(&self.0);
        rest.split_once(':').map(|(pkg, _)| pkg).unwrap_or(rest)
    }

    /// The target name part.
    pub fn name(&self) -> &str {
        match self.0.split_once(':') {
            Some((_, name)) => name,
            None => self.0.rsplit('/').next().unwrap_or(&self.0),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}
