use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ModelError, ModelResult};

/// URI of a resource repository, e.g. `mvn:org.acme/features/1.0/xml/features`
///
/// Shared list membership compares the raw string exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryRef(String);

impl RepositoryRef {
    /// Validate `scheme:rest`: scheme starts with a letter and continues with
    /// letters, digits, `+`, `-` or `.`; rest is non-empty; no whitespace.
    pub fn parse(uri: &str) -> ModelResult<Self> {
        let malformed = || ModelError::MalformedUri(uri.to_string());

        if uri.chars().any(char::is_whitespace) {
            return Err(malformed());
        }
        let (scheme, rest) = uri.split_once(':').ok_or_else(malformed)?;
        let mut chars = scheme.chars();
        let leading_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        let scheme_ok = leading_alpha
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !scheme_ok || rest.is_empty() {
            return Err(malformed());
        }
        Ok(Self(uri.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepositoryRef {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RepositoryRef> for String {
    fn from(value: RepositoryRef) -> Self {
        value.0
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
