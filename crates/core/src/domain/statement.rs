// Statement - a single executable SQL command

use std::fmt;

/// Number of characters kept by [`Statement::preview`] for log context
pub const STATEMENT_PREVIEW_CHARS: usize = 100;

/// One trimmed, non-empty SQL command produced by the splitter
///
/// Never carries the terminating semicolon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement(String);

impl Statement {
    /// Build a statement from raw text, trimming surrounding whitespace
    ///
    /// Returns `None` if nothing is left after trimming.
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Truncated form for log lines (first 100 characters, `...` when cut)
    pub fn preview(&self) -> String {
        let mut chars = self.0.chars();
        let head: String = chars.by_ref().take(STATEMENT_PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Statement {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Statement {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Statement {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
