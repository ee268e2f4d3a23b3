//! Placeholder substitution for payload text
//!
//! Placeholders look like `{{TOKEN}}`. Text is scanned left to right for
//! non-overlapping spans; each inner token is looked up verbatim
//! (case-sensitive, no trimming). A single missing token fails the whole
//! resolution, and substituted values are never scanned again.

use std::collections::HashMap;

use thiserror::Error;

/// Mapping from placeholder token to its replacement
pub type Substitutions = HashMap<String, String>;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Template resolution errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A placeholder token has no substitution
    #[error("no substitution for placeholder '{{{{{token}}}}}' at byte {offset}")]
    Unresolved {
        /// Token between the braces
        token: String,
        /// Byte offset of the opening braces
        offset: usize,
    },

    /// An opening `{{` is never closed
    #[error("unterminated placeholder at byte {offset}")]
    Unterminated {
        /// Byte offset of the opening braces
        offset: usize,
    },
}

impl TemplateError {
    /// Token that could not be resolved, if any
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Unresolved { token, .. } => Some(token),
            Self::Unterminated { .. } => None,
        }
    }
}

/// A placeholder span found in text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span<'a> {
    /// Byte offset of `{{`
    start: usize,
    /// Byte offset just past `}}`
    end: usize,
    token: &'a str,
}

/// Iterates placeholder spans left to right
struct Spans<'a> {
    text: &'a str,
    cursor: usize,
}

impl<'a> Iterator for Spans<'a> {
    type Item = Result<Span<'a>, TemplateError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.text[self.cursor..];
        let start = self.cursor + rest.find(OPEN)?;
        let inner_start = start + OPEN.len();

        match self.text[inner_start..].find(CLOSE) {
            Some(len) => {
                let end = inner_start + len + CLOSE.len();
                self.cursor = end;
                Some(Ok(Span {
                    start,
                    end,
                    token: &self.text[inner_start..inner_start + len],
                }))
            }
            None => {
                self.cursor = self.text.len();
                Some(Err(TemplateError::Unterminated { offset: start }))
            }
        }
    }
}

fn spans(text: &str) -> Spans<'_> {
    Spans { text, cursor: 0 }
}

/// Substitute every placeholder in `text`.
///
/// ```
/// use scene_compose::template::{resolve, Substitutions};
///
/// let subs: Substitutions = [("NAME".to_string(), "Boat1".to_string())].into_iter().collect();
/// assert_eq!(resolve("name: \"{{NAME}}\"", &subs).unwrap(), "name: \"Boat1\"");
/// assert!(resolve("{{MISSING}}", &Substitutions::new()).is_err());
/// ```
pub fn resolve(text: &str, substitutions: &Substitutions) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;

    for span in spans(text) {
        let span = span?;
        let value = substitutions.get(span.token).ok_or_else(|| TemplateError::Unresolved {
            token: span.token.to_string(),
            offset: span.start,
        })?;

        out.push_str(&text[copied..span.start]);
        out.push_str(value);
        copied = span.end;
    }

    out.push_str(&text[copied..]);
    Ok(out)
}

/// List the tokens `text` requires, in order of appearance (duplicates kept)
pub fn placeholders(text: &str) -> Result<Vec<&str>, TemplateError> {
    spans(text).map(|span| span.map(|s| s.token)).collect()
}

/// Whether `text` contains anything that looks like a placeholder opening
pub fn contains_placeholder(text: &str) -> bool {
    text.contains(OPEN)
}
