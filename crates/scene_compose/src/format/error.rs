//! Structural errors raised while reading the text format

use thiserror::Error;

/// A malformed descriptor: bad token, unknown field, wrong value type or
/// unbalanced structure. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}, column {column}: {kind}")]
pub struct ParseError {
    /// Line of the offending token
    pub line: usize,
    /// Column of the offending token
    pub column: usize,
    /// What went wrong
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Create a parse error at a position
    pub fn new(line: usize, column: usize, kind: ParseErrorKind) -> Self {
        Self { line, column, kind }
    }
}

/// Parse error categories
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    /// A character that starts no token
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    /// String literal without a closing quote on the same line
    #[error("unterminated string literal")]
    UnterminatedString,

    /// Unsupported backslash escape
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),

    /// A token other than the one the grammar requires
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        /// What the grammar wanted
        expected: String,
        /// What was there instead
        found: String,
    },

    /// A field name not defined for this block
    #[error("unknown field '{field}' in {context}")]
    UnknownField {
        /// Field name as written
        field: String,
        /// Block path, e.g. `embedded_components[0]`
        context: String,
    },

    /// A singular field given twice in one block
    #[error("field '{field}' given more than once in {context}")]
    DuplicateField {
        /// Field name
        field: String,
        /// Block path
        context: String,
    },

    /// A required field absent from its block
    #[error("missing required field '{field}' in {context}")]
    MissingField {
        /// Field name
        field: String,
        /// Block path
        context: String,
    },

    /// A numeric lexeme that is not a finite number of the expected type
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// An identifier outside the allowed set of enum values
    #[error("invalid value '{value}' for '{field}'")]
    InvalidValue {
        /// Field name
        field: String,
        /// Value as written
        value: String,
    },
}
