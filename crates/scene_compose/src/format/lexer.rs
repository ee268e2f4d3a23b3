//! Tokenizer for the descriptor text format
//!
//! The format is the engine's protobuf-style text layout: `name: value`
//! scalars, `name { ... }` blocks, double-quoted strings with C escapes and
//! `#` line comments. Both the outer descriptor and embedded payloads are
//! tokenized here.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use super::error::{ParseError, ParseErrorKind};

/// Lexical token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Field names, booleans and enum values
    Ident(String),
    /// Unescaped string literal contents
    Str(String),
    /// Numeric lexeme, parsed by whoever knows the expected type
    Number(String),
    Colon,
    LBrace,
    RBrace,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "identifier '{s}'"),
            Token::Str(_) => f.write_str("string literal"),
            Token::Number(n) => write!(f, "number '{n}'"),
            Token::Colon => f.write_str("':'"),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// A token with the 1-based position of its first character
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

/// Character lexer with line and column tracking
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Lexer over `src`; a leading byte order mark is skipped
    pub fn new(src: &'a str) -> Self {
        let src = src.strip_prefix('\u{feff}').unwrap_or(src);
        Self {
            chars: src.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while matches!(self.peek(), Some(c) if c != '\n') {
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn error(&self, line: usize, column: usize, kind: ParseErrorKind) -> ParseError {
        ParseError::new(line, column, kind)
    }

    /// Next token, `Token::Eof` once input is exhausted
    pub fn next_token(&mut self) -> Result<Spanned, ParseError> {
        self.skip_trivia();

        let (line, column) = (self.line, self.column);
        let spanned = |token| Spanned { token, line, column };

        let c = match self.bump() {
            Some(c) => c,
            None => return Ok(spanned(Token::Eof)),
        };

        let token = match c {
            ':' => Token::Colon,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '"' | '\'' => Token::Str(self.string_body(c, line, column)?),
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => Token::Number(self.number_body(c)),
            c if c.is_alphabetic() || c == '_' => {
                let mut s = String::from(c);
                while let Some(p) = self.peek() {
                    if p.is_alphanumeric() || p == '_' {
                        s.push(p);
                        self.bump();
                    } else {
                        break;
                    }
                }
                Token::Ident(s)
            }
            other => return Err(self.error(line, column, ParseErrorKind::UnexpectedChar(other))),
        };

        Ok(spanned(token))
    }

    fn number_body(&mut self, first: char) -> String {
        let mut s = String::from(first);
        let mut prev = first;
        while let Some(p) = self.peek() {
            let sign_after_exponent = (p == '-' || p == '+') && (prev == 'e' || prev == 'E');
            if p.is_ascii_alphanumeric() || p == '.' || sign_after_exponent {
                s.push(p);
                prev = p;
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    fn string_body(&mut self, quote: char, line: usize, column: usize) -> Result<String, ParseError> {
        let mut s = String::new();
        loop {
            let (esc_line, esc_column) = (self.line, self.column);
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.error(line, column, ParseErrorKind::UnterminatedString));
                }
                Some(c) if c == quote => return Ok(s),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('\\') => '\\',
                        Some('x') => self.hex_escape(esc_line, esc_column)?,
                        Some(other) => {
                            return Err(self.error(esc_line, esc_column, ParseErrorKind::InvalidEscape(other)));
                        }
                        None => return Err(self.error(line, column, ParseErrorKind::UnterminatedString)),
                    };
                    s.push(escaped);
                }
                Some(c) => s.push(c),
            }
        }
    }

    fn hex_escape(&mut self, line: usize, column: usize) -> Result<char, ParseError> {
        let mut value = 0u32;
        for _ in 0..2 {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error(line, column, ParseErrorKind::InvalidEscape('x')))?;
            self.bump();
            value = value * 16 + digit;
        }
        char::from_u32(value).ok_or_else(|| self.error(line, column, ParseErrorKind::InvalidEscape('x')))
    }
}

/// Escape `s` as the body of a double-quoted literal
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let t = lexer.next_token().unwrap().token;
            if t == Token::Eof {
                break;
            }
            out.push(t);
        }
        out
    }

    #[test]
    fn test_field_and_block_tokens() {
        assert_eq!(
            tokens("position {\n  y: 3.210658\n}"),
            vec![
                Token::Ident("position".into()),
                Token::LBrace,
                Token::Ident("y".into()),
                Token::Colon,
                Token::Number("3.210658".into()),
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn test_leading_byte_order_mark_is_skipped() {
        let mut lexer = Lexer::new("\u{feff}id: \"e\"");
        let first = lexer.next_token().unwrap();

        assert_eq!(first.token, Token::Ident("id".into()));
        assert_eq!((first.line, first.column), (1, 1));
        assert_eq!(tokens("\u{feff}id: \"e\"").len(), 3);
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#""mesh: \"/a b.glb\"\n" 'it\'s' "\x41\t""#),
            vec![
                Token::Str("mesh: \"/a b.glb\"\n".into()),
                Token::Str("it's".into()),
                Token::Str("A\t".into()),
            ]
        );
    }

    #[test]
    fn test_numbers_with_sign_and_exponent() {
        assert_eq!(
            tokens("-0.70710677 1e-05 +2"),
            vec![
                Token::Number("-0.70710677".into()),
                Token::Number("1e-05".into()),
                Token::Number("+2".into()),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            tokens("# header\nid: \"boat\" # trailing\n"),
            vec![Token::Ident("id".into()), Token::Colon, Token::Str("boat".into())]
        );
    }

    #[test]
    fn test_positions_are_one_based() {
        let mut lexer = Lexer::new("a\n  b");
        let first = lexer.next_token().unwrap();
        let second = lexer.next_token().unwrap();

        assert_eq!((first.line, first.column), (1, 1));
        assert_eq!((second.line, second.column), (2, 3));
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"boat").next_token().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert_eq!((err.line, err.column), (1, 1));
    }

    #[test]
    fn test_invalid_escape_and_char() {
        assert_eq!(Lexer::new(r#""\q""#).next_token().unwrap_err().kind, ParseErrorKind::InvalidEscape('q'));
        assert_eq!(Lexer::new("@").next_token().unwrap_err().kind, ParseErrorKind::UnexpectedChar('@'));
    }

    #[test]
    fn test_escape_reads_back() {
        let original = "line \"one\"\n\ttab \\ slash \u{1}";
        let literal = format!("\"{}\"", escape(original));
        assert_eq!(tokens(&literal), vec![Token::Str(original.into())]);
    }
}
