//! Listing lexer: converts listing text into a token stream.
//!
//! - Newlines are tokens; the language is line-oriented
//! - `//` comments run to end of line
//! - String escapes: `\"`, `\\`, `\n`, `\t`, `\r`
//! - Error recovery: a bad character is reported and skipped

use tangle_types::{CompileErrors, ErrorCode, Span, TangleError, MAX_ERRORS};

use crate::token::{Token, TokenKind};

/// Result of lexing: tokens plus any errors collected.
pub struct LexResult {
    /// Always ends with [`TokenKind::Eof`].
    pub tokens: Vec<Token>,
    pub errors: CompileErrors,
}

pub struct Lexer<'src> {
    source: &'src [u8],
    pos: usize,
    line: u32,
    col: u32,
    errors: CompileErrors,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            errors: CompileErrors::empty(),
        }
    }

    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();
        loop {
            if self.errors.total_errors >= MAX_ERRORS {
                break;
            }
            let token = self.scan();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }
        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_col: u32) -> Span {
        Span::new(self.line, start_col, self.col)
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        self.errors.push(TangleError::new(code, message).at_span(span));
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r') => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────

    /// Next token. Bad characters are reported and skipped until a token
    /// is found or the error cap is reached.
    fn scan(&mut self) -> Token {
        loop {
            if self.errors.is_full() {
                return Token::new(TokenKind::Eof, self.current_span());
            }
            self.skip_trivia();
            let start_line = self.line;
            let start_col = self.col;
            let Some(ch) = self.advance() else {
                return Token::new(TokenKind::Eof, self.current_span());
            };

            let single = |kind| Token::new(kind, Span::new(start_line, start_col, start_col + 1));
            return match ch {
                b'\n' => single(TokenKind::Newline),
                b'(' => single(TokenKind::LParen),
                b')' => single(TokenKind::RParen),
                b'{' => single(TokenKind::LBrace),
                b'}' => single(TokenKind::RBrace),
                b',' => single(TokenKind::Comma),
                b':' => single(TokenKind::Colon),
                b'=' => single(TokenKind::Eq),
                b'+' => single(TokenKind::Plus),
                b'-' => single(TokenKind::Minus),
                b'<' => single(TokenKind::Less),
                b'"' => self.scan_string(start_col),
                b'0'..=b'9' => self.scan_number(start_col),
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(start_col),
                other => {
                    let span = self.span_from(start_col);
                    self.emit_error(
                        ErrorCode::UNEXPECTED_CHARACTER,
                        format!("unexpected character '{}'", char::from(other)),
                        span,
                    );
                    continue;
                }
            };
        }
    }

    fn scan_number(&mut self, start_col: u32) -> Token {
        let start = self.pos - 1;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let text = String::from_utf8_lossy(&self.source[start..self.pos]);
        let span = self.span_from(start_col);
        match text.parse::<i64>() {
            Ok(n) => Token::new(TokenKind::Integer(n), span),
            Err(_) => {
                self.emit_error(
                    ErrorCode::INVALID_NUMBER,
                    format!("integer literal '{text}' is out of range"),
                    span,
                );
                Token::new(TokenKind::Integer(0), span)
            }
        }
    }

    fn scan_identifier(&mut self, start_col: u32) -> Token {
        let start = self.pos - 1;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.advance();
        }
        let word = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Identifier(word));
        Token::new(kind, self.span_from(start_col))
    }

    fn scan_string(&mut self, start_col: u32) -> Token {
        let mut bytes = Vec::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    let span = self.span_from(start_col);
                    self.emit_error(ErrorCode::UNTERMINATED_STRING, "unterminated string literal", span);
                    break;
                }
                Some(b'"') => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    let escaped = match self.advance() {
                        Some(b'n') => b'\n',
                        Some(b't') => b'\t',
                        Some(b'r') => b'\r',
                        Some(b'"') => b'"',
                        Some(b'\\') => b'\\',
                        Some(other) => {
                            let span = self.span_from(start_col);
                            self.emit_error(
                                ErrorCode::UNEXPECTED_CHARACTER,
                                format!("unknown escape '\\{}'", char::from(other)),
                                span,
                            );
                            other
                        }
                        None => continue,
                    };
                    bytes.push(escaped);
                }
                Some(c) => {
                    self.advance();
                    bytes.push(c);
                }
            }
        }
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Token::new(TokenKind::Str(text), self.span_from(start_col))
    }
}
