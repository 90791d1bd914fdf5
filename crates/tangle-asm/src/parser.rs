//! Listing parser: token stream to instructions.
//!
//! One instruction per line, except a `while` header, which must be followed
//! by `{` either on the same line or on the next one. On error the parser
//! reports, skips to the end of the line and carries on.

use tangle_types::{CompileErrors, Condition, ErrorCode, Instruction, Span, TangleError, MAX_ERRORS};

use crate::token::{Token, TokenKind};

/// Result of parsing.
pub struct ParseResult {
    pub instructions: Vec<Instruction>,
    /// Span of each instruction, index-aligned with `instructions`.
    pub spans: Vec<Span>,
    pub errors: CompileErrors,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: CompileErrors,
}

/// Parse failure for a single line; the error is already recorded.
struct Skip;

type LineResult<T> = Result<T, Skip>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: CompileErrors::empty(),
        }
    }

    pub fn parse(mut self) -> ParseResult {
        let mut instructions = Vec::new();
        let mut spans = Vec::new();

        loop {
            self.skip_newlines();
            if self.at_end() || self.errors.total_errors >= MAX_ERRORS {
                break;
            }
            let start = self.current_span();
            match self.parse_line() {
                Ok(instruction) => {
                    instructions.push(instruction);
                    spans.push(start.merge(self.previous_span()));
                }
                Err(Skip) => self.synchronize(),
            }
        }

        ParseResult {
            instructions,
            spans,
            errors: self.errors,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    fn peek_kind(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.span)
            .unwrap_or(Span::point(1, 1))
    }

    fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span)
            .unwrap_or(Span::point(1, 1))
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek_kind().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_newlines(&mut self) {
        while self.eat(&TokenKind::Newline) {}
    }

    /// Skip to the start of the next line.
    fn synchronize(&mut self) {
        while !matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Eof) {
            self.advance();
        }
    }

    // ── Errors ────────────────────────────────────────────────────────────────

    fn unexpected<T>(&mut self, expected: &str) -> LineResult<T> {
        let span = self.current_span();
        let found = self.peek_kind().clone();
        self.errors.push(
            TangleError::new(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected {expected}, found {found}"),
            )
            .at_span(span),
        );
        Err(Skip)
    }

    fn expect(&mut self, kind: TokenKind) -> LineResult<()> {
        if self.eat(&kind) {
            Ok(())
        } else {
            self.unexpected(&kind.to_string())
        }
    }

    fn expect_identifier(&mut self) -> LineResult<String> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => self.unexpected("a name"),
        }
    }

    /// An optionally negative integer that must fit in `T`.
    fn expect_integer<T: TryFrom<i64>>(&mut self) -> LineResult<T> {
        let span = self.current_span();
        let negative = self.eat(&TokenKind::Minus);
        let value = match self.peek_kind() {
            TokenKind::Integer(n) => {
                let n = *n;
                self.advance();
                if negative {
                    -n
                } else {
                    n
                }
            }
            _ => return self.unexpected("an integer"),
        };
        T::try_from(value).or_else(|_| {
            self.errors.push(
                TangleError::new(
                    ErrorCode::INVALID_NUMBER,
                    format!("{value} is out of range here"),
                )
                .at_span(span.merge(self.previous_span())),
            );
            Err(Skip)
        })
    }

    fn expect_line_end(&mut self) -> LineResult<()> {
        match self.peek_kind() {
            TokenKind::Newline | TokenKind::Eof => Ok(()),
            _ => self.unexpected("end of line"),
        }
    }

    // ── Lines ─────────────────────────────────────────────────────────────────

    fn parse_line(&mut self) -> LineResult<Instruction> {
        let instruction = match self.peek_kind().clone() {
            TokenKind::Wait => {
                self.advance();
                Instruction::Wait {
                    units: self.expect_integer()?,
                }
            }
            TokenKind::Trace => {
                self.advance();
                Instruction::Trace {
                    point: self.expect_integer()?,
                }
            }
            TokenKind::Print => {
                self.advance();
                match self.peek_kind().clone() {
                    TokenKind::Str(text) => {
                        self.advance();
                        Instruction::Print { text }
                    }
                    _ => return self.unexpected("a string"),
                }
            }
            TokenKind::While => {
                self.advance();
                return self.parse_while();
            }
            TokenKind::RBrace => {
                self.advance();
                Instruction::Close
            }
            TokenKind::Identifier(name) => {
                self.advance();
                self.parse_named(name)?
            }
            _ => return self.unexpected("an instruction"),
        };
        self.expect_line_end()?;
        Ok(instruction)
    }

    /// `name(args)`, `name = n` or `name = name + n`.
    fn parse_named(&mut self, name: String) -> LineResult<Instruction> {
        if self.eat(&TokenKind::LParen) {
            let mut args = Vec::new();
            if !self.eat(&TokenKind::RParen) {
                loop {
                    args.push(self.expect_integer()?);
                    if self.eat(&TokenKind::RParen) {
                        break;
                    }
                    self.expect(TokenKind::Comma)?;
                }
            }
            return Ok(Instruction::Call { name, args });
        }

        self.expect(TokenKind::Eq)?;
        if let TokenKind::Identifier(source) = self.peek_kind().clone() {
            let span = self.current_span();
            self.advance();
            if source != name {
                self.errors.push(
                    TangleError::new(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("'{name}' can only be incremented from itself, found '{source}'"),
                    )
                    .at_span(span)
                    .with_suggestion(format!("write '{name} = {name} + 1'")),
                );
                return Err(Skip);
            }
            self.expect(TokenKind::Plus)?;
            let by = self.expect_integer()?;
            return Ok(Instruction::Increment { var: name, by });
        }
        let value = self.expect_integer()?;
        Ok(Instruction::Assign { var: name, value })
    }

    /// `while a < n:` or `while not sensor():`, then `{`.
    fn parse_while(&mut self) -> LineResult<Instruction> {
        let condition = if self.eat(&TokenKind::Not) {
            let sensor = self.expect_identifier()?;
            self.expect(TokenKind::LParen)?;
            self.expect(TokenKind::RParen)?;
            Condition::SensorNotRaised { sensor }
        } else {
            let var = self.expect_identifier()?;
            self.expect(TokenKind::Less)?;
            let limit = self.expect_integer()?;
            Condition::Below { var, limit }
        };
        self.expect(TokenKind::Colon)?;
        // The block opener may sit on the next line.
        self.eat(&TokenKind::Newline);
        self.expect(TokenKind::LBrace)?;
        self.expect_line_end()?;
        Ok(Instruction::While(condition))
    }
}
