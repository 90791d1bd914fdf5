//! Token types for the listing lexer.

use std::fmt;
use tangle_types::Span;

/// Reserved words of the listing language.
pub const KEYWORDS: &[&str] = &["wait", "while", "not", "trace", "print"];

/// A single token with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // ── Keywords ──
    Wait,
    While,
    Not,
    Trace,
    Print,

    // ── Literals ──
    Identifier(String),
    Integer(i64),
    Str(String),

    // ── Punctuation ──
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Eq,
    Plus,
    Minus,
    Less,

    Newline,
    Eof,
}

impl TokenKind {
    /// Keyword token for `word`, if it is reserved.
    pub fn keyword(word: &str) -> Option<Self> {
        Some(match word {
            "wait" => Self::Wait,
            "while" => Self::While,
            "not" => Self::Not,
            "trace" => Self::Trace,
            "print" => Self::Print,
            _ => return None,
        })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wait => write!(f, "'wait'"),
            Self::While => write!(f, "'while'"),
            Self::Not => write!(f, "'not'"),
            Self::Trace => write!(f, "'trace'"),
            Self::Print => write!(f, "'print'"),
            Self::Identifier(name) => write!(f, "identifier '{name}'"),
            Self::Integer(n) => write!(f, "integer {n}"),
            Self::Str(_) => write!(f, "string"),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::LBrace => write!(f, "'{{'"),
            Self::RBrace => write!(f, "'}}'"),
            Self::Comma => write!(f, "','"),
            Self::Colon => write!(f, "':'"),
            Self::Eq => write!(f, "'='"),
            Self::Plus => write!(f, "'+'"),
            Self::Minus => write!(f, "'-'"),
            Self::Less => write!(f, "'<'"),
            Self::Newline => write!(f, "end of line"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}
