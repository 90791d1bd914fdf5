//! Tangle listing assembler.
//!
//! Parses the textual instruction language produced by
//! [`CompiledProgram::listing`] back into instructions, so a listing can be
//! stored, edited by hand, or loaded straight into the virtual machine.
//! Trace maps are not part of the listing; an assembled program has an empty
//! one.

pub mod lexer;
pub mod parser;
pub mod token;

use tangle_types::{CompileErrors, CompiledProgram, Instruction, SourceText, Span, TraceMap};
use thiserror::Error;
use tracing::debug;

pub use lexer::{LexResult, Lexer};
pub use parser::{ParseResult, Parser};
pub use token::{Token, TokenKind};

/// Instructions plus diagnostics from one assemble pass.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub instructions: Vec<Instruction>,
    pub spans: Vec<Span>,
    pub errors: CompileErrors,
}

/// A listing that could not be assembled.
#[derive(Debug, Error)]
pub enum AsmError {
    #[error("{count} syntax error(s) in listing:\n{report}")]
    Syntax { count: usize, report: String },
}

/// Lex and parse a listing, collecting every diagnostic.
pub fn assemble(source: &str) -> Assembly {
    let lexed = Lexer::new(source).lex();
    let parsed = Parser::new(lexed.tokens).parse();

    let mut errors = lexed.errors;
    errors.extend(parsed.errors);
    debug!(
        instructions = parsed.instructions.len(),
        errors = errors.total_errors,
        "listing assembled"
    );
    Assembly {
        instructions: parsed.instructions,
        spans: parsed.spans,
        errors,
    }
}

/// Assemble a listing into a program, failing on any syntax error.
pub fn parse_program(source: &str) -> Result<CompiledProgram, AsmError> {
    let assembly = assemble(source);
    if assembly.errors.has_errors() {
        return Err(AsmError::Syntax {
            count: assembly.errors.total_errors,
            report: render_errors(&assembly.errors, &SourceText::new(source)),
        });
    }
    Ok(CompiledProgram::new(assembly.instructions, TraceMap::new()))
}

/// Render errors with the offending source line underneath each one.
pub fn render_errors(errors: &CompileErrors, source: &SourceText) -> String {
    let mut out = String::new();
    for error in &errors.errors {
        match error.span {
            Some(span) => {
                out.push_str(&format!("{span}: {error}\n"));
                if let Some(line) = source.line(span.line) {
                    out.push_str(&format!("  | {line}\n"));
                }
            }
            None => out.push_str(&format!("{error}\n")),
        }
    }
    out
}
