//! Graph walk: from the unique start statement along outgoing connectors.

use tangle_graph::{Collection, StatementId};
use tangle_types::{CompileErrors, CompiledProgram, ErrorCode, TangleError};
use tracing::{debug, info, warn};

use crate::context::{CompileContext, CompileOptions};
use crate::emit::emit_statement;
use crate::error::{CodegenError, CodegenResult};

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// A generated program plus the non-fatal diagnostics found on the way.
#[derive(Debug, Clone)]
pub struct CodegenOutput {
    pub program: CompiledProgram,
    pub diagnostics: CompileErrors,
}

/// Linearize a resolved statement graph.
///
/// Compiled and dangling flags are cleared first, so generating twice over
/// the same graph yields identical programs and identical flags.
pub fn generate(collection: &mut Collection, options: &CompileOptions) -> CodegenResult<CodegenOutput> {
    let start = match collection.start_count() {
        0 => return Err(CodegenError::MissingStart),
        1 => collection.start().ok_or(CodegenError::MissingStart)?,
        count => return Err(CodegenError::DuplicateStart { count }),
    };

    collection.clear_marks();
    let mut ctx = CompileContext::new(options.clone());
    walk(start, 0, collection, &mut ctx)?;

    for block in ctx.open_blocks().to_vec() {
        warn!(statement = block.statement.0, "repeat never closed");
        ctx.report(
            TangleError::warning(
                ErrorCode::UNCLOSED_LOOP,
                "Begin Repeat has no matching End Repeat",
            )
            .at_statement(block.statement.0)
            .with_suggestion("Make sure you have an End Repeat sticker on the page"),
        );
    }

    let (program, mut diagnostics) = ctx.finish();
    if program.is_empty() {
        diagnostics.push(
            TangleError::warning(ErrorCode::EMPTY_PROGRAM, "program has no actions")
                .with_suggestion("Make sure the stickers after Begin are aligned"),
        );
    }

    info!(
        instructions = program.len(),
        native_calls = program.native_call_count(),
        warnings = diagnostics.total_warnings,
        "code generated"
    );
    Ok(CodegenOutput {
        program,
        diagnostics,
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Walk
// ══════════════════════════════════════════════════════════════════════════════

fn walk(
    id: StatementId,
    depth: usize,
    collection: &mut Collection,
    ctx: &mut CompileContext,
) -> CodegenResult<()> {
    if depth > ctx.options.max_chain_depth {
        ctx.report(
            TangleError::new(
                ErrorCode::CHAIN_TOO_DEEP,
                format!("more than {} stickers in one chain", ctx.options.max_chain_depth),
            )
            .at_statement(id.0),
        );
        return Err(CodegenError::ChainTooDeep {
            limit: ctx.options.max_chain_depth,
            statement: id.0,
        });
    }

    let Some(statement) = collection.get_mut(id) else {
        return Ok(());
    };
    // Parameters are leaves read by their owner, even when a flow plug
    // happens to overlap their socket.
    if statement.kind.is_parameter() {
        return Ok(());
    }
    if !statement.mark_compiled() {
        debug!(statement = id.0, "already compiled, branch ends");
        return Ok(());
    }
    debug!(statement = id.0, kind = statement.kind.label(), name = %statement.name, "emitting statement");

    emit_statement(id, collection, ctx);

    let outgoing: Vec<(String, Option<StatementId>)> = collection
        .get(id)
        .map(|s| s.outgoing().map(|c| (c.name.clone(), c.target)).collect())
        .unwrap_or_default();
    for (connector, target) in outgoing {
        match target {
            Some(next) => walk(next, depth + 1, collection, ctx)?,
            None => mark_dangling(id, &connector, collection, ctx),
        }
    }
    Ok(())
}

fn mark_dangling(id: StatementId, connector: &str, collection: &mut Collection, ctx: &mut CompileContext) {
    let Some(statement) = collection.get_mut(id) else {
        return;
    };
    statement.mark_dangling();
    debug!(statement = id.0, connector, "branch ends here");
    ctx.report(
        TangleError::warning(
            ErrorCode::DANGLING_BRANCH,
            format!("nothing is connected after '{}'", statement.name),
        )
        .at_statement(id.0),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangle_graph::catalog::codes;
    use tangle_graph::{resolve, Catalog};
    use tangle_types::Marker;

    fn graph(codes: &[u32]) -> Collection {
        let markers: Vec<Marker> = codes
            .iter()
            .enumerate()
            .map(|(i, c)| Marker::upright(*c, i as f32 * 40.0, 0.0, 20.0))
            .collect();
        let mut c = Collection::from_markers(&markers, &Catalog::standard()).0;
        resolve(&mut c);
        c
    }

    #[test]
    fn missing_and_duplicate_start() {
        let mut none = graph(&[codes::WALK]);
        assert_eq!(
            generate(&mut none, &CompileOptions::default()).unwrap_err(),
            CodegenError::MissingStart
        );
        let mut two = graph(&[codes::BEGIN, codes::BEGIN]);
        assert_eq!(
            generate(&mut two, &CompileOptions::default()).unwrap_err(),
            CodegenError::DuplicateStart { count: 2 }
        );
    }

    #[test]
    fn chain_depth_is_bounded() {
        let mut c = graph(&[codes::BEGIN, codes::WALK, codes::JUMP, codes::SPIN]);
        let options = CompileOptions {
            max_chain_depth: 2,
            ..CompileOptions::default()
        };
        assert!(matches!(
            generate(&mut c, &options),
            Err(CodegenError::ChainTooDeep { limit: 2, .. })
        ));
    }

    #[test]
    fn end_of_chain_is_dangling() {
        let mut c = graph(&[codes::BEGIN, codes::WALK]);
        let out = generate(&mut c, &CompileOptions::default()).unwrap();
        assert!(c.get(StatementId(1)).unwrap().is_dangling());
        assert!(!c.get(StatementId(0)).unwrap().is_dangling());
        assert_eq!(out.diagnostics.with_code(ErrorCode::DANGLING_BRANCH).count(), 1);
    }
}
