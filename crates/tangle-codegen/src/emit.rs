//! Per-kind emission rules.
//!
//! ```text
//! Wait (count n)              Wait (tap)
//!   doWait(n)                   doWait(1)
//!   wait 1000                   wait 500
//!   a = 0                       while not getTouchSensor():
//!   while a < n:                {
//!   {                             wait 100
//!     wait 1000                 }
//!     a = a + 1
//!   }
//!
//! Repeat (count n)            Repeat (tap)
//!   a = 0                       while not getTouchSensor():
//!   while a < n:                {
//!   {                             wait 100
//!     wait 500                    ...body...
//!     a = a + 1
//!     ...body...
//! ```
//!
//! A repeat leaves its block open; the matching End Repeat closes it.

use tangle_graph::{Collection, ParamValue, StatementId, StatementKind};
use tangle_types::{ErrorCode, Instruction, NativeAction, TangleError};
use tracing::{trace, warn};

use crate::context::{CompileContext, OpenBlock};

/// Units slept after announcing a counted wait, and per counted tick.
pub const WAIT_TICK: u32 = 1000;
/// Units slept after announcing a tap-gated wait.
pub const TAP_SETTLE: u32 = 500;
/// Sensor polling interval inside tap-gated loops.
pub const SENSOR_POLL: u32 = 100;
/// Units slept at the top of each counted repeat pass.
pub const REPEAT_SETTLE: u32 = 500;
/// `doWait` argument announcing a tap-gated wait.
pub const TAP_ANNOUNCE: i32 = 1;

/// Emit the instructions for one statement.
///
/// Parameter statements are never emitted directly; they are consumed here by
/// the statement whose parameter plug points at them.
pub fn emit_statement(id: StatementId, collection: &mut Collection, ctx: &mut CompileContext) {
    let Some(statement) = collection.get(id) else {
        return;
    };
    let kind = statement.kind;
    let name = statement.name.clone();

    match kind {
        StatementKind::Start | StatementKind::Parameter { .. } => {}
        StatementKind::Action { action } => {
            emit_debug(id, &name, ctx);
            ctx.emit(Instruction::call(action, Vec::new()));
        }
        StatementKind::Wait => {
            emit_debug(id, &name, ctx);
            let value = read_parameter(id, collection);
            emit_wait(value, ctx);
        }
        StatementKind::LoopBegin => {
            emit_debug(id, &name, ctx);
            let value = read_parameter(id, collection);
            emit_loop_begin(id, value, ctx);
        }
        StatementKind::LoopEnd => emit_loop_end(id, &name, ctx),
    }
}

fn emit_debug(id: StatementId, name: &str, ctx: &mut CompileContext) {
    if !ctx.options.debug {
        return;
    }
    let point = ctx.trace_point(id);
    ctx.emit(Instruction::Trace { point });
    ctx.emit(Instruction::Print {
        text: name.to_string(),
    });
}

/// Resolve the parameter plugged into `id`, marking it compiled.
/// Nothing plugged in means forever.
fn read_parameter(id: StatementId, collection: &mut Collection) -> ParamValue {
    let Some(target) = collection.get(id).and_then(|s| s.parameter_connection()) else {
        return ParamValue::Forever;
    };
    match collection.get_mut(target) {
        Some(param) => match param.kind {
            StatementKind::Parameter { value } => {
                param.mark_compiled();
                trace!(statement = id.0, parameter = target.0, ?value, "parameter read");
                value
            }
            _ => ParamValue::Forever,
        },
        None => ParamValue::Forever,
    }
}

fn emit_wait(value: ParamValue, ctx: &mut CompileContext) {
    match value.limit() {
        None => {
            ctx.emit(Instruction::call(NativeAction::Wait, vec![TAP_ANNOUNCE]));
            ctx.emit(Instruction::Wait { units: TAP_SETTLE });
            ctx.emit(Instruction::while_not_sensor(NativeAction::TouchSensor));
            ctx.emit(Instruction::Wait { units: SENSOR_POLL });
            ctx.emit(Instruction::Close);
        }
        Some(limit) => {
            let var = ctx.counter_var();
            ctx.emit(Instruction::call(NativeAction::Wait, vec![limit]));
            ctx.emit(Instruction::Wait { units: WAIT_TICK });
            ctx.emit(Instruction::assign(&var, 0));
            ctx.emit(Instruction::while_below(&var, limit));
            ctx.emit(Instruction::Wait { units: WAIT_TICK });
            ctx.emit(Instruction::increment(&var));
            ctx.emit(Instruction::Close);
        }
    }
}

fn emit_loop_begin(id: StatementId, value: ParamValue, ctx: &mut CompileContext) {
    match value.limit() {
        None => {
            ctx.emit(Instruction::while_not_sensor(NativeAction::TouchSensor));
            ctx.emit(Instruction::Wait { units: SENSOR_POLL });
            ctx.open_block(OpenBlock {
                statement: id,
                counter: None,
            });
        }
        Some(limit) => {
            let var = ctx.counter_var();
            ctx.emit(Instruction::assign(&var, 0));
            ctx.emit(Instruction::while_below(&var, limit));
            ctx.emit(Instruction::Wait {
                units: REPEAT_SETTLE,
            });
            ctx.emit(Instruction::increment(&var));
            ctx.open_block(OpenBlock {
                statement: id,
                counter: Some(var),
            });
        }
    }
}

fn emit_loop_end(id: StatementId, name: &str, ctx: &mut CompileContext) {
    if ctx.close_block().is_some() {
        ctx.emit(Instruction::Close);
        return;
    }
    warn!(statement = id.0, "loop end without an open repeat");
    ctx.report(
        TangleError::warning(
            ErrorCode::UNMATCHED_LOOP_END,
            format!("'{name}' has no Begin Repeat before it"),
        )
        .at_statement(id.0)
        .with_suggestion("Place a Begin Repeat sticker earlier in the chain"),
    );
}
