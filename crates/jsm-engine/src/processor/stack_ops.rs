//! Stack manipulation: `nop`, `push`, `pop`

use jsm_core::{Value, VmResult};

use super::count;
use crate::context::Context;

pub(crate) fn nop(ctx: &mut Context<'_>, _imms: &[Value]) -> VmResult<()> {
    ctx.program_counter().increment();
    Ok(())
}

/// Push each immediate left to right; the last ends up on top.
pub(crate) fn push(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    ctx.multi_push(imms.to_vec())?;
    ctx.program_counter().increment();
    Ok(())
}

/// Discard the top `n` operands; `n` defaults to 1.
pub(crate) fn pop(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    let n = count(imms, 0, 1)?;
    ctx.multi_pop(n)?;
    ctx.program_counter().increment();
    Ok(())
}
