//! Heap access: `ld`, `lda`, `ldl`, `st`, `stl`, `inc`, `incl`, `dec`, `decl`
//!
//! Loads of unbound keys push null rather than failing. The key (or argument
//! index) comes from the single immediate when present, otherwise from the
//! popped top of stack.

use jsm_core::{Value, VmResult};

use crate::context::Context;

/// The key operand: the immediate if present, else the popped top of stack,
/// coerced to a string either way.
fn key_operand(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<String> {
    match imms.first() {
        Some(v) => Ok(v.to_string()),
        None => Ok(ctx.pop()?.to_string()),
    }
}

pub(crate) fn ld(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    let key = key_operand(ctx, imms)?;
    let value = ctx
        .global_heap()
        .load(&key)
        .map(Clone::clone)
        .unwrap_or(Value::Null);
    ctx.push(value)?;
    ctx.program_counter().increment();
    Ok(())
}

pub(crate) fn ldl(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    let key = key_operand(ctx, imms)?;
    let value = ctx
        .local_heap()?
        .load(&key)
        .map(Clone::clone)
        .unwrap_or(Value::Null);
    ctx.push(value)?;
    ctx.program_counter().increment();
    Ok(())
}

/// Load a caller argument by index. Unlike the heap loads, an out-of-range
/// index is a failure.
pub(crate) fn lda(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    let index = match imms.first() {
        Some(v) => v.to_integer(),
        None => ctx.pop()?.to_integer(),
    };
    let value = ctx.argument(index)?;
    ctx.push(value)?;
    ctx.program_counter().increment();
    Ok(())
}

/// The (key, value) pair to store: with no immediates both come off the stack
/// (value on top); with one immediate it names the key and the value is
/// popped; with two they are key and value.
fn store_operands(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<(String, Value)> {
    match imms {
        [] => {
            let mut vs = ctx.multi_pop(2)?;
            let value = vs.pop().unwrap_or(Value::Null);
            let key = vs.pop().unwrap_or(Value::Null).to_string();
            Ok((key, value))
        }
        [key] => {
            let value = ctx.pop()?;
            Ok((key.to_string(), value))
        }
        [key, value, ..] => Ok((key.to_string(), value.clone())),
    }
}

pub(crate) fn st(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    let (key, value) = store_operands(ctx, imms)?;
    ctx.global_heap().store(key, value);
    ctx.program_counter().increment();
    Ok(())
}

pub(crate) fn stl(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    let (key, value) = store_operands(ctx, imms)?;
    ctx.local_heap()?.store(key, value);
    ctx.program_counter().increment();
    Ok(())
}

/// Add `delta` to the number stored under the key in the global heap; an
/// unbound key counts from 0.
fn step_global(ctx: &mut Context<'_>, imms: &[Value], delta: f64) -> VmResult<()> {
    let key = key_operand(ctx, imms)?;
    let heap = ctx.global_heap();
    let n = heap.load(&key).map(Value::to_number).unwrap_or(0.0);
    heap.store(key, Value::Num(n + delta));
    ctx.program_counter().increment();
    Ok(())
}

fn step_local(ctx: &mut Context<'_>, imms: &[Value], delta: f64) -> VmResult<()> {
    let key = key_operand(ctx, imms)?;
    let heap = ctx.local_heap()?;
    let n = heap.load(&key).map(Value::to_number).unwrap_or(0.0);
    heap.store(key, Value::Num(n + delta));
    ctx.program_counter().increment();
    Ok(())
}

pub(crate) fn inc(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    step_global(ctx, imms, 1.0)
}

pub(crate) fn incl(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    step_local(ctx, imms, 1.0)
}

pub(crate) fn dec(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    step_global(ctx, imms, -1.0)
}

pub(crate) fn decl(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    step_local(ctx, imms, -1.0)
}
