//! Boolean logic: `not`, `and`, `or`
//!
//! Both operands are evaluated before the instruction runs, so `and`/`or` do
//! not short-circuit; they combine the ToBoolean coercions of whatever is on
//! the stack.

use jsm_core::{Value, VmResult};

use super::{binary, unary};
use crate::context::Context;

pub(crate) fn not(ctx: &mut Context<'_>, _imms: &[Value]) -> VmResult<()> {
    unary(ctx, |v| Ok(Value::Bool(!v.to_boolean())))
}

pub(crate) fn and(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    binary(ctx, imms, |a, b| {
        Ok(Value::Bool(a.to_boolean() && b.to_boolean()))
    })
}

pub(crate) fn or(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    binary(ctx, imms, |a, b| {
        Ok(Value::Bool(a.to_boolean() || b.to_boolean()))
    })
}
