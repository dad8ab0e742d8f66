//! Comparison: `eq`, `ne`, `gt`, `ge`, `lt`, `le`
//!
//! Built on the value layer's `equal` and `less`: `gt(a, b)` is `less(b, a)`
//! and the non-strict forms disjoin with `equal`. A single immediate, if
//! present, becomes the right operand.

use jsm_core::{Value, VmResult};

use super::binary;
use crate::context::Context;

pub(crate) fn eq(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    binary(ctx, imms, |a, b| Ok(Value::Bool(a.equal(b))))
}

pub(crate) fn ne(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    binary(ctx, imms, |a, b| Ok(Value::Bool(!a.equal(b))))
}

pub(crate) fn gt(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    binary(ctx, imms, |a, b| Ok(Value::Bool(b.less(a))))
}

pub(crate) fn ge(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    binary(ctx, imms, |a, b| Ok(Value::Bool(b.less(a) || a.equal(b))))
}

pub(crate) fn lt(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    binary(ctx, imms, |a, b| Ok(Value::Bool(a.less(b))))
}

pub(crate) fn le(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    binary(ctx, imms, |a, b| Ok(Value::Bool(a.less(b) || a.equal(b))))
}
