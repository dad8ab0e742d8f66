//! Arithmetic: `neg`, `add`, `sub`, `mul`, `div`
//!
//! Operands coerce through ToNumber, so arithmetic is always double
//! arithmetic; strings that parse as numbers participate, everything else
//! degrades to NaN.

use jsm_core::{Value, VmError, VmResult};

use super::{binary, unary};
use crate::context::Context;

pub(crate) fn neg(ctx: &mut Context<'_>, _imms: &[Value]) -> VmResult<()> {
    unary(ctx, |v| Ok(Value::Num(-v.to_number())))
}

pub(crate) fn add(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    binary(ctx, imms, |a, b| {
        Ok(Value::Num(a.to_number() + b.to_number()))
    })
}

pub(crate) fn sub(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    binary(ctx, imms, |a, b| {
        Ok(Value::Num(a.to_number() - b.to_number()))
    })
}

pub(crate) fn mul(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    binary(ctx, imms, |a, b| {
        Ok(Value::Num(a.to_number() * b.to_number()))
    })
}

/// Division fails on a divisor of exactly 0.0 rather than producing an
/// infinity.
pub(crate) fn div(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    binary(ctx, imms, |a, b| {
        let divisor = b.to_number();
        if divisor == 0.0 {
            return Err(VmError::DivideByZero);
        }
        Ok(Value::Num(a.to_number() / divisor))
    })
}
