//! Operand stack
//!
//! A LIFO of [`Value`]s. Beyond push/pop it offers batch transfers, used by
//! `call`/`ret` to move argument and result groups between frames, and
//! [`Stack::apply`], which replaces the top `arity` operands with the result
//! of an n-ary operation in place.

use serde::{Deserialize, Serialize};

use crate::value::Value;
use crate::{Restorable, VmError, VmResult};

/// Capacity hint for freshly created stacks.
const INITIAL_CAPACITY: usize = 10;

/// The operand stack of a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stack {
    values: Vec<Value>,
}

impl Stack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Stack {
            values: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Push a value.
    #[inline]
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Append values in order; the last element ends up on top.
    #[inline]
    pub fn multi_push(&mut self, values: Vec<Value>) {
        self.values.extend(values);
    }

    /// Pop the top value.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::EmptyStack`] if the stack is empty.
    #[inline]
    pub fn pop(&mut self) -> VmResult<Value> {
        self.values.pop().ok_or(VmError::EmptyStack)
    }

    /// Pop the top `n` values, preserving their stack order.
    ///
    /// The returned vector lists the popped values deepest-first, so
    /// `multi_pop(n)` undoes `multi_push` of the same group.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::TooFewOperands`] if fewer than `n` values remain.
    pub fn multi_pop(&mut self, n: usize) -> VmResult<Vec<Value>> {
        let len = self.values.len();
        if len < n {
            return Err(VmError::TooFewOperands);
        }
        Ok(self.values.split_off(len - n))
    }

    /// Borrow the top value without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::EmptyStack`] if the stack is empty.
    #[inline]
    pub fn peek(&self) -> VmResult<&Value> {
        self.values.last().ok_or(VmError::EmptyStack)
    }

    /// Replace the top `arity` values with the single result of `op`.
    ///
    /// `op` sees the operands deepest-first, so for a binary operation
    /// `args[0]` is the earlier push and `args[1]` the top of stack.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::TooFewOperands`] if fewer than `arity` values
    /// remain; any failure of `op` itself propagates and leaves the stack
    /// untouched.
    pub fn apply<F>(&mut self, op: F, arity: usize) -> VmResult<()>
    where
        F: FnOnce(&[Value]) -> VmResult<Value>,
    {
        let len = self.values.len();
        if len < arity {
            return Err(VmError::TooFewOperands);
        }
        let result = op(&self.values[len - arity..])?;
        self.values.truncate(len - arity);
        self.values.push(result);
        Ok(())
    }

    /// Remove all values.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Number of values on the stack.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the stack holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for Stack {
    fn default() -> Self {
        Stack::new()
    }
}

impl Restorable for Stack {
    fn dump(&self) -> VmResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn restore(&mut self, data: &[u8]) -> VmResult<()> {
        *self = serde_json::from_slice(data)?;
        Ok(())
    }
}
