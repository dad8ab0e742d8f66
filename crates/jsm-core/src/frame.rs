//! Activation frames and the call stack
//!
//! Each `call` pushes a [`Frame`]: the callee's arguments (captured at call
//! time and never mutated), a fresh locals heap, a fresh operand stack, and
//! the program-counter index to restore on `ret`. The topmost frame is the
//! executing one; handlers borrow it only for the duration of a single
//! instruction, since `ret` may pop it.

use serde::{Deserialize, Serialize};

use crate::heap::Heap;
use crate::stack::Stack;
use crate::value::Value;
use crate::{Restorable, VmError, VmResult};

/// A subroutine activation record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Values supplied by the caller; read-only for the callee
    pub arguments: Vec<Value>,
    /// Frame-local heap
    pub locals: Heap,
    /// Frame-local operand stack
    pub operands: Stack,
    /// Program-counter index to restore on return
    pub return_to: usize,
}

impl Frame {
    /// Create a frame with the given arguments and return address.
    pub fn new(arguments: Vec<Value>, return_to: usize) -> Self {
        Frame {
            arguments,
            locals: Heap::new(),
            operands: Stack::new(),
            return_to,
        }
    }
}

/// LIFO of activation frames.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    /// Create an empty call stack.
    pub fn new() -> Self {
        CallStack::default()
    }

    /// Push a frame; it becomes the executing frame.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Pop the executing frame.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::NoFrame`] if the call stack is empty.
    pub fn pop(&mut self) -> VmResult<Frame> {
        self.frames.pop().ok_or(VmError::NoFrame)
    }

    /// Borrow the executing frame.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::NoFrame`] if the call stack is empty.
    pub fn peek(&self) -> VmResult<&Frame> {
        self.frames.last().ok_or(VmError::NoFrame)
    }

    /// Mutably borrow the executing frame.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::NoFrame`] if the call stack is empty.
    pub fn peek_mut(&mut self) -> VmResult<&mut Frame> {
        self.frames.last_mut().ok_or(VmError::NoFrame)
    }

    /// Drop all frames.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Number of active frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frame is active.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Restorable for CallStack {
    fn dump(&self) -> VmResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn restore(&mut self, data: &[u8]) -> VmResult<()> {
        *self = serde_json::from_slice(data)?;
        Ok(())
    }
}
