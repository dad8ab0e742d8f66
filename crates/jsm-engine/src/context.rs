//! Execution context handed to instruction handlers
//!
//! Instead of a dynamic key/value bag, handlers receive a concrete borrowed
//! record over the machine's registers: the program counter, the global heap,
//! the call stack, and the single-slot terminal result. The borrow lasts for
//! one handler invocation only; nothing in a handler may retain a reference
//! past its return, which is exactly what keeps frame access sound — `ret`
//! pops the frame the previous instruction was working on.

use jsm_core::{CallStack, Frame, Heap, ProgramCounter, Stack, Value, VmError, VmResult};

/// The machine state visible to a single handler invocation.
pub struct Context<'m> {
    pc: &'m mut ProgramCounter,
    heap: &'m mut Heap,
    call_stack: &'m mut CallStack,
    result: &'m mut Option<Vec<Value>>,
}

impl<'m> Context<'m> {
    pub(crate) fn new(
        pc: &'m mut ProgramCounter,
        heap: &'m mut Heap,
        call_stack: &'m mut CallStack,
        result: &'m mut Option<Vec<Value>>,
    ) -> Self {
        Context {
            pc,
            heap,
            call_stack,
            result,
        }
    }

    /// The program counter. Handlers advance it themselves: increment on
    /// fall-through, set absolute on branches.
    pub fn program_counter(&mut self) -> &mut ProgramCounter {
        self.pc
    }

    /// The machine-global heap.
    pub fn global_heap(&mut self) -> &mut Heap {
        self.heap
    }

    pub(crate) fn call_stack(&mut self) -> &mut CallStack {
        self.call_stack
    }

    /// The executing (topmost) frame.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::NoFrame`] outside any subroutine activation.
    pub fn frame(&mut self) -> VmResult<&mut Frame> {
        self.call_stack.peek_mut()
    }

    /// The caller-supplied argument at `index` in the executing frame.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::NoFrame`] without a frame and
    /// [`VmError::ArgumentOutOfRange`] for a negative or too-large index.
    pub fn argument(&self, index: i64) -> VmResult<Value> {
        let frame = self.call_stack.peek()?;
        usize::try_from(index)
            .ok()
            .and_then(|i| frame.arguments.get(i))
            .cloned()
            .ok_or(VmError::ArgumentOutOfRange)
    }

    /// The executing frame's locals.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::NoFrame`] outside any subroutine activation.
    pub fn local_heap(&mut self) -> VmResult<&mut Heap> {
        Ok(&mut self.call_stack.peek_mut()?.locals)
    }

    /// The executing frame's operand stack.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::NoFrame`] outside any subroutine activation.
    pub fn operand_stack(&mut self) -> VmResult<&mut Stack> {
        Ok(&mut self.call_stack.peek_mut()?.operands)
    }

    /// Push onto the executing frame's operand stack.
    pub fn push(&mut self, value: Value) -> VmResult<()> {
        self.operand_stack()?.push(value);
        Ok(())
    }

    /// Append values in order onto the executing frame's operand stack.
    pub fn multi_push(&mut self, values: Vec<Value>) -> VmResult<()> {
        self.operand_stack()?.multi_push(values);
        Ok(())
    }

    /// Pop from the executing frame's operand stack.
    pub fn pop(&mut self) -> VmResult<Value> {
        self.operand_stack()?.pop()
    }

    /// Pop `n` values from the executing frame's operand stack, preserving
    /// their stack order.
    pub fn multi_pop(&mut self, n: usize) -> VmResult<Vec<Value>> {
        self.operand_stack()?.multi_pop(n)
    }

    /// Replace the top `arity` operands with the result of `op`.
    pub fn apply<F>(&mut self, op: F, arity: usize) -> VmResult<()>
    where
        F: FnOnce(&[Value]) -> VmResult<Value>,
    {
        self.operand_stack()?.apply(op, arity)
    }

    /// Record the machine's terminal result. Called by `ret` when the entry
    /// frame returns.
    pub(crate) fn set_result(&mut self, result: Vec<Value>) {
        *self.result = Some(result);
    }
}
