//! The assembled machine
//!
//! A [`Machine`] owns the program counter, the global heap, the call stack,
//! its preprocessor and processor, and the mnemonic table they share. `run`
//! is the whole lifecycle: preprocess, reset state, push the entry frame,
//! then fetch–dispatch until the program counter leaves the program.
//!
//! The entry frame's return address is one past the last instruction, so the
//! final `ret` both records the terminal result and drives the counter out of
//! range.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use jsm_core::{CallStack, Frame, Heap, ProgramCounter, Restorable, Value, VmError, VmResult};

use crate::context::Context;
use crate::instruction::{MnemonicTable, Program};
use crate::preprocessor::{ImmediateRule, Preprocessor};
use crate::processor::{Handler, Processor};

/// A JSM virtual machine.
///
/// A machine is single-threaded: one `run` at a time, no internal suspension
/// points. Distinct machines are fully independent, including their opcode
/// assignments.
pub struct Machine {
    mnemonics: MnemonicTable,
    preprocessor: Preprocessor,
    processor: Processor,
    program: Option<Arc<Program>>,
    pc: ProgramCounter,
    heap: Heap,
    call_stack: CallStack,
    result: Option<Vec<Value>>,
    warnings: Vec<String>,
}

/// The serialized machine state of a dump.
#[derive(Serialize, Deserialize)]
struct MachineState {
    program: Program,
    pc: ProgramCounter,
    heap: Heap,
    stack: CallStack,
}

impl Machine {
    /// Create a machine with the built-in instruction set.
    pub fn new() -> Self {
        let mut mnemonics = MnemonicTable::new();
        let processor = Processor::new(&mut mnemonics);
        Machine {
            mnemonics,
            preprocessor: Preprocessor::new(),
            processor,
            program: None,
            pc: ProgramCounter::new(),
            heap: Heap::new(),
            call_stack: CallStack::new(),
            result: None,
            warnings: Vec::new(),
        }
    }

    /// Execute `program` with the given entry arguments.
    ///
    /// Returns the array of values the entry subroutine passed to its final
    /// `ret`, or null if execution fell off the end without one.
    ///
    /// # Errors
    ///
    /// Preprocessing failures and handler failures abort the run and
    /// propagate unchanged; no partial-state cleanup is attempted beyond the
    /// implicit reset at the start of the next `run`.
    pub fn run(&mut self, program: &Program, args: Vec<Value>) -> VmResult<Value> {
        self.load(program, args)?;
        self.execute()?;
        Ok(match self.result.take() {
            Some(values) => Value::Arr(values),
            None => Value::Null,
        })
    }

    fn load(&mut self, program: &Program, args: Vec<Value>) -> VmResult<()> {
        let prep = self
            .preprocessor
            .preprocess(program, &mut self.mnemonics)?;

        self.clear();
        self.warnings = prep.warnings;

        let end = prep.program.len();
        self.program = Some(Arc::new(prep.program));
        self.call_stack.push(Frame::new(args, end));
        Ok(())
    }

    fn execute(&mut self) -> VmResult<()> {
        let program = match &self.program {
            Some(p) => Arc::clone(p),
            None => return Err(VmError::NoProgram),
        };
        while self.pc.index() < program.len() {
            let inst = &program.instructions[self.pc.index()];
            let mut ctx = Context::new(
                &mut self.pc,
                &mut self.heap,
                &mut self.call_stack,
                &mut self.result,
            );
            self.processor.process(&mut ctx, inst)?;
        }
        Ok(())
    }

    /// Register a user-defined instruction.
    ///
    /// Without an immediate rule, preprocessing passes the instruction's
    /// immediates through unchanged.
    ///
    /// # Errors
    ///
    /// Fails on an empty mnemonic or a mnemonic whose opcode is already
    /// bound.
    pub fn extend(
        &mut self,
        mnemonic: &str,
        handler: Handler,
        rule: Option<ImmediateRule>,
    ) -> VmResult<()> {
        if mnemonic.is_empty() {
            return Err(VmError::NoMnemonic);
        }
        let opcode = self.mnemonics.opcode(mnemonic);
        self.processor.bind(mnemonic, opcode, handler)?;
        self.preprocessor.extend(mnemonic, rule)
    }

    /// Reset the program counter, global heap and call stack, and drop the
    /// loaded program.
    pub fn clear(&mut self) {
        self.program = None;
        self.pc.clear();
        self.heap.clear();
        self.call_stack.clear();
        self.result = None;
        self.warnings.clear();
    }

    /// Diagnostics raised while preprocessing the most recent program, such
    /// as unresolved labels.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl Default for Machine {
    fn default() -> Self {
        Machine::new()
    }
}

impl Restorable for Machine {
    fn dump(&self) -> VmResult<Vec<u8>> {
        let state = MachineState {
            program: self.program.as_deref().cloned().unwrap_or_default(),
            pc: self.pc,
            heap: self.heap.clone(),
            stack: self.call_stack.clone(),
        };
        Ok(serde_json::to_vec(&state)?)
    }

    fn restore(&mut self, data: &[u8]) -> VmResult<()> {
        let state: MachineState = serde_json::from_slice(data)?;

        // Opcodes never appear in a dump; re-derive them so the restored
        // program dispatches through this machine's table.
        let mut program = state.program;
        for inst in &mut program.instructions {
            inst.opcode = self.mnemonics.opcode(&inst.mnemonic);
        }

        self.program = Some(Arc::new(program));
        self.pc = state.pc;
        self.heap = state.heap;
        self.call_stack = state.stack;
        self.result = None;
        self.warnings.clear();
        Ok(())
    }
}
