//! Dispatch table and built-in instruction handlers
//!
//! The processor is an array indexed by opcode. Handlers receive the
//! execution [`Context`] and the instruction's immediates, and are
//! responsible for advancing the program counter themselves. Built-ins are
//! grouped by category in the submodules; the extension API binds user
//! handlers through exactly the same table.

pub(crate) mod arithmetic;
pub(crate) mod comparison;
pub(crate) mod control_flow;
pub(crate) mod logic;
pub(crate) mod memory;
pub(crate) mod stack_ops;

use jsm_core::{Value, VmError, VmResult};

use crate::context::Context;
use crate::instruction::{mnemonic, Instruction, MnemonicTable, Opcode};

/// An instruction handler.
pub type Handler = Box<dyn Fn(&mut Context<'_>, &[Value]) -> VmResult<()>>;

/// Opcode-indexed table of instruction handlers.
pub struct Processor {
    handlers: Vec<Option<Handler>>,
}

impl Processor {
    /// Create a processor with all built-in handlers bound, registering their
    /// mnemonics in `mnemonics`.
    pub(crate) fn new(mnemonics: &mut MnemonicTable) -> Self {
        let mut p = Processor {
            handlers: Vec::new(),
        };
        let builtins: Vec<(&str, Handler)> = vec![
            (mnemonic::NOP, Box::new(stack_ops::nop)),
            (mnemonic::PUSH, Box::new(stack_ops::push)),
            (mnemonic::POP, Box::new(stack_ops::pop)),
            (mnemonic::LOAD, Box::new(memory::ld)),
            (mnemonic::LOAD_ARGUMENT, Box::new(memory::lda)),
            (mnemonic::LOAD_LOCAL, Box::new(memory::ldl)),
            (mnemonic::STORE, Box::new(memory::st)),
            (mnemonic::STORE_LOCAL, Box::new(memory::stl)),
            (mnemonic::CALL, Box::new(control_flow::call)),
            (mnemonic::RETURN, Box::new(control_flow::ret)),
            (mnemonic::JUMP, Box::new(control_flow::jmp)),
            (mnemonic::JUMP_IF_TRUE, Box::new(control_flow::jt)),
            (mnemonic::JUMP_IF_FALSE, Box::new(control_flow::jf)),
            (mnemonic::EQUAL, Box::new(comparison::eq)),
            (mnemonic::NOT_EQUAL, Box::new(comparison::ne)),
            (mnemonic::GREATER_THAN, Box::new(comparison::gt)),
            (mnemonic::GREATER_OR_EQUAL, Box::new(comparison::ge)),
            (mnemonic::LESS_THAN, Box::new(comparison::lt)),
            (mnemonic::LESS_OR_EQUAL, Box::new(comparison::le)),
            (mnemonic::NOT, Box::new(logic::not)),
            (mnemonic::AND, Box::new(logic::and)),
            (mnemonic::OR, Box::new(logic::or)),
            (mnemonic::NEG, Box::new(arithmetic::neg)),
            (mnemonic::ADD, Box::new(arithmetic::add)),
            (mnemonic::SUBTRACT, Box::new(arithmetic::sub)),
            (mnemonic::MULTIPLY, Box::new(arithmetic::mul)),
            (mnemonic::DIVIDE, Box::new(arithmetic::div)),
            (mnemonic::INCREMENT, Box::new(memory::inc)),
            (mnemonic::INCREMENT_LOCAL, Box::new(memory::incl)),
            (mnemonic::DECREMENT, Box::new(memory::dec)),
            (mnemonic::DECREMENT_LOCAL, Box::new(memory::decl)),
        ];
        for (name, handler) in builtins {
            let opcode = mnemonics.opcode(name);
            // A fresh mnemonic table hands out fresh opcodes, so binding the
            // built-ins cannot collide.
            p.bind(name, opcode, handler)
                .expect("built-in opcode collision");
        }
        p
    }

    /// Bind `handler` to `opcode`, growing the table as needed.
    ///
    /// # Errors
    ///
    /// Fails with [`VmError::NoMnemonic`] on an empty mnemonic and
    /// [`VmError::AlreadyDefined`] if the opcode is occupied.
    pub(crate) fn bind(
        &mut self,
        name: &str,
        opcode: Opcode,
        handler: Handler,
    ) -> VmResult<()> {
        if name.is_empty() {
            return Err(VmError::NoMnemonic);
        }
        if self.handlers.len() <= opcode {
            self.handlers.resize_with(opcode + 1, || None);
        }
        if self.handlers[opcode].is_some() {
            return Err(VmError::AlreadyDefined(name.to_string()));
        }
        self.handlers[opcode] = Some(handler);
        Ok(())
    }

    /// Dispatch one instruction.
    ///
    /// # Errors
    ///
    /// Fails with [`VmError::CannotProcess`] if no handler is bound to the
    /// instruction's opcode; handler failures propagate unchanged.
    pub(crate) fn process(&self, ctx: &mut Context<'_>, inst: &Instruction) -> VmResult<()> {
        match self.handlers.get(inst.opcode()).and_then(Option::as_ref) {
            Some(handler) => handler(ctx, &inst.immediates),
            None => Err(VmError::CannotProcess(inst.mnemonic.clone())),
        }
    }
}

/// The branch or call target at `imms[idx]`.
///
/// # Errors
///
/// [`VmError::NoAddress`] if absent, [`VmError::InvalidAddress`] unless it is
/// a non-negative integer.
pub(crate) fn address(imms: &[Value], idx: usize) -> VmResult<usize> {
    let v = imms.get(idx).ok_or(VmError::NoAddress)?;
    match v {
        Value::Int(i) if *i >= 0 => Ok(*i as usize),
        _ => Err(VmError::InvalidAddress),
    }
}

/// The count at `imms[idx]`, defaulting to `min` when absent.
///
/// # Errors
///
/// [`VmError::InvalidCount`] unless it is an integer no less than `min`.
pub(crate) fn count(imms: &[Value], idx: usize, min: i64) -> VmResult<usize> {
    match imms.get(idx) {
        None => Ok(min as usize),
        Some(Value::Int(i)) if *i >= min => Ok(*i as usize),
        Some(_) => Err(VmError::InvalidCount),
    }
}

/// Apply a unary operation to the top of the operand stack, then advance.
pub(crate) fn unary<F>(ctx: &mut Context<'_>, op: F) -> VmResult<()>
where
    F: FnOnce(&Value) -> VmResult<Value>,
{
    ctx.apply(|vs| op(&vs[0]), 1)?;
    ctx.program_counter().increment();
    Ok(())
}

/// Apply a binary operation to the top two operands, then advance.
///
/// A single immediate, if present, is pushed first and so becomes the right
/// operand.
pub(crate) fn binary<F>(ctx: &mut Context<'_>, imms: &[Value], op: F) -> VmResult<()>
where
    F: FnOnce(&Value, &Value) -> VmResult<Value>,
{
    if let Some(imm) = imms.first() {
        ctx.push(imm.clone())?;
    }
    ctx.apply(|vs| op(&vs[0], &vs[1]), 2)?;
    ctx.program_counter().increment();
    Ok(())
}
