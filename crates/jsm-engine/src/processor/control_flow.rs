//! Control flow: `call`, `ret`, `jmp`, `jt`, `jf`

use jsm_core::{Frame, Value, VmResult};

use super::{address, count};
use crate::context::Context;

/// Call a subroutine: pop `argc` arguments, push a frame that returns to the
/// following instruction, and jump to the target address.
pub(crate) fn call(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    let target = address(imms, 0)?;
    let argc = count(imms, 1, 0)?;
    let argv = ctx.multi_pop(argc)?;

    let pc = ctx.program_counter();
    pc.increment();
    let return_to = pc.index();

    ctx.call_stack().push(Frame::new(argv, return_to));
    ctx.program_counter().set_index(target);
    Ok(())
}

/// Return from a subroutine: pop `n` results, pop the frame, and jump back.
///
/// The results land on the caller's operand stack in their original order.
/// When the entry frame returns there is no caller left; the results become
/// the machine's terminal result and the restored program counter (one past
/// the program end) stops the run loop.
pub(crate) fn ret(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    let n = count(imms, 0, 0)?;
    let result = ctx.multi_pop(n)?;

    let frame = ctx.call_stack().pop()?;
    ctx.program_counter().set_index(frame.return_to);

    if ctx.call_stack().is_empty() {
        ctx.set_result(result);
    } else {
        ctx.multi_push(result)?;
    }
    Ok(())
}

pub(crate) fn jmp(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    let target = address(imms, 0)?;
    ctx.program_counter().set_index(target);
    Ok(())
}

pub(crate) fn jt(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    branch(ctx, imms, true)
}

pub(crate) fn jf(ctx: &mut Context<'_>, imms: &[Value]) -> VmResult<()> {
    branch(ctx, imms, false)
}

fn branch(ctx: &mut Context<'_>, imms: &[Value], when: bool) -> VmResult<()> {
    let target = address(imms, 0)?;
    let v = ctx.pop()?;
    if v.to_boolean() == when {
        ctx.program_counter().set_index(target);
    } else {
        ctx.program_counter().increment();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsm_core::{CallStack, Heap, ProgramCounter, VmError};

    struct Fixture {
        pc: ProgramCounter,
        heap: Heap,
        call_stack: CallStack,
        result: Option<Vec<Value>>,
    }

    impl Fixture {
        fn with_frame() -> Self {
            let mut call_stack = CallStack::new();
            call_stack.push(Frame::new(vec![], 99));
            Fixture {
                pc: ProgramCounter::new(),
                heap: Heap::new(),
                call_stack,
                result: None,
            }
        }

        fn context(&mut self) -> Context<'_> {
            Context::new(
                &mut self.pc,
                &mut self.heap,
                &mut self.call_stack,
                &mut self.result,
            )
        }
    }

    #[test]
    fn test_call_captures_arguments_and_return_address() {
        let mut fx = Fixture::with_frame();
        fx.pc.set_index(4);
        {
            let mut ctx = fx.context();
            ctx.push(Value::Int(1)).unwrap();
            ctx.push(Value::Int(2)).unwrap();
            call(&mut ctx, &[Value::Int(10), Value::Int(2)]).unwrap();
        }

        assert_eq!(fx.pc.index(), 10);
        assert_eq!(fx.call_stack.len(), 2);
        let frame = fx.call_stack.peek().unwrap();
        assert_eq!(frame.arguments, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(frame.return_to, 5);
    }

    #[test]
    fn test_call_underflow_propagates() {
        let mut fx = Fixture::with_frame();
        let mut ctx = fx.context();
        let result = call(&mut ctx, &[Value::Int(0), Value::Int(1)]);
        assert!(matches!(result, Err(VmError::TooFewOperands)));
    }

    #[test]
    fn test_ret_hands_results_to_caller() {
        let mut fx = Fixture::with_frame();
        {
            let mut ctx = fx.context();
            // Callee frame returning two values to the outer frame.
            ctx.call_stack().push(Frame::new(vec![], 7));
            ctx.multi_push(vec![Value::Int(1), Value::Int(2)]).unwrap();
            ret(&mut ctx, &[Value::Int(2)]).unwrap();
        }

        assert_eq!(fx.pc.index(), 7);
        assert_eq!(fx.call_stack.len(), 1);
        assert!(fx.result.is_none());
        let frame = fx.call_stack.peek_mut().unwrap();
        assert_eq!(
            frame.operands.multi_pop(2).unwrap(),
            vec![Value::Int(1), Value::Int(2)]
        );
    }

    #[test]
    fn test_ret_from_entry_frame_sets_result() {
        let mut fx = Fixture::with_frame();
        {
            let mut ctx = fx.context();
            ctx.push(Value::Int(8)).unwrap();
            ret(&mut ctx, &[Value::Int(1)]).unwrap();
        }

        assert_eq!(fx.pc.index(), 99);
        assert!(fx.call_stack.is_empty());
        assert_eq!(fx.result, Some(vec![Value::Int(8)]));
    }

    #[test]
    fn test_ret_without_frame_fails() {
        let mut fx = Fixture::with_frame();
        fx.call_stack.clear();
        let mut ctx = fx.context();
        assert!(matches!(
            ret(&mut ctx, &[]),
            Err(VmError::NoFrame)
        ));
    }

    #[test]
    fn test_branches() {
        let mut fx = Fixture::with_frame();
        let mut ctx = fx.context();

        ctx.push(Value::Bool(true)).unwrap();
        jt(&mut ctx, &[Value::Int(5)]).unwrap();
        assert_eq!(ctx.program_counter().index(), 5);

        ctx.push(Value::Int(0)).unwrap();
        jt(&mut ctx, &[Value::Int(9)]).unwrap();
        assert_eq!(ctx.program_counter().index(), 6);

        ctx.push(Value::Null).unwrap();
        jf(&mut ctx, &[Value::Int(2)]).unwrap();
        assert_eq!(ctx.program_counter().index(), 2);

        jmp(&mut ctx, &[Value::Int(0)]).unwrap();
        assert_eq!(ctx.program_counter().index(), 0);
    }
}
