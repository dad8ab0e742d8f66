//! End-to-end machine scenarios, including the shipped demo programs.

use jsm_core::{Restorable, Value, VmError};
use jsm_engine::{mnemonic, Handler, ImmediateRule, Instruction, Machine, Program};

fn fibonacci_program() -> Program {
    Program::from_json(include_str!("../../../demos/fibonacci.json")).unwrap()
}

fn sum_of_series_program() -> Program {
    Program::from_json(include_str!("../../../demos/sum_of_series.json")).unwrap()
}

fn assert_result(result: &Value, expected: &[i64]) {
    let expected = Value::Arr(expected.iter().copied().map(Value::Int).collect());
    assert!(
        result.equal(&expected),
        "expected {:?}, got {:?}",
        expected,
        result
    );
}

#[test]
fn test_arithmetic() {
    let program = Program::from_json(
        r#"[
            {"mnemonic": "push", "immediates": [2]},
            {"mnemonic": "push", "immediates": [3]},
            {"mnemonic": "add"},
            {"mnemonic": "ret", "immediates": [1]}
        ]"#,
    )
    .unwrap();

    let result = Machine::new().run(&program, vec![]).unwrap();
    assert_result(&result, &[5]);
}

#[test]
fn test_divide_by_zero() {
    let program = Program::from_json(
        r#"[
            {"mnemonic": "push", "immediates": [1]},
            {"mnemonic": "push", "immediates": [0]},
            {"mnemonic": "div"},
            {"mnemonic": "ret", "immediates": [1]}
        ]"#,
    )
    .unwrap();

    let result = Machine::new().run(&program, vec![]);
    assert!(matches!(result, Err(VmError::DivideByZero)));
}

#[test]
fn test_labelled_jump() {
    let program = Program::from_json(
        r#"[
            {"mnemonic": "push", "immediates": [1]},
            {"mnemonic": "jmp", "immediates": ["end"]},
            {"mnemonic": "push", "immediates": [2]},
            {"label": "end", "mnemonic": "ret", "immediates": [1]}
        ]"#,
    )
    .unwrap();

    let result = Machine::new().run(&program, vec![]).unwrap();
    assert_result(&result, &[1]);
}

#[test]
fn test_fibonacci_program() {
    let mut m = Machine::new();
    for (n, fib) in [(0, 0), (1, 1), (2, 1), (6, 8), (10, 55)] {
        let result = m.run(&fibonacci_program(), vec![Value::Int(n)]).unwrap();
        assert_result(&result, &[fib]);
    }
}

#[test]
fn test_sum_of_series_program() {
    let mut m = Machine::new();
    for (n, sum) in [(0, 0), (1, 1), (10, 55), (100, 5050)] {
        let result = m.run(&sum_of_series_program(), vec![Value::Int(n)]).unwrap();
        assert_result(&result, &[sum]);
    }
}

#[test]
fn test_machine_reusable_across_programs() {
    let mut m = Machine::new();
    let fib = m.run(&fibonacci_program(), vec![Value::Int(6)]).unwrap();
    assert_result(&fib, &[8]);
    let sum = m.run(&sum_of_series_program(), vec![Value::Int(10)]).unwrap();
    assert_result(&sum, &[55]);
}

#[test]
fn test_extension_dup() {
    let mut m = Machine::new();
    let dup: Handler = Box::new(|ctx, _imms| {
        let top = ctx.operand_stack()?.peek()?.clone();
        ctx.push(top)?;
        ctx.program_counter().increment();
        Ok(())
    });
    m.extend("dup", dup, None).unwrap();

    let program = Program::from_json(
        r#"[
            {"mnemonic": "push", "immediates": [7]},
            {"mnemonic": "dup"},
            {"mnemonic": "add"},
            {"mnemonic": "ret", "immediates": [1]}
        ]"#,
    )
    .unwrap();

    let result = m.run(&program, vec![]).unwrap();
    assert_result(&result, &[14]);
}

fn fibonacci(n: i64) -> i64 {
    if n < 2 {
        n
    } else {
        fibonacci(n - 1) + fibonacci(n - 2)
    }
}

#[test]
fn test_extension_native_fib() {
    let mut m = Machine::new();
    let fib: Handler = Box::new(|ctx, _imms| {
        let n = ctx.pop()?.to_integer();
        ctx.push(Value::Int(fibonacci(n)))?;
        ctx.program_counter().increment();
        Ok(())
    });
    m.extend("fib", fib, None).unwrap();

    let program: Program = vec![
        Instruction::new(mnemonic::LOAD_ARGUMENT).with_immediates(vec![Value::Int(0)]),
        Instruction::new("fib"),
        Instruction::new(mnemonic::RETURN).with_immediates(vec![Value::Int(1)]),
    ]
    .into();

    let result = m.run(&program, vec![Value::Int(6)]).unwrap();
    assert_result(&result, &[8]);

    // The interpreted program agrees with the native one.
    let interpreted = m.run(&fibonacci_program(), vec![Value::Int(6)]).unwrap();
    assert!(interpreted.equal(&result));
}

#[test]
fn test_extension_with_immediate_rule() {
    let mut m = Machine::new();
    let addn: Handler = Box::new(|ctx, imms| {
        let n = imms.first().map(Value::to_number).unwrap_or(0.0);
        let top = ctx.pop()?.to_number();
        ctx.push(Value::Num(top + n))?;
        ctx.program_counter().increment();
        Ok(())
    });
    let rule: ImmediateRule = Box::new(|_ctx, imms| match imms {
        [v] => Ok(vec![Value::Num(v.to_number())]),
        _ => Err(VmError::NoImmediate),
    });
    m.extend("addn", addn, Some(rule)).unwrap();

    // The rule coerces the string immediate to a number before execution.
    let program = Program::from_json(
        r#"[
            {"mnemonic": "push", "immediates": [40]},
            {"mnemonic": "addn", "immediates": ["2"]},
            {"mnemonic": "ret", "immediates": [1]}
        ]"#,
    )
    .unwrap();
    let result = m.run(&program, vec![]).unwrap();
    assert_result(&result, &[42]);

    // And enforces its arity at preprocess time.
    let missing = Program::from_json(r#"[{"mnemonic": "addn"}]"#).unwrap();
    assert!(matches!(
        m.run(&missing, vec![]),
        Err(VmError::Preprocess { .. })
    ));
}

#[test]
fn test_dump_restore_after_run() {
    let mut m = Machine::new();
    let program = Program::from_json(
        r#"[
            {"mnemonic": "push", "immediates": [1]},
            {"mnemonic": "st", "immediates": ["x"]},
            {"mnemonic": "inc", "immediates": ["x"]},
            {"mnemonic": "ret"}
        ]"#,
    )
    .unwrap();
    m.run(&program, vec![]).unwrap();

    let dumped = m.dump().unwrap();
    let mut restored = Machine::new();
    restored.restore(&dumped).unwrap();

    let first: Value = serde_json::from_slice(&dumped).unwrap();
    let second: Value = serde_json::from_slice(&restored.dump().unwrap()).unwrap();
    assert!(first.equal(&second));
}

#[test]
fn test_dump_restore_through_file() {
    let mut m = Machine::new();
    m.run(&fibonacci_program(), vec![Value::Int(6)]).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("machine.json");
    std::fs::write(&path, m.dump().unwrap()).unwrap();

    let mut restored = Machine::new();
    restored.restore(&std::fs::read(&path).unwrap()).unwrap();

    let first: Value = serde_json::from_slice(&m.dump().unwrap()).unwrap();
    let second: Value = serde_json::from_slice(&restored.dump().unwrap()).unwrap();
    assert!(first.equal(&second));
}

#[test]
fn test_call_with_too_few_operands_fails() {
    // call wants one argument but the stack is empty.
    let program = Program::from_json(
        r#"[
            {"mnemonic": "call", "immediates": ["f", 1]},
            {"label": "f", "mnemonic": "ret"}
        ]"#,
    )
    .unwrap();
    let result = Machine::new().run(&program, vec![]);
    assert!(matches!(result, Err(VmError::TooFewOperands)));
}

#[test]
fn test_comparison_and_logic_ops() {
    let program = Program::from_json(
        r#"[
            {"mnemonic": "push", "immediates": [3]},
            {"mnemonic": "eq", "immediates": [3]},
            {"mnemonic": "push", "immediates": [2]},
            {"mnemonic": "gt", "immediates": [5]},
            {"mnemonic": "not"},
            {"mnemonic": "and"},
            {"mnemonic": "ret", "immediates": [1]}
        ]"#,
    )
    .unwrap();

    // (3 == 3) && !(2 > 5)
    let result = Machine::new().run(&program, vec![]).unwrap();
    assert!(result.equal(&Value::Arr(vec![Value::Bool(true)])));
}

#[test]
fn test_global_heap_ops() {
    let program = Program::from_json(
        r#"[
            {"mnemonic": "push", "immediates": [5]},
            {"mnemonic": "st", "immediates": ["counter"]},
            {"mnemonic": "inc", "immediates": ["counter"]},
            {"mnemonic": "inc", "immediates": ["counter"]},
            {"mnemonic": "dec", "immediates": ["counter"]},
            {"mnemonic": "ld", "immediates": ["counter"]},
            {"mnemonic": "ret", "immediates": [1]}
        ]"#,
    )
    .unwrap();

    let result = Machine::new().run(&program, vec![]).unwrap();
    assert_result(&result, &[6]);
}

#[test]
fn test_multi_value_return() {
    let program = Program::from_json(
        r#"[
            {"mnemonic": "push", "immediates": [1, 2, 3]},
            {"mnemonic": "ret", "immediates": [3]}
        ]"#,
    )
    .unwrap();

    let result = Machine::new().run(&program, vec![]).unwrap();
    assert_result(&result, &[1, 2, 3]);
}
