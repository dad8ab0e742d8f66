//! Program preprocessing
//!
//! Two passes over the raw program. The first scans labels into a table
//! mapping each label to the index of the instruction carrying it (on
//! duplicates the highest index wins, since the scan overwrites as it goes).
//! The second lowers every instruction: it runs the mnemonic's immediate rule
//! to validate and coerce the immediates, resolves label operands to
//! addresses, and assigns the instruction its opcode from the machine's
//! mnemonic table.
//!
//! An unresolved label is not an error: it resolves to address 0, matching
//! the machine's historical behaviour, and leaves a diagnostic on the
//! preprocess output's warnings list.

use jsm_core::{Value, VmError, VmResult};
use rustc_hash::FxHashMap;

use crate::instruction::{mnemonic, Instruction, MnemonicTable, Program};

/// Validates and coerces the immediates of one mnemonic.
///
/// Rules receive the preprocessing context (label table plus the mnemonic
/// under work, for diagnostics) and the raw immediates, and return the
/// lowered immediates.
pub type ImmediateRule =
    Box<dyn Fn(&mut PreprocessContext<'_>, &[Value]) -> VmResult<Vec<Value>>>;

/// Per-program state visible to immediate rules.
pub struct PreprocessContext<'p> {
    labels: &'p FxHashMap<String, usize>,
    mnemonic: &'p str,
    warnings: &'p mut Vec<String>,
}

impl PreprocessContext<'_> {
    /// The label table of the program being preprocessed.
    pub fn labels(&self) -> &FxHashMap<String, usize> {
        self.labels
    }

    /// The mnemonic currently being preprocessed.
    pub fn mnemonic(&self) -> &str {
        self.mnemonic
    }

    /// Record a diagnostic.
    pub fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Coerce an operand to an address.
    ///
    /// Strings resolve through the label table; an unknown label resolves to
    /// 0 with a warning. Anything else coerces to an integer.
    pub fn to_address(&mut self, value: &Value) -> Value {
        match value {
            Value::Str(label) => match self.labels.get(label) {
                Some(index) => Value::Int(*index as i64),
                None => {
                    self.warn(format!(
                        "unresolved label {:?} in {}; resolved to address 0",
                        label, self.mnemonic
                    ));
                    Value::Int(0)
                }
            },
            other => Value::Int(other.to_integer()),
        }
    }
}

/// A preprocessed program plus any diagnostics raised while lowering it.
#[derive(Debug)]
pub struct Preprocessed {
    /// The executable program: immediates validated, opcodes assigned
    pub program: Program,
    /// Unresolved-label diagnostics and other non-fatal findings
    pub warnings: Vec<String>,
}

/// The preprocessor: a table of per-mnemonic immediate rules.
pub struct Preprocessor {
    rules: FxHashMap<String, ImmediateRule>,
}

impl Preprocessor {
    /// Create a preprocessor with the built-in immediate rules installed.
    pub fn new() -> Self {
        let mut pp = Preprocessor {
            rules: FxHashMap::default(),
        };
        pp.install(mnemonic::PUSH, pass_through);
        pp.install(mnemonic::POP, at_most_one_integer);
        pp.install(mnemonic::RETURN, at_most_one_integer);
        pp.install(mnemonic::LOAD_ARGUMENT, at_most_one_integer);
        pp.install(mnemonic::LOAD, at_most_one_string);
        pp.install(mnemonic::LOAD_LOCAL, at_most_one_string);
        pp.install(mnemonic::INCREMENT, at_most_one_string);
        pp.install(mnemonic::INCREMENT_LOCAL, at_most_one_string);
        pp.install(mnemonic::DECREMENT, at_most_one_string);
        pp.install(mnemonic::DECREMENT_LOCAL, at_most_one_string);
        pp.install(mnemonic::STORE, store_operands);
        pp.install(mnemonic::STORE_LOCAL, store_operands);
        pp.install(mnemonic::CALL, call_operands);
        pp.install(mnemonic::JUMP, one_address);
        pp.install(mnemonic::JUMP_IF_TRUE, one_address);
        pp.install(mnemonic::JUMP_IF_FALSE, one_address);
        pp.install(mnemonic::EQUAL, at_most_one_operand);
        pp.install(mnemonic::NOT_EQUAL, at_most_one_operand);
        pp.install(mnemonic::GREATER_THAN, at_most_one_operand);
        pp.install(mnemonic::GREATER_OR_EQUAL, at_most_one_operand);
        pp.install(mnemonic::LESS_THAN, at_most_one_operand);
        pp.install(mnemonic::LESS_OR_EQUAL, at_most_one_operand);
        pp.install(mnemonic::ADD, at_most_one_number);
        pp.install(mnemonic::SUBTRACT, at_most_one_number);
        pp.install(mnemonic::MULTIPLY, at_most_one_number);
        pp.install(mnemonic::DIVIDE, at_most_one_number);
        pp
    }

    fn install(
        &mut self,
        name: &str,
        rule: fn(&mut PreprocessContext<'_>, &[Value]) -> VmResult<Vec<Value>>,
    ) {
        self.rules.insert(name.to_string(), Box::new(rule));
    }

    /// Register a rule for an extension mnemonic. `None` registers the
    /// pass-through rule.
    ///
    /// # Errors
    ///
    /// Fails on an empty mnemonic or one that already has a rule.
    pub fn extend(&mut self, name: &str, rule: Option<ImmediateRule>) -> VmResult<()> {
        if name.is_empty() {
            return Err(VmError::NoMnemonic);
        }
        if self.rules.contains_key(name) {
            return Err(VmError::AlreadyDefined(name.to_string()));
        }
        self.rules
            .insert(name.to_string(), rule.unwrap_or_else(|| Box::new(pass_through)));
        Ok(())
    }

    /// Lower a raw program into an executable one.
    ///
    /// # Errors
    ///
    /// Fails on an empty mnemonic or an immediate-rule violation; the error
    /// wraps the offending instruction serialized as JSON.
    pub fn preprocess(
        &self,
        program: &Program,
        mnemonics: &mut MnemonicTable,
    ) -> VmResult<Preprocessed> {
        let mut labels = FxHashMap::default();
        for (index, inst) in program.instructions.iter().enumerate() {
            if let Some(label) = &inst.label {
                labels.insert(label.clone(), index);
            }
        }

        let mut warnings = Vec::new();
        let mut instructions = Vec::with_capacity(program.len());
        for inst in &program.instructions {
            if inst.mnemonic.is_empty() {
                return Err(at_instruction(VmError::NoMnemonic, inst));
            }

            let mut ctx = PreprocessContext {
                labels: &labels,
                mnemonic: &inst.mnemonic,
                warnings: &mut warnings,
            };
            let immediates = match self.rules.get(&inst.mnemonic) {
                Some(rule) => rule(&mut ctx, &inst.immediates),
                None => no_immediate(&mut ctx, &inst.immediates),
            }
            .map_err(|e| at_instruction(e, inst))?;

            instructions.push(Instruction {
                label: inst.label.clone(),
                mnemonic: inst.mnemonic.clone(),
                immediates,
                comment: None,
                opcode: mnemonics.opcode(&inst.mnemonic),
            });
        }

        Ok(Preprocessed {
            program: Program { instructions },
            warnings,
        })
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Preprocessor::new()
    }
}

fn at_instruction(error: VmError, inst: &Instruction) -> VmError {
    VmError::Preprocess {
        source: Box::new(error),
        instruction: serde_json::to_string(inst).unwrap_or_else(|_| inst.mnemonic.clone()),
    }
}

fn pass_through(_ctx: &mut PreprocessContext<'_>, imms: &[Value]) -> VmResult<Vec<Value>> {
    Ok(imms.to_vec())
}

fn no_immediate(_ctx: &mut PreprocessContext<'_>, imms: &[Value]) -> VmResult<Vec<Value>> {
    if imms.is_empty() {
        Ok(Vec::new())
    } else {
        Err(VmError::TooManyImmediates)
    }
}

fn at_most_one_integer(_ctx: &mut PreprocessContext<'_>, imms: &[Value]) -> VmResult<Vec<Value>> {
    match imms {
        [] => Ok(Vec::new()),
        [v] => Ok(vec![Value::Int(v.to_integer())]),
        _ => Err(VmError::TooManyImmediates),
    }
}

fn at_most_one_string(_ctx: &mut PreprocessContext<'_>, imms: &[Value]) -> VmResult<Vec<Value>> {
    match imms {
        [] => Ok(Vec::new()),
        [v] => Ok(vec![Value::Str(v.to_string())]),
        _ => Err(VmError::TooManyImmediates),
    }
}

fn at_most_one_number(_ctx: &mut PreprocessContext<'_>, imms: &[Value]) -> VmResult<Vec<Value>> {
    match imms {
        [] => Ok(Vec::new()),
        [v] => Ok(vec![Value::Num(v.to_number())]),
        _ => Err(VmError::TooManyImmediates),
    }
}

fn at_most_one_operand(_ctx: &mut PreprocessContext<'_>, imms: &[Value]) -> VmResult<Vec<Value>> {
    match imms {
        [] => Ok(Vec::new()),
        [v] => Ok(vec![v.clone()]),
        _ => Err(VmError::TooManyImmediates),
    }
}

fn store_operands(_ctx: &mut PreprocessContext<'_>, imms: &[Value]) -> VmResult<Vec<Value>> {
    match imms {
        [] => Ok(Vec::new()),
        [key] => Ok(vec![Value::Str(key.to_string())]),
        [key, value] => Ok(vec![Value::Str(key.to_string()), value.clone()]),
        _ => Err(VmError::TooManyImmediates),
    }
}

fn one_address(ctx: &mut PreprocessContext<'_>, imms: &[Value]) -> VmResult<Vec<Value>> {
    match imms {
        [] => Err(VmError::NoImmediate),
        [v] => Ok(vec![ctx.to_address(v)]),
        _ => Err(VmError::TooManyImmediates),
    }
}

fn call_operands(ctx: &mut PreprocessContext<'_>, imms: &[Value]) -> VmResult<Vec<Value>> {
    match imms {
        [] => Err(VmError::NoImmediate),
        [addr] => Ok(vec![ctx.to_address(addr)]),
        [addr, argc] => Ok(vec![ctx.to_address(addr), Value::Int(argc.to_integer())]),
        _ => Err(VmError::TooManyImmediates),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preprocess(program: Program) -> VmResult<Preprocessed> {
        Preprocessor::new().preprocess(&program, &mut MnemonicTable::new())
    }

    #[test]
    fn test_labels_resolve_and_immediates_coerce() {
        let program: Program = vec![
            Instruction::new(mnemonic::PUSH)
                .with_immediates(vec![Value::Int(3), Value::Num(4.5)]),
            Instruction::new(mnemonic::JUMP).with_immediates(vec![Value::from("abc")]),
            Instruction::new(mnemonic::RETURN)
                .with_label("abc")
                .with_immediates(vec![Value::Num(2.0)]),
        ]
        .into();

        let out = preprocess(program).unwrap();
        assert!(out.warnings.is_empty());

        let insts = &out.program.instructions;
        assert_eq!(insts[0].immediates, vec![Value::Int(3), Value::Num(4.5)]);
        assert_eq!(insts[1].immediates, vec![Value::Int(2)]);
        assert_eq!(insts[2].immediates, vec![Value::Int(2)]);
        assert_eq!(insts[2].label.as_deref(), Some("abc"));
        assert!(insts.iter().all(|i| i.comment.is_none()));
    }

    #[test]
    fn test_opcodes_dense_per_mnemonic() {
        let program: Program = vec![
            Instruction::new(mnemonic::PUSH).with_immediates(vec![Value::Int(1)]),
            Instruction::new(mnemonic::NOP),
            Instruction::new(mnemonic::PUSH).with_immediates(vec![Value::Int(2)]),
        ]
        .into();

        let out = preprocess(program).unwrap();
        let insts = &out.program.instructions;
        assert_eq!(insts[0].opcode, insts[2].opcode);
        assert_ne!(insts[0].opcode, insts[1].opcode);
    }

    #[test]
    fn test_duplicate_labels_highest_index_wins() {
        let program: Program = vec![
            Instruction::new(mnemonic::JUMP).with_immediates(vec![Value::from("x")]),
            Instruction::new(mnemonic::NOP).with_label("x"),
            Instruction::new(mnemonic::NOP).with_label("x"),
        ]
        .into();

        let out = preprocess(program).unwrap();
        assert_eq!(
            out.program.instructions[0].immediates,
            vec![Value::Int(2)]
        );
    }

    #[test]
    fn test_unresolved_label_is_zero_with_warning() {
        let program: Program = vec![
            Instruction::new(mnemonic::JUMP).with_immediates(vec![Value::from("nowhere")])
        ]
        .into();

        let out = preprocess(program).unwrap();
        assert_eq!(
            out.program.instructions[0].immediates,
            vec![Value::Int(0)]
        );
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("nowhere"));
        assert!(out.warnings[0].contains("jmp"));
    }

    #[test]
    fn test_numeric_address_coerces() {
        let program: Program = vec![
            Instruction::new(mnemonic::JUMP).with_immediates(vec![Value::Num(2.9)]),
            Instruction::new(mnemonic::NOP),
            Instruction::new(mnemonic::NOP),
        ]
        .into();

        let out = preprocess(program).unwrap();
        assert_eq!(
            out.program.instructions[0].immediates,
            vec![Value::Int(2)]
        );
    }

    #[test]
    fn test_jump_requires_address() {
        let program: Program = vec![Instruction::new(mnemonic::JUMP)].into();
        match preprocess(program) {
            Err(VmError::Preprocess {
                source,
                instruction,
            }) => {
                assert!(matches!(*source, VmError::NoImmediate));
                assert!(instruction.contains("\"jmp\""));
            }
            other => panic!("expected preprocess failure, got {:?}", other),
        }
    }

    #[test]
    fn test_too_many_immediates() {
        let program: Program = vec![Instruction::new(mnemonic::NOT)
            .with_immediates(vec![Value::Int(1)])]
        .into();
        match preprocess(program) {
            Err(VmError::Preprocess { source, .. }) => {
                assert!(matches!(*source, VmError::TooManyImmediates));
            }
            other => panic!("expected preprocess failure, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_mnemonic_fails() {
        let program: Program = vec![Instruction::new("")].into();
        match preprocess(program) {
            Err(VmError::Preprocess { source, .. }) => {
                assert!(matches!(*source, VmError::NoMnemonic));
            }
            other => panic!("expected preprocess failure, got {:?}", other),
        }
    }

    #[test]
    fn test_store_immediate_forms() {
        let program: Program = vec![
            Instruction::new(mnemonic::STORE),
            Instruction::new(mnemonic::STORE).with_immediates(vec![Value::Int(7)]),
            Instruction::new(mnemonic::STORE_LOCAL)
                .with_immediates(vec![Value::from("k"), Value::Num(1.5)]),
        ]
        .into();

        let out = preprocess(program).unwrap();
        let insts = &out.program.instructions;
        assert!(insts[0].immediates.is_empty());
        assert_eq!(insts[1].immediates, vec![Value::from("7")]);
        assert_eq!(
            insts[2].immediates,
            vec![Value::from("k"), Value::Num(1.5)]
        );
    }

    #[test]
    fn test_call_forms() {
        let program: Program = vec![
            Instruction::new(mnemonic::CALL)
                .with_label("f")
                .with_immediates(vec![Value::from("f"), Value::Num(2.0)]),
        ]
        .into();

        let out = preprocess(program).unwrap();
        assert_eq!(
            out.program.instructions[0].immediates,
            vec![Value::Int(0), Value::Int(2)]
        );
    }

    #[test]
    fn test_unknown_mnemonic_requires_zero_immediates() {
        let ok: Program = vec![Instruction::new("mystery")].into();
        assert!(preprocess(ok).is_ok());

        let bad: Program =
            vec![Instruction::new("mystery").with_immediates(vec![Value::Int(1)])].into();
        assert!(preprocess(bad).is_err());
    }

    #[test]
    fn test_extend_rules() {
        let mut pp = Preprocessor::new();
        assert!(matches!(pp.extend("", None), Err(VmError::NoMnemonic)));
        assert!(matches!(
            pp.extend(mnemonic::PUSH, None),
            Err(VmError::AlreadyDefined(_))
        ));

        // Default extension rule passes immediates through unchanged.
        pp.extend("dup", None).unwrap();
        let program: Program =
            vec![Instruction::new("dup").with_immediates(vec![Value::from("x")])].into();
        let out = pp
            .preprocess(&program, &mut MnemonicTable::new())
            .unwrap();
        assert_eq!(
            out.program.instructions[0].immediates,
            vec![Value::from("x")]
        );

        assert!(matches!(
            pp.extend("dup", None),
            Err(VmError::AlreadyDefined(_))
        ));
    }
}
