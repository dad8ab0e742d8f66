//! Instructions, mnemonics and programs
//!
//! A program is a JSON array of instruction objects:
//!
//! ```json
//! [
//!   {"mnemonic": "push", "immediates": [2, 3]},
//!   {"mnemonic": "add"},
//!   {"label": "end", "mnemonic": "ret", "immediates": [1], "comment": "done"}
//! ]
//! ```
//!
//! Mnemonics are open-ended strings; each machine assigns every mnemonic it
//! meets a dense small-integer opcode through its [`MnemonicTable`], and the
//! dispatch table is indexed by that opcode. Opcodes never appear in JSON.

use jsm_core::Value;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Dense per-machine alias of a mnemonic, used to index the dispatch table.
pub type Opcode = usize;

/// The built-in instruction mnemonics.
pub mod mnemonic {
    /// No operation
    pub const NOP: &str = "nop";
    /// Push each immediate onto the operand stack
    pub const PUSH: &str = "push";
    /// Discard the top n operands
    pub const POP: &str = "pop";
    /// Load from the global heap
    pub const LOAD: &str = "ld";
    /// Load a caller-supplied argument
    pub const LOAD_ARGUMENT: &str = "lda";
    /// Load from the frame-local heap
    pub const LOAD_LOCAL: &str = "ldl";
    /// Store into the global heap
    pub const STORE: &str = "st";
    /// Store into the frame-local heap
    pub const STORE_LOCAL: &str = "stl";
    /// Push a frame and jump to a subroutine
    pub const CALL: &str = "call";
    /// Pop the frame and return n results to the caller
    pub const RETURN: &str = "ret";
    /// Unconditional branch
    pub const JUMP: &str = "jmp";
    /// Branch if the popped value is true
    pub const JUMP_IF_TRUE: &str = "jt";
    /// Branch if the popped value is false
    pub const JUMP_IF_FALSE: &str = "jf";
    /// Equality test
    pub const EQUAL: &str = "eq";
    /// Inequality test
    pub const NOT_EQUAL: &str = "ne";
    /// Greater-than test
    pub const GREATER_THAN: &str = "gt";
    /// Greater-or-equal test
    pub const GREATER_OR_EQUAL: &str = "ge";
    /// Less-than test
    pub const LESS_THAN: &str = "lt";
    /// Less-or-equal test
    pub const LESS_OR_EQUAL: &str = "le";
    /// Boolean negation
    pub const NOT: &str = "not";
    /// Boolean conjunction
    pub const AND: &str = "and";
    /// Boolean disjunction
    pub const OR: &str = "or";
    /// Numeric negation
    pub const NEG: &str = "neg";
    /// Numeric addition
    pub const ADD: &str = "add";
    /// Numeric subtraction
    pub const SUBTRACT: &str = "sub";
    /// Numeric multiplication
    pub const MULTIPLY: &str = "mul";
    /// Numeric division
    pub const DIVIDE: &str = "div";
    /// Increment a global heap slot
    pub const INCREMENT: &str = "inc";
    /// Increment a frame-local heap slot
    pub const INCREMENT_LOCAL: &str = "incl";
    /// Decrement a global heap slot
    pub const DECREMENT: &str = "dec";
    /// Decrement a frame-local heap slot
    pub const DECREMENT_LOCAL: &str = "decl";
}

/// One instruction of a program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Optional label, resolved to this instruction's index by the preprocessor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// The instruction's mnemonic
    pub mnemonic: String,
    /// Values embedded in the instruction and handed to its handler
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub immediates: Vec<Value>,
    /// Free-form comment; ignored by the machine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Dense opcode assigned during preprocessing; never serialized
    #[serde(skip)]
    pub(crate) opcode: Opcode,
}

impl Instruction {
    /// Create an instruction with no label, immediates or comment.
    pub fn new(mnemonic: impl Into<String>) -> Self {
        Instruction {
            mnemonic: mnemonic.into(),
            ..Instruction::default()
        }
    }

    /// Attach immediates.
    pub fn with_immediates(mut self, immediates: Vec<Value>) -> Self {
        self.immediates = immediates;
        self
    }

    /// Attach a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The opcode assigned during preprocessing.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }
}

/// Per-machine registry assigning each mnemonic a stable dense opcode.
///
/// Opcodes are handed out in first-sight order and never reused, so they are
/// valid for the lifetime of the machine that owns the table; distinct
/// machines may disagree about a mnemonic's opcode.
#[derive(Debug, Default)]
pub struct MnemonicTable {
    opcodes: FxHashMap<String, Opcode>,
}

impl MnemonicTable {
    /// Create an empty table.
    pub fn new() -> Self {
        MnemonicTable::default()
    }

    /// The opcode of `mnemonic`, allocating the next dense one on first sight.
    pub fn opcode(&mut self, mnemonic: &str) -> Opcode {
        if let Some(opcode) = self.opcodes.get(mnemonic) {
            return *opcode;
        }
        let opcode = self.opcodes.len();
        self.opcodes.insert(mnemonic.to_string(), opcode);
        opcode
    }

    /// The opcode of `mnemonic`, if it has been seen.
    pub fn lookup(&self, mnemonic: &str) -> Option<Opcode> {
        self.opcodes.get(mnemonic).copied()
    }

    /// Number of registered mnemonics.
    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    /// Whether no mnemonic has been registered.
    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }
}

/// A sequence of instructions; serializes as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Program {
    /// The instructions, addressed by index
    pub instructions: Vec<Instruction>,
}

impl Program {
    /// Parse a program from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns a codec error for malformed JSON.
    pub fn from_json(json: &str) -> jsm_core::VmResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Program { instructions }
    }
}
