//! JSM interpreter engine
//!
//! This crate turns the `jsm-core` memory model into a running machine:
//! - Instructions, mnemonics and the per-machine opcode table
//! - The preprocessor (label resolution + immediate validation)
//! - The processor (opcode-indexed dispatch table and built-in handlers)
//! - The [`Machine`] assembling all of it behind `run`/`extend`/`clear` and
//!   JSON dump/restore
//!
//! # Example
//!
//! ```
//! use jsm_engine::{Machine, Program, Value};
//!
//! let program = Program::from_json(
//!     r#"[
//!         {"mnemonic": "push", "immediates": [2, 3]},
//!         {"mnemonic": "add"},
//!         {"mnemonic": "ret", "immediates": [1]}
//!     ]"#,
//! )
//! .unwrap();
//!
//! let mut machine = Machine::new();
//! let result = machine.run(&program, vec![]).unwrap();
//! assert!(result.equal(&Value::Arr(vec![Value::Int(5)])));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod context;
pub mod instruction;
pub mod machine;
pub mod preprocessor;
pub mod processor;

pub use context::Context;
pub use instruction::{mnemonic, Instruction, MnemonicTable, Opcode, Program};
pub use machine::Machine;
pub use preprocessor::{ImmediateRule, Preprocessed, PreprocessContext, Preprocessor};
pub use processor::Handler;

// Re-export the core types a machine embedder needs.
pub use jsm_core::{Restorable, Value, VmError, VmResult};
