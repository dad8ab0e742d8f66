//! JSM core runtime
//!
//! This crate provides the memory model of the JSM virtual machine:
//! - The polymorphic JSON value with its coercion, equality and ordering laws
//! - The operand stack
//! - The string-keyed heap
//! - Activation frames and the call stack
//! - The program counter register
//!
//! Everything here is deliberately independent of the instruction set; the
//! `jsm-engine` crate builds the preprocessor, dispatch table and machine on
//! top of these pieces.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod frame;
pub mod heap;
pub mod json;
pub mod pc;
pub mod stack;
pub mod value;

pub use frame::{CallStack, Frame};
pub use heap::Heap;
pub use pc::ProgramCounter;
pub use stack::Stack;
pub use value::{HostPtr, Value, ValueType, MAX_SAFE_INTEGER};

/// VM execution errors
///
/// Failures are explicit return values throughout the machine; nothing in the
/// library panics on malformed programs or exhausted stacks.
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    /// Pop or peek on an empty operand stack
    #[error("empty stack")]
    EmptyStack,

    /// Multi-pop or n-ary apply with fewer operands than requested
    #[error("too few operands")]
    TooFewOperands,

    /// An instruction needed the current frame but the call stack is empty
    #[error("no frame")]
    NoFrame,

    /// `lda` index outside the current frame's argument list
    #[error("argument out of range")]
    ArgumentOutOfRange,

    /// Heap load of an unbound key
    #[error("not found: {0}")]
    NotFound(String),

    /// `div` with a divisor of exactly 0.0
    #[error("divide by zero")]
    DivideByZero,

    /// Execution or dump attempted with no loaded program
    #[error("no program")]
    NoProgram,

    /// Empty mnemonic passed to `extend`
    #[error("no mnemonic")]
    NoMnemonic,

    /// A mnemonic that requires an immediate got none
    #[error("no immediate")]
    NoImmediate,

    /// More immediates than the mnemonic's rule allows
    #[error("too many immediates")]
    TooManyImmediates,

    /// Branch or call target missing from the immediates
    #[error("no address")]
    NoAddress,

    /// Branch or call target that is not a non-negative integer
    #[error("invalid address")]
    InvalidAddress,

    /// Count immediate that is not an integer or is below the mnemonic's minimum
    #[error("invalid count")]
    InvalidCount,

    /// Dispatch on an opcode with no bound handler
    #[error("cannot process {0}")]
    CannotProcess(String),

    /// `extend` on a mnemonic whose opcode is already bound
    #[error("{0} already defined")]
    AlreadyDefined(String),

    /// A preprocessing failure, carrying the offending instruction as JSON
    #[error("{source} in {instruction}")]
    Preprocess {
        /// The underlying immediate-rule failure
        #[source]
        source: Box<VmError>,
        /// The offending instruction, serialized
        instruction: String,
    },

    /// JSON encode/decode failure at the dump/restore boundary
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Result type alias for VM operations
pub type VmResult<T> = Result<T, VmError>;

/// Objects that can dump their entire state and restore themselves from it.
///
/// The wire format is JSON: an array for stacks, an object for heaps, and the
/// machine-state object described by the machine itself.
pub trait Restorable {
    /// Serialize the full state to bytes.
    fn dump(&self) -> VmResult<Vec<u8>>;

    /// Replace the current state with the one encoded in `data`.
    fn restore(&mut self, data: &[u8]) -> VmResult<()>;
}
