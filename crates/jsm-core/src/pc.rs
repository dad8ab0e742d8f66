//! Program counter register

use serde::{Deserialize, Serialize};

/// The instruction index register.
///
/// Execution halts when the counter leaves `[0, program length)`; the machine
/// arranges that by giving the entry frame a return address one past the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramCounter(usize);

impl ProgramCounter {
    /// Create a counter at index 0.
    pub fn new() -> Self {
        ProgramCounter::default()
    }

    /// The index of the current instruction.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }

    /// Set the counter to an absolute index.
    #[inline]
    pub fn set_index(&mut self, index: usize) {
        self.0 = index;
    }

    /// Advance to the next instruction.
    #[inline]
    pub fn increment(&mut self) {
        self.0 += 1;
    }

    /// Reset to index 0.
    pub fn clear(&mut self) {
        self.0 = 0;
    }
}
