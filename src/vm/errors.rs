//! Error types for VM operations
//!
//! This module defines all possible error conditions that can occur during VM execution.
//!
//! Everything here is fatal to a computation except `EmptyInput`, which the
//! engine converts into the `AwaitingInput` pause instead of returning it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error variants that can occur during VM execution
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VMError {
    /// A read, write or jump referenced an address below zero
    #[error("Negative address: {0}")]
    NegativeAddress(i64),

    /// A parameter mode digit outside {0, 1, 2}
    #[error("Invalid parameter mode {mode} in instruction {instruction}")]
    InvalidMode { instruction: i64, mode: i64 },

    /// Digits above the ten-thousands place are not part of any instruction
    #[error("Malformed instruction: {0}")]
    MalformedInstruction(i64),

    /// The opcode part of the instruction does not name an operation
    #[error("Unknown operation: {0}")]
    UnknownOperation(i64),

    /// An input operation ran with nothing queued
    #[error("Input queue is empty")]
    EmptyInput,

    /// A write destination was encoded in immediate mode
    #[error("Immediate mode used for write parameter in instruction {instruction}")]
    ImmediateWrite { instruction: i64 },

    /// Growing memory to reach the address failed
    #[error("Cannot allocate memory up to address {0}")]
    MemoryExhausted(i64),

    /// The result of an operation does not fit in a machine word
    #[error("Arithmetic overflow during {operation}")]
    ArithmeticOverflow { operation: String },
}

impl VMError {
    /// Whether the error ends the computation
    pub fn is_fatal(&self) -> bool {
        !matches!(self, VMError::EmptyInput)
    }
}
