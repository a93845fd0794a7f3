//! Intcode virtual machine
//!
//! This module contains the implementation of the VM that executes programs
//! encoded as flat sequences of signed integers, which serve as both code and
//! mutable data.
//!
//! ## Modular Architecture
//!
//! - **memory.rs**: Growable word store with zero-fill on out-of-range access.
//! - **types.rs**: Parameter modes, opcodes, instruction decoding and run states.
//! - **execution.rs**: Operand resolution and the behavior of each opcode.
//! - **io.rs**: FIFO input channel feeding the input opcode.
//! - **errors.rs**: Centralizes error handling for all VM operations.
//! - **vm.rs**: The fetch-decode-execute loop and the suspend/resume contract.

pub mod errors;
pub mod execution;
pub mod io;
pub mod memory;
pub mod types;
mod vm;

pub use errors::VMError;
pub use execution::{Effect, Operation};
pub use io::InputChannel;
pub use memory::Memory;
pub use types::{Instruction, Mode, Opcode, Pause, VMState};
pub use vm::VM;
