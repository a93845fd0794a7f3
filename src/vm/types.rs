//! Type definitions for the virtual machine
//!
//! This module contains the core data types used by the VM: parameter modes,
//! opcodes, decoded instructions, and the engine's run states.
//!
//! An instruction word is read as if left-padded to five decimal digits:
//!
//! ```text
//!   ABCDE
//!   |||++- opcode
//!   ||+--- mode of parameter 1
//!   |+---- mode of parameter 2
//!   +----- mode of parameter 3
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::vm::errors::VMError;

/// How a single operand is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Operand is an address to dereference
    Position,

    /// Operand is the value itself
    Immediate,

    /// Operand is an offset from the relative base, then dereferenced
    Relative,
}

impl Mode {
    fn from_digit(instruction: i64, digit: i64) -> Result<Self, VMError> {
        match digit {
            0 => Ok(Mode::Position),
            1 => Ok(Mode::Immediate),
            2 => Ok(Mode::Relative),
            mode => Err(VMError::InvalidMode { instruction, mode }),
        }
    }
}

/// Operation types for the virtual machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// `mem[out] = a + b`
    Add,

    /// `mem[out] = a * b`
    Multiply,

    /// `mem[out] = next input`
    Input,

    /// Emit `a` and pause
    Output,

    /// Jump to `b` when `a != 0`
    JumpIfTrue,

    /// Jump to `b` when `a == 0`
    JumpIfFalse,

    /// `mem[out] = (a < b) as i64`
    LessThan,

    /// `mem[out] = (a == b) as i64`
    Equals,

    /// `relative_base += a`
    AdjustRelativeBase,

    /// Stop the machine
    Halt,
}

impl Opcode {
    /// Map the two low decimal digits of an instruction to an opcode
    pub fn from_code(code: i64) -> Result<Self, VMError> {
        match code {
            1 => Ok(Opcode::Add),
            2 => Ok(Opcode::Multiply),
            3 => Ok(Opcode::Input),
            4 => Ok(Opcode::Output),
            5 => Ok(Opcode::JumpIfTrue),
            6 => Ok(Opcode::JumpIfFalse),
            7 => Ok(Opcode::LessThan),
            8 => Ok(Opcode::Equals),
            9 => Ok(Opcode::AdjustRelativeBase),
            99 => Ok(Opcode::Halt),
            other => Err(VMError::UnknownOperation(other)),
        }
    }

    /// Numeric opcode as it appears in a program
    pub fn code(self) -> i64 {
        match self {
            Opcode::Add => 1,
            Opcode::Multiply => 2,
            Opcode::Input => 3,
            Opcode::Output => 4,
            Opcode::JumpIfTrue => 5,
            Opcode::JumpIfFalse => 6,
            Opcode::LessThan => 7,
            Opcode::Equals => 8,
            Opcode::AdjustRelativeBase => 9,
            Opcode::Halt => 99,
        }
    }

    /// Number of parameter words following the instruction word
    pub fn n_params(self) -> usize {
        match self {
            Opcode::Add | Opcode::Multiply | Opcode::LessThan | Opcode::Equals => 3,
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => 2,
            Opcode::Input | Opcode::Output | Opcode::AdjustRelativeBase => 1,
            Opcode::Halt => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Multiply => "mul",
            Opcode::Input => "in",
            Opcode::Output => "out",
            Opcode::JumpIfTrue => "jnz",
            Opcode::JumpIfFalse => "jz",
            Opcode::LessThan => "lt",
            Opcode::Equals => "eq",
            Opcode::AdjustRelativeBase => "arb",
            Opcode::Halt => "halt",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A decoded instruction word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The undecoded word, kept for diagnostics
    pub raw: i64,

    pub opcode: Opcode,

    /// Modes for parameters 1, 2 and 3, in that order
    pub modes: [Mode; 3],
}

impl Instruction {
    /// Decode a raw instruction word into opcode and parameter modes
    pub fn decode(raw: i64) -> Result<Self, VMError> {
        if raw < 0 {
            return Err(VMError::UnknownOperation(raw));
        }
        if raw >= 100_000 {
            return Err(VMError::MalformedInstruction(raw));
        }

        let modes = [
            Mode::from_digit(raw, raw / 100 % 10)?,
            Mode::from_digit(raw, raw / 1_000 % 10)?,
            Mode::from_digit(raw, raw / 10_000 % 10)?,
        ];
        let opcode = Opcode::from_code(raw % 100)?;

        Ok(Self { raw, opcode, modes })
    }

    /// Mode of the zero-based parameter `index`
    pub fn mode(&self, index: usize) -> Mode {
        self.modes[index]
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:05}] {} {:?}", self.raw, self.opcode, self.modes)
    }
}

/// Points at which `VM::run` hands control back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pause {
    /// The program executed its halt instruction
    Halted,

    /// An output instruction produced a value
    ProducedOutput(i64),

    /// An input instruction found the queue empty
    AwaitingInput,
}

/// Lifecycle state of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VMState {
    /// Ready to execute, or mid-run
    #[default]
    Running,

    AwaitingInput,

    ProducedOutput(i64),

    Halted,
}

impl From<Pause> for VMState {
    fn from(pause: Pause) -> Self {
        match pause {
            Pause::Halted => VMState::Halted,
            Pause::ProducedOutput(value) => VMState::ProducedOutput(value),
            Pause::AwaitingInput => VMState::AwaitingInput,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pads_missing_modes() {
        let instruction = Instruction::decode(2).unwrap();
        assert_eq!(instruction.opcode, Opcode::Multiply);
        assert_eq!(instruction.modes, [Mode::Position; 3]);
    }

    #[test]
    fn test_decode_mode_order() {
        let instruction = Instruction::decode(1002).unwrap();
        assert_eq!(instruction.opcode, Opcode::Multiply);
        assert_eq!(
            instruction.modes,
            [Mode::Position, Mode::Immediate, Mode::Position]
        );

        let instruction = Instruction::decode(21101).unwrap();
        assert_eq!(instruction.opcode, Opcode::Add);
        assert_eq!(
            instruction.modes,
            [Mode::Immediate, Mode::Immediate, Mode::Relative]
        );
    }

    #[test]
    fn test_decode_relative_output() {
        let instruction = Instruction::decode(204).unwrap();
        assert_eq!(instruction.opcode, Opcode::Output);
        assert_eq!(instruction.mode(0), Mode::Relative);
    }

    #[test]
    fn test_decode_halt() {
        let instruction = Instruction::decode(99).unwrap();
        assert_eq!(instruction.opcode, Opcode::Halt);
        assert_eq!(instruction.opcode.n_params(), 0);
    }

    #[test]
    fn test_decode_bad_mode() {
        assert_eq!(
            Instruction::decode(301),
            Err(VMError::InvalidMode { instruction: 301, mode: 3 })
        );
        assert_eq!(
            Instruction::decode(90001),
            Err(VMError::InvalidMode { instruction: 90001, mode: 9 })
        );
    }

    #[test]
    fn test_decode_unknown_opcode() {
        assert_eq!(Instruction::decode(42), Err(VMError::UnknownOperation(42)));
        assert_eq!(Instruction::decode(0), Err(VMError::UnknownOperation(0)));
        assert_eq!(Instruction::decode(-1), Err(VMError::UnknownOperation(-1)));
    }

    #[test]
    fn test_decode_too_many_digits() {
        assert_eq!(
            Instruction::decode(100_001),
            Err(VMError::MalformedInstruction(100_001))
        );
    }

    #[test]
    fn test_display() {
        let instruction = Instruction::decode(1002).unwrap();
        assert_eq!(
            instruction.to_string(),
            "[01002] mul [Position, Immediate, Position]"
        );
    }
}
