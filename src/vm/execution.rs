//! VM Operation execution logic
//!
//! This module provides the execution logic for VM operations.
//!
//! Execution is split in two phases. `Operation::resolve` reads the parameter
//! words following an instruction and turns them into concrete operands using
//! the decoded modes and the current relative base: read parameters become
//! values, write parameters become addresses. `Operation::execute` then
//! performs the operation against memory and the input channel and reports an
//! `Effect` telling the engine how to move on.

use log::debug;

use crate::vm::errors::VMError;
use crate::vm::io::InputChannel;
use crate::vm::memory::Memory;
use crate::vm::types::{Instruction, Mode, Opcode};

/// An instruction with its operands resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add { a: i64, b: i64, out: i64 },
    Multiply { a: i64, b: i64, out: i64 },
    Input { out: i64 },
    Output { value: i64 },
    JumpIfTrue { condition: i64, target: i64 },
    JumpIfFalse { condition: i64, target: i64 },
    LessThan { a: i64, b: i64, out: i64 },
    Equals { a: i64, b: i64, out: i64 },
    AdjustRelativeBase { delta: i64 },
    Halt,
}

/// What the engine should do after an operation ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Move past the instruction and its parameters
    Advance,

    /// Continue at the given address
    Jump(usize),

    /// Advance, then pause with the value
    Output(i64),

    /// Advance after shifting the relative base by the delta
    AdjustRelativeBase(i64),

    /// Stop without moving the instruction pointer
    Halt,
}

/// Reads parameter words for one instruction
struct Operands<'a> {
    instruction: &'a Instruction,
    pointer: i64,
    relative_base: i64,
    memory: &'a mut Memory,
}

impl Operands<'_> {
    fn word(&mut self, index: usize) -> Result<i64, VMError> {
        self.memory.read(self.pointer + 1 + index as i64)
    }

    fn relative(&self, offset: i64) -> Result<i64, VMError> {
        self.relative_base
            .checked_add(offset)
            .ok_or_else(|| overflow("relative addressing"))
    }

    /// Resolve a read parameter to its value
    fn value(&mut self, index: usize) -> Result<i64, VMError> {
        let word = self.word(index)?;
        match self.instruction.mode(index) {
            Mode::Position => self.memory.read(word),
            Mode::Immediate => Ok(word),
            Mode::Relative => {
                let addr = self.relative(word)?;
                self.memory.read(addr)
            }
        }
    }

    /// Resolve a write parameter to its destination address
    fn address(&mut self, index: usize) -> Result<i64, VMError> {
        let word = self.word(index)?;
        match self.instruction.mode(index) {
            Mode::Position => Ok(word),
            Mode::Relative => self.relative(word),
            Mode::Immediate => Err(VMError::ImmediateWrite {
                instruction: self.instruction.raw,
            }),
        }
    }
}

fn overflow(operation: &str) -> VMError {
    VMError::ArithmeticOverflow {
        operation: operation.to_string(),
    }
}

impl Operation {
    /// Resolve the operands of `instruction`, located at `pointer`
    pub fn resolve(
        instruction: &Instruction,
        pointer: usize,
        relative_base: i64,
        memory: &mut Memory,
    ) -> Result<Self, VMError> {
        let pointer = i64::try_from(pointer).map_err(|_| overflow("instruction fetch"))?;
        let mut ops = Operands {
            instruction,
            pointer,
            relative_base,
            memory,
        };

        let operation = match instruction.opcode {
            Opcode::Add => Operation::Add {
                a: ops.value(0)?,
                b: ops.value(1)?,
                out: ops.address(2)?,
            },
            Opcode::Multiply => Operation::Multiply {
                a: ops.value(0)?,
                b: ops.value(1)?,
                out: ops.address(2)?,
            },
            Opcode::Input => Operation::Input {
                out: ops.address(0)?,
            },
            Opcode::Output => Operation::Output {
                value: ops.value(0)?,
            },
            Opcode::JumpIfTrue => Operation::JumpIfTrue {
                condition: ops.value(0)?,
                target: ops.value(1)?,
            },
            Opcode::JumpIfFalse => Operation::JumpIfFalse {
                condition: ops.value(0)?,
                target: ops.value(1)?,
            },
            Opcode::LessThan => Operation::LessThan {
                a: ops.value(0)?,
                b: ops.value(1)?,
                out: ops.address(2)?,
            },
            Opcode::Equals => Operation::Equals {
                a: ops.value(0)?,
                b: ops.value(1)?,
                out: ops.address(2)?,
            },
            Opcode::AdjustRelativeBase => Operation::AdjustRelativeBase {
                delta: ops.value(0)?,
            },
            Opcode::Halt => Operation::Halt,
        };

        Ok(operation)
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Operation::Add { .. } => Opcode::Add,
            Operation::Multiply { .. } => Opcode::Multiply,
            Operation::Input { .. } => Opcode::Input,
            Operation::Output { .. } => Opcode::Output,
            Operation::JumpIfTrue { .. } => Opcode::JumpIfTrue,
            Operation::JumpIfFalse { .. } => Opcode::JumpIfFalse,
            Operation::LessThan { .. } => Opcode::LessThan,
            Operation::Equals { .. } => Opcode::Equals,
            Operation::AdjustRelativeBase { .. } => Opcode::AdjustRelativeBase,
            Operation::Halt => Opcode::Halt,
        }
    }

    /// Run the operation.
    ///
    /// An input operation with nothing queued returns `VMError::EmptyInput`
    /// before touching memory, so it can be retried once input arrives.
    pub fn execute(self, memory: &mut Memory, input: &mut InputChannel) -> Result<Effect, VMError> {
        match self {
            Operation::Add { a, b, out } => {
                let sum = a.checked_add(b).ok_or_else(|| overflow("add"))?;
                memory.write(out, sum)?;
                Ok(Effect::Advance)
            }
            Operation::Multiply { a, b, out } => {
                let product = a.checked_mul(b).ok_or_else(|| overflow("mul"))?;
                memory.write(out, product)?;
                Ok(Effect::Advance)
            }
            Operation::Input { out } => {
                let value = input.pop()?;
                debug!("Read input {} into {}", value, out);
                memory.write(out, value)?;
                Ok(Effect::Advance)
            }
            Operation::Output { value } => Ok(Effect::Output(value)),
            Operation::JumpIfTrue { condition, target } => {
                if condition != 0 {
                    jump(target)
                } else {
                    Ok(Effect::Advance)
                }
            }
            Operation::JumpIfFalse { condition, target } => {
                if condition == 0 {
                    jump(target)
                } else {
                    Ok(Effect::Advance)
                }
            }
            Operation::LessThan { a, b, out } => {
                memory.write(out, i64::from(a < b))?;
                Ok(Effect::Advance)
            }
            Operation::Equals { a, b, out } => {
                memory.write(out, i64::from(a == b))?;
                Ok(Effect::Advance)
            }
            Operation::AdjustRelativeBase { delta } => Ok(Effect::AdjustRelativeBase(delta)),
            Operation::Halt => Ok(Effect::Halt),
        }
    }
}

fn jump(target: i64) -> Result<Effect, VMError> {
    usize::try_from(target)
        .map(Effect::Jump)
        .map_err(|_| VMError::NegativeAddress(target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_at(program: Vec<i64>, pointer: usize, relative_base: i64) -> (Operation, Memory) {
        let mut memory = Memory::new(program);
        let raw = memory.read(pointer as i64).unwrap();
        let instruction = Instruction::decode(raw).unwrap();
        let operation = Operation::resolve(&instruction, pointer, relative_base, &mut memory).unwrap();
        (operation, memory)
    }

    #[test]
    fn test_resolve_mixed_modes() {
        let (operation, _) = resolve_at(vec![1002, 4, 3, 4, 33], 0, 0);
        assert_eq!(operation, Operation::Multiply { a: 33, b: 3, out: 4 });
    }

    #[test]
    fn test_resolve_relative() {
        // 2201: add, rel + rel -> pos
        let (operation, _) = resolve_at(vec![2201, 1, 2, 9, 0, 10, 20], 0, 4);
        assert_eq!(operation, Operation::Add { a: 10, b: 20, out: 9 });
    }

    #[test]
    fn test_resolve_relative_write_address() {
        let (operation, _) = resolve_at(vec![203, -2], 0, 10);
        assert_eq!(operation, Operation::Input { out: 8 });
    }

    #[test]
    fn test_resolve_reads_past_end_as_zero() {
        let (operation, memory) = resolve_at(vec![4, 50], 0, 0);
        assert_eq!(operation, Operation::Output { value: 0 });
        assert_eq!(memory.len(), 51);
    }

    #[test]
    fn test_resolve_rejects_immediate_write() {
        let mut memory = Memory::new(vec![10001, 1, 1, 0]);
        let instruction = Instruction::decode(10001).unwrap();
        assert_eq!(
            Operation::resolve(&instruction, 0, 0, &mut memory),
            Err(VMError::ImmediateWrite { instruction: 10001 })
        );
    }

    #[test]
    fn test_resolve_negative_position() {
        let mut memory = Memory::new(vec![4, -5]);
        let instruction = Instruction::decode(4).unwrap();
        assert_eq!(
            Operation::resolve(&instruction, 0, 0, &mut memory),
            Err(VMError::NegativeAddress(-5))
        );
    }

    #[test]
    fn test_execute_arithmetic() {
        let mut memory = Memory::new(vec![0; 4]);
        let mut input = InputChannel::new();

        let effect = Operation::Add { a: 3, b: 8, out: 3 }
            .execute(&mut memory, &mut input)
            .unwrap();
        assert_eq!(effect, Effect::Advance);
        assert_eq!(memory.as_slice(), &[0, 0, 0, 11]);

        Operation::Multiply { a: -4, b: 5, out: 0 }
            .execute(&mut memory, &mut input)
            .unwrap();
        assert_eq!(memory.read(0).unwrap(), -20);
    }

    #[test]
    fn test_execute_comparisons() {
        let mut memory = Memory::default();
        let mut input = InputChannel::new();

        Operation::LessThan { a: 1, b: 2, out: 0 }.execute(&mut memory, &mut input).unwrap();
        Operation::LessThan { a: 2, b: 2, out: 1 }.execute(&mut memory, &mut input).unwrap();
        Operation::Equals { a: 7, b: 7, out: 2 }.execute(&mut memory, &mut input).unwrap();
        Operation::Equals { a: 7, b: 8, out: 3 }.execute(&mut memory, &mut input).unwrap();

        assert_eq!(memory.as_slice(), &[1, 0, 1, 0]);
    }

    #[test]
    fn test_execute_jumps() {
        let mut memory = Memory::default();
        let mut input = InputChannel::new();

        let taken = Operation::JumpIfTrue { condition: 5, target: 9 };
        let skipped = Operation::JumpIfTrue { condition: 0, target: 9 };
        assert_eq!(taken.execute(&mut memory, &mut input), Ok(Effect::Jump(9)));
        assert_eq!(skipped.execute(&mut memory, &mut input), Ok(Effect::Advance));

        let taken = Operation::JumpIfFalse { condition: 0, target: 3 };
        let skipped = Operation::JumpIfFalse { condition: -1, target: 3 };
        assert_eq!(taken.execute(&mut memory, &mut input), Ok(Effect::Jump(3)));
        assert_eq!(skipped.execute(&mut memory, &mut input), Ok(Effect::Advance));

        let negative = Operation::JumpIfFalse { condition: 0, target: -2 };
        assert_eq!(
            negative.execute(&mut memory, &mut input),
            Err(VMError::NegativeAddress(-2))
        );
    }

    #[test]
    fn test_execute_input() {
        let mut memory = Memory::default();
        let mut input = InputChannel::new();
        input.push(17);

        let operation = Operation::Input { out: 2 };
        assert_eq!(operation.execute(&mut memory, &mut input), Ok(Effect::Advance));
        assert_eq!(memory.as_slice(), &[0, 0, 17]);

        assert_eq!(operation.execute(&mut memory, &mut input), Err(VMError::EmptyInput));
        assert_eq!(memory.as_slice(), &[0, 0, 17]);
    }

    #[test]
    fn test_execute_overflow() {
        let mut memory = Memory::default();
        let mut input = InputChannel::new();
        let result = Operation::Multiply { a: i64::MAX, b: 2, out: 0 }.execute(&mut memory, &mut input);
        assert!(matches!(result, Err(VMError::ArithmeticOverflow { .. })));
    }
}
