//! Main Virtual Machine implementation
//!
//! This module brings together memory, the input channel and the operation
//! set to implement the fetch-decode-execute loop.
//!
//! The VM never blocks. `run` executes instructions until the program halts,
//! produces a value, or needs input that is not queued, and then returns to
//! the caller. The caller decides whether to push more input and resume, which
//! is what lets a single thread drive many machines round-robin.

use log::{debug, trace};

use crate::vm::errors::VMError;
use crate::vm::execution::{Effect, Operation};
use crate::vm::io::InputChannel;
use crate::vm::memory::Memory;
use crate::vm::types::{Instruction, Pause, VMState};

/// The execution engine for one program
#[derive(Debug, Clone)]
pub struct VM {
    /// Program and data
    memory: Memory,

    /// Pending input values
    input: InputChannel,

    /// Address of the next instruction to decode
    instruction_pointer: usize,

    /// Offset applied to relative-mode parameters
    relative_base: i64,

    state: VMState,
}

impl VM {
    /// Create a VM bound to `memory` with an empty input queue
    pub fn new(memory: Memory) -> Self {
        Self {
            memory,
            input: InputChannel::new(),
            instruction_pointer: 0,
            relative_base: 0,
            state: VMState::Running,
        }
    }

    /// Create a VM with initial input values queued
    pub fn with_inputs<I>(memory: Memory, inputs: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let mut vm = Self::new(memory);
        vm.extend_inputs(inputs);
        vm
    }

    /// Queue an input value
    pub fn push_input(&mut self, value: i64) {
        self.input.push(value);
    }

    /// Queue several input values in order
    pub fn extend_inputs<I>(&mut self, inputs: I)
    where
        I: IntoIterator<Item = i64>,
    {
        self.input.extend(inputs);
    }

    pub fn input(&self) -> &InputChannel {
        &self.input
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Consume the VM, returning its memory
    pub fn into_memory(self) -> Memory {
        self.memory
    }

    pub fn instruction_pointer(&self) -> usize {
        self.instruction_pointer
    }

    /// Move execution to `addr`
    pub fn set_instruction_pointer(&mut self, addr: i64) -> Result<(), VMError> {
        self.instruction_pointer =
            usize::try_from(addr).map_err(|_| VMError::NegativeAddress(addr))?;
        Ok(())
    }

    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    pub fn state(&self) -> VMState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == VMState::Halted
    }

    /// Execute a single instruction.
    ///
    /// Returns `Some(pause)` when the instruction hands control back to the
    /// caller and `None` when execution can simply continue.
    pub fn step(&mut self) -> Result<Option<Pause>, VMError> {
        if self.is_halted() {
            return Ok(Some(Pause::Halted));
        }
        self.state = VMState::Running;

        let raw = self.memory.read(self.fetch_address()?)?;
        let instruction = Instruction::decode(raw)?;
        trace!(
            "ip={} rb={} {}",
            self.instruction_pointer,
            self.relative_base,
            instruction
        );

        let operation = Operation::resolve(
            &instruction,
            self.instruction_pointer,
            self.relative_base,
            &mut self.memory,
        )?;

        let effect = match operation.execute(&mut self.memory, &mut self.input) {
            Ok(effect) => effect,
            Err(VMError::EmptyInput) => {
                debug!("Awaiting input at ip={}", self.instruction_pointer);
                return Ok(Some(self.pause(Pause::AwaitingInput)));
            }
            Err(err) => return Err(err),
        };

        let next = self.instruction_pointer + instruction.opcode.n_params() + 1;
        match effect {
            Effect::Advance => {
                self.instruction_pointer = next;
                Ok(None)
            }
            Effect::Jump(target) => {
                self.instruction_pointer = target;
                Ok(None)
            }
            Effect::AdjustRelativeBase(delta) => {
                self.relative_base = self
                    .relative_base
                    .checked_add(delta)
                    .ok_or_else(|| VMError::ArithmeticOverflow {
                        operation: "arb".to_string(),
                    })?;
                debug!("Relative base is now {}", self.relative_base);
                self.instruction_pointer = next;
                Ok(None)
            }
            Effect::Output(value) => {
                debug!("Produced output {} at ip={}", value, self.instruction_pointer);
                self.instruction_pointer = next;
                Ok(Some(self.pause(Pause::ProducedOutput(value))))
            }
            Effect::Halt => {
                debug!("Halted at ip={}", self.instruction_pointer);
                Ok(Some(self.pause(Pause::Halted)))
            }
        }
    }

    /// Execute until the program halts, produces output, or awaits input.
    ///
    /// Calling `run` on a halted VM returns `Pause::Halted` without touching
    /// any state.
    pub fn run(&mut self) -> Result<Pause, VMError> {
        loop {
            if let Some(pause) = self.step()? {
                return Ok(pause);
            }
        }
    }

    /// Run to completion, collecting every output.
    ///
    /// Fails with `VMError::EmptyInput` if the program blocks on input.
    pub fn run_to_halt(&mut self) -> Result<Vec<i64>, VMError> {
        let mut outputs = Vec::new();
        loop {
            match self.run()? {
                Pause::ProducedOutput(value) => outputs.push(value),
                Pause::Halted => return Ok(outputs),
                Pause::AwaitingInput => return Err(VMError::EmptyInput),
            }
        }
    }

    fn pause(&mut self, pause: Pause) -> Pause {
        self.state = pause.into();
        pause
    }

    fn fetch_address(&self) -> Result<i64, VMError> {
        i64::try_from(self.instruction_pointer).map_err(|_| VMError::ArithmeticOverflow {
            operation: "instruction fetch".to_string(),
        })
    }
}

impl From<Memory> for VM {
    fn from(memory: Memory) -> Self {
        Self::new(memory)
    }
}
