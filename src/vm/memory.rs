//! VM Memory
//!
//! This module provides the growable word store that backs a program. The
//! program is both code and data: instructions are fetched from the same
//! cells that operations read and write.
//!
//! Any non-negative address is valid. Touching an address past the end grows
//! the store with zeroed words up to and including that address, so the
//! access always lands in bounds. Negative addresses are rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vm::errors::VMError;

/// Provides memory operations for the virtual machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    /// Backing words, index == address
    cells: Vec<i64>,
}

impl Memory {
    /// Create memory seeded with a program
    pub fn new(program: Vec<i64>) -> Self {
        Self { cells: program }
    }

    /// Read the word at `addr`, growing memory if needed
    pub fn read(&mut self, addr: i64) -> Result<i64, VMError> {
        let index = self.ensure(addr)?;
        Ok(self.cells[index])
    }

    /// Write `value` at `addr`, growing memory if needed
    pub fn write(&mut self, addr: i64, value: i64) -> Result<(), VMError> {
        let index = self.ensure(addr)?;
        self.cells[index] = value;
        Ok(())
    }

    /// Read without growing. Unallocated addresses report `None`.
    pub fn peek(&self, addr: usize) -> Option<i64> {
        self.cells.get(addr).copied()
    }

    /// Number of allocated words
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// View the allocated words
    pub fn as_slice(&self) -> &[i64] {
        &self.cells
    }

    /// Consume the memory, returning its words
    pub fn into_vec(self) -> Vec<i64> {
        self.cells
    }

    /// Validate `addr` and extend the store so it is in bounds
    fn ensure(&mut self, addr: i64) -> Result<usize, VMError> {
        let index = usize::try_from(addr).map_err(|_| VMError::NegativeAddress(addr))?;
        if index >= self.cells.len() {
            let new_len = index
                .checked_add(1)
                .ok_or(VMError::MemoryExhausted(addr))?;
            self.cells
                .try_reserve(new_len - self.cells.len())
                .map_err(|_| VMError::MemoryExhausted(addr))?;
            self.cells.resize(new_len, 0);
        }
        Ok(index)
    }
}

impl From<Vec<i64>> for Memory {
    fn from(program: Vec<i64>) -> Self {
        Self::new(program)
    }
}

impl From<&[i64]> for Memory {
    fn from(program: &[i64]) -> Self {
        Self::new(program.to_vec())
    }
}

/// Comma-separated, the same format programs are loaded from
impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for value in &self.cells {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", value)?;
            first = false;
        }
        Ok(())
    }
}
