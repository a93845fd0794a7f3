//! Program loading
//!
//! Programs are serialized as comma-separated decimal integers, possibly
//! spread over several lines that are concatenated in order. JSON integer
//! arrays are accepted as well for files with a `.json` extension.

use std::fs;
use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::vm::Memory;

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A token that is not a decimal integer, with its zero-based position
    #[error("Invalid integer {token:?} at position {position}")]
    InvalidInteger { position: usize, token: String },

    #[error("Program contains no integers")]
    Empty,
}

/// Parse comma-separated program text into integers
pub fn parse_program(text: &str) -> Result<Vec<i64>, ProgramError> {
    let mut program = Vec::new();

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        for token in line.split(',') {
            let token = token.trim();
            let value = token.parse::<i64>().map_err(|_| ProgramError::InvalidInteger {
                position: program.len(),
                token: token.to_string(),
            })?;
            program.push(value);
        }
    }

    if program.is_empty() {
        return Err(ProgramError::Empty);
    }
    Ok(program)
}

/// Load a program file into memory
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Memory, ProgramError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));

    let program: Vec<i64> = if is_json {
        serde_json::from_str(&source)?
    } else {
        parse_program(&source)?
    };

    if program.is_empty() {
        return Err(ProgramError::Empty);
    }

    debug!("Loaded {} words from {}", program.len(), path.display());
    Ok(Memory::new(program))
}
