//! Diagnostic runner
//!
//! Diagnostic programs read a system ID, then report one output per self-test
//! followed by a final diagnostic code. A zero output is a passing test. A
//! nonzero output is only valid as the very last output: if anything else is
//! produced after it, the test it reported has failed.

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::vm::{Memory, Pause, VMError, VM};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiagnosticError {
    #[error("VM error: {0}")]
    VM(#[from] VMError),

    /// `test` is the zero-based index of the failing self-test
    #[error("Self-test {test} failed with output {output}")]
    FailedSelfTest { output: i64, test: usize },

    #[error("Diagnostic program requested more input than the system ID")]
    InputExhausted,

    #[error("Diagnostic program halted without producing a code")]
    NoOutput,
}

/// Outcome of a successful diagnostic run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    /// The last value the program produced
    pub code: i64,

    pub passed_tests: usize,
}

/// Run a diagnostic program against `system_id`
pub fn run_diagnostics(program: Memory, system_id: i64) -> Result<DiagnosticReport, DiagnosticError> {
    let mut vm = VM::with_inputs(program, [system_id]);
    let mut passed_tests = 0usize;
    let mut pending_failure: Option<i64> = None;
    let mut last_output = None;

    loop {
        match vm.run()? {
            Pause::ProducedOutput(value) => {
                if let Some(output) = pending_failure {
                    warn!("Self-test {} failed with output {}", passed_tests, output);
                    return Err(DiagnosticError::FailedSelfTest {
                        output,
                        test: passed_tests,
                    });
                }
                if value == 0 {
                    info!(
                        "Self-test {} passed (ip={})",
                        passed_tests,
                        vm.instruction_pointer()
                    );
                    passed_tests += 1;
                } else {
                    pending_failure = Some(value);
                }
                last_output = Some(value);
            }
            Pause::Halted => break,
            Pause::AwaitingInput => return Err(DiagnosticError::InputExhausted),
        }
    }

    let code = last_output.ok_or(DiagnosticError::NoOutput)?;
    info!("Diagnostic finished with code {} after {} passing tests", code, passed_tests);
    Ok(DiagnosticReport { code, passed_tests })
}
