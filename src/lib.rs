pub mod amplifier;
pub mod diagnostic;
pub mod program;
pub mod vm;

pub use crate::amplifier::{find_best_phases, AmplifierChain, AmplifierError, LoopMode};
pub use crate::diagnostic::{run_diagnostics, DiagnosticError, DiagnosticReport};
pub use crate::program::{load_program, parse_program, ProgramError};
pub use crate::vm::{Memory, Pause, VMError, VMState, VM};
