//! Amplifier chains
//!
//! A chain runs one independent VM per amplifier, all seeded from the same
//! program. Each amplifier first reads its phase setting, then the incoming
//! signal, and emits the signal for the next amplifier.
//!
//! In series mode the signal passes through the chain once. In feedback mode
//! the last amplifier's output is fed back into the first and the chain is
//! driven round-robin until every amplifier halts.

use std::collections::HashSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vm::{Memory, Pause, VMError, VM};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmplifierError {
    #[error("VM error: {0}")]
    VM(#[from] VMError),

    #[error("No phase settings given")]
    NoPhases,

    #[error("Phase setting {0} used more than once")]
    DuplicatePhase(i64),

    #[error("Amplifier {amplifier} is waiting for input that will never arrive")]
    Stalled { amplifier: usize },

    #[error("Amplifier {amplifier} halted without producing a signal")]
    NoOutput { amplifier: usize },
}

/// How the signal travels through the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopMode {
    Series,
    Feedback,
}

impl LoopMode {
    /// The phase settings each mode is normally searched over
    pub fn default_phases(self) -> Vec<i64> {
        match self {
            LoopMode::Series => (0..=4).collect(),
            LoopMode::Feedback => (5..=9).collect(),
        }
    }
}

/// A chain of amplifiers, one VM each
#[derive(Debug, Clone)]
pub struct AmplifierChain {
    amplifiers: Vec<VM>,
}

impl AmplifierChain {
    /// Seed one VM per phase setting with its own copy of `program`
    pub fn new(program: &Memory, phases: &[i64]) -> Result<Self, AmplifierError> {
        validate_phases(phases)?;

        let amplifiers = phases
            .iter()
            .map(|&phase| VM::with_inputs(program.clone(), [phase]))
            .collect();

        Ok(Self { amplifiers })
    }

    pub fn len(&self) -> usize {
        self.amplifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplifiers.is_empty()
    }

    pub fn amplifiers(&self) -> &[VM] {
        &self.amplifiers
    }

    /// Drive the chain in the given mode, returning the final signal
    pub fn run(&mut self, mode: LoopMode, signal: i64) -> Result<i64, AmplifierError> {
        match mode {
            LoopMode::Series => self.run_series(signal),
            LoopMode::Feedback => self.run_feedback(signal),
        }
    }

    /// Pass `signal` through every amplifier once
    pub fn run_series(&mut self, mut signal: i64) -> Result<i64, AmplifierError> {
        for (index, amplifier) in self.amplifiers.iter_mut().enumerate() {
            amplifier.push_input(signal);
            signal = match amplifier.run()? {
                Pause::ProducedOutput(value) => value,
                Pause::Halted => return Err(AmplifierError::NoOutput { amplifier: index }),
                Pause::AwaitingInput => return Err(AmplifierError::Stalled { amplifier: index }),
            };
            debug!("Amplifier {} emitted {}", index, signal);
        }
        Ok(signal)
    }

    /// Feed the signal around the loop until every amplifier halts.
    ///
    /// Returns the last value produced by the final amplifier.
    pub fn run_feedback(&mut self, mut signal: i64) -> Result<i64, AmplifierError> {
        let last = self.amplifiers.len().saturating_sub(1);
        let mut tail_output = None;
        let mut rounds = 0usize;

        while !self.amplifiers.iter().all(VM::is_halted) {
            let mut progressed = false;

            for (index, amplifier) in self.amplifiers.iter_mut().enumerate() {
                if amplifier.is_halted() {
                    continue;
                }
                amplifier.push_input(signal);
                match amplifier.run()? {
                    Pause::ProducedOutput(value) => {
                        signal = value;
                        progressed = true;
                        if index == last {
                            tail_output = Some(value);
                        }
                    }
                    Pause::Halted => progressed = true,
                    Pause::AwaitingInput => {}
                }
            }

            if !progressed {
                let amplifier = self
                    .amplifiers
                    .iter()
                    .position(|amplifier| !amplifier.is_halted())
                    .unwrap_or(0);
                return Err(AmplifierError::Stalled { amplifier });
            }
            rounds += 1;
        }

        info!("Feedback loop settled after {} rounds", rounds);
        tail_output.ok_or(AmplifierError::NoOutput { amplifier: last })
    }
}

fn validate_phases(phases: &[i64]) -> Result<(), AmplifierError> {
    if phases.is_empty() {
        return Err(AmplifierError::NoPhases);
    }
    let mut seen = HashSet::new();
    for &phase in phases {
        if !seen.insert(phase) {
            return Err(AmplifierError::DuplicatePhase(phase));
        }
    }
    Ok(())
}

/// All orderings of `items`, in lexicographic order of position
fn permutations(items: &[i64]) -> Vec<Vec<i64>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }

    let mut result = Vec::new();
    for (index, &head) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(index);
        for tail in permutations(&rest) {
            let mut ordering = Vec::with_capacity(items.len());
            ordering.push(head);
            ordering.extend(tail);
            result.push(ordering);
        }
    }
    result
}

/// Try every ordering of `phase_set`, starting each chain from `signal`, and
/// return the one giving the largest output together with that output. The
/// first ordering wins ties.
pub fn find_best_phases(
    program: &Memory,
    phase_set: &[i64],
    mode: LoopMode,
    signal: i64,
) -> Result<(Vec<i64>, i64), AmplifierError> {
    validate_phases(phase_set)?;

    let mut best: Option<(Vec<i64>, i64)> = None;
    for phases in permutations(phase_set) {
        let output = AmplifierChain::new(program, &phases)?.run(mode, signal)?;
        if best.as_ref().map_or(true, |(_, max)| output > *max) {
            best = Some((phases, output));
        }
    }

    let (phases, signal) = best.ok_or(AmplifierError::NoPhases)?;
    info!("Best phase sequence {:?} gives {}", phases, signal);
    Ok((phases, signal))
}
