// Contest Engine
// Lotto and raffle selection driven by verifiable randomness, with
// scheduler-triggered closing and per-winner payouts

// Core modules
pub mod error;
pub mod event;
pub mod instruction;
pub mod processor;
pub mod state;

// Selection and payouts
pub mod distributor;
pub mod expander;
pub mod selector;

// Lifecycle
pub mod engine;
pub mod registry;
pub mod upkeep;

// Randomness oracle seam
pub mod vrf;

use solana_program::entrypoint::ProgramResult;

pub use engine::ContestEngine;
pub use processor::{Collaborators, Invocation};

pub fn process_instruction(
    engine: &mut ContestEngine,
    invocation: &Invocation,
    collaborators: &mut Collaborators<'_>,
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(engine, invocation, collaborators, instruction_data)
}
