use solana_program::{clock::UnixTimestamp, entrypoint::ProgramResult, msg, pubkey::Pubkey};

use crate::distributor::Treasury;
use crate::engine::ContestEngine;
use crate::instruction::ContestInstruction;
use crate::vrf::RandomnessSource;

/// Who is calling, when, and with how much native value attached
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub caller: Pubkey,
    pub now: UnixTimestamp,
    pub value: u64,
}

impl Invocation {
    pub fn new(caller: Pubkey, now: UnixTimestamp) -> Self {
        Self { caller, now, value: 0 }
    }

    pub fn with_value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }
}

/// External systems the engine talks to during an instruction
pub struct Collaborators<'a> {
    pub oracle: &'a mut dyn RandomnessSource,
    pub treasury: &'a mut dyn Treasury,
}

pub struct Processor;

impl Processor {
    pub fn process(
        engine: &mut ContestEngine,
        invocation: &Invocation,
        collaborators: &mut Collaborators<'_>,
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = ContestInstruction::unpack(instruction_data)?;
        let caller = &invocation.caller;

        match instruction {
            ContestInstruction::CreateContest { params } => {
                msg!("Instruction: Create Contest");
                engine.create_contest(caller, invocation.now, invocation.value, &params, collaborators.treasury)?;
            }
            ContestInstruction::Enter {
                contest,
                numbers,
                entries,
            } => {
                msg!("Instruction: Enter");
                engine.enter(
                    caller,
                    invocation.value,
                    contest,
                    numbers.as_deref(),
                    entries,
                    collaborators.oracle,
                    collaborators.treasury,
                )?;
            }
            ContestInstruction::PerformUpkeep { data } => {
                msg!("Instruction: Perform Upkeep");
                engine.perform_upkeep(caller, invocation.now, &data, collaborators.oracle)?;
            }
            ContestInstruction::FulfillRandomness { request, words } => {
                msg!("Instruction: Fulfill Randomness");
                engine.fulfill_randomness(
                    caller,
                    invocation.now,
                    request,
                    &words,
                    collaborators.oracle,
                    collaborators.treasury,
                )?;
            }
            ContestInstruction::ClaimPrize { contest } => {
                msg!("Instruction: Claim Prize");
                engine.claim_prize(caller, contest, collaborators.treasury)?;
            }
            ContestInstruction::RetryPayout { contest } => {
                msg!("Instruction: Retry Payout");
                engine.retry_payout(caller, contest, collaborators.treasury)?;
            }
            ContestInstruction::UpdateAdmin { new_admin } => {
                msg!("Instruction: Update Admin");
                engine.update_admin(caller, new_admin)?;
            }
            ContestInstruction::UpdateScheduler { new_scheduler } => {
                msg!("Instruction: Update Scheduler");
                engine.update_scheduler(caller, new_scheduler)?;
            }
            ContestInstruction::UpdateOracle { new_oracle } => {
                msg!("Instruction: Update Oracle");
                engine.update_oracle(caller, new_oracle)?;
            }
            ContestInstruction::UpdateLimits {
                max_redraws,
                max_upkeep_batch,
                max_entries_per_call,
            } => {
                msg!("Instruction: Update Limits");
                engine.update_limits(caller, max_redraws, max_upkeep_batch, max_entries_per_call)?;
            }
        }
        Ok(())
    }
}
