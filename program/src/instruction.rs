// Contest Engine - Instructions
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use crate::state::{ContestId, ContestParams, RandomWord, RequestId};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub enum ContestInstruction {
    /// Create a contest (admin only)
    ///
    /// Attached value: the sponsored pool for native raffles, otherwise zero
    CreateContest {
        params: ContestParams,
    },

    /// Enter a contest
    ///
    /// Attached value: `entry_fee * entries` for native contests, zero for token contests
    Enter {
        contest: ContestId,
        /// Lotto numbers; `None` asks the oracle for a quick pick
        numbers: Option<Vec<u8>>,
        /// Raffle entries bought, must be 1 for lottos
        entries: u32,
    },

    /// Run the due transitions found by `check_upkeep` (scheduler only)
    PerformUpkeep {
        data: Vec<u8>,
    },

    /// Deliver randomness for a pending request (oracle only)
    FulfillRandomness {
        request: RequestId,
        words: Vec<RandomWord>,
    },

    /// Collect a finished raffle's prize
    ClaimPrize {
        contest: ContestId,
    },

    /// Collect a lotto payout whose transfer failed
    RetryPayout {
        contest: ContestId,
    },

    /// Update admin address (admin only)
    UpdateAdmin {
        new_admin: Pubkey,
    },

    /// Update the upkeep scheduler (admin only)
    UpdateScheduler {
        new_scheduler: Pubkey,
    },

    /// Update the randomness oracle (admin only)
    UpdateOracle {
        new_oracle: Pubkey,
    },

    /// Update redraw, upkeep batch and per-call entry limits (admin only)
    UpdateLimits {
        max_redraws: u8,
        max_upkeep_batch: u32,
        max_entries_per_call: u32,
    },
}

impl ContestInstruction {
    /// Unpacks a byte buffer into a ContestInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        if input.is_empty() {
            return Err(ProgramError::InvalidInstructionData);
        }
        Self::try_from_slice(input).map_err(|_| ProgramError::InvalidInstructionData)
    }

    /// Packs a ContestInstruction into a byte buffer.
    ///
    /// Borsh only fails when its writer does; a `Vec<u8>` writer never
    /// does, so every instruction encodes to at least its tag byte.
    pub fn pack(&self) -> Vec<u8> {
        self.try_to_vec().unwrap_or_default()
    }
}

pub fn create_contest(params: ContestParams) -> Vec<u8> {
    ContestInstruction::CreateContest { params }.pack()
}

pub fn enter(contest: ContestId, numbers: Option<Vec<u8>>, entries: u32) -> Vec<u8> {
    ContestInstruction::Enter {
        contest,
        numbers,
        entries,
    }
    .pack()
}

pub fn perform_upkeep(data: Vec<u8>) -> Vec<u8> {
    ContestInstruction::PerformUpkeep { data }.pack()
}

pub fn fulfill_randomness(request: RequestId, words: Vec<RandomWord>) -> Vec<u8> {
    ContestInstruction::FulfillRandomness { request, words }.pack()
}

pub fn claim_prize(contest: ContestId) -> Vec<u8> {
    ContestInstruction::ClaimPrize { contest }.pack()
}

pub fn retry_payout(contest: ContestId) -> Vec<u8> {
    ContestInstruction::RetryPayout { contest }.pack()
}

pub fn update_admin(new_admin: Pubkey) -> Vec<u8> {
    ContestInstruction::UpdateAdmin { new_admin }.pack()
}

pub fn update_scheduler(new_scheduler: Pubkey) -> Vec<u8> {
    ContestInstruction::UpdateScheduler { new_scheduler }.pack()
}

pub fn update_oracle(new_oracle: Pubkey) -> Vec<u8> {
    ContestInstruction::UpdateOracle { new_oracle }.pack()
}

pub fn update_limits(max_redraws: u8, max_upkeep_batch: u32, max_entries_per_call: u32) -> Vec<u8> {
    ContestInstruction::UpdateLimits {
        max_redraws,
        max_upkeep_batch,
        max_entries_per_call,
    }
    .pack()
}
