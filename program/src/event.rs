use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::state::{ContestId, ContestKind, RequestId, Ticket};
use crate::vrf::RequestPurpose;

/// Observable state changes, drained by the host with `ContestEngine::take_events`
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum ContestEvent {
    ContestCreated {
        contest: ContestId,
        kind: ContestKind,
        entry_fee: u64,
        duration: i64,
    },
    Entered {
        contest: ContestId,
        participant: Pubkey,
        entries: u32,
    },
    TicketAssigned {
        contest: ContestId,
        participant: Pubkey,
        ticket: Ticket,
    },
    RandomnessRequested {
        contest: ContestId,
        request: RequestId,
        purpose: RequestPurpose,
    },
    /// Unknown, consumed or stale request id; nothing changed
    FulfillmentIgnored {
        request: RequestId,
    },
    ContestReopened {
        contest: ContestId,
        round: u32,
    },
    WinnersSelected {
        contest: ContestId,
        winners: Vec<Pubkey>,
    },
    PrizePaid {
        contest: ContestId,
        winner: Pubkey,
        amount: u64,
    },
    /// Transfer rejected; the payout stays open for `RetryPayout`
    PayoutFailed {
        contest: ContestId,
        winner: Pubkey,
        amount: u64,
    },
}
