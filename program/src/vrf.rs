// Randomness oracle seam and the table correlating requests to contests
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, pubkey::Pubkey};
use std::collections::BTreeMap;

use crate::error::ContestError;
use crate::state::{ContestId, RequestId};

/// What a fulfilled request is used for
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestPurpose {
    /// Seed for the closing draw of a contest
    Draw,
    /// Generate a lotto ticket for a participant who did not pick numbers
    QuickPick { participant: Pubkey },
}

/// Request handed to the randomness source
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    pub contest: ContestId,
    pub purpose: RequestPurpose,
    pub num_words: u32,
}

impl RandomnessRequest {
    pub fn draw(contest: ContestId) -> Self {
        Self {
            contest,
            purpose: RequestPurpose::Draw,
            num_words: 1,
        }
    }

    pub fn quick_pick(contest: ContestId, participant: Pubkey) -> Self {
        Self {
            contest,
            purpose: RequestPurpose::QuickPick { participant },
            num_words: 1,
        }
    }
}

/// A verifiable randomness oracle. Requests are fire-and-forget; the words
/// come back later through `ContestEngine::fulfill_randomness`.
pub trait RandomnessSource {
    fn request_randomness(&mut self, request: &RandomnessRequest) -> Result<RequestId, ContestError>;
}

/// Outstanding request waiting for its callback
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub contest: ContestId,
    pub purpose: RequestPurpose,
}

/// request id -> contest. Entries are consumed on fulfillment.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingRequests {
    entries: BTreeMap<RequestId, PendingRequest>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: RequestId, request: PendingRequest) {
        if let Some(previous) = self.entries.insert(id, request) {
            msg!("Request {} was reissued, dropping stale entry for {}", id, previous.contest);
        }
    }

    pub fn get(&self, id: &RequestId) -> Option<&PendingRequest> {
        self.entries.get(id)
    }

    pub fn take(&mut self, id: &RequestId) -> Option<PendingRequest> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// In-memory source that hands out sequential ids and keeps the requests
/// until the host delivers words for them.
#[derive(Clone, Debug, Default)]
pub struct QueuedOracle {
    next_id: u64,
    queue: Vec<(RequestId, RandomnessRequest)>,
    /// When set, every request is refused
    pub offline: bool,
}

impl QueuedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests not yet delivered, oldest first
    pub fn outstanding(&self) -> &[(RequestId, RandomnessRequest)] {
        &self.queue
    }

    /// Removes a request once its words are delivered
    pub fn take(&mut self, id: &RequestId) -> Option<RandomnessRequest> {
        let position = self.queue.iter().position(|(queued, _)| queued == id)?;
        Some(self.queue.remove(position).1)
    }
}

impl RandomnessSource for QueuedOracle {
    fn request_randomness(&mut self, request: &RandomnessRequest) -> Result<RequestId, ContestError> {
        if self.offline {
            msg!("Randomness source offline, refusing request for {}", request.contest);
            return Err(ContestError::RandomnessRequestFailed);
        }
        self.next_id = self.next_id.checked_add(1).ok_or(ContestError::Overflow)?;
        let id = RequestId(self.next_id);
        self.queue.push((id, *request));
        Ok(id)
    }
}
