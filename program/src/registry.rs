use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};
use std::collections::BTreeMap;

use crate::error::ContestError;
use crate::state::{
    Contest, ContestId, ContestKind, ContestParams, PaymentMedium, Ticket, NUMBER_RANGE, TICKET_LEN,
};

/// Validated entry, ready to be recorded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryPlan {
    /// Amount owed for the entry
    pub amount: u64,
    pub entries: u32,
    /// Lotto only; `None` means the ticket is generated from randomness
    pub ticket: Option<Ticket>,
}

/// Validates a lotto ticket's length and bounds
pub fn parse_ticket(numbers: &[u8]) -> Result<Ticket, ContestError> {
    if numbers.len() != TICKET_LEN {
        return Err(ContestError::InvalidTicketLength);
    }
    let mut ticket = [0u8; TICKET_LEN];
    for (slot, n) in ticket.iter_mut().zip(numbers) {
        if *n == 0 || u64::from(*n) > NUMBER_RANGE {
            return Err(ContestError::TicketNumberOutOfRange);
        }
        *slot = *n;
    }
    Ok(Ticket(ticket))
}

/// Arena of contests keyed by id
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq)]
pub struct ContestRegistry {
    contests: BTreeMap<ContestId, Contest>,
    next_id: u64,
}

impl ContestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fee may be zero; duration must be positive and only raffles take a sponsored pool
    pub fn validate(params: &ContestParams) -> Result<(), ContestError> {
        if params.duration <= 0 {
            msg!("Contest duration must be positive");
            return Err(ContestError::InvalidDuration);
        }
        if params.kind.is_lotto() && params.sponsored_pool > 0 {
            msg!("Only raffles can be sponsored");
            return Err(ContestError::InvalidContestParameters);
        }
        Ok(())
    }

    pub fn create(&mut self, params: &ContestParams, now: UnixTimestamp) -> Result<ContestId, ContestError> {
        Self::validate(params)?;
        self.next_id = self.next_id.checked_add(1).ok_or(ContestError::Overflow)?;
        let id = ContestId(self.next_id);
        self.contests.insert(id, Contest::new(id, params, now));
        Ok(id)
    }

    pub fn get(&self, id: ContestId) -> Option<&Contest> {
        self.contests.get(&id)
    }

    pub fn contest(&self, id: ContestId) -> Result<&Contest, ContestError> {
        self.contests.get(&id).ok_or(ContestError::ContestNotFound)
    }

    pub fn contest_mut(&mut self, id: ContestId) -> Result<&mut Contest, ContestError> {
        self.contests.get_mut(&id).ok_or(ContestError::ContestNotFound)
    }

    pub fn len(&self) -> usize {
        self.contests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contests.is_empty()
    }

    pub fn live_contests(&self) -> Vec<ContestId> {
        self.contests
            .values()
            .filter(|c| c.is_live())
            .map(|c| c.id)
            .collect()
    }

    /// Contests whose closing is due, oldest id first. No side effects.
    pub fn due_contests(&self, now: UnixTimestamp, limit: usize) -> Vec<ContestId> {
        self.contests
            .values()
            .filter(|c| c.is_due(now))
            .map(|c| c.id)
            .take(limit)
            .collect()
    }

    /// Checks an entry against the contest without touching state.
    /// A raffle call buys between 1 and `max_entries` entries.
    pub fn prepare_entry(
        &self,
        id: ContestId,
        numbers: Option<&[u8]>,
        entries: u32,
        max_entries: u32,
        value: u64,
    ) -> Result<EntryPlan, ContestError> {
        let contest = self.contest(id)?;
        if !contest.is_live() {
            msg!("Contest {} is not live", id);
            return Err(ContestError::ContestNotLive);
        }

        let ticket = match (contest.kind, numbers) {
            (ContestKind::Raffle, Some(_)) => return Err(ContestError::UnexpectedTicket),
            (ContestKind::Raffle, None) => None,
            (ContestKind::Lotto { .. }, Some(numbers)) => Some(parse_ticket(numbers)?),
            (ContestKind::Lotto { .. }, None) => None,
        };
        let valid_count = match contest.kind {
            ContestKind::Raffle => entries >= 1 && entries <= max_entries,
            ContestKind::Lotto { .. } => entries == 1,
        };
        if !valid_count {
            msg!("Invalid entry count {} for {}", entries, id);
            return Err(ContestError::InvalidEntryCount);
        }

        let amount = contest
            .entry_fee
            .checked_mul(u64::from(entries))
            .ok_or(ContestError::Overflow)?;
        let expected_value = match contest.medium {
            PaymentMedium::Native => amount,
            PaymentMedium::Token(_) => 0,
        };
        if value != expected_value {
            msg!("Expected {} attached, got {}", expected_value, value);
            return Err(ContestError::IncorrectPayment);
        }

        Ok(EntryPlan {
            amount,
            entries,
            ticket,
        })
    }

    /// Applies a prepared entry. A lotto entry without a ticket only bumps
    /// the quick-pick counter until `assign_ticket` runs.
    pub fn record_entry(&mut self, id: ContestId, who: Pubkey, plan: &EntryPlan) -> Result<(), ContestError> {
        let contest = self.contest_mut(id)?;
        let prize_pool = contest
            .prize_pool
            .checked_add(plan.amount)
            .ok_or(ContestError::Overflow)?;

        match contest.kind {
            ContestKind::Raffle => {
                let held = contest.entries_held.entry(who).or_insert(0);
                *held = held.checked_add(u64::from(plan.entries)).ok_or(ContestError::Overflow)?;
                contest
                    .participants
                    .extend(std::iter::repeat(who).take(plan.entries as usize));
            }
            ContestKind::Lotto { .. } => match plan.ticket {
                Some(ticket) => place_ticket(contest, who, ticket),
                None => {
                    contest.pending_quick_picks = contest
                        .pending_quick_picks
                        .checked_add(1)
                        .ok_or(ContestError::Overflow)?;
                }
            },
        }
        contest.prize_pool = prize_pool;
        Ok(())
    }

    /// Stores a generated lotto ticket for a quick-pick entry
    pub fn assign_ticket(&mut self, id: ContestId, who: Pubkey, ticket: Ticket) -> Result<(), ContestError> {
        let contest = self.contest_mut(id)?;
        contest.pending_quick_picks = contest.pending_quick_picks.saturating_sub(1);
        place_ticket(contest, who, ticket);
        Ok(())
    }
}

// last write wins; the roster keeps one slot per holder
fn place_ticket(contest: &mut Contest, who: Pubkey, ticket: Ticket) {
    if contest.tickets.insert(who, ticket).is_none() {
        contest.participants.push(who);
    }
}
