use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;

/// Number of values on a lotto ticket
pub const TICKET_LEN: usize = 6;
/// Lotto values are drawn from `1..=NUMBER_RANGE`
pub const NUMBER_RANGE: u64 = 100;
/// Redraws allowed per round for `until_won` lottos before the round reopens
pub const DEFAULT_MAX_REDRAWS: u8 = 3;
/// Contests transitioned by a single upkeep call
pub const DEFAULT_MAX_UPKEEP_BATCH: u32 = 10;
/// Raffle entries one `Enter` call may buy
pub const DEFAULT_MAX_ENTRIES_PER_CALL: u32 = 100;

/// One 256-bit word delivered by the randomness oracle (big-endian)
pub type RandomWord = [u8; 32];

/// Builds a random word holding `value` in its low-order bytes
pub fn word_from_u64(value: u64) -> RandomWord {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

#[derive(
    BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct ContestId(pub u64);

impl fmt::Display for ContestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier handed out by the randomness source for one request
#[derive(
    BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Status of a contest
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContestStatus {
    /// Open for entries
    Live,
    /// Draw randomness requested, waiting for the oracle
    Staged,
    /// Winners are known
    Finished,
}

impl TryFrom<u8> for ContestStatus {
    type Error = &'static str;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(ContestStatus::Live),
            1 => Ok(ContestStatus::Staged),
            2 => Ok(ContestStatus::Finished),
            _ => Err("Invalid contest status"),
        }
    }
}

impl From<ContestStatus> for u8 {
    fn from(status: ContestStatus) -> Self {
        match status {
            ContestStatus::Live => 0,
            ContestStatus::Staged => 1,
            ContestStatus::Finished => 2,
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContestKind {
    /// Number matching; `until_won` redraws instead of reopening when nobody matches
    Lotto { until_won: bool },
    /// Single winner weighted by entries, paid out on claim
    Raffle,
}

impl ContestKind {
    pub fn is_lotto(&self) -> bool {
        matches!(self, ContestKind::Lotto { .. })
    }
}

/// Asset used for entry fees and payouts
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentMedium {
    Native,
    Token(Pubkey),
}

/// A lotto ticket, stored in the order the participant picked
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(pub [u8; TICKET_LEN]);

impl Ticket {
    pub fn sorted(&self) -> Self {
        let mut numbers = self.0;
        numbers.sort_unstable();
        Ticket(numbers)
    }
}

/// Amount owed to one winner
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    pub winner: Pubkey,
    pub amount: u64,
    pub paid: bool,
}

/// Parameters for a new contest
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContestParams {
    pub kind: ContestKind,
    /// Fee per entry, may be zero
    pub entry_fee: u64,
    /// Seconds the contest stays open
    pub duration: i64,
    pub medium: PaymentMedium,
    /// Pre-funded raffle prize, deposited by the creator
    pub sponsored_pool: u64,
}

/// A single lotto or raffle instance
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub struct Contest {
    pub id: ContestId,
    pub kind: ContestKind,
    pub status: ContestStatus,
    pub start_time: UnixTimestamp,
    pub duration: i64,
    pub entry_fee: u64,
    pub medium: PaymentMedium,
    pub prize_pool: u64,
    /// Raffle: one slot per entry. Lotto: one slot per ticket holder.
    pub participants: Vec<Pubkey>,
    pub tickets: BTreeMap<Pubkey, Ticket>,
    /// Raffle entries bought per holder
    pub entries_held: BTreeMap<Pubkey, u64>,
    /// Outstanding draw request
    pub pending_request: Option<RequestId>,
    /// Lotto entries still waiting for a generated ticket
    pub pending_quick_picks: u32,
    pub redraws: u8,
    pub round: u32,
    pub winning_numbers: Option<Ticket>,
    pub winners: Vec<Pubkey>,
    pub payouts: Vec<Payout>,
}

impl Contest {
    pub fn new(id: ContestId, params: &ContestParams, start_time: UnixTimestamp) -> Self {
        Self {
            id,
            kind: params.kind,
            status: ContestStatus::Live,
            start_time,
            duration: params.duration,
            entry_fee: params.entry_fee,
            medium: params.medium,
            prize_pool: params.sponsored_pool,
            participants: Vec::new(),
            tickets: BTreeMap::new(),
            entries_held: BTreeMap::new(),
            pending_request: None,
            pending_quick_picks: 0,
            redraws: 0,
            round: 0,
            winning_numbers: None,
            winners: Vec::new(),
            payouts: Vec::new(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.status == ContestStatus::Live
    }

    /// Check if the contest has run longer than its duration
    pub fn has_expired(&self, now: UnixTimestamp) -> bool {
        now.saturating_sub(self.start_time) > self.duration
    }

    /// Expired, live and not waiting on the oracle
    pub fn is_due(&self, now: UnixTimestamp) -> bool {
        self.is_live()
            && self.has_expired(now)
            && self.pending_request.is_none()
            && self.pending_quick_picks == 0
    }

    /// Raffle: entries bought. Lotto: 1 when a ticket is held.
    pub fn entry_count(&self, who: &Pubkey) -> u64 {
        match self.kind {
            ContestKind::Raffle => self.entries_held.get(who).copied().unwrap_or(0),
            ContestKind::Lotto { .. } => self.tickets.contains_key(who) as u64,
        }
    }

    pub fn payout_index(&self, who: &Pubkey) -> Option<usize> {
        self.payouts.iter().position(|p| p.winner == *who)
    }

    /// Start a fresh round; roster, tickets and pool carry over
    pub fn reopen(&mut self, now: UnixTimestamp) {
        self.status = ContestStatus::Live;
        self.start_time = now;
        self.pending_request = None;
        self.redraws = 0;
        self.round = self.round.saturating_add(1);
    }
}

/// Engine-wide configuration
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// May create contests and update the configuration
    pub admin: Pubkey,
    /// Only identity allowed to perform upkeep
    pub scheduler: Pubkey,
    /// Only identity allowed to deliver randomness
    pub oracle: Pubkey,
    pub max_redraws: u8,
    pub max_upkeep_batch: u32,
    pub max_entries_per_call: u32,
}

impl EngineConfig {
    pub fn new(admin: Pubkey, scheduler: Pubkey, oracle: Pubkey) -> Self {
        Self {
            admin,
            scheduler,
            oracle,
            max_redraws: DEFAULT_MAX_REDRAWS,
            max_upkeep_batch: DEFAULT_MAX_UPKEEP_BATCH,
            max_entries_per_call: DEFAULT_MAX_ENTRIES_PER_CALL,
        }
    }
}
