// Contest engine: owns the registry and the pending-request table and drives
// every lifecycle transition.
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::distributor::{self, Treasury};
use crate::error::ContestError;
use crate::event::ContestEvent;
use crate::expander::ticket_from_seed;
use crate::registry::ContestRegistry;
use crate::selector;
use crate::state::{
    Contest, ContestId, ContestKind, ContestParams, ContestStatus, EngineConfig, Payout, PaymentMedium,
    RandomWord, RequestId,
};
use crate::vrf::{PendingRequest, PendingRequests, RandomnessRequest, RandomnessSource, RequestPurpose};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub struct ContestEngine {
    config: EngineConfig,
    registry: ContestRegistry,
    pending: PendingRequests,
    #[borsh_skip]
    events: Vec<ContestEvent>,
}

impl ContestEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            registry: ContestRegistry::new(),
            pending: PendingRequests::new(),
            events: Vec::new(),
        }
    }

    /// Restores an engine from `pack` output
    pub fn unpack(data: &[u8]) -> Result<Self, ContestError> {
        Self::try_from_slice(data).map_err(|_| ContestError::InvalidInstructionData)
    }

    pub fn pack(&self) -> Result<Vec<u8>, ContestError> {
        self.try_to_vec().map_err(|_| ContestError::InvalidInstructionData)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ContestRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ContestRegistry {
        &mut self.registry
    }

    pub fn pending_requests(&self) -> &PendingRequests {
        &self.pending
    }

    pub fn take_events(&mut self) -> Vec<ContestEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: ContestEvent) {
        self.events.push(event);
    }

    fn ensure(&self, caller: &Pubkey, expected: &Pubkey) -> Result<(), ContestError> {
        if caller != expected {
            msg!("Caller {} is not authorized", caller);
            return Err(ContestError::Unauthorized);
        }
        Ok(())
    }

    pub fn update_admin(&mut self, caller: &Pubkey, new_admin: Pubkey) -> Result<(), ContestError> {
        self.ensure(caller, &self.config.admin)?;
        self.config.admin = new_admin;
        msg!("Admin updated to {}", new_admin);
        Ok(())
    }

    pub fn update_scheduler(&mut self, caller: &Pubkey, new_scheduler: Pubkey) -> Result<(), ContestError> {
        self.ensure(caller, &self.config.admin)?;
        self.config.scheduler = new_scheduler;
        msg!("Scheduler updated to {}", new_scheduler);
        Ok(())
    }

    pub fn update_oracle(&mut self, caller: &Pubkey, new_oracle: Pubkey) -> Result<(), ContestError> {
        self.ensure(caller, &self.config.admin)?;
        self.config.oracle = new_oracle;
        msg!("Oracle updated to {}", new_oracle);
        Ok(())
    }

    pub fn update_limits(
        &mut self,
        caller: &Pubkey,
        max_redraws: u8,
        max_upkeep_batch: u32,
        max_entries_per_call: u32,
    ) -> Result<(), ContestError> {
        self.ensure(caller, &self.config.admin)?;
        if max_upkeep_batch == 0 || max_entries_per_call == 0 {
            return Err(ContestError::InvalidContestParameters);
        }
        self.config.max_redraws = max_redraws;
        self.config.max_upkeep_batch = max_upkeep_batch;
        self.config.max_entries_per_call = max_entries_per_call;
        msg!(
            "Limits updated: redraws={}, upkeep batch={}, entries per call={}",
            max_redraws,
            max_upkeep_batch,
            max_entries_per_call
        );
        Ok(())
    }

    // ---- queries ----

    pub fn contest(&self, id: ContestId) -> Result<&Contest, ContestError> {
        self.registry.contest(id)
    }

    pub fn live_contests(&self) -> Vec<ContestId> {
        self.registry.live_contests()
    }

    pub fn entry_count(&self, id: ContestId, who: &Pubkey) -> Result<u64, ContestError> {
        Ok(self.registry.contest(id)?.entry_count(who))
    }

    pub fn winners(&self, id: ContestId) -> Result<&[Pubkey], ContestError> {
        Ok(&self.registry.contest(id)?.winners)
    }

    // ---- participant surface ----

    /// Privileged. Sponsored raffle funds come from the creator: attached for
    /// native contests, collected through the treasury for token contests.
    pub fn create_contest(
        &mut self,
        caller: &Pubkey,
        now: UnixTimestamp,
        value: u64,
        params: &ContestParams,
        treasury: &mut dyn Treasury,
    ) -> Result<ContestId, ContestError> {
        self.ensure(caller, &self.config.admin)?;

        let expected_value = match params.medium {
            PaymentMedium::Native => params.sponsored_pool,
            PaymentMedium::Token(_) => 0,
        };
        if value != expected_value {
            return Err(ContestError::IncorrectPayment);
        }
        ContestRegistry::validate(params)?;
        if let PaymentMedium::Token(_) = params.medium {
            if params.sponsored_pool > 0 {
                treasury.collect(params.medium, caller, params.sponsored_pool)?;
            }
        }

        let id = self.registry.create(params, now)?;
        msg!(
            "Contest {} created: fee={}, duration={}s, pool={}",
            id,
            params.entry_fee,
            params.duration,
            params.sponsored_pool
        );
        self.emit(ContestEvent::ContestCreated {
            contest: id,
            kind: params.kind,
            entry_fee: params.entry_fee,
            duration: params.duration,
        });
        Ok(id)
    }

    /// Buy raffle entries or a lotto ticket. A lotto entry without numbers
    /// asks the oracle for a quick pick; the contest stays live meanwhile.
    pub fn enter(
        &mut self,
        caller: &Pubkey,
        value: u64,
        contest_id: ContestId,
        numbers: Option<&[u8]>,
        entries: u32,
        oracle: &mut dyn RandomnessSource,
        treasury: &mut dyn Treasury,
    ) -> Result<(), ContestError> {
        let max_entries = self.config.max_entries_per_call;
        let plan = self
            .registry
            .prepare_entry(contest_id, numbers, entries, max_entries, value)?;
        let medium = self.registry.contest(contest_id)?.medium;

        // request first: an orphaned request is ignored on fulfillment,
        // collected funds would not be
        let quick_pick = if plan.ticket.is_none() && self.registry.contest(contest_id)?.kind.is_lotto() {
            let request = RandomnessRequest::quick_pick(contest_id, *caller);
            Some((oracle.request_randomness(&request)?, request))
        } else {
            None
        };

        if let PaymentMedium::Token(_) = medium {
            if plan.amount > 0 {
                treasury.collect(medium, caller, plan.amount)?;
            }
        }

        self.registry.record_entry(contest_id, *caller, &plan)?;
        if let Some((request_id, request)) = quick_pick {
            self.track_request(request_id, &request);
        }
        if let Some(ticket) = plan.ticket {
            self.emit(ContestEvent::TicketAssigned {
                contest: contest_id,
                participant: *caller,
                ticket,
            });
        }

        msg!("{} entered {} with {} entries", caller, contest_id, plan.entries);
        self.emit(ContestEvent::Entered {
            contest: contest_id,
            participant: *caller,
            entries: plan.entries,
        });
        Ok(())
    }

    /// Pull payment of a finished raffle
    pub fn claim_prize(
        &mut self,
        caller: &Pubkey,
        contest_id: ContestId,
        treasury: &mut dyn Treasury,
    ) -> Result<u64, ContestError> {
        let contest = self.registry.contest(contest_id)?;
        if contest.kind != ContestKind::Raffle {
            return Err(ContestError::WrongContestKind);
        }
        self.settle_payout(caller, contest_id, treasury)
    }

    /// Collect a lotto payout whose automatic transfer failed
    pub fn retry_payout(
        &mut self,
        caller: &Pubkey,
        contest_id: ContestId,
        treasury: &mut dyn Treasury,
    ) -> Result<u64, ContestError> {
        let contest = self.registry.contest(contest_id)?;
        if !contest.kind.is_lotto() {
            return Err(ContestError::WrongContestKind);
        }
        self.settle_payout(caller, contest_id, treasury)
    }

    fn settle_payout(
        &mut self,
        caller: &Pubkey,
        contest_id: ContestId,
        treasury: &mut dyn Treasury,
    ) -> Result<u64, ContestError> {
        let contest = self.registry.contest_mut(contest_id)?;
        if contest.status != ContestStatus::Finished {
            msg!("Contest {} has not finished", contest_id);
            return Err(ContestError::ContestNotFinished);
        }
        let index = contest.payout_index(caller).ok_or(ContestError::NotTheWinner)?;
        let medium = contest.medium;

        let amount = distributor::settle(treasury, medium, &mut contest.payouts[index])?;
        contest.prize_pool = contest.prize_pool.checked_sub(amount).ok_or(ContestError::Overflow)?;

        msg!("{} collected {} from {}", caller, amount, contest_id);
        self.emit(ContestEvent::PrizePaid {
            contest: contest_id,
            winner: *caller,
            amount,
        });
        Ok(amount)
    }

    // ---- randomness ----

    fn track_request(&mut self, request_id: RequestId, request: &RandomnessRequest) {
        self.pending.insert(
            request_id,
            PendingRequest {
                contest: request.contest,
                purpose: request.purpose,
            },
        );
        msg!("Randomness {} requested for {}", request_id, request.contest);
        self.emit(ContestEvent::RandomnessRequested {
            contest: request.contest,
            request: request_id,
            purpose: request.purpose,
        });
    }

    /// Stage a contest and ask for its draw seed
    pub(crate) fn request_draw(
        &mut self,
        contest_id: ContestId,
        oracle: &mut dyn RandomnessSource,
    ) -> Result<RequestId, ContestError> {
        let request = RandomnessRequest::draw(contest_id);
        let request_id = oracle.request_randomness(&request)?;

        let contest = self.registry.contest_mut(contest_id)?;
        contest.status = ContestStatus::Staged;
        contest.pending_request = Some(request_id);
        self.track_request(request_id, &request);
        Ok(request_id)
    }

    /// Oracle callback. Returns `Ok(false)` when the request id is unknown,
    /// already consumed or stale; nothing changes in that case.
    pub fn fulfill_randomness(
        &mut self,
        caller: &Pubkey,
        now: UnixTimestamp,
        request_id: RequestId,
        words: &[RandomWord],
        oracle: &mut dyn RandomnessSource,
        treasury: &mut dyn Treasury,
    ) -> Result<bool, ContestError> {
        self.ensure(caller, &self.config.oracle)?;

        if self.pending.get(&request_id).is_none() {
            msg!("Ignoring fulfillment for unknown request {}", request_id);
            self.emit(ContestEvent::FulfillmentIgnored { request: request_id });
            return Ok(false);
        }
        let seed = *words.first().ok_or(ContestError::MissingRandomness)?;
        let pending = match self.pending.take(&request_id) {
            Some(pending) => pending,
            None => return Ok(false),
        };

        match pending.purpose {
            RequestPurpose::QuickPick { participant } => {
                self.fulfill_quick_pick(request_id, pending.contest, participant, &seed)
            }
            RequestPurpose::Draw => self.fulfill_draw(now, request_id, pending.contest, &seed, oracle, treasury),
        }
    }

    fn fulfill_quick_pick(
        &mut self,
        request_id: RequestId,
        contest_id: ContestId,
        participant: Pubkey,
        seed: &RandomWord,
    ) -> Result<bool, ContestError> {
        let live = self.registry.get(contest_id).map(|c| c.is_live()).unwrap_or(false);
        if !live {
            msg!("Quick pick {} arrived after {} closed", request_id, contest_id);
            self.emit(ContestEvent::FulfillmentIgnored { request: request_id });
            return Ok(false);
        }

        let ticket = ticket_from_seed(seed);
        self.registry.assign_ticket(contest_id, participant, ticket)?;
        msg!("Quick pick {:?} assigned to {} in {}", ticket.0, participant, contest_id);
        self.emit(ContestEvent::TicketAssigned {
            contest: contest_id,
            participant,
            ticket,
        });
        Ok(true)
    }

    fn fulfill_draw(
        &mut self,
        now: UnixTimestamp,
        request_id: RequestId,
        contest_id: ContestId,
        seed: &RandomWord,
        oracle: &mut dyn RandomnessSource,
        treasury: &mut dyn Treasury,
    ) -> Result<bool, ContestError> {
        let staged = self
            .registry
            .get(contest_id)
            .map(|c| c.status == ContestStatus::Staged && c.pending_request == Some(request_id))
            .unwrap_or(false);
        if !staged {
            msg!("Draw {} does not match the state of {}", request_id, contest_id);
            self.emit(ContestEvent::FulfillmentIgnored { request: request_id });
            return Ok(false);
        }

        // selection phase, no side effects
        let (kind, winners, winning) = {
            let contest = self.registry.contest(contest_id)?;
            match contest.kind {
                ContestKind::Raffle => {
                    let winners: Vec<Pubkey> = selector::raffle_winner(&contest.participants, seed)
                        .into_iter()
                        .collect();
                    (contest.kind, winners, None)
                }
                ContestKind::Lotto { .. } => {
                    let (winning, winners) =
                        selector::lotto_winners(&contest.participants, &contest.tickets, seed);
                    (contest.kind, winners, Some(winning))
                }
            }
        };

        {
            let contest = self.registry.contest_mut(contest_id)?;
            contest.pending_request = None;
            contest.winning_numbers = winning.or(contest.winning_numbers);
        }

        if winners.is_empty() {
            return self.handle_no_winner(now, contest_id, kind, oracle).map(|_| true);
        }

        msg!("Contest {} drew {} winner(s)", contest_id, winners.len());
        self.emit(ContestEvent::WinnersSelected {
            contest: contest_id,
            winners: winners.clone(),
        });

        match kind {
            ContestKind::Raffle => self.finish_raffle(contest_id, winners)?,
            ContestKind::Lotto { .. } => self.finish_lotto(contest_id, winners, treasury)?,
        }
        Ok(true)
    }

    fn handle_no_winner(
        &mut self,
        now: UnixTimestamp,
        contest_id: ContestId,
        kind: ContestKind,
        oracle: &mut dyn RandomnessSource,
    ) -> Result<(), ContestError> {
        let max_redraws = self.config.max_redraws;
        let redraws = self.registry.contest(contest_id)?.redraws;

        if let ContestKind::Lotto { until_won: true } = kind {
            if redraws < max_redraws {
                match self.request_draw(contest_id, oracle) {
                    Ok(_) => {
                        let contest = self.registry.contest_mut(contest_id)?;
                        contest.redraws = redraws + 1;
                        msg!("No match in {}, redraw {} of {}", contest_id, redraws + 1, max_redraws);
                        return Ok(());
                    }
                    Err(err) => msg!("Redraw request for {} failed: {}", contest_id, err),
                }
            }
        }

        let contest = self.registry.contest_mut(contest_id)?;
        contest.reopen(now);
        let round = contest.round;
        msg!("No winner in {}, reopened for round {}", contest_id, round);
        self.emit(ContestEvent::ContestReopened {
            contest: contest_id,
            round,
        });
        Ok(())
    }

    fn finish_raffle(&mut self, contest_id: ContestId, winners: Vec<Pubkey>) -> Result<(), ContestError> {
        let contest = self.registry.contest_mut(contest_id)?;
        let pool = contest.prize_pool;
        contest.payouts = winners
            .iter()
            .map(|winner| Payout {
                winner: *winner,
                amount: pool,
                paid: false,
            })
            .collect();
        contest.winners = winners;
        contest.status = ContestStatus::Finished;
        Ok(())
    }

    fn finish_lotto(
        &mut self,
        contest_id: ContestId,
        winners: Vec<Pubkey>,
        treasury: &mut dyn Treasury,
    ) -> Result<(), ContestError> {
        let contest = self.registry.contest_mut(contest_id)?;
        let plan = distributor::plan_split(contest.prize_pool, &winners);
        msg!(
            "Splitting {} across {} winner(s): share={}, retained={}",
            contest.prize_pool,
            winners.len(),
            plan.share,
            plan.remainder
        );
        contest.payouts = plan.payouts;
        contest.winners = winners;
        contest.status = ContestStatus::Finished;

        // effect phase
        let medium = contest.medium;
        let outcomes = distributor::pay_out(treasury, medium, &mut contest.payouts);
        let paid = distributor::total_paid(&outcomes)?;
        contest.prize_pool = contest.prize_pool.checked_sub(paid).ok_or(ContestError::Overflow)?;

        for outcome in outcomes {
            let event = match outcome.result {
                Ok(()) => ContestEvent::PrizePaid {
                    contest: contest_id,
                    winner: outcome.winner,
                    amount: outcome.amount,
                },
                Err(_) => ContestEvent::PayoutFailed {
                    contest: contest_id,
                    winner: outcome.winner,
                    amount: outcome.amount,
                },
            };
            self.emit(event);
        }
        Ok(())
    }
}
