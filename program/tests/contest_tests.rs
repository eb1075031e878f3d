use solana_program::{entrypoint::ProgramResult, program_error::ProgramError, pubkey::Pubkey};
use std::collections::{HashMap, HashSet};

use contest_engine::{
    distributor::Treasury,
    error::ContestError,
    event::ContestEvent,
    expander::{expand_one, ticket_from_seed},
    instruction,
    process_instruction,
    selector::{ticket_matches, winning_combination},
    state::{
        word_from_u64, ContestId, ContestKind, ContestParams, ContestStatus, EngineConfig, PaymentMedium,
        RandomWord, RequestId, Ticket, DEFAULT_MAX_ENTRIES_PER_CALL,
    },
    upkeep::UpkeepPayload,
    vrf::{QueuedOracle, RequestPurpose},
    Collaborators, ContestEngine, Invocation,
};

const T0: i64 = 1_700_000_000;

/// Token balances, escrow and a record of every payment
#[derive(Default)]
struct Ledger {
    tokens: HashMap<Pubkey, u64>,
    escrow: u64,
    payments: Vec<(Pubkey, u64)>,
    rejects: HashSet<Pubkey>,
}

impl Treasury for Ledger {
    fn collect(&mut self, _medium: PaymentMedium, from: &Pubkey, amount: u64) -> Result<(), ContestError> {
        let balance = self.tokens.entry(*from).or_default();
        if *balance < amount {
            return Err(ContestError::TransferFailed);
        }
        *balance -= amount;
        self.escrow += amount;
        Ok(())
    }

    fn pay(&mut self, _medium: PaymentMedium, to: &Pubkey, amount: u64) -> Result<(), ContestError> {
        if self.rejects.contains(to) {
            return Err(ContestError::TransferFailed);
        }
        self.payments.push((*to, amount));
        Ok(())
    }
}

struct Harness {
    engine: ContestEngine,
    admin: Pubkey,
    scheduler: Pubkey,
    oracle_key: Pubkey,
    oracle: QueuedOracle,
    ledger: Ledger,
}

impl Harness {
    fn new() -> Self {
        let admin = Pubkey::new_unique();
        let scheduler = Pubkey::new_unique();
        let oracle_key = Pubkey::new_unique();
        Self {
            engine: ContestEngine::new(EngineConfig::new(admin, scheduler, oracle_key)),
            admin,
            scheduler,
            oracle_key,
            oracle: QueuedOracle::new(),
            ledger: Ledger::default(),
        }
    }

    fn run(&mut self, caller: Pubkey, now: i64, value: u64, data: Vec<u8>) -> ProgramResult {
        let mut collaborators = Collaborators {
            oracle: &mut self.oracle,
            treasury: &mut self.ledger,
        };
        let invocation = Invocation::new(caller, now).with_value(value);
        process_instruction(&mut self.engine, &invocation, &mut collaborators, &data)
    }

    fn create(&mut self, params: ContestParams, value: u64) -> ContestId {
        let admin = self.admin;
        self.run(admin, T0, value, instruction::create_contest(params)).unwrap();
        ContestId(self.engine.registry().len() as u64)
    }

    fn enter(
        &mut self,
        who: Pubkey,
        contest: ContestId,
        numbers: Option<Vec<u8>>,
        entries: u32,
        value: u64,
    ) -> ProgramResult {
        self.run(who, T0 + 1, value, instruction::enter(contest, numbers, entries))
    }

    fn upkeep(&mut self, now: i64) -> ProgramResult {
        let (_, data) = self.engine.check_upkeep(now);
        let scheduler = self.scheduler;
        self.run(scheduler, now, 0, instruction::perform_upkeep(data))
    }

    fn fulfill(&mut self, request: RequestId, seed: RandomWord, now: i64) -> ProgramResult {
        self.oracle.take(&request);
        let oracle = self.oracle_key;
        self.run(oracle, now, 0, instruction::fulfill_randomness(request, vec![seed]))
    }

    fn take_all_events(&mut self) -> Vec<ContestEvent> {
        self.engine.take_events()
    }

    fn pending_draw(&self, contest: ContestId) -> RequestId {
        self.engine.contest(contest).unwrap().pending_request.unwrap()
    }
}

fn raffle_params(fee: u64, duration: i64) -> ContestParams {
    ContestParams {
        kind: ContestKind::Raffle,
        entry_fee: fee,
        duration,
        medium: PaymentMedium::Native,
        sponsored_pool: 0,
    }
}

fn lotto_params(fee: u64, until_won: bool) -> ContestParams {
    ContestParams {
        kind: ContestKind::Lotto { until_won },
        entry_fee: fee,
        duration: 600,
        medium: PaymentMedium::Native,
        sponsored_pool: 0,
    }
}

fn err(e: ContestError) -> ProgramResult {
    Err(ProgramError::from(e))
}

/// Sorted copy of `ticket` with its largest value changed
fn near_miss(ticket: &Ticket) -> Vec<u8> {
    let mut numbers = ticket.sorted().0;
    let last = numbers[5];
    numbers[5] = if last < 100 { last + 1 } else { last - 1 };
    numbers.to_vec()
}

#[test]
fn test_create_and_query_contest() {
    let mut h = Harness::new();
    let id = h.create(raffle_params(10, 3600), 0);

    let contest = h.engine.contest(id).unwrap();
    assert_eq!(contest.entry_fee, 10);
    assert_eq!(contest.duration, 3600);
    assert_eq!(contest.status, ContestStatus::Live);
    assert_eq!(contest.start_time, T0);
    assert_eq!(h.engine.live_contests(), vec![id]);
    assert!(h.engine.winners(id).unwrap().is_empty());
    assert_eq!(h.engine.contest(ContestId(99)).err(), Some(ContestError::ContestNotFound));
}

#[test]
fn test_create_requires_admin() {
    let mut h = Harness::new();
    let stranger = Pubkey::new_unique();
    let result = h.run(stranger, T0, 0, instruction::create_contest(raffle_params(1, 60)));
    assert_eq!(result, err(ContestError::Unauthorized));
    assert!(h.engine.registry().is_empty());
}

#[test]
fn test_sponsored_raffle_requires_attached_pool() {
    let mut h = Harness::new();
    let mut params = raffle_params(1, 60);
    params.sponsored_pool = 500;
    let admin = h.admin;
    assert_eq!(
        h.run(admin, T0, 100, instruction::create_contest(params)),
        err(ContestError::IncorrectPayment)
    );
    let id = h.create(params, 500);
    assert_eq!(h.engine.contest(id).unwrap().prize_pool, 500);
}

#[test]
fn test_raffle_scenario() {
    let mut h = Harness::new();
    let id = h.create(raffle_params(10, 3600), 0);
    let players = [Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique()];
    for p in players.iter() {
        h.enter(*p, id, None, 1, 10).unwrap();
    }
    assert_eq!(h.engine.contest(id).unwrap().prize_pool, 30);

    // not yet expired: elapsed must exceed the duration
    assert!(!h.engine.check_upkeep(T0 + 3600).0);
    let first = h.engine.check_upkeep(T0 + 3601);
    let second = h.engine.check_upkeep(T0 + 3601);
    assert!(first.0);
    assert_eq!(first, second);
    assert_eq!(UpkeepPayload::unpack(&first.1).unwrap().contests, vec![id]);

    let stranger = Pubkey::new_unique();
    assert_eq!(
        h.run(stranger, T0 + 3601, 0, instruction::perform_upkeep(first.1.clone())),
        err(ContestError::Unauthorized)
    );
    h.upkeep(T0 + 3601).unwrap();

    let contest = h.engine.contest(id).unwrap();
    assert_eq!(contest.status, ContestStatus::Staged);
    assert!(!h.engine.check_upkeep(T0 + 3602).0);
    assert_eq!(h.enter(players[0], id, None, 1, 10), err(ContestError::ContestNotLive));

    let request = h.pending_draw(id);
    let seed = word_from_u64(42);
    h.fulfill(request, seed, T0 + 3700).unwrap();

    let index = expand_one(&seed, 0, 3);
    assert!((1..=3).contains(&index));
    let winner = players[(index - 1) as usize];
    assert_eq!(h.engine.winners(id).unwrap(), &[winner]);
    assert_eq!(h.engine.contest(id).unwrap().status, ContestStatus::Finished);

    let loser = *players.iter().find(|p| **p != winner).unwrap();
    assert_eq!(
        h.run(loser, T0 + 3800, 0, instruction::claim_prize(id)),
        err(ContestError::NotTheWinner)
    );
    h.run(winner, T0 + 3800, 0, instruction::claim_prize(id)).unwrap();
    assert_eq!(h.ledger.payments, vec![(winner, 30)]);
    assert_eq!(h.engine.contest(id).unwrap().prize_pool, 0);

    assert_eq!(
        h.run(winner, T0 + 3900, 0, instruction::claim_prize(id)),
        err(ContestError::PrizeAlreadyClaimed)
    );
    assert_eq!(h.ledger.payments.len(), 1);
}

#[test]
fn test_raffle_odds_follow_entries() {
    let mut h = Harness::new();
    let id = h.create(raffle_params(2, 60), 0);
    let heavy = Pubkey::new_unique();
    let light = Pubkey::new_unique();
    h.enter(heavy, id, None, 3, 6).unwrap();
    h.enter(light, id, None, 1, 2).unwrap();

    assert_eq!(h.engine.entry_count(id, &heavy).unwrap(), 3);
    assert_eq!(h.engine.entry_count(id, &light).unwrap(), 1);
    assert_eq!(h.engine.contest(id).unwrap().participants, vec![heavy, heavy, heavy, light]);
}

#[test]
fn test_oversized_raffle_entry_rejected() {
    let mut h = Harness::new();
    let id = h.create(raffle_params(0, 60), 0);
    let who = Pubkey::new_unique();

    assert_eq!(h.enter(who, id, None, u32::MAX, 0), err(ContestError::InvalidEntryCount));
    assert_eq!(
        h.enter(who, id, None, DEFAULT_MAX_ENTRIES_PER_CALL + 1, 0),
        err(ContestError::InvalidEntryCount)
    );
    let contest = h.engine.contest(id).unwrap();
    assert!(contest.participants.is_empty());
    assert_eq!(h.engine.entry_count(id, &who).unwrap(), 0);

    h.enter(who, id, None, DEFAULT_MAX_ENTRIES_PER_CALL, 0).unwrap();
    assert_eq!(
        h.engine.entry_count(id, &who).unwrap(),
        u64::from(DEFAULT_MAX_ENTRIES_PER_CALL)
    );
}

#[test]
fn test_claim_before_finish_fails() {
    let mut h = Harness::new();
    let id = h.create(raffle_params(1, 60), 0);
    let player = Pubkey::new_unique();
    h.enter(player, id, None, 1, 1).unwrap();
    assert_eq!(
        h.run(player, T0 + 10, 0, instruction::claim_prize(id)),
        err(ContestError::ContestNotFinished)
    );
}

#[test]
fn test_failed_claim_can_be_retried() {
    let mut h = Harness::new();
    let id = h.create(raffle_params(5, 60), 0);
    let player = Pubkey::new_unique();
    h.enter(player, id, None, 1, 5).unwrap();
    h.upkeep(T0 + 61).unwrap();
    let request = h.pending_draw(id);
    h.fulfill(request, word_from_u64(1), T0 + 62).unwrap();

    h.ledger.rejects.insert(player);
    assert_eq!(
        h.run(player, T0 + 63, 0, instruction::claim_prize(id)),
        err(ContestError::TransferFailed)
    );
    assert_eq!(h.engine.contest(id).unwrap().prize_pool, 5);

    h.ledger.rejects.clear();
    h.run(player, T0 + 64, 0, instruction::claim_prize(id)).unwrap();
    assert_eq!(h.ledger.payments, vec![(player, 5)]);
}

#[test]
fn test_lotto_scenario_single_winner() {
    let mut h = Harness::new();
    let id = h.create(lotto_params(5, false), 0);
    let seed = word_from_u64(7);
    let winning = winning_combination(&seed);

    let a = Pubkey::new_unique();
    let b = Pubkey::new_unique();
    let mut shuffled = winning.0.to_vec();
    shuffled.reverse();
    h.enter(a, id, Some(shuffled), 1, 5).unwrap();
    h.enter(b, id, Some(near_miss(&winning)), 1, 5).unwrap();

    h.upkeep(T0 + 601).unwrap();
    let request = h.pending_draw(id);
    h.fulfill(request, seed, T0 + 700).unwrap();

    let contest = h.engine.contest(id).unwrap();
    assert_eq!(contest.status, ContestStatus::Finished);
    assert_eq!(contest.winners, vec![a]);
    assert_eq!(contest.winning_numbers, Some(winning));
    assert_eq!(contest.prize_pool, 0);
    assert_eq!(h.ledger.payments, vec![(a, 10)]);

    // lotto payouts are pushed, raffle claims do not apply
    assert_eq!(
        h.run(a, T0 + 800, 0, instruction::claim_prize(id)),
        err(ContestError::WrongContestKind)
    );
}

#[test]
fn test_lotto_ticket_validation() {
    let mut h = Harness::new();
    let id = h.create(lotto_params(5, false), 0);
    let who = Pubkey::new_unique();

    assert_eq!(
        h.enter(who, id, Some(vec![1, 2, 3, 4, 5]), 1, 5),
        err(ContestError::InvalidTicketLength)
    );
    assert_eq!(
        h.enter(who, id, Some(vec![1, 2, 3, 4, 5, 101]), 1, 5),
        err(ContestError::TicketNumberOutOfRange)
    );
    assert_eq!(
        h.enter(who, id, Some(vec![1, 2, 3, 4, 5, 6]), 1, 4),
        err(ContestError::IncorrectPayment)
    );
    assert_eq!(
        h.enter(who, id, Some(vec![1, 2, 3, 4, 5, 6]), 2, 10),
        err(ContestError::InvalidEntryCount)
    );

    let contest = h.engine.contest(id).unwrap();
    assert_eq!(contest.prize_pool, 0);
    assert!(contest.participants.is_empty());
    assert!(h.oracle.outstanding().is_empty());
}

#[test]
fn test_lotto_without_winner_reopens_with_pool() {
    let mut h = Harness::new();
    let id = h.create(lotto_params(5, false), 0);
    let seed = word_from_u64(11);
    let winning = winning_combination(&seed);
    let who = Pubkey::new_unique();
    h.enter(who, id, Some(near_miss(&winning)), 1, 5).unwrap();

    h.upkeep(T0 + 601).unwrap();
    let request = h.pending_draw(id);
    h.fulfill(request, seed, T0 + 650).unwrap();

    let contest = h.engine.contest(id).unwrap();
    assert_eq!(contest.status, ContestStatus::Live);
    assert_eq!(contest.start_time, T0 + 650);
    assert_eq!(contest.round, 1);
    assert_eq!(contest.prize_pool, 5);
    assert_eq!(contest.participants, vec![who]);
    assert!(contest.tickets.contains_key(&who));
    assert!(h.ledger.payments.is_empty());
    assert!(h.engine.take_events().contains(&ContestEvent::ContestReopened { contest: id, round: 1 }));

    // rolling jackpot keeps taking entries
    let late = Pubkey::new_unique();
    h.enter(late, id, Some(vec![1, 2, 3, 4, 5, 6]), 1, 5).unwrap();
    assert_eq!(h.engine.contest(id).unwrap().prize_pool, 10);
}

#[test]
fn test_until_won_redraws_are_bounded() {
    let mut h = Harness::new();
    let admin = h.admin;
    h.run(admin, T0, 0, instruction::update_limits(2, 10, 100)).unwrap();
    let id = h.create(lotto_params(5, true), 0);

    let ticket = Ticket([1, 1, 1, 1, 1, 1]);
    let seeds = [word_from_u64(100), word_from_u64(101), word_from_u64(102)];
    for seed in seeds.iter() {
        assert!(!ticket_matches(&ticket, &winning_combination(seed)));
    }
    let who = Pubkey::new_unique();
    h.enter(who, id, Some(ticket.0.to_vec()), 1, 5).unwrap();
    h.upkeep(T0 + 601).unwrap();

    let first = h.pending_draw(id);
    h.fulfill(first, seeds[0], T0 + 610).unwrap();
    let contest = h.engine.contest(id).unwrap();
    assert_eq!(contest.status, ContestStatus::Staged);
    assert_eq!(contest.redraws, 1);
    let second = contest.pending_request.unwrap();
    assert_ne!(first, second);

    h.fulfill(second, seeds[1], T0 + 620).unwrap();
    assert_eq!(h.engine.contest(id).unwrap().redraws, 2);

    let third = h.pending_draw(id);
    h.fulfill(third, seeds[2], T0 + 630).unwrap();
    let contest = h.engine.contest(id).unwrap();
    assert_eq!(contest.status, ContestStatus::Live);
    assert_eq!(contest.redraws, 0);
    assert_eq!(contest.pending_request, None);
    assert_eq!(contest.prize_pool, 5);
}

#[test]
fn test_split_with_remainder_and_isolated_failure() {
    let mut h = Harness::new();
    let id = h.create(lotto_params(5, false), 0);
    let seed = word_from_u64(5150);
    let winning = winning_combination(&seed);

    let a = Pubkey::new_unique();
    let b = Pubkey::new_unique();
    let c = Pubkey::new_unique();
    h.enter(a, id, Some(winning.0.to_vec()), 1, 5).unwrap();
    h.enter(b, id, Some(winning.0.to_vec()), 1, 5).unwrap();
    h.enter(c, id, Some(near_miss(&winning)), 1, 5).unwrap();

    h.ledger.rejects.insert(b);
    h.upkeep(T0 + 601).unwrap();
    let request = h.pending_draw(id);
    h.take_all_events();
    h.fulfill(request, seed, T0 + 610).unwrap();

    let contest = h.engine.contest(id).unwrap();
    assert_eq!(contest.winners, vec![a, b]);
    assert_eq!(h.ledger.payments, vec![(a, 7)]);
    // 15 - 7 paid; b's 7 is owed and 1 is retained
    assert_eq!(contest.prize_pool, 8);

    let events = h.take_all_events();
    assert!(events.contains(&ContestEvent::PayoutFailed {
        contest: id,
        winner: b,
        amount: 7
    }));
    assert!(events.contains(&ContestEvent::PrizePaid {
        contest: id,
        winner: a,
        amount: 7
    }));

    assert_eq!(
        h.run(c, T0 + 700, 0, instruction::retry_payout(id)),
        err(ContestError::NotTheWinner)
    );
    h.ledger.rejects.clear();
    h.run(b, T0 + 700, 0, instruction::retry_payout(id)).unwrap();
    assert_eq!(h.ledger.payments, vec![(a, 7), (b, 7)]);
    assert_eq!(h.engine.contest(id).unwrap().prize_pool, 1);
    assert_eq!(
        h.run(a, T0 + 710, 0, instruction::retry_payout(id)),
        err(ContestError::PrizeAlreadyClaimed)
    );
}

#[test]
fn test_fulfillment_correlation() {
    let mut h = Harness::new();
    let id = h.create(raffle_params(1, 60), 0);
    let player = Pubkey::new_unique();
    h.enter(player, id, None, 1, 1).unwrap();
    h.upkeep(T0 + 61).unwrap();
    let request = h.pending_draw(id);

    // only the oracle may deliver
    let stranger = Pubkey::new_unique();
    assert_eq!(
        h.run(stranger, T0 + 62, 0, instruction::fulfill_randomness(request, vec![word_from_u64(1)])),
        err(ContestError::Unauthorized)
    );

    // unknown id is a no-op
    let before = h.engine.contest(id).unwrap().clone();
    h.take_all_events();
    h.fulfill(RequestId(9_999), word_from_u64(1), T0 + 62).unwrap();
    assert_eq!(h.engine.contest(id).unwrap(), &before);
    assert_eq!(
        h.take_all_events(),
        vec![ContestEvent::FulfillmentIgnored {
            request: RequestId(9_999)
        }]
    );

    // empty delivery leaves the request pending
    let oracle = h.oracle_key;
    assert_eq!(
        h.run(oracle, T0 + 62, 0, instruction::fulfill_randomness(request, vec![])),
        err(ContestError::MissingRandomness)
    );
    assert!(h.engine.pending_requests().get(&request).is_some());

    h.fulfill(request, word_from_u64(1), T0 + 63).unwrap();
    assert!(h.engine.pending_requests().is_empty());
    let finished = h.engine.contest(id).unwrap().clone();
    assert_eq!(finished.status, ContestStatus::Finished);

    // consumed id cannot be replayed
    h.fulfill(request, word_from_u64(2), T0 + 64).unwrap();
    assert_eq!(h.engine.contest(id).unwrap(), &finished);
}

#[test]
fn test_quick_pick_ticket() {
    let mut h = Harness::new();
    let id = h.create(lotto_params(5, false), 0);
    let who = Pubkey::new_unique();
    h.enter(who, id, None, 1, 5).unwrap();

    let (request, pending) = h.oracle.outstanding()[0];
    assert_eq!(pending.purpose, RequestPurpose::QuickPick { participant: who });
    assert_eq!(h.engine.contest(id).unwrap().status, ContestStatus::Live);
    assert_eq!(h.engine.entry_count(id, &who).unwrap(), 0);
    // closing waits for the ticket
    assert!(!h.engine.check_upkeep(T0 + 601).0);

    let seed = word_from_u64(31337);
    h.fulfill(request, seed, T0 + 100).unwrap();
    let contest = h.engine.contest(id).unwrap();
    assert_eq!(contest.tickets[&who], ticket_from_seed(&seed));
    assert_eq!(contest.participants, vec![who]);
    assert_eq!(h.engine.entry_count(id, &who).unwrap(), 1);
    assert!(h.oracle.outstanding().is_empty());
    assert!(h.engine.check_upkeep(T0 + 601).0);
}

#[test]
fn test_token_contest_collects_through_treasury() {
    let mut h = Harness::new();
    let mint = Pubkey::new_unique();
    let mut params = raffle_params(10, 60);
    params.medium = PaymentMedium::Token(mint);
    let id = h.create(params, 0);

    let rich = Pubkey::new_unique();
    let poor = Pubkey::new_unique();
    h.ledger.tokens.insert(rich, 25);
    h.ledger.tokens.insert(poor, 5);

    assert_eq!(h.enter(rich, id, None, 2, 20), err(ContestError::IncorrectPayment));
    h.enter(rich, id, None, 2, 0).unwrap();
    assert_eq!(h.enter(poor, id, None, 1, 0), err(ContestError::TransferFailed));

    assert_eq!(h.ledger.tokens[&rich], 5);
    assert_eq!(h.ledger.escrow, 20);
    let contest = h.engine.contest(id).unwrap();
    assert_eq!(contest.prize_pool, 20);
    assert_eq!(contest.participants, vec![rich, rich]);
}

#[test]
fn test_upkeep_batches_and_revalidates() {
    let mut h = Harness::new();
    let admin = h.admin;
    h.run(admin, T0, 0, instruction::update_limits(3, 2, 100)).unwrap();
    let ids: Vec<ContestId> = (0..3).map(|_| h.create(raffle_params(1, 60), 0)).collect();
    for id in ids.iter() {
        h.enter(Pubkey::new_unique(), *id, None, 1, 1).unwrap();
    }

    let (needed, data) = h.engine.check_upkeep(T0 + 61);
    assert!(needed);
    assert_eq!(UpkeepPayload::unpack(&data).unwrap().contests, vec![ids[0], ids[1]]);
    let scheduler = h.scheduler;
    h.run(scheduler, T0 + 61, 0, instruction::perform_upkeep(data.clone())).unwrap();
    assert_eq!(h.engine.contest(ids[0]).unwrap().status, ContestStatus::Staged);
    assert_eq!(h.engine.contest(ids[1]).unwrap().status, ContestStatus::Staged);
    assert_eq!(h.oracle.outstanding().len(), 2);

    // stale payload: nothing is due any more, no new requests
    h.run(scheduler, T0 + 62, 0, instruction::perform_upkeep(data)).unwrap();
    assert_eq!(h.oracle.outstanding().len(), 2);

    let (needed, data) = h.engine.check_upkeep(T0 + 62);
    assert!(needed);
    assert_eq!(UpkeepPayload::unpack(&data).unwrap().contests, vec![ids[2]]);

    assert_eq!(
        h.run(scheduler, T0 + 62, 0, instruction::perform_upkeep(vec![0xff])),
        err(ContestError::MalformedUpkeepPayload)
    );
}

#[test]
fn test_perform_upkeep_report() {
    let mut h = Harness::new();
    let empty = h.create(raffle_params(1, 60), 0);
    let busy = h.create(raffle_params(1, 60), 0);
    h.enter(Pubkey::new_unique(), busy, None, 1, 1).unwrap();

    let data = UpkeepPayload {
        contests: vec![empty, busy, ContestId(77)],
    }
    .pack();
    let mut oracle = QueuedOracle::new();
    let scheduler = h.scheduler;
    let report = h.engine.perform_upkeep(&scheduler, T0 + 61, &data, &mut oracle).unwrap();

    assert_eq!(report.restarted, vec![empty]);
    assert_eq!(report.staged, vec![busy]);
    assert_eq!(report.skipped, vec![ContestId(77)]);
    let restarted = h.engine.contest(empty).unwrap();
    assert_eq!(restarted.status, ContestStatus::Live);
    assert_eq!(restarted.start_time, T0 + 61);
}

#[test]
fn test_offline_oracle_defers_closing() {
    let mut h = Harness::new();
    let id = h.create(raffle_params(1, 60), 0);
    h.enter(Pubkey::new_unique(), id, None, 1, 1).unwrap();

    h.oracle.offline = true;
    h.upkeep(T0 + 61).unwrap();
    assert_eq!(h.engine.contest(id).unwrap().status, ContestStatus::Live);
    assert!(h.engine.check_upkeep(T0 + 62).0);

    h.oracle.offline = false;
    h.upkeep(T0 + 62).unwrap();
    assert_eq!(h.engine.contest(id).unwrap().status, ContestStatus::Staged);
}

#[test]
fn test_admin_updates() {
    let mut h = Harness::new();
    let new_scheduler = Pubkey::new_unique();
    let stranger = Pubkey::new_unique();
    assert_eq!(
        h.run(stranger, T0, 0, instruction::update_scheduler(new_scheduler)),
        err(ContestError::Unauthorized)
    );
    let admin = h.admin;
    h.run(admin, T0, 0, instruction::update_scheduler(new_scheduler)).unwrap();
    assert_eq!(h.engine.config().scheduler, new_scheduler);

    let new_oracle = Pubkey::new_unique();
    h.run(admin, T0, 0, instruction::update_oracle(new_oracle)).unwrap();
    assert_eq!(h.engine.config().oracle, new_oracle);

    let new_admin = Pubkey::new_unique();
    h.run(admin, T0, 0, instruction::update_admin(new_admin)).unwrap();
    assert_eq!(
        h.run(admin, T0, 0, instruction::create_contest(raffle_params(1, 60))),
        err(ContestError::Unauthorized)
    );
    assert_eq!(
        h.run(new_admin, T0, 0, instruction::update_limits(1, 0, 100)),
        err(ContestError::InvalidContestParameters)
    );
    assert_eq!(
        h.run(new_admin, T0, 0, instruction::update_limits(1, 10, 0)),
        err(ContestError::InvalidContestParameters)
    );
    h.run(new_admin, T0, 0, instruction::update_limits(1, 10, 5)).unwrap();
    assert_eq!(h.engine.config().max_entries_per_call, 5);
}

#[test]
fn test_engine_snapshot_round_trip() {
    let mut h = Harness::new();
    let id = h.create(raffle_params(3, 60), 0);
    h.enter(Pubkey::new_unique(), id, None, 2, 6).unwrap();
    h.upkeep(T0 + 61).unwrap();

    let bytes = h.engine.pack().unwrap();
    let restored = ContestEngine::unpack(&bytes).unwrap();
    assert_eq!(restored.contest(id).unwrap(), h.engine.contest(id).unwrap());
    assert_eq!(restored.pending_requests(), h.engine.pending_requests());
    assert_eq!(restored.config(), h.engine.config());
    assert!(ContestEngine::unpack(&bytes[..bytes.len() - 1]).is_err());
}

#[test]
fn test_invalid_instruction_data() {
    let mut h = Harness::new();
    let admin = h.admin;
    assert_eq!(h.run(admin, T0, 0, vec![]), Err(ProgramError::InvalidInstructionData));
    assert_eq!(h.run(admin, T0, 0, vec![200, 1, 2]), Err(ProgramError::InvalidInstructionData));
}
