use solana_program::pubkey::Pubkey;
use std::collections::BTreeMap;

use crate::expander::{expand_one, ticket_from_seed};
use crate::state::{RandomWord, Ticket};

/// 1-indexed winning slot for a raffle with `entries` slots
pub fn raffle_winning_index(seed: &RandomWord, entries: u64) -> Option<u64> {
    if entries == 0 {
        return None;
    }
    Some(expand_one(seed, 0, entries))
}

/// Raffle winner; each entry occupies its own slot so odds follow entries bought
pub fn raffle_winner(entries: &[Pubkey], seed: &RandomWord) -> Option<Pubkey> {
    let index = raffle_winning_index(seed, entries.len() as u64)?;
    entries.get((index - 1) as usize).copied()
}

/// Winning combination for a lotto draw, sorted ascending
pub fn winning_combination(seed: &RandomWord) -> Ticket {
    ticket_from_seed(seed).sorted()
}

/// Position-by-position comparison after both sides are sorted
pub fn ticket_matches(ticket: &Ticket, winning: &Ticket) -> bool {
    ticket.sorted() == winning.sorted()
}

/// Every participant whose ticket matches `winning`, in roster order
pub fn matching_participants(
    participants: &[Pubkey],
    tickets: &BTreeMap<Pubkey, Ticket>,
    winning: &Ticket,
) -> Vec<Pubkey> {
    participants
        .iter()
        .filter(|who| {
            tickets
                .get(*who)
                .map(|ticket| ticket_matches(ticket, winning))
                .unwrap_or(false)
        })
        .copied()
        .collect()
}

/// Lotto draw: the winning combination and everyone who matched it
pub fn lotto_winners(
    participants: &[Pubkey],
    tickets: &BTreeMap<Pubkey, Ticket>,
    seed: &RandomWord,
) -> (Ticket, Vec<Pubkey>) {
    let winning = winning_combination(seed);
    let winners = matching_participants(participants, tickets, &winning);
    (winning, winners)
}
