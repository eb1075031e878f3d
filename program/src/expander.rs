//! Expansion of a single oracle word into bounded draws.
//!
//! Draw `i` is `keccak256(seed || i) mod range + 1`, where `seed` and `i` are
//! both encoded as 32-byte big-endian words. The whole 256-bit digest is
//! reduced, so results do not depend on which bytes of the hash are kept.

use solana_program::keccak;

use crate::state::{RandomWord, Ticket, NUMBER_RANGE, TICKET_LEN};

fn index_word(index: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&index.to_be_bytes());
    word
}

fn reduce(digest: &[u8; 32], range: u64) -> u64 {
    let range = range as u128;
    digest
        .iter()
        .fold(0u128, |acc, byte| ((acc << 8) | *byte as u128) % range) as u64
}

/// Draw number `index` in `1..=range`. Returns 0 only when `range` is 0.
pub fn expand_one(seed: &RandomWord, index: u64, range: u64) -> u64 {
    if range == 0 {
        return 0;
    }
    let digest = keccak::hashv(&[seed.as_ref(), index_word(index).as_ref()]);
    reduce(&digest.to_bytes(), range) + 1
}

/// `count` draws in `1..=range`; empty when `range` is 0
pub fn expand(seed: &RandomWord, count: usize, range: u64) -> Vec<u64> {
    if range == 0 {
        return Vec::new();
    }
    (0..count as u64)
        .map(|index| expand_one(seed, index, range))
        .collect()
}

/// Lotto ticket generated from a seed, in draw order
pub fn ticket_from_seed(seed: &RandomWord) -> Ticket {
    let mut numbers = [0u8; TICKET_LEN];
    for (slot, value) in numbers.iter_mut().zip(expand(seed, TICKET_LEN, NUMBER_RANGE)) {
        // bounded by NUMBER_RANGE
        *slot = value as u8;
    }
    Ticket(numbers)
}
