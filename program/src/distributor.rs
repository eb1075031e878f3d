use solana_program::{msg, pubkey::Pubkey};

use crate::error::ContestError;
use crate::state::{Payout, PaymentMedium};

/// Moves assets between participants and the contest escrow
pub trait Treasury {
    /// Pull `amount` of a token from `from` into escrow
    fn collect(&mut self, medium: PaymentMedium, from: &Pubkey, amount: u64) -> Result<(), ContestError>;

    /// Pay `amount` out of escrow to `to`
    fn pay(&mut self, medium: PaymentMedium, to: &Pubkey, amount: u64) -> Result<(), ContestError>;
}

/// Even split of a pool across winners
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitPlan {
    pub share: u64,
    /// Left in the pool after integer division
    pub remainder: u64,
    pub payouts: Vec<Payout>,
}

/// Integer split; the remainder is retained rather than distributed
pub fn plan_split(pool: u64, winners: &[Pubkey]) -> SplitPlan {
    if winners.is_empty() {
        return SplitPlan {
            share: 0,
            remainder: pool,
            payouts: Vec::new(),
        };
    }
    let count = winners.len() as u64;
    let share = pool / count;
    let payouts = winners
        .iter()
        .map(|winner| Payout {
            winner: *winner,
            amount: share,
            paid: false,
        })
        .collect();
    SplitPlan {
        share,
        remainder: pool - share * count,
        payouts,
    }
}

/// Result of one transfer attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayoutOutcome {
    pub winner: Pubkey,
    pub amount: u64,
    pub result: Result<(), ContestError>,
}

/// Push every unpaid payout; a failure only affects its own recipient.
/// Successful payouts are flagged paid in place.
pub fn pay_out<T: Treasury + ?Sized>(
    treasury: &mut T,
    medium: PaymentMedium,
    payouts: &mut [Payout],
) -> Vec<PayoutOutcome> {
    let mut outcomes = Vec::with_capacity(payouts.len());
    for payout in payouts.iter_mut().filter(|p| !p.paid) {
        let result = if payout.amount == 0 {
            Ok(())
        } else {
            treasury.pay(medium, &payout.winner, payout.amount)
        };
        match result {
            Ok(()) => {
                payout.paid = true;
                msg!("Paid {} to {}", payout.amount, payout.winner);
            }
            Err(err) => {
                msg!("Payout of {} to {} failed: {}", payout.amount, payout.winner, err);
            }
        }
        outcomes.push(PayoutOutcome {
            winner: payout.winner,
            amount: payout.amount,
            result,
        });
    }
    outcomes
}

/// Total actually transferred in a batch
pub fn total_paid(outcomes: &[PayoutOutcome]) -> Result<u64, ContestError> {
    outcomes
        .iter()
        .filter(|o| o.result.is_ok())
        .try_fold(0u64, |acc, o| acc.checked_add(o.amount).ok_or(ContestError::Overflow))
}

/// Pull-based settlement of a single payout. The payout stays unpaid when
/// the transfer fails so the winner can try again.
pub fn settle<T: Treasury + ?Sized>(
    treasury: &mut T,
    medium: PaymentMedium,
    payout: &mut Payout,
) -> Result<u64, ContestError> {
    if payout.paid {
        return Err(ContestError::PrizeAlreadyClaimed);
    }
    if payout.amount > 0 {
        treasury.pay(medium, &payout.winner, payout.amount).map_err(|err| {
            msg!("Transfer of {} to {} failed: {}", payout.amount, payout.winner, err);
            ContestError::TransferFailed
        })?;
    }
    payout.paid = true;
    Ok(payout.amount)
}
