use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::engine::ContestEngine;
use crate::error::ContestError;
use crate::event::ContestEvent;
use crate::state::ContestId;
use crate::vrf::RandomnessSource;

/// Payload passed from `check_upkeep` to `perform_upkeep`
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UpkeepPayload {
    pub contests: Vec<ContestId>,
}

impl UpkeepPayload {
    /// Borsh encoding. Writing into a `Vec<u8>` has no I/O failure mode,
    /// so the error arm of `try_to_vec` is unreachable here and even an
    /// empty contest list encodes to its 4-byte length prefix.
    pub fn pack(&self) -> Vec<u8> {
        self.try_to_vec().unwrap_or_default()
    }

    pub fn unpack(data: &[u8]) -> Result<Self, ContestError> {
        Self::try_from_slice(data).map_err(|_| ContestError::MalformedUpkeepPayload)
    }
}

/// What one `perform_upkeep` call did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpkeepReport {
    /// Draw randomness requested
    pub staged: Vec<ContestId>,
    /// Expired with nobody entered, timer restarted
    pub restarted: Vec<ContestId>,
    /// Listed but no longer due
    pub skipped: Vec<ContestId>,
    /// Due but left for a later call
    pub deferred: Vec<ContestId>,
}

impl ContestEngine {
    /// Read-only poll. The payload lists at most `max_upkeep_batch` due contests.
    pub fn check_upkeep(&self, now: UnixTimestamp) -> (bool, Vec<u8>) {
        let limit = self.config().max_upkeep_batch as usize;
        let contests = self.registry().due_contests(now, limit);
        let needed = !contests.is_empty();
        (needed, UpkeepPayload { contests }.pack())
    }

    /// Executes due transitions listed in `data`. Every contest is checked
    /// again since state may have moved on since the poll.
    pub fn perform_upkeep(
        &mut self,
        caller: &Pubkey,
        now: UnixTimestamp,
        data: &[u8],
        oracle: &mut dyn RandomnessSource,
    ) -> Result<UpkeepReport, ContestError> {
        if *caller != self.config().scheduler {
            msg!("Upkeep caller {} is not the scheduler", caller);
            return Err(ContestError::Unauthorized);
        }
        let payload = UpkeepPayload::unpack(data)?;
        let budget = self.config().max_upkeep_batch as usize;
        let mut report = UpkeepReport::default();

        for contest_id in payload.contests {
            let due = self
                .registry()
                .get(contest_id)
                .map(|c| c.is_due(now))
                .unwrap_or(false);
            if !due {
                report.skipped.push(contest_id);
                continue;
            }
            if report.staged.len() + report.restarted.len() >= budget {
                report.deferred.push(contest_id);
                continue;
            }

            let empty = self
                .registry()
                .get(contest_id)
                .map(|c| c.participants.is_empty())
                .unwrap_or(true);
            if empty {
                self.restart(contest_id, now)?;
                report.restarted.push(contest_id);
                continue;
            }

            match self.request_draw(contest_id, oracle) {
                Ok(request_id) => {
                    msg!("Contest {} staged with request {}", contest_id, request_id);
                    report.staged.push(contest_id);
                }
                Err(err) => {
                    // left live; the next poll reports it again
                    msg!("Could not stage {}: {}", contest_id, err);
                    report.deferred.push(contest_id);
                }
            }
        }

        msg!(
            "Upkeep: staged={}, restarted={}, skipped={}, deferred={}",
            report.staged.len(),
            report.restarted.len(),
            report.skipped.len(),
            report.deferred.len()
        );
        Ok(report)
    }

    fn restart(&mut self, contest_id: ContestId, now: UnixTimestamp) -> Result<(), ContestError> {
        let round = {
            let contest = self.registry_mut().contest_mut(contest_id)?;
            contest.reopen(now);
            contest.round
        };
        msg!("Contest {} expired without entries, restarted", contest_id);
        self.emit(ContestEvent::ContestReopened {
            contest: contest_id,
            round,
        });
        Ok(())
    }
}
