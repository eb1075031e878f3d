use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Errors that may be returned by the contest engine
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContestError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// No contest is registered under the given id
    #[error("Contest not found")]
    ContestNotFound,

    /// Contest is not accepting entries
    #[error("Contest is not live")]
    ContestNotLive,

    /// Contest has not finished yet
    #[error("Contest has not finished yet")]
    ContestNotFinished,

    /// Contest duration must be positive
    #[error("Invalid contest duration")]
    InvalidDuration,

    /// Sponsored prize pools are only supported by raffles
    #[error("Invalid contest parameters")]
    InvalidContestParameters,

    /// Attached value does not match the entry fee
    #[error("Incorrect payment for entry")]
    IncorrectPayment,

    /// Raffle entries must be at least one
    #[error("Entry count must be at least one")]
    InvalidEntryCount,

    /// Ticket has the wrong number of values
    #[error("Ticket has the wrong length")]
    InvalidTicketLength,

    /// Ticket value outside the allowed range
    #[error("Ticket number out of range")]
    TicketNumberOutOfRange,

    /// Numbers were supplied for a raffle entry
    #[error("Raffle entries do not take numbers")]
    UnexpectedTicket,

    /// Caller is not allowed to perform this action
    #[error("Caller is not authorized")]
    Unauthorized,

    /// Caller is not a recorded winner
    #[error("Not the winner")]
    NotTheWinner,

    /// Prize already claimed
    #[error("Prize already claimed")]
    PrizeAlreadyClaimed,

    /// Operation is not supported by this contest kind
    #[error("Operation not supported for this contest kind")]
    WrongContestKind,

    /// Asset transfer was rejected by the treasury
    #[error("Transfer failed")]
    TransferFailed,

    /// Randomness source refused the request
    #[error("Randomness request failed")]
    RandomnessRequestFailed,

    /// Fulfillment delivered no random words
    #[error("Fulfillment carried no random words")]
    MissingRandomness,

    /// Upkeep payload could not be decoded
    #[error("Malformed upkeep payload")]
    MalformedUpkeepPayload,

    /// Arithmetic overflow on balances or counters
    #[error("Arithmetic overflow")]
    Overflow,
}

impl From<ContestError> for ProgramError {
    fn from(e: ContestError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for ContestError {
    fn type_of() -> &'static str {
        "Contest Error"
    }
}

impl PrintProgramError for ContestError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
