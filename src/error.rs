use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError,
    program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq)]
pub enum RaffleError {
    /// Raffle account is already initialized
    #[error("Raffle account is already initialized")]
    AlreadyInitialized,

    /// Entrance fee or interval is out of range
    #[error("Entrance fee must be non-zero and interval positive")]
    InvalidFeeOrInterval,

    /// Entry fee is below the configured entrance fee
    #[error("Entry fee is below the entrance fee")]
    InsufficientFee,

    /// Entries are only accepted while the round is open
    #[error("Round is not open for entries")]
    RoundNotOpen,

    /// The entry ledger has no free slots left
    #[error("Raffle entry ledger is full")]
    RaffleFull,

    /// Upkeep conditions are not met
    #[error("Upkeep is not needed")]
    UpkeepNotNeeded,

    /// Fulfillment does not match the outstanding randomness request
    #[error("Unknown or stale randomness request")]
    UnknownOrStaleRequest,

    /// Fulfillment was not signed by the configured oracle authority
    #[error("Fulfillment must be signed by the oracle authority")]
    UnauthorizedOracle,

    /// The provided winner account is not the selected player
    #[error("Winner account does not match the selected player")]
    WinnerAccountMismatch,

    /// Prize payout could not be completed
    #[error("Prize payout failed")]
    PayoutFailed,

    /// Player index is past the end of the ledger
    #[error("Player index out of range")]
    IndexOutOfRange,

    /// Arithmetic overflowed
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
