use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the lottery program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LotteryError {
    /// Entry value is below the entrance fee
    #[error("Entry value is lower than the entrance fee")]
    InsufficientValue,

    /// Entry attempted while the round is calculating a winner
    #[error("Lottery round is not open")]
    RoundNotOpen,

    /// Closing attempted while the upkeep predicate is false
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Fulfillment for a request that is not the outstanding one
    #[error("Unknown or already fulfilled randomness request")]
    UnknownRequest,

    /// Payout attempted against an empty participant list
    #[error("No participants in the round")]
    NoParticipants,

    /// The prize could not be delivered to the winner
    #[error("Prize transfer to the winner failed")]
    TransferFailed,

    #[error("Invalid instruction data")]
    InvalidInstruction,

    #[error("Account is already initialized")]
    AlreadyInitialized,

    #[error("Account is not initialized")]
    NotInitialized,

    /// Lottery account does not match the program's lottery address
    #[error("Invalid lottery account")]
    InvalidLotteryAccount,

    /// Oracle queue does not match the one bound to the lottery
    #[error("Invalid oracle queue account")]
    InvalidOracleQueue,

    /// Fulfillment was not signed by the oracle authority
    #[error("Only the oracle authority can fulfill randomness")]
    UnauthorizedOracle,

    #[error("Fulfillment carries no random words")]
    MissingRandomWords,

    /// The lottery account has no room for another entry
    #[error("Lottery is full")]
    LotteryFull,

    #[error("Invalid lottery configuration")]
    InvalidConfig,

    #[error("Arithmetic overflow")]
    Overflow,
}

impl From<LotteryError> for ProgramError {
    fn from(e: LotteryError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for LotteryError {
    fn type_of() -> &'static str {
        "Lottery Error"
    }
}

impl PrintProgramError for LotteryError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
