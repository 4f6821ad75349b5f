use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the lottery program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LotteryError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstruction,

    /// Attached stake is below the minimum
    #[error("Stake is below the minimum entry amount")]
    InsufficientStake,

    /// Only the manager can resolve a round
    #[error("Only the manager can pick a winner")]
    Unauthorized,

    /// No participants in the current round
    #[error("Cannot pick a winner from an empty round")]
    EmptyRound,

    /// Every participant slot is taken
    #[error("The current round is full")]
    RoundFull,

    /// Lottery account already holds an initialized lottery
    #[error("Lottery already initialized")]
    AlreadyInitialized,

    /// Lottery account has not been initialized
    #[error("Lottery not initialized")]
    NotInitialized,

    /// Lottery account is not the program derived address or has the wrong owner
    #[error("Invalid lottery account")]
    InvalidLotteryAccount,

    /// The selected winner's account was not passed to the instruction
    #[error("Winner account was not supplied")]
    WinnerAccountMissing,

    /// Lamport arithmetic overflowed
    #[error("Arithmetic overflow")]
    Overflow,

    /// Initialize was not signed by the program's upgrade authority
    #[error("Only the program upgrade authority can initialize the lottery")]
    NotUpgradeAuthority,
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
