use thiserror::Error;

use crate::Amount;

/// Reasons a play action is refused. None of these mutate the game state.
#[derive(Error, Debug, Copy, Clone, PartialEq)]
pub enum GameError {
    #[error("Game not started, press start first")]
    NotRunning,
    #[error("Balance is zero, restart the game to play again")]
    Depleted,
    #[error("Insufficient balance {balance} for bet {bet}")]
    InsufficientFunds { balance: Amount, bet: Amount },
}

pub type Result<T> = core::result::Result<T, GameError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("Storage write rejected: {0}")]
    WriteFailed(String),
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("No saved state under {0}")]
    NotFound(&'static str),
    #[error("Saved state is not a JSON object")]
    NotAnObject,
    #[error("Saved state could not be parsed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}
