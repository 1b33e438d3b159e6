//! Errors raised while validating user input.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount has no digits")]
    EmptyAmount,
    #[error("amount must be greater than zero")]
    AmountNotPositive,
    #[error("amount too large")]
    AmountTooLarge,
}
