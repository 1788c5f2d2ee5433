use thiserror::Error;

use crate::domain::{
    format_cents, Cents, CategoryError, ParseCentsError, TotalsOverflow, TransactionId,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(
        "Insufficient funds: balance {}, required {}",
        format_cents(*balance),
        format_cents(*required)
    )]
    InsufficientFunds { balance: Cents, required: Cents },

    #[error("Transaction not found: {0}")]
    NotFound(TransactionId),

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

impl From<ParseCentsError> for AppError {
    fn from(err: ParseCentsError) -> Self {
        AppError::Validation(format!("amount: {}", err))
    }
}

impl From<TotalsOverflow> for AppError {
    fn from(err: TotalsOverflow) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        AppError::Validation(err.to_string())
    }
}
