//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`EmptyLedger`] thrown when undoing with no entry recorded.
//! - [`NoReceiptPending`] thrown when amending a receipt that was never uploaded.
//! - [`InvalidAmount`] thrown when a user supplied amount cannot be parsed.
//! - [`InvalidBudget`] thrown when a budget limit is not strictly positive.
//! - [`Store`] thrown when the persistence store fails.
//!
//!  [`EmptyLedger`]: EngineError::EmptyLedger
//!  [`NoReceiptPending`]: EngineError::NoReceiptPending
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidBudget`]: EngineError::InvalidBudget
//!  [`Store`]: EngineError::Store
use thiserror::Error;

use crate::store::StoreError;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("the ledger is empty")]
    EmptyLedger,
    #[error("no pending receipt")]
    NoReceiptPending,
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid budget: {0}")]
    InvalidBudget(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::EmptyLedger, Self::EmptyLedger) => true,
            (Self::NoReceiptPending, Self::NoReceiptPending) => true,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidBudget(a), Self::InvalidBudget(b)) => a == b,
            (Self::Store(a), Self::Store(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
