// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Rejected at the schedule-store boundary; never reaches execution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("transfer amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("transfer day must be between 1 and 31, got {0}")]
    DayOutOfRange(u32),
    #[error("source and destination must share a currency ({src} vs {destination})")]
    CurrencyMismatch { src: String, destination: String },
    #[error("source and destination must be different accounts")]
    SameAccount,
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("insufficient funds in '{account}': balance {balance}, needed {amount}")]
    InsufficientFunds {
        account: String,
        balance: Decimal,
        amount: Decimal,
    },
    #[error("account '{account}' is frozen")]
    AccountLocked { account: String },
    #[error("account id {0} not found")]
    AccountNotFound(i64),
    #[error("corrupt balance '{value}' stored for '{account}'")]
    CorruptBalance { account: String, value: String },
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

impl TransferError {
    /// Business failures are recorded as FAILED/RETRY executions and recovered
    /// per attempt; everything else aborts the whole batch run.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            TransferError::InsufficientFunds { .. }
                | TransferError::AccountLocked { .. }
                | TransferError::AccountNotFound(_)
        )
    }
}
