// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::TransferError;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;

// Atomic debit/credit primitive. Everything happens inside one IMMEDIATE
// transaction: an error return implies no balance changed and no ledger row
// was written.

struct AccountRow {
    id: i64,
    name: String,
    balance: Decimal,
    frozen: bool,
}

fn load(tx: &rusqlite::Transaction, id: i64) -> Result<AccountRow, TransferError> {
    let row: Option<(String, String, bool)> = tx
        .query_row(
            "SELECT name, balance, frozen FROM accounts WHERE id=?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    let (name, balance_s, frozen) = row.ok_or(TransferError::AccountNotFound(id))?;
    let balance = balance_s
        .parse::<Decimal>()
        .map_err(|_| TransferError::CorruptBalance {
            account: name.clone(),
            value: balance_s,
        })?;
    Ok(AccountRow {
        id,
        name,
        balance,
        frozen,
    })
}

/// Moves `amount` from `source` to `destination` and appends a ledger entry.
/// Account rows are taken in ascending-id order so concurrent
/// opposite-direction transfers cannot deadlock.
pub fn execute(
    conn: &mut Connection,
    source: i64,
    destination: i64,
    amount: Decimal,
) -> Result<i64, TransferError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let (lo, hi) = if source <= destination {
        (source, destination)
    } else {
        (destination, source)
    };
    let first = load(&tx, lo)?;
    let second = load(&tx, hi)?;
    let (src, dst) = if first.id == source {
        (first, second)
    } else {
        (second, first)
    };

    if src.frozen {
        return Err(TransferError::AccountLocked { account: src.name });
    }
    if dst.frozen {
        return Err(TransferError::AccountLocked { account: dst.name });
    }
    if src.balance < amount {
        return Err(TransferError::InsufficientFunds {
            account: src.name,
            balance: src.balance,
            amount,
        });
    }

    tx.execute(
        "UPDATE accounts SET balance=?2 WHERE id=?1",
        params![src.id, (src.balance - amount).to_string()],
    )?;
    tx.execute(
        "UPDATE accounts SET balance=?2 WHERE id=?1",
        params![dst.id, (dst.balance + amount).to_string()],
    )?;
    tx.execute(
        "INSERT INTO ledger(transferred_at, source_account_id, destination_account_id, amount)
         VALUES (datetime('now'), ?1, ?2, ?3)",
        params![src.id, dst.id, amount.to_string()],
    )?;
    let ledger_id = tx.last_insert_rowid();
    tx.commit()?;
    Ok(ledger_id)
}
