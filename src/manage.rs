// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::ValidationError;
use crate::models::Schedule;
use crate::schedule;
use crate::utils::{currency_for_account, month_end};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

// Schedule change manager. All side effects go through the schedule store;
// balances and history are never touched from here.

#[derive(Debug)]
pub enum EnableOutcome {
    /// A fresh version starts on the 1st of next month.
    Created(Schedule),
    /// An existing not-yet-activated future version was amended in place.
    Amended(i64),
    /// Settings already match what is (or will be) in force.
    Unchanged,
}

pub fn enable(
    conn: &Connection,
    source: i64,
    destination: i64,
    amount: Decimal,
    day: u32,
    today: NaiveDate,
) -> Result<EnableOutcome> {
    schedule::validate(amount, day)?;
    if source == destination {
        return Err(ValidationError::SameAccount.into());
    }
    let src_ccy = currency_for_account(conn, source)?;
    let dst_ccy = currency_for_account(conn, destination)?;
    if src_ccy != dst_ccy {
        return Err(ValidationError::CurrencyMismatch {
            src: src_ccy,
            destination: dst_ccy,
        }
        .into());
    }

    let effective = schedule::find_effective(conn, source, destination, today)?;
    let future = schedule::find_future(conn, source, destination, today)?;

    // A pending future version is amended in place rather than stacked on;
    // the pair invariant allows only one.
    if let Some(fut) = future {
        if fut.amount == amount && fut.transfer_day == day {
            return Ok(EnableOutcome::Unchanged);
        }
        schedule::amend_future(conn, fut.id, amount, day)?;
        return Ok(EnableOutcome::Amended(fut.id));
    }

    if let Some(eff) = &effective {
        if eff.valid_to.is_none() {
            if eff.amount == amount && eff.transfer_day == day {
                return Ok(EnableOutcome::Unchanged);
            }
            // The running version finishes out this month.
            schedule::end_validity(conn, eff.id, month_end(today)?)?;
        }
    }
    let created = schedule::create(conn, source, destination, amount, day, today)?;
    Ok(EnableOutcome::Created(created))
}

#[derive(Debug)]
pub enum DisableOutcome {
    Ended {
        schedule_id: i64,
        valid_to: NaiveDate,
        dropped_futures: usize,
    },
    NothingEffective {
        dropped_futures: usize,
    },
}

pub fn disable(
    conn: &Connection,
    source: i64,
    destination: i64,
    today: NaiveDate,
) -> Result<DisableOutcome> {
    let dropped_futures = schedule::drop_futures(conn, source, destination, today)?;
    match schedule::find_effective(conn, source, destination, today)? {
        Some(eff) => {
            let valid_to = month_end(today)?;
            schedule::end_validity(conn, eff.id, valid_to)?;
            Ok(DisableOutcome::Ended {
                schedule_id: eff.id,
                valid_to,
                dropped_futures,
            })
        }
        None => Ok(DisableOutcome::NothingEffective { dropped_futures }),
    }
}

/// Cascade when a money box is torn down: every non-deleted schedule feeding
/// it is tombstoned in one batch, current and future alike.
pub fn teardown_destination(conn: &Connection, destination: i64) -> Result<usize> {
    schedule::delete_for_destination(conn, destination)
}
