// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::ValidationError;
use crate::models::Schedule;
use crate::utils::{first_of_next_month, month_end};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;

// Versioned schedule store. Per (source, destination) pair at most one
// currently-effective and at most one future row may exist; callers go
// through the change manager to preserve that.

pub fn validate(amount: Decimal, day: u32) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    if !(1..=31).contains(&day) {
        return Err(ValidationError::DayOutOfRange(day));
    }
    Ok(())
}

/// New version starting on the 1st of the month after `today`, open-ended.
pub fn create(
    conn: &Connection,
    source: i64,
    destination: i64,
    amount: Decimal,
    day: u32,
    today: NaiveDate,
) -> Result<Schedule> {
    validate(amount, day)?;
    let valid_from = first_of_next_month(today)?;
    conn.execute(
        "INSERT INTO schedules(source_account_id, destination_account_id, amount, transfer_day, valid_from)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            source,
            destination,
            amount.to_string(),
            day,
            valid_from.to_string()
        ],
    )?;
    Ok(Schedule {
        id: conn.last_insert_rowid(),
        source_account_id: source,
        destination_account_id: destination,
        amount,
        transfer_day: day,
        valid_from,
        valid_to: None,
        active: true,
        deleted: false,
    })
}

pub fn find_effective(
    conn: &Connection,
    source: i64,
    destination: i64,
    as_of: NaiveDate,
) -> Result<Option<Schedule>> {
    let mut stmt = conn.prepare(
        "SELECT id, source_account_id, destination_account_id, amount, transfer_day,
                valid_from, valid_to, active, deleted
         FROM schedules
         WHERE source_account_id=?1 AND destination_account_id=?2
           AND active=1 AND deleted=0
           AND valid_from<=?3 AND (valid_to IS NULL OR valid_to>=?3)
         ORDER BY valid_from DESC LIMIT 1",
    )?;
    let mut rows = stmt.query(params![source, destination, as_of.to_string()])?;
    match rows.next()? {
        Some(r) => Ok(Some(from_row(r)?)),
        None => Ok(None),
    }
}

pub fn find_future(
    conn: &Connection,
    source: i64,
    destination: i64,
    as_of: NaiveDate,
) -> Result<Option<Schedule>> {
    let mut stmt = conn.prepare(
        "SELECT id, source_account_id, destination_account_id, amount, transfer_day,
                valid_from, valid_to, active, deleted
         FROM schedules
         WHERE source_account_id=?1 AND destination_account_id=?2
           AND active=1 AND deleted=0 AND valid_from>?3
         ORDER BY valid_from ASC LIMIT 1",
    )?;
    let mut rows = stmt.query(params![source, destination, as_of.to_string()])?;
    match rows.next()? {
        Some(r) => Ok(Some(from_row(r)?)),
        None => Ok(None),
    }
}

pub fn find_all_by_destination(conn: &Connection, destination: i64) -> Result<Vec<Schedule>> {
    let mut stmt = conn.prepare(
        "SELECT id, source_account_id, destination_account_id, amount, transfer_day,
                valid_from, valid_to, active, deleted
         FROM schedules
         WHERE destination_account_id=?1 AND deleted=0
         ORDER BY id",
    )?;
    let mut rows = stmt.query(params![destination])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(from_row(r)?);
    }
    Ok(out)
}

/// Effective schedules whose transfer day falls due on `on`. Days 29-31 clamp
/// to the last day of shorter months: on a month's final day every schedule
/// with a higher transfer day is due as well.
pub fn find_due(conn: &Connection, on: NaiveDate) -> Result<Vec<Schedule>> {
    let at_month_end = on == month_end(on)?;
    let mut stmt = conn.prepare(
        "SELECT id, source_account_id, destination_account_id, amount, transfer_day,
                valid_from, valid_to, active, deleted
         FROM schedules
         WHERE active=1 AND deleted=0
           AND valid_from<=?1 AND (valid_to IS NULL OR valid_to>=?1)
           AND (transfer_day=?2 OR (?3 AND transfer_day>?2))
         ORDER BY id",
    )?;
    let mut rows = stmt.query(params![on.to_string(), on.day(), at_month_end])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(from_row(r)?);
    }
    Ok(out)
}

pub fn end_validity(conn: &Connection, id: i64, valid_to: NaiveDate) -> Result<()> {
    conn.execute(
        "UPDATE schedules SET valid_to=?2 WHERE id=?1",
        params![id, valid_to.to_string()],
    )?;
    Ok(())
}

/// In-place amendment of a not-yet-activated future version.
pub fn amend_future(conn: &Connection, id: i64, amount: Decimal, day: u32) -> Result<()> {
    validate(amount, day)?;
    conn.execute(
        "UPDATE schedules SET amount=?2, transfer_day=?3 WHERE id=?1",
        params![id, amount.to_string(), day],
    )?;
    Ok(())
}

/// Tombstone every future version for the pair; a pending change must not
/// resurrect after disable.
pub fn drop_futures(
    conn: &Connection,
    source: i64,
    destination: i64,
    as_of: NaiveDate,
) -> Result<usize> {
    let n = conn.execute(
        "UPDATE schedules SET active=0, deleted=1
         WHERE source_account_id=?1 AND destination_account_id=?2
           AND deleted=0 AND valid_from>?3",
        params![source, destination, as_of.to_string()],
    )?;
    Ok(n)
}

pub fn delete_for_destination(conn: &Connection, destination: i64) -> Result<usize> {
    let n = conn.execute(
        "UPDATE schedules SET active=0, deleted=1
         WHERE destination_account_id=?1 AND deleted=0",
        params![destination],
    )?;
    Ok(n)
}

fn from_row(r: &Row) -> Result<Schedule> {
    let amount_s: String = r.get(3)?;
    Ok(Schedule {
        id: r.get(0)?,
        source_account_id: r.get(1)?,
        destination_account_id: r.get(2)?,
        amount: amount_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' on schedule row", amount_s))?,
        transfer_day: r.get(4)?,
        valid_from: r.get(5)?,
        valid_to: r.get(6)?,
        active: r.get(7)?,
        deleted: r.get(8)?,
    })
}
