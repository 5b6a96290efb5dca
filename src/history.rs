// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Execution, ExecutionStatus, Schedule};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;

// Append-only execution log. One row per (schedule, calendar day); the retry
// waves mutate status/retry_count/failure_reason in place, nothing is ever
// deleted.

pub fn find_for_day(
    conn: &Connection,
    schedule_id: i64,
    run_date: NaiveDate,
) -> Result<Option<Execution>> {
    let mut stmt = conn.prepare(
        "SELECT id, schedule_id, run_date, source_account_id, destination_account_id,
                amount, executed_at, status, failure_reason, retry_count
         FROM executions WHERE schedule_id=?1 AND run_date=?2",
    )?;
    let mut rows = stmt.query(params![schedule_id, run_date.to_string()])?;
    match rows.next()? {
        Some(r) => Ok(Some(from_row(r)?)),
        None => Ok(None),
    }
}

/// Initial record written by the daily driver, retry_count 0. Source,
/// destination and amount are copied from the schedule as of now.
pub fn record(
    conn: &Connection,
    schedule: &Schedule,
    run_date: NaiveDate,
    status: ExecutionStatus,
    failure_reason: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO executions(schedule_id, run_date, source_account_id,
                destination_account_id, amount, executed_at, status, failure_reason, retry_count)
         VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'), ?6, ?7, 0)",
        params![
            schedule.id,
            run_date.to_string(),
            schedule.source_account_id,
            schedule.destination_account_id,
            schedule.amount.to_string(),
            status.as_str(),
            failure_reason
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Records a wave may pick up: non-success rows at exactly the expected
/// retry count, executed on `run_date`.
pub fn find_retry_candidates(
    conn: &Connection,
    run_date: NaiveDate,
    retry_count: u32,
) -> Result<Vec<Execution>> {
    let mut stmt = conn.prepare(
        "SELECT id, schedule_id, run_date, source_account_id, destination_account_id,
                amount, executed_at, status, failure_reason, retry_count
         FROM executions
         WHERE run_date=?1 AND retry_count=?2 AND status IN ('FAILED','RETRY')
         ORDER BY id",
    )?;
    let mut rows = stmt.query(params![run_date.to_string(), retry_count])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(from_row(r)?);
    }
    Ok(out)
}

/// Terminal recovery: failure_reason is cleared, retry_count untouched.
pub fn mark_success(conn: &Connection, id: i64) -> Result<()> {
    conn.execute(
        "UPDATE executions SET status='SUCCESS', failure_reason=NULL, executed_at=datetime('now')
         WHERE id=?1",
        params![id],
    )?;
    Ok(())
}

pub fn mark_retry(conn: &Connection, id: i64, retry_count: u32, reason: &str) -> Result<()> {
    conn.execute(
        "UPDATE executions SET status='RETRY', retry_count=?2, failure_reason=?3,
                executed_at=datetime('now')
         WHERE id=?1",
        params![id, retry_count, reason],
    )?;
    Ok(())
}

/// Terminal failure after the last wave; no wave targets this retry count.
pub fn mark_failed(conn: &Connection, id: i64, retry_count: u32, reason: &str) -> Result<()> {
    conn.execute(
        "UPDATE executions SET status='FAILED', retry_count=?2, failure_reason=?3,
                executed_at=datetime('now')
         WHERE id=?1",
        params![id, retry_count, reason],
    )?;
    Ok(())
}

fn from_row(r: &Row) -> Result<Execution> {
    let amount_s: String = r.get(5)?;
    let status_s: String = r.get(7)?;
    Ok(Execution {
        id: r.get(0)?,
        schedule_id: r.get(1)?,
        run_date: r.get(2)?,
        source_account_id: r.get(3)?,
        destination_account_id: r.get(4)?,
        amount: amount_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' on execution row", amount_s))?,
        executed_at: r.get(6)?,
        status: ExecutionStatus::parse(&status_s)
            .ok_or_else(|| anyhow!("Unknown execution status '{}'", status_s))?,
        failure_reason: r.get(8)?,
        retry_count: r.get(9)?,
    })
}
