// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::ExecutionStatus;
use crate::{history, schedule, transfer};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    pub due: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// One pass over every schedule due on `today`. Each schedule is processed
/// independently: a business failure becomes a FAILED execution record and
/// the loop moves on. Only storage failures abort the run; the next scheduled
/// invocation retries the whole batch.
pub fn run_daily(conn: &mut Connection, today: NaiveDate) -> Result<RunSummary> {
    let due = schedule::find_due(conn, today).context("Read due schedules")?;
    let mut summary = RunSummary {
        due: due.len(),
        ..Default::default()
    };

    for sched in due {
        // Re-runs must not double-charge. An existing SUCCESS row means the
        // transfer already went through; any other existing row belongs to
        // the retry waves, not to us.
        if history::find_for_day(conn, sched.id, today)?.is_some() {
            summary.skipped += 1;
            continue;
        }
        summary.attempted += 1;
        match transfer::execute(
            conn,
            sched.source_account_id,
            sched.destination_account_id,
            sched.amount,
        ) {
            Ok(_) => {
                history::record(conn, &sched, today, ExecutionStatus::Success, None)?;
                summary.succeeded += 1;
            }
            Err(e) if e.is_business() => {
                history::record(
                    conn,
                    &sched,
                    today,
                    ExecutionStatus::Failed,
                    Some(&e.to_string()),
                )?;
                summary.failed += 1;
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Transfer store failure for schedule {}", sched.id)));
            }
        }
    }
    Ok(summary)
}
