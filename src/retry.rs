// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::{history, transfer};
use anyhow::{bail, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

/// A record failing this many times is terminally FAILED; no wave targets a
/// higher retry count.
pub const FINAL_RETRY_COUNT: u32 = 3;

#[derive(Debug, Default, Clone, Serialize)]
pub struct WaveSummary {
    pub matched: usize,
    pub recovered: usize,
    pub retrying: usize,
    pub exhausted: usize,
}

/// Re-attempts every non-success record executed on `run_date` that sits at
/// exactly `retry_count`. Re-invocation uses the amount and account refs
/// stored on the record, not the live schedule. Each record is processed
/// independently.
pub fn run_wave(conn: &mut Connection, run_date: NaiveDate, retry_count: u32) -> Result<WaveSummary> {
    if retry_count >= FINAL_RETRY_COUNT {
        bail!("Retry count {} is past the final cutoff", retry_count);
    }
    let candidates = history::find_retry_candidates(conn, run_date, retry_count)?;
    let mut summary = WaveSummary {
        matched: candidates.len(),
        ..Default::default()
    };

    for rec in candidates {
        match transfer::execute(
            conn,
            rec.source_account_id,
            rec.destination_account_id,
            rec.amount,
        ) {
            Ok(_) => {
                history::mark_success(conn, rec.id)?;
                summary.recovered += 1;
            }
            Err(e) if e.is_business() => {
                let next = rec.retry_count + 1;
                if next >= FINAL_RETRY_COUNT {
                    history::mark_failed(conn, rec.id, next, &e.to_string())?;
                    summary.exhausted += 1;
                } else {
                    history::mark_retry(conn, rec.id, next, &e.to_string())?;
                    summary.retrying += 1;
                }
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Transfer store failure for execution {}", rec.id)));
            }
        }
    }
    Ok(summary)
}
