// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::driver::{self, RunSummary};
use crate::retry::{self, WaveSummary};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;

// Explicit trigger registration for the daily cadence. All times are local
// wall-clock in the host's single fixed zone; one process instance per job.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Daily,
    Wave { retry_count: u32, previous_day: bool },
}

#[derive(Debug, Clone, Copy)]
pub struct Trigger {
    pub hour: u32,
    pub minute: u32,
    pub job: Job,
}

/// 09:00 runs today's schedules plus the last wave over yesterday's leftovers;
/// 12:00 and 15:00 are the same-day waves.
pub const TRIGGERS: &[Trigger] = &[
    Trigger {
        hour: 9,
        minute: 0,
        job: Job::Daily,
    },
    Trigger {
        hour: 9,
        minute: 0,
        job: Job::Wave {
            retry_count: 2,
            previous_day: true,
        },
    },
    Trigger {
        hour: 12,
        minute: 0,
        job: Job::Wave {
            retry_count: 0,
            previous_day: false,
        },
    },
    Trigger {
        hour: 15,
        minute: 0,
        job: Job::Wave {
            retry_count: 1,
            previous_day: false,
        },
    },
];

pub fn due_at(hour: u32, minute: u32) -> Vec<Trigger> {
    TRIGGERS
        .iter()
        .copied()
        .filter(|t| t.hour == hour && t.minute == minute)
        .collect()
}

#[derive(Debug)]
pub enum Outcome {
    Daily {
        run_date: NaiveDate,
        summary: RunSummary,
    },
    Wave {
        run_date: NaiveDate,
        retry_count: u32,
        summary: WaveSummary,
    },
}

/// Runs every job registered for the given wall-clock instant.
pub fn dispatch(
    conn: &mut Connection,
    date: NaiveDate,
    hour: u32,
    minute: u32,
) -> Result<Vec<Outcome>> {
    let mut out = Vec::new();
    for t in due_at(hour, minute) {
        match t.job {
            Job::Daily => out.push(Outcome::Daily {
                run_date: date,
                summary: driver::run_daily(conn, date)?,
            }),
            Job::Wave {
                retry_count,
                previous_day,
            } => {
                let run_date = if previous_day {
                    date.pred_opt()
                        .with_context(|| format!("No previous day for {}", date))?
                } else {
                    date
                };
                out.push(Outcome::Wave {
                    run_date,
                    retry_count,
                    summary: retry::run_wave(conn, run_date, retry_count)?,
                });
            }
        }
    }
    Ok(out)
}

/// Cron lines installing the cadence; one entry per distinct trigger time.
pub fn crontab(bin: &str) -> String {
    let mut seen: Vec<(u32, u32)> = Vec::new();
    let mut out = String::new();
    for t in TRIGGERS {
        if seen.contains(&(t.hour, t.minute)) {
            continue;
        }
        seen.push((t.hour, t.minute));
        out.push_str(&format!(
            "{} {} * * * {} run at --time {:02}:{:02}\n",
            t.minute, t.hour, bin, t.hour, t.minute
        ));
    }
    out
}
