// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{parse_date, parse_time};
use crate::{driver, retry, triggers};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("daily", sub)) => daily(conn, sub)?,
        Some(("wave", sub)) => wave(conn, sub)?,
        Some(("at", sub)) => at(conn, sub)?,
        Some(("crontab", _)) => print!("{}", triggers::crontab("moneydrip")),
        _ => {}
    }
    Ok(())
}

fn date_or_today(sub: &clap::ArgMatches) -> Result<NaiveDate> {
    match sub.get_one::<String>("date") {
        Some(s) => parse_date(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn daily(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = date_or_today(sub)?;
    let s = driver::run_daily(conn, date)?;
    println!(
        "Daily run {}: {} due, {} attempted, {} succeeded, {} failed, {} skipped",
        date, s.due, s.attempted, s.succeeded, s.failed, s.skipped
    );
    Ok(())
}

fn wave(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = date_or_today(sub)?;
    let retry_count = *sub.get_one::<u32>("retry").unwrap();
    let s = retry::run_wave(conn, date, retry_count)?;
    println!(
        "Retry wave {} (retry {}): {} matched, {} recovered, {} retrying, {} exhausted",
        date, retry_count, s.matched, s.recovered, s.retrying, s.exhausted
    );
    Ok(())
}

fn at(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = date_or_today(sub)?;
    let (hour, minute) = parse_time(sub.get_one::<String>("time").unwrap())?;
    let outcomes = triggers::dispatch(conn, date, hour, minute)?;
    if outcomes.is_empty() {
        println!("No jobs registered at {:02}:{:02}", hour, minute);
        return Ok(());
    }
    for o in outcomes {
        match o {
            triggers::Outcome::Daily { run_date, summary: s } => println!(
                "Daily run {}: {} due, {} attempted, {} succeeded, {} failed, {} skipped",
                run_date, s.due, s.attempted, s.succeeded, s.failed, s.skipped
            ),
            triggers::Outcome::Wave {
                run_date,
                retry_count,
                summary: s,
            } => println!(
                "Retry wave {} (retry {}): {} matched, {} recovered, {} retrying, {} exhausted",
                run_date, retry_count, s.matched, s.recovered, s.retrying, s.exhausted
            ),
        }
    }
    Ok(())
}
