// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::manage::{self, DisableOutcome, EnableOutcome};
use crate::utils::{id_for_account, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("enable", sub)) => enable(conn, sub)?,
        Some(("disable", sub)) => disable(conn, sub)?,
        Some(("teardown", sub)) => teardown(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn today_or(sub: &clap::ArgMatches) -> Result<NaiveDate> {
    match sub.get_one::<String>("date") {
        Some(s) => parse_date(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn enable(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let from = sub.get_one::<String>("from").unwrap();
    let to = sub.get_one::<String>("to").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let day = *sub.get_one::<u32>("day").unwrap();
    let today = today_or(sub)?;

    let source = id_for_account(conn, from)?;
    let destination = id_for_account(conn, to)?;

    match manage::enable(conn, source, destination, amount, day, today)? {
        EnableOutcome::Created(s) => println!(
            "Enabled {} -> {}: {} on day {} starting {}",
            from, to, amount, day, s.valid_from
        ),
        EnableOutcome::Amended(id) => println!(
            "Amended pending change #{} for {} -> {}: {} on day {}",
            id, from, to, amount, day
        ),
        EnableOutcome::Unchanged => println!("No change for {} -> {}", from, to),
    }
    Ok(())
}

fn disable(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let from = sub.get_one::<String>("from").unwrap();
    let to = sub.get_one::<String>("to").unwrap();
    let today = today_or(sub)?;

    let source = id_for_account(conn, from)?;
    let destination = id_for_account(conn, to)?;

    match manage::disable(conn, source, destination, today)? {
        DisableOutcome::Ended {
            valid_to,
            dropped_futures,
            ..
        } => {
            println!(
                "Disabled {} -> {}: runs through {} ({} pending change(s) dropped)",
                from, to, valid_to, dropped_futures
            );
        }
        DisableOutcome::NothingEffective { dropped_futures } => {
            println!(
                "Nothing in force for {} -> {} ({} pending change(s) dropped)",
                from, to, dropped_futures
            );
        }
    }
    Ok(())
}

fn teardown(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let to = sub.get_one::<String>("to").unwrap();
    let destination = id_for_account(conn, to)?;
    let n = manage::teardown_destination(conn, destination)?;
    println!("Tombstoned {} schedule(s) feeding '{}'", n, to);
    Ok(())
}

#[derive(Serialize)]
pub struct ScheduleRow {
    pub id: i64,
    pub from: String,
    pub to: String,
    pub amount: String,
    pub day: u32,
    pub valid_from: String,
    pub valid_to: String,
    pub active: bool,
    pub deleted: bool,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut sql = String::from(
        "SELECT s.id, a1.name, a2.name, s.amount, s.transfer_day, s.valid_from, s.valid_to,
                s.active, s.deleted
         FROM schedules s
         LEFT JOIN accounts a1 ON s.source_account_id=a1.id
         LEFT JOIN accounts a2 ON s.destination_account_id=a2.id
         WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();
    if !sub.get_flag("all") {
        sql.push_str(" AND s.deleted=0");
    }
    if let Some(from) = sub.get_one::<String>("from") {
        sql.push_str(" AND a1.name=?");
        params_vec.push(from.into());
    }
    if let Some(to) = sub.get_one::<String>("to") {
        sql.push_str(" AND a2.name=?");
        params_vec.push(to.into());
    }
    sql.push_str(" ORDER BY a1.name, a2.name, s.valid_from, s.id");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = if params_vec.is_empty() {
        stmt.query([])?
    } else {
        let params: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|s| s as &dyn rusqlite::ToSql)
            .collect();
        stmt.query(rusqlite::params_from_iter(params))?
    };

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let valid_to: Option<String> = r.get(6)?;
        data.push(ScheduleRow {
            id: r.get(0)?,
            from: r.get::<_, Option<String>>(1)?.unwrap_or_default(),
            to: r.get::<_, Option<String>>(2)?.unwrap_or_default(),
            amount: r.get(3)?,
            day: r.get(4)?,
            valid_from: r.get(5)?,
            valid_to: valid_to.unwrap_or_default(),
            active: r.get(7)?,
            deleted: r.get(8)?,
        });
    }

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|s| {
                vec![
                    s.id.to_string(),
                    s.from.clone(),
                    s.to.clone(),
                    s.amount.clone(),
                    s.day.to_string(),
                    s.valid_from.clone(),
                    s.valid_to.clone(),
                    if s.deleted {
                        "deleted".into()
                    } else if s.active {
                        "active".into()
                    } else {
                        "inactive".into()
                    },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "From", "To", "Amount", "Day", "Valid from", "Valid to", "State"],
                rows
            )
        );
    }
    Ok(())
}
