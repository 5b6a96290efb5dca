// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(conn, sub),
        Some(("export", sub)) => export(conn, sub),
        _ => Ok(()),
    }
}

#[derive(Serialize)]
pub struct HistoryRow {
    pub date: String,
    pub schedule_id: i64,
    pub source: String,
    pub destination: String,
    pub amount: String,
    pub status: String,
    pub retries: u32,
    pub reason: String,
    pub executed_at: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<HistoryRow>> {
    let mut sql = String::from(
        "SELECT e.run_date, e.schedule_id, a1.name, a2.name, e.amount, e.status,
                e.retry_count, e.failure_reason, e.executed_at
         FROM executions e
         LEFT JOIN accounts a1 ON e.source_account_id=a1.id
         LEFT JOIN accounts a2 ON e.destination_account_id=a2.id
         WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(date) = sub.get_one::<String>("date") {
        sql.push_str(" AND e.run_date=?");
        params_vec.push(date.into());
    }
    if let Some(schedule) = sub.get_one::<i64>("schedule") {
        sql.push_str(" AND e.schedule_id=?");
        params_vec.push(schedule.to_string());
    }
    if let Some(status) = sub.get_one::<String>("status") {
        sql.push_str(" AND e.status=?");
        params_vec.push(status.into());
    }
    sql.push_str(" ORDER BY e.run_date DESC, e.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

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
        let source: Option<String> = r.get(2)?;
        let destination: Option<String> = r.get(3)?;
        let reason: Option<String> = r.get(7)?;
        data.push(HistoryRow {
            date: r.get(0)?,
            schedule_id: r.get(1)?,
            source: source.unwrap_or_default(),
            destination: destination.unwrap_or_default(),
            amount: r.get(4)?,
            status: r.get(5)?,
            retries: r.get(6)?,
            reason: reason.unwrap_or_default(),
            executed_at: r.get(8)?,
        });
    }
    Ok(data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.schedule_id.to_string(),
                    r.source.clone(),
                    r.destination.clone(),
                    r.amount.clone(),
                    r.status.clone(),
                    r.retries.to_string(),
                    r.reason.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Schedule", "From", "To", "Amount", "Status", "Retries", "Reason"],
                rows,
            )
        );
    }
    Ok(())
}

fn export(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let mut stmt = conn.prepare(
        "SELECT e.run_date, e.schedule_id, a1.name, a2.name, e.amount, e.status,
                e.retry_count, e.failure_reason, e.executed_at
         FROM executions e
         LEFT JOIN accounts a1 ON e.source_account_id=a1.id
         LEFT JOIN accounts a2 ON e.destination_account_id=a2.id
         ORDER BY e.run_date, e.id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, Option<String>>(2)?,
            r.get::<_, Option<String>>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, u32>(6)?,
            r.get::<_, Option<String>>(7)?,
            r.get::<_, String>(8)?,
        ))
    })?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "date",
                "schedule",
                "source",
                "destination",
                "amount",
                "status",
                "retries",
                "reason",
                "executed_at",
            ])?;
            for row in rows {
                let (d, sid, src, dst, amt, st, rc, reason, at) = row?;
                wtr.write_record([
                    d,
                    sid.to_string(),
                    src.unwrap_or_default(),
                    dst.unwrap_or_default(),
                    amt,
                    st,
                    rc.to_string(),
                    reason.unwrap_or_default(),
                    at,
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (d, sid, src, dst, amt, st, rc, reason, at) = row?;
                items.push(json!({
                    "date": d, "schedule": sid, "source": src, "destination": dst,
                    "amount": amt, "status": st, "retries": rc, "reason": reason,
                    "executed_at": at
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
        }
    }
    println!("Exported execution history to {}", out);
    Ok(())
}
