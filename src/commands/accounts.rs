// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{
    get_base_currency, id_for_account, maybe_print_json, parse_decimal, pretty_table,
};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("deposit", sub)) => deposit(conn, sub)?,
        Some(("freeze", sub)) => set_frozen(conn, sub, true)?,
        Some(("unfreeze", sub)) => set_frozen(conn, sub, false)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let typ = sub.get_one::<String>("type").unwrap();
    let ccy = match sub.get_one::<String>("currency") {
        Some(c) => c.to_uppercase(),
        None => get_base_currency(conn)?,
    };
    let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;

    conn.execute(
        "INSERT INTO accounts(name, type, currency, balance) VALUES (?1, ?2, ?3, ?4)",
        params![name, typ, ccy, balance.to_string()],
    )?;
    if balance > Decimal::ZERO {
        let id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO ledger(transferred_at, source_account_id, destination_account_id, amount, memo)
             VALUES (datetime('now'), NULL, ?1, ?2, 'opening balance')",
            params![id, balance.to_string()],
        )?;
    }
    println!("Added account '{}' ({}, {})", name, typ, ccy);
    Ok(())
}

fn deposit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let id = id_for_account(conn, name)?;

    let balance_s: String = conn.query_row(
        "SELECT balance FROM accounts WHERE id=?1",
        params![id],
        |r| r.get(0),
    )?;
    let balance = balance_s
        .parse::<Decimal>()
        .with_context(|| format!("Invalid balance '{}' on '{}'", balance_s, name))?;
    conn.execute(
        "UPDATE accounts SET balance=?2 WHERE id=?1",
        params![id, (balance + amount).to_string()],
    )?;
    conn.execute(
        "INSERT INTO ledger(transferred_at, source_account_id, destination_account_id, amount, memo)
         VALUES (datetime('now'), NULL, ?1, ?2, 'deposit')",
        params![id, amount.to_string()],
    )?;
    println!("Deposited {} into '{}'", amount, name);
    Ok(())
}

fn set_frozen(conn: &Connection, sub: &clap::ArgMatches, frozen: bool) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let n = conn.execute(
        "UPDATE accounts SET frozen=?2 WHERE name=?1",
        params![name, frozen],
    )?;
    if n == 0 {
        anyhow::bail!("Account '{}' not found", name);
    }
    println!(
        "{} account '{}'",
        if frozen { "Froze" } else { "Unfroze" },
        name
    );
    Ok(())
}

#[derive(Serialize)]
pub struct AccountRow {
    pub name: String,
    pub r#type: String,
    pub currency: String,
    pub balance: String,
    pub frozen: bool,
    pub created: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut stmt = conn.prepare(
        "SELECT name, type, currency, balance, frozen, created_at FROM accounts ORDER BY name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(AccountRow {
            name: r.get(0)?,
            r#type: r.get(1)?,
            currency: r.get(2)?,
            balance: r.get(3)?,
            frozen: r.get(4)?,
            created: r.get(5)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|a| {
                vec![
                    a.name.clone(),
                    a.r#type.clone(),
                    a.currency.clone(),
                    a.balance.clone(),
                    if a.frozen { "yes".into() } else { "".into() },
                    a.created.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Name", "Type", "Currency", "Balance", "Frozen", "Created"],
                rows
            )
        );
    }
    Ok(())
}
