// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Moneydrip", "moneydrip"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("moneydrip.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        type TEXT NOT NULL CHECK(type IN ('primary','box')),
        currency TEXT NOT NULL,
        balance TEXT NOT NULL DEFAULT '0',
        frozen INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    -- One row per effective period of a standing transfer. Rows are ended
    -- (valid_to) or tombstoned (deleted), never removed or rewritten.
    CREATE TABLE IF NOT EXISTS schedules(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source_account_id INTEGER NOT NULL,
        destination_account_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        transfer_day INTEGER NOT NULL CHECK(transfer_day BETWEEN 1 AND 31),
        valid_from TEXT NOT NULL,
        valid_to TEXT,
        active INTEGER NOT NULL DEFAULT 1,
        deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(source_account_id) REFERENCES accounts(id),
        FOREIGN KEY(destination_account_id) REFERENCES accounts(id)
    );
    CREATE INDEX IF NOT EXISTS idx_schedules_pair
        ON schedules(source_account_id, destination_account_id);
    CREATE INDEX IF NOT EXISTS idx_schedules_day ON schedules(transfer_day);

    -- Audit trail: one row per (schedule, calendar day), mutated in place by
    -- the retry waves until it reaches a terminal status.
    CREATE TABLE IF NOT EXISTS executions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        schedule_id INTEGER NOT NULL,
        run_date TEXT NOT NULL,
        source_account_id INTEGER NOT NULL,
        destination_account_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        executed_at TEXT NOT NULL,
        status TEXT NOT NULL CHECK(status IN ('SUCCESS','FAILED','RETRY')),
        failure_reason TEXT,
        retry_count INTEGER NOT NULL DEFAULT 0,
        UNIQUE(schedule_id, run_date),
        FOREIGN KEY(schedule_id) REFERENCES schedules(id)
    );
    CREATE INDEX IF NOT EXISTS idx_executions_run_date ON executions(run_date);

    -- source_account_id is NULL for external deposits.
    CREATE TABLE IF NOT EXISTS ledger(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transferred_at TEXT NOT NULL,
        source_account_id INTEGER,
        destination_account_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        memo TEXT,
        FOREIGN KEY(source_account_id) REFERENCES accounts(id),
        FOREIGN KEY(destination_account_id) REFERENCES accounts(id)
    );
    "#,
    )?;
    Ok(())
}
