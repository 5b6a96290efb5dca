// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use moneydrip::models::ExecutionStatus;
use moneydrip::{cli, commands, db, history, schedule};
use rusqlite::Connection;
use rust_decimal::Decimal;
use tempfile::tempdir;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO accounts(id,name,type,currency,balance) VALUES (1,'Main','primary','KRW','500000')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO accounts(id,name,type,currency,balance) VALUES (2,'Trip fund','box','KRW','0')",
        [],
    )
    .unwrap();
    conn
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn record_copies_schedule_values() {
    let conn = setup();
    let sched = schedule::create(&conn, 1, 2, Decimal::from(100000), 15, d(2024, 2, 10)).unwrap();
    history::record(
        &conn,
        &sched,
        d(2024, 3, 15),
        ExecutionStatus::Failed,
        Some("insufficient funds in 'Main': balance 50000, needed 100000"),
    )
    .unwrap();

    let rec = history::find_for_day(&conn, sched.id, d(2024, 3, 15))
        .unwrap()
        .unwrap();
    assert_eq!(rec.schedule_id, sched.id);
    assert_eq!(rec.source_account_id, 1);
    assert_eq!(rec.destination_account_id, 2);
    assert_eq!(rec.amount, Decimal::from(100000));
    assert_eq!(rec.status, ExecutionStatus::Failed);
    assert_eq!(rec.retry_count, 0);
    assert!(rec.failure_reason.unwrap().contains("insufficient"));
}

#[test]
fn candidates_require_matching_count_and_open_status() {
    let conn = setup();
    let sched = schedule::create(&conn, 1, 2, Decimal::from(100000), 15, d(2024, 2, 10)).unwrap();
    let id = history::record(&conn, &sched, d(2024, 3, 15), ExecutionStatus::Failed, Some("x"))
        .unwrap();

    assert_eq!(
        history::find_retry_candidates(&conn, d(2024, 3, 15), 0)
            .unwrap()
            .len(),
        1
    );
    assert!(history::find_retry_candidates(&conn, d(2024, 3, 15), 1)
        .unwrap()
        .is_empty());
    assert!(history::find_retry_candidates(&conn, d(2024, 3, 16), 0)
        .unwrap()
        .is_empty());

    history::mark_success(&conn, id).unwrap();
    assert!(history::find_retry_candidates(&conn, d(2024, 3, 15), 0)
        .unwrap()
        .is_empty());
    let rec = history::find_for_day(&conn, sched.id, d(2024, 3, 15))
        .unwrap()
        .unwrap();
    assert_eq!(rec.status, ExecutionStatus::Success);
    assert_eq!(rec.failure_reason, None);
}

fn seed_history(conn: &Connection) {
    let sched = schedule::create(conn, 1, 2, Decimal::from(100000), 15, d(2024, 2, 10)).unwrap();
    history::record(conn, &sched, d(2024, 3, 15), ExecutionStatus::Success, None).unwrap();
    let failed = history::record(
        conn,
        &sched,
        d(2024, 4, 15),
        ExecutionStatus::Failed,
        Some("account 'Main' is frozen"),
    )
    .unwrap();
    history::mark_retry(conn, failed, 1, "account 'Main' is frozen").unwrap();
}

#[test]
fn export_csv_writes_every_record() {
    let conn = setup();
    seed_history(&conn);

    let dir = tempdir().unwrap();
    let out = dir.path().join("history.csv");
    let out_str = out.to_string_lossy().to_string();

    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "moneydrip", "history", "export", "--format", "csv", "--out", &out_str,
    ]);
    if let Some(("history", sub)) = matches.subcommand() {
        commands::history::handle(&conn, sub).unwrap();
    } else {
        panic!("history command not parsed");
    }

    let body = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("date,schedule,source,destination,amount,status"));
    assert!(body.contains("2024-03-15"));
    assert!(body.contains("SUCCESS"));
    assert!(body.contains("RETRY"));
    assert!(body.contains("Trip fund"));
}

#[test]
fn export_json_round_trips() {
    let conn = setup();
    seed_history(&conn);

    let dir = tempdir().unwrap();
    let out = dir.path().join("history.json");
    let out_str = out.to_string_lossy().to_string();

    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "moneydrip", "history", "export", "--format", "json", "--out", &out_str,
    ]);
    if let Some(("history", sub)) = matches.subcommand() {
        commands::history::handle(&conn, sub).unwrap();
    } else {
        panic!("history command not parsed");
    }

    let body = std::fs::read_to_string(&out).unwrap();
    let items: serde_json::Value = serde_json::from_str(&body).unwrap();
    let arr = items.as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["status"], "SUCCESS");
    assert_eq!(arr[1]["retries"], 1);
}

#[test]
fn list_filters_by_status_and_date() {
    let conn = setup();
    seed_history(&conn);

    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "moneydrip", "history", "list", "--status", "RETRY",
    ]);
    let sub = match matches.subcommand() {
        Some(("history", m)) => match m.subcommand() {
            Some(("list", s)) => s,
            _ => panic!("list not parsed"),
        },
        _ => panic!("history not parsed"),
    };
    let rows = commands::history::query_rows(&conn, sub).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, "RETRY");
    assert_eq!(rows[0].retries, 1);

    let matches = cli::build_cli().get_matches_from([
        "moneydrip", "history", "list", "--date", "2024-03-15",
    ]);
    let sub = match matches.subcommand() {
        Some(("history", m)) => match m.subcommand() {
            Some(("list", s)) => s,
            _ => panic!("list not parsed"),
        },
        _ => panic!("history not parsed"),
    };
    let rows = commands::history::query_rows(&conn, sub).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].source, "Main");
    assert_eq!(rows[0].destination, "Trip fund");
}
