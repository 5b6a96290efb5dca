// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use moneydrip::models::ExecutionStatus;
use moneydrip::{db, driver, history, retry, triggers};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO accounts(id,name,type,currency,balance) VALUES (1,'Main','primary','KRW','50000')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO accounts(id,name,type,currency,balance) VALUES (2,'Trip fund','box','KRW','0')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO schedules(source_account_id,destination_account_id,amount,transfer_day,valid_from)
         VALUES (1,2,'100000',15,'2024-03-01')",
        [],
    )
    .unwrap();
    conn
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn record(conn: &Connection) -> moneydrip::models::Execution {
    history::find_for_day(conn, 1, d(2024, 3, 15))
        .unwrap()
        .unwrap()
}

fn balance_of(conn: &Connection, id: i64) -> Decimal {
    let s: String = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![id],
            |r| r.get(0),
        )
        .unwrap();
    s.parse().unwrap()
}

#[test]
fn wave_recovers_once_funds_arrive() {
    let mut conn = setup();
    driver::run_daily(&mut conn, d(2024, 3, 15)).unwrap();
    assert_eq!(record(&conn).status, ExecutionStatus::Failed);

    conn.execute("UPDATE accounts SET balance='500000' WHERE id=1", [])
        .unwrap();
    let s = retry::run_wave(&mut conn, d(2024, 3, 15), 0).unwrap();
    assert_eq!((s.matched, s.recovered), (1, 1));

    let rec = record(&conn);
    assert_eq!(rec.status, ExecutionStatus::Success);
    assert_eq!(rec.failure_reason, None);
    // Recovery keeps the retry count it succeeded at
    assert_eq!(rec.retry_count, 0);
    assert_eq!(balance_of(&conn, 1), Decimal::from(400000));
    assert_eq!(balance_of(&conn, 2), Decimal::from(100000));
}

#[test]
fn waves_escalate_to_terminal_failure() {
    let mut conn = setup();
    driver::run_daily(&mut conn, d(2024, 3, 15)).unwrap();

    let s = retry::run_wave(&mut conn, d(2024, 3, 15), 0).unwrap();
    assert_eq!((s.matched, s.retrying), (1, 1));
    let rec = record(&conn);
    assert_eq!(rec.status, ExecutionStatus::Retry);
    assert_eq!(rec.retry_count, 1);
    assert!(rec.failure_reason.is_some());

    retry::run_wave(&mut conn, d(2024, 3, 15), 1).unwrap();
    let rec = record(&conn);
    assert_eq!(rec.status, ExecutionStatus::Retry);
    assert_eq!(rec.retry_count, 2);

    let s = retry::run_wave(&mut conn, d(2024, 3, 15), 2).unwrap();
    assert_eq!((s.matched, s.exhausted), (1, 1));
    let rec = record(&conn);
    assert_eq!(rec.status, ExecutionStatus::Failed);
    assert_eq!(rec.retry_count, 3);

    // Terminal: no wave picks it up again, even with funds available
    conn.execute("UPDATE accounts SET balance='500000' WHERE id=1", [])
        .unwrap();
    for rc in 0..3 {
        let s = retry::run_wave(&mut conn, d(2024, 3, 15), rc).unwrap();
        assert_eq!(s.matched, 0, "wave {} matched a terminal record", rc);
    }
    let rec = record(&conn);
    assert_eq!(rec.status, ExecutionStatus::Failed);
    assert_eq!(rec.retry_count, 3);
    assert_eq!(balance_of(&conn, 2), Decimal::ZERO);
}

#[test]
fn wave_only_picks_records_at_its_retry_count() {
    let mut conn = setup();
    driver::run_daily(&mut conn, d(2024, 3, 15)).unwrap();
    retry::run_wave(&mut conn, d(2024, 3, 15), 0).unwrap();

    // Record now sits at retry 1; the first wave finds nothing
    let s = retry::run_wave(&mut conn, d(2024, 3, 15), 0).unwrap();
    assert_eq!(s.matched, 0);
    // And nothing from another day
    let s = retry::run_wave(&mut conn, d(2024, 3, 16), 1).unwrap();
    assert_eq!(s.matched, 0);
}

#[test]
fn wave_past_cutoff_is_rejected() {
    let mut conn = setup();
    assert!(retry::run_wave(&mut conn, d(2024, 3, 15), 3).is_err());
    assert!(retry::run_wave(&mut conn, d(2024, 3, 15), 7).is_err());
}

#[test]
fn retry_uses_values_stored_on_the_record() {
    let mut conn = setup();
    driver::run_daily(&mut conn, d(2024, 3, 15)).unwrap();

    // Amend the live schedule between waves; the wave must keep charging the
    // original amount
    conn.execute("UPDATE schedules SET amount='999999' WHERE id=1", [])
        .unwrap();
    conn.execute("UPDATE accounts SET balance='500000' WHERE id=1", [])
        .unwrap();
    retry::run_wave(&mut conn, d(2024, 3, 15), 0).unwrap();

    assert_eq!(record(&conn).status, ExecutionStatus::Success);
    assert_eq!(balance_of(&conn, 1), Decimal::from(400000));
    assert_eq!(balance_of(&conn, 2), Decimal::from(100000));
}

#[test]
fn morning_dispatch_runs_daily_and_previous_day_wave() {
    let mut conn = setup();
    driver::run_daily(&mut conn, d(2024, 3, 15)).unwrap();
    retry::run_wave(&mut conn, d(2024, 3, 15), 0).unwrap();
    retry::run_wave(&mut conn, d(2024, 3, 15), 1).unwrap();
    assert_eq!(record(&conn).retry_count, 2);

    // Next morning: the 09:00 dispatch covers today's run and yesterday's
    // final wave
    let outcomes = triggers::dispatch(&mut conn, d(2024, 3, 16), 9, 0).unwrap();
    assert_eq!(outcomes.len(), 2);

    let rec = record(&conn);
    assert_eq!(rec.status, ExecutionStatus::Failed);
    assert_eq!(rec.retry_count, 3);

    // Nothing registered off the cadence
    assert!(triggers::dispatch(&mut conn, d(2024, 3, 16), 10, 30)
        .unwrap()
        .is_empty());
}

#[test]
fn crontab_covers_the_three_trigger_times() {
    let tab = triggers::crontab("moneydrip");
    let lines: Vec<&str> = tab.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("0 9 * * *"));
    assert!(lines[1].starts_with("0 12 * * *"));
    assert!(lines[2].starts_with("0 15 * * *"));
    assert!(tab.contains("run at --time 09:00"));
}
