// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneydrip::errors::TransferError;
use moneydrip::{db, transfer};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

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

fn ledger_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM ledger", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn transfer_moves_balances_and_appends_ledger() {
    let mut conn = setup();
    transfer::execute(&mut conn, 1, 2, Decimal::from(100000)).unwrap();

    assert_eq!(balance_of(&conn, 1), Decimal::from(400000));
    assert_eq!(balance_of(&conn, 2), Decimal::from(100000));
    assert_eq!(ledger_count(&conn), 1);

    let (src, dst, amt): (i64, i64, String) = conn
        .query_row(
            "SELECT source_account_id, destination_account_id, amount FROM ledger",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!((src, dst, amt.as_str()), (1, 2, "100000"));
}

#[test]
fn insufficient_funds_changes_nothing() {
    let mut conn = setup();
    let err = transfer::execute(&mut conn, 1, 2, Decimal::from(600000)).unwrap_err();
    assert!(matches!(err, TransferError::InsufficientFunds { .. }));

    assert_eq!(balance_of(&conn, 1), Decimal::from(500000));
    assert_eq!(balance_of(&conn, 2), Decimal::ZERO);
    assert_eq!(ledger_count(&conn), 0);
}

#[test]
fn frozen_accounts_are_locked() {
    let mut conn = setup();
    conn.execute("UPDATE accounts SET frozen=1 WHERE id=1", [])
        .unwrap();
    let err = transfer::execute(&mut conn, 1, 2, Decimal::from(1000)).unwrap_err();
    assert!(matches!(err, TransferError::AccountLocked { .. }));

    conn.execute("UPDATE accounts SET frozen=0 WHERE id=1", [])
        .unwrap();
    conn.execute("UPDATE accounts SET frozen=1 WHERE id=2", [])
        .unwrap();
    let err = transfer::execute(&mut conn, 1, 2, Decimal::from(1000)).unwrap_err();
    assert!(matches!(err, TransferError::AccountLocked { .. }));

    assert_eq!(balance_of(&conn, 1), Decimal::from(500000));
    assert_eq!(ledger_count(&conn), 0);
}

#[test]
fn missing_account_is_reported() {
    let mut conn = setup();
    let err = transfer::execute(&mut conn, 1, 99, Decimal::from(1000)).unwrap_err();
    assert!(matches!(err, TransferError::AccountNotFound(99)));
    assert_eq!(balance_of(&conn, 1), Decimal::from(500000));
}

#[test]
fn business_failures_are_distinguished_from_storage() {
    let mut conn = setup();
    let err = transfer::execute(&mut conn, 1, 2, Decimal::from(600000)).unwrap_err();
    assert!(err.is_business());
    let err = transfer::execute(&mut conn, 1, 99, Decimal::from(1)).unwrap_err();
    assert!(err.is_business());

    conn.execute("UPDATE accounts SET balance='garbage' WHERE id=1", [])
        .unwrap();
    let err = transfer::execute(&mut conn, 1, 2, Decimal::from(1)).unwrap_err();
    assert!(!err.is_business());
}
